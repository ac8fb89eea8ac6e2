//! Credential records for named Zotero profiles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ZoteroError};

/// The kind of library a credential addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryType {
    /// A personal library, addressed as `/users/<id>`.
    Users,
    /// A group library, addressed as `/groups/<id>`.
    Groups,
}

impl LibraryType {
    /// The path segment used for this library type.
    pub fn as_str(&self) -> &'static str {
        match self {
            LibraryType::Users => "users",
            LibraryType::Groups => "groups",
        }
    }
}

impl fmt::Display for LibraryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LibraryType {
    type Err = ZoteroError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "users" => Ok(LibraryType::Users),
            "groups" => Ok(LibraryType::Groups),
            other => Err(ZoteroError::invalid_input(format!(
                "library type must be 'users' or 'groups', got '{}'",
                other
            ))),
        }
    }
}

/// Whether the library requires an API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    /// Access requires an API key.
    Private,
    /// A publicly readable group library.
    Public,
}

impl Privacy {
    /// The lowercase name used in stored profiles.
    pub fn as_str(&self) -> &'static str {
        match self {
            Privacy::Private => "private",
            Privacy::Public => "public",
        }
    }
}

impl fmt::Display for Privacy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Privacy {
    type Err = ZoteroError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "private" => Ok(Privacy::Private),
            "public" => Ok(Privacy::Public),
            other => Err(ZoteroError::invalid_input(format!(
                "privacy must be 'private' or 'public', got '{}'",
                other
            ))),
        }
    }
}

/// One named identity capable of calling the Zotero API.
///
/// Records are immutable once built; replacing a stored profile means
/// writing a whole new record.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    name: String,
    id: String,
    library_type: LibraryType,
    privacy: Privacy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
}

impl CredentialRecord {
    /// Build a record for a private library.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if any field is empty.
    pub fn private(
        name: impl Into<String>,
        id: impl Into<String>,
        library_type: LibraryType,
        api_key: impl Into<String>,
    ) -> Result<Self> {
        let record = Self {
            name: name.into(),
            id: id.into(),
            library_type,
            privacy: Privacy::Private,
            api_key: Some(api_key.into()),
        };
        record.validate()?;
        Ok(record)
    }

    /// Build a record for a public group library.
    ///
    /// Public libraries never carry an API key and are always groups.
    pub fn public(name: impl Into<String>, id: impl Into<String>) -> Result<Self> {
        let record = Self {
            name: name.into(),
            id: id.into(),
            library_type: LibraryType::Groups,
            privacy: Privacy::Public,
            api_key: None,
        };
        record.validate()?;
        Ok(record)
    }

    /// Check the record invariants.
    ///
    /// Checks that:
    /// - The name and id are non-empty
    /// - A private record has a non-empty API key
    /// - A public record has no API key and addresses a group library
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ZoteroError::invalid_input("profile name cannot be empty"));
        }

        if self.id.trim().is_empty() {
            return Err(ZoteroError::invalid_input(format!(
                "profile '{}': library id cannot be empty",
                self.name
            )));
        }

        match self.privacy {
            Privacy::Private => {
                if self.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
                    return Err(ZoteroError::invalid_input(format!(
                        "profile '{}': a private library requires an API key",
                        self.name
                    )));
                }
            }
            Privacy::Public => {
                if self.api_key.is_some() {
                    return Err(ZoteroError::invalid_input(format!(
                        "profile '{}': a public library cannot carry an API key",
                        self.name
                    )));
                }
                if self.library_type != LibraryType::Groups {
                    return Err(ZoteroError::invalid_input(format!(
                        "profile '{}': public libraries must be groups",
                        self.name
                    )));
                }
            }
        }

        Ok(())
    }

    /// Profile name, also the storage key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// User or group id in Zotero.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether the id names a user or a group.
    pub fn library_type(&self) -> LibraryType {
        self.library_type
    }

    /// Whether the library needs an API key.
    pub fn privacy(&self) -> Privacy {
        self.privacy
    }

    /// The API key, present only for private libraries.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// The library prefix, e.g. `users/12345`.
    pub fn library_path(&self) -> String {
        format!("{}/{}", self.library_type, self.id)
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("library_type", &self.library_type)
            .field("privacy", &self.privacy)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_record() {
        let record =
            CredentialRecord::private("work", "12345", LibraryType::Users, "secret").unwrap();
        assert_eq!(record.name(), "work");
        assert_eq!(record.api_key(), Some("secret"));
        assert_eq!(record.library_path(), "users/12345");
    }

    #[test]
    fn test_public_record_is_keyless_group() {
        let record = CredentialRecord::public("shared", "777").unwrap();
        assert_eq!(record.api_key(), None);
        assert_eq!(record.library_type(), LibraryType::Groups);
        assert_eq!(record.privacy(), Privacy::Public);
    }

    #[test]
    fn test_private_requires_key() {
        let result = CredentialRecord::private("work", "12345", LibraryType::Users, "  ");
        assert!(matches!(result, Err(ZoteroError::InvalidInput(_))));
    }

    #[test]
    fn test_empty_id_rejected() {
        let result = CredentialRecord::public("shared", "");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("library id cannot be empty"));
    }

    #[test]
    fn test_empty_name_rejected() {
        let result = CredentialRecord::public("", "777");
        assert!(result.unwrap_err().to_string().contains("name cannot be empty"));
    }

    #[test]
    fn test_deserialized_public_user_library_rejected() {
        let record: CredentialRecord = toml::from_str(
            "name = \"x\"\nid = \"1\"\nlibrary_type = \"users\"\nprivacy = \"public\"\n",
        )
        .unwrap();
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("users".parse::<LibraryType>().unwrap(), LibraryType::Users);
        assert_eq!(" groups ".parse::<LibraryType>().unwrap(), LibraryType::Groups);
        assert!("teams".parse::<LibraryType>().is_err());
        assert_eq!("public".parse::<Privacy>().unwrap(), Privacy::Public);
        assert!(matches!(
            "secret".parse::<Privacy>(),
            Err(ZoteroError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_debug_does_not_expose_key() {
        let record =
            CredentialRecord::private("work", "12345", LibraryType::Users, "secret_token")
                .unwrap();
        let debug_output = format!("{:?}", record);
        assert!(!debug_output.contains("secret_token"));
        assert!(debug_output.contains("<redacted>"));
    }

    #[test]
    fn test_record_serialization() {
        let record =
            CredentialRecord::private("work", "12345", LibraryType::Users, "secret").unwrap();
        let toml_str = toml::to_string(&record).unwrap();
        let parsed: CredentialRecord = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, record);
    }
}
