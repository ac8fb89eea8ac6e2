//! Path rules for the library endpoints.
//!
//! Each [`Endpoint`] knows the ordered segments it targets below the
//! library prefix. Optional segments are appended only when their flag is
//! set, never as empty placeholders.

use crate::config::{CredentialRecord, LibraryType, Privacy};
use crate::error::{Result, ZoteroError};

/// Where a request is rooted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Below `<host>/<libraryType>/<id>/`.
    Library(Vec<String>),
    /// `<host>/keys/<apiKey>`.
    Key,
}

/// A documented read endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint<'a> {
    /// All collections, or only top-level ones.
    Collections { top: bool },
    /// One collection, or its sub-collections.
    Collection { key: &'a str, sub: bool },
    /// Items in the library or in one collection.
    Items { collection: Option<&'a str>, top: bool },
    /// One item, or its child items.
    Item { key: &'a str, child: bool },
    TrashItems,
    PublicationsItems,
    /// All tags, or the tag matching a name.
    Tags { filter: Option<&'a str> },
    CollectionTags { key: &'a str },
    /// Tags of the items in the library or in one collection.
    ItemsTags { collection: Option<&'a str>, top: bool },
    ItemTags { key: &'a str },
    TrashTags,
    PublicationsTags,
    Searches,
    Search { key: &'a str },
    /// Privileges of the bound API key.
    Privileges,
    /// Groups the bound user belongs to.
    Groups,
}

impl<'a> Endpoint<'a> {
    /// Resolve the target for this endpoint.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty key.
    pub fn target(&self) -> Result<Target> {
        let path = match *self {
            Endpoint::Collections { top } => {
                let mut s = vec!["collections".to_string()];
                push_if(&mut s, top, "top");
                s
            }
            Endpoint::Collection { key, sub } => {
                let mut s = vec!["collections".to_string(), required(key, "collection key")?];
                push_if(&mut s, sub, "collections");
                s
            }
            Endpoint::Items { collection, top } => {
                let mut s = scoped_items(collection)?;
                push_if(&mut s, top, "top");
                s
            }
            Endpoint::Item { key, child } => {
                let mut s = vec!["items".to_string(), required(key, "item key")?];
                push_if(&mut s, child, "children");
                s
            }
            Endpoint::TrashItems => segments(&["items", "trash"]),
            Endpoint::PublicationsItems => segments(&["publications", "items"]),
            Endpoint::Tags { filter } => {
                let mut s = vec!["tags".to_string()];
                if let Some(filter) = filter {
                    s.push(required(filter, "tag filter")?);
                }
                s
            }
            Endpoint::CollectionTags { key } => vec![
                "collections".to_string(),
                required(key, "collection key")?,
                "tags".to_string(),
            ],
            Endpoint::ItemsTags { collection, top } => {
                let mut s = scoped_items(collection)?;
                push_if(&mut s, top, "top");
                s.push("tags".to_string());
                s
            }
            Endpoint::ItemTags { key } => vec![
                "items".to_string(),
                required(key, "item key")?,
                "tags".to_string(),
            ],
            Endpoint::TrashTags => segments(&["items", "trash", "tags"]),
            Endpoint::PublicationsTags => segments(&["publications", "items", "tags"]),
            Endpoint::Searches => segments(&["searches"]),
            Endpoint::Search { key } => {
                vec!["searches".to_string(), required(key, "search key")?]
            }
            Endpoint::Privileges => return Ok(Target::Key),
            Endpoint::Groups => segments(&["groups"]),
        };

        Ok(Target::Library(path))
    }

    /// Check the endpoint is usable with the bound credential.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for privileges on a public credential
    /// - `InvalidArgument` for groups on a group library
    pub fn check_credential(&self, credential: &CredentialRecord) -> Result<()> {
        match self {
            Endpoint::Privileges if credential.privacy() != Privacy::Private => {
                Err(ZoteroError::invalid_argument(format!(
                    "profile '{}': privileges can only be read with a private API key",
                    credential.name()
                )))
            }
            Endpoint::Groups if credential.library_type() != LibraryType::Users => {
                Err(ZoteroError::invalid_argument(format!(
                    "profile '{}': groups can only be listed for a user library",
                    credential.name()
                )))
            }
            _ => Ok(()),
        }
    }
}

fn scoped_items(collection: Option<&str>) -> Result<Vec<String>> {
    Ok(match collection {
        Some(key) => vec![
            "collections".to_string(),
            required(key, "collection key")?,
            "items".to_string(),
        ],
        None => vec!["items".to_string()],
    })
}

fn required(value: &str, what: &str) -> Result<String> {
    if value.trim().is_empty() {
        return Err(ZoteroError::invalid_argument(format!("{} cannot be empty", what)));
    }
    Ok(value.to_string())
}

fn push_if(segments: &mut Vec<String>, flag: bool, segment: &str) {
    if flag {
        segments.push(segment.to_string());
    }
}

fn segments(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}
