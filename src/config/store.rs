//! On-disk storage of named credential profiles.
//!
//! Each profile lives in its own TOML file under the per-user
//! configuration directory:
//! - Linux: `~/.config/zotero-client/profiles/<name>.toml`
//! - macOS: `~/Library/Application Support/zotero-client/profiles/<name>.toml`
//! - Windows: `C:\Users\<User>\AppData\Roaming\zotero-client\profiles\<name>.toml`

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use super::credential::{CredentialRecord, LibraryType, Privacy};
use super::prompt::{Confirmation, Prompter};
use crate::error::{Result, ZoteroError};

/// Application namespace inside the configuration directory.
const APP_DIR: &str = "zotero-client";

/// Extension of profile files.
const PROFILE_EXT: &str = "toml";

/// Outcome of [`CredentialStore::save`] when nothing went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The record was written to disk.
    Written,
    /// A record already existed and the user chose to keep it.
    Kept,
}

/// Resolves profile names to credential records.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    /// Directory holding one file per profile.
    dir: PathBuf,
}

impl CredentialStore {
    /// Open the store in the platform configuration directory.
    pub fn new() -> Result<Self> {
        let dir = dirs::config_dir()
            .ok_or(ZoteroError::NoConfigDir)?
            .join(APP_DIR)
            .join("profiles");
        Ok(Self { dir })
    }

    /// Open a store rooted at an explicit directory.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory profiles are stored in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Storage location for a profile.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the name is empty or would escape the
    /// store directory.
    pub fn path(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.dir.join(format!("{}.{}", name, PROFILE_EXT)))
    }

    /// Resolve a profile, creating and saving it interactively on a miss.
    #[instrument(skip(self, prompter))]
    pub fn resolve(&self, name: &str, prompter: &mut dyn Prompter) -> Result<CredentialRecord> {
        if let Some(record) = self.load(name)? {
            debug!("Loaded stored profile");
            return Ok(record);
        }

        info!("No stored profile, creating one");
        let record = self.create(name, prompter)?;
        match self.save(&record, prompter) {
            Ok(_) => {}
            Err(ZoteroError::Aborted) => {
                warn!("Saving the new profile was cancelled, using it for this session only");
            }
            Err(e) => return Err(e),
        }
        Ok(record)
    }

    /// Look up a stored profile. A missing profile is not an error.
    pub fn load(&self, name: &str) -> Result<Option<CredentialRecord>> {
        let path = self.path(name)?;
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let record: CredentialRecord = toml::from_str(&content)?;
        record.validate()?;
        if record.name() != name {
            return Err(ZoteroError::Serialization(format!(
                "{} holds profile '{}'",
                path.display(),
                record.name()
            )));
        }
        Ok(Some(record))
    }

    /// Build a new record from interactive answers.
    ///
    /// Asks for the privacy setting first; private libraries then need an
    /// API key and a library type, public ones are keyless groups. The
    /// library id is asked last.
    ///
    /// # Errors
    ///
    /// - `Environment` if no terminal is attached
    /// - `InvalidInput` if an answer fails validation
    #[instrument(skip(self, prompter))]
    pub fn create(&self, name: &str, prompter: &mut dyn Prompter) -> Result<CredentialRecord> {
        validate_name(name)?;
        if !prompter.is_interactive() {
            return Err(ZoteroError::Environment(format!(
                "profile '{}' does not exist and cannot be created without an interactive terminal",
                name
            )));
        }

        let privacy: Privacy = prompter.ask("Is the library private or public?")?.parse()?;

        let record = match privacy {
            Privacy::Private => {
                let api_key = prompter.ask("API key:")?;
                let library_type: LibraryType =
                    prompter.ask("Library type (users or groups):")?.parse()?;
                let id = prompter.ask(&format!("{} id:", library_type))?;
                CredentialRecord::private(name, id, library_type, api_key)?
            }
            Privacy::Public => {
                let id = prompter.ask("groups id:")?;
                CredentialRecord::public(name, id)?
            }
        };

        info!(library = %record.library_path(), "Created profile");
        Ok(record)
    }

    /// Write a record, asking before replacing an existing one.
    ///
    /// Returns [`SaveOutcome::Kept`] if the user declines the overwrite.
    ///
    /// # Errors
    ///
    /// Returns `Aborted` if the user cancels the overwrite question.
    #[instrument(skip(self, record, prompter), fields(profile_name = %record.name()))]
    pub fn save(
        &self,
        record: &CredentialRecord,
        prompter: &mut dyn Prompter,
    ) -> Result<SaveOutcome> {
        record.validate()?;
        let path = self.path(record.name())?;

        if path.exists() {
            let question = format!("Profile '{}' already exists. Overwrite it?", record.name());
            match prompter.confirm(&question)? {
                Confirmation::Yes => debug!("Overwriting stored profile"),
                Confirmation::No => {
                    info!("Keeping existing profile");
                    return Ok(SaveOutcome::Kept);
                }
                Confirmation::Cancel => return Err(ZoteroError::Aborted),
            }
        }

        create_private_dir(&self.dir)?;
        let content = toml::to_string(record)?;
        write_private(&path, content.as_bytes())?;

        debug!(path = %path.display(), "Saved profile");
        Ok(SaveOutcome::Written)
    }

    /// Names of all stored profiles, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(PROFILE_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Check a profile name is usable as a file name.
fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ZoteroError::invalid_argument("profile name cannot be empty"));
    }

    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(ZoteroError::invalid_argument(format!(
            "profile name '{}' cannot contain path separators",
            name
        )));
    }

    Ok(())
}

/// Create the store directory readable by the owner only.
#[cfg(unix)]
fn create_private_dir(dir: &Path) -> Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)?;
    Ok(())
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    Ok(())
}

/// Write a profile file that is never readable by other users, not even
/// between creation and the first write.
#[cfg(unix)]
fn write_private(path: &Path, content: &[u8]) -> Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // An existing file keeps its old mode on open.
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(content)?;
    Ok(())
}

#[cfg(not(unix))]
fn write_private(path: &Path, content: &[u8]) -> Result<()> {
    fs::write(path, content)?;
    Ok(())
}
