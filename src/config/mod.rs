//! Credential profiles and client settings.
//!
//! This module handles resolving named profiles to credentials, persisting
//! them in the per-user configuration directory, and the settings that
//! shape every request.

mod credential;
mod prompt;
mod settings;
mod store;

pub use credential::{CredentialRecord, LibraryType, Privacy};
pub use prompt::{Confirmation, Prompter, TerminalPrompter};
pub use settings::{ClientConfig, API_VERSION, DEFAULT_HOST, DEFAULT_TIMEOUT_SECS};
pub use store::{CredentialStore, SaveOutcome};

#[cfg(test)]
pub(crate) use prompt::testing;
