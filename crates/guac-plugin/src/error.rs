//! Errors from plugin lookup and initialization.

use std::fmt;

use guac_util::GuacStatus;

/// A failure resolving or initializing a protocol plugin.
#[derive(Debug)]
pub enum PluginError {
    /// No plugin is registered under the requested protocol name.
    NotFound(String),
    /// A plugin was already registered under this name.
    AlreadyRegistered(String),
    /// The name given to [`crate::Registry::register`] contains a wire
    /// framing character (`,` or `;`) and could never be matched against a
    /// client's `select` instruction.
    InvalidName(String),
    /// The plugin's own init function failed, with the status it reported.
    Init(GuacStatus, String),
}

impl fmt::Display for PluginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(name) => write!(f, "no plugin registered for protocol {name:?}"),
            Self::AlreadyRegistered(name) => write!(f, "a plugin is already registered for protocol {name:?}"),
            Self::InvalidName(name) => {
                write!(f, "protocol name {name:?} contains a reserved wire delimiter")
            }
            Self::Init(status, message) => write!(f, "plugin init failed ({status}): {message}"),
        }
    }
}

impl std::error::Error for PluginError {}
