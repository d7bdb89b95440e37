//! Base plugin trait definition.
//!
//! Every shape extractor, built-in or dynamically loaded, implements
//! [`Plugin`] for lifecycle management and identity.

use crate::Result;

/// Base trait all extractor plugins implement.
///
/// # Thread Safety
///
/// Plugins are stored as `Arc<dyn Trait>` and called concurrently, so they
/// must be `Send + Sync` and use interior mutability for any state.
pub trait Plugin: Send + Sync {
    /// Unique plugin identifier: lowercase, kebab-case, no whitespace.
    fn name(&self) -> &str;

    /// Semantic version of this plugin (`MAJOR.MINOR.PATCH`).
    fn version(&self) -> String;

    /// Called once at registration. Failure here is logged but does not
    /// block registration: an extractor may still work without its optional
    /// setup step.
    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    /// Called when the plugin is unregistered or the registry shuts down.
    /// Errors are collected by the caller, never raised past it.
    fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    /// Optional description for diagnostics.
    fn description(&self) -> &str {
        ""
    }
}

/// Validate a plugin name before registration.
///
/// Names cannot be empty or contain whitespace.
pub(crate) fn validate_plugin_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(crate::DeckbridgeError::validation("Plugin name cannot be empty"));
    }

    if name.contains(char::is_whitespace) {
        return Err(crate::DeckbridgeError::validation(format!(
            "Plugin name '{}' cannot contain whitespace",
            name
        )));
    }

    Ok(())
}
