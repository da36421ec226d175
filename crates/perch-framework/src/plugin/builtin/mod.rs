//! Built-in plugins shipped with the framework.
//!
//! | Plugin | Name | Description |
//! |--------|------|-------------|
//! | [`help_plugin`] | `"help"` | Lists the registered actions on request |
//!
//! The runtime registers the help plugin last, once every other plugin is
//! known, unless `help_enabled` is turned off in the configuration.

pub mod help;

pub use help::{HELP_PLUGIN_NAME, help_plugin};
