//! Layered settings for keysort.
//!
//! Later layers win:
//!
//! 1. Built-in defaults.
//! 2. `config.toml` in the platform config directory (if present).
//! 3. An explicitly requested file (TOML, YAML or JSON by extension).
//! 4. `KEYSORT_*` environment variables (`KEYSORT_MODE=move`).
//!
//! Nothing here checks that paths exist; [`Settings::batch_config`] hands the
//! raw values to [`keysort_library::validate_config`].

pub mod error;
mod settings;

pub use crate::settings::{RuleSetting, Settings, user_config_path};
