//! Configuration module for joinery.
//!
//! Handles fan-out limits, timeouts and paging defaults.

mod settings;

pub use settings::{FanOutSettings, PagingSettings, Settings, SettingsError};
