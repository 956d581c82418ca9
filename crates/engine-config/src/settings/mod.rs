pub mod error;
pub mod export;

pub use error::SettingsError;
pub use export::{ExportSettings, ExportSettingsBuilder};
