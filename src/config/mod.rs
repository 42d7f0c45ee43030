pub mod logging;
pub mod settings;

pub use logging::{init_logging, LoggingConfig, LoggingError};
pub use settings::{ApplicationSettings, SettingsError};
