pub mod config;

pub use config::{init_logging, log_startup_info, LoggingConfig};
