pub mod app_config;
pub mod error;
pub mod manager;

pub use app_config::*;
pub use error::*;
pub use manager::*;
