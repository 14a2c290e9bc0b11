pub mod joke_error;
pub mod responses;

pub use joke_error::*;
