pub mod method;
#[allow(clippy::module_inception)]
pub mod request;

pub use method::HttpMethod;
pub use request::JokeRequest;
