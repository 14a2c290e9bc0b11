pub mod output;
#[allow(clippy::module_inception)]
pub mod response;

pub use output::{HandlerOutput, Json, Responder};
pub use response::{JokeResponse, ResponseBody};
