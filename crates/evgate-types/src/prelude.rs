pub use crate::address::{Address, SSE, SSE_SETUP};
pub use crate::claims::{Claims, SYSTEM_SUBJECT};
pub use crate::fields;
pub use crate::request::Request;
pub use crate::response::{BodyError, JsonStream, Response, Status};
