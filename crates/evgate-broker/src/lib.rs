pub mod errors;
#[cfg(feature = "kafka")]
pub mod kafka;
pub mod memory;
pub mod publisher;
pub mod prelude;
