pub mod errors;
pub mod filter;
pub mod memory;
pub mod spi;
pub mod prelude;
