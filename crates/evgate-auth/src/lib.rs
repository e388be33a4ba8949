pub mod errors;
pub mod extract;
pub mod verify;
pub mod prelude;
