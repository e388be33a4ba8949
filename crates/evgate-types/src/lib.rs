pub mod address;
pub mod claims;
pub mod fields;
pub mod request;
pub mod response;
pub mod prelude;
