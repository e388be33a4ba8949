pub use crate::errors::AuthError;
pub use crate::extract::bearer_token;
pub use crate::verify::TokenVerifier;
