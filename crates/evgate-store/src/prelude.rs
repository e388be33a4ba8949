pub use crate::errors::StoreError;
pub use crate::filter;
pub use crate::memory::MemoryStore;
pub use crate::spi::DocumentStore;
