mod backend;
mod memory;
mod ttl;

pub use backend::{StoreBackend, StoreError};
pub use memory::MemoryBackend;
pub use ttl::TtlStore;
