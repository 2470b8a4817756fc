pub mod manager;
pub mod memory_store;
pub mod pg_store;
pub mod record;
pub mod store;

pub use manager::DatabaseManager;
pub use memory_store::MemoryStore;
pub use pg_store::PgStore;
pub use record::{Payload, PayloadError, Record};
pub use store::{PageWindow, Predicate, ResourceStore, StoreError};
