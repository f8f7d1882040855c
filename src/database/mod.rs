pub mod connection;
pub mod memory_store;
pub mod sea_store;
pub mod store;

pub use connection::{DbPool, create_pool, run_migrations};
pub use memory_store::MemoryStore;
pub use sea_store::SeaOrmStore;
pub use store::{
    CodeGuard, CodeStore, CodeUpdate, ConditionalUpdate, RequestContext, WinnerRegistry,
};

#[cfg(test)]
pub mod test_support;
