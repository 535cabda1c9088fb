// Implementations of the blacklist store.

#[cfg(test)]
pub mod in_memory;
pub mod sqlite_store;

#[cfg(test)]
pub use in_memory::InMemoryBlacklistStore;
pub use sqlite_store::SqliteBlacklistStore;
