pub mod kv_store;
pub mod local_session_cache;

pub use kv_store::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use local_session_cache::LocalSessionCache;
