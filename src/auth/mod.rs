pub mod credential;
pub mod storage;
pub mod store;

pub use credential::Credential;
pub use storage::{CacheRecord, CredentialStorage, FileStorage, MemoryStorage};
pub use store::CredentialStore;
