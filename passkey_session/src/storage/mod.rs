mod cache_store;
mod data_store;
mod errors;
mod types;

pub(crate) use cache_store::{CacheStore, GENERIC_CACHE_STORE};
pub(crate) use data_store::{DB_TABLE_PASSKEY_CREDENTIALS, GENERIC_DATA_STORE};
pub(crate) use errors::StorageError;
pub(crate) use types::CacheData;

/// Touch both store singletons so configuration problems surface at startup.
pub(crate) async fn init() -> Result<(), StorageError> {
    let _ = GENERIC_DATA_STORE.lock().await;
    GENERIC_CACHE_STORE.lock().await.init().await?;

    Ok(())
}
