use std::{env, sync::LazyLock};
use tokio::sync::Mutex;

use super::types::{CacheStore, InMemoryCacheStore, RedisCacheStore};

static GENERIC_CACHE_STORE_TYPE: LazyLock<String> = LazyLock::new(|| {
    env::var("GENERIC_CACHE_STORE_TYPE").unwrap_or_else(|_| "memory".to_string())
});

static GENERIC_CACHE_STORE_URL: LazyLock<Option<String>> =
    LazyLock::new(|| env::var("GENERIC_CACHE_STORE_URL").ok());

pub(crate) static GENERIC_CACHE_STORE: LazyLock<Mutex<Box<dyn CacheStore>>> = LazyLock::new(|| {
    let store_type = GENERIC_CACHE_STORE_TYPE.as_str();

    tracing::info!("Initializing cache store with type: {}", store_type);

    let store: Box<dyn CacheStore> = match store_type {
        "memory" => Box::new(InMemoryCacheStore::new()),
        "redis" => {
            let store_url = GENERIC_CACHE_STORE_URL
                .as_deref()
                .expect("GENERIC_CACHE_STORE_URL must be set for the redis cache store");
            let client = match redis::Client::open(store_url) {
                Ok(client) => client,
                Err(e) => {
                    tracing::error!("Failed to create Redis client: {}", e);
                    panic!("Failed to create Redis client: {e}");
                }
            };
            // Connectivity is verified by storage::init() at startup
            Box::new(RedisCacheStore { client })
        }
        t => panic!("Unsupported cache store type: {t}. Supported types are 'memory' and 'redis'"),
    };

    Mutex::new(store)
});
