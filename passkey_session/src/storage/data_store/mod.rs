mod config;
mod types;

pub(crate) use config::{DB_TABLE_PASSKEY_CREDENTIALS, GENERIC_DATA_STORE};
