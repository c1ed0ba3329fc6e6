use chrono::{DateTime, Utc};
use sqlx::{FromRow, Row, postgres::PgRow, sqlite::SqliteRow};

use crate::passkey::errors::PasskeyError;
use crate::passkey::types::{CredentialSearchField, PasskeyCredential};
use crate::storage::GENERIC_DATA_STORE;

use super::postgres::{
    create_tables_postgres, delete_credential_postgres, get_credentials_by_field_postgres,
    store_credential_postgres, update_counter_postgres,
};
use super::sqlite::{
    create_tables_sqlite, delete_credential_sqlite, get_credentials_by_field_sqlite,
    store_credential_sqlite, update_counter_sqlite,
};

/// Facade over the durable credential collection. Every method dispatches
/// on the configured data store backend.
pub(crate) struct CredentialStore;

impl CredentialStore {
    pub(crate) async fn init() -> Result<(), PasskeyError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            create_tables_sqlite(pool).await
        } else if let Some(pool) = store.as_postgres() {
            create_tables_postgres(pool).await
        } else {
            Err(PasskeyError::Storage("Unsupported database type".into()))
        }
    }

    /// Persist a credential. A credential id collision is a `Conflict`
    /// unless `allow_overwrite` is set, in which case the stored record is
    /// replaced in place.
    pub(crate) async fn store_credential(
        credential: &PasskeyCredential,
        allow_overwrite: bool,
    ) -> Result<(), PasskeyError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            store_credential_sqlite(pool, credential, allow_overwrite).await
        } else if let Some(pool) = store.as_postgres() {
            store_credential_postgres(pool, credential, allow_overwrite).await
        } else {
            Err(PasskeyError::Storage("Unsupported database type".into()))
        }
    }

    /// Fetch credentials matching `field`, newest first.
    pub(crate) async fn get_credentials_by(
        field: CredentialSearchField,
    ) -> Result<Vec<PasskeyCredential>, PasskeyError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            get_credentials_by_field_sqlite(pool, &field).await
        } else if let Some(pool) = store.as_postgres() {
            get_credentials_by_field_postgres(pool, &field).await
        } else {
            Err(PasskeyError::Storage("Unsupported database type".into()))
        }
    }

    /// Fetch the single credential matching `field`, if any.
    pub(crate) async fn find_credential(
        field: CredentialSearchField,
    ) -> Result<Option<PasskeyCredential>, PasskeyError> {
        Ok(Self::get_credentials_by(field).await?.into_iter().next())
    }

    /// Advance the signature counter and refresh `last_used_at`.
    ///
    /// Compare-and-set: the update applies only while the stored counter
    /// still equals `expected`; otherwise a concurrent authentication won
    /// the race and the transition is reported as a regression.
    pub(crate) async fn update_counter(
        credential_id: &str,
        expected: u32,
        new: u32,
    ) -> Result<(), PasskeyError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            update_counter_sqlite(pool, credential_id, expected, new).await
        } else if let Some(pool) = store.as_postgres() {
            update_counter_postgres(pool, credential_id, expected, new).await
        } else {
            Err(PasskeyError::Storage("Unsupported database type".into()))
        }
    }

    /// Delete a credential by its surrogate record id.
    pub(crate) async fn delete_credential(id: &str) -> Result<(), PasskeyError> {
        let store = GENERIC_DATA_STORE.lock().await;

        if let Some(pool) = store.as_sqlite() {
            delete_credential_sqlite(pool, id).await
        } else if let Some(pool) = store.as_postgres() {
            delete_credential_postgres(pool, id).await
        } else {
            Err(PasskeyError::Storage("Unsupported database type".into()))
        }
    }
}

pub(super) fn serialize_transports(credential: &PasskeyCredential) -> String {
    serde_json::to_string(&credential.transports).unwrap_or_else(|_| "[]".to_string())
}

fn deserialize_transports(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

// The flattened table rows fold back into PasskeyCredential; transports
// travel as a JSON text column on both backends.

impl<'r> FromRow<'r, SqliteRow> for PasskeyCredential {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let counter: i64 = row.try_get("counter")?;
        let transports: String = row.try_get("transports")?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;
        let last_used_at: DateTime<Utc> = row.try_get("last_used_at")?;

        Ok(PasskeyCredential {
            id: row.try_get("id")?,
            credential_id: row.try_get("credential_id")?,
            user_id: row.try_get("user_id")?,
            public_key: row.try_get("public_key")?,
            counter: counter as u32,
            credential_device_type: row.try_get("credential_device_type")?,
            credential_backed_up: row.try_get("credential_backed_up")?,
            device_name: row.try_get("device_name")?,
            transports: deserialize_transports(&transports),
            created_at,
            last_used_at,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for PasskeyCredential {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let counter: i64 = row.try_get("counter")?;
        let transports: String = row.try_get("transports")?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;
        let last_used_at: DateTime<Utc> = row.try_get("last_used_at")?;

        Ok(PasskeyCredential {
            id: row.try_get("id")?,
            credential_id: row.try_get("credential_id")?,
            user_id: row.try_get("user_id")?,
            public_key: row.try_get("public_key")?,
            counter: counter as u32,
            credential_device_type: row.try_get("credential_device_type")?,
            credential_backed_up: row.try_get("credential_backed_up")?,
            device_name: row.try_get("device_name")?,
            transports: deserialize_transports(&transports),
            created_at,
            last_used_at,
        })
    }
}
