use chrono::Utc;
use sqlx::{Pool, Sqlite};

use crate::passkey::errors::PasskeyError;
use crate::passkey::types::{CredentialSearchField, PasskeyCredential};
use crate::storage::DB_TABLE_PASSKEY_CREDENTIALS;

use super::credential_store::serialize_transports;

pub(super) async fn create_tables_sqlite(pool: &Pool<Sqlite>) -> Result<(), PasskeyError> {
    let table = DB_TABLE_PASSKEY_CREDENTIALS.as_str();

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            id TEXT PRIMARY KEY NOT NULL,
            credential_id TEXT NOT NULL UNIQUE,
            user_id TEXT NOT NULL,
            public_key TEXT NOT NULL,
            counter BIGINT NOT NULL DEFAULT 0,
            credential_device_type TEXT NOT NULL,
            credential_backed_up BOOLEAN NOT NULL DEFAULT FALSE,
            device_name TEXT NOT NULL DEFAULT '',
            transports TEXT NOT NULL DEFAULT '[]',
            created_at TIMESTAMP NOT NULL,
            last_used_at TIMESTAMP NOT NULL
        )
        "#
    ))
    .execute(pool)
    .await
    .map_err(|e| PasskeyError::Storage(e.to_string()))?;

    sqlx::query(&format!(
        "CREATE INDEX IF NOT EXISTS idx_{}_user_id ON {}(user_id)",
        table.replace('.', "_"),
        table
    ))
    .execute(pool)
    .await
    .map_err(|e| PasskeyError::Storage(e.to_string()))?;

    Ok(())
}

pub(super) async fn store_credential_sqlite(
    pool: &Pool<Sqlite>,
    credential: &PasskeyCredential,
    allow_overwrite: bool,
) -> Result<(), PasskeyError> {
    let table = DB_TABLE_PASSKEY_CREDENTIALS.as_str();
    let conflict_clause = if allow_overwrite {
        r#"
        ON CONFLICT(credential_id) DO UPDATE SET
            user_id = excluded.user_id,
            public_key = excluded.public_key,
            counter = excluded.counter,
            credential_device_type = excluded.credential_device_type,
            credential_backed_up = excluded.credential_backed_up,
            device_name = excluded.device_name,
            transports = excluded.transports,
            last_used_at = excluded.last_used_at
        "#
    } else {
        ""
    };

    let result = sqlx::query(&format!(
        r#"
        INSERT INTO {table}
        (id, credential_id, user_id, public_key, counter, credential_device_type,
         credential_backed_up, device_name, transports, created_at, last_used_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        {conflict_clause}
        "#
    ))
    .bind(&credential.id)
    .bind(&credential.credential_id)
    .bind(&credential.user_id)
    .bind(&credential.public_key)
    .bind(credential.counter as i64)
    .bind(&credential.credential_device_type)
    .bind(credential.credential_backed_up)
    .bind(&credential.device_name)
    .bind(serialize_transports(credential))
    .bind(credential.created_at)
    .bind(credential.last_used_at)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(e) if is_unique_violation(&e) => Err(PasskeyError::Conflict(
            "Credential id already registered".to_string(),
        )),
        Err(e) => Err(PasskeyError::Storage(e.to_string())),
    }
}

pub(super) async fn get_credentials_by_field_sqlite(
    pool: &Pool<Sqlite>,
    field: &CredentialSearchField,
) -> Result<Vec<PasskeyCredential>, PasskeyError> {
    let table = DB_TABLE_PASSKEY_CREDENTIALS.as_str();
    let (column, value) = match field {
        CredentialSearchField::Id(id) => ("id", id.as_str()),
        CredentialSearchField::CredentialId(credential_id) => {
            ("credential_id", credential_id.as_str())
        }
        CredentialSearchField::UserId(user_id) => ("user_id", user_id.as_str()),
    };

    sqlx::query_as::<_, PasskeyCredential>(&format!(
        "SELECT * FROM {table} WHERE {column} = ? ORDER BY created_at DESC"
    ))
    .bind(value)
    .fetch_all(pool)
    .await
    .map_err(|e| PasskeyError::Storage(e.to_string()))
}

pub(super) async fn update_counter_sqlite(
    pool: &Pool<Sqlite>,
    credential_id: &str,
    expected: u32,
    new: u32,
) -> Result<(), PasskeyError> {
    let table = DB_TABLE_PASSKEY_CREDENTIALS.as_str();

    let result = sqlx::query(&format!(
        "UPDATE {table} SET counter = ?, last_used_at = ? WHERE credential_id = ? AND counter = ?"
    ))
    .bind(new as i64)
    .bind(Utc::now())
    .bind(credential_id)
    .bind(expected as i64)
    .execute(pool)
    .await
    .map_err(|e| PasskeyError::Storage(e.to_string()))?;

    if result.rows_affected() == 0 {
        return Err(PasskeyError::CounterRegression {
            stored: expected,
            received: new,
        });
    }

    Ok(())
}

pub(super) async fn delete_credential_sqlite(
    pool: &Pool<Sqlite>,
    id: &str,
) -> Result<(), PasskeyError> {
    let table = DB_TABLE_PASSKEY_CREDENTIALS.as_str();

    sqlx::query(&format!("DELETE FROM {table} WHERE id = ?"))
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| PasskeyError::Storage(e.to_string()))?;

    Ok(())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}
