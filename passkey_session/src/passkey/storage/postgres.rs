use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::passkey::errors::PasskeyError;
use crate::passkey::types::{CredentialSearchField, PasskeyCredential};
use crate::storage::DB_TABLE_PASSKEY_CREDENTIALS;

use super::credential_store::serialize_transports;

pub(super) async fn create_tables_postgres(pool: &Pool<Postgres>) -> Result<(), PasskeyError> {
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
            created_at TIMESTAMPTZ NOT NULL,
            last_used_at TIMESTAMPTZ NOT NULL
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

pub(super) async fn store_credential_postgres(
    pool: &Pool<Postgres>,
    credential: &PasskeyCredential,
    allow_overwrite: bool,
) -> Result<(), PasskeyError> {
    let table = DB_TABLE_PASSKEY_CREDENTIALS.as_str();
    let conflict_clause = if allow_overwrite {
        r#"
        ON CONFLICT (credential_id) DO UPDATE SET
            user_id = EXCLUDED.user_id,
            public_key = EXCLUDED.public_key,
            counter = EXCLUDED.counter,
            credential_device_type = EXCLUDED.credential_device_type,
            credential_backed_up = EXCLUDED.credential_backed_up,
            device_name = EXCLUDED.device_name,
            transports = EXCLUDED.transports,
            last_used_at = EXCLUDED.last_used_at
        "#
    } else {
        ""
    };

    let result = sqlx::query(&format!(
        r#"
        INSERT INTO {table}
        (id, credential_id, user_id, public_key, counter, credential_device_type,
         credential_backed_up, device_name, transports, created_at, last_used_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
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

pub(super) async fn get_credentials_by_field_postgres(
    pool: &Pool<Postgres>,
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
        "SELECT * FROM {table} WHERE {column} = $1 ORDER BY created_at DESC"
    ))
    .bind(value)
    .fetch_all(pool)
    .await
    .map_err(|e| PasskeyError::Storage(e.to_string()))
}

pub(super) async fn update_counter_postgres(
    pool: &Pool<Postgres>,
    credential_id: &str,
    expected: u32,
    new: u32,
) -> Result<(), PasskeyError> {
    let table = DB_TABLE_PASSKEY_CREDENTIALS.as_str();

    let result = sqlx::query(&format!(
        "UPDATE {table} SET counter = $1, last_used_at = $2 WHERE credential_id = $3 AND counter = $4"
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

pub(super) async fn delete_credential_postgres(
    pool: &Pool<Postgres>,
    id: &str,
) -> Result<(), PasskeyError> {
    let table = DB_TABLE_PASSKEY_CREDENTIALS.as_str();

    sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
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
