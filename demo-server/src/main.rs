use axum::{
    Json,
    routing::{Router, get},
};
use serde_json::{Value, json};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use passkey_session_axum::{AuthUser, passkey_session_router};

async fn index(user: Option<AuthUser>) -> Json<Value> {
    match user {
        Some(user) => Json(json!({
            "userId": user.user_id,
            "authMethod": user.auth_method,
        })),
        None => Json(json!({ "userId": null })),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    passkey_session_axum::init().await?;

    let app = Router::new()
        .route("/whoami", get(index))
        .merge(passkey_session_router());

    let addr = std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    tracing::info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
