//! passkey_session_axum - axum handlers, router and extractor for the
//! passkey-session authentication library.

mod error;
mod passkey;
mod router;
mod session;

pub use error::IntoResponseError;
pub use router::{passkey_session_router, passkey_session_router_no_trace};
pub use session::AuthUser;

// Re-export the route prefix and initialization from the core crate
pub use passkey_session::{PASSKEY_ROUTE_PREFIX, init};
