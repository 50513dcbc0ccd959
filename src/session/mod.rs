//! Client-side session bootstrap: token storage, expiry inspection, and the
//! state machine that resolves a stored token into an authenticated user.

pub mod api;
pub mod error;
pub mod manager;
pub mod store;
pub mod token;

pub use api::{AuthBackend, HttpAuthBackend};
pub use error::SessionError;
pub use manager::{Session, SessionState};
pub use store::{DualTokenStore, MemoryTokenStore, TokenStore};
