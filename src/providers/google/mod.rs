//! Google API access.
//!
//! Gmail and Sheets share one OAuth 2.0 session. The session is acquired once
//! at startup from stored credentials and handed to both clients; neither
//! client touches credential storage itself.

mod session;

pub use session::{GoogleCredentials, GoogleSession};
