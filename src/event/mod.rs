//! Event validation module.
//!
//! Turns untrusted wire payloads into the closed [`Event`] sum type. This is
//! a pure gate: malformed payloads yield a specific [`ValidationError`] and
//! nothing else happens.

mod error;
mod types;
mod validator;

pub use error::ValidationError;
pub use types::{Event, ResyncEntry};
pub use validator::{normalize_domain_score, validate};
