pub mod extractor;
pub mod jwt;
pub mod password;
pub mod reset;
pub mod service;

pub use service::{AuthError, AuthService, LoginOutcome};
