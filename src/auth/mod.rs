//! Authentication module
//!
//! Password hashing, session token issuance and validation, and the
//! registration/sign-in flows built on top of them.

pub mod handlers;
pub mod hasher;
pub mod service;
pub mod token;

pub use service::AuthService;
pub use token::{AccessToken, TokenCodec};
