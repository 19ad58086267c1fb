//! Shared cryptographic helpers.
//!
//! Currently this is bearer-token validation: tokens are issued by the
//! external identity service and only verified here.
pub mod jwt;
