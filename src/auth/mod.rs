//! Identity boundary. Accounts and token issuance live in the account
//! service; this crate only verifies bearer tokens.

pub mod claims;
pub mod jwt;

pub use jwt::AuthUser;
