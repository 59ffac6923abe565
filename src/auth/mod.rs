//! Credential types and token persistence.

pub mod store;
pub mod token;

pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use token::TokenPair;
