//! Client SDK for the Ignite Gym fitness-tracking API.
//!
//! Sign in, browse exercise groups, log completed exercises and edit the
//! profile through an HTTP client that renews expired access tokens on its
//! own: concurrent requests share a single refresh exchange and are replayed
//! with the new token, and the session ends when renewal is impossible.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use ignite_gym::prelude::*;
//!
//! # async fn example() -> ignite_gym::error::Result<()> {
//! let config = ClientConfig::from_env()?;
//! let tokens = Arc::new(FileTokenStore::new(config.data_dir.clone()));
//! let users = Arc::new(FileUserStore::new(config.data_dir.clone()));
//! let client = ApiClient::new(config, tokens)?;
//!
//! let session = Arc::new(Session::new(client.clone(), users));
//! let _handle = session.attach();
//! session.sign_in("ana@example.com", "123456").await?;
//!
//! let api = GymApi::new(client);
//! println!("{:?}", api.groups().await?);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod prelude;
pub mod session;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
