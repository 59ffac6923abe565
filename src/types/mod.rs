//! Wire types exchanged with the Ignite Gym backend.

pub mod auth;
pub mod exercise;
pub mod history;
pub mod user;

pub use auth::{ProfileUpdate, SessionResponse, SignInRequest, SignUpRequest};
pub use exercise::Exercise;
pub use history::{HistoryByDay, HistoryEntry, RegisterHistoryRequest};
pub use user::User;
