//! Convenience re-exports for common use.

pub use crate::api::GymApi;
pub use crate::auth::{FileTokenStore, MemoryTokenStore, TokenPair, TokenStore};
pub use crate::client::{ApiClient, ApiRequest, ApiResponse, InterceptorHandle};
pub use crate::config::ClientConfig;
pub use crate::error::{GymError, Result};
pub use crate::session::{FileUserStore, MemoryUserStore, Session, UserStore};
pub use crate::types::{Exercise, HistoryByDay, HistoryEntry, ProfileUpdate, User};
