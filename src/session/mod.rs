//! Sign-in state: who is signed in and how that survives restarts.

pub mod store;

pub use store::{FileUserStore, MemoryUserStore, UserStore};

use std::sync::{Arc, PoisonError, RwLock};

use crate::auth::TokenPair;
use crate::client::{ApiClient, InterceptorHandle};
use crate::error::GymError;
use crate::types::{SessionResponse, SignInRequest, SignUpRequest, User};

/// The signed-in user plus the client that acts on their behalf.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use ignite_gym::client::ApiClient;
/// use ignite_gym::session::{FileUserStore, Session};
///
/// # async fn example(client: ApiClient) -> ignite_gym::error::Result<()> {
/// let users = Arc::new(FileUserStore::new_default());
/// let session = Arc::new(Session::new(client, users));
/// let _handle = session.attach();
/// if session.restore().await?.is_none() {
///     session.sign_in("ana@example.com", "123456").await?;
/// }
/// # Ok(())
/// # }
/// ```
pub struct Session {
    client: ApiClient,
    users: Arc<dyn UserStore>,
    user: RwLock<Option<User>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("client", &self.client)
            .field("user", &self.current_user().map(|user| user.email))
            .finish()
    }
}

impl Session {
    pub fn new(client: ApiClient, users: Arc<dyn UserStore>) -> Self {
        Self {
            client,
            users,
            user: RwLock::new(None),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn current_user(&self) -> Option<User> {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.current_user().is_some()
    }

    /// Install [`Session::sign_out`] as the client's session termination
    /// handler, enabling transparent token renewal.
    pub fn attach(self: &Arc<Self>) -> InterceptorHandle {
        let session = Arc::downgrade(self);
        self.client.register_session_termination_handler(move || {
            let session = session.clone();
            async move {
                let Some(session) = session.upgrade() else {
                    return;
                };
                if let Err(error) = session.sign_out().await {
                    tracing::warn!(error = %error, "sign-out after session expiry failed");
                }
            }
        })
    }

    /// Reload the persisted user and tokens, e.g. at start-up.
    pub async fn restore(&self) -> Result<Option<User>, GymError> {
        let user = self.users.load().await?;
        if let Some(pair) = self.client.token_store().load().await? {
            self.client.set_access_token(Some(&pair.access_token))?;
        }
        self.set_user(user.clone());
        Ok(user)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User, GymError> {
        let request = SignInRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: SessionResponse = self.client.post_json("/sessions", &request).await?;

        let pair = TokenPair::new(response.token, response.refresh_token);
        self.client.token_store().save(&pair).await?;
        self.client.set_access_token(Some(&pair.access_token))?;
        self.users.save(&response.user).await?;
        self.set_user(Some(response.user.clone()));
        tracing::info!(user_id = response.user.id, "signed in");
        Ok(response.user)
    }

    /// Create an account, then sign into it.
    pub async fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<User, GymError> {
        let request = SignUpRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        self.client.post("/users", &request).await?;
        self.sign_in(email, password).await
    }

    /// Forget the user and their tokens. Safe to call when signed out.
    ///
    /// Every step runs even if an earlier one fails; the first error is
    /// returned.
    pub async fn sign_out(&self) -> Result<(), GymError> {
        self.set_user(None);
        let bearer = self.client.set_access_token(None);
        let users = self.users.clear().await;
        let tokens = self.client.token_store().clear().await;
        tracing::info!("signed out");
        bearer.and(users).and(tokens)
    }

    fn set_user(&self, user: Option<User>) {
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = user;
    }
}
