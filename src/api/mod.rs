//! Typed access to the Ignite Gym REST endpoints.

use reqwest::Url;

use crate::client::ApiClient;
use crate::error::GymError;
use crate::types::{Exercise, HistoryByDay, ProfileUpdate, RegisterHistoryRequest};

/// Endpoint wrapper over an [`ApiClient`].
///
/// Every call goes through the client, so expired tokens are renewed
/// transparently once a session termination handler is installed.
///
/// # Example
/// ```no_run
/// use ignite_gym::api::GymApi;
/// use ignite_gym::client::ApiClient;
///
/// # async fn example(client: ApiClient) -> ignite_gym::error::Result<()> {
/// let api = GymApi::new(client);
/// for group in api.groups().await? {
///     let exercises = api.exercises_by_group(&group).await?;
///     println!("{group}: {}", exercises.len());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GymApi {
    client: ApiClient,
}

impl GymApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Muscle groups that have exercises.
    pub async fn groups(&self) -> Result<Vec<String>, GymError> {
        self.client.get_json("/groups").await
    }

    pub async fn exercises_by_group(&self, group: &str) -> Result<Vec<Exercise>, GymError> {
        let url = self.endpoint(&["exercises", "bygroup", group])?;
        self.client.get_json(&url).await
    }

    pub async fn exercise(&self, id: i64) -> Result<Exercise, GymError> {
        let url = self.endpoint(&["exercises", &id.to_string()])?;
        self.client.get_json(&url).await
    }

    /// Mark an exercise as done now.
    pub async fn register_history(&self, exercise_id: i64) -> Result<(), GymError> {
        self.client
            .post("/history", &RegisterHistoryRequest { exercise_id })
            .await?;
        Ok(())
    }

    /// Completed exercises grouped by day, most recent first.
    pub async fn history(&self) -> Result<Vec<HistoryByDay>, GymError> {
        self.client.get_json("/history").await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), GymError> {
        if update.password.is_some() != update.old_password.is_some() {
            return Err(GymError::InvalidArgument(
                "changing the password requires both the old and the new password".to_string(),
            ));
        }
        self.client.put("/users", update).await?;
        Ok(())
    }

    pub fn exercise_demo_url(&self, demo: &str) -> Result<String, GymError> {
        self.endpoint(&["exercise", "demo", demo])
    }

    pub fn exercise_thumb_url(&self, thumb: &str) -> Result<String, GymError> {
        self.endpoint(&["exercise", "thumb", thumb])
    }

    pub fn avatar_url(&self, file: &str) -> Result<String, GymError> {
        self.endpoint(&["avatar", file])
    }

    /// Absolute URL under the base origin with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<String, GymError> {
        let base = &self.client.config().base_url;
        let mut url = Url::parse(base)
            .map_err(|e| GymError::Configuration(format!("invalid base URL {base:?}: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| GymError::Configuration(format!("base URL {base:?} cannot hold a path")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url.into())
    }
}
