use serde::{Deserialize, Serialize};

/// One exercise of a muscle group.
///
/// `demo` and `thumb` are file names; see
/// [`GymApi::exercise_demo_url`](crate::api::GymApi::exercise_demo_url).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: i64,
    pub name: String,
    pub group: String,
    pub series: u32,
    pub repetitions: u32,
    pub demo: String,
    pub thumb: String,
    pub created_at: String,
    pub updated_at: String,
}
