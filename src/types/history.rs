use serde::{Deserialize, Serialize};

/// A completed exercise recorded in the user's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub name: String,
    pub user_id: i64,
    pub group: String,
    pub hour: String,
    pub exercise_id: i64,
    pub created_at: String,
}

/// History entries grouped under a day heading (`title`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryByDay {
    pub title: String,
    pub data: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterHistoryRequest {
    pub exercise_id: i64,
}
