use serde::{Deserialize, Serialize};

use crate::model::user_info::{UserId, UserInfo};
use crate::scoring::ScoredAssignment;

/// Raw per-student history under one teacher, as read from the store.
#[derive(Debug, Clone)]
pub struct StudentActivity {
    pub student: UserInfo,
    pub open_assignments: i64,
    pub closed_assignments: i64,
    pub scored: Vec<ScoredAssignment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentStats {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub open_assignments: i64,
    pub closed_assignments: i64,
    pub total_assignments: i64,
    pub weighted_average: Option<f64>,
}
