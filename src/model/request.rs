use serde::{Deserialize, Serialize};

use crate::model::{assignment_item::AssignmentStatus, user_info::UserId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAssignmentRequest {
    pub question: String,
    pub student_ids: Vec<UserId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupCheckRequest {
    pub student_ids: Vec<UserId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub score: i64,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignmentFilter {
    pub status: Option<AssignmentStatus>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsSort {
    #[default]
    Name,
    Total,
    Average,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsQuery {
    pub sort: StatsSort,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CreatedObject {
    pub id: i32,
}
