use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::user_info::{UserId, UserInfo};

pub type AssignmentId = i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    Open,
    Closed,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Open => "open",
            AssignmentStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(AssignmentStatus::Open),
            "closed" => Some(AssignmentStatus::Closed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentItem {
    pub id: AssignmentId,
    pub question: String,
    pub teacher_id: UserId,
    pub teacher_name: String,
    pub status: AssignmentStatus,
    pub answer: Option<String>,
    pub score: Option<i32>,
    pub group_size: i64,
    pub created_at: DateTime<Utc>,
    pub answered_at: Option<DateTime<Utc>>,
    pub evaluated_at: Option<DateTime<Utc>>,
}

/// An assignment together with the students it was given to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentDetail {
    #[serde(flatten)]
    pub assignment: AssignmentItem,
    pub members: Vec<UserInfo>,
}

impl AssignmentDetail {
    pub fn has_member(&self, user_id: UserId) -> bool {
        self.members.iter().any(|m| m.id == user_id)
    }

    /// Teachers see the assignments they created, students the ones they belong to.
    pub fn visible_to(&self, user: &UserInfo) -> bool {
        if user.is_teacher() {
            self.assignment.teacher_id == user.id
        } else {
            self.has_member(user.id)
        }
    }
}
