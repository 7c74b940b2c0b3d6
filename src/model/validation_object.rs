use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::grouping::{self, GroupValidation};
use crate::model::user_info::UserId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictingPair {
    pub student_a: UserId,
    pub student_b: UserId,
    pub student_a_name: Option<String>,
    pub student_b_name: Option<String>,
    pub count: u32,
}

/// Body of the group check, and of a creation request that was refused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupCheckResponse {
    pub is_valid: bool,
    pub error: Option<String>,
    pub conflicting_pairs: Vec<ConflictingPair>,
}

impl GroupCheckResponse {
    pub fn new(validation: &GroupValidation, names: &HashMap<UserId, String>) -> Self {
        let conflicting_pairs = validation
            .violating_pairs
            .iter()
            .map(|p| ConflictingPair {
                student_a: p.student_a,
                student_b: p.student_b,
                student_a_name: names.get(&p.student_a).cloned(),
                student_b_name: names.get(&p.student_b).cloned(),
                count: p.count,
            })
            .collect();

        Self {
            is_valid: validation.is_valid,
            error: grouping::describe_violations(validation, names),
            conflicting_pairs,
        }
    }
}
