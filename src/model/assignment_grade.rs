use serde::{Deserialize, Serialize};

use crate::model::assignment_item::AssignmentItem;

/// A student's evaluated assignments and their weighted average (`null` until the
/// first one is scored).
#[derive(Debug, Serialize, Deserialize)]
pub struct AssignmentGrades {
    pub assignments: Vec<AssignmentItem>,
    pub weighted_average: Option<f64>,
}
