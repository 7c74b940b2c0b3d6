//! Group-formation constraint: no two students may be grouped together by the same
//! teacher more than [`COLLABORATION_LIMIT`] times.
//!
//! The check is split in two halves. [`student_pairs`] and [`judge`] are pure and are
//! shared with the storage backends, which re-run them inside the creation transaction.
//! [`validate_group`] ties them to a [`Store`] for the advisory check done while a
//! teacher is still picking students.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::database::Store;
use crate::error::StoreError;
use crate::model::user_info::UserId;

/// A pair that has already worked together this many times under one teacher may not
/// be grouped again.
pub const COLLABORATION_LIMIT: u32 = 2;

/// Unordered pair of students, stored with the smaller id first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StudentPair {
    pub student_a: UserId,
    pub student_b: UserId,
}

impl StudentPair {
    pub fn new(x: UserId, y: UserId) -> Self {
        Self {
            student_a: x.min(y),
            student_b: x.max(y),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairCount {
    pub pair: StudentPair,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolatingPair {
    pub student_a: UserId,
    pub student_b: UserId,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupValidation {
    pub is_valid: bool,
    pub violating_pairs: Vec<ViolatingPair>,
}

impl GroupValidation {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            violating_pairs: vec![],
        }
    }

    fn from_violations(mut violating_pairs: Vec<ViolatingPair>) -> Self {
        violating_pairs.sort_by_key(|p| (p.student_a, p.student_b));
        Self {
            is_valid: violating_pairs.is_empty(),
            violating_pairs,
        }
    }
}

/// Every unordered pair of distinct ids in `ids`, sorted. Repeated ids count once.
pub fn student_pairs(ids: &[UserId]) -> Vec<StudentPair> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();

    let mut pairs = Vec::with_capacity(ids.len() * ids.len().saturating_sub(1) / 2);
    for (i, a) in ids.iter().enumerate() {
        for b in &ids[i + 1..] {
            pairs.push(StudentPair::new(*a, *b));
        }
    }
    pairs
}

/// Turns raw collaboration counts into a verdict. Pairs missing from `counts` never
/// worked together.
pub fn judge(counts: impl IntoIterator<Item = PairCount>) -> GroupValidation {
    let violations = counts
        .into_iter()
        .filter(|c| c.count >= COLLABORATION_LIMIT)
        .map(|c| ViolatingPair {
            student_a: c.pair.student_a,
            student_b: c.pair.student_b,
            count: c.count,
        })
        .collect();

    GroupValidation::from_violations(violations)
}

/// Checks whether `candidates` may form a group for `teacher_id`.
///
/// Collaborations recorded under other teachers are ignored. A store failure is
/// returned as an error and never reported as an invalid group.
pub async fn validate_group(
    store: &dyn Store,
    candidates: &[UserId],
    teacher_id: UserId,
) -> Result<GroupValidation, StoreError> {
    let pairs = student_pairs(candidates);
    if pairs.is_empty() {
        return Ok(GroupValidation::valid());
    }

    let counts = store.collaboration_counts(&pairs, teacher_id).await?;
    Ok(judge(counts))
}

/// One sentence naming every violating pair, or `None` for a valid group.
///
/// Students missing from `names` are shown by id.
pub fn describe_violations(
    validation: &GroupValidation,
    names: &HashMap<UserId, String>,
) -> Option<String> {
    if validation.is_valid {
        return None;
    }

    let name_of = |id: UserId| {
        names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("#{id}"))
    };

    let pairs = validation
        .violating_pairs
        .iter()
        .map(|p| {
            format!(
                "{} and {} ({} times)",
                name_of(p.student_a),
                name_of(p.student_b),
                p.count
            )
        })
        .collect::<Vec<String>>()
        .join(", ");

    Some(format!(
        "Some students have already worked together on {COLLABORATION_LIMIT} or more assignments: {pairs}"
    ))
}
