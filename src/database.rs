//! Persistence. Everything the service reads or writes goes through [`Store`], so the
//! request layer and the grouping/scoring core never depend on a particular backend.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::{Backend, Config};
use crate::error::StoreError;
use crate::grouping::{GroupValidation, PairCount, StudentPair};
use crate::model::{
    assignment_item::{AssignmentDetail, AssignmentId, AssignmentItem, AssignmentStatus},
    new_user_object::UserRecord,
    student_stats::StudentActivity,
    user_info::{UserId, UserInfo},
};
use crate::scoring::ScoredAssignment;

pub mod memory;
pub mod postgres;
pub mod user;

/// A user together with the material needed to check their password.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: UserInfo,
    pub salt: Vec<u8>,
    pub password_hash: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Creation {
    Created(AssignmentId),
    /// The group broke the collaboration limit when checked inside the creation
    /// transaction. Nothing was written.
    Rejected(GroupValidation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Saved,
    NotFound,
    NotMember,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationOutcome {
    Evaluated,
    NotFound,
    NotOwner,
    NoAnswer,
    AlreadyClosed,
}

#[async_trait]
pub trait Store: Send + Sync {
    // Users and sessions

    /// Returns `None` if the email is already taken.
    async fn create_user(&self, user: &UserRecord) -> Result<Option<UserId>, StoreError>;

    async fn find_credentials(&self, email: &str) -> Result<Option<Credentials>, StoreError>;

    async fn get_user(&self, user_id: UserId) -> Result<Option<UserInfo>, StoreError>;

    /// All students, ordered by name.
    async fn list_students(&self) -> Result<Vec<UserInfo>, StoreError>;

    async fn create_session(
        &self,
        session_hash: &[u8],
        user_id: UserId,
        expiration: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// The owner of a session that has not expired yet.
    async fn session_user(&self, session_hash: &[u8]) -> Result<Option<UserInfo>, StoreError>;

    async fn delete_session(&self, session_hash: &[u8]) -> Result<(), StoreError>;

    // Collaboration history

    /// Number of assignments created by `teacher_id` that have both students as members.
    async fn collaboration_count(
        &self,
        pair: StudentPair,
        teacher_id: UserId,
    ) -> Result<u32, StoreError>;

    /// Counts for many pairs at once. Pairs that never worked together may be left out.
    async fn collaboration_counts(
        &self,
        pairs: &[StudentPair],
        teacher_id: UserId,
    ) -> Result<Vec<PairCount>, StoreError> {
        let mut counts = Vec::with_capacity(pairs.len());
        for pair in pairs {
            let count = self.collaboration_count(*pair, teacher_id).await?;
            counts.push(PairCount { pair: *pair, count });
        }
        Ok(counts)
    }

    /// Every closed, scored assignment of the student, with the size of its group.
    async fn closed_assignments_with_group_size(
        &self,
        student_id: UserId,
    ) -> Result<Vec<ScoredAssignment>, StoreError>;

    // Assignments

    /// Creates an open assignment for `student_ids`, re-checking the collaboration limit
    /// atomically with the insert. Creations by the same teacher are serialized.
    async fn create_assignment(
        &self,
        question: &str,
        teacher_id: UserId,
        student_ids: &[UserId],
    ) -> Result<Creation, StoreError>;

    async fn get_assignment(
        &self,
        assignment_id: AssignmentId,
    ) -> Result<Option<AssignmentDetail>, StoreError>;

    /// Assignments created by a teacher, or given to a student, newest first.
    async fn list_assignments(
        &self,
        user: &UserInfo,
        status: Option<AssignmentStatus>,
    ) -> Result<Vec<AssignmentItem>, StoreError>;

    /// Sets or replaces the answer while the assignment is open.
    async fn submit_answer(
        &self,
        assignment_id: AssignmentId,
        student_id: UserId,
        answer: &str,
    ) -> Result<AnswerOutcome, StoreError>;

    /// Scores the assignment and closes it in the same write.
    async fn evaluate_assignment(
        &self,
        assignment_id: AssignmentId,
        teacher_id: UserId,
        score: i32,
    ) -> Result<EvaluationOutcome, StoreError>;

    /// One entry per student, restricted to assignments created by `teacher_id`.
    async fn student_activity(&self, teacher_id: UserId)
    -> Result<Vec<StudentActivity>, StoreError>;
}

/// Opens the configured backend and seeds the configured accounts.
pub async fn init_store(config: &Config) -> Result<Arc<dyn Store>, String> {
    let store: Arc<dyn Store> = match config.database.backend {
        Backend::Memory => Arc::new(memory::MemoryStore::new()),
        Backend::Postgres => {
            let Some(url) = config.database.url.as_deref() else {
                return Err("database.url (or PSQL_NAME/PSQL_PASS) is required for postgres".into());
            };
            let store = postgres::PgStore::connect(url, config.database.max_connections)
                .await
                .map_err(|e| format!("Could not open database: {e}"))?;
            Arc::new(store)
        }
    };

    for new_user in &config.users {
        match user::register_user(store.as_ref(), new_user).await {
            Ok(Some(id)) => tracing::info!("Seeded {} {} as user {id}", new_user.role, new_user.email),
            Ok(None) => tracing::debug!("User {} already present", new_user.email),
            Err(e) => return Err(format!("Could not seed user {}: {e}", new_user.email)),
        }
    }

    Ok(store)
}
