//! In-process store.
//!
//! Suitable for development and for tests. Nothing survives a restart, and several
//! replicas will not see each other's data.

use std::collections::{BTreeMap, HashMap};
#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::database::{AnswerOutcome, Creation, Credentials, EvaluationOutcome, Store};
use crate::error::StoreError;
use crate::grouping::{self, PairCount, StudentPair};
use crate::model::{
    assignment_item::{AssignmentDetail, AssignmentId, AssignmentItem, AssignmentStatus},
    new_user_object::UserRecord,
    student_stats::StudentActivity,
    user_info::{Role, UserId, UserInfo},
};
use crate::scoring::ScoredAssignment;

struct UserRow {
    info: UserInfo,
    salt: Vec<u8>,
    password_hash: Vec<u8>,
}

struct AssignmentRow {
    question: String,
    teacher_id: UserId,
    status: AssignmentStatus,
    answer: Option<String>,
    score: Option<i32>,
    created_at: DateTime<Utc>,
    answered_at: Option<DateTime<Utc>>,
    evaluated_at: Option<DateTime<Utc>>,
    members: Vec<UserId>,
}

impl AssignmentRow {
    fn has_member(&self, user_id: UserId) -> bool {
        self.members.contains(&user_id)
    }
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, UserRow>,
    sessions: HashMap<Vec<u8>, (UserId, DateTime<Utc>)>,
    assignments: BTreeMap<AssignmentId, AssignmentRow>,
    next_user_id: UserId,
    next_assignment_id: AssignmentId,
}

impl Tables {
    fn collaboration_count(&self, pair: StudentPair, teacher_id: UserId) -> u32 {
        self.assignments
            .values()
            .filter(|a| a.teacher_id == teacher_id)
            .filter(|a| a.has_member(pair.student_a) && a.has_member(pair.student_b))
            .count() as u32
    }

    fn item(&self, id: AssignmentId, row: &AssignmentRow) -> AssignmentItem {
        let teacher_name = self
            .users
            .get(&row.teacher_id)
            .map(|u| u.info.name.clone())
            .unwrap_or_default();

        AssignmentItem {
            id,
            question: row.question.clone(),
            teacher_id: row.teacher_id,
            teacher_name,
            status: row.status,
            answer: row.answer.clone(),
            score: row.score,
            group_size: row.members.len() as i64,
            created_at: row.created_at,
            answered_at: row.answered_at,
            evaluated_at: row.evaluated_at,
        }
    }
}

pub struct MemoryStore {
    tables: RwLock<Tables>,
    #[cfg(test)]
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables {
                next_user_id: 1,
                next_assignment_id: 1,
                ..Default::default()
            }),
            #[cfg(test)]
            unavailable: AtomicBool::new(false),
        }
    }

    #[cfg(not(test))]
    fn check_available(&self) -> Result<(), StoreError> {
        Ok(())
    }

    #[cfg(test)]
    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store switched off".into()));
        }
        Ok(())
    }

    /// Makes every following call fail as if the database were unreachable.
    #[cfg(test)]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Adds a user with an empty password. Email is derived from the name.
    #[cfg(test)]
    pub async fn add_user(&self, name: &str, role: Role) -> UserId {
        let record = UserRecord {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            role,
            salt: vec![],
            password_hash: vec![],
        };
        self.create_user(&record)
            .await
            .unwrap()
            .expect("unique test user")
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: &UserRecord) -> Result<Option<UserId>, StoreError> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.info.email == user.email) {
            return Ok(None);
        }

        let id = tables.next_user_id;
        tables.next_user_id += 1;
        tables.users.insert(
            id,
            UserRow {
                info: UserInfo {
                    id,
                    name: user.name.clone(),
                    email: user.email.clone(),
                    role: user.role,
                },
                salt: user.salt.clone(),
                password_hash: user.password_hash.clone(),
            },
        );
        Ok(Some(id))
    }

    async fn find_credentials(&self, email: &str) -> Result<Option<Credentials>, StoreError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.info.email == email)
            .map(|u| Credentials {
                user: u.info.clone(),
                salt: u.salt.clone(),
                password_hash: u.password_hash.clone(),
            }))
    }

    async fn get_user(&self, user_id: UserId) -> Result<Option<UserInfo>, StoreError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables.users.get(&user_id).map(|u| u.info.clone()))
    }

    async fn list_students(&self) -> Result<Vec<UserInfo>, StoreError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        let mut students = tables
            .users
            .values()
            .filter(|u| u.info.is_student())
            .map(|u| u.info.clone())
            .collect::<Vec<UserInfo>>();
        students.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(students)
    }

    async fn create_session(
        &self,
        session_hash: &[u8],
        user_id: UserId,
        expiration: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        tables
            .sessions
            .insert(session_hash.to_vec(), (user_id, expiration));
        Ok(())
    }

    async fn session_user(&self, session_hash: &[u8]) -> Result<Option<UserInfo>, StoreError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        let Some((user_id, expiration)) = tables.sessions.get(session_hash) else {
            return Ok(None);
        };
        if Utc::now() > *expiration {
            return Ok(None);
        }
        Ok(tables.users.get(user_id).map(|u| u.info.clone()))
    }

    async fn delete_session(&self, session_hash: &[u8]) -> Result<(), StoreError> {
        self.check_available()?;
        self.tables.write().await.sessions.remove(session_hash);
        Ok(())
    }

    async fn collaboration_count(
        &self,
        pair: StudentPair,
        teacher_id: UserId,
    ) -> Result<u32, StoreError> {
        self.check_available()?;
        Ok(self
            .tables
            .read()
            .await
            .collaboration_count(pair, teacher_id))
    }

    async fn collaboration_counts(
        &self,
        pairs: &[StudentPair],
        teacher_id: UserId,
    ) -> Result<Vec<PairCount>, StoreError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(pairs
            .iter()
            .map(|pair| PairCount {
                pair: *pair,
                count: tables.collaboration_count(*pair, teacher_id),
            })
            .collect())
    }

    async fn closed_assignments_with_group_size(
        &self,
        student_id: UserId,
    ) -> Result<Vec<ScoredAssignment>, StoreError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables
            .assignments
            .values()
            .rev()
            .filter(|a| a.status == AssignmentStatus::Closed && a.score.is_some())
            .filter(|a| a.has_member(student_id))
            .map(|a| ScoredAssignment {
                score: a.score,
                group_size: a.members.len() as i64,
            })
            .collect())
    }

    async fn create_assignment(
        &self,
        question: &str,
        teacher_id: UserId,
        student_ids: &[UserId],
    ) -> Result<Creation, StoreError> {
        self.check_available()?;
        // The write lock is held across check and insert.
        let mut tables = self.tables.write().await;

        let counts = grouping::student_pairs(student_ids)
            .into_iter()
            .map(|pair| PairCount {
                pair,
                count: tables.collaboration_count(pair, teacher_id),
            })
            .collect::<Vec<PairCount>>();
        let validation = grouping::judge(counts);
        if !validation.is_valid {
            return Ok(Creation::Rejected(validation));
        }

        let mut members = student_ids.to_vec();
        members.sort_unstable();
        members.dedup();

        let id = tables.next_assignment_id;
        tables.next_assignment_id += 1;
        tables.assignments.insert(
            id,
            AssignmentRow {
                question: question.to_string(),
                teacher_id,
                status: AssignmentStatus::Open,
                answer: None,
                score: None,
                created_at: Utc::now(),
                answered_at: None,
                evaluated_at: None,
                members,
            },
        );
        Ok(Creation::Created(id))
    }

    async fn get_assignment(
        &self,
        assignment_id: AssignmentId,
    ) -> Result<Option<AssignmentDetail>, StoreError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        let Some(row) = tables.assignments.get(&assignment_id) else {
            return Ok(None);
        };

        let mut members = row
            .members
            .iter()
            .filter_map(|id| tables.users.get(id))
            .map(|u| u.info.clone())
            .collect::<Vec<UserInfo>>();
        members.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(Some(AssignmentDetail {
            assignment: tables.item(assignment_id, row),
            members,
        }))
    }

    async fn list_assignments(
        &self,
        user: &UserInfo,
        status: Option<AssignmentStatus>,
    ) -> Result<Vec<AssignmentItem>, StoreError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables
            .assignments
            .iter()
            .rev()
            .filter(|(_, a)| match user.role {
                Role::Teacher => a.teacher_id == user.id,
                Role::Student => a.has_member(user.id),
            })
            .filter(|(_, a)| status.is_none_or(|s| a.status == s))
            .map(|(id, a)| tables.item(*id, a))
            .collect())
    }

    async fn submit_answer(
        &self,
        assignment_id: AssignmentId,
        student_id: UserId,
        answer: &str,
    ) -> Result<AnswerOutcome, StoreError> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        let Some(row) = tables.assignments.get_mut(&assignment_id) else {
            return Ok(AnswerOutcome::NotFound);
        };
        if !row.has_member(student_id) {
            return Ok(AnswerOutcome::NotMember);
        }
        if row.status != AssignmentStatus::Open {
            return Ok(AnswerOutcome::Closed);
        }

        row.answer = Some(answer.to_string());
        row.answered_at = Some(Utc::now());
        Ok(AnswerOutcome::Saved)
    }

    async fn evaluate_assignment(
        &self,
        assignment_id: AssignmentId,
        teacher_id: UserId,
        score: i32,
    ) -> Result<EvaluationOutcome, StoreError> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        let Some(row) = tables.assignments.get_mut(&assignment_id) else {
            return Ok(EvaluationOutcome::NotFound);
        };
        if row.teacher_id != teacher_id {
            return Ok(EvaluationOutcome::NotOwner);
        }
        if row.status == AssignmentStatus::Closed {
            return Ok(EvaluationOutcome::AlreadyClosed);
        }
        if row.answer.is_none() {
            return Ok(EvaluationOutcome::NoAnswer);
        }

        row.score = Some(score);
        row.status = AssignmentStatus::Closed;
        row.evaluated_at = Some(Utc::now());
        Ok(EvaluationOutcome::Evaluated)
    }

    async fn student_activity(
        &self,
        teacher_id: UserId,
    ) -> Result<Vec<StudentActivity>, StoreError> {
        self.check_available()?;
        let tables = self.tables.read().await;

        let mut activity = tables
            .users
            .values()
            .filter(|u| u.info.is_student())
            .map(|u| {
                let mut entry = StudentActivity {
                    student: u.info.clone(),
                    open_assignments: 0,
                    closed_assignments: 0,
                    scored: vec![],
                };
                for a in tables
                    .assignments
                    .values()
                    .filter(|a| a.teacher_id == teacher_id && a.has_member(u.info.id))
                {
                    match a.status {
                        AssignmentStatus::Open => entry.open_assignments += 1,
                        AssignmentStatus::Closed => {
                            entry.closed_assignments += 1;
                            entry.scored.push(ScoredAssignment {
                                score: a.score,
                                group_size: a.members.len() as i64,
                            });
                        }
                    }
                }
                entry
            })
            .collect::<Vec<StudentActivity>>();

        activity.sort_by(|a, b| a.student.name.cmp(&b.student.name));
        Ok(activity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        store: MemoryStore,
        teacher: UserId,
        other_teacher: UserId,
        students: Vec<UserId>,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let teacher = store.add_user("Maria Rossi", Role::Teacher).await;
        let other_teacher = store.add_user("Paolo Verdi", Role::Teacher).await;
        let mut students = vec![];
        for name in ["Anna", "Bruno", "Carla", "Dario"] {
            students.push(store.add_user(name, Role::Student).await);
        }
        Fixture {
            store,
            teacher,
            other_teacher,
            students,
        }
    }

    async fn create(f: &Fixture, teacher: UserId, members: &[UserId]) -> AssignmentId {
        match f
            .store
            .create_assignment("Explain ownership", teacher, members)
            .await
            .unwrap()
        {
            Creation::Created(id) => id,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn third_grouping_of_a_pair_is_rejected_atomically() {
        let f = fixture().await;
        let pair = &f.students[0..2];
        create(&f, f.teacher, pair).await;
        create(&f, f.teacher, pair).await;

        let res = f
            .store
            .create_assignment("again", f.teacher, &f.students)
            .await
            .unwrap();
        let Creation::Rejected(validation) = res else {
            panic!("expected a rejection, got {res:?}");
        };
        assert_eq!(validation.violating_pairs.len(), 1);
        assert_eq!(validation.violating_pairs[0].count, 2);

        let teacher = f.store.get_user(f.teacher).await.unwrap().unwrap();
        assert_eq!(f.store.list_assignments(&teacher, None).await.unwrap().len(), 2);

        // Another teacher is not bound by this history.
        create(&f, f.other_teacher, pair).await;
    }

    #[tokio::test]
    async fn answers_only_from_members_while_open() {
        let f = fixture().await;
        let id = create(&f, f.teacher, &f.students[0..2]).await;

        assert_eq!(
            f.store.submit_answer(id, f.students[3], "mine").await.unwrap(),
            AnswerOutcome::NotMember
        );
        assert_eq!(
            f.store.submit_answer(99, f.students[0], "mine").await.unwrap(),
            AnswerOutcome::NotFound
        );
        assert_eq!(
            f.store.submit_answer(id, f.students[0], "draft").await.unwrap(),
            AnswerOutcome::Saved
        );
        assert_eq!(
            f.store.submit_answer(id, f.students[1], "final").await.unwrap(),
            AnswerOutcome::Saved
        );

        let detail = f.store.get_assignment(id).await.unwrap().unwrap();
        assert_eq!(detail.assignment.answer.as_deref(), Some("final"));
        assert!(detail.assignment.answered_at.is_some());

        f.store.evaluate_assignment(id, f.teacher, 25).await.unwrap();
        assert_eq!(
            f.store.submit_answer(id, f.students[0], "late").await.unwrap(),
            AnswerOutcome::Closed
        );
    }

    #[tokio::test]
    async fn evaluation_closes_and_scores_together() {
        let f = fixture().await;
        let id = create(&f, f.teacher, &f.students[0..3]).await;

        assert_eq!(
            f.store.evaluate_assignment(id, f.teacher, 20).await.unwrap(),
            EvaluationOutcome::NoAnswer
        );
        f.store.submit_answer(id, f.students[0], "answer").await.unwrap();
        assert_eq!(
            f.store.evaluate_assignment(id, f.other_teacher, 20).await.unwrap(),
            EvaluationOutcome::NotOwner
        );
        assert_eq!(
            f.store.evaluate_assignment(id, f.teacher, 20).await.unwrap(),
            EvaluationOutcome::Evaluated
        );

        let a = f.store.get_assignment(id).await.unwrap().unwrap().assignment;
        assert_eq!(a.status, AssignmentStatus::Closed);
        assert_eq!(a.score, Some(20));
        assert!(a.evaluated_at.is_some());

        assert_eq!(
            f.store.evaluate_assignment(id, f.teacher, 30).await.unwrap(),
            EvaluationOutcome::AlreadyClosed
        );
        assert_eq!(
            f.store.evaluate_assignment(404, f.teacher, 30).await.unwrap(),
            EvaluationOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn closed_history_carries_group_sizes() {
        let f = fixture().await;
        let small = create(&f, f.teacher, &f.students[0..2]).await;
        let big = create(&f, f.other_teacher, &f.students[0..4]).await;
        create(&f, f.teacher, &f.students[0..3]).await;

        for (id, teacher, score) in [(small, f.teacher, 30), (big, f.other_teacher, 10)] {
            f.store.submit_answer(id, f.students[0], "a").await.unwrap();
            f.store.evaluate_assignment(id, teacher, score).await.unwrap();
        }

        let history = f
            .store
            .closed_assignments_with_group_size(f.students[0])
            .await
            .unwrap();
        assert_eq!(
            history,
            vec![
                ScoredAssignment {
                    score: Some(10),
                    group_size: 4
                },
                ScoredAssignment {
                    score: Some(30),
                    group_size: 2
                },
            ]
        );
    }

    #[tokio::test]
    async fn activity_is_scoped_to_one_teacher() {
        let f = fixture().await;
        let id = create(&f, f.teacher, &f.students[0..2]).await;
        create(&f, f.teacher, &f.students[1..3]).await;
        create(&f, f.other_teacher, &f.students[0..4]).await;
        f.store.submit_answer(id, f.students[0], "a").await.unwrap();
        f.store.evaluate_assignment(id, f.teacher, 18).await.unwrap();

        let activity = f.store.student_activity(f.teacher).await.unwrap();
        let names = activity
            .iter()
            .map(|a| a.student.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, ["Anna", "Bruno", "Carla", "Dario"]);

        let anna = &activity[0];
        assert_eq!((anna.open_assignments, anna.closed_assignments), (0, 1));
        assert_eq!(anna.scored[0].group_size, 2);

        let bruno = &activity[1];
        assert_eq!((bruno.open_assignments, bruno.closed_assignments), (1, 1));

        let dario = &activity[3];
        assert_eq!((dario.open_assignments, dario.closed_assignments), (0, 0));
    }

    #[tokio::test]
    async fn listings_follow_role_and_status() {
        let f = fixture().await;
        let first = create(&f, f.teacher, &f.students[0..2]).await;
        let second = create(&f, f.teacher, &f.students[1..3]).await;
        f.store.submit_answer(first, f.students[0], "a").await.unwrap();
        f.store.evaluate_assignment(first, f.teacher, 28).await.unwrap();

        let teacher = f.store.get_user(f.teacher).await.unwrap().unwrap();
        let all = f.store.list_assignments(&teacher, None).await.unwrap();
        assert_eq!(all.iter().map(|a| a.id).collect::<Vec<_>>(), [second, first]);

        let anna = f.store.get_user(f.students[0]).await.unwrap().unwrap();
        let open = f
            .store
            .list_assignments(&anna, Some(AssignmentStatus::Open))
            .await
            .unwrap();
        assert!(open.is_empty());
        let closed = f
            .store
            .list_assignments(&anna, Some(AssignmentStatus::Closed))
            .await
            .unwrap();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].teacher_name, "Maria Rossi");
    }
}
