use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    Executor, PgConnection, Pool, Postgres, Row,
    postgres::{PgPoolOptions, PgRow},
};

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

const ASSIGNMENT_COLUMNS: &str = "a.id, a.question, a.teacher_id, u.name AS teacher_name,
    a.status, a.answer, a.score, a.created_at, a.answered_at, a.evaluated_at,
    (SELECT COUNT(*) FROM assignment_groups g WHERE g.assignment_id = a.id) AS group_size";

pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    conn.execute("SET search_path TO classwork;").await?;
                    Ok(())
                })
            })
            .connect(url)
            .await?;

        init_schema(&pool).await?;
        tracing::info!("Database initialized");

        Ok(Self { pool })
    }
}

async fn init_schema(pool: &Pool<Postgres>) -> Result<(), StoreError> {
    let mut transaction = pool.begin().await?;

    sqlx::query("CREATE SCHEMA IF NOT EXISTS classwork;")
        .execute(&mut *transaction)
        .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users(
            id INTEGER PRIMARY KEY GENERATED ALWAYS AS IDENTITY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            role TEXT NOT NULL CHECK (role IN ('teacher', 'student')),
            salt BYTEA NOT NULL,
            password_hash BYTEA NOT NULL
        );",
    )
    .execute(&mut *transaction)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS sessions(
            session_hash BYTEA PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
            expiration TIMESTAMPTZ NOT NULL
        );",
    )
    .execute(&mut *transaction)
    .await?;

    // Status and score only ever change together.
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS assignments(
            id INTEGER PRIMARY KEY GENERATED ALWAYS AS IDENTITY,
            question TEXT NOT NULL,
            teacher_id INTEGER NOT NULL REFERENCES users (id),
            status TEXT NOT NULL DEFAULT 'open' CHECK (status IN ('open', 'closed')),
            answer TEXT,
            score INTEGER CHECK (score BETWEEN 0 AND 30),
            created_at TIMESTAMPTZ NOT NULL,
            answered_at TIMESTAMPTZ,
            evaluated_at TIMESTAMPTZ,
            CHECK ((status = 'closed') = (score IS NOT NULL))
        );",
    )
    .execute(&mut *transaction)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS assignment_groups(
            assignment_id INTEGER REFERENCES assignments (id) ON DELETE CASCADE,
            student_id INTEGER REFERENCES users (id),
            CONSTRAINT assignment_groups_pkey PRIMARY KEY (assignment_id, student_id)
        );",
    )
    .execute(&mut *transaction)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS assignment_groups_student_idx
        ON assignment_groups (student_id);",
    )
    .execute(&mut *transaction)
    .await?;

    transaction.commit().await?;
    Ok(())
}

fn parse_role(raw: &str) -> Result<Role, StoreError> {
    Role::parse(raw).ok_or_else(|| StoreError::Corrupt(format!("unknown role '{raw}'")))
}

fn user_from_row(row: &PgRow) -> Result<UserInfo, StoreError> {
    let role: String = row.try_get("role")?;
    Ok(UserInfo {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        role: parse_role(&role)?,
    })
}

fn assignment_from_row(row: &PgRow) -> Result<AssignmentItem, StoreError> {
    let status: String = row.try_get("status")?;
    let status = AssignmentStatus::parse(&status)
        .ok_or_else(|| StoreError::Corrupt(format!("unknown status '{status}'")))?;

    Ok(AssignmentItem {
        id: row.try_get("id")?,
        question: row.try_get("question")?,
        teacher_id: row.try_get("teacher_id")?,
        teacher_name: row.try_get("teacher_name")?,
        status,
        answer: row.try_get("answer")?,
        score: row.try_get("score")?,
        group_size: row.try_get("group_size")?,
        created_at: row.try_get("created_at")?,
        answered_at: row.try_get("answered_at")?,
        evaluated_at: row.try_get("evaluated_at")?,
    })
}

fn count_from_row(row: &PgRow, column: &str) -> Result<u32, StoreError> {
    let count: i64 = row.try_get(column)?;
    u32::try_from(count).map_err(|_| StoreError::Corrupt(format!("{column} out of range: {count}")))
}

/// Collaboration counts for all `pairs` in a single query. Works inside a transaction.
async fn pair_counts(
    conn: &mut PgConnection,
    pairs: &[StudentPair],
    teacher_id: UserId,
) -> Result<Vec<PairCount>, StoreError> {
    if pairs.is_empty() {
        return Ok(vec![]);
    }

    let placeholders = (0..pairs.len())
        .map(|i| format!("(${}::INTEGER, ${}::INTEGER)", 2 * i + 1, 2 * i + 2))
        .collect::<Vec<String>>()
        .join(", ");

    let sql = format!(
        "SELECT ag1.student_id AS student_a, ag2.student_id AS student_b,
            COUNT(*) AS collaborations
        FROM assignment_groups ag1
        JOIN assignment_groups ag2 ON ag1.assignment_id = ag2.assignment_id
        JOIN assignments a ON a.id = ag1.assignment_id
        WHERE (ag1.student_id, ag2.student_id) IN (VALUES {placeholders})
        AND a.teacher_id = ${}
        GROUP BY ag1.student_id, ag2.student_id;",
        2 * pairs.len() + 1
    );

    let mut query = sqlx::query(&sql);
    for pair in pairs {
        query = query.bind(pair.student_a).bind(pair.student_b);
    }
    let rows = query.bind(teacher_id).fetch_all(&mut *conn).await?;

    rows.iter()
        .map(|row| -> Result<PairCount, StoreError> {
            Ok(PairCount {
                pair: StudentPair::new(row.try_get("student_a")?, row.try_get("student_b")?),
                count: count_from_row(row, "collaborations")?,
            })
        })
        .collect()
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, user: &UserRecord) -> Result<Option<UserId>, StoreError> {
        let row = sqlx::query(
            "INSERT INTO users (name, email, role, salt, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO NOTHING
            RETURNING id;",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(&user.salt)
        .bind(&user.password_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match row {
            Some(r) => Some(r.try_get("id")?),
            None => None,
        })
    }

    async fn find_credentials(&self, email: &str) -> Result<Option<Credentials>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, email, role, salt, password_hash FROM users WHERE email = $1;",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(Credentials {
            user: user_from_row(&row)?,
            salt: row.try_get("salt")?,
            password_hash: row.try_get("password_hash")?,
        }))
    }

    async fn get_user(&self, user_id: UserId) -> Result<Option<UserInfo>, StoreError> {
        let row = sqlx::query("SELECT id, name, email, role FROM users WHERE id = $1;")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn list_students(&self) -> Result<Vec<UserInfo>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, email, role FROM users WHERE role = 'student' ORDER BY name;",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(user_from_row).collect()
    }

    async fn create_session(
        &self,
        session_hash: &[u8],
        user_id: UserId,
        expiration: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO sessions (session_hash, user_id, expiration) VALUES ($1, $2, $3);",
        )
        .bind(session_hash)
        .bind(user_id)
        .bind(expiration)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn session_user(&self, session_hash: &[u8]) -> Result<Option<UserInfo>, StoreError> {
        let row = sqlx::query(
            "SELECT u.id, u.name, u.email, u.role
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.session_hash = $1 AND s.expiration > $2;",
        )
        .bind(session_hash)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn delete_session(&self, session_hash: &[u8]) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM sessions WHERE session_hash = $1;")
            .bind(session_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn collaboration_count(
        &self,
        pair: StudentPair,
        teacher_id: UserId,
    ) -> Result<u32, StoreError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS collaborations
            FROM assignments a
            JOIN assignment_groups ag1 ON ag1.assignment_id = a.id AND ag1.student_id = $1
            JOIN assignment_groups ag2 ON ag2.assignment_id = a.id AND ag2.student_id = $2
            WHERE a.teacher_id = $3;",
        )
        .bind(pair.student_a)
        .bind(pair.student_b)
        .bind(teacher_id)
        .fetch_one(&self.pool)
        .await?;

        count_from_row(&row, "collaborations")
    }

    async fn collaboration_counts(
        &self,
        pairs: &[StudentPair],
        teacher_id: UserId,
    ) -> Result<Vec<PairCount>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        pair_counts(&mut conn, pairs, teacher_id).await
    }

    async fn closed_assignments_with_group_size(
        &self,
        student_id: UserId,
    ) -> Result<Vec<ScoredAssignment>, StoreError> {
        let rows = sqlx::query(
            "SELECT a.score,
                (SELECT COUNT(*) FROM assignment_groups g WHERE g.assignment_id = a.id) AS group_size
            FROM assignments a
            JOIN assignment_groups ag ON ag.assignment_id = a.id
            WHERE ag.student_id = $1 AND a.status = 'closed' AND a.score IS NOT NULL
            ORDER BY a.id DESC;",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<ScoredAssignment, StoreError> {
                Ok(ScoredAssignment {
                    score: row.try_get("score")?,
                    group_size: row.try_get("group_size")?,
                })
            })
            .collect()
    }

    async fn create_assignment(
        &self,
        question: &str,
        teacher_id: UserId,
        student_ids: &[UserId],
    ) -> Result<Creation, StoreError> {
        let mut transaction = self.pool.begin().await?;

        // Held until commit or rollback, so two creations by one teacher cannot both
        // pass the check below on the same snapshot.
        sqlx::query("SELECT pg_advisory_xact_lock($1);")
            .bind(i64::from(teacher_id))
            .execute(&mut *transaction)
            .await?;

        let pairs = grouping::student_pairs(student_ids);
        let validation = grouping::judge(pair_counts(&mut transaction, &pairs, teacher_id).await?);
        if !validation.is_valid {
            transaction.rollback().await?;
            return Ok(Creation::Rejected(validation));
        }

        let assignment_id: AssignmentId = sqlx::query(
            "INSERT INTO assignments (question, teacher_id, status, created_at)
            VALUES ($1, $2, 'open', $3)
            RETURNING id;",
        )
        .bind(question)
        .bind(teacher_id)
        .bind(Utc::now())
        .fetch_one(&mut *transaction)
        .await?
        .try_get("id")?;

        sqlx::query(
            "INSERT INTO assignment_groups (assignment_id, student_id)
            SELECT DISTINCT $1::INTEGER, UNNEST($2::INTEGER[]);",
        )
        .bind(assignment_id)
        .bind(student_ids)
        .execute(&mut *transaction)
        .await?;

        transaction.commit().await?;
        Ok(Creation::Created(assignment_id))
    }

    async fn get_assignment(
        &self,
        assignment_id: AssignmentId,
    ) -> Result<Option<AssignmentDetail>, StoreError> {
        let sql = format!(
            "SELECT {ASSIGNMENT_COLUMNS}
            FROM assignments a
            JOIN users u ON u.id = a.teacher_id
            WHERE a.id = $1;"
        );
        let Some(row) = sqlx::query(&sql)
            .bind(assignment_id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let member_rows = sqlx::query(
            "SELECT u.id, u.name, u.email, u.role
            FROM users u
            JOIN assignment_groups ag ON ag.student_id = u.id
            WHERE ag.assignment_id = $1
            ORDER BY u.name;",
        )
        .bind(assignment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(AssignmentDetail {
            assignment: assignment_from_row(&row)?,
            members: member_rows
                .iter()
                .map(user_from_row)
                .collect::<Result<Vec<UserInfo>, StoreError>>()?,
        }))
    }

    async fn list_assignments(
        &self,
        user: &UserInfo,
        status: Option<AssignmentStatus>,
    ) -> Result<Vec<AssignmentItem>, StoreError> {
        let sql = match user.role {
            Role::Teacher => format!(
                "SELECT {ASSIGNMENT_COLUMNS}
                FROM assignments a
                JOIN users u ON u.id = a.teacher_id
                WHERE a.teacher_id = $1 AND ($2::TEXT IS NULL OR a.status = $2)
                ORDER BY a.id DESC;"
            ),
            Role::Student => format!(
                "SELECT {ASSIGNMENT_COLUMNS}
                FROM assignments a
                JOIN users u ON u.id = a.teacher_id
                JOIN assignment_groups ag ON ag.assignment_id = a.id
                WHERE ag.student_id = $1 AND ($2::TEXT IS NULL OR a.status = $2)
                ORDER BY a.id DESC;"
            ),
        };

        let rows = sqlx::query(&sql)
            .bind(user.id)
            .bind(status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(assignment_from_row).collect()
    }

    async fn submit_answer(
        &self,
        assignment_id: AssignmentId,
        student_id: UserId,
        answer: &str,
    ) -> Result<AnswerOutcome, StoreError> {
        let mut transaction = self.pool.begin().await?;

        let Some(row) = sqlx::query(
            "SELECT a.status,
                EXISTS (SELECT 1 FROM assignment_groups ag
                        WHERE ag.assignment_id = a.id AND ag.student_id = $2) AS is_member
            FROM assignments a
            WHERE a.id = $1
            FOR UPDATE;",
        )
        .bind(assignment_id)
        .bind(student_id)
        .fetch_optional(&mut *transaction)
        .await?
        else {
            return Ok(AnswerOutcome::NotFound);
        };

        let is_member: bool = row.try_get("is_member")?;
        let status: String = row.try_get("status")?;
        if !is_member {
            return Ok(AnswerOutcome::NotMember);
        }
        if status != AssignmentStatus::Open.as_str() {
            return Ok(AnswerOutcome::Closed);
        }

        sqlx::query("UPDATE assignments SET answer = $1, answered_at = $2 WHERE id = $3;")
            .bind(answer)
            .bind(Utc::now())
            .bind(assignment_id)
            .execute(&mut *transaction)
            .await?;

        transaction.commit().await?;
        Ok(AnswerOutcome::Saved)
    }

    async fn evaluate_assignment(
        &self,
        assignment_id: AssignmentId,
        teacher_id: UserId,
        score: i32,
    ) -> Result<EvaluationOutcome, StoreError> {
        let mut transaction = self.pool.begin().await?;

        let Some(row) = sqlx::query(
            "SELECT teacher_id, status, answer FROM assignments WHERE id = $1 FOR UPDATE;",
        )
        .bind(assignment_id)
        .fetch_optional(&mut *transaction)
        .await?
        else {
            return Ok(EvaluationOutcome::NotFound);
        };

        let owner: UserId = row.try_get("teacher_id")?;
        let status: String = row.try_get("status")?;
        let answer: Option<String> = row.try_get("answer")?;
        if owner != teacher_id {
            return Ok(EvaluationOutcome::NotOwner);
        }
        if status == AssignmentStatus::Closed.as_str() {
            return Ok(EvaluationOutcome::AlreadyClosed);
        }
        if answer.is_none() {
            return Ok(EvaluationOutcome::NoAnswer);
        }

        sqlx::query(
            "UPDATE assignments SET score = $1, status = 'closed', evaluated_at = $2
            WHERE id = $3;",
        )
        .bind(score)
        .bind(Utc::now())
        .bind(assignment_id)
        .execute(&mut *transaction)
        .await?;

        transaction.commit().await?;
        Ok(EvaluationOutcome::Evaluated)
    }

    async fn student_activity(
        &self,
        teacher_id: UserId,
    ) -> Result<Vec<StudentActivity>, StoreError> {
        let rows = sqlx::query(
            "SELECT u.id, u.name, u.email, u.role,
                COUNT(a.id) FILTER (WHERE a.status = 'open') AS open_assignments,
                COUNT(a.id) FILTER (WHERE a.status = 'closed') AS closed_assignments
            FROM users u
            LEFT JOIN assignment_groups ag ON ag.student_id = u.id
            LEFT JOIN assignments a ON a.id = ag.assignment_id AND a.teacher_id = $1
            WHERE u.role = 'student'
            GROUP BY u.id, u.name, u.email, u.role
            ORDER BY u.name;",
        )
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await?;

        let scored_rows = sqlx::query(
            "SELECT ag.student_id, a.score,
                (SELECT COUNT(*) FROM assignment_groups g WHERE g.assignment_id = a.id) AS group_size
            FROM assignments a
            JOIN assignment_groups ag ON ag.assignment_id = a.id
            WHERE a.teacher_id = $1 AND a.status = 'closed'
            ORDER BY a.id;",
        )
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await?;

        let mut scored: HashMap<UserId, Vec<ScoredAssignment>> = HashMap::new();
        for row in &scored_rows {
            let student_id: UserId = row.try_get("student_id")?;
            scored.entry(student_id).or_default().push(ScoredAssignment {
                score: row.try_get("score")?,
                group_size: row.try_get("group_size")?,
            });
        }

        rows.iter()
            .map(|row| -> Result<StudentActivity, StoreError> {
                let student = user_from_row(row)?;
                Ok(StudentActivity {
                    scored: scored.remove(&student.id).unwrap_or_default(),
                    open_assignments: row.try_get("open_assignments")?,
                    closed_assignments: row.try_get("closed_assignments")?,
                    student,
                })
            })
            .collect()
    }
}

/// Runs against the server named by `DATABASE_URL` and is skipped without one.
/// Every run registers fresh users, and counts are per teacher, so reruns do not
/// see each other's assignments.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring;

    async fn store() -> Option<PgStore> {
        let url = std::env::var("DATABASE_URL").ok()?;
        Some(PgStore::connect(&url, 5).await.unwrap())
    }

    async fn user(store: &PgStore, tag: &str, name: &str, role: Role) -> UserId {
        let record = UserRecord {
            name: name.to_string(),
            email: format!("{}.{tag}@example.com", name.to_lowercase()),
            role,
            salt: vec![0; 16],
            password_hash: vec![0; 32],
        };
        store.create_user(&record).await.unwrap().unwrap()
    }

    fn run_tag() -> String {
        let mut bytes = [0u8; 8];
        rand::fill(&mut bytes);
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    async fn created(store: &PgStore, teacher: UserId, members: &[UserId]) -> AssignmentId {
        match store
            .create_assignment("Explain borrowing", teacher, members)
            .await
            .unwrap()
        {
            Creation::Created(id) => id,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn pair_limit_and_statistics_on_postgres() {
        let Some(store) = store().await else {
            eprintln!("DATABASE_URL not set, skipping");
            return;
        };
        let tag = run_tag();
        let teacher = user(&store, &tag, "Maria", Role::Teacher).await;
        let other_teacher = user(&store, &tag, "Paolo", Role::Teacher).await;
        let a = user(&store, &tag, "Anna", Role::Student).await;
        let b = user(&store, &tag, "Bruno", Role::Student).await;
        let c = user(&store, &tag, "Carla", Role::Student).await;

        let first = created(&store, teacher, &[a, b]).await;
        created(&store, teacher, &[a, c]).await;
        created(&store, teacher, &[a, b]).await;

        assert_eq!(
            store.collaboration_count(StudentPair::new(b, a), teacher).await.unwrap(),
            2
        );
        let counts = store
            .collaboration_counts(&[StudentPair::new(a, b), StudentPair::new(a, c)], teacher)
            .await
            .unwrap();
        let count_of = |pair: StudentPair| {
            counts
                .iter()
                .find(|c| c.pair == pair)
                .map_or(0, |c| c.count)
        };
        assert_eq!(count_of(StudentPair::new(a, b)), 2);
        assert_eq!(count_of(StudentPair::new(a, c)), 1);

        let validation = grouping::validate_group(&store, &[a, b, c], teacher)
            .await
            .unwrap();
        assert!(!validation.is_valid);
        assert_eq!(validation.violating_pairs.len(), 1);
        assert_eq!(validation.violating_pairs[0].count, 2);

        let res = store
            .create_assignment("Once more", teacher, &[a, b, c])
            .await
            .unwrap();
        assert!(matches!(res, Creation::Rejected(_)), "got {res:?}");

        let elsewhere = grouping::validate_group(&store, &[a, b], other_teacher)
            .await
            .unwrap();
        assert!(elsewhere.is_valid);

        assert_eq!(
            store.evaluate_assignment(first, teacher, 30).await.unwrap(),
            EvaluationOutcome::NoAnswer
        );
        assert_eq!(
            store.submit_answer(first, c, "not mine").await.unwrap(),
            AnswerOutcome::NotMember
        );
        assert_eq!(
            store.submit_answer(first, b, "ownership moves").await.unwrap(),
            AnswerOutcome::Saved
        );
        assert_eq!(
            store.evaluate_assignment(first, other_teacher, 30).await.unwrap(),
            EvaluationOutcome::NotOwner
        );
        assert_eq!(
            store.evaluate_assignment(first, teacher, 27).await.unwrap(),
            EvaluationOutcome::Evaluated
        );
        assert_eq!(
            store.submit_answer(first, a, "too late").await.unwrap(),
            AnswerOutcome::Closed
        );

        let history = store.closed_assignments_with_group_size(a).await.unwrap();
        assert_eq!(
            history,
            vec![ScoredAssignment {
                score: Some(27),
                group_size: 2
            }]
        );
        assert_eq!(scoring::weighted_average(&history), Some(27.0));

        let activity = store.student_activity(teacher).await.unwrap();
        let anna = activity.iter().find(|s| s.student.id == a).unwrap();
        assert_eq!(anna.open_assignments, 2);
        assert_eq!(anna.closed_assignments, 1);
        let carla = activity.iter().find(|s| s.student.id == c).unwrap();
        assert_eq!((carla.open_assignments, carla.closed_assignments), (1, 0));

        let untouched = store.student_activity(other_teacher).await.unwrap();
        let anna = untouched.iter().find(|s| s.student.id == a).unwrap();
        assert_eq!((anna.open_assignments, anna.closed_assignments), (0, 0));
    }
}
