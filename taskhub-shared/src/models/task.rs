/// Task model and owner-scoped CRUD operations
///
/// Every read and write here is filtered by the owning user's id. A
/// task whose id exists but belongs to another account produces the
/// same `None` as a missing id, so the API layer returns a uniform 404
/// and callers cannot probe for other users' tasks.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title TEXT NOT NULL,
///     is_completed BOOLEAN NOT NULL DEFAULT FALSE,
///     priority task_priority NOT NULL DEFAULT 'medium',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Task priority, a closed set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

/// Task model
///
/// The owner id is a server-side concern and is never serialized into
/// responses.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID (server-generated)
    pub id: Uuid,

    /// Owning account
    #[serde(skip_serializing)]
    pub user_id: Uuid,

    /// Task title
    pub title: String,

    /// Completion flag
    pub is_completed: bool,

    /// Priority
    pub priority: Priority,

    /// When the task was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a task
///
/// The owner is supplied separately by the handler from the resolved
/// session, never from the draft itself.
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub is_completed: bool,
    pub priority: Priority,
}

/// Partial update; only present fields are changed
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub is_completed: Option<bool>,
    pub priority: Option<Priority>,
}

impl UpdateTask {
    /// True when the patch changes nothing
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.is_completed.is_none() && self.priority.is_none()
    }
}

/// Optional list filters, combined with AND
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Title substring, matched case-insensitively
    pub find: Option<String>,

    /// Completion flag
    pub is_completed: Option<bool>,

    /// Priority
    pub priority: Option<Priority>,

    /// Lower bound on creation time (inclusive)
    pub min_date: Option<DateTime<Utc>>,

    /// Upper bound on creation time (inclusive)
    pub max_date: Option<DateTime<Utc>>,
}

impl TaskFilter {
    /// Appends one `AND` clause per present filter, numbering bind
    /// parameters from `first_bind`
    ///
    /// The bind order is fixed: find, is_completed, priority, min_date,
    /// max_date. [`bind_filters`] binds values in the same order.
    fn sql_clauses(&self, first_bind: usize) -> String {
        let mut sql = String::new();
        let mut bind = first_bind;

        if self.find.is_some() {
            sql.push_str(&format!(" AND title ILIKE ${}", bind));
            bind += 1;
        }
        if self.is_completed.is_some() {
            sql.push_str(&format!(" AND is_completed = ${}", bind));
            bind += 1;
        }
        if self.priority.is_some() {
            sql.push_str(&format!(" AND priority = ${}", bind));
            bind += 1;
        }
        if self.min_date.is_some() {
            sql.push_str(&format!(" AND created_at >= ${}", bind));
            bind += 1;
        }
        if self.max_date.is_some() {
            sql.push_str(&format!(" AND created_at <= ${}", bind));
        }

        sql
    }

    /// Number of bind parameters this filter contributes
    fn bind_count(&self) -> usize {
        [
            self.find.is_some(),
            self.is_completed.is_some(),
            self.priority.is_some(),
            self.min_date.is_some(),
            self.max_date.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }
}

/// Binds filter values in the order declared by `sql_clauses`
fn bind_filters<'q, O>(
    mut q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments>,
    filter: &'q TaskFilter,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments> {
    if let Some(ref find) = filter.find {
        q = q.bind(format!("%{}%", find));
    }
    if let Some(is_completed) = filter.is_completed {
        q = q.bind(is_completed);
    }
    if let Some(priority) = filter.priority {
        q = q.bind(priority);
    }
    if let Some(min_date) = filter.min_date {
        q = q.bind(min_date);
    }
    if let Some(max_date) = filter.max_date {
        q = q.bind(max_date);
    }
    q
}

/// Page request with defaults and a hard cap on page size
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: i64 = 10;
    pub const MAX_LIMIT: i64 = 100;

    /// Clamps page to at least 1 and limit to 1..=100
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(Self::DEFAULT_LIMIT).clamp(1, Self::MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Page descriptor returned alongside a task listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(page: &PageRequest, total: i64) -> Self {
        Self {
            page: page.page,
            limit: page.limit,
            total,
            total_pages: (total + page.limit - 1) / page.limit,
            has_next: page.page * page.limit < total,
            has_prev: page.page > 1,
        }
    }
}

/// Task counts grouped by completion status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionStats {
    pub completed: i64,
    pub pending: i64,
    pub total: i64,
}

/// Number of tasks created on one calendar day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyCount {
    pub day: NaiveDate,
    pub created: i64,
}

const TASK_COLUMNS: &str = "id, user_id, title, is_completed, priority, created_at";

impl Task {
    /// Creates a task owned by `user_id`
    ///
    /// Takes any executor so it can participate in transactions.
    pub async fn create<'e>(
        executor: impl sqlx::PgExecutor<'e>,
        user_id: Uuid,
        data: CreateTask,
    ) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (user_id, title, is_completed, priority)
            VALUES ($1, $2, $3, $4)
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(user_id)
        .bind(data.title)
        .bind(data.is_completed)
        .bind(data.priority)
        .fetch_one(executor)
        .await?;

        Ok(task)
    }

    /// Inserts a batch of tasks for one owner in a single statement
    ///
    /// Callers validate every draft first and wrap this in a transaction
    /// so the batch is all-or-nothing.
    pub async fn create_many<'e>(
        executor: impl sqlx::PgExecutor<'e>,
        user_id: Uuid,
        drafts: &[CreateTask],
    ) -> Result<u64, sqlx::Error> {
        if drafts.is_empty() {
            return Ok(0);
        }

        let mut builder = sqlx::QueryBuilder::new(
            "INSERT INTO tasks (user_id, title, is_completed, priority) ",
        );
        builder.push_values(drafts, |mut row, draft| {
            row.push_bind(user_id)
                .push_bind(&draft.title)
                .push_bind(draft.is_completed)
                .push_bind(draft.priority);
        });

        let result = builder.build().execute(executor).await?;
        Ok(result.rows_affected())
    }

    /// Finds a task by id, scoped to its owner
    ///
    /// Returns `None` both for a missing id and for a task owned by a
    /// different account.
    pub async fn find_by_owner(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE id = $1 AND user_id = $2
            "#,
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists the owner's tasks, filtered and paginated, newest first
    pub async fn list(
        pool: &PgPool,
        user_id: Uuid,
        filter: &TaskFilter,
        page: &PageRequest,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let limit_bind = 2 + filter.bind_count();
        let query = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = $1{} \
             ORDER BY created_at DESC LIMIT ${} OFFSET ${}",
            filter.sql_clauses(2),
            limit_bind,
            limit_bind + 1,
        );

        let q = sqlx::query_as::<_, Task>(&query).bind(user_id);
        let tasks = bind_filters(q, filter)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(pool)
            .await?;

        Ok(tasks)
    }

    /// Counts the owner's tasks matching the filter
    pub async fn count(
        pool: &PgPool,
        user_id: Uuid,
        filter: &TaskFilter,
    ) -> Result<i64, sqlx::Error> {
        let query = format!(
            "SELECT COUNT(*) FROM tasks WHERE user_id = $1{}",
            filter.sql_clauses(2),
        );

        let q = sqlx::query_as::<_, (i64,)>(&query).bind(user_id);
        let (count,) = bind_filters(q, filter).fetch_one(pool).await?;

        Ok(count)
    }

    /// Applies a partial update to an owned task
    ///
    /// Only present fields are changed. Returns `None` under the same
    /// indistinguishability rule as [`find_by_owner`]. Callers must
    /// reject an empty patch before calling.
    pub async fn update(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build the SET list from the fields present in the patch
        let mut sets = Vec::new();
        let mut bind = 3;

        if data.title.is_some() {
            sets.push(format!("title = ${}", bind));
            bind += 1;
        }
        if data.is_completed.is_some() {
            sets.push(format!("is_completed = ${}", bind));
            bind += 1;
        }
        if data.priority.is_some() {
            sets.push(format!("priority = ${}", bind));
        }

        let query = format!(
            "UPDATE tasks SET {} WHERE id = $1 AND user_id = $2 RETURNING {TASK_COLUMNS}",
            sets.join(", "),
        );

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id).bind(user_id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(is_completed) = data.is_completed {
            q = q.bind(is_completed);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Counts the owner's tasks grouped by completion status
    pub async fn completion_stats(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<CompletionStats, sqlx::Error> {
        let (completed, pending) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE is_completed),
                COUNT(*) FILTER (WHERE NOT is_completed)
            FROM tasks
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(CompletionStats {
            completed,
            pending,
            total: completed + pending,
        })
    }

    /// Counts the owner's tasks created since `since`, grouped by
    /// calendar day, oldest day first
    pub async fn daily_created_counts(
        pool: &PgPool,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyCount>, sqlx::Error> {
        let rows = sqlx::query_as::<_, (NaiveDate, i64)>(
            r#"
            SELECT created_at::date, COUNT(*)
            FROM tasks
            WHERE user_id = $1 AND created_at >= $2
            GROUP BY 1
            ORDER BY 1
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(day, created)| DailyCount { day, created })
            .collect())
    }

    /// Deletes an owned task, returning the deleted record
    ///
    /// Returns `None` under the same indistinguishability rule as
    /// [`find_by_owner`].
    pub async fn delete(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            DELETE FROM tasks
            WHERE id = $1 AND user_id = $2
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"high\"");
        let parsed: Priority = serde_json::from_str("\"low\"").unwrap();
        assert_eq!(parsed, Priority::Low);
    }

    #[test]
    fn test_priority_rejects_unknown_value() {
        let parsed: Result<Priority, _> = serde_json::from_str("\"urgent\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_priority_default_is_medium() {
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn test_task_owner_is_not_serialized() {
        let task = Task {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "buy milk".to_string(),
            is_completed: false,
            priority: Priority::Medium,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&task).unwrap();
        assert!(json.get("user_id").is_none());
        assert_eq!(json["title"], "buy milk");
        assert_eq!(json["is_completed"], false);
    }

    #[test]
    fn test_filter_sql_clauses_empty() {
        let filter = TaskFilter::default();
        assert_eq!(filter.sql_clauses(2), "");
        assert_eq!(filter.bind_count(), 0);
    }

    #[test]
    fn test_filter_sql_clauses_all_present() {
        let filter = TaskFilter {
            find: Some("milk".to_string()),
            is_completed: Some(false),
            priority: Some(Priority::High),
            min_date: Some(Utc::now()),
            max_date: Some(Utc::now()),
        };

        assert_eq!(
            filter.sql_clauses(2),
            " AND title ILIKE $2 AND is_completed = $3 AND priority = $4 \
             AND created_at >= $5 AND created_at <= $6"
        );
        assert_eq!(filter.bind_count(), 5);
    }

    #[test]
    fn test_filter_sql_clauses_sparse() {
        let filter = TaskFilter {
            priority: Some(Priority::Low),
            max_date: Some(Utc::now()),
            ..Default::default()
        };

        assert_eq!(
            filter.sql_clauses(2),
            " AND priority = $2 AND created_at <= $3"
        );
    }

    #[test]
    fn test_page_request_defaults_and_clamping() {
        let page = PageRequest::new(None, None);
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 10);
        assert_eq!(page.offset(), 0);

        let page = PageRequest::new(Some(0), Some(0));
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 1);

        let page = PageRequest::new(Some(3), Some(500));
        assert_eq!(page.limit, 100);
        assert_eq!(page.offset(), 200);
    }

    #[test]
    fn test_pagination_math() {
        let page = PageRequest::new(Some(2), Some(10));
        let pagination = Pagination::new(&page, 25);

        assert_eq!(pagination.total, 25);
        assert_eq!(pagination.total_pages, 3);
        assert!(pagination.has_next);
        assert!(pagination.has_prev);

        let last = Pagination::new(&PageRequest::new(Some(3), Some(10)), 25);
        assert!(!last.has_next);

        let empty = Pagination::new(&PageRequest::default(), 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next);
        assert!(!empty.has_prev);
    }

    #[test]
    fn test_daily_count_serializes_day_as_date() {
        let count = DailyCount {
            day: NaiveDate::from_ymd_opt(2026, 8, 30).unwrap(),
            created: 4,
        };

        let json = serde_json::to_value(&count).unwrap();
        assert_eq!(json["day"], "2026-08-30");
        assert_eq!(json["created"], 4);
    }

    #[test]
    fn test_update_task_is_empty() {
        assert!(UpdateTask::default().is_empty());
        assert!(!UpdateTask {
            title: Some("new".to_string()),
            ..Default::default()
        }
        .is_empty());
    }
}
