/// Task endpoints: owner-scoped CRUD
///
/// Every handler requires the `AuthContext` resolved by the auth gate
/// and scopes its query by the authenticated account. A task id that
/// exists but belongs to someone else yields the same 404 as a missing
/// id. Any owner field a client smuggles into a draft is ignored; the
/// owner always comes from the session.
///
/// # Endpoints
///
/// - `GET /tasks` - List with filters and pagination
/// - `POST /tasks` - Create
/// - `POST /tasks/bulk` - All-or-nothing batch create
/// - `GET /tasks/stats` - Aggregated activity summary
/// - `GET /tasks/:id` - Fetch one
/// - `PATCH /tasks/:id` - Partial update
/// - `DELETE /tasks/:id` - Delete, returning the deleted record

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, FieldError},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskhub_shared::{
    auth::middleware::AuthContext,
    models::task::{
        CompletionStats, CreateTask, DailyCount, PageRequest, Pagination, Priority, Task,
        TaskFilter, UpdateTask,
    },
};
use uuid::Uuid;
use validator::Validate;

/// Query parameters for listing tasks
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,

    /// Title substring filter (case-insensitive)
    pub find: Option<String>,
    pub is_completed: Option<bool>,
    pub priority: Option<Priority>,

    /// Creation-date range bounds, RFC 3339
    pub min_date: Option<DateTime<Utc>>,
    pub max_date: Option<DateTime<Utc>>,
}

/// Task draft accepted from clients
///
/// Unknown fields (including any owner id) are dropped during
/// deserialization; the owner comes from the resolved session only.
#[derive(Debug, Deserialize, Validate)]
pub struct TaskDraft {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: String,

    #[serde(default)]
    pub is_completed: bool,

    #[serde(default)]
    pub priority: Priority,
}

impl From<TaskDraft> for CreateTask {
    fn from(draft: TaskDraft) -> Self {
        CreateTask {
            title: draft.title,
            is_completed: draft.is_completed,
            priority: draft.priority,
        }
    }
}

/// Partial update payload
#[derive(Debug, Deserialize, Validate)]
pub struct TaskPatch {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: Option<String>,
    pub is_completed: Option<bool>,
    pub priority: Option<Priority>,
}

/// Batch create request
#[derive(Debug, Deserialize)]
pub struct BulkCreateRequest {
    #[serde(default)]
    pub tasks: Vec<TaskDraft>,
}

/// Batch create response
#[derive(Debug, Serialize)]
pub struct BulkCreateResponse {
    pub created: u64,
    pub requested: usize,
}

/// Task listing response
#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
    pub pagination: Pagination,
}

/// How many of the newest tasks the stats summary includes
const RECENT_TASKS_LIMIT: i64 = 10;

/// Length of the per-day activity window, in days
const ACTIVITY_WINDOW_DAYS: i64 = 7;

/// Aggregated activity summary for one account
#[derive(Debug, Serialize)]
pub struct TaskStatsResponse {
    /// Counts by completion status
    pub completion: CompletionStats,

    /// The newest tasks, most recent first
    pub recent_tasks: Vec<Task>,

    /// Tasks created per calendar day over the activity window
    pub weekly: Vec<DailyCount>,
}

impl From<&ListQuery> for TaskFilter {
    fn from(query: &ListQuery) -> Self {
        TaskFilter {
            find: query.find.clone(),
            is_completed: query.is_completed,
            priority: query.priority,
            min_date: query.min_date,
            max_date: query.max_date,
        }
    }
}

/// Lists the caller's tasks
///
/// An empty result set is a valid state and answers `200` with an empty
/// list, not a 404.
pub async fn index(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<TaskListResponse>> {
    let filter = TaskFilter::from(&query);
    let page = PageRequest::new(query.page, query.limit);

    let tasks = Task::list(&state.db, auth.user_id, &filter, &page).await?;
    let total = Task::count(&state.db, auth.user_id, &filter).await?;

    Ok(Json(TaskListResponse {
        tasks,
        pagination: Pagination::new(&page, total),
    }))
}

/// Summarizes the caller's task activity
///
/// Completion counts, the ten newest tasks, and per-day creation counts
/// over the last week, all scoped to the authenticated account.
pub async fn stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<TaskStatsResponse>> {
    let completion = Task::completion_stats(&state.db, auth.user_id).await?;

    let recent_tasks = Task::list(
        &state.db,
        auth.user_id,
        &TaskFilter::default(),
        &PageRequest::new(Some(1), Some(RECENT_TASKS_LIMIT)),
    )
    .await?;

    let since = Utc::now() - chrono::Duration::days(ACTIVITY_WINDOW_DAYS);
    let weekly = Task::daily_created_counts(&state.db, auth.user_id, since).await?;

    Ok(Json(TaskStatsResponse {
        completion,
        recent_tasks,
        weekly,
    }))
}

/// Fetches one of the caller's tasks
pub async fn show(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = Task::find_by_owner(&state.db, auth.user_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Creates a task owned by the caller
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(draft): Json<TaskDraft>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    draft.validate()?;

    let task = Task::create(&state.db, auth.user_id, draft.into()).await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// Partially updates one of the caller's tasks
///
/// Only fields present in the patch are changed; an empty patch is a
/// validation failure.
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(patch): Json<TaskPatch>,
) -> ApiResult<Json<Task>> {
    patch.validate()?;

    let update = UpdateTask {
        title: patch.title,
        is_completed: patch.is_completed,
        priority: patch.priority,
    };

    if update.is_empty() {
        return Err(ApiError::Validation(vec![FieldError {
            field: "body".to_string(),
            message: "At least one field must be provided".to_string(),
        }]));
    }

    let task = Task::update(&state.db, auth.user_id, id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Deletes one of the caller's tasks, returning the deleted record
pub async fn destroy(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = Task::delete(&state.db, auth.user_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Creates a batch of tasks, all-or-nothing
///
/// Every draft is validated before anything is persisted; one invalid
/// draft fails the whole batch and persists zero tasks.
pub async fn bulk_create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<BulkCreateRequest>,
) -> ApiResult<(StatusCode, Json<BulkCreateResponse>)> {
    if req.tasks.is_empty() {
        return Err(ApiError::BadRequest(
            "Expected a non-empty array of tasks".to_string(),
        ));
    }

    let mut violations = Vec::new();
    for (index, draft) in req.tasks.iter().enumerate() {
        if let Err(errors) = draft.validate() {
            for (field, field_errors) in errors.field_errors() {
                for error in field_errors {
                    violations.push(FieldError {
                        field: format!("tasks[{}].{}", index, field),
                        message: error
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| "Validation failed".to_string()),
                    });
                }
            }
        }
    }
    if !violations.is_empty() {
        return Err(ApiError::Validation(violations));
    }

    let drafts: Vec<CreateTask> = req.tasks.into_iter().map(CreateTask::from).collect();
    let requested = drafts.len();

    let mut tx = state.db.begin().await?;
    let created = Task::create_many(&mut *tx, auth.user_id, &drafts).await?;
    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(BulkCreateResponse { created, requested }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_draft_ignores_owner_field() {
        // A smuggled owner id is dropped during deserialization
        let draft: TaskDraft = serde_json::from_value(serde_json::json!({
            "title": "x",
            "ownerId": 999
        }))
        .unwrap();

        assert_eq!(draft.title, "x");
        assert!(!draft.is_completed);
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_task_draft_defaults() {
        let draft: TaskDraft =
            serde_json::from_value(serde_json::json!({ "title": "buy milk" })).unwrap();

        assert!(!draft.is_completed);
        assert_eq!(draft.priority, Priority::Medium);
    }

    #[test]
    fn test_task_draft_rejects_empty_title() {
        let draft: TaskDraft = serde_json::from_value(serde_json::json!({ "title": "" })).unwrap();
        assert!(draft.validate().is_err());
    }

    #[test]
    fn test_task_draft_rejects_unknown_priority() {
        let result: Result<TaskDraft, _> = serde_json::from_value(serde_json::json!({
            "title": "x",
            "priority": "urgent"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_list_query_to_filter() {
        let query = ListQuery {
            find: Some("milk".to_string()),
            is_completed: Some(true),
            ..Default::default()
        };

        let filter = TaskFilter::from(&query);
        assert_eq!(filter.find.as_deref(), Some("milk"));
        assert_eq!(filter.is_completed, Some(true));
        assert!(filter.priority.is_none());
    }
}
