/// Task endpoints
///
/// Tasks are scoped to a project bound from the path. Any member (the
/// owner included) may create tasks; no Admin role is required. Reads and
/// writes on a single task share the same membership predicate.
///
/// # Endpoints
///
/// - `GET /v1/projects/:project_id/tasks` - List tasks in a project
/// - `POST /v1/projects/:project_id/tasks` - Create a task (any member)
/// - `GET /v1/tasks/:id` - Get task details
/// - `PUT/PATCH /v1/tasks/:id` - Update a task (any member)
/// - `DELETE /v1/tasks/:id` - Delete a task (any member)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    routes::comments::{comment_response, CommentResponse},
    routes::users::UserResponse,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::{
        middleware::AuthContext,
        policy::{self, AccessTarget, Action, Resource},
    },
    models::{
        comment::Comment,
        project::Project,
        task::{CreateTask, Task, TaskPriority, TaskStatus, UpdateTask},
        user::User,
    },
};
use uuid::Uuid;
use validator::Validate;

/// Deserializes a nullable, omittable field into a double Option
///
/// An absent field gives None (leave the column alone), an explicit null
/// gives Some(None) (clear it), and a value gives Some(Some(value)).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

/// Task representation returned by the API
///
/// Embeds the assignee and the task's comments.
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    /// Task ID
    pub id: Uuid,

    /// Task title
    pub title: String,

    /// Task description
    pub description: String,

    /// Workflow status
    pub status: TaskStatus,

    /// Priority
    pub priority: TaskPriority,

    /// Assigned user, if any
    pub assignee: Option<UserResponse>,

    /// Parent project
    pub project: Uuid,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// Due date, if any
    pub due_date: Option<DateTime<Utc>>,

    /// Comments on the task, oldest first
    pub comments: Vec<CommentResponse>,
}

/// Create task request
///
/// The project comes from the path.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Task title
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    /// Task description
    #[serde(default)]
    pub description: String,

    /// Workflow status (defaults to todo)
    #[serde(default)]
    pub status: TaskStatus,

    /// Priority (defaults to medium)
    #[serde(default)]
    pub priority: TaskPriority,

    /// Assigned user
    pub assignee_id: Option<Uuid>,

    /// Due date
    pub due_date: Option<DateTime<Utc>>,
}

/// Update task request
///
/// Double-Option fields distinguish "leave alone" (absent) from "clear"
/// (null).
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    /// New title
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New status
    pub status: Option<TaskStatus>,

    /// New priority
    pub priority: Option<TaskPriority>,

    /// New assignee (null to unassign)
    #[serde(default, deserialize_with = "double_option")]
    pub assignee_id: Option<Option<Uuid>>,

    /// New due date (null to clear)
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

/// Builds the full task representation (assignee + comments hydrated)
pub(crate) async fn task_response(state: &AppState, task: Task) -> ApiResult<TaskResponse> {
    let assignee = match task.assignee_id {
        Some(assignee_id) => User::find_by_id(&state.db, assignee_id)
            .await?
            .map(UserResponse::from),
        None => None,
    };

    let mut comments = Vec::new();
    for comment in Comment::list_by_task(&state.db, task.id).await? {
        comments.push(comment_response(state, comment).await?);
    }

    Ok(TaskResponse {
        id: task.id,
        title: task.title,
        description: task.description,
        status: task.status,
        priority: task.priority,
        assignee,
        project: task.project_id,
        created_at: task.created_at,
        due_date: task.due_date,
        comments,
    })
}

/// List all tasks in a project
///
/// Permitted to the owner or any member.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    let project = Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    policy::enforce(
        &state.db,
        policy::required_rule(Resource::Task, Action::List),
        &actor,
        AccessTarget::Project(&project),
    )
    .await?;

    let tasks = Task::list_by_project(&state.db, project.id).await?;

    let mut responses = Vec::with_capacity(tasks.len());
    for task in tasks {
        responses.push(task_response(&state, task).await?);
    }

    Ok(Json(responses))
}

/// Create a task in a project
///
/// Permitted to the owner or any member; no Admin role required.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    req.validate()?;

    let project = Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    policy::enforce(
        &state.db,
        policy::required_rule(Resource::Task, Action::Create),
        &actor,
        AccessTarget::Project(&project),
    )
    .await?;

    if let Some(assignee_id) = req.assignee_id {
        if User::find_by_id(&state.db, assignee_id).await?.is_none() {
            return Err(ApiError::ValidationError(vec![ValidationErrorDetail::new(
                "assignee_id",
                "User does not exist.",
            )]));
        }
    }

    let task = Task::create(
        &state.db,
        project.id,
        CreateTask {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            assignee_id: req.assignee_id,
            due_date: req.due_date,
        },
    )
    .await?;

    tracing::info!(task_id = %task.id, project_id = %project.id, "Created task");

    let response = task_response(&state, task).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Get task details
///
/// Permitted to the owner or any member of the task's parent project.
pub async fn get_task(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskResponse>> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    policy::enforce(
        &state.db,
        policy::required_rule(Resource::Task, Action::Retrieve),
        &actor,
        AccessTarget::Task(&task),
    )
    .await?;

    Ok(Json(task_response(&state, task).await?))
}

/// Update task details
///
/// Permitted to the owner or any member of the task's parent project.
pub async fn update_task(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    req.validate()?;

    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    policy::enforce(
        &state.db,
        policy::required_rule(Resource::Task, Action::Update),
        &actor,
        AccessTarget::Task(&task),
    )
    .await?;

    if let Some(Some(assignee_id)) = req.assignee_id {
        if User::find_by_id(&state.db, assignee_id).await?.is_none() {
            return Err(ApiError::ValidationError(vec![ValidationErrorDetail::new(
                "assignee_id",
                "User does not exist.",
            )]));
        }
    }

    let updated = Task::update(
        &state.db,
        id,
        UpdateTask {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            assignee_id: req.assignee_id,
            due_date: req.due_date,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task_response(&state, updated).await?))
}

/// Delete a task
///
/// Permitted to the owner or any member of the task's parent project.
/// Comments go with it.
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    policy::enforce(
        &state.db,
        policy::required_rule(Resource::Task, Action::Delete),
        &actor,
        AccessTarget::Task(&task),
    )
    .await?;

    Task::delete(&state.db, id).await?;

    tracing::info!(task_id = %id, deleted_by = %actor.user_id, "Deleted task");

    Ok(StatusCode::NO_CONTENT)
}
