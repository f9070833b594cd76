/// Comment endpoints
///
/// Comments are scoped to a task bound from the path. Reads are open to
/// any authenticated actor; creation requires membership of the task's
/// parent project; mutation is author-only, and not even the project owner
/// may override.
///
/// # Endpoints
///
/// - `GET /v1/tasks/:task_id/comments` - List comments on a task
/// - `POST /v1/tasks/:task_id/comments` - Comment on a task (member)
/// - `GET /v1/comments/:id` - Get a comment
/// - `PUT/PATCH /v1/comments/:id` - Edit a comment (author only)
/// - `DELETE /v1/comments/:id` - Delete a comment (author only)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
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
        comment::{Comment, CreateComment},
        task::Task,
        user::User,
    },
};
use uuid::Uuid;
use validator::Validate;

/// Comment representation returned by the API
#[derive(Debug, Serialize)]
pub struct CommentResponse {
    /// Comment ID
    pub id: Uuid,

    /// Comment body
    pub content: String,

    /// Authoring user
    pub author: UserResponse,

    /// Parent task
    pub task: Uuid,

    /// When the comment was created
    pub created_at: DateTime<Utc>,
}

/// Create comment request
///
/// Task and author come from the path and the acting identity.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    /// Comment body
    #[validate(length(min = 1, message = "Content must not be empty"))]
    pub content: String,
}

/// Update comment request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    /// New comment body
    #[validate(length(min = 1, message = "Content must not be empty"))]
    pub content: String,
}

/// Builds the comment representation with the author hydrated
pub(crate) async fn comment_response(
    state: &AppState,
    comment: Comment,
) -> ApiResult<CommentResponse> {
    let author = User::find_by_id(&state.db, comment.author_id)
        .await?
        .ok_or_else(|| {
            ApiError::InternalError(format!("Comment {} has a dangling author", comment.id))
        })?;

    Ok(CommentResponse {
        id: comment.id,
        content: comment.content,
        author: UserResponse::from(author),
        task: comment.task_id,
        created_at: comment.created_at,
    })
}

/// List all comments on a task
///
/// Open to any authenticated actor.
pub async fn list_comments(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Vec<CommentResponse>>> {
    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    policy::enforce(
        &state.db,
        policy::required_rule(Resource::Comment, Action::List),
        &actor,
        AccessTarget::Task(&task),
    )
    .await?;

    let comments = Comment::list_by_task(&state.db, task.id).await?;

    let mut responses = Vec::with_capacity(comments.len());
    for comment in comments {
        responses.push(comment_response(&state, comment).await?);
    }

    Ok(Json(responses))
}

/// Comment on a task
///
/// Permitted to the owner or any member of the task's parent project. The
/// author is always the acting user.
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<CommentResponse>)> {
    req.validate()?;

    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    policy::enforce(
        &state.db,
        policy::required_rule(Resource::Comment, Action::Create),
        &actor,
        AccessTarget::Task(&task),
    )
    .await?;

    let comment = Comment::create(
        &state.db,
        task.id,
        actor.user_id,
        CreateComment {
            content: req.content,
        },
    )
    .await?;

    tracing::info!(comment_id = %comment.id, task_id = %task.id, "Created comment");

    let response = comment_response(&state, comment).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Get a comment
///
/// Open to any authenticated actor.
pub async fn get_comment(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CommentResponse>> {
    let comment = Comment::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

    policy::enforce(
        &state.db,
        policy::required_rule(Resource::Comment, Action::Retrieve),
        &actor,
        AccessTarget::Comment(&comment),
    )
    .await?;

    Ok(Json(comment_response(&state, comment).await?))
}

/// Edit a comment
///
/// Author only.
pub async fn update_comment(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCommentRequest>,
) -> ApiResult<Json<CommentResponse>> {
    req.validate()?;

    let comment = Comment::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

    policy::enforce(
        &state.db,
        policy::required_rule(Resource::Comment, Action::Update),
        &actor,
        AccessTarget::Comment(&comment),
    )
    .await?;

    let updated = Comment::update_content(&state.db, comment.id, req.content)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

    Ok(Json(comment_response(&state, updated).await?))
}

/// Delete a comment
///
/// Author only.
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let comment = Comment::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

    policy::enforce(
        &state.db,
        policy::required_rule(Resource::Comment, Action::Delete),
        &actor,
        AccessTarget::Comment(&comment),
    )
    .await?;

    Comment::delete(&state.db, comment.id).await?;

    tracing::info!(comment_id = %id, deleted_by = %actor.user_id, "Deleted comment");

    Ok(StatusCode::NO_CONTENT)
}
