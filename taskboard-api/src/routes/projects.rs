/// Project endpoints
///
/// Listing returns exactly the projects where the actor is owner or member.
/// Creation is open to any authenticated actor and atomically grants the
/// creator an Admin membership. Retrieval is open to any authenticated
/// actor; mutation requires admin-or-owner.
///
/// # Endpoints
///
/// - `GET /v1/projects` - List visible projects
/// - `POST /v1/projects` - Create a project
/// - `GET /v1/projects/:id` - Get project details
/// - `PUT/PATCH /v1/projects/:id` - Update project (admin or owner)
/// - `DELETE /v1/projects/:id` - Delete project (admin or owner)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::members::{member_response, MemberResponse},
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
        member::ProjectMember,
        project::{CreateProject, Project, UpdateProject},
        user::User,
    },
};
use uuid::Uuid;
use validator::Validate;

/// Project representation returned by the API
///
/// Embeds the owner and the hydrated member list.
#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    /// Project ID
    pub id: Uuid,

    /// Project name
    pub name: String,

    /// Project description
    pub description: String,

    /// Owning user
    pub owner: UserResponse,

    /// When the project was created
    pub created_at: DateTime<Utc>,

    /// Membership rows, oldest first
    pub members: Vec<MemberResponse>,
}

/// Create project request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    /// Project name
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    /// Project description
    #[serde(default)]
    pub description: String,
}

/// Update project request
///
/// Owner and creation timestamp are never client-settable.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    /// New name
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,

    /// New description
    pub description: Option<String>,
}

/// Builds the full project representation (owner + members hydrated)
pub(crate) async fn project_response(
    state: &AppState,
    project: Project,
) -> ApiResult<ProjectResponse> {
    let owner = User::find_by_id(&state.db, project.owner_id)
        .await?
        .ok_or_else(|| {
            ApiError::InternalError(format!("Project {} has a dangling owner", project.id))
        })?;

    let mut members = Vec::new();
    for member in ProjectMember::list_by_project(&state.db, project.id).await? {
        members.push(member_response(state, member).await?);
    }

    Ok(ProjectResponse {
        id: project.id,
        name: project.name,
        description: project.description,
        owner: UserResponse::from(owner),
        created_at: project.created_at,
        members,
    })
}

/// List all projects where the actor is owner or member
///
/// The result is de-duplicated; a stranger to every project gets an empty
/// list, never an error.
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthContext>,
) -> ApiResult<Json<Vec<ProjectResponse>>> {
    policy::enforce(
        &state.db,
        policy::required_rule(Resource::Project, Action::List),
        &actor,
        AccessTarget::None,
    )
    .await?;

    let projects = Project::list_for_user(&state.db, actor.user_id).await?;

    let mut responses = Vec::with_capacity(projects.len());
    for project in projects {
        responses.push(project_response(&state, project).await?);
    }

    Ok(Json(responses))
}

/// Create a new project
///
/// The creator becomes the owner and receives an Admin membership in the
/// same transaction.
pub async fn create_project(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthContext>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectResponse>)> {
    req.validate()?;

    policy::enforce(
        &state.db,
        policy::required_rule(Resource::Project, Action::Create),
        &actor,
        AccessTarget::None,
    )
    .await?;

    let project = Project::create_with_owner(
        &state.db,
        actor.user_id,
        CreateProject {
            name: req.name,
            description: req.description,
        },
    )
    .await?;

    tracing::info!(project_id = %project.id, owner_id = %actor.user_id, "Created project");

    let response = project_response(&state, project).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Retrieve details of a specific project
///
/// Open to any authenticated actor; list visibility does not gate
/// single-object retrieval.
pub async fn get_project(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProjectResponse>> {
    let project = Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    policy::enforce(
        &state.db,
        policy::required_rule(Resource::Project, Action::Retrieve),
        &actor,
        AccessTarget::Project(&project),
    )
    .await?;

    Ok(Json(project_response(&state, project).await?))
}

/// Update project details
///
/// Permitted only to the owner or an Admin-role member.
pub async fn update_project(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
) -> ApiResult<Json<ProjectResponse>> {
    req.validate()?;

    let project = Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    policy::enforce(
        &state.db,
        policy::required_rule(Resource::Project, Action::Update),
        &actor,
        AccessTarget::Project(&project),
    )
    .await?;

    let updated = Project::update(
        &state.db,
        id,
        UpdateProject {
            name: req.name,
            description: req.description,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(Json(project_response(&state, updated).await?))
}

/// Delete a project
///
/// Permitted only to the owner or an Admin-role member. Tasks, their
/// comments, and membership rows go with it.
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let project = Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    policy::enforce(
        &state.db,
        policy::required_rule(Resource::Project, Action::Delete),
        &actor,
        AccessTarget::Project(&project),
    )
    .await?;

    Project::delete(&state.db, id).await?;

    tracing::info!(project_id = %id, deleted_by = %actor.user_id, "Deleted project");

    Ok(StatusCode::NO_CONTENT)
}
