/// Project membership endpoints
///
/// Members are scoped to a project bound from the path, never the request
/// body. Listing and retrieval require membership; mutation requires the
/// owner or an Admin-role member. Duplicate (project, user) pairs are
/// rejected with 409.
///
/// # Endpoints
///
/// - `GET /v1/projects/:project_id/members` - List members
/// - `POST /v1/projects/:project_id/members` - Add a member (admin or owner)
/// - `GET /v1/projects/:project_id/members/:member_id` - Get a member
/// - `PUT/PATCH /v1/projects/:project_id/members/:member_id` - Change role
/// - `DELETE /v1/projects/:project_id/members/:member_id` - Remove member

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    routes::users::UserResponse,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::{
        middleware::AuthContext,
        policy::{self, AccessTarget, Action, Resource},
    },
    models::{
        member::{CreateMember, ProjectMember, ProjectRole},
        project::Project,
        user::User,
    },
};
use uuid::Uuid;

/// Membership representation returned by the API
#[derive(Debug, Serialize)]
pub struct MemberResponse {
    /// Membership ID
    pub id: Uuid,

    /// Member user
    pub user: UserResponse,

    /// Role within the project
    pub role: ProjectRole,
}

/// Add member request
///
/// The project comes from the path.
#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    /// User to add
    pub user_id: Uuid,

    /// Role to assign (defaults to member)
    #[serde(default)]
    pub role: ProjectRole,
}

/// Update member request
#[derive(Debug, Deserialize)]
pub struct UpdateMemberRequest {
    /// New role
    pub role: ProjectRole,
}

/// Builds the membership representation with the user hydrated
pub(crate) async fn member_response(
    state: &AppState,
    member: ProjectMember,
) -> ApiResult<MemberResponse> {
    let user = User::find_by_id(&state.db, member.user_id)
        .await?
        .ok_or_else(|| {
            ApiError::InternalError(format!("Membership {} has a dangling user", member.id))
        })?;

    Ok(MemberResponse {
        id: member.id,
        user: UserResponse::from(user),
        role: member.role,
    })
}

/// Fetches the scope project or 404s
async fn load_project(state: &AppState, project_id: Uuid) -> ApiResult<Project> {
    Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))
}

/// Fetches a member row and checks it belongs to the scope project
async fn load_member(
    state: &AppState,
    project_id: Uuid,
    member_id: Uuid,
) -> ApiResult<ProjectMember> {
    let member = ProjectMember::find_by_id(&state.db, member_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Member not found".to_string()))?;

    // A member reached through the wrong project is as good as absent
    if member.project_id != project_id {
        return Err(ApiError::NotFound("Member not found".to_string()));
    }

    Ok(member)
}

/// List all members of a project
///
/// Permitted to the owner or any member.
pub async fn list_members(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<MemberResponse>>> {
    let project = load_project(&state, project_id).await?;

    policy::enforce(
        &state.db,
        policy::required_rule(Resource::Member, Action::List),
        &actor,
        AccessTarget::Project(&project),
    )
    .await?;

    let members = ProjectMember::list_by_project(&state.db, project.id).await?;

    let mut responses = Vec::with_capacity(members.len());
    for member in members {
        responses.push(member_response(&state, member).await?);
    }

    Ok(Json(responses))
}

/// Add a user to a project
///
/// Permitted only to the owner or an Admin-role member.
///
/// # Errors
///
/// - `409 Conflict`: the user already has a membership row here
/// - `400 Bad Request`: the target user does not exist
pub async fn add_member(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<AddMemberRequest>,
) -> ApiResult<(StatusCode, Json<MemberResponse>)> {
    let project = load_project(&state, project_id).await?;

    policy::enforce(
        &state.db,
        policy::required_rule(Resource::Member, Action::Create),
        &actor,
        AccessTarget::Project(&project),
    )
    .await?;

    if User::find_by_id(&state.db, req.user_id).await?.is_none() {
        return Err(ApiError::ValidationError(vec![ValidationErrorDetail::new(
            "user_id",
            "User does not exist.",
        )]));
    }

    if ProjectMember::find_by_project_and_user(&state.db, project.id, req.user_id)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(
            "User is already a member of this project".to_string(),
        ));
    }

    // A concurrent duplicate insert still trips the unique constraint,
    // which maps to the same 409
    let member = ProjectMember::create(
        &state.db,
        project.id,
        CreateMember {
            user_id: req.user_id,
            role: req.role,
        },
    )
    .await?;

    tracing::info!(
        project_id = %project.id,
        user_id = %member.user_id,
        role = member.role.as_str(),
        "Added project member"
    );

    let response = member_response(&state, member).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Get a single membership
///
/// Permitted to the owner or any member.
pub async fn get_member(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthContext>,
    Path((project_id, member_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<MemberResponse>> {
    let project = load_project(&state, project_id).await?;

    policy::enforce(
        &state.db,
        policy::required_rule(Resource::Member, Action::Retrieve),
        &actor,
        AccessTarget::Project(&project),
    )
    .await?;

    let member = load_member(&state, project.id, member_id).await?;

    Ok(Json(member_response(&state, member).await?))
}

/// Change a member's role
///
/// Permitted only to the owner or an Admin-role member.
pub async fn update_member(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthContext>,
    Path((project_id, member_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateMemberRequest>,
) -> ApiResult<Json<MemberResponse>> {
    let project = load_project(&state, project_id).await?;

    policy::enforce(
        &state.db,
        policy::required_rule(Resource::Member, Action::Update),
        &actor,
        AccessTarget::Project(&project),
    )
    .await?;

    let member = load_member(&state, project.id, member_id).await?;

    let updated = ProjectMember::update_role(&state.db, member.id, req.role)
        .await?
        .ok_or_else(|| ApiError::NotFound("Member not found".to_string()))?;

    Ok(Json(member_response(&state, updated).await?))
}

/// Remove a member from a project
///
/// Permitted only to the owner or an Admin-role member.
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthContext>,
    Path((project_id, member_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    let project = load_project(&state, project_id).await?;

    policy::enforce(
        &state.db,
        policy::required_rule(Resource::Member, Action::Delete),
        &actor,
        AccessTarget::Project(&project),
    )
    .await?;

    let member = load_member(&state, project.id, member_id).await?;

    ProjectMember::delete(&state.db, member.id).await?;

    tracing::info!(
        project_id = %project.id,
        user_id = %member.user_id,
        removed_by = %actor.user_id,
        "Removed project member"
    );

    Ok(StatusCode::NO_CONTENT)
}
