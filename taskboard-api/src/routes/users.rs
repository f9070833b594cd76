/// User endpoints
///
/// Registration and login are public; account retrieval and mutation sit
/// behind the authentication middleware, with mutation gated by the
/// self-or-admin rule.
///
/// # Endpoints
///
/// - `POST /v1/users/register` - Register a new user
/// - `POST /v1/users/login` - Login and get the bearer token
/// - `GET /v1/users/:id` - Get user details
/// - `PUT/PATCH /v1/users/:id` - Update user details (self or admin)
/// - `DELETE /v1/users/:id` - Delete the account (self or admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
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
        password,
        policy::{self, AccessTarget, Action, Resource},
    },
    models::{
        auth_token::AuthToken,
        user::{CreateUser, UpdateUser, User},
    },
};
use uuid::Uuid;
use validator::Validate;

/// User representation returned by the API
///
/// Never includes credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    /// User ID
    pub id: Uuid,

    /// Username
    pub username: String,

    /// Email address
    pub email: String,

    /// First name
    pub first_name: String,

    /// Last name
    pub last_name: String,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            created_at: user.created_at,
        }
    }
}

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Username
    #[validate(length(min = 1, max = 150, message = "Username must be 1-150 characters"))]
    pub username: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (validated for strength)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Password confirmation (must match `password`)
    pub password2: String,

    /// First name
    #[serde(default)]
    #[validate(length(max = 150, message = "First name must be at most 150 characters"))]
    pub first_name: String,

    /// Last name
    #[serde(default)]
    #[validate(length(max = 150, message = "Last name must be at most 150 characters"))]
    pub last_name: String,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username
    pub username: String,

    /// Password
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Opaque bearer token
    pub token: String,

    /// Authenticated user ID
    pub user_id: Uuid,
}

/// Update user request
///
/// All fields optional; a supplied password is re-validated and re-hashed.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    /// New username
    #[validate(length(min = 1, max = 150, message = "Username must be 1-150 characters"))]
    pub username: Option<String>,

    /// New email address
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    /// New password
    pub password: Option<String>,

    /// New first name
    pub first_name: Option<String>,

    /// New last name
    pub last_name: Option<String>,
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /v1/users/register
/// Content-Type: application/json
///
/// {
///   "username": "alice",
///   "email": "alice@example.com",
///   "password": "SecureP@ss123",
///   "password2": "SecureP@ss123",
///   "first_name": "Alice",
///   "last_name": "Doe"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: password mismatch, weak password, or duplicate
///   username/email (field-identifying details)
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    req.validate()?;

    if req.password != req.password2 {
        return Err(ApiError::ValidationError(vec![ValidationErrorDetail::new(
            "password",
            "Password fields didn't match.",
        )]));
    }

    password::validate_password_strength(&req.password).map_err(|e| {
        ApiError::ValidationError(vec![ValidationErrorDetail::new("password", e)])
    })?;

    if User::find_by_username(&state.db, &req.username).await?.is_some() {
        return Err(ApiError::ValidationError(vec![ValidationErrorDetail::new(
            "username",
            "A user with that username already exists.",
        )]));
    }

    if User::find_by_email(&state.db, &req.email).await?.is_some() {
        return Err(ApiError::ValidationError(vec![ValidationErrorDetail::new(
            "email",
            "A user with that email already exists.",
        )]));
    }

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            username: req.username,
            email: req.email,
            password_hash,
            first_name: req.first_name,
            last_name: req.last_name,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "Registered new user");

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Login endpoint
///
/// Verifies the credential and returns the user's bearer token, issuing
/// one if this is their first login. Issuance is idempotent: one token per
/// user, not per session.
///
/// # Endpoint
///
/// ```text
/// POST /v1/users/login
/// Content-Type: application/json
///
/// {
///   "username": "alice",
///   "password": "SecureP@ss123"
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: unknown username or wrong password (the response
///   does not distinguish the two)
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = User::find_by_username(&state.db, &req.username)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = AuthToken::get_or_create(&state.db, user.id).await?;

    Ok(Json(LoginResponse {
        token: token.token,
        user_id: user.id,
    }))
}

/// Get user details
///
/// Open to any authenticated actor.
pub async fn get_user(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserResponse>> {
    policy::enforce(
        &state.db,
        policy::required_rule(Resource::User, Action::Retrieve),
        &actor,
        AccessTarget::User(id),
    )
    .await?;

    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::from(user)))
}

/// Update user details
///
/// Permitted only to the user themself or an administrator.
pub async fn update_user(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    req.validate()?;

    policy::enforce(
        &state.db,
        policy::required_rule(Resource::User, Action::Update),
        &actor,
        AccessTarget::User(id),
    )
    .await?;

    let password_hash = match req.password.as_deref() {
        Some(password) => {
            password::validate_password_strength(password).map_err(|e| {
                ApiError::ValidationError(vec![ValidationErrorDetail::new("password", e)])
            })?;
            Some(password::hash_password(password)?)
        }
        None => None,
    };

    let user = User::update(
        &state.db,
        id,
        UpdateUser {
            username: req.username,
            email: req.email,
            password_hash,
            first_name: req.first_name,
            last_name: req.last_name,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::from(user)))
}

/// Delete a user account
///
/// Permitted only to the user themself or an administrator. Removes the
/// user's owned projects (and their contents), memberships, comments, and
/// token in one transaction.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    policy::enforce(
        &state.db,
        policy::required_rule(Resource::User, Action::Delete),
        &actor,
        AccessTarget::User(id),
    )
    .await?;

    let deleted = User::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = %id, deleted_by = %actor.user_id, "Deleted user account");

    Ok(StatusCode::NO_CONTENT)
}
