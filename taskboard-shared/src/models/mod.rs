/// Database models for Taskboard
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts
/// - `auth_token`: Opaque bearer tokens, one per user
/// - `project`: Projects owned by a user
/// - `member`: Project memberships with roles
/// - `task`: Tasks scoped to a project
/// - `comment`: Comments scoped to a task
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::user::{CreateUser, User};
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     username: "alice".to_string(),
///     email: "alice@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     first_name: "Alice".to_string(),
///     last_name: "Doe".to_string(),
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod auth_token;
pub mod comment;
pub mod member;
pub mod project;
pub mod task;
pub mod user;
