/// Project membership model and database operations
///
/// This module provides the ProjectMember model linking users to projects
/// with a role. A user has at most one membership row per project, enforced
/// by a storage-level unique constraint on (project_id, user_id).
///
/// # Schema
///
/// ```sql
/// CREATE TYPE project_role AS ENUM ('member', 'admin');
///
/// CREATE TABLE project_members (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id),
///     user_id UUID NOT NULL REFERENCES users(id),
///     role project_role NOT NULL DEFAULT 'member',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (project_id, user_id)
/// );
/// ```
///
/// # Roles
///
/// - **admin**: May mutate project metadata and manage the member list
/// - **member**: May create and mutate tasks, and comment on them
///
/// The project owner is not required to have a row here: ownership alone
/// grants full rights. In practice the owner does get an Admin row, created
/// atomically with the project.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Role of a member within a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProjectRole {
    /// Can create and mutate tasks and comments
    Member,

    /// Can additionally mutate the project and its member list
    Admin,
}

impl ProjectRole {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectRole::Member => "member",
            ProjectRole::Admin => "admin",
        }
    }

    /// Whether this role may mutate project metadata and memberships
    pub fn can_manage_project(&self) -> bool {
        matches!(self, ProjectRole::Admin)
    }
}

impl Default for ProjectRole {
    fn default() -> Self {
        ProjectRole::Member
    }
}

/// Membership row linking a user to a project
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectMember {
    /// Unique membership ID (UUID v4)
    pub id: Uuid,

    /// Project this membership belongs to
    pub project_id: Uuid,

    /// Member user
    pub user_id: Uuid,

    /// Role within the project
    pub role: ProjectRole,

    /// When the membership was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a membership
///
/// The project is bound from the request path, never the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMember {
    /// User to add
    pub user_id: Uuid,

    /// Role to assign (defaults to Member)
    #[serde(default)]
    pub role: ProjectRole,
}

impl ProjectMember {
    /// Creates a membership (adds a user to a project)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The (project, user) pair already has a row (unique violation)
    /// - Project or user doesn't exist (foreign key violation)
    /// - Database connection fails
    pub async fn create(
        pool: &PgPool,
        project_id: Uuid,
        data: CreateMember,
    ) -> Result<Self, sqlx::Error> {
        let member = sqlx::query_as::<_, ProjectMember>(
            r#"
            INSERT INTO project_members (project_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING id, project_id, user_id, role, created_at
            "#,
        )
        .bind(project_id)
        .bind(data.user_id)
        .bind(data.role)
        .fetch_one(pool)
        .await?;

        Ok(member)
    }

    /// Finds a membership by its ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let member = sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT id, project_id, user_id, role, created_at
            FROM project_members
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(member)
    }

    /// Finds a membership by project and user
    pub async fn find_by_project_and_user(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let member = sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT id, project_id, user_id, role, created_at
            FROM project_members
            WHERE project_id = $1 AND user_id = $2
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(member)
    }

    /// Checks whether a user has any membership row on a project
    pub async fn has_access(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM project_members
                WHERE project_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Gets a user's role in a project
    ///
    /// Returns None if the user has no membership row.
    pub async fn get_role(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ProjectRole>, sqlx::Error> {
        let role: Option<ProjectRole> = sqlx::query_scalar(
            r#"
            SELECT role FROM project_members
            WHERE project_id = $1 AND user_id = $2
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(role)
    }

    /// Updates a membership's role
    ///
    /// Returns the updated row if found, None if the membership doesn't
    /// exist.
    pub async fn update_role(
        pool: &PgPool,
        id: Uuid,
        role: ProjectRole,
    ) -> Result<Option<Self>, sqlx::Error> {
        let member = sqlx::query_as::<_, ProjectMember>(
            r#"
            UPDATE project_members
            SET role = $2
            WHERE id = $1
            RETURNING id, project_id, user_id, role, created_at
            "#,
        )
        .bind(id)
        .bind(role)
        .fetch_optional(pool)
        .await?;

        Ok(member)
    }

    /// Deletes a membership (removes a user from a project)
    ///
    /// Returns true if a row was deleted, false otherwise.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM project_members WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists all members of a project, oldest first
    pub async fn list_by_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let members = sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT id, project_id, user_id, role, created_at
            FROM project_members
            WHERE project_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_role_as_str() {
        assert_eq!(ProjectRole::Member.as_str(), "member");
        assert_eq!(ProjectRole::Admin.as_str(), "admin");
    }

    #[test]
    fn test_role_permissions() {
        assert!(ProjectRole::Admin.can_manage_project());
        assert!(!ProjectRole::Member.can_manage_project());
    }

    #[test]
    fn test_create_member_default_role() {
        assert_eq!(ProjectRole::default(), ProjectRole::Member);
    }
}
