/// Authorization policy set
///
/// Every object-scoped operation in Taskboard is gated by one of a small
/// set of predicates evaluated against the acting identity and the target
/// object:
///
/// | Predicate | True when |
/// |---|---|
/// | project-admin-or-owner | actor owns the project, OR holds an Admin membership on it |
/// | project-member | actor owns the project, OR holds any membership on it |
/// | task-project-member | project-member, evaluated against the task's parent project |
/// | comment-author | actor authored the comment |
/// | self-or-admin | actor is the target user, OR carries the administrative flag |
///
/// All predicates are side-effect-free and fail closed: a missing row or a
/// dangling reference evaluates to `false`, never an error.
///
/// Rather than branching per handler, each operation's requirement is
/// declared once in a static table ([`required_rule`]) mapping
/// (resource, action) to an [`AccessRule`], and handlers funnel through a
/// single [`enforce`] entry point.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::auth::middleware::AuthContext;
/// use taskboard_shared::auth::policy::{enforce, required_rule, AccessTarget, Action, Resource};
/// use taskboard_shared::models::project::Project;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, actor: AuthContext, project: Project) -> Result<(), Box<dyn std::error::Error>> {
/// enforce(
///     &pool,
///     required_rule(Resource::Project, Action::Update),
///     &actor,
///     AccessTarget::Project(&project),
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use uuid::Uuid;

use super::middleware::AuthContext;
use crate::models::comment::Comment;
use crate::models::member::{ProjectMember, ProjectRole};
use crate::models::project::Project;
use crate::models::task::Task;

/// Error type for policy enforcement
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// Actor is neither owner nor member of the project
    #[error("Not a member of project {0}")]
    NotProjectMember(Uuid),

    /// Actor is neither owner nor Admin-role member of the project
    #[error("Requires project ownership or an admin membership")]
    NotProjectAdmin,

    /// Actor did not author the comment
    #[error("Only the comment author may modify a comment")]
    NotCommentAuthor,

    /// Actor is neither the target user nor an administrator
    #[error("Requires the account owner or an administrator")]
    NotSelfOrAdmin,

    /// The rule cannot be evaluated against the supplied target
    ///
    /// A handler wiring mistake; fails closed as a denial
    #[error("Access rule does not apply to this target")]
    InvalidTarget,

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Resources gated by the policy table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    User,
    Project,
    Member,
    Task,
    Comment,
}

/// Actions against a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Create,
    Retrieve,
    Update,
    Delete,
}

/// Access rules an operation can require
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRule {
    /// Any authenticated actor (authentication itself is the middleware's job)
    Authenticated,

    /// Actor is the target user or an administrator
    SelfOrAdmin,

    /// Actor is owner or any member of the target project
    ProjectMember,

    /// Actor is owner or Admin-role member of the target project
    ProjectAdminOrOwner,

    /// Actor is owner or any member of the target task's parent project
    TaskProjectMember,

    /// Actor authored the target comment
    CommentAuthor,
}

/// The static table mapping each (resource, action) pair to its rule
///
/// This is the whole permission model in one place; handlers never encode
/// their own branching.
pub fn required_rule(resource: Resource, action: Action) -> AccessRule {
    match (resource, action) {
        (Resource::User, Action::Update | Action::Delete) => AccessRule::SelfOrAdmin,
        (Resource::User, _) => AccessRule::Authenticated,

        (Resource::Project, Action::Update | Action::Delete) => AccessRule::ProjectAdminOrOwner,
        (Resource::Project, _) => AccessRule::Authenticated,

        (Resource::Member, Action::List | Action::Retrieve) => AccessRule::ProjectMember,
        (Resource::Member, _) => AccessRule::ProjectAdminOrOwner,

        (Resource::Task, Action::List | Action::Create) => AccessRule::ProjectMember,
        (Resource::Task, _) => AccessRule::TaskProjectMember,

        (Resource::Comment, Action::Create) => AccessRule::TaskProjectMember,
        (Resource::Comment, Action::Update | Action::Delete) => AccessRule::CommentAuthor,
        (Resource::Comment, _) => AccessRule::Authenticated,
    }
}

/// Target object a rule is evaluated against
#[derive(Debug, Clone, Copy)]
pub enum AccessTarget<'a> {
    /// No object (collection operations gated only by authentication)
    None,

    /// A user account
    User(Uuid),

    /// A project (also the scope for member and task collections)
    Project(&'a Project),

    /// A task (the scope for comment creation)
    Task(&'a Task),

    /// A comment
    Comment(&'a Comment),
}

/// Checks whether a user owns a project or holds an Admin membership on it
pub async fn is_project_admin_or_owner(
    pool: &PgPool,
    project: &Project,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    if project.owner_id == user_id {
        return Ok(true);
    }

    let role = ProjectMember::get_role(pool, project.id, user_id).await?;
    Ok(role == Some(ProjectRole::Admin))
}

/// Checks whether a user owns a project or holds any membership on it
pub async fn is_project_member(
    pool: &PgPool,
    project: &Project,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    if project.owner_id == user_id {
        return Ok(true);
    }

    ProjectMember::has_access(pool, project.id, user_id).await
}

/// [`is_project_member`] evaluated against a task's parent project
///
/// A dangling project reference evaluates to false (fail closed).
pub async fn is_task_project_member(
    pool: &PgPool,
    task: &Task,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    match Project::find_by_id(pool, task.project_id).await? {
        Some(project) => is_project_member(pool, &project, user_id).await,
        None => Ok(false),
    }
}

/// Checks whether a user authored a comment
pub fn is_comment_author(comment: &Comment, user_id: Uuid) -> bool {
    comment.author_id == user_id
}

/// Checks whether the actor is the target user or an administrator
pub fn is_self_or_admin(actor: &AuthContext, target_user_id: Uuid) -> bool {
    actor.is_admin || actor.user_id == target_user_id
}

/// Evaluates an access rule against a target, turning `false` into the
/// matching [`PolicyError`]
///
/// A rule/target mismatch is a wiring bug in the caller and is denied
/// rather than ignored.
pub async fn enforce(
    pool: &PgPool,
    rule: AccessRule,
    actor: &AuthContext,
    target: AccessTarget<'_>,
) -> Result<(), PolicyError> {
    match (rule, target) {
        (AccessRule::Authenticated, _) => Ok(()),

        (AccessRule::SelfOrAdmin, AccessTarget::User(target_user_id)) => {
            if is_self_or_admin(actor, target_user_id) {
                Ok(())
            } else {
                Err(PolicyError::NotSelfOrAdmin)
            }
        }

        (AccessRule::ProjectMember, AccessTarget::Project(project)) => {
            if is_project_member(pool, project, actor.user_id).await? {
                Ok(())
            } else {
                Err(PolicyError::NotProjectMember(project.id))
            }
        }

        (AccessRule::ProjectAdminOrOwner, AccessTarget::Project(project)) => {
            if is_project_admin_or_owner(pool, project, actor.user_id).await? {
                Ok(())
            } else {
                Err(PolicyError::NotProjectAdmin)
            }
        }

        (AccessRule::TaskProjectMember, AccessTarget::Task(task)) => {
            if is_task_project_member(pool, task, actor.user_id).await? {
                Ok(())
            } else {
                Err(PolicyError::NotProjectMember(task.project_id))
            }
        }

        (AccessRule::CommentAuthor, AccessTarget::Comment(comment)) => {
            if is_comment_author(comment, actor.user_id) {
                Ok(())
            } else {
                Err(PolicyError::NotCommentAuthor)
            }
        }

        _ => Err(PolicyError::InvalidTarget),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn actor(user_id: Uuid, is_admin: bool) -> AuthContext {
        AuthContext { user_id, is_admin }
    }

    fn sample_comment(author_id: Uuid) -> Comment {
        Comment {
            id: Uuid::new_v4(),
            task_id: Uuid::new_v4(),
            author_id,
            content: "hello".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_is_comment_author() {
        let author = Uuid::new_v4();
        let comment = sample_comment(author);

        assert!(is_comment_author(&comment, author));
        assert!(!is_comment_author(&comment, Uuid::new_v4()));
    }

    #[test]
    fn test_is_self_or_admin() {
        let user_id = Uuid::new_v4();

        // Self
        assert!(is_self_or_admin(&actor(user_id, false), user_id));

        // Admin acting on someone else
        assert!(is_self_or_admin(&actor(Uuid::new_v4(), true), user_id));

        // Stranger
        assert!(!is_self_or_admin(&actor(Uuid::new_v4(), false), user_id));
    }

    #[test]
    fn test_rule_table_users() {
        assert_eq!(
            required_rule(Resource::User, Action::Retrieve),
            AccessRule::Authenticated
        );
        assert_eq!(
            required_rule(Resource::User, Action::Update),
            AccessRule::SelfOrAdmin
        );
        assert_eq!(
            required_rule(Resource::User, Action::Delete),
            AccessRule::SelfOrAdmin
        );
    }

    #[test]
    fn test_rule_table_projects() {
        // Retrieval and listing are open to any authenticated actor; only
        // mutation requires admin-or-owner.
        assert_eq!(
            required_rule(Resource::Project, Action::List),
            AccessRule::Authenticated
        );
        assert_eq!(
            required_rule(Resource::Project, Action::Retrieve),
            AccessRule::Authenticated
        );
        assert_eq!(
            required_rule(Resource::Project, Action::Create),
            AccessRule::Authenticated
        );
        assert_eq!(
            required_rule(Resource::Project, Action::Update),
            AccessRule::ProjectAdminOrOwner
        );
        assert_eq!(
            required_rule(Resource::Project, Action::Delete),
            AccessRule::ProjectAdminOrOwner
        );
    }

    #[test]
    fn test_rule_table_members() {
        assert_eq!(
            required_rule(Resource::Member, Action::List),
            AccessRule::ProjectMember
        );
        assert_eq!(
            required_rule(Resource::Member, Action::Retrieve),
            AccessRule::ProjectMember
        );
        assert_eq!(
            required_rule(Resource::Member, Action::Create),
            AccessRule::ProjectAdminOrOwner
        );
        assert_eq!(
            required_rule(Resource::Member, Action::Update),
            AccessRule::ProjectAdminOrOwner
        );
        assert_eq!(
            required_rule(Resource::Member, Action::Delete),
            AccessRule::ProjectAdminOrOwner
        );
    }

    #[test]
    fn test_rule_table_tasks() {
        // Task reads and writes share the membership predicate.
        assert_eq!(
            required_rule(Resource::Task, Action::List),
            AccessRule::ProjectMember
        );
        assert_eq!(
            required_rule(Resource::Task, Action::Create),
            AccessRule::ProjectMember
        );
        assert_eq!(
            required_rule(Resource::Task, Action::Retrieve),
            AccessRule::TaskProjectMember
        );
        assert_eq!(
            required_rule(Resource::Task, Action::Update),
            AccessRule::TaskProjectMember
        );
        assert_eq!(
            required_rule(Resource::Task, Action::Delete),
            AccessRule::TaskProjectMember
        );
    }

    #[test]
    fn test_rule_table_comments() {
        // Reads are open to any authenticated actor; creation requires
        // membership; mutation is author-only.
        assert_eq!(
            required_rule(Resource::Comment, Action::List),
            AccessRule::Authenticated
        );
        assert_eq!(
            required_rule(Resource::Comment, Action::Retrieve),
            AccessRule::Authenticated
        );
        assert_eq!(
            required_rule(Resource::Comment, Action::Create),
            AccessRule::TaskProjectMember
        );
        assert_eq!(
            required_rule(Resource::Comment, Action::Update),
            AccessRule::CommentAuthor
        );
        assert_eq!(
            required_rule(Resource::Comment, Action::Delete),
            AccessRule::CommentAuthor
        );
    }

    #[test]
    fn test_policy_error_display() {
        let err = PolicyError::NotProjectMember(Uuid::new_v4());
        assert!(err.to_string().contains("Not a member"));

        let err = PolicyError::NotCommentAuthor;
        assert!(err.to_string().contains("comment author"));

        let err = PolicyError::NotSelfOrAdmin;
        assert!(err.to_string().contains("administrator"));
    }
}
