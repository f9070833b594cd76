/// Integration tests for the authorization and resource-scoping layer
///
/// These tests drive the real router against a real database and verify:
/// - Registration/login round-trip and idempotent token issuance
/// - The atomic project + owner-membership dual write
/// - Visibility of the project list per actor
/// - The permission matrix for project mutation
/// - Membership uniqueness (409 on duplicates)
/// - Task access for members vs strangers
/// - Author-only comment mutation
/// - The explicit delete cascade

mod common;

use axum::http::StatusCode;
use common::TestContext;
use serde_json::json;
use taskboard_shared::models::auth_token::AuthToken;
use taskboard_shared::models::member::ProjectMember;
use taskboard_shared::models::task::Task;
use uuid::Uuid;

/// Creates a project through the API and returns its ID
async fn create_project(ctx: &TestContext, token: &str, name: &str) -> Uuid {
    let (status, body) = ctx
        .send(
            "POST",
            "/v1/projects",
            Some(token),
            Some(json!({ "name": name, "description": "test project" })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "create project: {}", body);
    body["id"].as_str().unwrap().parse().unwrap()
}

/// Adds a member through the API and returns the membership ID
async fn add_member(
    ctx: &TestContext,
    token: &str,
    project_id: Uuid,
    user_id: Uuid,
    role: &str,
) -> Uuid {
    let (status, body) = ctx
        .send(
            "POST",
            &format!("/v1/projects/{}/members", project_id),
            Some(token),
            Some(json!({ "user_id": user_id, "role": role })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "add member: {}", body);
    body["id"].as_str().unwrap().parse().unwrap()
}

/// Creates a task through the API and returns its ID
async fn create_task(ctx: &TestContext, token: &str, project_id: Uuid, title: &str) -> Uuid {
    let (status, body) = ctx
        .send(
            "POST",
            &format!("/v1/projects/{}/tasks", project_id),
            Some(token),
            Some(json!({ "title": title })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "create task: {}", body);
    body["id"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn test_register_login_roundtrip() {
    let ctx = TestContext::new().await.unwrap();

    let username = format!("roundtrip-{}", Uuid::new_v4());
    let register_body = json!({
        "username": username,
        "email": format!("{}@example.com", username),
        "password": "Str0ng!Pass",
        "password2": "Str0ng!Pass",
        "first_name": "Round",
        "last_name": "Trip"
    });

    let (status, body) = ctx
        .send("POST", "/v1/users/register", None, Some(register_body))
        .await;
    assert_eq!(status, StatusCode::CREATED, "register: {}", body);
    assert_eq!(body["username"], json!(username));
    // Credentials never leak into the response
    assert!(body.get("password").is_none());
    assert!(body.get("password_hash").is_none());

    let user_id: Uuid = body["id"].as_str().unwrap().parse().unwrap();

    // Login issues a token
    let (status, body) = ctx
        .send(
            "POST",
            "/v1/users/login",
            None,
            Some(json!({ "username": username, "password": "Str0ng!Pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "login: {}", body);
    let token = body["token"].as_str().unwrap().to_string();
    assert_eq!(token.len(), 40);
    assert_eq!(body["user_id"].as_str().unwrap(), user_id.to_string());

    // Wrong password: 401, and the stored token is unchanged
    let (status, _) = ctx
        .send(
            "POST",
            "/v1/users/login",
            None,
            Some(json!({ "username": username, "password": "WrongP@ss1" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let stored = AuthToken::find_by_user(&ctx.db, user_id).await.unwrap().unwrap();
    assert_eq!(stored.token, token);

    // Repeated login returns the same token (one per user, not per session)
    let (status, body) = ctx
        .send(
            "POST",
            "/v1/users/login",
            None,
            Some(json!({ "username": username, "password": "Str0ng!Pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token"].as_str().unwrap(), token);

    // Duplicate username is a field-level validation failure
    let (status, body) = ctx
        .send(
            "POST",
            "/v1/users/register",
            None,
            Some(json!({
                "username": username,
                "email": format!("other-{}@example.com", Uuid::new_v4()),
                "password": "Str0ng!Pass",
                "password2": "Str0ng!Pass"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], json!("username"));

    taskboard_shared::models::user::User::delete(&ctx.db, user_id)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_register_rejects_password_mismatch_and_weak_passwords() {
    let ctx = TestContext::new().await.unwrap();

    let username = format!("weak-{}", Uuid::new_v4());

    // Mismatched confirmation
    let (status, body) = ctx
        .send(
            "POST",
            "/v1/users/register",
            None,
            Some(json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": "Str0ng!Pass",
                "password2": "Different!1"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], json!("password"));

    // Fails the strength policy (no special character)
    let (status, body) = ctx
        .send(
            "POST",
            "/v1/users/register",
            None,
            Some(json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": "NoSpecial123",
                "password2": "NoSpecial123"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], json!("password"));
}

#[tokio::test]
async fn test_unauthenticated_requests_are_rejected() {
    let ctx = TestContext::new().await.unwrap();

    let (status, _) = ctx.send("GET", "/v1/projects", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx
        .send("GET", "/v1/projects", Some(&"a".repeat(40)), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_project_creates_owner_admin_membership() {
    let mut ctx = TestContext::new().await.unwrap();
    let (owner, token) = ctx.create_user("owner").await.unwrap();

    let project_id = create_project(&ctx, &token, "Alpha").await;

    // Exactly one membership row, role admin, for the owner
    let members = ProjectMember::list_by_project(&ctx.db, project_id)
        .await
        .unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].user_id, owner.id);
    assert_eq!(members[0].role.as_str(), "admin");

    // The response embeds the same membership
    let (status, body) = ctx
        .send("GET", &format!("/v1/projects/{}", project_id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["owner"]["id"].as_str().unwrap(), owner.id.to_string());
    assert_eq!(body["members"].as_array().unwrap().len(), 1);
    assert_eq!(body["members"][0]["role"], json!("admin"));

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_add_member_twice_conflicts() {
    let mut ctx = TestContext::new().await.unwrap();
    let (_owner, owner_token) = ctx.create_user("owner").await.unwrap();
    let (member, _) = ctx.create_user("member").await.unwrap();

    let project_id = create_project(&ctx, &owner_token, "Dup").await;

    add_member(&ctx, &owner_token, project_id, member.id, "member").await;

    let (status, _) = ctx
        .send(
            "POST",
            &format!("/v1/projects/{}/members", project_id),
            Some(&owner_token),
            Some(json!({ "user_id": member.id, "role": "member" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Still exactly one row for (project, user)
    let members = ProjectMember::list_by_project(&ctx.db, project_id)
        .await
        .unwrap();
    let rows: Vec<_> = members.iter().filter(|m| m.user_id == member.id).collect();
    assert_eq!(rows.len(), 1);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_list_projects_visibility() {
    let mut ctx = TestContext::new().await.unwrap();
    let (_owner, owner_token) = ctx.create_user("owner").await.unwrap();
    let (member, member_token) = ctx.create_user("member").await.unwrap();
    let (_stranger, stranger_token) = ctx.create_user("stranger").await.unwrap();

    let project_id = create_project(&ctx, &owner_token, "Visible").await;
    add_member(&ctx, &owner_token, project_id, member.id, "member").await;

    let project_id_str = project_id.to_string();
    let sees = |body: &serde_json::Value| {
        body.as_array()
            .unwrap()
            .iter()
            .any(|p| p["id"].as_str() == Some(project_id_str.as_str()))
    };

    let (status, body) = ctx.send("GET", "/v1/projects", Some(&owner_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(sees(&body), "owner should see the project");

    let (status, body) = ctx.send("GET", "/v1/projects", Some(&member_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(sees(&body), "member should see the project");

    let (status, body) = ctx
        .send("GET", "/v1/projects", Some(&stranger_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!sees(&body), "stranger should not see the project");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_project_mutation_permission_matrix() {
    let mut ctx = TestContext::new().await.unwrap();
    let (_owner, owner_token) = ctx.create_user("owner").await.unwrap();
    let (admin, admin_token) = ctx.create_user("admin").await.unwrap();
    let (plain, plain_token) = ctx.create_user("plain").await.unwrap();
    let (_stranger, stranger_token) = ctx.create_user("stranger").await.unwrap();

    let project_id = create_project(&ctx, &owner_token, "Matrix").await;
    add_member(&ctx, &owner_token, project_id, admin.id, "admin").await;
    add_member(&ctx, &owner_token, project_id, plain.id, "member").await;

    let update = |name: &str| Some(json!({ "name": name }));
    let uri = format!("/v1/projects/{}", project_id);

    // Update: owner and admin member succeed; plain member and stranger are denied
    let (status, _) = ctx.send("PATCH", &uri, Some(&owner_token), update("By owner")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx.send("PATCH", &uri, Some(&admin_token), update("By admin")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx.send("PATCH", &uri, Some(&plain_token), update("By member")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .send("PATCH", &uri, Some(&stranger_token), update("By stranger"))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Delete: denied for plain member and stranger, allowed for admin member
    let (status, _) = ctx.send("DELETE", &uri, Some(&plain_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx.send("DELETE", &uri, Some(&stranger_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx.send("DELETE", &uri, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // And allowed for the owner on a fresh project
    let project_id = create_project(&ctx, &owner_token, "Matrix 2").await;
    let (status, _) = ctx
        .send(
            "DELETE",
            &format!("/v1/projects/{}", project_id),
            Some(&owner_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_member_task_lifecycle_scenario() {
    let mut ctx = TestContext::new().await.unwrap();
    let (_a, a_token) = ctx.create_user("a").await.unwrap();
    let (b, b_token) = ctx.create_user("b").await.unwrap();
    let (_c, c_token) = ctx.create_user("c").await.unwrap();

    // A creates "Alpha" and adds B as a plain member
    let project_id = create_project(&ctx, &a_token, "Alpha").await;
    add_member(&ctx, &a_token, project_id, b.id, "member").await;

    // B (member, not admin) may create tasks
    let task_id = create_task(&ctx, &b_token, project_id, "T1").await;

    // B may read and update the task; the stranger C may not
    let task_uri = format!("/v1/tasks/{}", task_id);
    let (status, _) = ctx.send("GET", &task_uri, Some(&b_token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx.send("GET", &task_uri, Some(&c_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .send(
            "PATCH",
            &task_uri,
            Some(&b_token),
            Some(json!({ "status": "in_progress" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // B cannot delete the project
    let (status, _) = ctx
        .send(
            "DELETE",
            &format!("/v1/projects/{}", project_id),
            Some(&b_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // A deletes it; the task and membership rows go with it
    let (status, _) = ctx
        .send(
            "DELETE",
            &format!("/v1/projects/{}", project_id),
            Some(&a_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert!(Task::find_by_id(&ctx.db, task_id).await.unwrap().is_none());
    assert!(ProjectMember::list_by_project(&ctx.db, project_id)
        .await
        .unwrap()
        .is_empty());

    let (status, _) = ctx.send("GET", &task_uri, Some(&a_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_comment_mutation_is_author_only() {
    let mut ctx = TestContext::new().await.unwrap();
    let (_a, a_token) = ctx.create_user("a").await.unwrap();
    let (b, b_token) = ctx.create_user("b").await.unwrap();

    let project_id = create_project(&ctx, &a_token, "Comments").await;
    add_member(&ctx, &a_token, project_id, b.id, "member").await;
    let task_id = create_task(&ctx, &a_token, project_id, "T1").await;

    // B comments; the author is force-set to B regardless of the payload
    let (status, body) = ctx
        .send(
            "POST",
            &format!("/v1/tasks/{}/comments", task_id),
            Some(&b_token),
            Some(json!({ "content": "Looks good", "author": "ignored" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "create comment: {}", body);
    assert_eq!(body["author"]["id"].as_str().unwrap(), b.id.to_string());

    let comment_id = body["id"].as_str().unwrap().to_string();
    let comment_uri = format!("/v1/comments/{}", comment_id);

    // A owns the project but did not author the comment
    let (status, _) = ctx
        .send(
            "PATCH",
            &comment_uri,
            Some(&a_token),
            Some(json!({ "content": "Overwritten" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx.send("DELETE", &comment_uri, Some(&a_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // B edits and deletes their own comment
    let (status, body) = ctx
        .send(
            "PATCH",
            &comment_uri,
            Some(&b_token),
            Some(json!({ "content": "Edited" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], json!("Edited"));

    let (status, _) = ctx.send("DELETE", &comment_uri, Some(&b_token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_comment_reads_are_open_to_any_authenticated_user() {
    let mut ctx = TestContext::new().await.unwrap();
    let (_a, a_token) = ctx.create_user("a").await.unwrap();
    let (_c, c_token) = ctx.create_user("c").await.unwrap();

    let project_id = create_project(&ctx, &a_token, "Open reads").await;
    let task_id = create_task(&ctx, &a_token, project_id, "T1").await;

    let (status, body) = ctx
        .send(
            "POST",
            &format!("/v1/tasks/{}/comments", task_id),
            Some(&a_token),
            Some(json!({ "content": "Visible to all" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let comment_id = body["id"].as_str().unwrap().to_string();

    // C is a stranger to the project but may list and retrieve comments
    let (status, body) = ctx
        .send(
            "GET",
            &format!("/v1/tasks/{}/comments", task_id),
            Some(&c_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = ctx
        .send("GET", &format!("/v1/comments/{}", comment_id), Some(&c_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    // But C may not comment
    let (status, _) = ctx
        .send(
            "POST",
            &format!("/v1/tasks/{}/comments", task_id),
            Some(&c_token),
            Some(json!({ "content": "Denied" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_member_listing_requires_membership() {
    let mut ctx = TestContext::new().await.unwrap();
    let (_a, a_token) = ctx.create_user("a").await.unwrap();
    let (plain, plain_token) = ctx.create_user("plain").await.unwrap();
    let (_stranger, stranger_token) = ctx.create_user("stranger").await.unwrap();

    let project_id = create_project(&ctx, &a_token, "Members").await;
    add_member(&ctx, &a_token, project_id, plain.id, "member").await;

    let uri = format!("/v1/projects/{}/members", project_id);

    let (status, _) = ctx.send("GET", &uri, Some(&plain_token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx.send("GET", &uri, Some(&stranger_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Plain members cannot manage the member list
    let (status, _) = ctx
        .send(
            "POST",
            &uri,
            Some(&plain_token),
            Some(json!({ "user_id": Uuid::new_v4(), "role": "member" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_user_mutation_is_self_or_admin() {
    let mut ctx = TestContext::new().await.unwrap();
    let (a, a_token) = ctx.create_user("a").await.unwrap();
    let (_b, b_token) = ctx.create_user("b").await.unwrap();

    let uri = format!("/v1/users/{}", a.id);

    // Any authenticated actor may read
    let (status, _) = ctx.send("GET", &uri, Some(&b_token), None).await;
    assert_eq!(status, StatusCode::OK);

    // But only self (or an administrator) may mutate
    let (status, _) = ctx
        .send("PATCH", &uri, Some(&b_token), Some(json!({ "first_name": "Hax" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx.send("DELETE", &uri, Some(&b_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx
        .send("PATCH", &uri, Some(&a_token), Some(json!({ "first_name": "Anna" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["first_name"], json!("Anna"));

    let (status, _) = ctx.send("DELETE", &uri, Some(&a_token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    ctx.cleanup().await.unwrap();
}
