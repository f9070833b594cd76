/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Test database setup (migrations run on first connect)
/// - User/token factories
/// - Request helpers driving the real router
///
/// Tests require `DATABASE_URL` to point at a PostgreSQL instance.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use sqlx::PgPool;
use taskboard_api::app::{build_router, AppState};
use taskboard_api::config::Config;
use taskboard_shared::models::auth_token::AuthToken;
use taskboard_shared::models::user::{CreateUser, User};
use tower::Service as _;
use uuid::Uuid;

/// Test context containing the database pool and the app under test
pub struct TestContext {
    pub db: PgPool,
    pub app: Router,
    /// Users created through the factory, removed by `cleanup`
    created_users: Vec<Uuid>,
}

impl TestContext {
    /// Creates a new test context against the configured database
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_env()?;

        let db = PgPool::connect(&config.database.url).await?;

        // Path relative to this crate's Cargo.toml
        sqlx::migrate!("../taskboard-shared/migrations").run(&db).await?;

        let state = AppState::new(db.clone(), config);
        let app = build_router(state);

        Ok(TestContext {
            db,
            app,
            created_users: Vec::new(),
        })
    }

    /// Creates a user directly in the database and issues their token
    ///
    /// The password hash is a placeholder; factory users authenticate with
    /// their token, not a password.
    pub async fn create_user(&mut self, prefix: &str) -> anyhow::Result<(User, String)> {
        let suffix = Uuid::new_v4();
        let user = User::create(
            &self.db,
            CreateUser {
                username: format!("{}-{}", prefix, suffix),
                email: format!("{}-{}@example.com", prefix, suffix),
                password_hash: "unused-in-token-tests".to_string(),
                first_name: prefix.to_string(),
                last_name: "Test".to_string(),
            },
        )
        .await?;

        let token = AuthToken::get_or_create(&self.db, user.id).await?;
        self.created_users.push(user.id);

        Ok((user, token.token))
    }

    /// Sends a request through the router and returns (status, JSON body)
    ///
    /// Empty bodies (e.g. 204 responses) come back as `Value::Null`.
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };

        (status, json)
    }

    /// Removes every factory-created user (and, through the explicit
    /// cascade, everything they own)
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        for user_id in &self.created_users {
            User::delete(&self.db, *user_id).await?;
        }
        Ok(())
    }
}
