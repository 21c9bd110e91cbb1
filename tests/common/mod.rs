#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use keystone::auth::password::PasswordHasher;
use keystone::clock::ManualClock;
use keystone::config::{AuthConfig, Config};
use keystone::state::AppState;
use keystone::store::MemoryStore;

/// A running server backed by the in-memory store and a manual clock.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub clock: ManualClock,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn register(&self, email: &str, password: &str) -> (Value, StatusCode) {
        self.post_json(
            "/api/auth/register",
            &json!({
                "email": email,
                "password": password,
                "first_name": "Test",
                "last_name": "User",
            }),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> (Value, StatusCode) {
        self.post_json(
            "/api/auth/login",
            &json!({ "email": email, "password": password }),
        )
        .await
    }

    pub async fn forgot_password(&self, email: &str) -> (Value, StatusCode) {
        self.post_json("/api/auth/forgot-password", &json!({ "email": email }))
            .await
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> (Value, StatusCode) {
        self.post_json(
            "/api/auth/reset-password",
            &json!({ "token": token, "new_password": new_password }),
        )
        .await
    }

    /// Register then login, returning the bearer token.
    pub async fn bootstrap(&self, email: &str, password: &str) -> String {
        let (body, status) = self.register(email, password).await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        let (body, status) = self.login(email, password).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

pub fn test_config(expose_reset_token: bool) -> Config {
    Config {
        database_url: String::new(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        max_body_size: 65_536,
        cors_origins: vec![],
        log_level: "warn".to_string(),
        expose_reset_token,
        auth: AuthConfig {
            jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
            token_ttl: Duration::hours(1),
            reset_token_ttl: Duration::hours(24),
        },
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config(true)).await
}

pub async fn spawn_app_with(config: Config) -> TestApp {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap());
    let store = Arc::new(MemoryStore::with_clock(Arc::new(clock.clone())));
    let hasher = PasswordHasher::new(1024, 1, 1).unwrap();

    let state = Arc::new(AppState::new(
        store.clone(),
        Arc::new(clock.clone()),
        hasher,
        config,
    ));
    let app = keystone::build_router(state);

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    TestApp {
        addr,
        client: Client::new(),
        clock,
        store,
    }
}

/// A throwaway Postgres database with migrations applied.
pub struct TestDb {
    pub pool: PgPool,
    pub db_name: String,
    admin_url: String,
}

fn admin_url(base_url: &str) -> String {
    base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.to_string())
}

/// Creates a fresh database, or `None` when `DATABASE_URL` is not set.
pub async fn create_test_db() -> Option<TestDb> {
    let _ = dotenvy::dotenv();
    let base_url = std::env::var("DATABASE_URL").ok()?;

    let db_name = format!("keystone_test_{}", Uuid::now_v7().simple());
    let admin_url = admin_url(&base_url);

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    Some(TestDb {
        pool,
        db_name,
        admin_url,
    })
}

/// Drop the test database after tests complete.
pub async fn cleanup(db: TestDb) {
    db.pool.close().await;

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&db.admin_url)
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!(
        "DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)",
        db.db_name
    ))
    .execute(&admin_pool)
    .await;

    admin_pool.close().await;
}
