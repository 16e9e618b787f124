use std::net::SocketAddr;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use veriloc::config::{Config, SuperAdminConfig};

pub const SUPER_USERNAME: &str = "superadmin";
pub const SUPER_PASSWORD: &str = "admin123";
pub const SUPER_FINGERPRINT: i32 = 1000;

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Login and return the response body + status.
    pub async fn login(&self, username: &str, password: &str) -> (Value, StatusCode) {
        self.post(
            "/api/auth/login",
            &json!({ "username": username, "password": password }),
        )
        .await
    }

    /// Log in as the bootstrapped super admin, return the token.
    pub async fn super_token(&self) -> String {
        let (body, status) = self.login(SUPER_USERNAME, SUPER_PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "super admin login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Register a regular admin, return the admin JSON.
    pub async fn create_admin(&self, token: &str, username: &str, fingerprint_id: i32) -> Value {
        let (body, status) = self
            .post_auth(
                "/api/auth/register",
                token,
                &json!({
                    "username": username,
                    "password": "password123",
                    "email": format!("{username}@veriloc.com"),
                    "fingerprintID": fingerprint_id,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create admin failed: {body}");
        body["admin"].clone()
    }

    /// Create a booking, return (body, status).
    pub async fn create_room(
        &self,
        token: &str,
        room_number: &str,
        day: &str,
        duration: &str,
        authorized: &[&str],
    ) -> (Value, StatusCode) {
        self.post_auth(
            "/api/rooms",
            token,
            &json!({
                "roomNumber": room_number,
                "day": day,
                "duration": duration,
                "authorizedAdmins": authorized,
            }),
        )
        .await
    }

    /// Unauthenticated POST with JSON body.
    pub async fn post(&self, path: &str, body: &Value) -> (Value, StatusCode) {
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

    /// Unauthenticated GET.
    pub async fn get(&self, path: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated GET request.
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

    /// Make an authenticated POST request with JSON body.
    pub async fn post_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated PUT request with JSON body.
    pub async fn put_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("put request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated DELETE request.
    pub async fn delete_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("delete request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

fn server_url(base_url: &str, db: &str) -> String {
    base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db}"))
        .unwrap_or_else(|| base_url.to_string())
}

pub fn test_config(database_url: String) -> Config {
    Config {
        database_url,
        jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        cors_origins: vec!["http://localhost:5173".to_string()],
        token_ttl_hours: 24,
        log_level: "warn".to_string(),
        super_admin: Some(SuperAdminConfig {
            username: SUPER_USERNAME.to_string(),
            password: SUPER_PASSWORD.to_string(),
            email: "superadmin@veriloc.com".to_string(),
            fingerprint_id: SUPER_FINGERPRINT.to_string(),
        }),
    }
}

/// Spawn a test app with a fresh temporary database and a bootstrapped super admin.
pub async fn spawn_app() -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    let db_name = format!("veriloc_test_{}", Uuid::now_v7().simple());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&server_url(&base_url, "postgres"))
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = server_url(&base_url, &db_name);

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let config = test_config(test_url);

    veriloc::bootstrap::ensure_super_admin(&pool, config.super_admin.as_ref())
        .await
        .expect("Failed to bootstrap super admin");

    let (app, _state) = veriloc::build_app(pool.clone(), config);

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    let client = Client::builder().build().unwrap();

    TestApp {
        addr,
        pool,
        client,
        db_name,
    }
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&server_url(&base_url, "postgres"))
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
