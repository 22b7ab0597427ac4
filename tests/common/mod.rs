use std::net::SocketAddr;
use std::path::PathBuf;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use userdesk::config::Config;

pub const JWT_SECRET: &str = "test-jwt-secret-that-is-long-enough";

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
    pub upload_dir: PathBuf,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn send(&self, req: RequestBuilder) -> (Value, StatusCode) {
        let resp = req.send().await.expect("request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Register a user, return the response body + status.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> (Value, StatusCode) {
        self.register_raw(&json!({ "name": name, "email": email, "password": password }))
            .await
    }

    /// Register with an arbitrary body (for field-omission tests).
    pub async fn register_raw(&self, body: &Value) -> (Value, StatusCode) {
        self.send(self.client.post(self.url("/api/auth/register")).json(body))
            .await
    }

    pub async fn login(&self, email: &str, password: &str) -> (Value, StatusCode) {
        let body = json!({ "email": email, "password": password });
        self.send(self.client.post(self.url("/api/auth/login")).json(&body))
            .await
    }

    pub async fn admin_login(&self, email: &str, password: &str) -> (Value, StatusCode) {
        let body = json!({ "email": email, "password": password });
        self.send(self.client.post(self.url("/api/auth/admin-login")).json(&body))
            .await
    }

    /// Register a user, flip the stored role flag, and return an admin token.
    pub async fn bootstrap_admin(&self) -> String {
        let (body, status) = self.register("Admin", "admin@test.com", "password123").await;
        assert_eq!(status, StatusCode::CREATED, "bootstrap register failed: {body}");
        self.promote_to_admin("admin@test.com").await;

        let (body, status) = self.admin_login("admin@test.com", "password123").await;
        assert_eq!(status, StatusCode::OK, "bootstrap admin login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Register a regular user and return (id, token).
    pub async fn bootstrap_user(&self, name: &str, email: &str, password: &str) -> (String, String) {
        let (body, status) = self.register(name, email, password).await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        (
            body["user"]["id"].as_str().unwrap().to_string(),
            body["token"].as_str().unwrap().to_string(),
        )
    }

    /// Set the role flag directly in the store. Role assignment has no API
    /// surface, matching the deployed system.
    pub async fn promote_to_admin(&self, email: &str) {
        sqlx::query("UPDATE users SET is_admin = TRUE WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await
            .expect("failed to promote user");
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        self.send(self.client.get(self.url(path)).bearer_auth(token))
            .await
    }

    pub async fn post_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        self.send(self.client.post(self.url(path)).bearer_auth(token).json(body))
            .await
    }

    pub async fn put_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        self.send(self.client.put(self.url(path)).bearer_auth(token).json(body))
            .await
    }

    pub async fn delete_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        self.send(self.client.delete(self.url(path)).bearer_auth(token))
            .await
    }

    /// Count stored rows for an email, bypassing the API.
    pub async fn count_users_with_email(&self, email: &str) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = $1")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .expect("count query failed")
    }
}

/// Swap the database name in a Postgres connection URL.
fn with_db(base_url: &str, db: &str) -> String {
    base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db}"))
        .unwrap_or_else(|| base_url.to_string())
}

async fn connect(url: &str, max: u32) -> PgPool {
    PgPoolOptions::new()
        .max_connections(max)
        .connect(url)
        .await
        .expect("Failed to connect to Postgres")
}

/// Spawn the app on a random port against a freshly created database.
pub async fn spawn_app() -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let db_name = format!(
        "userdesk_test_{}",
        Uuid::now_v7().to_string().replace('-', "")
    );

    // The test database is created through the maintenance database, then
    // migrated through its own pool.
    let admin_pool = connect(&with_db(&base_url, "postgres"), 2).await;
    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");
    admin_pool.close().await;

    let test_url = with_db(&base_url, &db_name);
    let pool = connect(&test_url, 5).await;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let upload_dir = std::env::temp_dir().join(format!("{db_name}_uploads"));
    std::fs::create_dir_all(&upload_dir).expect("Failed to create test upload dir");

    let config = Config {
        database_url: test_url,
        jwt_secret: JWT_SECRET.to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, the listener below picks the port
        upload_dir: upload_dir.to_str().unwrap().to_string(),
        max_upload_size: 1_048_576,
        log_level: "warn".to_string(),
    };

    let app = userdesk::build_app(pool.clone(), config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        pool,
        client,
        db_name,
        upload_dir,
    }
}

/// Drop the test database and upload directory after a test.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let _ = std::fs::remove_dir_all(&app.upload_dir);

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let admin_pool = connect(&with_db(&base_url, "postgres"), 2).await;
    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;
    admin_pool.close().await;
}
