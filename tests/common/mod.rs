use std::net::SocketAddr;

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use gatehouse::config::{Config, ResetMailPolicy};

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
}

#[allow(dead_code)]
impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        password_confirm: &str,
    ) -> (Value, StatusCode) {
        self.post(
            "/api/v1/auth/register",
            &json!({
                "email": email,
                "password": password,
                "password_confirm": password_confirm,
            }),
        )
        .await
    }

    pub async fn pre_login(&self, email: &str, password: &str) -> (Value, StatusCode) {
        self.post(
            "/api/v1/auth/pre-login",
            &json!({ "email": email, "password": password }),
        )
        .await
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
        code: Option<&str>,
    ) -> (Value, StatusCode) {
        let mut body = json!({ "email": email, "password": password });
        if let Some(code) = code {
            body["code"] = json!(code);
        }
        self.post("/api/v1/auth/login", &body).await
    }

    /// Register and log in, returning the access token.
    pub async fn register_and_login(&self, email: &str, password: &str) -> String {
        let (body, status) = self.register(email, password, password).await;
        assert_eq!(status, StatusCode::OK, "register failed: {body}");
        let (body, status) = self.login(email, password, None).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["access_token"].as_str().unwrap().to_string()
    }

    pub async fn forgot_password(&self, email: &str) -> (Value, StatusCode) {
        self.post("/api/v1/auth/forgot-password", &json!({ "email": email }))
            .await
    }

    pub async fn validate_reset_token(&self, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url("/api/v1/auth/reset-token"))
            .query(&[("token", token)])
            .send()
            .await
            .expect("validate request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn reset_password(
        &self,
        token: &str,
        password: &str,
        password_confirm: &str,
    ) -> (Value, StatusCode) {
        self.post(
            "/api/v1/auth/reset-password",
            &json!({
                "token": token,
                "password": password,
                "password_confirm": password_confirm,
            }),
        )
        .await
    }

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

    /// The reset token row for a user, straight from the store.
    pub async fn reset_token_row(&self, email: &str) -> Option<(String, DateTime<Utc>)> {
        sqlx::query_as::<_, (String, DateTime<Utc>)>(
            "SELECT t.token, t.token_expiry FROM password_reset_token t
             JOIN users u ON u.id = t.user_id WHERE u.email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .expect("token lookup failed")
    }

    pub async fn reset_token_count(&self, email: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM password_reset_token t
             JOIN users u ON u.id = t.user_id WHERE u.email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .expect("token count failed")
    }

    pub async fn expire_reset_token(&self, token: &str) {
        sqlx::query(
            "UPDATE password_reset_token SET token_expiry = now() - interval '1 second'
             WHERE token = $1",
        )
        .bind(token)
        .execute(&self.pool)
        .await
        .expect("expire token failed");
    }

    pub async fn two_factor_columns(&self, email: &str) -> (Option<String>, bool) {
        sqlx::query_as::<_, (Option<String>, bool)>(
            "SELECT \"2fa_secret\", \"2fa_activated\" FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .expect("user lookup failed")
    }
}

/// Spawn a test app with a fresh temporary database.
pub async fn spawn_app() -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    // Create a unique test database
    let db_name = format!(
        "gatehouse_test_{}",
        Uuid::now_v7().to_string().replace('-', "")
    );

    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

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

    let config = Config {
        database_url: test_url,
        jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to a random port
        base_url: "http://localhost:0".to_string(),
        totp_issuer: "Gatehouse".to_string(),
        reset_mail_policy: ResetMailPolicy::BestEffort,
        log_level: "warn".to_string(),
        smtp: None,
    };

    let app = gatehouse::build_app(pool.clone(), config);

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
    }
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
