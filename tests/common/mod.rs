#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use alumni_api::auth::hash_password;
use alumni_api::clock::{Clock, FixedClock};
use alumni_api::database::models::{Alumnus, NewAlumnus};
use alumni_api::config::config;
use alumni_api::database::{DatabaseManager, MemoryStore, PgStore, Store};
use alumni_api::{app, AppState};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const USER_EMAIL: &str = "sayu@example.com";
pub const PASSWORD: &str = "secret123";

/// Router over a fresh store with the clock pinned to 2025-06-01, plus
/// tokens for one admin and one regular user.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<dyn Store>,
    pub admin: Alumnus,
    pub user: Alumnus,
    pub admin_token: String,
    pub user_token: String,
}

impl TestApp {
    pub async fn spawn() -> Result<Self> {
        let clock = pinned_clock();
        Self::spawn_with(Arc::new(MemoryStore::new(clock.clone())), clock).await
    }

    /// Same fixture over PostgreSQL. Returns `None` when `DATABASE_URL` is
    /// unset. Every table is emptied first, so callers must not run
    /// concurrently against the same database.
    pub async fn spawn_postgres() -> Result<Option<Self>> {
        if std::env::var("DATABASE_URL").is_err() {
            return Ok(None);
        }
        let pool = DatabaseManager::connect(&config().database).await?;
        DatabaseManager::migrate(&pool).await?;
        let store = PgStore::new(pool);
        sqlx::query("TRUNCATE employment, alumni, roles RESTART IDENTITY CASCADE").execute(store.pool()).await?;
        // reseeds the admin and user roles as ids 1 and 2
        DatabaseManager::migrate(store.pool()).await?;
        Self::spawn_with(Arc::new(store), pinned_clock()).await.map(Some)
    }

    async fn spawn_with(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Result<Self> {
        let router = app(AppState::new(store.clone(), clock));

        let admin = seed_alumnus(store.as_ref(), "A000", "Admin Utama", ADMIN_EMAIL, 1).await?;
        let user = seed_alumnus(store.as_ref(), "S001", "Sayu Yunan", USER_EMAIL, 2).await?;

        let mut test_app =
            Self { router, store, admin, user, admin_token: String::new(), user_token: String::new() };
        test_app.admin_token = test_app.login(ADMIN_EMAIL, PASSWORD).await?;
        test_app.user_token = test_app.login(USER_EMAIL, PASSWORD).await?;
        Ok(test_app)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let (status, body) =
            self.send(Method::POST, "/api/login", None, Some(json!({ "email": email, "password": password }))).await?;
        anyhow::ensure!(status == StatusCode::OK, "login failed: {} {}", status, body);
        body["data"]["token"].as_str().map(str::to_string).context("token missing from login response")
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };
        Ok((status, value))
    }

    pub async fn get_as_admin(&self, uri: &str) -> Result<(StatusCode, Value)> {
        self.send(Method::GET, uri, Some(&self.admin_token), None).await
    }

    pub async fn get_as_user(&self, uri: &str) -> Result<(StatusCode, Value)> {
        self.send(Method::GET, uri, Some(&self.user_token), None).await
    }

    /// Creates an alumnus through the API and returns its id.
    pub async fn create_alumnus(&self, student_number: &str, name: &str, major: &str, cohort: i32) -> Result<i64> {
        let email = format!("{}@example.com", student_number.to_lowercase());
        let (status, body) = self
            .send(
                Method::POST,
                "/api/alumni",
                Some(&self.admin_token),
                Some(json!({
                    "nim": student_number,
                    "nama": name,
                    "jurusan": major,
                    "angkatan": cohort,
                    "tahun_lulus": cohort + 4,
                    "email": email,
                    "password": PASSWORD,
                    "role_id": 2
                })),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create alumnus failed: {} {}", status, body);
        body["data"]["id"].as_i64().context("id missing")
    }

    /// Creates an employment record through the API and returns its id.
    pub async fn create_employment(&self, alumni_id: i64, company: &str, industry: &str, start_date: &str) -> Result<i64> {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/employment",
                Some(&self.admin_token),
                Some(json!({
                    "alumni_id": alumni_id,
                    "company": company,
                    "position": "Engineer",
                    "industry": industry,
                    "location": "Jakarta",
                    "salary_range": "10-15jt",
                    "start_date": start_date,
                    "status": "active"
                })),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create employment failed: {} {}", status, body);
        body["data"]["id"].as_i64().context("id missing")
    }
}

fn pinned_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()))
}

async fn seed_alumnus(store: &dyn Store, student_number: &str, name: &str, email: &str, role_id: i64) -> Result<Alumnus> {
    let alumnus = store
        .create_alumnus(NewAlumnus {
            student_number: student_number.to_string(),
            name: name.to_string(),
            major: "Informatika".to_string(),
            cohort: 2018,
            graduation_year: 2022,
            email: email.to_string(),
            phone: None,
            address: None,
            password_hash: hash_password(PASSWORD)?,
            role_id,
        })
        .await?;
    Ok(alumnus)
}
