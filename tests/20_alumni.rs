mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use common::{TestApp, PASSWORD};

fn ids(body: &Value) -> Vec<i64> {
    body["data"]["items"].as_array().map(|a| a.iter().filter_map(|i| i["id"].as_i64()).collect()).unwrap_or_default()
}

/// Seeds 12 more alumni on top of the admin and the default user.
async fn seed_directory(app: &TestApp) -> Result<()> {
    let names = [
        "Budi", "Citra", "Dewi", "Eka", "Fajar", "Gita", "Hadi", "Indah", "Joko", "Kartika", "Lestari", "Made",
    ];
    for (i, name) in names.iter().enumerate() {
        let major = if i % 2 == 0 { "Teknik Sipil" } else { "Akuntansi" };
        app.create_alumnus(&format!("N{:03}", i), name, major, 2015 + i as i32).await?;
    }
    Ok(())
}

#[tokio::test]
async fn list_uses_default_page_and_envelope() -> Result<()> {
    let app = TestApp::spawn().await?;
    seed_directory(&app).await?;

    let (status, body) = app.get_as_user("/api/alumni").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let meta = &body["data"]["meta"];
    assert_eq!(meta["page"], 1);
    assert_eq!(meta["limit"], 10);
    assert_eq!(meta["total"], 14);
    assert_eq!(meta["pages"], 2);
    assert_eq!(meta["sortBy"], "id");
    assert_eq!(meta["order"], "asc");
    assert_eq!(ids(&body).len(), 10);
    assert!(body["data"]["items"][0].get("password_hash").is_none());
    Ok(())
}

#[tokio::test]
async fn pages_partition_the_result_set() -> Result<()> {
    let app = TestApp::spawn().await?;
    seed_directory(&app).await?;

    let mut seen = Vec::new();
    for page in 1..=3 {
        let (_, body) = app.get_as_user(&format!("/api/alumni?limit=5&page={}", page)).await?;
        let page_ids = ids(&body);
        assert_eq!(body["data"]["meta"]["pages"], 3);
        if page < 3 {
            assert_eq!(page_ids.len(), 5);
        } else {
            assert_eq!(page_ids.len(), 4);
        }
        seen.extend(page_ids);
    }
    let mut sorted = seen.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), 14);
    assert_eq!(seen, sorted);
    Ok(())
}

#[tokio::test]
async fn unknown_sort_key_behaves_like_id() -> Result<()> {
    let app = TestApp::spawn().await?;
    seed_directory(&app).await?;

    let (_, by_garbage) = app.get_as_user("/api/alumni?sortBy=drop%20table&limit=50").await?;
    let (_, by_id) = app.get_as_user("/api/alumni?sortBy=id&limit=50").await?;

    assert_eq!(by_garbage["data"]["meta"]["sortBy"], "id");
    assert_eq!(ids(&by_garbage), ids(&by_id));
    Ok(())
}

#[tokio::test]
async fn only_desc_reverses_the_order() -> Result<()> {
    let app = TestApp::spawn().await?;
    seed_directory(&app).await?;

    let (_, asc) = app.get_as_user("/api/alumni?sortBy=name&limit=50").await?;
    let (_, garbage) = app.get_as_user("/api/alumni?sortBy=name&order=sideways&limit=50").await?;
    let (_, desc) = app.get_as_user("/api/alumni?sortBy=nama&order=DESC&limit=50").await?;

    assert_eq!(garbage["data"]["meta"]["order"], "asc");
    assert_eq!(ids(&asc), ids(&garbage));

    let mut reversed = ids(&asc);
    reversed.reverse();
    assert_eq!(desc["data"]["meta"]["order"], "desc");
    assert_eq!(ids(&desc), reversed);

    let first_name = asc["data"]["items"][0]["name"].as_str().unwrap_or_default().to_string();
    assert_eq!(first_name, "Admin Utama");
    Ok(())
}

#[tokio::test]
async fn search_is_case_insensitive_substring() -> Result<()> {
    let app = TestApp::spawn().await?;
    seed_directory(&app).await?;

    let (_, body) = app.get_as_user("/api/alumni?search=SAYU").await?;
    assert_eq!(body["data"]["meta"]["total"], 1);
    assert_eq!(body["data"]["meta"]["search"], "SAYU");
    assert_eq!(body["data"]["items"][0]["name"], "Sayu Yunan");

    let (_, by_major) = app.get_as_user("/api/alumni?search=sipil&limit=50").await?;
    assert_eq!(by_major["data"]["meta"]["total"], 6);

    let (_, empty) = app.get_as_user("/api/alumni?search=&limit=50").await?;
    assert_eq!(empty["data"]["meta"]["total"], 14);
    Ok(())
}

#[tokio::test]
async fn search_wildcards_are_literal() -> Result<()> {
    let app = TestApp::spawn().await?;
    seed_directory(&app).await?;

    let (_, body) = app.get_as_user("/api/alumni?search=%25").await?;
    assert_eq!(body["data"]["meta"]["total"], 0);
    let (_, body) = app.get_as_user("/api/alumni?search=_").await?;
    assert_eq!(body["data"]["meta"]["total"], 0);
    Ok(())
}

#[tokio::test]
async fn identical_queries_return_identical_pages() -> Result<()> {
    let app = TestApp::spawn().await?;
    seed_directory(&app).await?;

    let uri = "/api/alumni?sortBy=major&order=desc&limit=4&page=2";
    let (_, first) = app.get_as_user(uri).await?;
    let (_, second) = app.get_as_user(uri).await?;
    assert_eq!(first["data"], second["data"]);
    Ok(())
}

#[tokio::test]
async fn create_validates_and_enforces_uniqueness() -> Result<()> {
    let app = TestApp::spawn().await?;

    let (status, body) = app
        .send(Method::POST, "/api/alumni", Some(&app.admin_token), Some(json!({ "name": "No Email", "cohort": -1 })))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["email"].is_string());
    assert!(body["field_errors"]["cohort"].is_string());

    let duplicate = json!({
        "student_number": "S999",
        "name": "Another Sayu",
        "major": "Informatika",
        "cohort": 2018,
        "graduation_year": 2022,
        "email": common::USER_EMAIL,
        "password": PASSWORD,
        "role_id": 2
    });
    let (status, _) = app.send(Method::POST, "/api/alumni", Some(&app.admin_token), Some(duplicate)).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn create_rejects_unknown_role() -> Result<()> {
    let app = TestApp::spawn().await?;
    let (status, _) = app
        .send(
            Method::POST,
            "/api/alumni",
            Some(&app.admin_token),
            Some(json!({
                "student_number": "R001",
                "name": "Rina",
                "major": "Hukum",
                "cohort": 2017,
                "graduation_year": 2021,
                "email": "rina@example.com",
                "password": PASSWORD,
                "role_id": 99
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn get_distinguishes_bad_ids_from_missing_ones() -> Result<()> {
    let app = TestApp::spawn().await?;

    let (status, body) = app.get_as_user(&format!("/api/alumni/{}", app.user.id)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], common::USER_EMAIL);

    let (status, _) = app.get_as_user("/api/alumni/abc").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get_as_user("/api/alumni/9999").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn update_changes_only_supplied_fields() -> Result<()> {
    let app = TestApp::spawn().await?;
    let uri = format!("/api/alumni/{}", app.user.id);

    let (status, body) =
        app.send(Method::PUT, &uri, Some(&app.admin_token), Some(json!({ "phone": "0812345678" }))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["phone"], "0812345678");
    assert_eq!(body["data"]["name"], "Sayu Yunan");

    let (status, _) = app.send(Method::PUT, &uri, Some(&app.admin_token), Some(json!({ "name": "  " }))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A new password takes effect for login.
    let (status, _) =
        app.send(Method::PUT, &uri, Some(&app.admin_token), Some(json!({ "password": "changed-pw" }))).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(app.login(common::USER_EMAIL, "changed-pw").await.is_ok());
    Ok(())
}

#[tokio::test]
async fn delete_removes_alumnus_and_their_employment() -> Result<()> {
    let app = TestApp::spawn().await?;
    let alumni_id = app.create_alumnus("D001", "Dimas", "Fisika", 2016).await?;
    let employment_id = app.create_employment(alumni_id, "PT Maju", "Energi", "2021-02-01").await?;

    let (status, _) =
        app.send(Method::DELETE, &format!("/api/alumni/{}", alumni_id), Some(&app.admin_token), None).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get_as_admin(&format!("/api/alumni/{}", alumni_id)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.get_as_admin(&format!("/api/employment/{}", employment_id)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) =
        app.send(Method::DELETE, &format!("/api/alumni/{}", alumni_id), Some(&app.admin_token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn page_far_past_the_end_is_empty() -> Result<()> {
    let app = TestApp::spawn().await?;
    seed_directory(&app).await?;

    let (status, body) = app.get_as_user(&format!("/api/alumni?page={}&limit=10", i64::MAX)).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(ids(&body).is_empty());
    let meta = &body["data"]["meta"];
    assert_eq!(meta["page"], i64::MAX);
    assert_eq!(meta["total"], 14);
    assert_eq!(meta["pages"], 2);
    Ok(())
}

#[tokio::test]
async fn name_sort_is_by_byte_value() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.create_alumnus("L001", "bambang", "Akuntansi", 2019).await?;
    app.create_alumnus("L002", "Zed", "Akuntansi", 2019).await?;

    let (_, body) = app.get_as_user("/api/alumni?sortBy=name").await?;
    let names: Vec<&str> =
        body["data"]["items"].as_array().unwrap().iter().filter_map(|i| i["name"].as_str()).collect();
    assert_eq!(names, vec!["Admin Utama", "Sayu Yunan", "Zed", "bambang"]);
    Ok(())
}

#[tokio::test]
async fn update_clears_contact_fields_only_when_sent() -> Result<()> {
    let app = TestApp::spawn().await?;
    let id = app.create_alumnus("P001", "Putri", "Akuntansi", 2019).await?;
    let uri = format!("/api/alumni/{}", id);

    let (status, body) = app
        .send(Method::PUT, &uri, Some(&app.admin_token), Some(json!({ "phone": "0812", "alamat": "Bandung" })))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["phone"], "0812");

    let (_, body) = app.send(Method::PUT, &uri, Some(&app.admin_token), Some(json!({ "name": "Putri A" }))).await?;
    assert_eq!(body["data"]["phone"], "0812");
    assert_eq!(body["data"]["address"], "Bandung");

    let (status, body) = app
        .send(Method::PUT, &uri, Some(&app.admin_token), Some(json!({ "phone": null, "address": "  " })))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["phone"].is_null());
    assert!(body["data"]["address"].is_null());
    assert_eq!(body["data"]["name"], "Putri A");
    Ok(())
}

#[tokio::test]
async fn check_reports_whether_a_student_number_is_an_alumnus() -> Result<()> {
    let app = TestApp::spawn().await?;
    let id = app.create_alumnus("K001", "Kurnia", "Informatika", 2018).await?;

    let (status, body) = app.get_as_user("/api/alumni/check?key=development-only-key&nim=K001").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isAlumni"], true);
    assert_eq!(body["data"]["alumni"]["id"], id);
    assert!(body["data"]["alumni"].get("password_hash").is_none());

    let (status, body) = app.get_as_user("/api/alumni/check?key=development-only-key&nim=X999").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isAlumni"], false);
    assert!(body["data"]["alumni"].is_null());
    Ok(())
}

#[tokio::test]
async fn check_requires_key_and_student_number() -> Result<()> {
    let app = TestApp::spawn().await?;

    let (status, body) = app.get_as_user("/api/alumni/check?key=wrong&nim=K001").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    let (status, _) = app.get_as_user("/api/alumni/check?nim=K001").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.get_as_user("/api/alumni/check?key=development-only-key").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field_errors"]["nim"], "This field is required");
    Ok(())
}
