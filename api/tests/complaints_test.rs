mod helpers;

use axum::http::StatusCode;
use db::models::user::RoleType;
use helpers::app::{TestApp, make_test_app};
use helpers::request::{body_json, json_request};
use serde_json::{Value, json};
use serial_test::serial;
use tower::ServiceExt;

async fn call(app: &TestApp, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let response = app
        .router
        .clone()
        .oneshot(json_request(method, uri, token, body))
        .await
        .unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

async fn file(app: &TestApp, token: &str, body: Value) -> Value {
    let (status, json) = call(app, "POST", "/complaints", Some(token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json["data"].clone()
}

#[tokio::test]
#[serial]
async fn student_files_and_reads_complaint() {
    let app = make_test_app().await;
    let (_, token) = app.user("alice@uni.test", RoleType::Student).await;

    let created = file(
        &app,
        &token,
        json!({
            "title": "Projector broken",
            "description": "Room 2-27",
            "complaintTypeId": app.general_type,
        }),
    )
    .await;
    assert_eq!(created["status"], "pending");
    let code = created["unique_code"].as_str().unwrap();
    assert_eq!(code.len(), 10);

    let (status, by_code) = call(&app, "GET", &format!("/complaints/code/{code}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_code["data"]["id"], created["id"]);
}

#[tokio::test]
#[serial]
async fn course_bound_type_needs_course() {
    let app = make_test_app().await;
    let (_, token) = app.user("alice@uni.test", RoleType::Student).await;

    let (status, json) = call(
        &app,
        "POST",
        "/complaints",
        Some(&token),
        Some(json!({
            "title": "Marks missing",
            "description": "Test 2",
            "complaintTypeId": app.course_type,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);

    let created = file(
        &app,
        &token,
        json!({
            "title": "Marks missing",
            "description": "Test 2",
            "complaintTypeId": app.course_type,
            "courseId": app.course,
        }),
    )
    .await;
    assert_eq!(created["course"]["code"], "COS212");
}

#[tokio::test]
#[serial]
async fn staff_cannot_file_and_anonymous_cannot_read() {
    let app = make_test_app().await;
    let (_, staff) = app.user("carol@uni.test", RoleType::Personnel).await;

    let body = json!({ "title": "x", "description": "y", "complaintTypeId": app.general_type });
    let (status, _) = call(&app, "POST", "/complaints", Some(&staff), Some(body.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&app, "POST", "/complaints", None, Some(body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[serial]
async fn other_students_complaint_is_forbidden() {
    let app = make_test_app().await;
    let (_, alice) = app.user("alice@uni.test", RoleType::Student).await;
    let (bob_user, bob) = app.user("bob@uni.test", RoleType::Student).await;

    let created = file(
        &app,
        &alice,
        json!({ "title": "Wifi", "description": "Down", "complaintTypeId": app.general_type }),
    )
    .await;
    let id = created["id"].as_i64().unwrap();

    let (status, _) = call(&app, "GET", &format!("/complaints/{id}"), Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = call(&app, "GET", &format!("/complaints/student/{}", bob_user.id), Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["total"], 0);
}

#[tokio::test]
#[serial]
async fn public_view_masks_anonymous_students() {
    let app = make_test_app().await;
    let (_, alice) = app.user("alice@uni.test", RoleType::Student).await;

    let public_anon = file(
        &app,
        &alice,
        json!({
            "title": "Broken lift",
            "description": "Building 4",
            "complaintTypeId": app.general_type,
            "isPublic": true,
            "isAnonymous": true,
        }),
    )
    .await;
    let private = file(
        &app,
        &alice,
        json!({ "title": "Private", "description": "Mine", "complaintTypeId": app.general_type }),
    )
    .await;

    let (status, list) = call(&app, "GET", "/complaints/public", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["data"]["total"], 1);
    assert_eq!(list["data"]["limit"], 3);
    assert_eq!(list["data"]["data"][0]["student"], Value::Null);

    let code = public_anon["unique_code"].as_str().unwrap();
    let (status, one) = call(&app, "GET", &format!("/complaints/public/{code}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(one["data"]["id"], public_anon["id"]);

    let (status, _) = call(&app, "GET", &format!("/complaints/public/{}", private["id"]), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[serial]
async fn catalog_is_public() {
    let app = make_test_app().await;
    let (status, types) = call(&app, "GET", "/complaints/types", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(types["data"].as_array().unwrap().len(), 2);

    let (status, courses) = call(&app, "GET", "/complaints/courses", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(courses["data"][0]["code"], "COS212");
}

#[tokio::test]
#[serial]
async fn respond_reply_complete_flow() {
    let app = make_test_app().await;
    let (_, alice) = app.user("alice@uni.test", RoleType::Student).await;
    let (_, staff) = app.user("carol@uni.test", RoleType::Personnel).await;

    let created = file(
        &app,
        &alice,
        json!({ "title": "Heater", "description": "Cold", "complaintTypeId": app.general_type }),
    )
    .await;
    let id = created["id"].as_i64().unwrap();

    let (_, pending) = call(&app, "GET", "/complaints/personnel/pending", Some(&staff), None).await;
    assert_eq!(pending["data"]["total"], 1);

    let (status, _) = call(&app, "GET", "/complaints/personnel/pending", Some(&alice), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, answered) = call(
        &app,
        "POST",
        &format!("/complaints/{id}/respond"),
        Some(&staff),
        Some(json!({ "response": "Technician booked" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(answered["data"]["status"], "answered");
    assert_eq!(answered["data"]["handled_by"]["role"], "personnel");

    let (status, _) = call(
        &app,
        "POST",
        &format!("/complaints/{id}/respond"),
        Some(&staff),
        Some(json!({ "response": "Again" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, mine) = call(&app, "GET", "/complaints/personnel/my-complaints", Some(&staff), None).await;
    assert_eq!(mine["data"]["total"], 1);

    let (status, replied) = call(
        &app,
        "POST",
        &format!("/complaints/{id}/student-response"),
        Some(&alice),
        Some(json!({ "response": "Still cold" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(replied["data"]["responses"][0]["student_response"], "Still cold");

    let (_, pending) = call(&app, "GET", "/complaints/personnel/pending", Some(&staff), None).await;
    assert_eq!(pending["data"]["total"], 1);

    let (status, done) = call(&app, "POST", &format!("/complaints/{id}/complete"), Some(&staff), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["data"]["status"], "completed");
    assert!(done["data"]["resolved_at"].is_string());

    let (_, completed) = call(&app, "GET", "/complaints/personnel/completed", Some(&staff), None).await;
    assert_eq!(completed["data"]["total"], 1);

    let (status, _) = call(&app, "POST", &format!("/complaints/{id}/complete"), Some(&staff), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[serial]
async fn reject_requires_reason_and_closes_edits() {
    let app = make_test_app().await;
    let (_, alice) = app.user("alice@uni.test", RoleType::Student).await;
    let (_, admin) = app.user("dave@uni.test", RoleType::Admin).await;

    let created = file(
        &app,
        &alice,
        json!({ "title": "Dup", "description": "Dup", "complaintTypeId": app.general_type }),
    )
    .await;
    let id = created["id"].as_i64().unwrap();

    let (status, _) = call(
        &app,
        "POST",
        &format!("/complaints/{id}/reject"),
        Some(&admin),
        Some(json!({ "reason": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, rejected) = call(
        &app,
        "POST",
        &format!("/complaints/{id}/reject"),
        Some(&admin),
        Some(json!({ "reason": "Duplicate" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rejected["data"]["status"], "rejected");

    let (status, _) = call(
        &app,
        "PUT",
        &format!("/complaints/{id}"),
        Some(&alice),
        Some(json!({ "title": "Edited" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[serial]
async fn owner_edits_and_deletes_pending_complaint() {
    let app = make_test_app().await;
    let (_, alice) = app.user("alice@uni.test", RoleType::Student).await;

    let created = file(
        &app,
        &alice,
        json!({ "title": "Noise", "description": "Library", "complaintTypeId": app.general_type }),
    )
    .await;
    let id = created["id"].as_i64().unwrap();

    let (status, updated) = call(
        &app,
        "PUT",
        &format!("/complaints/{id}"),
        Some(&alice),
        Some(json!({ "title": "Noise in library", "isPublic": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["title"], "Noise in library");
    assert_eq!(updated["data"]["is_public"], true);

    let (status, _) = call(&app, "DELETE", &format!("/complaints/{id}"), Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(&app, "GET", &format!("/complaints/{id}"), Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[serial]
async fn student_listing_paginates_and_filters() {
    let app = make_test_app().await;
    let (alice_user, alice) = app.user("alice@uni.test", RoleType::Student).await;

    for title in ["Alpha", "Beta", "Gamma"] {
        file(
            &app,
            &alice,
            json!({ "title": title, "description": "d", "complaintTypeId": app.general_type }),
        )
        .await;
    }

    let uri = format!(
        "/complaints/student/{}?page=1&limit=2&sortBy=title&sortOrder=ASC",
        alice_user.id
    );
    let (status, page) = call(&app, "GET", &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["data"]["total"], 3);
    assert_eq!(page["data"]["total_pages"], 2);
    assert_eq!(page["data"]["data"][0]["title"], "Alpha");

    let uri = format!("/complaints/student/{}?search=gam", alice_user.id);
    let (_, found) = call(&app, "GET", &uri, Some(&alice), None).await;
    assert_eq!(found["data"]["total"], 1);

    let uri = format!("/complaints/student/{}?status=bogus", alice_user.id);
    let (status, _) = call(&app, "GET", &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[serial]
async fn admin_lists_all_complaints() {
    let app = make_test_app().await;
    let (_, alice) = app.user("alice@uni.test", RoleType::Student).await;
    let (_, staff) = app.user("carol@uni.test", RoleType::Personnel).await;
    let (_, admin) = app.user("dave@uni.test", RoleType::Admin).await;

    for title in ["Open", "Closed"] {
        file(
            &app,
            &alice,
            json!({ "title": title, "description": "d", "complaintTypeId": app.general_type }),
        )
        .await;
    }

    let (status, page) = call(&app, "GET", "/complaints/all", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["data"]["total"], 2);

    for token in [&staff, &alice] {
        let (status, _) = call(&app, "GET", "/complaints/all", Some(token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
    let (status, _) = call(&app, "GET", "/complaints/all", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[serial]
async fn oversized_page_returns_empty_listing() {
    let app = make_test_app().await;
    let (_, alice) = app.user("alice@uni.test", RoleType::Student).await;
    let (_, staff) = app.user("carol@uni.test", RoleType::Personnel).await;
    file(
        &app,
        &alice,
        json!({
            "title": "Visible",
            "description": "d",
            "complaintTypeId": app.general_type,
            "isPublic": true,
        }),
    )
    .await;

    let query = "?page=18446744073709551615&limit=100";
    let (status, public) = call(&app, "GET", &format!("/complaints/public{query}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(public["data"]["total"], 1);
    assert_eq!(public["data"]["data"].as_array().unwrap().len(), 0);

    let uri = format!("/complaints/personnel/pending{query}");
    let (status, pending) = call(&app, "GET", &uri, Some(&staff), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending["data"]["total"], 1);
    assert_eq!(pending["data"]["data"].as_array().unwrap().len(), 0);
}
