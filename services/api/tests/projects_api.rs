//! Router tests for project search, visibility and the membership workflow

mod support;

use axum::http::{Method, StatusCode};
use serde_json::json;
use support::TestApp;

fn project_body(title: &str, roles: &[&str]) -> serde_json::Value {
    json!({
        "title": title,
        "description": "A weekend project that needs a few more hands",
        "technologies": { "frontend": ["React"], "backend": ["Node.js"] },
        "rolesNeeded": roles,
    })
}

#[tokio::test]
async fn health_check_returns_ok() {
    let app = TestApp::new();
    let (status, json) = app.get("/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn creating_a_project_requires_login() {
    let app = TestApp::new();
    let (status, json) = app
        .send(
            Method::POST,
            "/projects",
            None,
            Some(project_body("Map Club", &["Mentor"])),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "You must be logged in to perform this action.");

    let (status, _) = app
        .send(
            Method::POST,
            "/projects",
            Some("garbage"),
            Some(project_body("Map Club", &["Mentor"])),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = TestApp::new();
    let (_, token) = app.user("Owner").await;

    let (status, json) = app
        .send(
            Method::POST,
            "/projects",
            Some(&token),
            Some(json!({ "title": "Map Club", "rolesNeeded": ["Astronaut"] })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn anonymous_callers_do_not_see_membership() {
    let app = TestApp::new();
    let (owner, owner_token) = app.user("Owner").await;
    let (_, other_token) = app.user("Other").await;
    let id = app
        .create_project(&owner_token, project_body("Map Club", &["Mentor"]))
        .await;
    let uri = format!("/projects/{}", id);

    let (status, anonymous) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let project = &anonymous["project"];
    assert!(project.get("createdBy").is_none());
    assert!(project.get("participants").is_none());
    assert!(project.get("applicants").is_none());
    assert_eq!(project["title"], "Map Club");

    let (_, signed_in) = app.get(&uri, Some(&other_token)).await;
    assert_eq!(signed_in["project"]["createdBy"], owner.id.to_string());
    assert!(signed_in["project"]["participants"].is_array());
    assert!(signed_in["project"].get("applicants").is_none());

    let (_, creator) = app.get(&uri, Some(&owner_token)).await;
    assert!(creator["project"]["applicants"].is_array());

    let (_, listing) = app.get("/projects", None).await;
    assert!(listing["items"][0].get("createdBy").is_none());
    assert_eq!(listing["items"][0]["missingWords"], json!([]));
}

#[tokio::test]
async fn unknown_project_returns_not_found() {
    let app = TestApp::new();
    let (status, json) = app
        .get(&format!("/projects/{}", uuid::Uuid::new_v4()), None)
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "The project does not exist");
}

#[tokio::test]
async fn search_ranks_and_reports_missing_words() {
    let app = TestApp::new();
    let (_, token) = app.user("Owner").await;
    app.create_project(&token, project_body("Map Club", &["Mentor"]))
        .await;
    app.create_project(
        &token,
        json!({
            "title": "Quiz Night",
            "description": "Weekly trivia with a leaderboard and buzzers",
            "rolesNeeded": ["Team Lead"],
        }),
    )
    .await;

    let (status, page) = app.get("/projects?search=trivia,rocket&limit=5", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["count"], 1);
    assert_eq!(page["totalPages"], 1);
    assert_eq!(page["limit"], 5);
    assert_eq!(page["items"][0]["title"], "Quiz Night");
    assert_eq!(page["items"][0]["missingWords"], json!(["rocket"]));

    let (_, suggestions) = app.get("/projects/suggestions?q=lead", None).await;
    assert_eq!(suggestions, json!(["lead", "leaderboard"]));
}

#[tokio::test]
async fn apply_then_approve_moves_the_user() {
    let app = TestApp::new();
    let (owner, owner_token) = app.user("Owner").await;
    let (dev, dev_token) = app.user("Dev").await;
    let id = app
        .create_project(&owner_token, project_body("Map Club", &["Backend Developer"]))
        .await;

    let (status, applied) = app
        .send(
            Method::POST,
            &format!("/projects/{}/apply", id),
            Some(&dev_token),
            Some(json!({ "role": "Backend Developer" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(applied["message"], "Application submitted");
    let application_id = applied["applicationId"].as_str().unwrap().to_string();

    let approve_uri = format!("/projects/{}/approve/{}", id, application_id);
    let (status, _) = app
        .send(Method::POST, &approve_uri, Some(&dev_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, approved) = app
        .send(Method::POST, &approve_uri, Some(&owner_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        approved["project"]["participants"],
        json!([{ "userId": dev.id, "role": "Backend Developer" }])
    );
    assert_eq!(approved["project"]["applicants"], json!([]));

    let (_, profile) = app.get("/profiles/myProfile", Some(&dev_token)).await;
    let profile = &profile["profile"];
    assert_eq!(profile["appliedProjects"], json!([]));
    assert_eq!(
        profile["participatingProjects"],
        json!([{ "projectId": id, "role": "Backend Developer" }])
    );

    let (_, owner_profile) = app.get("/profiles/myProfile", Some(&owner_token)).await;
    assert_eq!(owner_profile["profile"]["ownProjects"][0]["id"], id);
    assert_eq!(owner_profile["profile"]["id"], owner.id.to_string());
}

#[tokio::test]
async fn filled_role_is_already_taken() {
    let app = TestApp::new();
    let (_, owner_token) = app.user("Owner").await;
    let (_, first_token) = app.user("First").await;
    let (_, second_token) = app.user("Second").await;
    let id = app
        .create_project(&owner_token, project_body("Map Club", &["Mentor"]))
        .await;
    let apply_uri = format!("/projects/{}/apply", id);

    let (_, applied) = app
        .send(
            Method::POST,
            &apply_uri,
            Some(&first_token),
            Some(json!({ "role": "Mentor" })),
        )
        .await;
    let application_id = applied["applicationId"].as_str().unwrap();
    let (status, _) = app
        .send(
            Method::POST,
            &format!("/projects/{}/approve/{}", id, application_id),
            Some(&owner_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = app
        .send(
            Method::POST,
            &apply_uri,
            Some(&second_token),
            Some(json!({ "role": "Mentor" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "This role is already taken.");
}

#[tokio::test]
async fn like_toggle_and_delete_cascade() {
    let app = TestApp::new();
    let (_, owner_token) = app.user("Owner").await;
    let (_, fan_token) = app.user("Fan").await;
    let id = app
        .create_project(&owner_token, project_body("Map Club", &["Mentor"]))
        .await;
    let like_uri = format!("/projects/{}/like", id);

    let (status, liked) = app
        .send(Method::PATCH, &like_uri, Some(&fan_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(liked, json!({ "liked": true, "totalLikes": 1 }));

    let (_, profile) = app.get("/profiles/myProfile", Some(&fan_token)).await;
    assert_eq!(profile["profile"]["watchList"][0]["id"], id);

    let (status, _) = app
        .send(Method::DELETE, &format!("/projects/{}", id), Some(&fan_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, deleted) = app
        .send(Method::DELETE, &format!("/projects/{}", id), Some(&owner_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["message"], "Project successfully deleted");

    let (_, profile) = app.get("/profiles/myProfile", Some(&fan_token)).await;
    assert_eq!(profile["profile"]["watchList"], json!([]));
    let (_, profile) = app.get("/profiles/myProfile", Some(&owner_token)).await;
    assert_eq!(profile["profile"]["ownProjects"], json!([]));
}

#[tokio::test]
async fn editing_protected_fields_is_rejected() {
    let app = TestApp::new();
    let (_, owner_token) = app.user("Owner").await;
    let id = app
        .create_project(&owner_token, project_body("Map Club", &["Mentor"]))
        .await;
    let uri = format!("/projects/{}", id);

    let (status, json) = app
        .send(
            Method::PATCH,
            &uri,
            Some(&owner_token),
            Some(json!({ "likeCount": 500 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "The field 'likeCount' cannot be updated");

    let (status, json) = app
        .send(
            Method::PATCH,
            &uri,
            Some(&owner_token),
            Some(json!({ "title": "Map & Compass Club" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["project"]["title"], "Map & Compass Club");
    assert_eq!(json["project"]["technologies"]["frontend"], json!(["React"]));
}

#[tokio::test]
async fn malformed_path_and_query_values_are_json_errors() {
    let app = TestApp::new();

    let (status, json) = app.get("/projects/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());

    let (status, json) = app.get("/projects?page=abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}
