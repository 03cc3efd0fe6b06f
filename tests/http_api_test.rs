use axum::body::{self, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use shoplist::config::Config;
use shoplist::db;
use shoplist::routes;
use shoplist::state::AppState;

fn app() -> (Router, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let pool = db::create_pool(&temp_dir.path().join("test.db")).unwrap();
    db::run_migrations(&pool).unwrap();

    let mut config = Config::default();
    config.auth.bcrypt_cost = 4;
    (routes::app(AppState::new(pool, config)), temp_dir)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Value,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn register(app: &Router, username: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/auth/register",
        None,
        json!({ "username": username, "password": "correct horse" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["data"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_two_users_share_a_list_over_http() {
    let (app, _tmp) = app();
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;

    // Alice creates a list and invites Bob
    let (_, body) = send(
        &app,
        Method::POST,
        "/lists",
        Some(&alice),
        json!({ "name": "Groceries" }),
    )
    .await;
    let list_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        "/invitations",
        Some(&alice),
        json!({ "list_id": list_id, "username": "bob" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let invitation = body["data"]["token"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        Method::POST,
        "/invitations/accept",
        Some(&bob),
        json!({ "token": invitation }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Both add entries; Bob reorders them
    for (token, text) in [(&alice, "Milk"), (&bob, "Eggs"), (&alice, "Butter")] {
        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/lists/{list_id}/entries"),
            Some(token),
            json!({ "text": text, "category": "Dairy" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/lists/{list_id}/entries/move"),
        Some(&bob),
        json!({ "category": "Dairy", "old_index": 2, "new_index": 0 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], true);

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/lists/{list_id}"),
        Some(&alice),
        Value::Null,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let order: Vec<(&str, i64)> = body["data"]["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| {
            (
                e["text"].as_str().unwrap(),
                e["order_index"].as_i64().unwrap(),
            )
        })
        .collect();
    assert_eq!(order, [("Butter", 0), ("Milk", 1), ("Eggs", 2)]);

    let (_, body) = send(
        &app,
        Method::GET,
        &format!("/lists/{list_id}/members"),
        Some(&bob),
        Value::Null,
    )
    .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_errors_use_the_tagged_envelope() {
    let (app, _tmp) = app();
    let alice = register(&app, "alice").await;

    let (status, body) = send(&app, Method::GET, "/lists", Some("bogus"), Value::Null).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "status": "error", "message": "Unauthorized" }));

    let (status, body) = send(&app, Method::GET, "/entries/42", Some(&alice), Value::Null).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "status": "error", "message": "Not found" }));
}

async fn add_entry(
    app: &Router,
    token: &str,
    list_id: i64,
    text: &str,
    category: &str,
) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        &format!("/lists/{list_id}/entries"),
        Some(token),
        json!({ "text": text, "category": category }),
    )
    .await
}

fn partition(entries: &Value, category: &str) -> Vec<(String, i64)> {
    entries
        .as_array()
        .unwrap()
        .iter()
        .filter(|e| e["category"] == category)
        .map(|e| {
            (
                e["text"].as_str().unwrap().to_string(),
                e["order_index"].as_i64().unwrap(),
            )
        })
        .collect()
}

#[tokio::test]
async fn test_groceries_scenario() {
    let (app, _tmp) = app();
    let a = register(&app, "a").await;
    let b = register(&app, "b").await;

    // A creates "Groceries" with milk and eggs in dairy, bread in bakery
    let (_, body) = send(
        &app,
        Method::POST,
        "/lists",
        Some(&a),
        json!({ "name": "Groceries" }),
    )
    .await;
    let list_id = body["data"]["id"].as_i64().unwrap();

    let (_, milk) = add_entry(&app, &a, list_id, "milk", "dairy").await;
    let (_, eggs) = add_entry(&app, &a, list_id, "eggs", "dairy").await;
    let (_, bread) = add_entry(&app, &a, list_id, "bread", "bakery").await;
    assert_eq!(milk["data"]["order_index"], 0);
    assert_eq!(eggs["data"]["order_index"], 1);
    assert_eq!(bread["data"]["order_index"], 0);

    // Move(dairy, 0, 1) swaps milk and eggs and leaves bakery alone
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/lists/{list_id}/entries/move"),
        Some(&a),
        json!({ "category": "dairy", "old_index": 0, "new_index": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], true);

    let (_, body) = send(
        &app,
        Method::GET,
        &format!("/lists/{list_id}/entries"),
        Some(&a),
        Value::Null,
    )
    .await;
    assert_eq!(
        partition(&body["data"], "dairy"),
        [("eggs".to_string(), 0), ("milk".to_string(), 1)]
    );
    assert_eq!(
        partition(&body["data"], "bakery"),
        [("bread".to_string(), 0)]
    );

    // B is not a member yet
    let (status, body) = add_entry(&app, &b, list_id, "butter", "dairy").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status"], "error");

    // A invites B, B accepts
    let (_, body) = send(
        &app,
        Method::POST,
        "/invitations",
        Some(&a),
        json!({ "list_id": list_id, "username": "b" }),
    )
    .await;
    let invitation = body["data"]["token"].as_str().unwrap().to_string();
    let (status, _) = send(
        &app,
        Method::POST,
        "/invitations/accept",
        Some(&b),
        json!({ "token": invitation }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Now B's Add succeeds and lands at the end of dairy
    let (status, body) = add_entry(&app, &b, list_id, "butter", "dairy").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["order_index"], 2);
}
