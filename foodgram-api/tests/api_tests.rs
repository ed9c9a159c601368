//! Integration tests for the Foodgram API
//!
//! Each test builds the full router over a fresh in-memory database and
//! drives it with `oneshot` requests.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use foodgram_api::{admin, build_router, AppState};
use foodgram_common::db::{init_memory_database, NewUser};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower::util::ServiceExt; // for `oneshot` method

struct TestApp {
    app: Router,
    db: SqlitePool,
}

async fn setup() -> TestApp {
    let db = init_memory_database()
        .await
        .expect("Should create in-memory database");
    let app = build_router(AppState::new(db.clone()));
    TestApp { app, db }
}

/// Test helper: Create a user and return (id, API token)
async fn create_user(db: &SqlitePool, username: &str) -> (i64, String) {
    let created = admin::create_user(
        db,
        &NewUser {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
        },
    )
    .await
    .expect("Should create user");
    (created.user.id, created.token)
}

async fn create_ingredient(db: &SqlitePool, name: &str, unit: &str) -> i64 {
    sqlx::query("INSERT INTO ingredients (name, measurement_unit) VALUES (?, ?)")
        .bind(name)
        .bind(unit)
        .execute(db)
        .await
        .unwrap()
        .last_insert_rowid()
}

async fn create_tag(db: &SqlitePool, name: &str, slug: &str) -> i64 {
    sqlx::query("INSERT INTO tags (name, color, slug) VALUES (?, '#e26c2d', ?)")
        .bind(name)
        .bind(slug)
        .execute(db)
        .await
        .unwrap()
        .last_insert_rowid()
}

async fn count(db: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(db)
        .await
        .unwrap()
}

fn recipe_body(name: &str, ingredients: &[(i64, i64)], tags: &[i64]) -> Value {
    json!({
        "name": name,
        "text": "Mix everything and bake",
        "image": "data:image/png;base64,iVBORw0KGgo=",
        "cooking_time": 30,
        "ingredients": ingredients
            .iter()
            .map(|(id, amount)| json!({"id": id, "amount": amount}))
            .collect::<Vec<_>>(),
        "tags": tags,
    })
}

/// Test helper: Build a request, optionally authenticated and with a JSON body
fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Token {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Test helper: Send a request and decode the JSON body (Null when empty)
async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Should parse JSON")
    };
    (status, body)
}

async fn post_recipe(t: &TestApp, token: &str, body: Value) -> (StatusCode, Value) {
    send(&t.app, request("POST", "/api/recipes/", Some(token), Some(body))).await
}

// =============================================================================
// Health and authentication
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_auth_required() {
    let t = setup().await;

    let (status, body) = send(&t.app, request("GET", "/health", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "foodgram");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_anonymous_write_is_unauthorized() {
    let t = setup().await;

    let (status, body) = send(
        &t.app,
        request("POST", "/api/recipes/", None, Some(recipe_body("Cake", &[], &[]))),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_unknown_token_is_unauthorized_even_on_public_routes() {
    let t = setup().await;

    let (status, _) = send(&t.app, request("GET", "/api/tags/", Some("deadbeef"), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let malformed = Request::builder()
        .uri("/api/tags/")
        .header(header::AUTHORIZATION, "Bearer something")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&t.app, malformed).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me() {
    let t = setup().await;
    let (id, token) = create_user(&t.db, "ann").await;

    let (status, body) = send(&t.app, request("GET", "/api/users/me/", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);
    assert_eq!(body["username"], "ann");
    assert_eq!(body["is_subscribed"], false);

    let (status, _) = send(&t.app, request("GET", "/api/users/me/", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Reference data
// =============================================================================

#[tokio::test]
async fn test_tags_list_and_get() {
    let t = setup().await;
    let lunch = create_tag(&t.db, "Lunch", "lunch").await;
    create_tag(&t.db, "Dinner", "dinner").await;

    let (status, body) = send(&t.app, request("GET", "/api/tags/", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) =
        send(&t.app, request("GET", &format!("/api/tags/{}/", lunch), None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slug"], "lunch");
    assert_eq!(body["color"], "#e26c2d");

    let (status, body) = send(&t.app, request("GET", "/api/tags/999/", None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_ingredient_prefix_search() {
    let t = setup().await;
    create_ingredient(&t.db, "Sugar", "g").await;
    create_ingredient(&t.db, "salt", "g").await;
    let flour = create_ingredient(&t.db, "Flour", "g").await;

    let (status, body) =
        send(&t.app, request("GET", "/api/ingredients/?name=s", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Sugar", "salt"]);

    let (_, body) = send(&t.app, request("GET", "/api/ingredients/", None, None)).await;
    assert_eq!(body.as_array().unwrap().len(), 3);

    let (status, body) =
        send(&t.app, request("GET", &format!("/api/ingredients/{}/", flour), None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["measurement_unit"], "g");
}

// =============================================================================
// Recipe create / update / delete
// =============================================================================

#[tokio::test]
async fn test_create_recipe() {
    let t = setup().await;
    let (author_id, token) = create_user(&t.db, "chef").await;
    let flour = create_ingredient(&t.db, "Flour", "g").await;
    let sugar = create_ingredient(&t.db, "Sugar", "g").await;
    let tag = create_tag(&t.db, "Baking", "baking").await;

    let (status, body) =
        post_recipe(&t, &token, recipe_body("Cake", &[(flour, 200), (sugar, 50)], &[tag])).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Cake");
    assert_eq!(body["cooking_time"], 30);
    assert_eq!(body["author"]["id"], author_id);
    assert_eq!(body["tags"][0]["slug"], "baking");
    assert_eq!(body["ingredients"][0]["name"], "Flour");
    assert_eq!(body["ingredients"][0]["amount"], 200);
    assert_eq!(body["ingredients"][1]["measurement_unit"], "g");
    assert_eq!(body["is_favorited"], false);
    assert_eq!(body["is_in_shopping_cart"], false);

    let id = body["id"].as_i64().unwrap();
    let (status, fetched) =
        send(&t.app, request("GET", &format!("/api/recipes/{}/", id), None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["ingredients"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_duplicate_ingredient_in_payload_rejected() {
    let t = setup().await;
    let (_, token) = create_user(&t.db, "chef").await;
    let flour = create_ingredient(&t.db, "Flour", "g").await;
    let tag = create_tag(&t.db, "Baking", "baking").await;

    let (status, body) =
        post_recipe(&t, &token, recipe_body("Bread", &[(flour, 100), (flour, 200)], &[tag])).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["fields"]["ingredients"].is_array());
    assert_eq!(count(&t.db, "recipes").await, 0);
}

#[tokio::test]
async fn test_field_validation() {
    let t = setup().await;
    let (_, token) = create_user(&t.db, "chef").await;
    let flour = create_ingredient(&t.db, "Flour", "g").await;
    let tag = create_tag(&t.db, "Baking", "baking").await;

    let mut body = recipe_body("Bread", &[(flour, 0)], &[tag]);
    body["cooking_time"] = json!(0);
    body["image"] = Value::Null;

    let (status, body) = post_recipe(&t, &token, body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields = &body["error"]["fields"];
    assert!(fields["cooking_time"].is_array());
    assert!(fields["ingredients"].is_array());
    assert!(fields["image"].is_array());
    assert!(fields["name"].is_null());
}

#[tokio::test]
async fn test_quantities_are_capped() {
    let t = setup().await;
    let (_, token) = create_user(&t.db, "chef").await;
    let flour = create_ingredient(&t.db, "Flour", "g").await;
    let tag = create_tag(&t.db, "Baking", "baking").await;

    let mut body = recipe_body("Bread", &[(flour, 32768)], &[tag]);
    body["cooking_time"] = json!(32768);
    let (status, body) = post_recipe(&t, &token, body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["fields"]["ingredients"].is_array());
    assert!(body["error"]["fields"]["cooking_time"].is_array());
    assert_eq!(count(&t.db, "recipes").await, 0);

    // Largest accepted amounts still add up exactly in the shopping list
    let (_, a) = post_recipe(&t, &token, recipe_body("Loaf", &[(flour, 32767)], &[tag])).await;
    let (_, b) = post_recipe(&t, &token, recipe_body("Bun", &[(flour, 32767)], &[tag])).await;
    for recipe in [&a, &b] {
        let uri = format!("/api/recipes/{}/shopping_cart/", recipe["id"]);
        let (status, _) = send(&t.app, request("POST", &uri, Some(&token), None)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let response = t
        .app
        .clone()
        .oneshot(request("GET", "/api/recipes/download_shopping_cart/", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(String::from_utf8(bytes.to_vec()).unwrap(), "Flour - 65534 (g)\n");
}

#[tokio::test]
async fn test_malformed_path_and_query_use_error_body() {
    let t = setup().await;
    let (_, token) = create_user(&t.db, "reader").await;

    for uri in [
        "/api/recipes/abc/",
        "/api/users/abc/",
        "/api/tags/abc/",
        "/api/users/?limit=many",
        "/api/users/subscriptions/?recipes_limit=some",
    ] {
        let (status, body) = send(&t.app, request("GET", uri, Some(&token), None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["error"]["code"], "BAD_REQUEST", "{}", uri);
    }
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let t = setup().await;
    let (_, token) = create_user(&t.db, "chef").await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/recipes/")
        .header(header::AUTHORIZATION, format!("Token {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let (status, body) = send(&t.app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_failed_write_leaves_no_recipe() {
    let t = setup().await;
    let (_, token) = create_user(&t.db, "chef").await;
    let flour = create_ingredient(&t.db, "Flour", "g").await;
    let tag = create_tag(&t.db, "Baking", "baking").await;

    let (status, _) =
        post_recipe(&t, &token, recipe_body("Ghost", &[(flour, 1), (9999, 1)], &[tag])).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = post_recipe(&t, &token, recipe_body("Ghost", &[(flour, 1)], &[777])).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(count(&t.db, "recipes").await, 0);
    assert_eq!(count(&t.db, "recipe_ingredients").await, 0);
    assert_eq!(count(&t.db, "recipe_tags").await, 0);
}

#[tokio::test]
async fn test_duplicate_recipe_name_per_author_conflicts() {
    let t = setup().await;
    let (_, chef) = create_user(&t.db, "chef").await;
    let (_, other) = create_user(&t.db, "other").await;
    let flour = create_ingredient(&t.db, "Flour", "g").await;
    let tag = create_tag(&t.db, "Baking", "baking").await;

    let body = recipe_body("Bread", &[(flour, 500)], &[tag]);
    assert_eq!(post_recipe(&t, &chef, body.clone()).await.0, StatusCode::CREATED);

    let (status, conflict) = post_recipe(&t, &chef, body.clone()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(conflict["error"]["code"], "CONFLICT");

    // Another author may reuse the name
    assert_eq!(post_recipe(&t, &other, body).await.0, StatusCode::CREATED);
    assert_eq!(count(&t.db, "recipes").await, 2);
    assert_eq!(count(&t.db, "recipe_ingredients").await, 2);
}

#[tokio::test]
async fn test_update_replaces_ingredients_and_tags() {
    let t = setup().await;
    let (_, token) = create_user(&t.db, "chef").await;
    let flour = create_ingredient(&t.db, "Flour", "g").await;
    let sugar = create_ingredient(&t.db, "Sugar", "g").await;
    let egg = create_ingredient(&t.db, "Egg", "pcs").await;
    let baking = create_tag(&t.db, "Baking", "baking").await;
    let sweet = create_tag(&t.db, "Sweet", "sweet").await;

    let (_, created) =
        post_recipe(&t, &token, recipe_body("Cake", &[(flour, 200), (sugar, 50)], &[baking])).await;
    let id = created["id"].as_i64().unwrap();

    let mut update = recipe_body("Sponge cake", &[(egg, 4)], &[sweet]);
    update.as_object_mut().unwrap().remove("image");
    let (status, body) = send(
        &t.app,
        request("PATCH", &format!("/api/recipes/{}/", id), Some(&token), Some(update)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Sponge cake");
    assert_eq!(body["image"], created["image"]);
    assert_eq!(body["ingredients"].as_array().unwrap().len(), 1);
    assert_eq!(body["ingredients"][0]["name"], "Egg");
    assert_eq!(body["ingredients"][0]["amount"], 4);
    assert_eq!(body["tags"].as_array().unwrap().len(), 1);
    assert_eq!(body["tags"][0]["slug"], "sweet");
    assert_eq!(count(&t.db, "recipe_ingredients").await, 1);
}

#[tokio::test]
async fn test_only_author_may_change_recipe() {
    let t = setup().await;
    let (_, author) = create_user(&t.db, "chef").await;
    let (_, intruder) = create_user(&t.db, "intruder").await;
    let flour = create_ingredient(&t.db, "Flour", "g").await;
    let tag = create_tag(&t.db, "Baking", "baking").await;

    let (_, created) = post_recipe(&t, &author, recipe_body("Bread", &[(flour, 500)], &[tag])).await;
    let uri = format!("/api/recipes/{}/", created["id"]);

    let (status, body) = send(
        &t.app,
        request(
            "PATCH",
            &uri,
            Some(&intruder),
            Some(recipe_body("Stolen", &[(flour, 1)], &[tag])),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let (status, _) = send(&t.app, request("DELETE", &uri, Some(&intruder), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&t.app, request("DELETE", &uri, Some(&author), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&t.app, request("GET", &uri, None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recipe_delete_cascades() {
    let t = setup().await;
    let (_, author) = create_user(&t.db, "chef").await;
    let (_, fan) = create_user(&t.db, "fan").await;
    let flour = create_ingredient(&t.db, "Flour", "g").await;
    let tag = create_tag(&t.db, "Baking", "baking").await;

    let (_, created) = post_recipe(&t, &author, recipe_body("Bread", &[(flour, 500)], &[tag])).await;
    let id = created["id"].as_i64().unwrap();

    for action in ["favorite", "shopping_cart"] {
        let (status, _) = send(
            &t.app,
            request("POST", &format!("/api/recipes/{}/{}/", id, action), Some(&fan), None),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _) = send(
        &t.app,
        request("DELETE", &format!("/api/recipes/{}/", id), Some(&author), None),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    for table in ["recipe_ingredients", "recipe_tags", "favorites", "shopping_cart"] {
        assert_eq!(count(&t.db, table).await, 0, "{} should be empty", table);
    }
    // Reference data survives
    assert_eq!(count(&t.db, "ingredients").await, 1);
    assert_eq!(count(&t.db, "tags").await, 1);
}

// =============================================================================
// Recipe list and filters
// =============================================================================

#[tokio::test]
async fn test_list_filters_and_flags() {
    let t = setup().await;
    let (alice_id, alice) = create_user(&t.db, "alice").await;
    let (_, bob) = create_user(&t.db, "bob").await;
    let rice = create_ingredient(&t.db, "Rice", "g").await;
    let lunch = create_tag(&t.db, "Lunch", "lunch").await;
    let dinner = create_tag(&t.db, "Dinner", "dinner").await;

    let (_, r1) = post_recipe(&t, &alice, recipe_body("Risotto", &[(rice, 100)], &[lunch])).await;
    let (_, r2) = post_recipe(&t, &alice, recipe_body("Pilaf", &[(rice, 150)], &[dinner])).await;
    let (_, r3) =
        post_recipe(&t, &bob, recipe_body("Sushi", &[(rice, 200)], &[lunch, dinner])).await;

    send(
        &t.app,
        request("POST", &format!("/api/recipes/{}/favorite/", r1["id"]), Some(&bob), None),
    )
    .await;

    let ids = |body: &Value| -> Vec<i64> {
        body["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_i64().unwrap())
            .collect()
    };

    let (status, body) = send(&t.app, request("GET", "/api/recipes/", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    assert_eq!(
        ids(&body),
        vec![r3["id"].as_i64().unwrap(), r2["id"].as_i64().unwrap(), r1["id"].as_i64().unwrap()]
    );

    let (_, body) = send(
        &t.app,
        request("GET", &format!("/api/recipes/?author={}", alice_id), None, None),
    )
    .await;
    assert_eq!(body["count"], 2);

    let (_, body) = send(
        &t.app,
        request("GET", "/api/recipes/?tags=lunch&tags=dinner", None, None),
    )
    .await;
    assert_eq!(body["count"], 3);

    let (_, body) = send(&t.app, request("GET", "/api/recipes/?tags=dinner", None, None)).await;
    assert_eq!(body["count"], 2);

    // Flag filters apply to authenticated callers only
    let (_, body) = send(&t.app, request("GET", "/api/recipes/?is_favorited=1", None, None)).await;
    assert_eq!(body["count"], 3);

    let (_, body) = send(
        &t.app,
        request("GET", "/api/recipes/?is_favorited=1", Some(&bob), None),
    )
    .await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["is_favorited"], true);

    let (_, body) = send(&t.app, request("GET", "/api/recipes/?limit=2&page=2", None, None)).await;
    assert_eq!(body["page"], 2);
    assert_eq!(body["page_size"], 2);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(ids(&body), vec![r1["id"].as_i64().unwrap()]);

    let (status, _) = send(&t.app, request("GET", "/api/recipes/?author=x", None, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_page_flags_belong_to_each_recipe() {
    let t = setup().await;
    let (alice_id, alice) = create_user(&t.db, "alice").await;
    let (bob_id, bob) = create_user(&t.db, "bob").await;
    let (_, viewer) = create_user(&t.db, "viewer").await;
    let rice = create_ingredient(&t.db, "Rice", "g").await;
    let fish = create_ingredient(&t.db, "Fish", "g").await;
    let lunch = create_tag(&t.db, "Lunch", "lunch").await;
    let dinner = create_tag(&t.db, "Dinner", "dinner").await;

    let (_, risotto) =
        post_recipe(&t, &alice, recipe_body("Risotto", &[(rice, 100)], &[lunch])).await;
    let (_, pilaf) =
        post_recipe(&t, &alice, recipe_body("Pilaf", &[(rice, 150)], &[dinner])).await;
    post_recipe(
        &t,
        &bob,
        recipe_body("Sushi", &[(fish, 80), (rice, 200)], &[lunch, dinner]),
    )
    .await;

    for uri in [
        format!("/api/recipes/{}/favorite/", risotto["id"]),
        format!("/api/recipes/{}/shopping_cart/", pilaf["id"]),
        format!("/api/users/{}/subscribe/", alice_id),
    ] {
        let (status, _) = send(&t.app, request("POST", &uri, Some(&viewer), None)).await;
        assert_eq!(status, StatusCode::CREATED, "{}", uri);
    }

    let (status, body) = send(&t.app, request("GET", "/api/recipes/", Some(&viewer), None)).await;
    assert_eq!(status, StatusCode::OK);

    let by_name = |name: &str| -> Value {
        body["results"]
            .as_array()
            .unwrap()
            .iter()
            .find(|r| r["name"] == name)
            .cloned()
            .unwrap()
    };

    let risotto = by_name("Risotto");
    assert_eq!(risotto["is_favorited"], true);
    assert_eq!(risotto["is_in_shopping_cart"], false);
    assert_eq!(risotto["author"]["id"], alice_id);
    assert_eq!(risotto["author"]["is_subscribed"], true);
    assert_eq!(risotto["tags"].as_array().unwrap().len(), 1);

    let pilaf = by_name("Pilaf");
    assert_eq!(pilaf["is_favorited"], false);
    assert_eq!(pilaf["is_in_shopping_cart"], true);
    assert_eq!(pilaf["tags"][0]["slug"], "dinner");
    assert_eq!(pilaf["ingredients"][0]["amount"], 150);

    let sushi = by_name("Sushi");
    assert_eq!(sushi["is_favorited"], false);
    assert_eq!(sushi["is_in_shopping_cart"], false);
    assert_eq!(sushi["author"]["id"], bob_id);
    assert_eq!(sushi["author"]["is_subscribed"], false);
    assert_eq!(sushi["tags"].as_array().unwrap().len(), 2);
    let ingredients: Vec<&str> = sushi["ingredients"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(ingredients, vec!["Fish", "Rice"]);
}

// =============================================================================
// Favorites and shopping cart
// =============================================================================

#[tokio::test]
async fn test_favorite_toggle() {
    let t = setup().await;
    let (_, author) = create_user(&t.db, "chef").await;
    let (_, fan) = create_user(&t.db, "fan").await;
    let flour = create_ingredient(&t.db, "Flour", "g").await;
    let tag = create_tag(&t.db, "Baking", "baking").await;
    let (_, recipe) = post_recipe(&t, &author, recipe_body("Bread", &[(flour, 500)], &[tag])).await;
    let uri = format!("/api/recipes/{}/favorite/", recipe["id"]);

    let (status, body) = send(&t.app, request("POST", &uri, Some(&fan), None)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], recipe["id"]);
    assert_eq!(body["name"], "Bread");
    assert_eq!(body["cooking_time"], 30);

    let (status, _) = send(&t.app, request("POST", &uri, Some(&fan), None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(count(&t.db, "favorites").await, 1);

    let (_, fetched) = send(
        &t.app,
        request("GET", &format!("/api/recipes/{}/", recipe["id"]), Some(&fan), None),
    )
    .await;
    assert_eq!(fetched["is_favorited"], true);

    let (status, _) = send(&t.app, request("DELETE", &uri, Some(&fan), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&t.app, request("DELETE", &uri, Some(&fan), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) =
        send(&t.app, request("POST", "/api/recipes/999/favorite/", Some(&fan), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&t.app, request("POST", &uri, None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_download_shopping_cart_aggregates() {
    let t = setup().await;
    let (_, author) = create_user(&t.db, "chef").await;
    let (_, buyer) = create_user(&t.db, "buyer").await;
    let flour = create_ingredient(&t.db, "Flour", "g").await;
    let sugar = create_ingredient(&t.db, "Sugar", "g").await;
    let egg = create_ingredient(&t.db, "Egg", "pcs").await;
    let tag = create_tag(&t.db, "Baking", "baking").await;

    let (_, a) =
        post_recipe(&t, &author, recipe_body("A", &[(flour, 200), (sugar, 50)], &[tag])).await;
    let (_, b) =
        post_recipe(&t, &author, recipe_body("B", &[(flour, 100), (egg, 2)], &[tag])).await;

    for recipe in [&a, &b] {
        let (status, _) = send(
            &t.app,
            request(
                "POST",
                &format!("/api/recipes/{}/shopping_cart/", recipe["id"]),
                Some(&buyer),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let response = t
        .app
        .clone()
        .oneshot(request(
            "GET",
            "/api/recipes/download_shopping_cart/",
            Some(&buyer),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    assert!(response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("shopping_list.txt"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(
        String::from_utf8(bytes.to_vec()).unwrap(),
        "Flour - 300 (g)\nSugar - 50 (g)\nEgg - 2 (pcs)\n"
    );
}

#[tokio::test]
async fn test_empty_cart_downloads_empty_list() {
    let t = setup().await;
    let (_, token) = create_user(&t.db, "buyer").await;

    let response = t
        .app
        .clone()
        .oneshot(request(
            "GET",
            "/api/recipes/download_shopping_cart/",
            Some(&token),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(bytes.is_empty());

    let (status, _) = send(
        &t.app,
        request("GET", "/api/recipes/download_shopping_cart/", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cart_toggle() {
    let t = setup().await;
    let (_, author) = create_user(&t.db, "chef").await;
    let flour = create_ingredient(&t.db, "Flour", "g").await;
    let tag = create_tag(&t.db, "Baking", "baking").await;
    let (_, recipe) = post_recipe(&t, &author, recipe_body("Bread", &[(flour, 500)], &[tag])).await;
    let uri = format!("/api/recipes/{}/shopping_cart/", recipe["id"]);

    assert_eq!(send(&t.app, request("POST", &uri, Some(&author), None)).await.0, StatusCode::CREATED);
    assert_eq!(send(&t.app, request("POST", &uri, Some(&author), None)).await.0, StatusCode::CONFLICT);
    assert_eq!(send(&t.app, request("DELETE", &uri, Some(&author), None)).await.0, StatusCode::NO_CONTENT);
    assert_eq!(send(&t.app, request("DELETE", &uri, Some(&author), None)).await.0, StatusCode::NOT_FOUND);
}

// =============================================================================
// Users and subscriptions
// =============================================================================

#[tokio::test]
async fn test_cannot_subscribe_to_self() {
    let t = setup().await;
    let (id, token) = create_user(&t.db, "narcissus").await;

    let (status, body) = send(
        &t.app,
        request("POST", &format!("/api/users/{}/subscribe/", id), Some(&token), None),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert_eq!(count(&t.db, "subscriptions").await, 0);
}

#[tokio::test]
async fn test_subscription_lifecycle() {
    let t = setup().await;
    let (author_id, author) = create_user(&t.db, "chef").await;
    let (_, reader) = create_user(&t.db, "reader").await;
    let rice = create_ingredient(&t.db, "Rice", "g").await;
    let tag = create_tag(&t.db, "Lunch", "lunch").await;
    for name in ["One", "Two", "Three"] {
        post_recipe(&t, &author, recipe_body(name, &[(rice, 100)], &[tag])).await;
    }
    let uri = format!("/api/users/{}/subscribe/", author_id);

    let (status, body) = send(
        &t.app,
        request("POST", &format!("{}?recipes_limit=2", uri), Some(&reader), None),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], author_id);
    assert_eq!(body["is_subscribed"], true);
    assert_eq!(body["recipes"].as_array().unwrap().len(), 2);
    assert_eq!(body["recipes_count"], 3);

    let (status, _) = send(&t.app, request("POST", &uri, Some(&reader), None)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &t.app,
        request("GET", "/api/users/subscriptions/?recipes_limit=1", Some(&reader), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["username"], "chef");
    assert_eq!(body["results"][0]["recipes"].as_array().unwrap().len(), 1);
    assert_eq!(body["results"][0]["recipes"][0]["name"], "Three");

    let (_, profile) = send(
        &t.app,
        request("GET", &format!("/api/users/{}/", author_id), Some(&reader), None),
    )
    .await;
    assert_eq!(profile["is_subscribed"], true);

    let (_, profile) = send(
        &t.app,
        request("GET", &format!("/api/users/{}/", author_id), None, None),
    )
    .await;
    assert_eq!(profile["is_subscribed"], false);

    let (status, _) = send(&t.app, request("DELETE", &uri, Some(&reader), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&t.app, request("DELETE", &uri, Some(&reader), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) =
        send(&t.app, request("POST", "/api/users/999/subscribe/", Some(&reader), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_list_paginated() {
    let t = setup().await;
    for name in ["a", "b", "c"] {
        create_user(&t.db, name).await;
    }

    let (status, body) =
        send(&t.app, request("GET", "/api/users/?limit=2&page=2", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
    assert_eq!(body["results"][0]["username"], "c");
}

#[tokio::test]
async fn test_deleting_user_cascades() {
    let t = setup().await;
    let (author_id, author) = create_user(&t.db, "chef").await;
    let (reader_id, reader) = create_user(&t.db, "reader").await;
    let rice = create_ingredient(&t.db, "Rice", "g").await;
    let tag = create_tag(&t.db, "Lunch", "lunch").await;

    let (_, recipe) = post_recipe(&t, &author, recipe_body("Bowl", &[(rice, 100)], &[tag])).await;
    for action in ["favorite", "shopping_cart"] {
        send(
            &t.app,
            request("POST", &format!("/api/recipes/{}/{}/", recipe["id"], action), Some(&reader), None),
        )
        .await;
    }
    send(
        &t.app,
        request("POST", &format!("/api/users/{}/subscribe/", author_id), Some(&reader), None),
    )
    .await;
    send(
        &t.app,
        request("POST", &format!("/api/users/{}/subscribe/", reader_id), Some(&author), None),
    )
    .await;
    assert_eq!(count(&t.db, "subscriptions").await, 2);

    assert!(admin::delete_user(&t.db, "chef").await.unwrap());

    for table in [
        "recipes",
        "recipe_ingredients",
        "recipe_tags",
        "favorites",
        "shopping_cart",
        "subscriptions",
    ] {
        assert_eq!(count(&t.db, table).await, 0, "{} should be empty", table);
    }

    // The deleted user's token no longer authenticates
    let (status, _) = send(&t.app, request("GET", "/api/users/me/", Some(&author), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&t.app, request("GET", "/api/users/me/", Some(&reader), None)).await;
    assert_eq!(status, StatusCode::OK);
}
