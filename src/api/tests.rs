use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt as _;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt as _;

use super::auth::TokenIssuer;
use super::{app, AppState};
use crate::database;
use crate::database::models::{CategoryId, RecipeId};
use crate::database::queries;

fn test_app() -> (Router, database::Pool) {
    let pool = database::test_pool();
    let state = Arc::new(AppState::new(
        pool.clone(),
        TokenIssuer::new("test-secret", 60, 7),
    ));
    (app(state), pool)
}

// The pool holds a single connection, so seeding must give it back before a
// request runs.
fn seed_category(pool: &database::Pool, name: &str, slug: &str) -> CategoryId {
    let mut conn = pool.get().unwrap();
    queries::fixture_category(&mut conn, name, slug).id
}

fn feature_recipe(pool: &database::Pool, recipe: RecipeId) {
    use crate::database::schema::recipes::dsl::*;
    use diesel::ExpressionMethods as _;
    use diesel::QueryDsl as _;
    use diesel::RunQueryDsl as _;

    let mut conn = pool.get().unwrap();
    diesel::update(recipes.filter(id.eq(recipe)))
        .set(featured.eq(true))
        .execute(&mut *conn)
        .unwrap();
}

fn get(path: &str) -> Request<Body> {
    Request::builder().uri(path).body(Body::empty()).unwrap()
}

fn bare_request(method: Method, path: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn json_request(method: Method, path: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn register(app: &Router, username: &str) -> String {
    let (status, body) = send(
        app,
        json_request(
            Method::POST,
            "/auth/register/",
            None,
            &json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": "hunter2hunter2",
                "password2": "hunter2hunter2",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["token"].as_str().unwrap().to_string()
}

async fn create_recipe(
    app: &Router,
    token: &str,
    title: &str,
    category: CategoryId,
    cooking_time: i32,
) -> RecipeId {
    let (status, body) = send(
        app,
        json_request(
            Method::POST,
            "/recipes/",
            Some(token),
            &json!({
                "title": title,
                "description": "A test recipe",
                "ingredients": [{"name": "flour", "amount": "200g"}],
                "steps": ["mix", "bake"],
                "cooking_time": cooking_time,
                "category_id": category,
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    RecipeId(body["id"].as_i64().unwrap() as i32)
}

#[tokio::test]
async fn empty_listing_has_one_empty_page() {
    let (app, _pool) = test_app();

    let (status, body) = send(&app, get("/recipes/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
    assert_eq!(body["total_pages"], 1);
    assert_eq!(body["results"], json!([]));
    assert_eq!(body["next"], Value::Null);
    assert_eq!(body["previous"], Value::Null);
}

#[tokio::test]
async fn categories_are_sorted_and_counted() {
    let (app, pool) = test_app();
    seed_category(&pool, "Soups", "soups");
    let desserts = seed_category(&pool, "Desserts", "desserts");
    let token = register(&app, "cook").await;
    create_recipe(&app, &token, "Chocolate Cake", desserts, 30).await;

    let (status, body) = send(&app, get("/categories/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "Desserts");
    assert_eq!(body[0]["recipes_count"], 1);
    assert_eq!(body[1]["name"], "Soups");
    assert_eq!(body[1]["recipes_count"], 0);

    let (status, body) = send(&app, get("/categories/desserts/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slug"], "desserts");
    assert_eq!(body["image_url"], Value::Null);

    let (status, _) = send(&app, get("/categories/breakfast/")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn registration_validates_and_issues_a_token() {
    let (app, _pool) = test_app();

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/auth/register/",
            None,
            &json!({
                "username": "cook",
                "email": "cook@example.com",
                "password": "short",
                "password2": "short",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["fields"]["password"],
        "password must be at least 8 characters"
    );

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/auth/register/",
            None,
            &json!({
                "username": "cook",
                "email": "cook@example.com",
                "password": "hunter2hunter2",
                "password2": "something else",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"]["password"], "password fields didn't match");

    let token = register(&app, "cook").await;
    assert!(!token.is_empty());

    // The email is taken now.
    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/auth/register/",
            None,
            &json!({
                "username": "other",
                "email": "cook@example.com",
                "password": "hunter2hunter2",
                "password2": "hunter2hunter2",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["fields"]["email"],
        "a user with this email already exists"
    );

    // And so is the username.
    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/auth/register/",
            None,
            &json!({
                "username": "cook",
                "email": "second@example.com",
                "password": "hunter2hunter2",
                "password2": "hunter2hunter2",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["fields"]["username"],
        "a user with this username already exists"
    );
}

#[tokio::test]
async fn login_round_trip() {
    let (app, _pool) = test_app();
    register(&app, "cook").await;

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/auth/login/",
            None,
            &json!({ "email": "cook@example.com", "password": "hunter2hunter2" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "cook");
    let access = body["access"].as_str().unwrap().to_string();
    assert!(body["refresh"].as_str().is_some());

    let (status, body) = send(&app, bare_request(Method::GET, "/auth/user/", Some(&access))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "cook");
    assert_eq!(body["recipes_count"], 0);
    assert_eq!(body["bio"], "");

    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/auth/login/",
            None,
            &json!({ "email": "cook@example.com", "password": "wrong password" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, get("/auth/user/")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_tokens_exchange_for_access_only() {
    let (app, _pool) = test_app();
    register(&app, "cook").await;

    let (_, body) = send(
        &app,
        json_request(
            Method::POST,
            "/auth/login/",
            None,
            &json!({ "email": "cook@example.com", "password": "hunter2hunter2" }),
        ),
    )
    .await;
    let access = body["access"].as_str().unwrap().to_string();
    let refresh = body["refresh"].as_str().unwrap().to_string();

    // A refresh token is not an access token.
    let (status, _) = send(&app, bare_request(Method::GET, "/auth/user/", Some(&refresh))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // And an access token is not a refresh token.
    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/auth/token/refresh/",
            None,
            &json!({ "refresh": access }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/auth/token/refresh/",
            None,
            &json!({ "refresh": refresh }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let fresh = body["access"].as_str().unwrap().to_string();

    let (status, _) = send(&app, bare_request(Method::GET, "/auth/user/", Some(&fresh))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn recipe_creation_requires_authentication() {
    let (app, pool) = test_app();
    let desserts = seed_category(&pool, "Desserts", "desserts");

    let (status, _) = send(
        &app,
        json_request(Method::POST, "/recipes/", None, &json!({ "title": "Cake" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = register(&app, "cook").await;
    let (status, body) = send(
        &app,
        json_request(Method::POST, "/recipes/", Some(&token), &json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"]["title"], "this field is required");
    assert_eq!(body["fields"]["cooking_time"], "this field is required");

    let recipe = create_recipe(&app, &token, "Chocolate Cake", desserts, 30).await;
    let (status, body) = send(&app, get(&format!("/recipes/{recipe}/"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Chocolate Cake");
    assert_eq!(body["author"]["username"], "cook");
    assert_eq!(body["category"]["slug"], "desserts");
    assert_eq!(body["featured"], false);
    assert_eq!(body["servings"], 1);
    assert_eq!(body["rating"], 0.0);
    assert_eq!(body["reviews_count"], 0);
    assert_eq!(body["user_rating"], Value::Null);
    assert_eq!(body["comments"], json!([]));
    assert_eq!(body["ingredients"][0]["name"], "flour");
    assert_eq!(body["image_url"], Value::Null);

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/recipes/",
            Some(&token),
            &json!({
                "title": "Mystery",
                "description": "No such category",
                "ingredients": [],
                "steps": [],
                "cooking_time": 10,
                "category_id": 999,
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"]["category_id"], "unknown category");
}

#[tokio::test]
async fn only_the_author_may_mutate() {
    let (app, pool) = test_app();
    let desserts = seed_category(&pool, "Desserts", "desserts");
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;
    let recipe = create_recipe(&app, &alice, "Chocolate Cake", desserts, 30).await;

    let path = format!("/recipes/{recipe}/");
    let (status, _) = send(
        &app,
        json_request(Method::PATCH, &path, Some(&bob), &json!({ "title": "Mine" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, bare_request(Method::DELETE, &path, Some(&bob))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        json_request(
            Method::PATCH,
            &path,
            Some(&alice),
            &json!({ "title": "Better Chocolate Cake" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Better Chocolate Cake");
    assert_eq!(body["description"], "A test recipe");

    let (status, _) = send(&app, bare_request(Method::DELETE, &path, Some(&alice))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, get(&path)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ratings_validate_and_upsert() {
    let (app, pool) = test_app();
    let desserts = seed_category(&pool, "Desserts", "desserts");
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;
    let recipe = create_recipe(&app, &alice, "Chocolate Cake", desserts, 30).await;
    let rate_path = format!("/recipes/{recipe}/rate/");

    let (status, _) = send(
        &app,
        json_request(Method::POST, &rate_path, Some(&bob), &json!({ "value": 7 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        json_request(Method::POST, &rate_path, Some(&bob), &json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        json_request(Method::POST, &rate_path, Some(&bob), &json!({ "value": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "rating set");

    let detail = format!("/recipes/{recipe}/");
    let (_, body) = send(&app, bare_request(Method::GET, &detail, Some(&bob))).await;
    assert_eq!(body["rating"], 4.0);
    assert_eq!(body["reviews_count"], 1);
    assert_eq!(body["user_rating"], 4);

    // A second submission replaces the first, it does not add a row.
    let (status, _) = send(
        &app,
        json_request(Method::POST, &rate_path, Some(&bob), &json!({ "value": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, bare_request(Method::GET, &detail, Some(&bob))).await;
    assert_eq!(body["rating"], 2.0);
    assert_eq!(body["reviews_count"], 1);
    assert_eq!(body["user_rating"], 2);

    let (_, body) = send(&app, get(&detail)).await;
    assert_eq!(body["user_rating"], Value::Null);

    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/recipes/999/rate/",
            Some(&bob),
            &json!({ "value": 3 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comments_post_and_render_newest_first() {
    let (app, pool) = test_app();
    let desserts = seed_category(&pool, "Desserts", "desserts");
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;
    let recipe = create_recipe(&app, &alice, "Chocolate Cake", desserts, 30).await;
    let comments_path = format!("/recipes/{recipe}/comments/");

    let (status, _) = send(
        &app,
        json_request(Method::POST, &comments_path, None, &json!({ "content": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        json_request(Method::POST, &comments_path, Some(&bob), &json!({ "content": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            &comments_path,
            Some(&bob),
            &json!({ "content": "Looks delicious" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["content"], "Looks delicious");
    assert_eq!(body["user"]["username"], "bob");
    assert_eq!(body["likes_count"], 0);

    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            &comments_path,
            Some(&alice),
            &json!({ "content": "Thanks!" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(&app, get(&format!("/recipes/{recipe}/"))).await;
    let contents: Vec<&str> = body["comments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|comment| comment["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["Thanks!", "Looks delicious"]);
}

#[tokio::test]
async fn search_needs_a_query_and_ranks_title_matches_first() {
    let (app, pool) = test_app();
    let desserts = seed_category(&pool, "Desserts", "desserts");
    let token = register(&app, "cook").await;

    let (status, body) = send(&app, get("/recipes/search/")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Query parameter is required");

    create_recipe(&app, &token, "Chocolate Cake", desserts, 30).await;
    let soup = create_recipe(&app, &token, "Beef Soup", desserts, 90).await;
    create_recipe(&app, &token, "Plain Bread", desserts, 60).await;

    // Give the soup a description mentioning cake, so it matches but ranks
    // below the title hit.
    let (status, _) = send(
        &app,
        json_request(
            Method::PATCH,
            &format!("/recipes/{soup}/"),
            Some(&token),
            &json!({ "description": "Good before cake" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, get("/recipes/search/?query=CAKE")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["results"][0]["title"], "Chocolate Cake");
    assert_eq!(body["results"][1]["title"], "Beef Soup");

    // Any other sort key hands the matching set to the listing rules.
    let (status, body) = send(
        &app,
        get("/recipes/search/?query=cake&sort=cooking_time&order=asc"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"][0]["title"], "Chocolate Cake");
    assert_eq!(body["results"][1]["title"], "Beef Soup");

    let (status, body) = send(
        &app,
        get("/recipes/search/?query=cake&sort=cooking_time"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"][0]["title"], "Beef Soup");
}

#[tokio::test]
async fn listings_sort_and_filter() {
    let (app, pool) = test_app();
    let desserts = seed_category(&pool, "Desserts", "desserts");
    seed_category(&pool, "Soups", "soups");
    let token = register(&app, "cook").await;
    let chocolate = create_recipe(&app, &token, "Chocolate Cake", desserts, 30).await;
    create_recipe(&app, &token, "Vanilla Dream", desserts, 45).await;

    // Newest first by default.
    let (status, body) = send(&app, get("/recipes/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"][0]["title"], "Vanilla Dream");
    assert_eq!(body["results"][1]["title"], "Chocolate Cake");

    let (_, body) = send(
        &app,
        get("/categories/desserts/recipes/?sort=cooking_time&order=asc"),
    )
    .await;
    assert_eq!(body["results"][0]["title"], "Chocolate Cake");

    let (_, body) = send(&app, get("/categories/desserts/recipes/?sort=cooking_time")).await;
    assert_eq!(body["results"][0]["title"], "Vanilla Dream");

    let (_, body) = send(&app, get("/recipes/?sort=title&order=asc")).await;
    assert_eq!(body["results"][0]["title"], "Chocolate Cake");

    // An unknown sort key quietly falls back to created_at.
    let (status, body) = send(&app, get("/recipes/?sort=nonsense")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"][0]["title"], "Vanilla Dream");

    let (_, body) = send(&app, get("/categories/soups/recipes/")).await;
    assert_eq!(body["count"], 0);

    feature_recipe(&pool, chocolate);
    let (_, body) = send(&app, get("/recipes/?featured=true")).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["title"], "Chocolate Cake");
    assert_eq!(body["results"][0]["featured"], true);
}

#[tokio::test]
async fn pagination_envelope_and_links() {
    let (app, pool) = test_app();
    let desserts = seed_category(&pool, "Desserts", "desserts");
    let token = register(&app, "cook").await;
    for title in ["One", "Two", "Three"] {
        create_recipe(&app, &token, title, desserts, 30).await;
    }

    let (status, body) = send(&app, get("/recipes/?limit=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
    assert_eq!(body["next"], "/recipes/?limit=2&page=2");
    assert_eq!(body["previous"], Value::Null);

    let (status, body) = send(&app, get("/recipes/?limit=2&page=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
    assert_eq!(body["next"], Value::Null);
    assert_eq!(body["previous"], "/recipes/?limit=2&page=1");

    let (status, _) = send(&app, get("/recipes/?limit=2&page=5")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, get("/recipes/?page=0")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // A page that does not parse is a page that does not exist.
    let (status, body) = send(&app, get("/recipes/?page=abc")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "invalid page");

    let (status, _) = send(&app, get("/recipes/search/?query=cake&page=abc")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // A limit that does not parse falls back to the default size.
    let (status, body) = send(&app, get("/recipes/?limit=abc")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn profile_updates_apply_to_the_principal() {
    let (app, _pool) = test_app();
    let alice = register(&app, "alice").await;
    register(&app, "bob").await;

    let (status, body) = send(
        &app,
        json_request(
            Method::PATCH,
            "/auth/user/update/",
            Some(&alice),
            &json!({ "bio": "I bake" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bio"], "I bake");
    assert_eq!(body["username"], "alice");

    let (_, body) = send(&app, bare_request(Method::GET, "/auth/user/", Some(&alice))).await;
    assert_eq!(body["bio"], "I bake");

    // Someone else already owns that address.
    let (status, body) = send(
        &app,
        json_request(
            Method::PUT,
            "/auth/user/update/",
            Some(&alice),
            &json!({ "email": "bob@example.com" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["fields"]["email"],
        "a user with this email already exists"
    );

    let (status, body) = send(
        &app,
        json_request(
            Method::PUT,
            "/auth/user/update/",
            Some(&alice),
            &json!({ "username": "bob" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["fields"]["username"],
        "a user with this username already exists"
    );

    let (status, _) = send(
        &app,
        json_request(Method::PATCH, "/auth/user/update/", None, &json!({ "bio": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_recipe_ids_are_not_found() {
    let (app, _pool) = test_app();

    let (status, body) = send(&app, get("/recipes/abc/")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "resource not found");

    let (status, _) = send(
        &app,
        json_request(Method::POST, "/recipes/abc/rate/", None, &json!({ "value": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn a_bad_bearer_token_is_rejected_even_where_auth_is_optional() {
    let (app, _pool) = test_app();

    let (status, _) = send(
        &app,
        bare_request(Method::GET, "/recipes/", Some("not-a-token")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, get("/recipes/")).await;
    assert_eq!(status, StatusCode::OK);
}
