use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use mercat::config::Config;
use mercat::db::Store;
use mercat::entities::{listing_images, listings};
use sea_orm::{ActiveModelTrait, Set};
use tower::ServiceExt;

fn test_config() -> Config {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    // A pooled in-memory sqlite gives each connection its own database
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    // Recompute insights on every request so assertions see fresh data
    config.insights.cache_ttl_seconds = 0;
    config
}

async fn spawn_app_with(config: Config) -> (Router, Store) {
    let state = mercat::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    let store = state.store().clone();
    let app = mercat::api::router(state).await;
    (app, store)
}

async fn spawn_app() -> (Router, Store) {
    spawn_app_with(test_config()).await
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn seed_listing(
    store: &Store,
    id: i64,
    title: &str,
    description: &str,
    category: &str,
    location: &str,
    price: f64,
    created_at: &str,
) {
    listings::ActiveModel {
        id: Set(id),
        title: Set(title.to_string()),
        description: Set(description.to_string()),
        category: Set(category.to_string()),
        location: Set(location.to_string()),
        price: Set(price),
        created_at: Set(created_at.to_string()),
    }
    .insert(&store.conn)
    .await
    .expect("Failed to seed listing");
}

async fn seed_image(store: &Store, id: i64, listing_id: i64, url: &str) {
    listing_images::ActiveModel {
        id: Set(id),
        listing_id: Set(listing_id),
        url: Set(url.to_string()),
    }
    .insert(&store.conn)
    .await
    .expect("Failed to seed image");
}

async fn log_event(app: &Router, query_text: &str, category: Option<&str>, results_count: i32) {
    let payload = serde_json::json!({
        "query_text": query_text,
        "category": category,
        "results_count": results_count,
    });

    let response = app
        .clone()
        .oneshot(post_json("/search/log", &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_log_search_returns_event_id() {
    let (app, _store) = spawn_app().await;

    let payload = serde_json::json!({
        "query_text": "vintage bicycle",
        "category": "Sports",
        "location": "Lisbon",
        "results_count": 4,
        "user_id": 42,
        "device_type": "mobile",
    });

    let response = app
        .clone()
        .oneshot(post_json("/search/log", &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "logged");
    assert_eq!(body["id"], 1);

    let response = app
        .clone()
        .oneshot(post_json("/search/log", &payload))
        .await
        .unwrap();

    let body = json_body(response).await;
    assert_eq!(body["id"], 2);
}

#[tokio::test]
async fn test_log_search_validation_errors() {
    let (app, store) = spawn_app().await;

    // Missing field
    let response = app
        .clone()
        .oneshot(post_json("/search/log", &serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "query_text required");

    // Empty string
    let response = app
        .clone()
        .oneshot(post_json(
            "/search/log",
            &serde_json::json!({"query_text": ""}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "query_text required");

    // Whitespace only
    let response = app
        .clone()
        .oneshot(post_json(
            "/search/log",
            &serde_json::json!({"query_text": "   "}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Negative results_count
    let response = app
        .clone()
        .oneshot(post_json(
            "/search/log",
            &serde_json::json!({"query_text": "couch", "results_count": -1}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "results_count must be non-negative");

    // No event row was written by any rejected request
    assert_eq!(store.search_event_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_insights_reflect_logged_events() {
    let (app, _store) = spawn_app().await;

    for _ in 0..3 {
        log_event(&app, "chair", Some("Furniture"), 10).await;
    }
    log_event(&app, "antique globe", None, 0).await;

    let response = app.clone().oneshot(get("/search/insights")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;

    let popular = body["popular_searches"].as_array().unwrap();
    assert_eq!(popular[0]["term"], "chair");
    assert_eq!(popular[0]["count"], 3);
    assert_eq!(popular[1]["term"], "antique globe");
    assert_eq!(popular[1]["count"], 1);

    let suggested = body["suggested_searches"].as_array().unwrap();
    assert!(suggested.contains(&serde_json::json!("antique globe")));
    assert!(!suggested.contains(&serde_json::json!("chair")));
}

#[tokio::test]
async fn test_repeated_starved_search_shows_in_both_lists() {
    let (app, store) = spawn_app().await;

    for _ in 0..10 {
        log_event(&app, "chair", None, 0).await;
    }
    assert_eq!(store.search_event_count().await.unwrap(), 10);

    let response = app.clone().oneshot(get("/search/insights")).await.unwrap();
    let body = json_body(response).await;

    let popular = body["popular_searches"].as_array().unwrap();
    assert_eq!(popular[0]["term"], "chair");
    assert_eq!(popular[0]["count"], 10);

    let suggested = body["suggested_searches"].as_array().unwrap();
    assert!(suggested.contains(&serde_json::json!("chair")));
}

#[tokio::test]
async fn test_popular_ties_break_by_first_occurrence() {
    let (app, _store) = spawn_app().await;

    // beta first, then alpha twice, then gamma
    log_event(&app, "beta", None, 5).await;
    log_event(&app, "alpha", None, 5).await;
    log_event(&app, "gamma", None, 5).await;
    log_event(&app, "alpha", None, 5).await;

    let response = app.clone().oneshot(get("/search/insights")).await.unwrap();
    let body = json_body(response).await;
    let popular: Vec<&str> = body["popular_searches"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["term"].as_str().unwrap())
        .collect();

    assert_eq!(popular, vec!["alpha", "beta", "gamma"]);
}

#[tokio::test]
async fn test_suggested_filters_per_event_not_per_term() {
    let (app, _store) = spawn_app().await;

    // "sofa" once landed below the threshold, so it is still suggested even
    // though a later search for it found plenty
    log_event(&app, "sofa", None, 0).await;
    log_event(&app, "sofa", None, 25).await;
    log_event(&app, "desk", None, 25).await;

    let response = app.clone().oneshot(get("/search/insights")).await.unwrap();
    let body = json_body(response).await;
    let suggested = body["suggested_searches"].as_array().unwrap();

    assert!(suggested.contains(&serde_json::json!("sofa")));
    assert!(!suggested.contains(&serde_json::json!("desk")));
}

#[tokio::test]
async fn test_popular_categories_skips_null_and_orders_by_frequency() {
    let (app, _store) = spawn_app().await;

    log_event(&app, "lamp", Some("Lighting"), 2).await;
    log_event(&app, "chair", Some("Furniture"), 8).await;
    log_event(&app, "table", Some("Furniture"), 8).await;
    log_event(&app, "anything", None, 8).await;

    let response = app
        .clone()
        .oneshot(get("/search/popular-categories"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;

    assert_eq!(
        body["popular_categories"],
        serde_json::json!(["Furniture", "Lighting"])
    );
}

#[tokio::test]
async fn test_store_aggregation_shapes() {
    let (app, store) = spawn_app().await;

    log_event(&app, "lamp", Some("Lighting"), 2).await;
    log_event(&app, "lamp", Some("Lighting"), 1).await;

    // popular_terms carries counts; category and suggested lists are labels only
    let popular: Vec<(String, i64)> = store.popular_terms(10).await.unwrap();
    assert_eq!(popular, vec![("lamp".to_string(), 2)]);

    let categories: Vec<String> = store.popular_categories(10).await.unwrap();
    assert_eq!(categories, vec!["Lighting".to_string()]);

    let suggested: Vec<String> = store.suggested_terms(3, 10).await.unwrap();
    assert_eq!(suggested, vec!["lamp".to_string()]);
}

#[tokio::test]
async fn test_browse_filters_term_case_insensitively() {
    let (app, store) = spawn_app().await;

    seed_listing(
        &store,
        1,
        "Oak Chair",
        "Solid oak dining chair",
        "Furniture",
        "Lisbon",
        40.0,
        "2026-01-01T00:00:00Z",
    )
    .await;
    seed_listing(
        &store,
        2,
        "Gaming Chair",
        "Ergonomic, barely used",
        "Furniture",
        "Porto",
        120.0,
        "2026-01-02T00:00:00Z",
    )
    .await;
    seed_listing(
        &store,
        3,
        "Desk Lamp",
        "Adjustable arm",
        "Lighting",
        "Lisbon",
        15.0,
        "2026-01-03T00:00:00Z",
    )
    .await;

    let response = app
        .clone()
        .oneshot(get("/search/?search=CHAIR"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;

    assert_eq!(body["count"], 2);
    let ids: Vec<i64> = result_ids(&body);
    // Newest first
    assert_eq!(ids, vec![2, 1]);
}

#[tokio::test]
async fn test_browse_answers_with_and_without_trailing_slash() {
    let (app, store) = spawn_app().await;

    seed_listing(
        &store,
        1,
        "Oak Chair",
        "Solid oak",
        "Furniture",
        "Lisbon",
        40.0,
        "2026-01-01T00:00:00Z",
    )
    .await;

    let response = app.clone().oneshot(get("/search")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(get("/search/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_browse_category_and_location_are_exact_filters() {
    let (app, store) = spawn_app().await;

    seed_listing(
        &store,
        1,
        "Oak Chair",
        "Solid oak",
        "Furniture",
        "Lisbon",
        40.0,
        "2026-01-01T00:00:00Z",
    )
    .await;
    seed_listing(
        &store,
        2,
        "Gaming Chair",
        "Ergonomic",
        "Furniture",
        "Porto",
        120.0,
        "2026-01-02T00:00:00Z",
    )
    .await;
    seed_listing(
        &store,
        3,
        "Desk Lamp",
        "Adjustable",
        "Lighting",
        "Lisbon",
        15.0,
        "2026-01-03T00:00:00Z",
    )
    .await;

    let response = app
        .clone()
        .oneshot(get("/search/?category=Lighting"))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(result_ids(&body), vec![3]);

    let response = app
        .clone()
        .oneshot(get("/search/?location=Lisbon"))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(result_ids(&body), vec![3, 1]);

    // Blank filters behave as if absent
    let response = app
        .clone()
        .oneshot(get("/search/?search=&category=&location="))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["count"], 3);
}

#[tokio::test]
async fn test_listing_search_sort_orders() {
    let (app, store) = spawn_app().await;

    seed_listing(
        &store,
        1,
        "Oak Chair",
        "Solid oak",
        "Furniture",
        "Lisbon",
        40.0,
        "2026-01-01T00:00:00Z",
    )
    .await;
    seed_listing(
        &store,
        2,
        "Gaming Chair",
        "Ergonomic",
        "Furniture",
        "Porto",
        120.0,
        "2026-01-02T00:00:00Z",
    )
    .await;
    seed_listing(
        &store,
        3,
        "Beach Chair",
        "Foldable",
        "Outdoor",
        "Faro",
        40.0,
        "2026-01-03T00:00:00Z",
    )
    .await;

    let response = app
        .clone()
        .oneshot(get("/search/listings?q=chair&sort=price_low"))
        .await
        .unwrap();
    let body = json_body(response).await;
    // Equal prices break ties by id ascending
    assert_eq!(result_ids(&body), vec![1, 3, 2]);

    let response = app
        .clone()
        .oneshot(get("/search/listings?q=chair&sort=price_high"))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(result_ids(&body), vec![2, 1, 3]);

    // Unknown sort falls back to recency
    let response = app
        .clone()
        .oneshot(get("/search/listings?q=chair&sort=best_match"))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(result_ids(&body), vec![3, 2, 1]);
}

#[tokio::test]
async fn test_pagination_window_keeps_total_count() {
    let (app, store) = spawn_app().await;

    for i in 1..=5 {
        seed_listing(
            &store,
            i,
            &format!("Bookshelf {i}"),
            "Pine shelving",
            "Furniture",
            "Braga",
            10.0 * i as f64,
            &format!("2026-02-0{i}T00:00:00Z"),
        )
        .await;
    }

    let response = app
        .clone()
        .oneshot(get("/search/?search=bookshelf&limit=2&offset=2"))
        .await
        .unwrap();
    let body = json_body(response).await;

    assert_eq!(body["count"], 5);
    // Recency order is [5,4,3,2,1]; the window skips the first two
    assert_eq!(result_ids(&body), vec![3, 2]);

    // Oversized limits are clamped, not rejected
    let response = app
        .clone()
        .oneshot(get("/search/?search=bookshelf&limit=99999"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["count"], 5);
}

#[tokio::test]
async fn test_results_carry_their_images() {
    let (app, store) = spawn_app().await;

    seed_listing(
        &store,
        1,
        "Road Bike",
        "54cm frame",
        "Sports",
        "Lisbon",
        300.0,
        "2026-01-01T00:00:00Z",
    )
    .await;
    seed_listing(
        &store,
        2,
        "City Bike",
        "With basket",
        "Sports",
        "Porto",
        150.0,
        "2026-01-02T00:00:00Z",
    )
    .await;
    seed_image(&store, 1, 1, "https://img.example/road-1.jpg").await;
    seed_image(&store, 2, 1, "https://img.example/road-2.jpg").await;

    let response = app
        .clone()
        .oneshot(get("/search/?search=bike"))
        .await
        .unwrap();
    let body = json_body(response).await;
    let results = body["results"].as_array().unwrap();

    // Newest first: listing 2 (no images), then listing 1 (two images)
    assert_eq!(results[0]["id"], 2);
    assert_eq!(results[0]["images"].as_array().unwrap().len(), 0);
    assert_eq!(results[1]["id"], 1);
    let images = results[1]["images"].as_array().unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0]["url"], "https://img.example/road-1.jpg");
}

#[tokio::test]
async fn test_quick_search_caps_results_and_matches_all_fields() {
    let (app, store) = spawn_app().await;

    for i in 1..=7 {
        seed_listing(
            &store,
            i,
            &format!("Wooden Stool {i}"),
            "Handmade",
            "Furniture",
            "Coimbra",
            20.0,
            &format!("2026-03-0{i}T00:00:00Z"),
        )
        .await;
    }
    seed_listing(
        &store,
        8,
        "Surfboard",
        "7ft, good condition",
        "Sports",
        "Faro",
        90.0,
        "2026-03-08T00:00:00Z",
    )
    .await;

    let response = app
        .clone()
        .oneshot(get("/search/quick?q=stool"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let results = body.as_array().unwrap();
    assert_eq!(results.len(), 5);
    assert_eq!(results[0]["id"], 1);
    assert_eq!(results[0]["title"], "Wooden Stool 1");

    // Location and category are also quick-match fields
    let response = app
        .clone()
        .oneshot(get("/search/quick?q=faro"))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], 8);

    // Blank input is an empty result, not an error
    let response = app.clone().oneshot(get("/search/quick?q=")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_insights_cache_serves_snapshot_within_ttl() {
    let mut config = test_config();
    config.insights.cache_ttl_seconds = 3600;
    let (app, _store) = spawn_app_with(config).await;

    log_event(&app, "first", None, 5).await;

    let response = app.clone().oneshot(get("/search/insights")).await.unwrap();
    let body = json_body(response).await;
    assert_eq!(body["popular_searches"].as_array().unwrap().len(), 1);

    log_event(&app, "second", None, 5).await;

    // Within the TTL the cached snapshot is served unchanged
    let response = app.clone().oneshot(get("/search/insights")).await.unwrap();
    let body = json_body(response).await;
    assert_eq!(body["popular_searches"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_log_rate_limit_returns_429() {
    let mut config = test_config();
    config.search.log_max_events_per_window = 2;
    config.search.log_window_seconds = 60;
    let (app, _store) = spawn_app_with(config).await;

    let payload = serde_json::json!({"query_text": "kayak", "user_id": 9});

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(post_json("/search/log", &payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(post_json("/search/log", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = json_body(response).await;
    assert_eq!(body["error"], "rate limit exceeded");

    // A different caller identity still has capacity
    let other = serde_json::json!({"query_text": "kayak", "user_id": 10});
    let response = app
        .clone()
        .oneshot(post_json("/search/log", &other))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_system_status_reports_counts() {
    let (app, store) = spawn_app().await;

    seed_listing(
        &store,
        1,
        "Oak Chair",
        "Solid oak",
        "Furniture",
        "Lisbon",
        40.0,
        "2026-01-01T00:00:00Z",
    )
    .await;
    log_event(&app, "chair", None, 1).await;

    let response = app.clone().oneshot(get("/system/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;

    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["listings"], 1);
    assert_eq!(body["search_events"], 1);
}

fn result_ids(body: &serde_json::Value) -> Vec<i64> {
    body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect()
}
