use account_service::{build_router, AppState, Database};
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

const BASE_URL: &str = "/accounts";

fn test_app() -> Router {
    let db = Database::open_in_memory().expect("in-memory database");
    build_router(AppState { db }).expect("route table builds")
}

fn account_payload(n: usize) -> Value {
    json!({
        "name": format!("Account Holder {}", n),
        "email": format!("holder{}@example.com", n),
        "address": format!("{} Main Street", n),
        "phone_number": format!("555-01{:02}", n),
        "date_joined": "2024-03-15",
    })
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.expect("router is infallible")
}

async fn get(app: &Router, uri: &str) -> Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn send_json(app: &Router, method: Method, uri: &str, body: &Value) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn delete(app: &Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn create_accounts(app: &Router, count: usize) -> Vec<Value> {
    let mut accounts = Vec::new();
    for n in 0..count {
        let response = send_json(app, Method::POST, BASE_URL, &account_payload(n)).await;
        assert_eq!(
            response.status(),
            StatusCode::CREATED,
            "Could not create test Account"
        );
        accounts.push(body_json(response).await);
    }
    accounts
}

async fn account_count(app: &Router) -> usize {
    let response = get(app, BASE_URL).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await.as_array().unwrap().len()
}

// ============================================================================
// Health and index
// ============================================================================

#[tokio::test]
async fn test_index() {
    let app = test_app();
    let response = get(&app, "/").await;

    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await;
    assert_eq!(data["name"], "Account REST API Service");
    assert_eq!(data["version"], "1.0");
}

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let response = get(&app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "OK");
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn test_create_account() {
    let app = test_app();
    let payload = account_payload(1);
    let response = send_json(&app, Method::POST, BASE_URL, &payload).await;

    assert_eq!(response.status(), StatusCode::CREATED);

    let location = response
        .headers()
        .get(header::LOCATION)
        .expect("Location header")
        .to_str()
        .unwrap()
        .to_string();

    let created = body_json(response).await;
    let id = created["id"].as_i64().expect("numeric id");
    assert_eq!(location, format!("/accounts/{}", id));
    for field in ["name", "email", "address", "phone_number", "date_joined"] {
        assert_eq!(created[field], payload[field], "field {}", field);
    }

    // Read it back through the Location header
    let response = get(&app, &location).await;
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = body_json(response).await;
    for field in ["name", "email", "address", "phone_number"] {
        assert_eq!(fetched[field], payload[field], "field {}", field);
    }
}

#[tokio::test]
async fn test_create_defaults_date_joined() {
    let app = test_app();
    let mut payload = account_payload(2);
    payload.as_object_mut().unwrap().remove("date_joined");

    let response = send_json(&app, Method::POST, BASE_URL, &payload).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let created = body_json(response).await;
    let today = chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string();
    assert_eq!(created["date_joined"], today);
}

#[tokio::test]
async fn test_bad_request() {
    let app = test_app();
    let response = send_json(&app, Method::POST, BASE_URL, &json!({"name": "not enough data"})).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = body_json(response).await;
    assert_eq!(error["status"], 400);
    assert_eq!(error["message"], "Invalid Account: missing email");

    assert_eq!(account_count(&app).await, 0);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri(BASE_URL)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(account_count(&app).await, 0);
}

#[tokio::test]
async fn test_unsupported_media_type() {
    let app = test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri(BASE_URL)
        .header(header::CONTENT_TYPE, "test/html")
        .body(Body::from(account_payload(3).to_string()))
        .unwrap();

    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let error = body_json(response).await;
    assert_eq!(error["message"], "Content-Type must be application/json");

    assert_eq!(account_count(&app).await, 0);
}

#[tokio::test]
async fn test_missing_content_type() {
    let app = test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri(BASE_URL)
        .body(Body::from(account_payload(4).to_string()))
        .unwrap();

    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

// ============================================================================
// Read and list
// ============================================================================

#[tokio::test]
async fn test_get_account() {
    let app = test_app();
    let account = create_accounts(&app, 1).await.remove(0);

    let response = get(&app, &format!("{}/{}", BASE_URL, account["id"])).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["name"], account["name"]);
}

#[tokio::test]
async fn test_get_account_not_found() {
    let app = test_app();
    let response = get(&app, &format!("{}/0", BASE_URL)).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let error = body_json(response).await;
    assert_eq!(error["message"], "Account with id [0] could not be found.");
}

#[tokio::test]
async fn test_get_account_non_integer_id() {
    let app = test_app();
    assert_eq!(get(&app, "/accounts/abc").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/accounts/-1").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_id_that_is_not_utf8() {
    let app = test_app();
    for method in [Method::GET, Method::DELETE] {
        let request = Request::builder()
            .method(method)
            .uri("/accounts/%FF")
            .body(Body::empty())
            .unwrap();

        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_security_headers(&response);
        assert_eq!(body_json(response).await["status"], 404);
    }

    let response = send_json(&app, Method::PUT, "/accounts/%FF", &account_payload(6)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_account_list() {
    let app = test_app();
    assert_eq!(account_count(&app).await, 0);

    create_accounts(&app, 7).await;
    assert_eq!(account_count(&app).await, 7);
}

// ============================================================================
// Update
// ============================================================================

#[tokio::test]
async fn test_update_account() {
    let app = test_app();
    let mut account = create_accounts(&app, 1).await.remove(0);
    let uri = format!("{}/{}", BASE_URL, account["id"]);

    account["name"] = json!("Just for Test");
    let response = send_json(&app, Method::PUT, &uri, &account).await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["name"], "Just for Test");
    assert_eq!(updated["id"], account["id"]);

    let fetched = body_json(get(&app, &uri).await).await;
    assert_eq!(fetched["name"], "Just for Test");
}

#[tokio::test]
async fn test_update_ignores_body_id() {
    let app = test_app();
    let mut account = create_accounts(&app, 1).await.remove(0);
    let id = account["id"].clone();

    account["id"] = json!(12345);
    let response = send_json(&app, Method::PUT, &format!("{}/{}", BASE_URL, id), &account).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["id"], id);
}

#[tokio::test]
async fn test_update_account_not_found() {
    let app = test_app();
    let response = send_json(&app, Method::PUT, "/accounts/0", &account_payload(5)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_account_bad_request() {
    let app = test_app();
    let account = create_accounts(&app, 1).await.remove(0);
    let uri = format!("{}/{}", BASE_URL, account["id"]);

    let response = send_json(&app, Method::PUT, &uri, &json!({"name": "only a name"})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Rejected update leaves the stored record alone
    let fetched = body_json(get(&app, &uri).await).await;
    assert_eq!(fetched, account);
}

#[tokio::test]
async fn test_update_unsupported_media_type() {
    let app = test_app();
    let account = create_accounts(&app, 1).await.remove(0);

    let request = Request::builder()
        .method(Method::PUT)
        .uri(format!("{}/{}", BASE_URL, account["id"]))
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(account.to_string()))
        .unwrap();

    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_delete_account() {
    let app = test_app();
    let account = create_accounts(&app, 1).await.remove(0);
    let uri = format!("{}/{}", BASE_URL, account["id"]);

    let response = delete(&app, &uri).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.is_empty());

    assert_eq!(get(&app, &uri).await.status(), StatusCode::NOT_FOUND);

    // Deleting again is still a success
    assert_eq!(delete(&app, &uri).await.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_delete_never_created() {
    let app = test_app();
    let response = delete(&app, "/accounts/987").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_method_not_allowed() {
    let app = test_app();
    let response = delete(&app, BASE_URL).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_unknown_path() {
    let app = test_app();
    let response = get(&app, "/nowhere").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["status"], 404);
}

// ============================================================================
// Security headers
// ============================================================================

const EXPECTED_HEADERS: [(&str, &str); 6] = [
    ("x-frame-options", "SAMEORIGIN"),
    ("x-content-type-options", "nosniff"),
    ("content-security-policy", "default-src 'self'; object-src 'none'"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    ("strict-transport-security", "max-age=31536000; includeSubDomains"),
    ("access-control-allow-origin", "*"),
];

fn assert_security_headers(response: &Response) {
    for (name, value) in EXPECTED_HEADERS {
        assert_eq!(
            response.headers().get(name).and_then(|v| v.to_str().ok()),
            Some(value),
            "header {} on {} response",
            name,
            response.status()
        );
    }
}

#[tokio::test]
async fn test_security_headers() {
    let app = test_app();
    let response = get(&app, "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_security_headers(&response);
}

#[tokio::test]
async fn test_security_headers_on_errors() {
    let app = test_app();

    assert_security_headers(&get(&app, "/accounts/0").await);
    assert_security_headers(&get(&app, "/nowhere").await);
    assert_security_headers(&delete(&app, BASE_URL).await);
    assert_security_headers(
        &send_json(&app, Method::POST, BASE_URL, &json!({"name": "x"})).await,
    );
}
