//! Integration tests for the API server.

use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use store::InMemoryStore;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> axum::Router {
    setup_with_store(InMemoryStore::new())
}

fn setup_with_store(store: InMemoryStore) -> axum::Router {
    let state = api::create_state(store, "Bs");
    api::create_app(state, get_metrics_handle())
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> Response {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap())),
        None => request.body(Body::empty()),
    };
    app.clone().oneshot(request.unwrap()).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Creates a category and two products; returns the product ids.
async fn seed_menu(app: &axum::Router) -> (i64, i64) {
    let response = send(
        app,
        "POST",
        "/categories/new",
        Some(json!({ "name": "Soups", "description": "Hot starters" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let category_id = json_body(response).await["category"]["id"].as_i64().unwrap();

    let mut ids = Vec::new();
    for (name, price) in [("Soup", "15.50"), ("Tea", "4.50")] {
        let response = send(
            app,
            "POST",
            "/products/new",
            Some(json!({ "name": name, "category": category_id, "price": price })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        ids.push(json_body(response).await["product"]["id"].as_i64().unwrap());
    }
    (ids[0], ids[1])
}

async fn create_order(app: &axum::Router, body: Value) -> i64 {
    let response = send(app, "POST", "/orders/new", Some(body)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await["order_id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();

    let response = send(&app, "GET", "/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

#[tokio::test]
async fn test_create_order() {
    let app = setup();
    let (soup, _) = seed_menu(&app).await;

    let response = send(
        &app,
        "POST",
        "/orders/new",
        Some(json!({
            "type": "IN_STORE",
            "table_number": "5",
            "items": [{ "product": soup, "quantity": 2, "unit_price": "0" }, {}]
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let location = response.headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .to_string();
    let json = json_body(response).await;
    assert_eq!(location, format!("/orders/{}", json["order_id"]));
    assert_eq!(json["total"], "31.00");
    assert_eq!(
        json["message"],
        format!(
            "Order #{} created successfully. Total: 31.00 Bs",
            json["order_id"]
        )
    );
}

#[tokio::test]
async fn test_failed_write_returns_generic_error() {
    let store = InMemoryStore::new();
    let app = setup_with_store(store.clone());
    let (soup, tea) = seed_menu(&app).await;
    let body = json!({
        "items": [
            { "product": soup, "quantity": 1 },
            { "product": tea, "quantity": 2 }
        ]
    });

    store.fail_next_write();
    let response = send(&app, "POST", "/orders/new", Some(body.clone())).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_body(response).await;
    assert_eq!(
        json["error"],
        "The order could not be saved, please try again"
    );
    let text = json.to_string();
    assert!(!text.contains("injected"));
    assert!(!text.contains("unavailable"));
    assert_eq!(store.order_count().await, 0);

    let response = send(&app, "GET", "/orders", None).await;
    assert_eq!(json_body(response).await["count"], 0);

    create_order(&app, body).await;
}

#[tokio::test]
async fn test_create_and_get_order() {
    let app = setup();
    let (soup, tea) = seed_menu(&app).await;
    let id = create_order(
        &app,
        json!({
            "type": "TAKEAWAY",
            "table_number": "5",
            "customer_name": "Ana",
            "items": [
                { "product": soup, "quantity": 1 },
                { "product": tea, "quantity": 2, "unit_price": "4.00" }
            ]
        }),
    )
    .await;

    let response = send(&app, "GET", &format!("/orders/{id}"), None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["type"], "TAKEAWAY");
    assert_eq!(json["table_number"], Value::Null);
    assert_eq!(json["status"], "PENDING");
    assert_eq!(json["items"].as_array().unwrap().len(), 2);
    assert_eq!(json["items"][0]["label"], "1 x Soup");
    assert_eq!(json["items"][1]["subtotal"], "8.00");
    assert_eq!(json["total"], "23.50");
}

#[tokio::test]
async fn test_rejected_order_echoes_form() {
    let app = setup();
    seed_menu(&app).await;

    let response = send(
        &app,
        "POST",
        "/orders/new",
        Some(json!({
            "type": "IN_STORE",
            "customer_name": "Ana",
            "items": [{ "quantity": 3 }]
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = json_body(response).await;
    assert_eq!(json["errors"]["rows"][0]["row"][0], "must select a product");
    assert_eq!(
        json["errors"]["collection"][0],
        "must add at least one product to the order"
    );
    assert_eq!(json["form"]["customer_name"], "Ana");
    assert_eq!(json["form"]["items"][0]["quantity"], 3);

    let listing = json_body(send(&app, "GET", "/orders", None).await).await;
    assert_eq!(listing["count"], 0);
}

#[tokio::test]
async fn test_get_nonexistent_order() {
    let app = setup();

    let response = send(&app, "GET", "/orders/999", None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_status_transitions() {
    let app = setup();
    let (soup, _) = seed_menu(&app).await;
    let id = create_order(
        &app,
        json!({ "items": [{ "product": soup, "quantity": 1 }] }),
    )
    .await;
    let uri = format!("/orders/{id}/status");

    let response = send(&app, "POST", &uri, Some(json!({ "new_status": "PREPARING" }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let order = json_body(send(&app, "GET", &format!("/orders/{id}"), None).await).await;
    assert_eq!(order["status"], "PENDING");

    let response = send(&app, "POST", &uri, Some(json!({ "new_status": "DELIVERED" }))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "DELIVERED");
}

#[tokio::test]
async fn test_list_orders_by_status() {
    let app = setup();
    let (soup, tea) = seed_menu(&app).await;
    let first = create_order(
        &app,
        json!({ "items": [{ "product": soup, "quantity": 2 }] }),
    )
    .await;
    create_order(&app, json!({ "items": [{ "product": tea, "quantity": 1 }] })).await;
    send(
        &app,
        "POST",
        &format!("/orders/{first}/status"),
        Some(json!({ "new_status": "CANCELLED" })),
    )
    .await;

    let json = json_body(send(&app, "GET", "/orders?status=CANCELLED", None).await).await;
    assert_eq!(json["filter"], "CANCELLED");
    assert_eq!(json["count"], 1);
    assert_eq!(json["revenue"], "31.00");
    assert_eq!(json["orders"][0]["id"], first);

    let json = json_body(send(&app, "GET", "/orders", None).await).await;
    assert_eq!(json["filter"], "ALL");
    assert_eq!(json["count"], 2);
    assert_eq!(json["revenue"], "35.50");

    let response = send(&app, "GET", "/orders?status=LOST", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_edit_order() {
    let app = setup();
    let (soup, tea) = seed_menu(&app).await;
    let id = create_order(
        &app,
        json!({ "items": [
            { "product": soup, "quantity": 1 },
            { "product": tea, "quantity": 1 }
        ] }),
    )
    .await;

    let edit = json_body(send(&app, "GET", &format!("/orders/{id}/edit"), None).await).await;
    let mut form = edit["form"].clone();
    assert_eq!(form["items"].as_array().unwrap().len(), 3);
    form["items"][0]["quantity"] = json!(3);
    form["items"][1]["delete"] = json!(true);

    let response = send(&app, "POST", &format!("/orders/{id}/edit"), Some(form)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["total"], "46.50");
    assert_eq!(json["item_count"], 1);
}

#[tokio::test]
async fn test_new_order_form_offers_active_products() {
    let app = setup();
    let (soup, tea) = seed_menu(&app).await;
    let response = send(
        &app,
        "POST",
        &format!("/products/{tea}/edit"),
        Some(json!({ "name": "Tea", "category": 1, "price": "4.50", "active": false })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(send(&app, "GET", "/orders/new", None).await).await;

    assert_eq!(json["form"]["type"], "IN_STORE");
    assert_eq!(json["form"]["items"].as_array().unwrap().len(), 1);
    let products = json["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["id"], soup);
    assert_eq!(products[0]["label"], "Soup (15.50 Bs)");
}

#[tokio::test]
async fn test_catalog_validation_and_protection() {
    let app = setup();
    let (soup, _) = seed_menu(&app).await;

    let response = send(&app, "POST", "/categories/new", Some(json!({ "name": "Soups" }))).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = json_body(response).await;
    assert_eq!(
        json["errors"]["name"][0],
        "category with this name already exists"
    );
    assert_eq!(json["form"]["name"], "Soups");

    create_order(
        &app,
        json!({ "items": [{ "product": soup, "quantity": 1 }] }),
    )
    .await;

    let confirmation =
        json_body(send(&app, "GET", &format!("/products/{soup}/delete"), None).await).await;
    assert_eq!(confirmation["line_item_count"], 1);
    assert_eq!(confirmation["can_delete"], false);

    let response = send(&app, "POST", &format!("/products/{soup}/delete"), None).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = send(&app, "POST", "/categories/1/delete", None).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_delete_order() {
    let app = setup();
    let (soup, _) = seed_menu(&app).await;
    let id = create_order(
        &app,
        json!({ "items": [{ "product": soup, "quantity": 1 }] }),
    )
    .await;

    let response = send(&app, "POST", &format!("/orders/{id}/delete"), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", &format!("/orders/{id}"), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, "POST", &format!("/products/{soup}/delete"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_dashboard() {
    let app = setup();
    let (soup, _) = seed_menu(&app).await;
    create_order(
        &app,
        json!({ "items": [{ "product": soup, "quantity": 1 }] }),
    )
    .await;

    let json = json_body(send(&app, "GET", "/", None).await).await;

    assert_eq!(json["categories"], 1);
    assert_eq!(json["products"], 2);
    assert_eq!(json["orders"], 1);
    assert_eq!(json["orders_by_status"][0]["status"], "PENDING");
    assert_eq!(json["orders_by_status"][0]["count"], 1);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();

    let response = send(&app, "GET", "/metrics", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}
