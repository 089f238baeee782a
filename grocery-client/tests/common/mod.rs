// grocery-client/tests/common/mod.rs
// 模拟订单服务 - 集成测试用

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use grocery_client::ClientConfig;
use serde_json::{Value, json};
use shared::ErrorBody;
use tempfile::TempDir;

pub const PASSWORD: &str = "x";

#[derive(Default)]
struct Inner {
    calls: HashMap<&'static str, usize>,
    issued: usize,
    valid_access: HashSet<String>,
    reject_refresh: bool,
    always_unauthorized: bool,
    empty_last_order_404: bool,
    order_statuses: VecDeque<Value>,
    restock_statuses: VecDeque<Value>,
    orders: Vec<Value>,
}

/// In-process ordering service with scripted poll answers
#[derive(Clone, Default)]
pub struct MockService {
    inner: Arc<Mutex<Inner>>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self, route: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .calls
            .get(route)
            .copied()
            .unwrap_or(0)
    }

    /// Queue `{Status, TotalPrice}` answers for `/api/client/orders/last`;
    /// once drained it answers `data: null`
    pub fn script_order(&self, statuses: &[(&str, f64)]) {
        let mut inner = self.inner.lock().unwrap();
        for (status, total) in statuses {
            inner.order_statuses.push_back(json!({
                "ID": 1,
                "OrderID": "ord-1",
                "ClientID": 1,
                "Status": status,
                "TotalPrice": total,
                "CreatedAt": "2025-03-01T10:00:00Z"
            }));
        }
    }

    pub fn script_restock(&self, statuses: &[(&str, f64)]) {
        let mut inner = self.inner.lock().unwrap();
        for (status, total) in statuses {
            inner.restock_statuses.push_back(json!({
                "OrderID": "res-1",
                "Status": status,
                "TotalCost": total
            }));
        }
    }

    /// Invalidate every access token issued so far
    pub fn expire_access_tokens(&self) {
        self.inner.lock().unwrap().valid_access.clear();
    }

    pub fn reject_refresh(&self) {
        self.inner.lock().unwrap().reject_refresh = true;
    }

    pub fn always_unauthorized(&self) {
        self.inner.lock().unwrap().always_unauthorized = true;
    }

    /// Answer 404 instead of `data: null` when there is no last order
    pub fn empty_last_order_404(&self) {
        self.inner.lock().unwrap().empty_last_order_404 = true;
    }

    fn hit(&self, route: &'static str) {
        *self.inner.lock().unwrap().calls.entry(route).or_default() += 1;
    }

    fn issue_access(&self) -> String {
        let mut inner = self.inner.lock().unwrap();
        inner.issued += 1;
        let token = format!("access-{}", inner.issued);
        inner.valid_access.insert(token.clone());
        token
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let inner = self.inner.lock().unwrap();
        if inner.always_unauthorized {
            return false;
        }
        bearer(headers).is_some_and(|t| inner.valid_access.contains(t))
    }

    /// Bind to an ephemeral port and serve in the background
    pub async fn spawn(&self) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(self.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }
}

/// Config pointed at `base_url` with fast polling and a temp cache dir
pub fn config(base_url: &str, cache: &TempDir) -> ClientConfig {
    ClientConfig::new(base_url)
        .with_cache_dir(cache.path())
        .with_poll_interval(Duration::from_millis(10))
        .with_max_poll_attempts(20)
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

fn unauthorized(text: &str) -> Response {
    (StatusCode::UNAUTHORIZED, text.to_string()).into_response()
}

fn router(service: MockService) -> Router {
    Router::new()
        .route("/api/client/register", post(register))
        .route("/api/client/login", post(login))
        .route("/api/client/refresh", post(refresh))
        .route("/api/client/order/preview", post(preview))
        .route("/api/client/order/confirm", post(confirm))
        .route("/api/client/order/cancel", post(cancel))
        .route("/api/client/orders", get(history))
        .route("/api/client/orders/last", get(last_order))
        .route("/api/truck/register", post(register_truck))
        .route("/api/truck/restock", post(restock))
        .route("/api/truck/restock/status", get(restock_status))
        .with_state(service)
}

async fn register(State(svc): State<MockService>, Json(body): Json<Value>) -> Response {
    svc.hit("register");
    if body["device_id"] == "taken" {
        return (StatusCode::CONFLICT, "Registration failed").into_response();
    }
    (StatusCode::CREATED, Json(json!({"status": "success"}))).into_response()
}

async fn login(State(svc): State<MockService>, Json(body): Json<Value>) -> Response {
    svc.hit("login");
    if body["password"] != PASSWORD {
        return unauthorized("Invalid credentials");
    }
    let device = body["device_id"].as_str().unwrap_or_default();
    let access = svc.issue_access();
    Json(json!({"access_token": access, "refresh_token": format!("refresh-{device}")}))
        .into_response()
}

async fn refresh(State(svc): State<MockService>, headers: HeaderMap) -> Response {
    svc.hit("refresh");
    let valid = bearer(&headers).is_some_and(|t| t.starts_with("refresh-"));
    if !valid || svc.inner.lock().unwrap().reject_refresh {
        return unauthorized("Invalid refresh token");
    }
    Json(json!({"access_token": svc.issue_access()})).into_response()
}

async fn preview(
    State(svc): State<MockService>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    svc.hit("preview");
    if !svc.authorized(&headers) {
        return unauthorized("Invalid Token");
    }
    let mut reserved = serde_json::Map::new();
    for item in body["items"].as_array().cloned().unwrap_or_default() {
        let sku = item["sku"].as_str().unwrap_or_default().to_string();
        if sku == "OUT-OF-STOCK" {
            return (StatusCode::CONFLICT, "Reservation failed").into_response();
        }
        reserved.insert(sku, item["quantity"].clone());
    }
    (
        StatusCode::CREATED,
        Json(json!({"status": "reserved", "order_id": "ord-1", "items": reserved})),
    )
        .into_response()
}

async fn confirm(State(svc): State<MockService>, headers: HeaderMap) -> Response {
    svc.hit("confirm");
    if !svc.authorized(&headers) {
        return unauthorized("Invalid Token");
    }
    Json(json!({"status": "success", "message": "Order dispatched"})).into_response()
}

async fn cancel(State(svc): State<MockService>, headers: HeaderMap) -> Response {
    svc.hit("cancel");
    if !svc.authorized(&headers) {
        return unauthorized("Invalid Token");
    }
    Json(json!({"status": "cancelled"})).into_response()
}

async fn history(State(svc): State<MockService>, headers: HeaderMap) -> Response {
    svc.hit("history");
    if !svc.authorized(&headers) {
        return unauthorized("Invalid Token");
    }
    let orders = svc.inner.lock().unwrap().orders.clone();
    Json(json!({"status": "success", "data": orders})).into_response()
}

async fn last_order(State(svc): State<MockService>, headers: HeaderMap) -> Response {
    svc.hit("last");
    if !svc.authorized(&headers) {
        return unauthorized("Invalid Token");
    }
    let mut inner = svc.inner.lock().unwrap();
    match inner.order_statuses.pop_front() {
        Some(record) => {
            inner.orders.push(record.clone());
            Json(json!({"status": "success", "data": record})).into_response()
        }
        None if inner.empty_last_order_404 => (
            StatusCode::NOT_FOUND,
            Json(ErrorBody::new("No orders found for this user")),
        )
            .into_response(),
        None => Json(json!({"status": "success", "data": null})).into_response(),
    }
}

async fn register_truck(State(svc): State<MockService>, headers: HeaderMap) -> Response {
    svc.hit("truck_register");
    if headers.contains_key(header::AUTHORIZATION) {
        return (StatusCode::BAD_REQUEST, "unexpected token").into_response();
    }
    (StatusCode::CREATED, Json(json!({"status": "success"}))).into_response()
}

async fn restock(State(svc): State<MockService>, Json(body): Json<Value>) -> Response {
    svc.hit("restock");
    if body["items"].as_array().is_none_or(|items| items.is_empty()) {
        return (StatusCode::BAD_REQUEST, "No items").into_response();
    }
    (
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "order_id": "res-1",
            "message": "Restock accepted. Robots are offloading."
        })),
    )
        .into_response()
}

async fn restock_status(
    State(svc): State<MockService>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    svc.hit("restock_status");
    if params.get("order_id").map(String::as_str) != Some("res-1") {
        return (StatusCode::NOT_FOUND, "Order not found").into_response();
    }
    let next = svc.inner.lock().unwrap().restock_statuses.pop_front();
    let record = next.unwrap_or_else(|| {
        json!({"OrderID": "res-1", "Status": "PROCESSING", "TotalCost": 0})
    });
    Json(json!({"status": "success", "data": record})).into_response()
}
