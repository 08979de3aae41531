//! In-memory ShipStation used by unit tests.
//!
//! Keeps order state across calls so read-after-write is observable, and
//! records every request for call-count assertions. Like the real service,
//! `addtag` does not deduplicate.

use crate::config::Credentials;
use crate::error::Result;
use crate::models::fixtures::tags_json;
use crate::transport::{ApiRequest, ApiResponse, Method, Transport};
use serde_json::{Value, json};
use std::sync::Mutex;

#[derive(Default)]
struct FakeState {
    orders: Vec<Value>,
    tags: Value,
    requests: Vec<ApiRequest>,
    forced: Option<ApiResponse>,
    forced_writes: Option<ApiResponse>,
    page_size: Option<usize>,
}

pub struct FakeShipStation {
    state: Mutex<FakeState>,
}

impl FakeShipStation {
    pub fn new() -> Self {
        FakeShipStation {
            state: Mutex::new(FakeState {
                tags: tags_json(),
                ..FakeState::default()
            }),
        }
    }

    pub fn with_order(self, order: Value) -> Self {
        self.state.lock().unwrap().orders.push(order);
        self
    }

    pub fn with_tags(self, tags: Value) -> Self {
        self.state.lock().unwrap().tags = tags;
        self
    }

    /// Cap page size below what the client asks for
    pub fn with_page_size(self, size: usize) -> Self {
        self.state.lock().unwrap().page_size = Some(size);
        self
    }

    pub fn respond_all_with(self, status: u16) -> Self {
        self.respond_all_with_body(status, r#"{"Message": "simulated failure"}"#)
    }

    pub fn respond_all_with_body(self, status: u16, body: &str) -> Self {
        self.state.lock().unwrap().forced = Some(ApiResponse::new(status, body));
        self
    }

    pub fn fail_writes_with(self, status: u16) -> Self {
        self.state.lock().unwrap().forced_writes =
            Some(ApiResponse::new(status, r#"{"Message": "write failed"}"#));
        self
    }

    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    pub fn writes(&self) -> usize {
        self.requests().iter().filter(|r| r.is_write()).count()
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Raw tag ids currently stored for an order, duplicates included
    pub fn stored_tag_ids(&self, order_id: i64) -> Vec<i64> {
        let state = self.state.lock().unwrap();
        state
            .orders
            .iter()
            .find(|o| o["orderId"] == json!(order_id))
            .and_then(|o| o["tagIds"].as_array().cloned())
            .unwrap_or_default()
            .iter()
            .filter_map(|t| t.as_i64().or_else(|| t["tagId"].as_i64()))
            .collect()
    }

    pub fn stored_notes(&self, order_id: i64) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .orders
            .iter()
            .find(|o| o["orderId"] == json!(order_id))
            .and_then(|o| o["internalNotes"].as_str().map(str::to_string))
    }
}

fn ok(body: Value) -> ApiResponse {
    ApiResponse::new(200, body.to_string())
}

fn not_found() -> ApiResponse {
    ApiResponse::new(404, r#"{"Message": "Not found"}"#)
}

fn list_orders(state: &FakeState, request: &ApiRequest) -> ApiResponse {
    let matching: Vec<&Value> = state
        .orders
        .iter()
        .filter(|o| match request.query_value("orderNumber") {
            Some(n) => o["orderNumber"].as_str().is_some_and(|s| s.starts_with(n)),
            None => true,
        })
        .filter(|o| match request.query_value("orderStatus") {
            Some(s) => o["orderStatus"].as_str() == Some(s),
            None => true,
        })
        .collect();

    let requested: usize = request
        .query_value("pageSize")
        .and_then(|s| s.parse().ok())
        .unwrap_or(100);
    let size = state.page_size.map_or(requested, |cap| cap.min(requested)).max(1);
    let page: usize = request
        .query_value("page")
        .and_then(|s| s.parse().ok())
        .unwrap_or(1);
    let pages = matching.len().div_ceil(size).max(1);
    let slice: Vec<&Value> = matching
        .iter()
        .skip((page - 1) * size)
        .take(size)
        .copied()
        .collect();

    ok(json!({
        "orders": slice,
        "total": matching.len(),
        "page": page,
        "pages": pages,
    }))
}

fn add_tag(state: &mut FakeState, body: &Value) -> ApiResponse {
    let (Some(order_id), Some(tag_id)) = (body["orderId"].as_i64(), body["tagId"].as_i64()) else {
        return ApiResponse::new(400, r#"{"Message": "orderId and tagId required"}"#);
    };
    let Some(order) = state.orders.iter_mut().find(|o| o["orderId"] == json!(order_id)) else {
        return not_found();
    };
    let mut ids: Vec<Value> = order["tagIds"].as_array().cloned().unwrap_or_default();
    ids.push(json!(tag_id));
    order["tagIds"] = Value::Array(ids);
    ok(json!({ "success": true, "message": "Tag added successfully." }))
}

fn upsert_order(state: &mut FakeState, body: &Value) -> ApiResponse {
    match state
        .orders
        .iter_mut()
        .find(|o| o["orderId"] == body["orderId"])
    {
        Some(existing) => *existing = body.clone(),
        None => state.orders.push(body.clone()),
    }
    ok(body.clone())
}

impl Transport for FakeShipStation {
    fn send(&self, request: &ApiRequest, _credentials: &Credentials) -> Result<ApiResponse> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(request.clone());

        if let Some(forced) = &state.forced {
            return Ok(forced.clone());
        }
        if request.is_write() {
            if let Some(forced) = &state.forced_writes {
                return Ok(forced.clone());
            }
        }

        let body = request.body.clone().unwrap_or(Value::Null);
        let response = match (request.method, request.path.as_str()) {
            (Method::Get, "/orders") => list_orders(&state, request),
            (Method::Get, "/accounts/listtags") => ok(state.tags.clone()),
            (Method::Get, path) => match path
                .strip_prefix("/orders/")
                .and_then(|id| id.parse::<i64>().ok())
            {
                Some(id) => state
                    .orders
                    .iter()
                    .find(|o| o["orderId"] == json!(id))
                    .map(|o| ok(o.clone()))
                    .unwrap_or_else(not_found),
                None => not_found(),
            },
            (Method::Post, "/orders/addtag") => add_tag(&mut state, &body),
            (Method::Post, "/orders/createorder") => upsert_order(&mut state, &body),
            (Method::Post, _) => not_found(),
        };
        Ok(response)
    }
}
