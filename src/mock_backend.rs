//! In-process stand-in for the banking backend, used by the client tests.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::Path;
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::trace;
use tracing::Level;

pub const TOKEN: &str = "ZGV2ZWxvcGVyOnNraWxsYm94";
pub const ACCOUNT: &str = "74213041477477406320783754";

pub const FEED_FRAMES: &[&str] = &[
    r#"{"type":"EXCHANGE_RATE_CHANGE","from":"NZD","to":"CHF","rate":62.83,"change":1}"#,
    "this is not json",
    r#"{"type":"SERVER_NOTICE","text":"maintenance at midnight"}"#,
    r#"{"type":"EXCHANGE_RATE_CHANGE","from":"USD","to":"RUB","rate":91.2,"change":-1}"#,
    r#"{"type":"EXCHANGE_RATE_CHANGE","from":"NZD","to":"CHF","rate":63.1,"change":1}"#,
];

fn make_router() -> Router<()> {
    Router::new()
        .route("/login", post(login))
        .route("/accounts", get(accounts))
        .route("/account/:id", get(account))
        .route("/create-account", post(create_account))
        .route("/transfer-funds", post(transfer_funds))
        .route("/all-currencies", get(all_currencies))
        .route("/currencies", get(currencies))
        .route("/currency-buy", post(currency_buy))
        .route("/banks", get(banks))
        .route("/currency-feed", get(currency_feed))
        .layer(
            trace::TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Serves the mock on an ephemeral port and returns its base URL.
pub async fn spawn() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, make_router()).await.unwrap();
    });
    format!("http://{}", addr)
}

fn ok(payload: Value) -> Response {
    Json(json!({ "payload": payload, "error": "" })).into_response()
}

fn fail(status: StatusCode, error: &str) -> Response {
    (status, Json(json!({ "payload": null, "error": error }))).into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Basic {}", TOKEN))
        .unwrap_or(false)
}

fn detailed_account(balance: f64) -> Value {
    json!({
        "account": ACCOUNT,
        "balance": balance,
        "mine": false,
        "transactions": [
            {"amount": 500, "date": "2024-03-10T10:00:00.000Z", "from": "05168707632801844723808510", "to": ACCOUNT},
            {"amount": 200, "date": "2024-04-02T10:00:00.000Z", "from": ACCOUNT, "to": "61253747452820828268825011"},
            {"amount": 700, "date": "2024-05-20T10:00:00.000Z", "from": "05168707632801844723808510", "to": ACCOUNT}
        ]
    })
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["login"] == "developer" && body["password"] == "skillbox" {
        ok(json!({ "token": TOKEN }))
    } else {
        fail(StatusCode::OK, "Invalid password")
    }
}

#[axum_macros::debug_handler]
async fn accounts(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    ok(json!([
        {"account": ACCOUNT, "balance": 1000, "mine": true, "transactions": [
            {"amount": 700, "date": "2024-05-20T10:00:00.000Z", "from": "05168707632801844723808510", "to": ACCOUNT}
        ]},
        {"account": "61253747452820828268825011", "balance": 50, "mine": true, "transactions": []}
    ]))
}

async fn account(headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    if id != ACCOUNT {
        return fail(StatusCode::NOT_FOUND, "No such account");
    }
    ok(detailed_account(1000.0))
}

async fn create_account(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    ok(json!({"account": "24051911042011391685480127", "balance": 0, "mine": true, "transactions": []}))
}

async fn transfer_funds(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let amount = body["amount"].as_f64().unwrap_or(0.0);
    if amount > 1000.0 {
        return fail(StatusCode::OK, "Overdraft prevented");
    }
    ok(detailed_account(1000.0 - amount))
}

async fn all_currencies() -> Response {
    ok(json!(["ETH", "BTC", "USD", "EUR", "JPY", "GBP", "CNH", "RUB", "BYR"]))
}

async fn currencies(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    ok(json!({
        "USD": {"amount": 100, "code": "USD"},
        "EUR": {"amount": 0, "code": "EUR"}
    }))
}

async fn currency_buy(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let amount = body["amount"].as_f64().unwrap_or(0.0);
    ok(json!({
        "USD": {"amount": 100.0 - amount, "code": "USD"},
        "EUR": {"amount": amount, "code": "EUR"}
    }))
}

async fn banks() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "database unavailable").into_response()
}

async fn currency_feed(ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(push_frames)
}

async fn push_frames(mut socket: WebSocket) {
    for frame in FEED_FRAMES {
        if socket.send(Message::Text(frame.to_string())).await.is_err() {
            return;
        }
    }
    let _ = socket.send(Message::Close(None)).await;
}
