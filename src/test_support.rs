//! Local stand-ins for upstream APIs, bound to an ephemeral port.

use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;

pub fn reqwest_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .expect("test client builds")
}

pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let address = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{address}")
}

pub async fn serve_json(path: &str, body: Value) -> String {
    let handler = move || {
        let body = body.clone();
        async move { Json(body) }
    };
    serve(Router::new().route(path, get(handler))).await
}

pub async fn serve_status(path: &str, status: u16) -> String {
    let status = StatusCode::from_u16(status).expect("valid status");
    serve(Router::new().route(path, get(move || async move { (status, "upstream error") }))).await
}
