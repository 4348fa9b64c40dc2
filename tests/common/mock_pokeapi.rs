//! Mock PokeAPI server for exercising the service and store over real HTTP.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, Response, StatusCode};
use axum::routing::any;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// A canned answer for one path.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub delay_ms: u64,
}

impl MockResponse {
    pub fn json(body: Value) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            delay_ms: 0,
        }
    }

    pub fn error(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay_ms: 0,
        }
    }

    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }
}

#[derive(Clone, Default)]
struct MockState {
    /// Request paths with their query string, in arrival order.
    requests: Arc<Mutex<Vec<String>>>,
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
}

pub struct MockPokeApi {
    pub addr: SocketAddr,
    state: MockState,
    shutdown: tokio::sync::watch::Sender<bool>,
}

impl MockPokeApi {
    pub async fn start() -> Self {
        let state = MockState::default();
        let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);

        let app = Router::new()
            .route("/{*path}", any(handle_request))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock server");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.changed().await;
                })
                .await
                .ok();
        });

        Self {
            addr,
            state,
            shutdown: shutdown_tx,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// Answers every request to `path` (query string ignored) with `response`.
    pub async fn route(&self, path: &str, response: MockResponse) {
        self.state
            .responses
            .lock()
            .await
            .insert(path.to_string(), response);
    }

    pub async fn requests(&self) -> Vec<String> {
        self.state.requests.lock().await.clone()
    }

    pub async fn request_count(&self) -> usize {
        self.state.requests.lock().await.len()
    }

    /// Registers a `/pokemon` page plus one detail route per entry.
    ///
    /// Each entry is `(id, name, types)`.
    pub async fn seed_pokemon(&self, entries: &[(u32, &str, &[&str])]) {
        let results: Vec<Value> = entries
            .iter()
            .map(|(id, name, _)| json!({ "name": name, "url": self.url(&format!("/pokemon/{id}/")) }))
            .collect();
        self.route(
            "/pokemon",
            MockResponse::json(json!({ "count": entries.len(), "next": null, "results": results })),
        )
        .await;

        for (id, name, types) in entries {
            self.route(
                &format!("/pokemon/{id}/"),
                MockResponse::json(pokemon_detail(&self.base_url(), *id, name, types)),
            )
            .await;
        }
    }
}

impl Drop for MockPokeApi {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

pub fn pokemon_detail(base_url: &str, id: u32, name: &str, types: &[&str]) -> Value {
    let types: Vec<Value> = types
        .iter()
        .enumerate()
        .map(|(slot, t)| json!({ "slot": slot + 1, "type": { "name": t, "url": format!("{base_url}/type/{t}/") } }))
        .collect();
    json!({
        "id": id,
        "name": name,
        "height": 7,
        "sprites": { "front_default": format!("https://img.example/{id}.png") },
        "types": types,
        "stats": [
            { "base_stat": 45, "effort": 0, "stat": { "name": "hp", "url": "" } },
            { "base_stat": 49, "effort": 0, "stat": { "name": "attack", "url": "" } }
        ],
        "species": { "name": name, "url": format!("{base_url}/pokemon-species/{id}/") }
    })
}

/// Chain node with the species url shaped like PokeAPI's.
pub fn chain_link(base_url: &str, name: &str, id: u32, evolves_to: Vec<Value>) -> Value {
    json!({
        "is_baby": false,
        "species": { "name": name, "url": format!("{base_url}/pokemon-species/{id}/") },
        "evolves_to": evolves_to
    })
}

async fn handle_request(State(state): State<MockState>, req: Request<Body>) -> Response<Body> {
    let path = req.uri().path().to_string();
    let logged = match req.uri().query() {
        Some(query) => format!("{path}?{query}"),
        None => path.clone(),
    };
    state.requests.lock().await.push(logged);

    let response = state.responses.lock().await.get(&path).cloned();
    let response = response.unwrap_or_else(|| MockResponse::error(404, "Not Found"));

    if response.delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(response.delay_ms)).await;
    }

    Response::builder()
        .status(StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR))
        .header("content-type", "application/json")
        .body(Body::from(response.body))
        .unwrap()
}
