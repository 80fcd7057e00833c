//! Test doubles for the chat-completions endpoint.

#![allow(dead_code)]

use coderefine::llm::ModelTier;
use coderefine::Config;
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

pub const API_KEY: &str = "sk-test-key";
pub const CHAT_PATH: &str = "/api/v1/chat/completions";

/// OpenAI-style chat completion body carrying `content` as the first choice.
pub fn chat_body(content: &str) -> String {
    json!({
        "id": "gen-1",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    })
    .to_string()
}

pub fn config_for(url: &str, timeout: Duration, primary: &[&str], fallback: &[&str]) -> Config {
    let mut config = Config::default().with_api_key(API_KEY);
    config.endpoint = format!("{}{}", url.trim_end_matches('/'), CHAT_PATH);
    config.request_timeout = timeout;
    config.primary = ModelTier::new(primary.iter().copied());
    config.fallback = ModelTier::new(fallback.iter().copied());
    config
}

/// Answer requests for `model` with a raw `status` and `body`, expecting `hits` calls.
pub async fn mock_status(
    server: &mut ServerGuard,
    model: &str,
    status: usize,
    body: &str,
    hits: usize,
) -> Mock {
    server
        .mock("POST", CHAT_PATH)
        .match_body(Matcher::PartialJson(json!({ "model": model })))
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body)
        .expect(hits)
        .create_async()
        .await
}

/// Answer requests for `model` with a successful completion carrying `content`.
pub async fn mock_answer(server: &mut ServerGuard, model: &str, content: &str, hits: usize) -> Mock {
    mock_status(server, model, 200, &chat_body(content), hits).await
}

/// Connection-level faults that a scripted HTTP mock cannot produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Accept the connection and never answer.
    Stall,
    /// Close the connection without a response.
    HangUp,
}

/// Serves one fault per accepted connection, in order. Connections beyond the
/// scripted list stall.
pub struct FaultyProvider {
    pub url: String,
    connections: Arc<AtomicUsize>,
}

impl FaultyProvider {
    pub async fn start(faults: &[Fault]) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let connections = Arc::new(AtomicUsize::new(0));
        let faults = faults.to_vec();

        let counter = connections.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                match faults.get(n).copied().unwrap_or(Fault::Stall) {
                    Fault::HangUp => drop(stream),
                    Fault::Stall => {
                        tokio::spawn(async move {
                            tokio::time::sleep(Duration::from_secs(30)).await;
                            drop(stream);
                        });
                    }
                }
            }
        });

        Self { url, connections }
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

/// An address nothing is listening on.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
