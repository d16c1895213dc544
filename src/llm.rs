use std::time::Duration;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use once_cell::sync::Lazy;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AppError, Result};

/// How many prior question/answer turns a conversation handle carries.
const MAX_TURNS: usize = 8;

static CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(60))
        .connect_timeout(Duration::from_secs(5))
        .build()
        .expect("Failed to build LLM HTTP client")
});

#[derive(Serialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message { role: "user".to_string(), content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Message { role: "assistant".to_string(), content: content.into() }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
}

/// Single direct chat-completion call. Provider failures surface their
/// own message so the route layer can pass it through.
pub async fn complete(
    api_url: &str,
    api_key: &str,
    model: &str,
    messages: &[Message],
) -> Result<String> {
    let body = ChatRequest { model, messages };

    let res = CLIENT
        .post(api_url)
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await
        .map_err(AppError::from_llm)?;

    let status = res.status();
    if !status.is_success() {
        let detail = res.text().await.unwrap_or_default();
        let message = provider_message(&detail)
            .unwrap_or_else(|| format!("provider returned {}", status));
        return Err(AppError::Upstream(message));
    }

    let json: serde_json::Value = res.json().await.map_err(AppError::from_llm)?;
    let reply = json["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| AppError::Upstream("Invalid response format from LLM".to_string()))?
        .to_string();

    debug!(model, reply_chars = reply.len(), "completion received");
    Ok(reply)
}

fn provider_message(body: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    json["error"]["message"].as_str().map(str::to_string)
}

/// One question/answer exchange inside a conversation handle.
#[derive(Serialize, Deserialize)]
pub struct Turn {
    pub query: String,
    pub answer: String,
}

/// Conversation state travels with the caller as base64-encoded JSON.
/// The server keeps nothing: it decodes whatever handle comes back,
/// treats it as opaque history, and returns a new handle per answer.
pub fn encode_conversation(turns: &[Turn]) -> String {
    let json = serde_json::to_vec(turns).unwrap_or_default();
    BASE64.encode(json)
}

pub fn decode_conversation(handle: &str) -> Result<Vec<Turn>> {
    let bytes = BASE64
        .decode(handle)
        .map_err(|_| AppError::Validation("malformed conversation handle".to_string()))?;
    serde_json::from_slice(&bytes)
        .map_err(|_| AppError::Validation("malformed conversation handle".to_string()))
}

/// Builds the completion request for a question about an article: the
/// article text rides in the system message, prior turns replay as
/// user/assistant pairs, and the new question comes last.
pub fn build_query_messages(content: &str, turns: &[Turn], query: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(turns.len() * 2 + 2);
    messages.push(Message::system(format!(
        "You answer questions about a single article. Answer only from the \
         article text below; if the article does not contain the answer, say so. \
         Markdown formatting is allowed.\n\nArticle:\n{}",
        content
    )));
    for turn in turns {
        messages.push(Message::user(turn.query.clone()));
        messages.push(Message::assistant(turn.answer.clone()));
    }
    messages.push(Message::user(query.to_string()));
    messages
}

/// Appends the newest turn and drops the oldest beyond the cap.
pub fn extend_conversation(mut turns: Vec<Turn>, query: String, answer: String) -> Vec<Turn> {
    turns.push(Turn { query, answer });
    if turns.len() > MAX_TURNS {
        let excess = turns.len() - MAX_TURNS;
        turns.drain(..excess);
    }
    turns
}
