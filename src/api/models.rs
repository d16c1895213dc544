use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

#[derive(Deserialize)]
pub struct FetchRequest {
    pub url: String,
}

#[derive(Serialize)]
pub struct FetchResponse {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct PdfRequest {
    pub title: String,
    pub content: String,
    /// Image URLs interleaved into the body at the fixed cadence.
    #[serde(default)]
    pub images: Option<Vec<String>>,
    /// Single image rendered directly under the title instead.
    #[serde(default, rename = "imageUrl")]
    pub image_url: Option<String>,
}

#[derive(Deserialize)]
pub struct QueryRequest {
    pub content: String,
    pub query: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, rename = "apiKey")]
    pub api_key: Option<String>,
    /// Opaque handle from a previous response; carries the prior turns.
    #[serde(default)]
    pub conversation: Option<String>,
}

#[derive(Serialize)]
pub struct QueryResponse {
    pub result: String,
    pub conversation: String,
}
