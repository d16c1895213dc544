use std::net::SocketAddr;
use axum::{
    Router,
    extract::{ConnectInfo, Json, State},
    response::Response,
    routing::post,
};
use chrono::Utc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::AppState;
use crate::api::models::{FetchRequest, FetchResponse, PdfRequest, QueryRequest, QueryResponse};
use crate::api::response::pdf_attachment;
use crate::article::{Article, Extraction};
use crate::cache::cache_key;
use crate::error::{AppError, Result};
use crate::extract::{MAX_PDF_IMAGES, extract_article, fetch_html, fetch_images};
use crate::llm;
use crate::pdf::{self, ImagePlacement};
use crate::rate_limit::{FETCH_QUOTA, PDF_QUOTA, QUERY_QUOTA};
use crate::resilience::{RetryPolicy, resilient, with_retry};
use crate::validate;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/fetch", post(fetch_handler))
        .route("/generate_pdf", post(generate_pdf_handler))
        .route("/query", post(query_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

async fn fetch_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<FetchRequest>,
) -> Result<Json<FetchResponse>> {
    if !state.limiter.allow(addr.ip(), "fetch", FETCH_QUOTA) {
        return Err(AppError::RateLimited);
    }

    let url = req.url.trim();
    info!(%url, client = %addr.ip(), "fetch request");

    let key = cache_key("fetch", &[url]);
    let extraction = resilient(
        &state.articles,
        &key,
        validate::validate_url(url),
        &RetryPolicy::default(),
        || fetch_and_extract(url),
    )
    .await?;

    Ok(Json(FetchResponse {
        title: extraction.title,
        summary: extraction.summary,
        content: extraction.body,
        images: extraction.image_urls,
        fetched_at: Utc::now(),
    }))
}

async fn fetch_and_extract(url: &str) -> Result<Extraction> {
    let html = fetch_html(url).await?;
    extract_article(url, &html)
}

async fn generate_pdf_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<PdfRequest>,
) -> Result<Response> {
    if !state.limiter.allow(addr.ip(), "generate_pdf", PDF_QUOTA) {
        return Err(AppError::RateLimited);
    }

    let title = req.title.trim().to_string();
    info!(%title, client = %addr.ip(), "pdf request");

    // A single imageUrl selects the lead-image variant; an images list
    // interleaves at the fixed cadence.
    let (image_urls, placement) = match (&req.image_url, &req.images) {
        (Some(url), _) if !url.trim().is_empty() => {
            (vec![url.trim().to_string()], ImagePlacement::Lead)
        }
        (_, Some(urls)) => (
            urls.iter()
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty())
                .collect(),
            ImagePlacement::Interleaved,
        ),
        _ => (Vec::new(), ImagePlacement::Interleaved),
    };

    let validation = validate::validate_title(&title)
        .and_then(|_| validate::validate_content(&req.content))
        .and_then(|_| {
            image_urls
                .iter()
                .try_for_each(|u| validate::validate_url(u))
        });

    let mut key_parts: Vec<&str> = vec![
        &title,
        &req.content,
        match placement {
            ImagePlacement::Lead => "lead",
            ImagePlacement::Interleaved => "interleaved",
        },
    ];
    key_parts.extend(image_urls.iter().map(String::as_str));
    let key = cache_key("generate_pdf", &key_parts);

    let bytes = resilient(
        &state.pdfs,
        &key,
        validation,
        &RetryPolicy::default(),
        || build_pdf(&title, &req.content, &image_urls, placement),
    )
    .await?;

    Ok(pdf_attachment(bytes))
}

async fn build_pdf(
    title: &str,
    content: &str,
    image_urls: &[String],
    placement: ImagePlacement,
) -> Result<Vec<u8>> {
    // Image fetches are best-effort: failures are logged inside and the
    // image dropped. Malformed bytes that survive the probe still fail
    // the assembly as a whole.
    let images = fetch_images(image_urls, MAX_PDF_IMAGES).await;
    let article = Article {
        title: title.to_string(),
        summary: None,
        body: content.to_string(),
        images,
    };
    pdf::assemble(&article, placement)
}

async fn query_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    if !state.limiter.allow(addr.ip(), "query", QUERY_QUOTA) {
        return Err(AppError::RateLimited);
    }

    validate::validate_content(&req.content)?;
    validate::validate_query(&req.query)?;
    let model = req.model.as_deref().unwrap_or(&state.config.llm_model);
    validate::validate_model(model)?;

    let api_key = req
        .api_key
        .clone()
        .or_else(|| state.config.api_key.clone())
        .ok_or_else(|| {
            AppError::Validation("no API key provided or configured".to_string())
        })?;

    let turns = match &req.conversation {
        Some(handle) => llm::decode_conversation(handle)?,
        None => Vec::new(),
    };

    info!(%model, turns = turns.len(), client = %addr.ip(), "query request");

    let messages = llm::build_query_messages(&req.content, &turns, &req.query);
    let answer = with_retry(&RetryPolicy::default(), || {
        llm::complete(&state.config.llm_api_url, &api_key, model, &messages)
    })
    .await?;

    let turns = llm::extend_conversation(turns, req.query, answer.clone());
    Ok(Json(QueryResponse {
        result: answer,
        conversation: llm::encode_conversation(&turns),
    }))
}
