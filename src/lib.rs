pub mod api;
pub mod article;
pub mod cache;
pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod pdf;
pub mod rate_limit;
pub mod resilience;
pub mod validate;

use std::sync::Arc;

use article::Extraction;
use cache::{ARTICLE_TTL, PDF_TTL, TtlCache};
use config::Config;
use rate_limit::{RateLimiter, WINDOW};

/// Application state shared across handlers: the configuration, one TTL
/// cache per cached route, and the rate limiter. Constructed once at
/// process start and passed by reference from then on.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub articles: Arc<TtlCache<Extraction>>,
    pub pdfs: Arc<TtlCache<Vec<u8>>>,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        AppState {
            config: Arc::new(config),
            articles: Arc::new(TtlCache::new(ARTICLE_TTL)),
            pdfs: Arc::new(TtlCache::new(PDF_TTL)),
            limiter: Arc::new(RateLimiter::new(WINDOW)),
        }
    }
}
