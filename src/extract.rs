use std::collections::HashSet;
use std::time::Duration;
use once_cell::sync::Lazy;
use printpdf::image_crate::GenericImageView;
use reqwest::{Client, ClientBuilder, Url, header};
use scraper::{Html, Selector};
use tracing::{debug, warn};

use crate::article::{ArticleImage, Extraction};
use crate::error::{AppError, Result};

/// Most images a single /generate_pdf request will fetch; anything past
/// the cap is logged and dropped.
pub const MAX_PDF_IMAGES: usize = 10;

const SUMMARY_MAX_SENTENCES: usize = 3;
const SUMMARY_MAX_CHARS: usize = 400;

// Create a static client to reuse connections
static CLIENT: Lazy<Client> = Lazy::new(|| {
    ClientBuilder::new()
        .timeout(Duration::from_secs(10))
        .connect_timeout(Duration::from_secs(5))
        .pool_max_idle_per_host(10)
        .build()
        .expect("Failed to build HTTP client")
});

// Create static selectors to avoid recompiling them each time
static OG_TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"meta[property="og:title"]"#).expect("Failed to parse og:title selector")
});
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("Failed to parse title selector"));
static H1_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1").expect("Failed to parse h1 selector"));
static ARTICLE_P_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article p").expect("Failed to parse article p selector"));
static P_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("Failed to parse p selector"));
static ARTICLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article").expect("Failed to parse article selector"));
static IMG_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img").expect("Failed to parse img selector"));

pub async fn fetch_html(url: &str) -> Result<String> {
    let response = CLIENT.get(url).send().await.map_err(AppError::from_fetch)?;
    let status = response.status();
    if !status.is_success() {
        return Err(AppError::Extraction(format!(
            "upstream returned {} for {}",
            status, url
        )));
    }
    let html = response.text().await.map_err(AppError::from_fetch)?;
    Ok(html)
}

/// Parses fetched HTML into the normalized article record. Fails when no
/// meaningful title or body text can be found.
pub fn extract_article(url: &str, html: &str) -> Result<Extraction> {
    let document = Html::parse_document(html);

    let title = extract_title(&document)
        .ok_or_else(|| AppError::Extraction("no title found in page".to_string()))?;

    // Prefer paragraphs scoped to an <article> element when one exists;
    // full-page <p> soup is the fallback.
    let scoped = document.select(&ARTICLE_SELECTOR).next().is_some();
    let selector = if scoped { &ARTICLE_P_SELECTOR } else { &P_SELECTOR };
    let paragraphs: Vec<String> = document
        .select(selector)
        .map(|p| p.text().collect::<String>().trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    let body = paragraphs.join("\n");

    let extraction = Extraction {
        summary: summarize(&body),
        image_urls: extract_image_urls(url, &document),
        title,
        body,
    };

    if !extraction.is_valid() {
        return Err(AppError::Extraction(
            "failed to extract meaningful content from the page".to_string(),
        ));
    }

    debug!(
        title = %extraction.title,
        paragraphs = paragraphs.len(),
        images = extraction.image_urls.len(),
        "extracted article"
    );
    Ok(extraction)
}

fn extract_title(document: &Html) -> Option<String> {
    let og = document
        .select(&OG_TITLE_SELECTOR)
        .next()
        .and_then(|m| m.value().attr("content"))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    if og.is_some() {
        return og;
    }

    let titled = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());
    if titled.is_some() {
        return titled;
    }

    document
        .select(&H1_SELECTOR)
        .next()
        .map(|h| h.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Lead-sentence summary of the body text, capped at a few sentences.
fn summarize(body: &str) -> Option<String> {
    let mut summary = String::new();
    let mut sentences = 0;
    for (i, c) in body.char_indices() {
        if c == '\n' {
            break;
        }
        summary.push(c);
        if matches!(c, '.' | '!' | '?') {
            sentences += 1;
            if sentences >= SUMMARY_MAX_SENTENCES || i >= SUMMARY_MAX_CHARS {
                break;
            }
        }
        if summary.len() >= SUMMARY_MAX_CHARS {
            break;
        }
    }
    let summary = summary.trim().to_string();
    if summary.is_empty() { None } else { Some(summary) }
}

/// Collects absolute image URLs in document order. SVG sources and
/// data: URIs are excluded because the PDF renderer cannot embed them.
fn extract_image_urls(base_url: &str, document: &Html) -> Vec<String> {
    let base = match Url::parse(base_url) {
        Ok(base) => base,
        Err(_) => return Vec::new(),
    };

    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    for img in document.select(&IMG_SELECTOR) {
        let Some(src) = img.value().attr("src").or_else(|| img.value().attr("data-src"))
        else {
            continue;
        };
        if src.starts_with("data:") {
            continue;
        }
        let Ok(resolved) = base.join(src) else { continue };
        if resolved.path().to_ascii_lowercase().ends_with(".svg") {
            continue;
        }
        let resolved = resolved.to_string();
        if seen.insert(resolved.clone()) {
            urls.push(resolved);
        }
    }
    urls
}

/// Fetches one image and probes its pixel dimensions by decoding it.
pub async fn fetch_image(url: &str) -> Result<ArticleImage> {
    let response = CLIENT.get(url).send().await.map_err(AppError::from_fetch)?;
    let status = response.status();
    if !status.is_success() {
        return Err(AppError::Extraction(format!(
            "image fetch returned {} for {}",
            status, url
        )));
    }
    if let Some(content_type) = response.headers().get(header::CONTENT_TYPE) {
        if content_type.to_str().unwrap_or("").contains("svg") {
            return Err(AppError::Extraction(format!("svg image not supported: {}", url)));
        }
    }
    let bytes = response.bytes().await.map_err(AppError::from_fetch)?.to_vec();
    let decoded = printpdf::image_crate::load_from_memory(&bytes)
        .map_err(|e| AppError::Extraction(format!("undecodable image {}: {}", url, e)))?;
    let (width, height) = decoded.dimensions();

    Ok(ArticleImage {
        source_url: url.to_string(),
        bytes,
        width,
        height,
    })
}

/// Best-effort batch fetch: failures are logged and the image dropped,
/// never surfaced to the caller.
pub async fn fetch_images(urls: &[String], max: usize) -> Vec<ArticleImage> {
    if urls.len() > max {
        warn!(listed = urls.len(), max, "too many images requested, truncating");
    }
    let mut images = Vec::new();
    for url in urls.iter().take(max) {
        match fetch_image(url).await {
            Ok(image) => images.push(image),
            Err(e) => warn!(url = %url, error = %e, "image fetch failed, dropping image"),
        }
    }
    images
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html>
          <head>
            <title>Fallback Title</title>
            <meta property="og:title" content="A Proper Headline" />
          </head>
          <body>
            <article>
              <h1>A Proper Headline</h1>
              <p>First paragraph. It has two sentences.</p>
              <p></p>
              <p>Second paragraph.</p>
              <img src="/img/photo.png" />
              <img src="/img/photo.png" />
              <img src="/img/vector.svg" />
              <img src="data:image/png;base64,AAAA" />
            </article>
            <p>Footer boilerplate outside the article.</p>
          </body>
        </html>"#;

    #[test]
    fn extracts_title_body_and_images() {
        let extraction = extract_article("https://example.com/story", PAGE).unwrap();
        assert_eq!(extraction.title, "A Proper Headline");
        assert_eq!(
            extraction.body,
            "First paragraph. It has two sentences.\nSecond paragraph."
        );
        // Only the article paragraphs, not the footer.
        assert!(!extraction.body.contains("boilerplate"));
        // Deduplicated, absolute, svg and data: excluded.
        assert_eq!(
            extraction.image_urls,
            vec!["https://example.com/img/photo.png".to_string()]
        );
    }

    #[test]
    fn summary_takes_leading_sentences() {
        let extraction = extract_article("https://example.com/story", PAGE).unwrap();
        assert_eq!(
            extraction.summary.as_deref(),
            Some("First paragraph. It has two sentences.")
        );
    }

    #[test]
    fn empty_pages_are_an_extraction_error() {
        let err = extract_article("https://example.com", "<html><body></body></html>")
            .unwrap_err();
        assert!(matches!(err, AppError::Extraction(_)));

        let titled_only = "<html><head><title>T</title></head><body></body></html>";
        let err = extract_article("https://example.com", titled_only).unwrap_err();
        assert!(matches!(err, AppError::Extraction(_)));
    }
}
