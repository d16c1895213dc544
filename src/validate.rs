use reqwest::Url;
use crate::error::{AppError, Result};

/// Hard ceiling on submitted article text, measured in encoded bytes.
pub const MAX_CONTENT_BYTES: usize = 100 * 1024;
pub const MAX_URL_BYTES: usize = 2048;
pub const MAX_TITLE_BYTES: usize = 512;
pub const MAX_QUERY_BYTES: usize = 2048;
pub const MAX_MODEL_BYTES: usize = 128;

pub fn validate_url(url: &str) -> Result<()> {
    if url.trim().is_empty() {
        return Err(AppError::Validation("url must not be empty".to_string()));
    }
    if url.len() > MAX_URL_BYTES {
        return Err(AppError::Validation(format!(
            "url exceeds {} bytes",
            MAX_URL_BYTES
        )));
    }
    let parsed = Url::parse(url)
        .map_err(|e| AppError::Validation(format!("invalid url: {}", e)))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(AppError::Validation(format!(
                "unsupported url scheme: {}",
                other
            )));
        }
    }
    if parsed.host_str().map_or(true, |h| h.is_empty()) {
        return Err(AppError::Validation("url has no host".to_string()));
    }
    Ok(())
}

pub fn validate_content(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(AppError::Validation("content must not be empty".to_string()));
    }
    if content.len() > MAX_CONTENT_BYTES {
        return Err(AppError::Validation(format!(
            "content exceeds {} bytes",
            MAX_CONTENT_BYTES
        )));
    }
    Ok(())
}

pub fn validate_title(title: &str) -> Result<()> {
    bounded("title", title, MAX_TITLE_BYTES)
}

pub fn validate_query(query: &str) -> Result<()> {
    bounded("query", query, MAX_QUERY_BYTES)
}

pub fn validate_model(model: &str) -> Result<()> {
    bounded("model", model, MAX_MODEL_BYTES)
}

fn bounded(what: &str, value: &str, max: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", what)));
    }
    if value.len() > max {
        return Err(AppError::Validation(format!(
            "{} exceeds {} bytes",
            what, max
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_scheme_and_host() {
        assert!(validate_url("https://example.com/article").is_ok());
        assert!(validate_url("http://example.com").is_ok());
        assert!(validate_url("ftp://example.com").is_err());
        assert!(validate_url("file:///etc/passwd").is_err());
        assert!(validate_url("not a url").is_err());
        assert!(validate_url("").is_err());
    }

    #[test]
    fn content_boundary_is_exact() {
        let exactly = "a".repeat(MAX_CONTENT_BYTES);
        assert!(validate_content(&exactly).is_ok());

        let over = "a".repeat(MAX_CONTENT_BYTES + 1);
        assert!(validate_content(&over).is_err());

        assert!(validate_content("   \n ").is_err());
    }

    #[test]
    fn free_form_bounds() {
        assert!(validate_title("A headline").is_ok());
        assert!(validate_title(&"t".repeat(MAX_TITLE_BYTES + 1)).is_err());
        assert!(validate_query("what is this about?").is_ok());
        assert!(validate_query("").is_err());
        assert!(validate_model("openai/gpt-3.5-turbo").is_ok());
        assert!(validate_model(&"m".repeat(MAX_MODEL_BYTES + 1)).is_err());
    }
}
