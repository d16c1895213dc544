use serde::Serialize;

/// Normalized article content as rendered into a PDF. The body is plain
/// text with paragraph breaks on newlines; the first non-empty line is
/// the rendering title.
#[derive(Debug, Clone)]
pub struct Article {
    pub title: String,
    pub summary: Option<String>,
    pub body: String,
    pub images: Vec<ArticleImage>,
}

/// An image owned by the article that fetched it. Fetched once,
/// immutable afterwards; dimensions are probed at fetch time.
#[derive(Debug, Clone)]
pub struct ArticleImage {
    pub source_url: String,
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Article {
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty() && !self.body.trim().is_empty()
    }
}

/// Result of extracting a URL: what /fetch returns and caches. Images
/// stay as source URLs here; bytes are only pulled when a PDF needs them.
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    pub title: String,
    pub summary: Option<String>,
    pub body: String,
    pub image_urls: Vec<String>,
}

impl Extraction {
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty() && !self.body.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn article_requires_title_and_body() {
        let article = Article {
            title: "T".to_string(),
            summary: None,
            body: "line".to_string(),
            images: vec![],
        };
        assert!(article.is_valid());

        let untitled = Article { title: "  ".to_string(), ..article.clone() };
        assert!(!untitled.is_valid());

        let empty = Article { body: String::new(), ..article };
        assert!(!empty.is_valid());
    }
}
