mod layout;

use crate::article::{Article, ArticleImage};
use crate::error::{AppError, Result};

/// Vertical gap after the title heading, in points.
pub const TITLE_GAP_PT: f64 = 12.0;
/// Gap emitted for a blank body line and after each placed image.
pub const PARAGRAPH_GAP_PT: f64 = 6.0;
/// A new image is placed after every line whose index is a multiple of
/// this, until the image queue runs out.
pub const IMAGE_CADENCE: usize = 5;

/// Where images land relative to the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImagePlacement {
    /// One image directly under the title, before the body.
    Lead,
    /// Images interleaved into the body at the fixed cadence.
    Interleaved,
}

/// A discrete layout block consumed by the renderer.
#[derive(Debug)]
pub enum Flowable<'a> {
    Heading(&'a str),
    Paragraph(&'a str),
    /// Vertical gap in points.
    Spacer(f64),
    Image(&'a ArticleImage),
}

/// Turns an article into its flowable sequence. The first non-empty body
/// line renders as the title heading; the image-interleaving walk starts
/// at the line after it, index 0, counting blank lines too.
pub fn plan<'a>(article: &'a Article, placement: ImagePlacement) -> Vec<Flowable<'a>> {
    let lines: Vec<&str> = article.body.lines().collect();
    let Some(title_idx) = lines.iter().position(|l| !l.trim().is_empty()) else {
        return Vec::new();
    };

    let mut flow = vec![
        Flowable::Heading(lines[title_idx].trim()),
        Flowable::Spacer(TITLE_GAP_PT),
    ];

    let mut images = article.images.iter();
    if placement == ImagePlacement::Lead {
        if let Some(image) = images.next() {
            flow.push(Flowable::Image(image));
            flow.push(Flowable::Spacer(PARAGRAPH_GAP_PT));
        }
    }

    for (i, line) in lines[title_idx + 1..].iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            flow.push(Flowable::Spacer(PARAGRAPH_GAP_PT));
        } else {
            flow.push(Flowable::Paragraph(trimmed));
        }

        if placement == ImagePlacement::Interleaved && i % IMAGE_CADENCE == 0 {
            if let Some(image) = images.next() {
                flow.push(Flowable::Image(image));
                flow.push(Flowable::Spacer(PARAGRAPH_GAP_PT));
            }
        }
    }

    flow
}

/// Builds the finished PDF byte stream for an article. Any malformed
/// image fails the whole assembly; there is no partial-document output.
pub fn assemble(article: &Article, placement: ImagePlacement) -> Result<Vec<u8>> {
    let flowables = plan(article, placement);
    if flowables.is_empty() {
        return Err(AppError::Render("article body is empty".to_string()));
    }
    layout::render(&article.title, &flowables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use printpdf::image_crate::{DynamicImage, ImageBuffer, ImageOutputFormat, Rgb};

    fn png_image() -> ArticleImage {
        let buffer = ImageBuffer::from_pixel(4, 4, Rgb([180u8, 40, 40]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(buffer)
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .unwrap();
        ArticleImage {
            source_url: "https://example.com/img.png".to_string(),
            bytes,
            width: 4,
            height: 4,
        }
    }

    fn article(body: &str, images: usize) -> Article {
        Article {
            title: "T".to_string(),
            summary: None,
            body: body.to_string(),
            images: (0..images).map(|_| png_image()).collect(),
        }
    }

    fn tags(flow: &[Flowable]) -> String {
        flow.iter()
            .map(|f| match f {
                Flowable::Heading(_) => 'H',
                Flowable::Paragraph(_) => 'P',
                Flowable::Spacer(_) => 'S',
                Flowable::Image(_) => 'I',
            })
            .collect()
    }

    #[test]
    fn first_flowable_is_the_heading_from_the_body() {
        let article = article("T\nline1\nline2", 0);
        let flow = plan(&article, ImagePlacement::Interleaved);
        assert!(matches!(flow[0], Flowable::Heading("T")));
    }

    #[test]
    fn images_follow_lines_zero_five_ten() {
        // 12 body lines, 3 images: placements after lines 0, 5 and 10.
        let body: String = std::iter::once("T".to_string())
            .chain((0..12).map(|i| format!("l{}", i)))
            .collect::<Vec<_>>()
            .join("\n");
        let article = article(&body, 3);
        let flow = plan(&article, ImagePlacement::Interleaved);

        assert_eq!(tags(&flow), "HSPISPPPPPISPPPPPISP");
        assert_eq!(flow.iter().filter(|f| matches!(f, Flowable::Image(_))).count(), 3);
    }

    #[test]
    fn blank_lines_count_toward_the_cadence() {
        let article = article("T\n\nl1", 1);
        let flow = plan(&article, ImagePlacement::Interleaved);
        // Blank line at index 0 still triggers the insert.
        assert_eq!(tags(&flow), "HSSISP");
    }

    #[test]
    fn image_queue_exhausts_before_the_body_ends() {
        let article = article("T\nl0\nl1\nl2", 5);
        let flow = plan(&article, ImagePlacement::Interleaved);
        // Three lines only reach index 0; the other four images stay unused.
        assert_eq!(flow.iter().filter(|f| matches!(f, Flowable::Image(_))).count(), 1);
    }

    #[test]
    fn no_images_means_no_inserts() {
        let article = article("T\nl0\nl1\nl2\nl3\nl4\nl5", 0);
        let flow = plan(&article, ImagePlacement::Interleaved);
        assert_eq!(tags(&flow), "HSPPPPPP");
    }

    #[test]
    fn lead_placement_puts_one_image_under_the_title() {
        let article = article("T\nl0\nl1\nl2\nl3\nl4\nl5", 2);
        let flow = plan(&article, ImagePlacement::Lead);
        // Image right after the title gap; the cadence never fires, so
        // the second image is unused.
        assert_eq!(tags(&flow), "HSISPPPPPP");
    }

    #[test]
    fn assemble_produces_a_pdf_byte_stream() {
        let body: String = std::iter::once("Headline".to_string())
            .chain((0..10).map(|i| format!("Body line number {} with some words in it.", i)))
            .collect::<Vec<_>>()
            .join("\n");
        let article = article(&body, 2);

        let bytes = assemble(&article, ImagePlacement::Interleaved).unwrap();
        assert!(!bytes.is_empty());
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn malformed_image_bytes_fail_the_whole_assembly() {
        let mut article = article("T\nline1", 0);
        article.images.push(ArticleImage {
            source_url: "https://example.com/broken".to_string(),
            bytes: b"definitely not an image".to_vec(),
            width: 10,
            height: 10,
        });

        let err = assemble(&article, ImagePlacement::Interleaved).unwrap_err();
        assert!(matches!(err, AppError::Render(_)));
    }

    #[test]
    fn empty_body_cannot_be_assembled() {
        let article = article("\n   \n", 0);
        assert!(matches!(
            assemble(&article, ImagePlacement::Interleaved),
            Err(AppError::Render(_))
        ));
    }
}
