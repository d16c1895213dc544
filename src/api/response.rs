use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

/// Finished PDF bytes as a file download. The byte stream arrives
/// complete from the assembler; the cursor is at the start.
pub fn pdf_attachment(bytes: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"article.pdf\"",
            ),
        ],
        bytes,
    )
        .into_response()
}
