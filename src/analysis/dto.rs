use serde::Deserialize;

/// JSON alternative to the multipart upload.
#[derive(Debug, Deserialize)]
pub struct AnalyzeBase64Request {
    pub images_b64: Vec<String>,
    pub content_type: Option<String>, // applies to every image; default image/jpeg
}
