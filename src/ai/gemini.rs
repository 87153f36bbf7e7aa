use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, instrument, warn};

use super::{AiError, Content, GenerateRequest, GenerativeClient, Part, TextStream};
use crate::config::AiConfig;

/// HTTP client for the Gemini generative API.
pub struct GeminiClient {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(config: &AiConfig) -> Self {
        Self {
            http: Client::new(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}?key={}",
            self.base_url, self.model, method, self.api_key
        )
    }

    fn wire_request(req: &GenerateRequest) -> WireRequest {
        let contents = req
            .contents
            .iter()
            .map(|c| WireContent {
                role: Some(c.role.as_str().to_string()),
                parts: c.parts.iter().map(WirePart::from).collect(),
            })
            .collect();

        let system_instruction = req.system_instruction.as_ref().map(|text| WireContent {
            role: None,
            parts: vec![WirePart::Text { text: text.clone() }],
        });

        // A declared schema implies JSON-constrained output.
        let generation_config = req.response_schema.as_ref().map(|schema| WireGenerationConfig {
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(schema.clone()),
        });

        WireRequest {
            contents,
            system_instruction,
            generation_config,
        }
    }

    fn map_api_error(status: u16, body: &str) -> AiError {
        let message = serde_json::from_str::<WireResponse>(body)
            .ok()
            .and_then(|r| r.error)
            .map(|e| e.message)
            .unwrap_or_else(|| body.to_string());

        if message.contains("API key not valid") || message.contains("API_KEY_INVALID") {
            return AiError::InvalidApiKey;
        }
        match status {
            429 => AiError::RateLimited(message),
            _ => AiError::Api { status, message },
        }
    }

    fn extract_text(resp: &WireResponse) -> Result<String, AiError> {
        let text = candidate_text(resp);
        if text.is_empty() {
            return Err(AiError::Empty);
        }
        Ok(text)
    }
}

#[async_trait]
impl GenerativeClient for GeminiClient {
    #[instrument(skip(self, req), fields(model = %self.model))]
    async fn generate(&self, req: GenerateRequest) -> Result<String, AiError> {
        let url = self.url("generateContent");
        let body = Self::wire_request(&req);

        debug!("sending generation request");
        let response = self.http.post(&url).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            error!(status = %status, "generative API error");
            return Err(Self::map_api_error(status.as_u16(), &text));
        }

        let parsed: WireResponse = serde_json::from_str(&text).map_err(|e| {
            error!(error = %e, "unparseable generative API response");
            AiError::Parse(e.to_string())
        })?;
        if let Some(err) = parsed.error {
            return Err(AiError::Api {
                status: status.as_u16(),
                message: err.message,
            });
        }

        Self::extract_text(&parsed)
    }

    #[instrument(skip(self, req), fields(model = %self.model))]
    async fn generate_stream(&self, req: GenerateRequest) -> Result<TextStream, AiError> {
        let url = self.url("streamGenerateContent");
        let body = Self::wire_request(&req);

        debug!("starting streaming generation request");
        let response = self
            .http
            .post(&url)
            .query(&[("alt", "sse")])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(status = %status, "generative API stream rejected");
            return Err(Self::map_api_error(status.as_u16(), &text));
        }

        let stream = async_stream::stream! {
            let mut bytes = response.bytes_stream();
            let mut lines = SseLineBuffer::new();
            while let Some(chunk) = bytes.next().await {
                match chunk {
                    Ok(chunk) => {
                        for data in lines.feed(&chunk) {
                            match parse_stream_data(&data) {
                                Some(delta) if !delta.is_empty() => yield Ok(delta),
                                Some(_) => {}
                                None => warn!("skipping unparseable stream event"),
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(AiError::Http(e));
                        return;
                    }
                }
            }
            for data in lines.flush() {
                if let Some(delta) = parse_stream_data(&data) {
                    if !delta.is_empty() {
                        yield Ok(delta);
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

/// Text of the first candidate, with multi-part responses concatenated.
fn candidate_text(resp: &WireResponse) -> String {
    resp.candidates
        .as_ref()
        .and_then(|c| c.first())
        .and_then(|c| c.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|p| match p {
                    WirePart::Text { text } => Some(text.as_str()),
                    WirePart::InlineData { .. } => None,
                })
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// Extract the text delta of one SSE `data:` payload. `None` means the event
/// did not parse as a response chunk.
fn parse_stream_data(data: &str) -> Option<String> {
    let resp: WireResponse = serde_json::from_str(data).ok()?;
    Some(candidate_text(&resp))
}

/// Line-buffering SSE reader: TCP chunks align with neither event boundaries
/// nor UTF-8 character boundaries, so raw bytes are held back and only
/// complete lines are decoded.
struct SseLineBuffer {
    buffer: Vec<u8>,
}

impl SseLineBuffer {
    fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Feed one TCP chunk; returns the `data:` payloads of every complete line.
    fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(data) = extract_data(&String::from_utf8_lossy(&line)) {
                events.push(data);
            }
        }
        events
    }

    /// Drain a trailing line that arrived without a final newline.
    fn flush(&mut self) -> Vec<String> {
        let rest = std::mem::take(&mut self.buffer);
        extract_data(&String::from_utf8_lossy(&rest))
            .into_iter()
            .collect()
    }
}

fn extract_data(line: &str) -> Option<String> {
    let data = line.trim().strip_prefix("data: ")?;
    if data.trim().is_empty() {
        return None;
    }
    Some(data.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_request() -> GenerateRequest {
        GenerateRequest::from_prompt("Cria um plano para hoje.")
            .with_system("És um assistente.")
            .with_schema(serde_json::json!({"type": "OBJECT"}))
    }

    #[test]
    fn wire_request_shape() {
        let wire = GeminiClient::wire_request(&text_request());
        let json = serde_json::to_value(&wire).unwrap();

        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Cria um plano para hoje.");
        // System instruction carries no role.
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(
            json["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(json["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn wire_request_inline_image() {
        let req = GenerateRequest::from_contents(vec![Content::user_parts(vec![
            Part::InlineImage {
                mime_type: "image/jpeg".into(),
                data: "QUJD".into(),
            },
            Part::Text("Analisa a imagem.".into()),
        ])]);
        let json = serde_json::to_value(GeminiClient::wire_request(&req)).unwrap();

        assert_eq!(
            json["contents"][0]["parts"][0]["inlineData"]["mimeType"],
            "image/jpeg"
        );
        assert_eq!(json["contents"][0]["parts"][1]["text"], "Analisa a imagem.");
        assert!(json.get("generationConfig").is_none());
    }

    #[test]
    fn candidate_text_concatenates_parts() {
        let resp: WireResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Olá"},{"text":" mundo"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(candidate_text(&resp), "Olá mundo");
    }

    #[test]
    fn map_api_error_detects_invalid_key() {
        let body = r#"{"error":{"message":"API key not valid. Please pass a valid API key."}}"#;
        assert!(matches!(
            GeminiClient::map_api_error(400, body),
            AiError::InvalidApiKey
        ));
    }

    #[test]
    fn map_api_error_rate_limit() {
        let body = r#"{"error":{"message":"Resource has been exhausted"}}"#;
        assert!(matches!(
            GeminiClient::map_api_error(429, body),
            AiError::RateLimited(_)
        ));
    }

    #[test]
    fn line_buffer_handles_split_events() {
        let mut buf = SseLineBuffer::new();
        assert!(buf.feed(b"data: {\"a\":").is_empty());
        let events = buf.feed(b"1}\ndata: {\"b\":2}\n");
        assert_eq!(events, vec!["{\"a\":1}".to_string(), "{\"b\":2}".to_string()]);
    }

    #[test]
    fn line_buffer_flushes_trailing_line() {
        let mut buf = SseLineBuffer::new();
        assert!(buf.feed(b"data: {\"a\":1}").is_empty());
        assert_eq!(buf.flush(), vec!["{\"a\":1}".to_string()]);
    }

    #[test]
    fn line_buffer_keeps_multibyte_chars_split_across_chunks() {
        let payload = "data: {\"texto\":\"Olá\"}\n".as_bytes();
        // Cut between the two bytes of 'á'.
        let cut = payload.len() - 4;
        assert_eq!(payload[cut - 1], 0xC3);

        let mut buf = SseLineBuffer::new();
        assert!(buf.feed(&payload[..cut]).is_empty());
        let events = buf.feed(&payload[cut..]);
        assert_eq!(events, vec!["{\"texto\":\"Olá\"}".to_string()]);
    }

    #[test]
    fn line_buffer_skips_non_data_lines() {
        let mut buf = SseLineBuffer::new();
        let events = buf.feed(b": comment\nevent: ping\n\ndata: {\"x\":1}\n");
        assert_eq!(events, vec!["{\"x\":1}".to_string()]);
    }

    #[test]
    fn parse_stream_data_extracts_delta() {
        let data = r#"{"candidates":[{"content":{"parts":[{"text":"Bom dia"}]}}]}"#;
        assert_eq!(parse_stream_data(data).as_deref(), Some("Bom dia"));
        assert!(parse_stream_data("not json").is_none());
    }
}

// --- wire structures ---

#[derive(Debug, Serialize)]
struct WireRequest {
    contents: Vec<WireContent>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<WireGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<WirePart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum WirePart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: WireInlineData,
    },
}

impl From<&Part> for WirePart {
    fn from(part: &Part) -> Self {
        match part {
            Part::Text(text) => WirePart::Text { text: text.clone() },
            Part::InlineImage { mime_type, data } => WirePart::InlineData {
                inline_data: WireInlineData {
                    mime_type: mime_type.clone(),
                    data: data.clone(),
                },
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    candidates: Option<Vec<WireCandidate>>,
    error: Option<WireError>,
}

#[derive(Debug, Deserialize)]
struct WireCandidate {
    content: Option<WireContent>,
}

#[derive(Debug, Deserialize)]
struct WireError {
    message: String,
}
