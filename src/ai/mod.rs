use std::pin::Pin;

use async_trait::async_trait;
use serde_json::Value;
use tokio_stream::Stream;

pub mod gemini;

pub use gemini::GeminiClient;

/// Incremental text chunks yielded by a streaming generation.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, AiError>> + Send>>;

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("API key rejected by the generative service")]
    InvalidApiKey,
    #[error("generative service rate limited: {0}")]
    RateLimited(String),
    #[error("generative service error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("request to generative service failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unparseable model output: {0}")]
    Parse(String),
    #[error("model returned no content")]
    Empty,
}

/// Conversation role as the generator understands it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// One piece of a turn: plain text or an inline base64-encoded image.
#[derive(Debug, Clone)]
pub enum Part {
    Text(String),
    InlineImage { mime_type: String, data: String },
}

/// A single turn of request content, in conversation order.
#[derive(Debug, Clone)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::Text(text.into())],
        }
    }

    pub fn model_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![Part::Text(text.into())],
        }
    }

    pub fn user_parts(parts: Vec<Part>) -> Self {
        Self {
            role: Role::User,
            parts,
        }
    }
}

/// One generation round trip: ordered contents, an optional system
/// instruction, and an optional declared schema for JSON-constrained output.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    pub system_instruction: Option<String>,
    pub response_schema: Option<Value>,
}

impl GenerateRequest {
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            contents: vec![Content::user_text(prompt)],
            system_instruction: None,
            response_schema: None,
        }
    }

    pub fn from_contents(contents: Vec<Content>) -> Self {
        Self {
            contents,
            system_instruction: None,
            response_schema: None,
        }
    }

    pub fn with_system(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }
}

/// Seam to the external generative API. Handlers and services only see this
/// trait so tests can substitute scripted fakes.
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    /// One-shot generation returning the full response text.
    async fn generate(&self, req: GenerateRequest) -> Result<String, AiError>;

    /// Streaming generation yielding text deltas as they arrive.
    async fn generate_stream(&self, req: GenerateRequest) -> Result<TextStream, AiError>;
}

/// Remove the ```json fences the model sometimes wraps around structured
/// output. This is the only massaging applied before `serde_json` parsing.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

/// User-facing pt-PT description of a generation failure. `context` is the
/// action verb phrase, e.g. "gerar o plano".
pub fn user_message(err: &AiError, context: &str) -> String {
    match err {
        AiError::InvalidApiKey => "A sua chave de API do Gemini parece ser inválida. Por favor, \
verifique o ficheiro .env e certifique-se de que a GEMINI_API_KEY está correta."
            .to_string(),
        other => format!("Ocorreu um erro ao {context}: {other}"),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fences() {
        let fenced = "```json\n[{\"name\":\"Aveia\"}]\n```";
        assert_eq!(strip_code_fences(fenced), "[{\"name\":\"Aveia\"}]");
    }

    #[test]
    fn strips_bare_fences_and_whitespace() {
        assert_eq!(strip_code_fences("```\n{}\n```  "), "{}");
    }

    #[test]
    fn leaves_plain_json_untouched() {
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn invalid_key_gets_its_own_message() {
        let msg = user_message(&AiError::InvalidApiKey, "gerar o plano");
        assert!(msg.contains("GEMINI_API_KEY"));
        assert!(!msg.contains("gerar o plano"));
    }

    #[test]
    fn other_failures_carry_the_context() {
        let msg = user_message(&AiError::Empty, "analisar a imagem");
        assert!(msg.starts_with("Ocorreu um erro ao analisar a imagem:"));
    }
}
