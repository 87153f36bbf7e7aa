use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use tracing::info;

use crate::ai::{
    strip_code_fences, AiError, Content, GenerateRequest, GenerativeClient, Part,
};
use crate::plans::prompts;
use crate::plans::types::MealAnalysis;

/// One uploaded photo, however it arrived.
pub struct ImageUpload {
    pub content_type: String,
    pub bytes: Bytes,
}

/// Send every photo inline, in upload order, with the instruction text
/// last, and parse the returned list. The reply is taken at its word: no
/// check that it has one entry per image.
pub async fn analyze_meal_images(
    ai: &dyn GenerativeClient,
    images: Vec<ImageUpload>,
) -> Result<Vec<MealAnalysis>, AiError> {
    let mut parts: Vec<Part> = images
        .iter()
        .map(|img| Part::InlineImage {
            mime_type: img.content_type.clone(),
            data: STANDARD.encode(&img.bytes),
        })
        .collect();
    parts.push(Part::Text(prompts::meal_analysis()));

    let req = GenerateRequest::from_contents(vec![Content::user_parts(parts)]);
    let raw = ai.generate(req).await?;
    let analyses: Vec<MealAnalysis> = serde_json::from_str(&strip_code_fences(&raw))
        .map_err(|e| AiError::Parse(e.to_string()))?;
    info!(images = images.len(), analyses = analyses.len(), "meal images analyzed");
    Ok(analyses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::ScriptedClient;

    fn upload() -> ImageUpload {
        ImageUpload {
            content_type: "image/jpeg".into(),
            bytes: Bytes::from_static(b"fake image bytes"),
        }
    }

    fn analysis_json() -> &'static str {
        r#"[{"mealName":"Salada de frango","description":"Frango grelhado com alface",
"calories":420,"macros":{"protein":38,"carbs":12,"fat":22}}]"#
    }

    #[tokio::test]
    async fn images_precede_the_instruction_text() {
        let ai = ScriptedClient::replying(&[analysis_json()]);
        analyze_meal_images(&ai, vec![upload(), upload()])
            .await
            .unwrap();

        let requests = ai.requests.lock().unwrap();
        let parts = &requests[0].contents[0].parts;
        assert_eq!(parts.len(), 3);
        match &parts[0] {
            Part::InlineImage { mime_type, data } => {
                assert_eq!(mime_type, "image/jpeg");
                assert_eq!(data, &STANDARD.encode(b"fake image bytes"));
            }
            Part::Text(_) => panic!("expected an image part first"),
        }
        match &parts[2] {
            Part::Text(text) => assert!(text.contains("Analise a(s) imagem(s)")),
            Part::InlineImage { .. } => panic!("expected the instruction last"),
        }
    }

    #[tokio::test]
    async fn parses_a_fenced_reply() {
        let fenced = format!("```json\n{}\n```", analysis_json());
        let ai = ScriptedClient::replying(&[&fenced]);

        let analyses = analyze_meal_images(&ai, vec![upload()]).await.unwrap();
        assert_eq!(analyses.len(), 1);
        assert_eq!(analyses[0].meal_name, "Salada de frango");
        assert_eq!(analyses[0].macros.protein, 38.0);
    }

    #[tokio::test]
    async fn garbage_reply_is_a_parse_error() {
        let ai = ScriptedClient::replying(&["sorry, no idea"]);
        let err = analyze_meal_images(&ai, vec![upload()]).await.unwrap_err();
        assert!(matches!(err, AiError::Parse(_)));
    }
}
