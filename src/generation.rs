use crate::gemini::{preview, sniff_image_type, GeminiError, ImageGenerator};
use thiserror::Error;
use tracing::{error, info, warn};

pub const EMPTY_PROMPT_MESSAGE: &str = "الوصف لا يمكن أن يكون فارغًا";
pub const NO_IMAGE_MESSAGE: &str = "لم يتم توليد صورة";

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("{}", EMPTY_PROMPT_MESSAGE)]
    EmptyPrompt,
    #[error("{0}")]
    InvalidBody(String),
    #[error("{}", NO_IMAGE_MESSAGE)]
    NoImage,
    #[error(transparent)]
    Service(#[from] GeminiError),
}

/// Runs one prompt through the generator and returns the first candidate's
/// base64 image payload.
pub async fn generate(generator: &dyn ImageGenerator, prompt: &str) -> Result<String, GenerateError> {
    if prompt.trim().is_empty() {
        warn!("⚠️ Rejected empty prompt");
        return Err(GenerateError::EmptyPrompt);
    }

    info!("🎯 Generating image for prompt: {}", prompt.chars().take(100).collect::<String>());

    let response = generator.generate_content(prompt).await.map_err(|e| {
        error!("❌ Failed to generate image: {}", e);
        GenerateError::Service(e)
    })?;

    let Some(candidate) = response.candidates.first() else {
        warn!("⚠️ Gemini returned no candidates");
        return Err(GenerateError::NoImage);
    };

    let image = candidate.inline_image().ok_or_else(|| {
        error!("❌ First candidate carried no inline data");
        GeminiError::MissingInlineData
    })?;

    info!(
        "🖼️ Extracted {} image ({}): {}",
        sniff_image_type(&image.data),
        image.mime_type,
        preview(&image.data)
    );
    Ok(image.data.clone())
}
