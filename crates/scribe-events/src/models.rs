use crate::error::CatalogError;

/// Checkpoint used when a transcription request does not name one.
pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "openai/whisper-tiny.en";

/// Checkpoint backing the translation path.
pub const DEFAULT_TRANSLATION_MODEL: &str = "Xenova/nllb-200-distilled-600M";

/// Whisper checkpoints the engine accepts, smallest first.
pub const WHISPER_MODELS: &[&str] = &[
	"openai/whisper-tiny.en",
	"openai/whisper-tiny",
	"openai/whisper-base.en",
	"openai/whisper-base",
	"openai/whisper-small.en",
	"openai/whisper-small",
];

/// Whether `name` is one of the accepted transcription checkpoints.
pub fn is_known_model(name: &str) -> bool {
	WHISPER_MODELS.contains(&name)
}

/// Resolve a requested model name, falling back to the default when empty.
pub fn resolve_model(name: &str) -> Result<&str, CatalogError> {
	if name.is_empty() {
		return Ok(DEFAULT_TRANSCRIPTION_MODEL);
	}
	if is_known_model(name) {
		Ok(name)
	} else {
		Err(CatalogError::UnknownModel(name.to_string()))
	}
}
