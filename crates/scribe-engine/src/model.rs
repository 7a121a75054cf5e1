use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// Failures surfaced by a model collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
	#[error("Download failed for {file}: {message}")]
	Download { file: String, message: String },

	#[error("Model initialization failed: {0}")]
	Initialization(String),

	#[error("Generation failed: {0}")]
	Generation(String),

	#[error("Token decode failed: {0}")]
	Decode(String),
}

/// Span of seconds on the shared output timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSpan {
	pub start: f32,
	pub end: Option<f32>, // None means the window is still open
}

impl TimeSpan {
	pub const fn new(start: f32, end: Option<f32>) -> Self {
		Self { start, end }
	}

	pub const fn closed(start: f32, end: f32) -> Self {
		Self { start, end: Some(end) }
	}

	pub const fn open(start: f32) -> Self {
		Self { start, end: None }
	}

	pub const fn is_open(&self) -> bool {
		self.end.is_none()
	}

	pub fn overlaps_with(&self, other: &Self) -> bool {
		let self_end = self.end.unwrap_or(f32::INFINITY);
		let other_end = other.end.unwrap_or(f32::INFINITY);
		self.start < other_end && other.start < self_end
	}
}

/// Timestamped run of output token ids inside one decode window.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenSpan {
	pub tokens: Vec<u32>,
	pub start: f32,
	pub end: Option<f32>,
}

impl TokenSpan {
	pub fn new(tokens: Vec<u32>, start: f32, end: Option<f32>) -> Self {
		Self { tokens, start, end }
	}
}

/// One decode window as emitted at a model chunk boundary.
///
/// Consecutive windows overlap by the stride; the engine resolves the
/// overlap, the model does not.
#[derive(Debug, Clone, PartialEq)]
pub struct RawChunk {
	pub window: TimeSpan,
	pub spans: Vec<TokenSpan>,
}

/// One decode hypothesis at a sampling instant. Slices handed to sinks
/// are ordered best-first.
#[derive(Debug, Clone, PartialEq)]
pub struct Beam {
	pub tokens: Vec<u32>,
	pub score: f32,
}

/// Windowing parameters for a generation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerateOptions {
	pub window_secs: f32,
	pub stride_secs: f32,
}

/// Language pair for a translation run, FLORES-200 tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslateOptions {
	pub src_lang: String,
	pub tgt_lang: String,
}

/// Load progress stage reported by a loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
	Initiate,
	Progress,
	Done,
}

/// One loader progress callback: which asset, how far along.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadProgress {
	pub stage: LoadStage,
	pub file: String,
	/// Fraction complete in `[0.0, 1.0]`
	pub progress: f32,
	pub loaded: u64,
	pub total: u64,
}

impl LoadProgress {
	pub fn initiate(file: impl Into<String>, total: u64) -> Self {
		Self {
			stage: LoadStage::Initiate,
			file: file.into(),
			progress: 0.0,
			loaded: 0,
			total,
		}
	}

	pub fn progress(file: impl Into<String>, loaded: u64, total: u64) -> Self {
		let progress = if total == 0 { 0.0 } else { loaded as f32 / total as f32 };
		Self {
			stage: LoadStage::Progress,
			file: file.into(),
			progress,
			loaded,
			total,
		}
	}

	pub fn done(file: impl Into<String>, total: u64) -> Self {
		Self {
			stage: LoadStage::Done,
			file: file.into(),
			progress: 1.0,
			loaded: total,
			total,
		}
	}
}

/// Shared callback loaders report download/initialization progress through.
pub type ProgressFn = Arc<dyn Fn(LoadProgress) + Send + Sync>;

/// Decodes output token ids back to text.
pub trait TokenDecoder {
	fn decode(&self, tokens: &[u32], skip_special_tokens: bool) -> ModelResult<String>;
}

/// Receives raw generation events while an inference call runs.
pub trait GenerationSink: Send {
	/// Called once per sampling step with the current hypotheses
	fn on_step(&mut self, beams: &[Beam]);
	/// Called once per completed decode window
	fn on_chunk(&mut self, chunk: RawChunk);
}

/// Speech-to-text collaborator: owns weights, tokenizer and sampling.
#[async_trait]
pub trait SpeechModel: TokenDecoder + Send + Sync {
	async fn generate(&self, audio: &[f32], opts: &GenerateOptions, sink: &mut dyn GenerationSink) -> ModelResult<()>;
}

/// Text-to-text collaborator for the translation path.
///
/// The step callback is explicitly higher-ranked so implementations can
/// hand it beams they build on their own stack; with the elided form,
/// `async_trait`'s boxed future would pin the borrow to the whole call.
#[async_trait]
pub trait TranslationModel: TokenDecoder + Send + Sync {
	async fn translate(&self, texts: &[String], opts: &TranslateOptions, on_step: &mut (dyn for<'a> FnMut(&'a [Beam]) + Send)) -> ModelResult<String>;
}

/// Factory the gateway calls when a speech model is not cached yet.
#[async_trait]
pub trait SpeechModelLoader: Send + Sync {
	async fn load(&self, model_name: &str, progress: ProgressFn) -> ModelResult<Arc<dyn SpeechModel>>;
}

/// Factory the gateway calls when a translation model is not cached yet.
#[async_trait]
pub trait TranslationModelLoader: Send + Sync {
	async fn load(&self, model_name: &str, progress: ProgressFn) -> ModelResult<Arc<dyn TranslationModel>>;
}
