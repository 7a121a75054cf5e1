// tests/engine_lifecycle.rs
// End-to-end runs against scripted models: event ordering, stitching
// across overlapping windows, admission control and failure recovery.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

use scribe_engine::config::EngineConfig;
use scribe_engine::error::EngineError;
use scribe_engine::model::{
	Beam, GenerateOptions, GenerationSink, LoadProgress, ModelError, ModelResult, ProgressFn, RawChunk, SpeechModel, SpeechModelLoader, TimeSpan, TokenDecoder,
	TokenSpan, TranslateOptions, TranslationModel, TranslationModelLoader,
};
use scribe_engine::{TranscribePhase, TranscriptionOrchestrator, TranslatePhase, TranslationOrchestrator};
use scribe_events::types::LoadingStatus;
use scribe_events::{FailureStage, TranscribeEvent, TranslateEvent};

// ============================================================================
// Scripted speech model
// ============================================================================

const VOCAB: &[&str] = &["the", "quick", "brown", "fox", "jumps", "over", "lazy", "dog", "while", "it"];
const SAMPLE_RATE: u32 = 16_000;
const STEPS_PER_WINDOW: u32 = 25;
const WEIGHTS_BYTES: u64 = 4096;

fn spell(tokens: &[u32]) -> String {
	tokens.iter().map(|t| VOCAB[*t as usize % VOCAB.len()]).collect::<Vec<_>>().join(" ")
}

/// Emits the window plan a real windowed decoder would for the given
/// audio: fixed-length windows overlapping by the stride, each preceded
/// by a burst of per-token step callbacks.
struct ScriptedSpeechModel {
	fail_generation: bool,
	step_delay: Duration,
}

impl TokenDecoder for ScriptedSpeechModel {
	fn decode(&self, tokens: &[u32], _skip_special_tokens: bool) -> ModelResult<String> {
		Ok(spell(tokens))
	}
}

fn scripted_chunk(index: u32, start: f32, end: f32) -> RawChunk {
	if index == 0 {
		RawChunk {
			window: TimeSpan::closed(start, end),
			spans: vec![
				TokenSpan::new(vec![0, 1], 0.0, Some(10.0)),
				TokenSpan::new(vec![2, 3], 10.0, Some(25.0)),
				// Re-decoded by the next window; must not survive the merge
				TokenSpan::new(vec![6], 25.0, Some(30.0)),
			],
		}
	} else {
		RawChunk {
			window: TimeSpan::closed(start, end),
			spans: vec![TokenSpan::new(vec![7], 25.0, Some(30.0)), TokenSpan::new(vec![8, 9], 30.0, Some(end))],
		}
	}
}

#[async_trait]
impl SpeechModel for ScriptedSpeechModel {
	async fn generate(&self, audio: &[f32], opts: &GenerateOptions, sink: &mut dyn GenerationSink) -> ModelResult<()> {
		let duration = audio.len() as f32 / SAMPLE_RATE as f32;
		let mut index = 0u32;
		let mut start = 0.0f32;

		loop {
			let end = (start + opts.window_secs).min(duration);
			for step in 1..=STEPS_PER_WINDOW {
				let best = Beam {
					tokens: (0..step).collect(),
					score: 1.0,
				};
				let runner_up = Beam {
					tokens: vec![4],
					score: 0.1,
				};
				sink.on_step(&[best, runner_up]);
				sleep(self.step_delay).await;
			}
			if self.fail_generation && index == 1 {
				return Err(ModelError::Generation("decoder state corrupt".to_string()));
			}
			sink.on_chunk(scripted_chunk(index, start, end));
			if end >= duration {
				break;
			}
			start = end - opts.stride_secs;
			index += 1;
		}
		Ok(())
	}
}

struct ScriptedSpeechLoader {
	fail_next: AtomicBool,
	fail_generation: bool,
	step_delay: Duration,
}

impl ScriptedSpeechLoader {
	fn reliable() -> Self {
		Self {
			fail_next: AtomicBool::new(false),
			fail_generation: false,
			step_delay: Duration::from_millis(0),
		}
	}

	fn failing_once() -> Self {
		Self {
			fail_next: AtomicBool::new(true),
			..Self::reliable()
		}
	}

	fn slow() -> Self {
		Self {
			step_delay: Duration::from_millis(2),
			..Self::reliable()
		}
	}

	fn broken_decoder() -> Self {
		Self {
			fail_generation: true,
			..Self::reliable()
		}
	}
}

#[async_trait]
impl SpeechModelLoader for ScriptedSpeechLoader {
	async fn load(&self, model_name: &str, progress: ProgressFn) -> ModelResult<Arc<dyn SpeechModel>> {
		let file = format!("{model_name}/encoder.onnx");
		progress(LoadProgress::initiate(&file, WEIGHTS_BYTES));
		progress(LoadProgress::progress(&file, WEIGHTS_BYTES / 2, WEIGHTS_BYTES));
		if self.fail_next.swap(false, Ordering::SeqCst) {
			return Err(ModelError::Download {
				file,
				message: "connection reset".to_string(),
			});
		}
		progress(LoadProgress::done(&file, WEIGHTS_BYTES));
		Ok(Arc::new(ScriptedSpeechModel {
			fail_generation: self.fail_generation,
			step_delay: self.step_delay,
		}))
	}
}

// ============================================================================
// Scripted translation model
// ============================================================================

const FRENCH: &[&str] = &["bonjour", "le", "monde"];

struct ScriptedTranslationModel {
	delay: Duration,
}

impl TokenDecoder for ScriptedTranslationModel {
	fn decode(&self, tokens: &[u32], _skip_special_tokens: bool) -> ModelResult<String> {
		Ok(tokens.iter().map(|t| FRENCH[*t as usize % FRENCH.len()]).collect::<Vec<_>>().join(" "))
	}
}

#[async_trait]
impl TranslationModel for ScriptedTranslationModel {
	async fn translate(&self, _texts: &[String], _opts: &TranslateOptions, on_step: &mut (dyn for<'a> FnMut(&'a [Beam]) + Send)) -> ModelResult<String> {
		sleep(self.delay).await;
		for step in 1..=3u32 {
			// Beams live on this stack frame; the callback must accept
			// them without tying the borrow to the whole translate call.
			let hypotheses = [Beam {
				tokens: (0..step).collect(),
				score: 1.0,
			}];
			on_step(&hypotheses);
			sleep(Duration::from_millis(1)).await;
		}
		self.decode(&[0, 1, 2], true)
	}
}

struct ScriptedTranslationLoader {
	delay: Duration,
}

impl ScriptedTranslationLoader {
	fn new() -> Self {
		Self { delay: Duration::from_millis(0) }
	}

	fn slow() -> Self {
		Self { delay: Duration::from_millis(100) }
	}
}

#[async_trait]
impl TranslationModelLoader for ScriptedTranslationLoader {
	async fn load(&self, model_name: &str, progress: ProgressFn) -> ModelResult<Arc<dyn TranslationModel>> {
		let file = format!("{model_name}/decoder_model.onnx");
		progress(LoadProgress::initiate(&file, WEIGHTS_BYTES));
		progress(LoadProgress::progress(&file, WEIGHTS_BYTES, WEIGHTS_BYTES));
		progress(LoadProgress::done(&file, WEIGHTS_BYTES));
		Ok(Arc::new(ScriptedTranslationModel { delay: self.delay }))
	}
}

// ============================================================================
// Helpers
// ============================================================================

fn thirty_five_seconds_of_audio() -> Vec<f32> {
	vec![0.0; (35 * SAMPLE_RATE) as usize]
}

async fn drain_transcribe(mut rx: mpsc::UnboundedReceiver<TranscribeEvent>) -> Vec<TranscribeEvent> {
	let mut events = Vec::new();
	while let Some(event) = rx.recv().await {
		events.push(event);
	}
	events
}

async fn drain_translate(mut rx: mpsc::UnboundedReceiver<TranslateEvent>) -> Vec<TranslateEvent> {
	let mut events = Vec::new();
	while let Some(event) = rx.recv().await {
		events.push(event);
	}
	events
}

fn transcriber(loader: ScriptedSpeechLoader) -> TranscriptionOrchestrator {
	TranscriptionOrchestrator::new(Arc::new(loader), EngineConfig::default()).unwrap()
}

// ============================================================================
// Transcription scenarios
// ============================================================================

#[tokio::test]
async fn lifecycle_events_arrive_in_order() {
	let orchestrator = transcriber(ScriptedSpeechLoader::reliable());
	let rx = orchestrator.transcribe(thirty_five_seconds_of_audio(), "openai/whisper-tiny.en").await.unwrap();
	let events = drain_transcribe(rx).await;

	// SCENARIO: clean run over 35s of audio
	// Invariant: loading bracket first, terminal INFERENCE_DONE last
	assert!(
		matches!(events.first(), Some(TranscribeEvent::Loading { status: LoadingStatus::Loading })),
		"run must open with LOADING loading"
	);
	assert!(matches!(events.last(), Some(TranscribeEvent::InferenceDone)), "run must close with INFERENCE_DONE");

	let download_count = events.iter().filter(|e| e.kind() == "DOWNLOADING").count();
	assert_eq!(download_count, 3, "every loader callback maps to one DOWNLOADING event");

	let success_at = events
		.iter()
		.position(|e| matches!(e, TranscribeEvent::Loading { status: LoadingStatus::Success }))
		.expect("LOADING success must be emitted");
	let first_result = events.iter().position(|e| e.kind() == "RESULT").unwrap();
	assert!(success_at < first_result, "model must be ready before results flow");

	assert_eq!(orchestrator.phase(), TranscribePhase::Done);
}

#[tokio::test]
async fn overlapping_windows_stitch_into_dense_coverage() {
	let orchestrator = transcriber(ScriptedSpeechLoader::reliable());
	let rx = orchestrator.transcribe(thirty_five_seconds_of_audio(), "openai/whisper-tiny.en").await.unwrap();
	let events = drain_transcribe(rx).await;

	// SCENARIO: window 30s / stride 5s over 35s => windows [0,30) and [25,35)
	let cumulative: Vec<_> = events.iter().filter(|e| e.kind() == "RESULT").collect();
	assert_eq!(cumulative.len(), 3, "one RESULT per chunk plus the final snapshot");

	let TranscribeEvent::Result {
		segments,
		is_done,
		completed_until,
	} = cumulative.last().unwrap()
	else {
		panic!("expected RESULT");
	};
	assert!(is_done, "final snapshot must be marked done");
	assert_eq!(*completed_until, 35);

	// Invariant: overlap [25,30) belongs to the later window
	let texts: Vec<&str> = segments.iter().map(|s| s.text.as_str()).collect();
	assert_eq!(texts, vec!["the quick", "brown fox", "dog", "while it"]);
	assert!(!texts.contains(&"lazy"), "first window's overlap decode must be replaced");

	// Invariant: dense indices, contiguous coverage of [0,35)
	for (position, segment) in segments.iter().enumerate() {
		assert_eq!(segment.index, position);
	}
	assert_eq!(segments.first().unwrap().start, 0);
	assert_eq!(segments.last().unwrap().end, 35);
	for pair in segments.windows(2) {
		assert_eq!(pair[0].end, pair[1].start, "no gaps between segments");
	}
}

#[tokio::test]
async fn partials_follow_the_throttle_cadence() {
	let orchestrator = transcriber(ScriptedSpeechLoader::reliable());
	let rx = orchestrator.transcribe(thirty_five_seconds_of_audio(), "openai/whisper-tiny.en").await.unwrap();
	let events = drain_transcribe(rx).await;

	// SCENARIO: 25 steps per window over 2 windows = 50 raw callbacks
	// Invariant: every 10th callback decodes, so exactly 5 partials
	let partials: Vec<_> = events
		.iter()
		.filter_map(|e| match e {
			TranscribeEvent::ResultPartial { result } => Some(result),
			_ => None,
		})
		.collect();

	assert_eq!(partials.len(), 5);
	for partial in &partials {
		assert!(!partial.text.is_empty());
		assert_eq!(partial.start, 0, "partial text grows from the start of the audio");
		assert!(partial.end.is_none(), "partial end stays unresolved");
	}
}

#[tokio::test]
async fn busy_orchestrator_rejects_without_disturbing_the_run() {
	let orchestrator = transcriber(ScriptedSpeechLoader::slow());
	let rx = orchestrator.transcribe(thirty_five_seconds_of_audio(), "openai/whisper-tiny.en").await.unwrap();

	// SCENARIO: second request while the first is in flight
	let second = orchestrator.transcribe(thirty_five_seconds_of_audio(), "openai/whisper-tiny.en").await;
	assert!(matches!(second, Err(EngineError::InvalidRequest(_))), "busy engine must reject, not queue");

	// Invariant: the running request is unaffected by the rejection
	let events = drain_transcribe(rx).await;
	assert!(matches!(events.last(), Some(TranscribeEvent::InferenceDone)));
	assert_eq!(orchestrator.phase(), TranscribePhase::Done);

	// A finished engine accepts again
	let third = orchestrator.transcribe(thirty_five_seconds_of_audio(), "openai/whisper-tiny.en").await;
	assert!(third.is_ok());
	drain_transcribe(third.unwrap()).await;
	orchestrator.shutdown().await;
}

#[tokio::test]
async fn invalid_requests_are_rejected_synchronously() {
	let orchestrator = transcriber(ScriptedSpeechLoader::reliable());

	let empty = orchestrator.transcribe(Vec::new(), "openai/whisper-tiny.en").await;
	assert!(matches!(empty, Err(EngineError::InvalidRequest(_))));

	let unknown = orchestrator.transcribe(thirty_five_seconds_of_audio(), "openai/whisper-gigantic").await;
	assert!(matches!(unknown, Err(EngineError::InvalidRequest(_))));

	// Rejections leave the engine idle and usable
	assert_eq!(orchestrator.phase(), TranscribePhase::Idle);
	let accepted = orchestrator.transcribe(thirty_five_seconds_of_audio(), "").await;
	assert!(accepted.is_ok(), "empty model name falls back to the default checkpoint");
	drain_transcribe(accepted.unwrap()).await;
}

#[tokio::test]
async fn load_failure_reports_and_the_next_request_retries() {
	let orchestrator = transcriber(ScriptedSpeechLoader::failing_once());

	// SCENARIO: first load fails mid-download
	let rx = orchestrator.transcribe(thirty_five_seconds_of_audio(), "openai/whisper-tiny.en").await.unwrap();
	let events = drain_transcribe(rx).await;

	assert!(
		events.iter().any(|e| matches!(e, TranscribeEvent::Loading { status: LoadingStatus::Error })),
		"load failure must surface as LOADING error"
	);
	let Some(TranscribeEvent::Failed { stage, .. }) = events.last() else {
		panic!("run must end with FAILED");
	};
	assert_eq!(*stage, FailureStage::ModelLoad);
	assert_eq!(orchestrator.phase(), TranscribePhase::Idle, "failure returns the engine to idle");

	// Invariant: the failed load is not cached; a retry runs the loader again
	let rx = orchestrator.transcribe(thirty_five_seconds_of_audio(), "openai/whisper-tiny.en").await.unwrap();
	let events = drain_transcribe(rx).await;
	assert!(matches!(events.last(), Some(TranscribeEvent::InferenceDone)), "retry must succeed");
}

#[tokio::test]
async fn generation_failure_keeps_prior_results_valid() {
	let orchestrator = transcriber(ScriptedSpeechLoader::broken_decoder());
	let rx = orchestrator.transcribe(thirty_five_seconds_of_audio(), "openai/whisper-tiny.en").await.unwrap();
	let events = drain_transcribe(rx).await;

	// SCENARIO: the model dies inside the second window
	let results = events.iter().filter(|e| e.kind() == "RESULT").count();
	assert_eq!(results, 1, "the first window's snapshot was already delivered");

	let Some(TranscribeEvent::Failed { stage, .. }) = events.last() else {
		panic!("run must end with FAILED");
	};
	assert_eq!(*stage, FailureStage::Inference);
	assert_eq!(orchestrator.phase(), TranscribePhase::Idle);
}

// ============================================================================
// Translation scenarios
// ============================================================================

#[tokio::test]
async fn translation_streams_updates_then_completes() {
	let orchestrator = TranslationOrchestrator::new(Arc::new(ScriptedTranslationLoader::new()));
	let rx = orchestrator
		.translate(vec!["hello world".to_string()], "eng_Latn", "fra_Latn")
		.await
		.unwrap();
	let events = drain_translate(rx).await;

	// Load progress keeps the loader's taxonomy
	assert_eq!(events.iter().filter(|e| e.kind() == "initiate").count(), 1);
	assert_eq!(events.iter().filter(|e| e.kind() == "done").count(), 1);

	let updates: Vec<&str> = events
		.iter()
		.filter_map(|e| match e {
			TranslateEvent::Update { output } => Some(output.as_str()),
			_ => None,
		})
		.collect();
	assert_eq!(updates, vec!["bonjour", "bonjour le", "bonjour le monde"], "best hypothesis grows step by step");

	let Some(TranslateEvent::Complete { output }) = events.last() else {
		panic!("run must end with complete");
	};
	assert_eq!(output, "bonjour le monde");
	assert_eq!(orchestrator.phase(), TranslatePhase::Done);
}

#[tokio::test]
async fn translation_rejects_bad_input_and_concurrent_runs() {
	let orchestrator = TranslationOrchestrator::new(Arc::new(ScriptedTranslationLoader::slow()));

	let empty = orchestrator.translate(Vec::new(), "eng_Latn", "fra_Latn").await;
	assert!(matches!(empty, Err(EngineError::InvalidRequest(_))));

	let blank = orchestrator.translate(vec![String::new()], "eng_Latn", "fra_Latn").await;
	assert!(matches!(blank, Err(EngineError::InvalidRequest(_))));

	let bad_tag = orchestrator.translate(vec!["hi".to_string()], "english", "fra_Latn").await;
	assert!(matches!(bad_tag, Err(EngineError::InvalidRequest(_))));

	// SCENARIO: request while a run is in flight
	let rx = orchestrator.translate(vec!["hi".to_string()], "eng_Latn", "fra_Latn").await.unwrap();
	let busy = orchestrator.translate(vec!["there".to_string()], "eng_Latn", "spa_Latn").await;
	assert!(matches!(busy, Err(EngineError::InvalidRequest(_))), "one run at a time");

	let events = drain_translate(rx).await;
	assert!(matches!(events.last(), Some(TranslateEvent::Complete { .. })), "running request is unaffected");
	orchestrator.shutdown().await;
}
