use async_trait::async_trait;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::Level;
use tracing_subscriber;

use scribe_engine::config::EngineConfig;
use scribe_engine::model::{
	Beam, GenerateOptions, GenerationSink, LoadProgress, ModelResult, ProgressFn, RawChunk, SpeechModel, SpeechModelLoader, TimeSpan, TokenDecoder, TokenSpan,
	TranslateOptions, TranslationModel, TranslationModelLoader,
};
use scribe_engine::{TranscriptionOrchestrator, TranslationOrchestrator};
use scribe_events::{TranscribeEvent, TranslateEvent};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	tracing_subscriber::fmt().with_max_level(Level::INFO).with_target(false).init();

	println!("\n🎙️ Scribe Engine Demo\n");

	demo_streaming_transcription().await?;
	demo_busy_rejection().await?;
	demo_translation().await?;

	println!("\n✅ All demos completed!\n");
	Ok(())
}

const SAMPLE_RATE: u32 = 16_000;
const VOCAB: &[&str] = &["the", "quick", "brown", "fox", "jumps", "over", "the", "lazy", "dog", "again"];

/// Scripted stand-in for a real speech model: windows the audio the way
/// a windowed decoder would and emits a small burst of step callbacks
/// before each chunk boundary.
struct DemoSpeechModel;

impl TokenDecoder for DemoSpeechModel {
	fn decode(&self, tokens: &[u32], _skip_special_tokens: bool) -> ModelResult<String> {
		Ok(tokens.iter().map(|t| VOCAB[*t as usize % VOCAB.len()]).collect::<Vec<_>>().join(" "))
	}
}

#[async_trait]
impl SpeechModel for DemoSpeechModel {
	async fn generate(&self, audio: &[f32], opts: &GenerateOptions, sink: &mut dyn GenerationSink) -> ModelResult<()> {
		let duration = audio.len() as f32 / SAMPLE_RATE as f32;
		let mut start = 0.0f32;
		let mut token = 0u32;

		loop {
			let end = (start + opts.window_secs).min(duration);
			for step in 1..=20u32 {
				sink.on_step(&[Beam {
					tokens: (0..step).collect(),
					score: 1.0,
				}]);
				sleep(Duration::from_millis(5)).await;
			}
			let middle = (start + end) / 2.0;
			sink.on_chunk(RawChunk {
				window: TimeSpan::closed(start, end),
				spans: vec![
					TokenSpan::new(vec![token, token + 1], start, Some(middle)),
					TokenSpan::new(vec![token + 2, token + 3], middle, Some(end)),
				],
			});
			token += 4;
			if end >= duration {
				break;
			}
			start = end - opts.stride_secs;
		}
		Ok(())
	}
}

struct DemoSpeechLoader;

#[async_trait]
impl SpeechModelLoader for DemoSpeechLoader {
	async fn load(&self, model_name: &str, progress: ProgressFn) -> ModelResult<Arc<dyn SpeechModel>> {
		let file = format!("{model_name}/encoder.onnx");
		let total = 4096u64;
		progress(LoadProgress::initiate(&file, total));
		for loaded in [1024, 2048, 3072] {
			sleep(Duration::from_millis(20)).await;
			progress(LoadProgress::progress(&file, loaded, total));
		}
		progress(LoadProgress::done(&file, total));
		Ok(Arc::new(DemoSpeechModel))
	}
}

struct DemoTranslationModel;

impl TokenDecoder for DemoTranslationModel {
	fn decode(&self, tokens: &[u32], _skip_special_tokens: bool) -> ModelResult<String> {
		let words = ["bonjour", "le", "monde"];
		Ok(tokens.iter().map(|t| words[*t as usize % words.len()]).collect::<Vec<_>>().join(" "))
	}
}

#[async_trait]
impl TranslationModel for DemoTranslationModel {
	async fn translate(&self, _texts: &[String], _opts: &TranslateOptions, on_step: &mut (dyn for<'a> FnMut(&'a [Beam]) + Send)) -> ModelResult<String> {
		for step in 1..=3u32 {
			let hypotheses = [Beam {
				tokens: (0..step).collect(),
				score: 1.0,
			}];
			on_step(&hypotheses);
			sleep(Duration::from_millis(30)).await;
		}
		self.decode(&[0, 1, 2], true)
	}
}

struct DemoTranslationLoader;

#[async_trait]
impl TranslationModelLoader for DemoTranslationLoader {
	async fn load(&self, model_name: &str, progress: ProgressFn) -> ModelResult<Arc<dyn TranslationModel>> {
		let file = format!("{model_name}/decoder_model.onnx");
		progress(LoadProgress::initiate(&file, 2048));
		progress(LoadProgress::done(&file, 2048));
		Ok(Arc::new(DemoTranslationModel))
	}
}

/// Demo 1: stream 45 seconds of audio through the engine and watch the
/// transcript grow chunk by chunk.
async fn demo_streaming_transcription() -> Result<(), Box<dyn std::error::Error>> {
	println!("🔊 Demo 1: Streaming Transcription");

	let orchestrator = TranscriptionOrchestrator::new(Arc::new(DemoSpeechLoader), EngineConfig::default())?;
	let audio = vec![0.0f32; (45 * SAMPLE_RATE) as usize];
	let mut rx = orchestrator.transcribe(audio, "openai/whisper-tiny.en").await?;

	while let Some(event) = rx.recv().await {
		match &event {
			TranscribeEvent::Downloading(progress) => {
				println!("⬇️  {} {:.0}%", progress.file, progress.progress * 100.0);
			}
			TranscribeEvent::Loading { status } => println!("⚙️  loading: {status:?}"),
			TranscribeEvent::ResultPartial { result } => println!("✏️  partial: {:?}", result.text),
			TranscribeEvent::Result {
				segments,
				is_done,
				completed_until,
			} => {
				println!("📄 transcript ({} segments, done={is_done}, completed_until={completed_until}s):", segments.len());
				for segment in segments {
					println!("   [{:>2}-{:>2}s] {}", segment.start, segment.end, segment.text);
				}
			}
			TranscribeEvent::InferenceDone => println!("🏁 inference done"),
			TranscribeEvent::Failed { stage, message } => println!("💥 failed at {stage:?}: {message}"),
		}
	}

	orchestrator.shutdown().await;
	Ok(())
}

/// Demo 2: a second request while one is in flight is rejected, not
/// queued; the running request finishes untouched.
async fn demo_busy_rejection() -> Result<(), Box<dyn std::error::Error>> {
	println!("\n🚦 Demo 2: One Run At A Time");

	let orchestrator = TranscriptionOrchestrator::new(Arc::new(DemoSpeechLoader), EngineConfig::default())?;
	let audio = vec![0.0f32; (35 * SAMPLE_RATE) as usize];
	let mut rx = orchestrator.transcribe(audio.clone(), "openai/whisper-tiny.en").await?;

	match orchestrator.transcribe(audio, "openai/whisper-tiny.en").await {
		Err(err) => println!("🛑 second request rejected: {err}"),
		Ok(_) => println!("unexpected: second request admitted"),
	}

	let mut events = 0usize;
	while rx.recv().await.is_some() {
		events += 1;
	}
	println!("✔️  first run delivered {events} events untouched");

	orchestrator.shutdown().await;
	Ok(())
}

/// Demo 3: stateful translation with per-step updates.
async fn demo_translation() -> Result<(), Box<dyn std::error::Error>> {
	println!("\n🌍 Demo 3: Translation");

	let orchestrator = TranslationOrchestrator::new(Arc::new(DemoTranslationLoader));
	let mut rx = orchestrator.translate(vec!["hello world".to_string()], "eng_Latn", "fra_Latn").await?;

	while let Some(event) = rx.recv().await {
		match &event {
			TranslateEvent::Initiate { file } => println!("⬇️  fetching {file}"),
			TranslateEvent::Progress { file, progress, .. } => println!("⬇️  {file} {:.0}%", progress * 100.0),
			TranslateEvent::Done { file } => println!("✔️  {file} ready"),
			TranslateEvent::Update { output } => println!("✏️  {output}"),
			TranslateEvent::Complete { output } => println!("🏁 final: {output}"),
			TranslateEvent::Failed { message } => println!("💥 {message}"),
		}
	}

	orchestrator.shutdown().await;
	Ok(())
}
