use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex, Semaphore};
use tokio::task::JoinHandle;
use tracing::{error, info};

use scribe_events::models;
use scribe_events::types::{LoadingStatus, PartialResult};
use scribe_events::{FailureStage, TranscribeEvent};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::gateway::ModelGateway;
use crate::model::{Beam, GenerationSink, ModelError, ModelResult, ProgressFn, RawChunk, SpeechModel, SpeechModelLoader};
use crate::progress;
use crate::stitcher::{self, ChunkStitcher};
use crate::throttle::PartialResultThrottle;

/// Lifecycle of a transcription run, observable over a watch channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscribePhase {
	Idle,
	AcquiringModel,
	Ready,
	Running,
	Done,
}

/// Entry point for the speech-to-text path.
///
/// Accepts at most one request at a time: admission is a synchronous
/// permit grab, and a request arriving while another is in flight is
/// rejected, never queued. The accepted request runs on its own task and
/// streams events back through the returned receiver.
pub struct TranscriptionOrchestrator {
	loader: Arc<dyn SpeechModelLoader>,
	gateway: Arc<ModelGateway<dyn SpeechModel>>,
	config: EngineConfig,
	permits: Arc<Semaphore>,
	phase_tx: watch::Sender<TranscribePhase>,
	phase_rx: watch::Receiver<TranscribePhase>,
	task_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl TranscriptionOrchestrator {
	pub fn new(loader: Arc<dyn SpeechModelLoader>, config: EngineConfig) -> Result<Self> {
		config.validate().map_err(EngineError::InvalidRequest)?;
		let (phase_tx, phase_rx) = watch::channel(TranscribePhase::Idle);

		info!("TranscriptionOrchestrator created");

		Ok(Self {
			loader,
			gateway: Arc::new(ModelGateway::new()),
			config,
			permits: Arc::new(Semaphore::new(1)),
			phase_tx,
			phase_rx,
			task_handle: Arc::new(Mutex::new(None)),
		})
	}

	/// Start transcribing `audio` with the named model.
	///
	/// Returns the event stream for this run. Rejects before any worker
	/// activity when the audio is empty, the model is unknown, or another
	/// run is still in flight.
	pub async fn transcribe(&self, audio: Vec<f32>, model_name: &str) -> Result<mpsc::UnboundedReceiver<TranscribeEvent>> {
		if audio.is_empty() {
			return Err(EngineError::InvalidRequest("audio is empty".to_string()));
		}
		let model_name = models::resolve_model(model_name)?.to_string();

		let permit = self
			.permits
			.clone()
			.try_acquire_owned()
			.map_err(|_| EngineError::InvalidRequest("a transcription is already in flight".to_string()))?;

		let (event_tx, event_rx) = mpsc::unbounded_channel();
		let worker = TranscribeWorker {
			gateway: Arc::clone(&self.gateway),
			loader: Arc::clone(&self.loader),
			config: self.config.clone(),
			phase: self.phase_tx.clone(),
			events: event_tx,
		};

		let handle = tokio::spawn(async move {
			// Held until the run finishes; releasing it re-opens admission.
			let _permit = permit;
			worker.run(audio, model_name).await;
		});
		*self.task_handle.lock().await = Some(handle);

		Ok(event_rx)
	}

	pub fn subscribe(&self) -> watch::Receiver<TranscribePhase> {
		self.phase_rx.clone()
	}

	pub fn phase(&self) -> TranscribePhase {
		*self.phase_rx.borrow()
	}

	/// Wait for the in-flight run, if any, to finish. Inference is never
	/// aborted mid-job; shutdown means letting it complete.
	pub async fn shutdown(&self) {
		if let Some(handle) = self.task_handle.lock().await.take() {
			let _ = handle.await;
		}
	}
}

struct TranscribeWorker {
	gateway: Arc<ModelGateway<dyn SpeechModel>>,
	loader: Arc<dyn SpeechModelLoader>,
	config: EngineConfig,
	phase: watch::Sender<TranscribePhase>,
	events: mpsc::UnboundedSender<TranscribeEvent>,
}

impl TranscribeWorker {
	async fn run(self, audio: Vec<f32>, model_name: String) {
		match self.try_run(&audio, &model_name).await {
			Ok(segments) => {
				info!(model = %model_name, segments, "Transcription complete");
			}
			Err(err) => {
				error!(model = %model_name, error = %err, "Transcription failed");
				if matches!(err, EngineError::ModelLoad(_)) {
					self.emit(TranscribeEvent::Loading {
						status: LoadingStatus::Error,
					});
				}
				self.emit(TranscribeEvent::Failed {
					stage: err.stage().unwrap_or(FailureStage::Inference),
					message: err.to_string(),
				});
				self.set_phase(TranscribePhase::Idle);
			}
		}
	}

	async fn try_run(&self, audio: &[f32], model_name: &str) -> Result<usize> {
		self.set_phase(TranscribePhase::AcquiringModel);
		self.emit(TranscribeEvent::Loading {
			status: LoadingStatus::Loading,
		});

		let progress_events = self.events.clone();
		let on_progress: ProgressFn = Arc::new(move |update| {
			let _ = progress_events.send(progress::for_transcription(&update));
		});

		let loader = Arc::clone(&self.loader);
		let model = self
			.gateway
			.get_or_create(model_name, || async move { loader.load(model_name, on_progress).await })
			.await
			.map_err(EngineError::ModelLoad)?;

		self.emit(TranscribeEvent::Loading {
			status: LoadingStatus::Success,
		});
		self.set_phase(TranscribePhase::Ready);

		info!(model = model_name, samples = audio.len(), "Transcription started");
		self.set_phase(TranscribePhase::Running);

		let mut tracker = TranscriptTracker::new(Arc::clone(&model), self.events.clone(), &self.config);
		model
			.generate(audio, &self.config.generate_options(), &mut tracker)
			.await
			.map_err(EngineError::Inference)?;

		let (segments, completed_until) = tracker.finish().map_err(EngineError::Inference)?;
		let count = segments.len();
		self.emit(TranscribeEvent::Result {
			segments,
			is_done: true,
			completed_until,
		});
		self.emit(TranscribeEvent::InferenceDone);
		self.set_phase(TranscribePhase::Done);

		Ok(count)
	}

	fn emit(&self, event: TranscribeEvent) {
		// A consumer that dropped its receiver forfeits the rest of the
		// run; the run itself carries on.
		let _ = self.events.send(event);
	}

	fn set_phase(&self, phase: TranscribePhase) {
		self.phase.send_replace(phase);
	}
}

/// Per-run transcript state fed by the model's generation events: chunk
/// history, stitched view, and the partial-result throttle.
struct TranscriptTracker {
	model: Arc<dyn SpeechModel>,
	events: mpsc::UnboundedSender<TranscribeEvent>,
	stitcher: ChunkStitcher,
	throttle: PartialResultThrottle,
	stride_secs: f32,
	failure: Option<ModelError>,
}

impl TranscriptTracker {
	fn new(model: Arc<dyn SpeechModel>, events: mpsc::UnboundedSender<TranscribeEvent>, config: &EngineConfig) -> Self {
		Self {
			model,
			events,
			stitcher: ChunkStitcher::new(),
			throttle: PartialResultThrottle::new(config.partial_interval),
			stride_secs: config.stride_secs,
			failure: None,
		}
	}

	/// Final stitched view, or the first failure recorded mid-run.
	fn finish(mut self) -> ModelResult<(Vec<scribe_events::Segment>, u64)> {
		if let Some(failure) = self.failure.take() {
			return Err(failure);
		}
		let model = Arc::clone(&self.model);
		let stitched = self.stitcher.restitch(|tokens, skip| model.decode(tokens, skip))?;
		Ok((stitcher::display_segments(&stitched, self.stride_secs), stitcher::completed_until(&stitched)))
	}
}

impl GenerationSink for TranscriptTracker {
	fn on_step(&mut self, beams: &[Beam]) {
		if self.failure.is_some() || !self.throttle.observe() {
			return;
		}
		let Some(best) = beams.first() else {
			return;
		};
		match self.model.decode(&best.tokens, true) {
			Ok(text) => {
				let _ = self.events.send(TranscribeEvent::ResultPartial {
					result: PartialResult { text, start: 0, end: None },
				});
			}
			Err(err) => self.failure = Some(err),
		}
	}

	fn on_chunk(&mut self, chunk: RawChunk) {
		if self.failure.is_some() {
			return;
		}
		self.stitcher.push(chunk);

		let model = Arc::clone(&self.model);
		match self.stitcher.restitch(|tokens, skip| model.decode(tokens, skip)) {
			Ok(stitched) => {
				let _ = self.events.send(TranscribeEvent::Result {
					segments: stitcher::display_segments(&stitched, self.stride_secs),
					is_done: false,
					completed_until: stitcher::completed_until(&stitched),
				});
			}
			Err(err) => self.failure = Some(err),
		}
	}
}
