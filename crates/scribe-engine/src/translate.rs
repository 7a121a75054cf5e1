use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex, Semaphore};
use tokio::task::JoinHandle;
use tracing::{error, info};

use scribe_events::{languages, models, TranslateEvent};

use crate::error::{EngineError, Result};
use crate::gateway::ModelGateway;
use crate::model::{Beam, ModelError, ProgressFn, TranslateOptions, TranslationModel, TranslationModelLoader};
use crate::progress;

/// Lifecycle of a translation run, observable over a watch channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslatePhase {
	Idle,
	Running,
	Done,
}

/// Entry point for the text-to-text path.
///
/// Same admission rule as transcription: one run at a time, a concurrent
/// request is rejected synchronously, and each accepted run streams its
/// events through the returned receiver.
pub struct TranslationOrchestrator {
	loader: Arc<dyn TranslationModelLoader>,
	gateway: Arc<ModelGateway<dyn TranslationModel>>,
	permits: Arc<Semaphore>,
	phase_tx: watch::Sender<TranslatePhase>,
	phase_rx: watch::Receiver<TranslatePhase>,
	task_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl TranslationOrchestrator {
	pub fn new(loader: Arc<dyn TranslationModelLoader>) -> Self {
		let (phase_tx, phase_rx) = watch::channel(TranslatePhase::Idle);

		info!("TranslationOrchestrator created");

		Self {
			loader,
			gateway: Arc::new(ModelGateway::new()),
			permits: Arc::new(Semaphore::new(1)),
			phase_tx,
			phase_rx,
			task_handle: Arc::new(Mutex::new(None)),
		}
	}

	/// Translate `texts` between the given FLORES-200 tags.
	///
	/// Rejects before any worker activity when the input is empty, a tag
	/// is malformed, or another run is still in flight. A new run replaces
	/// the previous run's output wholesale.
	pub async fn translate(&self, texts: Vec<String>, src_lang: &str, tgt_lang: &str) -> Result<mpsc::UnboundedReceiver<TranslateEvent>> {
		if texts.is_empty() || texts.iter().any(|text| text.trim().is_empty()) {
			return Err(EngineError::InvalidRequest("nothing to translate".to_string()));
		}
		languages::validate_tag(src_lang)?;
		languages::validate_tag(tgt_lang)?;

		let permit = self
			.permits
			.clone()
			.try_acquire_owned()
			.map_err(|_| EngineError::InvalidRequest("a translation is already in flight".to_string()))?;

		let (event_tx, event_rx) = mpsc::unbounded_channel();
		let worker = TranslateWorker {
			gateway: Arc::clone(&self.gateway),
			loader: Arc::clone(&self.loader),
			phase: self.phase_tx.clone(),
			events: event_tx,
		};
		let opts = TranslateOptions {
			src_lang: src_lang.to_string(),
			tgt_lang: tgt_lang.to_string(),
		};

		let handle = tokio::spawn(async move {
			// Held until the run finishes; releasing it re-opens admission.
			let _permit = permit;
			worker.run(texts, opts).await;
		});
		*self.task_handle.lock().await = Some(handle);

		Ok(event_rx)
	}

	pub fn subscribe(&self) -> watch::Receiver<TranslatePhase> {
		self.phase_rx.clone()
	}

	pub fn phase(&self) -> TranslatePhase {
		*self.phase_rx.borrow()
	}

	/// Wait for the in-flight run, if any, to finish.
	pub async fn shutdown(&self) {
		if let Some(handle) = self.task_handle.lock().await.take() {
			let _ = handle.await;
		}
	}
}

struct TranslateWorker {
	gateway: Arc<ModelGateway<dyn TranslationModel>>,
	loader: Arc<dyn TranslationModelLoader>,
	phase: watch::Sender<TranslatePhase>,
	events: mpsc::UnboundedSender<TranslateEvent>,
}

impl TranslateWorker {
	async fn run(self, texts: Vec<String>, opts: TranslateOptions) {
		match self.try_run(&texts, &opts).await {
			Ok(output) => {
				info!(tgt = %opts.tgt_lang, chars = output.len(), "Translation complete");
			}
			Err(err) => {
				error!(tgt = %opts.tgt_lang, error = %err, "Translation failed");
				self.emit(TranslateEvent::Failed { message: err.to_string() });
				self.set_phase(TranslatePhase::Idle);
			}
		}
	}

	async fn try_run(&self, texts: &[String], opts: &TranslateOptions) -> Result<String> {
		self.set_phase(TranslatePhase::Running);

		let progress_events = self.events.clone();
		let on_progress: ProgressFn = Arc::new(move |update| {
			let _ = progress_events.send(progress::for_translation(&update));
		});

		let loader = Arc::clone(&self.loader);
		let model = self
			.gateway
			.get_or_create(models::DEFAULT_TRANSLATION_MODEL, || async move {
				loader.load(models::DEFAULT_TRANSLATION_MODEL, on_progress).await
			})
			.await
			.map_err(EngineError::ModelLoad)?;

		info!(src = %opts.src_lang, tgt = %opts.tgt_lang, texts = texts.len(), "Translation started");

		let mut step_failure: Option<ModelError> = None;
		let step_events = self.events.clone();
		let step_model = Arc::clone(&model);
		let mut on_step = |beams: &[Beam]| {
			if step_failure.is_some() {
				return;
			}
			let Some(best) = beams.first() else {
				return;
			};
			match step_model.decode(&best.tokens, true) {
				Ok(output) => {
					let _ = step_events.send(TranslateEvent::Update { output });
				}
				Err(err) => step_failure = Some(err),
			}
		};

		let output = model.translate(texts, opts, &mut on_step).await.map_err(EngineError::Inference)?;
		if let Some(failure) = step_failure {
			return Err(EngineError::Inference(failure));
		}

		self.emit(TranslateEvent::Complete { output: output.clone() });
		self.set_phase(TranslatePhase::Done);

		Ok(output)
	}

	fn emit(&self, event: TranslateEvent) {
		let _ = self.events.send(event);
	}

	fn set_phase(&self, phase: TranslatePhase) {
		self.phase.send_replace(phase);
	}
}
