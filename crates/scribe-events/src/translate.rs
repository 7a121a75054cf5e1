use serde::{Deserialize, Serialize};
use std::fmt;

/// Events emitted over the lifetime of one translation run.
///
/// Tagged by `status` in lowercase: the load-progress variants keep the
/// shape the upstream pipeline library emits, so they can be forwarded
/// without reshaping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TranslateEvent {
	/// A model asset fetch is starting
	Initiate { file: String },
	/// Download progress for one model asset
	Progress {
		file: String,
		/// Fraction complete in `[0.0, 1.0]`
		progress: f32,
		loaded: u64,
		total: u64,
	},
	/// A model asset finished downloading
	Done { file: String },
	/// Best-hypothesis output so far, one per generation step
	Update { output: String },
	/// Terminal marker carrying the final output
	Complete { output: String },
	/// Terminal marker: the run failed
	Failed { message: String },
}

impl TranslateEvent {
	/// Wire tag for this event, for logging and dispatch
	pub const fn kind(&self) -> &'static str {
		match self {
			Self::Initiate { .. } => "initiate",
			Self::Progress { .. } => "progress",
			Self::Done { .. } => "done",
			Self::Update { .. } => "update",
			Self::Complete { .. } => "complete",
			Self::Failed { .. } => "failed",
		}
	}

	/// Whether this event ends the run
	pub const fn is_terminal(&self) -> bool {
		matches!(self, Self::Complete { .. } | Self::Failed { .. })
	}
}

impl fmt::Display for TranslateEvent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.kind())
	}
}
