use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{DownloadProgress, FailureStage, LoadingStatus, PartialResult, Segment};

/// Events emitted over the lifetime of one transcription run.
///
/// The tag spelling matches the browser-worker protocol this engine grew
/// out of, so existing consumers can keep their switch statements.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TranscribeEvent {
	/// Model file download progress (one event per loader callback)
	Downloading(DownloadProgress),
	/// Model load lifecycle: loading, then success or error
	Loading { status: LoadingStatus },
	/// Throttled best-hypothesis text for the in-flight decode
	ResultPartial { result: PartialResult },
	/// Cumulative snapshot of the stitched transcript
	#[serde(rename_all = "camelCase")]
	Result {
		segments: Vec<Segment>,
		is_done: bool,
		/// Last fully-resolved timestamp, whole seconds; 0 until a
		/// window closes
		completed_until: u64,
	},
	/// Terminal marker: the inference call returned
	InferenceDone,
	/// Terminal marker: the run failed at `stage`
	Failed { stage: FailureStage, message: String },
}

impl TranscribeEvent {
	/// Wire tag for this event, for logging and dispatch
	pub const fn kind(&self) -> &'static str {
		match self {
			Self::Downloading(_) => "DOWNLOADING",
			Self::Loading { .. } => "LOADING",
			Self::ResultPartial { .. } => "RESULT_PARTIAL",
			Self::Result { .. } => "RESULT",
			Self::InferenceDone => "INFERENCE_DONE",
			Self::Failed { .. } => "FAILED",
		}
	}

	/// Whether this event ends the run (no further events follow it)
	pub const fn is_terminal(&self) -> bool {
		matches!(self, Self::InferenceDone | Self::Failed { .. })
	}
}

impl fmt::Display for TranscribeEvent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.kind())
	}
}
