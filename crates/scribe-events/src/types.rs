use serde::{Deserialize, Serialize};

/// One stitched span of transcript on the shared timeline.
///
/// Timestamps are whole seconds: rounding happens once, at the event
/// boundary, and sub-second precision stays inside the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
	/// Dense position in the merged transcript, `0..n`
	pub index: usize,
	pub text: String,
	/// Start on the shared timeline, whole seconds
	pub start: u64,
	/// End on the shared timeline, whole seconds. Provisional ends are
	/// already synthesized by the time a segment reaches the wire.
	pub end: u64,
}

/// Best-hypothesis-so-far text for an in-flight decode.
///
/// Partial text always grows from the start of the request's audio, so
/// `start` is 0 and `end` stays unresolved until the run completes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PartialResult {
	pub text: String,
	pub start: u64,
	pub end: Option<u64>,
}

/// Per-file download progress as reported by a model loader.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DownloadProgress {
	/// Model asset being fetched (weights shard, tokenizer file, ...)
	pub file: String,
	/// Fraction complete in `[0.0, 1.0]`
	pub progress: f32,
	/// Bytes received so far
	pub loaded: u64,
	/// Total bytes expected, 0 when the remote does not say
	pub total: u64,
}

/// Model load lifecycle status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LoadingStatus {
	Loading,
	Success,
	Error,
}

/// Which stage of a run a failure event belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
	ModelLoad,
	Inference,
}
