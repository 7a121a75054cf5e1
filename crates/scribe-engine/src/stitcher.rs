//! Merges overlapping decode windows into one ordered transcript.
//!
//! Every chunk arrival recomputes the full segment list from the entire
//! chunk history. History stays small (tens of chunks for typical clips)
//! and recomputing keeps the merge a pure function of what arrived, which
//! is what makes the output reproducible.

use tracing::debug;

use scribe_events::Segment;

use crate::model::{ModelResult, RawChunk};

/// Ratio of the stride used to estimate a still-open segment's end.
const PROVISIONAL_END_FACTOR: f32 = 0.9;

/// One merged span of transcript, sub-second precision intact.
#[derive(Debug, Clone, PartialEq)]
pub struct StitchedSegment {
	pub text: String,
	pub start: f32,
	/// None while the window that produced this span is still open
	pub end: Option<f32>,
}

/// Accumulates decode windows and merges them on demand.
#[derive(Debug, Default)]
pub struct ChunkStitcher {
	chunks: Vec<RawChunk>,
}

impl ChunkStitcher {
	pub const fn new() -> Self {
		Self { chunks: Vec::new() }
	}

	pub fn push(&mut self, chunk: RawChunk) {
		self.chunks.push(chunk);
	}

	pub fn chunk_count(&self) -> usize {
		self.chunks.len()
	}

	pub fn is_empty(&self) -> bool {
		self.chunks.is_empty()
	}

	/// Recompute the merged segment list from the full history.
	///
	/// Where consecutive windows overlap, the later window's transcription
	/// wins: a span of chunk `i` is dropped once its start lies at or past
	/// chunk `i+1`'s window start, because the later window re-decoded
	/// that region with more context. Spans that decode to nothing are
	/// dropped too.
	pub fn restitch<F>(&self, mut decode: F) -> ModelResult<Vec<StitchedSegment>>
	where
		F: FnMut(&[u32], bool) -> ModelResult<String>,
	{
		let mut segments = Vec::new();

		for (idx, chunk) in self.chunks.iter().enumerate() {
			let cutoff = self.chunks.get(idx + 1).map(|next| next.window.start);

			for span in &chunk.spans {
				if cutoff.is_some_and(|at| span.start >= at) {
					continue;
				}
				let text = decode(&span.tokens, true)?;
				let text = text.trim();
				if text.is_empty() {
					continue;
				}
				segments.push(StitchedSegment {
					text: text.to_string(),
					start: span.start,
					end: span.end,
				});
			}
		}

		segments.sort_by(|a, b| a.start.total_cmp(&b.start));
		debug!(chunks = self.chunks.len(), segments = segments.len(), "Restitched transcript");
		Ok(segments)
	}
}

/// Round to whole display seconds, ties to even. The worked value the
/// protocol promises for end synthesis (start 10, stride 5 gives 14)
/// only holds under ties-to-even.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn display_seconds(value: f32) -> u64 {
	let rounded = value.round_ties_even();
	if rounded <= 0.0 {
		0
	} else {
		rounded as u64
	}
}

/// Estimated end for a span whose window has not closed yet.
fn provisional_end(start: f32, stride_secs: f32) -> f32 {
	start + PROVISIONAL_END_FACTOR * stride_secs
}

/// Convert merged spans to the wire shape: dense indices, whole-second
/// timestamps, provisional ends synthesized.
pub fn display_segments(stitched: &[StitchedSegment], stride_secs: f32) -> Vec<Segment> {
	stitched
		.iter()
		.enumerate()
		.map(|(index, segment)| Segment {
			index,
			text: segment.text.clone(),
			start: display_seconds(segment.start),
			end: display_seconds(segment.end.unwrap_or_else(|| provisional_end(segment.start, stride_secs))),
		})
		.collect()
}

/// Last timestamp covered by a resolved window, rounded for the wire.
/// Provisional ends do not count; 0 until some window closes.
pub fn completed_until(stitched: &[StitchedSegment]) -> u64 {
	let last = stitched.iter().filter_map(|segment| segment.end).fold(0.0f32, f32::max);
	display_seconds(last)
}

// ============================================================
// Tests
// ============================================================
