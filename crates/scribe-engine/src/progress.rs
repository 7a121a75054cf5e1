//! Maps loader progress callbacks onto protocol events.
//!
//! Every callback maps to exactly one event; nothing is dropped or
//! coalesced here. Rate limiting is a consumer concern.

use scribe_events::types::DownloadProgress;
use scribe_events::{TranscribeEvent, TranslateEvent};

use crate::model::{LoadProgress, LoadStage};

fn download_payload(progress: &LoadProgress) -> DownloadProgress {
	let fraction = match progress.stage {
		LoadStage::Initiate => 0.0,
		LoadStage::Progress => progress.progress.clamp(0.0, 1.0),
		LoadStage::Done => 1.0,
	};
	DownloadProgress {
		file: progress.file.clone(),
		progress: fraction,
		loaded: progress.loaded,
		total: progress.total,
	}
}

/// Transcription runs surface every load stage as a DOWNLOADING event.
pub fn for_transcription(progress: &LoadProgress) -> TranscribeEvent {
	TranscribeEvent::Downloading(download_payload(progress))
}

/// Translation runs keep the loader's stage taxonomy on the wire.
pub fn for_translation(progress: &LoadProgress) -> TranslateEvent {
	match progress.stage {
		LoadStage::Initiate => TranslateEvent::Initiate {
			file: progress.file.clone(),
		},
		LoadStage::Progress => {
			let payload = download_payload(progress);
			TranslateEvent::Progress {
				file: payload.file,
				progress: payload.progress,
				loaded: payload.loaded,
				total: payload.total,
			}
		}
		LoadStage::Done => TranslateEvent::Done {
			file: progress.file.clone(),
		},
	}
}
