//! Streaming transcription engine: model lifecycle, chunk stitching and
//! partial-result flow control behind two single-request orchestrators.

pub mod config;
pub mod error;
pub mod gateway;
pub mod model;
pub mod progress;
pub mod stitcher;
pub mod throttle;
pub mod transcribe;
pub mod translate;

pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use gateway::ModelGateway;
pub use throttle::PartialResultThrottle;
pub use transcribe::{TranscribePhase, TranscriptionOrchestrator};
pub use translate::{TranslatePhase, TranslationOrchestrator};
