pub mod error;
pub mod languages;
pub mod models;
pub mod transcribe;
pub mod translate;
pub mod types;

pub use error::CatalogError;
pub use transcribe::TranscribeEvent;
pub use translate::TranslateEvent;
pub use types::{DownloadProgress, FailureStage, LoadingStatus, PartialResult, Segment};
