use thiserror::Error;

use crate::model::ModelError;
use scribe_events::{CatalogError, FailureStage};

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
	#[error("Model load failed: {0}")]
	ModelLoad(#[source] ModelError),

	#[error("Inference failed: {0}")]
	Inference(#[source] ModelError),

	#[error("Invalid request: {0}")]
	InvalidRequest(String),
}

impl EngineError {
	/// Which protocol failure stage this error reports as. Invalid
	/// requests never reach a worker, so they carry no stage.
	pub const fn stage(&self) -> Option<FailureStage> {
		match self {
			Self::ModelLoad(_) => Some(FailureStage::ModelLoad),
			Self::Inference(_) => Some(FailureStage::Inference),
			Self::InvalidRequest(_) => None,
		}
	}
}

impl From<CatalogError> for EngineError {
	fn from(err: CatalogError) -> Self {
		Self::InvalidRequest(err.to_string())
	}
}
