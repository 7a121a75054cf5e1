use thiserror::Error;

/// Catalog lookups that requests are validated against.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
	#[error("Unknown model: {0}")]
	UnknownModel(String),

	#[error("Invalid language tag: {0}")]
	InvalidLanguageTag(String),
}
