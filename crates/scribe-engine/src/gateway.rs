use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info};

use crate::model::ModelResult;

/// Single-flight model cache for one task family, keyed by model name.
///
/// The first caller for a key runs the load; callers arriving while it is
/// in flight wait on the same cell and share the resolved handle. A failed
/// load leaves the cell empty, so the next request retries instead of
/// observing a poisoned cache.
pub struct ModelGateway<M: ?Sized> {
	cells: Mutex<HashMap<String, Arc<OnceCell<Arc<M>>>>>,
}

impl<M: ?Sized> Default for ModelGateway<M> {
	fn default() -> Self {
		Self::new()
	}
}

impl<M: ?Sized> ModelGateway<M> {
	pub fn new() -> Self {
		Self {
			cells: Mutex::new(HashMap::new()),
		}
	}

	/// Fetch the cached handle for `model_name`, or run `load` to create
	/// it. At most one load is in flight per key at any time.
	pub async fn get_or_create<F, Fut>(&self, model_name: &str, load: F) -> ModelResult<Arc<M>>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = ModelResult<Arc<M>>>,
	{
		let cell = {
			let mut cells = self.cells.lock().await;
			Arc::clone(cells.entry(model_name.to_string()).or_default())
		};

		if let Some(handle) = cell.get() {
			debug!(model = model_name, "Model cache hit");
			return Ok(Arc::clone(handle));
		}

		let handle = cell
			.get_or_try_init(|| async {
				info!(model = model_name, "Loading model");
				load().await
			})
			.await?;

		Ok(Arc::clone(handle))
	}

	/// Whether a resolved handle exists for `model_name`.
	pub async fn is_loaded(&self, model_name: &str) -> bool {
		let cells = self.cells.lock().await;
		cells.get(model_name).is_some_and(|cell| cell.initialized())
	}
}

// ============================================================
// Tests
// ============================================================
