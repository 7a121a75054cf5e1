use crate::model::GenerateOptions;

/// Engine-wide defaults, shared by both orchestrator families.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
	/// Decode window length in seconds
	pub window_secs: f32,
	/// Overlap between consecutive windows in seconds
	pub stride_secs: f32,
	/// Emit a partial result every Nth generation step
	pub partial_interval: u32,
	/// Expected input sample rate
	pub sample_rate_hz: u32,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			window_secs: 30.0,
			stride_secs: 5.0,
			partial_interval: 10,
			sample_rate_hz: 16_000,
		}
	}
}

impl EngineConfig {
	pub fn validate(&self) -> Result<(), String> {
		if self.stride_secs <= 0.0 {
			return Err(format!("stride_secs must be positive, got {}", self.stride_secs));
		}
		if self.window_secs <= self.stride_secs {
			return Err(format!(
				"window_secs ({}) must exceed stride_secs ({})",
				self.window_secs, self.stride_secs
			));
		}
		if self.partial_interval == 0 {
			return Err("partial_interval must be at least 1".to_string());
		}
		if self.sample_rate_hz == 0 {
			return Err("sample_rate_hz must be positive".to_string());
		}
		Ok(())
	}

	pub const fn generate_options(&self) -> GenerateOptions {
		GenerateOptions {
			window_secs: self.window_secs,
			stride_secs: self.stride_secs,
		}
	}
}
