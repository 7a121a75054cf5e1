/// Decides which raw generation-step callbacks are worth decoding.
///
/// Models fire a callback per sampled token; decoding and emitting text at
/// that rate would drown consumers. The throttle admits every Nth step and
/// the cheap non-admitted steps do no decode work at all.
#[derive(Debug, Clone)]
pub struct PartialResultThrottle {
	every: u32,
	seen: u32,
}

impl PartialResultThrottle {
	/// `every` below 1 is treated as 1 (admit every step).
	pub fn new(every: u32) -> Self {
		Self { every: every.max(1), seen: 0 }
	}

	/// Record one raw callback; true when this step should be decoded.
	pub fn observe(&mut self) -> bool {
		self.seen += 1;
		self.seen % self.every == 0
	}

	/// Raw callbacks recorded so far this run.
	pub const fn seen(&self) -> u32 {
		self.seen
	}
}
