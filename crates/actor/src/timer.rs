use std::pin::Pin;
use std::time::Duration;

use tokio::time::{Instant, Sleep};

/// Reusable countdown timer owned by one actor call site.
///
/// Re-arming resets the single underlying [`Sleep`] to the new deadline, so a
/// deadline from an earlier arming (elapsed or not, consumed or not) is gone
/// before the new wait starts. A disarmed timer never completes.
pub(crate) struct SuspensionTimer {
	label: &'static str,
	sleep: Option<Pin<Box<Sleep>>>,
	epoch: u64,
	armed: bool,
}

impl SuspensionTimer {
	pub(crate) const fn new(label: &'static str) -> Self {
		Self {
			label,
			sleep: None,
			epoch: 0,
			armed: false,
		}
	}

	/// Arms the timer for `duration` from now and returns the arming epoch.
	///
	/// Must be called from within a tokio runtime.
	pub(crate) fn arm(&mut self, duration: Duration) -> u64 {
		let deadline = deadline_after(duration);
		match self.sleep.as_mut() {
			Some(sleep) => sleep.as_mut().reset(deadline),
			None => self.sleep = Some(Box::pin(tokio::time::sleep_until(deadline))),
		}
		self.epoch = self.epoch.wrapping_add(1);
		self.armed = true;
		tracing::trace!(timer = self.label, epoch = self.epoch, ?duration, "actor.timer.arm");
		self.epoch
	}

	/// Drops the current arming. [`Self::expired`] stays pending until the
	/// next [`Self::arm`].
	pub(crate) fn disarm(&mut self) {
		self.armed = false;
	}

	/// Releases the underlying sleep registration.
	pub(crate) fn shutdown(&mut self) {
		self.armed = false;
		self.sleep = None;
	}

	#[cfg(test)]
	pub(crate) const fn epoch(&self) -> u64 {
		self.epoch
	}

	#[cfg(test)]
	pub(crate) const fn is_armed(&self) -> bool {
		self.armed
	}

	/// Completes when the current arming's deadline passes.
	///
	/// Cancel safe: dropping the future keeps the arming, so the next call
	/// waits for the same deadline.
	pub(crate) async fn expired(&mut self) {
		match self.sleep.as_mut() {
			Some(sleep) if self.armed => {
				sleep.as_mut().await;
				self.armed = false;
			}
			_ => std::future::pending().await,
		}
	}
}

fn deadline_after(duration: Duration) -> Instant {
	// Roughly 30 years, the same horizon tokio uses for "never".
	const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);
	let now = Instant::now();
	now.checked_add(duration.min(FAR_FUTURE)).unwrap_or(now + FAR_FUTURE)
}
