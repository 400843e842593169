//! Actor state and checkpoint operations.

use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::mailbox::{Mailbox, Take};
use crate::stop::{ActorLifecycle, ActorResult, ActorStopped, StopSignal};
use crate::timer::SuspensionTimer;

/// State shared between an actor's task and every [`ActorRef`](crate::ActorRef).
pub(crate) struct ActorShared<M> {
	id: u64,
	name: String,
	mailbox: Mailbox<M>,
	stop: StopSignal,
	unwound: AtomicBool,
}

impl<M> ActorShared<M> {
	pub(crate) fn new(id: u64, name: String, capacity: usize) -> Self {
		Self {
			id,
			name,
			mailbox: Mailbox::new(capacity, true),
			stop: StopSignal::new(),
			unwound: AtomicBool::new(false),
		}
	}

	fn detached() -> Self {
		Self {
			id: 0,
			name: String::new(),
			mailbox: Mailbox::new(0, false),
			stop: StopSignal::new(),
			unwound: AtomicBool::new(false),
		}
	}

	pub(crate) fn id(&self) -> u64 {
		self.id
	}

	pub(crate) fn name(&self) -> &str {
		&self.name
	}

	pub(crate) fn send(&self, msg: M) {
		self.mailbox.push(msg);
	}

	pub(crate) fn is_running(&self) -> bool {
		self.mailbox.is_running()
	}

	/// Clears the running flag and wakes any suspended checkpoint.
	///
	/// Returns `false` if the actor was already stopped.
	pub(crate) fn request_stop(&self) -> bool {
		let was_running = self.mailbox.stop();
		self.stop.fire();
		was_running
	}

	/// Final transition run once by the exit guard after the body is gone.
	pub(crate) fn mark_unwound(&self) {
		self.request_stop();
		self.unwound.store(true, Ordering::Release);
	}

	pub(crate) fn lifecycle(&self) -> ActorLifecycle {
		if self.unwound.load(Ordering::Acquire) {
			ActorLifecycle::Unwound
		} else if self.is_running() {
			ActorLifecycle::Active
		} else {
			ActorLifecycle::StopRequested
		}
	}

	pub(crate) fn pending(&self) -> usize {
		self.mailbox.len()
	}
}

/// The actor's own view of itself, handed to the actor body.
///
/// Every receive, [`pause`](Self::pause) and [`stop`](Self::stop) is a
/// cancellation checkpoint: once the actor has been stopped it returns
/// [`ActorStopped`] instead of a value. Propagate that with `?`.
///
/// A default-constructed cell is detached: id 0, no name, not running. Types
/// implementing [`Starter`](crate::Starter) embed one and the runtime swaps in
/// a live cell at start.
pub struct ActorCell<M> {
	shared: Arc<ActorShared<M>>,
	pause_timer: SuspensionTimer,
	recv_timer: SuspensionTimer,
}

impl<M> Default for ActorCell<M> {
	fn default() -> Self {
		Self::attached(Arc::new(ActorShared::detached()))
	}
}

impl<M> std::fmt::Debug for ActorCell<M> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ActorCell")
			.field("id", &self.shared.id)
			.field("name", &self.shared.name)
			.field("running", &self.shared.is_running())
			.finish_non_exhaustive()
	}
}

impl<M> ActorCell<M> {
	pub(crate) fn attached(shared: Arc<ActorShared<M>>) -> Self {
		Self {
			shared,
			pause_timer: SuspensionTimer::new("pause"),
			recv_timer: SuspensionTimer::new("recv"),
		}
	}

	/// Process-unique id assigned at start.
	pub fn id(&self) -> u64 {
		self.shared.id
	}

	/// Name given at start.
	pub fn name(&self) -> &str {
		&self.shared.name
	}

	/// Whether the actor is still running. Not a checkpoint.
	pub fn is_running(&self) -> bool {
		self.shared.is_running()
	}

	/// Dequeues the oldest message if there is one. Never suspends.
	pub fn recv_immediate(&self) -> ActorResult<Option<M>> {
		match self.shared.mailbox.take() {
			Take::Stopped => Err(ActorStopped::new()),
			Take::Message(msg) => Ok(Some(msg)),
			Take::Empty => Ok(None),
		}
	}

	/// Dequeues the oldest message, waiting for one if the mailbox is empty.
	pub async fn recv(&mut self) -> ActorResult<M> {
		loop {
			let notified = self.shared.mailbox.notified();
			match self.shared.mailbox.take() {
				Take::Stopped => return Err(ActorStopped::new()),
				Take::Message(msg) => return Ok(msg),
				Take::Empty => {}
			}
			tokio::select! {
				biased;
				_ = self.shared.stop.fired() => {}
				_ = notified => {}
			}
		}
	}

	/// Dequeues the oldest message, waiting at most `timeout` for one.
	///
	/// `Duration::ZERO` behaves exactly like [`Self::recv_immediate`].
	/// Returns `Ok(None)` once the timeout passes with nothing queued.
	pub async fn recv_for(&mut self, timeout: Duration) -> ActorResult<Option<M>> {
		if timeout.is_zero() {
			return self.recv_immediate();
		}

		let mut notified = self.shared.mailbox.notified();
		match self.shared.mailbox.take() {
			Take::Stopped => return Err(ActorStopped::new()),
			Take::Message(msg) => return Ok(Some(msg)),
			Take::Empty => {}
		}

		self.recv_timer.arm(timeout);
		loop {
			let timed_out = tokio::select! {
				biased;
				_ = self.shared.stop.fired() => false,
				_ = notified => false,
				_ = self.recv_timer.expired() => true,
			};

			notified = self.shared.mailbox.notified();
			match self.shared.mailbox.take() {
				Take::Stopped => {
					self.recv_timer.disarm();
					return Err(ActorStopped::new());
				}
				Take::Message(msg) => {
					self.recv_timer.disarm();
					return Ok(Some(msg));
				}
				Take::Empty if timed_out => return Ok(None),
				// Woken by a push someone else already consumed; keep the deadline.
				Take::Empty => {}
			}
		}
	}

	/// Suspends the actor for `duration`.
	///
	/// A stop requested meanwhile cuts the pause short and unwinds.
	pub async fn pause(&mut self, duration: Duration) -> ActorResult {
		self.checkpoint()?;
		self.pause_timer.arm(duration);
		tokio::select! {
			biased;
			_ = self.shared.stop.fired() => self.pause_timer.disarm(),
			_ = self.pause_timer.expired() => {}
		}
		self.checkpoint()
	}

	/// Stops the actor from inside its own body.
	///
	/// Always returns `Err`; write `cx.stop()?` and nothing after it runs.
	pub fn stop(&self) -> ActorResult<Infallible> {
		if !self.shared.request_stop() {
			tracing::warn!(
				actor_id = self.shared.id,
				actor = %self.shared.name,
				"actor.stop.self_not_running"
			);
		}
		Err(ActorStopped::new())
	}

	/// Returns [`ActorStopped`] if the actor has been stopped.
	pub fn checkpoint(&self) -> ActorResult {
		if self.shared.is_running() { Ok(()) } else { Err(ActorStopped::new()) }
	}

	/// Tears down both timers. Called on every exit path.
	pub(crate) fn release(&mut self) {
		self.pause_timer.shutdown();
		self.recv_timer.shutdown();
	}
}

impl<M> Drop for ActorCell<M> {
	fn drop(&mut self) {
		self.release();
	}
}

#[cfg(test)]
mod tests {
	use std::time::Instant;

	use super::*;

	fn live_cell<M>() -> ActorCell<M> {
		ActorCell::attached(Arc::new(ActorShared::new(42, "cell-test".into(), 0)))
	}

	#[test]
	fn detached_cell_unwinds_at_every_checkpoint() {
		let cell = ActorCell::<u8>::default();
		assert_eq!(cell.id(), 0);
		assert_eq!(cell.name(), "");
		assert!(!cell.is_running());
		assert!(cell.recv_immediate().is_err());
		assert!(cell.checkpoint().is_err());
	}

	#[test]
	fn recv_immediate_on_empty_returns_none() {
		let cell = live_cell::<u8>();
		assert_eq!(cell.recv_immediate(), Ok(None));
		cell.shared.send(3);
		assert_eq!(cell.recv_immediate(), Ok(Some(3)));
	}

	#[test]
	fn self_stop_always_errs_and_flips_running() {
		let cell = live_cell::<u8>();
		assert!(cell.stop().is_err());
		assert!(!cell.is_running());
		assert_eq!(cell.shared.lifecycle(), ActorLifecycle::StopRequested);
		// Second call hits the misuse diagnostic but still unwinds.
		assert!(cell.stop().is_err());
	}

	#[tokio::test]
	async fn recv_for_zero_matches_recv_immediate() {
		let mut cell = live_cell::<u8>();
		let start = Instant::now();
		assert_eq!(cell.recv_for(Duration::ZERO).await, Ok(None));
		assert!(start.elapsed() < Duration::from_millis(50));

		cell.shared.send(9);
		assert_eq!(cell.recv_for(Duration::ZERO).await, Ok(Some(9)));
		assert_eq!(cell.recv_timer.epoch(), 0, "zero timeout must not arm the timer");
	}

	#[tokio::test(start_paused = true)]
	async fn recv_for_times_out_after_deadline() {
		let mut cell = live_cell::<u8>();
		let start = tokio::time::Instant::now();
		assert_eq!(cell.recv_for(Duration::from_millis(40)).await, Ok(None));
		assert!(start.elapsed() >= Duration::from_millis(40));
	}

	#[tokio::test(start_paused = true)]
	async fn recv_for_ignores_stale_permit() {
		let mut cell = live_cell::<u8>();
		// Leave a wake permit behind with no message to go with it.
		cell.shared.send(1);
		assert_eq!(cell.recv_immediate(), Ok(Some(1)));

		let start = tokio::time::Instant::now();
		assert_eq!(cell.recv_for(Duration::from_millis(25)).await, Ok(None));
		assert!(start.elapsed() >= Duration::from_millis(25), "stale permit ended the wait early");
	}

	#[tokio::test]
	async fn stopped_cell_prefers_unwind_over_queued_message() {
		let mut cell = live_cell::<u8>();
		cell.shared.send(1);
		cell.shared.request_stop();
		assert!(cell.recv().await.is_err());
		assert!(cell.recv_for(Duration::from_millis(10)).await.is_err());
		assert!(cell.pause(Duration::from_millis(10)).await.is_err());
	}

	#[tokio::test(start_paused = true)]
	async fn pause_resumes_after_duration() {
		let mut cell = live_cell::<u8>();
		let start = tokio::time::Instant::now();
		assert_eq!(cell.pause(Duration::from_millis(30)).await, Ok(()));
		assert!(start.elapsed() >= Duration::from_millis(30));
	}
}
