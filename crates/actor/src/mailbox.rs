use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::sync::futures::Notified;

/// Outcome of one non-blocking mailbox check.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Take<M> {
	/// The owning actor is no longer running; nothing is dequeued.
	Stopped,
	/// Head of the queue.
	Message(M),
	/// Running, but nothing queued.
	Empty,
}

struct MailboxState<M> {
	queue: VecDeque<M>,
	running: bool,
}

/// Unbounded FIFO mailbox plus the owning actor's running flag.
///
/// The flag shares the queue's lock so a consumer observes "stopped" and
/// "empty" in one critical section. A stop that lands before the check
/// always wins over a message that lands with it. The lock is never held
/// across an await.
pub(crate) struct Mailbox<M> {
	state: Mutex<MailboxState<M>>,
	wake: Notify,
}

impl<M> Mailbox<M> {
	/// Creates a mailbox. `running` is false for detached actor cells.
	pub(crate) fn new(capacity: usize, running: bool) -> Self {
		Self {
			state: Mutex::new(MailboxState {
				queue: VecDeque::with_capacity(capacity),
				running,
			}),
			wake: Notify::new(),
		}
	}

	/// Enqueues one message and wakes the consumer if it waits.
	///
	/// Never blocks on the consumer and never rejects, even after the actor
	/// terminated.
	pub(crate) fn push(&self, msg: M) {
		self.state.lock().queue.push_back(msg);
		self.wake.notify_one();
	}

	/// Checks the running flag, then the queue, under one lock.
	pub(crate) fn take(&self) -> Take<M> {
		let mut state = self.state.lock();
		if !state.running {
			return Take::Stopped;
		}
		match state.queue.pop_front() {
			Some(msg) => Take::Message(msg),
			None => Take::Empty,
		}
	}

	/// Future completing on the next push.
	///
	/// Create it before calling [`Self::take`] so a push racing the check is
	/// not lost; a push with no registered waiter leaves a permit behind.
	pub(crate) fn notified(&self) -> Notified<'_> {
		self.wake.notified()
	}

	pub(crate) fn is_running(&self) -> bool {
		self.state.lock().running
	}

	/// Clears the running flag and wakes the consumer.
	///
	/// Returns whether the flag was set before the call.
	pub(crate) fn stop(&self) -> bool {
		let was_running = std::mem::replace(&mut self.state.lock().running, false);
		self.wake.notify_waiters();
		was_running
	}

	/// Number of queued messages.
	pub(crate) fn len(&self) -> usize {
		self.state.lock().queue.len()
	}
}
