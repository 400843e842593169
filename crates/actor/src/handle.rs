use std::sync::Arc;
use std::time::Duration;

use crate::cell::ActorShared;
use crate::exit::ActorExit;
use crate::join::JoinCtrl;
use crate::stop::ActorLifecycle;

/// Externally held reference to a started actor.
///
/// Clones refer to the same actor. Dropping every handle does not stop the
/// actor.
pub struct ActorRef<M> {
	shared: Arc<ActorShared<M>>,
	join: Arc<JoinCtrl>,
}

impl<M> Clone for ActorRef<M> {
	fn clone(&self) -> Self {
		Self {
			shared: Arc::clone(&self.shared),
			join: Arc::clone(&self.join),
		}
	}
}

impl<M> std::fmt::Debug for ActorRef<M> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ActorRef")
			.field("id", &self.shared.id())
			.field("name", &self.shared.name())
			.field("lifecycle", &self.shared.lifecycle())
			.finish()
	}
}

impl<M> ActorRef<M> {
	pub(crate) fn new(shared: Arc<ActorShared<M>>, join: JoinCtrl) -> Self {
		Self {
			shared,
			join: Arc::new(join),
		}
	}

	/// Puts a message into the actor's mailbox.
	///
	/// Never blocks and never fails. A message sent after the actor
	/// terminated is accepted but never received.
	pub fn send(&self, msg: M) {
		self.shared.send(msg);
	}

	/// Requests the actor to stop.
	///
	/// Does not preempt the actor: it halts at its next checkpoint, and a
	/// checkpoint it is currently suspended in wakes up right away. Stopping
	/// an actor that is no longer running only logs a warning.
	pub fn stop(&self) {
		if !self.shared.request_stop() {
			tracing::warn!(actor_id = self.shared.id(), actor = %self.shared.name(), "actor.stop.ignored");
			return;
		}
		tracing::trace!(actor_id = self.shared.id(), actor = %self.shared.name(), "actor.stop.requested");
	}

	/// Whether the actor is still running.
	pub fn is_running(&self) -> bool {
		self.shared.is_running()
	}

	/// Name given at start.
	pub fn name(&self) -> &str {
		self.shared.name()
	}

	/// Process-unique id.
	pub fn id(&self) -> u64 {
		self.shared.id()
	}

	/// Current cancellation state.
	pub fn lifecycle(&self) -> ActorLifecycle {
		self.shared.lifecycle()
	}

	/// Number of messages sitting in the mailbox.
	pub fn pending(&self) -> usize {
		self.shared.pending()
	}

	/// Waits for the actor task to end and returns how it ended.
	pub async fn join(&self) -> ActorExit {
		self.join.join_forever().await
	}

	/// Like [`Self::join`], giving up after `timeout`.
	pub async fn join_timeout(&self, timeout: Duration) -> Option<ActorExit> {
		self.join.join_with_timeout(timeout).await
	}
}
