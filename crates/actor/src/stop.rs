//! Cooperative cancellation.
//!
//! Stopping an actor never preempts it. A stop request flips the actor's
//! running flag and fires a [`StopSignal`]; the actor notices at its next
//! checkpoint, which returns [`ActorStopped`] instead of a value. Bodies
//! propagate that error with `?`, which abandons the rest of the body while
//! still running `Drop` cleanup on the way out.

use tokio_util::sync::CancellationToken;

/// Cancellation unwind raised by actor checkpoints once the actor is stopped.
///
/// Only this crate can construct it. The runtime treats it as the one
/// expected way for a body to end early and swallows it; any panic still
/// propagates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("actor stopped")]
pub struct ActorStopped {
	_private: (),
}

impl ActorStopped {
	pub(crate) const fn new() -> Self {
		Self { _private: () }
	}
}

/// Result of an actor checkpoint or actor body.
pub type ActorResult<T = ()> = Result<T, ActorStopped>;

/// Observable cancellation state of one actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorLifecycle {
	/// The actor is running and has not been asked to stop.
	Active,
	/// A stop was requested, or the body returned, and the task has not
	/// finished its cleanup yet.
	StopRequested,
	/// The actor task has run its cleanup and ended.
	Unwound,
}

/// Level-triggered stop pulse shared by the actor task and its handles.
///
/// The running flag itself lives next to the mailbox queue (see
/// [`Mailbox`](crate::mailbox::Mailbox)); this signal only wakes suspended
/// checkpoints so they re-check it.
#[derive(Debug, Clone, Default)]
pub(crate) struct StopSignal {
	token: CancellationToken,
}

impl StopSignal {
	pub(crate) fn new() -> Self {
		Self::default()
	}

	/// Wakes every current and future waiter.
	pub(crate) fn fire(&self) {
		self.token.cancel();
	}

	/// Resolves once [`Self::fire`] has been called.
	pub(crate) async fn fired(&self) {
		self.token.cancelled().await;
	}
}
