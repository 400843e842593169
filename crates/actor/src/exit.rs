use tokio::task::JoinError;

/// How an actor task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ActorExitKind {
	/// The body returned normally.
	Completed,
	/// The body unwound through a cancellation checkpoint.
	Stopped,
	/// The body panicked. The panic was not swallowed; it was reported
	/// through the task's join handle.
	Panicked,
	/// The task was dropped before finishing, e.g. by runtime shutdown.
	Aborted,
}

impl ActorExitKind {
	pub(crate) const fn as_str(self) -> &'static str {
		match self {
			Self::Completed => "completed",
			Self::Stopped => "stopped",
			Self::Panicked => "panicked",
			Self::Aborted => "aborted",
		}
	}
}

/// Exit summary for one actor, as seen from outside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorExit {
	kind: ActorExitKind,
	message: Option<String>,
}

impl ActorExit {
	pub(crate) const fn new(kind: ActorExitKind) -> Self {
		Self { kind, message: None }
	}

	pub(crate) fn from_join_error(err: JoinError) -> Self {
		if err.is_cancelled() {
			return Self::new(ActorExitKind::Aborted);
		}
		Self {
			kind: ActorExitKind::Panicked,
			message: join_error_panic_message(err),
		}
	}

	/// How the actor ended.
	pub fn kind(&self) -> ActorExitKind {
		self.kind
	}

	/// Panic message, when the body panicked with a string payload.
	pub fn message(&self) -> Option<&str> {
		self.message.as_deref()
	}

	/// Whether the actor ended by panicking or being aborted.
	pub fn is_failure(&self) -> bool {
		matches!(self.kind, ActorExitKind::Panicked | ActorExitKind::Aborted)
	}
}

/// Extracts the panic payload message from a task join error.
///
/// Returns `None` for cancelled tasks and for non-string payloads.
pub fn join_error_panic_message(err: JoinError) -> Option<String> {
	let payload = err.try_into_panic().ok()?;
	if let Some(msg) = payload.downcast_ref::<&'static str>() {
		return Some((*msg).to_string());
	}
	payload.downcast::<String>().ok().map(|msg| *msg)
}
