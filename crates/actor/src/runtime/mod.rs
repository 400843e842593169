use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::runtime::Handle;

use crate::cell::{ActorCell, ActorShared};
use crate::exit::{ActorExit, ActorExitKind};
use crate::handle::ActorRef;
use crate::id::IdAllocator;
use crate::join::JoinCtrl;
use crate::spawn::spawn_actor_task;
use crate::stop::ActorResult;

/// Name used by [`start`] and [`start_fn`].
pub const DEFAULT_ACTOR_NAME: &str = "default actor";

/// An actor expressed as a type that embeds its own [`ActorCell`].
///
/// ```ignore
/// #[derive(Default)]
/// struct Echo {
///     cell: ActorCell<String>,
/// }
///
/// #[async_trait]
/// impl Starter for Echo {
///     type Msg = String;
///
///     fn embedded(&mut self) -> &mut ActorCell<String> {
///         &mut self.cell
///     }
///
///     async fn start(&mut self) -> ActorResult {
///         loop {
///             let line = self.cell.recv().await?;
///             println!("{line}");
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Starter: Send + 'static {
	/// Mailbox message type.
	type Msg: Send + 'static;

	/// Access to the embedded cell. The runtime replaces it with a live one
	/// before calling [`Self::start`].
	fn embedded(&mut self) -> &mut ActorCell<Self::Msg>;

	/// Actor body.
	async fn start(&mut self) -> ActorResult;
}

/// Start configuration for one actor.
#[derive(Debug, Clone)]
pub struct ActorSpec {
	name: String,
	ids: Option<IdAllocator>,
	runtime: Option<Handle>,
	mailbox_capacity: usize,
}

impl Default for ActorSpec {
	fn default() -> Self {
		Self::new(DEFAULT_ACTOR_NAME)
	}
}

impl ActorSpec {
	/// Creates a spec for an actor called `name`.
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			ids: None,
			runtime: None,
			mailbox_capacity: 16,
		}
	}

	/// Draws the actor id from `ids` instead of [`IdAllocator::global`].
	#[must_use]
	pub fn ids(mut self, ids: IdAllocator) -> Self {
		self.ids = Some(ids);
		self
	}

	/// Runs the actor task on `handle` instead of the ambient runtime.
	#[must_use]
	pub fn runtime(mut self, handle: Handle) -> Self {
		self.runtime = Some(handle);
		self
	}

	/// Preallocates room for `capacity` queued messages. The mailbox stays
	/// unbounded either way.
	#[must_use]
	pub fn mailbox_capacity(mut self, capacity: usize) -> Self {
		self.mailbox_capacity = capacity;
		self
	}

	/// Starts an actor whose body is `body`.
	pub fn spawn_fn<M, F, Fut>(self, body: F) -> ActorRef<M>
	where
		M: Send + 'static,
		F: FnOnce(ActorCell<M>) -> Fut + Send + 'static,
		Fut: Future<Output = ActorResult> + Send + 'static,
	{
		let shared = self.allocate::<M>();
		let cell = ActorCell::attached(Arc::clone(&shared));
		self.launch(shared, async move { body(cell).await })
	}

	/// Starts `starter` as an actor.
	pub fn spawn<S>(self, mut starter: S) -> ActorRef<S::Msg>
	where
		S: Starter,
	{
		let shared = self.allocate::<S::Msg>();
		*starter.embedded() = ActorCell::attached(Arc::clone(&shared));
		self.launch(shared, async move {
			let mut starter = starter;
			starter.start().await
		})
	}

	fn allocate<M>(&self) -> Arc<ActorShared<M>> {
		let id = match &self.ids {
			Some(ids) => ids.next(),
			None => IdAllocator::global().next(),
		};
		Arc::new(ActorShared::new(id, self.name.clone(), self.mailbox_capacity))
	}

	fn launch<M, Fut>(self, shared: Arc<ActorShared<M>>, body: Fut) -> ActorRef<M>
	where
		M: Send + 'static,
		Fut: Future<Output = ActorResult> + Send + 'static,
	{
		tracing::debug!(actor_id = shared.id(), actor = %shared.name(), "actor.start");
		let guard = ExitGuard::new(Arc::clone(&shared));
		let task = spawn_actor_task(self.runtime.as_ref(), shared.id(), async move {
			let mut guard = guard;
			// A panic in `body` unwinds past this point; tokio reports it on
			// the join handle and the guard's drop still runs cleanup.
			let result = body.await;
			guard.settle(result)
		});
		ActorRef::new(shared, JoinCtrl::new(task))
	}
}

/// Runs actor cleanup exactly once, however the task ends.
///
/// Dropped at the end of a normal or stopped exit, and by the runtime when
/// the body panics or the task is aborted.
struct ExitGuard<M> {
	shared: Arc<ActorShared<M>>,
	exit: Option<ActorExitKind>,
}

impl<M> ExitGuard<M> {
	fn new(shared: Arc<ActorShared<M>>) -> Self {
		Self { shared, exit: None }
	}

	/// Classifies a finished body. The cancellation unwind ends here.
	fn settle(&mut self, result: ActorResult) -> ActorExit {
		let kind = match result {
			Ok(()) => ActorExitKind::Completed,
			Err(_stopped) => ActorExitKind::Stopped,
		};
		self.exit = Some(kind);
		ActorExit::new(kind)
	}
}

impl<M> Drop for ExitGuard<M> {
	fn drop(&mut self) {
		self.shared.mark_unwound();
		match self.exit {
			Some(kind) => tracing::debug!(
				actor_id = self.shared.id(),
				actor = %self.shared.name(),
				exit = kind.as_str(),
				"actor.exit"
			),
			None => tracing::debug!(
				actor_id = self.shared.id(),
				actor = %self.shared.name(),
				"actor.exit.unwinding"
			),
		}
	}
}

/// Starts an actor named [`DEFAULT_ACTOR_NAME`] running `body`.
pub fn start_fn<M, F, Fut>(body: F) -> ActorRef<M>
where
	M: Send + 'static,
	F: FnOnce(ActorCell<M>) -> Fut + Send + 'static,
	Fut: Future<Output = ActorResult> + Send + 'static,
{
	ActorSpec::default().spawn_fn(body)
}

/// Starts an actor named `name` running `body`.
pub fn start_fn_named<M, F, Fut>(name: impl Into<String>, body: F) -> ActorRef<M>
where
	M: Send + 'static,
	F: FnOnce(ActorCell<M>) -> Fut + Send + 'static,
	Fut: Future<Output = ActorResult> + Send + 'static,
{
	ActorSpec::new(name).spawn_fn(body)
}

/// Starts `starter` under [`DEFAULT_ACTOR_NAME`].
pub fn start<S: Starter>(starter: S) -> ActorRef<S::Msg> {
	ActorSpec::default().spawn(starter)
}

/// Starts `starter` under `name`.
pub fn start_named<S: Starter>(name: impl Into<String>, starter: S) -> ActorRef<S::Msg> {
	ActorSpec::new(name).spawn(starter)
}
