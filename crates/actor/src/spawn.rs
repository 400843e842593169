use std::future::Future;
use std::sync::OnceLock;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Runtime that actor tasks land on when none is configured.
///
/// Prefers the caller's ambient tokio runtime and falls back to a small
/// process-global multi-thread runtime, so actors can be started from plain
/// threads too.
fn runtime_handle() -> Handle {
	if let Ok(handle) = Handle::try_current() {
		return handle;
	}

	static GLOBAL_RT: OnceLock<tokio::runtime::Runtime> = OnceLock::new();
	let runtime = GLOBAL_RT.get_or_init(|| {
		tokio::runtime::Builder::new_multi_thread()
			.enable_all()
			.worker_threads(2)
			.thread_name("spindle-actor-global")
			.build()
			.expect("failed to build spindle-actor global tokio runtime")
	});
	runtime.handle().clone()
}

/// Launches one actor task on `handle`, or on the default runtime.
pub(crate) fn spawn_actor_task<F>(handle: Option<&Handle>, actor_id: u64, fut: F) -> JoinHandle<F::Output>
where
	F: Future + Send + 'static,
	F::Output: Send + 'static,
{
	tracing::trace!(actor_id, "actor.spawn");
	match handle {
		Some(handle) => handle.spawn(fut),
		None => runtime_handle().spawn(fut),
	}
}
