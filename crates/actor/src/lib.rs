//! Mailbox actors with cooperative, checkpoint-based cancellation.
//!
//! Each actor is one tokio task running a body against its [`ActorCell`]:
//! * [`ActorCell`]: the actor's own side; receive, pause and self-stop
//! * [`ActorRef`]: the shared external handle; send, stop, status, join
//! * [`ActorSpec`] / [`start_fn`] / [`start`]: launching actors
//!
//! Stopping is cooperative. [`ActorRef::stop`] flips the actor's running flag
//! and wakes it if it is suspended; the body notices at its next checkpoint,
//! which returns [`ActorStopped`]. Propagating that with `?` ends the body,
//! and the runtime treats it as a normal stop. Panics are never swallowed.
//!
//! ```ignore
//! let echo = spindle_actor::start_fn_named("echo", |mut cx| async move {
//!     loop {
//!         let msg: u32 = cx.recv().await?;
//!         println!("{} got {msg}", cx.name());
//!     }
//! });
//! echo.send(1);
//! echo.stop();
//! ```

mod cell;
mod exit;
mod handle;
mod id;
mod join;
mod mailbox;
mod runtime;
mod spawn;
mod stop;
mod timer;

pub use cell::ActorCell;
pub use exit::{ActorExit, ActorExitKind, join_error_panic_message};
pub use handle::ActorRef;
pub use id::IdAllocator;
pub use runtime::{ActorSpec, DEFAULT_ACTOR_NAME, Starter, start, start_fn, start_fn_named, start_named};
pub use stop::{ActorLifecycle, ActorResult, ActorStopped};
