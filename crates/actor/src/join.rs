use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::exit::ActorExit;

/// What a joiner finds when it gets the lock.
enum JoinState {
	/// Task still running. The handle never leaves the state, so a joiner
	/// dropped mid-wait leaves it for the next one.
	Running(JoinHandle<ActorExit>),
	/// Task finished.
	Done(ActorExit),
}

/// Join coordination for one actor task.
///
/// Joiners queue on the lock; whoever holds it polls the task handle in
/// place and records the exit for everyone after it. Every join is cancel
/// safe.
pub(crate) struct JoinCtrl {
	state: Mutex<JoinState>,
}

impl JoinCtrl {
	pub(crate) fn new(handle: JoinHandle<ActorExit>) -> Self {
		Self {
			state: Mutex::new(JoinState::Running(handle)),
		}
	}

	/// Waits for the task to finish.
	pub(crate) async fn join_forever(&self) -> ActorExit {
		let mut st = self.state.lock().await;
		let exit = match &mut *st {
			JoinState::Done(exit) => return exit.clone(),
			JoinState::Running(handle) => handle.await.unwrap_or_else(ActorExit::from_join_error),
		};
		*st = JoinState::Done(exit.clone());
		exit
	}

	/// Waits up to `timeout`. Returns `None` if the task is still running.
	pub(crate) async fn join_with_timeout(&self, timeout: Duration) -> Option<ActorExit> {
		tokio::time::timeout(timeout, self.join_forever()).await.ok()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use super::*;
	use crate::exit::ActorExitKind;

	fn finishing_after(delay: Duration, kind: ActorExitKind) -> JoinCtrl {
		JoinCtrl::new(tokio::spawn(async move {
			tokio::time::sleep(delay).await;
			ActorExit::new(kind)
		}))
	}

	#[tokio::test]
	async fn concurrent_joiners_see_the_same_exit() {
		let ctrl = Arc::new(finishing_after(Duration::from_millis(20), ActorExitKind::Completed));

		let joiners: Vec<_> = (0..3)
			.map(|_| {
				let ctrl = Arc::clone(&ctrl);
				tokio::spawn(async move { ctrl.join_forever().await })
			})
			.collect();
		for joiner in joiners {
			assert_eq!(joiner.await.unwrap().kind(), ActorExitKind::Completed);
		}
		assert_eq!(ctrl.join_forever().await.kind(), ActorExitKind::Completed);
	}

	#[tokio::test]
	async fn timed_out_join_keeps_the_handle() {
		let ctrl = finishing_after(Duration::from_millis(100), ActorExitKind::Stopped);

		assert_eq!(ctrl.join_with_timeout(Duration::from_millis(5)).await, None);
		let exit = ctrl.join_with_timeout(Duration::from_secs(2)).await;
		assert_eq!(exit.map(|e| e.kind()), Some(ActorExitKind::Stopped));
	}

	#[tokio::test]
	async fn dropped_leader_does_not_strand_later_joins() {
		let ctrl = finishing_after(Duration::from_millis(30), ActorExitKind::Completed);

		// Holds the lock and is polling the handle when it gets dropped.
		let leader = tokio::time::timeout(Duration::from_millis(5), ctrl.join_forever()).await;
		assert!(leader.is_err());

		let exit = ctrl.join_with_timeout(Duration::from_secs(2)).await;
		assert_eq!(exit.map(|e| e.kind()), Some(ActorExitKind::Completed));
	}

	#[tokio::test]
	async fn dropped_follower_does_not_disturb_the_leader() {
		let ctrl = Arc::new(finishing_after(Duration::from_millis(40), ActorExitKind::Stopped));

		let leader_ctrl = Arc::clone(&ctrl);
		let leader = tokio::spawn(async move { leader_ctrl.join_forever().await });
		tokio::time::sleep(Duration::from_millis(5)).await;

		// Queued behind the leader when it gets dropped.
		let follower = tokio::time::timeout(Duration::from_millis(5), ctrl.join_forever()).await;
		assert!(follower.is_err());

		let led = tokio::time::timeout(Duration::from_secs(2), leader).await.expect("leader should finish").unwrap();
		assert_eq!(led.kind(), ActorExitKind::Stopped);
		let exit = ctrl.join_with_timeout(Duration::from_secs(2)).await;
		assert_eq!(exit.map(|e| e.kind()), Some(ActorExitKind::Stopped));
	}

	#[tokio::test]
	async fn aborted_leader_task_does_not_strand_later_joins() {
		let ctrl = Arc::new(finishing_after(Duration::from_millis(30), ActorExitKind::Completed));

		let leader_ctrl = Arc::clone(&ctrl);
		let leader = tokio::spawn(async move { leader_ctrl.join_forever().await });
		tokio::time::sleep(Duration::from_millis(5)).await;
		leader.abort();
		assert!(leader.await.unwrap_err().is_cancelled());

		let exit = ctrl.join_with_timeout(Duration::from_secs(2)).await;
		assert_eq!(exit.map(|e| e.kind()), Some(ActorExitKind::Completed));
	}

	#[tokio::test]
	async fn panicking_task_settles_as_panicked() {
		let task = tokio::spawn(async {
			if true {
				panic!("join-boom");
			}
			ActorExit::new(ActorExitKind::Completed)
		});
		let exit = JoinCtrl::new(task).join_forever().await;
		assert_eq!(exit.kind(), ActorExitKind::Panicked);
		assert_eq!(exit.message(), Some("join-boom"));
	}
}
