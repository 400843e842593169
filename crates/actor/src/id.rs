use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

/// Monotonic identifier source for actors.
///
/// Clones share one counter, so an allocator can be handed to several
/// [`ActorSpec`](crate::ActorSpec)s and still produce unique ids.
#[derive(Debug, Default, Clone)]
pub struct IdAllocator {
	next: Arc<AtomicU64>,
}

impl IdAllocator {
	/// Creates an allocator whose first id is 1.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the process-wide allocator used when no allocator is configured.
	pub fn global() -> &'static IdAllocator {
		static GLOBAL: OnceLock<IdAllocator> = OnceLock::new();
		GLOBAL.get_or_init(IdAllocator::new)
	}

	/// Returns the next id.
	#[allow(clippy::should_implement_trait, reason = "convention")]
	pub fn next(&self) -> u64 {
		self.next.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use super::*;

	#[test]
	fn starts_at_one_and_increments() {
		let ids = IdAllocator::new();
		assert_eq!(ids.next(), 1);
		assert_eq!(ids.next(), 2);
		assert_eq!(ids.clone().next(), 3);
	}

	#[test]
	fn concurrent_callers_never_share_an_id() {
		let ids = IdAllocator::new();
		let threads: Vec<_> = (0..4)
			.map(|_| {
				let ids = ids.clone();
				std::thread::spawn(move || (0..250).map(|_| ids.next()).collect::<Vec<_>>())
			})
			.collect();

		let mut seen = HashSet::new();
		for thread in threads {
			for id in thread.join().unwrap() {
				assert!(seen.insert(id), "id {id} handed out twice");
			}
		}
		assert_eq!(seen.len(), 1000);
		assert_eq!(ids.next(), 1001);
	}
}
