//! Snapshot history.
//!
//! The store keeps exactly two snapshots: the one applied by the last cycle
//! and the one before it. The reconciliation engine never reads the store
//! directly; [`Store::commit`] hands it a [`Cycle`] instead.

use crate::state::{Cycle, State};

/// Read access to the snapshot that preceded the current one.
pub trait PreviousState {
	/// Returns the snapshot immediately prior to the current one.
	fn previous_state(&self) -> &State;
}

/// Holds the previous and current state snapshots.
#[derive(Debug, Clone, Default)]
pub struct Store {
	previous: State,
	current: State,
}

impl Store {
	/// Creates a store whose previous and current snapshots are both `initial`.
	pub fn new(initial: State) -> Self {
		Self {
			previous: initial.clone(),
			current: initial,
		}
	}

	/// Returns the current snapshot.
	pub fn current(&self) -> &State {
		&self.current
	}

	/// Returns the snapshot before the current one.
	pub fn previous(&self) -> &State {
		&self.previous
	}

	/// Installs `next` as the current snapshot and returns the cycle to apply.
	pub fn commit(&mut self, next: State) -> Cycle<'_> {
		self.previous = std::mem::replace(&mut self.current, next);
		Cycle::new(&self.previous, &self.current)
	}

	/// Returns a cycle replaying the current snapshot against the previous one
	/// without committing anything new.
	pub fn replay(&self) -> Cycle<'_> {
		Cycle::new(&self.previous, &self.current)
	}
}

impl PreviousState for Store {
	fn previous_state(&self) -> &State {
		&self.previous
	}
}
