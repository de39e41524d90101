//! Application driver.
//!
//! [`App`] owns a DOM backend, the [`Store`] and the root [`Interface`],
//! and runs one synchronous update cycle per committed snapshot.
//!
//! Event callbacks must not drive the app directly; a callback runs while
//! the DOM backend is dispatching, and re-entering a cycle from there is not
//! supported. Callbacks push state transitions onto the [`StateQueue`]
//! instead, and the owner applies them with [`App::flush`], one cycle per
//! queued transition.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::component::Mounted;
use crate::dom::Dom;
use crate::error::ReconcileResult;
use crate::interface::{Interface, InterfaceSpec};
use crate::state::State;
use crate::store::{PreviousState, Store};

type Transition = Box<dyn FnOnce(&State) -> State>;

/// Shared queue of pending state transitions.
#[derive(Clone, Default)]
pub struct StateQueue {
	pending: Rc<RefCell<VecDeque<Transition>>>,
}

impl StateQueue {
	/// Creates an empty queue.
	pub fn new() -> Self {
		Self::default()
	}

	/// Queues a transition computed from the snapshot current when it runs.
	pub fn push(&self, transition: impl FnOnce(&State) -> State + 'static) {
		self.pending.borrow_mut().push_back(Box::new(transition));
	}

	/// Queues a replacement snapshot.
	pub fn replace(&self, next: State) {
		self.push(move |_| next);
	}

	/// Number of queued transitions.
	pub fn len(&self) -> usize {
		self.pending.borrow().len()
	}

	/// Returns true when nothing is queued.
	pub fn is_empty(&self) -> bool {
		self.pending.borrow().is_empty()
	}

	fn pop(&self) -> Option<Transition> {
		self.pending.borrow_mut().pop_front()
	}
}

impl fmt::Debug for StateQueue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("StateQueue")
			.field("pending", &self.len())
			.finish()
	}
}

/// A mounted application.
pub struct App<D: Dom> {
	dom: D,
	store: Store,
	root: Interface,
	queue: StateQueue,
}

impl<D: Dom> App<D> {
	/// Mounts the root interface built by `build` with `initial` as the first
	/// snapshot.
	pub fn mount(
		mut dom: D,
		initial: State,
		build: impl FnOnce(&State, &StateQueue) -> InterfaceSpec,
	) -> ReconcileResult<Self> {
		let store = Store::new(initial);
		let queue = StateQueue::new();
		let spec = build(store.current(), &queue);
		let root = Interface::mount(&mut dom, spec, store.current())?;
		tracing::debug!(root = %root.name(), "app mounted");
		Ok(Self {
			dom,
			store,
			root,
			queue,
		})
	}

	/// Commits `next` and runs one update cycle.
	pub fn set_state(&mut self, next: State) -> ReconcileResult<()> {
		let cycle = self.store.commit(next);
		self.root.update(&mut self.dom, cycle)
	}

	/// Computes the next snapshot from the current one and runs one cycle.
	pub fn update(&mut self, transition: impl FnOnce(&State) -> State) -> ReconcileResult<()> {
		let next = transition(self.store.current());
		self.set_state(next)
	}

	/// Applies queued transitions in order, one cycle each, including
	/// transitions queued while flushing.
	///
	/// Returns the number of cycles run.
	pub fn flush(&mut self) -> ReconcileResult<usize> {
		let mut cycles = 0;
		while let Some(transition) = self.queue.pop() {
			self.update(transition)?;
			cycles += 1;
		}
		Ok(cycles)
	}

	/// The queue handed to the root builder.
	pub fn queue(&self) -> &StateQueue {
		&self.queue
	}

	/// The current snapshot.
	pub fn state(&self) -> &State {
		self.store.current()
	}

	/// The snapshot history.
	pub fn store(&self) -> &Store {
		&self.store
	}

	/// The root interface.
	pub fn root(&self) -> &Interface {
		&self.root
	}

	/// The DOM backend.
	pub fn dom(&self) -> &D {
		&self.dom
	}

	/// The DOM backend, mutably, e.g. to dispatch events.
	pub fn dom_mut(&mut self) -> &mut D {
		&mut self.dom
	}

	/// Tears the root down and hands the backend back.
	pub fn unmount(mut self) -> ReconcileResult<D> {
		self.root.remove(&mut self.dom)?;
		tracing::debug!(root = %self.root.name(), "app unmounted");
		Ok(self.dom)
	}
}

impl<D: Dom> PreviousState for App<D> {
	fn previous_state(&self) -> &State {
		self.store.previous_state()
	}
}

impl<D: Dom> fmt::Debug for App<D> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("App")
			.field("root", &self.root)
			.field("queue", &self.queue)
			.finish_non_exhaustive()
	}
}
