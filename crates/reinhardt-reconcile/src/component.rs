//! Mounted component handles.
//!
//! Every mounted subtree is represented by a [`Mounted`] object. Parents own
//! their children as `Box<dyn Mounted>` and drive them with two operations:
//! [`Mounted::update`] forwards a cycle, [`Mounted::remove`] tears the
//! subtree down.

use std::rc::Rc;

use crate::dom::Dom;
use crate::error::ReconcileResult;
use crate::item::Item;
use crate::state::{Cycle, State};

/// A mounted subtree.
///
/// Callers must not re-enter a subtree while one of its methods is running,
/// for example from an event callback. Queue the state change and apply it
/// after the running cycle returns.
pub trait Mounted {
	/// Applies one update cycle.
	fn update(&mut self, dom: &mut dyn Dom, cycle: Cycle<'_>) -> ReconcileResult<()>;

	/// Tears the subtree down. Calling it again is a no-op.
	fn remove(&mut self, dom: &mut dyn Dom) -> ReconcileResult<()>;
}

impl<T: Mounted + ?Sized> Mounted for Box<T> {
	fn update(&mut self, dom: &mut dyn Dom, cycle: Cycle<'_>) -> ReconcileResult<()> {
		(**self).update(dom, cycle)
	}

	fn remove(&mut self, dom: &mut dyn Dom) -> ReconcileResult<()> {
		(**self).remove(dom)
	}
}

/// Arguments handed to a component factory.
#[derive(Debug)]
pub struct Mount<'a, P> {
	/// The snapshot the component is created with.
	pub initial_state: &'a State,
	/// Configuration built by the parent's props factory.
	pub props: P,
	/// The item the component renders, for keyed children.
	pub item: Option<&'a Item>,
}

/// Creates a mounted component.
pub type ComponentFactory<P> =
	Rc<dyn Fn(&mut dyn Dom, Mount<'_, P>) -> ReconcileResult<Box<dyn Mounted>>>;

/// Builds a child's configuration from the snapshot and its item.
pub type PropsFactory<P> = Rc<dyn Fn(&State, Option<&Item>) -> P>;

/// Wraps a closure as a [`ComponentFactory`].
pub fn component<P>(
	factory: impl Fn(&mut dyn Dom, Mount<'_, P>) -> ReconcileResult<Box<dyn Mounted>> + 'static,
) -> ComponentFactory<P> {
	Rc::new(factory)
}

/// Wraps a closure as a [`PropsFactory`].
pub fn props<P>(factory: impl Fn(&State, Option<&Item>) -> P + 'static) -> PropsFactory<P> {
	Rc::new(factory)
}

/// Forwards a cycle to every child in order.
pub fn update_all(
	children: &mut [Box<dyn Mounted>],
	dom: &mut dyn Dom,
	cycle: Cycle<'_>,
) -> ReconcileResult<()> {
	tracing::trace!(children = children.len(), "forwarding cycle");
	children
		.iter_mut()
		.try_for_each(|child| child.update(dom, cycle))
}

/// Tears down every child in order.
pub fn remove_all(children: &mut [Box<dyn Mounted>], dom: &mut dyn Dom) -> ReconcileResult<()> {
	children.iter_mut().try_for_each(|child| child.remove(dom))
}
