//! Conditional single-child unit.
//!
//! A [`ConditionalUnit`] keeps at most one child mounted. Whether the child
//! exists after a cycle depends only on the condition evaluated against the
//! cycle's next snapshot and on whether a child was mounted before:
//!
//! | mounted | condition | action                                        |
//! |---------|-----------|-----------------------------------------------|
//! | no      | true      | remove fallback, mount child with the snapshot |
//! | yes     | true      | forward the cycle to the child                |
//! | yes     | false     | tear the child down, render fallback          |
//! | no      | false     | nothing                                       |
//!
//! A child mounted during a cycle is not updated in that same cycle; it
//! was already created from the snapshot.

use std::rc::Rc;

use crate::component::{ComponentFactory, Mount, Mounted, PropsFactory};
use crate::dom::Dom;
use crate::error::ReconcileResult;
use crate::fallback::Fallback;
use crate::item::Item;
use crate::state::{Cycle, State};

/// Mount predicate over a snapshot.
pub type Condition = Rc<dyn Fn(&State) -> bool>;

/// Configuration of a [`ConditionalUnit`].
pub struct ConditionalSpec<P> {
	/// Mount predicate. Without one the child is always mounted.
	pub condition: Option<Condition>,
	/// Child factory.
	pub component: ComponentFactory<P>,
	/// Child configuration factory.
	pub props: PropsFactory<P>,
	/// Markup shown while the child is not mounted.
	pub fallback: Option<Fallback>,
	/// Item handed to the child, when the unit renders one entry of a list.
	pub item: Option<Item>,
}

impl<P> ConditionalSpec<P> {
	/// An always-mounted unit.
	pub fn new(component: ComponentFactory<P>, props: PropsFactory<P>) -> Self {
		Self {
			condition: None,
			component,
			props,
			fallback: None,
			item: None,
		}
	}

	/// Mounts the child only while `condition` holds.
	pub fn when(mut self, condition: impl Fn(&State) -> bool + 'static) -> Self {
		self.condition = Some(Rc::new(condition));
		self
	}

	/// Shows `fallback` while the child is not mounted.
	pub fn fallback(mut self, fallback: Fallback) -> Self {
		self.fallback = Some(fallback);
		self
	}

	/// Hands `item` to the child.
	pub fn item(mut self, item: Item) -> Self {
		self.item = Some(item);
		self
	}
}

/// Mounts and unmounts one child depending on a condition.
pub struct ConditionalUnit<P> {
	spec: ConditionalSpec<P>,
	child: Option<Box<dyn Mounted>>,
}

impl<P> ConditionalUnit<P> {
	/// Evaluates the condition against `state` and mounts the child or
	/// renders the fallback.
	pub fn mount(dom: &mut dyn Dom, spec: ConditionalSpec<P>, state: &State) -> ReconcileResult<Self> {
		let mut unit = Self { spec, child: None };
		if unit.wanted(state) {
			unit.child = Some(unit.spawn(dom, state)?);
		} else if let Some(fallback) = &unit.spec.fallback {
			fallback.render_fallback(dom, state)?;
		}
		Ok(unit)
	}

	/// Returns true while a child is mounted.
	pub fn is_mounted(&self) -> bool {
		self.child.is_some()
	}

	fn wanted(&self, state: &State) -> bool {
		self.spec
			.condition
			.as_ref()
			.is_none_or(|condition| condition(state))
	}

	fn spawn(&self, dom: &mut dyn Dom, state: &State) -> ReconcileResult<Box<dyn Mounted>> {
		let item = self.spec.item.as_ref();
		let props = (self.spec.props)(state, item);
		tracing::debug!(item = ?item.map(|i| &i.id), "mounting conditional child");
		(self.spec.component)(
			dom,
			Mount {
				initial_state: state,
				props,
				item,
			},
		)
	}
}

impl<P> Mounted for ConditionalUnit<P> {
	fn update(&mut self, dom: &mut dyn Dom, cycle: Cycle<'_>) -> ReconcileResult<()> {
		if self.wanted(cycle.next) {
			if let Some(child) = self.child.as_mut() {
				return child.update(dom, cycle);
			}
			if let Some(fallback) = &self.spec.fallback {
				fallback.remove_fallback(dom)?;
			}
			self.child = Some(self.spawn(dom, cycle.next)?);
			return Ok(());
		}

		if let Some(mut child) = self.child.take() {
			tracing::debug!("unmounting conditional child");
			child.remove(dom)?;
			if let Some(fallback) = &self.spec.fallback {
				fallback.render_fallback(dom, cycle.next)?;
			}
		}
		Ok(())
	}

	/// Tears the child down. A rendered fallback is left in place; it goes
	/// away with the enclosing root.
	fn remove(&mut self, dom: &mut dyn Dom) -> ReconcileResult<()> {
		match self.child.take() {
			Some(mut child) => child.remove(dom),
			None => Ok(()),
		}
	}
}
