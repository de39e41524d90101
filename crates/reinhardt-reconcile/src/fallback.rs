//! Placeholder markup shown while a unit has nothing mounted.

use std::fmt;
use std::rc::Rc;

use crate::dom::{Dom, NodeId, Position};
use crate::error::{ReconcileError, ReconcileResult};
use crate::markup::{self, ElementSpec};
use crate::state::State;

/// Where a fallback is inserted and how an existing one is found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackPlacement {
	/// Element the fallback is inserted relative to.
	pub target_selector: String,
	/// Insertion position relative to the target.
	pub position: Position,
	/// When set, the fallback is a sibling of the target and is looked up
	/// in the target's parent instead of the target itself.
	pub target_is_sibling: bool,
	/// Selector identifying a rendered fallback.
	pub fallback_selector: String,
}

impl FallbackPlacement {
	/// A fallback rendered inside `target_selector`.
	pub fn inside(target_selector: impl Into<String>, fallback_selector: impl Into<String>) -> Self {
		Self {
			target_selector: target_selector.into(),
			position: Position::Append,
			target_is_sibling: false,
			fallback_selector: fallback_selector.into(),
		}
	}

	/// A fallback rendered right after `target_selector`.
	pub fn after(target_selector: impl Into<String>, fallback_selector: impl Into<String>) -> Self {
		Self {
			target_selector: target_selector.into(),
			position: Position::After,
			target_is_sibling: true,
			fallback_selector: fallback_selector.into(),
		}
	}

	/// Overrides the insertion position.
	pub fn with_position(mut self, position: Position) -> Self {
		self.position = position;
		self
	}

	fn container(&self, dom: &mut dyn Dom) -> ReconcileResult<NodeId> {
		let target = dom.require(&self.target_selector)?;
		if !self.target_is_sibling {
			return Ok(target);
		}
		dom.parent(target)?
			.ok_or_else(|| ReconcileError::missing_element(format!("{} (parent)", self.target_selector)))
	}

	fn find_existing(&self, dom: &mut dyn Dom) -> ReconcileResult<Option<NodeId>> {
		let container = self.container(dom)?;
		dom.query_selector_within(container, &self.fallback_selector)
	}
}

/// Builds the fallback markup for a snapshot.
pub type FallbackRender = Rc<dyn Fn(&State) -> ElementSpec>;

/// A fallback: placement plus markup.
#[derive(Clone)]
pub struct Fallback {
	/// Placement.
	pub placement: FallbackPlacement,
	/// Markup factory.
	pub render: FallbackRender,
}

impl fmt::Debug for Fallback {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Fallback")
			.field("placement", &self.placement)
			.finish_non_exhaustive()
	}
}

impl Fallback {
	/// Creates a fallback.
	pub fn new(placement: FallbackPlacement, render: impl Fn(&State) -> ElementSpec + 'static) -> Self {
		Self {
			placement,
			render: Rc::new(render),
		}
	}

	/// Renders the fallback unless one is already present.
	///
	/// Returns true when markup was inserted.
	pub fn render_fallback(&self, dom: &mut dyn Dom, state: &State) -> ReconcileResult<bool> {
		if self.placement.find_existing(dom)?.is_some() {
			return Ok(false);
		}
		let spec = (self.render)(state);
		markup::insert_markup(
			dom,
			&self.placement.target_selector,
			&spec,
			self.placement.position,
		)?;
		tracing::trace!(selector = %self.placement.target_selector, "fallback rendered");
		Ok(true)
	}

	/// Removes a rendered fallback, if present.
	///
	/// Returns true when a node was removed.
	pub fn remove_fallback(&self, dom: &mut dyn Dom) -> ReconcileResult<bool> {
		let Some(existing) = self.placement.find_existing(dom)? else {
			return Ok(false);
		};
		dom.remove_node(existing)?;
		tracing::trace!(selector = %self.placement.target_selector, "fallback removed");
		Ok(true)
	}
}
