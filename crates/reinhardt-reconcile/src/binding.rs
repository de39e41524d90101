//! State-to-DOM bindings.
//!
//! A [`Binding`] ties the element matched by a selector to the value at a
//! state path. [`apply_bindings`] compares that value between the previous
//! and next snapshot of a [`Cycle`] and touches the DOM only when it changed
//! (or when the caller forces an update).
//!
//! ```
//! use reinhardt_reconcile::binding::{Binding, apply_bindings};
//! use reinhardt_reconcile::{Cycle, Dom, MemoryDom};
//! use serde_json::json;
//!
//! let mut dom = MemoryDom::new();
//! let counter = dom.create_element("span").unwrap();
//! dom.set_attribute(counter, "class", "count").unwrap();
//! let body = dom.body();
//! dom.insert_node(body, Default::default(), counter).unwrap();
//!
//! let bindings = vec![Binding::text(".count", "todos.length")];
//! let previous = json!({"todos": {"length": 0}});
//! let next = json!({"todos": {"length": 3}});
//!
//! let report = apply_bindings(&mut dom, &bindings, Cycle::new(&previous, &next), false).unwrap();
//! assert_eq!(report.applied, 1);
//! assert_eq!(dom.text_content(counter).unwrap(), "3");
//! ```

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::dom::{Dom, NodeId};
use crate::error::{ReconcileError, ReconcileResult};
use crate::state::{self, Cycle, StatePath};

/// Caller-supplied mutation for `attribute`, `classes` and `input` bindings.
///
/// Receives the bound element and the value at the binding's path in the
/// next snapshot (`None` when the path is missing).
pub type Action = Rc<dyn Fn(&mut dyn Dom, NodeId, Option<&Value>) -> ReconcileResult<()>>;

/// Update strategy of a binding.
#[derive(Clone)]
pub enum BindingKind {
	/// Writes the value as the element's text content.
	Text,
	/// Delegates to the action.
	Attribute(Action),
	/// Delegates to the action when present, otherwise writes the value
	/// property.
	Input(Option<Action>),
	/// Delegates to the action.
	Classes(Action),
}

impl BindingKind {
	/// The declarative name of the kind.
	pub fn name(&self) -> &'static str {
		match self {
			Self::Text => "text",
			Self::Attribute(_) => "attribute",
			Self::Input(_) => "input",
			Self::Classes(_) => "classes",
		}
	}
}

impl fmt::Debug for BindingKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// A declarative state-to-DOM rule.
#[derive(Debug, Clone)]
pub struct Binding {
	/// Selector of the bound element.
	pub selector: String,
	/// State path the element reflects.
	pub path: StatePath,
	/// Update strategy.
	pub kind: BindingKind,
}

impl Binding {
	/// Builds a binding from a kind name, as found in declarative
	/// configuration.
	///
	/// Fails with [`ReconcileError::UnknownBindingKind`] for kinds other than
	/// `text`, `attribute`, `input` and `classes`, and with
	/// [`ReconcileError::MissingAction`] when `attribute` or `classes` come
	/// without an action.
	pub fn declare(
		kind: &str,
		selector: impl Into<String>,
		path: impl Into<StatePath>,
		action: Option<Action>,
	) -> ReconcileResult<Self> {
		let selector = selector.into();
		let kind = match kind {
			"text" => BindingKind::Text,
			"input" => BindingKind::Input(action),
			"attribute" | "classes" => {
				let action = action.ok_or_else(|| ReconcileError::MissingAction {
					kind: if kind == "attribute" { "attribute" } else { "classes" },
					selector: selector.clone(),
				})?;
				if kind == "attribute" {
					BindingKind::Attribute(action)
				} else {
					BindingKind::Classes(action)
				}
			}
			other => return Err(ReconcileError::UnknownBindingKind(other.to_string())),
		};
		Ok(Self {
			selector,
			path: path.into(),
			kind,
		})
	}

	/// A `text` binding.
	pub fn text(selector: impl Into<String>, path: impl Into<StatePath>) -> Self {
		Self::with_kind(selector, path, BindingKind::Text)
	}

	/// An `attribute` binding.
	pub fn attribute(
		selector: impl Into<String>,
		path: impl Into<StatePath>,
		action: impl Fn(&mut dyn Dom, NodeId, Option<&Value>) -> ReconcileResult<()> + 'static,
	) -> Self {
		Self::with_kind(selector, path, BindingKind::Attribute(Rc::new(action)))
	}

	/// An `input` binding writing the value property.
	pub fn input(selector: impl Into<String>, path: impl Into<StatePath>) -> Self {
		Self::with_kind(selector, path, BindingKind::Input(None))
	}

	/// An `input` binding delegating to `action`.
	pub fn input_with(
		selector: impl Into<String>,
		path: impl Into<StatePath>,
		action: impl Fn(&mut dyn Dom, NodeId, Option<&Value>) -> ReconcileResult<()> + 'static,
	) -> Self {
		Self::with_kind(selector, path, BindingKind::Input(Some(Rc::new(action))))
	}

	/// A `classes` binding.
	pub fn classes(
		selector: impl Into<String>,
		path: impl Into<StatePath>,
		action: impl Fn(&mut dyn Dom, NodeId, Option<&Value>) -> ReconcileResult<()> + 'static,
	) -> Self {
		Self::with_kind(selector, path, BindingKind::Classes(Rc::new(action)))
	}

	fn with_kind(
		selector: impl Into<String>,
		path: impl Into<StatePath>,
		kind: BindingKind,
	) -> Self {
		Self {
			selector: selector.into(),
			path: path.into(),
			kind,
		}
	}

	fn write(&self, dom: &mut dyn Dom, value: Option<&Value>) -> ReconcileResult<()> {
		let node = dom.require(&self.selector)?;
		match &self.kind {
			BindingKind::Text => dom.set_text_content(node, &state::value_to_text(value)),
			BindingKind::Input(None) => dom.set_value(node, &state::value_to_text(value)),
			BindingKind::Input(Some(action))
			| BindingKind::Attribute(action)
			| BindingKind::Classes(action) => action(dom, node, value),
		}
	}
}

/// Outcome of one [`apply_bindings`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BindingReport {
	/// Bindings written to the DOM.
	pub applied: usize,
	/// Bindings skipped because their value did not change.
	pub skipped: usize,
}

/// Applies `bindings` for one cycle.
///
/// A binding is written when its value differs between `cycle.previous` and
/// `cycle.next`, or unconditionally when `force_update` is set. A binding
/// whose selector matches nothing fails the pass with
/// [`ReconcileError::MissingElement`]; writes made before the failure stay
/// applied.
pub fn apply_bindings(
	dom: &mut dyn Dom,
	bindings: &[Binding],
	cycle: Cycle<'_>,
	force_update: bool,
) -> ReconcileResult<BindingReport> {
	let mut report = BindingReport::default();
	for binding in bindings {
		let previous = state::read(cycle.previous, &binding.path);
		let next = state::read(cycle.next, &binding.path);

		if !force_update && state::values_equal(previous, next) {
			tracing::trace!(
				selector = %binding.selector,
				path = %binding.path,
				"binding unchanged"
			);
			report.skipped += 1;
			continue;
		}

		binding.write(dom, next)?;
		report.applied += 1;
	}
	Ok(report)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::dom::{MemoryDom, Position};
	use crate::markup::{self, ElementSpec};
	use rstest::{fixture, rstest};
	use serde_json::json;

	#[fixture]
	fn dom() -> MemoryDom {
		let mut dom = MemoryDom::new();
		let form = ElementSpec::new("form")
			.child(ElementSpec::new("span").class("count"))
			.child(ElementSpec::new("input").class("title"))
			.child(ElementSpec::new("a").class("link"))
			.mount_at("body", Position::Append);
		markup::render_ui(&mut dom, &form).unwrap();
		dom.reset_writes();
		dom
	}

	fn bindings() -> Vec<Binding> {
		vec![
			Binding::text(".count", "count"),
			Binding::input(".title", "draft"),
			Binding::attribute(".link", "href", |dom, node, value| {
				dom.set_attribute(node, "href", &state::value_to_text(value))
			}),
			Binding::classes(".link", "active", |dom, node, value| {
				dom.toggle_class(node, "active", state::is_truthy(value))
			}),
		]
	}

	fn node(dom: &mut MemoryDom, selector: &str) -> NodeId {
		dom.require(selector).unwrap()
	}

	#[rstest]
	fn test_changed_values_are_written(mut dom: MemoryDom) {
		let previous = json!({});
		let next = json!({"count": 2, "draft": "milk", "href": "/todos", "active": true});

		let report = apply_bindings(&mut dom, &bindings(), Cycle::new(&previous, &next), false)
			.unwrap();

		assert_eq!(report, BindingReport { applied: 4, skipped: 0 });
		let count = node(&mut dom, ".count");
		let title = node(&mut dom, ".title");
		let link = node(&mut dom, ".link");
		assert_eq!(dom.text_content(count).unwrap(), "2");
		assert_eq!(dom.value(title), Some("milk"));
		assert_eq!(dom.attribute(link, "href"), Some("/todos"));
		assert!(dom.has_class(link, "active"));
	}

	#[rstest]
	fn test_unchanged_values_are_skipped(mut dom: MemoryDom) {
		let state = json!({"count": 2, "draft": "milk", "href": "/", "active": false});

		let report = apply_bindings(&mut dom, &bindings(), Cycle::unchanged(&state), false)
			.unwrap();

		assert_eq!(report, BindingReport { applied: 0, skipped: 4 });
		assert_eq!(dom.writes(), 0);
	}

	#[rstest]
	fn test_force_update_rewrites_everything(mut dom: MemoryDom) {
		let state = json!({"count": 2, "draft": "milk", "href": "/", "active": false});

		let report =
			apply_bindings(&mut dom, &bindings(), Cycle::unchanged(&state), true).unwrap();

		assert_eq!(report.applied, 4);
		assert_eq!(dom.writes(), 4);
	}

	#[rstest]
	fn test_only_changed_paths_are_written(mut dom: MemoryDom) {
		let previous = json!({"count": 1, "draft": "a"});
		let next = json!({"count": 2, "draft": "a"});
		let bindings = vec![Binding::text(".count", "count"), Binding::input(".title", "draft")];

		let report =
			apply_bindings(&mut dom, &bindings, Cycle::new(&previous, &next), false).unwrap();

		assert_eq!(report, BindingReport { applied: 1, skipped: 1 });
	}

	#[rstest]
	fn test_input_action_replaces_value_write(mut dom: MemoryDom) {
		let previous = json!({"done": false});
		let next = json!({"done": true});
		let bindings = vec![Binding::input_with(".title", "done", |dom, node, value| {
			if state::is_truthy(value) {
				dom.set_attribute(node, "checked", "")
			} else {
				dom.remove_attribute(node, "checked")
			}
		})];

		apply_bindings(&mut dom, &bindings, Cycle::new(&previous, &next), false).unwrap();

		let title = node(&mut dom, ".title");
		assert_eq!(dom.attribute(title, "checked"), Some(""));
		assert_eq!(dom.value(title), None);
	}

	#[rstest]
	fn test_missing_target_fails_loudly(mut dom: MemoryDom) {
		let previous = json!({"count": 1});
		let next = json!({"count": 2});
		let bindings = vec![Binding::text(".gone", "count")];

		let err =
			apply_bindings(&mut dom, &bindings, Cycle::new(&previous, &next), false).unwrap_err();

		assert!(matches!(err, ReconcileError::MissingElement { selector } if selector == ".gone"));
	}

	#[rstest]
	fn test_missing_path_clears_text(mut dom: MemoryDom) {
		let previous = json!({"count": 5});
		let next = json!({});
		let bindings = vec![Binding::text(".count", "count")];

		apply_bindings(&mut dom, &bindings, Cycle::new(&previous, &next), false).unwrap();

		let count = node(&mut dom, ".count");
		assert_eq!(dom.text_content(count).unwrap(), "");
	}

	#[rstest]
	#[case("text", None, "text")]
	#[case("input", None, "input")]
	fn test_declare(#[case] kind: &str, #[case] action: Option<Action>, #[case] expected: &str) {
		let binding = Binding::declare(kind, ".count", "count", action).unwrap();
		assert_eq!(binding.kind.name(), expected);
	}

	#[rstest]
	fn test_declare_unknown_kind() {
		let err = Binding::declare("style", ".count", "count", None).unwrap_err();
		assert!(matches!(err, ReconcileError::UnknownBindingKind(kind) if kind == "style"));
	}

	#[rstest]
	#[case("attribute")]
	#[case("classes")]
	fn test_declare_requires_action(#[case] kind: &str) {
		let err = Binding::declare(kind, ".link", "href", None).unwrap_err();
		assert!(matches!(err, ReconcileError::MissingAction { .. }));

		let action: Action = Rc::new(|_: &mut dyn Dom, _: NodeId, _: Option<&Value>| Ok(()));
		let binding = Binding::declare(kind, ".link", "href", Some(action)).unwrap();
		assert_eq!(binding.kind.name(), kind);
	}
}
