//! Declarative element construction.
//!
//! [`ElementSpec`] describes a small element tree. [`render`] turns it into
//! detached nodes, [`render_ui`] additionally mounts it at its declared
//! target, and [`insert_markup`] mounts it relative to an explicit selector.

use crate::dom::{Dom, NodeId, Position};
use crate::error::ReconcileResult;

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributeSpec {
	name: String,
	value: String,
	enabled: bool,
}

/// Description of an element (or fragment) and its children.
///
/// ```
/// use reinhardt_reconcile::markup::ElementSpec;
/// use reinhardt_reconcile::Position;
///
/// let item = ElementSpec::new("li")
/// 	.class("todo")
/// 	.attr("data-id", "1")
/// 	.attr_if(true, "data-done", "")
/// 	.child(ElementSpec::new("span").text("Write docs"))
/// 	.mount_at(".todo-list", Position::Append);
/// assert_eq!(item.tag(), Some("li"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementSpec {
	tag: Option<String>,
	classes: Vec<String>,
	attributes: Vec<AttributeSpec>,
	text: Option<String>,
	children: Vec<ElementSpec>,
	target: Option<(String, Position)>,
}

impl ElementSpec {
	/// An element with the given tag name.
	pub fn new(tag: impl Into<String>) -> Self {
		Self {
			tag: Some(tag.into()),
			..Self::default()
		}
	}

	/// A document fragment; only its children are inserted.
	pub fn fragment() -> Self {
		Self::default()
	}

	/// Adds whitespace-separated classes.
	pub fn class(mut self, classes: &str) -> Self {
		self.classes
			.extend(classes.split_whitespace().map(str::to_string));
		self
	}

	/// Sets an attribute.
	pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.attributes.push(AttributeSpec {
			name: name.into(),
			value: value.into(),
			enabled: true,
		});
		self
	}

	/// Sets an attribute only when `condition` holds.
	pub fn attr_if(
		mut self,
		condition: bool,
		name: impl Into<String>,
		value: impl Into<String>,
	) -> Self {
		self.attributes.push(AttributeSpec {
			name: name.into(),
			value: value.into(),
			enabled: condition,
		});
		self
	}

	/// Sets the text content. Empty text is ignored.
	pub fn text(mut self, text: impl Into<String>) -> Self {
		let text = text.into();
		self.text = (!text.is_empty()).then_some(text);
		self
	}

	/// Appends a child.
	pub fn child(mut self, child: ElementSpec) -> Self {
		self.children.push(child);
		self
	}

	/// Appends several children.
	pub fn children(mut self, children: impl IntoIterator<Item = ElementSpec>) -> Self {
		self.children.extend(children);
		self
	}

	/// Declares where [`render_ui`] inserts the rendered node.
	pub fn mount_at(mut self, selector: impl Into<String>, position: Position) -> Self {
		self.target = Some((selector.into(), position));
		self
	}

	/// The tag name, `None` for fragments.
	pub fn tag(&self) -> Option<&str> {
		self.tag.as_deref()
	}

	/// The declared mount target.
	pub fn target(&self) -> Option<(&str, Position)> {
		self.target
			.as_ref()
			.map(|(selector, position)| (selector.as_str(), *position))
	}
}

/// Builds the node tree described by `spec` without inserting it.
///
/// Mount targets of nested children are ignored; children are always
/// appended to their parent.
pub fn render(dom: &mut dyn Dom, spec: &ElementSpec) -> ReconcileResult<NodeId> {
	let node = match &spec.tag {
		Some(tag) => {
			let node = dom.create_element(tag)?;
			for class in &spec.classes {
				dom.add_class(node, class)?;
			}
			for attribute in spec.attributes.iter().filter(|a| a.enabled) {
				dom.set_attribute(node, &attribute.name, &attribute.value)?;
			}
			if let Some(text) = &spec.text {
				dom.set_text_content(node, text)?;
			}
			node
		}
		None => dom.create_fragment()?,
	};

	for child in &spec.children {
		let child = render(dom, child)?;
		dom.insert_node(node, Position::Append, child)?;
	}
	Ok(node)
}

/// Renders `spec` and inserts it at its declared target.
///
/// When no target is declared, or the target selector matches nothing, the
/// node is returned detached. A fragment's handle is stale once inserted.
pub fn render_ui(dom: &mut dyn Dom, spec: &ElementSpec) -> ReconcileResult<NodeId> {
	let node = render(dom, spec)?;
	if let Some((selector, position)) = spec.target()
		&& let Some(target) = dom.query_selector(selector)?
	{
		dom.insert_node(target, position, node)?;
	}
	Ok(node)
}

/// Renders `spec` and inserts it at `position` relative to `selector`.
pub fn insert_markup(
	dom: &mut dyn Dom,
	selector: &str,
	spec: &ElementSpec,
	position: Position,
) -> ReconcileResult<NodeId> {
	let target = dom.require(selector)?;
	let node = render(dom, spec)?;
	dom.insert_node(target, position, node)?;
	Ok(node)
}

/// Removes the element matched by `selector`.
pub fn clean(dom: &mut dyn Dom, selector: &str) -> ReconcileResult<()> {
	let node = dom.require(selector)?;
	dom.remove_node(node)
}
