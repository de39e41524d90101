//! Headless in-memory document.
//!
//! [`MemoryDom`] implements [`Dom`] over an arena of nodes. It backs the test
//! suite and server-side rendering: trees can be inspected, events can be
//! dispatched by hand, and the document can be serialized with
//! [`MemoryDom::to_html`].
//!
//! Removing a node frees its whole subtree; handles into a removed subtree
//! become stale and fail with [`ReconcileError::MissingNode`]. Freed arena
//! slots are reused, but handles are never handed out twice.

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;

use crate::dom::selector::{ElementTree, Selector};
use crate::dom::{Dom, DomEvent, EventCallback, EventType, ListenerId, NodeId, Position};
use crate::error::{ReconcileError, ReconcileResult};

const VOID_ELEMENTS: &[&str] = &[
	"area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
	"wbr",
];

enum NodeKind {
	Document,
	Fragment,
	Element {
		tag: String,
		attributes: IndexMap<String, String>,
		value: Option<String>,
	},
	Text(String),
}

struct MemoryNode {
	kind: NodeKind,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
	listeners: Vec<(ListenerId, EventType, EventCallback)>,
}

impl MemoryNode {
	fn new(kind: NodeKind) -> Self {
		Self {
			kind,
			parent: None,
			children: Vec::new(),
			listeners: Vec::new(),
		}
	}

	fn can_have_children(&self) -> bool {
		!matches!(self.kind, NodeKind::Text(_))
	}
}

/// An in-memory [`Dom`] backend.
///
/// A new document contains `<html><body></body></html>`.
pub struct MemoryDom {
	slots: Vec<Option<MemoryNode>>,
	free_slots: Vec<usize>,
	handles: HashMap<NodeId, usize>,
	next_node: NodeId,
	document: NodeId,
	body: NodeId,
	next_listener: ListenerId,
	writes: usize,
}

impl Default for MemoryDom {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for MemoryDom {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MemoryDom")
			.field("live_nodes", &self.node_count())
			.field("writes", &self.writes)
			.finish()
	}
}

impl MemoryDom {
	/// Creates a document with an empty `<body>`.
	pub fn new() -> Self {
		let mut dom = Self {
			slots: Vec::new(),
			free_slots: Vec::new(),
			handles: HashMap::new(),
			next_node: 0,
			document: 0,
			body: 0,
			next_listener: 1,
			writes: 0,
		};
		dom.document = dom.alloc(NodeKind::Document);
		let html = dom.alloc(element_kind("html"));
		let body = dom.alloc(element_kind("body"));
		dom.attach(dom.document, html, None);
		dom.attach(html, body, None);
		dom.body = body;
		dom
	}

	/// Returns the document node.
	pub fn document(&self) -> NodeId {
		self.document
	}

	/// Returns the `<body>` element.
	pub fn body(&self) -> NodeId {
		self.body
	}

	/// Number of mutations performed since creation or the last reset.
	pub fn writes(&self) -> usize {
		self.writes
	}

	/// Resets the mutation counter.
	pub fn reset_writes(&mut self) {
		self.writes = 0;
	}

	/// Number of live nodes, attached or not.
	pub fn node_count(&self) -> usize {
		self.handles.len()
	}

	/// Number of arena slots, live or waiting for reuse.
	pub fn slot_count(&self) -> usize {
		self.slots.len()
	}

	/// Number of attached event listeners across all live nodes.
	pub fn listener_count(&self) -> usize {
		self.slots
			.iter()
			.flatten()
			.map(|node| node.listeners.len())
			.sum()
	}

	/// Returns true while `node` refers to a live node.
	pub fn contains(&self, node: NodeId) -> bool {
		self.node(node).is_ok()
	}

	/// Returns true when `node` is reachable from the document.
	pub fn is_attached(&self, node: NodeId) -> bool {
		let mut current = Some(node);
		while let Some(id) = current {
			if id == self.document {
				return true;
			}
			current = self.node(id).ok().and_then(|n| n.parent);
		}
		false
	}

	/// Returns every element in the document matching `selector`, in tree order.
	pub fn query_all(&self, selector: &str) -> ReconcileResult<Vec<NodeId>> {
		let selector = Selector::parse(selector)?;
		let mut found = Vec::new();
		self.walk(self.document, &mut |id| {
			if selector.matches(self, id) {
				found.push(id);
			}
			false
		});
		Ok(found)
	}

	/// Returns the child nodes of `node`.
	pub fn children(&self, node: NodeId) -> ReconcileResult<&[NodeId]> {
		Ok(&self.node(node)?.children)
	}

	/// Returns the concatenated text of `node` and its descendants.
	pub fn text_content(&self, node: NodeId) -> ReconcileResult<String> {
		let mut text = String::new();
		self.collect_text(node, &mut text)?;
		Ok(text)
	}

	/// Returns an attribute of an element.
	pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
		ElementTree::attribute(self, node, name)
	}

	/// Returns true when the element's class list contains `class`.
	pub fn has_class(&self, node: NodeId, class: &str) -> bool {
		self.attribute(node, "class")
			.is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
	}

	/// Returns the `value` property of a form control.
	pub fn value(&self, node: NodeId) -> Option<&str> {
		match self.node(node).ok().map(|n| &n.kind) {
			Some(NodeKind::Element { value, .. }) => value.as_deref(),
			_ => None,
		}
	}

	/// Dispatches an event at `node`, bubbling through its ancestors.
	///
	/// Returns the number of callbacks invoked.
	pub fn dispatch(&mut self, node: NodeId, event_type: EventType) -> ReconcileResult<usize> {
		self.node(node)?;
		let event = DomEvent {
			event_type,
			target: node,
			value: self.value(node).map(str::to_string),
		};

		// Collect first so callbacks run without borrowing the arena.
		let mut callbacks = Vec::new();
		let mut current = Some(node);
		while let Some(id) = current {
			let Ok(n) = self.node(id) else { break };
			callbacks.extend(
				n.listeners
					.iter()
					.filter(|(_, ty, _)| *ty == event.event_type)
					.map(|(_, _, cb)| cb.clone()),
			);
			current = n.parent;
		}

		for callback in &callbacks {
			callback(&event);
		}
		Ok(callbacks.len())
	}

	/// Serializes `node` (children only for the document and fragments).
	pub fn to_html(&self, node: NodeId) -> ReconcileResult<String> {
		let mut output = String::new();
		self.write_html(node, &mut output)?;
		Ok(output)
	}

	/// Serializes the contents of `<body>`.
	pub fn body_html(&self) -> String {
		let mut output = String::new();
		if let Ok(body) = self.node(self.body) {
			for &child in &body.children {
				// Children of a live node are always live.
				let _ = self.write_html(child, &mut output);
			}
		}
		output
	}

	fn alloc(&mut self, kind: NodeKind) -> NodeId {
		let id = self.next_node;
		self.next_node += 1;
		let node = Some(MemoryNode::new(kind));
		let slot = match self.free_slots.pop() {
			Some(slot) => {
				self.slots[slot] = node;
				slot
			}
			None => {
				self.slots.push(node);
				self.slots.len() - 1
			}
		};
		self.handles.insert(id, slot);
		id
	}

	fn node(&self, id: NodeId) -> ReconcileResult<&MemoryNode> {
		self.handles
			.get(&id)
			.and_then(|&slot| self.slots.get(slot))
			.and_then(Option::as_ref)
			.ok_or(ReconcileError::MissingNode { id })
	}

	fn node_mut(&mut self, id: NodeId) -> ReconcileResult<&mut MemoryNode> {
		self.handles
			.get(&id)
			.and_then(|&slot| self.slots.get_mut(slot))
			.and_then(Option::as_mut)
			.ok_or(ReconcileError::MissingNode { id })
	}

	fn element_mut(
		&mut self,
		id: NodeId,
	) -> ReconcileResult<(&mut IndexMap<String, String>, &mut Option<String>)> {
		match &mut self.node_mut(id)?.kind {
			NodeKind::Element {
				attributes, value, ..
			} => Ok((attributes, value)),
			_ => Err(ReconcileError::Dom(format!("node {id} is not an element"))),
		}
	}

	/// Links `child` under `parent` at `index` (or at the end).
	fn attach(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) {
		if let Ok(node) = self.node_mut(parent) {
			match index {
				Some(i) => node.children.insert(i.min(node.children.len()), child),
				None => node.children.push(child),
			}
		}
		if let Ok(node) = self.node_mut(child) {
			node.parent = Some(parent);
		}
	}

	fn detach(&mut self, child: NodeId) {
		let parent = self.node_mut(child).ok().and_then(|n| n.parent.take());
		if let Some(parent) = parent
			&& let Ok(node) = self.node_mut(parent)
		{
			node.children.retain(|&c| c != child);
		}
	}

	fn free(&mut self, id: NodeId) {
		let Some(slot) = self.handles.remove(&id) else {
			return;
		};
		let Some(node) = self.slots.get_mut(slot).and_then(Option::take) else {
			return;
		};
		self.free_slots.push(slot);
		for child in node.children {
			self.free(child);
		}
	}

	fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
		let mut current = Some(node);
		while let Some(id) = current {
			if id == ancestor {
				return true;
			}
			current = self.node(id).ok().and_then(|n| n.parent);
		}
		false
	}

	/// Pre-order walk over descendants of `root`; stops when `visit` returns true.
	fn walk(&self, root: NodeId, visit: &mut dyn FnMut(NodeId) -> bool) -> bool {
		let Ok(node) = self.node(root) else {
			return false;
		};
		for &child in &node.children {
			if visit(child) || self.walk(child, visit) {
				return true;
			}
		}
		false
	}

	fn first_match(&self, scope: NodeId, selector: &str) -> ReconcileResult<Option<NodeId>> {
		self.node(scope)?;
		let selector = Selector::parse(selector)?;
		let mut found = None;
		self.walk(scope, &mut |id| {
			if selector.matches(self, id) {
				found = Some(id);
				return true;
			}
			false
		});
		Ok(found)
	}

	fn collect_text(&self, id: NodeId, text: &mut String) -> ReconcileResult<()> {
		let node = self.node(id)?;
		if let NodeKind::Text(content) = &node.kind {
			text.push_str(content);
		}
		for &child in &node.children {
			self.collect_text(child, text)?;
		}
		Ok(())
	}

	fn write_html(&self, id: NodeId, output: &mut String) -> ReconcileResult<()> {
		let node = self.node(id)?;
		match &node.kind {
			NodeKind::Document | NodeKind::Fragment => {
				for &child in &node.children {
					self.write_html(child, output)?;
				}
			}
			NodeKind::Text(content) => output.push_str(&escape_text(content)),
			NodeKind::Element {
				tag, attributes, ..
			} => {
				output.push('<');
				output.push_str(tag);
				for (name, value) in attributes {
					output.push(' ');
					output.push_str(name);
					output.push_str("=\"");
					output.push_str(&escape_attr(value));
					output.push('"');
				}
				output.push('>');
				if VOID_ELEMENTS.contains(&tag.as_str()) {
					return Ok(());
				}
				for &child in &node.children {
					self.write_html(child, output)?;
				}
				output.push_str("</");
				output.push_str(tag);
				output.push('>');
			}
		}
		Ok(())
	}
}

fn element_kind(tag: &str) -> NodeKind {
	NodeKind::Element {
		tag: tag.to_ascii_lowercase(),
		attributes: IndexMap::new(),
		value: None,
	}
}

fn escape_text(text: &str) -> String {
	text.replace('&', "&amp;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
	escape_text(value).replace('"', "&quot;")
}

impl ElementTree for MemoryDom {
	fn tag_name(&self, node: NodeId) -> Option<&str> {
		match self.node(node).ok().map(|n| &n.kind) {
			Some(NodeKind::Element { tag, .. }) => Some(tag.as_str()),
			_ => None,
		}
	}

	fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
		match self.node(node).ok().map(|n| &n.kind) {
			Some(NodeKind::Element { attributes, .. }) => attributes.get(name).map(String::as_str),
			_ => None,
		}
	}

	fn parent_element(&self, node: NodeId) -> Option<NodeId> {
		let parent = self.node(node).ok()?.parent?;
		self.tag_name(parent).map(|_| parent)
	}
}

impl Dom for MemoryDom {
	fn query_selector(&mut self, selector: &str) -> ReconcileResult<Option<NodeId>> {
		self.first_match(self.document, selector)
	}

	fn query_selector_within(
		&mut self,
		scope: NodeId,
		selector: &str,
	) -> ReconcileResult<Option<NodeId>> {
		self.first_match(scope, selector)
	}

	fn parent(&mut self, node: NodeId) -> ReconcileResult<Option<NodeId>> {
		Ok(self.node(node)?.parent)
	}

	fn create_element(&mut self, tag: &str) -> ReconcileResult<NodeId> {
		Ok(self.alloc(element_kind(tag)))
	}

	fn create_fragment(&mut self) -> ReconcileResult<NodeId> {
		Ok(self.alloc(NodeKind::Fragment))
	}

	fn set_text_content(&mut self, node: NodeId, text: &str) -> ReconcileResult<()> {
		if !self.node(node)?.can_have_children() {
			if let NodeKind::Text(content) = &mut self.node_mut(node)?.kind {
				*content = text.to_string();
			}
			self.writes += 1;
			return Ok(());
		}

		let children = std::mem::take(&mut self.node_mut(node)?.children);
		for child in children {
			self.free(child);
		}
		if !text.is_empty() {
			let text_node = self.alloc(NodeKind::Text(text.to_string()));
			self.attach(node, text_node, None);
		}
		self.writes += 1;
		Ok(())
	}

	fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> ReconcileResult<()> {
		let (attributes, _) = self.element_mut(node)?;
		attributes.insert(name.to_string(), value.to_string());
		self.writes += 1;
		Ok(())
	}

	fn remove_attribute(&mut self, node: NodeId, name: &str) -> ReconcileResult<()> {
		let (attributes, _) = self.element_mut(node)?;
		attributes.shift_remove(name);
		self.writes += 1;
		Ok(())
	}

	fn add_class(&mut self, node: NodeId, class: &str) -> ReconcileResult<()> {
		let (attributes, _) = self.element_mut(node)?;
		let current = attributes.get("class").map(String::as_str).unwrap_or_default();
		if !current.split_whitespace().any(|c| c == class) {
			let updated = if current.trim().is_empty() {
				class.to_string()
			} else {
				format!("{} {class}", current.trim())
			};
			attributes.insert("class".to_string(), updated);
		}
		self.writes += 1;
		Ok(())
	}

	fn remove_class(&mut self, node: NodeId, class: &str) -> ReconcileResult<()> {
		let (attributes, _) = self.element_mut(node)?;
		if let Some(current) = attributes.get_mut("class") {
			let updated = current
				.split_whitespace()
				.filter(|c| *c != class)
				.collect::<Vec<_>>()
				.join(" ");
			*current = updated;
		}
		self.writes += 1;
		Ok(())
	}

	fn set_value(&mut self, node: NodeId, value: &str) -> ReconcileResult<()> {
		let (_, slot) = self.element_mut(node)?;
		*slot = Some(value.to_string());
		self.writes += 1;
		Ok(())
	}

	fn insert_node(
		&mut self,
		target: NodeId,
		position: Position,
		node: NodeId,
	) -> ReconcileResult<()> {
		self.node(node)?;
		let target_node = self.node(target)?;

		let (parent, index) = match position {
			Position::Append | Position::Prepend => {
				if !target_node.can_have_children() {
					return Err(ReconcileError::InvalidInsertion {
						id: target,
						reason: "text nodes have no children",
					});
				}
				let index = (position == Position::Prepend).then_some(0);
				(target, index)
			}
			Position::Before | Position::After => {
				let parent = target_node.parent.ok_or(ReconcileError::InvalidInsertion {
					id: target,
					reason: "target has no parent",
				})?;
				(parent, None)
			}
		};

		if self.is_ancestor_or_self(node, parent) {
			return Err(ReconcileError::InvalidInsertion {
				id: target,
				reason: "a node cannot be inserted into itself",
			});
		}

		let is_fragment = matches!(self.node(node)?.kind, NodeKind::Fragment);
		let moved = if is_fragment {
			std::mem::take(&mut self.node_mut(node)?.children)
		} else {
			self.detach(node);
			vec![node]
		};

		// Sibling positions are resolved after detaching, since the moved node
		// may have been a sibling of the target.
		let mut index = match position {
			Position::Before | Position::After => {
				let siblings = &self.node(parent)?.children;
				let at = siblings
					.iter()
					.position(|&c| c == target)
					.ok_or(ReconcileError::MissingNode { id: target })?;
				Some(if position == Position::After { at + 1 } else { at })
			}
			_ => index,
		};

		for child in moved {
			self.attach(parent, child, index);
			index = index.map(|i| i + 1);
		}
		if is_fragment {
			self.free(node);
		}
		self.writes += 1;
		Ok(())
	}

	fn remove_node(&mut self, node: NodeId) -> ReconcileResult<()> {
		self.node(node)?;
		if node == self.document {
			return Err(ReconcileError::Dom("the document cannot be removed".to_string()));
		}
		self.detach(node);
		self.free(node);
		self.writes += 1;
		Ok(())
	}

	fn add_event_listener(
		&mut self,
		node: NodeId,
		event_type: &EventType,
		callback: EventCallback,
	) -> ReconcileResult<ListenerId> {
		let id = self.next_listener;
		self.node_mut(node)?
			.listeners
			.push((id, event_type.clone(), callback));
		self.next_listener += 1;
		Ok(id)
	}

	fn remove_event_listener(&mut self, node: NodeId, listener: ListenerId) -> ReconcileResult<()> {
		self.node_mut(node)?
			.listeners
			.retain(|(id, _, _)| *id != listener);
		Ok(())
	}
}
