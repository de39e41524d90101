//! Browser document backend.
//!
//! [`WebDom`] maps `web_sys::Node`s to plain [`NodeId`] handles. Each
//! registered node carries its handle in an expando property, so looking a
//! node up again does not scan the registry. Handles are never reused.
//!
//! Entries are dropped when their node leaves the engine's reach: removing a
//! node forgets its subtree, replacing text forgets the old children, and
//! inserting a fragment forgets the fragment.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};

use crate::dom::{Dom, DomEvent, EventCallback, EventType, ListenerId, NodeId, Position};
use crate::error::{ReconcileError, ReconcileResult};

const HANDLE_PROPERTY: &str = "__reinhardtReconcileNode";

#[derive(Default)]
struct NodeRegistry {
	nodes: HashMap<NodeId, web_sys::Node>,
	next_node: NodeId,
}

impl NodeRegistry {
	fn get(&self, id: NodeId) -> ReconcileResult<web_sys::Node> {
		self.nodes
			.get(&id)
			.cloned()
			.ok_or(ReconcileError::MissingNode { id })
	}

	fn lookup(&self, node: &web_sys::Node) -> Option<NodeId> {
		let id = js_sys::Reflect::get(node, &JsValue::from_str(HANDLE_PROPERTY))
			.ok()?
			.as_f64()? as NodeId;
		self.nodes
			.get(&id)
			.is_some_and(|known| known.is_same_node(Some(node)))
			.then_some(id)
	}

	fn register(&mut self, node: web_sys::Node) -> NodeId {
		if let Some(id) = self.lookup(&node) {
			return id;
		}
		let id = self.next_node;
		self.next_node += 1;
		// A node that rejects expandos is still usable; it is just registered again.
		let _ = js_sys::Reflect::set(
			&node,
			&JsValue::from_str(HANDLE_PROPERTY),
			&JsValue::from_f64(id as f64),
		);
		self.nodes.insert(id, node);
		id
	}

	fn forget(&mut self, node: &web_sys::Node, forgotten: &mut HashSet<NodeId>) {
		if let Some(id) = self.lookup(node) {
			self.nodes.remove(&id);
			let _ = js_sys::Reflect::delete_property(node, &JsValue::from_str(HANDLE_PROPERTY));
			forgotten.insert(id);
		}
	}

	/// Forgets every registered descendant of `root`, and `root` itself when
	/// `include_root` is set.
	fn forget_subtree(&mut self, root: &web_sys::Node, include_root: bool) -> HashSet<NodeId> {
		let mut forgotten = HashSet::new();
		if self.nodes.is_empty() {
			return forgotten;
		}
		if include_root {
			self.forget(root, &mut forgotten);
		}
		for_each_descendant(root, &mut |node| self.forget(node, &mut forgotten));
		forgotten
	}
}

fn for_each_descendant(root: &web_sys::Node, visit: &mut dyn FnMut(&web_sys::Node)) {
	let mut child = root.first_child();
	while let Some(node) = child {
		visit(&node);
		for_each_descendant(&node, visit);
		child = node.next_sibling();
	}
}

struct WebListener {
	node: NodeId,
	raw: web_sys::Node,
	event_type: EventType,
	closure: Closure<dyn FnMut(web_sys::Event)>,
}

impl WebListener {
	fn detach(&self) -> ReconcileResult<()> {
		self.raw
			.remove_event_listener_with_callback(
				self.event_type.as_str(),
				self.closure.as_ref().unchecked_ref(),
			)
			.map_err(dom_error)
	}
}

/// A [`Dom`] backend over the browser document.
pub struct WebDom {
	document: web_sys::Document,
	registry: Rc<RefCell<NodeRegistry>>,
	listeners: HashMap<ListenerId, WebListener>,
	next_listener: ListenerId,
}

impl WebDom {
	/// Creates a backend for the window's document.
	pub fn new() -> ReconcileResult<Self> {
		let document = web_sys::window()
			.ok_or_else(|| ReconcileError::Dom("window not available".to_string()))?
			.document()
			.ok_or_else(|| ReconcileError::Dom("document not available".to_string()))?;
		Ok(Self::with_document(document))
	}

	/// Creates a backend for an explicit document.
	pub fn with_document(document: web_sys::Document) -> Self {
		Self {
			document,
			registry: Rc::new(RefCell::new(NodeRegistry::default())),
			listeners: HashMap::new(),
			next_listener: 1,
		}
	}

	/// Returns the raw node behind a handle.
	pub fn raw_node(&self, id: NodeId) -> ReconcileResult<web_sys::Node> {
		self.registry.borrow().get(id)
	}

	/// Number of registered nodes.
	pub fn registered_count(&self) -> usize {
		self.registry.borrow().nodes.len()
	}

	fn element(&self, id: NodeId) -> ReconcileResult<web_sys::Element> {
		self.raw_node(id)?
			.dyn_into::<web_sys::Element>()
			.map_err(|_| ReconcileError::Dom(format!("node {id} is not an element")))
	}

	fn register(&mut self, node: web_sys::Node) -> NodeId {
		self.registry.borrow_mut().register(node)
	}

	fn forget_subtree(&mut self, root: &web_sys::Node, include_root: bool) {
		let forgotten = self.registry.borrow_mut().forget_subtree(root, include_root);
		if forgotten.is_empty() {
			return;
		}
		let stale: Vec<ListenerId> = self
			.listeners
			.iter()
			.filter(|(_, listener)| forgotten.contains(&listener.node))
			.map(|(id, _)| *id)
			.collect();
		for id in stale {
			if let Some(listener) = self.listeners.remove(&id)
				&& let Err(err) = listener.detach()
			{
				tracing::warn!(listener = id, error = %err, "failed to detach listener");
			}
		}
	}
}

fn dom_error(err: JsValue) -> ReconcileError {
	ReconcileError::Dom(format!("{err:?}"))
}

impl Dom for WebDom {
	fn query_selector(&mut self, selector: &str) -> ReconcileResult<Option<NodeId>> {
		let found = self
			.document
			.query_selector(selector)
			.map_err(|_| ReconcileError::InvalidSelector {
				selector: selector.to_string(),
				reason: "rejected by the browser".to_string(),
			})?;
		Ok(found.map(|el| self.register(el.into())))
	}

	fn query_selector_within(
		&mut self,
		scope: NodeId,
		selector: &str,
	) -> ReconcileResult<Option<NodeId>> {
		let scope_node = self.raw_node(scope)?;
		let found = if let Some(element) = scope_node.dyn_ref::<web_sys::Element>() {
			element.query_selector(selector)
		} else if let Some(fragment) = scope_node.dyn_ref::<web_sys::DocumentFragment>() {
			fragment.query_selector(selector)
		} else {
			return Ok(None);
		}
		.map_err(|_| ReconcileError::InvalidSelector {
			selector: selector.to_string(),
			reason: "rejected by the browser".to_string(),
		})?;
		Ok(found.map(|el| self.register(el.into())))
	}

	fn parent(&mut self, node: NodeId) -> ReconcileResult<Option<NodeId>> {
		let parent = self.raw_node(node)?.parent_node();
		Ok(parent.map(|p| self.register(p)))
	}

	fn create_element(&mut self, tag: &str) -> ReconcileResult<NodeId> {
		let element = self.document.create_element(tag).map_err(dom_error)?;
		Ok(self.register(element.into()))
	}

	fn create_fragment(&mut self) -> ReconcileResult<NodeId> {
		let fragment = self.document.create_document_fragment();
		Ok(self.register(fragment.into()))
	}

	fn set_text_content(&mut self, node: NodeId, text: &str) -> ReconcileResult<()> {
		let raw = self.raw_node(node)?;
		self.forget_subtree(&raw, false);
		raw.set_text_content(Some(text));
		Ok(())
	}

	fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> ReconcileResult<()> {
		self.element(node)?
			.set_attribute(name, value)
			.map_err(dom_error)
	}

	fn remove_attribute(&mut self, node: NodeId, name: &str) -> ReconcileResult<()> {
		self.element(node)?.remove_attribute(name).map_err(dom_error)
	}

	fn add_class(&mut self, node: NodeId, class: &str) -> ReconcileResult<()> {
		self.element(node)?
			.class_list()
			.add_1(class)
			.map_err(dom_error)
	}

	fn remove_class(&mut self, node: NodeId, class: &str) -> ReconcileResult<()> {
		self.element(node)?
			.class_list()
			.remove_1(class)
			.map_err(dom_error)
	}

	fn set_value(&mut self, node: NodeId, value: &str) -> ReconcileResult<()> {
		let element = self.element(node)?;
		match element.dyn_ref::<web_sys::HtmlInputElement>() {
			Some(input) => input.set_value(value),
			None => element.set_attribute("value", value).map_err(dom_error)?,
		}
		Ok(())
	}

	fn insert_node(
		&mut self,
		target: NodeId,
		position: Position,
		node: NodeId,
	) -> ReconcileResult<()> {
		let target_node = self.raw_node(target)?;
		let raw = self.raw_node(node)?;
		match position {
			Position::Append => {
				target_node.append_child(&raw).map_err(dom_error)?;
			}
			Position::Prepend => {
				target_node
					.insert_before(&raw, target_node.first_child().as_ref())
					.map_err(dom_error)?;
			}
			Position::Before | Position::After => {
				let parent = target_node
					.parent_node()
					.ok_or(ReconcileError::InvalidInsertion {
						id: target,
						reason: "target has no parent",
					})?;
				let reference = if position == Position::After {
					target_node.next_sibling()
				} else {
					Some(target_node.clone())
				};
				parent
					.insert_before(&raw, reference.as_ref())
					.map_err(dom_error)?;
			}
		}
		if raw.dyn_ref::<web_sys::DocumentFragment>().is_some() {
			self.forget_subtree(&raw, true);
		}
		Ok(())
	}

	fn remove_node(&mut self, node: NodeId) -> ReconcileResult<()> {
		let raw = self.raw_node(node)?;
		if let Some(parent) = raw.parent_node() {
			parent.remove_child(&raw).map_err(dom_error)?;
		}
		self.forget_subtree(&raw, true);
		Ok(())
	}

	fn add_event_listener(
		&mut self,
		node: NodeId,
		event_type: &EventType,
		callback: EventCallback,
	) -> ReconcileResult<ListenerId> {
		let raw = self.raw_node(node)?;
		let kind = event_type.clone();
		let registry = Rc::clone(&self.registry);
		let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
			let origin = event.target();
			let value = origin
				.clone()
				.and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
				.map(|input| input.value());
			// The registry may be borrowed when the browser dispatches
			// synchronously from inside a mutation; fall back to the listening node.
			let target = origin
				.and_then(|t| t.dyn_into::<web_sys::Node>().ok())
				.and_then(|t| {
					registry
						.try_borrow_mut()
						.ok()
						.map(|mut registry| registry.register(t))
				})
				.unwrap_or(node);
			callback(&DomEvent {
				event_type: kind.clone(),
				target,
				value,
			});
		});
		raw.add_event_listener_with_callback(event_type.as_str(), closure.as_ref().unchecked_ref())
			.map_err(dom_error)?;

		let id = self.next_listener;
		self.next_listener += 1;
		self.listeners.insert(
			id,
			WebListener {
				node,
				raw,
				event_type: event_type.clone(),
				closure,
			},
		);
		Ok(id)
	}

	fn remove_event_listener(&mut self, node: NodeId, listener: ListenerId) -> ReconcileResult<()> {
		self.raw_node(node)?;
		if let Some(entry) = self.listeners.remove(&listener) {
			entry.detach()?;
		}
		Ok(())
	}
}
