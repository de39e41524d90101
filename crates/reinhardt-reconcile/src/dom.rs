//! DOM capability interface.
//!
//! The engine never talks to a rendering backend directly. Everything it
//! needs from the document is expressed by the [`Dom`] trait, and elements
//! are referred to by [`NodeId`] handles into the backend's node arena.
//!
//! Two backends ship with the crate:
//!
//! - [`MemoryDom`]: a headless in-memory document, used for tests and for
//!   rendering on the server.
//! - `WebDom` (only on `wasm32`): the browser document through `web-sys`.

use std::fmt;
use std::rc::Rc;

use serde::Deserialize;

use crate::error::{ReconcileError, ReconcileResult};

pub mod memory;
pub(crate) mod selector;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use memory::MemoryDom;
#[cfg(target_arch = "wasm32")]
pub use web::WebDom;

/// Handle to a node owned by a [`Dom`] backend.
pub type NodeId = usize;

/// Handle to an attached event listener.
pub type ListenerId = u64;

/// Callback invoked when a DOM event fires.
pub type EventCallback = Rc<dyn Fn(&DomEvent)>;

/// Where a node is inserted relative to a target node.
///
/// Both the node-insertion names (`append`, `prepend`, `before`, `after`)
/// and the adjacent-markup names (`beforeend`, `afterbegin`, `beforebegin`,
/// `afterend`) are accepted when deserializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
	/// As the last child of the target.
	#[default]
	#[serde(alias = "beforeend")]
	Append,
	/// As the first child of the target.
	#[serde(alias = "afterbegin")]
	Prepend,
	/// As the previous sibling of the target.
	#[serde(alias = "beforebegin")]
	Before,
	/// As the next sibling of the target.
	#[serde(alias = "afterend")]
	After,
}

/// DOM event types understood by listeners.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(from = "String")]
pub enum EventType {
	/// `click`
	#[default]
	Click,
	/// `dblclick`
	DblClick,
	/// `input`
	Input,
	/// `change`
	Change,
	/// `submit`
	Submit,
	/// `keydown`
	KeyDown,
	/// `keyup`
	KeyUp,
	/// `focus`
	Focus,
	/// `blur`
	Blur,
	/// Any other event name.
	Custom(String),
}

impl EventType {
	/// Returns the DOM event name.
	pub fn as_str(&self) -> &str {
		match self {
			Self::Click => "click",
			Self::DblClick => "dblclick",
			Self::Input => "input",
			Self::Change => "change",
			Self::Submit => "submit",
			Self::KeyDown => "keydown",
			Self::KeyUp => "keyup",
			Self::Focus => "focus",
			Self::Blur => "blur",
			Self::Custom(name) => name,
		}
	}
}

impl From<&str> for EventType {
	fn from(name: &str) -> Self {
		match name {
			"click" => Self::Click,
			"dblclick" => Self::DblClick,
			"input" => Self::Input,
			"change" => Self::Change,
			"submit" => Self::Submit,
			"keydown" => Self::KeyDown,
			"keyup" => Self::KeyUp,
			"focus" => Self::Focus,
			"blur" => Self::Blur,
			other => Self::Custom(other.to_string()),
		}
	}
}

impl From<String> for EventType {
	fn from(name: String) -> Self {
		Self::from(name.as_str())
	}
}

impl fmt::Display for EventType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// An event delivered to an [`EventCallback`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomEvent {
	/// The event type.
	pub event_type: EventType,
	/// The node the event was dispatched on.
	pub target: NodeId,
	/// The target's current value, for form controls.
	pub value: Option<String>,
}

/// Query and mutation surface consumed by the engine.
///
/// Implementations own their nodes; the engine only holds [`NodeId`]s.
/// Every method that takes a handle fails with
/// [`ReconcileError::MissingNode`] when the handle is stale.
pub trait Dom {
	/// Returns the first element in the document matching `selector`.
	fn query_selector(&mut self, selector: &str) -> ReconcileResult<Option<NodeId>>;

	/// Returns the first descendant of `scope` matching `selector`.
	fn query_selector_within(
		&mut self,
		scope: NodeId,
		selector: &str,
	) -> ReconcileResult<Option<NodeId>>;

	/// Returns the parent of `node`, if it has one.
	fn parent(&mut self, node: NodeId) -> ReconcileResult<Option<NodeId>>;

	/// Creates a detached element.
	fn create_element(&mut self, tag: &str) -> ReconcileResult<NodeId>;

	/// Creates a detached document fragment.
	fn create_fragment(&mut self) -> ReconcileResult<NodeId>;

	/// Replaces the children of `node` with a single text node.
	fn set_text_content(&mut self, node: NodeId, text: &str) -> ReconcileResult<()>;

	/// Sets an attribute.
	fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> ReconcileResult<()>;

	/// Removes an attribute.
	fn remove_attribute(&mut self, node: NodeId, name: &str) -> ReconcileResult<()>;

	/// Adds a class to the element's class list.
	fn add_class(&mut self, node: NodeId, class: &str) -> ReconcileResult<()>;

	/// Removes a class from the element's class list.
	fn remove_class(&mut self, node: NodeId, class: &str) -> ReconcileResult<()>;

	/// Sets the `value` property of a form control.
	fn set_value(&mut self, node: NodeId, value: &str) -> ReconcileResult<()>;

	/// Moves `node` to `position` relative to `target`.
	///
	/// Inserting a fragment moves the fragment's children and releases the
	/// fragment itself; its handle is stale afterwards.
	fn insert_node(
		&mut self,
		target: NodeId,
		position: Position,
		node: NodeId,
	) -> ReconcileResult<()>;

	/// Removes `node` and its subtree from the document.
	fn remove_node(&mut self, node: NodeId) -> ReconcileResult<()>;

	/// Attaches an event listener to `node`.
	fn add_event_listener(
		&mut self,
		node: NodeId,
		event_type: &EventType,
		callback: EventCallback,
	) -> ReconcileResult<ListenerId>;

	/// Detaches a listener previously returned by [`Dom::add_event_listener`].
	fn remove_event_listener(&mut self, node: NodeId, listener: ListenerId) -> ReconcileResult<()>;

	/// Resolves `selector` or fails with [`ReconcileError::MissingElement`].
	fn require(&mut self, selector: &str) -> ReconcileResult<NodeId> {
		self.query_selector(selector)?
			.ok_or_else(|| ReconcileError::missing_element(selector))
	}

	/// Adds or removes `class` depending on `enabled`.
	fn toggle_class(&mut self, node: NodeId, class: &str, enabled: bool) -> ReconcileResult<()> {
		if enabled {
			self.add_class(node, class)
		} else {
			self.remove_class(node, class)
		}
	}
}
