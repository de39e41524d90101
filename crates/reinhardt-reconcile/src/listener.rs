//! Event callbacks and listener descriptors.
//!
//! An interface builds its named [`Callbacks`] once at mount time, then
//! describes which element/event pairs they are attached to with
//! [`Listener`]s. Listeners live from mount until teardown and are not part
//! of the update cycle.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::dom::{Dom, DomEvent, EventCallback, EventType, ListenerId, NodeId};
use crate::error::{ReconcileError, ReconcileResult};
use crate::settings;

/// Named event callbacks of one interface.
#[derive(Clone, Default)]
pub struct Callbacks {
	entries: IndexMap<String, EventCallback>,
}

impl Callbacks {
	/// Creates an empty set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a callback, replacing any previous one with the same name.
	pub fn with(mut self, name: impl Into<String>, callback: impl Fn(&DomEvent) + 'static) -> Self {
		self.insert(name, Rc::new(callback));
		self
	}

	/// Adds a callback, replacing any previous one with the same name.
	pub fn insert(&mut self, name: impl Into<String>, callback: EventCallback) {
		self.entries.insert(name.into(), callback);
	}

	/// Looks up a callback.
	pub fn get(&self, name: &str) -> Option<&EventCallback> {
		self.entries.get(name)
	}

	/// Looks up a callback or fails with [`ReconcileError::MissingCallback`].
	pub fn require(&self, name: &str) -> ReconcileResult<EventCallback> {
		self.get(name)
			.cloned()
			.ok_or_else(|| ReconcileError::MissingCallback(name.to_string()))
	}

	/// Number of callbacks.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns true when no callback is registered.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

impl fmt::Debug for Callbacks {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_set().entries(self.entries.keys()).finish()
	}
}

/// Declares that `callback` handles `event_type` events on `target`.
#[derive(Clone)]
pub struct Listener {
	/// Selector of the element to listen on.
	pub target: String,
	/// Event type.
	pub event_type: EventType,
	/// Handler.
	pub callback: EventCallback,
}

impl Listener {
	/// A listener for an explicit event type.
	pub fn new(target: impl Into<String>, event_type: impl Into<EventType>, callback: EventCallback) -> Self {
		Self {
			target: target.into(),
			event_type: event_type.into(),
			callback,
		}
	}

	/// A listener for the configured default event type (`click` unless
	/// changed in [`settings::EngineSettings`]).
	pub fn on_default(target: impl Into<String>, callback: EventCallback) -> Self {
		Self::new(target, settings::current().default_event, callback)
	}

	/// A listener wired to the named callback in `callbacks`.
	pub fn named(
		target: impl Into<String>,
		event_type: impl Into<EventType>,
		callbacks: &Callbacks,
		name: &str,
	) -> ReconcileResult<Self> {
		Ok(Self::new(target, event_type, callbacks.require(name)?))
	}
}

impl fmt::Debug for Listener {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Listener")
			.field("target", &self.target)
			.field("event_type", &self.event_type)
			.finish_non_exhaustive()
	}
}

/// A listener attached to a concrete node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachedListener {
	/// The node listened on.
	pub node: NodeId,
	/// Backend handle of the listener.
	pub id: ListenerId,
}

/// Attaches every listener.
///
/// A target selector that matches nothing fails with
/// [`ReconcileError::MissingElement`]. Listeners attached before the
/// failure are detached again.
pub fn attach_listeners(
	dom: &mut dyn Dom,
	listeners: &[Listener],
) -> ReconcileResult<Vec<AttachedListener>> {
	let mut attached = Vec::with_capacity(listeners.len());
	for listener in listeners {
		let result = dom.require(&listener.target).and_then(|node| {
			dom.add_event_listener(node, &listener.event_type, listener.callback.clone())
				.map(|id| AttachedListener { node, id })
		});
		match result {
			Ok(handle) => attached.push(handle),
			Err(err) => {
				detach_listeners(dom, &attached)?;
				return Err(err);
			}
		}
	}
	Ok(attached)
}

/// Detaches listeners. Listeners whose node is already gone are skipped.
pub fn detach_listeners(dom: &mut dyn Dom, attached: &[AttachedListener]) -> ReconcileResult<()> {
	for listener in attached {
		match dom.remove_event_listener(listener.node, listener.id) {
			Ok(()) | Err(ReconcileError::MissingNode { .. }) => {}
			Err(err) => return Err(err),
		}
	}
	Ok(())
}
