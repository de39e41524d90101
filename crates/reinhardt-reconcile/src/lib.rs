//! Reinhardt Reconcile - State-driven DOM reconciliation
//!
//! A small reconciliation engine: given an immutable state snapshot and a
//! declarative description of the UI, it mounts, updates and unmounts
//! DOM-backed component instances while keeping redundant writes to a
//! minimum.
//!
//! ## Features
//!
//! - **Binding diffs**: state paths bound to elements are written only when
//!   their value changed between the previous and the next snapshot
//! - **Conditional units**: one child mounted while a predicate holds, with
//!   an optional fallback
//! - **Keyed collections**: one child per item id, identity preserved across
//!   cycles, removals before creations
//! - **Backend agnostic**: everything goes through the [`Dom`] trait; a
//!   headless [`MemoryDom`] ships for tests and server rendering, and
//!   `WebDom` drives the browser on `wasm32`
//!
//! ## Architecture
//!
//! - [`state`]: snapshots, paths and update cycles
//! - [`store`]: previous/current snapshot history
//! - [`dom`]: DOM capability interface and backends
//! - [`markup`]: declarative element construction
//! - [`binding`]: binding updater
//! - [`conditional`]: conditional single-child unit
//! - [`collection`]: keyed collection reconciler
//! - [`interface`]: root assembler
//! - [`app`]: driver owning the backend, the store and the root
//!
//! ## Update cycle
//!
//! Execution is single-threaded and synchronous. Each cycle is a depth-first
//! walk: an interface applies its bindings, then forwards the cycle to its
//! children in declaration order. Within a keyed collection, removals are
//! processed before updates and creations. A failing cycle stops at the
//! first error; writes made before it stay applied.
//!
//! ## Example
//!
//! ```
//! use reinhardt_reconcile::prelude::*;
//! use serde_json::json;
//!
//! fn todo_item(dom: &mut dyn Dom, mount: Mount<'_, ()>) -> ReconcileResult<Box<dyn Mounted>> {
//! 	let item = mount.item.expect("keyed children get their item");
//! 	let title = item.get("title").and_then(|t| t.as_str()).unwrap_or_default();
//! 	let markup = ElementSpec::new("li")
//! 		.text(title)
//! 		.mount_at("[data-root=\"todos\"] ul", Position::Append);
//! 	Interface::boxed(
//! 		dom,
//! 		InterfaceSpec::new(InterfaceProps::new(format!("todo-{}", item.id), markup)),
//! 		mount.initial_state,
//! 	)
//! }
//!
//! let initial = json!({"todos": [{"id": 1, "title": "Write docs"}]});
//! let mut app = App::mount(MemoryDom::new(), initial, |_, _| {
//! 	let markup = ElementSpec::new("section")
//! 		.child(ElementSpec::new("ul"))
//! 		.mount_at("body", Position::Append);
//! 	InterfaceSpec::new(InterfaceProps::new("todos", markup)).components(|dom, ctx| {
//! 		let spec = CollectionSpec::new(items_at("todos"), component(todo_item), props(|_, _| ()));
//! 		Ok(vec![Box::new(KeyedCollection::mount(dom, spec, ctx.state)?) as Box<dyn Mounted>])
//! 	})
//! })
//! .unwrap();
//!
//! app.update(|_| json!({"todos": [{"id": 1, "title": "Write docs"}, {"id": 2, "title": "Ship"}]}))
//! 	.unwrap();
//! assert_eq!(app.dom().query_all("li").unwrap().len(), 2);
//! ```

#![warn(missing_docs)]

pub mod app;
pub mod binding;
pub mod collection;
pub mod component;
pub mod conditional;
pub mod dom;
pub mod error;
pub mod fallback;
pub mod interface;
pub mod item;
pub mod listener;
pub mod markup;
pub mod settings;
pub mod state;
pub mod store;

/// Commonly used types.
pub mod prelude {
	pub use crate::app::{App, StateQueue};
	pub use crate::binding::{Action, Binding, BindingKind, apply_bindings};
	pub use crate::collection::{CollectionSpec, KeyedCollection};
	pub use crate::component::{Mount, Mounted, component, props};
	pub use crate::conditional::{ConditionalSpec, ConditionalUnit};
	pub use crate::dom::{Dom, DomEvent, EventType, MemoryDom, NodeId, Position};
	pub use crate::error::{ReconcileError, ReconcileResult};
	pub use crate::fallback::{Fallback, FallbackPlacement};
	pub use crate::interface::{ChildContext, Interface, InterfaceProps, InterfaceSpec};
	pub use crate::item::{FilterCase, FilterSelection, Item, ItemKey, items_at};
	pub use crate::listener::{Callbacks, Listener};
	pub use crate::markup::ElementSpec;
	pub use crate::state::{Cycle, State, StatePath};
}

pub use app::App;
pub use component::Mounted;
#[cfg(target_arch = "wasm32")]
pub use dom::WebDom;
pub use dom::{Dom, DomEvent, EventType, MemoryDom, NodeId, Position};
pub use error::{ReconcileError, ReconcileResult};
pub use interface::{Interface, InterfaceSpec};
pub use settings::EngineSettings;
pub use state::{Cycle, State};
pub use store::{PreviousState, Store};
