//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use reinhardt_reconcile::component::ComponentFactory;
use reinhardt_reconcile::markup::{self, ElementSpec};
use reinhardt_reconcile::prelude::*;
use tracing_subscriber::EnvFilter;

/// Installs a test-writer subscriber once per binary.
pub fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::from_default_env()
				.add_directive("reinhardt_reconcile=debug".parse().unwrap()),
		)
		.with_test_writer()
		.try_init();
}

/// One lifecycle event of a [`Recorder`].
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
	Created(String, State),
	Updated(String, State),
	Removed(String),
}

/// Lifecycle events in the order they happened.
pub type Journal = Rc<RefCell<Vec<Record>>>;

/// Drains the journal.
pub fn drain(journal: &Journal) -> Vec<Record> {
	std::mem::take(&mut *journal.borrow_mut())
}

/// A child that renders `<li data-key="...">` and journals its lifecycle.
pub struct Recorder {
	label: String,
	node: NodeId,
	journal: Journal,
	removed: bool,
}

impl Mounted for Recorder {
	fn update(&mut self, _dom: &mut dyn Dom, cycle: Cycle<'_>) -> ReconcileResult<()> {
		self.journal
			.borrow_mut()
			.push(Record::Updated(self.label.clone(), cycle.next.clone()));
		Ok(())
	}

	fn remove(&mut self, dom: &mut dyn Dom) -> ReconcileResult<()> {
		if self.removed {
			return Ok(());
		}
		self.removed = true;
		dom.remove_node(self.node)?;
		self.journal.borrow_mut().push(Record::Removed(self.label.clone()));
		Ok(())
	}
}

/// A factory for [`Recorder`]s appending to `target`; props are the label.
pub fn recorder(journal: &Journal, target: &str) -> ComponentFactory<String> {
	let journal = Rc::clone(journal);
	let target = target.to_string();
	component(move |dom, mount: Mount<'_, String>| {
		let spec = ElementSpec::new("li")
			.attr("data-key", mount.props.as_str())
			.text(mount.props.as_str())
			.mount_at(target.as_str(), Position::Append);
		let node = markup::render_ui(dom, &spec)?;
		journal
			.borrow_mut()
			.push(Record::Created(mount.props.clone(), mount.initial_state.clone()));
		let recorder: Box<dyn Mounted> = Box::new(Recorder {
			label: mount.props,
			node,
			journal: Rc::clone(&journal),
			removed: false,
		});
		Ok(recorder)
	})
}

/// Props factory labelling keyed children with their item id.
pub fn label_by_id() -> reinhardt_reconcile::component::PropsFactory<String> {
	props(|_, item| item.map(|i| i.id.to_string()).unwrap_or_default())
}

/// A document with `<section><ul class="list"></ul></section>` in its body.
pub fn list_document() -> MemoryDom {
	let mut dom = MemoryDom::new();
	let section = ElementSpec::new("section")
		.child(ElementSpec::new("ul").class("list"))
		.mount_at("body", Position::Append);
	markup::render_ui(&mut dom, &section).unwrap();
	dom
}

/// The `data-key`s of the rendered list items, in document order.
pub fn rendered_keys(dom: &MemoryDom) -> Vec<String> {
	dom.query_all("li[data-key]")
		.unwrap()
		.into_iter()
		.filter_map(|li| dom.attribute(li, "data-key").map(str::to_string))
		.collect()
}
