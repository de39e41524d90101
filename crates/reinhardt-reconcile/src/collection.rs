//! Keyed collection reconciler.
//!
//! A [`KeyedCollection`] derives an item list from every snapshot and keeps
//! one mounted child per distinct [`ItemKey`]. Each cycle runs three passes
//! in a fixed order:
//!
//! 1. children whose key left the list are torn down,
//! 2. surviving children receive the cycle,
//! 3. keys without a child get a new one, created from the cycle's next
//!    snapshot.
//!
//! Children are never moved. New children are appended after the survivors,
//! whatever position their item has in the list.

use std::fmt;

use indexmap::IndexMap;

use crate::component::{ComponentFactory, Mount, Mounted, PropsFactory};
use crate::dom::Dom;
use crate::error::ReconcileResult;
use crate::fallback::Fallback;
use crate::item::{self, Filter, FilterSelection, Item, ItemKey, ItemsList};
use crate::state::{Cycle, State};

/// Configuration of a [`KeyedCollection`].
pub struct CollectionSpec<P> {
	/// Derives the item list from a snapshot.
	pub items: ItemsList,
	/// Narrows the list to the active filter case.
	pub filter: Option<Filter>,
	/// Child factory.
	pub component: ComponentFactory<P>,
	/// Child configuration factory; always receives the child's item.
	pub props: PropsFactory<P>,
	/// Markup shown while the list is empty.
	pub fallback: Option<Fallback>,
}

impl<P> CollectionSpec<P> {
	/// A collection over `items`.
	pub fn new(items: ItemsList, component: ComponentFactory<P>, props: PropsFactory<P>) -> Self {
		Self {
			items,
			filter: None,
			component,
			props,
			fallback: None,
		}
	}

	/// Keeps only the items accepted by the active filter case.
	pub fn filter(mut self, filter: impl Fn(&State) -> FilterSelection + 'static) -> Self {
		self.filter = Some(std::rc::Rc::new(filter));
		self
	}

	/// Shows `fallback` while the list is empty.
	pub fn fallback(mut self, fallback: Fallback) -> Self {
		self.fallback = Some(fallback);
		self
	}
}

/// A mounted child and the key it was created for.
pub struct Descriptor {
	/// Identity key.
	pub id: ItemKey,
	handle: Box<dyn Mounted>,
}

impl fmt::Debug for Descriptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Descriptor")
			.field("id", &self.id)
			.finish_non_exhaustive()
	}
}

/// Keeps one mounted child per item key.
pub struct KeyedCollection<P> {
	spec: CollectionSpec<P>,
	mounted: IndexMap<ItemKey, Descriptor>,
}

impl<P> KeyedCollection<P> {
	/// Derives the item list from `state` and mounts one child per item.
	pub fn mount(dom: &mut dyn Dom, spec: CollectionSpec<P>, state: &State) -> ReconcileResult<Self> {
		let mut collection = Self {
			spec,
			mounted: IndexMap::new(),
		};
		let items = collection.derive(state)?;
		if items.is_empty()
			&& let Some(fallback) = &collection.spec.fallback
		{
			fallback.render_fallback(dom, state)?;
		}
		collection.create_missing(dom, state, &items)?;
		Ok(collection)
	}

	/// Keys of the mounted children, in mount order.
	pub fn mounted_ids(&self) -> impl Iterator<Item = &ItemKey> {
		self.mounted.keys()
	}

	/// Number of mounted children.
	pub fn len(&self) -> usize {
		self.mounted.len()
	}

	/// Returns true when no child is mounted.
	pub fn is_empty(&self) -> bool {
		self.mounted.is_empty()
	}

	/// Computes this cycle's items, keyed by id.
	///
	/// When an id occurs more than once only its first entry is kept.
	fn derive(&self, state: &State) -> ReconcileResult<IndexMap<ItemKey, Item>> {
		let mut list = (self.spec.items)(state)?;
		if let Some(filter) = &self.spec.filter {
			list = item::filter_list(list, &filter(state))?;
		}

		let mut items = IndexMap::with_capacity(list.len());
		for entry in list {
			if items.contains_key(&entry.id) {
				tracing::warn!(id = %entry.id, "duplicate item id; keeping the first entry");
				continue;
			}
			items.insert(entry.id.clone(), entry);
		}
		Ok(items)
	}

	fn create_missing(
		&mut self,
		dom: &mut dyn Dom,
		state: &State,
		items: &IndexMap<ItemKey, Item>,
	) -> ReconcileResult<()> {
		for (id, entry) in items {
			if self.mounted.contains_key(id) {
				continue;
			}
			let props = (self.spec.props)(state, Some(entry));
			let handle = (self.spec.component)(
				dom,
				Mount {
					initial_state: state,
					props,
					item: Some(entry),
				},
			)?;
			tracing::debug!(%id, "mounted keyed child");
			self.mounted.insert(
				id.clone(),
				Descriptor {
					id: id.clone(),
					handle,
				},
			);
		}
		Ok(())
	}
}

impl<P> Mounted for KeyedCollection<P> {
	fn update(&mut self, dom: &mut dyn Dom, cycle: Cycle<'_>) -> ReconcileResult<()> {
		let items = self.derive(cycle.next)?;

		if let Some(fallback) = &self.spec.fallback {
			if items.is_empty() {
				fallback.render_fallback(dom, cycle.next)?;
			} else {
				fallback.remove_fallback(dom)?;
			}
		}

		let gone: Vec<ItemKey> = self
			.mounted
			.keys()
			.filter(|id| !items.contains_key(*id))
			.cloned()
			.collect();
		for id in gone {
			if let Some(mut descriptor) = self.mounted.shift_remove(&id) {
				tracing::debug!(%id, "removing keyed child");
				descriptor.handle.remove(dom)?;
			}
		}

		for descriptor in self.mounted.values_mut() {
			descriptor.handle.update(dom, cycle)?;
		}

		self.create_missing(dom, cycle.next, &items)
	}

	fn remove(&mut self, dom: &mut dyn Dom) -> ReconcileResult<()> {
		for (_, mut descriptor) in std::mem::take(&mut self.mounted) {
			descriptor.handle.remove(dom)?;
		}
		Ok(())
	}
}
