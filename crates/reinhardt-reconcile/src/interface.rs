//! Root assembler.
//!
//! An [`Interface`] renders its own root markup, wires event listeners,
//! mounts its child units, and afterwards drives all of them as one
//! [`Mounted`] subtree.
//!
//! ## Lifecycle
//!
//! - **Mount**: render the root markup (tagged with the root attribute),
//!   build callbacks, build listener descriptors, build children, then
//!   attach the listeners.
//! - **Update**: apply the bindings, then forward the cycle to every child
//!   in declaration order.
//! - **Teardown**: detach listeners, tear children down, remove the root
//!   node. Later calls do nothing.
//!
//! ## Example
//!
//! ```
//! use reinhardt_reconcile::interface::{Interface, InterfaceProps, InterfaceSpec};
//! use reinhardt_reconcile::markup::ElementSpec;
//! use reinhardt_reconcile::binding::Binding;
//! use reinhardt_reconcile::{Cycle, MemoryDom, Mounted, Position};
//! use serde_json::json;
//!
//! let mut dom = MemoryDom::new();
//! let markup = ElementSpec::new("section")
//! 	.child(ElementSpec::new("h1").class("title"))
//! 	.mount_at("body", Position::Append);
//! let spec = InterfaceSpec::new(InterfaceProps::new("header", markup))
//! 	.binding(Binding::text("[data-root=\"header\"] .title", "title"));
//!
//! let first = json!({"title": ""});
//! let mut header = Interface::mount(&mut dom, spec, &first).unwrap();
//!
//! let next = json!({"title": "Todos"});
//! header.update(&mut dom, Cycle::new(&first, &next)).unwrap();
//! assert_eq!(
//! 	dom.body_html(),
//! 	"<section data-root=\"header\"><h1 class=\"title\">Todos</h1></section>"
//! );
//!
//! header.remove(&mut dom).unwrap();
//! assert_eq!(dom.body_html(), "");
//! ```

use std::fmt;

use crate::binding::{self, Binding, BindingReport};
use crate::component::{self, Mounted};
use crate::dom::{Dom, NodeId};
use crate::error::{ReconcileError, ReconcileResult};
use crate::listener::{self, AttachedListener, Callbacks, Listener};
use crate::markup::{self, ElementSpec};
use crate::settings;
use crate::state::{Cycle, State};

/// Identity and markup of an interface.
#[derive(Debug, Clone)]
pub struct InterfaceProps {
	/// Root name, written to the root attribute of the root element.
	pub name: String,
	/// Re-apply every binding on every cycle.
	pub force_update: bool,
	/// Root markup. Must describe an element, not a fragment.
	pub markup: ElementSpec,
}

impl InterfaceProps {
	/// Props with `force_update` off.
	pub fn new(name: impl Into<String>, markup: ElementSpec) -> Self {
		Self {
			name: name.into(),
			force_update: false,
			markup,
		}
	}

	/// Sets `force_update`.
	pub fn force_update(mut self, force_update: bool) -> Self {
		self.force_update = force_update;
		self
	}
}

/// What child factories get to see at mount time.
#[derive(Debug, Clone, Copy)]
pub struct ChildContext<'a> {
	/// Selector of the interface's root element.
	pub root: &'a str,
	/// The interface's callbacks.
	pub callbacks: &'a Callbacks,
	/// The snapshot the interface is mounted with.
	pub state: &'a State,
}

impl ChildContext<'_> {
	/// Scopes `selector` to descendants of the root element.
	pub fn within(&self, selector: &str) -> String {
		format!("{} {}", self.root, selector)
	}
}

/// Builds the callbacks of an interface.
pub type CallbacksFactory = Box<dyn FnOnce() -> Callbacks>;

/// Builds the listener descriptors of an interface.
pub type ListenersFactory = Box<dyn FnOnce(&ChildContext<'_>) -> ReconcileResult<Vec<Listener>>>;

/// Builds the children of an interface.
pub type ComponentsFactory =
	Box<dyn FnOnce(&mut dyn Dom, &ChildContext<'_>) -> ReconcileResult<Vec<Box<dyn Mounted>>>>;

/// Everything needed to mount an [`Interface`].
pub struct InterfaceSpec {
	/// Identity and markup.
	pub props: InterfaceProps,
	/// Bindings applied on every update.
	pub bindings: Vec<Binding>,
	/// Callback factory.
	pub callbacks: Option<CallbacksFactory>,
	/// Listener factory.
	pub listeners: Option<ListenersFactory>,
	/// Children factory.
	pub components: Option<ComponentsFactory>,
}

impl InterfaceSpec {
	/// A spec with no bindings, listeners or children.
	pub fn new(props: InterfaceProps) -> Self {
		Self {
			props,
			bindings: Vec::new(),
			callbacks: None,
			listeners: None,
			components: None,
		}
	}

	/// Adds a binding.
	pub fn binding(mut self, binding: Binding) -> Self {
		self.bindings.push(binding);
		self
	}

	/// Adds several bindings.
	pub fn bindings(mut self, bindings: impl IntoIterator<Item = Binding>) -> Self {
		self.bindings.extend(bindings);
		self
	}

	/// Sets the callback factory.
	pub fn callbacks(mut self, factory: impl FnOnce() -> Callbacks + 'static) -> Self {
		self.callbacks = Some(Box::new(factory));
		self
	}

	/// Sets the listener factory.
	pub fn listeners(
		mut self,
		factory: impl FnOnce(&ChildContext<'_>) -> ReconcileResult<Vec<Listener>> + 'static,
	) -> Self {
		self.listeners = Some(Box::new(factory));
		self
	}

	/// Sets the children factory.
	pub fn components(
		mut self,
		factory: impl FnOnce(&mut dyn Dom, &ChildContext<'_>) -> ReconcileResult<Vec<Box<dyn Mounted>>>
		+ 'static,
	) -> Self {
		self.components = Some(Box::new(factory));
		self
	}
}

/// A mounted interface.
pub struct Interface {
	name: String,
	root: NodeId,
	root_selector: String,
	force_update: bool,
	bindings: Vec<Binding>,
	callbacks: Callbacks,
	listeners: Vec<AttachedListener>,
	children: Vec<Box<dyn Mounted>>,
	last_report: BindingReport,
	removed: bool,
}

impl fmt::Debug for Interface {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Interface")
			.field("name", &self.name)
			.field("root", &self.root)
			.field("listeners", &self.listeners.len())
			.field("children", &self.children.len())
			.field("removed", &self.removed)
			.finish()
	}
}

impl Interface {
	/// Mounts an interface with `state` as its initial snapshot.
	///
	/// Bindings are not applied at mount time; the markup is expected to be
	/// built from `state` already.
	pub fn mount(dom: &mut dyn Dom, spec: InterfaceSpec, state: &State) -> ReconcileResult<Self> {
		let InterfaceSpec {
			props,
			bindings,
			callbacks,
			listeners,
			components,
		} = spec;

		if props.markup.tag().is_none() {
			return Err(ReconcileError::InvalidRoot { name: props.name });
		}
		let settings = settings::current();
		let root_selector = settings.root_selector(&props.name);
		let markup = props
			.markup
			.attr(settings.root_attribute.as_str(), props.name.as_str());
		let root = markup::render_ui(dom, &markup)?;

		let callbacks = callbacks.map(|build| build()).unwrap_or_default();
		let context = ChildContext {
			root: &root_selector,
			callbacks: &callbacks,
			state,
		};
		let listeners = match listeners {
			Some(build) => build(&context)?,
			None => Vec::new(),
		};
		let children = match components {
			Some(build) => build(dom, &context)?,
			None => Vec::new(),
		};
		let attached = listener::attach_listeners(dom, &listeners)?;

		tracing::debug!(
			name = %props.name,
			listeners = attached.len(),
			children = children.len(),
			"interface mounted"
		);

		Ok(Self {
			name: props.name,
			root,
			root_selector,
			force_update: props.force_update,
			bindings,
			callbacks,
			listeners: attached,
			children,
			last_report: BindingReport::default(),
			removed: false,
		})
	}

	/// Mounts an interface as a boxed child, for use in component factories.
	pub fn boxed(
		dom: &mut dyn Dom,
		spec: InterfaceSpec,
		state: &State,
	) -> ReconcileResult<Box<dyn Mounted>> {
		Ok(Box::new(Self::mount(dom, spec, state)?))
	}

	/// The root name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// The root element.
	pub fn root(&self) -> NodeId {
		self.root
	}

	/// Selector matching the root element.
	pub fn root_selector(&self) -> &str {
		&self.root_selector
	}

	/// The callbacks built at mount time.
	pub fn callbacks(&self) -> &Callbacks {
		&self.callbacks
	}

	/// Binding counts of the last update.
	pub fn last_report(&self) -> BindingReport {
		self.last_report
	}

	/// Number of child units.
	pub fn child_count(&self) -> usize {
		self.children.len()
	}

	/// Returns true once the interface has been torn down.
	pub fn is_removed(&self) -> bool {
		self.removed
	}
}

impl Mounted for Interface {
	fn update(&mut self, dom: &mut dyn Dom, cycle: Cycle<'_>) -> ReconcileResult<()> {
		if self.removed {
			return Ok(());
		}
		let span = tracing::debug_span!("interface_update", name = %self.name);
		let _enter = span.enter();

		self.last_report = binding::apply_bindings(dom, &self.bindings, cycle, self.force_update)?;
		if settings::current().trace_cycles {
			tracing::debug!(
				applied = self.last_report.applied,
				skipped = self.last_report.skipped,
				"bindings applied"
			);
		}
		component::update_all(&mut self.children, dom, cycle)
	}

	fn remove(&mut self, dom: &mut dyn Dom) -> ReconcileResult<()> {
		if self.removed {
			return Ok(());
		}
		self.removed = true;

		listener::detach_listeners(dom, &std::mem::take(&mut self.listeners))?;
		component::remove_all(&mut self.children, dom)?;
		self.children.clear();
		match dom.remove_node(self.root) {
			Ok(()) | Err(ReconcileError::MissingNode { .. }) => {}
			Err(err) => return Err(err),
		}
		tracing::debug!(name = %self.name, "interface removed");
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::component::lifecycle::{self, Event};
	use crate::component::props;
	use crate::conditional::{ConditionalSpec, ConditionalUnit};
	use crate::dom::{EventType, MemoryDom, Position};
	use crate::settings::EngineSettings;
	use rstest::{fixture, rstest};
	use serde_json::json;
	use std::cell::Cell;
	use std::rc::Rc;

	#[fixture]
	fn dom() -> MemoryDom {
		MemoryDom::new()
	}

	fn counter_markup(state: &State) -> ElementSpec {
		ElementSpec::new("div")
			.child(ElementSpec::new("span").class("count").text(state["count"].to_string()))
			.child(ElementSpec::new("button").class("inc"))
			.mount_at("body", Position::Append)
	}

	fn counter(state: &State, clicks: &Rc<Cell<usize>>) -> InterfaceSpec {
		let clicks = Rc::clone(clicks);
		InterfaceSpec::new(InterfaceProps::new("counter", counter_markup(state)))
			.binding(Binding::text("[data-root=\"counter\"] .count", "count"))
			.callbacks(move || Callbacks::new().with("inc", move |_| clicks.set(clicks.get() + 1)))
			.listeners(|ctx| {
				Ok(vec![Listener::named(
					ctx.within(".inc"),
					EventType::Click,
					ctx.callbacks,
					"inc",
				)?])
			})
	}

	#[rstest]
	fn test_mount_renders_root_and_listeners(mut dom: MemoryDom) {
		let clicks = Rc::new(Cell::new(0));
		let state = json!({"count": 0});
		let interface = Interface::mount(&mut dom, counter(&state, &clicks), &state).unwrap();

		assert_eq!(interface.root_selector(), "[data-root=\"counter\"]");
		assert_eq!(
			dom.body_html(),
			"<div data-root=\"counter\"><span class=\"count\">0</span><button class=\"inc\"></button></div>"
		);
		let button = dom.require("[data-root=\"counter\"] .inc").unwrap();
		dom.dispatch(button, EventType::Click).unwrap();
		assert_eq!(clicks.get(), 1);
	}

	#[rstest]
	fn test_update_applies_changed_bindings_once(mut dom: MemoryDom) {
		let clicks = Rc::new(Cell::new(0));
		let first = json!({"count": 0});
		let second = json!({"count": 1});
		let mut interface = Interface::mount(&mut dom, counter(&first, &clicks), &first).unwrap();

		interface.update(&mut dom, Cycle::new(&first, &second)).unwrap();
		assert_eq!(interface.last_report(), BindingReport { applied: 1, skipped: 0 });

		interface.update(&mut dom, Cycle::new(&second, &second)).unwrap();
		assert_eq!(interface.last_report(), BindingReport { applied: 0, skipped: 1 });

		let count = dom.require(".count").unwrap();
		assert_eq!(dom.text_content(count).unwrap(), "1");
	}

	#[rstest]
	fn test_force_update_rewrites_unchanged(mut dom: MemoryDom) {
		let state = json!({"count": 3});
		let mut spec = counter(&state, &Rc::new(Cell::new(0)));
		spec.props.force_update = true;
		let mut interface = Interface::mount(&mut dom, spec, &state).unwrap();

		for _ in 0..2 {
			dom.reset_writes();
			interface.update(&mut dom, Cycle::unchanged(&state)).unwrap();
			assert_eq!(interface.last_report().applied, 1);
			assert_eq!(dom.writes(), 1);
		}
	}

	#[rstest]
	fn test_bindings_run_before_children(mut dom: MemoryDom) {
		let log = lifecycle::Log::default();
		let child_log = Rc::clone(&log);
		let state = json!({"count": 0});
		let spec = counter(&state, &Rc::new(Cell::new(0))).components(move |dom, ctx| {
			let unit = ConditionalUnit::mount(
				dom,
				ConditionalSpec::new(lifecycle::factory(&child_log), props(|_, _| "child".to_string())),
				ctx.state,
			)?;
			Ok(vec![Box::new(unit) as Box<dyn Mounted>])
		});
		let mut interface = Interface::mount(&mut dom, spec, &state).unwrap();
		assert_eq!(interface.child_count(), 1);
		lifecycle::take(&log);

		let next = json!({"count": 5});
		interface.update(&mut dom, Cycle::new(&state, &next)).unwrap();
		assert_eq!(lifecycle::take(&log), vec![Event::Updated("child".into(), next.clone())]);
		assert_eq!(interface.last_report().applied, 1);
	}

	#[rstest]
	fn test_teardown_order_and_idempotence(mut dom: MemoryDom) {
		let log = lifecycle::Log::default();
		let child_log = Rc::clone(&log);
		let clicks = Rc::new(Cell::new(0));
		let state = json!({"count": 0});
		let spec = counter(&state, &clicks).components(move |dom, ctx| {
			let unit = ConditionalUnit::mount(
				dom,
				ConditionalSpec::new(lifecycle::factory(&child_log), props(|_, _| "child".to_string())),
				ctx.state,
			)?;
			Ok(vec![Box::new(unit) as Box<dyn Mounted>])
		});
		let mut interface = Interface::mount(&mut dom, spec, &state).unwrap();
		lifecycle::take(&log);

		interface.remove(&mut dom).unwrap();
		assert!(interface.is_removed());
		assert_eq!(lifecycle::take(&log), vec![Event::Removed("child".into())]);
		assert_eq!(dom.body_html(), "");
		assert_eq!(dom.listener_count(), 0);

		interface.remove(&mut dom).unwrap();
		interface.update(&mut dom, Cycle::unchanged(&state)).unwrap();
		assert!(lifecycle::take(&log).is_empty());
	}

	#[rstest]
	fn test_unknown_callback_fails_mount(mut dom: MemoryDom) {
		let state = json!({"count": 0});
		let spec = InterfaceSpec::new(InterfaceProps::new("counter", counter_markup(&state)))
			.listeners(|ctx| Ok(vec![Listener::named(ctx.within(".inc"), "click", ctx.callbacks, "dec")?]));

		let err = Interface::mount(&mut dom, spec, &state).unwrap_err();
		assert!(matches!(err, ReconcileError::MissingCallback(name) if name == "dec"));
	}

	#[rstest]
	fn test_missing_listener_target_fails_mount(mut dom: MemoryDom) {
		let state = json!({"count": 0});
		let spec = InterfaceSpec::new(InterfaceProps::new("counter", counter_markup(&state)))
			.callbacks(|| Callbacks::new().with("inc", |_| {}))
			.listeners(|ctx| {
				Ok(vec![Listener::named(ctx.within(".missing"), "click", ctx.callbacks, "inc")?])
			});

		let err = Interface::mount(&mut dom, spec, &state).unwrap_err();
		assert!(matches!(err, ReconcileError::MissingElement { .. }));
	}

	#[rstest]
	fn test_fragment_markup_is_rejected(mut dom: MemoryDom) {
		let spec = InterfaceSpec::new(InterfaceProps::new("list", ElementSpec::fragment()));
		let err = Interface::mount(&mut dom, spec, &json!({})).unwrap_err();
		assert!(matches!(err, ReconcileError::InvalidRoot { name } if name == "list"));
	}

	#[rstest]
	fn test_root_attribute_follows_settings(mut dom: MemoryDom) {
		settings::configure(EngineSettings {
			root_attribute: "data-view".to_string(),
			..EngineSettings::default()
		});
		let state = json!({"count": 0});
		let spec = InterfaceSpec::new(InterfaceProps::new("counter", counter_markup(&state)));
		let interface = Interface::mount(&mut dom, spec, &state);
		settings::reset();

		assert_eq!(interface.unwrap().root_selector(), "[data-view=\"counter\"]");
		assert!(dom.require("[data-view=\"counter\"]").is_ok());
	}

	#[rstest]
	fn test_names_with_commas_and_quotes_resolve(mut dom: MemoryDom) {
		let name = r#"list "a,b""#;
		let root = settings::current().root_selector(name);
		let clicks = Rc::new(Cell::new(0));
		let handler_clicks = Rc::clone(&clicks);
		let state = json!({"count": 0});
		let spec = InterfaceSpec::new(InterfaceProps::new(name, counter_markup(&state)))
			.binding(Binding::text(format!("{root} .count"), "count"))
			.callbacks(move || Callbacks::new().with("inc", move |_| handler_clicks.set(handler_clicks.get() + 1)))
			.listeners(|ctx| Ok(vec![Listener::named(ctx.within(".inc"), "click", ctx.callbacks, "inc")?]));
		let mut interface = Interface::mount(&mut dom, spec, &state).unwrap();

		let next = json!({"count": 2});
		interface.update(&mut dom, Cycle::new(&state, &next)).unwrap();

		let count = dom.require(&format!("{root} .count")).unwrap();
		assert_eq!(dom.text_content(count).unwrap(), "2");
		let button = dom.require(&format!("{root} .inc")).unwrap();
		dom.dispatch(button, EventType::Click).unwrap();
		assert_eq!(clicks.get(), 1);

		interface.remove(&mut dom).unwrap();
		assert_eq!(dom.body_html(), "");
	}
}
