//! Binding updater behavior across whole update cycles.

mod common;

use reinhardt_reconcile::prelude::*;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

fn profile(force_update: bool) -> impl FnOnce(&State, &StateQueue) -> InterfaceSpec {
	move |state, _| {
		let markup = ElementSpec::new("article")
			.child(ElementSpec::new("h2").class("name").text(state["name"].as_str().unwrap_or_default()))
			.child(ElementSpec::new("input").class("email"))
			.child(ElementSpec::new("a").class("site"))
			.mount_at("body", Position::Append);
		InterfaceSpec::new(InterfaceProps::new("profile", markup).force_update(force_update)).bindings([
			Binding::text("[data-root=\"profile\"] .name", "name"),
			Binding::input("[data-root=\"profile\"] .email", "contact.email"),
			Binding::attribute("[data-root=\"profile\"] .site", "contact.site", |dom, node, value| {
				match value.and_then(Value::as_str) {
					Some(site) => dom.set_attribute(node, "href", site),
					None => dom.remove_attribute(node, "href"),
				}
			}),
			Binding::classes("[data-root=\"profile\"]", "online", |dom, node, value| {
				dom.toggle_class(node, "online", value == Some(&json!(true)))
			}),
		])
	}
}

#[fixture]
fn initial() -> Value {
	json!({
		"name": "Ada",
		"online": false,
		"contact": { "email": "", "site": null }
	})
}

fn next_state() -> Value {
	json!({
		"name": "Ada Lovelace",
		"online": true,
		"contact": { "email": "ada@example.com", "site": "https://example.com" }
	})
}

#[rstest]
fn test_same_state_twice_writes_once(initial: Value) {
	common::init_tracing();
	let mut app = App::mount(MemoryDom::new(), initial, profile(false)).unwrap();

	app.dom_mut().reset_writes();
	app.set_state(next_state()).unwrap();
	let first_writes = app.dom().writes();
	assert_eq!(app.root().last_report().applied, 4);
	assert_eq!(first_writes, 4);

	app.dom_mut().reset_writes();
	app.set_state(next_state()).unwrap();
	assert_eq!(app.root().last_report().applied, 0);
	assert_eq!(app.root().last_report().skipped, 4);
	assert_eq!(app.dom().writes(), 0);
}

#[rstest]
fn test_force_update_rewrites_every_cycle(initial: Value) {
	let mut app = App::mount(MemoryDom::new(), initial, profile(true)).unwrap();

	for _ in 0..3 {
		app.dom_mut().reset_writes();
		app.set_state(next_state()).unwrap();
		assert_eq!(app.root().last_report().applied, 4);
		assert_eq!(app.dom().writes(), 4);
	}
}

#[rstest]
fn test_written_values_are_visible(initial: Value) {
	let mut app = App::mount(MemoryDom::new(), initial, profile(false)).unwrap();
	app.set_state(next_state()).unwrap();

	let dom = app.dom_mut();
	let root = dom.require("[data-root=\"profile\"]").unwrap();
	let name = dom.require(".name").unwrap();
	let email = dom.require(".email").unwrap();
	let site = dom.require(".site").unwrap();

	assert!(dom.has_class(root, "online"));
	assert_eq!(dom.text_content(name).unwrap(), "Ada Lovelace");
	assert_eq!(dom.value(email), Some("ada@example.com"));
	assert_eq!(dom.attribute(site, "href"), Some("https://example.com"));
}

#[rstest]
#[case::name_only(json!({"name": "Grace"}), 1)]
#[case::nested_change(json!({"contact": {"email": "ada@example.com", "site": null}}), 1)]
#[case::nested_removal(json!({"contact": {"site": "https://example.com"}}), 2)]
#[case::nothing(json!({}), 0)]
fn test_only_changed_paths_are_applied(initial: Value, #[case] patch: Value, #[case] expected: usize) {
	let mut app = App::mount(MemoryDom::new(), initial.clone(), profile(false)).unwrap();
	let next = merged(&initial, &patch);

	app.set_state(next).unwrap();
	assert_eq!(app.root().last_report().applied, expected);
}

/// Shallow-merges each top-level key of `patch` into `base`, replacing
/// nested objects wholesale.
fn merged(base: &Value, patch: &Value) -> Value {
	let mut next = base.clone();
	if let (Some(target), Some(changes)) = (next.as_object_mut(), patch.as_object()) {
		for (key, value) in changes {
			target.insert(key.clone(), value.clone());
		}
	}
	next
}
