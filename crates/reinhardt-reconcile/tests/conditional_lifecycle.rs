//! Conditional unit lifecycle driven through whole update cycles.

mod common;

use common::{Journal, Record};
use reinhardt_reconcile::prelude::*;
use reinhardt_reconcile::store::Store;
use rstest::{fixture, rstest};
use serde_json::json;

fn banner_fallback() -> Fallback {
	Fallback::new(FallbackPlacement::inside("section", ".empty"), |_| {
		ElementSpec::new("p").class("empty").text("Nothing to show")
	})
}

fn banner_spec(journal: &Journal) -> ConditionalSpec<String> {
	ConditionalSpec::new(
		common::recorder(journal, ".list"),
		props(|state, _| state["label"].as_str().unwrap_or("banner").to_string()),
	)
	.when(|state| state["show"].as_bool() == Some(true))
	.fallback(banner_fallback())
}

#[fixture]
fn journal() -> Journal {
	common::init_tracing();
	Journal::default()
}

#[rstest]
fn test_false_true_false_sequence(journal: Journal) {
	let mut dom = common::list_document();
	let mut store = Store::new(json!({"show": false, "label": "a"}));

	let mut unit = ConditionalUnit::mount(&mut dom, banner_spec(&journal), store.current()).unwrap();
	assert!(!unit.is_mounted());
	assert_eq!(dom.query_all(".empty").unwrap().len(), 1);
	assert!(common::drain(&journal).is_empty());

	let b = json!({"show": true, "label": "b"});
	unit.update(&mut dom, store.commit(b.clone())).unwrap();
	assert!(unit.is_mounted());
	assert!(dom.query_all(".empty").unwrap().is_empty());
	assert_eq!(common::drain(&journal), vec![Record::Created("b".into(), b)]);
	assert_eq!(common::rendered_keys(&dom), vec!["b"]);

	unit.update(&mut dom, store.commit(json!({"show": false, "label": "c"})))
		.unwrap();
	assert!(!unit.is_mounted());
	assert_eq!(common::drain(&journal), vec![Record::Removed("b".into())]);
	assert_eq!(dom.query_all(".empty").unwrap().len(), 1);
	assert!(common::rendered_keys(&dom).is_empty());
}

#[rstest]
fn test_repeated_false_keeps_single_fallback(journal: Journal) {
	let mut dom = common::list_document();
	let mut store = Store::new(json!({"show": false}));
	let mut unit = ConditionalUnit::mount(&mut dom, banner_spec(&journal), store.current()).unwrap();

	for _ in 0..3 {
		unit.update(&mut dom, store.commit(json!({"show": false}))).unwrap();
	}

	assert_eq!(dom.query_all(".empty").unwrap().len(), 1);
	assert!(common::drain(&journal).is_empty());
}

#[rstest]
fn test_mounted_child_receives_every_later_cycle(journal: Journal) {
	let mut dom = common::list_document();
	let mut store = Store::new(json!({"show": true, "label": "x", "n": 0}));
	let mut unit = ConditionalUnit::mount(&mut dom, banner_spec(&journal), store.current()).unwrap();
	common::drain(&journal);

	for n in 1..=3 {
		unit.update(&mut dom, store.commit(json!({"show": true, "label": "x", "n": n})))
			.unwrap();
	}

	let updates: Vec<_> = common::drain(&journal)
		.into_iter()
		.map(|record| match record {
			Record::Updated(_, state) => state["n"].as_i64(),
			other => panic!("unexpected {other:?}"),
		})
		.collect();
	assert_eq!(updates, vec![Some(1), Some(2), Some(3)]);
}

#[rstest]
fn test_teardown_is_idempotent(journal: Journal) {
	let mut dom = common::list_document();
	let state = json!({"show": true, "label": "once"});
	let mut unit = ConditionalUnit::mount(&mut dom, banner_spec(&journal), &state).unwrap();
	common::drain(&journal);

	unit.remove(&mut dom).unwrap();
	unit.remove(&mut dom).unwrap();

	assert_eq!(common::drain(&journal), vec![Record::Removed("once".into())]);
	assert!(!unit.is_mounted());
}
