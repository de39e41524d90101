//! Item lists derived from state.
//!
//! A keyed collection renders one child per [`Item`]. Items are recomputed
//! from the snapshot every cycle and are only ever compared by [`ItemKey`].

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::error::{ReconcileError, ReconcileResult};
use crate::state::{self, State, StatePath};

/// Identity key of an item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemKey {
	/// An integer id.
	Int(i64),
	/// A string id.
	Str(String),
}

impl ItemKey {
	/// Extracts a key from a JSON value, if it is an integer or a string.
	pub fn from_value(value: &Value) -> Option<Self> {
		match value {
			Value::Number(n) => n.as_i64().map(Self::Int),
			Value::String(s) => Some(Self::Str(s.clone())),
			_ => None,
		}
	}
}

impl fmt::Display for ItemKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Int(n) => write!(f, "{n}"),
			Self::Str(s) => f.write_str(s),
		}
	}
}

impl From<i64> for ItemKey {
	fn from(n: i64) -> Self {
		Self::Int(n)
	}
}

impl From<&str> for ItemKey {
	fn from(s: &str) -> Self {
		Self::Str(s.to_string())
	}
}

impl From<String> for ItemKey {
	fn from(s: String) -> Self {
		Self::Str(s)
	}
}

/// One entry of an item list: an identity key plus the entry's data.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
	/// Identity key.
	pub id: ItemKey,
	/// The full entry, including its `id` field.
	pub data: Value,
}

impl Item {
	/// Creates an item from a key and arbitrary data.
	pub fn new(id: impl Into<ItemKey>, data: Value) -> Self {
		Self {
			id: id.into(),
			data,
		}
	}

	/// Converts a state entry into an item, reading its `id` field.
	pub fn from_value(value: &Value) -> ReconcileResult<Self> {
		let id = value
			.get("id")
			.and_then(ItemKey::from_value)
			.ok_or_else(|| ReconcileError::MissingItemId(value.clone()))?;
		Ok(Self {
			id,
			data: value.clone(),
		})
	}

	/// Reads a field of the item's data.
	pub fn get(&self, path: impl Into<StatePath>) -> Option<&Value> {
		state::read(&self.data, &path.into())
	}
}

/// Derives the item list from a snapshot.
pub type ItemsList = Rc<dyn Fn(&State) -> ReconcileResult<Vec<Item>>>;

/// Builds an [`ItemsList`] reading the array at `path`.
///
/// A missing or non-array value yields an empty list.
pub fn items_at(path: impl Into<StatePath>) -> ItemsList {
	let path = path.into();
	Rc::new(move |state: &State| match state::read(state, &path) {
		Some(Value::Array(entries)) => entries.iter().map(Item::from_value).collect(),
		_ => Ok(Vec::new()),
	})
}

/// Inclusion predicate of a filter case.
pub type ItemPredicate = Rc<dyn Fn(&Item) -> bool>;

/// A named filter case.
#[derive(Clone)]
pub struct FilterCase {
	/// Discriminant value selecting this case.
	pub value: String,
	/// Items kept while this case is active.
	pub predicate: ItemPredicate,
}

impl FilterCase {
	/// Creates a case.
	pub fn new(value: impl Into<String>, predicate: impl Fn(&Item) -> bool + 'static) -> Self {
		Self {
			value: value.into(),
			predicate: Rc::new(predicate),
		}
	}
}

impl fmt::Debug for FilterCase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FilterCase")
			.field("value", &self.value)
			.finish_non_exhaustive()
	}
}

/// The filter selection for one cycle: a discriminant and the declared cases.
#[derive(Debug, Clone)]
pub struct FilterSelection {
	/// The discriminant, usually read from state.
	pub check: String,
	/// Declared cases.
	pub cases: Vec<FilterCase>,
}

impl FilterSelection {
	/// Creates a selection.
	pub fn new(check: impl Into<String>, cases: Vec<FilterCase>) -> Self {
		Self {
			check: check.into(),
			cases,
		}
	}

	/// Returns the case whose value equals the discriminant.
	pub fn active_case(&self) -> ReconcileResult<&FilterCase> {
		self.cases
			.iter()
			.find(|case| case.value == self.check)
			.ok_or_else(|| ReconcileError::MissingFilterCase {
				check: self.check.clone(),
			})
	}
}

/// Computes the filter selection from a snapshot.
pub type Filter = Rc<dyn Fn(&State) -> FilterSelection>;

/// Keeps the items accepted by the active case.
pub fn filter_list(list: Vec<Item>, selection: &FilterSelection) -> ReconcileResult<Vec<Item>> {
	let case = selection.active_case()?;
	Ok(list
		.into_iter()
		.filter(|item| (case.predicate)(item))
		.collect())
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	fn todos() -> State {
		json!({
			"todos": [
				{ "id": 1, "done": false },
				{ "id": 2, "done": true },
				{ "id": "x", "done": true }
			]
		})
	}

	fn selection(check: &str) -> FilterSelection {
		FilterSelection::new(
			check,
			vec![
				FilterCase::new("all", |_| true),
				FilterCase::new("done", |item| item.get("done") == Some(&json!(true))),
			],
		)
	}

	#[rstest]
	fn test_items_at_reads_ids() {
		let items = items_at("todos")(&todos()).unwrap();
		let ids: Vec<_> = items.iter().map(|i| i.id.clone()).collect();
		assert_eq!(
			ids,
			vec![ItemKey::Int(1), ItemKey::Int(2), ItemKey::from("x")]
		);
	}

	#[rstest]
	#[case(json!({}))]
	#[case(json!({ "todos": null }))]
	#[case(json!({ "todos": "nope" }))]
	fn test_items_at_missing_array_is_empty(#[case] state: State) {
		assert!(items_at("todos")(&state).unwrap().is_empty());
	}

	#[rstest]
	#[case(json!({ "title": "no id" }))]
	#[case(json!({ "id": 1.5 }))]
	#[case(json!({ "id": [1] }))]
	fn test_item_requires_id(#[case] entry: Value) {
		let err = Item::from_value(&entry).unwrap_err();
		assert!(matches!(err, ReconcileError::MissingItemId(_)));
	}

	#[rstest]
	#[case("all", 3)]
	#[case("done", 2)]
	fn test_filter_list(#[case] check: &str, #[case] expected: usize) {
		let items = items_at("todos")(&todos()).unwrap();
		let filtered = filter_list(items, &selection(check)).unwrap();
		assert_eq!(filtered.len(), expected);
	}

	#[rstest]
	fn test_filter_without_active_case_fails() {
		let items = items_at("todos")(&todos()).unwrap();
		let err = filter_list(items, &selection("archived")).unwrap_err();
		assert!(matches!(
			err,
			ReconcileError::MissingFilterCase { check } if check == "archived"
		));
	}

	#[rstest]
	fn test_item_key_display() {
		assert_eq!(ItemKey::Int(7).to_string(), "7");
		assert_eq!(ItemKey::from("abc").to_string(), "abc");
	}
}
