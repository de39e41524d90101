//! State snapshots and path lookup.
//!
//! Application state is an immutable [`serde_json::Value`] tree. The engine
//! never mutates it; it only reads values out of it by [`StatePath`] and
//! compares snapshots structurally.

use std::fmt;

use serde_json::Value;

/// An immutable application state snapshot.
pub type State = Value;

/// A pair of snapshots describing one update cycle.
///
/// `previous` is the snapshot that was current before this cycle started,
/// `next` is the snapshot being applied.
#[derive(Debug, Clone, Copy)]
pub struct Cycle<'a> {
	/// The snapshot before this cycle.
	pub previous: &'a State,
	/// The snapshot being applied.
	pub next: &'a State,
}

impl<'a> Cycle<'a> {
	/// Creates a cycle from two snapshots.
	pub fn new(previous: &'a State, next: &'a State) -> Self {
		Self { previous, next }
	}

	/// A cycle whose previous and next snapshots are the same value.
	///
	/// Useful when replaying a snapshot with `force_update` set.
	pub fn unchanged(state: &'a State) -> Self {
		Self {
			previous: state,
			next: state,
		}
	}
}

/// One step of a [`StatePath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
	/// An object key (or a numeric array index written in dotted form).
	Key(String),
	/// A bracketed array index.
	Index(usize),
}

/// A path into a state tree, e.g. `todos[0].title` or `filters.active`.
///
/// Parsing is lenient: dotted keys, bracketed indices and quoted bracketed
/// keys (`["odd.key"]`) are recognised, anything else is taken literally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct StatePath {
	segments: Vec<PathSegment>,
}

impl StatePath {
	/// The empty path, which reads the whole snapshot.
	pub fn root() -> Self {
		Self::default()
	}

	/// Parses a path string.
	pub fn new(path: &str) -> Self {
		let mut segments = Vec::new();
		let mut current = String::new();
		let mut chars = path.chars().peekable();

		while let Some(c) = chars.next() {
			match c {
				'.' => {
					if !current.is_empty() {
						segments.push(PathSegment::Key(std::mem::take(&mut current)));
					}
				}
				'[' => {
					let mut inner = String::new();
					let mut closed = false;
					for c in chars.by_ref() {
						if c == ']' {
							closed = true;
							break;
						}
						inner.push(c);
					}
					if !closed {
						// Unterminated bracket: keep the text as a literal key.
						current.push('[');
						current.push_str(&inner);
						continue;
					}
					if !current.is_empty() {
						segments.push(PathSegment::Key(std::mem::take(&mut current)));
					}
					segments.push(bracket_segment(&inner));
				}
				_ => current.push(c),
			}
		}
		if !current.is_empty() {
			segments.push(PathSegment::Key(current));
		}

		Self { segments }
	}

	/// Returns the parsed segments.
	pub fn segments(&self) -> &[PathSegment] {
		&self.segments
	}

	/// Returns true for the root path.
	pub fn is_root(&self) -> bool {
		self.segments.is_empty()
	}
}

fn bracket_segment(inner: &str) -> PathSegment {
	let trimmed = inner.trim();
	let unquoted = trimmed
		.strip_prefix('"')
		.and_then(|s| s.strip_suffix('"'))
		.or_else(|| {
			trimmed
				.strip_prefix('\'')
				.and_then(|s| s.strip_suffix('\''))
		});
	match unquoted {
		Some(key) => PathSegment::Key(key.to_string()),
		None => match trimmed.parse::<usize>() {
			Ok(index) => PathSegment::Index(index),
			Err(_) => PathSegment::Key(trimmed.to_string()),
		},
	}
}

impl From<&str> for StatePath {
	fn from(path: &str) -> Self {
		Self::new(path)
	}
}

impl From<String> for StatePath {
	fn from(path: String) -> Self {
		Self::new(&path)
	}
}

impl fmt::Display for StatePath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (i, segment) in self.segments.iter().enumerate() {
			match segment {
				PathSegment::Key(key) if i == 0 => write!(f, "{key}")?,
				PathSegment::Key(key) => write!(f, ".{key}")?,
				PathSegment::Index(index) => write!(f, "[{index}]")?,
			}
		}
		Ok(())
	}
}

/// Reads the value at `path`, returning `None` when any segment is missing.
pub fn read<'a>(state: &'a State, path: &StatePath) -> Option<&'a Value> {
	path.segments
		.iter()
		.try_fold(state, |value, segment| match (segment, value) {
			(PathSegment::Key(key), Value::Object(map)) => map.get(key),
			(PathSegment::Key(key), Value::Array(items)) => {
				key.parse::<usize>().ok().and_then(|i| items.get(i))
			}
			(PathSegment::Index(index), Value::Array(items)) => items.get(*index),
			(PathSegment::Index(index), Value::Object(map)) => map.get(&index.to_string()),
			_ => None,
		})
}

/// Structural equality between two possibly-missing values.
///
/// A missing value only equals another missing value; it never equals `null`.
pub fn values_equal(a: Option<&Value>, b: Option<&Value>) -> bool {
	a == b
}

/// Renders a state value the way it appears as text content or an input value.
///
/// Strings are written without quotes, missing values and `null` become the
/// empty string, and composite values are written as JSON.
pub fn value_to_text(value: Option<&Value>) -> String {
	match value {
		None | Some(Value::Null) => String::new(),
		Some(Value::String(s)) => s.clone(),
		Some(Value::Bool(b)) => b.to_string(),
		Some(Value::Number(n)) => number_to_text(n),
		Some(other) => other.to_string(),
	}
}

// Integral floats print without a fractional part and negative zero prints as `0`.
fn number_to_text(n: &serde_json::Number) -> String {
	match n.as_f64() {
		Some(f) if n.is_f64() && f == 0.0 => "0".to_string(),
		Some(f) if n.is_f64() && f.is_finite() && f.abs() < 1e21 => f.to_string(),
		_ => n.to_string(),
	}
}

/// Returns the truthiness of a value, following the usual scripting rules:
/// `null`, `false`, `0`, empty strings and missing values are false.
pub fn is_truthy(value: Option<&Value>) -> bool {
	match value {
		None | Some(Value::Null) => false,
		Some(Value::Bool(b)) => *b,
		Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
		Some(Value::String(s)) => !s.is_empty(),
		Some(Value::Array(_)) | Some(Value::Object(_)) => true,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	fn sample() -> State {
		json!({
			"todos": [
				{ "id": 1, "title": "write", "done": false },
				{ "id": 2, "title": "ship", "done": true }
			],
			"filters": { "active": "all", "odd.key": 7 },
			"count": 2
		})
	}

	#[rstest]
	#[case("count", Some(json!(2)))]
	#[case("todos[1].title", Some(json!("ship")))]
	#[case("todos.0.id", Some(json!(1)))]
	#[case("filters.active", Some(json!("all")))]
	#[case("filters[\"odd.key\"]", Some(json!(7)))]
	#[case("todos[5].title", None)]
	#[case("count.inner", None)]
	#[case("missing", None)]
	fn test_read(#[case] path: &str, #[case] expected: Option<Value>) {
		let state = sample();
		assert_eq!(read(&state, &StatePath::new(path)).cloned(), expected);
	}

	#[rstest]
	fn test_root_path_reads_whole_state() {
		let state = sample();
		assert_eq!(read(&state, &StatePath::root()), Some(&state));
		assert!(StatePath::new("").is_root());
	}

	#[rstest]
	fn test_unterminated_bracket_is_literal() {
		let path = StatePath::new("a[0");
		assert_eq!(path.segments(), &[PathSegment::Key("a[0".to_string())]);
	}

	#[rstest]
	#[case("a[0", vec![PathSegment::Key("a[0".to_string())])]
	#[case("todos[1", vec![PathSegment::Key("todos[1".to_string())])]
	#[case("a.b[2", vec![PathSegment::Key("a".to_string()), PathSegment::Key("b[2".to_string())])]
	#[case("a[0][1", vec![PathSegment::Key("a".to_string()), PathSegment::Index(0), PathSegment::Key("[1".to_string())])]
	fn test_unterminated_bracket_keeps_preceding_key(
		#[case] path: &str,
		#[case] expected: Vec<PathSegment>,
	) {
		assert_eq!(StatePath::new(path).segments(), expected.as_slice());
	}

	#[rstest]
	fn test_display_round_trips_simple_paths() {
		assert_eq!(StatePath::new("todos[1].title").to_string(), "todos[1].title");
	}

	#[rstest]
	fn test_values_equal_distinguishes_missing_from_null() {
		let null = Value::Null;
		assert!(values_equal(None, None));
		assert!(!values_equal(None, Some(&null)));
		assert!(values_equal(
			Some(&json!({"a": [1, 2]})),
			Some(&json!({"a": [1, 2]}))
		));
	}

	#[rstest]
	#[case(None, "")]
	#[case(Some(json!(null)), "")]
	#[case(Some(json!("text")), "text")]
	#[case(Some(json!(3)), "3")]
	#[case(Some(json!(true)), "true")]
	#[case(Some(json!([1, 2])), "[1,2]")]
	#[case(Some(json!(1.0)), "1")]
	#[case(Some(json!(1.5)), "1.5")]
	#[case(Some(json!(-0.0)), "0")]
	#[case(Some(json!(-2.0)), "-2")]
	#[case(Some(json!(-7)), "-7")]
	#[case(Some(json!(u64::MAX)), "18446744073709551615")]
	fn test_value_to_text(#[case] value: Option<Value>, #[case] expected: &str) {
		assert_eq!(value_to_text(value.as_ref()), expected);
	}

	#[rstest]
	#[case(Some(json!(0)), false)]
	#[case(Some(json!(1)), true)]
	#[case(Some(json!("")), false)]
	#[case(Some(json!([])), true)]
	#[case(None, false)]
	fn test_is_truthy(#[case] value: Option<Value>, #[case] expected: bool) {
		assert_eq!(is_truthy(value.as_ref()), expected);
	}
}
