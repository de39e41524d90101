//! Engine settings.
//!
//! Settings are installed per thread, matching the single-threaded update
//! model. Everything has a default, so configuring is optional:
//!
//! ```
//! use reinhardt_reconcile::settings::{self, EngineSettings};
//!
//! let loaded = EngineSettings::from_json(r#"{ "root_attribute": "data-view" }"#).unwrap();
//! settings::configure(loaded);
//! assert_eq!(settings::current().root_attribute, "data-view");
//! assert_eq!(settings::current().default_event.as_str(), "click");
//! ```

use std::cell::RefCell;

use serde::Deserialize;

use crate::dom::{EventType, selector};
use crate::error::ReconcileResult;

/// Tunables read by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
	/// Attribute carrying an interface's root name. Root selectors take the
	/// form `[<root_attribute>="<name>"]`.
	pub root_attribute: String,
	/// Event type used by [`crate::listener::Listener::on_default`].
	pub default_event: EventType,
	/// Emit a `debug` event with the binding report of every interface
	/// update.
	pub trace_cycles: bool,
}

impl Default for EngineSettings {
	fn default() -> Self {
		Self {
			root_attribute: "data-root".to_string(),
			default_event: EventType::Click,
			trace_cycles: false,
		}
	}
}

impl EngineSettings {
	/// Decodes settings from JSON. Missing fields keep their defaults.
	pub fn from_json(json: &str) -> ReconcileResult<Self> {
		Ok(serde_json::from_str(json)?)
	}

	/// Builds the selector matching the root element named `name`. Quotes and
	/// backslashes in `name` are escaped.
	pub fn root_selector(&self, name: &str) -> String {
		format!("[{}={}]", self.root_attribute, selector::quote_attr_value(name))
	}
}

thread_local! {
	static SETTINGS: RefCell<EngineSettings> = RefCell::new(EngineSettings::default());
}

/// Installs settings for the current thread.
pub fn configure(settings: EngineSettings) {
	SETTINGS.with(|current| *current.borrow_mut() = settings);
}

/// Returns the settings of the current thread.
pub fn current() -> EngineSettings {
	SETTINGS.with(|current| current.borrow().clone())
}

/// Restores the default settings for the current thread.
pub fn reset() {
	configure(EngineSettings::default());
}
