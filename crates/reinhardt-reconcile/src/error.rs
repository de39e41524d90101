//! Error types for reinhardt-reconcile

use thiserror::Error;

use crate::dom::NodeId;

/// Errors raised while mounting, updating or tearing down a component tree.
///
/// All errors surface synchronously to whoever started the update cycle.
/// A failure part-way through a cycle may leave earlier writes applied.
#[derive(Debug, Error)]
pub enum ReconcileError {
	/// A binding was declared with a kind outside `text`, `attribute`, `input`
	/// and `classes`.
	#[error("Unknown binding kind: {0}")]
	UnknownBindingKind(String),

	/// An `attribute` or `classes` binding was declared without an action.
	#[error("Binding kind `{kind}` on `{selector}` requires an action")]
	MissingAction {
		/// The binding kind.
		kind: &'static str,
		/// The binding target selector.
		selector: String,
	},

	/// A selector resolved to no element.
	#[error("No element matches selector `{selector}`")]
	MissingElement {
		/// The selector that failed to resolve.
		selector: String,
	},

	/// A node handle no longer refers to a live node.
	#[error("Node {id} missing")]
	MissingNode {
		/// The stale handle.
		id: NodeId,
	},

	/// A filter discriminant matched none of the declared cases.
	#[error("No filter case matches `{check}`")]
	MissingFilterCase {
		/// The discriminant value that failed to match.
		check: String,
	},

	/// An item list entry carried no usable `id` field.
	#[error("Item has no string or integer `id`: {0}")]
	MissingItemId(serde_json::Value),

	/// A listener referred to a callback that was never built.
	#[error("Callback not found: {0}")]
	MissingCallback(String),

	/// A selector could not be parsed.
	#[error("Invalid selector `{selector}`: {reason}")]
	InvalidSelector {
		/// The offending selector.
		selector: String,
		/// Why it was rejected.
		reason: String,
	},

	/// A node cannot be used as an insertion target for the requested position.
	#[error("Cannot insert relative to node {id}: {reason}")]
	InvalidInsertion {
		/// The insertion target.
		id: NodeId,
		/// Why the insertion was rejected.
		reason: &'static str,
	},

	/// An interface's markup has no root element to carry its name.
	#[error("Interface `{name}` must render a single root element")]
	InvalidRoot {
		/// The interface name.
		name: String,
	},

	/// Engine settings could not be decoded.
	#[error("Settings error: {0}")]
	Settings(#[from] serde_json::Error),

	/// The browser DOM rejected an operation.
	#[error("DOM error: {0}")]
	Dom(String),
}

impl ReconcileError {
	/// Shorthand for [`ReconcileError::MissingElement`].
	pub fn missing_element(selector: impl Into<String>) -> Self {
		Self::MissingElement {
			selector: selector.into(),
		}
	}
}

/// Result type for reconciliation operations.
pub type ReconcileResult<T> = std::result::Result<T, ReconcileError>;
