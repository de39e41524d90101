//! A small CSS selector engine for the in-memory document.
//!
//! Supported: type selectors, `*`, `#id`, `.class`, `[attr]`,
//! `[attr=value]` (quoted or bare), compound selectors, the descendant and
//! child (`>`) combinators, and comma-separated selector lists.

use crate::dom::NodeId;
use crate::error::{ReconcileError, ReconcileResult};

/// Read access to an element tree, as needed for matching.
pub(crate) trait ElementTree {
	/// Returns the lowercase tag name, or `None` for non-element nodes.
	fn tag_name(&self, node: NodeId) -> Option<&str>;

	/// Returns an attribute value.
	fn attribute(&self, node: NodeId, name: &str) -> Option<&str>;

	/// Returns the parent element, if any.
	fn parent_element(&self, node: NodeId) -> Option<NodeId>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
	Descendant,
	Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrMatcher {
	name: String,
	value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
	tag: Option<String>,
	id: Option<String>,
	classes: Vec<String>,
	attrs: Vec<AttrMatcher>,
}

impl Compound {
	fn is_empty(&self) -> bool {
		self.tag.is_none() && self.id.is_none() && self.classes.is_empty() && self.attrs.is_empty()
	}

	fn matches<T: ElementTree + ?Sized>(&self, tree: &T, node: NodeId) -> bool {
		let Some(tag) = tree.tag_name(node) else {
			return false;
		};
		if let Some(expected) = &self.tag
			&& expected != "*"
			&& !expected.eq_ignore_ascii_case(tag)
		{
			return false;
		}
		if let Some(id) = &self.id
			&& tree.attribute(node, "id") != Some(id.as_str())
		{
			return false;
		}
		if !self.classes.is_empty() {
			let class_attr = tree.attribute(node, "class").unwrap_or_default();
			let has_all = self
				.classes
				.iter()
				.all(|class| class_attr.split_whitespace().any(|c| c == class));
			if !has_all {
				return false;
			}
		}
		self.attrs.iter().all(|matcher| {
			match (tree.attribute(node, &matcher.name), &matcher.value) {
				(None, _) => false,
				(Some(_), None) => true,
				(Some(actual), Some(expected)) => actual == expected,
			}
		})
	}
}

/// One selector of a selector list: compounds joined by combinators.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
	// The combinator stored with each compound links it to the one before.
	parts: Vec<(Combinator, Compound)>,
}

impl Complex {
	fn matches<T: ElementTree + ?Sized>(&self, tree: &T, node: NodeId) -> bool {
		self.matches_at(tree, node, self.parts.len() - 1)
	}

	fn matches_at<T: ElementTree + ?Sized>(&self, tree: &T, node: NodeId, index: usize) -> bool {
		let (combinator, compound) = &self.parts[index];
		if !compound.matches(tree, node) {
			return false;
		}
		if index == 0 {
			return true;
		}
		match combinator {
			Combinator::Child => tree
				.parent_element(node)
				.is_some_and(|parent| self.matches_at(tree, parent, index - 1)),
			Combinator::Descendant => {
				let mut ancestor = tree.parent_element(node);
				while let Some(current) = ancestor {
					if self.matches_at(tree, current, index - 1) {
						return true;
					}
					ancestor = tree.parent_element(current);
				}
				false
			}
		}
	}
}

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Selector {
	alternatives: Vec<Complex>,
}

impl Selector {
	/// Parses a selector string.
	pub(crate) fn parse(input: &str) -> ReconcileResult<Self> {
		let alternatives = split_list(input)
			.into_iter()
			.map(|part| Parser::new(input, part).parse_complex())
			.collect::<ReconcileResult<Vec<_>>>()?;
		Ok(Self { alternatives })
	}

	/// Returns true when `node` matches any selector of the list.
	pub(crate) fn matches<T: ElementTree + ?Sized>(&self, tree: &T, node: NodeId) -> bool {
		self.alternatives
			.iter()
			.any(|complex| complex.matches(tree, node))
	}
}

struct Parser<'a> {
	original: &'a str,
	chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Parser<'a> {
	fn new(original: &'a str, part: &'a str) -> Self {
		Self {
			original,
			chars: part.chars().peekable(),
		}
	}

	fn error(&self, reason: impl Into<String>) -> ReconcileError {
		ReconcileError::InvalidSelector {
			selector: self.original.to_string(),
			reason: reason.into(),
		}
	}

	fn skip_whitespace(&mut self) -> bool {
		let mut skipped = false;
		while self.chars.peek().is_some_and(|c| c.is_whitespace()) {
			self.chars.next();
			skipped = true;
		}
		skipped
	}

	fn parse_complex(&mut self) -> ReconcileResult<Complex> {
		let mut parts = Vec::new();
		let mut combinator = Combinator::Descendant;
		self.skip_whitespace();

		loop {
			let compound = self.parse_compound()?;
			if compound.is_empty() {
				return Err(self.error("expected a selector"));
			}
			parts.push((combinator, compound));

			let had_space = self.skip_whitespace();
			match self.chars.peek() {
				None => break,
				Some('>') => {
					self.chars.next();
					self.skip_whitespace();
					combinator = Combinator::Child;
				}
				Some(_) if had_space => combinator = Combinator::Descendant,
				Some(&c) => return Err(self.error(format!("unexpected `{c}`"))),
			}
		}

		Ok(Complex { parts })
	}

	fn parse_compound(&mut self) -> ReconcileResult<Compound> {
		let mut compound = Compound::default();
		if self.chars.peek() == Some(&'*') {
			self.chars.next();
			compound.tag = Some("*".to_string());
		} else if self.chars.peek().is_some_and(|c| is_name_char(*c)) {
			compound.tag = Some(self.parse_name()?);
		}

		loop {
			match self.chars.peek() {
				Some('#') => {
					self.chars.next();
					compound.id = Some(self.parse_name()?);
				}
				Some('.') => {
					self.chars.next();
					compound.classes.push(self.parse_name()?);
				}
				Some('[') => {
					self.chars.next();
					compound.attrs.push(self.parse_attr()?);
				}
				_ => break,
			}
		}

		Ok(compound)
	}

	fn parse_name(&mut self) -> ReconcileResult<String> {
		let mut name = String::new();
		while let Some(c) = self.chars.peek().copied().filter(|c| is_name_char(*c)) {
			name.push(c);
			self.chars.next();
		}
		if name.is_empty() {
			return Err(self.error("expected a name"));
		}
		Ok(name)
	}

	fn parse_attr(&mut self) -> ReconcileResult<AttrMatcher> {
		self.skip_whitespace();
		let name = self.parse_name()?;
		self.skip_whitespace();
		let value = match self.chars.next() {
			Some(']') => return Ok(AttrMatcher { name, value: None }),
			Some('=') => {
				self.skip_whitespace();
				self.parse_attr_value()?
			}
			_ => return Err(self.error("malformed attribute selector")),
		};
		self.skip_whitespace();
		if self.chars.next() != Some(']') {
			return Err(self.error("unclosed attribute selector"));
		}
		Ok(AttrMatcher {
			name,
			value: Some(value),
		})
	}

	fn parse_attr_value(&mut self) -> ReconcileResult<String> {
		match self.chars.peek().copied() {
			Some(quote @ ('"' | '\'')) => {
				self.chars.next();
				let mut value = String::new();
				while let Some(c) = self.chars.next() {
					match c {
						'\\' => match self.chars.next() {
							Some(escaped) => value.push(escaped),
							None => break,
						},
						c if c == quote => return Ok(value),
						c => value.push(c),
					}
				}
				Err(self.error("unterminated string"))
			}
			_ => self.parse_name(),
		}
	}
}

/// Splits a selector list on commas outside quoted attribute values.
fn split_list(input: &str) -> Vec<&str> {
	let mut parts = Vec::new();
	let mut start = 0;
	let mut quote = None;
	let mut escaped = false;
	for (i, c) in input.char_indices() {
		match (quote, c) {
			_ if escaped => escaped = false,
			(Some(_), '\\') => escaped = true,
			(Some(q), c) if c == q => quote = None,
			(None, '"' | '\'') => quote = Some(c),
			(None, ',') => {
				parts.push(&input[start..i]);
				start = i + 1;
			}
			_ => {}
		}
	}
	parts.push(&input[start..]);
	parts
}

/// Quotes `value` for use inside an attribute selector.
pub(crate) fn quote_attr_value(value: &str) -> String {
	let mut quoted = String::with_capacity(value.len() + 2);
	quoted.push('"');
	for c in value.chars() {
		if matches!(c, '"' | '\\') {
			quoted.push('\\');
		}
		quoted.push(c);
	}
	quoted.push('"');
	quoted
}

fn is_name_char(c: char) -> bool {
	c.is_alphanumeric() || c == '-' || c == '_'
}
