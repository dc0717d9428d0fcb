//! RELAX NG adapter.
//!
//! Schemas in XML syntax are compiled into a pattern arena ([`Schema`]).
//! Element declarations are views of element patterns; content questions are
//! answered by folding derivatives over the child element names of the
//! instance element.

mod derive;
mod parse;
mod pattern;

use std::sync::Arc;

use xmlls_dom::{ElementRef, Url};

use self::derive::{Deriver, Expr};
pub use self::parse::parse_relaxng;
pub use self::pattern::{DefineId, NameClass, Pattern, PatternId, Schema};
use crate::model::{
	AttributeDecl, AttributeDeclaration, ContentCheck, ElementDecl, ElementDeclaration, GrammarDocument, GrammarKind,
	UnexpectedChild,
};
use crate::Result;

/// RELAX NG structure namespace.
pub const RELAXNG_NAMESPACE: &str = "http://relaxng.org/ns/structure/1.0";
/// RELAX NG DTD-compatibility annotations namespace (`a:documentation`, `a:defaultValue`).
pub const ANNOTATIONS_NAMESPACE: &str = "http://relaxng.org/ns/compatibility/annotations/1.0";

/// A compiled RELAX NG grammar.
#[derive(Debug)]
pub struct RelaxNgGrammar {
	uri: Url,
	schema: Arc<Schema>,
}

impl RelaxNgGrammar {
	/// Compiles `text` loaded from `uri`.
	pub fn parse(uri: Url, text: &str) -> Result<Self> {
		let schema = parse_relaxng(&uri, text)?;
		Ok(Self {
			uri,
			schema: Arc::new(schema),
		})
	}

	/// The compiled schema.
	pub fn schema(&self) -> &Schema {
		&self.schema
	}

	fn decl(&self, pattern: PatternId) -> ElementDecl {
		Arc::new(RelaxNgElementDeclaration {
			schema: Arc::clone(&self.schema),
			pattern,
		})
	}
}

impl GrammarDocument for RelaxNgGrammar {
	fn uri(&self) -> &Url {
		&self.uri
	}

	fn kind(&self) -> GrammarKind {
		GrammarKind::RelaxNg
	}

	fn top_level_elements(&self) -> Vec<ElementDecl> {
		self.schema
			.element_patterns(self.schema.start())
			.into_iter()
			.map(|id| self.decl(id))
			.collect()
	}
}

/// An element pattern of a [`Schema`].
#[derive(Debug, Clone)]
pub struct RelaxNgElementDeclaration {
	schema: Arc<Schema>,
	pattern: PatternId,
}

impl RelaxNgElementDeclaration {
	/// The element pattern this declaration views.
	pub fn pattern(&self) -> PatternId {
		self.pattern
	}

	fn name_class(&self) -> Option<&NameClass> {
		match self.schema.pattern(self.pattern) {
			Pattern::Element { name, .. } => Some(name),
			_ => None,
		}
	}

	fn content(&self) -> Option<PatternId> {
		match self.schema.pattern(self.pattern) {
			Pattern::Element { content, .. } => Some(*content),
			_ => None,
		}
	}

	fn sibling(&self, pattern: PatternId) -> Self {
		Self {
			schema: Arc::clone(&self.schema),
			pattern,
		}
	}

	fn decls(&self, patterns: Vec<PatternId>) -> Vec<ElementDecl> {
		patterns
			.into_iter()
			.map(|id| Arc::new(self.sibling(id)) as ElementDecl)
			.collect()
	}

	/// Display names of element patterns, `*` for wildcards.
	fn names(&self, patterns: &[PatternId]) -> Vec<String> {
		let mut out: Vec<String> = Vec::new();
		for id in patterns {
			let name = match self.schema.pattern(*id) {
				Pattern::Element { name, .. } => name.simple_name().map_or("*", |(_, local)| local),
				_ => continue,
			};
			if !out.iter().any(|n| n == name) {
				out.push(name.to_string());
			}
		}
		out
	}

	/// Residual content after the children of `element`, skipping unexpected ones.
	fn fold_children(&self, deriver: &Deriver<'_>, element: &ElementRef<'_>) -> (Expr, Vec<UnexpectedChild>) {
		let Some(content) = self.content() else {
			return (Expr::NotAllowed, Vec::new());
		};
		let mut current = Expr::Pattern(content);
		let mut unexpected = Vec::new();
		for child in element.child_elements() {
			let next = deriver.deriv(&current, child.namespace_uri().unwrap_or_default(), child.local_name());
			if next == Expr::NotAllowed {
				unexpected.push(UnexpectedChild {
					node: child.id(),
					expected: self.names(&deriver.first(&current)),
				});
			} else {
				current = next;
			}
		}
		(current, unexpected)
	}
}

impl ElementDeclaration for RelaxNgElementDeclaration {
	fn local_name(&self) -> &str {
		self.name_class()
			.and_then(NameClass::simple_name)
			.map_or("*", |(_, local)| local)
	}

	fn namespace(&self) -> Option<&str> {
		let (namespace, _) = self.name_class()?.simple_name()?;
		(!namespace.is_empty()).then_some(namespace)
	}

	fn documentation(&self) -> Option<&str> {
		match self.schema.pattern(self.pattern) {
			Pattern::Element { documentation, .. } => documentation.as_deref(),
			_ => None,
		}
	}

	fn attributes(&self) -> Vec<AttributeDecl> {
		let Some(content) = self.content() else {
			return Vec::new();
		};
		self.schema
			.attribute_patterns(content)
			.into_iter()
			.filter_map(|(pattern, required)| {
				let decl = RelaxNgAttributeDeclaration::new(Arc::clone(&self.schema), pattern, required)?;
				Some(Arc::new(decl) as AttributeDecl)
			})
			.collect()
	}

	fn child_declarations(&self) -> Vec<ElementDecl> {
		match self.content() {
			Some(content) => self.decls(self.schema.element_patterns(content)),
			None => Vec::new(),
		}
	}

	fn required_children(&self) -> Vec<ElementDecl> {
		let Some(content) = self.content() else {
			return Vec::new();
		};
		let required = self
			.schema
			.required_element_patterns(content)
			.into_iter()
			.filter(|id| matches!(self.schema.pattern(*id), Pattern::Element { name, .. } if name.simple_name().is_some()))
			.collect();
		self.decls(required)
	}

	fn is_empty_content(&self) -> bool {
		self.content()
			.and_then(|content| self.schema.resolve_ref(content))
			.is_some_and(|content| matches!(self.schema.pattern(content), Pattern::Empty))
	}

	fn accepts_any_attribute(&self) -> bool {
		self.content()
			.is_some_and(|content| self.schema.has_wildcard_attribute(content))
	}

	fn check_content(&self, element: &ElementRef<'_>) -> ContentCheck {
		let deriver = Deriver::new(&self.schema);
		let (residual, unexpected) = self.fold_children(&deriver, element);
		let incomplete = !deriver.nullable(&residual);
		let expected = if incomplete {
			self.names(&deriver.first(&residual))
		} else {
			Vec::new()
		};
		ContentCheck {
			unexpected,
			incomplete,
			expected,
		}
	}

	fn possible_required_elements(&self, element: &ElementRef<'_>) -> Vec<ElementDecl> {
		let deriver = Deriver::new(&self.schema);
		let (residual, _) = self.fold_children(&deriver, element);
		if deriver.nullable(&residual) {
			return Vec::new();
		}
		let mut seen: Vec<(&str, &str)> = Vec::new();
		let mut alternatives = Vec::new();
		for id in deriver.required_first(&residual) {
			let Pattern::Element { name, .. } = self.schema.pattern(id) else {
				continue;
			};
			let Some(key) = name.simple_name() else {
				continue;
			};
			if !seen.contains(&key) {
				seen.push(key);
				alternatives.push(id);
			}
		}
		self.decls(alternatives)
	}

	fn matches(&self, element: &ElementRef<'_>) -> bool {
		self.name_class()
			.is_some_and(|name| name.matches(element.namespace_uri().unwrap_or_default(), element.local_name()))
	}
}

/// An attribute pattern with a simple name.
#[derive(Debug, Clone)]
pub struct RelaxNgAttributeDeclaration {
	schema: Arc<Schema>,
	pattern: PatternId,
	name: String,
	required: bool,
}

impl RelaxNgAttributeDeclaration {
	fn new(schema: Arc<Schema>, pattern: PatternId, required: bool) -> Option<Self> {
		let Pattern::Attribute { name, .. } = schema.pattern(pattern) else {
			return None;
		};
		let (_, local) = name.simple_name()?;
		let name = local.to_string();
		Some(Self {
			schema,
			pattern,
			name,
			required,
		})
	}
}

impl AttributeDeclaration for RelaxNgAttributeDeclaration {
	fn name(&self) -> &str {
		&self.name
	}

	fn is_required(&self) -> bool {
		self.required
	}

	fn default_value(&self) -> Option<&str> {
		match self.schema.pattern(self.pattern) {
			Pattern::Attribute { default_value, .. } => default_value.as_deref(),
			_ => None,
		}
	}

	fn enumerated_values(&self) -> Vec<String> {
		match self.schema.pattern(self.pattern) {
			Pattern::Attribute { value, .. } => self.schema.enumerated_values(*value),
			_ => Vec::new(),
		}
	}

	fn documentation(&self) -> Option<&str> {
		match self.schema.pattern(self.pattern) {
			Pattern::Attribute { documentation, .. } => documentation.as_deref(),
			_ => None,
		}
	}
}
