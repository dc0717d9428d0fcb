//! Grammar-agnostic declaration model.
//!
//! Adapters implement these traits once per dialect. Capabilities a dialect
//! cannot answer keep their default implementation, which reports "nothing":
//! an empty list or a passing [`ContentCheck`].

use std::fmt;
use std::sync::Arc;

use xmlls_dom::{ElementRef, NodeId, Url};

/// Shared element declaration.
pub type ElementDecl = Arc<dyn ElementDeclaration>;
/// Shared attribute declaration.
pub type AttributeDecl = Arc<dyn AttributeDeclaration>;
/// Shared compiled grammar.
pub type GrammarDocumentRef = Arc<dyn GrammarDocument>;

/// Schema dialect of a grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrammarKind {
	/// RELAX NG, XML syntax.
	RelaxNg,
	/// Document type definition.
	Dtd,
}

impl GrammarKind {
	/// Guesses the dialect from a grammar URL's file extension.
	pub fn from_extension(uri: &Url) -> Option<Self> {
		let (_, ext) = uri.path().rsplit_once('.')?;
		match ext.to_ascii_lowercase().as_str() {
			"rng" => Some(Self::RelaxNg),
			"dtd" | "ent" | "mod" => Some(Self::Dtd),
			_ => None,
		}
	}
}

/// A child element that is not allowed where it occurs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnexpectedChild {
	/// The offending child.
	pub node: NodeId,
	/// Names that would have been accepted at that position.
	pub expected: Vec<String>,
}

/// Result of checking an element's children against its declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentCheck {
	/// Children not allowed at their position.
	pub unexpected: Vec<UnexpectedChild>,
	/// The content ends before the content model is satisfied.
	pub incomplete: bool,
	/// Names that could still complete the content when `incomplete`.
	pub expected: Vec<String>,
}

impl ContentCheck {
	/// Whether no violation was found.
	pub fn is_valid(&self) -> bool {
		self.unexpected.is_empty() && !self.incomplete
	}
}

/// Declaration of an element in some grammar.
pub trait ElementDeclaration: fmt::Debug + Send + Sync {
	/// Local name of the declared element.
	fn local_name(&self) -> &str;

	/// Namespace URI, `None` for no namespace.
	fn namespace(&self) -> Option<&str> {
		None
	}

	/// Documentation attached in the grammar.
	fn documentation(&self) -> Option<&str> {
		None
	}

	/// Declared attributes.
	fn attributes(&self) -> Vec<AttributeDecl>;

	/// Looks up a declared attribute by name.
	fn find_attribute(&self, name: &str) -> Option<AttributeDecl> {
		self.attributes().into_iter().find(|attr| attr.name() == name)
	}

	/// Every element that may appear as a child.
	fn child_declarations(&self) -> Vec<ElementDecl>;

	/// Declaration of `child` when it appears under this element.
	fn find_child(&self, child: &ElementRef<'_>) -> Option<ElementDecl> {
		self.child_declarations().into_iter().find(|decl| decl.matches(child))
	}

	/// Children that every instance must contain, in order.
	fn required_children(&self) -> Vec<ElementDecl> {
		Vec::new()
	}

	/// Whether the element is declared empty.
	fn is_empty_content(&self) -> bool {
		false
	}

	/// Whether attributes not declared by name are allowed.
	fn accepts_any_attribute(&self) -> bool {
		false
	}

	/// Checks the children of `element` against this declaration.
	fn check_content(&self, _element: &ElementRef<'_>) -> ContentCheck {
		ContentCheck::default()
	}

	/// Alternatives that could complete the content of `element`.
	///
	/// Non-empty only when the content is incomplete and the dialect can say
	/// which elements would satisfy it. Dialects without choice analysis return
	/// an empty list.
	fn possible_required_elements(&self, _element: &ElementRef<'_>) -> Vec<ElementDecl> {
		Vec::new()
	}

	/// Whether this declaration describes `element`.
	fn matches(&self, element: &ElementRef<'_>) -> bool {
		element.local_name() == self.local_name()
			&& element.namespace_uri().unwrap_or_default() == self.namespace().unwrap_or_default()
	}
}

/// Declaration of an attribute.
pub trait AttributeDeclaration: fmt::Debug + Send + Sync {
	/// Attribute name (qualified as declared).
	fn name(&self) -> &str;

	/// Whether the attribute must be present.
	fn is_required(&self) -> bool;

	/// Default or fixed value.
	fn default_value(&self) -> Option<&str> {
		None
	}

	/// Allowed values, empty when the value is unconstrained.
	fn enumerated_values(&self) -> Vec<String> {
		Vec::new()
	}

	/// Documentation attached in the grammar.
	fn documentation(&self) -> Option<&str> {
		None
	}
}

/// A compiled grammar.
pub trait GrammarDocument: fmt::Debug + Send + Sync {
	/// Location the grammar was loaded from.
	fn uri(&self) -> &Url;

	/// Dialect.
	fn kind(&self) -> GrammarKind;

	/// Declarations allowed as the document element.
	fn top_level_elements(&self) -> Vec<ElementDecl>;

	/// Declaration governing `element`.
	///
	/// Walks from the document element down to `element`, matching each step
	/// against the children of the previous declaration.
	fn find_element_declaration(&self, element: &ElementRef<'_>) -> Option<ElementDecl> {
		let path = element.path_from_root();
		let (root, rest) = path.split_first()?;
		let mut decl = self.top_level_elements().into_iter().find(|decl| decl.matches(root))?;
		for step in rest {
			decl = decl.find_child(step)?;
		}
		Some(decl)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_kind_from_extension() {
		let rng = Url::parse("file:///s/schema.RNG").unwrap();
		let dtd = Url::parse("http://example.com/doc.dtd").unwrap();
		let xsd = Url::parse("file:///s/schema.xsd").unwrap();
		assert_eq!(GrammarKind::from_extension(&rng), Some(GrammarKind::RelaxNg));
		assert_eq!(GrammarKind::from_extension(&dtd), Some(GrammarKind::Dtd));
		assert_eq!(GrammarKind::from_extension(&xsd), None);
	}
}
