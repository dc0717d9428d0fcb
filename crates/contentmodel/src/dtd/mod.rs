//! DTD adapter.
//!
//! DTD declarations are global: an element is declared once and its
//! declaration applies wherever it appears. Content checks report undeclared
//! children and missing mandatory children of sequences. There is no
//! choice-group analysis, so [`ElementDeclaration::possible_required_elements`]
//! keeps its empty default.

mod parse;

use std::sync::Arc;

use indexmap::IndexMap;
use xmlls_dom::{ElementRef, Url};

pub use self::parse::parse_dtd;
use crate::model::{
	AttributeDecl, AttributeDeclaration, ContentCheck, ElementDecl, ElementDeclaration, GrammarDocument, GrammarKind,
	UnexpectedChild,
};
use crate::Result;

/// Content specification of an `<!ELEMENT>` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSpec {
	/// `EMPTY`
	Empty,
	/// `ANY`
	Any,
	/// `(#PCDATA | a | b)*`
	Mixed(Vec<String>),
	/// Element-only content.
	Children(ContentParticle),
}

/// A content particle with its occurrence indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentParticle {
	/// Name, sequence or choice.
	pub kind: ParticleKind,
	/// `?`, `*`, `+` or none.
	pub occurrence: Occurrence,
}

/// Shape of a content particle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParticleKind {
	/// An element name.
	Name(String),
	/// `(a, b, c)`
	Seq(Vec<ContentParticle>),
	/// `(a | b | c)`
	Choice(Vec<ContentParticle>),
}

/// Occurrence indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occurrence {
	/// No indicator.
	Once,
	/// `?`
	Optional,
	/// `*`
	ZeroOrMore,
	/// `+`
	OneOrMore,
}

impl Occurrence {
	fn is_mandatory(self) -> bool {
		matches!(self, Occurrence::Once | Occurrence::OneOrMore)
	}
}

impl ContentParticle {
	fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
		match &self.kind {
			ParticleKind::Name(name) => {
				if !out.contains(&name.as_str()) {
					out.push(name);
				}
			}
			ParticleKind::Seq(members) | ParticleKind::Choice(members) => {
				for member in members {
					member.collect_names(out);
				}
			}
		}
	}

	/// Names that must appear in every instance, in order.
	fn mandatory_names<'a>(&'a self, out: &mut Vec<&'a str>) {
		if !self.occurrence.is_mandatory() {
			return;
		}
		match &self.kind {
			ParticleKind::Name(name) => out.push(name),
			ParticleKind::Seq(members) => {
				for member in members {
					member.mandatory_names(out);
				}
			}
			ParticleKind::Choice(members) => {
				if let [only] = members.as_slice() {
					only.mandatory_names(out);
				}
			}
		}
	}
}

/// Declared type of an attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeType {
	/// `CDATA`
	CData,
	/// `ID`
	Id,
	/// `IDREF`
	IdRef,
	/// `IDREFS`
	IdRefs,
	/// `ENTITY`
	Entity,
	/// `ENTITIES`
	Entities,
	/// `NMTOKEN`
	NmToken,
	/// `NMTOKENS`
	NmTokens,
	/// `NOTATION (a | b)`
	Notation(Vec<String>),
	/// `(a | b)`
	Enumeration(Vec<String>),
}

/// Default declaration of an attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultDecl {
	/// `#REQUIRED`
	Required,
	/// `#IMPLIED`
	Implied,
	/// `#FIXED "value"`
	Fixed(String),
	/// `"value"`
	Value(String),
}

/// One attribute of an `<!ATTLIST>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DtdAttribute {
	/// Attribute name.
	pub name: String,
	/// Declared type.
	pub attr_type: AttributeType,
	/// Default declaration.
	pub default: DefaultDecl,
}

/// An `<!ELEMENT>` with its merged attribute list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DtdElement {
	/// Element name as declared (may carry a prefix).
	pub name: String,
	/// Content specification.
	pub content: ContentSpec,
	/// Attributes from all `<!ATTLIST>`s for this element.
	pub attributes: Vec<DtdAttribute>,
	/// Text of the comment immediately preceding the declaration.
	pub documentation: Option<String>,
}

/// Parsed declarations of a DTD.
#[derive(Debug, Clone, Default)]
pub struct DtdSchema {
	pub(crate) elements: IndexMap<String, DtdElement>,
}

impl DtdSchema {
	/// Element declaration by name.
	pub fn element(&self, name: &str) -> Option<&DtdElement> {
		self.elements.get(name)
	}

	/// All element declarations in declaration order.
	pub fn elements(&self) -> impl Iterator<Item = &DtdElement> {
		self.elements.values()
	}
}

/// A compiled DTD.
#[derive(Debug)]
pub struct DtdGrammar {
	uri: Url,
	schema: Arc<DtdSchema>,
	root: Option<String>,
}

impl DtdGrammar {
	/// Parses `text` loaded from `uri`.
	pub fn parse(uri: Url, text: &str) -> Result<Self> {
		let schema = parse_dtd(&uri, text)?;
		Ok(Self {
			uri,
			schema: Arc::new(schema),
			root: None,
		})
	}

	/// Restricts the document element to `name` (the DOCTYPE name).
	pub fn with_root(mut self, name: impl Into<String>) -> Self {
		self.root = Some(name.into());
		self
	}

	/// Parsed declarations.
	pub fn schema(&self) -> &DtdSchema {
		&self.schema
	}

	fn decl(&self, name: &str) -> Option<ElementDecl> {
		DtdElementDeclaration::new(Arc::clone(&self.schema), name).map(|d| Arc::new(d) as ElementDecl)
	}
}

impl GrammarDocument for DtdGrammar {
	fn uri(&self) -> &Url {
		&self.uri
	}

	fn kind(&self) -> GrammarKind {
		GrammarKind::Dtd
	}

	fn top_level_elements(&self) -> Vec<ElementDecl> {
		match &self.root {
			Some(root) => self.decl(root).into_iter().collect(),
			None => self.schema.elements.keys().filter_map(|name| self.decl(name)).collect(),
		}
	}

	fn find_element_declaration(&self, element: &ElementRef<'_>) -> Option<ElementDecl> {
		self.decl(&element.tag_name())
	}
}

/// View of one `<!ELEMENT>`.
#[derive(Debug, Clone)]
pub struct DtdElementDeclaration {
	schema: Arc<DtdSchema>,
	index: usize,
}

impl DtdElementDeclaration {
	fn new(schema: Arc<DtdSchema>, name: &str) -> Option<Self> {
		let index = schema.elements.get_index_of(name)?;
		Some(Self { schema, index })
	}

	fn element(&self) -> Option<&DtdElement> {
		self.schema.elements.get_index(self.index).map(|(_, e)| e)
	}

	fn allowed_names(&self) -> Vec<&str> {
		let Some(element) = self.element() else {
			return Vec::new();
		};
		match &element.content {
			ContentSpec::Empty => Vec::new(),
			ContentSpec::Any => self.schema.elements.keys().map(String::as_str).collect(),
			ContentSpec::Mixed(names) => names.iter().map(String::as_str).collect(),
			ContentSpec::Children(particle) => {
				let mut out = Vec::new();
				particle.collect_names(&mut out);
				out
			}
		}
	}

	fn mandatory_names(&self) -> Vec<&str> {
		let mut out = Vec::new();
		if let Some(ContentSpec::Children(particle)) = self.element().map(|e| &e.content) {
			particle.mandatory_names(&mut out);
		}
		out
	}
}

impl ElementDeclaration for DtdElementDeclaration {
	fn local_name(&self) -> &str {
		self.element().map_or("", |e| e.name.as_str())
	}

	fn documentation(&self) -> Option<&str> {
		self.element()?.documentation.as_deref()
	}

	fn attributes(&self) -> Vec<AttributeDecl> {
		let Some(element) = self.element() else {
			return Vec::new();
		};
		element
			.attributes
			.iter()
			.map(|attribute| Arc::new(DtdAttributeDeclaration(attribute.clone())) as AttributeDecl)
			.collect()
	}

	fn child_declarations(&self) -> Vec<ElementDecl> {
		self.allowed_names()
			.into_iter()
			.filter_map(|name| DtdElementDeclaration::new(Arc::clone(&self.schema), name))
			.map(|d| Arc::new(d) as ElementDecl)
			.collect()
	}

	fn find_child(&self, child: &ElementRef<'_>) -> Option<ElementDecl> {
		let name = child.tag_name();
		if !self.allowed_names().contains(&name.as_str()) {
			return None;
		}
		DtdElementDeclaration::new(Arc::clone(&self.schema), &name).map(|d| Arc::new(d) as ElementDecl)
	}

	fn required_children(&self) -> Vec<ElementDecl> {
		self.mandatory_names()
			.into_iter()
			.filter_map(|name| DtdElementDeclaration::new(Arc::clone(&self.schema), name))
			.map(|d| Arc::new(d) as ElementDecl)
			.collect()
	}

	fn is_empty_content(&self) -> bool {
		self.element().is_some_and(|e| e.content == ContentSpec::Empty)
	}

	fn check_content(&self, element: &ElementRef<'_>) -> ContentCheck {
		let allowed = self.allowed_names();
		let mut check = ContentCheck::default();
		let mut present = Vec::new();
		for child in element.child_elements() {
			let name = child.tag_name();
			if allowed.contains(&name.as_str()) {
				present.push(name);
			} else {
				check.unexpected.push(UnexpectedChild {
					node: child.id(),
					expected: allowed.iter().map(|n| n.to_string()).collect(),
				});
			}
		}
		let missing: Vec<String> = self
			.mandatory_names()
			.into_iter()
			.filter(|name| !present.iter().any(|p| p == name))
			.map(str::to_string)
			.collect();
		if !missing.is_empty() {
			check.incomplete = true;
			check.expected = missing;
		}
		check
	}

	fn matches(&self, element: &ElementRef<'_>) -> bool {
		element.tag_name() == self.local_name()
	}
}

/// View of one `<!ATTLIST>` entry.
#[derive(Debug, Clone)]
pub struct DtdAttributeDeclaration(DtdAttribute);

impl AttributeDeclaration for DtdAttributeDeclaration {
	fn name(&self) -> &str {
		&self.0.name
	}

	fn is_required(&self) -> bool {
		self.0.default == DefaultDecl::Required
	}

	fn default_value(&self) -> Option<&str> {
		match &self.0.default {
			DefaultDecl::Fixed(value) | DefaultDecl::Value(value) => Some(value),
			DefaultDecl::Required | DefaultDecl::Implied => None,
		}
	}

	fn enumerated_values(&self) -> Vec<String> {
		match &self.0.attr_type {
			AttributeType::Enumeration(values) | AttributeType::Notation(values) => values.clone(),
			_ => Vec::new(),
		}
	}
}

#[cfg(test)]
mod tests;
