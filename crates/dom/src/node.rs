//! Node types of the document tree.
//!
//! Nodes live in an arena owned by their [`Document`](crate::Document) and refer
//! to each other through [`NodeId`]s. All offsets are char offsets into the
//! snapshot text.

use indexmap::IndexMap;

/// Index of a node inside its document's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
	/// Returns the arena index.
	pub const fn index(self) -> usize {
		self.0 as usize
	}
}

/// A node of the tree together with its span.
#[derive(Debug, Clone)]
pub struct Node {
	pub(crate) id: NodeId,
	pub(crate) parent: Option<NodeId>,
	pub(crate) start: usize,
	pub(crate) end: usize,
	pub(crate) kind: NodeKind,
}

impl Node {
	/// Arena id of this node.
	pub fn id(&self) -> NodeId {
		self.id
	}

	/// Parent node, `None` for top-level nodes.
	pub fn parent(&self) -> Option<NodeId> {
		self.parent
	}

	/// Start offset (inclusive).
	pub fn start(&self) -> usize {
		self.start
	}

	/// End offset (exclusive).
	pub fn end(&self) -> usize {
		self.end
	}

	/// Node payload.
	pub fn kind(&self) -> &NodeKind {
		&self.kind
	}

	/// Returns the element payload if this node is an element.
	pub fn as_element(&self) -> Option<&Element> {
		match &self.kind {
			NodeKind::Element(element) => Some(element),
			_ => None,
		}
	}

	/// Whether this node is an element.
	pub fn is_element(&self) -> bool {
		matches!(self.kind, NodeKind::Element(_))
	}

	/// Child ids, empty for leaf nodes.
	pub fn children(&self) -> &[NodeId] {
		match &self.kind {
			NodeKind::Element(element) => &element.children,
			_ => &[],
		}
	}
}

/// Tagged node payload.
#[derive(Debug, Clone)]
pub enum NodeKind {
	/// An element with attributes and children.
	Element(Element),
	/// Character data between tags.
	Text(Text),
	/// A `<![CDATA[...]]>` section.
	CData(Text),
	/// A `<!-- ... -->` comment.
	Comment(Text),
	/// A `<?target data?>` processing instruction.
	ProcessingInstruction(ProcessingInstruction),
	/// The `<!DOCTYPE ...>` declaration.
	DocumentType(DocumentType),
}

/// Text-like payload (text, CDATA and comment contents).
#[derive(Debug, Clone)]
pub struct Text {
	pub(crate) content: String,
}

impl Text {
	/// The raw content, without delimiters and without entity expansion.
	pub fn content(&self) -> &str {
		&self.content
	}

	/// Whether the content is only XML whitespace.
	pub fn is_whitespace(&self) -> bool {
		self.content.chars().all(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
	}
}

/// Element payload.
#[derive(Debug, Clone)]
pub struct Element {
	pub(crate) prefix: Option<String>,
	pub(crate) local_name: String,
	pub(crate) namespace_uri: Option<String>,
	pub(crate) attributes: IndexMap<String, Attribute>,
	pub(crate) children: Vec<NodeId>,
	pub(crate) start_tag_close_offset: Option<usize>,
	pub(crate) end_tag_open_offset: Option<usize>,
	pub(crate) self_closed: bool,
}

impl Element {
	/// Namespace prefix as written in the start tag.
	pub fn prefix(&self) -> Option<&str> {
		self.prefix.as_deref()
	}

	/// Local part of the element name.
	pub fn local_name(&self) -> &str {
		&self.local_name
	}

	/// Qualified name as written in the start tag.
	pub fn tag_name(&self) -> String {
		match &self.prefix {
			Some(prefix) => format!("{prefix}:{}", self.local_name),
			None => self.local_name.clone(),
		}
	}

	/// Namespace URI bound to the element's prefix (or the default namespace).
	pub fn namespace_uri(&self) -> Option<&str> {
		self.namespace_uri.as_deref()
	}

	/// Attributes keyed by qualified name.
	pub fn attributes(&self) -> &IndexMap<String, Attribute> {
		&self.attributes
	}

	/// Looks up an attribute by qualified name.
	pub fn attribute(&self, name: &str) -> Option<&Attribute> {
		self.attributes.get(name)
	}

	/// Child node ids in document order.
	pub fn children(&self) -> &[NodeId] {
		&self.children
	}

	/// Offset of the `>` that closes the start tag.
	pub fn start_tag_close_offset(&self) -> Option<usize> {
		self.start_tag_close_offset
	}

	/// Offset of the `<` of the `</name>` end tag.
	pub fn end_tag_open_offset(&self) -> Option<usize> {
		self.end_tag_open_offset
	}

	/// Whether the element was written as `<name/>`.
	pub fn is_self_closed(&self) -> bool {
		self.self_closed
	}

	/// Offsets of the content between start and end tag, if both tags are present.
	pub fn content_span(&self) -> Option<(usize, usize)> {
		let open = self.start_tag_close_offset?;
		let close = self.end_tag_open_offset?;
		Some((open + 1, close))
	}
}

/// A single attribute of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
	pub(crate) name: String,
	pub(crate) value: Option<String>,
	pub(crate) name_span: (usize, usize),
	pub(crate) value_span: Option<(usize, usize)>,
}

impl Attribute {
	/// Qualified attribute name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Local part of the attribute name.
	pub fn local_name(&self) -> &str {
		self.name.split_once(':').map_or(self.name.as_str(), |(_, local)| local)
	}

	/// Prefix of the attribute name, if any.
	pub fn prefix(&self) -> Option<&str> {
		self.name.split_once(':').map(|(prefix, _)| prefix)
	}

	/// Unquoted value.
	pub fn value(&self) -> Option<&str> {
		self.value.as_deref()
	}

	/// Offsets of the attribute name.
	pub fn name_span(&self) -> (usize, usize) {
		self.name_span
	}

	/// Offsets of the value, excluding quotes.
	pub fn value_span(&self) -> Option<(usize, usize)> {
		self.value_span
	}

	/// Whether this attribute declares a namespace (`xmlns` or `xmlns:*`).
	pub fn is_xmlns(&self) -> bool {
		self.name == "xmlns" || self.name.starts_with("xmlns:")
	}
}

/// A processing instruction, with its pseudo-attributes parsed.
#[derive(Debug, Clone)]
pub struct ProcessingInstruction {
	pub(crate) target: String,
	pub(crate) data: Option<String>,
}

impl ProcessingInstruction {
	/// PI target, e.g. `xml-model`.
	pub fn target(&self) -> &str {
		&self.target
	}

	/// Raw PI data after the target.
	pub fn data(&self) -> Option<&str> {
		self.data.as_deref()
	}

	/// Parses `name="value"` pairs out of the PI data.
	///
	/// Malformed trailing input is ignored.
	pub fn pseudo_attributes(&self) -> Vec<(String, String)> {
		let Some(data) = self.data.as_deref() else {
			return Vec::new();
		};

		let mut out = Vec::new();
		let mut rest = data.trim_start();
		while let Some(eq) = rest.find('=') {
			let name = rest[..eq].trim();
			let after = rest[eq + 1..].trim_start();
			let Some(quote) = after.chars().next().filter(|c| *c == '"' || *c == '\'') else {
				break;
			};
			let Some(close) = after[1..].find(quote) else {
				break;
			};
			out.push((name.to_string(), after[1..1 + close].to_string()));
			rest = after[close + 2..].trim_start();
		}
		out
	}

	/// Looks up a single pseudo-attribute.
	pub fn pseudo_attribute(&self, name: &str) -> Option<String> {
		self.pseudo_attributes().into_iter().find(|(n, _)| n == name).map(|(_, v)| v)
	}
}

/// The `<!DOCTYPE>` declaration.
#[derive(Debug, Clone, Default)]
pub struct DocumentType {
	pub(crate) name: String,
	pub(crate) public_id: Option<String>,
	pub(crate) system_id: Option<String>,
	pub(crate) internal_subset: Option<String>,
}

impl DocumentType {
	/// Declared root element name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// `PUBLIC` identifier.
	pub fn public_id(&self) -> Option<&str> {
		self.public_id.as_deref()
	}

	/// `SYSTEM` identifier (the DTD location).
	pub fn system_id(&self) -> Option<&str> {
		self.system_id.as_deref()
	}

	/// Text between `[` and `]`, if an internal subset is present.
	pub fn internal_subset(&self) -> Option<&str> {
		self.internal_subset.as_deref()
	}
}
