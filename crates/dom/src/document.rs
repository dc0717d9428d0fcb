//! Immutable document snapshots and element views.

use lsp_types::{Position, Range};
use ropey::Rope;
use url::Url;

use crate::node::{DocumentType, Element, Node, NodeId, NodeKind, ProcessingInstruction};
use crate::position::{OffsetEncoding, char_to_lsp_position, lsp_position_to_char};
use crate::{DomError, Result, XML_NAMESPACE};

/// Error reported by the tokenizer while building the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
	/// Char offset where tokenizing stopped.
	pub offset: usize,
	/// Tokenizer message.
	pub message: String,
}

/// A parsed XML document for one version of its text.
///
/// A `Document` never changes once built. Editing the text means parsing a new
/// `Document`; requests always receive the snapshot they run against as a
/// parameter.
#[derive(Debug)]
pub struct Document {
	pub(crate) url: Url,
	pub(crate) version: i32,
	pub(crate) text: Rope,
	pub(crate) encoding: OffsetEncoding,
	pub(crate) nodes: Vec<Node>,
	pub(crate) top_level: Vec<NodeId>,
	pub(crate) doctype: Option<NodeId>,
	pub(crate) errors: Vec<SyntaxError>,
}

impl Document {
	/// Parses `text` into a snapshot using UTF-16 columns.
	pub fn parse(url: Url, version: i32, text: &str) -> Self {
		Self::parse_with_encoding(url, version, text, OffsetEncoding::default())
	}

	/// Parses `text` into a snapshot using the given column encoding.
	pub fn parse_with_encoding(url: Url, version: i32, text: &str, encoding: OffsetEncoding) -> Self {
		crate::builder::build(url, version, text, encoding)
	}

	/// Document URL.
	pub fn url(&self) -> &Url {
		&self.url
	}

	/// Text version this snapshot was built from.
	pub fn version(&self) -> i32 {
		self.version
	}

	/// Snapshot text.
	pub fn text(&self) -> &Rope {
		&self.text
	}

	/// Length of the text in chars.
	pub fn len_chars(&self) -> usize {
		self.text.len_chars()
	}

	/// Column encoding used by the position mapping.
	pub fn encoding(&self) -> OffsetEncoding {
		self.encoding
	}

	/// Copies the text between two char offsets.
	pub fn slice(&self, start: usize, end: usize) -> Result<String> {
		self.check_offset(start)?;
		self.check_offset(end)?;
		Ok(self.text.slice(start.min(end)..end.max(start)).to_string())
	}

	/// Syntax errors reported while tokenizing.
	pub fn errors(&self) -> &[SyntaxError] {
		&self.errors
	}

	/// Looks up a node by id.
	pub fn node(&self, id: NodeId) -> Option<&Node> {
		self.nodes.get(id.index())
	}

	/// All nodes in document order.
	pub fn nodes(&self) -> impl Iterator<Item = &Node> {
		self.nodes.iter()
	}

	/// Top-level node ids in document order.
	pub fn top_level(&self) -> &[NodeId] {
		&self.top_level
	}

	/// Returns an element view for `id`, or `None` if the node is not an element.
	pub fn element(&self, id: NodeId) -> Option<ElementRef<'_>> {
		let node = self.node(id)?;
		let element = node.as_element()?;
		Some(ElementRef {
			document: self,
			node,
			element,
		})
	}

	/// The document element.
	pub fn root_element(&self) -> Option<ElementRef<'_>> {
		self.top_level.iter().find_map(|id| self.element(*id))
	}

	/// All elements in document order.
	pub fn elements(&self) -> impl Iterator<Item = ElementRef<'_>> {
		self.nodes.iter().filter_map(|node| self.element(node.id))
	}

	/// The `<!DOCTYPE>` declaration, if present.
	pub fn doctype(&self) -> Option<&DocumentType> {
		let node = self.node(self.doctype?)?;
		match &node.kind {
			NodeKind::DocumentType(doctype) => Some(doctype),
			_ => None,
		}
	}

	/// Processing instructions in the prolog and epilog.
	pub fn processing_instructions(&self) -> impl Iterator<Item = &ProcessingInstruction> {
		self.top_level.iter().filter_map(|id| match &self.node(*id)?.kind {
			NodeKind::ProcessingInstruction(pi) => Some(pi),
			_ => None,
		})
	}

	/// Maps a char offset to a line/column position.
	pub fn position_at(&self, offset: usize) -> Result<Position> {
		char_to_lsp_position(&self.text, offset, self.encoding).ok_or(DomError::BadLocation {
			offset,
			len: self.len_chars(),
		})
	}

	/// Maps a line/column position to a char offset.
	pub fn offset_at(&self, position: Position) -> Result<usize> {
		lsp_position_to_char(&self.text, position, self.encoding).ok_or(DomError::BadPosition {
			line: position.line,
			lines: self.text.len_lines(),
		})
	}

	/// Maps a pair of char offsets to a range.
	pub fn range_at(&self, start: usize, end: usize) -> Result<Range> {
		Ok(Range::new(self.position_at(start)?, self.position_at(end)?))
	}

	/// Finds the deepest node whose span satisfies `start < offset <= end`.
	pub fn find_node_at(&self, offset: usize) -> Option<NodeId> {
		let mut found = None;
		let mut candidates: &[NodeId] = &self.top_level;
		loop {
			let hit = candidates.iter().copied().find(|id| {
				self.node(*id)
					.is_some_and(|node| node.start < offset && offset <= node.end)
			});
			match hit {
				Some(id) => {
					found = Some(id);
					candidates = match self.node(id) {
						Some(node) => node.children(),
						None => &[],
					};
				}
				None => return found,
			}
		}
	}

	/// Finds the deepest element containing `offset`, see [`Self::find_node_at`].
	pub fn find_element_at(&self, offset: usize) -> Option<ElementRef<'_>> {
		self.element(self.find_node_at(offset)?)
	}

	/// Finds the deepest element containing `offset`, skipping over text,
	/// comment and other leaf nodes.
	pub fn find_enclosing_element(&self, offset: usize) -> Option<ElementRef<'_>> {
		let mut current = self.find_node_at(offset);
		while let Some(id) = current {
			if let Some(element) = self.element(id) {
				return Some(element);
			}
			current = self.node(id)?.parent;
		}
		None
	}

	fn check_offset(&self, offset: usize) -> Result<()> {
		if offset > self.len_chars() {
			return Err(DomError::BadLocation {
				offset,
				len: self.len_chars(),
			});
		}
		Ok(())
	}
}

/// Borrowed view of an element inside a [`Document`].
#[derive(Debug, Clone, Copy)]
pub struct ElementRef<'a> {
	document: &'a Document,
	node: &'a Node,
	element: &'a Element,
}

impl<'a> ElementRef<'a> {
	/// The owning snapshot.
	pub fn document(&self) -> &'a Document {
		self.document
	}

	/// Arena id.
	pub fn id(&self) -> NodeId {
		self.node.id
	}

	/// Underlying node.
	pub fn node(&self) -> &'a Node {
		self.node
	}

	/// Element payload.
	pub fn element(&self) -> &'a Element {
		self.element
	}

	/// Local name.
	pub fn local_name(&self) -> &'a str {
		self.element.local_name()
	}

	/// Prefix as written.
	pub fn prefix(&self) -> Option<&'a str> {
		self.element.prefix()
	}

	/// Qualified name as written.
	pub fn tag_name(&self) -> String {
		self.element.tag_name()
	}

	/// Resolved namespace URI.
	pub fn namespace_uri(&self) -> Option<&'a str> {
		self.element.namespace_uri()
	}

	/// Start offset (the `<` of the start tag).
	pub fn start(&self) -> usize {
		self.node.start
	}

	/// End offset.
	pub fn end(&self) -> usize {
		self.node.end
	}

	/// Span of `<` plus the qualified name in the start tag.
	pub fn start_tag_name_span(&self) -> (usize, usize) {
		let start = self.node.start;
		(start, start + 1 + self.tag_name().chars().count())
	}

	/// Attribute value by qualified name.
	pub fn attribute_value(&self, name: &str) -> Option<&'a str> {
		self.element.attribute(name)?.value()
	}

	/// Parent element, `None` for the document element.
	pub fn parent(&self) -> Option<ElementRef<'a>> {
		self.document.element(self.node.parent?)
	}

	/// Child elements in document order.
	pub fn child_elements(&self) -> impl Iterator<Item = ElementRef<'a>> + 'a {
		let document = self.document;
		self.element.children.iter().filter_map(move |id| document.element(*id))
	}

	/// Child nodes in document order.
	pub fn child_nodes(&self) -> impl Iterator<Item = &'a Node> + 'a {
		let document = self.document;
		self.element.children.iter().filter_map(move |id| document.node(*id))
	}

	/// Concatenated text and CDATA content of the direct children.
	pub fn text_content(&self) -> String {
		self.child_nodes()
			.filter_map(|node| match &node.kind {
				NodeKind::Text(text) | NodeKind::CData(text) => Some(text.content()),
				_ => None,
			})
			.collect()
	}

	/// Whether the element contains non-whitespace character data.
	pub fn has_text(&self) -> bool {
		self.child_nodes().any(|node| match &node.kind {
			NodeKind::Text(text) | NodeKind::CData(text) => !text.is_whitespace(),
			_ => false,
		})
	}

	/// Elements from the document element down to `self`, inclusive.
	pub fn path_from_root(&self) -> Vec<ElementRef<'a>> {
		let mut path = vec![*self];
		let mut current = *self;
		while let Some(parent) = current.parent() {
			path.push(parent);
			current = parent;
		}
		path.reverse();
		path
	}

	/// Resolves a namespace prefix in scope at this element (`None` is the default namespace).
	pub fn lookup_namespace(&self, prefix: Option<&str>) -> Option<String> {
		if prefix == Some("xml") {
			return Some(XML_NAMESPACE.to_string());
		}
		let attr = match prefix {
			Some(prefix) => format!("xmlns:{prefix}"),
			None => "xmlns".to_string(),
		};
		let mut current = Some(*self);
		while let Some(element) = current {
			if let Some(uri) = element.attribute_value(&attr) {
				return (!uri.is_empty()).then(|| uri.to_string());
			}
			current = element.parent();
		}
		None
	}
}
