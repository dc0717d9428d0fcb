//! Builds a [`Document`] from `xmlparser` tokens.
//!
//! The tokenizer reports byte spans; every offset stored in the tree is
//! converted to a char offset here. Tree construction is forgiving: elements
//! left open are closed where an ancestor closes (or at the end of the text)
//! without end-tag offsets, and stray end tags are dropped.

use indexmap::IndexMap;
use ropey::Rope;
use tracing::trace;
use url::Url;
use xmlparser::{ElementEnd, ExternalId, StrSpan, Token, Tokenizer};

use crate::XML_NAMESPACE;
use crate::document::{Document, SyntaxError};
use crate::node::{Attribute, DocumentType, Element, Node, NodeId, NodeKind, ProcessingInstruction, Text};
use crate::position::OffsetEncoding;

pub(crate) fn build(url: Url, version: i32, text: &str, encoding: OffsetEncoding) -> Document {
	let mut builder = TreeBuilder {
		rope: Rope::from_str(text),
		text,
		nodes: Vec::new(),
		top_level: Vec::new(),
		open: Vec::new(),
		namespaces: Vec::new(),
		pending: None,
		doctype: None,
		subset_start: None,
		errors: Vec::new(),
	};

	for token in Tokenizer::from(text) {
		match token {
			Ok(token) => builder.token(token),
			Err(err) => {
				let pos = err.pos();
				let offset = builder.text_pos_to_char(pos.row, pos.col);
				trace!(%url, offset, error = %err, "tokenizer stopped");
				builder.errors.push(SyntaxError {
					offset,
					message: err.to_string(),
				});
				break;
			}
		}
	}

	builder.finish(url, version, encoding)
}

struct OpenElement {
	id: NodeId,
	namespace_mark: usize,
}

struct TreeBuilder<'t> {
	rope: Rope,
	text: &'t str,
	nodes: Vec<Node>,
	top_level: Vec<NodeId>,
	open: Vec<OpenElement>,
	/// In-scope namespace bindings, innermost last. `None` is the default namespace.
	namespaces: Vec<(Option<String>, String)>,
	/// Element whose start tag has been seen but not yet closed.
	pending: Option<OpenElement>,
	doctype: Option<NodeId>,
	subset_start: Option<usize>,
	errors: Vec<SyntaxError>,
}

impl<'t> TreeBuilder<'t> {
	fn token(&mut self, token: Token<'t>) {
		match token {
			Token::ElementStart { prefix, local, span } => self.element_start(prefix, local, span),
			Token::Attribute {
				prefix, local, value, span, ..
			} => self.attribute(prefix, local, value, span),
			Token::ElementEnd { end, span } => self.element_end(end, span),
			Token::Text { text } => {
				let kind = NodeKind::Text(Text {
					content: text.as_str().to_string(),
				});
				self.push_leaf(kind, text);
			}
			Token::Cdata { text, span } => {
				let kind = NodeKind::CData(Text {
					content: text.as_str().to_string(),
				});
				self.push_leaf(kind, span);
			}
			Token::Comment { text, span } => {
				let kind = NodeKind::Comment(Text {
					content: text.as_str().to_string(),
				});
				self.push_leaf(kind, span);
			}
			Token::ProcessingInstruction { target, content, span } => {
				let kind = NodeKind::ProcessingInstruction(ProcessingInstruction {
					target: target.as_str().to_string(),
					data: content.map(|c| c.as_str().to_string()),
				});
				self.push_leaf(kind, span);
			}
			Token::DtdStart {
				name, external_id, span,
			} => {
				let id = self.push_leaf(NodeKind::DocumentType(doctype(name, external_id)), span);
				self.doctype = Some(id);
				self.subset_start = Some(span.end());
			}
			Token::EmptyDtd {
				name, external_id, span,
			} => {
				let id = self.push_leaf(NodeKind::DocumentType(doctype(name, external_id)), span);
				self.doctype = Some(id);
			}
			Token::DtdEnd { span } => self.dtd_end(span),
			_ => {}
		}
	}

	fn element_start(&mut self, prefix: StrSpan<'t>, local: StrSpan<'t>, span: StrSpan<'t>) {
		let element = Element {
			prefix: non_empty(prefix),
			local_name: local.as_str().to_string(),
			namespace_uri: None,
			attributes: IndexMap::new(),
			children: Vec::new(),
			start_tag_close_offset: None,
			end_tag_open_offset: None,
			self_closed: false,
		};
		let start = self.char_at(span.start());
		let end = self.char_at(span.end());
		let id = self.push_node(NodeKind::Element(element), start, end);
		self.pending = Some(OpenElement {
			id,
			namespace_mark: self.namespaces.len(),
		});
	}

	fn attribute(&mut self, prefix: StrSpan<'t>, local: StrSpan<'t>, value: StrSpan<'t>, span: StrSpan<'t>) {
		let Some(pending) = &self.pending else {
			return;
		};
		let id = pending.id;

		let name = match non_empty(prefix) {
			Some(prefix) => format!("{prefix}:{}", local.as_str()),
			None => local.as_str().to_string(),
		};
		match (non_empty(prefix).as_deref(), local.as_str()) {
			(None, "xmlns") => self.namespaces.push((None, value.as_str().to_string())),
			(Some("xmlns"), bound) => self.namespaces.push((Some(bound.to_string()), value.as_str().to_string())),
			_ => {}
		}

		let attribute = Attribute {
			name: name.clone(),
			value: Some(value.as_str().to_string()),
			name_span: (self.char_at(span.start()), self.char_at(local.end())),
			value_span: Some((self.char_at(value.start()), self.char_at(value.end()))),
		};
		let end = self.char_at(span.end());
		let node = &mut self.nodes[id.index()];
		node.end = node.end.max(end);
		if let NodeKind::Element(element) = &mut node.kind {
			element.attributes.insert(name, attribute);
		}
	}

	fn element_end(&mut self, end: ElementEnd<'t>, span: StrSpan<'t>) {
		let span_start = self.char_at(span.start());
		let span_end = self.char_at(span.end());
		match end {
			ElementEnd::Open => {
				if let Some(pending) = self.pending.take() {
					self.resolve_namespace(pending.id);
					let node = &mut self.nodes[pending.id.index()];
					node.end = span_end;
					if let NodeKind::Element(element) = &mut node.kind {
						element.start_tag_close_offset = Some(span_start);
					}
					self.open.push(pending);
				}
			}
			ElementEnd::Empty => {
				if let Some(pending) = self.pending.take() {
					self.resolve_namespace(pending.id);
					let node = &mut self.nodes[pending.id.index()];
					node.end = span_end;
					if let NodeKind::Element(element) = &mut node.kind {
						element.start_tag_close_offset = Some(span_end - 1);
						element.self_closed = true;
					}
					self.namespaces.truncate(pending.namespace_mark);
				}
			}
			ElementEnd::Close(prefix, local) => {
				let name = match non_empty(prefix) {
					Some(prefix) => format!("{prefix}:{}", local.as_str()),
					None => local.as_str().to_string(),
				};
				let matching = self.open.iter().rposition(|open| {
					matches!(&self.nodes[open.id.index()].kind, NodeKind::Element(e) if e.tag_name() == name)
				});
				let Some(index) = matching else {
					trace!(tag = %name, offset = span_start, "dropping unmatched end tag");
					return;
				};
				while self.open.len() > index + 1 {
					if let Some(unclosed) = self.open.pop() {
						self.nodes[unclosed.id.index()].end = span_start;
						self.namespaces.truncate(unclosed.namespace_mark);
					}
				}
				if let Some(closed) = self.open.pop() {
					let node = &mut self.nodes[closed.id.index()];
					node.end = span_end;
					if let NodeKind::Element(element) = &mut node.kind {
						element.end_tag_open_offset = Some(span_start);
					}
					self.namespaces.truncate(closed.namespace_mark);
				}
			}
		}
	}

	fn dtd_end(&mut self, span: StrSpan<'t>) {
		let Some(id) = self.doctype else {
			return;
		};
		let end = self.char_at(span.end());
		let subset = self
			.subset_start
			.take()
			.and_then(|start| self.text.get(start..span.start()))
			.map(str::to_string);
		let node = &mut self.nodes[id.index()];
		node.end = end;
		if let NodeKind::DocumentType(doctype) = &mut node.kind {
			doctype.internal_subset = subset;
		}
	}

	fn push_leaf(&mut self, kind: NodeKind, span: StrSpan<'t>) -> NodeId {
		let start = self.char_at(span.start());
		let end = self.char_at(span.end());
		self.push_node(kind, start, end)
	}

	fn push_node(&mut self, kind: NodeKind, start: usize, end: usize) -> NodeId {
		let id = NodeId(self.nodes.len() as u32);
		let parent = self.open.last().map(|open| open.id);
		self.nodes.push(Node {
			id,
			parent,
			start,
			end,
			kind,
		});
		match parent {
			Some(parent) => {
				if let NodeKind::Element(element) = &mut self.nodes[parent.index()].kind {
					element.children.push(id);
				}
			}
			None => self.top_level.push(id),
		}
		id
	}

	fn resolve_namespace(&mut self, id: NodeId) {
		let NodeKind::Element(element) = &mut self.nodes[id.index()].kind else {
			return;
		};
		element.namespace_uri = match element.prefix.as_deref() {
			Some("xml") => Some(XML_NAMESPACE.to_string()),
			prefix => self
				.namespaces
				.iter()
				.rev()
				.find(|(bound, _)| bound.as_deref() == prefix)
				.map(|(_, uri)| uri.clone())
				.filter(|uri| !uri.is_empty()),
		};
	}

	fn close_pending(&mut self, end: usize) {
		if let Some(pending) = self.pending.take() {
			self.resolve_namespace(pending.id);
			self.nodes[pending.id.index()].end = end;
			self.namespaces.truncate(pending.namespace_mark);
		}
	}

	fn finish(mut self, url: Url, version: i32, encoding: OffsetEncoding) -> Document {
		let len = self.rope.len_chars();
		self.close_pending(len);
		while let Some(unclosed) = self.open.pop() {
			self.nodes[unclosed.id.index()].end = len;
		}

		Document {
			url,
			version,
			text: self.rope,
			encoding,
			nodes: self.nodes,
			top_level: self.top_level,
			doctype: self.doctype,
			errors: self.errors,
		}
	}

	fn char_at(&self, byte: usize) -> usize {
		self.rope.byte_to_char(byte.min(self.rope.len_bytes()))
	}

	/// Converts the tokenizer's 1-based row/column into a char offset.
	fn text_pos_to_char(&self, row: u32, col: u32) -> usize {
		let line = (row.saturating_sub(1) as usize).min(self.rope.len_lines().saturating_sub(1));
		let line_start = self.rope.line_to_char(line);
		let line_len = self.rope.line(line).len_chars();
		line_start + (col.saturating_sub(1) as usize).min(line_len)
	}
}

fn non_empty(span: StrSpan<'_>) -> Option<String> {
	let s = span.as_str();
	(!s.is_empty()).then(|| s.to_string())
}

fn doctype(name: StrSpan<'_>, external_id: Option<ExternalId<'_>>) -> DocumentType {
	let (public_id, system_id) = match external_id {
		Some(ExternalId::System(system)) => (None, Some(system.as_str().to_string())),
		Some(ExternalId::Public(public, system)) => (Some(public.as_str().to_string()), Some(system.as_str().to_string())),
		None => (None, None),
	};
	DocumentType {
		name: name.as_str().to_string(),
		public_id,
		system_id,
		internal_subset: None,
	}
}
