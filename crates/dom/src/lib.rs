//! Position-mapped XML document tree.
//!
//! A [`Document`] is an immutable snapshot of one version of an XML text: a
//! node arena with char-offset spans, plus the mapping between char offsets and
//! LSP line/column [`Position`](lsp_types::Position)s. Every fallible lookup
//! returns a [`Result`] or an `Option`; nothing here panics on bad input.
//!
//! Tokenizing is delegated to [`xmlparser`]; [`Document::parse`] turns its
//! tokens into the tree and records the first tokenizer error, if any.

mod builder;
mod document;
pub mod node;
pub mod position;

pub use document::{Document, ElementRef, SyntaxError};
pub use node::{Attribute, DocumentType, Element, Node, NodeId, NodeKind, ProcessingInstruction, Text};
pub use position::OffsetEncoding;
/// Re-export so dependents agree on the `Url` type.
pub use url::Url;

/// Namespace bound to the reserved `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// A convenient type alias for `Result` with `E` = [`DomError`].
pub type Result<T, E = DomError> = std::result::Result<T, E>;

/// Lookup failures against a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
	/// A char offset outside `0..=len`.
	#[error("offset {offset} is outside the document (length {len})")]
	BadLocation {
		/// Requested offset.
		offset: usize,
		/// Document length in chars.
		len: usize,
	},
	/// A position on a line the document does not have.
	#[error("line {line} is outside the document ({lines} lines)")]
	BadPosition {
		/// Requested zero-based line.
		line: u32,
		/// Number of lines in the document.
		lines: usize,
	},
}
