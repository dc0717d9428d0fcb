//! Dialect-independent content model for XML documents.
//!
//! Grammars in different schema languages are compiled into implementations of
//! the [`GrammarDocument`] / [`ElementDeclaration`] traits. Everything above
//! this crate (validation, completion, code actions) talks only to those
//! traits:
//!
//! * [`relaxng`] compiles RELAX NG XML syntax and answers content questions
//!   with derivatives.
//! * [`dtd`] parses `<!ELEMENT>` / `<!ATTLIST>` declarations.
//! * [`ContentModelManager`] finds the grammars bound to a document and caches
//!   compiled grammars by URL and content fingerprint.
//! * [`Validator`] turns content violations into LSP diagnostics.
//! * [`XmlGenerator`] renders a declaration as an insertable element.

mod association;
mod cancel;
mod codes;
pub mod dtd;
mod error;
mod generator;
mod loader;
mod manager;
mod model;
pub mod relaxng;
mod validator;

pub use association::{FileAssociation, GrammarReference, GrammarSource, ReferenceOrigin};
pub use cancel::{CancelChecker, Cancelled};
pub use codes::ErrorCode;
pub use error::{GrammarError, Result};
pub use generator::{GeneratorSettings, XmlGenerator};
pub use loader::{FileLoader, GrammarLoader, MemoryLoader};
pub use manager::ContentModelManager;
pub use model::{
	AttributeDecl, AttributeDeclaration, ContentCheck, ElementDecl, ElementDeclaration, GrammarDocument,
	GrammarDocumentRef, GrammarKind, UnexpectedChild,
};
pub use validator::{DIAGNOSTIC_SOURCE, Validator};
