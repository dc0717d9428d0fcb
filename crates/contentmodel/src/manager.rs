//! Grammar discovery and the compiled-grammar cache.

use std::borrow::Cow;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};
use xmlls_dom::{Document, ElementRef, Url};

use crate::association::{FileAssociations, document_references, internal_subset_uri};
use crate::cancel::{CancelChecker, Cancelled};
use crate::dtd::DtdGrammar;
use crate::loader::{FileLoader, GrammarLoader, fingerprint_text};
use crate::model::{ElementDecl, GrammarDocument, GrammarDocumentRef, GrammarKind};
use crate::relaxng::RelaxNgGrammar;
use crate::{FileAssociation, GrammarReference, GrammarSource, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
	uri: Url,
	root: Option<String>,
}

struct CacheEntry {
	fingerprint: u64,
	grammar: GrammarDocumentRef,
}

/// Finds and caches the grammars bound to documents.
///
/// The compiled-grammar cache is the only shared mutable state of the content
/// model. Entries are keyed by URL and invalidated when the content
/// fingerprint changes. The lock is never held while a grammar is loaded or
/// compiled; when two requests race on a miss, the first one to store its
/// result wins and the other adopts it.
pub struct ContentModelManager {
	loader: Arc<dyn GrammarLoader>,
	cache: RwLock<FxHashMap<CacheKey, CacheEntry>>,
	associations: RwLock<Arc<FileAssociations>>,
}

impl std::fmt::Debug for ContentModelManager {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ContentModelManager")
			.field("cached", &self.cached_count())
			.finish_non_exhaustive()
	}
}

impl Default for ContentModelManager {
	fn default() -> Self {
		Self::new(Arc::new(FileLoader))
	}
}

impl ContentModelManager {
	/// Creates a manager reading grammars through `loader`.
	pub fn new(loader: Arc<dyn GrammarLoader>) -> Self {
		Self {
			loader,
			cache: RwLock::new(FxHashMap::default()),
			associations: RwLock::new(Arc::new(FileAssociations::default())),
		}
	}

	/// Replaces the configured file associations.
	pub fn set_file_associations(&self, associations: Vec<FileAssociation>) -> Result<()> {
		let compiled = FileAssociations::new(associations)?;
		*self.associations.write() = Arc::new(compiled);
		Ok(())
	}

	/// Grammar references of `document` in binding order: `xml-model`
	/// instructions, DOCTYPE internal subset, DOCTYPE system id, file
	/// associations.
	pub fn references(&self, document: &Document) -> Vec<GrammarReference> {
		let associations = Arc::clone(&self.associations.read());
		document_references(document, &associations)
	}

	/// Grammars bound to `document`, in binding order.
	///
	/// Grammars that fail to load or compile are logged and skipped.
	pub fn find_applicable_grammars(
		&self,
		document: &Document,
		cancel: &CancelChecker,
	) -> Result<Vec<GrammarDocumentRef>, Cancelled> {
		let mut grammars = Vec::new();
		for reference in self.references(document) {
			cancel.check()?;
			match self.grammar(&reference) {
				Ok(grammar) => grammars.push(grammar),
				Err(error) => warn!(uri = %reference.source.uri(), %error, "grammar unavailable; skipped"),
			}
		}
		cancel.check()?;
		Ok(grammars)
	}

	/// Grammars bound to the document of `element` that declare `element`.
	pub fn find_applicable_grammars_for(
		&self,
		element: &ElementRef<'_>,
		cancel: &CancelChecker,
	) -> Result<Vec<GrammarDocumentRef>, Cancelled> {
		let grammars = self.find_applicable_grammars(element.document(), cancel)?;
		Ok(grammars
			.into_iter()
			.filter(|grammar| grammar.find_element_declaration(element).is_some())
			.collect())
	}

	/// Declaration of `element` in `grammar`.
	pub fn find_declaration(&self, grammar: &dyn GrammarDocument, element: &ElementRef<'_>) -> Option<ElementDecl> {
		let decl = grammar.find_element_declaration(element);
		if decl.is_none() {
			trace!(grammar = %grammar.uri(), element = element.local_name(), "no declaration");
		}
		decl
	}

	/// Returns the compiled grammar for `reference`, loading it on a miss.
	pub fn grammar(&self, reference: &GrammarReference) -> Result<GrammarDocumentRef> {
		let key = CacheKey {
			uri: reference.source.uri().clone(),
			root: reference.root.clone(),
		};
		let known = match &reference.source {
			GrammarSource::External(uri) => self.loader.fingerprint(uri),
			GrammarSource::Inline { text, .. } => Some(fingerprint_text(text)),
		};
		if let Some(fingerprint) = known {
			if let Some(grammar) = self.lookup(&key, fingerprint) {
				return Ok(grammar);
			}
		}

		let text: Cow<'_, str> = match &reference.source {
			GrammarSource::External(uri) => {
				debug!(%uri, kind = ?reference.kind, "loading grammar");
				Cow::Owned(self.loader.load(uri)?)
			}
			GrammarSource::Inline { text, .. } => Cow::Borrowed(text.as_str()),
		};
		let fingerprint = match known {
			Some(fingerprint) => fingerprint,
			None => {
				let fingerprint = fingerprint_text(&text);
				if let Some(grammar) = self.lookup(&key, fingerprint) {
					return Ok(grammar);
				}
				fingerprint
			}
		};

		let grammar = compile(reference, &text)?;
		let mut cache = self.cache.write();
		if let Some(entry) = cache.get(&key) {
			if entry.fingerprint == fingerprint {
				trace!(uri = %key.uri, "grammar stored concurrently; adopting it");
				return Ok(Arc::clone(&entry.grammar));
			}
		}
		cache.insert(key, CacheEntry {
			fingerprint,
			grammar: Arc::clone(&grammar),
		});
		Ok(grammar)
	}

	fn lookup(&self, key: &CacheKey, fingerprint: u64) -> Option<GrammarDocumentRef> {
		let cache = self.cache.read();
		let entry = cache.get(key)?;
		if entry.fingerprint != fingerprint {
			debug!(uri = %key.uri, "grammar changed; reloading");
			return None;
		}
		trace!(uri = %key.uri, "grammar cache hit");
		Some(Arc::clone(&entry.grammar))
	}

	/// Drops cached grammars loaded from `uri`. Returns whether any was cached.
	pub fn invalidate(&self, uri: &Url) -> bool {
		let mut cache = self.cache.write();
		let before = cache.len();
		cache.retain(|key, _| &key.uri != uri);
		before != cache.len()
	}

	/// Drops grammars declared inline by `document`, returning how many were cached.
	///
	/// Call when the document is closed; external grammars stay cached.
	pub fn evict_document(&self, document: &Url) -> usize {
		let inline = internal_subset_uri(document);
		let mut cache = self.cache.write();
		let before = cache.len();
		cache.retain(|key, _| key.uri != inline);
		let evicted = before - cache.len();
		if evicted > 0 {
			debug!(%document, evicted, "evicted inline grammars");
		}
		evicted
	}

	/// Drops every cached grammar.
	pub fn clear(&self) {
		self.cache.write().clear();
	}

	/// Number of cached grammars.
	pub fn cached_count(&self) -> usize {
		self.cache.read().len()
	}
}

fn compile(reference: &GrammarReference, text: &str) -> Result<GrammarDocumentRef> {
	let uri = reference.source.uri().clone();
	let grammar: GrammarDocumentRef = match reference.kind {
		GrammarKind::RelaxNg => Arc::new(RelaxNgGrammar::parse(uri, text)?),
		GrammarKind::Dtd => {
			let grammar = DtdGrammar::parse(uri, text)?;
			match &reference.root {
				Some(root) => Arc::new(grammar.with_root(root.clone())),
				None => Arc::new(grammar),
			}
		}
	};
	Ok(grammar)
}
