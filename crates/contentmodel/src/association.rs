//! Discovery of the grammars a document is bound to.

use std::path::Path;

use globset::{Glob, GlobMatcher};
use serde::{Deserialize, Serialize};
use tracing::debug;
use xmlls_dom::{Document, Url};

use crate::model::GrammarKind;
use crate::relaxng::RELAXNG_NAMESPACE;
use crate::Result;

/// MIME types that identify a RELAX NG schema in `xml-model`.
const RELAXNG_TYPES: &[&str] = &["application/relax-ng+xml", "application/x-relax-ng+xml"];
/// MIME types that identify a DTD in `xml-model`.
const DTD_TYPES: &[&str] = &["application/xml-dtd"];

/// Binds documents matching a glob to a grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAssociation {
	/// Glob matched against the document path, e.g. `**/*.book.xml`.
	pub pattern: String,
	/// Grammar location: absolute URL, absolute path, or path relative to the document.
	pub system_id: String,
}

/// Where a grammar reference was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceOrigin {
	/// `<?xml-model href="..."?>`
	XmlModel,
	/// The DOCTYPE internal subset.
	InternalSubset,
	/// The DOCTYPE `SYSTEM` identifier.
	DocType,
	/// A configured [`FileAssociation`].
	FileAssociation,
}

/// Grammar text location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarSource {
	/// Loaded through the manager's loader.
	External(Url),
	/// Carried by the document itself; `uri` is the cache key.
	Inline {
		/// Synthetic URL identifying the inline grammar.
		uri: Url,
		/// Grammar text.
		text: String,
	},
}

impl GrammarSource {
	/// Cache key of the grammar.
	pub fn uri(&self) -> &Url {
		match self {
			GrammarSource::External(uri) | GrammarSource::Inline { uri, .. } => uri,
		}
	}
}

/// A grammar bound to a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarReference {
	/// Grammar location.
	pub source: GrammarSource,
	/// Dialect.
	pub kind: GrammarKind,
	/// How the binding was declared.
	pub origin: ReferenceOrigin,
	/// Document element name required by a DOCTYPE binding.
	pub root: Option<String>,
}

/// Compiled file associations.
#[derive(Debug, Default)]
pub(crate) struct FileAssociations {
	entries: Vec<(GlobMatcher, FileAssociation)>,
}

impl FileAssociations {
	pub(crate) fn new(associations: Vec<FileAssociation>) -> Result<Self> {
		let entries = associations
			.into_iter()
			.map(|association| -> Result<_> {
				let matcher = Glob::new(&association.pattern)?.compile_matcher();
				Ok((matcher, association))
			})
			.collect::<Result<Vec<_>>>()?;
		Ok(Self { entries })
	}

	fn references(&self, document: &Document, out: &mut Vec<GrammarReference>) {
		let path = match document.url().to_file_path() {
			Ok(path) => path,
			Err(()) => Path::new(document.url().path()).to_path_buf(),
		};
		for (matcher, association) in &self.entries {
			if !matcher.is_match(&path) {
				continue;
			}
			let Some(uri) = resolve_system_id(document.url(), &association.system_id) else {
				debug!(system_id = %association.system_id, "cannot resolve file association");
				continue;
			};
			push_external(out, uri, None, ReferenceOrigin::FileAssociation, None);
		}
	}
}

/// Collects the grammar references of `document` in binding order.
pub(crate) fn document_references(document: &Document, associations: &FileAssociations) -> Vec<GrammarReference> {
	let mut out = Vec::new();

	for pi in document.processing_instructions().filter(|pi| pi.target() == "xml-model") {
		let Some(href) = pi.pseudo_attribute("href") else {
			continue;
		};
		let Some(uri) = resolve_system_id(document.url(), &href) else {
			debug!(%href, "cannot resolve xml-model href");
			continue;
		};
		let hint = kind_from_hints(
			pi.pseudo_attribute("schematypens").as_deref(),
			pi.pseudo_attribute("type").as_deref(),
		);
		push_external(&mut out, uri, hint, ReferenceOrigin::XmlModel, None);
	}

	if let Some(doctype) = document.doctype() {
		let root = (!doctype.name().is_empty()).then(|| doctype.name().to_string());
		if let Some(subset) = doctype.internal_subset().filter(|s| !s.trim().is_empty()) {
			out.push(GrammarReference {
				source: GrammarSource::Inline {
					uri: internal_subset_uri(document.url()),
					text: subset.to_string(),
				},
				kind: GrammarKind::Dtd,
				origin: ReferenceOrigin::InternalSubset,
				root: root.clone(),
			});
		}
		if let Some(system_id) = doctype.system_id() {
			match resolve_system_id(document.url(), system_id) {
				Some(uri) => push_external(&mut out, uri, Some(GrammarKind::Dtd), ReferenceOrigin::DocType, root),
				None => debug!(%system_id, "cannot resolve DOCTYPE system id"),
			}
		}
	}

	associations.references(document, &mut out);
	out
}

fn push_external(
	out: &mut Vec<GrammarReference>,
	uri: Url,
	hint: Option<GrammarKind>,
	origin: ReferenceOrigin,
	root: Option<String>,
) {
	let Some(kind) = hint.or_else(|| GrammarKind::from_extension(&uri)) else {
		debug!(%uri, "unknown grammar dialect; skipped");
		return;
	};
	if out.iter().any(|r| r.source.uri() == &uri) {
		return;
	}
	out.push(GrammarReference {
		source: GrammarSource::External(uri),
		kind,
		origin,
		root,
	});
}

/// Dialect from `xml-model` pseudo-attributes.
pub(crate) fn kind_from_hints(schematypens: Option<&str>, mime: Option<&str>) -> Option<GrammarKind> {
	match schematypens.map(str::trim) {
		Some(RELAXNG_NAMESPACE) => return Some(GrammarKind::RelaxNg),
		Some(_) => return None,
		None => {}
	}
	let mime = mime?.trim();
	if RELAXNG_TYPES.contains(&mime) {
		Some(GrammarKind::RelaxNg)
	} else if DTD_TYPES.contains(&mime) {
		Some(GrammarKind::Dtd)
	} else {
		None
	}
}

/// Cache key of the grammar declared by the internal DTD subset of `document`.
pub(crate) fn internal_subset_uri(document: &Url) -> Url {
	let mut uri = document.clone();
	uri.set_fragment(Some("internal-subset"));
	uri
}

/// Resolves a system id against the document URL.
pub(crate) fn resolve_system_id(base: &Url, system_id: &str) -> Option<Url> {
	let system_id = system_id.trim();
	if system_id.is_empty() {
		return None;
	}
	let path = Path::new(system_id);
	if path.is_absolute() {
		return Url::from_file_path(path).ok();
	}
	match Url::parse(system_id) {
		Ok(url) => Some(url),
		Err(_) => base.join(system_id).ok(),
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn doc(url: &str, text: &str) -> Document {
		Document::parse(Url::parse(url).unwrap(), 1, text)
	}

	#[test]
	fn test_binding_order() {
		let d = doc(
			"file:///work/doc.xml",
			r#"<?xml-model href="schema.rng" schematypens="http://relaxng.org/ns/structure/1.0"?>
<!DOCTYPE root SYSTEM "dtd/root.dtd" [<!ELEMENT root ANY>]>
<root/>"#,
		);
		let associations = FileAssociations::new(vec![FileAssociation {
			pattern: "**/*.xml".into(),
			system_id: "/schemas/all.rng".into(),
		}])
		.unwrap();
		let refs = document_references(&d, &associations);
		let origins: Vec<_> = refs.iter().map(|r| r.origin).collect();
		assert_eq!(
			origins,
			vec![
				ReferenceOrigin::XmlModel,
				ReferenceOrigin::InternalSubset,
				ReferenceOrigin::DocType,
				ReferenceOrigin::FileAssociation,
			]
		);
		assert_eq!(refs[0].source.uri().as_str(), "file:///work/schema.rng");
		assert_eq!(refs[0].kind, GrammarKind::RelaxNg);
		assert_eq!(refs[2].source.uri().as_str(), "file:///work/dtd/root.dtd");
		assert_eq!(refs[2].root.as_deref(), Some("root"));
		assert_eq!(refs[3].source.uri().as_str(), "file:///schemas/all.rng");
	}

	#[test]
	fn test_unknown_dialect_is_skipped() {
		let d = doc(
			"file:///work/doc.xml",
			r#"<?xml-model href="schema.xsd"?><?xml-model href="s.sch" schematypens="http://purl.oclc.org/dsdl/schematron"?><root/>"#,
		);
		assert!(document_references(&d, &FileAssociations::default()).is_empty());
	}

	#[test]
	fn test_kind_from_hints() {
		assert_eq!(kind_from_hints(None, Some("application/xml-dtd")), Some(GrammarKind::Dtd));
		assert_eq!(kind_from_hints(Some(RELAXNG_NAMESPACE), None), Some(GrammarKind::RelaxNg));
		assert_eq!(kind_from_hints(None, None), None);
	}

	#[test]
	fn test_invalid_glob() {
		let err = FileAssociations::new(vec![FileAssociation {
			pattern: "a[".into(),
			system_id: "x.rng".into(),
		}]);
		assert!(matches!(err, Err(crate::GrammarError::InvalidPattern(_))));
	}
}
