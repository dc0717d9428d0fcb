//! Grammar text retrieval.

use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::UNIX_EPOCH;

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHasher};
use xmlls_dom::Url;

use crate::{GrammarError, Result};

/// Source of grammar text.
///
/// Network retrieval and catalogs are out of scope; embedders provide their own
/// loader for those.
pub trait GrammarLoader: Send + Sync {
	/// Reads the grammar at `uri`.
	fn load(&self, uri: &Url) -> Result<String>;

	/// Cheap fingerprint of the current content, if the loader can provide one
	/// without reading the text. A changed fingerprint invalidates the cached
	/// grammar.
	fn fingerprint(&self, _uri: &Url) -> Option<u64> {
		None
	}
}

/// Hashes grammar text.
pub(crate) fn fingerprint_text(text: &str) -> u64 {
	let mut hasher = FxHasher::default();
	text.hash(&mut hasher);
	hasher.finish()
}

/// Loads `file://` URLs from the local file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLoader;

impl GrammarLoader for FileLoader {
	fn load(&self, uri: &Url) -> Result<String> {
		let path = uri.to_file_path().map_err(|()| GrammarError::Load {
			uri: uri.clone(),
			message: "not a file URL".into(),
		})?;
		Ok(std::fs::read_to_string(path)?)
	}

	/// Modification time and length of the file.
	fn fingerprint(&self, uri: &Url) -> Option<u64> {
		let metadata = std::fs::metadata(uri.to_file_path().ok()?).ok()?;
		let modified = metadata.modified().ok()?.duration_since(UNIX_EPOCH).ok()?;
		let mut hasher = FxHasher::default();
		modified.as_nanos().hash(&mut hasher);
		metadata.len().hash(&mut hasher);
		Some(hasher.finish())
	}
}

/// In-memory grammar store.
#[derive(Debug, Default)]
pub struct MemoryLoader {
	entries: RwLock<FxHashMap<Url, String>>,
	loads: AtomicUsize,
}

impl MemoryLoader {
	/// Creates an empty store.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds or replaces the grammar at `uri`.
	pub fn insert(&self, uri: Url, text: impl Into<String>) {
		self.entries.write().insert(uri, text.into());
	}

	/// Removes the grammar at `uri`.
	pub fn remove(&self, uri: &Url) -> Option<String> {
		self.entries.write().remove(uri)
	}

	/// Number of successful [`GrammarLoader::load`] calls so far.
	pub fn load_count(&self) -> usize {
		self.loads.load(Ordering::Relaxed)
	}
}

impl GrammarLoader for MemoryLoader {
	fn load(&self, uri: &Url) -> Result<String> {
		let text = self.entries.read().get(uri).cloned().ok_or_else(|| GrammarError::Load {
			uri: uri.clone(),
			message: "no such grammar".into(),
		})?;
		self.loads.fetch_add(1, Ordering::Relaxed);
		Ok(text)
	}

	fn fingerprint(&self, uri: &Url) -> Option<u64> {
		self.entries.read().get(uri).map(|text| fingerprint_text(text))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_file_loader_reads_and_fingerprints() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("schema.dtd");
		std::fs::write(&path, "<!ELEMENT a EMPTY>").unwrap();
		let uri = Url::from_file_path(&path).unwrap();

		assert_eq!(FileLoader.load(&uri).unwrap(), "<!ELEMENT a EMPTY>");
		let before = FileLoader.fingerprint(&uri).unwrap();
		std::fs::write(&path, "<!ELEMENT a ANY><!ELEMENT b EMPTY>").unwrap();
		assert_ne!(FileLoader.fingerprint(&uri), Some(before));
	}

	#[test]
	fn test_file_loader_rejects_missing_and_remote() {
		let dir = tempfile::tempdir().unwrap();
		let missing = Url::from_file_path(dir.path().join("missing.rng")).unwrap();
		assert!(matches!(FileLoader.load(&missing), Err(GrammarError::Io(_))));
		assert_eq!(FileLoader.fingerprint(&missing), None);

		let remote = Url::parse("http://example.com/schema.rng").unwrap();
		assert!(matches!(FileLoader.load(&remote), Err(GrammarError::Load { .. })));
	}

	#[test]
	fn test_memory_loader_counts_loads() {
		let loader = MemoryLoader::new();
		let uri = Url::parse("mem:///a.rng").unwrap();
		assert!(loader.load(&uri).is_err());
		loader.insert(uri.clone(), "text");
		assert_eq!(loader.load(&uri).unwrap(), "text");
		assert_eq!(loader.load_count(), 1);
		assert_eq!(loader.fingerprint(&uri), Some(fingerprint_text("text")));
	}
}
