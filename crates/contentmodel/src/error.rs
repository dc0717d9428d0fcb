use xmlls_dom::Url;

/// A convenient type alias for `Result` with `E` = [`GrammarError`].
pub type Result<T, E = GrammarError> = std::result::Result<T, E>;

/// Failures while locating, loading or compiling a grammar.
///
/// These never reach the user as request errors: the manager logs them and
/// treats the grammar as absent.
#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
	/// Reading the grammar failed.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// The loader cannot serve the URL.
	#[error("cannot load {uri}: {message}")]
	Load {
		/// Grammar location.
		uri: Url,
		/// Loader message.
		message: String,
	},
	/// The grammar text is malformed or uses unsupported constructs.
	#[error("{uri}: {message}")]
	Parse {
		/// Grammar location.
		uri: Url,
		/// What went wrong.
		message: String,
	},
	/// No adapter exists for the grammar's dialect.
	#[error("unsupported grammar dialect for {0}")]
	UnsupportedDialect(Url),
	/// A RELAX NG `ref` names a pattern no `define` provides.
	#[error("{uri}: reference to undefined pattern '{name}'")]
	UndefinedReference {
		/// Grammar location.
		uri: Url,
		/// The missing define.
		name: String,
	},
	/// A file association pattern is not a valid glob.
	#[error("invalid file association pattern: {0}")]
	InvalidPattern(#[from] globset::Error),
}
