use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "xmlls")]
#[command(about = "Validate XML documents against their RELAX NG or DTD grammars")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Settings file (JSON, same shape as the language server's initialization options)
	#[arg(long, short = 'c', global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Verbose logging
	#[arg(long, short = 'v', global = true)]
	pub verbose: bool,

	/// Subcommand to execute.
	#[command(subcommand)]
	pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
	/// Report diagnostics for each file
	Check {
		/// Files to validate
		#[arg(required = true)]
		files: Vec<PathBuf>,

		/// Output format
		#[arg(long, value_enum, default_value_t = Format::Text)]
		format: Format,
	},
	/// Apply quick fixes to a file
	Fix {
		/// File to fix
		file: PathBuf,

		/// Preferred element when a fix offers alternatives (defaults to the first)
		#[arg(long, value_name = "NAME")]
		element: Option<String>,

		/// Rewrite the file instead of printing the result
		#[arg(long, short = 'w')]
		write: bool,
	},
}

/// Diagnostic output format.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
	/// `path:line:column: severity [code] message`
	Text,
	/// One JSON diagnostic per line
	Json,
}
