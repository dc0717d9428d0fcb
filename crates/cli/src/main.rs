//! `xmlls`: validate XML files against their grammars and apply quick fixes.

mod cli;
mod fix;
mod report;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::Parser;
use cli::{Cli, Command, Format};
use tracing::{debug, info};
use xmlls_contentmodel::{CancelChecker, ContentModelManager};
use xmlls_dom::{Document, Url};
use xmlls_service::{XmlLanguageService, XmlSettings};

fn main() -> anyhow::Result<ExitCode> {
	let cli = Cli::parse();
	setup_tracing(cli.verbose);

	let settings = match &cli.config {
		Some(path) => {
			let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
			XmlSettings::from_json(&text).with_context(|| format!("parsing settings {}", path.display()))?
		}
		None => XmlSettings::default(),
	};
	let service = XmlLanguageService::new(Arc::new(ContentModelManager::default()), settings)
		.context("invalid file association")?;
	let cancel = CancelChecker::never();

	match cli.command {
		Command::Check { files, format } => {
			let mut failed = false;
			for path in &files {
				let document = open(path)?;
				let diagnostics = service.diagnostics(&document, &cancel)?;
				debug!(path = %path.display(), count = diagnostics.len(), "checked");
				for diagnostic in &diagnostics {
					let line = match format {
						Format::Text => report::text_line(path, diagnostic),
						Format::Json => report::json_line(path, diagnostic)?,
					};
					println!("{line}");
				}
				failed |= report::has_errors(&diagnostics);
				service.document_closed(document.url());
			}
			Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
		}
		Command::Fix { file, element, write } => {
			let document = open(&file)?;
			let Some(fixed) = fix::fix_document(&service, &document, element.as_deref(), &cancel)? else {
				info!(path = %file.display(), "nothing to fix");
				if !write {
					print!("{}", document.text());
				}
				return Ok(ExitCode::SUCCESS);
			};
			if write {
				std::fs::write(&file, fixed).with_context(|| format!("writing {}", file.display()))?;
				info!(path = %file.display(), "fixed");
			} else {
				print!("{fixed}");
			}
			Ok(ExitCode::SUCCESS)
		}
	}
}

fn open(path: &Path) -> anyhow::Result<Document> {
	let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
	let absolute = std::path::absolute(path).with_context(|| format!("resolving {}", path.display()))?;
	let url = Url::from_file_path(&absolute).map_err(|()| anyhow!("not a file path: {}", absolute.display()))?;
	Ok(Document::parse(url, 0, &text))
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("xmlls=debug,xmlls_service=debug,xmlls_contentmodel=debug,info")
		} else {
			EnvFilter::new("warn")
		}
	});
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();
}
