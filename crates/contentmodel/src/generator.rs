//! Renders element declarations as insertable XML.

use crate::model::ElementDeclaration;

/// Depth limit when expanding required children of recursive declarations.
const MAX_DEPTH: usize = 8;

/// Indentation and line endings used by [`XmlGenerator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorSettings {
	/// Width of one indentation level when `insert_spaces` is set.
	pub tab_size: u32,
	/// Indent with spaces instead of tabs.
	pub insert_spaces: bool,
	/// Line delimiter between generated children.
	pub line_delimiter: String,
}

impl Default for GeneratorSettings {
	fn default() -> Self {
		Self {
			tab_size: 2,
			insert_spaces: true,
			line_delimiter: "\n".to_string(),
		}
	}
}

/// Generates element text from a declaration.
///
/// Output is a pure function of the declaration and the arguments.
#[derive(Debug, Clone)]
pub struct XmlGenerator {
	indent_unit: String,
	line_delimiter: String,
}

impl Default for XmlGenerator {
	fn default() -> Self {
		Self::new(&GeneratorSettings::default())
	}
}

struct Flags {
	generate_end_tag: bool,
	self_closing: bool,
	as_snippet: bool,
}

#[derive(Default)]
struct TabStops {
	next: u32,
	final_placed: bool,
}

impl TabStops {
	fn next(&mut self) -> u32 {
		self.next += 1;
		self.next
	}
}

impl XmlGenerator {
	/// Creates a generator for the given formatting.
	pub fn new(settings: &GeneratorSettings) -> Self {
		let indent_unit = if settings.insert_spaces {
			" ".repeat(settings.tab_size as usize)
		} else {
			"\t".to_string()
		};
		Self {
			indent_unit,
			line_delimiter: settings.line_delimiter.clone(),
		}
	}

	/// Renders `decl`.
	///
	/// * `existing_value` becomes the element body verbatim.
	/// * `generate_end_tag` appends `</name>`.
	/// * `self_closing` emits `<name/>` when there is no body to generate.
	/// * `indent_level` is the level of the generated start tag; required
	///   children go one level deeper, one per line.
	/// * `as_snippet` emits LSP snippet syntax: `$1`, `$2`, ... for attribute
	///   values and `$0` for the cursor position in an empty body.
	pub fn generate(
		&self,
		decl: &dyn ElementDeclaration,
		existing_value: Option<&str>,
		generate_end_tag: bool,
		self_closing: bool,
		indent_level: usize,
		as_snippet: bool,
	) -> String {
		let flags = Flags {
			generate_end_tag,
			self_closing,
			as_snippet,
		};
		let mut stops = TabStops::default();
		let mut out = String::new();
		self.element(&mut out, decl, existing_value, &flags, &mut stops, indent_level, 0);
		out
	}

	#[allow(clippy::too_many_arguments)]
	fn element(
		&self,
		out: &mut String,
		decl: &dyn ElementDeclaration,
		existing_value: Option<&str>,
		flags: &Flags,
		stops: &mut TabStops,
		level: usize,
		depth: usize,
	) {
		let name = decl.local_name();
		out.push('<');
		out.push_str(name);

		for attr in decl.attributes().iter().filter(|a| a.is_required()) {
			out.push(' ');
			out.push_str(attr.name());
			out.push_str("=\"");
			let default = attr.default_value().unwrap_or_default();
			if flags.as_snippet {
				let stop = stops.next();
				if default.is_empty() {
					out.push_str(&format!("${stop}"));
				} else {
					out.push_str(&format!("${{{stop}:{}}}", escape_snippet(default)));
				}
			} else {
				out.push_str(default);
			}
			out.push('"');
		}

		let children = if depth < MAX_DEPTH && !decl.is_empty_content() {
			decl.required_children()
		} else {
			Vec::new()
		};

		if existing_value.is_none() && children.is_empty() && flags.self_closing {
			out.push_str("/>");
			return;
		}
		out.push('>');

		match existing_value {
			Some(value) if flags.as_snippet => out.push_str(&escape_snippet(value)),
			Some(value) => out.push_str(value),
			None if !children.is_empty() => {
				for child in &children {
					out.push_str(&self.line_delimiter);
					self.indent(out, level + 1);
					self.element(out, child.as_ref(), None, flags, stops, level + 1, depth + 1);
				}
				out.push_str(&self.line_delimiter);
				self.indent(out, level);
			}
			None => {
				if flags.as_snippet && !stops.final_placed {
					out.push_str("$0");
					stops.final_placed = true;
				}
			}
		}

		if flags.generate_end_tag {
			out.push_str("</");
			out.push_str(name);
			out.push('>');
		}
	}

	fn indent(&self, out: &mut String, level: usize) {
		for _ in 0..level {
			out.push_str(&self.indent_unit);
		}
	}
}

/// Escapes `$`, `}` and `\` for use inside snippet text.
fn escape_snippet(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	for c in text.chars() {
		if matches!(c, '$' | '}' | '\\') {
			out.push('\\');
		}
		out.push(c);
	}
	out
}

#[cfg(test)]
mod tests;
