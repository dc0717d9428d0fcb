//! Conversion between character offsets and LSP line/column positions.
//!
//! Offsets inside a [`Document`](crate::Document) are counted in Unicode scalar
//! values (ropey "chars"). Columns are counted in the unit negotiated with the
//! client, see [`OffsetEncoding`].

use lsp_types::{Position, Range};
use ropey::{Rope, RopeSlice};

/// Unit used for the `character` field of LSP positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OffsetEncoding {
	/// UTF-8 code units (bytes).
	Utf8,
	/// UTF-16 code units. This is the LSP default.
	#[default]
	Utf16,
	/// Unicode scalar values.
	Utf32,
}

impl OffsetEncoding {
	/// Returns the protocol name of the encoding (`"utf-8"`, `"utf-16"`, `"utf-32"`).
	pub const fn as_str(self) -> &'static str {
		match self {
			OffsetEncoding::Utf8 => "utf-8",
			OffsetEncoding::Utf16 => "utf-16",
			OffsetEncoding::Utf32 => "utf-32",
		}
	}

	fn units(self, c: char) -> usize {
		match self {
			OffsetEncoding::Utf8 => c.len_utf8(),
			OffsetEncoding::Utf16 => c.len_utf16(),
			OffsetEncoding::Utf32 => 1,
		}
	}
}

/// Converts a char index to an LSP position.
///
/// Returns `None` if `char_idx` is past the end of the text. The end of the
/// text itself (`char_idx == len_chars`) is a valid position.
pub fn char_to_lsp_position(text: &Rope, char_idx: usize, encoding: OffsetEncoding) -> Option<Position> {
	if char_idx > text.len_chars() {
		return None;
	}

	let line = text.char_to_line(char_idx);
	let line_start = text.line_to_char(line);
	let column = match encoding {
		OffsetEncoding::Utf8 => text.char_to_byte(char_idx) - text.char_to_byte(line_start),
		OffsetEncoding::Utf16 => text.char_to_utf16_cu(char_idx) - text.char_to_utf16_cu(line_start),
		OffsetEncoding::Utf32 => char_idx - line_start,
	};

	Some(Position::new(line as u32, column as u32))
}

/// Converts an LSP position to a char index.
///
/// Returns `None` if the line does not exist. A column past the end of its line
/// is clamped to the last addressable column of that line, which is the
/// offset of its terminating line break.
pub fn lsp_position_to_char(text: &Rope, position: Position, encoding: OffsetEncoding) -> Option<usize> {
	let line = position.line as usize;
	if line >= text.len_lines() {
		return None;
	}

	let line_start = text.line_to_char(line);
	let slice = text.line(line);
	let addressable = addressable_chars(slice);
	let target = position.character as usize;

	let mut units = 0usize;
	let mut chars = 0usize;
	for c in slice.chars().take(addressable) {
		if units >= target {
			break;
		}
		units += encoding.units(c);
		chars += 1;
	}

	Some(line_start + chars)
}

/// Converts a char range to an LSP range.
pub fn char_range_to_lsp_range(text: &Rope, start: usize, end: usize, encoding: OffsetEncoding) -> Option<Range> {
	let start = char_to_lsp_position(text, start, encoding)?;
	let end = char_to_lsp_position(text, end, encoding)?;
	Some(Range::new(start, end))
}

/// Converts an LSP range to a `(start, end)` char range.
pub fn lsp_range_to_char_range(text: &Rope, range: Range, encoding: OffsetEncoding) -> Option<(usize, usize)> {
	let start = lsp_position_to_char(text, range.start, encoding)?;
	let end = lsp_position_to_char(text, range.end, encoding)?;
	Some((start, end))
}

/// Number of chars in a line that a column may point at: everything except the
/// final char of a trailing line break.
fn addressable_chars(line: RopeSlice<'_>) -> usize {
	let len = line.len_chars();
	match line.chars_at(len).prev() {
		Some('\n' | '\r' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}') => len - 1,
		_ => len,
	}
}

#[cfg(test)]
mod tests;
