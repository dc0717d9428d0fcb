use proptest::prelude::*;

use super::*;

#[test]
fn test_utf16_round_trip() {
	let text = Rope::from("<root>\n  <a/>\n</root>\n");
	let encoding = OffsetEncoding::Utf16;

	let pos = Position::new(1, 3);
	let char_idx = lsp_position_to_char(&text, pos, encoding).unwrap();
	assert_eq!(char_idx, 10); // "<root>\n" = 7 chars, + 3
	assert_eq!(char_to_lsp_position(&text, char_idx, encoding).unwrap(), pos);
}

#[test]
fn test_utf16_counts_surrogate_pairs() {
	// U+1F600 is one char but two UTF-16 code units
	let text = Rope::from("<a>\u{1F600}x</a>");
	let encoding = OffsetEncoding::Utf16;

	assert_eq!(char_to_lsp_position(&text, 4, encoding).unwrap(), Position::new(0, 5));
	assert_eq!(lsp_position_to_char(&text, Position::new(0, 5), encoding), Some(4));
	assert_eq!(char_to_lsp_position(&text, 4, OffsetEncoding::Utf32).unwrap(), Position::new(0, 4));
	assert_eq!(char_to_lsp_position(&text, 4, OffsetEncoding::Utf8).unwrap(), Position::new(0, 7));
}

#[test]
fn test_end_of_text_is_addressable() {
	let text = Rope::from("<a/>\n");
	let end = text.len_chars();
	let pos = char_to_lsp_position(&text, end, OffsetEncoding::Utf16).unwrap();
	assert_eq!(pos, Position::new(1, 0));
	assert_eq!(lsp_position_to_char(&text, pos, OffsetEncoding::Utf16), Some(end));
}

#[test]
fn test_out_of_range_offsets_are_rejected() {
	let text = Rope::from("<a/>");
	assert_eq!(char_to_lsp_position(&text, 5, OffsetEncoding::Utf16), None);
	assert_eq!(lsp_position_to_char(&text, Position::new(3, 0), OffsetEncoding::Utf16), None);
}

#[test]
fn test_column_past_line_end_is_clamped() {
	let text = Rope::from("<a>\r\n</a>");
	// Clamped onto the '\n' of the CRLF pair, never into the next line.
	assert_eq!(lsp_position_to_char(&text, Position::new(0, 40), OffsetEncoding::Utf16), Some(4));
	assert_eq!(lsp_position_to_char(&text, Position::new(1, 40), OffsetEncoding::Utf16), Some(9));
}

#[test]
fn test_range_conversion() {
	let text = Rope::from("<root>\n<b></b>\n</root>");
	let range = char_range_to_lsp_range(&text, 7, 14, OffsetEncoding::Utf16).unwrap();
	assert_eq!(range, Range::new(Position::new(1, 0), Position::new(1, 7)));
	assert_eq!(lsp_range_to_char_range(&text, range, OffsetEncoding::Utf16), Some((7, 14)));
}

fn text_strategy() -> impl Strategy<Value = String> {
	prop::collection::vec(
		prop_oneof![
			Just("<".to_string()),
			Just(">".to_string()),
			Just("\n".to_string()),
			Just("\r\n".to_string()),
			Just("\r".to_string()),
			Just("\u{00E9}".to_string()),
			Just("\u{1F600}".to_string()),
			"[a-z ]{1,4}",
		],
		0..40,
	)
	.prop_map(|parts| parts.concat())
}

proptest! {
	#[test]
	fn prop_offset_position_round_trip(text in text_strategy()) {
		let rope = Rope::from(text.as_str());
		for encoding in [OffsetEncoding::Utf8, OffsetEncoding::Utf16, OffsetEncoding::Utf32] {
			for offset in 0..=rope.len_chars() {
				let pos = char_to_lsp_position(&rope, offset, encoding).unwrap();
				let back = lsp_position_to_char(&rope, pos, encoding).unwrap();
				prop_assert_eq!(back, offset);
				prop_assert_eq!(char_to_lsp_position(&rope, back, encoding).unwrap(), pos);
			}
		}
	}
}
