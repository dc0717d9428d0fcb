//! Diagnostic codes produced by the validator.

use std::str::FromStr;

use lsp_types::{Diagnostic, NumberOrString};

/// Closed set of diagnostic codes, rendered in kebab-case on the wire.
#[derive(
	Debug,
	Clone,
	Copy,
	PartialEq,
	Eq,
	Hash,
	strum_macros::Display,
	strum_macros::EnumString,
	strum_macros::IntoStaticStr,
	strum_macros::EnumIter,
)]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorCode {
	/// Content is incomplete and one of several alternatives is expected.
	RequiredElementsMissing,
	/// Content is incomplete and exactly one element is expected.
	RequiredElementMissing,
	/// Content is incomplete but no element alternative can be named.
	IncompleteContent,
	/// A child element is not allowed at its position.
	ElementNotAllowed,
	/// The document element has no declaration.
	ElementUndeclared,
	/// A required attribute is absent.
	RequiredAttributeMissing,
	/// An attribute is not declared for its element.
	AttributeNotAllowed,
	/// An attribute value is outside its enumeration.
	AttributeValueInvalid,
	/// No grammar is bound to the document.
	NoGrammar,
	/// The tokenizer rejected the document.
	XmlSyntaxError,
}

impl ErrorCode {
	/// Wire form of the code.
	pub fn as_str(self) -> &'static str {
		self.into()
	}

	/// Parses the code of a diagnostic, `None` for foreign or numeric codes.
	pub fn from_diagnostic(diagnostic: &Diagnostic) -> Option<Self> {
		match diagnostic.code.as_ref()? {
			NumberOrString::String(code) => Self::from_str(code).ok(),
			NumberOrString::Number(_) => None,
		}
	}
}

impl From<ErrorCode> for NumberOrString {
	fn from(code: ErrorCode) -> Self {
		NumberOrString::String(code.as_str().to_string())
	}
}

#[cfg(test)]
mod tests {
	use strum::IntoEnumIterator;

	use super::*;

	#[test]
	fn test_codes_are_kebab_case() {
		assert_eq!(ErrorCode::RequiredElementsMissing.as_str(), "required-elements-missing");
		assert_eq!(ErrorCode::XmlSyntaxError.to_string(), "xml-syntax-error");
		for code in ErrorCode::iter() {
			assert_eq!(code.as_str().parse::<ErrorCode>(), Ok(code));
		}
	}

	#[test]
	fn test_from_diagnostic() {
		let mut diagnostic = Diagnostic {
			code: Some(ErrorCode::NoGrammar.into()),
			..Default::default()
		};
		assert_eq!(ErrorCode::from_diagnostic(&diagnostic), Some(ErrorCode::NoGrammar));
		diagnostic.code = Some(NumberOrString::Number(3));
		assert_eq!(ErrorCode::from_diagnostic(&diagnostic), None);
		diagnostic.code = Some(NumberOrString::String("other".into()));
		assert_eq!(ErrorCode::from_diagnostic(&diagnostic), None);
	}
}
