//! Parser for DTD markup declarations.
//!
//! Handles `<!ELEMENT>` and `<!ATTLIST>`; entity and notation declarations,
//! conditional sections, comments and PIs are skipped. A declaration that
//! cannot be parsed (typically one built from parameter entities) is skipped
//! and logged rather than failing the whole DTD.

use indexmap::IndexMap;
use tracing::debug;
use xmlls_dom::Url;

use super::{
	AttributeType, ContentParticle, ContentSpec, DefaultDecl, DtdAttribute, DtdElement, DtdSchema, Occurrence,
	ParticleKind,
};
use crate::{GrammarError, Result};

/// Parses the declarations of an external DTD or an internal subset.
pub fn parse_dtd(uri: &Url, text: &str) -> Result<DtdSchema> {
	let mut cursor = Cursor { text, pos: 0 };
	let mut elements: IndexMap<String, DtdElement> = IndexMap::new();
	let mut attlists: IndexMap<String, Vec<DtdAttribute>> = IndexMap::new();
	let mut last_comment: Option<String> = None;

	loop {
		cursor.skip_ws();
		if cursor.at_end() {
			break;
		}
		let start = cursor.pos;
		if cursor.eat("<!--") {
			let body = cursor.until("-->").ok_or_else(|| unterminated(uri, start, "comment"))?;
			let body = body.trim();
			last_comment = (!body.is_empty()).then(|| body.to_string());
			continue;
		}
		if cursor.eat("<?") {
			cursor.until("?>").ok_or_else(|| unterminated(uri, start, "processing instruction"))?;
			continue;
		}
		if cursor.eat("<![") {
			cursor.until("]]>").ok_or_else(|| unterminated(uri, start, "conditional section"))?;
			last_comment = None;
			continue;
		}
		if cursor.eat("<!ELEMENT") {
			match cursor.element_decl() {
				Some((name, content)) => {
					let documentation = last_comment.take();
					elements.entry(name.clone()).or_insert(DtdElement {
						name,
						content,
						attributes: Vec::new(),
						documentation,
					});
				}
				None => skip_declaration(uri, &mut cursor, start)?,
			}
			continue;
		}
		if cursor.eat("<!ATTLIST") {
			match cursor.attlist_decl() {
				Some((element, attributes)) => {
					let list = attlists.entry(element).or_default();
					for attribute in attributes {
						// The first declaration of an attribute is binding.
						if !list.iter().any(|a| a.name == attribute.name) {
							list.push(attribute);
						}
					}
				}
				None => skip_declaration(uri, &mut cursor, start)?,
			}
			last_comment = None;
			continue;
		}
		if cursor.peek_str("<!") {
			cursor.pos += 2;
			cursor.skip_markup().ok_or_else(|| unterminated(uri, start, "declaration"))?;
			last_comment = None;
			continue;
		}
		if cursor.eat("%") {
			// Parameter entity reference between declarations.
			cursor.until(";").ok_or_else(|| unterminated(uri, start, "parameter entity reference"))?;
			continue;
		}
		return Err(GrammarError::Parse {
			uri: uri.clone(),
			message: format!("unexpected content at offset {start}"),
		});
	}

	for (element, attributes) in attlists {
		if let Some(decl) = elements.get_mut(&element) {
			decl.attributes = attributes;
		}
	}
	Ok(DtdSchema { elements })
}

fn unterminated(uri: &Url, offset: usize, what: &str) -> GrammarError {
	GrammarError::Parse {
		uri: uri.clone(),
		message: format!("unterminated {what} at offset {offset}"),
	}
}

fn skip_declaration(uri: &Url, cursor: &mut Cursor<'_>, start: usize) -> Result<()> {
	debug!(uri = %uri, offset = start, "skipping unparsable DTD declaration");
	cursor.pos = start + 2;
	cursor.skip_markup().ok_or_else(|| unterminated(uri, start, "declaration"))
}

struct Cursor<'a> {
	text: &'a str,
	pos: usize,
}

impl<'a> Cursor<'a> {
	fn rest(&self) -> &'a str {
		&self.text[self.pos..]
	}

	fn at_end(&self) -> bool {
		self.pos >= self.text.len()
	}

	fn peek(&self) -> Option<char> {
		self.rest().chars().next()
	}

	fn peek_str(&self, s: &str) -> bool {
		self.rest().starts_with(s)
	}

	fn eat(&mut self, s: &str) -> bool {
		if self.peek_str(s) {
			self.pos += s.len();
			true
		} else {
			false
		}
	}

	fn eat_char(&mut self, c: char) -> bool {
		if self.peek() == Some(c) {
			self.pos += c.len_utf8();
			true
		} else {
			false
		}
	}

	fn skip_ws(&mut self) -> bool {
		let before = self.pos;
		while let Some(c) = self.peek() {
			if !matches!(c, ' ' | '\t' | '\r' | '\n') {
				break;
			}
			self.pos += 1;
		}
		self.pos > before
	}

	/// Consumes up to and including `end`, returning the text before it.
	fn until(&mut self, end: &str) -> Option<&'a str> {
		let rest = self.rest();
		let idx = rest.find(end)?;
		self.pos += idx + end.len();
		Some(&rest[..idx])
	}

	/// Skips to the `>` ending the current declaration, honouring quotes.
	fn skip_markup(&mut self) -> Option<()> {
		let mut quote: Option<char> = None;
		while let Some(c) = self.peek() {
			self.pos += c.len_utf8();
			match (quote, c) {
				(Some(q), c) if c == q => quote = None,
				(Some(_), _) => {}
				(None, '"' | '\'') => quote = Some(c),
				(None, '>') => return Some(()),
				_ => {}
			}
		}
		None
	}

	fn name(&mut self) -> Option<String> {
		let rest = self.rest();
		let len = rest
			.find(|c: char| c.is_whitespace() || "()|,?*+>\"'%;[]".contains(c))
			.unwrap_or(rest.len());
		if len == 0 {
			return None;
		}
		self.pos += len;
		Some(rest[..len].to_string())
	}

	fn quoted(&mut self) -> Option<String> {
		let quote = self.peek().filter(|c| *c == '"' || *c == '\'')?;
		self.pos += 1;
		let rest = self.rest();
		let idx = rest.find(quote)?;
		self.pos += idx + 1;
		Some(rest[..idx].to_string())
	}

	fn element_decl(&mut self) -> Option<(String, ContentSpec)> {
		if !self.skip_ws() {
			return None;
		}
		let name = self.name()?;
		if !self.skip_ws() {
			return None;
		}
		let content = if self.eat("EMPTY") {
			ContentSpec::Empty
		} else if self.eat("ANY") {
			ContentSpec::Any
		} else if self.eat_char('(') {
			self.skip_ws();
			if self.eat("#PCDATA") {
				self.mixed()?
			} else {
				let particle = self.group_rest()?;
				ContentSpec::Children(particle)
			}
		} else {
			return None;
		};
		self.skip_ws();
		self.eat_char('>').then_some((name, content))
	}

	/// After `(#PCDATA`.
	fn mixed(&mut self) -> Option<ContentSpec> {
		let mut names = Vec::new();
		loop {
			self.skip_ws();
			if self.eat_char(')') {
				self.eat_char('*');
				return Some(ContentSpec::Mixed(names));
			}
			if !self.eat_char('|') {
				return None;
			}
			self.skip_ws();
			names.push(self.name()?);
		}
	}

	/// After an opening `(` of a children group.
	fn group_rest(&mut self) -> Option<ContentParticle> {
		let mut members = vec![self.particle()?];
		let mut separator: Option<char> = None;
		loop {
			self.skip_ws();
			if self.eat_char(')') {
				break;
			}
			let sep = self.peek().filter(|c| *c == ',' || *c == '|')?;
			if separator.is_some_and(|s| s != sep) {
				return None;
			}
			separator = Some(sep);
			self.pos += 1;
			members.push(self.particle()?);
		}
		let occurrence = self.occurrence();
		let kind = match separator {
			Some('|') => ParticleKind::Choice(members),
			_ => ParticleKind::Seq(members),
		};
		Some(ContentParticle { kind, occurrence })
	}

	fn particle(&mut self) -> Option<ContentParticle> {
		self.skip_ws();
		if self.eat_char('(') {
			return self.group_rest();
		}
		let name = self.name()?;
		let occurrence = self.occurrence();
		Some(ContentParticle {
			kind: ParticleKind::Name(name),
			occurrence,
		})
	}

	fn occurrence(&mut self) -> Occurrence {
		if self.eat_char('?') {
			Occurrence::Optional
		} else if self.eat_char('*') {
			Occurrence::ZeroOrMore
		} else if self.eat_char('+') {
			Occurrence::OneOrMore
		} else {
			Occurrence::Once
		}
	}

	fn attlist_decl(&mut self) -> Option<(String, Vec<DtdAttribute>)> {
		if !self.skip_ws() {
			return None;
		}
		let element = self.name()?;
		let mut attributes = Vec::new();
		loop {
			self.skip_ws();
			if self.eat_char('>') {
				return Some((element, attributes));
			}
			let name = self.name()?;
			if !self.skip_ws() {
				return None;
			}
			let attr_type = self.attribute_type()?;
			if !self.skip_ws() {
				return None;
			}
			let default = self.default_decl()?;
			attributes.push(DtdAttribute {
				name,
				attr_type,
				default,
			});
		}
	}

	fn attribute_type(&mut self) -> Option<AttributeType> {
		if self.eat_char('(') {
			return Some(AttributeType::Enumeration(self.enumeration()?));
		}
		let keyword = self.name()?;
		Some(match keyword.as_str() {
			"CDATA" => AttributeType::CData,
			"ID" => AttributeType::Id,
			"IDREF" => AttributeType::IdRef,
			"IDREFS" => AttributeType::IdRefs,
			"ENTITY" => AttributeType::Entity,
			"ENTITIES" => AttributeType::Entities,
			"NMTOKEN" => AttributeType::NmToken,
			"NMTOKENS" => AttributeType::NmTokens,
			"NOTATION" => {
				self.skip_ws();
				if !self.eat_char('(') {
					return None;
				}
				AttributeType::Notation(self.enumeration()?)
			}
			_ => return None,
		})
	}

	/// After `(` of an enumeration.
	fn enumeration(&mut self) -> Option<Vec<String>> {
		let mut values = Vec::new();
		loop {
			self.skip_ws();
			values.push(self.name()?);
			self.skip_ws();
			if self.eat_char(')') {
				return Some(values);
			}
			if !self.eat_char('|') {
				return None;
			}
		}
	}

	fn default_decl(&mut self) -> Option<DefaultDecl> {
		if self.eat("#REQUIRED") {
			Some(DefaultDecl::Required)
		} else if self.eat("#IMPLIED") {
			Some(DefaultDecl::Implied)
		} else if self.eat("#FIXED") {
			self.skip_ws();
			Some(DefaultDecl::Fixed(self.quoted()?))
		} else {
			Some(DefaultDecl::Value(self.quoted()?))
		}
	}
}
