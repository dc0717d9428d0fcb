//! Compiler from RELAX NG XML syntax to a [`Schema`].

use rustc_hash::FxHashMap;
use tracing::warn;
use xmlls_dom::{Document, ElementRef, Url};

use super::pattern::{Define, DefineId, NameClass, Pattern, PatternId, Schema};
use super::{ANNOTATIONS_NAMESPACE, RELAXNG_NAMESPACE};
use crate::{GrammarError, Result};

/// Compiles RELAX NG XML syntax.
///
/// `include` is skipped with a warning. `externalRef` and nested `grammar`
/// patterns are rejected.
pub fn parse_relaxng(uri: &Url, text: &str) -> Result<Schema> {
	let document = Document::parse(uri.clone(), 0, text);
	if let Some(error) = document.errors().first() {
		return Err(GrammarError::Parse {
			uri: uri.clone(),
			message: format!("malformed XML at offset {}: {}", error.offset, error.message),
		});
	}
	let root = document.root_element().ok_or_else(|| GrammarError::Parse {
		uri: uri.clone(),
		message: "no document element".into(),
	})?;

	let mut compiler = Compiler {
		uri,
		patterns: Vec::new(),
		defines: Vec::new(),
		define_index: FxHashMap::default(),
		start: None,
	};
	let ns = root.attribute_value("ns").unwrap_or_default().to_string();
	let start = if is_rng(&root, "grammar") {
		compiler.grammar_content(&root, &ns)?;
		compiler.start.take().ok_or_else(|| compiler.error("grammar has no start"))?
	} else {
		compiler.pattern(&root, &ns)?
	};

	if let Some(missing) = compiler.defines.iter().find(|d| d.body.is_none()) {
		return Err(GrammarError::UndefinedReference {
			uri: uri.clone(),
			name: missing.name.clone(),
		});
	}

	Ok(Schema {
		patterns: compiler.patterns,
		defines: compiler.defines,
		start,
	})
}

fn is_rng(element: &ElementRef<'_>, local: &str) -> bool {
	element.namespace_uri() == Some(RELAXNG_NAMESPACE) && element.local_name() == local
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combine {
	Choice,
	Interleave,
}

struct Compiler<'u> {
	uri: &'u Url,
	patterns: Vec<Pattern>,
	defines: Vec<Define>,
	define_index: FxHashMap<String, DefineId>,
	start: Option<PatternId>,
}

impl Compiler<'_> {
	fn error(&self, message: impl Into<String>) -> GrammarError {
		GrammarError::Parse {
			uri: self.uri.clone(),
			message: message.into(),
		}
	}

	fn push(&mut self, pattern: Pattern) -> PatternId {
		let id = PatternId(self.patterns.len() as u32);
		self.patterns.push(pattern);
		id
	}

	fn define(&mut self, name: &str) -> DefineId {
		if let Some(id) = self.define_index.get(name) {
			return *id;
		}
		let id = DefineId(self.defines.len() as u32);
		self.defines.push(Define {
			name: name.to_string(),
			body: None,
		});
		self.define_index.insert(name.to_string(), id);
		id
	}

	/// Merges a body into a slot, honouring `combine`.
	fn combine(&mut self, existing: Option<PatternId>, body: PatternId, combine: Option<Combine>) -> PatternId {
		match (existing, combine) {
			(None, _) => body,
			(Some(prev), Some(Combine::Interleave)) => self.push(Pattern::Interleave(vec![prev, body])),
			(Some(prev), _) => self.push(Pattern::Choice(vec![prev, body])),
		}
	}

	fn combine_attr(&self, element: &ElementRef<'_>) -> Result<Option<Combine>> {
		match element.attribute_value("combine").map(str::trim) {
			None => Ok(None),
			Some("choice") => Ok(Some(Combine::Choice)),
			Some("interleave") => Ok(Some(Combine::Interleave)),
			Some(other) => Err(self.error(format!("invalid combine value '{other}'"))),
		}
	}

	/// Processes the children of `grammar` or `div`.
	fn grammar_content(&mut self, grammar: &ElementRef<'_>, ns: &str) -> Result<()> {
		for child in rng_children(grammar) {
			let ns = inherited_ns(&child, ns);
			match child.local_name() {
				"start" => {
					let body = self.group_of(&child, &ns)?;
					let combine = self.combine_attr(&child)?;
					let merged = self.combine(self.start, body, combine);
					self.start = Some(merged);
				}
				"define" => {
					let name = required_attr(self, &child, "name")?;
					let body = self.group_of(&child, &ns)?;
					let combine = self.combine_attr(&child)?;
					let id = self.define(&name);
					let existing = self.defines[id.0 as usize].body;
					let merged = self.combine(existing, body, combine);
					self.defines[id.0 as usize].body = Some(merged);
				}
				"div" => self.grammar_content(&child, &ns)?,
				"include" => {
					warn!(uri = %self.uri, href = ?child.attribute_value("href"), "RELAX NG include is not supported; skipped");
				}
				other => return Err(self.error(format!("unexpected '{other}' in grammar"))),
			}
		}
		Ok(())
	}

	/// Compiles the pattern children of `parent` as one group.
	fn group_of(&mut self, parent: &ElementRef<'_>, ns: &str) -> Result<PatternId> {
		let mut members = Vec::new();
		for child in rng_children(parent) {
			let ns = inherited_ns(&child, ns);
			members.push(self.pattern(&child, &ns)?);
		}
		Ok(self.group(members))
	}

	fn group(&mut self, mut members: Vec<PatternId>) -> PatternId {
		match members.len() {
			0 => self.push(Pattern::Empty),
			1 => members.remove(0),
			_ => self.push(Pattern::Group(members)),
		}
	}

	fn members_of(&mut self, parent: &ElementRef<'_>, ns: &str) -> Result<Vec<PatternId>> {
		let mut members = Vec::new();
		for child in rng_children(parent) {
			let ns = inherited_ns(&child, ns);
			members.push(self.pattern(&child, &ns)?);
		}
		Ok(members)
	}

	fn pattern(&mut self, element: &ElementRef<'_>, ns: &str) -> Result<PatternId> {
		if element.namespace_uri() != Some(RELAXNG_NAMESPACE) {
			return Err(self.error(format!("'{}' is not a RELAX NG pattern", element.tag_name())));
		}
		let pattern = match element.local_name() {
			"element" => return self.element(element, ns),
			"attribute" => return self.attribute(element, ns),
			"empty" => Pattern::Empty,
			"text" => Pattern::Text,
			"notAllowed" => Pattern::NotAllowed,
			"data" => Pattern::Data {
				datatype: element.attribute_value("type").unwrap_or("string").trim().to_string(),
			},
			"value" => Pattern::Value {
				value: element.text_content(),
			},
			"list" => Pattern::List(self.group_of(element, ns)?),
			"group" => {
				let members = self.members_of(element, ns)?;
				return Ok(self.group(members));
			}
			"interleave" => Pattern::Interleave(self.members_of(element, ns)?),
			"choice" => Pattern::Choice(self.members_of(element, ns)?),
			"optional" => {
				let body = self.group_of(element, ns)?;
				let empty = self.push(Pattern::Empty);
				Pattern::Choice(vec![body, empty])
			}
			"zeroOrMore" => {
				let body = self.group_of(element, ns)?;
				let repeated = self.push(Pattern::OneOrMore(body));
				let empty = self.push(Pattern::Empty);
				Pattern::Choice(vec![repeated, empty])
			}
			"oneOrMore" => Pattern::OneOrMore(self.group_of(element, ns)?),
			"mixed" => {
				let body = self.group_of(element, ns)?;
				let text = self.push(Pattern::Text);
				Pattern::Interleave(vec![body, text])
			}
			"ref" | "parentRef" => {
				let name = required_attr(self, element, "name")?;
				Pattern::Ref(self.define(&name))
			}
			"externalRef" => return Err(self.error("externalRef is not supported")),
			"grammar" => return Err(self.error("nested grammar is not supported")),
			other => return Err(self.error(format!("unknown pattern '{other}'"))),
		};
		Ok(self.push(pattern))
	}

	fn element(&mut self, element: &ElementRef<'_>, ns: &str) -> Result<PatternId> {
		let (name, content_children) = match element.attribute_value("name") {
			Some(qname) => (self.resolve_qname(element, qname, ns, true)?, rng_children(element)),
			None => {
				let mut children = rng_children(element);
				if children.is_empty() {
					return Err(self.error("element without a name"));
				}
				let first = children.remove(0);
				let class_ns = inherited_ns(&first, ns);
				(self.name_class(&first, &class_ns)?, children)
			}
		};
		let mut members = Vec::new();
		for child in content_children {
			let ns = inherited_ns(&child, ns);
			members.push(self.pattern(&child, &ns)?);
		}
		let content = self.group(members);
		Ok(self.push(Pattern::Element {
			name,
			content,
			documentation: documentation(element),
		}))
	}

	fn attribute(&mut self, element: &ElementRef<'_>, ns: &str) -> Result<PatternId> {
		// Unprefixed attribute names are in no namespace unless `ns` is on the attribute itself.
		let own_ns = element.attribute_value("ns").unwrap_or_default();
		let (name, value_children) = match element.attribute_value("name") {
			Some(qname) => (self.resolve_qname(element, qname, own_ns, false)?, rng_children(element)),
			None => {
				let mut children = rng_children(element);
				if children.is_empty() {
					return Err(self.error("attribute without a name"));
				}
				let first = children.remove(0);
				let class_ns = inherited_ns(&first, ns);
				(self.name_class(&first, &class_ns)?, children)
			}
		};
		let value = if value_children.is_empty() {
			self.push(Pattern::Text)
		} else {
			let mut members = Vec::new();
			for child in value_children {
				let ns = inherited_ns(&child, ns);
				members.push(self.pattern(&child, &ns)?);
			}
			self.group(members)
		};
		let default_value = element
			.element()
			.attributes()
			.values()
			.find(|attr| {
				attr.local_name() == "defaultValue"
					&& element.lookup_namespace(attr.prefix()).as_deref() == Some(ANNOTATIONS_NAMESPACE)
			})
			.and_then(|attr| attr.value())
			.map(str::to_string);
		Ok(self.push(Pattern::Attribute {
			name,
			value,
			documentation: documentation(element),
			default_value,
		}))
	}

	fn name_class(&mut self, element: &ElementRef<'_>, ns: &str) -> Result<NameClass> {
		match element.local_name() {
			"name" => {
				let qname = element.text_content();
				self.resolve_qname(element, qname.trim(), ns, true)
			}
			"anyName" => Ok(NameClass::AnyName {
				except: self.except(element, ns)?,
			}),
			"nsName" => Ok(NameClass::NsName {
				namespace: ns.to_string(),
				except: self.except(element, ns)?,
			}),
			"choice" => {
				let mut classes = Vec::new();
				for child in rng_children(element) {
					let ns = inherited_ns(&child, ns);
					classes.push(self.name_class(&child, &ns)?);
				}
				classes
					.into_iter()
					.reduce(|a, b| NameClass::Choice(Box::new(a), Box::new(b)))
					.ok_or_else(|| self.error("empty name class choice"))
			}
			other => Err(self.error(format!("unknown name class '{other}'"))),
		}
	}

	fn except(&mut self, element: &ElementRef<'_>, ns: &str) -> Result<Option<Box<NameClass>>> {
		let Some(except) = rng_children(element).into_iter().find(|c| c.local_name() == "except") else {
			return Ok(None);
		};
		let mut classes = Vec::new();
		for child in rng_children(&except) {
			let ns = inherited_ns(&child, ns);
			classes.push(self.name_class(&child, &ns)?);
		}
		Ok(classes
			.into_iter()
			.reduce(|a, b| NameClass::Choice(Box::new(a), Box::new(b)))
			.map(Box::new))
	}

	/// Resolves `prefix:local` against the RELAX NG element's namespace bindings.
	fn resolve_qname(&self, context: &ElementRef<'_>, qname: &str, ns: &str, use_ns: bool) -> Result<NameClass> {
		let qname = qname.trim();
		match qname.split_once(':') {
			Some((prefix, local)) => {
				let namespace = context
					.lookup_namespace(Some(prefix))
					.ok_or_else(|| self.error(format!("unbound prefix '{prefix}' in '{qname}'")))?;
				Ok(NameClass::Name {
					namespace,
					local: local.to_string(),
				})
			}
			None => Ok(NameClass::Name {
				namespace: if use_ns { ns.to_string() } else { String::new() },
				local: qname.to_string(),
			}),
		}
	}
}

/// RELAX NG child elements, skipping annotations in foreign namespaces.
fn rng_children<'a>(element: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
	element
		.child_elements()
		.filter(|child| child.namespace_uri() == Some(RELAXNG_NAMESPACE))
		.collect()
}

fn inherited_ns(element: &ElementRef<'_>, ns: &str) -> String {
	element.attribute_value("ns").unwrap_or(ns).to_string()
}

fn required_attr(compiler: &Compiler<'_>, element: &ElementRef<'_>, name: &str) -> Result<String> {
	element
		.attribute_value(name)
		.map(|v| v.trim().to_string())
		.ok_or_else(|| compiler.error(format!("<{}> requires a '{name}' attribute", element.local_name())))
}

/// Joined `a:documentation` children.
fn documentation(element: &ElementRef<'_>) -> Option<String> {
	let parts: Vec<String> = element
		.child_elements()
		.filter(|child| child.namespace_uri() == Some(ANNOTATIONS_NAMESPACE) && child.local_name() == "documentation")
		.map(|child| child.text_content().trim().to_string())
		.filter(|text| !text.is_empty())
		.collect();
	(!parts.is_empty()).then(|| parts.join("\n\n"))
}
