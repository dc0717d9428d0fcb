//! Simplified RELAX NG pattern arena.

use rustc_hash::FxHashSet;

/// Index of a pattern inside a [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatternId(pub(crate) u32);

impl PatternId {
	fn index(self) -> usize {
		self.0 as usize
	}
}

/// Index of a named `define`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DefineId(pub(crate) u32);

/// Name class of an element or attribute pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameClass {
	/// A single name.
	Name {
		/// Namespace URI, empty for none.
		namespace: String,
		/// Local name.
		local: String,
	},
	/// Any name, with optional exceptions.
	AnyName {
		/// Names excluded from the class.
		except: Option<Box<NameClass>>,
	},
	/// Any name in one namespace, with optional exceptions.
	NsName {
		/// Namespace URI, empty for none.
		namespace: String,
		/// Names excluded from the class.
		except: Option<Box<NameClass>>,
	},
	/// Union of two classes.
	Choice(Box<NameClass>, Box<NameClass>),
}

impl NameClass {
	/// Whether `{namespace}local` belongs to the class.
	pub fn matches(&self, namespace: &str, local: &str) -> bool {
		match self {
			NameClass::Name { namespace: ns, local: name } => ns == namespace && name == local,
			NameClass::AnyName { except } => !except.as_ref().is_some_and(|e| e.matches(namespace, local)),
			NameClass::NsName { namespace: ns, except } => {
				ns == namespace && !except.as_ref().is_some_and(|e| e.matches(namespace, local))
			}
			NameClass::Choice(a, b) => a.matches(namespace, local) || b.matches(namespace, local),
		}
	}

	/// `(namespace, local)` if the class names exactly one name.
	pub fn simple_name(&self) -> Option<(&str, &str)> {
		match self {
			NameClass::Name { namespace, local } => Some((namespace, local)),
			_ => None,
		}
	}
}

/// A pattern node.
///
/// `optional`, `zeroOrMore` and `mixed` are desugared by the compiler into
/// choices, one-or-more and interleave.
#[derive(Debug, Clone)]
pub enum Pattern {
	/// Matches nothing but the empty sequence.
	Empty,
	/// Any character data.
	Text,
	/// Matches nothing.
	NotAllowed,
	/// Typed character data.
	Data {
		/// Datatype local name.
		datatype: String,
	},
	/// A fixed value.
	Value {
		/// The literal.
		value: String,
	},
	/// Whitespace-separated list.
	List(PatternId),
	/// An element.
	Element {
		/// Element name class.
		name: NameClass,
		/// Content model.
		content: PatternId,
		/// `a:documentation` text.
		documentation: Option<String>,
	},
	/// An attribute.
	Attribute {
		/// Attribute name class.
		name: NameClass,
		/// Value pattern.
		value: PatternId,
		/// `a:documentation` text.
		documentation: Option<String>,
		/// `a:defaultValue` annotation.
		default_value: Option<String>,
	},
	/// One of the alternatives.
	Choice(Vec<PatternId>),
	/// All members in order.
	Group(Vec<PatternId>),
	/// All members in any order.
	Interleave(Vec<PatternId>),
	/// One or more repetitions.
	OneOrMore(PatternId),
	/// Reference to a named define.
	Ref(DefineId),
}

#[derive(Debug, Clone)]
pub(crate) struct Define {
	pub(crate) name: String,
	pub(crate) body: Option<PatternId>,
}

/// A compiled schema: a pattern arena with named defines and a start pattern.
#[derive(Debug, Clone)]
pub struct Schema {
	pub(crate) patterns: Vec<Pattern>,
	pub(crate) defines: Vec<Define>,
	pub(crate) start: PatternId,
}

impl Schema {
	/// The start pattern.
	pub fn start(&self) -> PatternId {
		self.start
	}

	/// Pattern by id.
	pub fn pattern(&self, id: PatternId) -> &Pattern {
		&self.patterns[id.index()]
	}

	/// Body of a define, `None` if it was referenced but never defined.
	pub fn define_body(&self, id: DefineId) -> Option<PatternId> {
		self.defines.get(id.0 as usize)?.body
	}

	/// Name of a define.
	pub fn define_name(&self, id: DefineId) -> Option<&str> {
		self.defines.get(id.0 as usize).map(|d| d.name.as_str())
	}

	/// Number of patterns in the arena.
	pub fn len(&self) -> usize {
		self.patterns.len()
	}

	/// Whether the arena is empty.
	pub fn is_empty(&self) -> bool {
		self.patterns.is_empty()
	}

	/// Follows references until a non-`Ref` pattern.
	pub(crate) fn resolve_ref(&self, mut id: PatternId) -> Option<PatternId> {
		let mut hops = 0;
		while let Pattern::Ref(define) = self.pattern(id) {
			id = self.define_body(*define)?;
			hops += 1;
			if hops > self.defines.len() {
				return None;
			}
		}
		Some(id)
	}

	/// Element patterns reachable from `id` without entering another element.
	pub(crate) fn element_patterns(&self, id: PatternId) -> Vec<PatternId> {
		let mut out = Vec::new();
		let mut seen = FxHashSet::default();
		self.collect_elements(id, &mut seen, &mut out);
		out
	}

	fn collect_elements(&self, id: PatternId, seen: &mut FxHashSet<PatternId>, out: &mut Vec<PatternId>) {
		if !seen.insert(id) {
			return;
		}
		match self.pattern(id) {
			Pattern::Element { .. } => out.push(id),
			Pattern::Choice(members) | Pattern::Group(members) | Pattern::Interleave(members) => {
				for member in members {
					self.collect_elements(*member, seen, out);
				}
			}
			Pattern::OneOrMore(inner) => self.collect_elements(*inner, seen, out),
			Pattern::Ref(define) => {
				if let Some(body) = self.define_body(*define) {
					self.collect_elements(body, seen, out);
				}
			}
			_ => {}
		}
	}

	/// Attribute patterns reachable from `id` without entering an element,
	/// paired with whether the attribute is required.
	///
	/// An attribute is required when it is reached without passing through a
	/// choice. Attributes inside a one-or-more keep their requiredness.
	pub(crate) fn attribute_patterns(&self, id: PatternId) -> Vec<(PatternId, bool)> {
		let mut out: Vec<(PatternId, bool)> = Vec::new();
		let mut seen = FxHashSet::default();
		self.collect_attributes(id, true, &mut seen, &mut out);
		out
	}

	fn collect_attributes(
		&self,
		id: PatternId,
		required: bool,
		seen: &mut FxHashSet<(PatternId, bool)>,
		out: &mut Vec<(PatternId, bool)>,
	) {
		if !seen.insert((id, required)) {
			return;
		}
		match self.pattern(id) {
			Pattern::Attribute { .. } => match out.iter_mut().find(|(attr, _)| *attr == id) {
				Some(entry) => entry.1 |= required,
				None => out.push((id, required)),
			},
			Pattern::Group(members) | Pattern::Interleave(members) => {
				for member in members {
					self.collect_attributes(*member, required, seen, out);
				}
			}
			Pattern::Choice(members) => {
				for member in members {
					self.collect_attributes(*member, false, seen, out);
				}
			}
			Pattern::OneOrMore(inner) => self.collect_attributes(*inner, required, seen, out),
			Pattern::Ref(define) => {
				if let Some(body) = self.define_body(*define) {
					self.collect_attributes(body, required, seen, out);
				}
			}
			_ => {}
		}
	}

	/// Element patterns that every match of `id` must contain, in order.
	pub(crate) fn required_element_patterns(&self, id: PatternId) -> Vec<PatternId> {
		let mut out = Vec::new();
		let mut seen = FxHashSet::default();
		self.collect_required(id, &mut seen, &mut out);
		out
	}

	fn collect_required(&self, id: PatternId, seen: &mut FxHashSet<PatternId>, out: &mut Vec<PatternId>) {
		if !seen.insert(id) {
			return;
		}
		match self.pattern(id) {
			Pattern::Element { .. } => out.push(id),
			Pattern::Group(members) | Pattern::Interleave(members) => {
				for member in members {
					self.collect_required(*member, seen, out);
				}
			}
			Pattern::OneOrMore(inner) => self.collect_required(*inner, seen, out),
			Pattern::Ref(define) => {
				if let Some(body) = self.define_body(*define) {
					self.collect_required(body, seen, out);
				}
			}
			_ => {}
		}
	}

	/// Literal values of a value pattern, empty if it is not a pure choice of values.
	pub(crate) fn enumerated_values(&self, id: PatternId) -> Vec<String> {
		let mut out = Vec::new();
		if self.collect_values(id, &mut out, 0) { out } else { Vec::new() }
	}

	fn collect_values(&self, id: PatternId, out: &mut Vec<String>, depth: usize) -> bool {
		if depth > self.defines.len() + 1 {
			return false;
		}
		match self.pattern(id) {
			Pattern::Value { value } => {
				out.push(value.clone());
				true
			}
			Pattern::Choice(members) => members.iter().all(|m| self.collect_values(*m, out, depth)),
			Pattern::Ref(define) => self
				.define_body(*define)
				.is_some_and(|body| self.collect_values(body, out, depth + 1)),
			_ => false,
		}
	}

	/// Whether an attribute pattern with a non-simple name class is reachable.
	pub(crate) fn has_wildcard_attribute(&self, id: PatternId) -> bool {
		self.attribute_patterns(id).iter().any(|(attr, _)| {
			matches!(self.pattern(*attr), Pattern::Attribute { name, .. } if name.simple_name().is_none())
		})
	}
}
