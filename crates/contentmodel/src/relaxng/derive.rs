//! Brzozowski derivatives of element content over child element names.
//!
//! Only child elements are consumed. Attributes, text, data and values are
//! treated as empty, so a content model is matched against the sequence of
//! child element names alone.

use std::rc::Rc;

use super::pattern::{Pattern, PatternId, Schema};

/// Recursion limit for derivative computations on pathological grammars.
const MAX_DEPTH: usize = 512;

/// A residual content expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Expr {
	Empty,
	NotAllowed,
	/// An arena pattern not yet expanded.
	Pattern(PatternId),
	Choice(Rc<Expr>, Rc<Expr>),
	Group(Rc<Expr>, Rc<Expr>),
	Interleave(Rc<Expr>, Rc<Expr>),
	OneOrMore(Rc<Expr>),
}

fn choice(a: Expr, b: Expr) -> Expr {
	match (a, b) {
		(Expr::NotAllowed, x) | (x, Expr::NotAllowed) => x,
		(a, b) if a == b => a,
		(a, b) => Expr::Choice(Rc::new(a), Rc::new(b)),
	}
}

fn group(a: Expr, b: Expr) -> Expr {
	match (a, b) {
		(Expr::NotAllowed, _) | (_, Expr::NotAllowed) => Expr::NotAllowed,
		(Expr::Empty, x) | (x, Expr::Empty) => x,
		(a, b) => Expr::Group(Rc::new(a), Rc::new(b)),
	}
}

fn interleave(a: Expr, b: Expr) -> Expr {
	match (a, b) {
		(Expr::NotAllowed, _) | (_, Expr::NotAllowed) => Expr::NotAllowed,
		(Expr::Empty, x) | (x, Expr::Empty) => x,
		(a, b) => Expr::Interleave(Rc::new(a), Rc::new(b)),
	}
}

fn one_or_more(p: Expr) -> Expr {
	match p {
		Expr::NotAllowed => Expr::NotAllowed,
		Expr::Empty => Expr::Empty,
		p => Expr::OneOrMore(Rc::new(p)),
	}
}

/// Derivative engine bound to one schema.
pub(crate) struct Deriver<'s> {
	schema: &'s Schema,
}

impl<'s> Deriver<'s> {
	pub(crate) fn new(schema: &'s Schema) -> Self {
		Self { schema }
	}

	/// Expands one arena pattern into a residual expression.
	fn expand(&self, id: PatternId) -> Expr {
		match self.schema.pattern(id) {
			Pattern::Element { .. } => Expr::Pattern(id),
			Pattern::Empty
			| Pattern::Text
			| Pattern::Data { .. }
			| Pattern::Value { .. }
			| Pattern::List(_)
			| Pattern::Attribute { .. } => Expr::Empty,
			Pattern::NotAllowed => Expr::NotAllowed,
			Pattern::Choice(members) => members
				.iter()
				.fold(Expr::NotAllowed, |acc, m| choice(acc, Expr::Pattern(*m))),
			Pattern::Group(members) => members
				.iter()
				.fold(Expr::Empty, |acc, m| group(acc, Expr::Pattern(*m))),
			Pattern::Interleave(members) => members
				.iter()
				.fold(Expr::Empty, |acc, m| interleave(acc, Expr::Pattern(*m))),
			Pattern::OneOrMore(inner) => one_or_more(Expr::Pattern(*inner)),
			Pattern::Ref(define) => match self.schema.define_body(*define) {
				Some(body) => Expr::Pattern(body),
				None => Expr::NotAllowed,
			},
		}
	}

	fn is_element(&self, id: PatternId) -> bool {
		matches!(self.schema.pattern(id), Pattern::Element { .. })
	}

	/// Whether `expr` accepts the empty sequence of children.
	pub(crate) fn nullable(&self, expr: &Expr) -> bool {
		self.nullable_at(expr, 0)
	}

	fn nullable_at(&self, expr: &Expr, depth: usize) -> bool {
		if depth > MAX_DEPTH {
			return false;
		}
		match expr {
			Expr::Empty => true,
			Expr::NotAllowed => false,
			Expr::Pattern(id) if self.is_element(*id) => false,
			Expr::Pattern(id) => self.nullable_at(&self.expand(*id), depth + 1),
			Expr::Choice(a, b) => self.nullable_at(a, depth + 1) || self.nullable_at(b, depth + 1),
			Expr::Group(a, b) | Expr::Interleave(a, b) => {
				self.nullable_at(a, depth + 1) && self.nullable_at(b, depth + 1)
			}
			Expr::OneOrMore(p) => self.nullable_at(p, depth + 1),
		}
	}

	/// Residual of `expr` after consuming a child `{namespace}local`.
	pub(crate) fn deriv(&self, expr: &Expr, namespace: &str, local: &str) -> Expr {
		self.deriv_at(expr, namespace, local, 0)
	}

	fn deriv_at(&self, expr: &Expr, namespace: &str, local: &str, depth: usize) -> Expr {
		if depth > MAX_DEPTH {
			return Expr::NotAllowed;
		}
		let next = depth + 1;
		match expr {
			Expr::Empty | Expr::NotAllowed => Expr::NotAllowed,
			Expr::Pattern(id) => match self.schema.pattern(*id) {
				Pattern::Element { name, .. } => {
					if name.matches(namespace, local) {
						Expr::Empty
					} else {
						Expr::NotAllowed
					}
				}
				_ => self.deriv_at(&self.expand(*id), namespace, local, next),
			},
			Expr::Choice(a, b) => choice(
				self.deriv_at(a, namespace, local, next),
				self.deriv_at(b, namespace, local, next),
			),
			Expr::Group(a, b) => {
				let head = group(self.deriv_at(a, namespace, local, next), (**b).clone());
				if self.nullable_at(a, next) {
					choice(head, self.deriv_at(b, namespace, local, next))
				} else {
					head
				}
			}
			Expr::Interleave(a, b) => choice(
				interleave(self.deriv_at(a, namespace, local, next), (**b).clone()),
				interleave((**a).clone(), self.deriv_at(b, namespace, local, next)),
			),
			Expr::OneOrMore(p) => group(
				self.deriv_at(p, namespace, local, next),
				choice(expr.clone(), Expr::Empty),
			),
		}
	}

	/// Element patterns that may match the next child, in grammar order.
	pub(crate) fn first(&self, expr: &Expr) -> Vec<PatternId> {
		let mut out = Vec::new();
		self.first_at(expr, &mut out, 0);
		out
	}

	fn first_at(&self, expr: &Expr, out: &mut Vec<PatternId>, depth: usize) {
		if depth > MAX_DEPTH {
			return;
		}
		let next = depth + 1;
		match expr {
			Expr::Empty | Expr::NotAllowed => {}
			Expr::Pattern(id) if self.is_element(*id) => {
				if !out.contains(id) {
					out.push(*id);
				}
			}
			Expr::Pattern(id) => self.first_at(&self.expand(*id), out, next),
			Expr::Choice(a, b) | Expr::Interleave(a, b) => {
				self.first_at(a, out, next);
				self.first_at(b, out, next);
			}
			Expr::Group(a, b) => {
				self.first_at(a, out, next);
				if self.nullable_at(a, next) {
					self.first_at(b, out, next);
				}
			}
			Expr::OneOrMore(p) => self.first_at(p, out, next),
		}
	}

	/// Element patterns of the part of `expr` that must still be matched.
	///
	/// Optional prefixes are skipped and an optional choice contributes
	/// nothing, so for `a*, (b | c)` the result is `b, c`.
	pub(crate) fn required_first(&self, expr: &Expr) -> Vec<PatternId> {
		let mut out = Vec::new();
		self.required_first_at(expr, &mut out, 0);
		out
	}

	fn required_first_at(&self, expr: &Expr, out: &mut Vec<PatternId>, depth: usize) {
		if depth > MAX_DEPTH {
			return;
		}
		let next = depth + 1;
		match expr {
			Expr::Empty | Expr::NotAllowed => {}
			Expr::Pattern(id) if self.is_element(*id) => {
				if !out.contains(id) {
					out.push(*id);
				}
			}
			Expr::Pattern(id) => self.required_first_at(&self.expand(*id), out, next),
			Expr::Choice(a, b) => {
				if !self.nullable_at(a, next) && !self.nullable_at(b, next) {
					self.required_first_at(a, out, next);
					self.required_first_at(b, out, next);
				}
			}
			Expr::Interleave(a, b) => {
				self.required_first_at(a, out, next);
				self.required_first_at(b, out, next);
			}
			Expr::Group(a, b) => {
				if self.nullable_at(a, next) {
					self.required_first_at(b, out, next);
				} else {
					self.required_first_at(a, out, next);
				}
			}
			Expr::OneOrMore(p) => self.required_first_at(p, out, next),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::relaxng::pattern::NameClass;

	fn element(local: &str, content: u32) -> Pattern {
		Pattern::Element {
			name: NameClass::Name {
				namespace: String::new(),
				local: local.into(),
			},
			content: PatternId(content),
			documentation: None,
		}
	}

	/// group(a, choice(b, c), oneOrMore(d))
	fn schema() -> Schema {
		Schema {
			patterns: vec![
				Pattern::Empty,                                   // 0
				element("a", 0),                                  // 1
				element("b", 0),                                  // 2
				element("c", 0),                                  // 3
				element("d", 0),                                  // 4
				Pattern::Choice(vec![PatternId(2), PatternId(3)]), // 5
				Pattern::OneOrMore(PatternId(4)),                  // 6
				Pattern::Group(vec![PatternId(1), PatternId(5), PatternId(6)]), // 7
			],
			defines: Vec::new(),
			start: PatternId(7),
		}
	}

	fn run(schema: &Schema, children: &[&str]) -> Expr {
		let deriver = Deriver::new(schema);
		children
			.iter()
			.fold(Expr::Pattern(schema.start()), |expr, child| deriver.deriv(&expr, "", child))
	}

	#[test]
	fn test_first_lists_choice_alternatives() {
		let schema = schema();
		let deriver = Deriver::new(&schema);
		let residual = run(&schema, &["a"]);
		assert!(!deriver.nullable(&residual));
		assert_eq!(deriver.first(&residual), vec![PatternId(2), PatternId(3)]);
	}

	#[test]
	fn test_complete_sequence_is_nullable() {
		let schema = schema();
		let deriver = Deriver::new(&schema);
		assert!(deriver.nullable(&run(&schema, &["a", "c", "d", "d"])));
		assert!(!deriver.nullable(&run(&schema, &["a", "b"])));
	}

	#[test]
	fn test_out_of_order_child_is_rejected() {
		let schema = schema();
		assert_eq!(run(&schema, &["b"]), Expr::NotAllowed);
		assert_eq!(run(&schema, &["a", "d"]), Expr::NotAllowed);
	}

	#[test]
	fn test_interleave_accepts_any_order() {
		let schema = Schema {
			patterns: vec![
				Pattern::Empty,
				element("x", 0),
				element("y", 0),
				Pattern::Interleave(vec![PatternId(1), PatternId(2)]),
			],
			defines: Vec::new(),
			start: PatternId(3),
		};
		let deriver = Deriver::new(&schema);
		assert!(deriver.nullable(&run(&schema, &["y", "x"])));
		assert!(deriver.nullable(&run(&schema, &["x", "y"])));
		assert_eq!(deriver.first(&run(&schema, &["y"])), vec![PatternId(1)]);
	}

	#[test]
	fn test_required_first_skips_optional_prefix() {
		// group(zeroOrMore(a), choice(b, c))
		let schema = Schema {
			patterns: vec![
				Pattern::Empty,
				element("a", 0),
				element("b", 0),
				element("c", 0),
				Pattern::OneOrMore(PatternId(1)),
				Pattern::Choice(vec![PatternId(4), PatternId(0)]),
				Pattern::Choice(vec![PatternId(2), PatternId(3)]),
				Pattern::Group(vec![PatternId(5), PatternId(6)]),
			],
			defines: Vec::new(),
			start: PatternId(7),
		};
		let deriver = Deriver::new(&schema);
		let residual = run(&schema, &["a"]);
		assert_eq!(deriver.first(&residual), vec![PatternId(1), PatternId(2), PatternId(3)]);
		assert_eq!(deriver.required_first(&residual), vec![PatternId(2), PatternId(3)]);
	}
}
