//! A small generic finite-domain constraint satisfaction engine.
//!
//! This module knows nothing about music: it solves over opaque
//! variable identifiers, integer domains, and a caller-supplied
//! constraint type. The harmonic predicate catalogue lives in
//! [`crate::constraints`]; [`crate::problem`] wires the two together.
//!
//! Search is depth-first backtracking with the variable order fixed up
//! front by minimum-remaining-domain (smallest domain first, ties
//! broken by insertion order) and no forward-checking pruning: a
//! constraint is evaluated exactly once, the instant every variable it
//! mentions has been bound. This keeps the engine's behavior easy to
//! reason about and test, at the cost of exploring some branches a
//! pruning solver would cut early.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::HarmonyError;
use crate::voice::Voice;

/// Identifies one variable: a voice at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarId {
	pub voice: Voice,
	pub time: usize,
}

impl VarId {
	pub fn new(voice: Voice, time: usize) -> VarId {
		VarId { voice, time }
	}
}

impl fmt::Display for VarId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}{}", self.voice, self.time)
	}
}

/// A variable's candidate values, in declared order. Declared order
/// matters: it is the order values are tried in during search.
pub type Domain = Vec<i32>;

/// A (partial or complete) mapping from variable to chosen pitch
/// number. During search this holds only the variables bound so far.
pub type Assignment = HashMap<VarId, i32>;

/// Something that can check whether an assignment satisfies it.
///
/// Implementations should treat an assignment that doesn't yet bind
/// every variable the constraint mentions as satisfied (abstain) —
/// the engine only ever calls `check` once all of `vars` are bound, so
/// this is mostly a convenience for callers that want to probe early,
/// but implementations are expected to honor it regardless.
pub trait Constraint: Clone {
	fn check(&self, vars: &[VarId], assignment: &Assignment) -> bool;
}

/// A cooperative cancellation flag. Cloning shares the same
/// underlying flag; `halt()` from any clone stops every solver
/// iterating with this handle at its next node expansion.
#[derive(Debug, Clone, Default)]
pub struct Halt(Arc<AtomicBool>);

impl Halt {
	pub fn new() -> Halt {
		Halt(Arc::new(AtomicBool::new(false)))
	}

	pub fn halt(&self) {
		self.0.store(true, Ordering::Relaxed);
	}

	pub fn unhalt(&self) {
		self.0.store(false, Ordering::Relaxed);
	}

	pub fn is_halted(&self) -> bool {
		self.0.load(Ordering::Relaxed)
	}
}

/// A finite-domain CSP instance: a mutable ordered set of variables
/// plus a set of constraints over them.
///
/// Variables keep insertion order because that order anchors the MRV
/// tie-break, the same way the problem builder anchors solution
/// determinism by assigning voices and time steps in a fixed order.
#[derive(Debug, Clone)]
pub struct Problem<C: Constraint> {
	variables: Vec<(VarId, Domain)>,
	var_index: HashMap<VarId, usize>,
	constraints: Vec<(C, Vec<VarId>)>,
}

impl<C: Constraint> Default for Problem<C> {
	fn default() -> Self {
		Problem { variables: Vec::new(), var_index: HashMap::new(), constraints: Vec::new() }
	}
}

impl<C: Constraint> Problem<C> {
	pub fn new() -> Problem<C> {
		Problem::default()
	}

	pub fn variable_count(&self) -> usize {
		self.variables.len()
	}

	pub fn domain(&self, id: VarId) -> Option<&Domain> {
		self.var_index.get(&id).map(|&i| &self.variables[i].1)
	}

	/// Add a new variable with the given candidate values. Errors if
	/// `id` is already present.
	pub fn add_variable(&mut self, id: VarId, domain: Domain) -> Result<(), HarmonyError> {
		if self.var_index.contains_key(&id) {
			return Err(HarmonyError::DuplicateVariable(id.to_string()));
		}
		self.var_index.insert(id, self.variables.len());
		self.variables.push((id, domain));
		Ok(())
	}

	/// Replace an existing variable's domain in place, preserving its
	/// position in insertion order (and so its MRV tie-break rank).
	pub fn replace_variable(&mut self, id: VarId, domain: Domain) -> Result<(), HarmonyError> {
		let idx = self
			.var_index
			.get(&id)
			.ok_or_else(|| HarmonyError::UnknownVariable(id.to_string()))?;
		self.variables[*idx].1 = domain;
		Ok(())
	}

	/// Remove a variable and every constraint that mentions it.
	pub fn remove_variable(&mut self, id: VarId) -> Result<(), HarmonyError> {
		let idx = self
			.var_index
			.remove(&id)
			.ok_or_else(|| HarmonyError::UnknownVariable(id.to_string()))?;
		self.variables.remove(idx);
		for (_, i) in self.var_index.iter_mut() {
			if *i > idx {
				*i -= 1;
			}
		}
		self.constraints.retain(|(_, vars)| !vars.contains(&id));
		Ok(())
	}

	/// Attach a constraint over the given variables. Errors if any
	/// referenced variable doesn't exist.
	pub fn add_constraint(&mut self, constraint: C, vars: Vec<VarId>) -> Result<(), HarmonyError> {
		for id in &vars {
			if !self.var_index.contains_key(id) {
				return Err(HarmonyError::UnknownVariable(id.to_string()));
			}
		}
		self.constraints.push((constraint, vars));
		Ok(())
	}

	/// A lazy stream of complete solutions, searched depth-first with
	/// no cancellation handle. Each call to `next` resumes the search
	/// exactly where the previous one left off.
	pub fn solutions(&self) -> Solutions<'_, C> {
		Solutions::new(self, None)
	}

	/// Like [`Problem::solutions`], but the search checks `halt` between
	/// node expansions and stops (yielding no further solutions) once
	/// it is set.
	pub fn solutions_with_halt(&self, halt: Halt) -> Solutions<'_, C> {
		Solutions::new(self, Some(halt))
	}
}

/// Iterator over a [`Problem`]'s solutions, depth-first and lazy.
pub struct Solutions<'p, C: Constraint> {
	problem: &'p Problem<C>,
	order: Vec<VarId>,
	domains: Vec<&'p Domain>,
	constraints_by_pos: Vec<Vec<usize>>,
	value_idx: Vec<usize>,
	assignment: Assignment,
	depth: usize,
	just_yielded: bool,
	halt: Option<Halt>,
}

impl<'p, C: Constraint> Solutions<'p, C> {
	fn new(problem: &'p Problem<C>, halt: Option<Halt>) -> Self {
		let n = problem.variables.len();

		// MRV: smallest domain first, ties broken by insertion order.
		let mut order_idx: Vec<usize> = (0..n).collect();
		order_idx.sort_by_key(|&i| (problem.variables[i].1.len(), i));

		let order: Vec<VarId> = order_idx.iter().map(|&i| problem.variables[i].0).collect();
		let domains: Vec<&Domain> = order_idx.iter().map(|&i| &problem.variables[i].1).collect();

		let position_of: HashMap<VarId, usize> =
			order.iter().enumerate().map(|(pos, id)| (*id, pos)).collect();

		let mut constraints_by_pos: Vec<Vec<usize>> = vec![Vec::new(); n];
		for (ci, (_, vars)) in problem.constraints.iter().enumerate() {
			if let Some(max_pos) = vars.iter().map(|v| position_of[v]).max() {
				constraints_by_pos[max_pos].push(ci);
			}
		}

		Solutions {
			problem,
			order,
			domains,
			constraints_by_pos,
			value_idx: vec![0; n],
			assignment: Assignment::new(),
			depth: 0,
			just_yielded: false,
			halt,
		}
	}

	fn is_halted(&self) -> bool {
		self.halt.as_ref().is_some_and(Halt::is_halted)
	}
}

impl<'p, C: Constraint> Iterator for Solutions<'p, C> {
	type Item = Assignment;

	fn next(&mut self) -> Option<Assignment> {
		let n = self.order.len();

		if self.just_yielded {
			self.just_yielded = false;
			if n == 0 {
				return None;
			}
			self.depth -= 1;
			let id = self.order[self.depth];
			self.assignment.remove(&id);
			self.value_idx[self.depth] += 1;
		}

		loop {
			if self.is_halted() {
				return None;
			}

			if self.depth == n {
				self.just_yielded = true;
				return Some(self.assignment.clone());
			}

			let domain = self.domains[self.depth];
			if self.value_idx[self.depth] >= domain.len() {
				if self.depth == 0 {
					return None;
				}
				self.depth -= 1;
				let id = self.order[self.depth];
				self.assignment.remove(&id);
				self.value_idx[self.depth] += 1;
				continue;
			}

			let id = self.order[self.depth];
			let value = domain[self.value_idx[self.depth]];
			self.assignment.insert(id, value);

			let ok = self.constraints_by_pos[self.depth].iter().all(|&ci| {
				let (constraint, vars) = &self.problem.constraints[ci];
				constraint.check(vars, &self.assignment)
			});

			if ok {
				self.depth += 1;
			} else {
				self.assignment.remove(&id);
				self.value_idx[self.depth] += 1;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Debug, Clone)]
	enum TestConstraint {
		NotEqual,
		LessThan,
	}

	impl Constraint for TestConstraint {
		fn check(&self, vars: &[VarId], assignment: &Assignment) -> bool {
			let (a, b) = match (assignment.get(&vars[0]), assignment.get(&vars[1])) {
				(Some(a), Some(b)) => (*a, *b),
				_ => return true,
			};
			match self {
				TestConstraint::NotEqual => a != b,
				TestConstraint::LessThan => a < b,
			}
		}
	}

	fn var(time: usize) -> VarId {
		VarId::new(Voice::Soprano, time)
	}

	#[test]
	fn finds_all_solutions_to_a_tiny_problem() {
		let mut p: Problem<TestConstraint> = Problem::new();
		p.add_variable(var(0), vec![1, 2, 3]).unwrap();
		p.add_variable(var(1), vec![1, 2, 3]).unwrap();
		p.add_constraint(TestConstraint::NotEqual, vec![var(0), var(1)]).unwrap();

		let solutions: Vec<_> = p.solutions().collect();
		assert_eq!(solutions.len(), 6);
		for s in &solutions {
			assert_ne!(s[&var(0)], s[&var(1)]);
		}
	}

	#[test]
	fn empty_problem_yields_exactly_one_empty_solution() {
		let p: Problem<TestConstraint> = Problem::new();
		let solutions: Vec<_> = p.solutions().collect();
		assert_eq!(solutions, vec![Assignment::new()]);
	}

	#[test]
	fn unsatisfiable_problem_yields_nothing() {
		let mut p: Problem<TestConstraint> = Problem::new();
		p.add_variable(var(0), vec![1]).unwrap();
		p.add_variable(var(1), vec![1]).unwrap();
		p.add_constraint(TestConstraint::LessThan, vec![var(0), var(1)]).unwrap();
		assert_eq!(p.solutions().count(), 0);
	}

	#[test]
	fn halt_stops_the_search_early() {
		let mut p: Problem<TestConstraint> = Problem::new();
		p.add_variable(var(0), (0..50).collect()).unwrap();
		p.add_variable(var(1), (0..50).collect()).unwrap();

		let halt = Halt::new();
		let mut iter = p.solutions_with_halt(halt.clone());
		assert!(iter.next().is_some());
		halt.halt();
		assert!(iter.next().is_none());
	}

	#[test]
	fn duplicate_variable_is_an_error() {
		let mut p: Problem<TestConstraint> = Problem::new();
		p.add_variable(var(0), vec![1]).unwrap();
		assert!(p.add_variable(var(0), vec![2]).is_err());
	}

	#[test]
	fn constraint_over_unknown_variable_is_an_error() {
		let mut p: Problem<TestConstraint> = Problem::new();
		p.add_variable(var(0), vec![1]).unwrap();
		assert!(p.add_constraint(TestConstraint::NotEqual, vec![var(0), var(1)]).is_err());
	}

	#[test]
	fn removing_a_variable_drops_constraints_that_mention_it() {
		let mut p: Problem<TestConstraint> = Problem::new();
		p.add_variable(var(0), vec![1, 2]).unwrap();
		p.add_variable(var(1), vec![1, 2]).unwrap();
		p.add_constraint(TestConstraint::NotEqual, vec![var(0), var(1)]).unwrap();
		p.remove_variable(var(1)).unwrap();
		// Only var(0) remains and no constraint references the removed
		// variable, so every value in its domain is a solution.
		assert_eq!(p.solutions().count(), 2);
	}

	#[test]
	fn mrv_orders_the_smallest_domain_first() {
		let mut p: Problem<TestConstraint> = Problem::new();
		p.add_variable(var(0), vec![1, 2, 3, 4]).unwrap();
		p.add_variable(var(1), vec![1]).unwrap();
		let solutions = Solutions::new(&p, None);
		assert_eq!(solutions.order[0], var(1));
	}
}
