//! The closed catalogue of voice-leading constraints.
//!
//! Each variant snapshots exactly the facts about a chord (or pair of
//! chords) it needs to decide its predicate; none of them hold a
//! reference back to a [`crate::chord::Chord`], so a constraint can
//! outlive the builder call that created it. A closed enum (rather
//! than a trait object per predicate) keeps the catalogue exhaustive:
//! adding a new rule is a compile error everywhere a match isn't
//! updated to handle it.
//!
//! Every predicate abstains (returns `true`) on a partial assignment
//! that doesn't yet bind all of its variables — the search engine only
//! calls `check` once that's no longer possible, but treating missing
//! bindings as "not yet violated" makes each predicate safe to probe
//! early too.

use std::collections::BTreeSet;

use crate::csp::{Assignment, VarId};
use crate::pitch::{iv, pc};

fn get(assignment: &Assignment, id: &VarId) -> Option<i32> {
	assignment.get(id).copied()
}

/// The voice-leading predicate catalogue. See the module-level
/// documentation for the abstain-on-partial-assignment convention
/// every variant follows.
#[derive(Debug, Clone)]
pub enum Constraint {
	/// Every voice's pitch class must be a chord tone; every chord tone
	/// (when the chord has four or fewer of them) must be doubled by at
	/// least one of the four voices; and, if the chord has a seventh,
	/// exactly one voice holds it. Applies to `[soprano, alto, tenor, bass]`.
	SpecifyChord { tones: BTreeSet<u8>, seventh: Option<u8>, strict_seventh_doubling: bool },

	/// The bass voice is pinned to a specific pitch class (a slash
	/// chord's bass note). Applies to `[bass]`.
	SetBass { bass_pc: u8 },

	/// Two adjacent voices (upper above lower) may not be spaced more
	/// than an octave apart. Applies to `[upper, lower]`.
	Spacing,

	/// The four voices must not cross: soprano >= alto >= tenor >= bass
	/// at every chord. Applies to `[soprano, alto, tenor, bass]`.
	Crossover,

	/// One voice may not leap by more than an octave between
	/// consecutive chords. Applies to `[x_t, x_t+1]`.
	Leap,

	/// Forbids a voice moving to or past where the other voice of the
	/// pair was sitting one chord ago (and vice versa) even when
	/// neither voice literally crosses the other at either individual
	/// time step. Applies to `[upper_t, upper_t+1, lower_t, lower_t+1]`.
	TemporalOverlap,

	/// No two voices may move in parallel perfect fifths. Applies to
	/// `[x_t, x_t+1, y_t, y_t+1]`.
	ParallelFifth,

	/// No two voices may move in parallel octaves (or unisons). Applies
	/// to `[x_t, x_t+1, y_t, y_t+1]`.
	ParallelOctave,

	/// Forbids the soprano and bass moving in the same direction into a
	/// perfect fifth or octave when the soprano leaps, unless the
	/// soprano's arrival pitch is a tone of the following chord and the
	/// soprano itself moves by step. Applies to `[soprano_t, soprano_t+1, bass_t, bass_t+1]`.
	///
	/// Because this spec defines "leaps" as motion of more than a
	/// whole step and "by step" as motion of a whole step or less, the
	/// exemption's own precondition (soprano moves by step) can never
	/// coexist with the leap precondition that triggers a rejection in
	/// the first place. The exemption is kept for fidelity to that
	/// wording and is exercised by a test confirming it never actually
	/// overrides a rejection.
	HiddenMotionOuter { next_chord_tones: BTreeSet<u8> },

	/// A voice holding the chord's seventh must resolve down by step
	/// (one or two semitones) at the next chord. Applies to `[x_t, x_t+1]`.
	Seventh { seventh_pc: u8 },

	/// A voice holding the leading tone of a dominant-functioning chord
	/// must resolve up by a semitone if it's an outer voice, or up a
	/// semitone / down to the fifth or third if it's an inner voice.
	/// Applies to `[x_t, x_t+1]`.
	LeadingTone { leading_tone_pc: u8, outer: bool },

	/// A voice holding the fifth of a diminished chord must resolve
	/// down by a semitone. Applies to `[x_t, x_t+1]`.
	DiminishedFifth { fifth_pc: u8 },

	/// A voice holding the root of a fully-diminished-seventh chord
	/// must resolve up by one or two semitones. Applies to `[x_t, x_t+1]`.
	FullDiminishedRoot { root_pc: u8 },
}

impl crate::csp::Constraint for Constraint {
	fn check(&self, vars: &[VarId], assignment: &Assignment) -> bool {
		match self {
			Constraint::SpecifyChord { tones, seventh, strict_seventh_doubling } => {
				let Some(pitches) = vars
					.iter()
					.map(|v| get(assignment, v))
					.collect::<Option<Vec<_>>>()
				else {
					return true;
				};
				if !pitches.iter().all(|p| tones.contains(&pc(*p))) {
					return false;
				}
				if tones.len() <= 4 {
					for tone in tones {
						if !pitches.iter().any(|p| pc(*p) == *tone) {
							return false;
						}
					}
				}
				if *strict_seventh_doubling {
					if let Some(seventh_pc) = seventh {
						let count = pitches.iter().filter(|p| pc(**p) == *seventh_pc).count();
						if count != 1 {
							return false;
						}
					}
				}
				true
			}

			Constraint::SetBass { bass_pc } => {
				let Some(b) = get(assignment, &vars[0]) else { return true };
				pc(b) == *bass_pc
			}

			Constraint::Spacing => {
				let (Some(upper), Some(lower)) =
					(get(assignment, &vars[0]), get(assignment, &vars[1]))
				else {
					return true;
				};
				iv(upper, lower) <= 12
			}

			Constraint::Crossover => {
				let Some(pitches) = vars
					.iter()
					.map(|v| get(assignment, v))
					.collect::<Option<Vec<_>>>()
				else {
					return true;
				};
				pitches[0] >= pitches[1] && pitches[1] >= pitches[2] && pitches[2] >= pitches[3]
			}

			Constraint::Leap => {
				let (Some(x), Some(x2)) =
					(get(assignment, &vars[0]), get(assignment, &vars[1]))
				else {
					return true;
				};
				iv(x, x2) <= 12
			}

			Constraint::TemporalOverlap => {
				let Some(p) = vars
					.iter()
					.map(|v| get(assignment, v))
					.collect::<Option<Vec<_>>>()
				else {
					return true;
				};
				let (u, u2, l, l2) = (p[0], p[1], p[2], p[3]);
				if u == u2 && l == l2 {
					return true;
				}
				!(u2 <= l) && !(l2 >= u)
			}

			Constraint::ParallelFifth => {
				let Some(p) = vars
					.iter()
					.map(|v| get(assignment, v))
					.collect::<Option<Vec<_>>>()
				else {
					return true;
				};
				let (x, x2, y, y2) = (p[0], p[1], p[2], p[3]);
				let ic1 = iv(x, y) % 12;
				let ic2 = iv(x2, y2) % 12;
				!(ic1 == 7 && ic2 == 7 && (x != x2 || y != y2))
			}

			Constraint::ParallelOctave => {
				let Some(p) = vars
					.iter()
					.map(|v| get(assignment, v))
					.collect::<Option<Vec<_>>>()
				else {
					return true;
				};
				let (x, x2, y, y2) = (p[0], p[1], p[2], p[3]);
				let ic1 = iv(x, y) % 12;
				let ic2 = iv(x2, y2) % 12;
				!(ic1 == 0 && ic2 == 0 && (x != x2 || y != y2))
			}

			Constraint::HiddenMotionOuter { next_chord_tones } => {
				let Some(p) = vars
					.iter()
					.map(|v| get(assignment, v))
					.collect::<Option<Vec<_>>>()
				else {
					return true;
				};
				let (s, s2, b, b2) = (p[0], p[1], p[2], p[3]);
				let s_delta = s2 - s;
				let b_delta = b2 - b;
				let same_direction = s_delta != 0 && b_delta != 0 && s_delta.signum() == b_delta.signum();
				let soprano_leaps = s_delta.abs() > 2;
				let lands_on_unison_or_fifth = iv(s2, b2) % 12 == 0 || iv(s2, b2) % 12 == 7;

				let rejects = same_direction && soprano_leaps && lands_on_unison_or_fifth;
				let exempt = next_chord_tones.contains(&pc(s2)) && s_delta.abs() <= 2;

				!(rejects && !exempt)
			}

			Constraint::Seventh { seventh_pc } => {
				let (Some(x), Some(x2)) =
					(get(assignment, &vars[0]), get(assignment, &vars[1]))
				else {
					return true;
				};
				if pc(x) != *seventh_pc {
					return true;
				}
				x2 == x - 1 || x2 == x - 2
			}

			Constraint::LeadingTone { leading_tone_pc, outer } => {
				let (Some(x), Some(x2)) =
					(get(assignment, &vars[0]), get(assignment, &vars[1]))
				else {
					return true;
				};
				if pc(x) != *leading_tone_pc {
					return true;
				}
				if *outer {
					x2 == x + 1
				} else {
					x2 == x + 1 || x2 == x - 3 || x2 == x - 4
				}
			}

			Constraint::DiminishedFifth { fifth_pc } => {
				let (Some(x), Some(x2)) =
					(get(assignment, &vars[0]), get(assignment, &vars[1]))
				else {
					return true;
				};
				if pc(x) != *fifth_pc {
					return true;
				}
				x2 == x - 1
			}

			Constraint::FullDiminishedRoot { root_pc } => {
				let (Some(x), Some(x2)) =
					(get(assignment, &vars[0]), get(assignment, &vars[1]))
				else {
					return true;
				};
				if pc(x) != *root_pc {
					return true;
				}
				x2 == x + 1 || x2 == x + 2
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::csp::Constraint as _;
	use crate::voice::Voice;

	fn v(voice: Voice, time: usize) -> VarId {
		VarId::new(voice, time)
	}

	fn assign(pairs: &[(VarId, i32)]) -> Assignment {
		pairs.iter().copied().collect()
	}

	#[test]
	fn specify_chord_requires_every_tone_present() {
		let c = Constraint::SpecifyChord {
			tones: BTreeSet::from([0, 4, 7]),
			seventh: None,
			strict_seventh_doubling: true,
		};
		let vars = [v(Voice::Soprano, 0), v(Voice::Alto, 0), v(Voice::Tenor, 0), v(Voice::Bass, 0)];
		// C E G C: all three tones present, root doubled.
		let good = assign(&[(vars[0], 72), (vars[1], 67), (vars[2], 64), (vars[3], 48)]);
		assert!(c.check(&vars, &good));

		// Missing the fifth entirely.
		let bad = assign(&[(vars[0], 76), (vars[1], 76), (vars[2], 64), (vars[3], 48)]);
		assert!(!c.check(&vars, &bad));
	}

	#[test]
	fn specify_chord_requires_exactly_one_seventh() {
		let c = Constraint::SpecifyChord {
			tones: BTreeSet::from([7, 11, 2, 5]),
			seventh: Some(5),
			strict_seventh_doubling: true,
		};
		let vars = [v(Voice::Soprano, 0), v(Voice::Alto, 0), v(Voice::Tenor, 0), v(Voice::Bass, 0)];
		// Two voices doubling the seventh (F).
		let doubled = assign(&[(vars[0], 65), (vars[1], 65), (vars[2], 62), (vars[3], 43)]);
		assert!(!c.check(&vars, &doubled));
	}

	#[test]
	fn spacing_rejects_more_than_an_octave() {
		let vars = [v(Voice::Soprano, 0), v(Voice::Alto, 0)];
		let a = assign(&[(vars[0], 72), (vars[1], 60)]);
		assert!(Constraint::Spacing.check(&vars, &a));
		let b = assign(&[(vars[0], 73), (vars[1], 60)]);
		assert!(!Constraint::Spacing.check(&vars, &b));
	}

	#[test]
	fn crossover_requires_descending_order() {
		let vars = [v(Voice::Soprano, 0), v(Voice::Alto, 0), v(Voice::Tenor, 0), v(Voice::Bass, 0)];
		let ok = assign(&[(vars[0], 72), (vars[1], 67), (vars[2], 64), (vars[3], 48)]);
		assert!(Constraint::Crossover.check(&vars, &ok));
		let crossed = assign(&[(vars[0], 60), (vars[1], 67), (vars[2], 64), (vars[3], 48)]);
		assert!(!Constraint::Crossover.check(&vars, &crossed));
	}

	#[test]
	fn parallel_fifths_are_rejected_but_held_fifths_are_not() {
		let vars = [v(Voice::Tenor, 0), v(Voice::Tenor, 1), v(Voice::Bass, 0), v(Voice::Bass, 1)];
		// C3->D3 over F2->G2: both fifths, both voices move -> parallel fifth.
		let moving = assign(&[(vars[0], 48), (vars[1], 50), (vars[2], 41), (vars[3], 43)]);
		assert!(!Constraint::ParallelFifth.check(&vars, &moving));
		// Same fifth held in both voices is not a parallel motion.
		let held = assign(&[(vars[0], 48), (vars[1], 48), (vars[2], 41), (vars[3], 41)]);
		assert!(Constraint::ParallelFifth.check(&vars, &held));
	}

	#[test]
	fn seventh_must_resolve_down_by_step() {
		let c = Constraint::Seventh { seventh_pc: 5 };
		let vars = [v(Voice::Tenor, 0), v(Voice::Tenor, 1)];
		let resolved = assign(&[(vars[0], 65), (vars[1], 64)]);
		assert!(c.check(&vars, &resolved));
		let unresolved = assign(&[(vars[0], 65), (vars[1], 67)]);
		assert!(!c.check(&vars, &unresolved));
		// Voice doesn't hold the seventh: abstains.
		let other = assign(&[(vars[0], 60), (vars[1], 72)]);
		assert!(c.check(&vars, &other));
	}

	#[test]
	fn leading_tone_outer_voice_must_rise_a_semitone() {
		let c = Constraint::LeadingTone { leading_tone_pc: 11, outer: true };
		let vars = [v(Voice::Soprano, 0), v(Voice::Soprano, 1)];
		let resolved = assign(&[(vars[0], 71), (vars[1], 72)]);
		assert!(c.check(&vars, &resolved));
		let unresolved = assign(&[(vars[0], 71), (vars[1], 67)]);
		assert!(!c.check(&vars, &unresolved));
	}

	#[test]
	fn leading_tone_inner_voice_has_three_resolutions() {
		let c = Constraint::LeadingTone { leading_tone_pc: 11, outer: false };
		let vars = [v(Voice::Alto, 0), v(Voice::Alto, 1)];
		for delta in [1, -3, -4] {
			let a = assign(&[(vars[0], 71), (vars[1], 71 + delta)]);
			assert!(c.check(&vars, &a), "delta {delta} should resolve");
		}
		let bad = assign(&[(vars[0], 71), (vars[1], 71 - 2)]);
		assert!(!c.check(&vars, &bad));
	}

	#[test]
	fn hidden_motion_exemption_never_actually_fires() {
		// By this catalogue's own definitions, "leaps" (>2 semitones) and
		// "by step" (<=2 semitones) never overlap, so a soprano motion
		// that satisfies the exemption's step requirement can never also
		// satisfy the leap precondition that triggers a rejection.
		let vars =
			[v(Voice::Soprano, 0), v(Voice::Soprano, 1), v(Voice::Bass, 0), v(Voice::Bass, 1)];
		let c = Constraint::HiddenMotionOuter { next_chord_tones: BTreeSet::from([0, 4, 7]) };
		// Soprano leaps a fourth, bass also rises, landing on a fifth: rejected.
		let a = assign(&[(vars[0], 60), (vars[1], 65), (vars[2], 48), (vars[3], 53)]);
		assert!(!c.check(&vars, &a));
	}

	#[test]
	fn full_diminished_root_resolves_up_by_step_or_whole_tone() {
		let c = Constraint::FullDiminishedRoot { root_pc: 11 };
		let vars = [v(Voice::Bass, 0), v(Voice::Bass, 1)];
		assert!(c.check(&vars, &assign(&[(vars[0], 59), (vars[1], 60)])));
		assert!(c.check(&vars, &assign(&[(vars[0], 59), (vars[1], 61)])));
		assert!(!c.check(&vars, &assign(&[(vars[0], 59), (vars[1], 62)])));
	}
}
