//! Turns a chord sequence into a solvable [`csp::Problem`]: one
//! variable per voice per chord, and the full voice-leading constraint
//! catalogue wired up between them.

use crate::chord::Chord;
use crate::constraints::Constraint;
use crate::csp::{Assignment, Problem, VarId};
use crate::error::Result;
use crate::pitch::pc;
use crate::score::Scorer;
use crate::voice::Voice;

/// Knobs that change which constraints the builder installs, for the
/// cases where the catalogue's default behavior is a judgment call
/// rather than a hard rule.
#[derive(Debug, Clone, Copy)]
pub struct ProblemOptions {
	/// When a chord has a seventh, require it be present in exactly one
	/// voice rather than allowing it to be silently omitted or doubled.
	/// Defaults to `true`.
	pub strict_seventh_doubling: bool,
}

impl Default for ProblemOptions {
	fn default() -> Self {
		ProblemOptions { strict_seventh_doubling: true }
	}
}

/// An explicit pin on one voice at one position in the chord sequence
/// (position, not raw `Chord::time`, since chords are renumbered to
/// consecutive indices before variables are created).
#[derive(Debug, Clone, Copy)]
pub struct FixedPitch {
	pub voice: Voice,
	pub position: usize,
	pub pitch_number: i32,
}

/// Build a [`Problem`] for the given chord sequence. Chords are sorted
/// by `time` and renumbered to consecutive positions 0..n first, so
/// gaps or out-of-order input in the caller's chord list don't affect
/// the resulting variable names.
pub fn build_problem(
	chords: &[Chord],
	fixed: &[FixedPitch],
	options: &ProblemOptions,
) -> Result<Problem<Constraint>> {
	let mut ordered: Vec<&Chord> = chords.iter().collect();
	ordered.sort_by_key(|c| c.time);
	let n = ordered.len();

	let mut problem: Problem<Constraint> = Problem::new();

	for (t, chord) in ordered.iter().enumerate() {
		let tones = chord.chord_tones();
		for voice in Voice::ALL {
			let id = VarId::new(voice, t);
			if let Some(pin) = fixed.iter().find(|f| f.voice == voice && f.position == t) {
				problem.add_variable(id, vec![pin.pitch_number])?;
				continue;
			}
			let domain: Vec<i32> =
				voice.range().filter(|n| tones.contains(&pc(*n))).collect();
			problem.add_variable(id, domain)?;
		}
	}

	for (t, chord) in ordered.iter().enumerate() {
		install_chord_constraints(&mut problem, chord, t, options)?;
	}

	for t in 0..n.saturating_sub(1) {
		install_adjacent_constraints(&mut problem, ordered[t], ordered[t + 1], t)?;
	}

	Ok(problem)
}

/// Draw up to `limit` candidates off a solved problem's lazy solution
/// stream and rank them by `scorer`, best first. With no scorer,
/// solutions come back in discovery order instead of by score — the
/// hook is optional, not a requirement for the solver to be usable.
pub fn solve_ranked<S: Scorer>(
	problem: &Problem<Constraint>,
	scorer: Option<&S>,
	limit: usize,
) -> Vec<Assignment> {
	let mut solutions: Vec<Assignment> = problem.solutions().take(limit).collect();
	if let Some(scorer) = scorer {
		solutions.sort_by_key(|solution| std::cmp::Reverse(scorer.score(solution)));
	}
	solutions
}

fn voice_var(voice: Voice, t: usize) -> VarId {
	VarId::new(voice, t)
}

fn install_chord_constraints(
	problem: &mut Problem<Constraint>,
	chord: &Chord,
	t: usize,
	options: &ProblemOptions,
) -> Result<()> {
	let satb = [
		voice_var(Voice::Soprano, t),
		voice_var(Voice::Alto, t),
		voice_var(Voice::Tenor, t),
		voice_var(Voice::Bass, t),
	];

	problem.add_constraint(
		Constraint::SpecifyChord {
			tones: chord.chord_tones(),
			seventh: chord.seventh(),
			strict_seventh_doubling: options.strict_seventh_doubling,
		},
		satb.to_vec(),
	)?;

	if chord.bass_note.is_some() {
		problem.add_constraint(
			Constraint::SetBass { bass_pc: chord.bass_pitch_class() },
			vec![satb[3]],
		)?;
	}

	problem.add_constraint(Constraint::Spacing, vec![satb[0], satb[1]])?;
	problem.add_constraint(Constraint::Spacing, vec![satb[1], satb[2]])?;

	problem.add_constraint(Constraint::Crossover, satb.to_vec())?;

	Ok(())
}

fn install_adjacent_constraints(
	problem: &mut Problem<Constraint>,
	chord: &Chord,
	next_chord: &Chord,
	t: usize,
) -> Result<()> {
	let adjacent_pairs = [
		(Voice::Soprano, Voice::Alto),
		(Voice::Alto, Voice::Tenor),
		(Voice::Tenor, Voice::Bass),
	];

	for voice in Voice::ALL {
		problem.add_constraint(
			Constraint::Leap,
			vec![voice_var(voice, t), voice_var(voice, t + 1)],
		)?;
	}

	for (upper, lower) in adjacent_pairs {
		problem.add_constraint(
			Constraint::TemporalOverlap,
			vec![
				voice_var(upper, t),
				voice_var(upper, t + 1),
				voice_var(lower, t),
				voice_var(lower, t + 1),
			],
		)?;
	}

	for (i, &x) in Voice::ALL.iter().enumerate() {
		for &y in &Voice::ALL[i + 1..] {
			let vars = vec![
				voice_var(x, t),
				voice_var(x, t + 1),
				voice_var(y, t),
				voice_var(y, t + 1),
			];
			problem.add_constraint(Constraint::ParallelFifth, vars.clone())?;
			problem.add_constraint(Constraint::ParallelOctave, vars)?;
		}
	}

	problem.add_constraint(
		Constraint::HiddenMotionOuter { next_chord_tones: next_chord.chord_tones() },
		vec![
			voice_var(Voice::Soprano, t),
			voice_var(Voice::Soprano, t + 1),
			voice_var(Voice::Bass, t),
			voice_var(Voice::Bass, t + 1),
		],
	)?;

	if let Some(seventh_pc) = chord.seventh() {
		for voice in Voice::ALL {
			problem.add_constraint(
				Constraint::Seventh { seventh_pc },
				vec![voice_var(voice, t), voice_var(voice, t + 1)],
			)?;
		}
	}

	if chord.is_dominant() {
		let leading_tone_pc = chord.leading_tone();
		for voice in Voice::ALL {
			problem.add_constraint(
				Constraint::LeadingTone { leading_tone_pc, outer: voice.is_outer() },
				vec![voice_var(voice, t), voice_var(voice, t + 1)],
			)?;
		}
	}

	if chord.is_dim() {
		let fifth_pc = chord.fifth();
		for voice in Voice::ALL {
			problem.add_constraint(
				Constraint::DiminishedFifth { fifth_pc },
				vec![voice_var(voice, t), voice_var(voice, t + 1)],
			)?;
		}
	}

	if chord.is_dim_full() {
		let root_pc = chord.root;
		for voice in Voice::ALL {
			problem.add_constraint(
				Constraint::FullDiminishedRoot { root_pc },
				vec![voice_var(voice, t), voice_var(voice, t + 1)],
			)?;
		}
	}

	Ok(())
}
