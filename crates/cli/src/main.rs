use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;

use harmony_core::chord::Chord;
use harmony_core::pitch::pitch_number_name;
use harmony_core::problem::{ProblemOptions, build_problem, solve_ranked};
use harmony_core::problemfile;
use harmony_core::score::DefaultScorer;
use harmony_core::voice::Voice;

/// How many candidates are drawn off the lazy solution stream before
/// the scorer picks a winner. The stream can be unbounded, so this is
/// the CLI's own cutoff rather than something the solver enforces.
const SOLUTION_SEARCH_LIMIT: usize = 500;

/// Solve a four-part vocal harmonization problem.
#[derive(Debug, Parser)]
#[command(name = "harmony", about = "Four-part vocal harmonization solver")]
struct Cli {
	/// Path to a problem file (see the [Chords]/[Figures] format).
	#[arg(required_unless_present = "run_tests")]
	problem: Option<PathBuf>,

	/// Run the built-in regression suite instead of solving a file.
	#[arg(long = "run-tests")]
	run_tests: bool,
}

fn main() -> ExitCode {
	let cli = Cli::parse();

	let result = if cli.run_tests { run_regression_suite() } else { solve_file(&cli.problem) };

	match result {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			eprintln!("{} {e:#}", "error:".red().bold());
			ExitCode::FAILURE
		}
	}
}

fn solve_file(path: &Option<PathBuf>) -> Result<()> {
	let path = path.as_ref().expect("clap enforces this unless --run-tests is set");
	let text = fs::read_to_string(path)
		.with_context(|| format!("reading problem file {}", path.display()))?;

	let file = problemfile::parse(&text);
	for diagnostic in &file.diagnostics {
		eprintln!(
			"{} line {}: {}",
			"warning:".yellow().bold(),
			diagnostic.line,
			diagnostic.message
		);
	}
	if file.chords.is_empty() {
		bail!("problem file contains no chords");
	}

	let (chords, fixed) = file.build_inputs();
	let problem = build_problem(&chords, &fixed, &ProblemOptions::default())
		.context("building the harmonization problem")?;

	let scorer = DefaultScorer;
	let ranked = solve_ranked(&problem, Some(&scorer), SOLUTION_SEARCH_LIMIT);

	match ranked.into_iter().next() {
		Some(solution) => {
			print_solution(&chords, &solution);
			Ok(())
		}
		None => {
			println!("{}", "No solution satisfies every voice-leading constraint.".yellow());
			Ok(())
		}
	}
}

fn print_solution(chords: &[Chord], solution: &std::collections::HashMap<harmony_core::VarId, i32>) {
	let mut sorted = chords.to_vec();
	sorted.sort_by_key(|c| c.time);

	for (t, chord) in sorted.iter().enumerate() {
		println!("{} {}", format!("t={t}").bold(), chord);
		for voice in Voice::ALL {
			let id = harmony_core::VarId::new(voice, t);
			let pitch = solution[&id];
			let (name, octave) = pitch_number_name(pitch);
			println!("  {voice}: {name}{octave}");
		}
	}
}

fn run_regression_suite() -> Result<()> {
	let scenarios: Vec<(&str, fn() -> Result<()>)> = vec![
		("S1 C major triad", scenario_s1),
		("S2 authentic cadence V-I", scenario_s2),
		("S3 bass specified", scenario_s3),
		("S4 ii-V-I", scenario_s4),
		("S5 fully diminished resolution", scenario_s5),
		("S6 infeasible bass note", scenario_s6),
	];

	let mut failures = 0;
	for (name, scenario) in scenarios {
		match scenario() {
			Ok(()) => println!("{} {name}", "ok".green().bold()),
			Err(e) => {
				println!("{} {name}: {e:#}", "FAIL".red().bold());
				failures += 1;
			}
		}
	}

	if failures > 0 {
		bail!("{failures} scenario(s) failed");
	}
	println!("{}", "all scenarios passed".green());
	Ok(())
}

fn scenario_s1() -> Result<()> {
	let chord = Chord::parse("C", "maj", 0, None, None)?;
	let problem = build_problem(&[chord], &[], &ProblemOptions::default())?;
	let solution = problem.solutions().next().context("expected at least one solution")?;

	for voice in Voice::ALL {
		let pc = solution[&harmony_core::VarId::new(voice, 0)].rem_euclid(12);
		if ![0, 4, 7].contains(&pc) {
			bail!("voice {voice} landed on pitch class {pc}, expected a C major triad tone");
		}
	}
	check_no_crossing(&solution, 0)?;
	Ok(())
}

fn scenario_s2() -> Result<()> {
	let chords = vec![
		Chord::parse("G", "7", 0, None, Some("V"))?,
		Chord::parse("C", "maj", 1, None, Some("I"))?,
	];
	let problem = build_problem(&chords, &[], &ProblemOptions::default())?;
	for solution in problem.solutions().take(50) {
		for voice in Voice::ALL {
			let x = solution[&harmony_core::VarId::new(voice, 0)];
			let x2 = solution[&harmony_core::VarId::new(voice, 1)];
			if x.rem_euclid(12) == 11 && x2.rem_euclid(12) != 0 {
				bail!("voice {voice} held the leading tone but did not resolve to the tonic");
			}
			if x.rem_euclid(12) == 5 && x2 != x - 1 && x2 != x - 2 {
				bail!("voice {voice} held the seventh but did not resolve down by step");
			}
		}
	}
	Ok(())
}

fn scenario_s3() -> Result<()> {
	let chord = Chord::parse("C", "maj", 0, Some("E"), None)?;
	let problem = build_problem(&[chord], &[], &ProblemOptions::default())?;
	let solution = problem.solutions().next().context("expected at least one solution")?;
	let bass = solution[&harmony_core::VarId::new(Voice::Bass, 0)];
	if bass.rem_euclid(12) != 4 {
		bail!("bass landed on pitch class {}, expected E (4)", bass.rem_euclid(12));
	}
	Ok(())
}

fn scenario_s4() -> Result<()> {
	let chords = vec![
		Chord::parse("D", "min7", 0, None, Some("ii"))?,
		Chord::parse("G", "7", 1, None, Some("V"))?,
		Chord::parse("C", "maj", 2, None, Some("I"))?,
	];
	let problem = build_problem(&chords, &[], &ProblemOptions::default())?;
	problem.solutions().next().context("expected at least one solution")?;
	Ok(())
}

fn scenario_s5() -> Result<()> {
	let chords = vec![
		Chord::parse("B", "dim7", 0, None, None)?,
		Chord::parse("C", "maj", 1, None, None)?,
	];
	let problem = build_problem(&chords, &[], &ProblemOptions::default())?;
	for solution in problem.solutions().take(50) {
		for voice in Voice::ALL {
			let x = solution[&harmony_core::VarId::new(voice, 0)];
			let x2 = solution[&harmony_core::VarId::new(voice, 1)];
			if x.rem_euclid(12) == 11 && x2 != x + 1 {
				bail!("voice {voice} held the diminished root but did not resolve up by semitone");
			}
		}
	}
	Ok(())
}

fn scenario_s6() -> Result<()> {
	// F is not a tone of C major, so pinning the bass there is infeasible.
	let chord = Chord::parse("C", "maj", 0, Some("F"), None)?;
	let problem = build_problem(&[chord], &[], &ProblemOptions::default())?;
	if problem.solutions().next().is_some() {
		bail!("expected an empty solution stream for an infeasible bass note");
	}
	Ok(())
}

fn check_no_crossing(
	solution: &std::collections::HashMap<harmony_core::VarId, i32>,
	t: usize,
) -> Result<()> {
	let s = solution[&harmony_core::VarId::new(Voice::Soprano, t)];
	let a = solution[&harmony_core::VarId::new(Voice::Alto, t)];
	let te = solution[&harmony_core::VarId::new(Voice::Tenor, t)];
	let b = solution[&harmony_core::VarId::new(Voice::Bass, t)];
	if !(s >= a && a >= te && te >= b) {
		bail!("voices crossed at t={t}");
	}
	Ok(())
}
