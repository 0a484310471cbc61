//! A small line-oriented text format for describing a harmonization
//! problem: a `[Chords]` section listing the chord sequence, and a
//! `[Figures]` section pinning individual voices to fixed pitches.
//!
//! ```text
//! [Chords]
//! # time, root, role, bassNote, mod1, mod2, ...
//! 0, C, I,    , maj
//! 1, G, V,    , 7
//! 2, C, I,    , maj
//!
//! [Figures]
//! # time, voice, pitch letter, octave
//! 0, S, G, 5
//! ```
//!
//! A malformed line is skipped with a diagnostic rather than aborting
//! the whole parse — one bad chord shouldn't cost the rest of the
//! file.

use std::collections::HashMap;

use crate::chord::Chord;
use crate::pitch::pitch_number_of;
use crate::problem::FixedPitch;
use crate::voice::Voice;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Section {
	None,
	Chords,
	Figures,
}

/// A fixed pitch pin as read from a `[Figures]` line, keyed by the
/// chord's raw `time` value rather than its renumbered position.
#[derive(Debug, Clone, Copy)]
struct RawFixedPitch {
	time: i64,
	voice: Voice,
	pitch_number: i32,
}

/// A non-fatal problem found while parsing one line of the file.
#[derive(Debug, Clone)]
pub struct ParseDiagnostic {
	pub line: usize,
	pub message: String,
}

/// The parsed contents of a problem file.
#[derive(Debug, Clone, Default)]
pub struct ProblemFile {
	pub chords: Vec<Chord>,
	fixed_raw: Vec<RawFixedPitch>,
	pub diagnostics: Vec<ParseDiagnostic>,
}

impl ProblemFile {
	/// Sort the chords by time and translate `[Figures]` pins from raw
	/// chord time values to renumbered positions, ready to hand to
	/// [`crate::problem::build_problem`].
	pub fn build_inputs(&self) -> (Vec<Chord>, Vec<FixedPitch>) {
		let mut chords = self.chords.clone();
		chords.sort_by_key(|c| c.time);

		let position_of: HashMap<i64, usize> =
			chords.iter().enumerate().map(|(i, c)| (c.time, i)).collect();

		let fixed = self
			.fixed_raw
			.iter()
			.filter_map(|f| {
				position_of.get(&f.time).map(|&position| FixedPitch {
					voice: f.voice,
					position,
					pitch_number: f.pitch_number,
				})
			})
			.collect();

		(chords, fixed)
	}
}

fn is_unspecified(field: &str) -> bool {
	let trimmed = field.trim();
	trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none")
}

fn parse_chord_line(line: &str, line_no: usize, diagnostics: &mut Vec<ParseDiagnostic>) -> Option<Chord> {
	let fields: Vec<&str> = line.split(',').collect();
	if fields.len() < 4 {
		diagnostics.push(ParseDiagnostic {
			line: line_no,
			message: "chord line needs at least time, root, role, bassNote".to_string(),
		});
		return None;
	}

	let time: i64 = match fields[0].trim().parse() {
		Ok(t) => t,
		Err(_) => {
			diagnostics.push(ParseDiagnostic {
				line: line_no,
				message: format!("bad time value '{}'", fields[0].trim()),
			});
			return None;
		}
	};

	let root = fields[1].trim();
	let role = if is_unspecified(fields[2]) { None } else { Some(fields[2].trim()) };
	let bass = if is_unspecified(fields[3]) { None } else { Some(fields[3].trim()) };
	let modifiers = fields[4..].join(" ");

	match Chord::parse(root, &modifiers, time, bass, role) {
		Ok(chord) => Some(chord),
		Err(e) => {
			diagnostics.push(ParseDiagnostic { line: line_no, message: e.to_string() });
			None
		}
	}
}

fn parse_voice(token: &str) -> Option<Voice> {
	match token.trim().to_ascii_uppercase().as_str() {
		"S" => Some(Voice::Soprano),
		"A" => Some(Voice::Alto),
		"T" => Some(Voice::Tenor),
		"B" => Some(Voice::Bass),
		_ => None,
	}
}

fn parse_figure_line(
	line: &str,
	line_no: usize,
	diagnostics: &mut Vec<ParseDiagnostic>,
) -> Option<RawFixedPitch> {
	let fields: Vec<&str> = line.split(',').collect();
	if fields.len() < 4 {
		diagnostics.push(ParseDiagnostic {
			line: line_no,
			message: "figure line needs time, voice, pitch letter, octave".to_string(),
		});
		return None;
	}

	let time: i64 = match fields[0].trim().parse() {
		Ok(t) => t,
		Err(_) => {
			diagnostics.push(ParseDiagnostic {
				line: line_no,
				message: format!("bad time value '{}'", fields[0].trim()),
			});
			return None;
		}
	};

	let voice = match parse_voice(fields[1]) {
		Some(v) => v,
		None => {
			diagnostics.push(ParseDiagnostic {
				line: line_no,
				message: format!("unknown voice '{}'", fields[1].trim()),
			});
			return None;
		}
	};

	let octave: i32 = match fields[3].trim().parse() {
		Ok(o) => o,
		Err(_) => {
			diagnostics.push(ParseDiagnostic {
				line: line_no,
				message: format!("bad octave '{}'", fields[3].trim()),
			});
			return None;
		}
	};

	match pitch_number_of(fields[2].trim(), octave) {
		Ok(pitch_number) => Some(RawFixedPitch { time, voice, pitch_number }),
		Err(e) => {
			diagnostics.push(ParseDiagnostic { line: line_no, message: e.to_string() });
			None
		}
	}
}

/// Parse the contents of a problem file. Malformed lines are recorded
/// in [`ProblemFile::diagnostics`] and otherwise ignored; this function
/// never fails outright.
pub fn parse(text: &str) -> ProblemFile {
	let mut section = Section::None;
	let mut chords = Vec::new();
	let mut fixed_raw = Vec::new();
	let mut diagnostics = Vec::new();

	for (idx, raw_line) in text.lines().enumerate() {
		let line_no = idx + 1;
		let line = raw_line.trim();

		if line.is_empty() || line.starts_with('#') {
			continue;
		}

		if line.eq_ignore_ascii_case("[chords]") {
			section = Section::Chords;
			continue;
		}
		if line.eq_ignore_ascii_case("[figures]") {
			section = Section::Figures;
			continue;
		}

		match section {
			Section::Chords => {
				if let Some(chord) = parse_chord_line(line, line_no, &mut diagnostics) {
					chords.push(chord);
				}
			}
			Section::Figures => {
				if let Some(fixed) = parse_figure_line(line, line_no, &mut diagnostics) {
					fixed_raw.push(fixed);
				}
			}
			Section::None => {
				diagnostics.push(ParseDiagnostic {
					line: line_no,
					message: "content outside of a [Chords] or [Figures] section".to_string(),
				});
			}
		}
	}

	ProblemFile { chords, fixed_raw, diagnostics }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_the_example_from_the_format_doc() {
		let text = "\
[Chords]
# time, root, role, bassNote, mod1, mod2, ...
0, C, I,    , maj
1, G, V,    , 7
2, C, I,    , maj

[Figures]
# optional fixed pitches (reserved)
";
		let file = parse(text);
		assert!(file.diagnostics.is_empty());
		assert_eq!(file.chords.len(), 3);
		assert!(file.chords[1].is_dominant());
	}

	#[test]
	fn skips_malformed_lines_without_aborting() {
		let text = "\
[Chords]
0, C, I, , maj
not a valid line at all
1, G, V, , 7
";
		let file = parse(text);
		assert_eq!(file.chords.len(), 2);
		assert_eq!(file.diagnostics.len(), 1);
	}

	#[test]
	fn figures_pin_a_voice_at_a_time() {
		let text = "\
[Chords]
0, C, , , maj
1, F, , , maj

[Figures]
1, S, A, 5
";
		let file = parse(text);
		let (chords, fixed) = file.build_inputs();
		assert_eq!(chords.len(), 2);
		assert_eq!(fixed.len(), 1);
		assert_eq!(fixed[0].voice, Voice::Soprano);
		assert_eq!(fixed[0].position, 1);
	}

	#[test]
	fn bass_note_and_role_accept_none_and_blank() {
		let text = "\
[Chords]
0, C, none, none, maj
1, C, , , maj
";
		let file = parse(text);
		assert_eq!(file.chords.len(), 2);
		assert!(file.chords[0].role.is_none());
		assert!(file.chords[0].bass_note.is_none());
	}
}
