//! Pitch algebra: bidirectional conversion between letter-name pitches
//! and integer MIDI-style pitch numbers, and pitch-class arithmetic
//! modulo 12.
//!
//! Pitch number 60 is middle C (C4). Pitch class is `pitch_number mod 12`,
//! where 0 = C. Canonical spelling on output always uses sharps; flats
//! and the C♭/B♯/E♯/F♭ octave-crossing aliases are resolved on input.

use crate::error::{HarmonyError, Result};

const SHARP_NAMES: [&str; 12] = [
	"C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Raw (unwrapped) semitone offset of a letter+accidental from C, e.g.
/// `Cb` is -1 and `B#` is 12. Letting this go outside 0..12 is what
/// makes the Cb/B# octave-crossing aliases fall out of plain
/// arithmetic rather than needing a special case.
fn raw_offset(name: &str) -> Result<i32> {
	let name = name.trim();
	let mut chars = name.chars();
	let letter = chars
		.next()
		.ok_or_else(|| HarmonyError::BadPitchName(name.to_string()))?;

	let base = match letter.to_ascii_uppercase() {
		'C' => 0,
		'D' => 2,
		'E' => 4,
		'F' => 5,
		'G' => 7,
		'A' => 9,
		'B' => 11,
		_ => return Err(HarmonyError::BadPitchName(name.to_string())),
	};

	let rest: String = chars.collect();
	let accidental = match rest.as_str() {
		"" => 0,
		"#" | "s" | "S" | "♯" => 1,
		"b" | "B" | "♭" => -1,
		_ => return Err(HarmonyError::BadPitchName(name.to_string())),
	};

	Ok(base + accidental)
}

/// Parse a pitch-class letter name (e.g. "C", "C#", "Db", "Ab") into
/// its pitch class 0..11.
pub fn pitch_class_of(name: &str) -> Result<u8> {
	Ok(raw_offset(name)?.rem_euclid(12) as u8)
}

/// Build a pitch number from a letter name and octave. Octave is
/// MIDI-style: `pitch_number_of("C", -1) == 0`, `pitch_number_of("C", 4) == 60`.
pub fn pitch_number_of(name: &str, octave: i32) -> Result<i32> {
	Ok((octave + 1) * 12 + raw_offset(name)?)
}

/// Canonical (sharp) name for a pitch class.
pub fn pitch_class_name(class: u8) -> &'static str {
	SHARP_NAMES[(class % 12) as usize]
}

/// Decompose a pitch number into its canonical (sharp) name and octave.
pub fn pitch_number_name(n: i32) -> (&'static str, i32) {
	let class = n.rem_euclid(12) as u8;
	let octave = n.div_euclid(12) - 1;
	(pitch_class_name(class), octave)
}

/// Pitch class of a pitch number, `n mod 12`.
pub fn pc(n: i32) -> u8 {
	n.rem_euclid(12) as u8
}

/// Absolute interval in semitones between two pitch numbers.
pub fn iv(x: i32, y: i32) -> i32 {
	(x - y).abs()
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn parses_naturals() {
		assert_eq!(pitch_class_of("C").unwrap(), 0);
		assert_eq!(pitch_class_of("G").unwrap(), 7);
		assert_eq!(pitch_class_of("B").unwrap(), 11);
	}

	#[test]
	fn resolves_enharmonic_aliases() {
		assert_eq!(pitch_class_of("Db").unwrap(), pitch_class_of("C#").unwrap());
		assert_eq!(pitch_class_of("E#").unwrap(), pitch_class_of("F").unwrap());
		assert_eq!(pitch_class_of("Cb").unwrap(), pitch_class_of("B").unwrap());
		assert_eq!(pitch_class_of("B#").unwrap(), pitch_class_of("C").unwrap());
	}

	#[test]
	fn middle_c_is_sixty() {
		assert_eq!(pitch_number_of("C", 4).unwrap(), 60);
	}

	#[test]
	fn octave_minus_one_is_midi_zero() {
		assert_eq!(pitch_number_of("C", -1).unwrap(), 0);
	}

	#[test]
	fn cb_and_bsharp_cross_the_octave_boundary() {
		// Cb4 sounds the same pitch as B3.
		assert_eq!(
			pitch_number_of("Cb", 4).unwrap(),
			pitch_number_of("B", 3).unwrap()
		);
		// B#3 sounds the same pitch as C4.
		assert_eq!(
			pitch_number_of("B#", 3).unwrap(),
			pitch_number_of("C", 4).unwrap()
		);
	}

	#[test]
	fn rejects_bad_letters() {
		assert!(pitch_class_of("H").is_err());
		assert!(pitch_class_of("").is_err());
	}

	#[test]
	fn canonical_name_round_trip() {
		let (name, octave) = pitch_number_name(60);
		assert_eq!(name, "C");
		assert_eq!(octave, 4);
	}

	proptest! {
		#[test]
		fn round_trip_preserves_pitch_number(n in 0i32..128) {
			let (name, octave) = pitch_number_name(n);
			let back = pitch_number_of(name, octave).unwrap();
			prop_assert_eq!(back, n);
		}
	}
}
