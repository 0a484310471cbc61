//! Chord symbols: a root pitch class plus an ordered list of modifier
//! tokens applied to the default major triad, an optional slash bass,
//! and an optional harmonic role used by the resolution constraints.

use std::collections::BTreeSet;

use strum::IntoEnumIterator;

use crate::error::{HarmonyError, Result};
use crate::pitch::pitch_class_of;

/// One modifier token, applied in sequence to build up a chord's tone
/// set starting from a plain major triad (root, major third, perfect
/// fifth).
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumIter)]
pub enum Modifier {
	Major,
	Minor,
	Maj7,
	Min7,
	Dominant7,
	HalfDim,
	Dim,
	Dim7,
}

impl Modifier {
	/// Its canonical token spelling, the form `display_name` below and
	/// the error message list it in.
	fn canonical_token(&self) -> &'static str {
		match self {
			Modifier::Major => "maj",
			Modifier::Minor => "min",
			Modifier::Maj7 => "maj7",
			Modifier::Min7 => "min7",
			Modifier::Dominant7 => "7",
			Modifier::HalfDim => "half-dim",
			Modifier::Dim => "dim",
			Modifier::Dim7 => "dim7",
		}
	}

	/// Parse one modifier token. Matching is case-insensitive except for
	/// the bare `m`/`M` synonyms, which follow common lead-sheet
	/// convention (lowercase `m` = minor, uppercase `M` = major) and so
	/// are checked before case-folding.
	pub fn parse(token: &str) -> Result<Modifier> {
		if token == "m" {
			return Ok(Modifier::Minor);
		}
		if token == "M" {
			return Ok(Modifier::Major);
		}
		match token.to_ascii_lowercase().as_str() {
			"maj" => Ok(Modifier::Major),
			"min" => Ok(Modifier::Minor),
			"maj7" => Ok(Modifier::Maj7),
			"min7" => Ok(Modifier::Min7),
			"7" => Ok(Modifier::Dominant7),
			"half-dim" | "halfdim" | "ø" | "m7b5" => Ok(Modifier::HalfDim),
			"dim" => Ok(Modifier::Dim),
			"dim7" => Ok(Modifier::Dim7),
			_ => Err(HarmonyError::BadChordSpec(format!(
				"unknown modifier '{token}' (recognized: {})",
				Modifier::iter().map(|m| m.canonical_token()).collect::<Vec<_>>().join(", ")
			))),
		}
	}
}

/// The harmonic function a chord plays, used by the leading-tone and
/// diminished resolution constraints to decide whether they apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
	Tonic,
	Subdominant,
	Dominant,
	/// A bare roman-numeral label (e.g. "ii", "V7", "vi"). Only the
	/// leading character is inspected: a literal uppercase `V` marks
	/// the chord as functioning as a dominant.
	RomanNumeral(String),
}

impl Role {
	pub fn parse(token: &str) -> Option<Role> {
		let trimmed = token.trim();
		if trimmed.is_empty() {
			return None;
		}
		match trimmed.to_ascii_uppercase().as_str() {
			"TONIC" => Some(Role::Tonic),
			"SUBDOMINANT" => Some(Role::Subdominant),
			"DOMINANT" => Some(Role::Dominant),
			_ => Some(Role::RomanNumeral(trimmed.to_string())),
		}
	}

	/// Whether this role marks the chord as functioning as a dominant,
	/// the condition the leading-tone resolution constraint gates on.
	pub fn is_dominant(&self) -> bool {
		match self {
			Role::Dominant => true,
			Role::RomanNumeral(s) => s.starts_with('V'),
			_ => false,
		}
	}
}

/// The working tone set built up while applying modifiers: root,
/// third, fifth, and an optional seventh, all as semitone offsets from
/// the root (0..12).
#[derive(Debug, Clone, Copy)]
struct ToneOffsets {
	third: u8,
	fifth: u8,
	seventh: Option<u8>,
}

impl Default for ToneOffsets {
	fn default() -> Self {
		ToneOffsets { third: 4, fifth: 7, seventh: None }
	}
}

impl ToneOffsets {
	fn apply(&mut self, modifier: Modifier) {
		match modifier {
			Modifier::Major => {
				self.third = 4;
				self.fifth = 7;
			}
			Modifier::Minor => self.third = 3,
			Modifier::Maj7 => self.seventh = Some(11),
			Modifier::Min7 => {
				self.third = 3;
				self.seventh = Some(10);
			}
			Modifier::Dominant7 => self.seventh = Some(10),
			Modifier::HalfDim => {
				self.third = 3;
				self.fifth = 6;
				self.seventh = Some(10);
			}
			Modifier::Dim => {
				self.third = 3;
				self.fifth = 6;
			}
			Modifier::Dim7 => {
				self.third = 3;
				self.fifth = 6;
				self.seventh = Some(9);
			}
		}
	}
}

/// A chord occurring at a given time step in a harmonization problem.
#[derive(Debug, Clone)]
pub struct Chord {
	/// Root pitch class, 0..12.
	pub root: u8,
	/// Modifier tokens, applied left-to-right to the default major
	/// triad. A literal `Dim` together with `Dominant7` is normalized
	/// to a single `Dim7` before anything else is applied, so that a
	/// "diminished seventh" spelled as two separate tokens lands on the
	/// fully-diminished seventh chord rather than the half-diminished
	/// one that applying them in sequence would otherwise produce.
	pub modifiers: Vec<Modifier>,
	/// Position in the chord sequence, used to order and later renumber
	/// the problem's time steps.
	pub time: i64,
	/// Slash-chord bass pitch class, if the bass voice is pinned to
	/// something other than the chord root.
	pub bass_note: Option<u8>,
	pub role: Option<Role>,
}

impl Chord {
	pub fn new(
		root: u8,
		modifiers: Vec<Modifier>,
		time: i64,
		bass_note: Option<u8>,
		role: Option<Role>,
	) -> Result<Chord> {
		if root >= 12 {
			return Err(HarmonyError::BadChordSpec(format!(
				"root pitch class {root} out of range 0..12"
			)));
		}
		if let Some(bass) = bass_note {
			if bass >= 12 {
				return Err(HarmonyError::BadChordSpec(format!(
					"bass pitch class {bass} out of range 0..12"
				)));
			}
		}
		Ok(Chord { root, modifiers, time, bass_note, role })
	}

	/// Parse a chord from a root pitch name and a space/plus-separated
	/// list of modifier tokens, e.g. `Chord::parse("G", "7", 0, None, None)`.
	pub fn parse(
		root_name: &str,
		modifiers: &str,
		time: i64,
		bass_name: Option<&str>,
		role_token: Option<&str>,
	) -> Result<Chord> {
		let root = pitch_class_of(root_name)?;
		let mods = modifiers
			.split(|c: char| c == '+' || c.is_whitespace())
			.filter(|s| !s.is_empty())
			.map(Modifier::parse)
			.collect::<Result<Vec<_>>>()?;
		let bass_note = bass_name.map(pitch_class_of).transpose()?;
		let role = role_token.and_then(Role::parse);
		Chord::new(root, mods, time, bass_note, role)
	}

	fn offsets(&self) -> ToneOffsets {
		let mut mods = self.modifiers.clone();
		normalize_dim7(&mut mods);
		let mut offsets = ToneOffsets::default();
		for m in mods {
			offsets.apply(m);
		}
		offsets
	}

	/// All distinct chord-tone pitch classes: root, third, fifth, and
	/// (if present) seventh.
	pub fn chord_tones(&self) -> BTreeSet<u8> {
		let offsets = self.offsets();
		let mut tones = BTreeSet::new();
		tones.insert(self.root);
		tones.insert((self.root + offsets.third) % 12);
		tones.insert((self.root + offsets.fifth) % 12);
		if let Some(seventh) = offsets.seventh {
			tones.insert((self.root + seventh) % 12);
		}
		tones
	}

	pub fn third(&self) -> u8 {
		(self.root + self.offsets().third) % 12
	}

	pub fn fifth(&self) -> u8 {
		(self.root + self.offsets().fifth) % 12
	}

	pub fn seventh(&self) -> Option<u8> {
		self.offsets().seventh.map(|s| (self.root + s) % 12)
	}

	pub fn bass_pitch_class(&self) -> u8 {
		self.bass_note.unwrap_or(self.root)
	}

	/// The chord's leading-tone pitch class: its own major third. Only
	/// meaningful when the chord functions as a dominant.
	pub fn leading_tone(&self) -> u8 {
		(self.root + 4) % 12
	}

	pub fn is_dominant(&self) -> bool {
		self.role.as_ref().is_some_and(Role::is_dominant)
	}

	/// Any diminished variant: half-diminished, diminished, or
	/// fully-diminished-seventh.
	pub fn is_dim(&self) -> bool {
		let mut mods = self.modifiers.clone();
		normalize_dim7(&mut mods);
		mods.iter().any(|m| matches!(m, Modifier::Dim | Modifier::Dim7 | Modifier::HalfDim))
	}

	/// Fully-diminished (diminished triad with a diminished seventh).
	pub fn is_dim_full(&self) -> bool {
		let mut mods = self.modifiers.clone();
		normalize_dim7(&mut mods);
		mods.iter().any(|m| matches!(m, Modifier::Dim7))
	}

	/// Half-diminished (diminished triad with a minor seventh).
	pub fn is_dim_half(&self) -> bool {
		let mut mods = self.modifiers.clone();
		normalize_dim7(&mut mods);
		mods.iter().any(|m| matches!(m, Modifier::HalfDim))
	}
}

impl std::fmt::Display for Chord {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", crate::pitch::pitch_class_name(self.root))?;
		for m in &self.modifiers {
			write!(f, " {}", m.canonical_token())?;
		}
		if let Some(bass) = self.bass_note {
			write!(f, "/{}", crate::pitch::pitch_class_name(bass))?;
		}
		Ok(())
	}
}

fn normalize_dim7(mods: &mut Vec<Modifier>) {
	let has_dim = mods.iter().any(|m| matches!(m, Modifier::Dim));
	let has_seventh = mods.iter().any(|m| matches!(m, Modifier::Dominant7));
	if has_dim && has_seventh {
		mods.retain(|m| !matches!(m, Modifier::Dim | Modifier::Dominant7));
		mods.push(Modifier::Dim7);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn major_triad_is_the_default() {
		let c = Chord::parse("C", "", 0, None, None).unwrap();
		assert_eq!(c.chord_tones(), BTreeSet::from([0, 4, 7]));
	}

	#[test]
	fn dominant_seventh_tones() {
		let g7 = Chord::parse("G", "7", 0, None, None).unwrap();
		assert_eq!(g7.chord_tones(), BTreeSet::from([7, 11, 2, 5]));
		assert_eq!(g7.seventh(), Some(5));
	}

	#[test]
	fn half_diminished_tones() {
		let bhalfdim = Chord::parse("B", "half-dim", 0, None, None).unwrap();
		// B half-diminished: B D F A
		assert_eq!(bhalfdim.chord_tones(), BTreeSet::from([11, 2, 5, 9]));
	}

	#[test]
	fn dim_plus_seven_normalizes_to_dim7() {
		let a = Chord::parse("C", "dim 7", 0, None, None).unwrap();
		let b = Chord::parse("C", "dim7", 0, None, None).unwrap();
		assert_eq!(a.chord_tones(), b.chord_tones());
		assert!(a.is_dim_full());
	}

	#[test]
	fn half_diminished_is_dim_but_not_dim_full() {
		let bhalfdim = Chord::parse("B", "half-dim", 0, None, None).unwrap();
		assert!(bhalfdim.is_dim());
		assert!(bhalfdim.is_dim_half());
		assert!(!bhalfdim.is_dim_full());

		let bdim7 = Chord::parse("B", "dim7", 0, None, None).unwrap();
		assert!(bdim7.is_dim_full());
		assert!(!bdim7.is_dim_half());
	}

	#[test]
	fn chord_displays_root_modifiers_and_bass() {
		let g7_over_b = Chord::parse("G", "7", 0, Some("B"), None).unwrap();
		assert_eq!(g7_over_b.to_string(), "G 7/B");
	}

	#[test]
	fn slash_chord_bass_overrides_root() {
		let c_over_e = Chord::parse("C", "", 0, Some("E"), None).unwrap();
		assert_eq!(c_over_e.bass_pitch_class(), 4);
	}

	#[test]
	fn roman_numeral_v_is_dominant() {
		let v7 = Chord::parse("G", "7", 0, None, Some("V7")).unwrap();
		assert!(v7.is_dominant());
		let ii = Chord::parse("D", "min", 0, None, Some("ii")).unwrap();
		assert!(!ii.is_dominant());
	}

	#[test]
	fn lowercase_m_is_minor_uppercase_is_major() {
		assert_eq!(Modifier::parse("m").unwrap(), Modifier::Minor);
		assert_eq!(Modifier::parse("M").unwrap(), Modifier::Major);
	}

	#[test]
	fn unknown_modifier_is_an_error() {
		assert!(Modifier::parse("blorp").is_err());
	}

	#[test]
	fn unknown_modifier_error_lists_recognized_tokens() {
		let err = Modifier::parse("blorp").unwrap_err().to_string();
		assert!(err.contains("dim7"));
		assert!(err.contains("half-dim"));
	}
}
