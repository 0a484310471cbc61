//! WASM bindings for the harmony voice-leading solver.
//!
//! This crate exposes a single JSON-in/JSON-out entry point so a web
//! frontend can submit a chord sequence and receive back a batch of
//! solved harmonizations without linking against the Rust types
//! directly.

use harmony_core::chord::{Chord, Modifier, Role};
use harmony_core::pitch::pitch_number_name;
use harmony_core::problem::{FixedPitch, ProblemOptions, build_problem};
use harmony_core::voice::Voice;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
	console_error_panic_hook::set_once();
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsChord {
	pub root: String,
	#[serde(default)]
	pub modifiers: Vec<String>,
	pub time: i64,
	#[serde(default)]
	pub bass_note: Option<String>,
	#[serde(default)]
	pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsFixedPitch {
	pub voice: String,
	pub position: usize,
	pub pitch_number: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsSolveRequest {
	pub chords: Vec<JsChord>,
	#[serde(default)]
	pub fixed: Vec<JsFixedPitch>,
	/// Maximum number of solutions to return. Defaults to 1.
	#[serde(default = "default_limit")]
	pub limit: usize,
	/// Whether a chord's seventh must be present in exactly one voice.
	/// Defaults to `true`.
	#[serde(default = "default_true")]
	pub strict_seventh_doubling: bool,
}

fn default_limit() -> usize {
	1
}

fn default_true() -> bool {
	true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsVoicing {
	pub voice: String,
	pub pitch_name: String,
	pub octave: i32,
	pub pitch_number: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsChordBlock {
	pub time: usize,
	pub voices: Vec<JsVoicing>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsSolveResponse {
	pub solutions: Vec<Vec<JsChordBlock>>,
}

fn parse_voice(token: &str) -> Result<Voice, String> {
	match token.to_ascii_uppercase().as_str() {
		"S" | "SOPRANO" => Ok(Voice::Soprano),
		"A" | "ALTO" => Ok(Voice::Alto),
		"T" | "TENOR" => Ok(Voice::Tenor),
		"B" | "BASS" => Ok(Voice::Bass),
		other => Err(format!("unknown voice '{other}'")),
	}
}

fn js_chord_to_chord(js: &JsChord) -> Result<Chord, String> {
	let modifiers = js
		.modifiers
		.iter()
		.map(|m| Modifier::parse(m).map_err(|e| e.to_string()))
		.collect::<Result<Vec<_>, _>>()?;
	let root = harmony_core::pitch::pitch_class_of(&js.root).map_err(|e| e.to_string())?;
	let bass_note = js
		.bass_note
		.as_deref()
		.map(harmony_core::pitch::pitch_class_of)
		.transpose()
		.map_err(|e| e.to_string())?;
	let role = js.role.as_deref().and_then(Role::parse);
	Chord::new(root, modifiers, js.time, bass_note, role).map_err(|e| e.to_string())
}

/// Solve a chord sequence, returning up to `request.limit` solutions
/// as JSON.
#[wasm_bindgen(js_name = solve)]
pub fn solve(request: JsValue) -> Result<JsValue, JsValue> {
	let request: JsSolveRequest = serde_wasm_bindgen::from_value(request)
		.map_err(|e| JsValue::from_str(&format!("invalid request: {e}")))?;

	let chords = request
		.chords
		.iter()
		.map(js_chord_to_chord)
		.collect::<Result<Vec<_>, _>>()
		.map_err(|e| JsValue::from_str(&e))?;

	let fixed = request
		.fixed
		.iter()
		.map(|f| -> Result<FixedPitch, String> {
			Ok(FixedPitch {
				voice: parse_voice(&f.voice)?,
				position: f.position,
				pitch_number: f.pitch_number,
			})
		})
		.collect::<Result<Vec<_>, _>>()
		.map_err(|e| JsValue::from_str(&e))?;

	let options = ProblemOptions { strict_seventh_doubling: request.strict_seventh_doubling };
	let problem = build_problem(&chords, &fixed, &options)
		.map_err(|e| JsValue::from_str(&format!("could not build problem: {e}")))?;

	let mut sorted_chords = chords.clone();
	sorted_chords.sort_by_key(|c| c.time);
	let time_count = sorted_chords.len();

	let solutions: Vec<Vec<JsChordBlock>> = problem
		.solutions()
		.take(request.limit)
		.map(|assignment| {
			(0..time_count)
				.map(|t| {
					let voices = Voice::ALL
						.iter()
						.map(|&voice| {
							let pitch_number =
								assignment[&harmony_core::VarId::new(voice, t)];
							let (pitch_name, octave) = pitch_number_name(pitch_number);
							JsVoicing {
								voice: voice.to_string(),
								pitch_name: pitch_name.to_string(),
								octave,
								pitch_number,
							}
						})
						.collect();
					JsChordBlock { time: t, voices }
				})
				.collect()
		})
		.collect();

	serde_wasm_bindgen::to_value(&JsSolveResponse { solutions })
		.map_err(|e| JsValue::from_str(&format!("serialization error: {e}")))
}

#[cfg(test)]
mod tests {
	use super::*;
	use wasm_bindgen_test::*;

	#[wasm_bindgen_test]
	fn solves_a_single_chord() {
		let request = JsSolveRequest {
			chords: vec![JsChord {
				root: "C".to_string(),
				modifiers: vec![],
				time: 0,
				bass_note: None,
				role: None,
			}],
			fixed: vec![],
			limit: 1,
			strict_seventh_doubling: true,
		};
		let js_request = serde_wasm_bindgen::to_value(&request).unwrap();
		let result = solve(js_request);
		assert!(result.is_ok());

		let response: JsSolveResponse = serde_wasm_bindgen::from_value(result.unwrap()).unwrap();
		assert_eq!(response.solutions.len(), 1);
		assert_eq!(response.solutions[0].len(), 1);
		assert_eq!(response.solutions[0][0].voices.len(), 4);
	}
}
