//! Harmony Core - a four-part vocal harmonization solver
//!
//! This crate provides:
//! - Pitch algebra and chord-tone derivation ([`pitch`], [`chord`])
//! - The singable ranges of the four vocal parts ([`voice`])
//! - A generic finite-domain constraint satisfaction engine ([`csp`])
//! - The catalogue of voice-leading rules a solved harmonization must
//!   obey ([`constraints`])
//! - A builder that turns a chord sequence into a solvable [`csp::Problem`]
//!   ([`problem`])
//! - A pluggable scoring hook for ranking multiple solutions ([`score`])
//! - A text format for describing harmonization problems ([`problemfile`])
//!
//! # Examples
//!
//! ```
//! use harmony_core::chord::Chord;
//! use harmony_core::problem::{ProblemOptions, build_problem};
//!
//! let chords = vec![
//!     Chord::parse("C", "", 0, None, None).unwrap(),
//!     Chord::parse("G", "7", 1, None, Some("V7")).unwrap(),
//!     Chord::parse("C", "", 2, None, None).unwrap(),
//! ];
//! let problem = build_problem(&chords, &[], &ProblemOptions::default()).unwrap();
//! let solution = problem.solutions().next();
//! assert!(solution.is_some());
//! ```

pub mod chord;
pub mod constraints;
pub mod csp;
pub mod pitch;
pub mod problem;
pub mod problemfile;
pub mod score;
pub mod voice;

pub use chord::{Chord, Modifier, Role};
pub use csp::{Halt, VarId};
pub use problem::{ProblemOptions, build_problem};
pub use voice::Voice;

/// Error types for the harmony-core library.
pub mod error {
	use thiserror::Error;

	#[derive(Error, Debug)]
	pub enum HarmonyError {
		#[error("bad pitch name: {0}")]
		BadPitchName(String),

		#[error("bad chord spec: {0}")]
		BadChordSpec(String),

		#[error("duplicate variable: {0}")]
		DuplicateVariable(String),

		#[error("unknown variable: {0}")]
		UnknownVariable(String),
	}

	pub type Result<T> = std::result::Result<T, HarmonyError>;
}

pub use error::{HarmonyError, Result};
