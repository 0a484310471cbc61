//! A pluggable scoring hook for ranking solved harmonizations.
//!
//! The solving engine itself is agnostic to quality: it enumerates
//! every assignment that satisfies the constraint catalogue, in no
//! particular preference order. Picking the "best" one among several
//! valid solutions is a separate, swappable concern, the same way
//! fingering generation and transition scoring were kept apart as
//! separate passes over a shared candidate set.

use std::collections::HashMap;

use crate::csp::VarId;

/// Something that assigns a numeric quality score to a complete
/// harmonization. Higher is better; there is no fixed scale, callers
/// comparing scores should only ever compare scores produced by the
/// same `Scorer`.
pub trait Scorer {
	fn score(&self, solution: &HashMap<VarId, i32>) -> i64;

	/// Pick the highest-scoring solution out of a lazy stream, short
	/// of exhausting it entirely by caller-chosen cutoff. `limit` bounds
	/// how many candidates are drawn from `solutions` before picking a
	/// winner, since the solution stream can be unbounded.
	fn best<I>(&self, solutions: I, limit: usize) -> Option<HashMap<VarId, i32>>
	where
		I: Iterator<Item = HashMap<VarId, i32>>,
	{
		solutions
			.take(limit)
			.max_by_key(|solution| self.score(solution))
	}
}

#[cfg(feature = "default-scorer")]
pub use default_scorer::DefaultScorer;

#[cfg(feature = "default-scorer")]
mod default_scorer {
	use super::*;
	use crate::voice::Voice;

	/// Motion between successive chords for one voice beyond a step is
	/// penalized; voices sitting in the middle of their range are
	/// rewarded slightly over ones crowding a range boundary.
	const LEAP_PENALTY: i64 = 2;
	const RANGE_EDGE_PENALTY: i64 = 1;

	/// A minimal built-in scorer: prefers small melodic motion and
	/// pitches away from the edges of each voice's range. It exists so
	/// the crate is usable end-to-end without a caller-supplied
	/// grading heuristic, not as a serious model of voice-leading
	/// elegance.
	#[derive(Debug, Default, Clone, Copy)]
	pub struct DefaultScorer;

	impl Scorer for DefaultScorer {
		fn score(&self, solution: &HashMap<VarId, i32>) -> i64 {
			let max_time = solution.keys().map(|v| v.time).max().unwrap_or(0);
			let mut total = 0i64;

			for voice in Voice::ALL {
				let range = voice.range();
				for time in 0..=max_time {
					let Some(&pitch) = solution.get(&VarId::new(voice, time)) else { continue };
					let edge_distance =
						(pitch - range.start()).min(range.end() - pitch) as i64;
					total -= RANGE_EDGE_PENALTY * (1 - edge_distance.min(1));

					if time > 0 {
						if let Some(&prev) = solution.get(&VarId::new(voice, time - 1)) {
							let motion = (pitch - prev).unsigned_abs() as i64;
							if motion > 2 {
								total -= LEAP_PENALTY * (motion - 2);
							}
						}
					}
				}
			}

			total
		}
	}

	#[cfg(test)]
	mod tests {
		use super::*;

		#[test]
		fn penalizes_leaps_more_than_steps() {
			let scorer = DefaultScorer;
			let stepwise = HashMap::from([
				(VarId::new(Voice::Soprano, 0), 72),
				(VarId::new(Voice::Soprano, 1), 74),
			]);
			let leaping = HashMap::from([
				(VarId::new(Voice::Soprano, 0), 72),
				(VarId::new(Voice::Soprano, 1), 81),
			]);
			assert!(scorer.score(&stepwise) > scorer.score(&leaping));
		}

		#[test]
		fn best_picks_the_highest_scoring_candidate() {
			let scorer = DefaultScorer;
			let a = HashMap::from([
				(VarId::new(Voice::Soprano, 0), 72),
				(VarId::new(Voice::Soprano, 1), 81),
			]);
			let b = HashMap::from([
				(VarId::new(Voice::Soprano, 0), 72),
				(VarId::new(Voice::Soprano, 1), 74),
			]);
			let winner = scorer.best(vec![a.clone(), b.clone()].into_iter(), 10).unwrap();
			assert_eq!(winner, b);
		}
	}
}
