// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! SM-2 review scheduling.

use serde::Deserialize;
use serde::Serialize;

use crate::types::grade::Grade;
use crate::types::timestamp::Timestamp;

pub type Easiness = f64;

/// Easiness assigned on first exposure to an item.
pub const INITIAL_EASINESS: Easiness = 2.5;

/// Easiness never drops below this.
pub const MIN_EASINESS: Easiness = 1.3;

/// Interval after the first successful review, in days.
const FIRST_INTERVAL: u32 = 1;

/// Interval after the second consecutive successful review, in days.
const SECOND_INTERVAL: u32 = 6;

/// Interval after a failed review, in days.
const LAPSE_INTERVAL: u32 = 1;

/// Scheduling state for one (learner, item) pair.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewState {
    pub easiness: Easiness,
    /// Days until the next review.
    pub interval_days: u32,
    /// Consecutive successful reviews.
    pub repetitions: u32,
}

impl Default for ReviewState {
    fn default() -> Self {
        Self {
            easiness: INITIAL_EASINESS,
            interval_days: 0,
            repetitions: 0,
        }
    }
}

impl ReviewState {
    /// When the next review is due, given when this state was produced.
    /// Intervals that run past the year 9999 pin the due date there.
    pub fn next_due_at(&self, last_reviewed_at: Timestamp) -> Timestamp {
        last_reviewed_at.plus_days(self.interval_days)
    }
}

fn new_easiness(e: Easiness, grade: Grade) -> Easiness {
    let q = 5.0 - grade.value() as f64;
    f64::max(MIN_EASINESS, e + (0.1 - q * (0.08 + q * 0.02)))
}

/// Apply one graded review to a scheduling state.
///
/// A failed review (grade below 3) restarts the short cycle no matter how
/// long the item had been retained. Easiness is updated either way.
pub fn schedule(state: ReviewState, grade: Grade) -> ReviewState {
    let easiness = new_easiness(state.easiness, grade);
    if !grade.is_pass() {
        return ReviewState {
            easiness,
            interval_days: LAPSE_INTERVAL,
            repetitions: 0,
        };
    }
    let repetitions = state.repetitions.saturating_add(1);
    let interval_days = match repetitions {
        1 => FIRST_INTERVAL,
        2 => SECOND_INTERVAL,
        _ => {
            let grown = (state.interval_days as f64 * easiness).round();
            // `as` saturates on overflow.
            f64::max(grown, 1.0) as u32
        }
    };
    ReviewState {
        easiness,
        interval_days,
        repetitions,
    }
}

/// A scheduled item together with its review timestamps.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewedItem {
    pub state: ReviewState,
    pub last_reviewed_at: Timestamp,
    pub due_at: Timestamp,
}

impl ReviewedItem {
    pub fn is_due(&self, now: Timestamp) -> bool {
        self.due_at <= now
    }
}

pub fn record_review(state: ReviewState, grade: Grade, reviewed_at: Timestamp) -> ReviewedItem {
    let state = schedule(state, grade);
    log::debug!(
        "Scheduled review: grade={grade} easiness={:.3} interval={}d repetitions={}",
        state.easiness,
        state.interval_days,
        state.repetitions
    );
    ReviewedItem {
        state,
        last_reviewed_at: reviewed_at,
        due_at: state.next_due_at(reviewed_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Fallible;
    use crate::types::timestamp::ts;

    fn feq(a: f64, b: f64) -> bool {
        f64::abs(a - b) < 1e-9
    }

    fn grade(g: i64) -> Grade {
        Grade::try_from(g).unwrap()
    }

    /// A spread of states, including ones sitting on the easiness floor.
    fn sample_states() -> Vec<ReviewState> {
        let mut states = vec![ReviewState::default()];
        for easiness in [1.3, 1.5, 2.0, 2.5, 3.1] {
            for (interval_days, repetitions) in [(1, 1), (6, 2), (15, 3), (400, 9)] {
                states.push(ReviewState {
                    easiness,
                    interval_days,
                    repetitions,
                });
            }
        }
        states
    }

    #[test]
    fn test_default_state() {
        let s = ReviewState::default();
        assert_eq!(s.easiness, 2.5);
        assert_eq!(s.interval_days, 0);
        assert_eq!(s.repetitions, 0);
    }

    #[test]
    fn test_easiness_never_below_floor() {
        for s in sample_states() {
            for g in Grade::all() {
                assert!(schedule(s, g).easiness >= MIN_EASINESS);
            }
        }
    }

    #[test]
    fn test_repeated_failure_stays_on_floor() {
        let mut s = ReviewState::default();
        for _ in 0..20 {
            s = schedule(s, grade(0));
        }
        assert_eq!(s.easiness, MIN_EASINESS);
    }

    #[test]
    fn test_failure_resets() {
        for s in sample_states() {
            for g in 0..3 {
                let next = schedule(s, grade(g));
                assert_eq!(next.repetitions, 0);
                assert_eq!(next.interval_days, 1);
            }
        }
    }

    #[test]
    fn test_failure_still_updates_easiness() {
        let next = schedule(ReviewState::default(), grade(2));
        assert!(feq(next.easiness, 2.5 - 0.32));
    }

    #[test]
    fn test_easiness_curve() {
        let base = ReviewState::default();
        let expected = [-0.8, -0.54, -0.32, -0.14, 0.0, 0.1];
        for (g, delta) in Grade::all().zip(expected) {
            assert!(feq(schedule(base, g).easiness, 2.5 + delta));
        }
    }

    #[test]
    fn test_three_perfect_reviews() {
        let s1 = schedule(ReviewState::default(), Grade::PERFECT);
        assert_eq!((s1.interval_days, s1.repetitions), (1, 1));
        let s2 = schedule(s1, Grade::PERFECT);
        assert_eq!((s2.interval_days, s2.repetitions), (6, 2));
        let s3 = schedule(s2, Grade::PERFECT);
        assert_eq!(s3.repetitions, 3);
        assert_eq!(s3.interval_days, (6.0 * s3.easiness).round() as u32);
        assert!(s1.easiness < s2.easiness && s2.easiness < s3.easiness);
        assert!(s3.interval_days > 6);
        // 2.5 -> 2.6 -> 2.7 -> 2.8
        assert_eq!(s3.interval_days, 17);
    }

    #[test]
    fn test_grown_interval_uses_updated_easiness() {
        let s = ReviewState {
            easiness: 2.0,
            interval_days: 10,
            repetitions: 4,
        };
        // Grade 3: easiness 2.0 - 0.14 = 1.86, interval round(18.6) = 19.
        let next = schedule(s, grade(3));
        assert!(feq(next.easiness, 1.86));
        assert_eq!(next.interval_days, 19);
        assert_eq!(next.repetitions, 5);
    }

    #[test]
    fn test_success_never_produces_zero_interval() {
        for s in sample_states() {
            let mut s = s;
            for g in Grade::all() {
                s = schedule(s, g);
                if s.repetitions >= 1 {
                    assert!(s.interval_days >= 1);
                }
            }
        }
    }

    #[test]
    fn test_huge_interval_saturates() {
        let s = ReviewState {
            easiness: 3.0,
            interval_days: u32::MAX,
            repetitions: 40,
        };
        assert_eq!(schedule(s, Grade::PERFECT).interval_days, u32::MAX);
    }

    #[test]
    fn test_record_review_due_date() {
        let at = ts("2024-03-01T09:15:00.000");
        let item = record_review(ReviewState::default(), Grade::PERFECT, at);
        assert_eq!(item.last_reviewed_at, at);
        assert_eq!(item.due_at, ts("2024-03-02T09:15:00.000"));
        assert!(!item.is_due(at));
        assert!(item.is_due(item.due_at));
    }

    #[test]
    fn test_long_perfect_streak_pins_due_date() {
        let mut at = ts("2024-01-01T00:00:00.000");
        let mut state = ReviewState::default();
        for _ in 0..40 {
            let item = record_review(state, Grade::PERFECT, at);
            assert!(item.due_at > at || item.due_at == Timestamp::latest());
            assert!(item.due_at <= Timestamp::latest());
            state = item.state;
            at = item.due_at;
        }
        assert_eq!(at, Timestamp::latest());
        assert_eq!(state.repetitions, 40);
    }

    #[test]
    fn test_record_review_with_saturated_interval() {
        let s = ReviewState {
            easiness: 3.0,
            interval_days: u32::MAX,
            repetitions: 40,
        };
        let item = record_review(s, Grade::PERFECT, ts("2024-01-01T00:00:00.000"));
        assert_eq!(item.state.interval_days, u32::MAX);
        assert_eq!(item.due_at, Timestamp::latest());
    }

    #[test]
    fn test_json_roundtrip_gives_identical_schedule() -> Fallible<()> {
        let mut s = ReviewState::default();
        for g in [5, 4, 3, 5, 2, 4, 5] {
            let json = serde_json::to_string(&s)?;
            let restored: ReviewState = serde_json::from_str(&json)?;
            assert_eq!(restored, s);
            let direct = schedule(s, grade(g));
            assert_eq!(schedule(restored, grade(g)), direct);
            s = direct;
        }
        Ok(())
    }
}
