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

//! Tier progression: deciding when a learner unlocks the next CEFR tier.

use serde::Deserialize;
use serde::Serialize;

use crate::curriculum::Curriculum;
use crate::error::Fallible;
use crate::error::fail;
use crate::types::tier::Tier;

/// A learner's progress through one tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionSnapshot {
    pub tier: Tier,
    pub lessons_completed: u32,
    pub total_lessons_in_tier: u32,
}

impl ProgressionSnapshot {
    /// A fresh snapshot at the start of `tier`.
    pub fn start<C: Curriculum + ?Sized>(tier: Tier, curriculum: &C) -> Self {
        Self {
            tier,
            lessons_completed: 0,
            total_lessons_in_tier: curriculum.lessons_in_tier(tier),
        }
    }

    /// Fraction of the tier completed, in `[0, 1]`. An empty tier reports 0.
    pub fn completion_percentage(&self) -> f64 {
        if self.total_lessons_in_tier == 0 {
            return 0.0;
        }
        let ratio = self.lessons_completed as f64 / self.total_lessons_in_tier as f64;
        ratio.min(1.0)
    }

    /// Count one more completed lesson. Completions never exceed the tier size.
    pub fn record_lesson(self) -> Self {
        Self {
            lessons_completed: self
                .lessons_completed
                .saturating_add(1)
                .min(self.total_lessons_in_tier),
            ..self
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionDecision {
    pub should_advance: bool,
    /// The tier after the snapshot's tier, whether or not it is unlocked yet.
    pub next_tier: Option<Tier>,
}

/// Decide whether the learner has done enough of their tier to move on.
///
/// The threshold is inclusive. A tier with no lessons never unlocks the next
/// one, and neither does the last tier.
///
/// An empty tier is not an error: it yields `should_advance = false` and a
/// warning in the log. Errors are reserved for a threshold outside `[0, 1]`
/// and for a snapshot claiming more completed lessons than its tier has.
pub fn evaluate(
    snapshot: &ProgressionSnapshot,
    advancement_threshold: f64,
) -> Fallible<ProgressionDecision> {
    if !advancement_threshold.is_finite() || !(0.0..=1.0).contains(&advancement_threshold) {
        return fail(format!(
            "advancement threshold must be between 0 and 1, got {advancement_threshold}"
        ));
    }
    if snapshot.lessons_completed > snapshot.total_lessons_in_tier {
        return fail(format!(
            "{} lessons completed but tier {} only has {}",
            snapshot.lessons_completed, snapshot.tier, snapshot.total_lessons_in_tier
        ));
    }
    let next_tier = snapshot.tier.next();
    if snapshot.total_lessons_in_tier == 0 {
        log::warn!(
            "No curriculum loaded for tier {}; advancement is blocked",
            snapshot.tier
        );
        return Ok(ProgressionDecision {
            should_advance: false,
            next_tier,
        });
    }
    let completed = snapshot.completion_percentage() >= advancement_threshold;
    let should_advance = completed && next_tier.is_some();
    log::debug!(
        "Tier {}: {}/{} lessons, threshold {advancement_threshold}, advance={should_advance}",
        snapshot.tier,
        snapshot.lessons_completed,
        snapshot.total_lessons_in_tier
    );
    Ok(ProgressionDecision {
        should_advance,
        next_tier,
    })
}

/// Apply a decision: start the next tier from zero if it was unlocked,
/// otherwise keep the snapshot as it is.
pub fn advance<C: Curriculum + ?Sized>(
    snapshot: ProgressionSnapshot,
    decision: &ProgressionDecision,
    curriculum: &C,
) -> ProgressionSnapshot {
    match (decision.should_advance, decision.next_tier) {
        (true, Some(next)) => ProgressionSnapshot::start(next, curriculum),
        _ => snapshot,
    }
}
