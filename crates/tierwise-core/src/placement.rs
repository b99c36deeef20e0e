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

//! Placement exam scoring.
//!
//! Scoring and curriculum lookup are kept apart: the tier and skill scores
//! depend only on the responses, and the curriculum is consulted once at the
//! end to turn the recommended tier into a concrete starting lesson.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::curriculum::Curriculum;
use crate::curriculum::StartingPoint;
use crate::curriculum::starting_point;
use crate::error::Fallible;
use crate::error::fail;
use crate::types::skill::Skill;
use crate::types::tier::Tier;

fn default_weight() -> f64 {
    1.0
}

/// One graded exam question.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredResponse {
    pub tier: Tier,
    pub skill: Skill,
    /// Normalized correctness in `[0, 1]`.
    pub correctness: f64,
    /// Difficulty weight, assigned by whoever wrote the exam.
    #[serde(default = "default_weight")]
    pub weight: f64,
}

impl ScoredResponse {
    pub fn new(tier: Tier, skill: Skill, correctness: f64) -> Self {
        Self {
            tier,
            skill,
            correctness,
            weight: default_weight(),
        }
    }

    pub fn weighted(self, weight: f64) -> Self {
        Self { weight, ..self }
    }

    fn validate(&self) -> Fallible<()> {
        if !self.correctness.is_finite() || !(0.0..=1.0).contains(&self.correctness) {
            return fail(format!(
                "correctness must be between 0 and 1, got {} ({} {})",
                self.correctness, self.tier, self.skill
            ));
        }
        if !self.weight.is_finite() || self.weight <= 0.0 {
            return fail(format!(
                "response weight must be positive, got {} ({} {})",
                self.weight, self.tier, self.skill
            ));
        }
        Ok(())
    }
}

/// Scoring parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Minimum per-tier score to count as mastered. The bound is inclusive:
    /// a tier scoring exactly this much is mastered.
    pub mastery_cutoff: f64,
    /// Number of responses at which the volume part of the confidence
    /// reaches ~63% of its maximum.
    pub confidence_volume_scale: f64,
    /// How many skills to list as strengths, and as weaknesses.
    pub breakdown_size: usize,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            mastery_cutoff: 0.7,
            confidence_volume_scale: 5.0,
            breakdown_size: 2,
        }
    }
}

impl PlacementConfig {
    pub fn validate(&self) -> Fallible<()> {
        if !self.mastery_cutoff.is_finite() || !(0.0..=1.0).contains(&self.mastery_cutoff) {
            return fail(format!(
                "mastery cutoff must be between 0 and 1, got {}",
                self.mastery_cutoff
            ));
        }
        if !self.confidence_volume_scale.is_finite() || self.confidence_volume_scale <= 0.0 {
            return fail(format!(
                "confidence volume scale must be positive, got {}",
                self.confidence_volume_scale
            ));
        }
        Ok(())
    }
}

/// The outcome of one placement attempt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlacementResult {
    pub per_tier_scores: BTreeMap<Tier, f64>,
    pub per_skill_scores: BTreeMap<Skill, f64>,
    pub recommended_tier: Tier,
    pub recommended_unit: u32,
    pub recommended_lesson: u32,
    /// Lessons of the recommended tier placed behind the learner.
    pub lessons_skipped: u32,
    /// Certainty of the recommendation, from 0 to 100.
    pub confidence_score: f64,
    pub strengths: Vec<Skill>,
    pub weaknesses: Vec<Skill>,
}

impl PlacementResult {
    /// The result when there is nothing to go on: the very beginning of the
    /// lowest tier, with no confidence.
    pub fn beginner() -> Self {
        Self::with_entry(
            Tier::lowest(),
            StartingPoint::BEGINNING,
            BTreeMap::new(),
            BTreeMap::new(),
            0.0,
        )
    }

    fn with_entry(
        tier: Tier,
        entry: StartingPoint,
        per_tier_scores: BTreeMap<Tier, f64>,
        per_skill_scores: BTreeMap<Skill, f64>,
        confidence_score: f64,
    ) -> Self {
        Self {
            per_tier_scores,
            per_skill_scores,
            recommended_tier: tier,
            recommended_unit: entry.unit,
            recommended_lesson: entry.lesson,
            lessons_skipped: entry.lessons_before,
            confidence_score,
            strengths: Vec::new(),
            weaknesses: Vec::new(),
        }
    }
}

/// Running weighted mean.
#[derive(Clone, Copy, Debug, Default)]
struct Tally {
    weighted_sum: f64,
    total_weight: f64,
    count: usize,
}

impl Tally {
    fn add(&mut self, response: &ScoredResponse) {
        self.weighted_sum += response.correctness * response.weight;
        self.total_weight += response.weight;
        self.count += 1;
    }

    fn mean(&self) -> f64 {
        if self.total_weight > 0.0 {
            (self.weighted_sum / self.total_weight).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

pub struct PlacementScorer<C> {
    config: PlacementConfig,
    curriculum: C,
}

impl<C: Curriculum> PlacementScorer<C> {
    pub fn new(config: PlacementConfig, curriculum: C) -> Fallible<Self> {
        config.validate()?;
        Ok(Self { config, curriculum })
    }

    pub fn curriculum(&self) -> &C {
        &self.curriculum
    }

    /// Score an exam and recommend where the learner should start.
    ///
    /// An empty exam is not an error: it places the learner at the start of
    /// the lowest tier with zero confidence.
    pub fn score(&self, responses: &[ScoredResponse]) -> Fallible<PlacementResult> {
        for response in responses {
            response.validate()?;
        }
        if responses.is_empty() {
            log::debug!("Empty placement exam; starting from the beginning");
            return Ok(PlacementResult::beginner());
        }

        let mut tiers: BTreeMap<Tier, Tally> = BTreeMap::new();
        let mut skills: BTreeMap<Skill, Tally> = BTreeMap::new();
        for response in responses {
            tiers.entry(response.tier).or_default().add(response);
            skills.entry(response.skill).or_default().add(response);
        }
        let per_tier_scores: BTreeMap<Tier, f64> =
            tiers.iter().map(|(tier, t)| (*tier, t.mean())).collect();
        let per_skill_scores: BTreeMap<Skill, f64> =
            skills.iter().map(|(skill, t)| (*skill, t.mean())).collect();

        let cutoff = self.config.mastery_cutoff;
        let mastered: Option<Tier> = highest_mastered(&per_tier_scores, cutoff);
        let (tier, position) = match mastered {
            Some(tier) => (tier, pass_margin(per_tier_scores[&tier], cutoff)),
            None => (Tier::lowest(), 0.0),
        };

        // The deciding tier's evidence: its score relative to the cutoff and
        // how many questions it rests on.
        let deciding: Tally = tiers.get(&tier).copied().unwrap_or_default();
        let margin = match mastered {
            Some(_) => position,
            None => fail_margin(deciding.mean(), cutoff),
        };
        let confidence_score = if deciding.count == 0 {
            0.0
        } else {
            confidence(margin, deciding.count, self.config.confidence_volume_scale)
        };

        let entry = starting_point(&self.curriculum, tier, position);
        let (strengths, weaknesses) = breakdown(&per_skill_scores, self.config.breakdown_size);
        log::debug!(
            "Placement: tier={tier} unit={} lesson={} confidence={confidence_score:.1}",
            entry.unit,
            entry.lesson
        );
        Ok(PlacementResult {
            strengths,
            weaknesses,
            ..PlacementResult::with_entry(
                tier,
                entry,
                per_tier_scores,
                per_skill_scores,
                confidence_score,
            )
        })
    }
}

/// Walk the tiers easiest first and return the last one mastered before the
/// first gap. A tier with no responses counts as a gap.
fn highest_mastered(scores: &BTreeMap<Tier, f64>, cutoff: f64) -> Option<Tier> {
    let mut mastered = None;
    for tier in Tier::ALL {
        match scores.get(&tier) {
            Some(score) if *score >= cutoff => mastered = Some(tier),
            _ => break,
        }
    }
    mastered
}

/// How far above the cutoff a passing score sits, scaled to `[0, 1]`.
fn pass_margin(score: f64, cutoff: f64) -> f64 {
    let room = 1.0 - cutoff;
    if room <= 0.0 {
        return 1.0;
    }
    ((score - cutoff) / room).clamp(0.0, 1.0)
}

/// How far below the cutoff a failing score sits, scaled to `[0, 1]`.
fn fail_margin(score: f64, cutoff: f64) -> f64 {
    if cutoff <= 0.0 {
        return 0.0;
    }
    ((cutoff - score) / cutoff).clamp(0.0, 1.0)
}

/// Confidence from 0 to 100, non-decreasing in both the margin and the
/// number of responses. The volume term approaches 1 asymptotically.
pub fn confidence(margin: f64, responses: usize, volume_scale: f64) -> f64 {
    let volume = 1.0 - f64::exp(-(responses as f64) / volume_scale);
    let margin = 0.5 + 0.5 * margin.clamp(0.0, 1.0);
    (100.0 * volume * margin).clamp(0.0, 100.0)
}

/// The `n` best and `n` worst skills. Ties go to the skill declared first,
/// and a skill is never listed as both.
fn breakdown(scores: &BTreeMap<Skill, f64>, n: usize) -> (Vec<Skill>, Vec<Skill>) {
    // BTreeMap iteration is in declaration order and the sorts are stable.
    let mut descending: Vec<(Skill, f64)> = scores.iter().map(|(s, v)| (*s, *v)).collect();
    let mut ascending = descending.clone();
    descending.sort_by(|a, b| b.1.total_cmp(&a.1));
    ascending.sort_by(|a, b| a.1.total_cmp(&b.1));

    let strengths: Vec<Skill> = descending.iter().take(n).map(|(s, _)| *s).collect();
    let weaknesses: Vec<Skill> = ascending
        .iter()
        .map(|(s, _)| *s)
        .filter(|s| !strengths.contains(s))
        .take(n)
        .collect();
    (strengths, weaknesses)
}
