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

use std::fs::read_to_string;

use tierwise_core::Config;
use tierwise_core::ErrorReport;
use tierwise_core::Fallible;
use tierwise_core::PlacementResult;
use tierwise_core::PlacementScorer;
use tierwise_core::ProgressionSnapshot;
use tierwise_core::ScoredResponse;
use tierwise_core::Timestamp;
use tierwise_core::curriculum::Curriculum;

use crate::db::Database;

/// Read graded exam responses from a JSON array.
pub fn read_responses(path: &str) -> Fallible<Vec<ScoredResponse>> {
    let text = read_to_string(path)
        .map_err(|e| ErrorReport::new(format!("cannot read responses file '{path}': {e}")))?;
    let responses: Vec<ScoredResponse> = serde_json::from_str(&text)?;
    Ok(responses)
}

/// Score a placement exam, record the result, and start the learner's
/// progression at the recommended lesson.
pub fn place_learner(
    db: &mut Database,
    learner: &str,
    responses: &[ScoredResponse],
    config: &Config,
    now: Timestamp,
) -> Fallible<PlacementResult> {
    let scorer = PlacementScorer::new(config.placement, config.curriculum.clone())?;
    let result = scorer.score(responses)?;
    db.save_placement(learner, now, &result)?;
    let snapshot = ProgressionSnapshot {
        tier: result.recommended_tier,
        lessons_completed: result.lessons_skipped,
        total_lessons_in_tier: scorer.curriculum().lessons_in_tier(result.recommended_tier),
    };
    db.save_progression(learner, &snapshot)?;
    log::info!(
        "Placed {learner} at {} unit {} lesson {} ({} responses, confidence {:.1})",
        result.recommended_tier,
        result.recommended_unit,
        result.recommended_lesson,
        responses.len(),
        result.confidence_score
    );
    Ok(result)
}
