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

use serde::Serialize;
use tierwise_core::Config;
use tierwise_core::Fallible;
use tierwise_core::ProgressionDecision;
use tierwise_core::ProgressionSnapshot;
use tierwise_core::Tier;
use tierwise_core::advance;
use tierwise_core::curriculum::Curriculum;
use tierwise_core::evaluate;

use crate::db::Database;

/// The learner's current snapshot. Learners without one start at the lowest
/// tier. The tier size always comes from the current curriculum.
pub fn current_progress<C: Curriculum>(
    db: &Database,
    learner: &str,
    curriculum: &C,
) -> Fallible<ProgressionSnapshot> {
    let snapshot = match db.get_progression(learner)? {
        Some(snapshot) => ProgressionSnapshot {
            total_lessons_in_tier: curriculum.lessons_in_tier(snapshot.tier),
            ..snapshot
        },
        None => ProgressionSnapshot::start(Tier::lowest(), curriculum),
    };
    Ok(snapshot)
}

#[derive(Debug, Serialize)]
pub struct LessonOutcome {
    /// Progress including the lesson just completed.
    pub completed: ProgressionSnapshot,
    pub decision: ProgressionDecision,
    /// Progress after acting on the decision.
    pub current: ProgressionSnapshot,
}

pub fn complete_lesson(db: &mut Database, learner: &str, config: &Config) -> Fallible<LessonOutcome> {
    let completed = current_progress(db, learner, &config.curriculum)?.record_lesson();
    let decision = evaluate(&completed, config.progression.advancement_threshold)?;
    let current = advance(completed, &decision, &config.curriculum);
    db.save_progression(learner, &current)?;
    if decision.should_advance {
        log::info!("{learner} advanced from {} to {}", completed.tier, current.tier);
    } else {
        log::info!(
            "{learner} completed {}/{} lessons of {}",
            completed.lessons_completed,
            completed.total_lessons_in_tier,
            completed.tier
        );
    }
    Ok(LessonOutcome {
        completed,
        decision,
        current,
    })
}
