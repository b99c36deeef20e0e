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
use tierwise_core::Fallible;
use tierwise_core::Grade;
use tierwise_core::ReviewedItem;
use tierwise_core::Timestamp;
use tierwise_core::record_review;

use crate::db::Database;

#[derive(Debug, Serialize)]
pub struct ReviewReport {
    pub learner: String,
    pub item: String,
    pub grade: Grade,
    #[serde(flatten)]
    pub reviewed: ReviewedItem,
}

/// Grade one review of an item and persist the new schedule. Items seen for
/// the first time start from the default state.
pub fn review_item(
    db: &mut Database,
    learner: &str,
    item: &str,
    grade: Grade,
    now: Timestamp,
) -> Fallible<ReviewReport> {
    let state = db
        .get_review(learner, item, now)?
        .map(|prev| prev.state)
        .unwrap_or_default();
    let reviewed = record_review(state, grade, now);
    db.save_review(learner, item, &reviewed, now)?;
    log::info!(
        "Reviewed {item} for {learner}: grade {grade}, next review {}",
        reviewed.due_at
    );
    Ok(ReviewReport {
        learner: learner.to_string(),
        item: item.to_string(),
        grade,
        reviewed,
    })
}

#[derive(Debug, Serialize)]
pub struct DueItem {
    pub item: String,
    pub due_at: Timestamp,
    pub interval_days: u32,
}

pub fn list_due(db: &Database, learner: &str, now: Timestamp) -> Fallible<Vec<DueItem>> {
    let due = db
        .due_items(learner, now)?
        .into_iter()
        .map(|(item, reviewed)| DueItem {
            item,
            due_at: reviewed.due_at,
            interval_days: reviewed.state.interval_days,
        })
        .collect();
    Ok(due)
}
