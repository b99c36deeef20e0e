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

//! tierwise-core: the decision core of the tierwise learning platform.
//!
//! Everything in here is pure: callers hand in a snapshot of prior state and
//! get a new snapshot back, and persisting it is their business.
//! - SM-2 review scheduling
//! - CEFR tier progression
//! - Placement exam scoring and curriculum entry points
//! - A bounded TTL cache for callers that keep state in memory

pub mod cache;
pub mod config;
pub mod curriculum;
pub mod error;
pub mod placement;
pub mod progression;
pub mod scheduler;
pub mod types;

// Re-exports for convenience
pub use cache::TtlCache;
pub use config::Config;
pub use curriculum::{Curriculum, StartingPoint, StaticCurriculum, starting_point};
pub use error::{ErrorReport, Fallible, fail};
pub use placement::{PlacementResult, PlacementScorer, ScoredResponse};
pub use progression::{ProgressionDecision, ProgressionSnapshot, advance, evaluate};
pub use scheduler::{ReviewState, ReviewedItem, record_review, schedule};
pub use types::grade::Grade;
pub use types::skill::Skill;
pub use types::tier::Tier;
pub use types::timestamp::Timestamp;
