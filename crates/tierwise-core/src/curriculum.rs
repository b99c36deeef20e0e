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

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::types::tier::Tier;

/// Curriculum lookup: the ordered units of each tier.
pub trait Curriculum {
    /// Lesson counts of the tier's units, in curriculum order. Empty when
    /// the tier has no content loaded.
    fn unit_lengths(&self, tier: Tier) -> Vec<u32>;

    fn lessons_in_tier(&self, tier: Tier) -> u32 {
        self.unit_lengths(tier).iter().sum()
    }
}

/// A curriculum whose shape is known up front, usually from the config file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticCurriculum {
    units: BTreeMap<Tier, Vec<u32>>,
}

impl StaticCurriculum {
    pub fn new(units: BTreeMap<Tier, Vec<u32>>) -> Self {
        Self { units }
    }

    /// Every tier gets `units` units of `lessons` lessons each.
    pub fn uniform(units: usize, lessons: u32) -> Self {
        let units = Tier::ALL
            .into_iter()
            .map(|tier| (tier, vec![lessons; units]))
            .collect();
        Self { units }
    }
}

impl Curriculum for StaticCurriculum {
    fn unit_lengths(&self, tier: Tier) -> Vec<u32> {
        self.units.get(&tier).cloned().unwrap_or_default()
    }
}

/// Where a learner enters a tier's lesson sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartingPoint {
    /// 1-based unit number.
    pub unit: u32,
    /// 1-based lesson number within the unit.
    pub lesson: u32,
    /// Lessons of the tier that come before this one.
    pub lessons_before: u32,
}

impl StartingPoint {
    pub const BEGINNING: StartingPoint = StartingPoint {
        unit: 1,
        lesson: 1,
        lessons_before: 0,
    };
}

/// Map a position in `[0, 1]` linearly onto the tier's lesson sequence.
///
/// Position 0 is the first lesson; position 1 is the last one. Tiers with no
/// lessons start at the beginning.
pub fn starting_point<C: Curriculum + ?Sized>(
    curriculum: &C,
    tier: Tier,
    position: f64,
) -> StartingPoint {
    let units: Vec<u32> = curriculum.unit_lengths(tier);
    let total: u32 = units.iter().sum();
    if total == 0 {
        return StartingPoint::BEGINNING;
    }
    let position = if position.is_finite() {
        position.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let index = ((position * total as f64).floor() as u32).min(total - 1);
    let mut remaining = index;
    for (i, &len) in units.iter().enumerate() {
        if remaining < len {
            return StartingPoint {
                unit: i as u32 + 1,
                lesson: remaining + 1,
                lessons_before: index,
            };
        }
        remaining -= len;
    }
    // Unreachable while `index < total`.
    StartingPoint::BEGINNING
}
