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

use std::fmt::Display;
use std::fmt::Formatter;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::fail;

/// A CEFR proficiency tier. The derived ordering is the difficulty order,
/// which both progression and placement gating rely on.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Tier {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl Tier {
    /// All tiers, easiest first.
    pub const ALL: [Tier; 6] = [Tier::A1, Tier::A2, Tier::B1, Tier::B2, Tier::C1, Tier::C2];

    pub fn lowest() -> Tier {
        Tier::A1
    }

    /// The tier after this one, or `None` for the last tier.
    pub fn next(self) -> Option<Tier> {
        match self {
            Tier::A1 => Some(Tier::A2),
            Tier::A2 => Some(Tier::B1),
            Tier::B1 => Some(Tier::B2),
            Tier::B2 => Some(Tier::C1),
            Tier::C1 => Some(Tier::C2),
            Tier::C2 => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::A1 => "A1",
            Tier::A2 => "A2",
            Tier::B1 => "B1",
            Tier::B2 => "B2",
            Tier::C1 => "C1",
            Tier::C2 => "C2",
        }
    }
}

impl Display for Tier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for Tier {
    type Error = ErrorReport;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "A1" => Ok(Tier::A1),
            "A2" => Ok(Tier::A2),
            "B1" => Ok(Tier::B1),
            "B2" => Ok(Tier::B2),
            "C1" => Ok(Tier::C1),
            "C2" => Ok(Tier::C2),
            _ => fail(format!("invalid tier: '{value}'")),
        }
    }
}

impl TryFrom<String> for Tier {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Tier::try_from(value.as_str())
    }
}

impl From<Tier> for String {
    fn from(tier: Tier) -> String {
        tier.as_str().to_string()
    }
}
