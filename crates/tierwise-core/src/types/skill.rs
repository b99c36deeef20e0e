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

/// A skill category assessed by the placement exam.
///
/// The declaration order is the tie-break order used when ranking skills.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Skill {
    Grammar,
    Vocabulary,
    Listening,
    Speaking,
}

impl Skill {
    pub const ALL: [Skill; 4] = [
        Skill::Grammar,
        Skill::Vocabulary,
        Skill::Listening,
        Skill::Speaking,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Skill::Grammar => "grammar",
            Skill::Vocabulary => "vocabulary",
            Skill::Listening => "listening",
            Skill::Speaking => "speaking",
        }
    }
}

impl Display for Skill {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for Skill {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "grammar" => Ok(Skill::Grammar),
            "vocabulary" => Ok(Skill::Vocabulary),
            "listening" => Ok(Skill::Listening),
            "speaking" => Ok(Skill::Speaking),
            _ => fail(format!("invalid skill category: '{value}'")),
        }
    }
}

impl From<Skill> for String {
    fn from(skill: Skill) -> String {
        skill.as_str().to_string()
    }
}
