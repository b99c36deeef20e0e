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

/// Lowest passing grade.
const PASS_GRADE: u8 = 3;

const MAX_GRADE: u8 = 5;

/// Recall quality for a single review, from 0 (total failure) to 5 (perfect
/// recall). Can only be constructed in range.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Grade(u8);

impl Grade {
    pub const PERFECT: Grade = Grade(MAX_GRADE);

    pub fn value(self) -> u8 {
        self.0
    }

    /// A review is a success when the grade is at least 3.
    pub fn is_pass(self) -> bool {
        self.0 >= PASS_GRADE
    }

    /// Every valid grade, lowest first.
    pub fn all() -> impl Iterator<Item = Grade> {
        (0..=MAX_GRADE).map(Grade)
    }
}

impl TryFrom<i64> for Grade {
    type Error = ErrorReport;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (0..=MAX_GRADE as i64).contains(&value) {
            Ok(Grade(value as u8))
        } else {
            fail(format!(
                "review grade must be an integer between 0 and {MAX_GRADE}, got {value}"
            ))
        }
    }
}

impl From<Grade> for i64 {
    fn from(grade: Grade) -> i64 {
        grade.0 as i64
    }
}

impl Display for Grade {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
