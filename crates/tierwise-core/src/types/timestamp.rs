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

use chrono::DateTime;
use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::SubsecRound;
use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;

const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// A timestamp without a timezone and millisecond precision.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    pub fn new(ndt: NaiveDateTime) -> Self {
        Self(ndt.trunc_subsecs(3))
    }

    /// The latest timestamp arithmetic produces: the last millisecond of
    /// the year 9999. Later dates would need a five-digit year.
    pub fn latest() -> Self {
        let ndt = NaiveDate::from_ymd_opt(9999, 12, 31)
            .and_then(|date| date.and_hms_milli_opt(23, 59, 59, 999))
            .unwrap_or(NaiveDateTime::MAX);
        Self(ndt)
    }

    /// Milliseconds since the Unix epoch, reading the timestamp as UTC.
    pub fn millis(self) -> i64 {
        self.0.and_utc().timestamp_millis()
    }

    pub fn from_millis(millis: i64) -> Fallible<Self> {
        match DateTime::from_timestamp_millis(millis) {
            Some(dt) => Ok(Self(dt.naive_utc())),
            None => fail(format!("Timestamp out of range: {millis} ms.")),
        }
    }

    /// The current timestamp in the user's local time.
    #[cfg(feature = "clock")]
    pub fn now() -> Self {
        Self(chrono::Local::now().naive_local().trunc_subsecs(3))
    }

    /// Saturates at [`Timestamp::latest`].
    pub fn plus_days(self, days: u32) -> Self {
        self.plus(Duration::days(i64::from(days)))
    }

    /// Saturates at [`Timestamp::latest`] going forward and at the earliest
    /// representable instant going back.
    pub fn plus(self, duration: Duration) -> Self {
        let latest = Self::latest().0;
        match self.0.checked_add_signed(duration) {
            Some(ndt) if ndt > latest && duration > Duration::zero() => Self(latest),
            Some(ndt) => Self(ndt),
            None if duration < Duration::zero() => Self(NaiveDateTime::MIN),
            None => Self(latest),
        }
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(FORMAT))
    }
}

impl TryFrom<String> for Timestamp {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let ndt = NaiveDateTime::parse_from_str(&value, FORMAT)
            .map_err(|_| ErrorReport::new(format!("Failed to parse timestamp: '{value}'.")))?;
        Ok(Timestamp::new(ndt))
    }
}

impl From<Timestamp> for String {
    fn from(ts: Timestamp) -> String {
        ts.to_string()
    }
}

#[cfg(test)]
pub(crate) fn ts(s: &str) -> Timestamp {
    Timestamp::try_from(s.to_string()).unwrap()
}
