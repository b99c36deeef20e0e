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

use serde::Deserialize;
use serde::Serialize;

use crate::curriculum::StaticCurriculum;
use crate::error::Fallible;
use crate::error::fail;
use crate::placement::PlacementConfig;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    /// Fraction of a tier that must be completed to unlock the next one.
    pub advancement_threshold: f64,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            advancement_threshold: 0.8,
        }
    }
}

/// Longest accepted cache TTL: one year.
pub const MAX_CACHE_TTL_SECONDS: i64 = 365 * 24 * 60 * 60;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub capacity: usize,
    /// Between 0 and [`MAX_CACHE_TTL_SECONDS`].
    pub ttl_seconds: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            ttl_seconds: 300,
        }
    }
}

/// Settings read from `tierwise.toml`. Every section is optional.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub progression: ProgressionConfig,
    pub placement: PlacementConfig,
    pub cache: CacheConfig,
    pub curriculum: StaticCurriculum,
}

impl Config {
    pub fn from_toml_str(text: &str) -> Fallible<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Fallible<()> {
        let threshold = self.progression.advancement_threshold;
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return fail(format!(
                "advancement threshold must be between 0 and 1, got {threshold}"
            ));
        }
        let ttl = self.cache.ttl_seconds;
        if !(0..=MAX_CACHE_TTL_SECONDS).contains(&ttl) {
            return fail(format!(
                "cache TTL must be between 0 and {MAX_CACHE_TTL_SECONDS} seconds, got {ttl}"
            ));
        }
        self.placement.validate()
    }
}
