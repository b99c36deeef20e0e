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
use std::path::Path;

use tierwise_core::Config;
use tierwise_core::ErrorReport;
use tierwise_core::Fallible;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "tierwise.toml";

/// Load the configuration. An explicit path must exist; the default file is
/// optional and built-in defaults apply without it.
pub fn load_config(path: Option<&str>) -> Fallible<Config> {
    let path: &str = match path {
        Some(path) => path,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => DEFAULT_CONFIG_FILE,
        None => {
            log::debug!("No config file found, using defaults");
            return Ok(Config::default());
        }
    };
    log::debug!("Loading config from {path}");
    let text = read_to_string(path)
        .map_err(|e| ErrorReport::new(format!("cannot read config file '{path}': {e}")))?;
    Config::from_toml_str(&text)
}
