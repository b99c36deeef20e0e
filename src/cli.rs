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

use clap::Parser;
use clap::Subcommand;
use serde::Serialize;
use tierwise_core::Fallible;
use tierwise_core::Grade;
use tierwise_core::Timestamp;
use tierwise_core::fail;

use crate::cmd::lesson::complete_lesson;
use crate::cmd::lesson::current_progress;
use crate::cmd::place::place_learner;
use crate::cmd::place::read_responses;
use crate::cmd::review::list_due;
use crate::cmd::review::review_item;
use crate::config::load_config;
use crate::db::Database;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the config file. By default, `tierwise.toml` in the current directory is used if it exists.
    #[arg(long, global = true)]
    config: Option<String>,
    /// Path to the SQLite database.
    #[arg(long, global = true, default_value = "tierwise.db")]
    db: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Grade a review of an item and reschedule it.
    Review {
        #[arg(long)]
        learner: String,
        #[arg(long)]
        item: String,
        /// Recall quality from 0 (total failure) to 5 (perfect recall).
        #[arg(long, allow_negative_numbers = true)]
        grade: i64,
    },
    /// List the learner's items that are due for review.
    Due {
        #[arg(long)]
        learner: String,
    },
    /// Record a completed lesson and unlock the next tier if earned.
    Complete {
        #[arg(long)]
        learner: String,
    },
    /// Print the learner's progress through their current tier.
    Progress {
        #[arg(long)]
        learner: String,
    },
    /// Score a placement exam and start the learner at the recommended lesson.
    Place {
        #[arg(long)]
        learner: String,
        /// Path to a JSON array of graded responses.
        #[arg(long)]
        responses: String,
    },
    /// Print the learner's most recent placement result.
    Placement {
        #[arg(long)]
        learner: String,
    },
}

fn print_json<T: Serialize>(value: &T) -> Fallible<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn entrypoint() -> Fallible<()> {
    let cli: Cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let mut db = Database::open(&cli.db, &config.cache)?;
    let now = Timestamp::now();
    match cli.command {
        Command::Review {
            learner,
            item,
            grade,
        } => {
            // Range-check before touching any state.
            let grade = Grade::try_from(grade)?;
            print_json(&review_item(&mut db, &learner, &item, grade, now)?)
        }
        Command::Due { learner } => print_json(&list_due(&db, &learner, now)?),
        Command::Complete { learner } => print_json(&complete_lesson(&mut db, &learner, &config)?),
        Command::Progress { learner } => {
            print_json(&current_progress(&db, &learner, &config.curriculum)?)
        }
        Command::Place { learner, responses } => {
            let responses = read_responses(&responses)?;
            print_json(&place_learner(&mut db, &learner, &responses, &config, now)?)
        }
        Command::Placement { learner } => match db.latest_placement(&learner)? {
            Some(result) => print_json(&result),
            None => fail(format!("no placement on record for '{learner}'")),
        },
    }
}
