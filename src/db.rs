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

use chrono::Duration;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;
use tierwise_core::ErrorReport;
use tierwise_core::Fallible;
use tierwise_core::PlacementResult;
use tierwise_core::ProgressionSnapshot;
use tierwise_core::ReviewState;
use tierwise_core::ReviewedItem;
use tierwise_core::Tier;
use tierwise_core::Timestamp;
use tierwise_core::TtlCache;
use tierwise_core::fail;
use tierwise_core::config::CacheConfig;

const SCHEMA: &str = "
create table if not exists review_state (
    learner_id text not null,
    item_id text not null,
    easiness real not null,
    interval_days integer not null,
    repetitions integer not null,
    last_reviewed_at integer not null,
    due_at integer not null,
    primary key (learner_id, item_id)
) strict;

create table if not exists progression (
    learner_id text primary key,
    tier text not null,
    lessons_completed integer not null,
    total_lessons_in_tier integer not null
) strict;

create table if not exists placement (
    placement_id integer primary key,
    learner_id text not null,
    taken_at integer not null,
    result text not null
) strict;
";

trait Report<T> {
    fn report(self) -> Fallible<T>;
}

impl<T> Report<T> for rusqlite::Result<T> {
    fn report(self) -> Fallible<T> {
        self.map_err(|e| ErrorReport::new(format!("Database error: {e}")))
    }
}

type ReviewKey = (String, String);

/// Raw review row. Timestamps are epoch milliseconds.
type ReviewRow = (String, f64, u32, u32, i64, i64);

/// SQLite-backed store for learner state. Reads of review state go through a
/// bounded cache; every write goes to the database first.
pub struct Database {
    conn: Connection,
    cache: TtlCache<ReviewKey, ReviewedItem>,
}

impl Database {
    pub fn open(path: &str, cache: &CacheConfig) -> Fallible<Self> {
        log::debug!("Opening database at {path}");
        let conn = Connection::open(path).report()?;
        Self::init(conn, cache)
    }

    #[cfg(test)]
    pub fn in_memory() -> Fallible<Self> {
        Self::init(
            Connection::open_in_memory().report()?,
            &CacheConfig::default(),
        )
    }

    fn init(conn: Connection, cache: &CacheConfig) -> Fallible<Self> {
        let Some(ttl) = Duration::try_seconds(cache.ttl_seconds) else {
            return fail(format!("cache TTL out of range: {} seconds", cache.ttl_seconds));
        };
        conn.execute_batch(SCHEMA).report()?;
        Ok(Self {
            conn,
            cache: TtlCache::new(cache.capacity, ttl),
        })
    }

    pub fn get_review(
        &mut self,
        learner: &str,
        item: &str,
        now: Timestamp,
    ) -> Fallible<Option<ReviewedItem>> {
        let key: ReviewKey = (learner.to_string(), item.to_string());
        if let Some(cached) = self.cache.get(&key, now) {
            return Ok(Some(*cached));
        }
        let row: Option<ReviewRow> = self
            .conn
            .query_row(
                "select item_id, easiness, interval_days, repetitions, last_reviewed_at, due_at
                 from review_state where learner_id = ?1 and item_id = ?2",
                params![learner, item],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ))
                },
            )
            .optional()
            .report()?;
        match row {
            Some(row) => {
                let (_, reviewed) = parse_review_row(row)?;
                self.cache.insert(key, reviewed, now);
                Ok(Some(reviewed))
            }
            None => Ok(None),
        }
    }

    pub fn save_review(
        &mut self,
        learner: &str,
        item: &str,
        reviewed: &ReviewedItem,
        now: Timestamp,
    ) -> Fallible<()> {
        let tx = self.conn.transaction().report()?;
        tx.execute(
            "insert into review_state
                (learner_id, item_id, easiness, interval_days, repetitions, last_reviewed_at, due_at)
             values (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             on conflict (learner_id, item_id) do update set
                easiness = excluded.easiness,
                interval_days = excluded.interval_days,
                repetitions = excluded.repetitions,
                last_reviewed_at = excluded.last_reviewed_at,
                due_at = excluded.due_at",
            params![
                learner,
                item,
                reviewed.state.easiness,
                reviewed.state.interval_days,
                reviewed.state.repetitions,
                reviewed.last_reviewed_at.millis(),
                reviewed.due_at.millis(),
            ],
        )
        .report()?;
        tx.commit().report()?;
        self.cache
            .insert((learner.to_string(), item.to_string()), *reviewed, now);
        Ok(())
    }

    /// Items whose next review is at or before `now`, earliest first.
    pub fn due_items(&self, learner: &str, now: Timestamp) -> Fallible<Vec<(String, ReviewedItem)>> {
        let mut stmt = self
            .conn
            .prepare(
                "select item_id, easiness, interval_days, repetitions, last_reviewed_at, due_at
                 from review_state where learner_id = ?1 and due_at <= ?2
                 order by due_at, item_id",
            )
            .report()?;
        let rows: Vec<ReviewRow> = stmt
            .query_map(params![learner, now.millis()], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                ))
            })
            .report()?
            .collect::<rusqlite::Result<Vec<_>>>()
            .report()?;
        rows.into_iter().map(parse_review_row).collect()
    }

    pub fn get_progression(&self, learner: &str) -> Fallible<Option<ProgressionSnapshot>> {
        let row: Option<(String, u32, u32)> = self
            .conn
            .query_row(
                "select tier, lessons_completed, total_lessons_in_tier
                 from progression where learner_id = ?1",
                params![learner],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .report()?;
        match row {
            Some((tier, lessons_completed, total_lessons_in_tier)) => {
                Ok(Some(ProgressionSnapshot {
                    tier: Tier::try_from(tier)?,
                    lessons_completed,
                    total_lessons_in_tier,
                }))
            }
            None => Ok(None),
        }
    }

    pub fn save_progression(&mut self, learner: &str, snapshot: &ProgressionSnapshot) -> Fallible<()> {
        let tx = self.conn.transaction().report()?;
        tx.execute(
            "insert into progression (learner_id, tier, lessons_completed, total_lessons_in_tier)
             values (?1, ?2, ?3, ?4)
             on conflict (learner_id) do update set
                tier = excluded.tier,
                lessons_completed = excluded.lessons_completed,
                total_lessons_in_tier = excluded.total_lessons_in_tier",
            params![
                learner,
                snapshot.tier.as_str(),
                snapshot.lessons_completed,
                snapshot.total_lessons_in_tier,
            ],
        )
        .report()?;
        tx.commit().report()
    }

    pub fn save_placement(
        &mut self,
        learner: &str,
        taken_at: Timestamp,
        result: &PlacementResult,
    ) -> Fallible<i64> {
        let json = serde_json::to_string(result)?;
        self.conn
            .execute(
                "insert into placement (learner_id, taken_at, result) values (?1, ?2, ?3)",
                params![learner, taken_at.millis(), json],
            )
            .report()?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn latest_placement(&self, learner: &str) -> Fallible<Option<PlacementResult>> {
        let json: Option<String> = self
            .conn
            .query_row(
                "select result from placement where learner_id = ?1
                 order by taken_at desc, placement_id desc limit 1",
                params![learner],
                |row| row.get(0),
            )
            .optional()
            .report()?;
        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}

fn parse_review_row(row: ReviewRow) -> Fallible<(String, ReviewedItem)> {
    let (item, easiness, interval_days, repetitions, last_reviewed_at, due_at) = row;
    let reviewed = ReviewedItem {
        state: ReviewState {
            easiness,
            interval_days,
            repetitions,
        },
        last_reviewed_at: Timestamp::from_millis(last_reviewed_at)?,
        due_at: Timestamp::from_millis(due_at)?,
    };
    Ok((item, reviewed))
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;
    use tierwise_core::Grade;
    use tierwise_core::record_review;
    use tierwise_core::schedule;

    use super::*;
    use crate::helper::ts;

    #[test]
    fn test_missing_rows() -> Fallible<()> {
        let mut db = Database::in_memory()?;
        let now = ts("2024-01-01T00:00:00.000");
        assert_eq!(db.get_review("ana", "hola", now)?, None);
        assert_eq!(db.get_progression("ana")?, None);
        assert_eq!(db.latest_placement("ana")?, None);
        assert!(db.due_items("ana", now)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_review_roundtrip_is_exact() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("tierwise.db").display().to_string();
        let now = ts("2024-01-01T08:00:00.000");
        let mut state = ReviewState::default();
        for g in [5, 4, 5, 3, 5] {
            state = schedule(state, Grade::try_from(g)?);
        }
        let item = record_review(state, Grade::PERFECT, now);
        {
            let mut db = Database::open(&path, &CacheConfig::default())?;
            db.save_review("ana", "hola", &item, now)?;
        }
        // A fresh connection has an empty cache, so this reads from disk.
        let mut db = Database::open(&path, &CacheConfig::default())?;
        let loaded = db.get_review("ana", "hola", now)?.unwrap();
        assert_eq!(loaded, item);
        assert_eq!(
            schedule(loaded.state, Grade::PERFECT),
            schedule(item.state, Grade::PERFECT)
        );
        Ok(())
    }

    #[test]
    fn test_due_items_ordering() -> Fallible<()> {
        let mut db = Database::in_memory()?;
        let t0 = ts("2024-01-01T08:00:00.000");
        let first = record_review(ReviewState::default(), Grade::PERFECT, t0);
        let lapsed = record_review(ReviewState::default(), Grade::try_from(1i64)?, t0);
        let later = record_review(
            ReviewState {
                easiness: 2.5,
                interval_days: 1,
                repetitions: 1,
            },
            Grade::PERFECT,
            t0,
        );
        db.save_review("ana", "b", &first, t0)?;
        db.save_review("ana", "a", &lapsed, t0)?;
        db.save_review("ana", "c", &later, t0)?;
        db.save_review("ben", "a", &first, t0)?;

        assert!(db.due_items("ana", t0)?.is_empty());
        let due: Vec<String> = db
            .due_items("ana", t0.plus(Duration::days(1)))?
            .into_iter()
            .map(|(item, _)| item)
            .collect();
        assert_eq!(due, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(db.due_items("ana", t0.plus(Duration::days(6)))?.len(), 3);
        Ok(())
    }

    #[test]
    fn test_far_future_due_date_is_not_due() -> Fallible<()> {
        let mut db = Database::in_memory()?;
        let t0 = ts("2024-01-01T00:00:00.000");
        let veteran = ReviewState {
            easiness: 3.8,
            interval_days: 763_221,
            repetitions: 12,
        };
        let item = record_review(veteran, Grade::PERFECT, t0);
        assert_eq!(item.due_at, Timestamp::latest());
        db.save_review("ana", "hola", &item, t0)?;
        let soon = record_review(ReviewState::default(), Grade::PERFECT, t0);
        db.save_review("ana", "adios", &soon, t0)?;

        assert!(db.due_items("ana", t0)?.is_empty());
        let due = db.due_items("ana", ts("2999-01-01T00:00:00.000"))?;
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].0, "adios");
        let due = db.due_items("ana", Timestamp::latest())?;
        assert_eq!(due.len(), 2);
        assert_eq!(due[1], ("hola".to_string(), item));
        Ok(())
    }

    #[test]
    fn test_ttl_beyond_duration_range_rejected() {
        let cache = CacheConfig {
            capacity: 8,
            ttl_seconds: i64::MAX,
        };
        let conn = Connection::open_in_memory().unwrap();
        let err = Database::init(conn, &cache).err().unwrap();
        assert!(err.message().contains("cache TTL"));
    }

    #[test]
    fn test_save_review_overwrites() -> Fallible<()> {
        let mut db = Database::in_memory()?;
        let t0 = ts("2024-01-01T08:00:00.000");
        let first = record_review(ReviewState::default(), Grade::PERFECT, t0);
        db.save_review("ana", "hola", &first, t0)?;
        let second = record_review(first.state, Grade::PERFECT, first.due_at);
        db.save_review("ana", "hola", &second, first.due_at)?;
        assert_eq!(db.get_review("ana", "hola", first.due_at)?, Some(second));
        Ok(())
    }

    #[test]
    fn test_progression_roundtrip() -> Fallible<()> {
        let mut db = Database::in_memory()?;
        let snapshot = ProgressionSnapshot {
            tier: Tier::B2,
            lessons_completed: 4,
            total_lessons_in_tier: 30,
        };
        db.save_progression("ana", &snapshot)?;
        assert_eq!(db.get_progression("ana")?, Some(snapshot));
        let moved = ProgressionSnapshot {
            tier: Tier::C1,
            lessons_completed: 0,
            total_lessons_in_tier: 12,
        };
        db.save_progression("ana", &moved)?;
        assert_eq!(db.get_progression("ana")?, Some(moved));
        Ok(())
    }

    #[test]
    fn test_latest_placement_wins() -> Fallible<()> {
        let mut db = Database::in_memory()?;
        let first = PlacementResult::beginner();
        let mut second = PlacementResult::beginner();
        second.recommended_tier = Tier::B1;
        second.confidence_score = 61.25;
        db.save_placement("ana", ts("2024-01-01T08:00:00.000"), &first)?;
        db.save_placement("ana", ts("2024-02-01T08:00:00.000"), &second)?;
        assert_eq!(db.latest_placement("ana")?, Some(second));
        Ok(())
    }
}
