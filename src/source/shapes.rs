//! Response layouts of the achievement service and their normalization
//!
//! The service has returned several layouts over time. Each known layout is a
//! named variant here, tried in declaration order; anything else is a
//! `MalformedPayload`. Within a record, field names are looked up from ordered
//! key lists so the first spelling present wins.
//!
//! Recent achievements:
//! - `List`:    `[ {AchievementID, GameID, Date, ...}, ... ]`
//! - `Wrapped`: `{ "Recent": [ ... ] }` (also `Achievements`)
//! - `Grouped`: `{ "<gameId>": [ ... ], ... }`, game id taken from the key when
//!   records omit it
//!
//! Game progress: one object with totals and an `Achievements` field that is
//! either a map keyed by achievement id or a list.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::domain::{GameProgress, UnlockedAchievement};
use crate::error::{SyncError, SyncResult};

const ACHIEVEMENT_ID_KEYS: &[&str] = &["AchievementID", "AchievementId", "achievementId", "ID", "id"];
const GAME_ID_KEYS: &[&str] = &["GameID", "GameId", "gameId", "game_id"];
const DATE_KEYS: &[&str] = &["Date", "DateAwarded", "DateEarned", "unlockedAt", "unlocked_at"];
const TITLE_KEYS: &[&str] = &["Title", "title"];
const GAME_TITLE_KEYS: &[&str] = &["GameTitle", "gameTitle"];

const TOTAL_KEYS: &[&str] = &["NumAchievements", "numAchievements", "total"];
const EARNED_KEYS: &[&str] = &["NumAwardedToUser", "NumAwarded", "numAwarded", "earned"];
const COMPLETION_KEYS: &[&str] = &["UserCompletion", "userCompletion", "completion"];
const ACHIEVEMENTS_KEYS: &[&str] = &["Achievements", "achievements"];
const EARNED_DATE_KEYS: &[&str] = &["DateEarned", "DateEarnedHardcore", "dateEarned"];
const EARNED_FLAG_KEYS: &[&str] = &["Earned", "earned"];

/// Known layouts of the recent-achievements response
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RecentResponse {
    List(Vec<Value>),
    Wrapped(WrappedRecent),
    Grouped(BTreeMap<String, Vec<Value>>),
}

#[derive(Debug, Deserialize)]
pub struct WrappedRecent {
    #[serde(alias = "Recent", alias = "Achievements", alias = "recent", alias = "achievements")]
    items: Vec<Value>,
}

/// Known layouts of a progress response's achievement listing
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AchievementListing {
    Keyed(BTreeMap<String, Value>),
    Listed(Vec<Value>),
}

/// Map a recent-achievements payload onto unlock records.
///
/// Individual records that cannot be normalized are logged and skipped.
pub fn normalize_recent(payload: Value) -> SyncResult<Vec<UnlockedAchievement>> {
    let shape: RecentResponse = serde_json::from_value(payload).map_err(|e| {
        SyncError::MalformedPayload(format!("unrecognized recent achievements layout: {e}"))
    })?;

    let grouped: Vec<(Option<String>, Vec<Value>)> = match shape {
        RecentResponse::List(items) => vec![(None, items)],
        RecentResponse::Wrapped(wrapped) => vec![(None, wrapped.items)],
        RecentResponse::Grouped(groups) => {
            groups.into_iter().map(|(game, items)| (Some(game), items)).collect()
        }
    };

    let mut unlocks = Vec::new();
    for (game_hint, items) in grouped {
        for item in items {
            match normalize_unlock(&item, game_hint.as_deref()) {
                Ok(unlock) => unlocks.push(unlock),
                Err(e) => warn!(error = %e, "Skipping unlock record"),
            }
        }
    }
    Ok(unlocks)
}

/// Map one unlock record onto the canonical type
pub fn normalize_unlock(item: &Value, game_hint: Option<&str>) -> SyncResult<UnlockedAchievement> {
    let obj = item
        .as_object()
        .ok_or_else(|| SyncError::MalformedPayload("unlock record is not an object".to_string()))?;

    let achievement_id = first(obj, ACHIEVEMENT_ID_KEYS)
        .and_then(id_value)
        .ok_or_else(|| SyncError::MalformedPayload("unlock record without achievement id".to_string()))?;

    let game_id = first(obj, GAME_ID_KEYS)
        .and_then(id_value)
        .or_else(|| game_hint.map(str::to_string))
        .ok_or_else(|| {
            SyncError::MalformedPayload(format!("unlock {achievement_id} without game id"))
        })?;

    let unlocked_at = first(obj, DATE_KEYS).and_then(timestamp_ms).ok_or_else(|| {
        SyncError::MalformedPayload(format!("unlock {achievement_id} without a usable date"))
    })?;

    Ok(UnlockedAchievement {
        achievement_id,
        game_id,
        unlocked_at,
        title: first(obj, TITLE_KEYS).and_then(text_value),
        game_title: first(obj, GAME_TITLE_KEYS).and_then(text_value),
    })
}

/// Map a game-progress payload onto a progress summary
pub fn normalize_progress(payload: &Value) -> SyncResult<GameProgress> {
    let obj = payload
        .as_object()
        .ok_or_else(|| SyncError::MalformedPayload("progress payload is not an object".to_string()))?;

    let listing = match first(obj, ACHIEVEMENTS_KEYS) {
        None | Some(Value::Null) => None,
        Some(raw) => Some(
            AchievementListing::deserialize(raw)
                .map_err(|e| SyncError::MalformedPayload(format!("unrecognized achievement listing: {e}")))?,
        ),
    };

    let (listed_total, earned_ids) = match &listing {
        Some(AchievementListing::Keyed(map)) => {
            let earned = map
                .iter()
                .filter(|(_, entry)| is_earned(entry))
                .map(|(key, entry)| {
                    entry
                        .as_object()
                        .and_then(|o| first(o, ACHIEVEMENT_ID_KEYS))
                        .and_then(id_value)
                        .unwrap_or_else(|| key.clone())
                })
                .collect::<BTreeSet<_>>();
            (Some(map.len() as u32), earned)
        }
        Some(AchievementListing::Listed(items)) => {
            let earned = items
                .iter()
                .filter(|entry| is_earned(entry))
                .filter_map(|entry| {
                    entry
                        .as_object()
                        .and_then(|o| first(o, ACHIEVEMENT_ID_KEYS))
                        .and_then(id_value)
                })
                .collect::<BTreeSet<_>>();
            (Some(items.len() as u32), earned)
        }
        None => (None, BTreeSet::new()),
    };

    let total_count = first(obj, TOTAL_KEYS)
        .and_then(count_value)
        .or(listed_total)
        .ok_or_else(|| SyncError::MalformedPayload("progress without achievement total".to_string()))?;

    let earned_count = first(obj, EARNED_KEYS)
        .and_then(count_value)
        .unwrap_or(earned_ids.len() as u32);

    let completion_percent = first(obj, COMPLETION_KEYS)
        .and_then(percent_value)
        .unwrap_or_else(|| {
            if total_count == 0 {
                0.0
            } else {
                f64::from(earned_count) * 100.0 / f64::from(total_count)
            }
        });

    Ok(GameProgress {
        earned_count,
        total_count,
        completion_percent,
        earned_achievement_ids: earned_ids,
    })
}

fn first<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k)).filter(|v| !v.is_null())
}

fn id_value(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => n.as_u64().map(|n| n.to_string()).or_else(|| Some(n.to_string())),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn text_value(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

fn count_value(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn percent_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
}

fn is_earned(entry: &Value) -> bool {
    let Some(obj) = entry.as_object() else {
        return false;
    };
    let dated = EARNED_DATE_KEYS
        .iter()
        .filter_map(|k| obj.get(*k))
        .any(|v| v.as_str().is_some_and(|s| !s.trim().is_empty()));
    let flagged = EARNED_FLAG_KEYS
        .iter()
        .filter_map(|k| obj.get(*k))
        .any(|v| v.as_bool() == Some(true));
    dated || flagged
}

/// Timestamp in ms from "YYYY-MM-DD HH:MM:SS" (UTC), RFC 3339, or epoch
/// seconds/milliseconds
pub fn timestamp_ms(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().map(epoch_to_ms),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Some(naive.and_utc().timestamp_millis());
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.timestamp_millis());
            }
            s.parse::<i64>().ok().map(epoch_to_ms)
        }
        _ => None,
    }
}

/// Values this large are already milliseconds
fn epoch_to_ms(raw: i64) -> i64 {
    if raw.abs() >= 100_000_000_000 { raw } else { raw * 1000 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const T0: i64 = 1_735_732_800_000; // 2025-01-01 12:00:00 UTC

    #[test]
    fn test_recent_list_layout() {
        let payload = json!([
            {"AchievementID": 101, "GameID": 7, "Date": "2025-01-01 12:00:00", "Title": "First Blood", "GameTitle": "Cave Story"},
            {"AchievementID": "102", "GameID": "7", "Date": "2025-01-01T12:00:01Z"}
        ]);
        let unlocks = normalize_recent(payload).unwrap();
        assert_eq!(unlocks.len(), 2);
        assert_eq!(unlocks[0].achievement_id, "101");
        assert_eq!(unlocks[0].game_id, "7");
        assert_eq!(unlocks[0].unlocked_at, T0);
        assert_eq!(unlocks[0].title.as_deref(), Some("First Blood"));
        assert_eq!(unlocks[1].unlocked_at, T0 + 1000);
    }

    #[test]
    fn test_recent_wrapped_and_grouped_layouts() {
        let wrapped = json!({"Recent": [{"ID": 5, "GameID": 9, "Date": 1735732800}], "Count": 1});
        let unlocks = normalize_recent(wrapped).unwrap();
        assert_eq!(unlocks.len(), 1);
        assert_eq!(unlocks[0].unlocked_at, T0);

        let grouped = json!({"9": [{"AchievementID": 5, "Date": "2025-01-01 12:00:00"}]});
        let unlocks = normalize_recent(grouped).unwrap();
        assert_eq!(unlocks[0].game_id, "9");
    }

    #[test]
    fn test_recent_skips_bad_records_but_rejects_unknown_layout() {
        let payload = json!([
            {"AchievementID": 1, "GameID": 2},
            {"GameID": 2, "Date": "2025-01-01 12:00:00"},
            {"AchievementID": 3, "GameID": 2, "Date": "2025-01-01 12:00:00"}
        ]);
        let unlocks = normalize_recent(payload).unwrap();
        assert_eq!(unlocks.len(), 1);
        assert_eq!(unlocks[0].achievement_id, "3");

        let err = normalize_recent(json!("not a list")).unwrap_err();
        assert!(matches!(err, SyncError::MalformedPayload(_)));
        let err = normalize_recent(json!({"Recent": 5, "Other": "x"})).unwrap_err();
        assert!(matches!(err, SyncError::MalformedPayload(_)));
    }

    #[test]
    fn test_progress_keyed_listing() {
        let payload = json!({
            "NumAchievements": 3,
            "NumAwardedToUser": 2,
            "UserCompletion": "66.67%",
            "Achievements": {
                "A": {"ID": "A", "DateEarned": "2025-01-01 12:00:00"},
                "B": {"ID": "B", "DateEarnedHardcore": "2025-01-02 12:00:00"},
                "C": {"ID": "C"}
            }
        });
        let progress = normalize_progress(&payload).unwrap();
        assert_eq!(progress.total_count, 3);
        assert_eq!(progress.earned_count, 2);
        assert!((progress.completion_percent - 66.67).abs() < 1e-9);
        assert!(progress.has_earned("A"));
        assert!(progress.has_earned("B"));
        assert!(!progress.has_earned("C"));
    }

    #[test]
    fn test_progress_list_listing_computes_missing_fields() {
        let payload = json!({
            "achievements": [
                {"id": 1, "earned": true},
                {"id": 2, "earned": false},
                {"id": 3, "earned": true},
                {"id": 4}
            ]
        });
        let progress = normalize_progress(&payload).unwrap();
        assert_eq!(progress.total_count, 4);
        assert_eq!(progress.earned_count, 2);
        assert_eq!(progress.completion_percent, 50.0);
        assert_eq!(
            progress.earned_achievement_ids,
            ["1".to_string(), "3".to_string()].into()
        );
    }

    #[test]
    fn test_progress_without_totals_is_malformed() {
        let err = normalize_progress(&json!({"Title": "x"})).unwrap_err();
        assert!(matches!(err, SyncError::MalformedPayload(_)));
        let err = normalize_progress(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, SyncError::MalformedPayload(_)));
    }

    #[test]
    fn test_timestamp_variants() {
        assert_eq!(timestamp_ms(&json!("2025-01-01 12:00:00")), Some(T0));
        assert_eq!(timestamp_ms(&json!("2025-01-01T13:00:00+01:00")), Some(T0));
        assert_eq!(timestamp_ms(&json!(1735732800)), Some(T0));
        assert_eq!(timestamp_ms(&json!(T0)), Some(T0));
        assert_eq!(timestamp_ms(&json!("yesterday")), None);
    }
}
