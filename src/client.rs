//! Browser-side tally of poll answers, kept in a [`KeyValueStorage`].
//!
//! This tally is independent of the server's: it counts numeric options
//! 1 to 5 with their own labels and never talks to the HTTP API.

use crate::kv::{KeyValueStorage, StorageError};
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const POLL_DATA_KEY: &str = "smartphonePollData_v2";
pub const USER_ANSWER_KEY: &str = "userAnswer_v2";
pub const HAS_ANSWERED_KEY: &str = "hasAnswered_v2";

pub const UNKNOWN_CHOICE: &str = "Неизвестный выбор";

const SAVE_FAILED_NOTICE: &str =
    "Не удалось сохранить данные опроса. Возможно, хранилище браузера переполнено или недоступно.";

/// A valid client-side option, 1 through 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OptionId(u8);

impl OptionId {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Option<Self> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Some(Self(value as u8))
        } else {
            None
        }
    }

    pub fn all() -> impl Iterator<Item = OptionId> {
        (Self::MIN..=Self::MAX).map(OptionId)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "Менее 1 часа",
            2 => "1–2 часа",
            3 => "2–4 часа",
            4 => "4–6 часов",
            _ => "Более 6 часов",
        }
    }
}

/// Display text for a raw option value. Accepts anything with a leading
/// integer ("3", " 2", "4abc"); everything else is [`UNKNOWN_CHOICE`].
pub fn label_for(input: &str) -> &'static str {
    parse_int_prefix(input)
        .and_then(OptionId::new)
        .map_or(UNKNOWN_CHOICE, OptionId::label)
}

fn parse_int_prefix(input: &str) -> Option<i64> {
    let trimmed = input.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let magnitude: i64 = rest[..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Stored shape: `{"answers": {"1": n, ..., "5": n}, "total": n}`.
/// `total` always equals the sum of `answers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollData {
    answers: BTreeMap<u8, u64>,
    total: u64,
}

impl Default for PollData {
    fn default() -> Self {
        Self {
            answers: OptionId::all().map(|id| (id.get(), 0)).collect(),
            total: 0,
        }
    }
}

impl PollData {
    pub fn count(&self, option: OptionId) -> u64 {
        self.answers.get(&option.get()).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn answers(&self) -> impl Iterator<Item = (OptionId, u64)> + '_ {
        OptionId::all().map(|id| (id, self.count(id)))
    }

    fn record(&mut self, option: OptionId) {
        let count = self.answers.entry(option.get()).or_insert(0);
        *count = count.saturating_add(1);
        self.recompute_total();
    }

    fn recompute_total(&mut self) {
        self.total = self
            .answers
            .values()
            .fold(0u64, |sum, count| sum.saturating_add(*count));
    }

    /// Validates an untrusted stored value. Counts missing from `answers`
    /// default to 0; keys outside 1..=5 are ignored.
    fn from_stored(value: &Value) -> Result<(Self, Number), InvalidReason> {
        let object = value.as_object().ok_or(InvalidReason::NotAnObject)?;
        let answers = object
            .get("answers")
            .and_then(Value::as_object)
            .ok_or(InvalidReason::AnswersNotAMap)?;
        let stored_total = match object.get("total") {
            Some(Value::Number(total)) => total.clone(),
            _ => return Err(InvalidReason::TotalNotNumeric),
        };

        let mut data = PollData::default();
        for id in OptionId::all() {
            if let Some(raw) = answers.get(&id.get().to_string()) {
                let count = raw.as_u64().ok_or(InvalidReason::InvalidCount(id))?;
                data.answers.insert(id.get(), count);
            }
        }
        log_unknown_keys(answers);
        data.recompute_total();

        Ok((data, stored_total))
    }
}

/// Numeric equality the way the browser compares numbers, so a stored
/// `3.0` matches a computed `3`.
fn total_matches(stored: &Number, computed: u64) -> bool {
    stored.as_u64() == Some(computed) || stored.as_f64() == Some(computed as f64)
}

fn log_unknown_keys(answers: &Map<String, Value>) {
    for key in answers.keys() {
        let known = key
            .parse::<i64>()
            .ok()
            .and_then(OptionId::new)
            .is_some_and(|id| id.get().to_string() == *key);
        if !known {
            debug!("ignoring unknown answer key {key:?}");
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    StorageUnavailable(StorageError),
    Unparseable(String),
    NotAnObject,
    AnswersNotAMap,
    TotalNotNumeric,
    InvalidCount(OptionId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing stored yet.
    Fresh,
    Restored,
    /// The stored total disagreed with the answers; the recomputed sum won.
    Repaired { stored_total: Number, computed_total: u64 },
    /// The stored value was rejected and defaults are in use. Storage is
    /// left untouched.
    Defaulted(InvalidReason),
}

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("{}", SAVE_FAILED_NOTICE)]
    Storage(#[from] StorageError),

    #[error("{}", SAVE_FAILED_NOTICE)]
    Encode(#[from] serde_json::Error),
}

pub struct ClientTally<S> {
    storage: S,
    data: PollData,
}

impl<S: KeyValueStorage> ClientTally<S> {
    /// Starts from defaults; call [`ClientTally::load`] to pick up stored data.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            data: PollData::default(),
        }
    }

    pub fn data(&self) -> &PollData {
        &self.data
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn load(&mut self) -> LoadOutcome {
        let outcome = match self.storage.get_item(POLL_DATA_KEY) {
            Ok(None) => {
                self.data = PollData::default();
                LoadOutcome::Fresh
            }
            Ok(Some(raw)) => self.restore(&raw),
            Err(err) => {
                self.data = PollData::default();
                LoadOutcome::Defaulted(InvalidReason::StorageUnavailable(err))
            }
        };

        match &outcome {
            LoadOutcome::Fresh => info!("no stored poll data, using defaults"),
            LoadOutcome::Restored => debug!("poll data restored, total {}", self.data.total),
            LoadOutcome::Repaired {
                stored_total,
                computed_total,
            } => {
                warn!("stored total {stored_total} does not match answers, using {computed_total}")
            }
            LoadOutcome::Defaulted(reason) => {
                warn!("stored poll data rejected, using defaults: {reason:?}")
            }
        }
        outcome
    }

    fn restore(&mut self, raw: &str) -> LoadOutcome {
        let parsed = serde_json::from_str::<Value>(raw)
            .map_err(|err| InvalidReason::Unparseable(err.to_string()))
            .and_then(|value| PollData::from_stored(&value));

        match parsed {
            Ok((data, stored_total)) => {
                self.data = data;
                if total_matches(&stored_total, self.data.total) {
                    LoadOutcome::Restored
                } else {
                    LoadOutcome::Repaired {
                        stored_total,
                        computed_total: self.data.total,
                    }
                }
            }
            Err(reason) => {
                self.data = PollData::default();
                LoadOutcome::Defaulted(reason)
            }
        }
    }

    pub fn save(&mut self) -> Result<(), SaveError> {
        self.data.recompute_total();
        let payload = serde_json::to_string(&self.data)?;
        self.storage.set_item(POLL_DATA_KEY, &payload).map_err(|err| {
            warn!("failed to save poll data: {err}");
            SaveError::from(err)
        })
    }

    /// Counts one answer, persists the tally, then marks this user as having
    /// answered. The in-memory count stays even if persisting fails.
    pub fn record_answer(&mut self, option: OptionId) -> Result<(), SaveError> {
        self.data.record(option);
        self.save()?;
        self.storage
            .set_item(USER_ANSWER_KEY, &option.get().to_string())?;
        self.storage.set_item(HAS_ANSWERED_KEY, "true")?;
        Ok(())
    }

    pub fn has_answered(&self) -> bool {
        matches!(self.storage.get_item(HAS_ANSWERED_KEY), Ok(Some(flag)) if flag == "true")
    }

    pub fn last_answer(&self) -> Option<OptionId> {
        let raw = self.storage.get_item(USER_ANSWER_KEY).ok().flatten()?;
        parse_int_prefix(&raw).and_then(OptionId::new)
    }

    /// Back to all-zero defaults, with every poll key removed from storage.
    pub fn reset(&mut self) {
        self.data = PollData::default();
        for key in [POLL_DATA_KEY, USER_ANSWER_KEY, HAS_ANSWERED_KEY] {
            if let Err(err) = self.storage.remove_item(key) {
                warn!("failed to remove {key}: {err}");
            }
        }
        info!("poll data reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStorage;

    fn option(n: i64) -> OptionId {
        OptionId::new(n).unwrap()
    }

    fn tally_with(raw: &str) -> ClientTally<MemoryStorage> {
        let mut storage = MemoryStorage::new();
        storage.set_item(POLL_DATA_KEY, raw).unwrap();
        ClientTally::new(storage)
    }

    #[test]
    fn label_for_known_options() {
        assert_eq!(label_for("1"), "Менее 1 часа");
        assert_eq!(label_for("2"), "1–2 часа");
        assert_eq!(label_for("3"), "2–4 часа");
        assert_eq!(label_for("4"), "4–6 часов");
        assert_eq!(label_for("5"), "Более 6 часов");
    }

    #[test]
    fn label_for_unknown_input() {
        for input in ["0", "6", "-1", "abc", "", "  ", "+"] {
            assert_eq!(label_for(input), UNKNOWN_CHOICE, "input {input:?}");
        }
    }

    #[test]
    fn label_for_uses_leading_integer() {
        assert_eq!(label_for(" 3"), "2–4 часа");
        assert_eq!(label_for("4abc"), "4–6 часов");
        assert_eq!(label_for("2.9"), "1–2 часа");
        assert_eq!(label_for("+5"), "Более 6 часов");
    }

    #[test]
    fn load_without_stored_data_uses_defaults_without_writing() {
        let mut tally = ClientTally::new(MemoryStorage::new());
        assert_eq!(tally.load(), LoadOutcome::Fresh);
        assert_eq!(tally.data(), &PollData::default());
        assert!(tally.storage().is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let mut tally = ClientTally::new(MemoryStorage::new());
        tally.record_answer(option(2)).unwrap();
        tally.record_answer(option(2)).unwrap();
        tally.record_answer(option(5)).unwrap();
        let before = tally.data().clone();

        let mut reloaded = ClientTally::new(tally.storage().clone());
        assert_eq!(reloaded.load(), LoadOutcome::Restored);
        assert_eq!(reloaded.data(), &before);
        assert_eq!(reloaded.data().total(), 3);
        assert_eq!(reloaded.data().count(option(2)), 2);
    }

    #[test]
    fn stored_format_uses_string_keys() {
        let mut tally = ClientTally::new(MemoryStorage::new());
        tally.record_answer(option(1)).unwrap();

        let raw = tally.storage().get_item(POLL_DATA_KEY).unwrap().unwrap();
        assert_eq!(
            raw,
            r#"{"answers":{"1":1,"2":0,"3":0,"4":0,"5":0},"total":1}"#
        );
    }

    #[test]
    fn corrupted_blobs_fall_back_to_defaults() {
        let blobs = [
            "not json",
            r#"{"answers": "x"}"#,
            "[]",
            r#"{"answers": {}, "total": "3"}"#,
            r#"{"answers": null, "total": 0}"#,
        ];
        for raw in blobs {
            let mut tally = tally_with(raw);
            assert!(
                matches!(tally.load(), LoadOutcome::Defaulted(_)),
                "blob {raw:?}"
            );
            assert_eq!(tally.data(), &PollData::default());
            assert_eq!(
                tally.storage().get_item(POLL_DATA_KEY).unwrap().as_deref(),
                Some(raw)
            );
        }
    }

    #[test]
    fn negative_count_is_rejected() {
        let mut tally = tally_with(r#"{"answers": {"1": -2}, "total": -2}"#);
        assert_eq!(
            tally.load(),
            LoadOutcome::Defaulted(InvalidReason::InvalidCount(option(1)))
        );
    }

    #[test]
    fn mismatched_total_is_recomputed() {
        let mut tally = tally_with(r#"{"answers": {"1": 2, "3": 1}, "total": 10}"#);
        let outcome = tally.load();
        assert_eq!(
            outcome,
            LoadOutcome::Repaired {
                stored_total: Number::from(10),
                computed_total: 3,
            }
        );
        assert_eq!(tally.data().total(), 3);
        assert_eq!(tally.data().count(option(4)), 0);
    }

    #[test]
    fn float_total_equal_to_sum_is_not_a_repair() {
        let mut tally = tally_with(r#"{"answers": {"1": 3}, "total": 3.0}"#);
        assert_eq!(tally.load(), LoadOutcome::Restored);
        assert_eq!(tally.data().total(), 3);

        let mut off = tally_with(r#"{"answers": {"1": 3}, "total": 2.5}"#);
        assert!(matches!(off.load(), LoadOutcome::Repaired { computed_total: 3, .. }));
    }

    #[test]
    fn unknown_answer_keys_are_ignored() {
        let mut tally = tally_with(r#"{"answers": {"1": 1, "7": 4}, "total": 1}"#);
        assert_eq!(tally.load(), LoadOutcome::Restored);
        assert_eq!(tally.data().answers().count(), 5);
        assert_eq!(tally.data().total(), 1);
    }

    #[test]
    fn unavailable_storage_loads_defaults() {
        let mut storage = MemoryStorage::new();
        storage.set_available(false);
        let mut tally = ClientTally::new(storage);

        assert_eq!(
            tally.load(),
            LoadOutcome::Defaulted(InvalidReason::StorageUnavailable(StorageError::Unavailable))
        );
        assert!(!tally.has_answered());
        assert_eq!(tally.last_answer(), None);
    }

    #[test]
    fn save_failure_reports_notice_and_keeps_memory() {
        let mut tally = ClientTally::new(MemoryStorage::with_quota(8));
        let err = tally.record_answer(option(3)).unwrap_err();

        assert!(matches!(err, SaveError::Storage(StorageError::QuotaExceeded { .. })));
        assert_eq!(err.to_string(), SAVE_FAILED_NOTICE);
        assert_eq!(tally.data().count(option(3)), 1);
        assert!(tally.storage().is_empty());
    }

    #[test]
    fn record_answer_marks_user_as_answered() {
        let mut tally = ClientTally::new(MemoryStorage::new());
        assert!(!tally.has_answered());

        tally.record_answer(option(4)).unwrap();
        assert!(tally.has_answered());
        assert_eq!(tally.last_answer(), Some(option(4)));
    }

    #[test]
    fn reset_clears_all_keys_and_is_idempotent() {
        let mut tally = ClientTally::new(MemoryStorage::new());
        tally.record_answer(option(1)).unwrap();
        tally.storage_mut().set_item("unrelated", "keep").unwrap();

        tally.reset();
        let once = tally.data().clone();
        assert_eq!(once, PollData::default());
        assert_eq!(tally.storage().len(), 1);
        assert!(!tally.has_answered());

        tally.reset();
        assert_eq!(tally.data(), &once);
        assert_eq!(tally.storage().len(), 1);
    }
}
