use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use indexmap::IndexMap;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// One entry of the question bank, in the on-disk shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Question {
    #[serde(rename = "question")]
    pub(crate) text: String,
    #[serde(default)]
    pub(crate) answers: Vec<String>,
}

/// User id to point count, in insertion order. The insertion order is the
/// stable tie order of the leaderboard and survives a save/load cycle.
pub(crate) type ScoreTable = IndexMap<u64, u32>;

/// Why a challenge start request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChallengeRefused {
    AlreadyRunning,
    NoQuestions,
}

/// Reads the score file. A missing file is an empty table, not an error;
/// entries whose id or point value does not parse are skipped.
pub(crate) fn load_scores(path: &Path) -> ScoreTable {
    let mut table = ScoreTable::new();

    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            warn!("score file {} does not exist yet, starting empty", path.display());
            return table;
        }
        Err(err) => {
            warn!("failed to read score file {}: {err}", path.display());
            return table;
        }
    };

    // Keyed by raw strings first so one bad entry cannot poison the rest;
    // IndexMap keeps the file order, which is the leaderboard tie order.
    let entries: IndexMap<String, serde_json::Value> = match serde_json::from_str(&raw) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("score file {} is not a JSON object of scores: {err}", path.display());
            return table;
        }
    };

    for (key, value) in &entries {
        // Discord ids are nonzero snowflakes.
        let id = key.trim().parse::<u64>().ok().filter(|id| *id != 0);
        let points = value.as_u64().and_then(|points| u32::try_from(points).ok());
        match (id, points) {
            (Some(id), Some(points)) => {
                table.insert(id, points);
            }
            _ => warn!("skipping malformed score entry {key:?} -> {value}"),
        }
    }

    info!("loaded {} scored users from {}", table.len(), path.display());
    table
}

/// Writes the whole table, pretty-printed. Failures are logged, never
/// surfaced to the caller.
pub(crate) fn save_scores(path: &Path, table: &ScoreTable) {
    match serde_json::to_string_pretty(table) {
        Ok(payload) => match std::fs::write(path, payload) {
            Ok(()) => debug!("saved {} scores to {}", table.len(), path.display()),
            Err(err) => warn!("failed to write score file {}: {err}", path.display()),
        },
        Err(err) => warn!("failed to serialize score table: {err}"),
    }
}

/// Reads the question file. Missing or malformed input yields an empty bank.
pub(crate) fn load_questions(path: &Path) -> Vec<Question> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            warn!("question file {} does not exist yet, starting empty", path.display());
            return Vec::new();
        }
        Err(err) => {
            warn!("failed to read question file {}: {err}", path.display());
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<Question>>(&raw) {
        Ok(questions) => {
            info!("loaded {} questions from {}", questions.len(), path.display());
            questions
        }
        Err(err) => {
            warn!(
                "question file {} is not a valid question list, starting empty: {err}",
                path.display()
            );
            Vec::new()
        }
    }
}

/// Writes the whole bank, pretty-printed. Failures are logged only.
pub(crate) fn save_questions(path: &Path, questions: &[Question]) {
    match serde_json::to_string_pretty(questions) {
        Ok(payload) => match std::fs::write(path, payload) {
            Ok(()) => debug!("saved {} questions to {}", questions.len(), path.display()),
            Err(err) => warn!("failed to write question file {}: {err}", path.display()),
        },
        Err(err) => warn!("failed to serialize question bank: {err}"),
    }
}

struct StoreInner {
    scores: ScoreTable,
    questions: Vec<Question>,
    active_channels: HashSet<u64>,
}

/// The bot's owned state: score table, question bank and the per-channel
/// challenge flags behind one lock. Clones share the same state. Every
/// mutating operation persists before returning; the critical sections are
/// short and never live across an await point.
#[derive(Clone)]
pub(crate) struct TriviaStore {
    scores_path: PathBuf,
    questions_path: PathBuf,
    inner: Arc<Mutex<StoreInner>>,
}

impl TriviaStore {
    pub(crate) fn load(scores_path: PathBuf, questions_path: PathBuf) -> Self {
        let scores = load_scores(&scores_path);
        let questions = load_questions(&questions_path);
        Self {
            scores_path,
            questions_path,
            inner: Arc::new(Mutex::new(StoreInner {
                scores,
                questions,
                active_channels: HashSet::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Marks the channel active and draws a random question, both under the
    /// same lock acquisition. Refused when a round is already running in the
    /// channel or the bank is empty; a refusal changes nothing.
    pub(crate) fn begin_challenge(&self, channel_id: u64) -> Result<Question, ChallengeRefused> {
        let mut inner = self.lock();
        if inner.active_channels.contains(&channel_id) {
            return Err(ChallengeRefused::AlreadyRunning);
        }
        let Some(question) = inner.questions.choose(&mut rand::thread_rng()).cloned() else {
            return Err(ChallengeRefused::NoQuestions);
        };
        inner.active_channels.insert(channel_id);
        Ok(question)
    }

    pub(crate) fn end_challenge(&self, channel_id: u64) {
        self.lock().active_channels.remove(&channel_id);
    }

    #[cfg(test)]
    pub(crate) fn challenge_active(&self, channel_id: u64) -> bool {
        self.lock().active_channels.contains(&channel_id)
    }

    /// Adds one point to the user and persists. Returns the new total.
    pub(crate) fn award_point(&self, user_id: u64) -> u32 {
        let mut inner = self.lock();
        let entry = inner.scores.entry(user_id).or_insert(0);
        *entry = entry.saturating_add(1);
        let total = *entry;
        save_scores(&self.scores_path, &inner.scores);
        total
    }

    #[cfg(test)]
    pub(crate) fn score_of(&self, user_id: u64) -> u32 {
        self.lock().scores.get(&user_id).copied().unwrap_or(0)
    }

    /// All recorded users, descending by score, ties in table order.
    pub(crate) fn leaderboard(&self) -> Vec<(u64, u32)> {
        let inner = self.lock();
        let mut entries: Vec<(u64, u32)> = inner.scores.iter().map(|(id, pts)| (*id, *pts)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
    }

    pub(crate) fn add_question(&self, question: Question) {
        let mut inner = self.lock();
        inner.questions.push(question);
        save_questions(&self.questions_path, &inner.questions);
    }

    /// Removes the question at a 1-based display index and persists.
    /// An index outside `[1, count]` leaves the bank untouched.
    pub(crate) fn remove_question(&self, index: usize) -> Option<Question> {
        let mut inner = self.lock();
        if index < 1 || index > inner.questions.len() {
            return None;
        }
        let removed = inner.questions.remove(index - 1);
        save_questions(&self.questions_path, &inner.questions);
        Some(removed)
    }

    /// Replaces the in-memory bank with the file contents, discarding any
    /// unsaved state. Returns the new count.
    pub(crate) fn reload_questions(&self) -> usize {
        let questions = load_questions(&self.questions_path);
        let mut inner = self.lock();
        inner.questions = questions;
        inner.questions.len()
    }

    pub(crate) fn questions_snapshot(&self) -> Vec<Question> {
        self.lock().questions.clone()
    }

    pub(crate) fn question_count(&self) -> usize {
        self.lock().questions.len()
    }

    /// Replaces the whole table with an empty one and persists.
    pub(crate) fn reset_all_scores(&self) {
        let mut inner = self.lock();
        inner.scores = ScoreTable::new();
        save_scores(&self.scores_path, &inner.scores);
    }

    /// Zeroes one user's entry if present and persists. Returns false when
    /// the user has no recorded points; nothing is written in that case.
    pub(crate) fn reset_user_score(&self, user_id: u64) -> bool {
        let mut inner = self.lock();
        if let Some(points) = inner.scores.get_mut(&user_id) {
            *points = 0;
        } else {
            return false;
        }
        save_scores(&self.scores_path, &inner.scores);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn question(text: &str, answers: &[&str]) -> Question {
        Question {
            text: text.to_string(),
            answers: answers.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn fresh_store(dir: &TempDir) -> TriviaStore {
        TriviaStore::load(dir.path().join("scores.json"), dir.path().join("questions.json"))
    }

    #[test]
    fn missing_files_start_empty() {
        let dir = TempDir::new().unwrap();
        let store = fresh_store(&dir);
        assert!(store.leaderboard().is_empty());
        assert_eq!(store.question_count(), 0);
    }

    #[test]
    fn scores_round_trip_through_the_file() {
        let dir = TempDir::new().unwrap();
        let store = fresh_store(&dir);
        store.award_point(10);
        store.award_point(10);
        store.award_point(20);

        let reloaded = fresh_store(&dir);
        assert_eq!(reloaded.score_of(10), 2);
        assert_eq!(reloaded.score_of(20), 1);
        assert_eq!(reloaded.leaderboard(), vec![(10, 2), (20, 1)]);
    }

    #[test]
    fn score_file_is_readable_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scores.json");
        let mut table = ScoreTable::new();
        table.insert(1234, 2);
        save_scores(&path, &table);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"1234\": 2"));
    }

    #[test]
    fn malformed_score_entries_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scores.json");
        std::fs::write(
            &path,
            r#"{"10": 3, "not-an-id": 5, "11": "three", "12": -4}"#,
        )
        .unwrap();

        let table = load_scores(&path);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&10), Some(&3));
    }

    #[test]
    fn score_file_that_is_not_an_object_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scores.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(load_scores(&path).is_empty());
    }

    #[test]
    fn tie_order_survives_a_reload() {
        let dir = TempDir::new().unwrap();
        let store = fresh_store(&dir);
        // String-sorted these ids would flip; file order must win.
        store.award_point(999);
        store.award_point(1000);

        let reloaded = fresh_store(&dir);
        assert_eq!(reloaded.leaderboard(), vec![(999, 1), (1000, 1)]);
    }

    #[test]
    fn questions_round_trip_with_arabic_text() {
        let dir = TempDir::new().unwrap();
        let store = fresh_store(&dir);
        let q1 = question("ما هي عاصمة قطر؟", &["الدوحة", "دوحة"]);
        let q2 = question("Capital of Qatar?", &["Doha"]);
        store.add_question(q1.clone());
        store.add_question(q2.clone());

        let raw = std::fs::read_to_string(dir.path().join("questions.json")).unwrap();
        assert!(raw.contains("ما هي عاصمة قطر؟"));

        let reloaded = fresh_store(&dir);
        assert_eq!(reloaded.questions_snapshot(), vec![q1, q2]);
    }

    #[test]
    fn malformed_question_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("questions.json");
        std::fs::write(&path, "{\"question\": \"not a list\"}").unwrap();
        assert!(load_questions(&path).is_empty());

        std::fs::write(&path, "not json at all").unwrap();
        assert!(load_questions(&path).is_empty());
    }

    #[test]
    fn delete_is_one_indexed_and_shifts_the_rest() {
        let dir = TempDir::new().unwrap();
        let store = fresh_store(&dir);
        store.add_question(question("q1", &["a"]));
        store.add_question(question("q2", &["b"]));
        store.add_question(question("q3", &["c"]));

        let removed = store.remove_question(2).unwrap();
        assert_eq!(removed.text, "q2");
        let remaining: Vec<String> =
            store.questions_snapshot().into_iter().map(|q| q.text).collect();
        assert_eq!(remaining, vec!["q1", "q3"]);
    }

    #[test]
    fn delete_out_of_range_changes_nothing() {
        let dir = TempDir::new().unwrap();
        let store = fresh_store(&dir);
        store.add_question(question("q1", &["a"]));

        assert!(store.remove_question(0).is_none());
        assert!(store.remove_question(2).is_none());
        assert_eq!(store.question_count(), 1);
    }

    #[test]
    fn reload_discards_unsaved_memory_state() {
        let dir = TempDir::new().unwrap();
        let store = fresh_store(&dir);
        store.add_question(question("old", &["a"]));

        // Simulate a direct file edit behind the bot's back.
        save_questions(
            &dir.path().join("questions.json"),
            &[question("edited", &["b"]), question("new", &["c"])],
        );

        assert_eq!(store.reload_questions(), 2);
        let texts: Vec<String> = store.questions_snapshot().into_iter().map(|q| q.text).collect();
        assert_eq!(texts, vec!["edited", "new"]);
    }

    #[test]
    fn begin_refuses_while_a_round_is_running() {
        let dir = TempDir::new().unwrap();
        let store = fresh_store(&dir);
        store.add_question(question("q1", &["a"]));

        assert!(store.begin_challenge(7).is_ok());
        assert_eq!(store.begin_challenge(7), Err(ChallengeRefused::AlreadyRunning));
        // Another channel is unaffected.
        assert!(store.begin_challenge(8).is_ok());

        store.end_challenge(7);
        assert!(!store.challenge_active(7));
        assert!(store.begin_challenge(7).is_ok());
    }

    #[test]
    fn begin_refuses_with_an_empty_bank() {
        let dir = TempDir::new().unwrap();
        let store = fresh_store(&dir);
        assert_eq!(store.begin_challenge(7), Err(ChallengeRefused::NoQuestions));
        assert!(!store.challenge_active(7));
    }

    #[test]
    fn award_touches_exactly_one_user() {
        let dir = TempDir::new().unwrap();
        let store = fresh_store(&dir);
        store.award_point(1);
        store.award_point(1);
        store.award_point(2);

        assert_eq!(store.award_point(1), 3);
        assert_eq!(store.score_of(2), 1);
        assert_eq!(store.score_of(3), 0);
    }

    #[test]
    fn leaderboard_sorts_descending_with_stable_ties() {
        let dir = TempDir::new().unwrap();
        let store = fresh_store(&dir);
        store.award_point(1);
        store.award_point(2);
        store.award_point(2);
        store.award_point(3);

        // 1 and 3 are tied; 1 entered the table first.
        assert_eq!(store.leaderboard(), vec![(2, 2), (1, 1), (3, 1)]);
    }

    #[test]
    fn reset_user_keeps_the_entry_at_zero() {
        let dir = TempDir::new().unwrap();
        let store = fresh_store(&dir);
        store.award_point(5);

        assert!(!store.reset_user_score(6));
        assert!(store.reset_user_score(5));
        assert_eq!(store.score_of(5), 0);

        let reloaded = fresh_store(&dir);
        assert_eq!(reloaded.leaderboard(), vec![(5, 0)]);
    }

    #[test]
    fn reset_all_empties_table_and_file() {
        let dir = TempDir::new().unwrap();
        let store = fresh_store(&dir);
        store.award_point(5);
        store.reset_all_scores();

        assert!(store.leaderboard().is_empty());
        assert!(fresh_store(&dir).leaderboard().is_empty());
    }
}
