use chrono::Utc;
use std::sync::Arc;

use crate::application::errors::StorageError;
use crate::domain::entities::{order_team_names, ScoreRecord};
use crate::domain::traits::Store;

/// Win/tie tallies and match history per pair of teams
#[derive(Clone)]
pub struct ScoreLedger {
    store: Arc<dyn Store>,
}

impl ScoreLedger {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Key for a pair already in canonical order
    pub fn key(first: &str, second: &str) -> String {
        format!("[SCORE]{}:{}", first, second)
    }

    /// Record a match. The first-named score credits the canonically first
    /// team, so `add_score("b", "a", 3, 1)` gives `a` the point.
    pub async fn add_score(
        &self,
        team1: &str,
        team2: &str,
        score1: i64,
        score2: i64,
    ) -> Result<ScoreRecord, StorageError> {
        let (first, second, reversed) = order_team_names(team1, team2);
        // the result as submitted decides the point; history is stored canonically
        let outcome = score1.cmp(&score2);
        let (score1, score2) = if reversed { (score2, score1) } else { (score1, score2) };

        let mut record = self
            .load(first, second)
            .await?
            .unwrap_or_else(|| ScoreRecord::new(first, second));
        record.record(score1, score2, outcome, Utc::now());

        self.save(&record).await?;
        tracing::debug!(
            "score {}:{} now {}:{} after {} matches",
            first,
            second,
            record.team1_points,
            record.team2_points,
            record.history.len()
        );
        Ok(record)
    }

    pub async fn get_scores(&self, team1: &str, team2: &str) -> Result<ScoreRecord, StorageError> {
        let (first, second, _) = order_team_names(team1, team2);
        self.load(first, second)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("score {}:{}", first, second)))
    }

    /// Discard all history and points for the pair
    pub async fn reset_score(&self, team1: &str, team2: &str) -> Result<(), StorageError> {
        let (first, second, _) = order_team_names(team1, team2);
        self.save(&ScoreRecord::new(first, second)).await
    }

    /// Who leads, then every match oldest first
    pub fn format_score_message(record: &ScoreRecord) -> String {
        let (t1, t2) = (&record.team1, &record.team2);
        let (p1, p2) = (record.team1_points, record.team2_points);

        let mut out = if record.history.is_empty() {
            format!("*{}* and *{}* have no matches recorded yet", t1, t2)
        } else if p1 > p2 {
            format!("*{}* leads *{}* {}:{}", t1, t2, p1, p2)
        } else if p2 > p1 {
            format!("*{}* leads *{}* {}:{}", t2, t1, p2, p1)
        } else {
            format!("*{}* and *{}* are tied {}:{}", t1, t2, p1, p2)
        };

        for entry in &record.history {
            out.push_str(&format!(
                "\n{} {}:{} {}  ({})",
                t1,
                entry.team1,
                entry.team2,
                t2,
                entry.timestamp.format("%Y-%m-%d %H:%M")
            ));
        }
        out
    }

    async fn load(&self, first: &str, second: &str) -> Result<Option<ScoreRecord>, StorageError> {
        match self.store.get(&Self::key(first, second)).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, record: &ScoreRecord) -> Result<(), StorageError> {
        let raw = serde_json::to_string(record)?;
        self.store
            .set(&Self::key(&record.team1, &record.team2), &raw)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;
    use crate::infrastructure::storage::MemoryStore;

    fn ledger() -> (ScoreLedger, MemoryStore) {
        let store = MemoryStore::new();
        (ScoreLedger::new(Arc::new(store.clone())), store)
    }

    #[tokio::test]
    async fn test_add_score_canonicalizes_pair_and_scores() {
        let (scores, store) = ledger();
        scores.add_score("b", "a", 3, 1).await.unwrap();

        let record = scores.get_scores("a", "b").await.unwrap();
        assert_eq!(record.team1, "a");
        assert_eq!(record.team2, "b");
        assert_eq!(record.team1_points, 1);
        assert_eq!(record.team2_points, 0);
        assert_eq!(record.history.len(), 1);
        assert_eq!((record.history[0].team1, record.history[0].team2), (1, 3));

        assert!(store.get("[SCORE]a:b").await.unwrap().is_some());
        assert!(store.get("[SCORE]b:a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_is_order_independent() {
        let (scores, _) = ledger();
        scores.add_score("REDS", "BLUES", 2, 2).await.unwrap();
        let a = scores.get_scores("REDS", "BLUES").await.unwrap();
        let b = scores.get_scores("BLUES", "REDS").await.unwrap();
        assert_eq!(a, b);
        assert_eq!((a.team1_points, a.team2_points), (1, 1));
    }

    #[tokio::test]
    async fn test_points_accumulate() {
        let (scores, _) = ledger();
        scores.add_score("A", "B", 10, 2).await.unwrap();
        scores.add_score("B", "A", 1, 7).await.unwrap();
        let record = scores.add_score("A", "B", 4, 0).await.unwrap();
        assert_eq!((record.team1_points, record.team2_points), (2, 1));
        assert_eq!(record.history.len(), 3);
        assert_eq!((record.history[1].team1, record.history[1].team2), (7, 1));
    }

    #[tokio::test]
    async fn test_missing_pair_is_not_found() {
        let (scores, _) = ledger();
        assert!(matches!(
            scores.get_scores("X", "Y").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let (scores, _) = ledger();
        scores.add_score("A", "B", 1, 0).await.unwrap();
        scores.add_score("A", "B", 1, 1).await.unwrap();
        scores.reset_score("B", "A").await.unwrap();

        let record = scores.get_scores("A", "B").await.unwrap();
        assert_eq!((record.team1_points, record.team2_points), (0, 0));
        assert!(record.history.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_record_is_serialization_error() {
        let (scores, store) = ledger();
        store.set("[SCORE]A:B", "not json").await.unwrap();
        assert!(matches!(
            scores.get_scores("A", "B").await,
            Err(StorageError::Serialization(_))
        ));
    }

    #[test]
    fn test_format_names_the_leader() {
        let mut record = ScoreRecord::new("A", "B");
        let at = chrono::DateTime::parse_from_rfc3339("2026-03-01T18:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        record.record(1, 3, Ordering::Less, at);
        record.record(2, 5, Ordering::Less, at);

        let text = ScoreLedger::format_score_message(&record);
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("*B* leads *A* 2:0"));
        assert_eq!(lines.next(), Some("A 1:3 B  (2026-03-01 18:30)"));
        assert_eq!(lines.next(), Some("A 2:5 B  (2026-03-01 18:30)"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_format_tie_and_empty() {
        let mut record = ScoreRecord::new("A", "B");
        assert!(ScoreLedger::format_score_message(&record).contains("no matches"));
        record.record(2, 2, Ordering::Equal, Utc::now());
        assert!(ScoreLedger::format_score_message(&record).starts_with("*A* and *B* are tied 1:1"));
    }
}
