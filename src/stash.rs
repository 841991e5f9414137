use async_trait::async_trait;
use std::collections::VecDeque;

use crate::error::SinkError;
use crate::handler::Handler;
use crate::record::Fields;

/// A record read back from its formatted form.
pub type StashedRecord = Fields;

/// In-memory sink that keeps every formatted record, parsed back into a
/// JSON object, in append order. Meant for tests and debugging.
#[derive(Debug, Default, Clone)]
pub struct StashHandler {
    records: VecDeque<StashedRecord>,
}

impl StashHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stashed record, oldest first.
    pub fn stashed(&self) -> Vec<StashedRecord> {
        self.records.iter().cloned().collect()
    }

    /// The stashed records for which `predicate` holds, oldest first.
    pub fn stashed_by<P>(&self, predicate: P) -> Vec<StashedRecord>
    where
        P: Fn(&StashedRecord) -> bool,
    {
        self.records
            .iter()
            .filter(|record| predicate(record))
            .cloned()
            .collect()
    }

    pub fn clean(&mut self) {
        self.records.clear();
    }

    pub fn stash_len(&self) -> usize {
        self.records.len()
    }

    /// Remove and return the oldest record.
    pub fn shift(&mut self) -> Option<StashedRecord> {
        self.records.pop_front()
    }

    /// Remove and return the newest record.
    pub fn pop(&mut self) -> Option<StashedRecord> {
        self.records.pop_back()
    }
}

#[async_trait]
impl Handler for StashHandler {
    async fn write(&mut self, formatted: &str) -> Result<(), SinkError> {
        let record: StashedRecord = serde_json::from_str(formatted).map_err(SinkError::Decode)?;
        self.records.push_back(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn filled() -> StashHandler {
        let mut stash = StashHandler::new();
        for message in ["one", "two", "three"] {
            let payload = json!({"message": message, "level": 200}).to_string();
            stash.write(&payload).await.unwrap();
        }
        stash
    }

    #[tokio::test]
    async fn test_shift_and_pop() {
        let mut stash = filled().await;
        assert_eq!(stash.stash_len(), 3);
        assert_eq!(stash.shift().unwrap()["message"], json!("one"));
        assert_eq!(stash.pop().unwrap()["message"], json!("three"));
        assert_eq!(stash.stash_len(), 1);
    }

    #[tokio::test]
    async fn test_empty_stash_is_a_no_op() {
        let mut stash = StashHandler::new();
        assert!(stash.shift().is_none());
        assert!(stash.pop().is_none());
        assert!(stash.stashed().is_empty());
        stash.clean();
        assert_eq!(stash.stash_len(), 0);
    }

    #[tokio::test]
    async fn test_stashed_by_predicate() {
        let stash = filled().await;
        let matched = stash.stashed_by(|record| record["message"] != json!("two"));
        let messages: Vec<_> = matched.iter().map(|r| r["message"].clone()).collect();
        assert_eq!(messages, [json!("one"), json!("three")]);
        assert_eq!(stash.stashed().len(), 3);
    }

    #[tokio::test]
    async fn test_clean() {
        let mut stash = filled().await;
        stash.clean();
        assert_eq!(stash.stash_len(), 0);
    }

    #[tokio::test]
    async fn test_rejects_non_json_payload() {
        let mut stash = StashHandler::new();
        let err = stash.write("not json").await.unwrap_err();
        assert!(matches!(err, SinkError::Decode(_)));
        assert_eq!(stash.stash_len(), 0);
    }
}
