use std::collections::HashSet;

/// Signal/market pairs that have already been through the relevance gate.
///
/// Loaded from the match store on startup and handed to the match engine as
/// explicit state; a pair in this set is never assessed again.
#[derive(Debug, Clone, Default)]
pub struct EvaluatedPairs {
    pairs: HashSet<(String, String)>,
}

impl EvaluatedPairs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, signal_id: &str, market_id: &str) -> bool {
        self.pairs
            .contains(&(signal_id.to_string(), market_id.to_string()))
    }

    /// Returns true if the pair was not present.
    pub fn insert(&mut self, signal_id: &str, market_id: &str) -> bool {
        self.pairs
            .insert((signal_id.to_string(), market_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl FromIterator<(String, String)> for EvaluatedPairs {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}
