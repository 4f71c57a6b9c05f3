use crate::vocab::{Vocabulary, Walk};
use metapath_core::CorpusError;

/// Random-access source of encoded walks.
pub trait Dataset {
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn get(&self, idx: usize) -> Result<Walk, CorpusError>;
}

/// Raw token walks, encoded through the vocabulary on every access.
pub struct WalkDataset<'a, S: AsRef<str>> {
    walks: &'a [Vec<S>],
    vocab: &'a Vocabulary,
}

impl<'a, S: AsRef<str>> WalkDataset<'a, S> {
    pub fn new(walks: &'a [Vec<S>], vocab: &'a Vocabulary) -> Self {
        WalkDataset { walks, vocab }
    }
}

impl<'a, S: AsRef<str>> Dataset for WalkDataset<'a, S> {
    fn len(&self) -> usize {
        self.walks.len()
    }

    fn get(&self, idx: usize) -> Result<Walk, CorpusError> {
        self.vocab.encode_walk(idx, &self.walks[idx])
    }
}

/// Walks already held as ids.
pub struct EncodedWalks {
    pub walks: Vec<Walk>,
}

impl EncodedWalks {
    pub fn new(walks: Vec<Walk>) -> Self {
        EncodedWalks { walks }
    }
}

impl Dataset for EncodedWalks {
    fn len(&self) -> usize {
        self.walks.len()
    }

    fn get(&self, idx: usize) -> Result<Walk, CorpusError> {
        let walk = &self.walks[idx];
        if walk.is_empty() {
            return Err(CorpusError::EmptyWalk { index: idx });
        }
        Ok(walk.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::{NodeTyping, VocabularyBuilder};

    #[test]
    fn test_walk_dataset_encodes_on_access() {
        let corpus = vec![
            vec!["a".to_string(), "b".to_string(), "a".to_string()],
            vec![],
        ];
        let vocab = VocabularyBuilder::new(1, false).build(&corpus, &NodeTyping::Prefix).unwrap();
        let ds = WalkDataset::new(&corpus, &vocab);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.get(0).unwrap(), vec![0, 1, 0]);
        assert_eq!(ds.get(1).unwrap_err(), CorpusError::EmptyWalk { index: 1 });
    }

    #[test]
    fn test_encoded_walks() {
        let ds = EncodedWalks::new(vec![vec![1, 2], vec![]]);
        assert!(!ds.is_empty());
        assert_eq!(ds.get(0).unwrap(), vec![1, 2]);
        assert!(ds.get(1).is_err());
    }
}
