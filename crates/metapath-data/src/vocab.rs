use metapath_core::{CorpusError, MetapathError, MetapathResult};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

/// A walk encoded as vocabulary ids.
pub type Walk = Vec<u32>;

/// Dense id of a node-type partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NodeType(pub u16);

/// How a token string maps to its node-type label.
#[derive(Debug, Clone, Default)]
pub enum NodeTyping {
    /// Leading non-digit characters of the token: `a123` is type `a`.
    #[default]
    Prefix,
    /// Explicit labels; tokens missing from the map fall back to the prefix.
    Lookup(HashMap<String, String>),
}

impl NodeTyping {
    pub fn label<'a>(&'a self, token: &'a str) -> &'a str {
        match self {
            NodeTyping::Prefix => prefix_label(token),
            NodeTyping::Lookup(map) => map
                .get(token)
                .map(String::as_str)
                .unwrap_or_else(|| prefix_label(token)),
        }
    }
}

fn prefix_label(token: &str) -> &str {
    let end = token.find(|c: char| c.is_ascii_digit()).unwrap_or(token.len());
    &token[..end]
}

/// Interned node types, one per vocabulary id.
#[derive(Debug, Clone)]
pub struct TypeIndex {
    type_of: Vec<NodeType>,
    names: Vec<String>,
}

impl TypeIndex {
    pub fn type_of(&self, id: u32) -> NodeType {
        self.type_of[id as usize]
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn n_types(&self) -> usize {
        self.names.len()
    }

    /// Vocabulary ids belonging to each type, in ascending id order.
    pub fn partitions(&self) -> Vec<Vec<u32>> {
        let mut parts = vec![Vec::new(); self.names.len()];
        for (id, t) in self.type_of.iter().enumerate() {
            parts[t.0 as usize].push(id as u32);
        }
        parts
    }
}

/// Counts tokens across a walk corpus and assigns dense ids.
#[derive(Debug, Clone)]
pub struct VocabularyBuilder {
    pub min_count: usize,
    pub care_type: bool,
}

impl VocabularyBuilder {
    pub fn new(min_count: usize, care_type: bool) -> Self {
        VocabularyBuilder { min_count, care_type }
    }

    /// Count every token, keep those seen at least `min_count` times, and
    /// number them by descending count (ties by first occurrence).
    pub fn build<S: AsRef<str> + Sync>(
        &self,
        walks: &[Vec<S>],
        typing: &NodeTyping,
    ) -> MetapathResult<Vocabulary> {
        if self.min_count == 0 {
            return Err(MetapathError::config("min_count must be at least 1"));
        }

        // token -> (count, first position as (walk, offset))
        let counted: HashMap<&str, (u64, (usize, usize))> = walks
            .par_iter()
            .enumerate()
            .fold(HashMap::new, |mut acc, (wi, walk)| {
                for (pos, token) in walk.iter().enumerate() {
                    let entry = acc.entry(token.as_ref()).or_insert((0, (wi, pos)));
                    entry.0 += 1;
                }
                acc
            })
            .reduce(HashMap::new, |mut a, b| {
                for (token, (count, first)) in b {
                    let entry = a.entry(token).or_insert((0, first));
                    entry.0 += count;
                    entry.1 = entry.1.min(first);
                }
                a
            });

        let mut retained = Vec::new();
        let mut pruned = HashSet::new();
        for (token, (count, first)) in counted {
            if count >= self.min_count as u64 {
                retained.push((token, count, first));
            } else {
                pruned.insert(token.to_string());
            }
        }
        if retained.is_empty() {
            return Err(MetapathError::config(format!(
                "vocabulary is empty after discarding tokens seen fewer than {} times",
                self.min_count
            )));
        }
        retained.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

        let id2word: Vec<String> = retained.iter().map(|(t, _, _)| t.to_string()).collect();
        let counts: Vec<u64> = retained.iter().map(|(_, c, _)| *c).collect();
        let word2id = id2word
            .iter()
            .enumerate()
            .map(|(i, w)| (w.clone(), i as u32))
            .collect();
        let total_tokens = counts.iter().sum();

        let types = if self.care_type {
            Some(intern_types(&id2word, typing)?)
        } else {
            None
        };

        Ok(Vocabulary {
            word2id,
            id2word,
            counts,
            total_tokens,
            pruned,
            types,
        })
    }
}

/// Assign a dense `NodeType` to every vocabulary word.
///
/// Fails when typing gives every word a type of its own, since each
/// negative drawn would then be the context itself.
fn intern_types(id2word: &[String], typing: &NodeTyping) -> MetapathResult<TypeIndex> {
    let mut interned: HashMap<&str, NodeType> = HashMap::new();
    let mut names = Vec::new();
    let mut type_of = Vec::with_capacity(id2word.len());
    for word in id2word {
        let label = typing.label(word);
        let t = match interned.get(label) {
            Some(&t) => t,
            None => {
                let t = u16::try_from(names.len()).map(NodeType).map_err(|_| {
                    MetapathError::config(format!(
                        "more than {} node types; typed negatives need a node_types file",
                        u16::MAX as usize + 1
                    ))
                })?;
                interned.insert(label, t);
                names.push(label.to_string());
                t
            }
        };
        type_of.push(t);
    }
    if id2word.len() > 1 && names.len() == id2word.len() {
        return Err(MetapathError::config(format!(
            "every one of the {} tokens has its own node type; \
             supply a node_types file or set care_type to 0",
            id2word.len()
        )));
    }
    Ok(TypeIndex { type_of, names })
}

/// Immutable token <-> id mapping with per-id frequencies.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    word2id: HashMap<String, u32>,
    id2word: Vec<String>,
    counts: Vec<u64>,
    total_tokens: u64,
    pruned: HashSet<String>,
    types: Option<TypeIndex>,
}

impl Vocabulary {
    pub fn len(&self) -> usize {
        self.id2word.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id2word.is_empty()
    }

    pub fn id(&self, token: &str) -> Option<u32> {
        self.word2id.get(token).copied()
    }

    pub fn word(&self, id: u32) -> Option<&str> {
        self.id2word.get(id as usize).map(String::as_str)
    }

    pub fn word2id(&self) -> &HashMap<String, u32> {
        &self.word2id
    }

    pub fn id2word(&self) -> &[String] {
        &self.id2word
    }

    /// Frequency table, parallel to `id2word`.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn count(&self, id: u32) -> u64 {
        self.counts[id as usize]
    }

    /// Sum of retained counts.
    pub fn total_tokens(&self) -> u64 {
        self.total_tokens
    }

    /// Type partitions, present only when built with `care_type`.
    pub fn types(&self) -> Option<&TypeIndex> {
        self.types.as_ref()
    }

    /// Node type of `id`; everything shares `NodeType(0)` without partitions.
    pub fn node_type(&self, id: u32) -> NodeType {
        self.types.as_ref().map(|t| t.type_of(id)).unwrap_or_default()
    }

    /// Map a walk's tokens to ids.
    ///
    /// Tokens dropped by `min_count` are skipped; a token the counting pass
    /// never saw makes the whole walk unusable.
    pub fn encode_walk<S: AsRef<str>>(&self, index: usize, walk: &[S]) -> Result<Walk, CorpusError> {
        if walk.is_empty() {
            return Err(CorpusError::EmptyWalk { index });
        }
        let mut ids = Vec::with_capacity(walk.len());
        for token in walk {
            let token = token.as_ref();
            match self.word2id.get(token) {
                Some(&id) => ids.push(id),
                None if self.pruned.contains(token) => {}
                None => {
                    return Err(CorpusError::UnresolvedToken {
                        index,
                        token: token.to_string(),
                    })
                }
            }
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walks(lines: &[&str]) -> Vec<Vec<String>> {
        lines
            .iter()
            .map(|l| l.split_whitespace().map(String::from).collect())
            .collect()
    }

    #[test]
    fn test_ids_by_descending_count() {
        let corpus = walks(&["a1 v1 a2", "a2 v1 a2", "p1 a1 a2"]);
        let vocab = VocabularyBuilder::new(1, false).build(&corpus, &NodeTyping::Prefix).unwrap();
        // a2:4, a1:2, v1:2 (a1 seen first), p1:1
        assert_eq!(vocab.id2word(), &["a2", "a1", "v1", "p1"]);
        assert_eq!(vocab.counts(), &[4, 2, 2, 1]);
        assert_eq!(vocab.total_tokens(), 9);
    }

    #[test]
    fn test_bijection_and_min_count() {
        let corpus = walks(&["x y z x", "x y w", "x q"]);
        let vocab = VocabularyBuilder::new(2, false).build(&corpus, &NodeTyping::Prefix).unwrap();
        assert_eq!(vocab.len(), 2);
        for (id, word) in vocab.id2word().iter().enumerate() {
            assert_eq!(vocab.id(word), Some(id as u32));
            assert!(vocab.count(id as u32) >= 2);
        }
        assert_eq!(vocab.word2id().len(), vocab.len());
    }

    #[test]
    fn test_empty_vocabulary_is_configuration_error() {
        let corpus = walks(&["a b", "c d"]);
        let err = VocabularyBuilder::new(5, false).build(&corpus, &NodeTyping::Prefix).unwrap_err();
        assert!(matches!(err, MetapathError::Configuration(_)));
    }

    #[test]
    fn test_encode_walk_skips_pruned_and_rejects_unknown() {
        let corpus = walks(&["a a b", "a c"]);
        let vocab = VocabularyBuilder::new(2, false).build(&corpus, &NodeTyping::Prefix).unwrap();
        assert_eq!(vocab.encode_walk(0, &["a", "b", "a"]).unwrap(), vec![0, 0]);
        assert_eq!(
            vocab.encode_walk(4, &["a", "zzz"]).unwrap_err(),
            CorpusError::UnresolvedToken { index: 4, token: "zzz".into() }
        );
        let empty: [&str; 0] = [];
        assert_eq!(vocab.encode_walk(1, &empty).unwrap_err(), CorpusError::EmptyWalk { index: 1 });
    }

    #[test]
    fn test_type_partitions() {
        let corpus = walks(&["a1 v1 a2 v1", "a1 p7"]);
        let vocab = VocabularyBuilder::new(1, true).build(&corpus, &NodeTyping::Prefix).unwrap();
        let types = vocab.types().unwrap();
        assert_eq!(types.n_types(), 3);
        let a1 = vocab.id("a1").unwrap();
        let a2 = vocab.id("a2").unwrap();
        let v1 = vocab.id("v1").unwrap();
        assert_eq!(vocab.node_type(a1), vocab.node_type(a2));
        assert_ne!(vocab.node_type(a1), vocab.node_type(v1));
        let total: usize = types.partitions().iter().map(Vec::len).sum();
        assert_eq!(total, vocab.len());
    }

    #[test]
    fn test_one_type_per_token_rejected() {
        let corpus = walks(&["alice bob carol dave"; 5]);
        let err = VocabularyBuilder::new(1, true).build(&corpus, &NodeTyping::Prefix).unwrap_err();
        assert!(matches!(err, MetapathError::Configuration(ref m) if m.contains("node_types")));
        // Untyped training over the same corpus is fine.
        assert!(VocabularyBuilder::new(1, false).build(&corpus, &NodeTyping::Prefix).is_ok());
    }

    #[test]
    fn test_type_ids_overflow_is_configuration_error() {
        let words: Vec<String> = (0..=u16::MAX as usize + 1).map(|i| format!("t{}", i)).collect();
        let labels = words.iter().map(|w| (w.clone(), w.clone())).collect();
        let err = intern_types(&words, &NodeTyping::Lookup(labels)).unwrap_err();
        assert!(matches!(err, MetapathError::Configuration(ref m) if m.contains("65536")));
    }

    #[test]
    fn test_lookup_typing_falls_back_to_prefix() {
        let mut map = HashMap::new();
        map.insert("42".to_string(), "author".to_string());
        let typing = NodeTyping::Lookup(map);
        assert_eq!(typing.label("42"), "author");
        assert_eq!(typing.label("v9"), "v");
    }

    #[test]
    fn test_untyped_vocab_shares_one_type() {
        let corpus = walks(&["a1 v1"]);
        let vocab = VocabularyBuilder::new(1, false).build(&corpus, &NodeTyping::Prefix).unwrap();
        assert!(vocab.types().is_none());
        assert_eq!(vocab.node_type(0), NodeType(0));
        assert_eq!(vocab.node_type(1), NodeType(0));
    }
}
