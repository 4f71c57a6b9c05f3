use crate::vocab::Vocabulary;
use rand::Rng;

pub const DEFAULT_SUBSAMPLE_THRESHOLD: f64 = 1e-3;

/// Turns walks into `(center, context)` skip-gram pairs.
///
/// Each token occurrence survives subsampling with probability
/// `min(1, sqrt(t / f) + t / f)`, where `f` is its corpus frequency ratio.
/// Dropped occurrences take no part in any pair. Windows are measured in
/// positions of the full walk, before subsampling.
#[derive(Debug, Clone)]
pub struct PairGenerator {
    window: usize,
    keep_probs: Option<Vec<f32>>,
}

impl PairGenerator {
    pub fn new(vocab: &Vocabulary, window: usize, threshold: f64) -> Self {
        let total = vocab.total_tokens() as f64;
        let keep_probs = vocab
            .counts()
            .iter()
            .map(|&c| {
                let ratio = threshold / (c as f64 / total);
                (ratio.sqrt() + ratio).min(1.0) as f32
            })
            .collect();
        PairGenerator {
            window,
            keep_probs: Some(keep_probs),
        }
    }

    /// Every occurrence is kept.
    pub fn without_subsampling(window: usize) -> Self {
        PairGenerator {
            window,
            keep_probs: None,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn keep_probability(&self, id: u32) -> f32 {
        match &self.keep_probs {
            Some(p) => p[id as usize],
            None => 1.0,
        }
    }

    /// Lazily enumerate the pairs of one walk.
    ///
    /// Subsampling is decided afresh on every call, so two calls on the
    /// same walk usually differ.
    pub fn pairs<'w, R: Rng + ?Sized>(&self, walk: &'w [u32], rng: &mut R) -> Pairs<'w> {
        let kept = walk
            .iter()
            .map(|&id| {
                let p = self.keep_probability(id);
                p >= 1.0 || rng.gen::<f32>() < p
            })
            .collect();
        Pairs {
            walk,
            kept,
            window: self.window,
            center: 0,
            cursor: 0,
        }
    }
}

/// Pairs of one walk, center-major in walk order.
#[derive(Debug, Clone)]
pub struct Pairs<'w> {
    walk: &'w [u32],
    kept: Vec<bool>,
    window: usize,
    center: usize,
    cursor: usize,
}

impl<'w> Iterator for Pairs<'w> {
    type Item = (u32, u32);

    fn next(&mut self) -> Option<Self::Item> {
        let len = self.walk.len();
        while self.center < len {
            if self.kept[self.center] {
                let hi = (self.center + self.window).min(len - 1);
                while self.cursor <= hi {
                    let j = self.cursor;
                    self.cursor += 1;
                    if j != self.center && self.kept[j] {
                        return Some((self.walk[self.center], self.walk[j]));
                    }
                }
            }
            self.center += 1;
            self.cursor = self.center.saturating_sub(self.window);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::{NodeTyping, VocabularyBuilder};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn expected_pairs(len: usize, w: usize) -> usize {
        (0..len).map(|i| i.min(w) + (len - 1 - i).min(w)).sum()
    }

    #[test]
    fn test_unsubsampled_pair_count() {
        let mut rng = StdRng::seed_from_u64(0);
        for &(len, w) in &[(1, 2), (2, 1), (5, 2), (10, 2), (10, 5), (7, 20)] {
            let walk: Vec<u32> = (0..len as u32).collect();
            let gen = PairGenerator::without_subsampling(w);
            assert_eq!(gen.pairs(&walk, &mut rng).count(), expected_pairs(len, w), "len={} w={}", len, w);
        }
    }

    #[test]
    fn test_pairs_within_window_in_walk_order() {
        let walk = vec![10, 11, 12, 13];
        let mut rng = StdRng::seed_from_u64(0);
        let pairs: Vec<_> = PairGenerator::without_subsampling(1).pairs(&walk, &mut rng).collect();
        assert_eq!(
            pairs,
            vec![(10, 11), (11, 10), (11, 12), (12, 11), (12, 13), (13, 12)]
        );
    }

    #[test]
    fn test_repeated_token_pairs_with_itself_at_other_positions() {
        let walk = vec![3, 3];
        let mut rng = StdRng::seed_from_u64(0);
        let pairs: Vec<_> = PairGenerator::without_subsampling(2).pairs(&walk, &mut rng).collect();
        assert_eq!(pairs, vec![(3, 3), (3, 3)]);
    }

    #[test]
    fn test_subsampling_only_removes_pairs() {
        // One dominant token so its keep probability is well below one.
        let mut corpus = vec![vec!["hub".to_string(); 50]];
        corpus.push((0..20).map(|i| format!("n{}", i)).collect());
        let vocab = VocabularyBuilder::new(1, false).build(&corpus, &NodeTyping::Prefix).unwrap();
        let gen = PairGenerator::new(&vocab, 3, 1e-2);
        let hub = vocab.id("hub").unwrap();
        assert!(gen.keep_probability(hub) < 1.0);

        let walk: Vec<u32> = corpus[0].iter().chain(&corpus[1]).map(|t| vocab.id(t).unwrap()).collect();
        let full: Vec<_> = PairGenerator::without_subsampling(3)
            .pairs(&walk, &mut StdRng::seed_from_u64(0))
            .collect();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..5 {
            let sub: Vec<_> = gen.pairs(&walk, &mut rng).collect();
            assert!(sub.len() <= full.len());
            assert!(sub.iter().all(|p| full.contains(p)));
        }
    }

    #[test]
    fn test_subsampling_redrawn_on_every_call() {
        let mut corpus = vec![vec!["hub".to_string(); 30]];
        corpus.push((0..10).map(|i| format!("n{}", i)).collect());
        let vocab = VocabularyBuilder::new(1, false).build(&corpus, &NodeTyping::Prefix).unwrap();
        let gen = PairGenerator::new(&vocab, 2, 1e-2);
        let walk: Vec<u32> = corpus[0].iter().map(|t| vocab.id(t).unwrap()).collect();

        let mut rng = StdRng::seed_from_u64(21);
        let first: Vec<_> = gen.pairs(&walk, &mut rng).collect();
        let differs = (0..20).any(|_| gen.pairs(&walk, &mut rng).count() != first.len());
        assert!(differs);
    }

    #[test]
    fn test_keep_probability_formula() {
        let corpus: Vec<Vec<String>> = vec![(0..100).map(|i| format!("t{}", i)).collect()];
        let vocab = VocabularyBuilder::new(1, false).build(&corpus, &NodeTyping::Prefix).unwrap();
        let gen = PairGenerator::new(&vocab, 2, 1e-3);
        // f = 0.01, so t / f = 0.1
        let expected = (0.1f64.sqrt() + 0.1) as f32;
        assert_relative_eq!(gen.keep_probability(0), expected, epsilon = 1e-6);
    }
}
