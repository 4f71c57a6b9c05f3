use crate::pairs::PairGenerator;
use crate::sampling::NegativeSampler;
use crate::vocab::{Vocabulary, Walk};
use rand::Rng;

/// Fixed-shape training batch: `N` positive pairs with `k` negatives each.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    pub centers: Vec<u32>,
    pub contexts: Vec<u32>,
    /// Row-major `[N, k]`.
    pub negatives: Vec<u32>,
    pub k: usize,
    /// Walks in this batch that could not be used.
    pub skipped_walks: usize,
}

impl Batch {
    pub fn with_k(k: usize) -> Self {
        Batch {
            k,
            ..Batch::default()
        }
    }

    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    pub fn negatives_for(&self, i: usize) -> &[u32] {
        &self.negatives[i * self.k..(i + 1) * self.k]
    }

    /// Batches of at most one pair carry no usable signal.
    pub fn is_trainable(&self) -> bool {
        self.len() > 1
    }
}

/// Flattens the pairs of several walks into one [`Batch`].
#[derive(Debug, Clone, Copy)]
pub struct Collator<'a> {
    vocab: &'a Vocabulary,
    pairs: &'a PairGenerator,
    sampler: &'a NegativeSampler,
    k: usize,
}

impl<'a> Collator<'a> {
    pub fn new(
        vocab: &'a Vocabulary,
        pairs: &'a PairGenerator,
        sampler: &'a NegativeSampler,
        k: usize,
    ) -> Self {
        Collator { vocab, pairs, sampler, k }
    }

    pub fn negatives_per_pair(&self) -> usize {
        self.k
    }

    /// Append every surviving pair of `walk`, each with `k` fresh negatives.
    pub fn push_walk<R: Rng + ?Sized>(&self, batch: &mut Batch, walk: &[u32], rng: &mut R) {
        for (center, context) in self.pairs.pairs(walk, rng) {
            batch.centers.push(center);
            batch.contexts.push(context);
            let context_type = self.vocab.node_type(context);
            self.sampler.sample_into(context_type, self.k, rng, &mut batch.negatives);
        }
    }

    pub fn collate<R: Rng + ?Sized>(&self, walks: &[Walk], rng: &mut R) -> Batch {
        let mut batch = Batch::with_k(self.k);
        for walk in walks {
            self.push_walk(&mut batch, walk, rng);
        }
        batch
    }
}
