//! Negative sampling tables.
//!
//! A table is a flat array of vocabulary ids in which each id occupies a
//! number of slots proportional to `count^power`. Drawing a negative is a
//! single uniform index into that array.

use crate::vocab::{NodeType, Vocabulary};
use rand::Rng;
use tracing::warn;

pub const DEFAULT_POWER: f64 = 0.75;
pub const DEFAULT_TABLE_SIZE: usize = 100_000_000;

/// Unigram table over a set of ids.
#[derive(Debug, Clone)]
pub struct SamplingTable {
    slots: Vec<u32>,
}

impl SamplingTable {
    /// Build a table of exactly `size` slots over `ids` with raw `counts`.
    ///
    /// Slot counts use largest-remainder rounding so the table is full and
    /// an id never gets fewer slots than a less frequent one.
    pub fn new(ids: &[u32], counts: &[u64], size: usize, power: f64) -> Self {
        assert_eq!(ids.len(), counts.len(), "ids and counts must be parallel");
        if ids.is_empty() || size == 0 {
            return SamplingTable { slots: Vec::new() };
        }

        let weights: Vec<f64> = counts.iter().map(|&c| (c as f64).powf(power)).collect();
        let total: f64 = weights.iter().sum();
        let quotas: Vec<f64> = weights.iter().map(|w| w / total * size as f64).collect();

        let mut alloc: Vec<usize> = quotas.iter().map(|q| q.floor() as usize).collect();
        let assigned: usize = alloc.iter().sum();
        let mut remaining = size.saturating_sub(assigned);

        let mut by_remainder: Vec<usize> = (0..ids.len()).collect();
        by_remainder.sort_by(|&a, &b| {
            let ra = quotas[a] - quotas[a].floor();
            let rb = quotas[b] - quotas[b].floor();
            rb.partial_cmp(&ra)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(counts[b].cmp(&counts[a]))
                .then(a.cmp(&b))
        });
        for &i in by_remainder.iter().cycle() {
            if remaining == 0 {
                break;
            }
            alloc[i] += 1;
            remaining -= 1;
        }

        let mut slots = Vec::with_capacity(size);
        for (&id, &n) in ids.iter().zip(&alloc) {
            slots.extend(std::iter::repeat(id).take(n));
        }
        slots.truncate(size);
        SamplingTable { slots }
    }

    /// Table over a whole vocabulary (ids `0..counts.len()`).
    pub fn from_counts(counts: &[u64], size: usize, power: f64) -> Self {
        let ids: Vec<u32> = (0..counts.len() as u32).collect();
        SamplingTable::new(&ids, counts, size, power)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots held by each id in `0..n_ids`.
    pub fn slot_counts(&self, n_ids: usize) -> Vec<usize> {
        let mut out = vec![0; n_ids];
        for &id in &self.slots {
            if let Some(c) = out.get_mut(id as usize) {
                *c += 1;
            }
        }
        out
    }

    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        self.slots[rng.gen_range(0..self.slots.len())]
    }

    pub fn sample_into<R: Rng + ?Sized>(&self, k: usize, rng: &mut R, out: &mut Vec<u32>) {
        out.extend((0..k).map(|_| self.draw(rng)));
    }

    pub fn sample<R: Rng + ?Sized>(&self, k: usize, rng: &mut R) -> Vec<u32> {
        let mut out = Vec::with_capacity(k);
        self.sample_into(k, rng, &mut out);
        out
    }
}

/// Where negatives come from, fixed when the vocabulary is built.
#[derive(Debug, Clone)]
pub enum NegativeSampler {
    /// One table over the whole vocabulary.
    Global(SamplingTable),
    /// One table per node type, indexed by `NodeType`.
    Partitioned(Vec<SamplingTable>),
}

impl NegativeSampler {
    /// Global table unless the vocabulary carries type partitions.
    pub fn build(vocab: &Vocabulary, size: usize, power: f64) -> Self {
        match vocab.types() {
            None => NegativeSampler::Global(SamplingTable::from_counts(vocab.counts(), size, power)),
            Some(types) => {
                let parts = types.partitions();
                for (name, ids) in types.names().iter().zip(&parts) {
                    if ids.len() == 1 {
                        warn!(node_type = %name, "node type has a single token; its negatives always equal the context");
                    }
                }
                let mass: Vec<f64> = parts
                    .iter()
                    .map(|ids| ids.iter().map(|&id| (vocab.count(id) as f64).powf(power)).sum())
                    .collect();
                let total: f64 = mass.iter().sum();
                let tables = parts
                    .iter()
                    .zip(&mass)
                    .map(|(ids, m)| {
                        let part_size = ((size as f64 * m / total).round() as usize).max(1);
                        let counts: Vec<u64> = ids.iter().map(|&id| vocab.count(id)).collect();
                        SamplingTable::new(ids, &counts, part_size, power)
                    })
                    .collect();
                NegativeSampler::Partitioned(tables)
            }
        }
    }

    pub fn is_partitioned(&self) -> bool {
        matches!(self, NegativeSampler::Partitioned(_))
    }

    /// Append `k` negatives for a context of type `context_type`.
    pub fn sample_into<R: Rng + ?Sized>(
        &self,
        context_type: NodeType,
        k: usize,
        rng: &mut R,
        out: &mut Vec<u32>,
    ) {
        let table = match self {
            NegativeSampler::Global(table) => table,
            NegativeSampler::Partitioned(tables) => &tables[context_type.0 as usize],
        };
        table.sample_into(k, rng, out);
    }

    pub fn sample<R: Rng + ?Sized>(&self, context_type: NodeType, k: usize, rng: &mut R) -> Vec<u32> {
        let mut out = Vec::with_capacity(k);
        self.sample_into(context_type, k, rng, &mut out);
        out
    }
}
