use crate::collate::{Batch, Collator};
use crate::dataset::Dataset;
use metapath_core::rng::stream_rng;
use metapath_core::MetapathResult;
use rand::seq::SliceRandom;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use tracing::debug;

const SHUFFLE_STREAM: u64 = 0x5348_5546;
const BATCH_STREAM: u64 = 0x4241_5443;

/// Splits a walk dataset into collated mini-batches, one epoch at a time.
///
/// With `workers > 0`, batches are prepared on scoped worker threads and
/// handed over through a bounded channel; workers block once `prefetch`
/// batches per worker are waiting. Arrival order is not submission order.
pub struct WalkLoader<'a, D: Dataset> {
    dataset: &'a D,
    collator: Collator<'a>,
    batch_size: usize,
    shuffle: bool,
    workers: usize,
    prefetch: usize,
    seed: u64,
}

impl<'a, D: Dataset + Sync> WalkLoader<'a, D> {
    pub fn new(dataset: &'a D, collator: Collator<'a>, batch_size: usize) -> Self {
        WalkLoader {
            dataset,
            collator,
            batch_size: batch_size.max(1),
            shuffle: true,
            workers: 0,
            prefetch: 2,
            seed: 42,
        }
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn with_workers(mut self, workers: usize, prefetch: usize) -> Self {
        self.workers = workers;
        self.prefetch = prefetch.max(1);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Batches per epoch.
    pub fn len(&self) -> usize {
        self.dataset.len().div_ceil(self.batch_size)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Walk indices of every batch in `epoch`, reshuffled per epoch.
    pub fn epoch_plan(&self, epoch: usize) -> Vec<Vec<usize>> {
        let mut indices: Vec<usize> = (0..self.dataset.len()).collect();
        if self.shuffle {
            let mut rng = stream_rng(self.seed, &[SHUFFLE_STREAM, epoch as u64]);
            indices.shuffle(&mut rng);
        }
        indices.chunks(self.batch_size).map(<[usize]>::to_vec).collect()
    }

    /// Collate one batch. Deterministic in `(seed, epoch, batch)`.
    pub fn prepare(&self, epoch: usize, batch: usize, indices: &[usize]) -> Batch {
        let mut rng = stream_rng(self.seed, &[BATCH_STREAM, epoch as u64, batch as u64]);
        let mut out = Batch::with_k(self.collator.negatives_per_pair());
        for &idx in indices {
            match self.dataset.get(idx) {
                Ok(walk) => self.collator.push_walk(&mut out, &walk, &mut rng),
                Err(err) => {
                    debug!(%err, "skipping walk");
                    out.skipped_walks += 1;
                }
            }
        }
        out
    }

    /// Feed every batch of `epoch` to `f` exactly once.
    ///
    /// An error from `f` stops the epoch; workers notice the closed channel
    /// and exit before this returns.
    pub fn for_each_batch<F>(&self, epoch: usize, mut f: F) -> MetapathResult<()>
    where
        F: FnMut(usize, Batch) -> MetapathResult<()>,
    {
        let plan = self.epoch_plan(epoch);

        if self.workers == 0 {
            for (i, indices) in plan.iter().enumerate() {
                f(i, self.prepare(epoch, i, indices))?;
            }
            return Ok(());
        }

        let cursor = AtomicUsize::new(0);
        thread::scope(|scope| {
            let (tx, rx) = mpsc::sync_channel(self.workers * self.prefetch);
            for _ in 0..self.workers {
                let tx = tx.clone();
                let plan = &plan;
                let cursor = &cursor;
                scope.spawn(move || loop {
                    let i = cursor.fetch_add(1, Ordering::Relaxed);
                    let Some(indices) = plan.get(i) else { break };
                    let batch = self.prepare(epoch, i, indices);
                    if tx.send((i, batch)).is_err() {
                        break;
                    }
                });
            }
            drop(tx);

            for (i, batch) in rx {
                f(i, batch)?;
            }
            Ok(())
        })
    }
}
