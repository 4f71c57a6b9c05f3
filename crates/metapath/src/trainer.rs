use metapath_core::MetapathResult;
use metapath_data::{Dataset, WalkLoader};
use metapath_nn::{Gradients, SkipGram};
use metapath_optim::{CosineAnnealingLR, SparseAdam};
use tracing::{debug, info};

/// Where the training loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainerState {
    Idle,
    EpochRunning { epoch: usize },
    StepRunning { epoch: usize, step: usize },
    Done,
}

/// Summary of a finished run.
#[derive(Debug, Clone, Default)]
pub struct TrainingReport {
    /// Optimizer steps taken (skipped batches excluded).
    pub steps: usize,
    pub skipped_batches: usize,
    pub skipped_walks: usize,
    /// Mean step loss of each epoch.
    pub epoch_losses: Vec<f32>,
    /// Smoothed loss at the end of the last epoch.
    pub running_loss: f32,
    pub final_lr: f64,
}

/// Drives epochs of sparse Adam updates with a run-wide cosine schedule.
pub struct Trainer {
    pub iterations: usize,
    pub initial_lr: f64,
    pub log_every: usize,
    state: TrainerState,
}

impl Trainer {
    pub fn new(iterations: usize, initial_lr: f64) -> Self {
        Trainer {
            iterations,
            initial_lr,
            log_every: 500,
            state: TrainerState::Idle,
        }
    }

    pub fn with_log_every(mut self, log_every: usize) -> Self {
        self.log_every = log_every;
        self
    }

    pub fn state(&self) -> TrainerState {
        self.state
    }

    fn transition(&mut self, next: TrainerState) {
        debug!(from = ?self.state, to = ?next, "trainer state");
        self.state = next;
    }

    /// Train `model` for the configured number of iterations.
    ///
    /// Each valid step runs zero-grad, forward, backward, a sparse Adam
    /// update, then advances the schedule. Batches with fewer than two
    /// pairs are skipped without touching optimizer or schedule.
    pub fn fit<D: Dataset + Sync>(
        &mut self,
        model: &mut SkipGram,
        loader: &WalkLoader<'_, D>,
    ) -> MetapathResult<TrainingReport> {
        let shapes = [
            (model.vocab_size(), model.dim()),
            (model.vocab_size(), model.dim()),
        ];
        let mut optimizer = SparseAdam::new(&shapes, self.initial_lr);
        let total_steps = self.iterations * loader.len();
        let mut scheduler = CosineAnnealingLR::new(self.initial_lr, total_steps);
        let mut grads = Gradients::new(model.dim());
        let mut report = TrainingReport::default();

        info!(
            iterations = self.iterations,
            batches_per_epoch = loader.len(),
            vocab = model.vocab_size(),
            dim = model.dim(),
            "starting training"
        );

        for epoch in 0..self.iterations {
            self.transition(TrainerState::EpochRunning { epoch });
            info!("Iteration: {}", epoch + 1);

            let mut running_loss = 0.0f32;
            let mut epoch_loss = 0.0f64;
            let mut epoch_steps = 0usize;
            let log_every = self.log_every;

            loader.for_each_batch(epoch, |i, batch| {
                report.skipped_walks += batch.skipped_walks;
                if !batch.is_trainable() {
                    debug!(batch = i, pairs = batch.len(), "skipping batch");
                    report.skipped_batches += 1;
                    return Ok(());
                }
                self.state = TrainerState::StepRunning { epoch, step: i };

                grads.zero();
                let fwd = model.forward(&batch);
                model.backward(&batch, &fwd, &mut grads);

                optimizer.set_lr(scheduler.get_lr());
                let (input, output) = model.parameters_mut();
                optimizer.step(&mut [input, output], &[&grads.input, &grads.output]);
                scheduler.step();

                running_loss = running_loss * 0.9 + fwd.loss * 0.1;
                epoch_loss += fwd.loss as f64;
                epoch_steps += 1;
                report.steps += 1;
                if log_every > 0 && report.steps % log_every == 0 {
                    info!(step = report.steps, loss = running_loss, lr = optimizer.lr, "Loss: {}", running_loss);
                }

                self.state = TrainerState::EpochRunning { epoch };
                Ok(())
            })?;

            let mean = if epoch_steps == 0 { 0.0 } else { (epoch_loss / epoch_steps as f64) as f32 };
            report.epoch_losses.push(mean);
            report.running_loss = running_loss;
            info!(
                epoch = epoch + 1,
                mean_loss = mean,
                steps = epoch_steps,
                skipped_batches = report.skipped_batches,
                "epoch finished"
            );
        }

        report.final_lr = scheduler.get_lr();
        self.transition(TrainerState::Done);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metapath_data::sampling::DEFAULT_POWER;
    use metapath_data::{Collator, EncodedWalks, NegativeSampler, PairGenerator, Vocabulary};
    use metapath_data::{NodeTyping, VocabularyBuilder};

    /// Two cliques of tokens that only ever co-occur within their clique.
    fn clique_corpus() -> Vec<Vec<String>> {
        let mut walks = Vec::new();
        for i in 0..60 {
            let group = if i % 2 == 0 { "a" } else { "b" };
            walks.push((0..8).map(|j| format!("{}{}", group, (i + j) % 4)).collect());
        }
        walks
    }

    fn encode(vocab: &Vocabulary, corpus: &[Vec<String>]) -> EncodedWalks {
        EncodedWalks::new(
            corpus
                .iter()
                .enumerate()
                .map(|(i, w)| vocab.encode_walk(i, w).unwrap())
                .collect(),
        )
    }

    #[test]
    fn test_loss_decreases_and_state_ends_done() {
        let corpus = clique_corpus();
        let vocab = VocabularyBuilder::new(1, false).build(&corpus, &NodeTyping::Prefix).unwrap();
        let ds = encode(&vocab, &corpus);
        let pairs = PairGenerator::without_subsampling(2);
        let sampler = NegativeSampler::build(&vocab, 10_000, DEFAULT_POWER);
        let loader = WalkLoader::new(&ds, Collator::new(&vocab, &pairs, &sampler, 3), 6).with_seed(1);

        let mut model = SkipGram::new(vocab.len(), 8, 3);
        let mut trainer = Trainer::new(8, 0.05);
        assert_eq!(trainer.state(), TrainerState::Idle);
        let report = trainer.fit(&mut model, &loader).unwrap();

        assert_eq!(trainer.state(), TrainerState::Done);
        assert_eq!(report.steps, 8 * loader.len());
        assert_eq!(report.epoch_losses.len(), 8);
        let first = report.epoch_losses[0];
        let last = *report.epoch_losses.last().unwrap();
        assert!(last < first, "loss did not drop: {:?}", report.epoch_losses);
        assert!(report.epoch_losses.iter().all(|l| *l >= 0.0));
        assert!(report.final_lr < 1e-6);
    }

    #[test]
    fn test_learns_clique_structure() {
        let corpus = clique_corpus();
        let vocab = VocabularyBuilder::new(1, false).build(&corpus, &NodeTyping::Prefix).unwrap();
        let ds = encode(&vocab, &corpus);
        let pairs = PairGenerator::without_subsampling(2);
        let sampler = NegativeSampler::build(&vocab, 10_000, DEFAULT_POWER);
        let loader = WalkLoader::new(&ds, Collator::new(&vocab, &pairs, &sampler, 3), 6).with_seed(2);

        let mut model = SkipGram::new(vocab.len(), 8, 5);
        Trainer::new(15, 0.05).fit(&mut model, &loader).unwrap();

        // Same-clique centers predict each other's contexts; cross-clique
        // scores are pushed down by the negatives.
        let score = |x: &str, y: &str| {
            model.input().dot_rows(vocab.id(x).unwrap() as usize, model.output(), vocab.id(y).unwrap() as usize)
        };
        assert!(score("a0", "a1") > score("a0", "b1"));
        assert!(score("b2", "b3") > score("b2", "a3"));
    }

    #[test]
    fn test_tiny_batches_skipped_without_steps() {
        let corpus: Vec<Vec<String>> = vec![vec!["x".into(), "y".into()], vec!["x".into()]];
        let vocab = VocabularyBuilder::new(1, false).build(&corpus, &NodeTyping::Prefix).unwrap();
        let ds = encode(&vocab, &corpus);
        let pairs = PairGenerator::without_subsampling(1);
        let sampler = NegativeSampler::build(&vocab, 100, DEFAULT_POWER);
        // One walk per batch: the 2-token walk yields 2 pairs, the other none.
        let loader = WalkLoader::new(&ds, Collator::new(&vocab, &pairs, &sampler, 2), 1);

        let mut model = SkipGram::new(vocab.len(), 4, 0);
        let report = Trainer::new(3, 0.02).fit(&mut model, &loader).unwrap();
        assert_eq!(report.steps, 3);
        assert_eq!(report.skipped_batches, 3);
        // 3 of 6 planned steps taken: the schedule stopped halfway down.
        assert!((report.final_lr - 0.01).abs() < 1e-12, "final lr {}", report.final_lr);
    }

    #[test]
    fn test_single_token_vocabulary_trains() {
        let corpus: Vec<Vec<String>> = vec![vec!["solo".into(); 5]; 4];
        let vocab = VocabularyBuilder::new(1, false).build(&corpus, &NodeTyping::Prefix).unwrap();
        let ds = encode(&vocab, &corpus);
        let pairs = PairGenerator::without_subsampling(2);
        let sampler = NegativeSampler::build(&vocab, 10, DEFAULT_POWER);
        let loader = WalkLoader::new(&ds, Collator::new(&vocab, &pairs, &sampler, 2), 2);
        let mut model = SkipGram::new(1, 4, 0);
        let report = Trainer::new(2, 0.02).fit(&mut model, &loader).unwrap();
        assert!(report.steps > 0);
        assert!(model.input().data().iter().all(|v| v.is_finite()));
    }
}
