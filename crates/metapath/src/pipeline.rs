//! End-to-end training: corpus in, embedding file out.

use crate::trainer::{Trainer, TrainingReport};
use metapath_core::{MetapathResult, TrainConfig};
use metapath_data::sampling::DEFAULT_POWER;
use metapath_data::{
    Collator, NegativeSampler, NodeTyping, PairGenerator, Vocabulary, VocabularyBuilder,
    WalkDataset, WalkLoader,
};
use metapath_io::{read_node_types, read_walks, write_embeddings};
use metapath_nn::SkipGram;
use tracing::info;

/// A configured run: raw walks, the vocabulary built over them, the
/// negative sampler and a freshly initialized model.
pub struct Metapath2Vec {
    config: TrainConfig,
    walks: Vec<Vec<String>>,
    vocab: Vocabulary,
    sampler: NegativeSampler,
    pairs: PairGenerator,
    model: SkipGram,
}

impl Metapath2Vec {
    /// Validate `config`, read the corpus (and node types, if configured)
    /// and build everything training needs.
    pub fn from_config(config: TrainConfig) -> MetapathResult<Self> {
        config.validate()?;
        let walks = read_walks(&config.path)?;
        let typing = match &config.node_types {
            Some(path) => NodeTyping::Lookup(read_node_types(path)?),
            None => NodeTyping::Prefix,
        };
        Self::from_walks(config, walks, &typing)
    }

    /// Same as [`from_config`](Self::from_config) over walks already in memory.
    pub fn from_walks(
        config: TrainConfig,
        walks: Vec<Vec<String>>,
        typing: &NodeTyping,
    ) -> MetapathResult<Self> {
        config.validate()?;
        let vocab = VocabularyBuilder::new(config.min_count, config.typed_negatives())
            .build(&walks, typing)?;
        info!(
            tokens = vocab.total_tokens(),
            vocab = vocab.len(),
            types = vocab.types().map_or(1, |t| t.n_types()),
            "vocabulary built"
        );

        let sampler = NegativeSampler::build(&vocab, config.table_size, DEFAULT_POWER);
        let pairs = PairGenerator::new(&vocab, config.window_size, config.subsample_threshold);
        let model = SkipGram::new(vocab.len(), config.embedding_dim, config.seed);

        Ok(Metapath2Vec {
            config,
            walks,
            vocab,
            sampler,
            pairs,
            model,
        })
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn model(&self) -> &SkipGram {
        &self.model
    }

    /// Run every iteration, leaving the trained tables in place.
    pub fn fit(&mut self) -> MetapathResult<TrainingReport> {
        let dataset = WalkDataset::new(&self.walks, &self.vocab);
        let collator = Collator::new(&self.vocab, &self.pairs, &self.sampler, self.config.negatives);
        let loader = WalkLoader::new(&dataset, collator, self.config.batch_size)
            .with_workers(self.config.worker_count, self.config.prefetch)
            .with_seed(self.config.seed);

        Trainer::new(self.config.iterations, self.config.initial_lr)
            .with_log_every(self.config.log_every)
            .fit(&mut self.model, &loader)
    }

    /// Train, then write the input embeddings to `output_path`.
    ///
    /// Nothing is written if training fails.
    pub fn train(mut self) -> MetapathResult<TrainingReport> {
        let report = self.fit()?;
        write_embeddings(&self.config.output_path, self.vocab.id2word(), self.model.input())?;
        info!(
            path = %self.config.output_path.display(),
            steps = report.steps,
            "embeddings saved"
        );
        Ok(report)
    }
}
