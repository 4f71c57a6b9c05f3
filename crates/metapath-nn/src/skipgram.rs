use crate::loss::{clip_score, pair_loss, sigmoid};
use metapath_core::{EmbeddingTable, SparseGrad};
use metapath_data::Batch;

/// Skip-gram with negative sampling.
///
/// `input` holds center vectors (the embeddings that get exported),
/// `output` holds context vectors used only during training.
#[derive(Debug, Clone)]
pub struct SkipGram {
    input: EmbeddingTable,
    output: EmbeddingTable,
}

/// Scores and loss of one forward pass, kept for the backward pass.
#[derive(Debug, Clone)]
pub struct Forward {
    pub loss: f32,
    pos: Vec<f32>,
    neg: Vec<f32>,
}

impl Forward {
    pub fn positive_scores(&self) -> &[f32] {
        &self.pos
    }

    pub fn negative_scores(&self) -> &[f32] {
        &self.neg
    }
}

/// Row-sparse gradients for both tables.
#[derive(Debug, Clone)]
pub struct Gradients {
    pub input: SparseGrad,
    pub output: SparseGrad,
}

impl Gradients {
    pub fn new(dim: usize) -> Self {
        Gradients {
            input: SparseGrad::new(dim),
            output: SparseGrad::new(dim),
        }
    }

    pub fn zero(&mut self) {
        self.input.zero();
        self.output.zero();
    }
}

impl SkipGram {
    /// Input rows uniform in `[-1/dim, 1/dim]`, output rows zero.
    pub fn new(vocab_size: usize, dim: usize, seed: u64) -> Self {
        let range = 1.0 / dim.max(1) as f32;
        SkipGram {
            input: EmbeddingTable::uniform(vocab_size, dim, range, seed),
            output: EmbeddingTable::zeros(vocab_size, dim),
        }
    }

    /// Returns `None` unless both tables have the same shape.
    pub fn from_tables(input: EmbeddingTable, output: EmbeddingTable) -> Option<Self> {
        if input.rows() != output.rows() || input.dim() != output.dim() {
            return None;
        }
        Some(SkipGram { input, output })
    }

    pub fn vocab_size(&self) -> usize {
        self.input.rows()
    }

    pub fn dim(&self) -> usize {
        self.input.dim()
    }

    pub fn input(&self) -> &EmbeddingTable {
        &self.input
    }

    pub fn output(&self) -> &EmbeddingTable {
        &self.output
    }

    /// Both tables, in the order `(input, output)`.
    pub fn parameters_mut(&mut self) -> (&mut EmbeddingTable, &mut EmbeddingTable) {
        (&mut self.input, &mut self.output)
    }

    pub fn into_input(self) -> EmbeddingTable {
        self.input
    }

    /// Mean negative-sampling loss over the batch.
    ///
    /// An empty batch has zero loss.
    pub fn forward(&self, batch: &Batch) -> Forward {
        let n = batch.len();
        let mut pos = Vec::with_capacity(n);
        let mut neg = Vec::with_capacity(n * batch.k);
        let mut total = 0.0f64;

        for i in 0..n {
            let c = batch.centers[i] as usize;
            let p = self.input.dot_rows(c, &self.output, batch.contexts[i] as usize);
            let start = neg.len();
            for &ng in batch.negatives_for(i) {
                neg.push(self.input.dot_rows(c, &self.output, ng as usize));
            }
            total += pair_loss(p, &neg[start..]) as f64;
            pos.push(p);
        }

        let loss = if n == 0 { 0.0 } else { (total / n as f64) as f32 };
        Forward { loss, pos, neg }
    }

    /// Accumulate d(loss)/d(rows) for every row the batch touched.
    pub fn backward(&self, batch: &Batch, fwd: &Forward, grads: &mut Gradients) {
        let n = batch.len();
        if n == 0 {
            return;
        }
        let scale = 1.0 / n as f32;
        let k = batch.k;

        for i in 0..n {
            let c = batch.centers[i];
            let center = self.input.row(c as usize);

            let (_, live) = clip_score(fwd.pos[i]);
            if live {
                let g = (sigmoid(fwd.pos[i]) - 1.0) * scale;
                let ctx = batch.contexts[i];
                grads.input.add_scaled(c, g, self.output.row(ctx as usize));
                grads.output.add_scaled(ctx, g, center);
            }

            for (j, &ng) in batch.negatives_for(i).iter().enumerate() {
                let s = fwd.neg[i * k + j];
                let (_, live) = clip_score(s);
                if !live {
                    continue;
                }
                let g = sigmoid(s) * scale;
                grads.input.add_scaled(c, g, self.output.row(ng as usize));
                grads.output.add_scaled(ng, g, center);
            }
        }
    }
}
