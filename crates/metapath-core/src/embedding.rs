use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Dense `[rows, dim]` matrix of `f32`, one embedding vector per row.
///
/// Stores data in a flat contiguous `Vec<f32>` with row-major layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingTable {
    data: Vec<f32>,
    rows: usize,
    dim: usize,
}

// ─── Construction ───────────────────────────────────────────────────────────

impl EmbeddingTable {
    /// Create a table filled with zeros.
    pub fn zeros(rows: usize, dim: usize) -> Self {
        EmbeddingTable {
            data: vec![0.0; rows * dim],
            rows,
            dim,
        }
    }

    /// Create a table with entries drawn uniformly from `[-range, range)`.
    pub fn uniform(rows: usize, dim: usize, range: f32, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let data = (0..rows * dim)
            .map(|_| if range > 0.0 { rng.gen_range(-range..range) } else { 0.0 })
            .collect();
        EmbeddingTable { data, rows, dim }
    }

    /// Wrap existing row-major data. Returns `None` if the length is off.
    pub fn from_vec(data: Vec<f32>, rows: usize, dim: usize) -> Option<Self> {
        if data.len() != rows * dim {
            return None;
        }
        Some(EmbeddingTable { data, rows, dim })
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    pub fn row_mut(&mut self, i: usize) -> &mut [f32] {
        &mut self.data[i * self.dim..(i + 1) * self.dim]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.dim.max(1)).take(self.rows)
    }

    /// Dot product of row `i` of `self` with row `j` of `other`.
    pub fn dot_rows(&self, i: usize, other: &EmbeddingTable, j: usize) -> f32 {
        dot(self.row(i), other.row(j))
    }
}

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Cosine similarity; zero if either vector has zero norm.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let na = dot(a, a).sqrt();
    let nb = dot(b, b).sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot(a, b) / (na * nb)
}
