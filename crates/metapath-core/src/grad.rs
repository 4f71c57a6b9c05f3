use std::collections::HashMap;

/// Row-sparse gradient for an [`EmbeddingTable`](crate::EmbeddingTable).
///
/// Only rows touched in the current step are stored; everything else is
/// implicitly zero. Rows keep first-touch order.
#[derive(Debug, Clone)]
pub struct SparseGrad {
    dim: usize,
    slots: HashMap<u32, usize>,
    ids: Vec<u32>,
    values: Vec<f32>,
}

impl SparseGrad {
    pub fn new(dim: usize) -> Self {
        SparseGrad {
            dim,
            slots: HashMap::new(),
            ids: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Drop all accumulated rows, keeping allocations.
    pub fn zero(&mut self) {
        self.slots.clear();
        self.ids.clear();
        self.values.clear();
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of distinct touched rows.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Mutable gradient row for `id`, created zeroed on first touch.
    pub fn row_mut(&mut self, id: u32) -> &mut [f32] {
        let dim = self.dim;
        let slot = match self.slots.get(&id) {
            Some(&s) => s,
            None => {
                let s = self.ids.len();
                self.slots.insert(id, s);
                self.ids.push(id);
                self.values.resize(self.values.len() + dim, 0.0);
                s
            }
        };
        &mut self.values[slot * dim..(slot + 1) * dim]
    }

    /// Add `scale * v` into row `id`.
    pub fn add_scaled(&mut self, id: u32, scale: f32, v: &[f32]) {
        for (g, x) in self.row_mut(id).iter_mut().zip(v) {
            *g += scale * x;
        }
    }

    pub fn get(&self, id: u32) -> Option<&[f32]> {
        self.slots
            .get(&id)
            .map(|&s| &self.values[s * self.dim..(s + 1) * self.dim])
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &[f32])> {
        self.ids
            .iter()
            .copied()
            .zip(self.values.chunks_exact(self.dim.max(1)))
    }
}
