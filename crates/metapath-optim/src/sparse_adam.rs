use metapath_core::{EmbeddingTable, SparseGrad};

/// Adam restricted to the rows a step actually touched.
///
/// Moments of untouched rows are neither decayed nor read, so a row's state
/// only changes on steps where it receives a gradient. Bias correction uses
/// the global step count.
///
/// m = β1 * m + (1 - β1) * grad
/// v = β2 * v + (1 - β2) * grad²
/// param -= lr * m̂ / (√v̂ + ε)
pub struct SparseAdam {
    pub lr: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    pub t: usize,
    m: Vec<EmbeddingTable>, // first moment
    v: Vec<EmbeddingTable>, // second moment
}

impl SparseAdam {
    /// One pair of moment tables per parameter shape `(rows, dim)`.
    pub fn new(shapes: &[(usize, usize)], lr: f64) -> Self {
        let m = shapes.iter().map(|&(r, d)| EmbeddingTable::zeros(r, d)).collect();
        let v = shapes.iter().map(|&(r, d)| EmbeddingTable::zeros(r, d)).collect();
        SparseAdam {
            lr,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            t: 0,
            m,
            v,
        }
    }

    pub fn set_lr(&mut self, lr: f64) {
        self.lr = lr;
    }

    /// Apply one update. `params[i]` pairs with `grads[i]` and with the
    /// `i`-th shape given at construction.
    pub fn step(&mut self, params: &mut [&mut EmbeddingTable], grads: &[&SparseGrad]) {
        assert_eq!(params.len(), self.m.len(), "parameter count changed");
        assert_eq!(params.len(), grads.len(), "one gradient per parameter");

        self.t += 1;
        let bias_correction1 = 1.0 - self.beta1.powi(self.t as i32);
        let bias_correction2 = 1.0 - self.beta2.powi(self.t as i32);
        let step_size = (self.lr / bias_correction1) as f32;
        let bc2_sqrt = bias_correction2.sqrt() as f32;
        let (b1, b2, eps) = (self.beta1 as f32, self.beta2 as f32, self.epsilon as f32);

        for (i, (param, grad)) in params.iter_mut().zip(grads).enumerate() {
            for (row, g) in grad.iter() {
                let row = row as usize;
                let m = self.m[i].row_mut(row);
                let v = self.v[i].row_mut(row);
                let p = param.row_mut(row);
                for j in 0..g.len() {
                    m[j] = b1 * m[j] + (1.0 - b1) * g[j];
                    v[j] = b2 * v[j] + (1.0 - b2) * g[j] * g[j];
                    let denom = v[j].sqrt() / bc2_sqrt + eps;
                    p[j] -= step_size * m[j] / denom;
                }
            }
        }
    }
}
