/// Scores are clamped to `[-SCORE_CLIP, SCORE_CLIP]` before the sigmoid.
pub const SCORE_CLIP: f32 = 10.0;

pub fn sigmoid(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// `ln(σ(x))` without overflow for large `|x|`.
pub fn log_sigmoid(x: f32) -> f32 {
    if x >= 0.0 {
        -(-x).exp().ln_1p()
    } else {
        x - x.exp().ln_1p()
    }
}

/// Clamp a raw score. The flag is false when clamping happened, in which
/// case the score contributes no gradient.
pub fn clip_score(x: f32) -> (f32, bool) {
    let clipped = x.clamp(-SCORE_CLIP, SCORE_CLIP);
    (clipped, clipped == x)
}

/// Negative-sampling loss of one pair: `-logσ(pos) - Σ logσ(-neg)`.
pub fn pair_loss(pos: f32, negs: &[f32]) -> f32 {
    let (pos, _) = clip_score(pos);
    let mut loss = -log_sigmoid(pos);
    for &n in negs {
        let (n, _) = clip_score(n);
        loss -= log_sigmoid(-n);
    }
    loss
}
