pub mod scheduler;
pub mod sparse_adam;

pub use scheduler::CosineAnnealingLR;
pub use sparse_adam::SparseAdam;
