pub const MAX_DEPTH: usize = usize::MAX;
pub const MAX_LEAF_SIZE: usize = 3;
pub const MIN_PURITY_INCREASE: f64 = 1e-7;
pub const SEED: u64 = 0;
