/// Differential evolution needs the member itself plus three distinct donors.
pub const MIN_POPULATION_SIZE: usize = 4;

/// Number of donors drawn per mutant.
pub const DONOR_COUNT: usize = 3;

/// Fitness is reported with this many decimal places.
pub const FITNESS_DECIMALS: i32 = 2;

/// Sentinel score for an agent that did not progress along the target heading.
pub const NOT_FIT: f32 = 0.0;

/// Default mutation scale at the start of an epoch.
pub const DEFAULT_MASTER_BETA: f32 = 2.0;

/// Per-generation decay of the mutation scale, also used as its floor.
pub const DEFAULT_BETA_STEP: f32 = 1.0 / 40.0;

/// Probability of keeping the parent's coordinate during crossover.
pub const DEFAULT_CR_PROBA: f32 = 0.3;

/// Share of the population forcibly reinitialized each generation.
pub const DEFAULT_REINIT_FRACTION: f32 = 0.25;

/// Default vertical displacement between the real agent and its imaginary twins.
pub const DEFAULT_IMAGINARY_OFFSET_Y: f32 = 300.0;

/// Offset mixed into the master seed for per-member trial RNGs.
pub const MEMBER_SEED_STRIDE: u64 = 0x9e37_79b9_7f4a_7c15;
