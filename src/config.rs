use crate::consts::*;
use crate::error::{GaitForgeError, GfResult};
use clap::{parser::ValueSource, ArgMatches, Args, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use strum_macros::{Display, EnumString};

#[derive(Args, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    #[command(flatten)]
    pub evolution: EvolutionParams,
    #[command(flatten)]
    pub schedule: ScheduleParams,
    #[command(flatten)]
    pub rates: RateParams,
    #[command(flatten)]
    pub world: WorldParams,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionParams {
    #[arg(long, default_value_t = 8)]
    pub population_size: usize,
    #[arg(long, default_value_t = DEFAULT_MASTER_BETA)]
    pub master_beta: f32,
    #[arg(long, default_value_t = DEFAULT_BETA_STEP)]
    pub beta_decay: f32,
    #[arg(long, default_value_t = DEFAULT_BETA_STEP)]
    pub beta_floor: f32,
    // Probability of KEEPING the parent coordinate (inverse of textbook CR)
    #[arg(long, default_value_t = DEFAULT_CR_PROBA)]
    pub cr_proba: f32,
    #[arg(long, default_value_t = DEFAULT_REINIT_FRACTION)]
    pub reinit_fraction: f32,
}

impl Default for EvolutionParams {
    fn default() -> Self {
        Self {
            population_size: 8,
            master_beta: DEFAULT_MASTER_BETA,
            beta_decay: DEFAULT_BETA_STEP,
            beta_floor: DEFAULT_BETA_STEP,
            cr_proba: DEFAULT_CR_PROBA,
            reinit_fraction: DEFAULT_REINIT_FRACTION,
        }
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleParams {
    #[arg(long, default_value_t = 6)]
    pub seq_len: usize,
    #[arg(long, default_value_t = 12)]
    pub max_generations: usize,
    #[arg(long, default_value_t = 3)]
    pub max_seq_repetitions: usize,
    #[arg(long, default_value_t = 4)]
    pub motor_exec_ticks: usize,
    #[arg(long, default_value_t = 40)]
    pub max_cycles: usize,
    #[arg(long, default_value_t = 1.0 / 60.0)]
    pub time_step: f32,
    #[arg(long, default_value_t = 200.0)]
    pub finish_line: f32,
    #[arg(short = 'S', long)]
    pub seed: Option<u64>,
}

impl Default for ScheduleParams {
    fn default() -> Self {
        Self {
            seq_len: 6,
            max_generations: 12,
            max_seq_repetitions: 3,
            motor_exec_ticks: 4,
            max_cycles: 40,
            time_step: 1.0 / 60.0,
            finish_line: 200.0,
            seed: None,
        }
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateParams {
    #[arg(long, default_value_t = -2.0, allow_hyphen_values = true)]
    pub rate_min: f32,
    #[arg(long, default_value_t = 2.0, allow_hyphen_values = true)]
    pub rate_max: f32,
    #[arg(long, default_value_t = 1.0)]
    pub rate_step: f32,
}

impl Default for RateParams {
    fn default() -> Self {
        Self {
            rate_min: -2.0,
            rate_max: 2.0,
            rate_step: 1.0,
        }
    }
}

/// How the sanctioned direction of travel is interpreted.
#[derive(
    ValueEnum, Display, EnumString, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HeadingMode {
    /// `target_heading` is an absolute world-space angle.
    World,
    /// `target_heading` is relative to the agent's orientation at generation start.
    Body,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldParams {
    #[arg(long, default_value_t = 4)]
    pub limb_count: usize,
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub imaginary_offset_x: f32,
    #[arg(long, default_value_t = DEFAULT_IMAGINARY_OFFSET_Y, allow_hyphen_values = true)]
    pub imaginary_offset_y: f32,
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub target_heading: f32,
    #[arg(long, value_enum, default_value_t = HeadingMode::World)]
    pub heading_mode: HeadingMode,
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub real_start_x: f32,
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub real_start_y: f32,
}

impl Default for WorldParams {
    fn default() -> Self {
        Self {
            limb_count: 4,
            imaginary_offset_x: 0.0,
            imaginary_offset_y: DEFAULT_IMAGINARY_OFFSET_Y,
            target_heading: 0.0,
            heading_mode: HeadingMode::World,
            real_start_x: 0.0,
            real_start_y: 0.0,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> GfResult<Self> {
        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Overlays values the user typed explicitly onto `self` (typically loaded from JSON).
    pub fn merge_from_cli(&mut self, cli: &Config, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($group:ident . $field:ident) => {
                if matches.value_source(stringify!($field)) == Some(ValueSource::CommandLine) {
                    self.$group.$field = cli.$group.$field.clone();
                }
            };
        }

        update_if_present!(evolution.population_size);
        update_if_present!(evolution.master_beta);
        update_if_present!(evolution.beta_decay);
        update_if_present!(evolution.beta_floor);
        update_if_present!(evolution.cr_proba);
        update_if_present!(evolution.reinit_fraction);

        update_if_present!(schedule.seq_len);
        update_if_present!(schedule.max_generations);
        update_if_present!(schedule.max_seq_repetitions);
        update_if_present!(schedule.motor_exec_ticks);
        update_if_present!(schedule.max_cycles);
        update_if_present!(schedule.time_step);
        update_if_present!(schedule.finish_line);
        update_if_present!(schedule.seed);

        update_if_present!(rates.rate_min);
        update_if_present!(rates.rate_max);
        update_if_present!(rates.rate_step);

        update_if_present!(world.limb_count);
        update_if_present!(world.imaginary_offset_x);
        update_if_present!(world.imaginary_offset_y);
        update_if_present!(world.target_heading);
        update_if_present!(world.heading_mode);
        update_if_present!(world.real_start_x);
        update_if_present!(world.real_start_y);
    }

    pub fn validate(&self) -> GfResult<()> {
        if self.evolution.population_size < MIN_POPULATION_SIZE {
            return Err(GaitForgeError::Precondition(format!(
                "population_size must be at least {} (got {})",
                MIN_POPULATION_SIZE, self.evolution.population_size
            )));
        }
        if self.schedule.seq_len == 0 {
            return Err(GaitForgeError::Precondition(
                "seq_len must be at least 1".to_string(),
            ));
        }
        if self.schedule.max_seq_repetitions == 0 {
            return Err(GaitForgeError::Precondition(
                "max_seq_repetitions must be at least 1".to_string(),
            ));
        }
        if self.schedule.max_generations == 0 {
            return Err(GaitForgeError::Precondition(
                "max_generations must be at least 1".to_string(),
            ));
        }
        if self.schedule.motor_exec_ticks == 0 {
            return Err(GaitForgeError::Precondition(
                "motor_exec_ticks must be at least 1".to_string(),
            ));
        }
        if self.world.limb_count == 0 {
            return Err(GaitForgeError::Precondition(
                "limb_count must be at least 1".to_string(),
            ));
        }
        if !(self.rates.rate_step > 0.0) || self.rates.rate_max < self.rates.rate_min {
            return Err(GaitForgeError::Precondition(format!(
                "rate domain [{}, {}] step {} is empty",
                self.rates.rate_min, self.rates.rate_max, self.rates.rate_step
            )));
        }
        if !(0.0..=1.0).contains(&self.evolution.cr_proba) {
            return Err(GaitForgeError::Config(format!(
                "cr_proba must lie in [0, 1] (got {})",
                self.evolution.cr_proba
            )));
        }
        if !(0.0..=1.0).contains(&self.evolution.reinit_fraction) {
            return Err(GaitForgeError::Config(format!(
                "reinit_fraction must lie in [0, 1] (got {})",
                self.evolution.reinit_fraction
            )));
        }
        let n = self.evolution.population_size;
        let quota = (self.evolution.reinit_fraction * n as f32).floor() as usize;
        if quota > n - 1 {
            return Err(GaitForgeError::Config(format!(
                "reinit_fraction {} asks for {} reinits but only {} non-elite members exist",
                self.evolution.reinit_fraction,
                quota,
                n - 1
            )));
        }
        if self.evolution.beta_floor <= 0.0 || self.evolution.beta_decay < 0.0 {
            return Err(GaitForgeError::Config(
                "beta_floor must be positive and beta_decay non-negative".to_string(),
            ));
        }
        if !(self.schedule.time_step > 0.0) {
            return Err(GaitForgeError::Config("time_step must be positive".to_string()));
        }
        Ok(())
    }
}
