use crate::config::Config;
use crate::error::{GaitForgeError, GfResult};
use crate::genome::Genome;
use crate::scheduler::Phase;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

/// One generation boundary, imaginary or real.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub trial: usize,
    pub cycle: usize,
    pub generation: usize,
    pub phase: Phase,
    /// Epoch best after this generation.
    pub best_fitness: f32,
    pub fittest: Option<usize>,
    /// Best score of this imaginary generation, or the real agent's own score.
    pub fitness: f32,
    /// Epoch-best genome for imaginary rows, the executed genome for real rows.
    pub genome: Genome,
}

#[derive(Serialize)]
struct CsvRow<'a> {
    trial: usize,
    cycle: usize,
    generation: usize,
    phase: Phase,
    best_fitness: f32,
    fittest: Option<usize>,
    fitness: f32,
    genome: &'a str,
}

/// Genome layout and motor schedule a log was recorded under.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunShape {
    pub limb_count: usize,
    pub seq_len: usize,
    pub max_seq_repetitions: usize,
    pub motor_exec_ticks: usize,
    pub time_step: f32,
}

impl From<&Config> for RunShape {
    fn from(c: &Config) -> Self {
        Self {
            limb_count: c.world.limb_count,
            seq_len: c.schedule.seq_len,
            max_seq_repetitions: c.schedule.max_seq_repetitions,
            motor_exec_ticks: c.schedule.motor_exec_ticks,
            time_step: c.schedule.time_step,
        }
    }
}

impl RunShape {
    pub fn genome_len(&self) -> usize {
        self.limb_count * self.seq_len
    }

    /// Keeps the recorded shape, rejecting any field named in `explicit`
    /// whose `requested` value disagrees with it.
    pub fn reconcile(&self, requested: &RunShape, explicit: &[&str]) -> GfResult<RunShape> {
        let conflicts: Vec<String> = [
            ("limb_count", self.limb_count as f32, requested.limb_count as f32),
            ("seq_len", self.seq_len as f32, requested.seq_len as f32),
            (
                "max_seq_repetitions",
                self.max_seq_repetitions as f32,
                requested.max_seq_repetitions as f32,
            ),
            (
                "motor_exec_ticks",
                self.motor_exec_ticks as f32,
                requested.motor_exec_ticks as f32,
            ),
            ("time_step", self.time_step, requested.time_step),
        ]
        .into_iter()
        .filter(|(name, recorded, wanted)| explicit.contains(name) && recorded != wanted)
        .map(|(name, recorded, wanted)| format!("{} {} (recorded {})", name, wanted, recorded))
        .collect();

        if conflicts.is_empty() {
            Ok(*self)
        } else {
            Err(GaitForgeError::Validation(format!(
                "flags conflict with the recorded run: {}",
                conflicts.join(", ")
            )))
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryLog {
    /// Absent in logs written before the shape was recorded.
    #[serde(default)]
    pub shape: Option<RunShape>,
    pub trials: Vec<TrialRecord>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shape(shape: RunShape) -> Self {
        Self {
            shape: Some(shape),
            trials: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    pub fn last(&self) -> Option<&TrialRecord> {
        self.trials.last()
    }

    pub fn get(&self, trial: usize) -> Option<&TrialRecord> {
        self.trials.iter().find(|t| t.trial == trial)
    }

    /// Appends a record, numbering it after the current tail.
    pub fn push(&mut self, mut record: TrialRecord) -> usize {
        record.trial = self.trials.len();
        let idx = record.trial;
        self.trials.push(record);
        idx
    }

    /// The last real-phase record, i.e. the genome the real agent actually walked with.
    pub fn last_real(&self) -> Option<&TrialRecord> {
        self.trials
            .iter()
            .rev()
            .find(|t| t.phase == Phase::RealGeneration)
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> GfResult<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> GfResult<Self> {
        let content = fs::read_to_string(path)?;
        let log: HistoryLog = serde_json::from_str(&content)?;
        for (i, t) in log.trials.iter().enumerate() {
            if t.trial != i {
                return Err(GaitForgeError::Validation(format!(
                    "history out of order: row {} carries trial {}",
                    i, t.trial
                )));
            }
        }
        Ok(log)
    }

    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> GfResult<()> {
        let mut wtr = csv::Writer::from_path(path)?;
        for t in &self.trials {
            let genome = t
                .genome
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(";");
            wtr.serialize(CsvRow {
                trial: t.trial,
                cycle: t.cycle,
                generation: t.generation,
                phase: t.phase,
                best_fitness: t.best_fitness,
                fittest: t.fittest,
                fitness: t.fitness,
                genome: &genome,
            })?;
        }
        wtr.flush()?;
        Ok(())
    }
}
