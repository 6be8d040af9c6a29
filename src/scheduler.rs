use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Which population is being driven, and whether it is choosing rates or
/// letting the motors run.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    ImaginaryGeneration,
    ImaginaryMotorExec,
    RealMotorExec,
    RealGeneration,
}

impl Phase {
    pub fn is_motor_exec(self) -> bool {
        matches!(self, Phase::ImaginaryMotorExec | Phase::RealMotorExec)
    }
}

/// Events the driver reports back to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// A sequence position was written to the actuators.
    StepApplied,
    /// The motor-exec quantum ran out.
    MotorExecElapsed,
    /// The imaginary population hit its generation budget and the real agent took over.
    EpochComplete,
    /// The real agent finished its single generation.
    RealGenerationComplete,
}

/// Pure transition table. Any pairing not listed is a driver bug.
pub fn transition(phase: Phase, signal: Signal) -> Phase {
    match (phase, signal) {
        (Phase::ImaginaryGeneration, Signal::StepApplied) => Phase::ImaginaryMotorExec,
        (Phase::ImaginaryMotorExec, Signal::MotorExecElapsed) => Phase::ImaginaryGeneration,
        (Phase::ImaginaryGeneration, Signal::EpochComplete) => Phase::RealMotorExec,
        (Phase::RealMotorExec, Signal::MotorExecElapsed) => Phase::RealGeneration,
        (Phase::RealGeneration, Signal::StepApplied) => Phase::RealMotorExec,
        (Phase::RealGeneration, Signal::RealGenerationComplete) => Phase::ImaginaryGeneration,
        (p, s) => panic!("invalid phase transition: {:?} in {}", s, p),
    }
}

#[derive(Debug, Clone)]
pub struct PhaseScheduler {
    phase: Phase,
    motor_exec_ticks: usize,
    motor_elapsed: usize,
    generation: usize,
    max_generations: usize,
    cycle: usize,
}

impl PhaseScheduler {
    pub fn new(max_generations: usize, motor_exec_ticks: usize) -> Self {
        Self {
            phase: Phase::ImaginaryGeneration,
            motor_exec_ticks: motor_exec_ticks.max(1),
            motor_elapsed: 0,
            generation: 0,
            max_generations,
            cycle: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Imaginary generations completed in the current epoch.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Completed imaginary/real cycles.
    pub fn cycle(&self) -> usize {
        self.cycle
    }

    pub fn signal(&mut self, signal: Signal) {
        self.phase = transition(self.phase, signal);
        if self.phase.is_motor_exec() {
            self.motor_elapsed = 0;
        }
    }

    /// Counts one tick of motor execution. Returns true when the quantum has
    /// run out and the scheduler moved back to a generation phase.
    pub fn motor_tick(&mut self) -> bool {
        debug_assert!(self.phase.is_motor_exec());
        self.motor_elapsed += 1;
        if self.motor_elapsed >= self.motor_exec_ticks {
            self.signal(Signal::MotorExecElapsed);
            true
        } else {
            false
        }
    }

    /// Counts a finished imaginary generation. Returns true once the epoch's
    /// generation budget is spent.
    pub fn complete_generation(&mut self) -> bool {
        self.generation += 1;
        self.generation >= self.max_generations
    }

    /// Closes the cycle after the real agent's generation.
    pub fn complete_cycle(&mut self) {
        self.cycle += 1;
        self.generation = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[rstest]
    #[case(Phase::ImaginaryGeneration, Signal::StepApplied, Phase::ImaginaryMotorExec)]
    #[case(Phase::ImaginaryMotorExec, Signal::MotorExecElapsed, Phase::ImaginaryGeneration)]
    #[case(Phase::ImaginaryGeneration, Signal::EpochComplete, Phase::RealMotorExec)]
    #[case(Phase::RealMotorExec, Signal::MotorExecElapsed, Phase::RealGeneration)]
    #[case(Phase::RealGeneration, Signal::StepApplied, Phase::RealMotorExec)]
    #[case(Phase::RealGeneration, Signal::RealGenerationComplete, Phase::ImaginaryGeneration)]
    fn test_transition_table(#[case] from: Phase, #[case] signal: Signal, #[case] to: Phase) {
        assert_eq!(transition(from, signal), to);
    }

    #[test]
    #[should_panic(expected = "invalid phase transition")]
    fn test_real_cannot_skip_motor_exec() {
        transition(Phase::RealMotorExec, Signal::RealGenerationComplete);
    }

    #[test]
    fn test_motor_quantum() {
        let mut s = PhaseScheduler::new(2, 3);
        s.signal(Signal::StepApplied);
        assert!(!s.motor_tick());
        assert!(!s.motor_tick());
        assert!(s.motor_tick());
        assert_eq!(s.phase(), Phase::ImaginaryGeneration);
    }

    #[test]
    fn test_generation_budget_and_cycle() {
        let mut s = PhaseScheduler::new(2, 1);
        assert!(!s.complete_generation());
        assert!(s.complete_generation());
        s.complete_cycle();
        assert_eq!(s.cycle(), 1);
        assert_eq!(s.generation(), 0);
    }

    #[test]
    fn test_phase_names_round_trip() {
        for phase in Phase::iter() {
            assert_eq!(Phase::from_str(&phase.to_string()).ok(), Some(phase));
        }
        assert_eq!(Phase::RealMotorExec.to_string(), "REAL_MOTOR_EXEC");
    }
}
