use std::fmt;

use crate::rng::SplitMix64;
use crate::roster::Participant;

pub const SPIN_TICK_MS: u32 = 80;
pub const SPIN_DURATION_MS: u32 = 2000;
pub const DISPLAY_PLACEHOLDER: &str = "???";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawMode {
    WithReplacement,
    WithoutReplacement,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpinPhase {
    Idle,
    Spinning { elapsed_ms: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawError {
    EmptyPool,
    SpinBusy,
}

impl fmt::Display for DrawError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawError::EmptyPool => write!(f, "no candidates left to draw"),
            DrawError::SpinBusy => write!(f, "a draw is already in progress"),
        }
    }
}

impl std::error::Error for DrawError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RaffleEngine {
    mode: DrawMode,
    pool: Vec<Participant>,
    winners: Vec<Participant>,
    display: String,
    phase: SpinPhase,
}

impl RaffleEngine {
    pub fn new(roster: &[Participant]) -> Self {
        Self {
            mode: DrawMode::WithoutReplacement,
            pool: roster.to_vec(),
            winners: Vec::new(),
            display: DISPLAY_PLACEHOLDER.to_string(),
            phase: SpinPhase::Idle,
        }
    }

    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    pub fn phase(&self) -> SpinPhase {
        self.phase
    }

    pub fn is_spinning(&self) -> bool {
        matches!(self.phase, SpinPhase::Spinning { .. })
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn winners(&self) -> &[Participant] {
        &self.winners
    }

    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    // Switching modes rebuilds the pool from the full roster, discarding
    // any without-replacement progress. The winner record is untouched.
    pub fn set_mode(&mut self, mode: DrawMode, roster: &[Participant]) {
        self.mode = mode;
        self.pool = roster.to_vec();
    }

    pub fn begin_spin(&mut self, roster: &[Participant]) -> Result<(), DrawError> {
        if self.is_spinning() {
            return Err(DrawError::SpinBusy);
        }
        if self.source_len(roster) == 0 {
            return Err(DrawError::EmptyPool);
        }
        self.phase = SpinPhase::Spinning { elapsed_ms: 0 };
        Ok(())
    }

    // One timer callback. Intermediate ticks only roll the display; the
    // tick that reaches the spin duration performs the final pick in the
    // same transition and returns the winner.
    pub fn spin_tick(&mut self, roster: &[Participant], rng: &mut SplitMix64) -> Option<Participant> {
        let SpinPhase::Spinning { elapsed_ms } = self.phase else {
            return None;
        };
        let len = self.source_len(roster);
        if len == 0 {
            self.phase = SpinPhase::Idle;
            self.display = DISPLAY_PLACEHOLDER.to_string();
            return None;
        }
        let pick = self.sample(roster, rng.next_below(len));
        let elapsed = elapsed_ms + SPIN_TICK_MS;
        if elapsed < SPIN_DURATION_MS {
            self.display = pick.name;
            self.phase = SpinPhase::Spinning { elapsed_ms: elapsed };
            return None;
        }
        self.display = pick.name.clone();
        self.winners.insert(0, pick.clone());
        if self.mode == DrawMode::WithoutReplacement {
            self.pool.retain(|entry| entry.id != pick.id);
        }
        self.phase = SpinPhase::Idle;
        Some(pick)
    }

    // Force-stops an in-progress spin, clears the winner record, and
    // restores the pool to the full roster.
    pub fn reset(&mut self, roster: &[Participant]) {
        self.phase = SpinPhase::Idle;
        self.winners.clear();
        self.pool = roster.to_vec();
        self.display = DISPLAY_PLACEHOLDER.to_string();
    }

    fn source_len(&self, roster: &[Participant]) -> usize {
        match self.mode {
            DrawMode::WithReplacement => roster.len(),
            DrawMode::WithoutReplacement => self.pool.len(),
        }
    }

    fn sample(&self, roster: &[Participant], index: usize) -> Participant {
        match self.mode {
            DrawMode::WithReplacement => roster[index].clone(),
            DrawMode::WithoutReplacement => self.pool[index].clone(),
        }
    }
}
