use std::collections::VecDeque;

use strata_world::ChunkCoord;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenState {
    Idle,
    Generating(ChunkCoord),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenRequest {
    /// Gate was idle; the caller starts the sweep now.
    Start,
    /// Waiting behind the running sweep.
    Queued,
    /// Same center already running or waiting.
    Coalesced,
    /// Wait queue full.
    Rejected,
}

/// Single-flight guard for generation sweeps with a bounded wait queue.
#[derive(Debug)]
pub struct GenerationGate {
    state: GenState,
    waiting: VecDeque<ChunkCoord>,
    limit: usize,
}

impl GenerationGate {
    pub fn new(limit: usize) -> Self {
        Self {
            state: GenState::Idle,
            waiting: VecDeque::new(),
            limit,
        }
    }

    pub fn state(&self) -> GenState {
        self.state
    }

    pub fn is_generating(&self) -> bool {
        matches!(self.state, GenState::Generating(_))
    }

    pub fn waiting(&self) -> usize {
        self.waiting.len()
    }

    pub fn request(&mut self, center: ChunkCoord) -> GenRequest {
        match self.state {
            GenState::Idle => {
                self.state = GenState::Generating(center);
                GenRequest::Start
            }
            GenState::Generating(running) => {
                if running == center || self.waiting.contains(&center) {
                    log::debug!(target: "sched", "generation at {:?} coalesced", center);
                    return GenRequest::Coalesced;
                }
                if self.waiting.len() >= self.limit {
                    log::warn!(
                        target: "sched",
                        "generation at {:?} rejected: {} already waiting",
                        center,
                        self.waiting.len()
                    );
                    return GenRequest::Rejected;
                }
                log::debug!(target: "sched", "generation at {:?} deferred", center);
                self.waiting.push_back(center);
                GenRequest::Queued
            }
        }
    }

    /// Ends the running sweep. Returns the next center to start, if any; the
    /// gate stays in `Generating` for it.
    pub fn finish(&mut self) -> Option<ChunkCoord> {
        match self.waiting.pop_front() {
            Some(next) => {
                self.state = GenState::Generating(next);
                Some(next)
            }
            None => {
                self.state = GenState::Idle;
                None
            }
        }
    }

    /// Drops the running sweep and everything waiting.
    pub fn reset(&mut self) {
        self.state = GenState::Idle;
        self.waiting.clear();
    }
}
