// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Per-invocation progress tracking.
//!
//! A [`Progress`] is owned by the caller and passed into one embed or
//! extract call. It uses atomics so it can be polled from another thread
//! while the pipeline (and its rayon workers) update it. Nothing is global:
//! concurrent invocations each get their own tracker.

use core::sync::atomic::{AtomicU32, Ordering};

/// Number of phases an embed call reports.
pub const EMBED_STEPS: u32 = 8;

/// Number of phases an extract call reports.
pub const EXTRACT_STEPS: u32 = 6;

/// Pipeline phase currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Phase {
    Idle = 0,
    Analyze,
    Predict,
    Order,
    Drift,
    Package,
    Write,
    Validate,
    Read,
    Unpack,
    Done,
}

impl Phase {
    fn from_u32(v: u32) -> Self {
        match v {
            1 => Self::Analyze,
            2 => Self::Predict,
            3 => Self::Order,
            4 => Self::Drift,
            5 => Self::Package,
            6 => Self::Write,
            7 => Self::Validate,
            8 => Self::Read,
            9 => Self::Unpack,
            10 => Self::Done,
            _ => Self::Idle,
        }
    }
}

/// Step counter plus current phase.
#[derive(Debug, Default)]
pub struct Progress {
    step: AtomicU32,
    total: AtomicU32,
    phase: AtomicU32,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to step 0 with `total` steps.
    pub fn init(&self, total: u32) {
        self.step.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
        self.phase.store(Phase::Idle as u32, Ordering::Relaxed);
    }

    /// Advance by one step.
    ///
    /// The step is capped at `total - 1` so the bar never reaches 100%
    /// before [`finish`](Self::finish). With `total == 0` it advances freely.
    pub fn advance(&self) {
        let total = self.total.load(Ordering::Relaxed);
        if total == 0 {
            self.step.fetch_add(1, Ordering::Relaxed);
        } else {
            let _ = self.step.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |s| {
                if s + 1 < total { Some(s + 1) } else { Some(s) }
            });
        }
    }

    /// Enter `phase` and advance by one step.
    pub fn enter(&self, phase: Phase) {
        self.phase.store(phase as u32, Ordering::Relaxed);
        self.advance();
    }

    /// Current `(step, total)`.
    pub fn get(&self) -> (u32, u32) {
        (self.step.load(Ordering::Relaxed), self.total.load(Ordering::Relaxed))
    }

    pub fn phase(&self) -> Phase {
        Phase::from_u32(self.phase.load(Ordering::Relaxed))
    }

    /// Mark as complete (step = total).
    pub fn finish(&self) {
        let t = self.total.load(Ordering::Relaxed);
        self.step.store(t, Ordering::Relaxed);
        self.phase.store(Phase::Done as u32, Ordering::Relaxed);
    }
}
