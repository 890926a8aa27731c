//! Per-run resource limits for the embedded Python interpreter.

use wasmtime::{ResourceLimiter, Store};
use wasmtime_wasi::preview1::WasiP1Ctx;

const MAX_TABLE_ELEMENTS: usize = 10_000;

/// Denies linear-memory and table growth past fixed ceilings and remembers
/// that it did, so a trap can be reported as a memory error instead of a
/// generic failure.
#[derive(Debug)]
pub struct RunLimiter {
    max_memory: u64,
    peak_memory: u64,
    tripped: bool,
}

impl RunLimiter {
    pub fn new(max_memory: u64) -> Self {
        Self {
            max_memory,
            peak_memory: 0,
            tripped: false,
        }
    }

    /// Whether any growth request was refused.
    pub fn tripped(&self) -> bool {
        self.tripped
    }

    /// Largest linear memory size granted so far.
    pub fn peak_memory(&self) -> u64 {
        self.peak_memory
    }
}

impl ResourceLimiter for RunLimiter {
    fn memory_growing(
        &mut self,
        _current: usize,
        desired: usize,
        _maximum: Option<usize>,
    ) -> anyhow::Result<bool> {
        let desired = desired as u64;
        if desired > self.max_memory {
            self.tripped = true;
            return Ok(false);
        }
        self.peak_memory = self.peak_memory.max(desired);
        Ok(true)
    }

    fn table_growing(
        &mut self,
        _current: usize,
        desired: usize,
        _maximum: Option<usize>,
    ) -> anyhow::Result<bool> {
        if desired > MAX_TABLE_ELEMENTS {
            self.tripped = true;
            return Ok(false);
        }
        Ok(true)
    }
}

/// Host state owned by the store of a single run.
pub struct RunState {
    pub limiter: RunLimiter,
    pub wasi: WasiP1Ctx,
}

impl RunState {
    pub fn new(max_memory: u64, wasi: WasiP1Ctx) -> Self {
        Self {
            limiter: RunLimiter::new(max_memory),
            wasi,
        }
    }
}

/// Hooks the run's limiter into its store.
pub trait StoreLimiterExt {
    fn enforce_limits(&mut self);
}

impl StoreLimiterExt for Store<RunState> {
    fn enforce_limits(&mut self) {
        self.limiter(|state| &mut state.limiter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_within_limit() {
        let mut limiter = RunLimiter::new(1024 * 1024);

        assert!(limiter.memory_growing(0, 512 * 1024, None).unwrap());
        assert!(limiter.memory_growing(512 * 1024, 768 * 1024, None).unwrap());
        assert!(!limiter.tripped());
        assert_eq!(limiter.peak_memory(), 768 * 1024);
    }

    #[test]
    fn test_growth_over_limit_trips() {
        let mut limiter = RunLimiter::new(1024 * 1024);

        assert!(!limiter.memory_growing(0, 2 * 1024 * 1024, None).unwrap());
        assert!(limiter.tripped());
        assert_eq!(limiter.peak_memory(), 0);
    }

    #[test]
    fn test_table_growth_over_limit_trips() {
        let mut limiter = RunLimiter::new(1024);
        assert!(!limiter.table_growing(0, MAX_TABLE_ELEMENTS + 1, None).unwrap());
        assert!(limiter.tripped());
    }
}
