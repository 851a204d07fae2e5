//! Single-flight guard and loop counters.

use serde::Serialize;

/// Orchestrator-owned state: the single-flight flag plus counters.
///
/// The flag is set when a change is accepted and cleared when the whole
/// rebuild-and-restart cycle has finished, whatever its outcome. Triggers
/// arriving while it is set are dropped, never queued.
#[derive(Debug, Default)]
pub struct OrchestratorState {
    restarting: bool,
    summary: RunSummary,
}

impl OrchestratorState {
    /// Tries to take the guard. Returns `false` and counts a dropped event
    /// if a cycle is already in flight.
    pub fn try_begin(&mut self) -> bool {
        if self.restarting {
            self.summary.dropped_events += 1;
            return false;
        }
        self.restarting = true;
        true
    }

    /// Releases the guard and counts the finished cycle.
    pub fn finish(&mut self, outcome: CycleOutcome) {
        self.restarting = false;
        self.summary.cycles += 1;
        match outcome {
            CycleOutcome::Started => self.summary.workers_started += 1,
            CycleOutcome::BuildFailed => self.summary.build_failures += 1,
            CycleOutcome::SpawnFailed => self.summary.spawn_failures += 1,
        }
    }

    /// Counts a worker exit nobody asked for.
    pub fn record_unexpected_exit(&mut self) {
        self.summary.unexpected_exits += 1;
    }

    /// Returns `true` while a cycle is in flight.
    #[must_use]
    pub const fn is_restarting(&self) -> bool {
        self.restarting
    }

    /// Returns the counters so far.
    #[must_use]
    pub const fn summary(&self) -> RunSummary {
        self.summary
    }
}

/// How a rebuild-and-restart cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The build succeeded and a worker is running.
    Started,
    /// The build failed; no worker is running.
    BuildFailed,
    /// The build succeeded but the worker could not be spawned.
    SpawnFailed,
}

/// Counters reported when the loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Completed cycles, including the initial one.
    pub cycles: u64,
    /// Change events dropped because a cycle was in flight.
    pub dropped_events: u64,
    /// Workers successfully spawned.
    pub workers_started: u64,
    /// Cycles that ended with a build failure.
    pub build_failures: u64,
    /// Cycles whose worker failed to spawn.
    pub spawn_failures: u64,
    /// Worker exits that were not requested.
    pub unexpected_exits: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_drops_while_held() {
        let mut state = OrchestratorState::default();
        assert!(!state.is_restarting());

        assert!(state.try_begin());
        assert!(state.is_restarting());
        assert!(!state.try_begin());
        assert!(!state.try_begin());

        state.finish(CycleOutcome::BuildFailed);
        assert!(!state.is_restarting());
        assert!(state.try_begin());
        state.finish(CycleOutcome::Started);

        let summary = state.summary();
        assert_eq!(summary.cycles, 2);
        assert_eq!(summary.dropped_events, 2);
        assert_eq!(summary.build_failures, 1);
        assert_eq!(summary.workers_started, 1);
    }

    #[test]
    fn test_summary_serialization() {
        let mut state = OrchestratorState::default();
        state.record_unexpected_exit();
        insta::assert_json_snapshot!(state.summary(), @r#"
        {
          "cycles": 0,
          "droppedEvents": 0,
          "workersStarted": 0,
          "buildFailures": 0,
          "spawnFailures": 0,
          "unexpectedExits": 1
        }
        "#);
    }
}
