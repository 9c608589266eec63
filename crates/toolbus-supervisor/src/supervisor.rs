//! The supervisor itself.

use crate::record::{ProcessRecord, RecordState};
use crate::spec::LaunchSpec;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Child;
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use toolbus_common::{ProcessError, ProcessResult};
use toolbus_probe::{ReadinessProbe, RetryBudget};
use toolbus_process::{force_kill, spawn_process, terminate_gracefully};
use tracing::{error, info, warn};

/// How long to wait between the graceful terminate and the liveness re-check.
/// Same 0.5s the launch scripts this replaces have always used.
const DEFAULT_GRACE_PERIOD: Duration = Duration::from_millis(500);

/// How long to wait for the OS to reap a force-killed child.
const REAP_TIMEOUT: Duration = Duration::from_secs(1);

struct Supervised {
    record: ProcessRecord,
    child: Child,
}

struct SupervisorState {
    next_launch_id: u64,
    children: HashMap<u64, Supervised>,
}

/// Owns the set of supervised child processes.
///
/// Cheap to clone; clones share the same supervised set, so a clone handed to
/// a signal task and the original in `main` drive the same shutdown.
#[derive(Clone)]
pub struct Supervisor {
    state: Arc<Mutex<SupervisorState>>,
    probe: Arc<ReadinessProbe>,
    grace_period: Duration,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl Supervisor {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SupervisorState {
                next_launch_id: 1,
                children: HashMap::new(),
            })),
            probe: Arc::new(ReadinessProbe::default()),
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }

    pub fn with_probe(mut self, probe: ReadinessProbe) -> Self {
        self.probe = Arc::new(probe);
        self
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Start a child process and begin tracking it.
    ///
    /// The record is inserted in `Starting` state before readiness is
    /// confirmed, so a crash during startup is still observed and cleaned up.
    /// A failed spawn is reported synchronously and tracks nothing.
    pub async fn launch(&self, spec: &LaunchSpec) -> ProcessResult<ProcessRecord> {
        let child = spawn_process(
            &spec.executable_path,
            &spec.args,
            &spec.environment,
            spec.working_directory.as_deref(),
        )
        .map_err(|e| match e {
            // Re-key spawn failures from the executable path to the launch label.
            ProcessError::SpawnFailed { reason, .. } => {
                ProcessError::spawn_failed(&spec.id, reason)
            }
            other => other,
        })?;

        let pid = child.id().ok_or_else(|| {
            ProcessError::spawn_failed(&spec.id, "process exited before a pid could be read")
        })?;

        let mut state = self.state.lock().await;
        let launch_id = state.next_launch_id;
        state.next_launch_id += 1;

        let record = ProcessRecord {
            launch_id,
            id: spec.id.clone(),
            pid,
            command: spec.command_line(),
            started_at: Utc::now(),
            state: RecordState::Starting,
            exit_code: None,
        };
        info!("launched {} (pid {}): {}", record.id, pid, record.command);

        state.children.insert(
            launch_id,
            Supervised {
                record: record.clone(),
                child,
            },
        );

        Ok(record)
    }

    /// Wait for a launched child to report ready at `status_url`.
    ///
    /// Returns `Ok(true)` and transitions the record `Starting -> Ready` on
    /// the first successful probe (at most once per launch). Returns
    /// `Ok(false)` when the budget is exhausted or `cancel` fires; the record
    /// stays `Starting` and the process keeps running - whether to proceed in
    /// degraded mode or shut everything down is the caller's call.
    pub async fn await_ready(
        &self,
        launch_id: u64,
        status_url: &str,
        budget: &RetryBudget,
        cancel: &CancellationToken,
    ) -> ProcessResult<bool> {
        let id = {
            let state = self.state.lock().await;
            let supervised = state
                .children
                .get(&launch_id)
                .ok_or_else(|| ProcessError::not_found(launch_id.to_string()))?;
            supervised.record.id.clone()
        };

        let ready = self.probe.wait_until_ready(status_url, budget, cancel).await;

        if ready {
            let mut state = self.state.lock().await;
            if let Some(supervised) = state.children.get_mut(&launch_id) {
                // Only the Starting -> Ready edge exists; a record that was
                // terminated while we probed stays terminated.
                if supervised.record.state == RecordState::Starting {
                    supervised.record.state = RecordState::Ready;
                    info!("{} is ready at {}", id, status_url);
                }
            }
        } else {
            warn!(
                "{} did not become ready within {} attempts at {}",
                id, budget.max_attempts, status_url
            );
        }

        Ok(ready)
    }

    /// Terminate every tracked child that is not already stopped.
    ///
    /// Each child gets a graceful terminate, a grace period, and a forced
    /// kill if it is still alive afterwards. Each record transitions to
    /// `Terminated`/`Killed` at most once, so calling this again (from a
    /// signal handler after the normal exit path already ran, say) performs
    /// no further signaling.
    ///
    /// A cancelled token skips the remaining grace waits so the sequence
    /// degrades to immediate escalation instead of hanging.
    pub async fn shutdown_all(&self, cancel: &CancellationToken) {
        let mut state = self.state.lock().await;

        let mut launch_ids: Vec<u64> = state
            .children
            .iter()
            .filter(|(_, s)| !s.record.state.is_stopped())
            .map(|(launch_id, _)| *launch_id)
            .collect();
        launch_ids.sort_unstable();

        if launch_ids.is_empty() {
            return;
        }
        info!("shutting down {} supervised process(es)", launch_ids.len());

        for launch_id in launch_ids {
            if let Some(supervised) = state.children.get_mut(&launch_id) {
                Self::stop_child(supervised, self.grace_period, cancel).await;
            }
        }
    }

    async fn stop_child(
        supervised: &mut Supervised,
        grace_period: Duration,
        cancel: &CancellationToken,
    ) {
        // Reap first: a child that already exited (crashed during startup,
        // finished on its own) just needs its record closed out.
        if let Ok(Some(status)) = supervised.child.try_wait() {
            supervised.record.exit_code = status.code();
            supervised.record.state = RecordState::Terminated;
            info!(
                "{} (pid {}) had already exited with {:?}",
                supervised.record.id, supervised.record.pid, supervised.record.exit_code
            );
            return;
        }

        let pid = supervised.record.pid;
        info!("stopping {} (pid {})", supervised.record.id, pid);
        if let Err(e) = terminate_gracefully(pid) {
            warn!("graceful terminate of {} failed: {}", supervised.record.id, e);
        }

        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = sleep(grace_period) => {}
        }

        match supervised.child.try_wait() {
            Ok(Some(status)) => {
                supervised.record.exit_code = status.code();
                supervised.record.state = RecordState::Terminated;
                info!("{} stopped gracefully", supervised.record.id);
            }
            _ => {
                warn!(
                    "{} (pid {}) ignored graceful stop, force killing",
                    supervised.record.id, pid
                );
                if let Err(e) = force_kill(pid) {
                    // Cannot be made perfectly reliable on every OS; log and
                    // abandon rather than hang the shutdown sequence.
                    error!(
                        "force kill of {} (pid {}) failed, abandoning: {}",
                        supervised.record.id, pid, e
                    );
                }
                if let Ok(Ok(status)) = timeout(REAP_TIMEOUT, supervised.child.wait()).await {
                    supervised.record.exit_code = status.code();
                }
                supervised.record.state = RecordState::Killed;
            }
        }
    }

    /// Snapshot of all tracked records, oldest launch first.
    pub async fn records(&self) -> Vec<ProcessRecord> {
        let state = self.state.lock().await;
        let mut records: Vec<ProcessRecord> = state
            .children
            .values()
            .map(|s| s.record.clone())
            .collect();
        records.sort_by_key(|r| r.launch_id);
        records
    }

    /// Snapshot of one record.
    pub async fn record(&self, launch_id: u64) -> Option<ProcessRecord> {
        let state = self.state.lock().await;
        state.children.get(&launch_id).map(|s| s.record.clone())
    }
}
