//! Process termination primitives.
//!
//! Graceful termination asks the process to exit; forced termination does not
//! wait for an answer. The supervisor decides when to escalate from one to
//! the other.

use toolbus_common::{ProcessError, ProcessResult};

/// Terminate a process gracefully (SIGTERM on Unix, TerminateProcess on Windows).
pub fn terminate_gracefully(pid: u32) -> ProcessResult<()> {
    #[cfg(unix)]
    {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let nix_pid = Pid::from_raw(pid as i32);
        kill(nix_pid, Signal::SIGTERM)
            .map_err(|e| ProcessError::stop_failed(pid.to_string(), e.to_string()))
    }

    // Windows has no SIGTERM equivalent for arbitrary console processes, so
    // graceful and forced termination collapse to the same call.
    #[cfg(windows)]
    {
        force_kill(pid)
    }
}

/// Force kill a process (SIGKILL on Unix, TerminateProcess on Windows).
pub fn force_kill(pid: u32) -> ProcessResult<()> {
    #[cfg(unix)]
    {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let nix_pid = Pid::from_raw(pid as i32);
        kill(nix_pid, Signal::SIGKILL)
            .map_err(|e| ProcessError::stop_failed(pid.to_string(), e.to_string()))
    }

    #[cfg(windows)]
    {
        use windows::Win32::Foundation::CloseHandle;
        use windows::Win32::System::Threading::{OpenProcess, TerminateProcess, PROCESS_TERMINATE};

        unsafe {
            let handle = match OpenProcess(PROCESS_TERMINATE, false, pid) {
                Ok(h) if !h.is_invalid() => h,
                _ => {
                    return Err(ProcessError::stop_failed(
                        pid.to_string(),
                        "Failed to open process for termination".to_string(),
                    ));
                }
            };

            let result = TerminateProcess(handle, 1);
            let _ = CloseHandle(handle);

            result.map_err(|e| {
                ProcessError::stop_failed(
                    pid.to_string(),
                    format!("TerminateProcess failed: {}", e),
                )
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::process_exists;
    use crate::execute::spawn_process;
    use std::collections::HashMap;
    use std::time::Duration;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_graceful_termination() {
        let mut child =
            spawn_process("sleep", &["30".to_string()], &HashMap::new(), None).unwrap();
        let pid = child.id().unwrap();
        assert!(process_exists(pid).unwrap());

        terminate_gracefully(pid).unwrap();
        let status = child.wait().await.unwrap();
        assert!(!status.success());
        assert!(!process_exists(pid).unwrap());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_force_kill_ignores_term_trap() {
        // A shell that traps SIGTERM only goes away with SIGKILL.
        let mut child = spawn_process(
            "sh",
            &[
                "-c".to_string(),
                "trap '' TERM; sleep 30".to_string(),
            ],
            &HashMap::new(),
            None,
        )
        .unwrap();
        let pid = child.id().unwrap();

        // Give the shell a moment to install the trap.
        tokio::time::sleep(Duration::from_millis(100)).await;
        terminate_gracefully(pid).unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(process_exists(pid).unwrap());

        force_kill(pid).unwrap();
        child.wait().await.unwrap();
        assert!(!process_exists(pid).unwrap());
    }

    #[test]
    fn test_terminate_nonexistent_process() {
        let unlikely_pid = if cfg!(windows) { 99999998 } else { 9999998 };
        if !process_exists(unlikely_pid).unwrap_or(true) {
            assert!(terminate_gracefully(unlikely_pid).is_err());
        }
    }
}
