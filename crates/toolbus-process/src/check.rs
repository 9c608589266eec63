//! Process existence checking.
//!
//! Non-destructive liveness checks, used to decide whether termination needs
//! to escalate. On Unix this is `kill(pid, 0)`; on Windows, `OpenProcess`.

use toolbus_common::ProcessResult;

/// Check if a process with the given PID exists and is running.
///
/// * `Ok(true)` - process exists (possibly owned by another user)
/// * `Ok(false)` - no such process
/// * `Err(_)` - the check itself failed
pub fn process_exists(pid: u32) -> ProcessResult<bool> {
    #[cfg(unix)]
    {
        process_exists_unix(pid)
    }

    #[cfg(windows)]
    {
        process_exists_windows(pid)
    }
}

#[cfg(unix)]
fn process_exists_unix(pid: u32) -> ProcessResult<bool> {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let nix_pid = Pid::from_raw(pid as i32);

    match kill(nix_pid, None) {
        Ok(_) => Ok(true),
        Err(nix::errno::Errno::ESRCH) => Ok(false),
        // Process exists but we don't have permission to signal it
        Err(nix::errno::Errno::EPERM) => Ok(true),
        Err(e) => Err(toolbus_common::ProcessError::configuration(
            pid.to_string(),
            format!("Failed to check process: {}", e),
        )),
    }
}

#[cfg(windows)]
fn process_exists_windows(pid: u32) -> ProcessResult<bool> {
    use windows::Win32::Foundation::CloseHandle;
    use windows::Win32::System::Threading::{OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION};

    unsafe {
        let handle = match OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid) {
            Ok(h) => h,
            Err(e) => {
                let error_code = e.code().0 as u32;
                const ERROR_INVALID_PARAMETER: u32 = 0x80070057;
                const ERROR_ACCESS_DENIED: u32 = 0x80070005;

                if error_code == ERROR_INVALID_PARAMETER || error_code == ERROR_ACCESS_DENIED {
                    return Ok(false);
                }
                return Err(toolbus_common::ProcessError::configuration(
                    pid.to_string(),
                    format!("Failed to check process: {}", e),
                ));
            }
        };

        let _ = CloseHandle(handle);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_process_exists() {
        let current_pid = std::process::id();
        assert!(process_exists(current_pid).unwrap());
    }

    #[test]
    fn test_nonexistent_process() {
        let unlikely_pid = if cfg!(windows) { 99999999 } else { 9999999 };
        // Accept either outcome; the PID might exist on a busy host
        let _ = process_exists(unlikely_pid).unwrap();
    }

    #[test]
    #[cfg(unix)]
    fn test_system_process() {
        assert!(process_exists(1).unwrap());
    }
}
