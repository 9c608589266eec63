//! Process spawning.

use std::collections::HashMap;
use tokio::process::{Child, Command};
use toolbus_common::{ProcessError, ProcessResult};

/// Spawn a child process with an environment overlay.
///
/// The overlay is merged over the parent environment, which is how the
/// launcher injects mode flags (mock backends, port overrides) without
/// rebuilding the whole environment.
pub fn spawn_process(
    executable: &str,
    args: &[String],
    env_overlay: &HashMap<String, String>,
    working_dir: Option<&str>,
) -> ProcessResult<Child> {
    let mut command = Command::new(executable);
    command.args(args).envs(env_overlay).kill_on_drop(false);
    if let Some(dir) = working_dir {
        command.current_dir(dir);
    }

    command
        .spawn()
        .map_err(|e| ProcessError::spawn_failed(executable, e.to_string()))
}
