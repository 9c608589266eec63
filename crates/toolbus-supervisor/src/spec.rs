//! Launch specifications.

use std::collections::HashMap;

/// Everything needed to start one supervised child process.
///
/// The supervisor does not interpret the executable or its arguments; it only
/// manages the resulting OS process. The environment overlay is merged over
/// the parent environment, which is how callers flip mode flags (for example
/// forcing a mock backend instead of a real engine).
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    /// Human-readable label ("router", "asset", "engine", ...).
    pub id: String,
    pub executable_path: String,
    pub args: Vec<String>,
    pub environment: HashMap<String, String>,
    pub working_directory: Option<String>,
}

impl LaunchSpec {
    pub fn new(id: impl Into<String>, executable_path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            executable_path: executable_path.into(),
            args: Vec::new(),
            environment: HashMap::new(),
            working_directory: None,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    pub fn with_working_directory(mut self, dir: impl Into<String>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    /// Rendered command line for logs and diagnostics.
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.executable_path.clone()
        } else {
            format!("{} {}", self.executable_path, self.args.join(" "))
        }
    }
}
