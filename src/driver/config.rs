use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use super::err::DriverError;

/// How to launch one algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

/// Where the standard error of algorithms goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StderrPolicy {
    Inherit,
    Discard,
}

impl StderrPolicy {
    pub(crate) fn stdio(self: Self) -> Stdio {
        match self {
            StderrPolicy::Inherit => Stdio::inherit(),
            StderrPolicy::Discard => Stdio::null(),
        }
    }
}

/// Configuration of a `Driver`.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Directory containing one executable per algorithm, named after it
    pub algorithms_dir: Option<PathBuf>,
    /// Explicitly registered algorithms, looked up before `algorithms_dir`
    pub registrations: HashMap<String, AlgorithmCommand>,
    pub stderr: StderrPolicy,
    /// Delay between two status checks in `Driver::algorithm_wait`
    pub poll_interval: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig {
            algorithms_dir: None,
            registrations: HashMap::new(),
            stderr: StderrPolicy::Inherit,
            poll_interval: Duration::from_millis(10),
        }
    }
}

impl DriverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn algorithms_dir(mut self: Self, dir: impl Into<PathBuf>) -> Self {
        self.algorithms_dir = Some(dir.into());
        self
    }

    pub fn stderr(mut self: Self, stderr: StderrPolicy) -> Self {
        self.stderr = stderr;
        self
    }

    /// Registers algorithm `name` as `program args...`. A bare program name is searched in `PATH`.
    pub fn register<S: Into<String>>(
        mut self: Self,
        name: impl Into<String>,
        program: impl Into<PathBuf>,
        args: impl IntoIterator<Item = S>,
    ) -> Self {
        self.registrations.insert(
            name.into(),
            AlgorithmCommand {
                program: program.into(),
                args: args.into_iter().map(Into::into).collect(),
            },
        );
        self
    }

    /// Finds the command to run for algorithm `name`.
    pub fn resolve(self: &Self, name: &str) -> Result<AlgorithmCommand, DriverError> {
        if let Some(command) = self.registrations.get(name) {
            let program = which::which(&command.program)
                .map_err(|_| DriverError::not_found(format!("program {:?}", command.program)))?;
            return Ok(AlgorithmCommand {
                program,
                args: command.args.clone(),
            });
        }

        let dir = self
            .algorithms_dir
            .as_ref()
            .ok_or_else(|| DriverError::not_found(format!("algorithm `{}`", name)))?;
        if !is_plain_name(name) {
            return Err(DriverError::not_found(format!("algorithm `{}`", name)));
        }
        let program = dir.join(name);
        if !program.is_file() {
            return Err(DriverError::not_found(format!(
                "algorithm `{}` in {:?}",
                name, dir
            )));
        }
        Ok(AlgorithmCommand {
            program,
            args: vec![],
        })
    }
}

/// A name that stays inside the directory it is joined to.
fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
