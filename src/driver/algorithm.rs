use std::io;
use std::process::{Child, Command, ExitStatus, Stdio};

use log::{debug, warn};

use super::config::{AlgorithmCommand, StderrPolicy};
use super::err::DriverError;
use super::pipe::{ReadPipe, WeakWritePipe, WritePipe};
use super::table::AlgorithmId;

/// Status of an algorithm instance, as last observed by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmStatus {
    Running,
    /// The process terminated on its own. Death by a signal `s` not sent by
    /// the driver is reported as code `128 + s`.
    Exited(i32),
    /// Terminated by `Driver::algorithm_kill`.
    Killed,
    /// No instance was ever started with this id.
    NotFound,
}

impl AlgorithmStatus {
    pub fn is_terminal(self: Self) -> bool {
        matches!(self, AlgorithmStatus::Exited(_) | AlgorithmStatus::Killed)
    }
}

/// The driver's hold on the stdin of an instance.
#[derive(Debug)]
enum Input {
    /// Not handed out yet
    Owned(WritePipe),
    /// Handed out: the caller's handles are the only owners, and dropping
    /// all of them closes the stream
    Lent(WeakWritePipe),
    Released,
}

/// A started algorithm: a child process and the driver's ends of its stdin and stdout.
#[derive(Debug)]
pub(crate) struct AlgorithmInstance {
    pub name: String,
    child: Child,
    status: AlgorithmStatus,
    /// Whether the process has been waited for
    reaped: bool,
    input: Input,
    output: Option<ReadPipe>,
}

impl AlgorithmInstance {
    pub fn spawn(
        name: &str,
        command: &AlgorithmCommand,
        stderr: StderrPolicy,
    ) -> Result<Self, DriverError> {
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(stderr.stdio())
            .spawn()
            .map_err(|e| DriverError::spawn(name, e))?;
        debug!(
            "Spawned algorithm {} as pid {}: {:?}",
            name,
            child.id(),
            command
        );

        let input = match child.stdin.take() {
            Some(stdin) => Input::Owned(WritePipe::new(stdin)),
            None => Input::Released,
        };
        let output = child.stdout.take().map(ReadPipe::new);
        Ok(AlgorithmInstance {
            name: name.to_owned(),
            child,
            status: AlgorithmStatus::Running,
            reaped: false,
            input,
            output,
        })
    }

    /// Checks whether the process exited, without blocking.
    ///
    /// A killed process is reaped here too, once it is gone.
    pub fn poll(self: &mut Self) -> AlgorithmStatus {
        if self.reaped {
            return self.status;
        }
        match self.child.try_wait() {
            Ok(Some(status)) => {
                self.reaped = true;
                if self.status == AlgorithmStatus::Running {
                    let code = exit_code(status);
                    debug!("Algorithm {} exited with code {}", self.name, code);
                    self.terminate(AlgorithmStatus::Exited(code));
                }
            }
            Ok(None) => {}
            Err(e) => warn!("Cannot get status of algorithm {}: {}", self.name, e),
        }
        self.status
    }

    /// Sends the kill signal. Never blocks: the process is reaped by a later `poll` or `reap`.
    pub fn kill(self: &mut Self, id: AlgorithmId) -> Result<(), DriverError> {
        if self.poll() != AlgorithmStatus::Running {
            return Err(DriverError::AlreadyExited { id });
        }
        if let Err(e) = self.child.kill() {
            // the process may have been reaped in the meantime
            if e.kind() == io::ErrorKind::InvalidInput {
                self.poll();
                return Err(DriverError::AlreadyExited { id });
            }
            return Err(DriverError::io(id, e));
        }
        debug!("Algorithm {} killed", self.name);
        self.terminate(AlgorithmStatus::Killed);
        self.poll();
        Ok(())
    }

    /// Waits for the process to be gone. Blocks if it is still running.
    pub fn reap(self: &mut Self) {
        if self.reaped {
            return;
        }
        match self.child.wait() {
            Ok(status) => {
                self.reaped = true;
                if self.status == AlgorithmStatus::Running {
                    self.terminate(AlgorithmStatus::Exited(exit_code(status)));
                }
            }
            Err(e) => warn!("Cannot reap algorithm {}: {}", self.name, e),
        }
    }

    /// Given out while the instance is running, as last observed.
    ///
    /// After the first call the driver no longer keeps stdin open: once the
    /// caller drops every handle, the algorithm sees end of input and this
    /// returns `None`.
    pub fn input_pipe(self: &mut Self) -> Option<WritePipe> {
        let pipe = match &self.input {
            Input::Owned(pipe) => pipe.clone(),
            Input::Lent(weak) => weak.upgrade()?,
            Input::Released => return None,
        };
        self.input = Input::Lent(pipe.downgrade());
        Some(pipe)
    }

    pub fn output_pipe(self: &Self) -> Option<ReadPipe> {
        self.output.clone()
    }

    /// Enters a terminal state. Handles already given out keep the streams
    /// alive, so pending output can still be drained.
    fn terminate(self: &mut Self, status: AlgorithmStatus) {
        self.status = status;
        self.input = Input::Released;
        self.output = None;
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}
