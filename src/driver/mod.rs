//! Runtime support for generated programs.
//!
//! A `Driver` starts algorithms as child processes and hands out pipe
//! handles connected to their standard input and output. It also opens
//! files as read or write channels, so that generated code never touches
//! process or file APIs directly.
//!
//! All the state lives in three handle tables, each behind its own lock.
//! Id allocation and insertion happen under that lock, so concurrent
//! callers always receive distinct ids.

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;

use log::{debug, info, warn};

mod algorithm;
mod config;
mod err;
mod pipe;
mod table;

pub use algorithm::AlgorithmStatus;
pub use config::*;
pub use err::DriverError;
pub use pipe::{ReadPipe, WritePipe};
pub use table::{AlgorithmId, HandleId, ReadFileId, WriteFileId};

use algorithm::AlgorithmInstance;
use table::{lock, HandleTable};

/// A file bound to a pipe handle.
#[derive(Debug)]
struct FileChannel<P> {
    path: PathBuf,
    pipe: P,
}

/// Ids of the resources that are still live.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenHandles {
    /// Instances still running
    pub algorithms: Vec<AlgorithmId>,
    pub read_files: Vec<ReadFileId>,
    pub write_files: Vec<WriteFileId>,
}

impl OpenHandles {
    pub fn is_empty(self: &Self) -> bool {
        self.algorithms.is_empty() && self.read_files.is_empty() && self.write_files.is_empty()
    }
}

/// Driver context. Creating one is the initialization step; it can be shared between threads.
#[derive(Debug)]
pub struct Driver {
    config: DriverConfig,
    algorithms: Mutex<HandleTable<AlgorithmId, AlgorithmInstance>>,
    read_files: Mutex<HandleTable<ReadFileId, FileChannel<ReadPipe>>>,
    write_files: Mutex<HandleTable<WriteFileId, FileChannel<WritePipe>>>,
}

impl Driver {
    pub fn new(config: DriverConfig) -> Self {
        debug!("Driver initialized: {:?}", config);
        Driver {
            config,
            algorithms: Mutex::new(HandleTable::new()),
            read_files: Mutex::new(HandleTable::new()),
            write_files: Mutex::new(HandleTable::new()),
        }
    }

    pub fn config(self: &Self) -> &DriverConfig {
        &self.config
    }

    /// Starts algorithm `name` in a new process.
    pub fn algorithm_start(self: &Self, name: &str) -> Result<AlgorithmId, DriverError> {
        let command = self.config.resolve(name)?;
        let instance = AlgorithmInstance::spawn(name, &command, self.config.stderr)?;
        let id = lock(&self.algorithms).insert(instance);
        info!("Started algorithm {} as {}", name, id);
        Ok(id)
    }

    /// Last observed status of instance `id`. Never blocks.
    pub fn algorithm_status(self: &Self, id: AlgorithmId) -> AlgorithmStatus {
        match lock(&self.algorithms).get_mut(id) {
            Some(instance) => instance.poll(),
            None => AlgorithmStatus::NotFound,
        }
    }

    /// Blocks until instance `id` reaches a terminal state.
    pub fn algorithm_wait(self: &Self, id: AlgorithmId) -> AlgorithmStatus {
        loop {
            match self.algorithm_status(id) {
                AlgorithmStatus::Running => thread::sleep(self.config.poll_interval),
                status => return status,
            }
        }
    }

    /// Forcefully terminates instance `id`. Does not wait for the process to be gone.
    pub fn algorithm_kill(self: &Self, id: AlgorithmId) -> Result<(), DriverError> {
        let mut algorithms = lock(&self.algorithms);
        let instance = algorithms
            .get_mut(id)
            .ok_or_else(|| DriverError::not_found(id))?;
        instance.kill(id)?;
        info!("Killed {}", id);
        Ok(())
    }

    /// Write end of the standard input of `id`, while it is running.
    ///
    /// The returned handle owns the stream: dropping every clone of it
    /// signals end of input, like closing it does.
    pub fn algorithm_input_pipe(self: &Self, id: AlgorithmId) -> Option<WritePipe> {
        lock(&self.algorithms)
            .get_mut(id)
            .and_then(AlgorithmInstance::input_pipe)
    }

    /// Read end of the standard output of `id`, while it is running.
    pub fn algorithm_output_pipe(self: &Self, id: AlgorithmId) -> Option<ReadPipe> {
        lock(&self.algorithms)
            .get(id)
            .and_then(AlgorithmInstance::output_pipe)
    }

    pub fn read_file_open(self: &Self, path: impl AsRef<Path>) -> Result<ReadFileId, DriverError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| DriverError::open(path, e))?;
        let metadata = file.metadata().map_err(|e| DriverError::open(path, e))?;
        if metadata.is_dir() {
            let e = io::Error::new(io::ErrorKind::InvalidInput, "is a directory");
            return Err(DriverError::open(path, e));
        }
        let id = lock(&self.read_files).insert(FileChannel {
            path: path.to_owned(),
            pipe: ReadPipe::new(BufReader::new(file)),
        });
        debug!("Opened {:?} as {}", path, id);
        Ok(id)
    }

    pub fn read_file_pipe(self: &Self, id: ReadFileId) -> Result<ReadPipe, DriverError> {
        lock(&self.read_files)
            .get(id)
            .map(|channel| channel.pipe.clone())
            .ok_or_else(|| DriverError::not_found(id))
    }

    pub fn read_file_close(self: &Self, id: ReadFileId) -> Result<(), DriverError> {
        let channel = lock(&self.read_files)
            .remove(id)
            .ok_or_else(|| DriverError::not_found(id))?;
        channel.pipe.close();
        debug!("Closed {} ({:?})", id, channel.path);
        Ok(())
    }

    /// Opens `path` for writing, creating or truncating it.
    pub fn write_file_open(
        self: &Self,
        path: impl AsRef<Path>,
    ) -> Result<WriteFileId, DriverError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| DriverError::open(path, e))?;
        let id = lock(&self.write_files).insert(FileChannel {
            path: path.to_owned(),
            pipe: WritePipe::new(BufWriter::new(file)),
        });
        debug!("Opened {:?} as {}", path, id);
        Ok(id)
    }

    pub fn write_file_pipe(self: &Self, id: WriteFileId) -> Result<WritePipe, DriverError> {
        lock(&self.write_files)
            .get(id)
            .map(|channel| channel.pipe.clone())
            .ok_or_else(|| DriverError::not_found(id))
    }

    /// Flushes and closes channel `id`. The channel is released even if flushing fails.
    pub fn write_file_close(self: &Self, id: WriteFileId) -> Result<(), DriverError> {
        let channel = lock(&self.write_files)
            .remove(id)
            .ok_or_else(|| DriverError::not_found(id))?;
        channel
            .pipe
            .close()
            .map_err(|e| DriverError::io(format!("{} ({:?})", id, channel.path), e))?;
        debug!("Closed {} ({:?})", id, channel.path);
        Ok(())
    }

    pub fn open_handles(self: &Self) -> OpenHandles {
        let running = lock(&self.algorithms)
            .iter_mut()
            .filter_map(|(id, instance)| match instance.poll() {
                AlgorithmStatus::Running => Some(id),
                _ => None,
            })
            .collect();
        OpenHandles {
            algorithms: running,
            read_files: lock(&self.read_files).ids(),
            write_files: lock(&self.write_files).ids(),
        }
    }

    /// Kills every running instance and closes every channel.
    ///
    /// The tables are emptied first; killing and reaping happen without
    /// holding any lock.
    pub fn close_all(self: &Self) {
        let algorithms = lock(&self.algorithms).drain();
        for (id, mut instance) in algorithms {
            if instance.poll() == AlgorithmStatus::Running {
                warn!("Killing leftover {} ({})", id, instance.name);
                if let Err(e) = instance.kill(id) {
                    warn!("Cannot kill {}: {}", id, e);
                }
            }
            if instance.poll().is_terminal() {
                instance.reap();
            }
        }
        let read_files = lock(&self.read_files).drain();
        for (id, channel) in read_files {
            warn!("Closing leftover {} ({:?})", id, channel.path);
            channel.pipe.close();
        }
        let write_files = lock(&self.write_files).drain();
        for (id, channel) in write_files {
            warn!("Closing leftover {} ({:?})", id, channel.path);
            if let Err(e) = channel.pipe.close() {
                warn!("Cannot flush {}: {}", id, e);
            }
        }
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        self.close_all();
    }
}
