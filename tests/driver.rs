#![cfg(unix)]

use std::collections::HashSet;
use std::fs;
use std::io::{Read, Write};
use std::os::unix::fs::PermissionsExt;
use std::sync::Arc;
use std::thread;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use turingarena_driver::driver::*;

fn shell(name: &str, script: &str) -> DriverConfig {
    DriverConfig::new().register(name, "sh", vec!["-c", script])
}

fn driver() -> Driver {
    let _ = env_logger::builder().is_test(true).try_init();
    Driver::new(
        DriverConfig::new()
            .register("cat", "cat", Vec::<String>::new())
            .register("exit3", "sh", vec!["-c", "exit 3"])
            .register("sleeper", "sh", vec!["-c", "exec sleep 30"])
            .register("greeter", "sh", vec!["-c", "read x; echo got $x"])
            .register("suicide", "sh", vec!["-c", "kill -9 $$"]),
    )
}

#[test]
fn status_of_unknown_id() {
    let driver = driver();
    assert_eq!(
        driver.algorithm_status(AlgorithmId::from_raw(42)),
        AlgorithmStatus::NotFound
    );
    assert!(matches!(
        driver.algorithm_kill(AlgorithmId::from_raw(42)),
        Err(DriverError::NotFound { .. })
    ));
    assert!(driver.algorithm_input_pipe(AlgorithmId::from_raw(42)).is_none());
}

#[test]
fn start_unknown_algorithm() {
    let driver = driver();
    assert!(matches!(
        driver.algorithm_start("nope"),
        Err(DriverError::NotFound { .. })
    ));
}

#[test]
fn exit_code_is_reported() {
    let driver = driver();
    let id = driver.algorithm_start("exit3").unwrap();

    assert_eq!(driver.algorithm_wait(id), AlgorithmStatus::Exited(3));
    assert_eq!(driver.algorithm_status(id), AlgorithmStatus::Exited(3));
    assert!(matches!(
        driver.algorithm_kill(id),
        Err(DriverError::AlreadyExited { .. })
    ));
}

#[test]
fn death_by_signal() {
    let driver = driver();
    let id = driver.algorithm_start("suicide").unwrap();
    assert_eq!(driver.algorithm_wait(id), AlgorithmStatus::Exited(128 + 9));
}

#[test]
fn data_flows_through_algorithm() {
    let driver = driver();
    let id = driver.algorithm_start("cat").unwrap();

    let mut input = driver.algorithm_input_pipe(id).unwrap();
    let mut output = driver.algorithm_output_pipe(id).unwrap();
    input.write_all(b"1 2 3\n").unwrap();
    input.close().unwrap();

    let mut text = String::new();
    output.read_to_string(&mut text).unwrap();
    assert_eq!(text, "1 2 3\n");

    assert_eq!(driver.algorithm_wait(id), AlgorithmStatus::Exited(0));
    assert!(driver.algorithm_input_pipe(id).is_none());
    assert!(driver.algorithm_output_pipe(id).is_none());
}

#[test]
fn output_can_be_drained_after_exit() {
    let driver = driver();
    let id = driver.algorithm_start("greeter").unwrap();
    let mut input = driver.algorithm_input_pipe(id).unwrap();
    let mut output = driver.algorithm_output_pipe(id).unwrap();

    input.write_all(b"hi\n").unwrap();
    input.close().unwrap();
    assert_eq!(driver.algorithm_wait(id), AlgorithmStatus::Exited(0));

    let mut text = String::new();
    output.read_to_string(&mut text).unwrap();
    assert_eq!(text, "got hi\n");
}

#[test]
fn dropping_input_signals_end_of_input() {
    let driver = driver();
    let id = driver.algorithm_start("cat").unwrap();
    let mut output = driver.algorithm_output_pipe(id).unwrap();

    {
        let mut input = driver.algorithm_input_pipe(id).unwrap();
        input.write_all(b"x\n").unwrap();
        input.flush().unwrap();
    }
    assert!(driver.algorithm_input_pipe(id).is_none());

    let mut text = String::new();
    output.read_to_string(&mut text).unwrap();
    assert_eq!(text, "x\n");
    assert_eq!(driver.algorithm_wait(id), AlgorithmStatus::Exited(0));
}

#[test]
fn kill_is_terminal() {
    let driver = driver();
    let id = driver.algorithm_start("sleeper").unwrap();
    assert_eq!(driver.algorithm_status(id), AlgorithmStatus::Running);

    driver.algorithm_kill(id).unwrap();

    assert_eq!(driver.algorithm_status(id), AlgorithmStatus::Killed);
    assert!(driver.algorithm_status(id).is_terminal());
    assert!(matches!(
        driver.algorithm_kill(id),
        Err(DriverError::AlreadyExited { .. })
    ));
    assert!(driver.algorithm_input_pipe(id).is_none());
}

#[test]
fn killing_one_instance_leaves_others_alone() {
    let driver = driver();
    let victim = driver.algorithm_start("sleeper").unwrap();
    let survivor = driver.algorithm_start("cat").unwrap();

    driver.algorithm_kill(victim).unwrap();

    assert_eq!(driver.algorithm_status(survivor), AlgorithmStatus::Running);
    driver.algorithm_input_pipe(survivor).unwrap().close().unwrap();
    assert_eq!(driver.algorithm_wait(survivor), AlgorithmStatus::Exited(0));
}

#[test]
fn kill_racing_with_exit() {
    let driver = Arc::new(Driver::new(shell("quick", "exit 0")));

    for _ in 0..50 {
        let id = driver.algorithm_start("quick").unwrap();
        let killer = {
            let driver = driver.clone();
            thread::spawn(move || driver.algorithm_kill(id))
        };
        let status = driver.algorithm_wait(id);
        let killed = match killer.join().unwrap() {
            Ok(()) => true,
            Err(DriverError::AlreadyExited { .. }) => false,
            Err(e) => panic!("unexpected kill failure: {}", e),
        };

        assert!(status.is_terminal());
        assert_eq!(killed, status == AlgorithmStatus::Killed);
        assert_eq!(driver.algorithm_status(id), status);
    }
    assert!(driver.open_handles().is_empty());
}

#[test]
fn concurrent_starts_get_distinct_ids() {
    let driver = Arc::new(Driver::new(shell("quick", "exit 0")));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let driver = driver.clone();
            thread::spawn(move || driver.algorithm_start("quick").unwrap())
        })
        .collect();
    let ids: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let unique: HashSet<_> = ids.iter().copied().collect();
    assert_eq!(unique.len(), ids.len());
    for id in ids {
        assert_eq!(driver.algorithm_wait(id), AlgorithmStatus::Exited(0));
    }
}

#[test]
fn algorithms_directory() {
    let dir = TempDir::new().unwrap();
    std::os::unix::fs::symlink("/bin/sh", dir.path().join("interpreter")).unwrap();
    fs::write(dir.path().join("locked"), "#!/bin/sh\n").unwrap();
    fs::set_permissions(dir.path().join("locked"), fs::Permissions::from_mode(0o644)).unwrap();

    let driver = Driver::new(DriverConfig::new().algorithms_dir(dir.path()));

    let id = driver.algorithm_start("interpreter").unwrap();
    let mut input = driver.algorithm_input_pipe(id).unwrap();
    let mut output = driver.algorithm_output_pipe(id).unwrap();
    input.write_all(b"echo hello\n").unwrap();
    input.close().unwrap();
    let mut text = String::new();
    output.read_to_string(&mut text).unwrap();
    assert_eq!(text, "hello\n");
    assert_eq!(driver.algorithm_wait(id), AlgorithmStatus::Exited(0));

    assert!(matches!(
        driver.algorithm_start("locked"),
        Err(DriverError::PermissionDenied { .. })
    ));
    assert!(matches!(
        driver.algorithm_start("../interpreter"),
        Err(DriverError::NotFound { .. })
    ));
}

#[test]
fn read_missing_file() {
    let dir = TempDir::new().unwrap();
    let driver = driver();
    assert!(matches!(
        driver.read_file_open(dir.path().join("missing.txt")),
        Err(DriverError::NotFound { .. })
    ));
}

#[test]
fn unreadable_files_are_denied() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("secret.txt");
    fs::write(&path, "x").unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::File::open(&path).is_ok() {
        // running with privileges that bypass file modes
        return;
    }
    let driver = driver();

    assert!(matches!(
        driver.read_file_open(&path),
        Err(DriverError::PermissionDenied { .. })
    ));
    assert!(matches!(
        driver.write_file_open(&path),
        Err(DriverError::PermissionDenied { .. })
    ));
    assert!(driver.open_handles().is_empty());
}

#[test]
fn directories_are_not_files() {
    let dir = TempDir::new().unwrap();
    let driver = driver();

    assert!(matches!(
        driver.read_file_open(dir.path()),
        Err(DriverError::Io { .. })
    ));
    assert!(matches!(
        driver.write_file_open(dir.path()),
        Err(DriverError::Io { .. })
    ));
    assert!(driver.open_handles().is_empty());
}

#[test]
fn file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.txt");
    let driver = driver();

    let write_id = driver.write_file_open(&path).unwrap();
    let mut pipe = driver.write_file_pipe(write_id).unwrap();
    pipe.write_all(b"4\n1 2 3 4\n").unwrap();
    driver.write_file_close(write_id).unwrap();

    let read_id = driver.read_file_open(&path).unwrap();
    let mut content = Vec::new();
    driver
        .read_file_pipe(read_id)
        .unwrap()
        .read_to_end(&mut content)
        .unwrap();
    driver.read_file_close(read_id).unwrap();

    assert_eq!(content, b"4\n1 2 3 4\n");
}

#[test]
fn write_truncates() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.txt");
    fs::write(&path, "a much longer previous content").unwrap();
    let driver = driver();

    let id = driver.write_file_open(&path).unwrap();
    driver.write_file_pipe(id).unwrap().write_all(b"new").unwrap();
    driver.write_file_close(id).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "new");
}

#[test]
fn closed_channel_ids_are_not_reused() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("in.txt");
    fs::write(&path, "x").unwrap();
    let driver = driver();

    let first = driver.read_file_open(&path).unwrap();
    let mut stale = driver.read_file_pipe(first).unwrap();
    driver.read_file_close(first).unwrap();

    assert!(matches!(
        driver.read_file_close(first),
        Err(DriverError::NotFound { .. })
    ));
    assert!(driver.read_file_pipe(first).is_err());
    assert!(stale.read(&mut [0; 1]).is_err());

    let second = driver.read_file_open(&path).unwrap();
    assert_ne!(first, second);
}

#[test]
fn leftover_handles_are_closed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("log.txt");
    let driver = driver();

    let id = driver.algorithm_start("sleeper").unwrap();
    let write_id = driver.write_file_open(&path).unwrap();
    driver
        .write_file_pipe(write_id)
        .unwrap()
        .write_all(b"pending")
        .unwrap();

    let open = driver.open_handles();
    assert_eq!(open.algorithms, vec![id]);
    assert_eq!(open.write_files, vec![write_id]);
    assert!(open.read_files.is_empty());

    driver.close_all();

    assert!(driver.open_handles().is_empty());
    assert_eq!(driver.algorithm_status(id), AlgorithmStatus::NotFound);
    assert_eq!(fs::read_to_string(&path).unwrap(), "pending");
}
