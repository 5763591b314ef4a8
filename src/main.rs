extern crate structopt;

use std::fs::read_to_string;
use std::io;
use std::path::{Path, PathBuf};
use std::process::exit;
use std::thread;

use anyhow::{anyhow, Context};
use log::warn;
use structopt::StructOpt;

use turingarena_driver::driver::*;
use turingarena_driver::model::Interface;
use turingarena_driver::render::render_interface;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "turingarena-driver",
    about = "Generate declarations for algorithm interfaces, and run compiled algorithms."
)]
enum App {
    #[structopt(about = "Checks that an interface description is correct")]
    Lint {
        #[structopt(long, parse(from_os_str), default_value = "./interface.json")]
        interface: PathBuf,
    },
    #[structopt(about = "Generates C++ declarations for an interface")]
    Gen {
        #[structopt(long, parse(from_os_str), default_value = "./interface.json")]
        interface: PathBuf,
    },
    #[structopt(about = "Runs an algorithm, feeding it a file and saving its output")]
    Run {
        #[structopt(long, parse(from_os_str), default_value = "./algorithms")]
        algorithms_dir: PathBuf,
        #[structopt(long)]
        name: String,
        #[structopt(long, parse(from_os_str))]
        input: Option<PathBuf>,
        #[structopt(long, parse(from_os_str))]
        output: Option<PathBuf>,
    },
}

fn load_interface(path: &Path) -> anyhow::Result<Interface> {
    let source = read_to_string(path).with_context(|| format!("Cannot read {:?}", path))?;
    serde_json::from_str(&source).with_context(|| format!("Invalid interface in {:?}", path))
}

fn run(
    algorithms_dir: PathBuf,
    name: &str,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
) -> anyhow::Result<i32> {
    let driver = Driver::new(DriverConfig::new().algorithms_dir(algorithms_dir));
    let id = driver.algorithm_start(name)?;

    let mut to_algorithm = driver
        .algorithm_input_pipe(id)
        .ok_or_else(|| anyhow!("{} exited before reading its input", id))?;
    let mut from_algorithm = driver
        .algorithm_output_pipe(id)
        .ok_or_else(|| anyhow!("{} exited before writing its output", id))?;

    let feeder = match input {
        Some(path) => {
            let input_id = driver.read_file_open(&path)?;
            let mut source = driver.read_file_pipe(input_id)?;
            let handle = thread::spawn(move || -> io::Result<u64> {
                let copied = io::copy(&mut source, &mut to_algorithm);
                to_algorithm.close()?;
                copied
            });
            Some((input_id, handle))
        }
        None => {
            to_algorithm.close()?;
            None
        }
    };

    match output {
        Some(path) => {
            let output_id = driver.write_file_open(&path)?;
            let mut sink = driver.write_file_pipe(output_id)?;
            io::copy(&mut from_algorithm, &mut sink)?;
            driver.write_file_close(output_id)?;
        }
        None => {
            io::copy(&mut from_algorithm, &mut io::stdout())?;
        }
    }

    if let Some((input_id, handle)) = feeder {
        match handle.join() {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!("Input not fully consumed by {}: {}", id, e),
            Err(_) => warn!("Input feeder of {} panicked", id),
        }
        driver.read_file_close(input_id)?;
    }

    match driver.algorithm_wait(id) {
        AlgorithmStatus::Exited(code) => Ok(code),
        status => Err(anyhow!("{} ended with status {:?}", id, status)),
    }
}

fn main() {
    env_logger::init();

    let app = App::from_args();

    let result = match app {
        App::Lint { interface } => load_interface(&interface).map(|interface| {
            println!(
                "Interface {} with {} algorithms",
                interface.name,
                interface.algorithms.len()
            );
            0
        }),
        App::Gen { interface } => load_interface(&interface).and_then(|interface| {
            print!("{}", render_interface(&interface)?);
            Ok(0)
        }),
        App::Run {
            algorithms_dir,
            name,
            input,
            output,
        } => run(algorithms_dir, &name, input, output),
    };

    match result {
        Ok(code) => exit(code),
        Err(e) => {
            eprintln!("{:?}", e);
            exit(1)
        }
    }
}
