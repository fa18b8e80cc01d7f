use std::error::Error;
use std::process;

use chrono::Utc;
use tracing::{error, info};

use pkg_converge::backend::apt::AptBackend;
use pkg_converge::cli::{Cli, CliCommand, RunRequest};
use pkg_converge::engine::Converger;

fn main() {
    if let Err(err) = run() {
        eprintln!("{}", err);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let request = match Cli::init()? {
        CliCommand::PrintDebugInfo(cli) => {
            println!("Printing debug info");
            println!("CLI: {:#?}", cli);
            return Ok(());
        }
        CliCommand::Run(request) => request,
    };

    // Planning only reads the system; applying changes needs root
    #[cfg(unix)]
    if !request.dry_run && !nix::unistd::Uid::effective().is_root() {
        return Err("Program must run as root".into());
    }

    converge(request)
}

fn converge(request: RunRequest) -> Result<(), Box<dyn Error>> {
    let backend = AptBackend::new(request.apt);
    let mut converger = Converger::new(backend, request.engine);
    let now = Utc::now();

    if request.dry_run {
        let plan = converger.plan_only(&request.desired, now)?;
        print!("{}", plan);
        return Ok(());
    }

    let report = converger.converge(&request.desired, now)?;
    print!("{}", report);

    match report.failed() {
        None => {
            info!(changed = report.changed(), "convergence finished");
            Ok(())
        }
        Some(failed) => {
            error!(index = failed.index, "convergence stopped");
            Err(format!("step '{}' failed: {}", failed.step, failed.error).into())
        }
    }
}
