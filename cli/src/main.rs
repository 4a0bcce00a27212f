use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use sqd_core::builtins::Host;
use sqd_core::session::Session;
use sqd_core::val::Val;
use sqd_core::vm::{Package, Vm};
use tracing_subscriber::EnvFilter;

mod bundler;
mod repl;
mod runner;


#[derive(Debug, ClapParser)]
#[command(
    name = "sqd",
    version,
    about = "The Squid language: REPL, file runner and standalone builder"
)]
struct CliArgs {
    /// Compile FILE into a standalone executable instead of running it
    #[arg(short = 'B', long = "build")]
    build: bool,

    /// Output path for -B (default: input with the .sqd suffix stripped)
    #[arg(short = 'o', long = "output", requires = "build")]
    output: Option<PathBuf>,

    /// Source file to execute; REPL starts when omitted
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // A bundled binary carries its program in its own tail; run it and
    // never enter the CLI.
    match embedded_payload() {
        Ok(Some(payload)) => {
            if let Err(e) = run_embedded(&payload) {
                eprintln!("Runtime error: {}", e);
                std::process::exit(1);
            }
            return;
        }
        Ok(None) => {}
        Err(e) => {
            eprintln!("Internal error: {}", e);
            std::process::exit(1);
        }
    }

    let args = CliArgs::parse();

    if args.build {
        let Some(input) = args.file else {
            eprintln!("Error: No input file specified for compilation");
            eprintln!("Usage: sqd -B <input.sqd> [-o output]");
            std::process::exit(1);
        };
        match bundler::build_standalone(&input, args.output) {
            Ok(output) => {
                println!("Successfully compiled {} to {}", input.display(), output.display());
            }
            Err(e) => {
                eprintln!("Error compiling {}: {:#}", input.display(), e);
                std::process::exit(1);
            }
        }
        return;
    }

    if let Some(file) = args.file {
        let registry = Rc::new(sqd_stdlib::registry());
        let mut session = Session::new(registry, Host::new());
        if let Err(e) = runner::execute_file(&file, &mut session) {
            eprintln!("Error executing file {}: {}", file.display(), e);
            std::process::exit(1);
        }
        return;
    }

    if let Err(e) = repl::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn embedded_payload() -> Result<Option<Vec<u8>>> {
    let exe = std::env::current_exe().context("could not locate own binary")?;
    let image = std::fs::read(&exe).context("could not read own binary")?;
    Ok(bundler::extract_payload(&image))
}

fn run_embedded(payload: &[u8]) -> Result<()> {
    let package = Package::decode(payload).context("could not load program")?;
    let registry = Rc::new(sqd_stdlib::registry());
    let mut host = Host::new();

    let mut vm = Vm::new(package.into_bytecode(), registry);
    vm.run(&mut host)?;

    if let Some(value) = vm.last_popped() {
        if !matches!(value, Val::Null) {
            println!("{}", value.inspect());
        }
    }
    Ok(())
}
