// stackc: compile and run stack-language programs

mod cli;

use std::fs;
use std::process;

use clap::Parser as _;

use cli::Cli;
use stackc::compiler::environment::Environment;
use stackc::parser::ast::FunctionKind;
use stackc::vm::{Bindings, Machine, MachineConfig};

const SECTION_SEPARATOR: &str = "_____________________";

fn main() {
    let cli = Cli::parse();

    if let Err(error) = run(&cli) {
        eprintln!("{}", error);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let source = fs::read_to_string(&cli.file)
        .map_err(|e| format!("Error: Cannot read '{}': {}", cli.file.display(), e))?;

    // Console functions and command-line globals
    let mut env = Environment::new();
    env.function("Print", 1, FunctionKind::Void);
    env.function("EndSection", 0, FunctionKind::Void);
    for (name, _) in &cli.globals {
        env.global(name);
    }

    eprintln!("Compiling {}...", cli.file.display());
    let compiled = stackc::compile(&source, &env)?;
    eprintln!(
        "Compiled {} instructions across {} functions.",
        compiled.code.len(),
        compiled.entries.len()
    );

    if cli.emit {
        print!("{}", compiled);
    }

    if cli.no_run {
        return Ok(());
    }

    let mut bindings = Bindings::new(&env);
    bindings.bind("Print", |args| {
        println!("{}", args[0]);
        0
    })?;
    bindings.bind("EndSection", |_| {
        println!("{}", SECTION_SEPARATOR);
        0
    })?;
    for (name, value) in &cli.globals {
        bindings.set_global(name, *value)?;
    }

    eprintln!("Executing {}...", cli.entry);
    let mut machine = Machine::new(&compiled, bindings, MachineConfig::default());
    let result = machine
        .invoke(&cli.entry, &cli.args)
        .map_err(|e| format!("Runtime error: {}", e))?;

    eprintln!("Execution completed successfully.");
    if let Some(value) = result {
        eprintln!("{} returned {}", cli.entry, value);
    }
    for (name, _) in &cli.globals {
        if let Some(value) = machine.host().global(name) {
            eprintln!("Global {} = {}", name, value);
        }
    }

    Ok(())
}
