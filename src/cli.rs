//! Command-line interface for stackc.

use clap::Parser;
use std::path::PathBuf;

/// stackc - compile a stack-language program and run it on the reference machine
#[derive(Parser, Debug)]
#[command(name = "stackc")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Source file to compile
    pub file: PathBuf,

    /// Function to invoke after compiling
    #[arg(short, long, default_value = "Main")]
    pub entry: String,

    /// Print the disassembled instruction stream to stdout
    #[arg(long)]
    pub emit: bool,

    /// Compile only; do not execute the entry function
    #[arg(long)]
    pub no_run: bool,

    /// Declare a global and its initial value (repeatable)
    #[arg(short, long = "global", value_name = "NAME=VALUE", value_parser = parse_global)]
    pub globals: Vec<(String, i64)>,

    /// Integer arguments passed to the entry function
    #[arg(allow_negative_numbers = true)]
    pub args: Vec<i64>,
}

fn parse_global(raw: &str) -> Result<(String, i64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", raw))?;

    let name = name.trim();
    let valid_name = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid_name {
        return Err(format!("'{}' is not a valid identifier", name));
    }

    let value = value
        .trim()
        .parse::<i64>()
        .map_err(|e| format!("invalid value for '{}': {}", name, e))?;
    Ok((name.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global() {
        assert_eq!(parse_global("bbb=30"), Ok(("bbb".to_string(), 30)));
        assert_eq!(parse_global("setMe = -15"), Ok(("setMe".to_string(), -15)));
        assert!(parse_global("bbb").is_err());
        assert!(parse_global("1x=2").is_err());
        assert!(parse_global("x=abc").is_err());
    }

    #[test]
    fn test_cli_arguments() {
        let cli = Cli::try_parse_from([
            "stackc", "demo.sl", "--emit", "-g", "bbb=30", "--global", "setMe=15", "1", "-2", "3",
        ])
        .unwrap();

        assert_eq!(cli.file, PathBuf::from("demo.sl"));
        assert_eq!(cli.entry, "Main");
        assert!(cli.emit);
        assert!(!cli.no_run);
        assert_eq!(
            cli.globals,
            vec![("bbb".to_string(), 30), ("setMe".to_string(), 15)]
        );
        assert_eq!(cli.args, vec![1, -2, 3]);
    }
}
