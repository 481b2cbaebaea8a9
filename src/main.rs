//! uniq6: count distinct IPv6 addresses in large files.
//!
//! Usage: uniq6 [OPTIONS] [INPUT OUTPUT]
//!
//! When the positional path pair is omitted, a single line containing
//! "<input> <output>" is read from stdin.

use clap::Parser;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process;

use uniq6::commands::{CountCommand, DEFAULT_CHUNK_CAPACITY};
use uniq6::CountError;

#[derive(Parser)]
#[command(name = "uniq6")]
#[command(version)]
#[command(
    about = "Count distinct IPv6 addresses in arbitrarily large files using external sort-merge",
    long_about = None
)]
struct Cli {
    /// Input file of IPv6 addresses, one per line
    #[arg(requires = "output")]
    input: Option<PathBuf>,

    /// Output file for the distinct count
    output: Option<PathBuf>,

    /// Addresses buffered in memory per sorted chunk
    #[arg(short, long, default_value_t = DEFAULT_CHUNK_CAPACITY)]
    capacity: usize,

    /// Reject malformed address literals instead of canonicalizing
    /// them best-effort
    #[arg(long)]
    strict: bool,

    /// Print pipeline statistics to stderr
    #[arg(long)]
    stats: bool,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CountError> {
    let (input, output) = match (cli.input, cli.output) {
        (Some(input), Some(output)) => (input, output),
        _ => read_path_pair(io::stdin().lock())?,
    };

    let cmd = CountCommand::new()
        .with_capacity(cli.capacity)
        .with_strict(cli.strict);
    let stats = cmd.run(&input, &output)?;

    if cli.stats {
        eprintln!("Count stats: {}", stats);
    }

    Ok(())
}

/// Read an "<input> <output>" path pair from one line of `reader`.
fn read_path_pair<R: BufRead>(mut reader: R) -> Result<(PathBuf, PathBuf), CountError> {
    let mut line = String::new();
    reader.read_line(&mut line)?;

    let mut tokens = line.split_whitespace();
    match (tokens.next(), tokens.next()) {
        (Some(input), Some(output)) => Ok((PathBuf::from(input), PathBuf::from(output))),
        _ => Err(CountError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            "expected '<input> <output>' on one line of stdin",
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_path_pair() {
        let (input, output) = read_path_pair("in.txt out.txt\n".as_bytes()).unwrap();
        assert_eq!(input, PathBuf::from("in.txt"));
        assert_eq!(output, PathBuf::from("out.txt"));
    }

    #[test]
    fn test_read_path_pair_extra_whitespace() {
        let (input, output) = read_path_pair("  in.txt\t out.txt \n".as_bytes()).unwrap();
        assert_eq!(input, PathBuf::from("in.txt"));
        assert_eq!(output, PathBuf::from("out.txt"));
    }

    #[test]
    fn test_read_path_pair_missing_token() {
        assert!(read_path_pair("only-one\n".as_bytes()).is_err());
        assert!(read_path_pair("".as_bytes()).is_err());
    }
}
