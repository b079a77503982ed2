use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use lox_interpreter as lox;

use clap::Parser as ClapParser;

use lox::runner::Runner;

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Script to run; starts an interactive prompt when omitted
    script: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Cli = Cli::parse();

    match args.script.as_slice() {
        [] => repl()?,

        [script] => run_file(script)?,

        _ => {
            println!("Usage: lox [script]");
            std::process::exit(64);
        }
    }

    Ok(())
}

fn run_file(path: &Path) -> anyhow::Result<()> {
    let mut buf: Vec<u8> = Vec::new();
    let mut reader: BufReader<File> = BufReader::new(File::open(path)?);
    reader.read_to_end(&mut buf)?;

    let source: String = String::from_utf8(buf)?;

    Runner::new().run(&source);

    Ok(())
}

/// Interactive prompt: one interpreter shared across lines, so definitions
/// persist until EOF.
fn repl() -> anyhow::Result<()> {
    let mut runner: Runner = Runner::new();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line: String = String::new();

        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        runner.run(&line);
    }

    Ok(())
}
