use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use loxwalk::lox::Lox;
use loxwalk::scanner::Scanner;

/// Exit status for command‑line usage errors.
const EXIT_USAGE: i32 = 64;

#[derive(ClapParser, Debug)]
#[command(
    version,
    about = "Tree-walking Lox interpreter",
    long_about = None,
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Script to run; starts an interactive prompt when omitted
    script: Option<PathBuf>,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print tokens as JSON, one object per line
        #[arg(long)]
        json: bool,
    },

    /// Runs a file as a program
    Run { filename: PathBuf },
}

/// Reads a whole source file as UTF‑8 text.
fn read_file(filename: &PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    String::from_utf8(buf).context(format!("File {:?} is not valid UTF-8", filename))
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("loxwalk::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_default_env() // RUST_LOG overrides the default
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn tokenize(filename: &PathBuf, json: bool) -> Result<()> {
    let source = read_file(filename)?;
    let mut tokenized = true;

    for item in Scanner::new(&source) {
        match item {
            Ok(token) if json => {
                println!("{}", serde_json::to_string(&token)?);
            }

            Ok(token) => println!("{}", token),

            Err(e) => {
                tokenized = false;
                debug!("Tokenization error: {}", e);
                eprintln!("{}", e);
            }
        }
    }

    if !tokenized {
        process::exit(loxwalk::lox::EXIT_STATIC_ERROR);
    }

    Ok(())
}

fn run_file(filename: &PathBuf) -> Result<()> {
    let source = read_file(filename)?;
    let mut lox = Lox::new();

    if let Err(e) = lox.run(&source) {
        debug!("Run failed: {:?}", e);
        eprintln!("{}", e);
        process::exit(e.exit_code());
    }

    info!("Program executed successfully");
    Ok(())
}

/// Reads lines from stdin until EOF.  Errors are reported and the session
/// carries on; definitions persist across lines.
fn run_prompt() -> Result<()> {
    let mut lox = Lox::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line.context("Failed to read from stdin")?;

        if let Err(e) = lox.run(&line) {
            eprintln!("{}", e);
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = match Cli::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            _ => {
                eprint!("{}", e);
                process::exit(EXIT_USAGE);
            }
        },
    };

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        Builder::new().filter_level(log::LevelFilter::Off).init();
    }

    info!("CLI arguments: {:?}", args);

    match (&args.command, &args.script) {
        (Some(Commands::Tokenize { filename, json }), _) => tokenize(filename, *json),
        (Some(Commands::Run { filename }), _) | (None, Some(filename)) => run_file(filename),
        (None, None) => run_prompt(),
    }
}
