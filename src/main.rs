use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

use kpa_sql::config::{self, Config};
use kpa_sql::db::{Database, SqlProjector};
use kpa_sql::logging;
use kpa_sql::reader::XmlDatabase;

const EXIT_USAGE: u8 = 1;
const EXIT_READER: u8 = 2;
const EXIT_DESTINATION: u8 = 3;

/// Command line arguments
#[derive(Default)]
struct Args {
    config_path: Option<PathBuf>,
    index_xml: Option<PathBuf>,
    db_path: Option<PathBuf>,
    assume_yes: bool,
    clear: Option<bool>,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = Args::default();
    let mut positional = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("kpa-sql {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    parsed.config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                } else {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(EXIT_USAGE.into());
                }
            }
            "--yes" | "-y" => parsed.assume_yes = true,
            "--clear" => parsed.clear = Some(true),
            "--no-clear" => parsed.clear = Some(false),
            arg if arg.starts_with('-') => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                std::process::exit(EXIT_USAGE.into());
            }
            arg => positional.push(PathBuf::from(arg)),
        }
        i += 1;
    }

    if positional.len() > 2 {
        eprintln!("Error: too many arguments");
        print_help();
        std::process::exit(EXIT_USAGE.into());
    }
    let mut positional = positional.into_iter();
    parsed.index_xml = positional.next();
    parsed.db_path = positional.next();

    parsed
}

fn print_help() {
    println!(
        r#"kpa-sql - copy a KPhotoAlbum index.xml into an SQLite database

USAGE:
    kpa-sql [OPTIONS] [INDEX_XML] [DB_PATH]

ARGUMENTS:
    INDEX_XML           index.xml to read (default: from config, then kphotoalbumrc)
    DB_PATH             Database to write (default: from config)

OPTIONS:
    --config, -c PATH   Path to config file
    --yes, -y           Do not ask before copying
    --clear             Empty the tables before copying
    --no-clear          Keep existing rows and update them in place
    --version, -V       Show version
    --help, -h          Show this help message

ENVIRONMENT:
    KPA_SQL_LOG         Log level (trace, debug, info, warn, error)

Config file location: $XDG_CONFIG_HOME/kpa-sql/config.toml"#
    );
}

/// Ask a yes/no question on stdout. Anything but y/yes is a no.
fn confirm(question: &str) -> io::Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn main() -> ExitCode {
    let args = parse_args();

    let config = match &args.config_path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: failed to load config: {:#}", e);
            return ExitCode::from(EXIT_USAGE);
        }
    };

    if let Err(e) = logging::init(config.log_dir.clone()) {
        eprintln!("Warning: logging disabled: {:#}", e);
    }

    match run(&args, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            error!("{:#}", failure.error);
            eprintln!("Error: {:#}", failure.error);
            ExitCode::from(failure.code)
        }
    }
}

struct Failure {
    code: u8,
    error: anyhow::Error,
}

trait ExitContext<T> {
    fn exit_code(self, code: u8) -> Result<T, Failure>;
}

impl<T, E: Into<anyhow::Error>> ExitContext<T> for Result<T, E> {
    fn exit_code(self, code: u8) -> Result<T, Failure> {
        self.map_err(|e| Failure { code, error: e.into() })
    }
}

fn run(args: &Args, config: &Config) -> Result<(), Failure> {
    let index_xml = match args.index_xml.clone().or_else(|| config.index_xml.clone()) {
        Some(path) => path,
        None => config::locate_index_xml().exit_code(EXIT_READER)?,
    };
    let db_path = args.db_path.clone().unwrap_or_else(|| config.db_path.clone());

    println!("Source:      {}", index_xml.display());
    println!("Destination: {}", db_path.display());

    let db = Database::open(&db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))
        .exit_code(EXIT_DESTINATION)?;

    let assume_yes = args.assume_yes || config.import.assume_yes;
    if !assume_yes && !confirm("Proceed?").exit_code(EXIT_USAGE)? {
        println!("Nothing copied.");
        return Ok(());
    }

    let clear = match args.clear.or(config.import.clear_first) {
        Some(clear) => clear,
        None => confirm("Clear old tables first?").exit_code(EXIT_USAGE)?,
    };

    // Nothing is written until the source has been parsed in full
    print!("Parsing the XML file...");
    io::stdout().flush().exit_code(EXIT_USAGE)?;
    let source = XmlDatabase::open(&index_xml)
        .with_context(|| format!("Failed to read {}", index_xml.display()))
        .exit_code(EXIT_READER)?;
    println!("parsed.");

    let mut projector = SqlProjector::new(&db).exit_code(EXIT_DESTINATION)?;
    if clear {
        projector.clear().exit_code(EXIT_DESTINATION)?;
    }

    print!("Copying");
    io::stdout().flush().exit_code(EXIT_USAGE)?;
    let interval = config.import.progress_interval.max(1);
    projector
        .feed_from(&source, |copied| {
            if copied % interval == 0 {
                print!(".");
                io::stdout().flush().ok();
            }
        })
        .exit_code(EXIT_DESTINATION)?;
    println!("copied.");

    Ok(())
}
