mod play;
mod render;

use std::fmt;
use std::io;
use std::path::PathBuf;

use services::quiz::{PresenterOptions, QuizSession};
use services::{AttemptService, Clock, MockExam};
use storage::{BankFile, Storage};

use crate::play::{run_exam, run_practice};
use crate::render::render_history;

const DEFAULT_DB_URL: &str = "sqlite://quiz.sqlite3";
const DEFAULT_HISTORY_LIMIT: u32 = 10;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingBank,
    UnknownArg(String),
    InvalidLimit { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingBank => write!(f, "--bank is required (or set QUIZ_BANK)"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidLimit { raw } => write!(f, "invalid --limit value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  quiz run     --bank <file> [--exam] [--no-previous] [--db <sqlite_url>]");
    eprintln!("  quiz history --bank <file> [--limit <n>] [--db <sqlite_url>]");
    eprintln!();
    eprintln!("While answering:");
    eprintln!("  1..n choose an option, n next, p previous, r restart, q quit");
    eprintln!("  mock exam only: f flag, nf next flagged, g <n> go to question, s submit");
    eprintln!("On the results screen:");
    eprintln!("  v <all|correct|incorrect|unanswered|flagged> review, r restart, q quit");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!("  --limit {DEFAULT_HISTORY_LIMIT}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_BANK, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Run,
    History,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "run" => Some(Self::Run),
            "history" => Some(Self::History),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Args {
    bank: PathBuf,
    db_url: String,
    exam: bool,
    show_previous: bool,
    limit: u32,
}

impl Args {
    /// Parse flags for `cmd`. `env` stands in for `std::env::var` so tests stay hermetic.
    fn parse(
        cmd: Command,
        args: &mut impl Iterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut bank = env("QUIZ_BANK").map(PathBuf::from);
        let mut db_url = env("QUIZ_DB_URL").map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url);
        let mut exam = false;
        let mut show_previous = true;
        let mut limit = DEFAULT_HISTORY_LIMIT;

        while let Some(arg) = args.next() {
            match (cmd, arg.as_str()) {
                (_, "--bank") => bank = Some(PathBuf::from(require_value(args, "--bank")?)),
                (_, "--db") => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                (Command::Run, "--exam") => exam = true,
                (Command::Run, "--no-previous") => show_previous = false,
                (Command::History, "--limit") => {
                    let value = require_value(args, "--limit")?;
                    limit = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidLimit { raw: value.clone() })?;
                }
                (_, "--help" | "-h") => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            bank: bank.ok_or(ArgsError::MissingBank)?,
            db_url,
            exam,
            show_previous,
            limit,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // No subcommand means `run`.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Run,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Run,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            io::Error::new(io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };
    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let parsed = Args::parse(cmd, &mut argv.into_iter(), |key| std::env::var(key).ok()).map_err(
        |e| {
            eprintln!("{e}");
            print_usage();
            e
        },
    )?;

    let file = BankFile::load(&parsed.bank).await?;

    prepare_sqlite_file(&parsed.db_url)?;
    let storage = Storage::sqlite(&parsed.db_url).await?;
    let clock = Clock::default_clock();
    let attempts = AttemptService::new(clock, storage.attempts);

    match cmd {
        Command::Run => run_quiz(file, &parsed, &clock, &attempts).await,
        Command::History => {
            let code = file.bank.code();
            let rows = attempts.recent(code, parsed.limit).await?;
            let best = attempts.best(code).await?;
            render_history(file.bank.title(), &rows, best.as_ref(), &mut io::stdout().lock())?;
            Ok(())
        }
    }
}

async fn run_quiz(
    file: BankFile,
    args: &Args,
    clock: &Clock,
    attempts: &AttemptService,
) -> Result<(), Box<dyn std::error::Error>> {
    let stdin = io::stdin().lock();
    let mut stdout = io::stdout().lock();

    if args.exam {
        let config = file
            .exam
            .ok_or_else(|| format!("bank {} has no mock exam settings", file.bank.code()))?;
        println!("{}", config.title());
        let mut exam = MockExam::start(&file.bank, config, clock.now(), &mut rand::rng())?;
        run_exam(&mut exam, args.show_previous, clock, attempts, stdin, &mut stdout).await?;
    } else {
        println!("{}", file.bank.title());
        let options = PresenterOptions::practice(
            args.show_previous,
            file.exam.as_ref().map(|e| e.pass_threshold()),
        );
        let mut session = QuizSession::new(std::sync::Arc::new(file.bank))?;
        run_practice(&mut session, options, clock, attempts, stdin, &mut stdout).await?;
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(err) = run().await {
        // Binary glue: print once and exit.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
