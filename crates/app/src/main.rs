use std::fmt;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use qbank_core::model::{
    BankId, CompletionFilter, DifficultyFilter, OptionId, PracticeMode, PracticeSettings,
    VoteDirection, format_stopwatch,
};
use services::{
    AnswerOutcome, AppServices, Clock, ExamSession, Navigation, OptionState, SessionError, Ticker,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidBankId { raw: String },
    InvalidCount { raw: String },
    InvalidMode { raw: String },
    InvalidDifficulty { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidBankId { raw } => write!(f, "invalid --bank-id value: {raw}"),
            ArgsError::InvalidCount { raw } => write!(f, "invalid --count value: {raw}"),
            ArgsError::InvalidMode { raw } => write!(f, "invalid --mode value: {raw}"),
            ArgsError::InvalidDifficulty { raw } => {
                write!(f, "invalid --difficulty value: {raw}")
            }
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
    eprintln!(
        "  cargo run -p app -- practice [--bank-id <id>] [--mode explained|exam|quick] \
         [--count <n>] [--difficulty all|easy|medium|hard] [--report-dir <dir>]"
    );
    eprintln!("  cargo run -p app -- banks");
    eprintln!();
    eprintln!("Defaults for practice:");
    eprintln!("  --bank-id 1 --mode explained --count 50 --difficulty all --report-dir .");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QBANK_BANK_ID, QBANK_REPORT_DIR, RUST_LOG");
}

fn print_commands() {
    println!("Commands: a-d select | n next | p previous | f flag | note <text> | up <id> | down <id> | q quit");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Practice,
    Banks,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "practice" => Some(Self::Practice),
            "banks" => Some(Self::Banks),
            _ => None,
        }
    }
}

struct Args {
    bank_id: BankId,
    mode: PracticeMode,
    count: u32,
    difficulty: DifficultyFilter,
    report_dir: PathBuf,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let defaults = PracticeSettings::default();
        let mut bank_id = std::env::var("QBANK_BANK_ID")
            .ok()
            .and_then(|value| value.parse::<BankId>().ok())
            .unwrap_or_else(|| BankId::new(1));
        let mut report_dir = std::env::var("QBANK_REPORT_DIR")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| PathBuf::from("."), PathBuf::from);
        let mut mode = defaults.mode();
        let mut count = defaults.question_count();
        let mut difficulty = defaults.difficulty();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--bank-id" => {
                    let value = require_value(args, "--bank-id")?;
                    bank_id = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidBankId { raw: value.clone() })?;
                }
                "--mode" => {
                    let value = require_value(args, "--mode")?;
                    mode = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidMode { raw: value.clone() })?;
                }
                "--count" => {
                    let value = require_value(args, "--count")?;
                    count = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidCount { raw: value.clone() })?;
                }
                "--difficulty" => {
                    let value = require_value(args, "--difficulty")?;
                    difficulty = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidDifficulty { raw: value.clone() })?;
                }
                "--report-dir" => {
                    report_dir = PathBuf::from(require_value(args, "--report-dir")?);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            bank_id,
            mode,
            count,
            difficulty,
            report_dir,
        })
    }

    fn settings(&self) -> Result<PracticeSettings, qbank_core::Error> {
        Ok(PracticeSettings::new(
            self.mode,
            self.count,
            self.difficulty,
            Vec::new(),
            CompletionFilter::All,
        )?)
    }
}

/// One line of user input during a session.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Select(char),
    Next,
    Previous,
    Flag,
    Note(String),
    Vote(u64, VoteDirection),
    Quit,
    Unknown,
}

impl Input {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        let (head, rest) = line.split_once(' ').unwrap_or((line, ""));
        match head {
            "n" => Self::Next,
            "p" => Self::Previous,
            "f" => Self::Flag,
            "q" => Self::Quit,
            "note" => Self::Note(rest.to_owned()),
            "up" | "down" => match rest.trim().parse() {
                Ok(id) if head == "up" => Self::Vote(id, VoteDirection::Up),
                Ok(id) => Self::Vote(id, VoteDirection::Down),
                Err(_) => Self::Unknown,
            },
            _ => {
                let mut chars = head.chars();
                match (chars.next(), chars.next()) {
                    (Some(c @ 'a'..='z'), None) => Self::Select(c),
                    _ => Self::Unknown,
                }
            }
        }
    }
}

fn render(session: &ExamSession) {
    let question = session.current_question();
    let feedback = session.feedback();
    println!();
    println!(
        "Question {}/{}  [{}]  {}{}",
        session.current_index() + 1,
        session.question_count(),
        session.settings().mode(),
        format_stopwatch(session.elapsed_secs()),
        if session.is_flagged() { "  (flagged)" } else { "" }
    );
    println!("{}", question.text);
    for (option, state) in question.options.iter().zip(session.option_states()) {
        let letter = option.id.as_str().chars().last().unwrap_or('?');
        let marker = match state {
            OptionState::Neutral => " ",
            OptionState::Selected => ">",
            OptionState::Correct => "+",
            OptionState::Incorrect => "x",
        };
        println!(" {marker} {letter}) {}", option.text);
    }
    if feedback.show_explanation {
        println!("Explanation: {}", question.explanation);
    }
    if feedback.show_notes {
        for note in session.current_notes() {
            println!(
                "  #{} [{:+}] {}: {}",
                note.id(),
                note.votes(),
                note.author().display_name,
                note.text()
            );
        }
    }
}

fn report_rejection(err: &SessionError) {
    println!("! {err}");
}

async fn run_practice(services: &AppServices, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = services
        .session_loop()
        .prepare_session(args.bank_id, args.settings()?)
        .await?
        .on_close(|| tracing::info!("session closed before completion"));
    session.start(Ticker::every_second())?;
    print_commands();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        render(&session);
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next().transpose()? else {
            session.close()?;
            return Ok(());
        };

        match Input::parse(&line) {
            Input::Select(letter) => {
                let option = OptionId::new(format!("{}{letter}", session.current_question().id));
                match session.select_answer(&option) {
                    Ok(AnswerOutcome::Locked) => println!("answer locked in exam mode"),
                    Ok(AnswerOutcome::Recorded) => {}
                    Err(err) => report_rejection(&err),
                }
            }
            Input::Next => {
                if !session.feedback().can_advance {
                    println!("select an answer first");
                    continue;
                }
                if session.advance()? == Navigation::Completed {
                    break;
                }
            }
            Input::Previous => {
                if session.retreat()? == Navigation::AtStart {
                    println!("already at the first question");
                }
            }
            Input::Flag => {
                session.toggle_flag()?;
            }
            Input::Note(text) => {
                if let Err(err) = session.add_note(&text) {
                    report_rejection(&err);
                }
            }
            Input::Vote(id, direction) => {
                if let Err(err) = session.vote(qbank_core::model::NoteId::new(id), direction) {
                    report_rejection(&err);
                }
            }
            Input::Quit => {
                session.close()?;
                return Ok(());
            }
            Input::Unknown => print_commands(),
        }
    }

    let outcome = services.session_loop().finish_session(&session).await?;
    let score = outcome.score;
    println!();
    println!("Results: {}", score.performance());
    println!("  Correct:  {}/{}", score.correct, score.total);
    println!("  Accuracy: {}", score.accuracy_label());
    println!("  Time:     {}", score.time_spent_label());
    println!("  Average:  {}s per question", score.average_secs_per_question());

    let path = outcome.report.write_to_dir(&args.report_dir)?;
    println!("Report written to {}", path.display());
    Ok(())
}

async fn run_banks(services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    for bank in services.catalogue().list_banks().await? {
        println!(
            "{:>3}  {:<20} {:>5} questions  {:>3}% complete  {:?}",
            bank.id(),
            bank.name(),
            bank.total_questions(),
            bank.completion(),
            bank.level()
        );
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);

    let cmd = match argv.next() {
        None => Command::Practice,
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(&first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            io::Error::new(io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let services = AppServices::in_memory_seeded(Clock::system())
        .await?
        .with_shuffle(true);

    match cmd {
        Command::Practice => {
            let args = Args::parse(&mut argv).inspect_err(|_| print_usage())?;
            run_practice(&services, &args).await
        }
        Command::Banks => run_banks(&services).await,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
