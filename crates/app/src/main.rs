use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use engine::{
    FinishedGame, GameRunner, GameState, GameUpdate, HttpOutcomeReporter, RecognizerError,
    RecognizerEvent, ScriptStep, ScriptedRecognizer, SpeechRecognizer,
};
use parrot_core::{GameSettings, Lesson, LessonDraft, PhraseDraft, ThresholdPolicy};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
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

/// Reads utterances line by line from stdin, growing one cumulative
/// transcript per session the way a live recognition stream does.
struct StdinRecognizer {
    exhausted: Arc<AtomicBool>,
}

impl StdinRecognizer {
    fn new() -> Self {
        Self {
            exhausted: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl SpeechRecognizer for StdinRecognizer {
    async fn open(&self) -> Result<mpsc::Receiver<RecognizerEvent>, RecognizerError> {
        if self.exhausted.load(Ordering::SeqCst) {
            return Err(RecognizerError::Unavailable(
                "stdin reached end of input".into(),
            ));
        }

        let (tx, rx) = mpsc::channel(16);
        let exhausted = Arc::clone(&self.exhausted);
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            let mut transcript = String::new();
            let _ = tx.send(RecognizerEvent::Started).await;

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        if !transcript.is_empty() {
                            transcript.push(' ');
                        }
                        transcript.push_str(line);
                        let heard = RecognizerEvent::Result {
                            transcript: transcript.clone(),
                            is_final: true,
                        };
                        if tx.send(heard).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        exhausted.store(true, Ordering::SeqCst);
                        let _ = tx.send(RecognizerEvent::Ended).await;
                        break;
                    }
                    Err(err) => {
                        exhausted.store(true, Ordering::SeqCst);
                        let _ = tx
                            .send(RecognizerEvent::Error {
                                code: 1,
                                message: err.to_string(),
                            })
                            .await;
                        let _ = tx.send(RecognizerEvent::Ended).await;
                        break;
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn close(&self) {}
}

struct Args {
    lesson_path: Option<String>,
    script_path: Option<String>,
    lives: u32,
    round_seconds: u32,
    match_partials: bool,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- play   [--lesson <file.json>] [--script <file.txt>]");
    eprintln!("                             [--lives <n>] [--seconds <n>] [--partials]");
    eprintln!("  cargo run -p app -- lesson [--lesson <file.json>]");
    eprintln!();
    eprintln!("Without --script, utterances are read line by line from stdin.");
    eprintln!();
    eprintln!("Defaults for play:");
    eprintln!("  --lives 3, --seconds 7, built-in German greetings lesson");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PARROT_LESSON, PARROT_API_BASE_URL, PARROT_API_KEY, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Lesson,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "lesson" => Some(Self::Lesson),
            _ => None,
        }
    }
}

impl Args {
    fn parse_play(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut lesson_path = std::env::var("PARROT_LESSON").ok();
        let mut script_path = None;
        let mut lives = 3;
        let mut round_seconds = 7;
        let mut match_partials = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--lesson" => {
                    lesson_path = Some(require_value(args, "--lesson")?);
                }
                "--script" => {
                    script_path = Some(require_value(args, "--script")?);
                }
                "--lives" => {
                    let value = require_value(args, "--lives")?;
                    lives = value.parse().map_err(|_| ArgsError::InvalidNumber {
                        flag: "--lives",
                        raw: value.clone(),
                    })?;
                }
                "--seconds" => {
                    let value = require_value(args, "--seconds")?;
                    round_seconds = value.parse().map_err(|_| ArgsError::InvalidNumber {
                        flag: "--seconds",
                        raw: value.clone(),
                    })?;
                }
                "--partials" => match_partials = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            lesson_path,
            script_path,
            lives,
            round_seconds,
            match_partials,
        })
    }

    fn parse_lesson(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        // The lesson command only reads --lesson, but sharing one parser keeps
        // flag handling in one place.
        Self::parse_play(args)
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: play when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if matches!(cmd, Command::Play | Command::Lesson)
        && !argv.is_empty()
        && !argv[0].starts_with("--")
    {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = match cmd {
        Command::Play => Args::parse_play(&mut iter),
        Command::Lesson => Args::parse_lesson(&mut iter),
    }
    .map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let lesson = match parsed.lesson_path.as_deref() {
        Some(path) => load_lesson(path)?,
        None => default_lesson()?,
    };

    match cmd {
        Command::Play => play(lesson, &parsed).await,
        Command::Lesson => {
            show_lesson(&lesson);
            Ok(())
        }
    }
}

async fn play(lesson: Lesson, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let settings = GameSettings::new(args.lives, args.round_seconds, 1, args.match_partials)?;
    let thresholds = ThresholdPolicy::new();

    let recognizer: Arc<dyn SpeechRecognizer> = match args.script_path.as_deref() {
        Some(path) => Arc::new(script_from_file(path)?),
        None => Arc::new(StdinRecognizer::new()),
    };

    let reporter = HttpOutcomeReporter::from_env();
    if !reporter.enabled() {
        log::info!("score reporting disabled; set PARROT_API_KEY to enable it");
    }

    println!(
        "Lesson: {} ({} phrases, {} lives, {}s per phrase)",
        lesson.title(),
        lesson.phrase_count(),
        settings.lives(),
        settings.round_seconds()
    );
    if args.script_path.is_none() {
        println!("Type what you would say, one utterance per line.");
    }

    let total = lesson.phrase_count();
    let runner = GameRunner::new(lesson, settings, thresholds, recognizer, Arc::new(reporter));
    let (handle, mut updates) = runner.spawn();

    while let Some(update) = updates.recv().await {
        match update {
            GameUpdate::RoundStarted {
                phrase_index,
                target_text,
                seconds,
            } => {
                println!();
                println!(
                    "Phrase {}/{}: \"{}\" ({}s)",
                    phrase_index + 1,
                    total,
                    target_text,
                    seconds
                );
            }
            GameUpdate::Heard {
                text,
                is_final: true,
            } => println!("  heard: {text}"),
            GameUpdate::Heard { .. } => {}
            GameUpdate::Countdown { seconds_left } if seconds_left <= 3 => {
                println!("  {seconds_left}...");
            }
            GameUpdate::Countdown { .. } | GameUpdate::Elapsed { .. } => {}
            GameUpdate::RoundWon { similarity, .. } => {
                println!("  correct ({:.0}% match)", similarity * 100.0);
            }
            GameUpdate::RoundLost { lives_left, .. } => {
                println!("  time's up, {lives_left} lives left");
            }
            GameUpdate::Finished { .. } => break,
        }
    }

    let FinishedGame { state, outcome } = handle.await_finished().await?;
    println!();
    match state {
        GameState::Won => println!(
            "You won: {}/{} phrases in {:.1}s.",
            outcome.correct_count(),
            outcome.total_phrases(),
            outcome.elapsed().as_secs_f64()
        ),
        _ => println!(
            "Game over: {}/{} phrases in {:.1}s.",
            outcome.correct_count(),
            outcome.total_phrases(),
            outcome.elapsed().as_secs_f64()
        ),
    }

    Ok(())
}

fn show_lesson(lesson: &Lesson) {
    let thresholds = ThresholdPolicy::new();

    println!(
        "Lesson {}: {} ({} to {})",
        lesson.id(),
        lesson.title(),
        lesson.target_language().as_str(),
        lesson.native_language().as_str()
    );
    for (index, phrase) in lesson.phrases().iter().enumerate() {
        let threshold = thresholds.acceptance_threshold(phrase.text(), lesson.target_language());
        let translation = phrase.translation(lesson.native_language()).unwrap_or("-");
        println!(
            "  {:>2}. \"{}\" ({}) accepted at {:.0}% similarity",
            index + 1,
            phrase.text(),
            translation,
            threshold * 100.0
        );
    }
}

fn load_lesson(path: &str) -> Result<Lesson, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    let draft: LessonDraft = serde_json::from_str(&contents)?;
    Ok(draft.validate()?)
}

fn default_lesson() -> Result<Lesson, Box<dyn std::error::Error>> {
    let phrases = [
        (0, "Hallo", "Hello"),
        (1, "Guten Morgen", "Good morning"),
        (2, "Wie geht es dir", "How are you"),
        (3, "Danke schön", "Thank you very much"),
        (4, "Bis später", "See you later"),
    ];

    let draft = LessonDraft {
        id: 1,
        title: "German Greetings".into(),
        target_language: "de".into(),
        native_language: "en".into(),
        phrases: phrases
            .into_iter()
            .map(|(order, text, english)| PhraseDraft {
                order,
                text: text.into(),
                translations: HashMap::from([("en".into(), english.into())]),
            })
            .collect(),
    };

    Ok(draft.validate()?)
}

/// Turns a plain text file into a scripted recognizer session: each line is
/// one utterance, spoken two seconds after the previous one.
fn script_from_file(path: &str) -> Result<ScriptedRecognizer, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;

    let mut steps = vec![ScriptStep::new(
        Duration::from_millis(200),
        RecognizerEvent::Started,
    )];
    let mut transcript = String::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !transcript.is_empty() {
            transcript.push(' ');
        }
        transcript.push_str(line);
        steps.push(ScriptStep::final_result(
            Duration::from_secs(2),
            transcript.clone(),
        ));
    }

    Ok(ScriptedRecognizer::new(steps))
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }

    // A stdin read still waiting for input would keep runtime shutdown
    // blocked on the reader thread.
    std::process::exit(0);
}
