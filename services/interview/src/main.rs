mod config;
mod console_speech;
mod prompt_loader;

use crate::config::{Config, QuestionBackend};
use crate::console_speech::ConsoleSpeech;
use anyhow::{Context, Result};
use clap::Parser;
use interview_core::InterviewEvent;
use interview_core::app::{InterviewApp, role_catalogue};
use interview_core::oracle::{ChatCompletionsBackend, GeminiBackend, OracleSource, PromptBook};
use interview_core::question_source::{QuestionSource, StaticQuestionSource};
use interview_core::session_state::{Control, InterviewController};
use interview_core::settings::InterviewSettings;
use interview_core::speech::SpeechIo;
use interview_core::summary::SessionSummary;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::fmt::time::ChronoLocal;

#[derive(Parser)]
#[command(version, about = "Mock job interview in the terminal")]
struct Cli {
    /// Role to interview for. Fuzzy-matched against the built-in roles;
    /// asked for interactively when omitted.
    role: Option<String>,

    /// Where questions come from. Overrides QUESTION_SOURCE.
    #[arg(long, value_enum)]
    source: Option<QuestionBackend>,

    /// How long each spoken word holds the floor, in milliseconds.
    #[arg(long, default_value_t = 60)]
    word_pace_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Load Configuration ---
    let args = Cli::parse();
    let mut config = Config::from_env().context("Failed to load application configuration")?;
    if let Some(source) = args.source {
        config = config
            .with_question_source(source)
            .context("Invalid --source for the current environment")?;
    }

    // --- 2. Initialize Logging ---
    // Logs go to stderr so they do not interleave with the interview itself.
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(source = ?config.question_source, "Configuration loaded. Starting interview service...");

    // --- 3. Load Prompts ---
    let prompts = prompt_loader::load_role_prompts_if_present(&config.prompts_dir)
        .context("Failed to load role prompts")?;
    tracing::info!("Loaded {} role prompt overrides.", prompts.len());
    let prompts = PromptBook::with_overrides(prompts);

    // --- 4. Pick a Role ---
    let mut stdin = BufReader::new(tokio::io::stdin());
    let mut app = InterviewApp::new();
    let requested = match args.role {
        Some(role) => role,
        None => prompt_for_role(&mut stdin).await?,
    };
    let role = app
        .on_start_interview(&requested)
        .context("No role selected")?;
    println!("Starting your {role} mock interview. Ctrl-C or /end finishes it early.\n");

    // --- 5. Build the Question Source and Run ---
    let settings = InterviewSettings {
        max_consecutive_failures: config.max_oracle_failures,
        closing_delay: config.closing_delay,
        ..InterviewSettings::default()
    };
    let pace = Duration::from_millis(args.word_pace_ms);

    let summary = match config.question_source {
        QuestionBackend::Static => {
            run_interview(StaticQuestionSource, &role, settings, stdin, pace).await?
        }
        QuestionBackend::OpenAI => {
            let api_key = config
                .openai_api_key
                .clone()
                .context("OPENAI_API_KEY is not set")?;
            let backend = ChatCompletionsBackend::new(
                api_key,
                config.chat_model.clone(),
                prompts,
                settings.history_window,
            );
            let source = OracleSource::new(backend, config.max_questions);
            run_interview(source, &role, settings, stdin, pace).await?
        }
        QuestionBackend::Gemini => {
            let api_key = config
                .gemini_api_key
                .clone()
                .context("GEMINI_API_KEY is not set")?;
            let backend = GeminiBackend::new(api_key, config.gemini_model.clone(), prompts);
            let source = OracleSource::new(backend, config.max_questions);
            run_interview(source, &role, settings, stdin, pace).await?
        }
    };

    // --- 6. Results ---
    match summary {
        Some(summary) => {
            print_results(&summary);
            app.on_complete_interview(summary);
        }
        None => println!("Interview abandoned."),
    }
    app.on_back_to_welcome();

    Ok(())
}

async fn prompt_for_role<R: AsyncBufRead + Unpin>(input: &mut R) -> Result<String> {
    println!("Choose a role to practise:");
    for (i, card) in role_catalogue().iter().enumerate() {
        println!("  {}. {:<18} {}", i + 1, card.title, card.description);
    }
    println!("Enter a number or a role name:");

    let mut line = String::new();
    input
        .read_line(&mut line)
        .await
        .context("Failed to read role from terminal")?;
    let line = line.trim();

    let catalogue = role_catalogue();
    let role = line
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| catalogue.get(i))
        .map(|card| card.title.to_string())
        .unwrap_or_else(|| line.to_string());
    Ok(role)
}

async fn run_interview<Q, R>(
    source: Q,
    role: &str,
    settings: InterviewSettings,
    input: R,
    pace: Duration,
) -> Result<Option<SessionSummary>>
where
    Q: QuestionSource,
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let (control_tx, control_rx) = mpsc::channel::<Control>(8);
    let (event_tx, mut event_rx) = mpsc::channel::<InterviewEvent>(32);

    let mut speech = ConsoleSpeech::spawn(input, pace, control_tx.clone());
    let speech_rx = speech
        .events()
        .await
        .context("Failed to subscribe to speech events")?;

    let ctrl_c = control_tx.clone();
    tokio::spawn(async move {
        let mut interrupts = 0;
        while tokio::signal::ctrl_c().await.is_ok() {
            interrupts += 1;
            if on_interrupt(interrupts, &ctrl_c) == Interrupt::Exit {
                std::process::exit(130);
            }
        }
    });

    let printer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                InterviewEvent::QuestionAsked {
                    number,
                    topic,
                    progress,
                    ..
                } => match progress {
                    Some(p) => println!("\n--- Question {number} · {topic} · {p:.0}% ---"),
                    None => println!("\n--- Question {number} · {topic} ---"),
                },
                InterviewEvent::Speaking => tracing::debug!("Interviewer speaking"),
                InterviewEvent::Listening => tracing::debug!("Listening for an answer"),
                InterviewEvent::Notice(notice) => println!("! {notice} (type /listen to try again)"),
                InterviewEvent::Closing(_) => println!("\n--- Wrapping up ---"),
                InterviewEvent::Completed(_) | InterviewEvent::Abandoned => break,
            }
        }
    });

    let mut controller = InterviewController::new(source, speech, settings, event_tx);
    controller
        .start(role)
        .await
        .context("Failed to start interview")?;
    let summary = controller
        .run(speech_rx, control_rx)
        .await
        .context("Interview loop failed")?;

    drop(controller);
    if let Err(e) = printer.await {
        tracing::warn!("Event printer stopped unexpectedly: {e}");
    }
    Ok(summary)
}

#[derive(Debug, PartialEq, Eq)]
enum Interrupt {
    EndRequested,
    Exit,
}

/// The first Ctrl-C asks the controller to end the interview. Later ones exit.
fn on_interrupt(count: usize, control_tx: &mpsc::Sender<Control>) -> Interrupt {
    if count > 1 {
        tracing::warn!("Ctrl-C received again, exiting");
        return Interrupt::Exit;
    }
    tracing::info!("Ctrl-C received, ending interview");
    if let Err(e) = control_tx.try_send(Control::EndInterview) {
        tracing::warn!("Failed to deliver end request: {e}");
    }
    Interrupt::EndRequested
}

fn print_results(summary: &SessionSummary) {
    let card = summary.scorecard();
    println!("\n=== Interview Complete! ===");
    println!("Great job on your {} mock interview", summary.role);
    println!(
        "Questions answered: {} of {}",
        summary.questions_answered, summary.questions_asked
    );
    println!("Estimated duration: ~{} minutes", card.estimated_minutes);
    println!("Overall score: {}%", card.overall);
    for category in &card.categories {
        println!(
            "  {:<16} {:>3}%  {}",
            category.category, category.score, category.feedback
        );
    }
    if !summary.topics_covered.is_empty() {
        println!("Topics covered: {}", summary.topics_covered.join(", "));
    }
    tracing::info!(
        elapsed_secs = summary.elapsed().num_seconds(),
        "Session finished"
    );
}
