// src/main.rs

use async_trait::async_trait;
use dotenvy::dotenv;
use quiz_knight::api::HttpQuizApi;
use quiz_knight::config::{Config, ProctorSettings, SYNC_INTERVAL_SECS};
use quiz_knight::error::AppError;
use quiz_knight::ledger::{AttemptLedger, KeyValueStore, LedgerSync, MemoryStore, SqliteStore};
use quiz_knight::proctor::{ActiveAttempt, Admission, Phase, QuestionView, launch_attempt};
use quiz_knight::signals::{
    BrowserEvent, ClipboardAction, DeviceFault, Disposition, FullscreenHost, KeyCombo, SignalHub,
};
use quiz_knight::state::AppState;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = "\
commands:
  show                 current question
  a <n> <answer>       answer question n (1-based)
  goto <n>             jump to question n (standard quizzes)
  s                    submit
  hide | unhide        leave / return to the tab
  fs-exit | fs-enter   leave / return to fullscreen
  copy | cut | paste | menu
  key <combo>          e.g. key ctrl+c, key ctrl+shift+i, key F12
  faces <n>            webcam face count
  cam-error            webcam becomes unavailable
  status | help | q";

/// A terminal cannot go fullscreen; the request is only logged.
struct TerminalFullscreen;

#[async_trait]
impl FullscreenHost for TerminalFullscreen {
    async fn request_fullscreen(&self) -> Result<(), AppError> {
        tracing::info!("Fullscreen re-entry requested");
        println!("[fullscreen restored]");
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "quiz-knight.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let Some(quiz_id) = std::env::args().nth(1).and_then(|arg| arg.parse::<i64>().ok()) else {
        eprintln!("usage: quiz-knight <quiz-id>");
        std::process::exit(2);
    };

    // The ledger is advisory, so a store that never comes up degrades to memory.
    let mut retry_count = 0;
    let store: Arc<dyn KeyValueStore> = loop {
        match SqliteStore::connect(&config.ledger_database_url).await {
            Ok(store) => break Arc::new(store),
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    tracing::error!(
                        "Ledger store unavailable after 5 retries, using memory: {}",
                        e
                    );
                    break Arc::new(MemoryStore::new());
                }
                tracing::warn!("Ledger store not ready, retrying in 2s... (Attempt {})", retry_count);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    };
    tracing::info!("Ledger store ready");

    let api = match HttpQuizApi::from_config(&config) {
        Ok(api) => api,
        Err(e) => {
            tracing::error!("Invalid API configuration: {}", e);
            std::process::exit(1);
        }
    };

    let ledger = AttemptLedger::new(store);
    ledger.cleanup_stale_attempts().await;
    let sync = LedgerSync::spawn(ledger.clone(), Duration::from_secs(SYNC_INTERVAL_SECS));

    let state = AppState {
        api: Arc::new(api),
        ledger,
        settings: ProctorSettings::default(),
    };

    match launch_attempt(&state, quiz_id).await {
        Ok(Admission::Started(attempt)) => run_attempt(&state, attempt).await,
        Ok(Admission::AlreadyAttempted { active, snapshot }) => {
            println!("You have already attempted this quiz.");
            if let Some(record) = active {
                println!("Attempt started at {}.", record.timestamp.to_rfc3339());
            }
            if let Some(snapshot) = snapshot {
                println!("Warnings recorded: {}.", snapshot.warnings);
            }
        }
        Ok(Admission::NotOpen) => println!("This live quiz is not open."),
        Err(e) => {
            tracing::error!("Could not start quiz {}: {}", quiz_id, e);
            if let Some(message) = e.user_message() {
                println!("{}", message);
            }
        }
    }

    sync.shutdown().await;
}

async fn run_attempt(state: &AppState, attempt: ActiveAttempt) {
    let handle = attempt.handle.clone();
    let hub = SignalHub::attach(&handle, &state.settings, Arc::new(TerminalFullscreen));

    let mut notices = handle.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match notices.recv().await {
                Ok(notice) => println!(">> {}", notice),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Notice printer lagged, {} notices skipped", skipped)
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    println!(
        "{} ({} questions, {} min)",
        attempt.quiz.title,
        attempt.questions.len(),
        attempt.quiz.duration_secs() / 60
    );
    println!("{}", HELP);
    show_current(&attempt);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let finished = handle.wait_until(|s| s.phase == Phase::Submitted);
    tokio::pin!(finished);

    loop {
        tokio::select! {
            outcome = &mut finished => {
                if let Ok(status) = outcome {
                    if let Some(summary) = status.summary {
                        println!(
                            "Score {}% ({} correct, {} wrong, {} unanswered)",
                            summary.score, summary.correct, summary.wrong, summary.unanswered
                        );
                    }
                }
                break;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if !run_command(&attempt, &hub, line.trim()) {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("Failed to read stdin: {}", e);
                    break;
                }
            },
        }
    }

    let blocked: Vec<String> = hub
        .blocked_counts()
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(name, count)| format!("{} {}", name, count))
        .collect();
    if !blocked.is_empty() {
        tracing::info!("Blocked events: {}", blocked.join(", "));
    }

    hub.detach();
    handle.teardown();
    handle.closed().await;
    printer.abort();
}

/// Returns false to quit.
fn run_command(attempt: &ActiveAttempt, hub: &SignalHub, line: &str) -> bool {
    let handle = &attempt.handle;
    let mut parts = line.splitn(3, ' ');
    let command = parts.next().unwrap_or_default();

    let sent = match command {
        "" => Ok(()),
        "q" | "quit" => return false,
        "help" => {
            println!("{}", HELP);
            Ok(())
        }
        "show" => {
            show_current(attempt);
            Ok(())
        }
        "status" => {
            let status = handle.status();
            println!(
                "{:?}, {}s left, warnings {}, submission {:?}",
                status.phase, status.quiz_time_remaining, status.warnings, status.submission
            );
            Ok(())
        }
        "a" | "answer" => match (parse_position(parts.next()), parts.next()) {
            (Some(index), Some(answer)) => {
                let answer = choice_text(attempt, index, answer.trim());
                handle.record_answer(index, answer)
            }
            _ => {
                println!("usage: a <n> <answer>");
                Ok(())
            }
        },
        "goto" => match parse_position(parts.next()) {
            Some(index) => handle.go_to(index),
            None => {
                println!("usage: goto <n>");
                Ok(())
            }
        },
        "s" | "submit" => handle.submit(),
        "hide" => dispatch(hub, BrowserEvent::VisibilityChanged { hidden: true }),
        "unhide" => dispatch(hub, BrowserEvent::VisibilityChanged { hidden: false }),
        "fs-exit" => dispatch(hub, BrowserEvent::FullscreenChanged { active: false }),
        "fs-enter" => dispatch(hub, BrowserEvent::FullscreenChanged { active: true }),
        "copy" => dispatch(hub, BrowserEvent::Clipboard(ClipboardAction::Copy)),
        "cut" => dispatch(hub, BrowserEvent::Clipboard(ClipboardAction::Cut)),
        "paste" => dispatch(hub, BrowserEvent::Clipboard(ClipboardAction::Paste)),
        "menu" => dispatch(hub, BrowserEvent::ContextMenu),
        "key" => match parts.next().and_then(parse_combo) {
            Some(combo) => dispatch(hub, BrowserEvent::KeyDown(combo)),
            None => {
                println!("usage: key <combo>");
                Ok(())
            }
        },
        "faces" => match parts.next().and_then(|n| n.parse::<u32>().ok()) {
            Some(faces) => dispatch(hub, BrowserEvent::FacesDetected(faces)),
            None => {
                println!("usage: faces <n>");
                Ok(())
            }
        },
        "cam-error" => dispatch(hub, BrowserEvent::WebcamFault(DeviceFault::NotFound)),
        other => {
            println!("unknown command {:?}, try help", other);
            Ok(())
        }
    };

    if let Err(e) = sent {
        tracing::warn!("Command {:?} rejected: {}", line, e);
    }
    true
}

fn dispatch(hub: &SignalHub, event: BrowserEvent) -> Result<(), AppError> {
    if hub.dispatch(&event) == Disposition::Block {
        println!("[blocked]");
    }
    Ok(())
}

/// "1" is the first question.
fn parse_position(arg: Option<&str>) -> Option<usize> {
    arg?.parse::<usize>().ok()?.checked_sub(1)
}

/// A bare number picks that option; anything else is taken verbatim.
fn choice_text(attempt: &ActiveAttempt, index: usize, answer: &str) -> String {
    if let Some(QuestionView::Ready { choices, .. }) = attempt.question_at(index) {
        if let Some(choice) = answer
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|n| choices.get(n))
        {
            return choice.clone();
        }
    }
    answer.to_string()
}

fn parse_combo(arg: &str) -> Option<KeyCombo> {
    let mut pieces: Vec<&str> = arg.split('+').collect();
    let key = pieces.pop().filter(|k| !k.is_empty())?;
    let mut combo = KeyCombo::plain(key);
    for modifier in pieces {
        match modifier.to_lowercase().as_str() {
            "ctrl" => combo.ctrl = true,
            "shift" => combo.shift = true,
            "alt" => combo.alt = true,
            "cmd" | "meta" => combo.meta = true,
            _ => return None,
        }
    }
    Some(combo)
}

fn show_current(attempt: &ActiveAttempt) {
    match attempt.current_question() {
        Some(QuestionView::Ready {
            display_index,
            question,
            choices,
            answer,
        }) => {
            println!("Q{}. {}", display_index + 1, question.question_text);
            for (i, choice) in choices.iter().enumerate() {
                let mark = if *choice == answer { "*" } else { " " };
                println!("  {}{}. {}", mark, i + 1, choice);
            }
        }
        Some(QuestionView::Unavailable { display_index }) => {
            println!("Q{}. Unable to load this question.", display_index + 1);
        }
        None => {}
    }
}
