//! interviewd - phase-structured AI interviewer
//!
//! Runs one interview in the terminal, reading answers from stdin or a
//! transcript file, and writes the assessment report at the end.
//!
//! Exit codes:
//!   0 - Interview completed (report written when there was anything to assess)
//!   1 - Runtime error (configuration, I/O, model client setup)

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use interviewd::agent::{AgentOrchestrator, InterviewService, TurnResult};
use interviewd::cli::Args;
use interviewd::config::{Config, CONFIG_FILE};
use interviewd::llm::prompts::INTERVIEWER_NAME;
use interviewd::llm::{OfflineGenerator, OllamaGenerator, TextGenerator};
use interviewd::memory::{KeywordMemoryStore, MemoryStore};
use interviewd::report::{save_report, ReportBuilder};
use interviewd::transcribe::{HttpTranscriber, NoTranscriber, Transcriber};
use interviewd::InterviewError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("interviewd v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run_interview(args).await {
        error!("Interview failed: {}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .interviewd.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    std::fs::write(path, Config::default_toml())
        .with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize the model, memory and interview defaults.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

/// Wire the collaborators and the service from configuration.
fn build_service(config: &Config, offline: bool) -> Result<InterviewService> {
    let generator: Arc<dyn TextGenerator> = if offline {
        Arc::new(OfflineGenerator)
    } else {
        Arc::new(
            OllamaGenerator::new(config.ollama_config())
                .context("Failed to create the model client")?,
        )
    };

    let memory: Arc<dyn MemoryStore> =
        Arc::new(KeywordMemoryStore::new(config.memory.max_facts_per_session));

    let transcriber: Arc<dyn Transcriber> = match config.transcriber.url {
        Some(ref url) => Arc::new(
            HttpTranscriber::new(url.clone(), config.retry_policy())
                .context("Failed to create the transcription client")?,
        ),
        None => Arc::new(NoTranscriber),
    };

    let orchestrator = Arc::new(AgentOrchestrator::new(
        generator.clone(),
        memory.clone(),
        config.orchestrator_settings(),
    ));
    let reports = ReportBuilder::new(generator, config.model.report_max_tokens, config.call_timeout());

    Ok(InterviewService::new(
        orchestrator,
        reports,
        transcriber,
        memory,
        config.service_settings(),
    ))
}

/// Where candidate answers come from.
enum AnswerSource {
    Interactive(Lines<BufReader<Stdin>>),
    Scripted(std::vec::IntoIter<String>),
}

impl AnswerSource {
    fn open(transcript: Option<&PathBuf>) -> Result<Self> {
        match transcript {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read transcript: {}", path.display()))?;
                let answers: Vec<String> = content
                    .lines()
                    .filter(|line| !line.trim_start().starts_with('#'))
                    .map(String::from)
                    .collect();
                Ok(Self::Scripted(answers.into_iter()))
            }
            None => Ok(Self::Interactive(BufReader::new(tokio::io::stdin()).lines())),
        }
    }

    async fn next(&mut self) -> Result<Option<String>> {
        match self {
            Self::Interactive(lines) => {
                print!("🧑 You: ");
                use std::io::Write;
                std::io::stdout().flush().ok();
                Ok(lines.next_line().await?)
            }
            Self::Scripted(answers) => {
                let answer = answers.next();
                if let Some(ref a) = answer {
                    println!("🧑 You: {}", a);
                }
                Ok(answer)
            }
        }
    }
}

fn spinner(quiet: bool, message: &'static str) -> Option<ProgressBar> {
    if quiet {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

fn finish(pb: Option<ProgressBar>) {
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
}

fn print_turn(turn: &TurnResult) {
    if turn.phase_changed && !turn.is_ended() {
        println!("\n── {} ──", turn.phase);
    }
    println!("\n🎙️  {}: {}\n", INTERVIEWER_NAME, turn.message);
}

/// Run the complete interview workflow.
async fn run_interview(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    println!("🤖 Starting interview");
    println!("   Role: {}", config.interview.default_role);
    if args.offline {
        println!("   Model: offline (standard question bank)");
    } else {
        println!("   Model: {} at {}", config.model.name, config.model.base_url);
    }
    println!("   Commands: /status, /audio <file>, /end, /quit\n");

    let service = build_service(&config, args.offline)?;

    let pb = spinner(args.quiet, "Preparing the first question...");
    let started = service.start_interview(None).await?;
    finish(pb);

    let session_id = started.session_id;
    println!("── {} ──", started.status.phase);
    println!("\n🎙️  {}: {}\n", INTERVIEWER_NAME, started.question);

    let mut answers = AnswerSource::open(args.transcript.as_ref())?;
    let mut ended = false;

    while let Some(line) = answers.next().await? {
        let input = line.trim();

        let turn = match input {
            "/quit" => {
                println!("👋 Leaving without a report.");
                return Ok(());
            }
            "/end" => break,
            "/status" => {
                let status = service.status(&session_id).await?;
                println!("{}\n", serde_json::to_string_pretty(&status)?);
                continue;
            }
            _ if input.starts_with("/audio ") => {
                let path = input.trim_start_matches("/audio ").trim();
                let audio = match std::fs::read(path) {
                    Ok(audio) => audio,
                    Err(e) => {
                        eprintln!("⚠️  Cannot read {}: {}", path, e);
                        continue;
                    }
                };
                let pb = spinner(args.quiet, "Transcribing...");
                let result = service.submit_audio(&session_id, &audio).await;
                finish(pb);
                let audio_turn = result?;
                if !audio_turn.transcript.is_empty() {
                    println!("📝 Heard: {}", audio_turn.transcript);
                }
                audio_turn.turn
            }
            _ => {
                let pb = spinner(args.quiet, "Thinking...");
                let result = service.submit_text(&session_id, input).await;
                finish(pb);
                result?
            }
        };

        print_turn(&turn);
        if let Some(score) = turn.weighted_score {
            debug!(score, phase = %turn.phase, fallback = turn.fallback_used, "Turn scored");
        }
        if turn.is_ended() {
            ended = true;
            break;
        }
    }

    if !ended {
        match service.end_interview(&session_id).await {
            Ok(summary) => info!(
                duration = summary.duration_seconds,
                questions = summary.total_questions,
                "Interview ended"
            ),
            Err(InterviewError::SessionEnded(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }

    write_outputs(&service, &session_id, &config, &args).await
}

/// Write the report and, if requested, the session snapshot.
async fn write_outputs(
    service: &InterviewService,
    session_id: &str,
    config: &Config,
    args: &Args,
) -> Result<()> {
    let pb = spinner(args.quiet, "Writing the assessment...");
    let report = service.report(session_id).await;
    finish(pb);

    match report {
        Ok(report) => {
            let path = PathBuf::from(&config.general.output);
            save_report(&report, &path, config.general.format)?;

            println!("\n📊 Interview Summary:");
            println!("   Recommendation: {}", report.assessment.recommendation);
            println!("   Overall score: {:.1}/10", report.overall.weighted_average);
            println!(
                "   Questions: {} | Answers: {}",
                report.metadata.total_questions, report.metadata.total_answers
            );
            println!("   Duration: {}s", report.metadata.duration_seconds);
            println!("\n✅ Report saved to: {}", path.display());
        }
        Err(InterviewError::NoAnswers(_)) => {
            println!("\n⚠️  No answers were given, so no report was written.");
        }
        Err(e) => return Err(e.into()),
    }

    if let Some(ref path) = args.snapshot {
        let session = service.snapshot(session_id).await?;
        std::fs::write(path, session.to_json()?)
            .with_context(|| format!("Failed to write snapshot to {}", path.display()))?;
        println!("💾 Session snapshot saved to: {}", path.display());
    }

    Ok(())
}
