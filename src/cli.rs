//! Command-line interface argument parsing.
//!
//! Every value that can also come from `.interviewd.toml` is optional here,
//! so an unset flag never overrides the config file.

use crate::report::ReportFormat;
use clap::Parser;
use std::path::PathBuf;

/// interviewd - phase-structured AI interviewer
///
/// Runs an adaptive interview in the terminal against a local Ollama model,
/// then writes a Markdown or JSON assessment report.
///
/// Examples:
///   interviewd --role "Backend Engineer"
///   interviewd --role "Data Engineer" --model qwen2.5:7b --difficulty 4
///   interviewd --offline --transcript answers.txt --format json
///   interviewd --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Job role the candidate is interviewing for
    #[arg(short, long, value_name = "ROLE", env = "INTERVIEWD_ROLE")]
    pub role: Option<String>,

    /// Ollama model used for questions, analysis and the report
    #[arg(short, long, env = "INTERVIEWD_MODEL")]
    pub model: Option<String>,

    /// Ollama API endpoint URL
    #[arg(long, value_name = "URL", env = "INTERVIEWD_LLM_URL")]
    pub llm_url: Option<String>,

    /// Temperature for question generation (0.0 - 1.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Transcription service URL, enables /audio answers
    #[arg(long, value_name = "URL", env = "INTERVIEWD_TRANSCRIBER_URL")]
    pub transcriber_url: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .interviewd.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<ReportFormat>,

    /// Initial difficulty level (1 - 5)
    #[arg(short, long, value_name = "LEVEL")]
    pub difficulty: Option<u8>,

    /// Timeout of each model or transcription call, in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Run without a model: every question comes from the built-in bank
    #[arg(long)]
    pub offline: bool,

    /// Disable the interview memory store
    #[arg(long)]
    pub no_memory: bool,

    /// Read answers from a file, one per line, instead of stdin
    #[arg(short, long, value_name = "FILE")]
    pub transcript: Option<PathBuf>,

    /// Write the final session state as JSON to this file
    #[arg(long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .interviewd.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if !self.offline {
            if let Some(ref url) = self.llm_url {
                check_http_url("LLM", url)?;
            }
        }

        if let Some(ref url) = self.transcriber_url {
            check_http_url("Transcriber", url)?;
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=1.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 1.0".to_string());
            }
        }

        if let Some(difficulty) = self.difficulty {
            if !(1..=5).contains(&difficulty) {
                return Err("Difficulty must be between 1 and 5".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref path) = self.transcript {
            if !path.is_file() {
                return Err(format!("Transcript file does not exist: {}", path.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

fn check_http_url(name: &str, url: &str) -> Result<(), String> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(format!("{} URL must start with 'http://' or 'https://'", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            role: Some("Backend Engineer".to_string()),
            model: None,
            llm_url: Some("http://localhost:11434".to_string()),
            temperature: None,
            transcriber_url: None,
            config: None,
            output: None,
            format: None,
            difficulty: None,
            timeout: None,
            offline: false,
            no_memory: false,
            transcript: None,
            snapshot: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_valid_defaults() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args();
        args.llm_url = Some("localhost:11434".to_string());
        assert!(args.validate().is_err());

        args.offline = true;
        assert!(args.validate().is_ok());

        args.transcriber_url = Some("ftp://speech".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_ranges() {
        let mut args = make_args();
        args.difficulty = Some(6);
        assert!(args.validate().is_err());

        args.difficulty = Some(5);
        args.temperature = Some(1.5);
        assert!(args.validate().is_err());

        args.temperature = Some(0.5);
        args.timeout = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_transcript() {
        let mut args = make_args();
        args.transcript = Some(PathBuf::from("/definitely/not/here.txt"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "interviewd",
            "--role",
            "SRE",
            "--format",
            "json",
            "--difficulty",
            "4",
            "--offline",
        ])
        .unwrap();
        assert_eq!(args.role.as_deref(), Some("SRE"));
        assert_eq!(args.format, Some(ReportFormat::Json));
        assert_eq!(args.difficulty, Some(4));
        assert!(args.offline);
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
