//! Interview reports: assembly and rendering.

pub mod builder;
pub mod generator;

pub use builder::{Assessment, AssessmentSource, InterviewReport, ReportBuilder, TranscriptEntry};
pub use generator::{generate_json_report, generate_markdown_report, save_report, ReportFormat};
