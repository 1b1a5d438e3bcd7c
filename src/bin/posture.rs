//! Posture CLI - Command-line interface for Posture Flux
//!
//! Commands:
//! - classify: Classify recorded pose frames (batch mode)
//! - run: Classify frames streamed on stdin (streaming mode)
//! - angle: Compute the angle between two line segments
//! - config: Print the default configuration
//! - doctor: Diagnose configuration health

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use log::{info, warn};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use posture_flux::encoder::PostureReport;
use posture_flux::geometry::angle_between;
use posture_flux::pose::Frame;
use posture_flux::types::{LineSegment, Point2D};
use posture_flux::{
    LevelAtEyeHeight, PostureConfig, PostureError, PostureProcessor, PRODUCER_NAME, VERSION,
};

/// Posture - classify sitting posture from pose keypoints
#[derive(Parser)]
#[command(name = "posture")]
#[command(version = VERSION)]
#[command(about = "Classify sitting posture from pose keypoint frames", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify recorded frames (batch mode)
    Classify {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Attach an overlay description to each report
        #[arg(long)]
        overlay: bool,
    },

    /// Classify frames streamed on stdin (streaming mode)
    ///
    /// A line containing only `recalibrate` recalibrates from the last frame.
    Run {
        /// Configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Recalibration policy
        #[arg(long, default_value = "keep")]
        policy: PolicyArg,

        /// Attach an overlay description to each report
        #[arg(long)]
        overlay: bool,

        /// Flush output after each record
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        flush: bool,
    },

    /// Compute the scaled angle between two segments
    Angle {
        /// First segment as x1 y1 x2 y2
        #[arg(long, num_args = 4, allow_negative_numbers = true)]
        line_a: Vec<f64>,

        /// Second segment as x1 y1 x2 y2
        #[arg(long, num_args = 4, allow_negative_numbers = true)]
        line_b: Vec<f64>,

        /// Multiplier applied to the angle in radians
        #[arg(long, default_value = "100")]
        multiplier: f64,
    },

    /// Print the default configuration as JSON
    Config,

    /// Diagnose configuration health
    Doctor {
        /// Configuration file to check
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one frame per line)
    Ndjson,
    /// JSON array of frames
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one report per line)
    Ndjson,
    /// JSON array of reports
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum PolicyArg {
    /// Keep the calibration unchanged
    Keep,
    /// Move the reference line to the current eye height
    Level,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), PostureCliError> {
    match cli.command {
        Commands::Classify {
            input,
            output,
            input_format,
            output_format,
            config,
            overlay,
        } => cmd_classify(
            &input,
            &output,
            input_format,
            output_format,
            config.as_deref(),
            overlay,
        ),

        Commands::Run {
            config,
            policy,
            overlay,
            flush,
        } => cmd_run(config.as_deref(), policy, overlay, flush),

        Commands::Angle {
            line_a,
            line_b,
            multiplier,
        } => cmd_angle(&line_a, &line_b, multiplier),

        Commands::Config => {
            println!("{}", PostureConfig::default().to_json_pretty()?);
            Ok(())
        }

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
    }
}

fn load_config(path: Option<&Path>) -> Result<PostureConfig, PostureCliError> {
    match path {
        Some(path) => Ok(PostureConfig::load(path)?),
        None => Ok(PostureConfig::default()),
    }
}

fn build_processor(
    config: &PostureConfig,
    policy: PolicyArg,
    overlay: bool,
) -> Result<PostureProcessor, PostureCliError> {
    let mut processor = PostureProcessor::new(config)?;
    if let PolicyArg::Level = policy {
        processor = processor.with_policy(Box::new(LevelAtEyeHeight));
    }
    if overlay {
        processor = processor.with_overlay(config);
    }
    Ok(processor)
}

fn cmd_classify(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    config: Option<&Path>,
    overlay: bool,
) -> Result<(), PostureCliError> {
    let config = load_config(config)?;
    let mut processor = build_processor(&config, PolicyArg::Keep, overlay)?;

    // Read input
    let input_data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    // Parse frames
    let frames: Vec<Frame> = match input_format {
        InputFormat::Ndjson => input_data
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(Frame::from_json)
            .collect::<Result<_, _>>()?,
        InputFormat::Json => serde_json::from_str(&input_data)?,
    };

    if frames.is_empty() {
        return Err(PostureCliError::NoFrames);
    }

    let mut reports: Vec<PostureReport> = Vec::new();
    for frame in &frames {
        if let Some(report) = processor.process_frame(frame)? {
            reports.push(report);
        }
    }

    info!(
        "classified {} frames, skipped {}",
        processor.frames_classified(),
        processor.frames_skipped()
    );

    let output_data = format_output(&reports, &output_format)?;

    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_run(
    config: Option<&Path>,
    policy: PolicyArg,
    overlay: bool,
    flush: bool,
) -> Result<(), PostureCliError> {
    let config = load_config(config)?;
    let mut processor = build_processor(&config, policy, overlay)?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    run_stream(&mut processor, stdin.lock(), &mut stdout, flush)?;

    stdout.flush()?;
    Ok(())
}

/// Classify frames line by line, writing one report per classified frame.
///
/// Malformed frames and recalibration requests that cannot be honoured are
/// logged and skipped; only I/O and encoding failures end the stream.
fn run_stream<R: BufRead, W: Write>(
    processor: &mut PostureProcessor,
    input: R,
    output: &mut W,
    flush: bool,
) -> Result<(), PostureCliError> {
    for line in input.lines() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        if trimmed == "recalibrate" {
            if let Err(e) = processor.recalibrate() {
                warn!("recalibration ignored: {e}");
            }
            continue;
        }

        let frame = match Frame::from_json(trimmed) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("skipping malformed frame: {e}");
                continue;
            }
        };

        if let Some(report) = processor.process_frame(&frame)? {
            writeln!(output, "{}", serde_json::to_string(&report)?)?;
            if flush {
                output.flush()?;
            }
        }
    }

    Ok(())
}

fn cmd_angle(line_a: &[f64], line_b: &[f64], multiplier: f64) -> Result<(), PostureCliError> {
    let a = segment_from_args(line_a)?;
    let b = segment_from_args(line_b)?;
    println!("{}", angle_between(&a, &b, multiplier));
    Ok(())
}

fn segment_from_args(coords: &[f64]) -> Result<LineSegment, PostureCliError> {
    match coords {
        [x1, y1, x2, y2] => Ok(LineSegment::new(
            Point2D::new(*x1, *y1),
            Point2D::new(*x2, *y2),
        )),
        _ => Err(PostureCliError::Usage(format!(
            "expected 4 coordinates, got {}",
            coords.len()
        ))),
    }
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), PostureCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} {}", PRODUCER_NAME, VERSION),
    });

    match config {
        Some(path) if !path.exists() => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Warning,
            message: "Config file does not exist, defaults will be used".to_string(),
        }),
        Some(path) => match PostureConfig::load(path) {
            Ok(config) => checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Ok,
                message: format!(
                    "Config valid ({}x{} frame, threshold {})",
                    config.frame_width, config.frame_height, config.threshold_degrees
                ),
            }),
            Err(e) => checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: format!("Invalid config: {}", e),
            }),
        },
        None => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: "Using default configuration".to_string(),
        }),
    }

    // Check stdin is available (for streaming mode)
    let stdin_message = if atty::is(atty::Stream::Stdin) {
        "stdin is a TTY (interactive mode)"
    } else {
        "stdin is a pipe (streaming mode ready)"
    };
    checks.push(DoctorCheck {
        name: "stdin".to_string(),
        status: CheckStatus::Ok,
        message: stdin_message.to_string(),
    });

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Posture Doctor Report");
        println!("=====================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(PostureCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn format_output(
    reports: &[PostureReport],
    format: &OutputFormat,
) -> Result<String, PostureCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for report in reports {
                lines.push(serde_json::to_string(report)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(reports)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(reports)?),
    }
}

// Error types

#[derive(Debug)]
enum PostureCliError {
    Io(io::Error),
    Posture(PostureError),
    Json(serde_json::Error),
    Usage(String),
    NoFrames,
    DoctorFailed,
}

impl From<io::Error> for PostureCliError {
    fn from(e: io::Error) -> Self {
        PostureCliError::Io(e)
    }
}

impl From<PostureError> for PostureCliError {
    fn from(e: PostureError) -> Self {
        PostureCliError::Posture(e)
    }
}

impl From<serde_json::Error> for PostureCliError {
    fn from(e: serde_json::Error) -> Self {
        PostureCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<PostureCliError> for CliError {
    fn from(e: PostureCliError) -> Self {
        match e {
            PostureCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            PostureCliError::Posture(e) => CliError {
                code: "POSTURE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Ensure frames carry leftEye/rightEye keypoints".to_string()),
            },
            PostureCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            PostureCliError::Usage(msg) => CliError {
                code: "USAGE_ERROR".to_string(),
                message: msg,
                hint: Some("Run with --help for usage".to_string()),
            },
            PostureCliError::NoFrames => CliError {
                code: "NO_FRAMES".to_string(),
                message: "No frames found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            PostureCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
