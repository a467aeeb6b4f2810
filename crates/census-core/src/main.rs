//! Census - one-shot desktop diagnostics collector and submitter
//!
//! The CLI is the presentation side of the pipeline: it renders the
//! collected record field by field, asks for explicit opt-in, and surfaces
//! the submission outcome. All pipeline logic lives in the library; this
//! binary only drives the flow and formats its states.

use census_common::OutputFormat;
use census_core::collect::{self, DiagnosticRecord};
use census_core::config;
use census_core::exit_codes::ExitCode;
use census_core::flow::{FlowState, SubmissionFlow};
use census_core::guard::SubmissionGuard;
use census_core::logging::{self, LogFormat, LogLevel};
use census_core::upload::HttpUploader;
use clap::{Args, Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// Census - review and submit desktop diagnostics, at most once
#[derive(Parser)]
#[command(name = "census")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Collection endpoint URL (overrides CENSUS_SERVER and the config file)
    #[arg(long, global = true)]
    server: Option<String>,

    /// Override the state directory holding the submission marker
    #[arg(long, global = true, env = "CENSUS_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// Request deadline in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Minimum log level
    #[arg(long, global = true, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Log output format
    #[arg(long, global = true, default_value_t = LogFormat::Human)]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect the diagnostic record and print it for review
    Show(ShowArgs),

    /// Collect, review, and submit on explicit opt-in
    Send(SendArgs),

    /// Report whether this installation already submitted
    Status,
}

#[derive(Args, Debug)]
struct ShowArgs {
    /// Output format
    #[arg(long, short = 'f', default_value_t = OutputFormat::Human)]
    format: OutputFormat,
}

#[derive(Args, Debug)]
struct SendArgs {
    /// Skip the consent prompt (after reviewing with `show`)
    #[arg(long, short = 'y')]
    yes: bool,
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.global.log_level, cli.global.log_format);

    let code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            if e.is_config() {
                ExitCode::UsageError
            } else {
                ExitCode::InternalError
            }
        }
    };
    code.exit()
}

fn run(cli: &Cli) -> census_common::Result<ExitCode> {
    match &cli.command {
        Commands::Show(args) => cmd_show(args),
        Commands::Send(args) => cmd_send(&cli.global, args),
        Commands::Status => cmd_status(&cli.global),
    }
}

fn state_guard(global: &GlobalOpts) -> census_common::Result<SubmissionGuard> {
    let dir = match &global.state_dir {
        Some(dir) => dir.clone(),
        None => SubmissionGuard::default_state_dir()?,
    };
    Ok(SubmissionGuard::new(dir))
}

fn cmd_show(args: &ShowArgs) -> census_common::Result<ExitCode> {
    let record = collect::collect();
    match args.format {
        OutputFormat::Human => render_record(&mut io::stdout(), &record)?,
        OutputFormat::Json => println!("{}", record.to_wire()?),
    }
    Ok(ExitCode::Ok)
}

fn cmd_status(global: &GlobalOpts) -> census_common::Result<ExitCode> {
    let guard = state_guard(global)?;
    if guard.is_already_submitted() {
        println!(
            "already submitted (marker: {})",
            guard.marker_path().display()
        );
    } else {
        println!("not submitted yet");
    }
    Ok(ExitCode::Ok)
}

fn cmd_send(global: &GlobalOpts, args: &SendArgs) -> census_common::Result<ExitCode> {
    let settings = config::resolve(global.server.clone(), global.timeout_secs)?;
    let endpoint = settings.require_server_url()?.to_string();
    let guard = state_guard(global)?;
    let mut flow = SubmissionFlow::new(guard, HttpUploader::new(settings.timeout));

    if matches!(flow.request_collection(), FlowState::Submitted { .. }) {
        println!("This installation already submitted its diagnostics; not sending again.");
        return Ok(ExitCode::AlreadySubmitted);
    }

    if let Some(record) = flow.record() {
        render_record(&mut io::stdout(), record)?;
    }

    if !args.yes {
        println!();
        if !prompt_consent()? {
            flow.decline();
            println!("Nothing was sent.");
            return Ok(ExitCode::Declined);
        }
    }

    tracing::info!(endpoint = %endpoint, source = %settings.server_source, "submitting diagnostics");

    match flow.request_submission(&endpoint) {
        FlowState::Submitted {
            outcome,
            guard_error,
        } => {
            if let Some(outcome) = outcome {
                println!("{}", outcome.user_message());
            }
            println!("Thank you! Your diagnostics were submitted.");
            if let Some(error) = guard_error {
                eprintln!(
                    "warning: the submission was delivered, but the marker could not be \
                     saved ({error}); a future run will offer submission again"
                );
            }
            Ok(ExitCode::Ok)
        }
        FlowState::Failed(outcome) => {
            eprintln!("{}", outcome.user_message());
            Ok(ExitCode::SubmissionFailed)
        }
        // request_submission only returns Submitted or Failed from consent.
        _ => Ok(ExitCode::InternalError),
    }
}

fn prompt_consent() -> census_common::Result<bool> {
    print!("Send this data to the collection server? [y/N] ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let answer = line.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

/// Field-by-field rendering for human review; every submitted value is
/// visible before consent is requested.
fn render_record(out: &mut impl Write, record: &DiagnosticRecord) -> io::Result<()> {
    writeln!(out, "{:<32} {}", "Unique ID:", record.identifier)?;
    writeln!(out, "{:<32} {}", "Operating system:", record.operating_system)?;
    writeln!(out, "{:<32} {}", "Hardware vendor:", record.hardware_vendor)?;
    writeln!(out, "{:<32} {}", "Hardware model:", record.hardware_model)?;
    writeln!(
        out,
        "{:<32} {}",
        "Workspaces only on primary:", record.workspaces_on_primary_display_only
    )?;
    writeln!(
        out,
        "{:<32} {}",
        "Workspaces dynamic:", record.workspaces_are_dynamic
    )?;
    writeln!(
        out,
        "{:<32} {}",
        "Remote desktop:", record.remote_desktop_enabled
    )?;
    writeln!(out, "{:<32} {}", "Remote login:", record.remote_login_enabled)?;
    writeln!(
        out,
        "{:<32} {}",
        "Multimedia sharing:", record.multimedia_sharing_enabled
    )?;
    writeln!(out, "{:<32} {}", "File sharing:", record.file_sharing_enabled)?;
    writeln!(out, "{:<32} {}", "Flathub enabled:", record.flathub_enabled)?;
    writeln!(out, "{:<32} {}", "Flatpak installed:", record.flatpak_installed)?;
    writeln!(out, "{:<32} {}", "Default browser:", record.default_browser)?;
    writeln!(
        out,
        "{:<32} {}",
        "Number of user accounts:", record.user_account_count
    )?;
    write_list(out, "Online accounts:", &record.online_account_providers)?;
    write_list(out, "Favourited apps:", &record.favorited_apps)?;
    write_list(out, "Installed apps:", &record.installed_apps)?;
    write_list(out, "Enabled extensions:", &record.enabled_extensions)?;
    Ok(())
}

fn write_list(out: &mut impl Write, label: &str, items: &[String]) -> io::Result<()> {
    if items.is_empty() {
        writeln!(out, "{label:<32} (none)")?;
        return Ok(());
    }
    writeln!(out, "{label}")?;
    for item in items {
        writeln!(out, "  - {item}")?;
    }
    Ok(())
}
