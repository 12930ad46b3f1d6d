//! Hookscope CLI.
//!
//! - `scan`: build a live environment, inject a scenario, detect and wrap
//!   injected members, replay the scenario's calls, export the report
//! - `check`: resolve and validate configuration
//! - `version`: print version information

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use hs_config::{load_config, ResolvedConfig, CONFIG_SCHEMA_VERSION};
use hs_core::exit_codes::ExitCode;
use hs_core::log_event;
use hs_core::logging::{
    event_names, init_logging, LogConfig, LogContext, LogFormat, LogLevel, Stage,
};
use hs_core::{Environment, ExportSink, FileSink, Monitor, ReferenceBaseline, Scenario, StdoutSink};

/// Detect injected members of a page environment and record their calls
#[derive(Parser)]
#[command(name = "hookscope")]
#[command(author, version, about, long_about = None)]
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
    /// Path to config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format on stderr (human or jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect, instrument, replay a scenario, and export the call report
    Scan(ScanArgs),

    /// Validate configuration
    Check,

    /// Print version information
    Version,
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Scenario file (JSON) describing injected members and calls
    #[arg(long)]
    scenario: PathBuf,

    /// Write the report to this file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let cli_level = if cli.global.quiet {
        Some(LogLevel::Error)
    } else {
        match cli.global.verbose {
            0 => None,
            1 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    };
    init_logging(&LogConfig::from_env(cli_level, cli.global.log_format));

    let ctx = LogContext::generate();
    let exit_code = match &cli.command {
        Commands::Scan(args) => run_scan(&cli.global, args, &ctx),
        Commands::Check => run_check(&cli.global, &ctx),
        Commands::Version => {
            print_version();
            ExitCode::Clean
        }
    };

    std::process::exit(exit_code.as_i32());
}

fn load_or_report(global: &GlobalOpts, ctx: &LogContext) -> Option<ResolvedConfig> {
    match load_config(global.config.as_deref()) {
        Ok(resolved) => {
            let path = resolved
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            log_event!(
                ctx,
                DEBUG,
                event_names::CONFIG_LOADED,
                Stage::Init,
                "Configuration loaded",
                source = resolved.source.to_string().as_str(),
                path = path.as_str()
            );
            Some(resolved)
        }
        Err(e) => {
            log_event!(
                ctx,
                ERROR,
                event_names::CONFIG_ERROR,
                Stage::Init,
                "Configuration rejected",
                error = e.to_string().as_str()
            );
            eprintln!("hookscope: {}", e);
            None
        }
    }
}

fn run_scan(global: &GlobalOpts, args: &ScanArgs, ctx: &LogContext) -> ExitCode {
    let Some(resolved) = load_or_report(global, ctx) else {
        return ExitCode::ArgsError;
    };
    let scenario = match Scenario::from_path(&args.scenario) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("hookscope: cannot read scenario {}: {}", args.scenario.display(), e);
            return ExitCode::ArgsError;
        }
    };

    log_event!(
        ctx,
        INFO,
        event_names::RUN_STARTED,
        Stage::Init,
        "Scan started",
        members = scenario.members.len(),
        calls = scenario.calls.len()
    );

    let env = Environment::with_builtins();
    scenario.apply(&env);

    let monitor = Monitor::new(env.clone(), resolved.config).with_log_context(ctx.clone());
    let detection = monitor.initialize(&ReferenceBaseline::platform());
    let outcomes = scenario.replay(&env);
    let failed_calls = outcomes.iter().filter(|o| o.result.is_err()).count();

    let mut sink: Box<dyn ExportSink> = match &args.output {
        Some(path) => Box::new(FileSink::new(path)),
        None => Box::new(StdoutSink),
    };
    let exported = monitor.export_report(sink.as_mut());
    env.teardown();

    log_event!(
        ctx,
        INFO,
        event_names::RUN_FINISHED,
        Stage::Export,
        "Scan finished",
        injected = detection.injected_count(),
        skipped = detection.skipped.len(),
        replayed = outcomes.len(),
        failed_calls = failed_calls,
        exported = exported
    );

    if !exported {
        eprintln!("hookscope: report export to {} failed", sink.name());
        ExitCode::IoError
    } else if detection.is_clean() {
        ExitCode::Clean
    } else {
        ExitCode::InjectionsFound
    }
}

fn run_check(global: &GlobalOpts, ctx: &LogContext) -> ExitCode {
    match load_or_report(global, ctx) {
        Some(resolved) => {
            let path = resolved
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".to_string());
            println!("config ok");
            println!("source: {}", resolved.source);
            println!("path: {}", path);
            println!("schema version: {}", resolved.config.schema_version);
            println!(
                "denylist fragments: {}",
                resolved.config.detection.effective_denylist().len()
            );
            ExitCode::Clean
        }
        None => ExitCode::ArgsError,
    }
}

fn print_version() {
    println!("hookscope {}", env!("CARGO_PKG_VERSION"));
    println!("config schema version: {}", CONFIG_SCHEMA_VERSION);
}
