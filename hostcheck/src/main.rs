//! Hostcheck CLI Application
//!
//! A command-line interface for checking reachability of hosts-file entries,
//! grouped by the category comments in the file. This binary layers
//! configuration, sets up logging and renders results produced by
//! hostcheck-lib.

mod report;
mod ui;

use chrono::Local;
use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use hostcheck_lib::{
    count_by_category, load_env_config, parse_duration_string, validate_duration, CancelFlag,
    CheckConfig, ConfigManager, EnvConfig, FileConfig, HostChecker, ProbeKind, MAX_CONCURRENCY,
};
use report::{ReportFormat, DEFAULT_OUTPUT_TEMPLATE};
use std::fs::File;
use std::future::Future;
use std::path::PathBuf;
use std::process;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Exit status when a run was interrupted with Ctrl-C.
const EXIT_INTERRUPTED: i32 = 130;

/// CLI arguments for hostcheck
#[derive(Parser, Debug)]
#[command(name = "hostcheck")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "Sai Dutt G.V <gvs46@protonmail.com>")]
#[command(about = "Check reachability of hosts-file entries by category")]
#[command(
    long_about = "Check reachability of every entry in a hosts file.\n\nComment lines such as '# DATABASES' start a category; every IP or hostname line below it is probed concurrently and a per-category summary is reported."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Hosts file to check (default: ./hosts)
    #[arg(value_name = "FILE", help_heading = "Input")]
    pub file: Option<PathBuf>,

    /// Identifier that marks a null-routed line (default: 00.00.00.00)
    #[arg(long = "null-route", value_name = "ADDR", help_heading = "Input")]
    pub null_route: Option<String>,

    /// List parsed entries and categories without probing
    #[arg(long = "dry-run", help_heading = "Input")]
    pub dry_run: bool,

    /// Probe to use: ping, tcp or http (default: ping)
    #[arg(long = "probe", value_name = "KIND", help_heading = "Probing")]
    pub probe: Option<ProbeKind>,

    /// Port for the TCP probe (default: 443)
    #[arg(long = "port", value_name = "PORT", help_heading = "Probing")]
    pub port: Option<u16>,

    /// Max concurrent probes (default: 50, max: 500)
    #[arg(
        short = 'c',
        long = "concurrency",
        value_name = "N",
        help_heading = "Probing"
    )]
    pub concurrency: Option<usize>,

    /// Per-probe timeout, e.g. 2s, 500ms (default: 2s)
    #[arg(
        short = 't',
        long = "timeout",
        value_name = "DURATION",
        help_heading = "Probing"
    )]
    pub timeout: Option<String>,

    /// Extra time before a stuck probe is abandoned (default: 5s)
    #[arg(long = "probe-margin", value_name = "DURATION", help_heading = "Probing")]
    pub probe_margin: Option<String>,

    /// Report path; {timestamp} is expanded (default: hostcheck_{timestamp})
    #[arg(
        short = 'o',
        long = "output",
        value_name = "PATH",
        help_heading = "Output"
    )]
    pub output: Option<String>,

    /// Report file format: csv or json (default: csv)
    #[arg(long = "format", value_name = "FORMAT", help_heading = "Output")]
    pub format: Option<ReportFormat>,

    /// Do not write a report file
    #[arg(long = "no-report", help_heading = "Output")]
    pub no_report: bool,

    /// Print the report as JSON on stdout instead of the console summary
    #[arg(short = 'j', long = "json", help_heading = "Output")]
    pub json: bool,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Also write log output to this file
    #[arg(long = "log-file", value_name = "FILE", help_heading = "Configuration")]
    pub log_file: Option<PathBuf>,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone)]
struct RunSettings {
    check: CheckConfig,
    output_template: String,
    format: ReportFormat,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Validate arguments
    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    if let Err(e) = init_logging(args.verbose, args.log_file.as_ref()) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "hostcheck starting");

    match run_host_check(args).await {
        Ok(true) => process::exit(EXIT_INTERRUPTED),
        Ok(false) => {}
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn validate_args(args: &Args) -> Result<(), String> {
    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 || concurrency > MAX_CONCURRENCY {
            return Err(format!(
                "Concurrency must be between 1 and {}",
                MAX_CONCURRENCY
            ));
        }
    }

    for (flag, value) in [("--timeout", &args.timeout), ("--probe-margin", &args.probe_margin)] {
        if let Some(value) = value {
            let duration = parse_duration_string(value).ok_or_else(|| {
                format!(
                    "Invalid {} '{}'. Use format like '2s', '500ms', '1m'",
                    flag, value
                )
            })?;
            validate_duration(flag, duration).map_err(|e| e.to_string())?;
        }
    }

    if args.port == Some(0) {
        return Err("Port must be between 1 and 65535".to_string());
    }

    if args.null_route.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err("--null-route cannot be empty".to_string());
    }

    Ok(())
}

/// Install the global `tracing` subscriber.
///
/// Console output goes to stderr so stdout stays clean for `--json`.
fn init_logging(
    verbose: bool,
    log_file: Option<&PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| format!("Failed to create log file '{}': {}", path.display(), e))?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}

/// Run one check. Returns whether the run was interrupted.
async fn run_host_check(args: Args) -> Result<bool, Box<dyn std::error::Error>> {
    let env_config = load_env_config();
    let file_config = load_file_config(&args, &env_config)?;
    let settings = merge_settings(&args, file_config, &env_config)?;
    tracing::debug!(?settings, "resolved settings");

    let checker = HostChecker::new(settings.check.clone());
    let source = settings.check.source.clone();
    let entries = checker.load_entries(&source)?;

    if args.dry_run {
        if args.json {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        } else {
            ui::print_header(&source, entries.len(), &settings.check);
            ui::print_category_counts(&count_by_category(&entries));
            ui::print_dry_run(&entries);
        }
        return Ok(false);
    }

    if !args.json {
        ui::print_header(&source, entries.len(), &settings.check);
        ui::print_category_counts(&count_by_category(&entries));
    }

    let cancel = checker.cancel_flag();
    tokio::spawn(async move {
        if watch_interrupts(cancel, tokio::signal::ctrl_c).await {
            tracing::warn!("second interrupt received, exiting");
            process::exit(EXIT_INTERRUPTED);
        }
    });

    let report = checker.check_entries(entries).await?;
    let finished_at = Local::now();

    let written = if args.no_report {
        Vec::new()
    } else {
        let path = report::report_path(&settings.output_template, settings.format, &finished_at);
        report::write_report(&report, &path, settings.format, &finished_at)?
    };

    if args.json {
        println!("{}", report::render_json(&report, &finished_at)?);
    } else {
        ui::print_summary(&report.aggregate, report.duration, report.cancelled);
        ui::print_report_files(&written);
    }

    Ok(report.cancelled)
}

/// First interrupt stops dispatching new entries. Returns `true` when a second
/// interrupt arrives, meaning the caller should exit without waiting.
async fn watch_interrupts<F, Fut>(cancel: CancelFlag, mut interrupted: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if interrupted().await.is_err() {
        return false;
    }
    tracing::warn!("interrupt received, waiting for in-flight probes (Ctrl-C again to quit)");
    cancel.cancel();

    interrupted().await.is_ok()
}

/// Load the TOML configuration: `--config`, then `HC_CONFIG`, then discovery.
fn load_file_config(
    args: &Args,
    env_config: &EnvConfig,
) -> Result<FileConfig, Box<dyn std::error::Error>> {
    let config_manager = ConfigManager::new(args.verbose);

    let explicit = args
        .config
        .as_ref()
        .map(|path| (path, "CLI --config"))
        .or_else(|| env_config.config.as_ref().map(|path| (path, "HC_CONFIG")));

    match explicit {
        Some((path, origin)) => {
            tracing::debug!(path = %path, origin, "using explicit config file");
            config_manager
                .load_file(path)
                .map_err(|e| format!("Failed to load config file '{}': {}", path, e).into())
        }
        None => Ok(config_manager.discover_and_load()?),
    }
}

/// Layer file config, then environment, then CLI flags over the defaults.
fn merge_settings(
    args: &Args,
    file_config: FileConfig,
    env_config: &EnvConfig,
) -> Result<RunSettings, Box<dyn std::error::Error>> {
    let mut settings = RunSettings {
        check: CheckConfig::default(),
        output_template: DEFAULT_OUTPUT_TEMPLATE.to_string(),
        format: ReportFormat::default(),
    };

    // Step 1: config file
    if let Some(defaults) = file_config.defaults {
        let check = &mut settings.check;
        if let Some(source) = defaults.source {
            check.source = PathBuf::from(source);
        }
        if let Some(concurrency) = defaults.concurrency {
            check.concurrency = concurrency;
        }
        if let Some(timeout) = defaults.timeout.as_deref().and_then(parse_duration_string) {
            check.timeout = timeout;
        }
        if let Some(margin) = defaults.probe_margin.as_deref().and_then(parse_duration_string) {
            check.probe_margin = margin;
        }
        if let Some(null_route) = defaults.null_route {
            check.null_route = null_route;
        }
        if let Some(probe) = defaults.probe {
            check.probe = probe;
        }
        if let Some(port) = defaults.port {
            check.port = port;
        }
    }
    if let Some(output) = file_config.output {
        if let Some(template) = output.path_template {
            settings.output_template = template;
        }
        if let Some(format) = output.format {
            settings.format = format.parse()?;
        }
    }

    // Step 2: HC_* environment variables
    let check = &mut settings.check;
    if let Some(concurrency) = env_config.concurrency {
        check.concurrency = concurrency;
    }
    if let Some(timeout) = env_config.timeout {
        check.timeout = timeout;
    }
    if let Some(null_route) = &env_config.null_route {
        check.null_route = null_route.clone();
    }
    if let Some(file) = &env_config.file {
        check.source = PathBuf::from(file);
    }
    if let Some(probe) = env_config.probe {
        check.probe = probe;
    }
    if let Some(port) = env_config.port {
        check.port = port;
    }
    if let Some(output) = &env_config.output {
        settings.output_template = output.clone();
    }

    // Step 3: CLI arguments (highest precedence)
    apply_cli_args(&mut settings, args);

    Ok(settings)
}

fn apply_cli_args(settings: &mut RunSettings, args: &Args) {
    let check = &mut settings.check;

    if let Some(file) = &args.file {
        check.source = file.clone();
    }
    if let Some(concurrency) = args.concurrency {
        check.concurrency = concurrency;
    }
    if let Some(timeout) = args.timeout.as_deref().and_then(parse_duration_string) {
        check.timeout = timeout;
    }
    if let Some(margin) = args.probe_margin.as_deref().and_then(parse_duration_string) {
        check.probe_margin = margin;
    }
    if let Some(null_route) = &args.null_route {
        check.null_route = null_route.trim().to_string();
    }
    if let Some(probe) = args.probe {
        check.probe = probe;
    }
    if let Some(port) = args.port {
        check.port = port;
    }
    if let Some(output) = &args.output {
        settings.output_template = output.clone();
    }
    if let Some(format) = args.format {
        settings.format = format;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostcheck_lib::{DefaultsConfig, OutputConfig};
    use std::time::Duration;

    fn parse(argv: &[&str]) -> Args {
        let mut full = vec!["hostcheck"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_validate_args_defaults() {
        assert!(validate_args(&parse(&[])).is_ok());
    }

    #[test]
    fn test_validate_args_rejects_bad_values() {
        assert!(validate_args(&parse(&["-c", "0"])).is_err());
        assert!(validate_args(&parse(&["-c", "501"])).is_err());
        assert!(validate_args(&parse(&["-t", "soon"])).is_err());
        assert!(validate_args(&parse(&["--probe-margin", "x"])).is_err());
        assert!(validate_args(&parse(&["--port", "0"])).is_err());
        assert!(validate_args(&parse(&["--null-route", " "])).is_err());
    }

    #[test]
    fn test_validate_args_rejects_zero_margin_and_overflowing_timeout() {
        let err = validate_args(&parse(&["--probe-margin", "0s"])).unwrap_err();
        assert!(err.contains("--probe-margin"));

        assert!(validate_args(&parse(&["-t", "0ms"])).is_err());
        assert!(validate_args(&parse(&["-t", "18446744073709551615s"])).is_err());
        assert!(validate_args(&parse(&["-t", "307445734561825861m"])).is_err());
        assert!(validate_args(&parse(&["-t", "500ms", "--probe-margin", "1s"])).is_ok());
    }

    #[test]
    fn test_resolved_hard_timeout_exceeds_timeout() {
        let args = parse(&["-t", "3s", "--probe-margin", "100ms"]);
        let settings =
            merge_settings(&args, FileConfig::default(), &EnvConfig::default()).unwrap();
        assert!(settings.check.hard_timeout() > settings.check.timeout);
    }

    #[test]
    fn test_probe_and_format_parse() {
        let args = parse(&["--probe", "tcp", "--format", "json"]);
        assert_eq!(args.probe, Some(ProbeKind::Tcp));
        assert_eq!(args.format, Some(ReportFormat::Json));

        assert!(Args::try_parse_from(["hostcheck", "--probe", "smtp"]).is_err());
    }

    #[test]
    fn test_defaults_without_any_layer() {
        let settings =
            merge_settings(&parse(&[]), FileConfig::default(), &EnvConfig::default()).unwrap();

        assert_eq!(settings.check.concurrency, 50);
        assert_eq!(settings.check.timeout, Duration::from_secs(2));
        assert_eq!(settings.check.source, PathBuf::from("hosts"));
        assert_eq!(settings.check.null_route, "00.00.00.00");
        assert_eq!(settings.output_template, DEFAULT_OUTPUT_TEMPLATE);
        assert_eq!(settings.format, ReportFormat::Csv);
    }

    #[test]
    fn test_precedence_file_env_cli() {
        let file_config = FileConfig {
            defaults: Some(DefaultsConfig {
                concurrency: Some(10),
                timeout: Some("5s".to_string()),
                source: Some("from_file".to_string()),
                null_route: Some("0.0.0.0".to_string()),
                ..Default::default()
            }),
            output: Some(OutputConfig {
                path_template: Some("file_{timestamp}".to_string()),
                format: Some("json".to_string()),
            }),
        };
        let env_config = EnvConfig {
            concurrency: Some(20),
            file: Some("from_env".to_string()),
            ..Default::default()
        };
        let args = parse(&["from_cli", "-c", "30"]);

        let settings = merge_settings(&args, file_config, &env_config).unwrap();

        assert_eq!(settings.check.concurrency, 30); // CLI wins
        assert_eq!(settings.check.source, PathBuf::from("from_cli"));
        assert_eq!(settings.check.timeout, Duration::from_secs(5)); // file only
        assert_eq!(settings.check.null_route, "0.0.0.0");
        assert_eq!(settings.output_template, "file_{timestamp}");
        assert_eq!(settings.format, ReportFormat::Json);
    }

    #[test]
    fn test_env_overrides_file() {
        let file_config = FileConfig {
            defaults: Some(DefaultsConfig {
                probe: Some(ProbeKind::Http),
                port: Some(80),
                ..Default::default()
            }),
            output: None,
        };
        let env_config = EnvConfig {
            probe: Some(ProbeKind::Tcp),
            timeout: Some(Duration::from_millis(250)),
            output: Some("env_report".to_string()),
            ..Default::default()
        };

        let settings = merge_settings(&parse(&[]), file_config, &env_config).unwrap();

        assert_eq!(settings.check.probe, ProbeKind::Tcp);
        assert_eq!(settings.check.port, 80);
        assert_eq!(settings.check.timeout, Duration::from_millis(250));
        assert_eq!(settings.output_template, "env_report");
    }

    #[tokio::test]
    async fn test_second_interrupt_requests_exit() {
        let cancel = CancelFlag::new();
        let force = watch_interrupts(cancel.clone(), || std::future::ready(Ok(()))).await;

        assert!(cancel.is_cancelled());
        assert!(force);
    }

    #[tokio::test]
    async fn test_single_interrupt_only_cancels() {
        let cancel = CancelFlag::new();
        let mut calls = 0;
        let force = watch_interrupts(cancel.clone(), || {
            calls += 1;
            std::future::ready(if calls == 1 {
                Ok(())
            } else {
                Err(std::io::Error::other("listener closed"))
            })
        })
        .await;

        assert!(cancel.is_cancelled());
        assert!(!force);
    }

    #[tokio::test]
    async fn test_no_interrupt_leaves_run_alone() {
        let cancel = CancelFlag::new();
        let force = watch_interrupts(cancel.clone(), || {
            std::future::ready(Err(std::io::Error::other("no signal support")))
        })
        .await;

        assert!(!cancel.is_cancelled());
        assert!(!force);
    }

    #[test]
    fn test_explicit_config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hostcheck.toml");
        std::fs::write(&path, "[defaults]\nconcurrency = 7\n").unwrap();

        let args = parse(&["--config", path.to_str().unwrap()]);
        let file_config = load_file_config(&args, &EnvConfig::default()).unwrap();

        assert_eq!(file_config.defaults.unwrap().concurrency, Some(7));
    }

    #[test]
    fn test_missing_explicit_config_fails() {
        let args = parse(&["--config", "/no/such/hostcheck.toml"]);
        let err = load_file_config(&args, &EnvConfig::default()).unwrap_err();
        assert!(err.to_string().contains("/no/such/hostcheck.toml"));
    }
}
