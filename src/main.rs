//! gpio-watch - run scripts in response to GPIO events
//!
//! Watches the given pins (or every pin that has a script) and runs
//! `{script_dir}/{pin} {pin} {value}` whenever one of them changes.

use anyhow::{bail, Context};
use clap::{ArgAction, Parser};
use gpio_watch::config::DEFAULT_SCRIPT_DIR;
use gpio_watch::gpio::{sysfs, DEFAULT_GPIO_BASE};
use gpio_watch::{
    EdgeMode, PinSpec, ScriptDispatcher, SysfsLines, SystemClock, WatchConfig, Watcher,
};
use std::fs::OpenOptions;
use std::io;
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Debug, Parser)]
#[command(name = "gpio-watch")]
#[command(about = "Run scripts in response to GPIO events")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    long_about = "Watches GPIO lines through /sys/class/gpio and runs SCRIPT_DIR/PIN PIN VALUE \
                  whenever a line changes. With no pins given, every pin from 0 to 31 that has \
                  a script in SCRIPT_DIR is watched."
)]
struct Cli {
    /// Pins to watch, optionally with an edge mode (rising, falling, both, switch)
    #[arg(value_name = "PIN[:EDGE]")]
    pins: Vec<PinSpec>,

    /// Directory holding the event scripts, one per pin
    #[arg(short, long, default_value = DEFAULT_SCRIPT_DIR)]
    script_dir: PathBuf,

    /// Edge mode for pins given without one
    #[arg(short = 'e', long = "edge", default_value = "both")]
    default_edge: EdgeMode,

    /// More log output (repeat for debug output)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Append log and script output to this file
    #[arg(short = 'l', long = "logfile")]
    logfile: Option<PathBuf>,

    /// Detach from the terminal and run in the background
    #[arg(short, long)]
    detach: bool,

    /// Root of the sysfs GPIO interface
    #[arg(long, default_value = DEFAULT_GPIO_BASE)]
    gpio_base: PathBuf,

    /// Print the resolved watch set as JSON and exit
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    fn to_config(&self) -> WatchConfig {
        WatchConfig::new(&self.script_dir)
            .with_default_edge(self.default_edge)
            .with_gpio_base(&self.gpio_base)
            .with_log_file(self.logfile.clone())
            .with_detach(self.detach)
            .with_verbosity(self.verbose)
            .with_pins(self.pins.clone())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = cli.to_config();

    // Nothing is logged yet, so a bad log file can only be reported on stderr
    if let Err(e) = init_logging(&config) {
        eprintln!("gpio-watch: {:#}", e);
        return ExitCode::FAILURE;
    }

    match run(&config, cli.dry_run) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(config: &WatchConfig) -> anyhow::Result<()> {
    if let Some(path) = &config.log_file {
        redirect_output(path)?;
    }

    let level = match config.verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(io::stderr)
        .with_ansi(config.log_file.is_none())
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

/// Point stdout and stderr at the log file, so event scripts write there too.
fn redirect_output(path: &Path) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .mode(0o644)
        .open(path)
        .with_context(|| format!("failed to open logfile {}", path.display()))?;

    nix::unistd::dup2(file.as_raw_fd(), io::stdout().as_raw_fd())
        .context("failed to redirect stdout")?;
    nix::unistd::dup2(file.as_raw_fd(), io::stderr().as_raw_fd())
        .context("failed to redirect stderr")?;

    Ok(())
}

fn run(config: &WatchConfig, dry_run: bool) -> anyhow::Result<()> {
    config.validate_script_dir()?;

    let pins = config.watch_set()?;

    if dry_run {
        println!("{}", serde_json::to_string_pretty(&pins)?);
        return Ok(());
    }

    if pins.is_empty() {
        bail!(
            "no pins to watch: none given and no scripts found in \"{}\"",
            config.script_dir.display()
        );
    }

    for target in &pins {
        sysfs::prepare(&config.gpio_base, target.pin, target.edge)
            .with_context(|| format!("failed to set up pin {}", target.pin))?;
    }

    if config.detach {
        nix::unistd::daemon(true, config.log_file.is_some())
            .context("failed to detach from terminal")?;
    }

    let (source, lines) = SysfsLines::open(&config.gpio_base, &pins)?;
    let dispatcher = ScriptDispatcher::new(&config.script_dir);
    let watcher = Watcher::new(lines, source, dispatcher, SystemClock::new());

    supervise(watcher)
}

/// Run the blocking watch loop until it fails or the process is told to stop.
fn supervise(watcher: Watcher<SysfsLines, ScriptDispatcher, SystemClock>) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    let result = runtime.block_on(watch_until_signal(watcher));

    // the watch loop may still be blocked in poll(2) or on a script
    runtime.shutdown_background();
    result
}

async fn watch_until_signal(
    mut watcher: Watcher<SysfsLines, ScriptDispatcher, SystemClock>,
) -> anyhow::Result<()> {
    let mut terminate =
        signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;
    let mut watch = tokio::task::spawn_blocking(move || watcher.run());

    tokio::select! {
        joined = &mut watch => {
            match joined.context("watch loop panicked")? {
                Ok(never) => match never {},
                Err(e) => Err(anyhow::Error::new(e).context("gpio watch failed")),
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("received SIGINT, exiting");
            Ok(())
        }
        _ = terminate.recv() => {
            info!("received SIGTERM, exiting");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpio_watch::WatchedPin;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from([
            "gpio-watch",
            "-s",
            "/tmp/scripts",
            "-e",
            "switch",
            "-vv",
            "4",
            "17:rising",
        ])
        .unwrap();

        assert_eq!(cli.script_dir, PathBuf::from("/tmp/scripts"));
        assert_eq!(cli.default_edge, EdgeMode::Switch);
        assert_eq!(cli.verbose, 2);

        let config = cli.to_config();
        assert_eq!(
            config.watch_set().unwrap(),
            vec![
                WatchedPin::new(4, EdgeMode::Switch),
                WatchedPin::new(17, EdgeMode::Rising),
            ]
        );
    }

    #[test]
    fn test_default_values() {
        let cli = Cli::try_parse_from(["gpio-watch"]).unwrap();
        assert_eq!(cli.script_dir, PathBuf::from("/etc/gpio-scripts"));
        assert_eq!(cli.default_edge, EdgeMode::Both);
        assert_eq!(cli.gpio_base, PathBuf::from("/sys/class/gpio"));
        assert_eq!(cli.verbose, 0);
        assert!(cli.logfile.is_none());
        assert!(!cli.detach);
        assert!(cli.pins.is_empty());
    }

    #[test]
    fn test_invalid_edge_is_a_usage_error() {
        let err = Cli::try_parse_from(["gpio-watch", "4:sideways"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let err = Cli::try_parse_from(["gpio-watch", "-e", "up"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_logfile_and_detach_flags() {
        let cli =
            Cli::try_parse_from(["gpio-watch", "-d", "-l", "/var/log/gpio-watch.log"]).unwrap();
        let config = cli.to_config();
        assert!(config.detach);
        assert_eq!(
            config.log_file,
            Some(PathBuf::from("/var/log/gpio-watch.log"))
        );
    }
}
