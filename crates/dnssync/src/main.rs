// # dnssync - DNS zone sync tool
//
// Thin command line layer over dnssync-core. All reconciliation logic lives
// in the core crate; this binary only:
// 1. Parses arguments
// 2. Installs the tracing subscriber
// 3. Registers the compiled-in providers
// 4. Runs one command and maps the outcome to an exit code
//
// ## Configuration
//
// Provider credentials come from the environment (see
// `dnssync_core::config::env`). Providers whose variables are missing are
// listed as unavailable by `dnssync providers`.
//
// ## Example
//
// ```bash
// export CF_API_TOKEN=...
// export ZONEFILE_PATH=/etc/bind/zones
//
// dnssync sync --source zonefile --destination cloudflare --zone example.com --dry-run
// ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use dnssync_core::{ProviderRegistry, SyncConfig, SyncEngine, SyncEvent, SyncSummary};
use std::process::ExitCode;
use tokio::sync::mpsc;
use tracing::{Level, debug, error};
use tracing_subscriber::FmtSubscriber;

/// Process exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncExitCode {
    /// Command completed
    Success = 0,
    /// Bad arguments, unknown provider or unusable configuration
    ConfigError = 1,
    /// A zone failed to sync, or a provider call failed
    RuntimeError = 2,
}

impl From<SyncExitCode> for ExitCode {
    fn from(code: SyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Sync DNS zones between providers
#[derive(Debug, Parser)]
#[command(name = "dnssync")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level
    #[arg(
        long = "log-level",
        value_enum,
        global = true,
        env = "DNSSYNC_LOG_LEVEL",
        default_value = "warn"
    )]
    log_level: LogLevel,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Make the destination's zones match the source's
    Sync {
        /// Provider to read records from
        #[arg(long)]
        source: String,

        /// Provider to write records to
        #[arg(long)]
        destination: String,

        /// Zone to sync (can be specified multiple times; default: every
        /// zone of the destination)
        #[arg(long = "zone", value_name = "ZONE")]
        zones: Vec<String>,

        /// Print the actions without applying them
        #[arg(long)]
        dry_run: bool,
    },

    /// List the compiled-in providers
    Providers,

    /// List a provider's zones
    Zones {
        /// Provider id
        provider: String,
    },

    /// Print a zone as zone-file text
    Export {
        /// Provider id
        #[arg(long)]
        provider: String,

        /// Zone to export
        #[arg(long)]
        zone: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

/// How a command that reached the providers ended
enum Outcome {
    Done,
    ZonesFailed,
}

enum CommandError {
    Config(anyhow::Error),
    Runtime(anyhow::Error),
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            return match e.print() {
                Ok(()) => parse_exit_code(&e).into(),
                // Usage or error text could not be written
                Err(_) => SyncExitCode::RuntimeError.into(),
            };
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::from(cli.log_level))
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return SyncExitCode::ConfigError.into();
    }

    // Provider calls are awaited one at a time
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return SyncExitCode::RuntimeError.into();
        }
    };

    let registry = build_registry();

    let code = rt.block_on(async {
        match run_command(cli.command, &registry).await {
            Ok(Outcome::Done) => SyncExitCode::Success,
            Ok(Outcome::ZonesFailed) => SyncExitCode::RuntimeError,
            Err(CommandError::Config(e)) => {
                eprintln!("Error: {e:#}");
                SyncExitCode::ConfigError
            }
            Err(CommandError::Runtime(e)) => {
                eprintln!("Error: {e:#}");
                SyncExitCode::RuntimeError
            }
        }
    });

    code.into()
}

/// Exit code for a command line clap rejected (or answered, for --help)
fn parse_exit_code(e: &clap::Error) -> SyncExitCode {
    if e.use_stderr() {
        SyncExitCode::ConfigError
    } else {
        SyncExitCode::Success
    }
}

/// Registry of every provider compiled into this binary
fn build_registry() -> ProviderRegistry {
    #[allow(unused_mut)]
    let mut registry = ProviderRegistry::new();

    #[cfg(feature = "cloudflare")]
    dnssync_provider_cloudflare::register(&mut registry);
    #[cfg(feature = "digitalocean")]
    dnssync_provider_digitalocean::register(&mut registry);
    #[cfg(feature = "linode")]
    dnssync_provider_linode::register(&mut registry);
    #[cfg(feature = "namecom")]
    dnssync_provider_namecom::register(&mut registry);
    #[cfg(feature = "godaddy")]
    dnssync_provider_godaddy::register(&mut registry);
    #[cfg(feature = "zonefile")]
    dnssync_zonefile::register(&mut registry);

    debug!("{} provider(s) available", registry.providers().len());
    registry
}

async fn run_command(
    command: Command,
    registry: &ProviderRegistry,
) -> std::result::Result<Outcome, CommandError> {
    match command {
        Command::Providers => {
            print!("{}", render_providers(registry));
            Ok(Outcome::Done)
        }

        Command::Zones { provider } => {
            let mut provider = registry.create(&provider).map_err(config_error)?;
            let mut zones = provider
                .list_zones()
                .await
                .with_context(|| format!("Could not list zones of {}", provider.id()))
                .map_err(CommandError::Runtime)?;
            zones.sort();
            for zone in zones {
                println!("{zone}");
            }
            Ok(Outcome::Done)
        }

        Command::Export { provider, zone } => {
            let mut provider = registry.create(&provider).map_err(config_error)?;
            let exported = provider
                .get_zone(&zone)
                .await
                .with_context(|| format!("Could not read zone {zone}"))
                .map_err(CommandError::Runtime)?
                .with_context(|| format!("Zone {zone} does not exist in {}", provider.id()))
                .map_err(CommandError::Runtime)?;
            println!("{}", exported.to_zone_text());
            Ok(Outcome::Done)
        }

        Command::Sync {
            source,
            destination,
            zones,
            dry_run,
        } => {
            let source = registry.create(&source).map_err(config_error)?;
            let destination = registry.create(&destination).map_err(config_error)?;
            let config = SyncConfig {
                dry_run,
                ..SyncConfig::default()
            };

            let (engine, events) =
                SyncEngine::new(source, destination, config).map_err(config_error)?;
            let summary = sync(engine, events, &zones)
                .await
                .map_err(CommandError::Runtime)?;
            print!("{}", render_summary(&summary, dry_run));

            Ok(if summary.has_failures() {
                Outcome::ZonesFailed
            } else {
                Outcome::Done
            })
        }
    }
}

fn config_error(e: dnssync_core::Error) -> CommandError {
    CommandError::Config(e.into())
}

/// Run the engine while a printer task drains its events
async fn sync(
    mut engine: SyncEngine,
    events: mpsc::Receiver<SyncEvent>,
    zones: &[String],
) -> Result<SyncSummary> {
    let printer = tokio::spawn(print_events(events));

    let summary = engine.run(zones).await;

    // Closes the channel so the printer finishes
    drop(engine);
    printer.await.context("Event printer panicked")?;

    Ok(summary?)
}

async fn print_events(mut events: mpsc::Receiver<SyncEvent>) {
    while let Some(event) = events.recv().await {
        if let Some(line) = render_event(&event) {
            println!("{line}");
        }
    }
}

/// The stdout line for an event, if it has one
fn render_event(event: &SyncEvent) -> Option<String> {
    match event {
        SyncEvent::ZoneStarted {
            zone,
            source,
            destination,
        } => Some(format!("Zone {zone} ({source} -> {destination})")),
        SyncEvent::ZoneSkipped { zone, reason } => Some(format!("Skipping {zone}: {reason}")),
        SyncEvent::ActionPlanned { action, .. } => Some(action.clone()),
        SyncEvent::ActionApplied { .. } => Some("  ok".to_string()),
        SyncEvent::ActionFailed { error, .. } => Some(format!("  failed: {error}")),
        SyncEvent::ZoneCompleted { .. } => None,
        SyncEvent::ZoneFailed { zone, error } => Some(format!("Zone {zone} failed: {error}")),
    }
}

fn render_providers(registry: &ProviderRegistry) -> String {
    let mut out = String::new();
    for info in registry.providers() {
        out.push_str(&format!("{}: {}\n", info.id, info.description));
    }
    for (id, reason) in registry.unavailable() {
        out.push_str(&format!("{id}: unavailable ({reason})\n"));
    }
    out
}

fn render_summary(summary: &SyncSummary, dry_run: bool) -> String {
    let verb = if dry_run { "planned" } else { "applied" };
    let mut out = format!(
        "\n{} zone(s) synced, {} action(s) {verb}; {} skipped; {} failed\n",
        summary.synced.len(),
        summary.total_actions(),
        summary.skipped.len(),
        summary.failed.len()
    );
    for (zone, error) in &summary.failed {
        out.push_str(&format!("  {zone}: {error}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use dnssync_core::traits::DnsProviderFactory;
    use dnssync_core::{DnsProvider, MemoryProvider, MemoryZones, ProviderConfig, Record};

    #[test]
    fn test_parse_sync_command() {
        let cli = Cli::try_parse_from([
            "dnssync",
            "sync",
            "--source",
            "zonefile",
            "--destination",
            "cloudflare",
            "--zone",
            "example.com",
            "--zone",
            "example.org",
            "--dry-run",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert_eq!(cli.log_level, LogLevel::Debug);
        match cli.command {
            Command::Sync {
                source,
                destination,
                zones,
                dry_run,
            } => {
                assert_eq!(source, "zonefile");
                assert_eq!(destination, "cloudflare");
                assert_eq!(zones, vec!["example.com", "example.org"]);
                assert!(dry_run);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_arguments() {
        assert!(Cli::try_parse_from(["dnssync", "sync", "--source", "zonefile"]).is_err());
        assert!(Cli::try_parse_from(["dnssync", "providers", "--log-level", "loud"]).is_err());
    }

    #[test]
    fn test_parse_exit_codes() {
        let help = Cli::try_parse_from(["dnssync", "--help"]).unwrap_err();
        assert_eq!(parse_exit_code(&help), SyncExitCode::Success);

        let bad = Cli::try_parse_from(["dnssync", "zones"]).unwrap_err();
        assert_eq!(parse_exit_code(&bad), SyncExitCode::ConfigError);
    }

    #[test]
    fn test_render_events() {
        let applied = SyncEvent::ActionApplied {
            zone: "example.com".into(),
            action: "Create www 300 IN A 192.0.2.1".into(),
        };
        let failed = SyncEvent::ActionFailed {
            zone: "example.com".into(),
            action: "Delete old IN A 192.0.2.9".into(),
            error: "boom".into(),
        };
        let completed = SyncEvent::ZoneCompleted {
            zone: "example.com".into(),
            applied: 1,
        };

        assert_eq!(render_event(&applied).unwrap(), "  ok");
        assert_eq!(render_event(&failed).unwrap(), "  failed: boom");
        assert!(render_event(&completed).is_none());
    }

    #[test]
    fn test_render_summary() {
        let summary = SyncSummary {
            synced: vec![("example.com".into(), 2), ("example.org".into(), 1)],
            skipped: vec![("example.net".into(), "missing".into())],
            failed: vec![("example.io".into(), "timeout".into())],
        };

        assert_eq!(
            render_summary(&summary, false),
            "\n2 zone(s) synced, 3 action(s) applied; 1 skipped; 1 failed\n  example.io: timeout\n"
        );
    }

    struct MemoryFactory;

    impl DnsProviderFactory for MemoryFactory {
        fn id(&self) -> &'static str {
            "memory"
        }

        fn description(&self) -> &'static str {
            "In-memory zones"
        }

        fn create(&self, _config: &ProviderConfig) -> dnssync_core::Result<Box<dyn DnsProvider>> {
            Ok(Box::new(MemoryProvider::new("memory", MemoryZones::default())))
        }
    }

    #[test]
    fn test_render_providers() {
        let mut registry = ProviderRegistry::new();
        registry.register_with(
            Box::new(MemoryFactory),
            Ok(ProviderConfig::ZoneFile { path: ".".into() }),
        );
        assert_eq!(render_providers(&registry), "memory: In-memory zones\n");

        registry.register_with(
            Box::new(MemoryFactory),
            Err(dnssync_core::Error::config("CF_API_TOKEN is not set")),
        );
        assert_eq!(
            render_providers(&registry),
            "memory: unavailable (Configuration error: CF_API_TOKEN is not set)\n"
        );
    }

    #[tokio::test]
    async fn test_sync_applies_and_summarizes() {
        let source = MemoryZones::new([(
            "example.com".to_string(),
            vec![Record::parse("www 300 IN A 192.0.2.1").unwrap()],
        )]);
        let destination = MemoryZones::new([("example.com".to_string(), vec![])]);

        let (engine, events) = SyncEngine::new(
            Box::new(MemoryProvider::new("src", source)),
            Box::new(MemoryProvider::new("dst", destination.clone())),
            SyncConfig::default(),
        )
        .unwrap();
        let summary = sync(engine, events, &[]).await.unwrap();

        assert_eq!(summary.synced, vec![("example.com".to_string(), 1)]);
        assert!(!summary.has_failures());
        assert_eq!(destination.records("example.com").await.unwrap().len(), 1);
    }
}
