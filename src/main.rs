mod api;
mod app;
mod catalog;
mod cli;
mod collection;
mod config;
mod draft;
mod input;
mod manifest;
mod model;
mod panel;
mod session;
mod ui;
mod verify;

use anyhow::{Context, Result};
use api::{DeploymentApi, LoggingBackend, ResourceApi};
use app::{App, AppCommand};
use catalog::Catalog;
use clap::Parser;
use cli::CliArgs;
use config::{DEFAULT_VALIDATION_DELAY_MS, RuntimeConfigSnapshot, RuntimeConfigWatcher};
use crossterm::event::{
    Event, EventStream, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
    supports_keyboard_enhancement,
};
use draft::ValidationTicket;
use futures::StreamExt;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::fs::OpenOptions;
use std::io::{self, Stdout};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use verify::{StaticVerifier, VerificationResponse, Verifier};

type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;
/// Outcome routed back to the dialog (by id) and check (by ticket) that asked.
type VerificationEvent = (u64, ValidationTicket, Result<VerificationResponse, String>);
const CONFIG_RELOAD_INTERVAL: Duration = Duration::from_secs(2);

/// Collaborators the event loop talks to. The verifier is swapped when the
/// runtime config changes.
struct Services {
    verifier: Arc<dyn Verifier>,
    resources: Arc<dyn ResourceApi>,
    deployments: Arc<dyn DeploymentApi>,
    delay_override: Option<u64>,
}

impl Services {
    fn new(catalog: &Catalog, snapshot: &RuntimeConfigSnapshot, delay_override: Option<u64>) -> Self {
        let backend = Arc::new(LoggingBackend);
        Self {
            verifier: build_verifier(catalog, snapshot, delay_override),
            resources: backend.clone(),
            deployments: backend,
            delay_override,
        }
    }

    fn rebuild_verifier(&mut self, catalog: &Catalog, snapshot: &RuntimeConfigSnapshot) {
        self.verifier = build_verifier(catalog, snapshot, self.delay_override);
    }
}

/// Latency comes from the command line, then the config file, then the default.
fn build_verifier(
    catalog: &Catalog,
    snapshot: &RuntimeConfigSnapshot,
    delay_override: Option<u64>,
) -> Arc<dyn Verifier> {
    let delay_ms = delay_override
        .or(snapshot.validation_delay_ms)
        .unwrap_or(DEFAULT_VALIDATION_DELAY_MS);
    debug!("verifier latency set to {delay_ms}ms");
    Arc::new(StaticVerifier::new(
        Duration::from_millis(delay_ms),
        catalog.builtin_templates.clone(),
        catalog.deploy_targets(),
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(&args.log_filter, args.log_file.as_deref())?;

    let mut watcher = RuntimeConfigWatcher::discover();
    let snapshot = match watcher.load_current() {
        Ok(snapshot) => snapshot,
        Err(error) => {
            warn!("runtime config ignored: {error:#}");
            RuntimeConfigSnapshot::default()
        }
    };

    let mut app = App::new(Catalog::fixtures(), args.user.clone());
    if snapshot.source.is_some() {
        app.apply_runtime_config(&snapshot);
    }
    let mut services = Services::new(app.catalog(), &snapshot, args.validation_delay_ms);
    info!("h4deck started");

    run(&mut app, &mut services, &mut watcher).await
}

fn init_tracing(level_filter: &str, log_file: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_new(level_filter)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("failed to initialize tracing filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_ansi(false);

    // The terminal belongs to the UI, so logs go to a file or nowhere.
    // try_init only fails when a global subscriber is already installed, in
    // which case that one keeps receiving events.
    let _ = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {path}"))?;
            builder.with_writer(Mutex::new(file)).try_init()
        }
        None => builder.with_writer(std::io::sink).try_init(),
    };

    Ok(())
}

async fn run(
    app: &mut App,
    services: &mut Services,
    watcher: &mut RuntimeConfigWatcher,
) -> Result<()> {
    let (mut terminal, keyboard_enhanced) = init_terminal()?;
    let run_result = run_loop(&mut terminal, app, services, watcher).await;
    let restore_result = restore_terminal(&mut terminal, keyboard_enhanced);

    match (run_result, restore_result) {
        (Err(run_error), Err(restore_error)) => Err(anyhow::anyhow!(
            "{run_error:#}\nterminal restore error: {restore_error:#}"
        )),
        (Err(error), _) => Err(error),
        (_, Err(error)) => Err(error),
        (Ok(()), Ok(())) => Ok(()),
    }
}

fn init_terminal() -> Result<(TuiTerminal, bool)> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    let keyboard_enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
    if keyboard_enhanced {
        execute!(
            stdout,
            EnterAlternateScreen,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_ALTERNATE_KEYS
            )
        )
        .context("failed to enter alternate screen with keyboard enhancement")?;
    } else {
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().context("failed to clear terminal")?;
    Ok((terminal, keyboard_enhanced))
}

fn restore_terminal(terminal: &mut TuiTerminal, keyboard_enhanced: bool) -> Result<()> {
    if keyboard_enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)
            .context("failed to pop keyboard enhancement flags")?;
    }
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

async fn run_loop(
    terminal: &mut TuiTerminal,
    app: &mut App,
    services: &mut Services,
    watcher: &mut RuntimeConfigWatcher,
) -> Result<()> {
    let mut reader = EventStream::new();
    let mut config_ticker = interval(CONFIG_RELOAD_INTERVAL);
    config_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let (verify_tx, mut verify_rx) = mpsc::unbounded_channel::<VerificationEvent>();

    loop {
        terminal
            .draw(|frame| ui::render(frame, app))
            .context("failed to render terminal frame")?;

        if !app.running() {
            break;
        }

        tokio::select! {
            maybe_event = reader.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        if let Some(action) = input::map_key(app.mode(), key) {
                            debug!("action={action:?}");
                            let command = app.apply_action(action);
                            if !matches!(command, AppCommand::None) {
                                terminal
                                    .draw(|frame| ui::render(frame, app))
                                    .context("failed to render terminal frame")?;
                            }
                            execute_app_command(app, services, command, &verify_tx).await;
                        }
                    }
                    Some(Ok(Event::Resize(_, _))) => {}
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        app.set_status(format!("terminal event error: {error}"));
                    }
                    None => {
                        app.set_status("terminal event stream closed");
                        break;
                    }
                }
            }
            _ = config_ticker.tick() => {
                match watcher.reload_if_changed() {
                    Ok(Some(snapshot)) => {
                        info!(
                            "runtime config reloaded from {}",
                            snapshot.source.as_deref().unwrap_or("defaults")
                        );
                        app.apply_runtime_config(&snapshot);
                        services.rebuild_verifier(app.catalog(), &snapshot);
                    }
                    Ok(None) => {}
                    Err(error) => {
                        warn!("runtime config reload failed: {error:#}");
                        app.set_status(format!("Config reload failed: {}", compact_error(&error)));
                    }
                }
            }
            maybe_outcome = verify_rx.recv() => {
                if let Some((dialog, ticket, outcome)) = maybe_outcome {
                    app.apply_verification(dialog, ticket, outcome);
                }
            }
        }
    }

    Ok(())
}

async fn execute_app_command(
    app: &mut App,
    services: &Services,
    command: AppCommand,
    verify_tx: &mpsc::UnboundedSender<VerificationEvent>,
) {
    match command {
        AppCommand::None => {}
        AppCommand::Verify {
            dialog,
            ticket,
            request,
        } => {
            let verifier = Arc::clone(&services.verifier);
            let tx = verify_tx.clone();
            tokio::spawn(async move {
                let outcome = verifier
                    .verify(&request)
                    .await
                    .map_err(|error| compact_error(&error));
                if tx.send((dialog, ticket, outcome)).is_err() {
                    debug!("verification for {:?} finished after shutdown", ticket.target);
                }
            });
        }
        AppCommand::Bulk(request) => match services.resources.apply(&request).await {
            Ok(outcome) => {
                info!("bulk {} affected {}", request.action.label(), outcome.affected);
                app.set_status(outcome.message);
            }
            Err(error) => {
                warn!("bulk {} failed: {error:#}", request.action.label());
                app.set_status(format!(
                    "Bulk {} failed: {}",
                    request.action.label(),
                    compact_error(&error)
                ));
            }
        },
        AppCommand::SubmitDeployment(payload) => {
            match services.deployments.deploy(&payload).await {
                Ok(receipt) => {
                    info!("deployment accepted for {}", receipt.application);
                    app.set_status(receipt.message);
                }
                Err(error) => {
                    warn!("deployment rejected: {error:#}");
                    app.set_status(format!("Deployment failed: {}", compact_error(&error)));
                }
            }
        }
    }
}

fn compact_error(error: &anyhow::Error) -> String {
    let mut out = Vec::new();
    for (index, cause) in error.chain().enumerate() {
        if index == 0 {
            out.push(cause.to_string());
        } else if index <= 2 {
            out.push(format!("caused by: {cause}"));
        } else {
            break;
        }
    }

    out.join(": ")
}

#[cfg(test)]
mod tests {
    use super::{Services, compact_error};
    use crate::catalog::Catalog;
    use crate::config::RuntimeConfigSnapshot;
    use crate::verify::{VerificationKind, VerificationRequest, Verifier};
    use anyhow::anyhow;

    #[test]
    fn compact_error_keeps_two_causes() {
        let error = anyhow!("root")
            .context("middle")
            .context("outer")
            .context("top");
        assert_eq!(
            compact_error(&error),
            "top: caused by: outer: caused by: middle"
        );
    }

    #[tokio::test]
    async fn verifier_follows_catalog_targets() {
        let catalog = Catalog::fixtures();
        let services = Services::new(&catalog, &RuntimeConfigSnapshot::default(), Some(0));
        let unknown = services
            .verifier
            .verify(&VerificationRequest {
                kind: VerificationKind::Cluster,
                identifier: "DR".to_string(),
            })
            .await
            .expect("verify");
        assert!(!unknown.ok);

        let response = services
            .verifier
            .verify(&VerificationRequest {
                kind: VerificationKind::Cluster,
                identifier: "SIT".to_string(),
            })
            .await
            .expect("verify");
        assert!(response.ok);
    }
}
