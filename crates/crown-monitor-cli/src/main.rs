//! # crown-monitor-cli
//!
//! Command-line dashboard for the Neurosity Crown monitor backend:
//! connect/disconnect the headset, watch live push events, drive
//! recordings, and browse or download recorded sessions.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;

use crown_monitor::{
    BackendTransport, ConnectionController, DeviceStatus, EventSocket, MonitorConfig,
    MonitorResult, PushEvent, SessionTimestamp, StatusPoll,
};

/// Command-line dashboard for the Crown monitor backend.
#[derive(Parser)]
#[command(name = "crown-monitor-cli", version, about)]
struct Cli {
    /// Path to crown-monitor.toml config file
    #[arg(short, long)]
    config: Option<String>,

    /// Backend URL override
    #[arg(long)]
    url: Option<String>,

    /// Enable verbose logging (set RUST_LOG for fine-grained control)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the backend's status snapshot
    Status,

    /// Connect the headset and wait for monitoring to start
    Connect,

    /// Disconnect the headset
    Disconnect,

    /// List recorded sessions
    Sessions {
        /// Case-insensitive substring filter
        #[arg(short, long)]
        filter: Option<String>,

        /// Number of pages to show
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },

    /// Download a recorded session file
    Download {
        /// Session file name as listed by `sessions`
        filename: String,

        /// Output path (defaults to the session file name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Record a session (Ctrl-C or --duration to stop)
    Record {
        /// Stop automatically after this many seconds
        #[arg(long)]
        duration: Option<u64>,
    },

    /// Stream push events to the terminal until Ctrl-C
    Watch,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("crown_monitor=debug,crown_monitor_cli=debug")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("crown_monitor=warn")
            .init();
    }

    let mut config = MonitorConfig::discover(cli.config.as_deref().map(Path::new))?;
    if let Some(url) = cli.url {
        let mut fresh = MonitorConfig::new(url);
        fresh.timeouts = config.timeouts.clone();
        fresh.status_poll = config.status_poll.clone();
        fresh.sessions = config.sessions.clone();
        config = fresh;
    }

    match cli.command {
        Command::Status => cmd_status(&config).await?,
        Command::Connect => cmd_connect(&config).await?,
        Command::Disconnect => cmd_disconnect(&config).await?,
        Command::Sessions { filter, pages } => cmd_sessions(&config, filter, pages).await?,
        Command::Download { filename, output } => cmd_download(&config, &filename, output).await?,
        Command::Record { duration } => cmd_record(&config, duration).await?,
        Command::Watch => cmd_watch(&config).await?,
    }

    Ok(())
}

/// Controller without an event socket, for one-shot REST commands.
fn rest_controller(config: &MonitorConfig) -> MonitorResult<ConnectionController<BackendTransport>> {
    let transport = BackendTransport::new(config)?;
    Ok(ConnectionController::new(transport, config))
}

/// Controller plus a live event socket, for commands that need push
/// events or push commands.
async fn live_controller(
    config: &MonitorConfig,
) -> MonitorResult<(ConnectionController<BackendTransport>, EventSocket)> {
    let socket = EventSocket::connect(&config.socket_url).await?;
    let mut transport = BackendTransport::new(config)?;
    transport.attach_socket(socket.command_sender());
    let mut controller = ConnectionController::new(transport, config);
    controller.refresh_status().await?;
    Ok((controller, socket))
}

// ─── Commands ───────────────────────────────────────────────────────────

async fn cmd_status(config: &MonitorConfig) -> MonitorResult<()> {
    let mut controller = rest_controller(config)?;
    let snapshot = controller.refresh_status().await?;

    let on_off = |flag: bool| if flag { "yes".green() } else { "no".red() };
    println!("Backend:    {}", config.base_url.cyan());
    println!("Connected:  {}", on_off(snapshot.connected));
    println!("Monitoring: {}", on_off(snapshot.monitoring));
    println!("Recording:  {}", on_off(snapshot.recording));
    println!("Healthy:    {}", on_off(snapshot.connection_health));
    println!("Sessions:   {}", snapshot.sessions_count);
    print_device_status(&snapshot.device_status);
    Ok(())
}

async fn cmd_connect(config: &MonitorConfig) -> MonitorResult<()> {
    let (mut controller, mut socket) = live_controller(config).await?;

    if controller.is_connected() {
        println!("{}", "Headset already connected.".yellow());
        return Ok(());
    }

    println!("Connecting (device detection can take up to 20s)...");
    let response = controller.connect().await?;
    if let Some(message) = response.message {
        println!("{} {message}", "Connected:".green());
    } else {
        println!("{}", "Connected.".green());
    }

    // Monitoring starts on the backend's confirmation, not ours.
    let wait = Duration::from_secs(5);
    let confirmed = tokio::time::timeout(wait, async {
        while let Some(event) = socket.recv().await {
            controller.apply_event(event);
            if controller.is_monitoring() {
                return true;
            }
        }
        false
    })
    .await
    .unwrap_or(false);

    if confirmed {
        println!("{}", "Monitoring started.".green());
    } else {
        println!("{}", "Monitoring not confirmed yet; check `status`.".yellow());
    }
    print_device_status(&controller.state().device_status);
    Ok(())
}

async fn cmd_disconnect(config: &MonitorConfig) -> MonitorResult<()> {
    let (mut controller, _socket) = live_controller(config).await?;

    if !controller.is_connected() {
        println!("{}", "Headset is not connected.".yellow());
        return Ok(());
    }
    if controller.is_recording() {
        println!(
            "{}",
            "A recording is in progress; stop it before disconnecting.".red()
        );
        return Ok(());
    }

    controller.disconnect().await?;
    println!("{}", "Disconnected.".green());
    Ok(())
}

async fn cmd_sessions(
    config: &MonitorConfig,
    filter: Option<String>,
    pages: usize,
) -> MonitorResult<()> {
    let mut controller = rest_controller(config)?;
    let total = controller.refresh_sessions().await?;

    if let Some(term) = filter {
        controller.sessions_mut().filter(&term);
    }
    for _ in 1..pages {
        controller.sessions_mut().next_page();
    }

    let store = controller.sessions();
    if store.is_empty() {
        println!("No sessions{}.", if total > 0 { " match" } else { "" });
        return Ok(());
    }

    for name in store.visible() {
        match SessionTimestamp::parse(name) {
            Some(stamp) => println!("{}  {}", stamp.to_string().dimmed(), name),
            None => println!("{}  {}", "                ".dimmed(), name),
        }
    }
    if store.has_more() {
        println!(
            "{}",
            format!(
                "... {} of {} shown (use --pages to see more)",
                store.visible().len(),
                store.len()
            )
            .dimmed()
        );
    }
    Ok(())
}

async fn cmd_download(
    config: &MonitorConfig,
    filename: &str,
    output: Option<PathBuf>,
) -> MonitorResult<()> {
    let mut controller = rest_controller(config)?;
    let bytes = controller.download_session(filename).await?;

    let path = output.unwrap_or_else(|| PathBuf::from(filename));
    std::fs::write(&path, &bytes)?;
    println!(
        "{} {} ({} bytes)",
        "Saved".green(),
        path.display(),
        bytes.len()
    );
    Ok(())
}

async fn cmd_record(config: &MonitorConfig, duration: Option<u64>) -> MonitorResult<()> {
    let (mut controller, mut socket) = live_controller(config).await?;

    let connected_here = if controller.is_connected() {
        false
    } else {
        println!("Connecting (device detection can take up to 20s)...");
        controller.connect().await?;
        true
    };

    if controller.is_recording() {
        println!("{}", "A recording is already in progress.".yellow());
        return Ok(());
    }

    controller.toggle_recording().await?;
    match duration {
        Some(secs) => {
            println!("{} recording for {secs}s...", "Started".green());
            tokio::select! {
                () = tokio::time::sleep(Duration::from_secs(secs)) => {}
                _ = tokio::signal::ctrl_c() => {
                    println!("\nInterrupted, stopping early.");
                }
            }
        }
        None => {
            println!("{} recording; press Ctrl-C to stop.", "Started".green());
            let _ = tokio::signal::ctrl_c().await;
        }
    }

    // Keep reconciling while we wind down, in case the backend already
    // stopped the recording on its own.
    while let Ok(Some(event)) =
        tokio::time::timeout(Duration::from_millis(100), socket.recv()).await
    {
        controller.apply_event(event);
    }

    if controller.is_recording() {
        let response = controller.toggle_recording().await?;
        match response.session_file {
            Some(file) => println!("{} {file}", "Recording saved:".green()),
            None => println!("{}", "Recording stopped.".green()),
        }
    } else {
        println!("{}", "Recording was already stopped by the backend.".yellow());
    }

    if connected_here {
        controller.disconnect().await?;
        println!("Disconnected.");
    }
    Ok(())
}

async fn cmd_watch(config: &MonitorConfig) -> MonitorResult<()> {
    let (mut controller, mut socket) = live_controller(config).await?;
    let transport_sender = socket.command_sender();
    let mut poll = StatusPoll::start(transport_sender, &config.status_poll);

    println!("Watching push events; press Ctrl-C to exit.\n");
    loop {
        tokio::select! {
            maybe_event = socket.recv() => {
                let Some(event) = maybe_event else {
                    println!("{}", "Event socket closed by backend.".red());
                    break;
                };
                print_event(&event);
                controller.apply_event(event);
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\nExiting.");
                break;
            }
        }
    }

    poll.stop().await;
    socket.close().await;
    Ok(())
}

// ─── Output helpers ─────────────────────────────────────────────────────

fn print_device_status(status: &DeviceStatus) {
    println!(
        "Device:     online={} battery={} signal={} validated={}",
        if status.online { "yes".green() } else { "no".red() },
        status.battery,
        status.signal.as_str(),
        if status.validation.is_confirmed() {
            "yes".green()
        } else {
            "no".yellow()
        },
    );
}

fn print_event(event: &PushEvent) {
    match event {
        PushEvent::Status(s) => println!(
            "{} connected={} monitoring={} recording={}",
            "status".cyan(),
            s.connected,
            s.monitoring,
            s.recording
        ),
        PushEvent::StatusUpdate(u) => println!(
            "{} connected={} monitoring={} battery={}",
            "status_update".cyan(),
            u.connected,
            u.monitoring,
            u.device_status.battery
        ),
        PushEvent::MonitoringStarted => println!("{}", "monitoring_started".green()),
        PushEvent::MonitoringStopped => println!("{}", "monitoring_stopped".yellow()),
        PushEvent::ConnectionWarning { message } => {
            println!("{} {message}", "connection_warning".red());
        }
        PushEvent::ConnectionRestored { message } => {
            println!("{} {message}", "connection_restored".green());
        }
        PushEvent::DeviceStatusResponse(status) => {
            println!("{}", "device_status_response".cyan());
            print_device_status(status);
        }
        PushEvent::BackendError { message } => {
            println!("{} {message}", "error".red());
        }
    }
}
