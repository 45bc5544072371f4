//! Ampgate CLI binary entry point.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal::unix::{signal, SignalKind};
use tracing_subscriber::EnvFilter;

use ampgate::auth::{CredentialManager, FileCredentialStore};
use ampgate::cli::{AuthCommands, Cli, Commands, RunArgs, SwitchCommands};
use ampgate::config::AmpgateConfig;
use ampgate::control::{ActivationLoop, ActivationState, ShutoffTimer};
use ampgate::source::{ActivitySource, BraviaTv, SpotifyPlayback};
use ampgate::switch::{KasaPlug, PowerSwitch, SwitchChain};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => handle_run(args).await,
        Commands::Status => handle_status().await,
        Commands::Auth(auth_args) => match auth_args.command {
            AuthCommands::Login => ampgate::cli::auth::handle_login().await,
            AuthCommands::Status => ampgate::cli::auth::handle_status().await,
            AuthCommands::Logout => ampgate::cli::auth::handle_logout().await,
        },
        Commands::Switch(switch_args) => handle_switch(switch_args.command).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Everything the commands talk to, built from one config.
struct Rig {
    manager: Arc<CredentialManager>,
    spotify: SpotifyPlayback,
    tv: BraviaTv,
    speakers: Arc<KasaPlug>,
    mixer: Arc<KasaPlug>,
    chain: Arc<SwitchChain>,
}

fn build_rig(config: &AmpgateConfig) -> Rig {
    let store = Arc::new(FileCredentialStore::new(config.credential_path.clone()));
    let manager = Arc::new(
        CredentialManager::new(
            store,
            config.client_id.clone(),
            config.client_secret.clone(),
            config.redirect_uri.clone(),
        )
        .with_http_timeout(config.http_timeout),
    );

    let spotify = SpotifyPlayback::new(manager.clone()).with_http_timeout(config.http_timeout);
    let tv = BraviaTv::new(&config.tv_addr).with_http_timeout(config.http_timeout);

    let speakers = Arc::new(KasaPlug::new("speakers", &config.speakers_addr));
    let mixer = Arc::new(KasaPlug::new("mixer", &config.mixer_addr));
    let chain = Arc::new(SwitchChain::new(
        mixer.clone(),
        speakers.clone(),
        config.settle_delay,
    ));

    Rig {
        manager,
        spotify,
        tv,
        speakers,
        mixer,
        chain,
    }
}

async fn handle_run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AmpgateConfig::from_env()?;
    if let Some(minutes) = args.idle_minutes {
        config.idle_minutes = minutes;
    }
    if let Some(secs) = args.tick_seconds {
        config.tick_interval = Duration::from_secs(secs);
    }
    config.validate()?;

    let rig = build_rig(&config);
    let timer = ShutoffTimer::new(chrono::Duration::minutes(config.idle_minutes as i64));

    let mut handle = ActivationLoop::new(rig.chain.clone(), timer)
        .with_source(Arc::new(rig.tv))
        .with_source(Arc::new(rig.spotify))
        .with_tick_interval(config.tick_interval)
        .with_recovery_interval(config.recovery_interval)
        .start()
        .await?;

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigusr1 = signal(SignalKind::user_defined1())?;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    // SIGUSR1 toggles the rig by hand without stopping the monitor.
    let finished = loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::info!("Interrupt received; shutting down");
                break None;
            }
            _ = sigterm.recv() => {
                tracing::info!("SIGTERM received; shutting down");
                break None;
            }
            _ = sigusr1.recv() => {
                match rig.chain.toggle().await {
                    Ok(on) => tracing::info!(powered = on, "Manual toggle applied"),
                    Err(err) => tracing::warn!(error = %err, "Manual toggle failed"),
                }
            }
            result = handle.wait() => break Some(result),
        }
    };

    match finished {
        Some(result) => result?,
        None => handle.shutdown().await?,
    }
    Ok(())
}

async fn handle_status() -> Result<(), Box<dyn std::error::Error>> {
    let config = AmpgateConfig::from_env()?;
    let rig = build_rig(&config);

    println!("🔎 Rig Status\n");

    let mut powered = false;
    match rig.speakers.is_on().await {
        Ok(on) => {
            powered = on;
            println!("  Speakers plug: {}", on_off(on));
        }
        Err(e) => println!("  Speakers plug: ⚠️  {e}"),
    }
    match rig.mixer.is_on().await {
        Ok(on) => println!("  Mixer plug: {}", on_off(on)),
        Err(e) => println!("  Mixer plug: ⚠️  {e}"),
    }

    let mut tv_on = false;
    match rig.tv.is_active().await {
        Ok(on) => {
            tv_on = on;
            println!("  TV: {}", on_off(on));
        }
        Err(e) => println!("  TV: ⚠️  {e}"),
    }

    let mut playing = false;
    match rig.manager.current()? {
        None => println!("  Spotify: ❌ Not logged in (run `ampgate auth login`)"),
        Some(_) => match rig.spotify.is_active().await {
            Ok(active) => {
                playing = active;
                println!("  Spotify: {}", if active { "✅ Playing" } else { "Idle" });
            }
            Err(e) => println!("  Spotify: ⚠️  {e}"),
        },
    }

    let active_source = if tv_on {
        Some(rig.tv.name().to_string())
    } else if playing {
        Some(rig.spotify.name().to_string())
    } else {
        None
    };
    let state = ActivationState {
        running: true,
        powered,
        active_source,
        shutoff_deadline: None,
    };
    println!("\n{}", state.status_message());

    Ok(())
}

async fn handle_switch(command: SwitchCommands) -> Result<(), Box<dyn std::error::Error>> {
    let config = AmpgateConfig::from_env()?;
    let rig = build_rig(&config);

    match command {
        SwitchCommands::On => {
            rig.chain.power_on().await?;
            println!("✅ Rig powered on (mixer, then speakers).");
        }
        SwitchCommands::Off => {
            rig.chain.power_off().await?;
            println!("✅ Rig powered off (speakers, then mixer).");
        }
        SwitchCommands::Toggle => {
            if rig.chain.toggle().await? {
                println!("✅ Rig toggled on.");
            } else {
                println!("✅ Rig toggled off.");
            }
        }
    }
    Ok(())
}

fn on_off(on: bool) -> &'static str {
    if on {
        "✅ On"
    } else {
        "Off"
    }
}
