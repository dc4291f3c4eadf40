use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use mtb_core::{
    config::Config,
    faq::FaqData,
    modal::config::{ModalRegistry, ModalsConfig},
    ports::ModalProvider,
};
use mtb_discord::{
    commands::CommandRegistrar,
    router::AppState,
    server::{self, ServerState, SignatureVerifier, INITIAL_RESPONSE_TIMEOUT},
    DiscordResponder,
};
use mtb_github::GithubClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    mtb_core::logging::init("mtb")?;

    let cfg = Config::load()?;

    let github = Arc::new(
        GithubClient::new(&cfg.github_token, &cfg.github_api_base, cfg.github_timeout)
            .context("failed to create GitHub client")?,
    );

    let modals_config = ModalsConfig::load(&cfg.config_path)
        .with_context(|| format!("failed to load {}", cfg.config_path.display()))?;
    info!(modals = modals_config.modals.len(), "loaded modal configuration");
    let modals = Arc::new(ModalRegistry::new(
        modals_config,
        github.clone(),
        cfg.default_repository.clone(),
    ));
    let default_repo = modals
        .default_repository()
        .context("no default repository: set GITHUB_REPOSITORY or configure a modal repository")?;

    let faq = match FaqData::load(&cfg.faq_path) {
        Ok(faq) => Some(faq),
        Err(e) => {
            warn!(path = %cfg.faq_path.display(), "FAQ data unavailable: {e}");
            None
        }
    };

    let responder = Arc::new(DiscordResponder::new(
        cfg.application_id.clone(),
        cfg.github_timeout,
    )?);
    let app = Arc::new(AppState::new(
        github,
        modals,
        responder.clone(),
        faq,
        default_repo,
        cfg.release_cache_ttl,
        cfg.comparison_cache_ttl,
    ));

    let ready = Arc::new(AtomicBool::new(false));
    let state = Arc::new(ServerState {
        app,
        responder,
        verifier: SignatureVerifier::from_hex(&cfg.public_key)?,
        ready: ready.clone(),
        response_timeout: INITIAL_RESPONSE_TIMEOUT,
    });

    let shutdown = CancellationToken::new();
    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.healthcheck_port));
    let server = tokio::spawn(server::serve(addr, state, shutdown.clone()));

    let registrar = CommandRegistrar::new(
        &cfg.discord_token,
        cfg.application_id.clone(),
        cfg.server_id.clone(),
        cfg.github_timeout,
    )?;
    registrar
        .register_all()
        .await
        .context("failed to register commands")?;
    ready.store(true, Ordering::SeqCst);
    info!("Bot is running. Press Ctrl+C to exit.");

    wait_for_signal().await;
    info!("shutting down");
    shutdown.cancel();

    if cfg.remove_commands {
        if let Err(e) = registrar.remove_all().await {
            error!("failed to remove commands: {e}");
        }
    }

    server.await.context("http server task panicked")??;
    Ok(())
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
                return;
            }
            Err(e) => warn!("cannot listen for SIGTERM: {e}"),
        }
    }
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("cannot listen for Ctrl+C: {e}");
    }
}
