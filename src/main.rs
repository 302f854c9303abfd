//! Help-desk assistant: application entry point.
//!
//! Startup sequence:
//! 1. Load `.env`, initialise logging, load (or create) `settings.toml`.
//! 2. Resolve tracker credentials from the environment (fail fast).
//! 3. Build a multi-threaded tokio runtime (2 workers).
//! 4. Load the Whisper model once (or install `NoModelStt`).
//! 5. Spawn the orchestrator task.
//! 6. Run the eframe window on the main thread (blocks until closed).

use std::sync::Arc;

use anyhow::Context;
use eframe::egui;
use tokio::sync::mpsc;

use helpdesk_assistant::{
    app::AssistantApp,
    config::{AppConfig, AppPaths, TrackerCredentials},
    issue::{GithubIssueClient, IssueTracker},
    llm::{ApiClient, LlmClient},
    pipeline::{new_shared_state, AssistantCommand, AssistantOrchestrator},
    stt::{find_model_by_id, ModelPaths, NoModelStt, SttEngine, TranscribeParams, WhisperEngine},
};

fn load_stt(config: &AppConfig, paths: &AppPaths) -> Arc<dyn SttEngine> {
    let Some(model) = find_model_by_id(&config.stt.model) else {
        log::warn!("Unknown STT model id {:?}; audio notes are disabled", config.stt.model);
        return Arc::new(NoModelStt::new(format!("unknown model id {:?}", config.stt.model)));
    };

    let model_path = ModelPaths::from_app_paths(paths).model_path(model);
    match WhisperEngine::load(&model_path, TranscribeParams::from_config(&config.stt)) {
        Ok(engine) => {
            log::info!("Whisper model loaded: {}", model_path.display());
            Arc::new(engine)
        }
        Err(e) => {
            log::warn!(
                "Could not load Whisper model ({}): {e}. Audio notes will report an error.",
                model_path.display()
            );
            Arc::new(NoModelStt::new(model_path.display().to_string()))
        }
    }
}

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let (w, h) = config.ui.window_size;
    let viewport = egui::ViewportBuilder::default()
        .with_title(&config.ui.title)
        .with_inner_size([w, h])
        .with_min_inner_size([420.0, 360.0])
        .with_drag_and_drop(true);

    eframe::NativeOptions {
        viewport,
        ..Default::default()
    }
}

fn main() -> anyhow::Result<()> {
    // A missing .env is normal; variables may come from the real environment.
    let dotenv = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match dotenv {
        Ok(path) => log::info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => log::debug!("No .env file found"),
        Err(e) => log::warn!("Ignoring unreadable .env file: {e}"),
    }
    log::info!("Help Desk Assistant starting up");

    let paths = AppPaths::new();
    let config = AppConfig::load_or_create().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e:#}); using defaults");
        AppConfig::default()
    });

    // ── Credentials (fail fast) ──────────────────────────────────────────
    let credentials = TrackerCredentials::from_env(&config.tracker).map_err(|e| {
        log::error!("Configuration error: {e}");
        e
    })?;
    log::info!("Issues will be filed in {}", credentials.repo);

    // ── tokio runtime ────────────────────────────────────────────────────
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    // ── Collaborators ────────────────────────────────────────────────────
    let stt = load_stt(&config, &paths);
    let llm: Arc<dyn LlmClient> = Arc::new(ApiClient::from_config(&config.llm));
    let tracker: Arc<dyn IssueTracker> =
        Arc::new(GithubIssueClient::new(&config.tracker, credentials));

    // ── Orchestrator ─────────────────────────────────────────────────────
    let state = new_shared_state();
    let (command_tx, command_rx) = mpsc::channel::<AssistantCommand>(16);
    let orchestrator = AssistantOrchestrator::new(Arc::clone(&state), stt, llm, tracker);
    rt.spawn(orchestrator.run(command_rx));

    // ── Window (main thread) ─────────────────────────────────────────────
    let app = AssistantApp::new(state, command_tx, config.clone());
    eframe::run_native(
        &config.ui.title,
        native_options(&config),
        Box::new(|_cc| Ok(Box::new(app))),
    )
    .map_err(|e| anyhow::anyhow!("window error: {e}"))?;

    log::info!("Help Desk Assistant shutting down");
    rt.shutdown_timeout(std::time::Duration::from_secs(2));
    Ok(())
}
