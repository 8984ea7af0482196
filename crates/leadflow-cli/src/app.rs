use anyhow::{Context, Result};
use leadflow_application::{ReviewService, SessionCoordinator, TokioClock};
use leadflow_core::config::LeadflowConfig;
use leadflow_core::flow::{FlowEngine, TransitionTable};
use leadflow_core::notifier::Notifier;
use leadflow_infrastructure::{
    ConfigService, JsonDirSessionRepository, JsonDirTranscriptRepository, LeadflowPaths,
    LogNotifier, OutboxNotifier,
};
use std::path::Path;
use std::sync::Arc;

/// Fully wired application: file-backed storage, notifier and coordinator.
pub struct App {
    pub paths: LeadflowPaths,
    pub config: LeadflowConfig,
    pub coordinator: Arc<SessionCoordinator>,
    pub review: ReviewService,
}

impl App {
    /// Resolves the data directory and config, then builds every component.
    ///
    /// The data directory may itself come from the config file, so it is
    /// resolved twice: once to locate `config.toml`, once with the loaded
    /// `storage.data_dir` taken into account.
    pub async fn bootstrap(config_path: Option<&Path>, data_dir: Option<&Path>) -> Result<Self> {
        let initial = LeadflowPaths::resolve(data_dir)?;
        let config_file = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| initial.config_file());
        let config = ConfigService::new(&config_file)
            .load()
            .with_context(|| format!("failed to load config from {}", config_file.display()))?;

        let configured_dir = config
            .storage
            .data_dir
            .as_deref()
            .map(LeadflowPaths::expand_home);
        let paths = LeadflowPaths::resolve(data_dir.or(configured_dir.as_deref()))?;

        let sessions = Arc::new(JsonDirSessionRepository::new(paths.sessions_dir()).await?);
        let transcripts =
            Arc::new(JsonDirTranscriptRepository::new(paths.transcripts_dir()).await?);

        let notifier: Arc<dyn Notifier> = if config.notifier.staff_recipients.is_empty() {
            Arc::new(LogNotifier::new()?)
        } else {
            Arc::new(OutboxNotifier::new(
                paths.outbox_dir(),
                config.notifier.clone(),
            )?)
        };

        let table = TransitionTable::standard();
        table.validate().context("built-in transition table is invalid")?;
        let engine = FlowEngine::new(table, config.flow.reply_delay());

        let coordinator = Arc::new(SessionCoordinator::new(
            engine,
            sessions.clone(),
            transcripts.clone(),
            notifier,
            Arc::new(TokioClock),
            &config.flow,
        ));
        let review = ReviewService::new(
            sessions,
            transcripts,
            coordinator.channel().clone(),
            coordinator.dispatcher().clone(),
        );

        Ok(Self {
            paths,
            config,
            coordinator,
            review,
        })
    }
}
