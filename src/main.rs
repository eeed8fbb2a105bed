use std::sync::Arc;

use anyhow::Context;
use startup_survey::api::{ApiState, survey_routes};
use startup_survey::bot::SurveyBot;
use startup_survey::channels::{Channel, CliChannel, TelegramChannel};
use startup_survey::config::{self, ApiConfig, BotConfig};
use startup_survey::llm::{LlmBackend, LlmConfig, create_provider};
use startup_survey::scoring::{HttpScoringClient, ScoringOrchestrator};

/// Which halves of the service this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Scoring HTTP server only.
    Api,
    /// Chat bot only, talking to a remote scoring server.
    Bot,
    /// Both, in one runtime.
    All,
}

impl Mode {
    fn from_arg(arg: Option<&str>) -> anyhow::Result<Self> {
        match arg {
            None | Some("all") => Ok(Self::All),
            Some("api") => Ok(Self::Api),
            Some("bot") => Ok(Self::Bot),
            Some(other) => anyhow::bail!("unknown mode '{other}', expected api, bot or all"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let mode = Mode::from_arg(std::env::args().nth(1).as_deref())?;

    eprintln!("📋 Startup Survey v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Mode: {:?}", mode);

    // ── Scoring API ─────────────────────────────────────────────────────
    let api_task = if mode == Mode::Bot {
        None
    } else {
        let config = ApiConfig::from_env().context("scoring server configuration")?;

        let llm = create_provider(&LlmConfig {
            backend: LlmBackend::OpenAi,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            timeout: config.llm_timeout,
        });
        let orchestrator = ScoringOrchestrator::new(llm)
            .with_call_timeout(config.llm_timeout)
            .with_max_tokens(config.max_tokens);

        let app = survey_routes(ApiState {
            scorer: Arc::new(orchestrator),
        });
        let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
            .await
            .with_context(|| format!("failed to bind survey API port {}", config.port))?;

        eprintln!("   Model: {}", config.model);
        eprintln!("   Survey API: http://0.0.0.0:{}/survey", config.port);
        tracing::info!(port = config.port, "Survey API started");

        Some(tokio::spawn(async move { axum::serve(listener, app).await }))
    };

    // A server that stops or fails ends the process in every mode.
    let api = async move {
        match api_task {
            Some(task) => task.await,
            None => std::future::pending().await,
        }
    };

    if mode == Mode::Api {
        tokio::select! {
            result = api => result.context("survey API task panicked")?.context("survey API failed")?,
            _ = tokio::signal::ctrl_c() => tracing::info!("Shutting down"),
        }
        return Ok(());
    }

    // ── Chat bot ────────────────────────────────────────────────────────
    tokio::select! {
        result = api => result.context("survey API task panicked")?.context("survey API failed")?,
        result = run_bot(config::api_port()?) => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("Shutting down"),
    }

    Ok(())
}

/// Run the chat bot on Telegram, or on stdin/stdout when no token is set.
async fn run_bot(api_port: u16) -> startup_survey::error::Result<()> {
    let bot_config = BotConfig::from_env(api_port)?;

    let channel: Arc<dyn Channel> = match bot_config.telegram_token.clone() {
        Some(token) => {
            let allowed = &bot_config.allowed_users;
            eprintln!(
                "   Telegram: enabled (allowed: {})",
                if allowed.iter().any(|u| u == "*") {
                    "everyone".to_string()
                } else {
                    allowed.join(", ")
                }
            );
            Arc::new(TelegramChannel::new(token, allowed.clone()))
        }
        None => {
            eprintln!("   Telegram: disabled (TELEGRAM_BOT_TOKEN not set), using CLI");
            Arc::new(CliChannel::new())
        }
    };

    if let Err(e) = channel.health_check().await {
        tracing::warn!(channel = channel.name(), error = %e, "Channel health check failed");
    }

    eprintln!("   Scoring endpoint: {}\n", bot_config.survey_api_url);
    let scorer = Arc::new(HttpScoringClient::new(
        bot_config.survey_api_url.clone(),
        bot_config.survey_api_timeout,
    ));

    SurveyBot::new(channel, scorer)
        .with_idle_timeout(bot_config.session_idle_timeout)
        .run()
        .await?;
    Ok(())
}
