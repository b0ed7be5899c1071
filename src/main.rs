use anyhow::Context;
use lore::{
    AppState, ArtifactBuilder, ConfigManager, JobCoordinator, LLMClient, LlmReasoner, LoreConfig,
    Provider, ResearchPipeline, WikipediaClient,
    api::routes::create_router,
    cli::{Cli, Commands, output::Output, print_config},
    utils::toml_config::ServerConfig,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // API keys may live in .env
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = cli.output();

    match cli.command {
        Some(Commands::Config { validate }) => run_config(&cli, &output, validate),
        None => serve(&cli, &output).await,
    }
}

fn run_config(cli: &Cli, output: &Output, validate: bool) -> anyhow::Result<()> {
    match LoreConfig::load_or_default(&cli.config) {
        Ok(config) => {
            print_config(output, &cli.config, &config);
            if validate {
                output.success("Configuration is valid");
            }
            Ok(())
        }
        Err(e) if validate => {
            output.error(&e.to_string());
            Err(e).context("configuration is invalid")
        }
        Err(e) => {
            output.warning(&format!("Configuration is invalid: {}", e));
            Ok(())
        }
    }
}

fn init_tracing(server: &ServerConfig, verbose: bool) {
    let fallback = if verbose { "debug" } else { server.log_level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if server.log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn serve(cli: &Cli, output: &Output) -> anyhow::Result<()> {
    output.banner();

    let manager = ConfigManager::new(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    let manager = Arc::new(manager);
    let config = manager.config();

    init_tracing(&config.server, cli.verbose);

    if cli.config.exists() {
        if let Err(e) = manager.start_watching() {
            tracing::warn!(error = %e, "Config hot reload unavailable");
        }
    }

    let provider = Provider::from_config(&config.llm)?;
    let llm = provider.create_client(config.llm.request_timeout())?;
    tracing::info!(provider = provider.name(), model = llm.model_name(), "LLM client ready");

    let reasoner = Arc::new(LlmReasoner::from_config(llm, &config.llm));
    let knowledge = Arc::new(WikipediaClient::from_config(&config.knowledge)?);
    let pipeline = ResearchPipeline::new(
        reasoner,
        knowledge,
        ArtifactBuilder::default(),
        manager.clone(),
    );

    let coordinator = JobCoordinator::start(Arc::new(pipeline), &config.jobs);

    let state = AppState {
        config: manager.clone(),
        coordinator,
    };
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    output.success(&format!("Listening on http://{}", addr));
    output.hint("POST /jobs with a multipart 'prompt' field to start a research job");
    tracing::info!(address = %addr, "Server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
