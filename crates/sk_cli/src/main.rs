use clap::{Args, Parser, Subcommand};
use sk_core::{Error, LanguageModel, Result};
use sk_inference::{create_model, ModelKind, DEFAULT_MODEL_NAME};
use sk_scrapers::{create_fetcher, ArticleManager, FetchConfig, FetcherKind};
use sk_storage::{create_storage, Storage};
use sk_web::AppState;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

mod duration;
mod logging;

use duration::HumanDuration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Save links and get AI summaries of them", long_about = None)]
pub struct Cli {
    /// Log filter, e.g. `info` or `sk_scrapers=debug,info`
    #[arg(long, global = true, env = "RUST_LOG", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve {
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        pipeline: PipelineArgs,
        #[arg(long, env = "HOST", default_value = "0.0.0.0")]
        host: IpAddr,
        #[arg(long, env = "PORT", default_value_t = 3000)]
        port: u16,
    },
    /// Save one URL for a user and print the stored article
    Summarize {
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        pipeline: PipelineArgs,
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        url: String,
    },
    /// Print a user's articles, newest first
    Articles {
        #[command(flatten)]
        store: StoreArgs,
        #[arg(long)]
        user_id: String,
    },
}

#[derive(Args, Debug)]
struct StoreArgs {
    /// `sqlite://path.db` or `memory://`
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
}

#[derive(Args, Debug)]
struct PipelineArgs {
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,

    /// Language model: gemini or dummy
    #[arg(long, env = "SK_MODEL", default_value = "gemini")]
    model: ModelKind,

    #[arg(long, env = "SK_MODEL_NAME", default_value = DEFAULT_MODEL_NAME)]
    model_name: String,

    /// Page fetcher: browser (renders JavaScript) or http
    #[arg(long, env = "SK_FETCHER", default_value = "browser")]
    fetcher: FetcherKind,

    /// Page load timeout (e.g. 30s, 1m)
    #[arg(long, env = "SK_FETCH_TIMEOUT", default_value = "30s")]
    fetch_timeout: HumanDuration,

    #[arg(long, env = "CHROME_PATH")]
    chrome_path: Option<PathBuf>,

    /// Launch the browser without its sandbox (needed in most containers)
    #[arg(long, env = "SK_NO_SANDBOX")]
    no_sandbox: bool,
}

async fn open_storage(args: &StoreArgs) -> Result<Storage> {
    let storage = create_storage(&args.database_url).await?;
    info!("🏦 Storage backend initialized successfully (using {})", storage.backend);
    Ok(storage)
}

/// A missing API key only disables summarizing, the rest keeps working.
fn build_model(args: &PipelineArgs) -> Result<Option<Arc<dyn LanguageModel>>> {
    let config = sk_inference::Config {
        kind: args.model,
        api_key: args.gemini_api_key.clone(),
        model_name: args.model_name.clone(),
        ..sk_inference::Config::default()
    };
    match create_model(&config) {
        Ok(model) => Ok(Some(model)),
        Err(Error::ConfigMissing(reason)) => {
            warn!("⚠️ {}; saving articles will fail until it is set", reason);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn build_manager(storage: &Storage, args: &PipelineArgs) -> Result<ArticleManager> {
    let fetch_config = FetchConfig {
        timeout: args.fetch_timeout.0,
        chrome_executable: args.chrome_path.clone(),
        no_sandbox: args.no_sandbox,
        ..FetchConfig::default()
    };
    let fetcher = create_fetcher(args.fetcher, fetch_config)?;
    let model = build_model(args)?;
    Ok(ArticleManager::new(storage.articles.clone(), fetcher, model))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level);

    match cli.command {
        Commands::Serve { store, pipeline, host, port } => {
            let storage = open_storage(&store).await?;
            let manager = build_manager(&storage, &pipeline)?;
            let state = AppState::new(manager, storage.users.clone());
            sk_web::serve(SocketAddr::new(host, port), state).await?;
        }
        Commands::Summarize { store, pipeline, user_id, url } => {
            let storage = open_storage(&store).await?;
            let manager = build_manager(&storage, &pipeline)?;
            let (article, status) = manager.save_url(&user_id, &url).await?;
            info!("Article {} is {:?}", article.id, status);
            println!("{}", serde_json::to_string_pretty(&article)?);
        }
        Commands::Articles { store, user_id } => {
            let storage = open_storage(&store).await?;
            let articles = storage.articles.list_by_user(user_id.trim()).await?;
            println!("{}", serde_json::to_string_pretty(&articles)?);
        }
    }

    Ok(())
}
