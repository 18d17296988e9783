use std::net::SocketAddr;
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use tokio::sync::RwLock;
use tracing_subscriber::EnvFilter;

use tabskel::model::{BackendConfig, ConfigUpdate, Grid, Skeleton, TableListItem, TaskDetail};

#[path = "tabskel_server/http_error.rs"]
mod http_error;
use self::http_error::*;
#[path = "tabskel_server/persistence.rs"]
mod persistence;
use self::persistence::*;
#[path = "tabskel_server/discovery.rs"]
mod discovery;
use self::discovery::*;
#[path = "tabskel_server/table_files.rs"]
mod table_files;
use self::table_files::*;
#[path = "tabskel_server/llm.rs"]
mod llm;
#[path = "tabskel_server/paper_context.rs"]
mod paper_context;
#[path = "tabskel_server/preannotate.rs"]
mod preannotate;
use self::preannotate::*;
#[path = "tabskel_server/handlers_tables.rs"]
mod handlers_tables;
use self::handlers_tables::*;
#[path = "tabskel_server/handlers_config.rs"]
mod handlers_config;
use self::handlers_config::*;

struct AppState {
    data_dir: PathBuf,
    settings: RwLock<Settings>,
    http: reqwest::Client,
}

/// Runtime configuration; persisted to `<data-dir>/config.json`.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
struct Settings {
    root_dir: PathBuf,

    #[serde(default)]
    llm_base_url: Option<String>,

    #[serde(default)]
    llm_model: Option<String>,

    #[serde(default)]
    llm_api_key: Option<String>,
}

impl Settings {
    fn public(&self) -> BackendConfig {
        BackendConfig {
            root_dir: self.root_dir.display().to_string(),
            llm_base_url: self.llm_base_url.clone(),
            llm_model: self.llm_model.clone(),
            llm_key_set: self.llm_api_key.is_some(),
        }
    }
}

#[derive(Parser)]
#[command(name = "tabskel-server")]
#[command(about = "Serves table grids, skeletons and suggestions to tabskel clients", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8000")]
    addr: SocketAddr,

    /// Write bound address to this file (dev/test convenience)
    #[arg(long)]
    addr_file: Option<PathBuf>,

    /// Directory scanned for `<paper>_<tableN>.csv` files (default: current directory)
    #[arg(long)]
    root_dir: Option<PathBuf>,

    /// Where runtime configuration is kept
    #[arg(long, default_value = "./tabskel-data")]
    data_dir: PathBuf,

    /// OpenAI-compatible API base URL for suggestions
    #[arg(long)]
    llm_base_url: Option<String>,

    /// Model used for suggestions
    #[arg(long)]
    llm_model: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Draft grids and skeletons for a paper's table images with the model
    Preannotate(PreannotateArgs),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent("tabskel-server")
        .build()
        .context("build reqwest client")
}

async fn run() -> Result<()> {
    let args = Args::parse();
    if let Some(Command::Preannotate(pre)) = &args.command {
        let settings = load_settings(&args.data_dir)
            .context("load settings")?
            .unwrap_or_default();
        let llm = resolve_llm(pre.model.as_deref(), &settings, |name| std::env::var(name).ok())?;
        preannotate(&http_client()?, &llm.provider(), pre).await?;
        return Ok(());
    }

    std::fs::create_dir_all(&args.data_dir)
        .with_context(|| format!("create data dir {}", args.data_dir.display()))?;

    let persisted = load_settings(&args.data_dir).context("load settings")?;
    let mut settings = persisted.unwrap_or_default();
    if let Some(root_dir) = &args.root_dir {
        settings.root_dir = root_dir.clone();
    } else if settings.root_dir.as_os_str().is_empty() {
        settings.root_dir = std::env::current_dir().context("read current dir")?;
    }
    if args.llm_base_url.is_some() {
        settings.llm_base_url = args.llm_base_url.clone();
    }
    if args.llm_model.is_some() {
        settings.llm_model = args.llm_model.clone();
    }
    if let Ok(key) = std::env::var("OPENAI_API_KEY")
        && !key.trim().is_empty()
    {
        settings.llm_api_key = Some(key);
    }
    if !settings.root_dir.is_dir() {
        tracing::warn!(root_dir = %settings.root_dir.display(), "root dir does not exist");
    }

    let http = http_client()?;

    let state = Arc::new(AppState {
        data_dir: args.data_dir,
        settings: RwLock::new(settings),
        http,
    });

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/config", get(get_config).post(update_config))
        .route("/api/projects", get(list_projects))
        .route("/api/table/:paper_id/:table_id", get(get_table))
        .route("/api/table/:paper_id/:table_id/image", get(get_image))
        .route("/api/table/:paper_id/:table_id/save_csv", post(save_csv))
        .route("/api/table/:paper_id/:table_id/save_skeleton", post(save_skeleton_handler))
        .route("/api/table/:paper_id/:table_id/suggest", post(suggest))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .with_context(|| format!("bind {}", args.addr))?;

    let local_addr = listener.local_addr().context("read listener local addr")?;
    tracing::info!(addr = %local_addr, "tabskel-server listening");

    if let Some(addr_file) = &args.addr_file {
        std::fs::write(addr_file, local_addr.to_string())
            .with_context(|| format!("write addr file {}", addr_file.display()))?;
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({"ok": true}))
}
