use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tabskel::engine::{Annotator, Worklist};
use tabskel::model::{ConfigUpdate, TaskKey, TaskStatus};
use tabskel::remote::RemoteClient;
use tabskel::shell::Shell;

#[derive(Parser)]
#[command(name = "tabskel")]
#[command(about = "Annotate the statistical layout of paper tables", long_about = None)]
struct Cli {
    /// Base URL of tabskel-server
    #[arg(long, global = true, default_value = "http://127.0.0.1:8000")]
    server: String,

    /// Table directory to work in (defaults to the server's configured root)
    #[arg(long, global = true)]
    root_dir: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List tables with their annotation status
    Tasks {
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one table's grid and skeleton
    Show {
        paper_id: String,
        table_id: String,
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the next task after the given one that is not done
    Next { paper_id: String, table_id: String },

    /// Show or change the server configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Interactive annotation shell (default)
    Shell,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the server configuration
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Update the server configuration; an empty value clears an LLM setting
    Set {
        #[arg(long = "table-root")]
        table_root: Option<String>,
        #[arg(long)]
        llm_base_url: Option<String>,
        #[arg(long)]
        llm_model: Option<String>,
        #[arg(long)]
        llm_api_key: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let client = RemoteClient::new(&cli.server)?;
    let root_dir = cli.root_dir.as_deref();

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Tasks { json } => {
            let tables = client.list_tables(root_dir)?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&tables).context("serialize tasks json")?
                );
            } else {
                let worklist = Worklist::new(tables);
                for item in worklist.items() {
                    println!("{:<12} {}", item.status.as_str(), item.key());
                }
                let s = worklist.summary();
                println!(
                    "{} tasks: {} done, {} in progress, {} not started",
                    s.total(),
                    s.done,
                    s.in_progress,
                    s.not_started
                );
            }
        }

        Commands::Show {
            paper_id,
            table_id,
            json,
        } => {
            let detail = client.get_table(&paper_id, &table_id, root_dir)?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&detail).context("serialize table json")?
                );
            } else {
                println!("table: {}", detail.info.key());
                println!("status: {}", detail.skeleton.status);
                println!("csv: {}", detail.info.csv_path);
                if let Some(image) = &detail.info.image_path {
                    println!("image: {}", image);
                }
                println!(
                    "grid: {} rows x {} columns",
                    detail.grid.height(),
                    detail.grid.width()
                );
                println!(
                    "annotations: y={} x={} fe={} obs={}",
                    detail.skeleton.y_columns.len(),
                    detail.skeleton.x_rows.len(),
                    detail.skeleton.fe_rows.len(),
                    detail.skeleton.obs_rows.len()
                );
            }
        }

        Commands::Next { paper_id, table_id } => {
            let worklist = Worklist::new(client.list_tables(root_dir)?);
            let after = TaskKey::new(paper_id, table_id);
            match worklist.find_next(&after) {
                Some(item) => println!("{}", item.key()),
                None => {
                    let pending = worklist
                        .items()
                        .iter()
                        .any(|t| t.status != TaskStatus::Done);
                    if pending {
                        println!("{}", after);
                    } else {
                        println!("No pending tasks");
                    }
                }
            }
        }

        Commands::Config { command } => match command {
            ConfigCommands::Show { json } => {
                let cfg = client.get_config()?;
                if json {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&cfg).context("serialize config json")?
                    );
                } else {
                    println!("root_dir: {}", cfg.root_dir);
                    println!("llm_base_url: {}", cfg.llm_base_url.unwrap_or_default());
                    println!("llm_model: {}", cfg.llm_model.unwrap_or_default());
                    println!("llm_key_set: {}", cfg.llm_key_set);
                }
            }
            ConfigCommands::Set {
                table_root,
                llm_base_url,
                llm_model,
                llm_api_key,
            } => {
                let update = ConfigUpdate {
                    root_dir: table_root,
                    llm_base_url,
                    llm_model,
                    llm_api_key,
                };
                if update == ConfigUpdate::default() {
                    anyhow::bail!("nothing to update (see `tabskel config set --help`)");
                }
                let cfg = client.set_config(&update)?;
                println!("Updated config (root_dir: {})", cfg.root_dir);
            }
        },

        Commands::Shell => {
            let annotator = Annotator::new(client, cli.root_dir.clone());
            let mut shell = Shell::new(annotator);
            let stdin = std::io::stdin();
            let mut input = stdin.lock();
            let mut out = std::io::stdout();
            shell.run(&mut input, &mut out)?;
        }
    }

    Ok(())
}
