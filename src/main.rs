//! ProfNet CLI entry point.

use std::path::PathBuf;

use clap::Parser;

use profnet::cli;
use profnet::graph::store::GraphStore;
use profnet::observability::init_logging;

#[derive(Parser)]
#[command(name = "profnet", version, about = "Professional networking directory")]
struct Args {
    /// Path to the ProfNet database (defaults to the platform data
    /// directory).
    #[arg(long)]
    db: Option<PathBuf>,
}

fn default_db_path() -> std::io::Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "profnet").ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "cannot determine a data directory; pass --db",
        )
    })?;
    std::fs::create_dir_all(dirs.data_dir())?;
    Ok(dirs.data_dir().join("profnet.db"))
}

fn run() -> profnet::error::Result<()> {
    let args = Args::parse();
    init_logging();

    let db_path = match args.db {
        Some(path) => path,
        None => default_db_path()?,
    };
    tracing::info!(db = %db_path.display(), "opening directory database");

    let store = GraphStore::new(&db_path.to_string_lossy())?;
    cli::run(&store)
}

fn main() {
    if let Err(err) = run() {
        eprintln!("profnet: {err}");
        std::process::exit(1);
    }
}
