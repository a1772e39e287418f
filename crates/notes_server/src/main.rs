//! notes-server: REST service for notes and their to-do lists.
//!
//! # Responsibility
//! - Read configuration from flags and environment.
//! - Own process lifecycle: logging init, store open, serve, store close.

use clap::Parser;
use log::{error, info};
use notes_core::{default_log_level, init_logging, NoteStore};
use notes_web::{router, AppState};
use std::error::Error;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "notes-server", version)]
#[command(about = "REST service for short text notes with to-do lists")]
struct Args {
    /// Address to bind the HTTP server to
    #[arg(short, long, env = "NOTES_BIND", default_value = "127.0.0.1:3000")]
    bind: SocketAddr,

    /// SQLite database file
    #[arg(long, env = "NOTES_DB", default_value = "notes.sqlite3")]
    db: PathBuf,

    /// Keep notes in memory only (ignores --db)
    #[arg(long)]
    in_memory: bool,

    /// Log level: trace|debug|info|warn|error
    #[arg(long, env = "NOTES_LOG_LEVEL", default_value = default_log_level())]
    log_level: String,

    /// Directory for rolling log files [default: ./logs]
    #[arg(long, env = "NOTES_LOG_DIR")]
    log_dir: Option<PathBuf>,
}

impl Args {
    fn resolved_log_dir(&self) -> std::io::Result<PathBuf> {
        let dir = self.log_dir.clone().unwrap_or_else(|| PathBuf::from("logs"));
        if dir.is_absolute() {
            Ok(dir)
        } else {
            Ok(std::env::current_dir()?.join(dir))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    init_logging(&args.log_level, args.resolved_log_dir()?)?;
    info!(
        "event=server_start module=server status=start ping={} version={} bind={}",
        notes_core::ping(),
        notes_core::core_version(),
        args.bind
    );

    let store = if args.in_memory {
        NoteStore::open_in_memory()?
    } else {
        NoteStore::open(&args.db)?
    };

    let app = router(AppState::new(store.clone())?);
    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    info!("event=server_listen module=server status=ok addr={}", args.bind);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Err(err) = store.close() {
        error!("event=db_close module=server status=error error={err}");
    }
    served?;

    info!("event=server_stop module=server status=ok");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("event=shutdown_signal module=server status=error error={err}");
        return;
    }
    info!("event=shutdown_signal module=server status=ok");
}
