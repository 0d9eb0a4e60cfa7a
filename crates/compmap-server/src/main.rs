use clap::Parser;
use compmap_core::memory::MemoryStore;
use compmap_core::store::{LogNotifier, Notifier};
use compmap_core::unit::UnitTree;
use compmap_server::seed::Seed;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "compmap-server",
    about = "Competency-mapping campaign server — subprocess workflows, eligibility, and bulk actions",
    version
)]
struct Cli {
    /// Port to listen on
    #[arg(long, default_value = "3178", env = "COMPMAP_PORT")]
    port: u16,

    /// YAML seed file with the unit tree and initial processes
    #[arg(long, env = "COMPMAP_SEED")]
    seed: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .init();

    let store = match &cli.seed {
        Some(path) => {
            let seed = Seed::load(path)?;
            tracing::info!(seed = %path.display(), "loading seed file");
            Arc::new(seed.into_store().await)
        }
        None => Arc::new(MemoryStore::new(UnitTree::new(Vec::new()))),
    };

    compmap_server::serve(store, Arc::new(LogNotifier) as Arc<dyn Notifier>, cli.port).await
}
