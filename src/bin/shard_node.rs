use sharded_news::partition::types::ShardId;
use sharded_news::storage::handlers::shard_routes;
use sharded_news::storage::memory::MemoryStore;
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} --bind <addr:port> [--shard A|B]", args[0]);
        eprintln!("Example: {} --bind 127.0.0.1:27017 --shard A", args[0]);
        eprintln!("Example: {} --bind 127.0.0.1:27018 --shard B", args[0]);

        std::process::exit(1);
    }

    let mut bind_addr: Option<SocketAddr> = None;
    let mut shard = ShardId::A;

    let mut i = 1;
    while i < args.len() {
        match (args[i].as_str(), args.get(i + 1)) {
            ("--bind", Some(value)) => {
                bind_addr = Some(value.parse()?);
                i += 2;
            }
            ("--shard", Some(value)) => {
                shard = match value.to_ascii_uppercase().as_str() {
                    "A" => ShardId::A,
                    "B" => ShardId::B,
                    other => anyhow::bail!("unknown shard '{}', expected A or B", other),
                };
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }

    let Some(bind_addr) = bind_addr else {
        anyhow::bail!("--bind is required");
    };

    let store = Arc::new(MemoryStore::new(shard));
    let app = shard_routes(store);

    tracing::info!("Shard {} listening on {}", shard, bind_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    tracing::info!("Shard {} stopped", shard);
    Ok(())
}
