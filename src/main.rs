use sharded_news::command::shell::Shell;
use sharded_news::command::types::Reply;
use sharded_news::config::ClusterConfig;
use sharded_news::join::media::FsMediaStore;
use sharded_news::partition::policy::{PartitionPolicy, RandomSource, StdRandom};
use sharded_news::router::router::QueryRouter;
use sharded_news::storage::registry::ShardRegistry;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // 1. Configuration:
    let config = ClusterConfig::from_env()?;
    tracing::info!(
        "Shard A at {}, shard B at {}, write policy {:?}",
        config.shard_a.base_url(),
        config.shard_b.base_url(),
        config.write_policy
    );

    // 2. Shard registry (fatal if either shard is unreachable):
    let registry = match ShardRegistry::connect(&config).await {
        Ok(registry) => Arc::new(registry),
        Err(err) => {
            tracing::error!("Cannot start: {}", err);
            eprintln!("Cannot reach the shards: {err}");
            eprintln!("Start them with: shard_node --bind 127.0.0.1:27017 --shard A");
            eprintln!("                 shard_node --bind 127.0.0.1:27018 --shard B");
            std::process::exit(1);
        }
    };

    // 3. Placement policy and router:
    let random: Box<dyn RandomSource> = match config.placement_seed {
        Some(seed) => {
            tracing::info!("Article placement seeded with {}", seed);
            Box::new(StdRandom::seeded(seed))
        }
        None => Box::new(StdRandom::from_entropy()),
    };
    let policy = PartitionPolicy::new(config.rules.clone(), random);
    let router = Arc::new(QueryRouter::new(
        registry.clone(),
        policy,
        config.write_policy,
    ));
    let media = config.media_dir.clone().map(FsMediaStore::new);
    let shell = Shell::new(router.clone(), media);

    // 4. Command loop:
    println!("Connected to both shards. Type 'help' for commands, 'exit' to quit.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        };
        let Some(line) = line else {
            break;
        };

        match shell.run_line(&line).await {
            Reply::Lines(output) => {
                for text in output {
                    println!("{text}");
                }
            }
            Reply::Exit => break,
        }
    }

    // 5. Shutdown:
    drop(shell);
    drop(router);
    match Arc::try_unwrap(registry) {
        Ok(registry) => registry.close(),
        Err(_) => tracing::warn!("Shard registry still shared at shutdown"),
    }
    Ok(())
}
