use anyhow::Context;
use q_learn::board::Outcome;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let outcome = q_learn::play().context("training or playing the game failed")?;
    info!(?outcome, "game over");
    if outcome == Outcome::Abandoned {
        anyhow::bail!("the game stopped on an unknown position");
    }
    Ok(())
}
