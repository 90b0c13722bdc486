use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber. `filter` takes `RUST_LOG` style
/// directives.
pub fn init(filter: &str) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_new(filter)?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err))?;
    Ok(())
}
