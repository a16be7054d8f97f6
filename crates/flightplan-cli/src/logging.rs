//! Tracing subscriber setup shared by the binaries.

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directives when `RUST_LOG` does not override them.
pub const DEFAULT_DIRECTIVES: [&str; 3] = [
    "flightplan_core=info",
    "flightplan_terrain=info",
    "flightplan_cli=info",
];

/// Install a global subscriber writing to stderr, as text or JSON lines.
pub fn init_tracing(json: bool) -> Result<()> {
    let mut filter = EnvFilter::from_default_env();
    for directive in DEFAULT_DIRECTIVES {
        filter = filter.add_directive(directive.parse()?);
    }

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()?;
    }
    Ok(())
}
