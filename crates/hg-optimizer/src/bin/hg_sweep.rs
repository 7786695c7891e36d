use std::collections::BTreeMap;
use std::io::{BufWriter, Write};

use anyhow::Context;
use hg_optimizer::{ProjectFile, QuasiRandomSearch};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("HYPERGRID_PROJECT").ok())
        .context("usage: hg-sweep <project.json>")?;

    let config = ProjectFile::from_file(&path)
        .with_context(|| format!("failed to load project {path}"))?
        .into_config(path.as_str())?;
    let mut search = QuasiRandomSearch::new(&config.search_space, config.generator_config()?)?;

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut written = 0;
    while written < config.max_iterations {
        let Some(sample) = search.next_sample()? else {
            break;
        };
        let ordered: BTreeMap<_, _> = sample.into_iter().collect();
        serde_json::to_writer(&mut out, &ordered)?;
        out.write_all(b"\n")?;
        written += 1;
    }
    out.flush()?;

    tracing::info!(samples = written, "sweep written");
    Ok(())
}
