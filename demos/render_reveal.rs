//! Render the built-in reveal scene into `target/demo/reveal.vgc` with debug
//! logging enabled.
//!
//! ```bash
//! cargo run --example render_reveal
//! ```

use std::path::Path;

use vignette::config::{ConfigDelta, ScopedConfig};
use vignette::foundation::fs;
use vignette::{dispatch, read_header};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let out_dir = Path::new("target").join("demo");
    fs::fresh_dir(&out_dir)?;

    let scope = ScopedConfig::enter(ConfigDelta::new().output_file(out_dir.join("reveal.vgc")))?;
    let artifact = dispatch::run_direct()?;
    scope.verify_artifact()?;
    drop(scope);

    let header = read_header(&artifact.path)?;
    eprintln!(
        "wrote {} ({} frames at {} fps, {} plays)",
        artifact.path.display(),
        header.frame_count,
        header.fps.as_f64(),
        artifact.plays
    );
    Ok(())
}
