//! Static site build command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use folio_static::StaticBuilder;

use crate::config::{config_root, FolioConfig};

/// Run the build command.
pub async fn run(config_path: &Path, output: Option<PathBuf>, minify: Option<bool>) -> Result<()> {
    tracing::info!("Building static site...");

    let root = config_root(config_path);
    let mut config = FolioConfig::load(config_path)?.into_build_config(&root);

    if let Some(output) = output {
        config.output_dir = output;
    }
    if let Some(minify) = minify {
        config.minify = minify;
    }

    let result = StaticBuilder::new(config)
        .build()
        .await
        .context("Build failed")?;

    tracing::info!(
        "Built {} pages from {} articles with {} diagrams in {}ms",
        result.pages,
        result.articles,
        result.diagrams,
        result.duration_ms
    );

    tracing::info!("Output: {}", result.output_dir.display());

    Ok(())
}
