//! Scaffold a new blog.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::config_root;

/// Run the init command.
pub async fn run(config_path: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing folio...");

    let created = scaffold(config_path, yes)?;

    if created == 0 {
        tracing::warn!("Nothing to do: files already exist. Use --yes to overwrite.");
        return Ok(());
    }

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'folio build' and then 'folio serve' to preview.");

    Ok(())
}

/// Write the config, sample article and public directory. Existing files are
/// kept unless `overwrite` is set. Returns the number of files written.
pub fn scaffold(config_path: &Path, overwrite: bool) -> Result<usize> {
    let root = config_root(config_path);
    let mut written = 0;

    let files = [
        (config_path.to_path_buf(), DEFAULT_CONFIG),
        (root.join("content/blog/adaptive-pqc.mdx"), SAMPLE_ARTICLE),
        (root.join("public/favicon.svg"), FAVICON),
    ];

    for (path, body) in files {
        if path.exists() && !overwrite {
            tracing::debug!("Keeping existing {}", path.display());
            continue;
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, body).with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!("Created {}", path.display());
        written += 1;
    }

    Ok(written)
}

const DEFAULT_CONFIG: &str = r#"# Folio configuration

[site]
title = "My Blog"
description = "Notes on security at the edge"
# Absolute origin used in sitemap.xml and rss.xml
url = "http://localhost:4000"
base_url = "/"

[content]
dir = "content"
public = "public"
output = "dist"

[build]
minify = true
sitemap = true
feed = true
strict_links = false

[mermaid]
theme = "default"
# Also emit a dark palette that follows the page theme toggle
autoTheme = true

[mermaid.mermaidConfig.flowchart]
curve = "basis"
useMaxWidth = true

# [[mermaid.iconPacks]]
# name = "logos"
# loader = "https://unpkg.com/@iconify-json/logos@1/icons.json"
"#;

const SAMPLE_ARTICLE: &str = r#"---
title: "Adaptive post-quantum TLS at the edge"
description: "Picking a key exchange per client without breaking older devices."
pubDate: "Jul 08 2022"
tags: ["pqc", "edge"]
---

Edge proxies sit between clients we do not control and origins we do.
That makes them a good place to roll out post-quantum key exchange.

## Handshake

Clients that advertise an ML-KEM share get a hybrid handshake. Everyone
else falls back to classic TLS.

```mermaid
flowchart LR
  client[Client] -->|ClientHello + ML-KEM share| edge{{Edge proxy}}
  edge -->|hybrid handshake| origin[(Origin)]
  edge -.->|fallback| classic[Classic TLS]
```

## Constrained devices

Small devices encapsulate once and hand the result to the gateway.

```mermaid
flowchart TB
  subgraph device [Device]
    mcu[Microcontroller] --> kem[ML-KEM-512]
  end
  subgraph cloud [Cloud]
    gw[Gateway] ==> store[(Key store)]
  end
  kem -- encapsulate --> gw
```

```rust title="negotiate.rs"
fn pick_group(offered: &[Group]) -> Group {
    offered
        .iter()
        .copied()
        .find(Group::is_hybrid)
        .unwrap_or(Group::X25519)
}
```
"#;

const FAVICON: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 16 16"><rect width="16" height="16" rx="3" fill="#2337ff"/></svg>
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FolioConfig;
    use folio_static::StaticBuilder;
    use tempfile::tempdir;

    #[test]
    fn keeps_existing_files_without_overwrite() {
        let temp = tempdir().unwrap();
        let config = temp.path().join("folio.toml");
        fs::write(&config, "[site]\ntitle = \"Mine\"\n").unwrap();

        assert_eq!(scaffold(&config, false).unwrap(), 2);
        assert_eq!(fs::read_to_string(&config).unwrap(), "[site]\ntitle = \"Mine\"\n");

        assert_eq!(scaffold(&config, true).unwrap(), 3);
        assert_eq!(fs::read_to_string(&config).unwrap(), DEFAULT_CONFIG);
    }

    #[tokio::test]
    async fn scaffolded_site_builds() {
        let temp = tempdir().unwrap();
        let config_path = temp.path().join("folio.toml");
        scaffold(&config_path, false).unwrap();

        let config = FolioConfig::load(&config_path)
            .unwrap()
            .into_build_config(temp.path());
        let out = config.output_dir.clone();

        let result = StaticBuilder::new(config).build().await.unwrap();

        assert_eq!(result.articles, 1);
        assert_eq!(result.diagrams, 2);
        assert_eq!(result.sitemap_entries, 1);

        let html = fs::read_to_string(out.join("blog/adaptive-pqc/index.html")).unwrap();
        assert!(html.contains("<figure class=\"diagram\"><svg"));
        assert!(html.contains("<figcaption>negotiate.rs</figcaption>"));

        let pqc = html.find(">pqc</li>").unwrap();
        let edge = html.find(">edge</li>").unwrap();
        assert!(pqc < edge);

        assert!(out.join("favicon.svg").exists());
    }
}
