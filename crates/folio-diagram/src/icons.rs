//! Icon packs in Iconify JSON format.
//!
//! Packs are listed in configuration as `{ name, loader }` pairs and loaded once
//! per build. Any failure to load a pack aborts the build.

use std::collections::HashMap;
use std::future::Future;

use serde::Deserialize;

/// An icon pack entry from configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct IconPackRef {
    /// Prefix used in diagrams (`icon: "name:icon"`)
    pub name: String,

    /// `http(s)://` URL or local path of the pack JSON
    pub loader: String,
}

/// A single icon body.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Icon {
    /// SVG markup without the outer `<svg>` element
    pub body: String,

    #[serde(default)]
    pub width: Option<u32>,

    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
struct Alias {
    parent: String,
}

/// A loaded icon collection.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct IconPack {
    #[serde(default)]
    pub prefix: String,

    pub icons: HashMap<String, Icon>,

    #[serde(default)]
    aliases: HashMap<String, Alias>,

    #[serde(default = "default_size")]
    pub width: u32,

    #[serde(default = "default_size")]
    pub height: u32,
}

fn default_size() -> u32 {
    16
}

/// An icon ready to embed: body plus its view box size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedIcon<'a> {
    pub body: &'a str,
    pub width: u32,
    pub height: u32,
}

impl IconPack {
    /// Parse an Iconify JSON document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Look up an icon, following one level of aliases.
    pub fn get(&self, name: &str) -> Option<ResolvedIcon<'_>> {
        let icon = match self.icons.get(name) {
            Some(icon) => icon,
            None => self.icons.get(&self.aliases.get(name)?.parent)?,
        };

        Some(ResolvedIcon {
            body: &icon.body,
            width: icon.width.unwrap_or(self.width),
            height: icon.height.unwrap_or(self.height),
        })
    }
}

/// Where icon pack JSON comes from.
pub trait IconSource: Send + Sync {
    /// Fetch the raw JSON for a loader string.
    fn fetch(&self, loader: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// Fetches `http(s)://` loaders over the network and reads anything else from disk.
#[derive(Debug, Clone, Default)]
pub struct DefaultIconSource {
    client: reqwest::Client,
}

impl DefaultIconSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IconSource for DefaultIconSource {
    async fn fetch(&self, loader: &str) -> Result<String, FetchError> {
        if loader.starts_with("http://") || loader.starts_with("https://") {
            let response = self
                .client
                .get(loader)
                .send()
                .await
                .map_err(|e| FetchError::Request {
                    url: loader.to_string(),
                    message: e.to_string(),
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    url: loader.to_string(),
                    status: status.as_u16(),
                });
            }

            response.text().await.map_err(|e| FetchError::Request {
                url: loader.to_string(),
                message: e.to_string(),
            })
        } else {
            tokio::fs::read_to_string(loader)
                .await
                .map_err(|e| FetchError::Io {
                    path: loader.to_string(),
                    message: e.to_string(),
                })
        }
    }
}

/// All icon packs available to the renderer, keyed by configured name.
#[derive(Debug, Clone, Default)]
pub struct IconRegistry {
    packs: HashMap<String, IconPack>,
}

impl IconRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every configured pack. The first failure aborts loading.
    pub async fn load<S: IconSource>(
        refs: &[IconPackRef],
        source: &S,
    ) -> Result<Self, FetchError> {
        let mut registry = Self::new();

        for pack_ref in refs {
            let json = source.fetch(&pack_ref.loader).await?;
            let pack = IconPack::from_json(&json).map_err(|e| FetchError::Decode {
                name: pack_ref.name.clone(),
                message: e.to_string(),
            })?;

            tracing::info!(
                "Loaded icon pack '{}' ({} icons)",
                pack_ref.name,
                pack.icons.len()
            );
            registry.insert(pack_ref.name.clone(), pack);
        }

        Ok(registry)
    }

    pub fn insert(&mut self, name: impl Into<String>, pack: IconPack) {
        self.packs.insert(name.into(), pack);
    }

    pub fn contains_pack(&self, name: &str) -> bool {
        self.packs.contains_key(name)
    }

    /// Resolve a `pack:icon` reference.
    pub fn resolve(&self, reference: &str) -> Result<ResolvedIcon<'_>, IconLookupError> {
        let (pack_name, icon_name) = reference
            .split_once(':')
            .ok_or_else(|| IconLookupError::Malformed(reference.to_string()))?;

        let pack = self
            .packs
            .get(pack_name)
            .ok_or_else(|| IconLookupError::UnknownPack(pack_name.to_string()))?;

        pack.get(icon_name)
            .ok_or_else(|| IconLookupError::UnknownIcon(reference.to_string()))
    }

    pub fn len(&self) -> usize {
        self.packs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packs.is_empty()
    }
}

/// Errors that can occur while loading icon packs.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FetchError {
    #[error("Failed to fetch icon pack from {url}: {message}")]
    Request { url: String, message: String },

    #[error("Icon pack request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to read icon pack {path}: {message}")]
    Io { path: String, message: String },

    #[error("Icon pack '{name}' is not valid Iconify JSON: {message}")]
    Decode { name: String, message: String },
}

/// Errors resolving an icon reference.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum IconLookupError {
    #[error("Icon reference '{0}' must have the form pack:icon")]
    Malformed(String),

    #[error("Unknown icon pack: {0}")]
    UnknownPack(String),

    #[error("Unknown icon: {0}")]
    UnknownIcon(String),
}
