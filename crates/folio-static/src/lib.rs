//! Static site builder for folio blogs.
//!
//! Turns a directory of MDX articles into HTML pages with build-time
//! rendered diagrams, generated utility CSS, a sitemap and an RSS feed.

pub mod article;
pub mod assets;
pub mod builder;
pub mod feed;
pub mod links;
pub mod render;
pub mod routes;
pub mod sitemap;
pub mod templates;
pub mod utilities;

pub use article::Article;
pub use builder::{BuildConfig, BuildError, BuildResult, StaticBuilder};
pub use routes::{route_for, Route};
