//! Content path to route mapping.

use std::path::{Component, Path, PathBuf};

use folio_mdx::slugify;

/// Where a content file is published.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Route {
    /// URL path relative to the site base, always starting and ending with `/`
    pub path: String,

    /// Output file relative to the output directory
    pub output: PathBuf,
}

impl Route {
    /// The site root route.
    pub fn root() -> Self {
        Self {
            path: "/".to_string(),
            output: PathBuf::from("index.html"),
        }
    }

    /// Route URL under `base_url`.
    pub fn url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.path)
    }
}

/// Map a content file path (relative to the content directory) to its route.
///
/// `blog/Hello World.mdx` maps to `/blog/hello-world/` and `blog/index.md` to
/// `/blog/`. Returns `None` when a segment slugs to nothing.
pub fn route_for(relative: &Path) -> Option<Route> {
    let mut segments: Vec<String> = Vec::new();

    if let Some(parent) = relative.parent() {
        for component in parent.components() {
            if let Component::Normal(name) = component {
                segments.push(slug_segment(&name.to_string_lossy())?);
            }
        }
    }

    let stem = relative.file_stem()?.to_string_lossy();
    if stem != "index" {
        segments.push(slug_segment(&stem)?);
    }

    if segments.is_empty() {
        return Some(Route::root());
    }

    let mut output: PathBuf = segments.iter().collect();
    output.push("index.html");

    Some(Route {
        path: format!("/{}/", segments.join("/")),
        output,
    })
}

fn slug_segment(segment: &str) -> Option<String> {
    let slug = slugify(segment);
    if slug.is_empty() {
        None
    } else {
        Some(slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn route(path: &str) -> Route {
        route_for(Path::new(path)).unwrap()
    }

    #[test]
    fn maps_files_to_directories() {
        assert_eq!(
            route("blog/post.mdx"),
            Route {
                path: "/blog/post/".to_string(),
                output: PathBuf::from("blog/post/index.html"),
            }
        );
        assert_eq!(route("about.md").path, "/about/");
    }

    #[test]
    fn index_maps_to_parent() {
        assert_eq!(route("index.mdx"), Route::root());
        assert_eq!(route("blog/index.md").path, "/blog/");
        assert_eq!(route("blog/index.md").output, PathBuf::from("blog/index.html"));
    }

    #[test]
    fn slugifies_segments() {
        assert_eq!(
            route("Field Notes/Hello World!.mdx").path,
            "/field-notes/hello-world/"
        );
    }

    #[test]
    fn route_is_pure_function_of_path() {
        assert_eq!(route("a/b.mdx"), route("a/b.mdx"));
        assert_eq!(route("a/b.mdx"), route("a/b.md"));
    }

    #[test]
    fn rejects_unsluggable_names() {
        assert_eq!(route_for(Path::new("!!!.mdx")), None);
    }

    #[test]
    fn url_joins_base() {
        assert_eq!(route("post.mdx").url("/"), "/post/");
        assert_eq!(route("post.mdx").url("/blog/"), "/blog/post/");
        assert_eq!(Route::root().url("https://example.com"), "https://example.com/");
    }
}
