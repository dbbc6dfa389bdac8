//! Bundle metadata and SPA shell rendering.
//!
//! DESIGN
//! ======
//! The bundler records where its artifacts landed in a per-mode stats file
//! (named by the build plan). The shell renderer reads that file and emits
//! the HTML page that boots the client: stylesheet links and script tags
//! pointing at `public_path + chunk name`.
//!
//! ERROR HANDLING
//! ==============
//! A missing or unfinished stats file degrades to the bare shell instead of
//! failing the request; the page is useless without a bundle but the server
//! should not 500 just because the bundler hasn't run yet.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::spa::bundle::BuildPlan;

#[cfg(test)]
#[path = "shell_test.rs"]
mod tests;

// =============================================================================
// BUNDLE STATS
// =============================================================================

/// One emitted artifact within a chunk group.
#[derive(Clone, Debug, Deserialize)]
pub struct BundleChunk {
    pub name: String,
    /// Absolute URL recorded by the tracker, when present. Falls back to
    /// the plan's public path otherwise.
    #[serde(rename = "publicPath")]
    pub public_path: Option<String>,
}

/// Bundle metadata written by the external bundler after each build.
#[derive(Clone, Debug, Deserialize)]
pub struct BundleStats {
    pub status: String,
    #[serde(default)]
    pub chunks: BTreeMap<String, Vec<BundleChunk>>,
}

impl BundleStats {
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.status == "done"
    }
}

/// Load the plan's stats file from under `root`. Returns `None` (with a
/// warning) when the file is absent, malformed, or the build isn't done.
#[must_use]
pub fn load_stats(root: &Path, plan: &BuildPlan) -> Option<BundleStats> {
    let path = root.join(plan.stats_file);

    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "bundle stats unavailable");
            return None;
        }
    };

    let stats: BundleStats = match serde_json::from_str(&raw) {
        Ok(stats) => stats,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "bundle stats malformed");
            return None;
        }
    };

    if !stats.is_done() {
        tracing::warn!(status = %stats.status, "bundle build not finished");
        return None;
    }

    Some(stats)
}

/// Absolute URLs for every tracked artifact, in chunk-group order.
#[must_use]
pub fn asset_urls(plan: &BuildPlan, stats: &BundleStats) -> Vec<String> {
    stats
        .chunks
        .values()
        .flatten()
        .map(|chunk| {
            chunk
                .public_path
                .clone()
                .unwrap_or_else(|| format!("{}{}", plan.output.public_path, chunk.name))
        })
        .collect()
}

// =============================================================================
// SHELL
// =============================================================================

/// Render the SPA shell. Stylesheets go in the head, scripts at the end of
/// the body, anything else is ignored.
#[must_use]
pub fn render(plan: &BuildPlan, stats: Option<&BundleStats>) -> String {
    let urls = stats.map(|s| asset_urls(plan, s)).unwrap_or_default();

    let mut links = String::new();
    let mut scripts = String::new();
    for url in &urls {
        let file = url.split('?').next().unwrap_or(url);
        if file.ends_with(".css") {
            links.push_str(&format!("    <link rel=\"stylesheet\" href=\"{url}\">\n"));
        } else if file.ends_with(".js") {
            scripts.push_str(&format!("    <script src=\"{url}\"></script>\n"));
        }
    }

    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
         \x20   <meta charset=\"utf-8\">\n\
         \x20   <title>Risk Model</title>\n\
         {links}\
         </head>\n\
         <body>\n\
         \x20   <div id=\"app\"></div>\n\
         {scripts}\
         </body>\n\
         </html>\n"
    )
}
