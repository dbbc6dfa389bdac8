//! SPA route table and path resolution.
//!
//! DESIGN
//! ======
//! Routes are an ordered list of `(pattern, view, children)` records and
//! resolution is a pure function from a path string to a matched view plus
//! extracted parameters. No rendering engine, no guards, no redirects: an
//! unmatched path resolves to `None` and the HTTP layer decides what that
//! means (404 for us).
//!
//! Child patterns follow the client router's conventions: an empty pattern
//! is the default child (matches when the URL equals the parent path), an
//! absolute pattern (leading `/`) matches the full URL on its own, and a
//! relative pattern is joined onto the parent.

use std::collections::HashMap;

#[cfg(test)]
#[path = "router_test.rs"]
mod tests;

// =============================================================================
// TYPES
// =============================================================================

/// View identifiers for the client app.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    /// Model list with a nested detail region.
    ModelList,
    /// Creation form for a risk object, keyed by the model uuid in the URL.
    ModelObjectForm,
    /// Placeholder shown in the detail region when nothing is selected.
    ModelUnselected,
}

/// One route record. Children render inside the parent's detail region.
#[derive(Clone, Debug)]
pub struct Route {
    pub pattern: String,
    pub view: View,
    pub children: Vec<Route>,
}

impl Route {
    #[must_use]
    pub fn leaf(pattern: &str, view: View) -> Self {
        Self { pattern: pattern.to_string(), view, children: Vec::new() }
    }
}

/// A resolved path: the parent view, the child view (if a nested route
/// matched), and parameters captured from `:name` segments.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct RouteMatch {
    pub view: View,
    pub child: Option<View>,
    pub params: HashMap<String, String>,
}

/// Ordered route table. First match wins.
#[derive(Clone, Debug)]
pub struct RouteTable {
    routes: Vec<Route>,
}

// =============================================================================
// TABLE
// =============================================================================

impl RouteTable {
    #[must_use]
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// The client app's route table: the model list at `/`, with the object
    /// creation form and the unselected placeholder as nested children.
    ///
    /// The `:uuid` parameter is passed through as a free-form string; the
    /// client sends it straight to the form and the API is where existence
    /// gets checked.
    #[must_use]
    pub fn client() -> Self {
        Self::new(vec![Route {
            pattern: "/".to_string(),
            view: View::ModelList,
            children: vec![
                Route::leaf("/object/new/:uuid", View::ModelObjectForm),
                Route::leaf("", View::ModelUnselected),
            ],
        }])
    }

    /// Resolve a URL path against the table.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<RouteMatch> {
        let path = normalize(path);

        for route in &self.routes {
            for child in &route.children {
                let pattern = child_pattern(&route.pattern, &child.pattern);
                if let Some(params) = match_pattern(&pattern, &path) {
                    return Some(RouteMatch {
                        view: route.view,
                        child: Some(child.view),
                        params,
                    });
                }
            }

            if let Some(params) = match_pattern(&route.pattern, &path) {
                return Some(RouteMatch { view: route.view, child: None, params });
            }
        }

        None
    }
}

// =============================================================================
// MATCHING
// =============================================================================

/// Collapse a URL path to a canonical form: leading slash, no trailing
/// slash, query/fragment stripped.
fn normalize(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or("");
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Full pattern for a child route given its parent's pattern.
fn child_pattern(parent: &str, child: &str) -> String {
    if child.is_empty() {
        parent.to_string()
    } else if child.starts_with('/') {
        child.to_string()
    } else {
        format!("{}/{}", parent.trim_end_matches('/'), child)
    }
}

/// Match a normalized path against a pattern, segment by segment. `:name`
/// segments capture any non-empty segment string verbatim.
fn match_pattern(pattern: &str, path: &str) -> Option<HashMap<String, String>> {
    let pattern = normalize(pattern);
    let pattern_segs: Vec<&str> = pattern.trim_matches('/').split('/').collect();
    let path_segs: Vec<&str> = path.trim_matches('/').split('/').collect();

    if pattern_segs.len() != path_segs.len() {
        return None;
    }

    let mut params = HashMap::new();
    for (pat, seg) in pattern_segs.iter().zip(&path_segs) {
        if let Some(name) = pat.strip_prefix(':') {
            if seg.is_empty() {
                return None;
            }
            params.insert(name.to_string(), (*seg).to_string());
        } else if pat != seg {
            return None;
        }
    }

    Some(params)
}
