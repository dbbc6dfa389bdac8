//! Build descriptor for the client asset bundle.
//!
//! DESIGN
//! ======
//! The external bundler is driven by a declarative plan: which loader chain
//! applies to which asset class, where the output goes, and how the
//! development/production branches differ. Modeling the plan as a pure
//! function `BuildConfig -> BuildPlan` means both branches can be asserted
//! against directly instead of invoking the bundler.
//!
//! The plan is evaluated once; there is no retry or recovery story here.
//! Malformed asset input is the bundler's problem, not ours.

use serde::Serialize;

#[cfg(test)]
#[path = "bundle_test.rs"]
mod tests;

// =============================================================================
// CONFIG
// =============================================================================

const ENV_BUILD_MODE: &str = "BUILD_MODE";
const ENV_STORAGE_BUCKET: &str = "AWS_STORAGE_BUCKET_NAME";

const DEV_PUBLIC_PATH: &str = "http://0.0.0.0:8080/dist/";
const DEV_STATS_FILE: &str = ".webpack/webpack-stats-development.json";
const PROD_STATS_FILE: &str = ".webpack/webpack-stats-production.json";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    Development,
    Production,
}

impl BuildMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

/// Inputs to plan resolution. `bucket` is only consulted in production.
#[derive(Clone, Debug)]
pub struct BuildConfig {
    pub mode: BuildMode,
    pub bucket: Option<String>,
}

impl BuildConfig {
    /// Read the build mode and storage bucket from the environment.
    /// Anything other than an explicit `production` means development,
    /// matching how the bundler branches on its mode flag.
    #[must_use]
    pub fn from_env() -> Self {
        let mode = match std::env::var(ENV_BUILD_MODE).as_deref() {
            Ok("production") => BuildMode::Production,
            _ => BuildMode::Development,
        };
        Self { mode, bucket: std::env::var(ENV_STORAGE_BUCKET).ok() }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BuildPlanError {
    #[error("production plan requires AWS_STORAGE_BUCKET_NAME")]
    MissingBucket,
}

// =============================================================================
// PLAN
// =============================================================================

/// Asset classes recognized by the bundle, keyed by file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    Stylesheet,
    StylesheetScss,
    StylesheetSass,
    Component,
    Script,
    Image,
}

/// Loader chain for stylesheet blocks embedded in a component, selected by
/// the block's declared language.
#[derive(Clone, Debug, Serialize)]
pub struct StyleLang {
    pub lang: &'static str,
    pub loaders: Vec<String>,
}

/// One `extension class -> transform chain` rule.
#[derive(Clone, Debug, Serialize)]
pub struct AssetRule {
    pub class: AssetClass,
    pub extensions: Vec<&'static str>,
    pub loaders: Vec<String>,
    /// Directory subtree the rule must skip (vendored dependencies).
    pub exclude: Option<&'static str>,
    /// Output naming template for copied files (cache busting).
    pub file_name: Option<&'static str>,
    /// Component-only: per-language chains for embedded style blocks.
    pub style_langs: Vec<StyleLang>,
    /// Whether matched styles are pulled out into the extracted bundle.
    pub extract_css: bool,
}

impl AssetRule {
    fn chain(class: AssetClass, extensions: &[&'static str], loaders: &[&str]) -> Self {
        Self {
            class,
            extensions: extensions.to_vec(),
            loaders: loaders.iter().map(|l| (*l).to_string()).collect(),
            exclude: None,
            file_name: None,
            style_langs: Vec::new(),
            extract_css: false,
        }
    }
}

/// Where the bundle lands and what URL prefix it is served under.
#[derive(Clone, Debug, Serialize)]
pub struct OutputPlan {
    pub path: &'static str,
    pub public_path: String,
    pub filename: &'static str,
}

/// Fully resolved build plan for one mode.
#[derive(Clone, Debug, Serialize)]
pub struct BuildPlan {
    pub mode: BuildMode,
    pub entry: &'static str,
    pub output: OutputPlan,
    pub rules: Vec<AssetRule>,
    /// Bundle metadata file recording artifact locations, consumed by the
    /// shell renderer.
    pub stats_file: &'static str,
    pub devtool: &'static str,
    pub minify: bool,
    /// Name of the separate stylesheet bundle, when styles are extracted.
    pub extracted_stylesheet: Option<&'static str>,
}

// =============================================================================
// RESOLUTION
// =============================================================================

/// Resolve a configuration record into a full plan.
///
/// # Errors
///
/// Returns `MissingBucket` for a production config without a bucket name.
pub fn resolve(config: &BuildConfig) -> Result<BuildPlan, BuildPlanError> {
    let production = config.mode == BuildMode::Production;

    let public_path = if production {
        let bucket = config.bucket.as_deref().ok_or(BuildPlanError::MissingBucket)?;
        format!("https://s3.amazonaws.com/{bucket}/static/client/")
    } else {
        DEV_PUBLIC_PATH.to_string()
    };

    Ok(BuildPlan {
        mode: config.mode,
        entry: "./src/main.js",
        output: OutputPlan { path: "./dist/client", public_path, filename: "build.js" },
        rules: rules(production),
        stats_file: if production { PROD_STATS_FILE } else { DEV_STATS_FILE },
        devtool: if production { "source-map" } else { "eval-source-map" },
        minify: production,
        extracted_stylesheet: production.then_some("styles.css"),
    })
}

/// The per-asset-class transform chains. Only the component rule differs by
/// mode: production pulls its style blocks into the extracted bundle.
fn rules(production: bool) -> Vec<AssetRule> {
    let mut component = AssetRule::chain(AssetClass::Component, &["vue"], &["vue-loader"]);
    component.style_langs = vec![
        StyleLang {
            lang: "scss",
            loaders: chain(&["vue-style-loader", "css-loader", "sass-loader"]),
        },
        StyleLang {
            lang: "sass",
            loaders: chain(&["vue-style-loader", "css-loader", "sass-loader?indentedSyntax"]),
        },
    ];
    component.extract_css = production;

    let mut scss = AssetRule::chain(
        AssetClass::StylesheetScss,
        &["scss"],
        &["extracted-loader", "sass-loader"],
    );
    scss.extract_css = true;

    let mut script = AssetRule::chain(AssetClass::Script, &["js"], &["babel-loader"]);
    script.exclude = Some("node_modules");

    let mut image =
        AssetRule::chain(AssetClass::Image, &["png", "jpg", "gif", "svg"], &["file-loader"]);
    image.file_name = Some("[name].[ext]?[hash]");

    vec![
        AssetRule::chain(
            AssetClass::Stylesheet,
            &["css"],
            &["vue-style-loader", "css-loader"],
        ),
        scss,
        AssetRule::chain(
            AssetClass::StylesheetSass,
            &["sass"],
            &["vue-style-loader", "css-loader", "sass-loader?indentedSyntax"],
        ),
        component,
        script,
        image,
    ]
}

fn chain(loaders: &[&str]) -> Vec<String> {
    loaders.iter().map(|l| (*l).to_string()).collect()
}
