//! `skiff bundle` command implementation.
//!
//! Wires the built-in plugins, runs the pipeline, and persists the
//! produced bundles and cache entries to disk.

use miette::{miette, IntoDiagnostic, Result};
use serde::Serialize;
use skiff_core::{
    BannerPlugin, BundleOptions, Bundler, FilePlugin, ImportMap, JsonPlugin, Plugin, Reload,
};
use skiff_util::fs::atomic_write;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing::debug;

/// Bundle command action.
#[derive(Debug, Clone)]
pub struct BundleAction {
    /// Entry inputs (paths or URLs).
    pub inputs: Vec<String>,
    /// Output directory root.
    pub out_dir: PathBuf,
    /// Run optimizer plugins over emitted bundles.
    pub optimize: bool,
    /// Rebuild policy: `None` respects timestamps, `Some("")` rebuilds
    /// everything, `Some(csv)` rebuilds the listed inputs.
    pub reload: Option<String>,
    /// Import map JSON file.
    pub import_map: Option<PathBuf>,
    /// Output overrides, `input=path` pairs.
    pub outputs: Vec<String>,
    /// Banner prepended to script/style bundles.
    pub banner: Option<String>,
    /// Suppress informational output.
    pub quiet: bool,
}

/// JSON output for the bundle command.
#[derive(Serialize)]
struct BundleResultJson {
    ok: bool,
    inputs: Vec<String>,
    graph_size: usize,
    chunks: usize,
    bundles: Vec<String>,
    duration_ms: u64,
}

/// Translate the `--reload` flag: absent respects timestamps, bare
/// forces everything, a comma-separated list forces those inputs.
fn parse_reload(flag: Option<&str>) -> Reload {
    match flag {
        None => Reload::None,
        Some("") => Reload::All,
        Some(list) => Reload::Only(
            list.split(',')
                .map(str::trim)
                .filter(|input| !input.is_empty())
                .map(str::to_string)
                .collect(),
        ),
    }
}

/// Parse repeated `input=path` overrides.
fn parse_output_map(pairs: &[String]) -> Result<HashMap<String, PathBuf>> {
    let mut output_map = HashMap::new();
    for pair in pairs {
        let (input, output) = pair
            .split_once('=')
            .ok_or_else(|| miette!("invalid --output value `{pair}`, expected input=path"))?;
        output_map.insert(input.trim().to_string(), PathBuf::from(output.trim()));
    }
    Ok(output_map)
}

fn load_import_map(path: Option<&PathBuf>) -> Result<ImportMap> {
    let Some(path) = path else {
        return Ok(ImportMap::default());
    };
    let text = fs::read_to_string(path).into_diagnostic()?;
    serde_json::from_str(&text).into_diagnostic()
}

/// Run the bundle command.
pub fn run(action: BundleAction, json: bool) -> Result<()> {
    let start = Instant::now();

    let import_map = load_import_map(action.import_map.as_ref())?;
    let output_map = parse_output_map(&action.outputs)?;

    // Built-in plugins; the catch-all file plugin goes last.
    let mut plugins: Vec<Box<dyn Plugin>> = Vec::new();
    plugins.push(Box::new(JsonPlugin));
    if let Some(ref banner) = action.banner {
        plugins.push(Box::new(BannerPlugin::new().banner(banner)));
    }
    plugins.push(Box::new(FilePlugin));

    let bundler = Bundler::new().plugins(plugins);
    let options = BundleOptions {
        import_map,
        output_map,
        reload: parse_reload(action.reload.as_deref()),
        optimize: action.optimize,
        quiet: action.quiet,
        out_dir_path: action.out_dir.clone(),
        ..Default::default()
    };

    let result = bundler.bundle(&action.inputs, options).into_diagnostic()?;

    // Persist bundles and cache entries; the engine never writes.
    for (output, bundle) in &result.bundles {
        atomic_write(output, bundle.as_bytes()).into_diagnostic()?;
        debug!(output = %output.display(), bytes = bundle.len(), "wrote bundle");
    }
    for (cache_path, source) in &result.cache {
        atomic_write(cache_path, source.as_bytes()).into_diagnostic()?;
        debug!(path = %cache_path.display(), "wrote cache entry");
    }

    let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    if json {
        let output = BundleResultJson {
            ok: true,
            inputs: action.inputs.clone(),
            graph_size: result.graph.len(),
            chunks: result.chunks.len(),
            bundles: result
                .bundles
                .keys()
                .map(|path| path.display().to_string())
                .collect(),
            duration_ms,
        };
        println!(
            "{}",
            serde_json::to_string(&output).into_diagnostic()?
        );
    } else if !action.quiet {
        println!(
            "bundled {} input(s) into {} bundle(s) in {}ms",
            action.inputs.len(),
            result.bundles.len(),
            duration_ms
        );
        for output in result.bundles.keys() {
            println!("  {}", output.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reload_variants() {
        assert_eq!(parse_reload(None), Reload::None);
        assert_eq!(parse_reload(Some("")), Reload::All);
        assert_eq!(
            parse_reload(Some("a.ts, b.ts")),
            Reload::Only(vec!["a.ts".to_string(), "b.ts".to_string()])
        );
    }

    #[test]
    fn test_parse_output_map() {
        let pairs = vec!["src/index.html=dist/index.html".to_string()];
        let output_map = parse_output_map(&pairs).unwrap();
        assert_eq!(
            output_map.get("src/index.html"),
            Some(&PathBuf::from("dist/index.html"))
        );
    }

    #[test]
    fn test_parse_output_map_rejects_malformed() {
        let pairs = vec!["no-equals-sign".to_string()];
        assert!(parse_output_map(&pairs).is_err());
    }

    #[test]
    fn test_load_import_map_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("import_map.json");
        fs::write(&path, r#"{"imports": {"react": "https://esm.sh/react"}}"#).unwrap();

        let import_map = load_import_map(Some(&path)).unwrap();
        assert_eq!(
            import_map.resolve("react"),
            Some("https://esm.sh/react".to_string())
        );
    }

    #[test]
    fn test_load_import_map_rejects_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("import_map.json");
        fs::write(&path, "not json").unwrap();

        assert!(load_import_map(Some(&path)).is_err());
    }
}
