//! Asset bundles: unpacking exports into a folder and rendering them per target.
//!
//! Superset exports are ZIP files with a single root directory of YAML files.
//! A pull unpacks them into an assets folder with any existing Jinja markers
//! escaped, so that the files can be edited and templated. A push reads the
//! folder back, renders every YAML file with the target's context and repacks
//! it. A file `x.overrides.yaml` next to `x.yaml` is rendered too and
//! deep-merged into it; the overrides file itself is not shipped.

use glob::{glob_with, MatchOptions, Pattern};
use minijinja::{AutoEscape, Environment};
use serde_yaml::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Variables visible to the templates of one target.
pub type TemplateContext = BTreeMap<String, Value>;

/// Root directory of bundles built from an assets folder.
pub const BUNDLE_ROOT: &str = "bundle";

/// Bundle metadata is generated by Superset and never templated.
const METADATA_FILE: &str = "metadata.yaml";
const OVERRIDES_MARKER: &str = ".overrides";

/// Jinja delimiters that must survive a render untouched.
const JINJA_MARKERS: [&str; 4] = ["{{", "}}", "{%", "%}"];

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid assets path pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("failed to read assets: {0}")]
    Walk(#[from] glob::GlobError),
    #[error("{path} is not UTF-8 text")]
    Encoding { path: String },
    #[error("bundle entry {path} escapes the assets folder")]
    UnsafePath { path: String },
    #[error("failed to render {path}: {source}")]
    Render {
        path: String,
        #[source]
        source: minijinja::Error,
    },
    #[error("rendered {path} is not valid YAML: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// One file of a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleEntry {
    pub path: String,
    pub content: Vec<u8>,
}

impl BundleEntry {
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

pub fn is_yaml_config(path: &str) -> bool {
    path.ends_with(".yaml") || path.ends_with(".yml")
}

fn yaml_stem(path: &str) -> Option<(&str, &str)> {
    path.strip_suffix(".yaml")
        .map(|stem| (stem, ".yaml"))
        .or_else(|| path.strip_suffix(".yml").map(|stem| (stem, ".yml")))
}

fn is_overrides(path: &str) -> bool {
    yaml_stem(path).is_some_and(|(stem, _)| stem.ends_with(OVERRIDES_MARKER))
}

/// `dashboards/sales.yaml` -> `dashboards/sales.overrides.yaml`
fn overrides_path(path: &str) -> Option<String> {
    yaml_stem(path).map(|(stem, extension)| format!("{}{}{}", stem, OVERRIDES_MARKER, extension))
}

fn is_metadata(path: &str) -> bool {
    path.rsplit('/').next() == Some(METADATA_FILE)
}

fn is_template(path: &str) -> bool {
    is_yaml_config(path) && !is_metadata(path)
}

/// All files of a ZIP bundle, directories left out.
pub fn read_bundle(bytes: &[u8]) -> Result<Vec<BundleEntry>, BundleError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut entries = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        if file.is_dir() {
            continue;
        }
        let mut content = Vec::new();
        file.read_to_end(&mut content)?;
        entries.push(BundleEntry::new(file.name(), content));
    }
    Ok(entries)
}

pub fn write_bundle(entries: &[BundleEntry]) -> Result<Vec<u8>, BundleError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for entry in entries {
        writer.start_file(entry.path.as_str(), options)?;
        writer.write_all(&entry.content)?;
    }
    Ok(writer.finish()?.into_inner())
}

/// Make every Jinja delimiter in `text` render as itself.
///
/// `{{ x }}` becomes `{{ '{{' }} x {{ '}}' }}`.
pub fn escape_jinja(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    let mut rest = text;
    while !rest.is_empty() {
        match JINJA_MARKERS.iter().find(|marker| rest.starts_with(**marker)) {
            Some(marker) => {
                escaped.push_str("{{ '");
                escaped.push_str(marker);
                escaped.push_str("' }}");
                rest = &rest[marker.len()..];
            }
            None => {
                let next = rest.chars().next().map_or(1, char::len_utf8);
                escaped.push_str(&rest[..next]);
                rest = &rest[next..];
            }
        }
    }
    escaped
}

/// Path of an export entry below the assets folder, without the export's
/// root directory. `None` for entries that would land outside the folder.
fn relative_asset_path(name: &str) -> Option<PathBuf> {
    let mut components = Path::new(name).components();
    components.next();
    let mut relative = PathBuf::new();
    for component in components {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    (!relative.as_os_str().is_empty()).then_some(relative)
}

/// Unpack an exported ZIP into `folder`, escaping Jinja in the YAML files.
///
/// Returns the number of files written. Existing files are replaced; files
/// not part of the export (overrides, for instance) are left alone.
pub fn unpack_bundle(bytes: &[u8], folder: &Path) -> Result<usize, BundleError> {
    let entries = read_bundle(bytes)?;
    for entry in &entries {
        let relative = relative_asset_path(&entry.path).ok_or_else(|| BundleError::UnsafePath {
            path: entry.path.clone(),
        })?;
        let target = folder.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        if is_template(&entry.path) {
            fs::write(&target, escape_jinja(as_text(entry)?))?;
        } else {
            fs::write(&target, &entry.content)?;
        }
        trace!("Wrote {}", target.display());
    }
    debug!("Unpacked {} file(s) into {}", entries.len(), folder.display());
    Ok(entries.len())
}

/// Every file below `folder` as a bundle entry under [`BUNDLE_ROOT`], sorted
/// by path. Hidden files and directories are skipped.
pub fn load_assets(folder: &Path) -> Result<Vec<BundleEntry>, BundleError> {
    if !folder.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} is not a directory, pull first", folder.display()),
        )
        .into());
    }
    let root = folder.to_str().ok_or_else(|| BundleError::Encoding {
        path: folder.display().to_string(),
    })?;
    let pattern = format!("{}/**/*", Pattern::escape(root));
    let options = MatchOptions {
        require_literal_leading_dot: true,
        ..MatchOptions::new()
    };

    let mut entries = Vec::new();
    for path in glob_with(&pattern, options)? {
        let path = path?;
        if !path.is_file() {
            continue;
        }
        let relative = path
            .strip_prefix(folder)
            .map_err(|_| BundleError::UnsafePath {
                path: path.display().to_string(),
            })?
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        entries.push(BundleEntry::new(
            format!("{}/{}", BUNDLE_ROOT, relative),
            fs::read(&path)?,
        ));
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    debug!("Loaded {} file(s) from {}", entries.len(), folder.display());
    Ok(entries)
}

fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.set_keep_trailing_newline(true);
    env
}

fn as_text(entry: &BundleEntry) -> Result<&str, BundleError> {
    std::str::from_utf8(&entry.content).map_err(|_| BundleError::Encoding {
        path: entry.path.clone(),
    })
}

fn render(
    env: &Environment<'_>,
    entry: &BundleEntry,
    context: &minijinja::Value,
) -> Result<String, BundleError> {
    env.render_str(as_text(entry)?, context)
        .map_err(|source| BundleError::Render {
            path: entry.path.clone(),
            source,
        })
}

fn parse(path: &str, text: &str) -> Result<Value, BundleError> {
    serde_yaml::from_str(text).map_err(|source| BundleError::Yaml {
        path: path.to_string(),
        source,
    })
}

/// Recursively merge `overrides` into `base`. Mappings merge key by key,
/// anything else is replaced.
pub fn merge_yaml(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Mapping(base), Value::Mapping(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(existing) => merge_yaml(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overrides) => *base = overrides,
    }
}

/// Render every YAML file of `entries` with `context` and apply overrides.
pub fn render_entries(
    entries: &[BundleEntry],
    context: &TemplateContext,
) -> Result<Vec<BundleEntry>, BundleError> {
    let by_path: HashMap<&str, &BundleEntry> =
        entries.iter().map(|e| (e.path.as_str(), e)).collect();
    let env = environment();
    let context = minijinja::Value::from_serialize(context);

    let mut rendered = Vec::with_capacity(entries.len());
    for entry in entries {
        if is_overrides(&entry.path) {
            continue;
        }
        if !is_template(&entry.path) {
            rendered.push(entry.clone());
            continue;
        }

        trace!("Rendering {}", entry.path);
        let mut text = render(&env, entry, &context)?;
        let overrides = overrides_path(&entry.path).and_then(|p| by_path.get(p.as_str()).copied());
        if let Some(overrides) = overrides {
            debug!("Applying {} to {}", overrides.path, entry.path);
            let mut config = parse(&entry.path, &text)?;
            let patch = parse(&overrides.path, &render(&env, overrides, &context)?)?;
            merge_yaml(&mut config, patch);
            text = serde_yaml::to_string(&config).map_err(|source| BundleError::Yaml {
                path: entry.path.clone(),
                source,
            })?;
        }
        rendered.push(BundleEntry::new(entry.path.clone(), text));
    }

    debug!("Rendered {} file(s)", rendered.len());
    Ok(rendered)
}

/// Build the ZIP pushed to one target from an assets folder.
pub fn render_assets(folder: &Path, context: &TemplateContext) -> Result<Vec<u8>, BundleError> {
    let entries = load_assets(folder)?;
    write_bundle(&render_entries(&entries, context)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn context(pairs: &[(&str, &str)]) -> TemplateContext {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect()
    }

    fn file<'a>(entries: &'a [BundleEntry], path: &str) -> &'a str {
        let entry = entries
            .iter()
            .find(|e| e.path == path)
            .unwrap_or_else(|| panic!("{path} missing from bundle"));
        std::str::from_utf8(&entry.content).unwrap()
    }

    fn assets() -> Vec<BundleEntry> {
        vec![
            BundleEntry::new("bundle/metadata.yaml", "version: 1.0.0\ntype: Dashboard\n"),
            BundleEntry::new(
                "bundle/dashboards/sales.yaml",
                "dashboard_title: Sales for {{ customer }}\nslug: sales-{{ customer | lower }}\n",
            ),
            BundleEntry::new(
                "bundle/databases/main.yaml",
                "database_name: main\nsqlalchemy_uri: postgresql://{{ db_host }}/sales\nextra:\n  a: 1\n  b: 2\n",
            ),
            BundleEntry::new(
                "bundle/databases/main.overrides.yaml",
                "extra:\n  b: {{ pool }}\n",
            ),
            BundleEntry::new("bundle/thumbnail.png", vec![0x89, b'P', b'N', b'G']),
        ]
    }

    #[test]
    fn test_paths() {
        assert!(is_yaml_config("a/b.yaml"));
        assert!(is_yaml_config("a/b.yml"));
        assert!(!is_yaml_config("a/b.json"));
        assert!(is_overrides("a/b.overrides.yml"));
        assert!(!is_overrides("a/b.yaml"));
        assert_eq!(
            overrides_path("a/b.yaml").as_deref(),
            Some("a/b.overrides.yaml")
        );
        assert!(is_metadata("export/metadata.yaml"));
        assert!(!is_metadata("export/charts/metadata_chart.yaml"));

        assert_eq!(
            relative_asset_path("dashboard_export_1/charts/a.yaml"),
            Some(PathBuf::from("charts/a.yaml"))
        );
        assert_eq!(relative_asset_path("dashboard_export_1/"), None);
        assert_eq!(relative_asset_path("export/../../etc/passwd"), None);
    }

    #[test]
    fn test_escaped_jinja_renders_as_itself() {
        let sql = "sql: SELECT * FROM t WHERE ds = '{{ ds }}' {% if x %}AND y{% endif %}\n";
        let escaped = escape_jinja(sql);
        assert!(!escaped.contains("{{ ds }}"));

        let entries = vec![BundleEntry::new("bundle/datasets/t.yaml", escaped)];
        let rendered = render_entries(&entries, &TemplateContext::new()).unwrap();
        assert_eq!(file(&rendered, "bundle/datasets/t.yaml"), sql);

        assert_eq!(escape_jinja("naïve {x} }"), "naïve {x} }");
    }

    #[test]
    fn test_each_context_gets_its_own_rendering() {
        let entries = assets();
        let acme = render_entries(
            &entries,
            &context(&[("customer", "ACME"), ("db_host", "acme-db"), ("pool", "5")]),
        )
        .unwrap();
        let globex = render_entries(
            &entries,
            &context(&[("customer", "Globex"), ("db_host", "globex-db"), ("pool", "9")]),
        )
        .unwrap();

        assert_eq!(
            file(&acme, "bundle/dashboards/sales.yaml"),
            "dashboard_title: Sales for ACME\nslug: sales-acme\n"
        );
        assert_eq!(
            file(&globex, "bundle/dashboards/sales.yaml"),
            "dashboard_title: Sales for Globex\nslug: sales-globex\n"
        );
        assert_eq!(
            file(&acme, "bundle/metadata.yaml"),
            "version: 1.0.0\ntype: Dashboard\n"
        );
    }

    #[test]
    fn test_overrides_are_merged_and_dropped() {
        let rendered = render_entries(
            &assets(),
            &context(&[("customer", "ACME"), ("db_host", "acme-db"), ("pool", "5")]),
        )
        .unwrap();

        assert!(rendered
            .iter()
            .all(|e| e.path != "bundle/databases/main.overrides.yaml"));
        let database: Value =
            serde_yaml::from_str(file(&rendered, "bundle/databases/main.yaml")).unwrap();
        assert_eq!(database["sqlalchemy_uri"], "postgresql://acme-db/sales");
        assert_eq!(database["extra"]["a"], 1);
        assert_eq!(database["extra"]["b"], 5);

        let png = rendered
            .iter()
            .find(|e| e.path == "bundle/thumbnail.png")
            .unwrap();
        assert_eq!(png.content, vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_template_errors_name_the_file() {
        let entries = vec![BundleEntry::new("bundle/charts/bad.yaml", "x: {{ oops(")];
        match render_entries(&entries, &TemplateContext::new()) {
            Err(BundleError::Render { path, .. }) => assert_eq!(path, "bundle/charts/bad.yaml"),
            other => panic!("unexpected result: {other:?}"),
        }
        let dir = tempdir().unwrap();
        assert!(matches!(
            unpack_bundle(b"not a zip", dir.path()),
            Err(BundleError::Zip(_))
        ));
        assert!(matches!(
            load_assets(&dir.path().join("missing")),
            Err(BundleError::Io(_))
        ));
    }

    #[test]
    fn test_unpack_then_render_folder() {
        let export = write_bundle(&[
            BundleEntry::new(
                "dashboard_export_20240101T000000/metadata.yaml",
                "version: 1.0.0\n",
            ),
            BundleEntry::new(
                "dashboard_export_20240101T000000/datasets/orders.yaml",
                "table_name: orders\nsql: SELECT '{{ current_username() }}'\n",
            ),
        ])
        .unwrap();
        let dir = tempdir().unwrap();
        assert_eq!(unpack_bundle(&export, dir.path()).unwrap(), 2);
        assert!(dir.path().join("datasets/orders.yaml").exists());

        // a template added after the pull
        fs::write(
            dir.path().join("datasets/orders.overrides.yaml"),
            "table_name: orders_{{ region }}\n",
        )
        .unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/HEAD"), "ref: main\n").unwrap();

        let bundle = render_assets(dir.path(), &context(&[("region", "eu")])).unwrap();
        let entries = read_bundle(&bundle).unwrap();
        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["bundle/datasets/orders.yaml", "bundle/metadata.yaml"]);

        let dataset: Value =
            serde_yaml::from_str(file(&entries, "bundle/datasets/orders.yaml")).unwrap();
        assert_eq!(dataset["table_name"], "orders_eu");
        assert_eq!(dataset["sql"], "SELECT '{{ current_username() }}'");
    }
}
