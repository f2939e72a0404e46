//! Loading `tsconfig.json` files into a [`Project`].

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::compiler::CompilerOverrides;
use crate::error::CompileError;
use crate::jsonc;
use crate::module_kind::ModuleKind;
use crate::paths::{common_ancestor, normalize};
use crate::wildcard::Pattern;

/// Compiler options holding a path, resolved against the file declaring them.
const PATH_OPTIONS: &[&str] = &[
    "rootDir",
    "outDir",
    "baseUrl",
    "declarationDir",
    "tsBuildInfoFile",
];

/// Directories never searched by the default exclusions.
const DEFAULT_EXCLUDES: &[&str] = &["node_modules", "bower_components", "jspm_packages"];

const SOURCE_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".mts", ".cts"];

const DECLARATION_EXTENSIONS: &[&str] = &[".d.ts", ".d.mts", ".d.cts"];

/// One configuration file as written.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    #[serde(default)]
    extends: Option<Value>,
    #[serde(default)]
    compiler_options: Map<String, Value>,
    #[serde(default)]
    files: Option<Vec<String>>,
    #[serde(default)]
    include: Option<Vec<String>>,
    #[serde(default)]
    exclude: Option<Vec<String>>,
}

/// A file list together with the directory its entries are relative to.
#[derive(Debug, Clone)]
struct Specs {
    base: PathBuf,
    patterns: Vec<String>,
}

/// The result of merging a configuration with everything it extends.
#[derive(Debug, Default)]
struct Merged {
    options: Map<String, Value>,
    files: Option<Specs>,
    include: Option<Specs>,
    exclude: Option<Specs>,
    config_files: Vec<PathBuf>,
}

/// A loaded TypeScript project: merged options plus the selected sources.
#[derive(Debug, Clone)]
pub struct Project {
    /// The configuration file the project was loaded from.
    pub config_path: PathBuf,
    /// Its directory; the compiler runs here.
    pub config_dir: PathBuf,
    /// Merged compiler options, overrides applied, path options absolute.
    pub options: Map<String, Value>,
    /// The overrides that were applied.
    pub overrides: CompilerOverrides,
    /// Selected source files, absolute, sorted.
    pub sources: Vec<PathBuf>,
    /// The directory output paths are relative to.
    pub root_dir: PathBuf,
    /// The effective `module` option.
    pub module_kind: ModuleKind,
    /// The `module` option as written in the configuration chain or the
    /// overrides; `None` when the compiler default applies.
    pub declared_module: Option<ModuleKind>,
    /// Every configuration file read, the `extends` chain included.
    pub config_files: Vec<PathBuf>,
}

impl Project {
    /// Loads `config_path`, follows its `extends` chain, applies `overrides`
    /// and selects the project's source files.
    pub fn load(config_path: &Path, overrides: &CompilerOverrides) -> Result<Project, CompileError> {
        let config_path = absolute(config_path)?;
        let config_dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));

        let mut merged = load_chain(&config_path, &mut Vec::new())?;
        for (name, value) in overrides.iter() {
            merged
                .options
                .insert(name.to_string(), absolutize_option(name, value.clone(), &config_dir));
        }

        let out_dir = merged.options.get("outDir").and_then(Value::as_str).map(PathBuf::from);
        let sources = select_sources(&merged, &config_dir, out_dir.as_deref())?;
        let declared_module = declared_module(&merged.options, &config_path)?;
        let module_kind = declared_module.unwrap_or_else(|| {
            ModuleKind::default_for_target(merged.options.get("target").and_then(Value::as_str))
        });

        let root_dir = match merged.options.get("rootDir").and_then(Value::as_str) {
            Some(dir) => PathBuf::from(dir),
            None => common_ancestor(
                sources
                    .iter()
                    .filter(|s| !is_declaration(s))
                    .map(PathBuf::as_path),
            )
            .unwrap_or_else(|| config_dir.clone()),
        };

        tracing::debug!(
            config = %config_path.display(),
            sources = sources.len(),
            module = %module_kind,
            "loaded project"
        );

        Ok(Project {
            config_path,
            config_dir,
            options: merged.options,
            overrides: overrides.clone(),
            sources,
            root_dir,
            module_kind,
            declared_module,
            config_files: merged.config_files,
        })
    }

    /// Sources the compiler emits output for (declaration files excluded).
    pub fn emitted_sources(&self) -> impl Iterator<Item = &Path> {
        self.sources
            .iter()
            .filter(|s| !is_declaration(s))
            .map(PathBuf::as_path)
    }

    /// `source` relative to the root dir, or `None` if it lies outside.
    pub fn relative_source(&self, source: &Path) -> Option<PathBuf> {
        source
            .strip_prefix(&self.root_dir)
            .ok()
            .map(Path::to_path_buf)
    }

    /// A string-valued compiler option.
    pub fn option_str(&self, name: &str) -> Option<&str> {
        self.options.get(name).and_then(Value::as_str)
    }
}

fn absolute(path: &Path) -> Result<PathBuf, CompileError> {
    if path.is_absolute() {
        return Ok(normalize(path));
    }
    let cwd = std::env::current_dir().map_err(|e| CompileError::io(path, e))?;
    Ok(normalize(&cwd.join(path)))
}

fn is_declaration(path: &Path) -> bool {
    let name = path.to_string_lossy();
    DECLARATION_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

fn is_source(path: &Path) -> bool {
    let name = path.to_string_lossy();
    SOURCE_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

fn absolutize_option(name: &str, value: Value, base: &Path) -> Value {
    match value {
        Value::String(s) if PATH_OPTIONS.contains(&name) => {
            Value::String(normalize(&base.join(s)).to_string_lossy().into_owned())
        }
        other => other,
    }
}

fn load_chain(path: &Path, visiting: &mut Vec<PathBuf>) -> Result<Merged, CompileError> {
    if visiting.iter().any(|p| p == path) {
        return Err(CompileError::config(path, "circular `extends`"));
    }
    let text = std::fs::read_to_string(path).map_err(|e| CompileError::io(path, e))?;
    let raw: RawConfig = serde_json::from_str(&jsonc::strip(&text))
        .map_err(|e| CompileError::config(path, e.to_string()))?;
    let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

    visiting.push(path.to_path_buf());
    let mut merged = Merged::default();
    for spec in extends_list(raw.extends, path)? {
        let parent_path = resolve_extends(&dir, &spec, path)?;
        let parent = load_chain(&parent_path, visiting)?;
        merged.options.extend(parent.options);
        merged.files = parent.files.or(merged.files);
        merged.include = parent.include.or(merged.include);
        merged.exclude = parent.exclude.or(merged.exclude);
        merged.config_files.extend(parent.config_files);
    }
    visiting.pop();

    for (name, value) in raw.compiler_options {
        let value = absolutize_option(&name, value, &dir);
        merged.options.insert(name, value);
    }
    let specs = |patterns: Option<Vec<String>>| {
        patterns.map(|patterns| Specs {
            base: dir.clone(),
            patterns,
        })
    };
    if let Some(files) = specs(raw.files) {
        merged.files = Some(files);
    }
    if let Some(include) = specs(raw.include) {
        merged.include = Some(include);
    }
    if let Some(exclude) = specs(raw.exclude) {
        merged.exclude = Some(exclude);
    }
    merged.config_files.push(path.to_path_buf());
    Ok(merged)
}

fn extends_list(value: Option<Value>, path: &Path) -> Result<Vec<String>, CompileError> {
    match value {
        None => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(vec![s]),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                _ => Err(CompileError::config(path, "`extends` entries must be strings")),
            })
            .collect(),
        Some(_) => Err(CompileError::config(
            path,
            "`extends` must be a string or a list of strings",
        )),
    }
}

/// Finds the file an `extends` entry refers to: a path relative to the
/// declaring file, or a package under an ancestor `node_modules`.
fn resolve_extends(dir: &Path, spec: &str, from: &Path) -> Result<PathBuf, CompileError> {
    let with_json = |p: PathBuf| -> Option<PathBuf> {
        if p.is_file() {
            return Some(p);
        }
        let mut named = p.clone().into_os_string();
        named.push(".json");
        let named = PathBuf::from(named);
        if named.is_file() {
            return Some(named);
        }
        let nested = p.join("tsconfig.json");
        nested.is_file().then_some(nested)
    };

    let found = if spec.starts_with('.') || Path::new(spec).is_absolute() {
        with_json(normalize(&dir.join(spec)))
    } else {
        dir.ancestors()
            .find_map(|ancestor| with_json(ancestor.join("node_modules").join(spec)))
    };
    found.ok_or_else(|| CompileError::config(from, format!("cannot find base configuration `{spec}`")))
}

fn declared_module(
    options: &Map<String, Value>,
    path: &Path,
) -> Result<Option<ModuleKind>, CompileError> {
    match options.get("module") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => ModuleKind::parse(s)
            .map(Some)
            .ok_or_else(|| CompileError::config(path, format!("unknown module kind `{s}`"))),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(ModuleKind::from_code)
            .map(Some)
            .ok_or_else(|| CompileError::config(path, format!("unknown module kind {n}"))),
        Some(other) => Err(CompileError::config(
            path,
            format!("invalid module option {other}"),
        )),
    }
}

fn select_sources(
    merged: &Merged,
    config_dir: &Path,
    out_dir: Option<&Path>,
) -> Result<Vec<PathBuf>, CompileError> {
    let mut selected = BTreeSet::new();

    if let Some(files) = &merged.files {
        for file in &files.patterns {
            let path = normalize(&files.base.join(file));
            if !path.is_file() {
                return Err(CompileError::config(
                    config_dir,
                    format!("file `{}` listed in `files` does not exist", path.display()),
                ));
            }
            selected.insert(path);
        }
    }

    let include = match (&merged.include, &merged.files) {
        (Some(include), _) => include.clone(),
        (None, Some(_)) => Specs {
            base: config_dir.to_path_buf(),
            patterns: Vec::new(),
        },
        (None, None) => Specs {
            base: config_dir.to_path_buf(),
            patterns: vec!["**/*".to_string()],
        },
    };
    let mut excludes: Vec<Pattern> = match &merged.exclude {
        Some(exclude) => exclude
            .patterns
            .iter()
            .map(|p| Pattern::exclude(&exclude.base, p))
            .collect(),
        None => DEFAULT_EXCLUDES
            .iter()
            .map(|p| Pattern::exclude(config_dir, p))
            .collect(),
    };
    if merged.exclude.is_none() {
        if let Some(out_dir) = out_dir {
            excludes.push(Pattern::exclude(config_dir, &out_dir.to_string_lossy()));
        }
    }

    for pattern in include.patterns.iter().map(|p| Pattern::include(&include.base, p)) {
        let mut visit = |path: &Path| {
            if is_source(path) && pattern.matches(path) {
                selected.insert(path.to_path_buf());
            }
        };
        walk(pattern.root(), &excludes, &mut visit)
            .map_err(|e| CompileError::io(pattern.root(), e))?;
    }

    Ok(selected.into_iter().collect())
}

/// Visits every file under `dir`, skipping excluded paths.
fn walk(dir: &Path, excludes: &[Pattern], visit: &mut dyn FnMut(&Path)) -> std::io::Result<()> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    let mut paths = Vec::new();
    for entry in entries {
        paths.push(entry?.path());
    }
    paths.sort();
    for path in paths {
        if excludes.iter().any(|p| p.matches_path_or_ancestor(&path)) {
            continue;
        }
        if path.is_dir() {
            walk(&path, excludes, visit)?;
        } else if path.is_file() {
            visit(&path);
        }
    }
    Ok(())
}
