//! The top-level compile task and its memoization.

use std::path::PathBuf;
use std::sync::Arc;

use futures::future::FutureExt;
use tsbuild_cache::{memoize, CacheError, Fingerprinter, SettledFuture, StampStore, TaskCache};
use tsbuild_common::{ContentHash, TaskKey};
use tsbuild_compiler::{Compiler, CompilerOverrides, Project};
use tsbuild_config::{resolve_paths, BinConfig, LayoutConfig, ProjectConfig};

use crate::bin::plan_bin;
use crate::delegate::{DelegationPolicy, NeverDelegate};
use crate::error::{BuildError, TaskOutcome};
use crate::fanout::{compile_into, FanOutStats};

/// Version recorded in build stamps; stamps from other versions are stale.
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A shared handle to a task's settled outcome.
pub type SettledTask = SettledFuture<TaskOutcome>;

/// Everything a compile task needs besides its key.
#[derive(Clone)]
pub struct TaskEnv {
    /// The compiler used for primary and bin compilations.
    pub compiler: Arc<dyn Compiler>,
    /// Decides which keys run in a child process.
    pub policy: Arc<dyn DelegationPolicy>,
    /// Output and configuration naming.
    pub layout: LayoutConfig,
    /// The bin sub-task settings.
    pub bin: BinConfig,
    /// Directory `layout` paths are relative to.
    pub project_root: PathBuf,
    /// Persistent build stamps, if enabled.
    pub stamps: Option<StampStore>,
    /// Compile even when the stamp says the output is current.
    pub force: bool,
}

impl TaskEnv {
    /// An environment with the default layout and bin settings, no
    /// delegation and no stamps.
    pub fn new(compiler: Arc<dyn Compiler>, project_root: impl Into<PathBuf>) -> Self {
        Self {
            compiler,
            policy: Arc::new(NeverDelegate),
            layout: LayoutConfig::default(),
            bin: BinConfig::default(),
            project_root: project_root.into(),
            stamps: None,
            force: false,
        }
    }

    /// An environment configured from `tsbuild.toml` settings.
    pub fn from_config(
        config: &ProjectConfig,
        compiler: Arc<dyn Compiler>,
        policy: Arc<dyn DelegationPolicy>,
        project_root: impl Into<PathBuf>,
    ) -> Self {
        let project_root = project_root.into();
        let stamps = config
            .cache
            .persistent
            .then(|| StampStore::new(&project_root.join(&config.cache.dir), TOOL_VERSION));
        Self {
            compiler,
            policy,
            layout: config.layout.clone(),
            bin: config.bin.clone(),
            project_root,
            stamps,
            force: false,
        }
    }
}

/// The memoized compile task.
///
/// [`run`](TypescriptTask::run) returns the same settled handle for every call
/// with an equal key, so each key is compiled (or delegated) at most once per
/// cache, and its outcome, success or failure, is replayed to every caller.
pub struct TypescriptTask {
    run: Box<dyn Fn(TaskKey) -> SettledTask + Send + Sync>,
    cache: Arc<TaskCache<TaskKey, TaskOutcome>>,
}

impl TypescriptTask {
    /// Creates the task over an explicit cache, typically one per process.
    pub fn new(env: TaskEnv, cache: Arc<TaskCache<TaskKey, TaskOutcome>>) -> Self {
        let env = Arc::new(env);
        let run = memoize(Arc::clone(&cache), move |key: &TaskKey| {
            let env = Arc::clone(&env);
            let key = key.clone();
            async move { execute(&env, &key).await.map_err(Arc::new) }.boxed()
        });
        Self {
            run: Box::new(run),
            cache,
        }
    }

    /// Returns the settled-once outcome handle for `key`.
    ///
    /// The work starts when the handle is first awaited.
    pub fn run(&self, key: TaskKey) -> SettledTask {
        (self.run)(key)
    }

    /// The cache backing this task.
    pub fn cache(&self) -> &Arc<TaskCache<TaskKey, TaskOutcome>> {
        &self.cache
    }
}

async fn execute(env: &TaskEnv, key: &TaskKey) -> Result<(), BuildError> {
    if env.policy.should_run_in_child_process(key) {
        return env.policy.spawn("compile", key).await;
    }

    let primary = resolve_paths(&env.layout, key);
    let bin = plan_bin(&env.layout, &env.bin, &env.project_root, &primary, key)?;
    let primary = primary.rooted(&env.project_root);

    let project = Project::load(&primary.tsconfig_path, &CompilerOverrides::new())?;
    let bin_project = match &bin {
        Some(plan) => Some(Project::load(&plan.paths.tsconfig_path, &plan.overrides)?),
        None => None,
    };

    let fingerprint = if env.stamps.is_some() {
        let projects = [Some(&project), bin_project.as_ref()];
        match fingerprint_inputs(env, key, projects.into_iter().flatten()) {
            Ok(fp) => Some(fp),
            Err(e) => {
                tracing::warn!(%key, error = %e, "cannot fingerprint inputs; compiling");
                None
            }
        }
    } else {
        None
    };

    if let Some(stamps) = &env.stamps {
        if let (Some((fp, _)), false) = (fingerprint, env.force) {
            if primary.out_dir.is_dir() && stamps.is_fresh(key, fp) {
                tracing::info!(%key, "up to date");
                return Ok(());
            }
        }
        // A failed build must not leave the previous stamp looking current.
        if let Err(e) = stamps.invalidate(key) {
            tracing::warn!(%key, error = %e, "failed to clear build stamp");
        }
    }

    tracing::info!(%key, config = %primary.tsconfig_path.display(), "compiling");
    let compiler = env.compiler.as_ref();
    let bin_build = async {
        match (&bin, &bin_project) {
            (Some(plan), Some(project)) => compile_into(compiler, project, &plan.paths.out_dir)
                .await
                .map(Some),
            _ => Ok(None),
        }
    };
    let (mut stats, bin_stats): (FanOutStats, Option<FanOutStats>) = futures::try_join!(
        compile_into(compiler, &project, &primary.out_dir),
        bin_build,
    )?;
    if let Some(bin_stats) = bin_stats {
        stats.absorb(bin_stats);
    }
    tracing::info!(
        %key,
        sources = stats.sources,
        declarations = stats.declarations,
        code = stats.code,
        "compiled"
    );

    if let (Some(stamps), Some((fp, inputs))) = (&env.stamps, fingerprint) {
        if let Err(e) = stamps.record(key, fp, inputs, stats.outputs) {
            tracing::warn!(%key, error = %e, "failed to record build stamp");
        }
    }
    Ok(())
}

/// Hashes everything that decides the output of `key`.
fn fingerprint_inputs<'a>(
    env: &TaskEnv,
    key: &TaskKey,
    projects: impl IntoIterator<Item = &'a Project>,
) -> Result<(ContentHash, usize), CacheError> {
    let mut fp = Fingerprinter::new();
    fp.add_value("compiler", &env.compiler.identity());
    fp.add_value("key", &key.to_string());
    fp.add_value("bin.dir", &env.bin.dir.to_string_lossy());
    for project in projects {
        fp.add_value("config", &project.config_path.to_string_lossy());
        let options = serde_json::to_string(&project.options).map_err(|e| {
            CacheError::Serialization {
                reason: e.to_string(),
            }
        })?;
        fp.add_value("options", &options);
        fp.add_files(project.config_files.iter().map(PathBuf::as_path))?;
        fp.add_files(project.sources.iter().map(PathBuf::as_path))?;
    }
    Ok((fp.finish(), fp.file_count()))
}
