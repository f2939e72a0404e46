//! Integration tests for the compile task on on-disk project layouts.
//!
//! A scripted compiler stands in for `tsc`: it emits one `.js` and one
//! `.d.ts` (each with a map) per source, counts its invocations and can be
//! told to fail for particular configuration files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use tempfile::TempDir;
use tsbuild_cache::{StampStore, TaskCache};
use tsbuild_common::TaskKey;
use tsbuild_compiler::{
    CompilationOutputSet, CompileError, Compiler, CompilerOverrides, EmittedFile, Project,
    SourceMap,
};
use tsbuild_config::BinConfig;
use tsbuild_pipeline::{
    fan_out, BuildError, DelegationPolicy, TaskEnv, TaskOutcome, TypescriptTask,
};

// ---------------------------------------------------------------------------
// Helper: scripted compiler
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ScriptedCompiler {
    calls: AtomicUsize,
    configs: Mutex<Vec<PathBuf>>,
    /// Configuration file names that fail to compile.
    failing: Vec<String>,
}

impl ScriptedCompiler {
    fn failing(names: &[&str]) -> Self {
        Self {
            failing: names.iter().map(|n| n.to_string()).collect(),
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn map_for(source: &Path, file: &str) -> SourceMap {
    SourceMap {
        version: 3,
        file: Some(file.to_string()),
        source_root: Some(String::new()),
        sources: vec![source.to_string_lossy().into_owned()],
        sources_content: Some(vec![Some("// original".to_string())]),
        names: Vec::new(),
        mappings: "AAAA".to_string(),
    }
}

impl Compiler for ScriptedCompiler {
    fn compile(&self, project: &Project) -> CompilationOutputSet {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.configs
            .lock()
            .unwrap()
            .push(project.config_path.clone());

        let name = project
            .config_path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned();
        if self.failing.contains(&name) {
            return CompilationOutputSet::failed(|| CompileError::Failed { errors: 1 });
        }

        let (sender, output) = CompilationOutputSet::channel();
        for source in project.emitted_sources() {
            let rel = project.relative_source(source).unwrap();
            let js = rel.with_extension("js");
            let dts = rel.with_extension("d.ts");
            let js_name = js.file_name().unwrap().to_string_lossy().into_owned();
            let dts_name = dts.file_name().unwrap().to_string_lossy().into_owned();
            sender.emit(
                EmittedFile::new(
                    &js,
                    format!("exports.x = 1;\n//# sourceMappingURL={js_name}.map\n"),
                )
                .with_source_map(map_for(source, &js_name)),
            );
            sender.emit(
                EmittedFile::new(&dts, "export declare const x: number;\n")
                    .with_source_map(map_for(source, &dts_name)),
            );
        }
        sender.finish();
        output
    }

    fn identity(&self) -> String {
        "scripted-tsc 1.0".to_string()
    }
}

// ---------------------------------------------------------------------------
// Helper: delegation policy that records spawns
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RecordingPolicy {
    delegate: bool,
    spawned: Mutex<Vec<(String, TaskKey)>>,
}

impl DelegationPolicy for RecordingPolicy {
    fn should_run_in_child_process(&self, _key: &TaskKey) -> bool {
        self.delegate
    }

    fn spawn(&self, command: &str, key: &TaskKey) -> BoxFuture<'static, Result<(), BuildError>> {
        self.spawned
            .lock()
            .unwrap()
            .push((command.to_string(), key.clone()));
        async { Ok(()) }.boxed()
    }
}

// ---------------------------------------------------------------------------
// Helper: project fixture
// ---------------------------------------------------------------------------

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A small project laid out like the Arrow JS package.
fn fixture() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "src/Arrow.ts", "export * from './util/int';\n");
    write(root, "src/util/int.ts", "export const x = 1;\n");
    write(root, "src/bin/arrow2csv.ts", "console.log('csv');\n");
    write(
        root,
        "tsconfig/tsconfig.base.json",
        r#"{
  "compilerOptions": { "rootDir": "../src", "strict": true },
  "include": ["../src/**/*.ts"],
  "exclude": ["../src/bin/**"]
}"#,
    );
    write(
        root,
        "tsconfig/tsconfig.node-cjs.json",
        r#"{ "extends": "./tsconfig.base.json", "compilerOptions": { "module": "commonjs" } }"#,
    );
    write(
        root,
        "tsconfig/tsconfig.node-esm.json",
        r#"{ "extends": "./tsconfig.base.json", "compilerOptions": { "module": "es2015" } }"#,
    );
    write(
        root,
        "tsconfig/tsconfig.bin-cjs.json",
        r#"{
  "extends": "./tsconfig.base.json",
  "compilerOptions": { "rootDir": "../src/bin", "module": "commonjs" },
  "include": ["../src/bin/*.ts"],
  "exclude": []
}"#,
    );
    dir
}

fn key(t: &str, f: &str) -> TaskKey {
    TaskKey::parse(t, f).unwrap()
}

fn task(root: &Path, compiler: &Arc<ScriptedCompiler>) -> TypescriptTask {
    let env = TaskEnv::new(Arc::clone(compiler) as Arc<dyn Compiler>, root);
    TypescriptTask::new(env, Arc::new(TaskCache::new()))
}

fn read(path: PathBuf) -> String {
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {e}", path.display()))
}

// ===========================================================================
// Category A: output layout scenarios
// ===========================================================================

#[tokio::test]
async fn node_cjs_layout() {
    let dir = fixture();
    let compiler = Arc::new(ScriptedCompiler::default());
    let outcome = task(dir.path(), &compiler).run(key("node", "cjs")).await;
    assert!(outcome.is_ok(), "{outcome:?}");

    let out = dir.path().join("targets/node/cjs");
    assert_eq!(read(out.join("src/Arrow.ts")), "export * from './util/int';\n");
    assert_eq!(read(out.join("src/util/int.ts")), "export const x = 1;\n");
    assert!(!out.join("src/bin").exists());

    let js = read(out.join("util/int.js"));
    assert!(js.ends_with("//# sourceMappingURL=int.js.map"));
    assert_eq!(js.matches("sourceMappingURL").count(), 1);
    assert!(out.join("util/int.d.ts").is_file());
    assert!(out.join("util/int.d.ts.map").is_file());
    assert!(!out.join("util/int.mjs.map").exists());

    let map: serde_json::Value = serde_json::from_str(&read(out.join("util/int.js.map"))).unwrap();
    assert_eq!(map["file"], "int.js");
    assert_eq!(map["sourceRoot"], "src");
    assert_eq!(map["sources"][0], "util/int.ts");
    assert!(map.get("sourcesContent").is_none());

    // Bin output mirrors the same structure one level down.
    assert!(out.join("bin/arrow2csv.js").is_file());
    assert!(out.join("bin/arrow2csv.js.map").is_file());
    assert!(out.join("bin/src/arrow2csv.ts").is_file());

    assert_eq!(compiler.calls(), 2);
}

#[tokio::test]
async fn node_esm_renames_code_maps_only() {
    let dir = fixture();
    let compiler = Arc::new(ScriptedCompiler::default());
    task(dir.path(), &compiler)
        .run(key("node", "esm"))
        .await
        .unwrap();

    let out = dir.path().join("targets/node/esm");
    assert!(out.join("Arrow.mjs.map").is_file());
    assert!(!out.join("Arrow.js.map").exists());
    assert!(read(out.join("Arrow.js")).ends_with("//# sourceMappingURL=Arrow.mjs.map"));
    assert!(out.join("Arrow.d.ts.map").is_file());
    assert!(read(out.join("Arrow.d.ts")).ends_with("//# sourceMappingURL=Arrow.d.ts.map"));

    // The bin configuration is CommonJS whatever the caller's format.
    assert!(out.join("bin/arrow2csv.js.map").is_file());
}

#[tokio::test]
async fn bin_maps_keep_js_name_without_explicit_module() {
    let dir = fixture();
    write(
        dir.path(),
        "tsconfig/tsconfig.es2015-esm.json",
        r#"{ "extends": "./tsconfig.base.json", "compilerOptions": { "target": "es2015", "module": "es2015" } }"#,
    );
    write(
        dir.path(),
        "tsconfig/tsconfig.bin-cjs.json",
        r#"{
  "extends": "./tsconfig.base.json",
  "compilerOptions": { "rootDir": "../src/bin" },
  "include": ["../src/bin/*.ts"],
  "exclude": []
}"#,
    );
    let compiler = Arc::new(ScriptedCompiler::default());
    task(dir.path(), &compiler)
        .run(key("es2015", "esm"))
        .await
        .unwrap();

    let out = dir.path().join("targets/es2015/esm");
    assert!(out.join("Arrow.mjs.map").is_file());
    assert!(out.join("bin/arrow2csv.js.map").is_file());
    assert!(!out.join("bin/arrow2csv.mjs.map").exists());
}

#[tokio::test]
async fn bin_receives_caller_target() {
    let dir = fixture();
    write(
        dir.path(),
        "tsconfig/tsconfig.es2015-cjs.json",
        r#"{ "extends": "./tsconfig.base.json", "compilerOptions": { "module": "commonjs" } }"#,
    );
    let compiler = Arc::new(ScriptedCompiler::default());
    let cache = Arc::new(TaskCache::new());
    let env = TaskEnv::new(Arc::clone(&compiler) as Arc<dyn Compiler>, dir.path());
    let task = TypescriptTask::new(env, cache);
    task.run(key("es2015", "cjs")).await.unwrap();

    let configs = compiler.configs.lock().unwrap().clone();
    assert_eq!(configs.len(), 2);
    assert!(configs.iter().any(|c| c.ends_with("tsconfig.bin-cjs.json")));
    assert!(configs.iter().any(|c| c.ends_with("tsconfig.es2015-cjs.json")));

    let bin = Project::load(
        &dir.path().join("tsconfig/tsconfig.bin-cjs.json"),
        &tsbuild_pipeline::bin_overrides(&key("es2015", "cjs")),
    )
    .unwrap();
    assert_eq!(bin.option_str("target"), Some("es2015"));
}

// ===========================================================================
// Category B: memoization
// ===========================================================================

#[tokio::test]
async fn repeated_runs_compile_once() {
    let dir = fixture();
    let compiler = Arc::new(ScriptedCompiler::default());
    let task = task(dir.path(), &compiler);

    task.run(key("node", "cjs")).await.unwrap();
    task.run(key("node", "cjs")).await.unwrap();
    assert_eq!(compiler.calls(), 2, "primary + bin, once");
    assert_eq!(task.cache().len(), 1);
}

#[tokio::test]
async fn concurrent_runs_share_one_compilation() {
    let dir = fixture();
    let compiler = Arc::new(ScriptedCompiler::default());
    let task = task(dir.path(), &compiler);

    let outcomes: Vec<TaskOutcome> =
        futures::future::join_all((0..4).map(|_| task.run(key("node", "esm")))).await;
    assert!(outcomes.iter().all(Result::is_ok));
    assert_eq!(compiler.calls(), 2);
}

#[tokio::test]
async fn distinct_keys_compile_separately() {
    let dir = fixture();
    let compiler = Arc::new(ScriptedCompiler::default());
    let task = task(dir.path(), &compiler);

    let (cjs, esm) = futures::join!(task.run(key("node", "cjs")), task.run(key("node", "esm")));
    assert!(cjs.is_ok() && esm.is_ok());
    assert_eq!(compiler.calls(), 4);
}

#[tokio::test]
async fn failure_is_settled_and_replayed() {
    let dir = fixture();
    let compiler = Arc::new(ScriptedCompiler::failing(&["tsconfig.node-cjs.json"]));
    let task = task(dir.path(), &compiler);

    let first = task.run(key("node", "cjs")).await.unwrap_err();
    assert!(matches!(
        first.as_ref(),
        BuildError::Compile(CompileError::Failed { errors: 1 })
    ));
    let calls = compiler.calls();

    let late = task.run(key("node", "cjs")).await.unwrap_err();
    assert!(Arc::ptr_eq(&first, &late));
    assert_eq!(compiler.calls(), calls);
}

// ===========================================================================
// Category C: bin sub-task
// ===========================================================================

#[tokio::test]
async fn bin_failure_fails_task() {
    let dir = fixture();
    let compiler = Arc::new(ScriptedCompiler::failing(&["tsconfig.bin-cjs.json"]));
    let err = task(dir.path(), &compiler)
        .run(key("node", "cjs"))
        .await
        .unwrap_err();
    assert!(matches!(err.as_ref(), BuildError::Compile(CompileError::Failed { .. })));
}

#[tokio::test]
async fn missing_required_bin_config_fails() {
    let dir = fixture();
    fs::remove_file(dir.path().join("tsconfig/tsconfig.bin-cjs.json")).unwrap();
    let compiler = Arc::new(ScriptedCompiler::default());
    let err = task(dir.path(), &compiler)
        .run(key("node", "cjs"))
        .await
        .unwrap_err();
    assert!(matches!(err.as_ref(), BuildError::Compile(CompileError::Io { .. })));
    assert_eq!(compiler.calls(), 0);
}

#[tokio::test]
async fn missing_optional_bin_config_is_skipped() {
    let dir = fixture();
    fs::remove_file(dir.path().join("tsconfig/tsconfig.bin-cjs.json")).unwrap();
    let compiler = Arc::new(ScriptedCompiler::default());
    let mut env = TaskEnv::new(Arc::clone(&compiler) as Arc<dyn Compiler>, dir.path());
    env.bin = BinConfig {
        required: false,
        ..BinConfig::default()
    };
    TypescriptTask::new(env, Arc::new(TaskCache::new()))
        .run(key("node", "cjs"))
        .await
        .unwrap();

    assert_eq!(compiler.calls(), 1);
    assert!(!dir.path().join("targets/node/cjs/bin").exists());
}

// ===========================================================================
// Category D: delegation
// ===========================================================================

#[tokio::test]
async fn delegated_task_never_compiles_here() {
    let dir = fixture();
    let compiler = Arc::new(ScriptedCompiler::default());
    let policy = Arc::new(RecordingPolicy {
        delegate: true,
        ..RecordingPolicy::default()
    });
    let mut env = TaskEnv::new(Arc::clone(&compiler) as Arc<dyn Compiler>, dir.path());
    env.policy = Arc::clone(&policy) as Arc<dyn DelegationPolicy>;
    let task = TypescriptTask::new(env, Arc::new(TaskCache::new()));

    task.run(key("node", "esm")).await.unwrap();
    task.run(key("node", "esm")).await.unwrap();

    assert_eq!(compiler.calls(), 0);
    assert!(!dir.path().join("targets").exists());
    let spawned = policy.spawned.lock().unwrap().clone();
    assert_eq!(spawned, vec![("compile".to_string(), key("node", "esm"))]);
}

// ===========================================================================
// Category E: persistent stamps
// ===========================================================================

fn stamped_task(root: &Path, compiler: &Arc<ScriptedCompiler>, force: bool) -> TypescriptTask {
    let mut env = TaskEnv::new(Arc::clone(compiler) as Arc<dyn Compiler>, root);
    env.stamps = Some(StampStore::new(&root.join(".tsbuild"), "test"));
    env.force = force;
    TypescriptTask::new(env, Arc::new(TaskCache::new()))
}

#[tokio::test]
async fn unchanged_inputs_skip_compilation_across_processes() {
    let dir = fixture();
    let compiler = Arc::new(ScriptedCompiler::default());

    stamped_task(dir.path(), &compiler, false)
        .run(key("node", "cjs"))
        .await
        .unwrap();
    assert_eq!(compiler.calls(), 2);
    assert!(dir.path().join(".tsbuild/stamps/node-cjs.json").is_file());

    // A fresh cache stands in for a new process.
    stamped_task(dir.path(), &compiler, false)
        .run(key("node", "cjs"))
        .await
        .unwrap();
    assert_eq!(compiler.calls(), 2);

    stamped_task(dir.path(), &compiler, true)
        .run(key("node", "cjs"))
        .await
        .unwrap();
    assert_eq!(compiler.calls(), 4);
}

#[tokio::test]
async fn changed_source_recompiles() {
    let dir = fixture();
    let compiler = Arc::new(ScriptedCompiler::default());
    stamped_task(dir.path(), &compiler, false)
        .run(key("node", "cjs"))
        .await
        .unwrap();

    write(dir.path(), "src/util/int.ts", "export const x = 2;\n");
    stamped_task(dir.path(), &compiler, false)
        .run(key("node", "cjs"))
        .await
        .unwrap();
    assert_eq!(compiler.calls(), 4);
    assert_eq!(
        read(dir.path().join("targets/node/cjs/src/util/int.ts")),
        "export const x = 2;\n"
    );
}

#[tokio::test]
async fn deleted_output_recompiles() {
    let dir = fixture();
    let compiler = Arc::new(ScriptedCompiler::default());
    stamped_task(dir.path(), &compiler, false)
        .run(key("node", "cjs"))
        .await
        .unwrap();
    fs::remove_dir_all(dir.path().join("targets/node/cjs")).unwrap();

    stamped_task(dir.path(), &compiler, false)
        .run(key("node", "cjs"))
        .await
        .unwrap();
    assert_eq!(compiler.calls(), 4);
    assert!(dir.path().join("targets/node/cjs/Arrow.js").is_file());
}

#[tokio::test]
async fn deleted_files_inside_output_recompile() {
    let dir = fixture();
    let compiler = Arc::new(ScriptedCompiler::default());
    stamped_task(dir.path(), &compiler, false)
        .run(key("node", "cjs"))
        .await
        .unwrap();
    let out = dir.path().join("targets/node/cjs");
    fs::remove_file(out.join("Arrow.js")).unwrap();
    fs::remove_dir_all(out.join("bin")).unwrap();

    stamped_task(dir.path(), &compiler, false)
        .run(key("node", "cjs"))
        .await
        .unwrap();
    assert_eq!(compiler.calls(), 4);
    assert!(out.join("Arrow.js").is_file());
    assert!(out.join("bin/arrow2csv.js").is_file());
}

#[tokio::test]
async fn stamp_lists_primary_and_bin_outputs() {
    let dir = fixture();
    let compiler = Arc::new(ScriptedCompiler::default());
    stamped_task(dir.path(), &compiler, false)
        .run(key("node", "cjs"))
        .await
        .unwrap();

    let stamp = StampStore::new(&dir.path().join(".tsbuild"), "test")
        .load(&key("node", "cjs"))
        .unwrap();
    let out = dir.path().join("targets/node/cjs");
    assert!(stamp.outputs.contains(&out.join("util/int.js.map")));
    assert!(stamp.outputs.contains(&out.join("bin/arrow2csv.js")));
    assert!(stamp.outputs.contains(&out.join("src/Arrow.ts")));
    assert_eq!(stamp.missing_outputs().count(), 0);
}

#[tokio::test]
async fn failed_build_clears_stamp() {
    let dir = fixture();
    let ok = Arc::new(ScriptedCompiler::default());
    stamped_task(dir.path(), &ok, true)
        .run(key("node", "cjs"))
        .await
        .unwrap();
    let stamp = dir.path().join(".tsbuild/stamps/node-cjs.json");
    assert!(stamp.is_file());

    let failing = Arc::new(ScriptedCompiler::failing(&["tsconfig.node-cjs.json"]));
    assert!(stamped_task(dir.path(), &failing, true)
        .run(key("node", "cjs"))
        .await
        .is_err());
    assert!(!stamp.exists());
}

// ===========================================================================
// Category F: fan-out join
// ===========================================================================

fn load(root: &Path, name: &str) -> Project {
    Project::load(
        &root.join("tsconfig").join(name),
        &CompilerOverrides::new(),
    )
    .unwrap()
}

#[tokio::test]
async fn fan_out_counts_every_pipeline() {
    let dir = fixture();
    let project = load(dir.path(), "tsconfig.node-cjs.json");
    let output = ScriptedCompiler::default().compile(&project);
    let out = dir.path().join("out");

    let stats = fan_out(&out, &project, output).await.unwrap();
    assert_eq!(stats.sources, 2);
    assert_eq!(stats.declarations, 4);
    assert_eq!(stats.code, 4);
    assert_eq!(stats.outputs.len(), 10);
    assert!(stats.outputs.iter().all(|p| p.starts_with(&out) && p.is_file()));
}

#[tokio::test]
async fn failing_source_copy_fails_join() {
    let dir = fixture();
    let project = load(dir.path(), "tsconfig.node-cjs.json");
    let out = dir.path().join("out");
    write(&out, "src", "blocks the sources directory");
    let output = ScriptedCompiler::default().compile(&project);

    let err = fan_out(&out, &project, output).await.unwrap_err();
    match err {
        BuildError::Write { path, .. } => assert!(path.starts_with(out.join("src"))),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn failing_declaration_stream_alone_fails_join() {
    let dir = fixture();
    let project = load(dir.path(), "tsconfig.node-cjs.json");
    let (_sender, mut output) = CompilationOutputSet::channel();
    output.code = stream::iter(vec![Ok(EmittedFile::new("a.js", "ok"))]).boxed();
    output.declarations = stream::iter(vec![
        Ok(EmittedFile::new("a.d.ts", "export {};")),
        Err(CompileError::Aborted),
    ])
    .boxed();

    let err = fan_out(&dir.path().join("out"), &project, output)
        .await
        .unwrap_err();
    assert!(matches!(err, BuildError::Compile(CompileError::Aborted)));
}

#[tokio::test]
async fn failing_code_stream_alone_fails_join() {
    let dir = fixture();
    let project = load(dir.path(), "tsconfig.node-cjs.json");
    let (_sender, mut output) = CompilationOutputSet::channel();
    output.code = stream::iter(vec![Err(CompileError::Failed { errors: 3 })]).boxed();
    output.declarations = stream::iter(vec![Ok(EmittedFile::new("a.d.ts", "export {};"))]).boxed();

    let err = fan_out(&dir.path().join("out"), &project, output)
        .await
        .unwrap_err();
    assert!(matches!(err, BuildError::Compile(CompileError::Failed { errors: 3 })));
}

#[tokio::test]
async fn blocked_destination_is_write_failure() {
    let dir = fixture();
    write(dir.path(), "targets/node/cjs/util", "not a directory");
    let compiler = Arc::new(ScriptedCompiler::default());
    let err = task(dir.path(), &compiler)
        .run(key("node", "cjs"))
        .await
        .unwrap_err();
    assert!(matches!(err.as_ref(), BuildError::Write { .. }));
}
