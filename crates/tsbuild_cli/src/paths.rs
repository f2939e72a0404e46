//! `tsbuild paths`: shows where each pair reads and writes.

use tsbuild_config::{resolve_bin_paths, resolve_paths};

use crate::pipeline::{load_project, task_keys, LoadedProject};
use crate::{GlobalArgs, MatrixArgs};

/// Runs the `tsbuild paths` command, printing one block per pair to stdout.
pub fn run(args: &MatrixArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let LoadedProject { root, config, .. } = load_project(global)?;
    let bin_key = config.bin.key()?;

    for key in task_keys(args) {
        let primary = resolve_paths(&config.layout, &key);
        println!("{key}");
        println!("  out      {}", root.join(&primary.out_dir).display());
        println!("  tsconfig {}", root.join(&primary.tsconfig_path).display());
        if config.bin.enabled {
            let bin = resolve_bin_paths(&config.layout, &config.bin, &bin_key, &primary);
            println!("  bin out  {}", root.join(&bin.out_dir).display());
            println!("  bin cfg  {}", root.join(&bin.tsconfig_path).display());
        }
    }
    Ok(0)
}
