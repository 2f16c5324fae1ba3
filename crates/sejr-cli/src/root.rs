use sejr_core::paths;
use std::path::{Path, PathBuf};

/// Resolve the Sejrliste root directory.
///
/// Priority:
/// 1. `--root` flag / `SEJR_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `sejr.yaml`
/// 3. Walk upward from `cwd` looking for the default `10_ACTIVE/` directory
/// 4. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_upward(&cwd, |dir| dir.join(paths::CONFIG_FILE).is_file())
        .or_else(|| find_upward(&cwd, |dir| dir.join(paths::ACTIVE_DIR).is_dir()))
        .unwrap_or(cwd)
}

fn find_upward(start: &Path, is_root: impl Fn(&Path) -> bool) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| is_root(dir))
        .map(Path::to_path_buf)
}
