use std::path::{Path, PathBuf};

/// Finds the directory holding `assets/`.
///
/// Precedence: explicit path, `STRATA_ASSETS`, then the working directory,
/// the executable's directory and the crate root, each searched up to five
/// parents. Falls back to the working directory.
pub fn resolve_assets_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        if p.exists() {
            return p.to_path_buf();
        }
    }
    if let Ok(p) = std::env::var("STRATA_ASSETS") {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return pb;
        }
    }
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd);
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            candidates.push(dir.to_path_buf());
        }
    }
    candidates.push(PathBuf::from(env!("CARGO_MANIFEST_DIR")));

    for base in candidates {
        let mut cur = base;
        for _ in 0..5 {
            if blocks_path(&cur).exists() {
                return cur;
            }
            match cur.parent() {
                Some(parent) => cur = parent.to_path_buf(),
                None => break,
            }
        }
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

pub fn blocks_path(root: &Path) -> PathBuf {
    root.join("assets/voxels/blocks.toml")
}

pub fn structures_dir(root: &Path) -> PathBuf {
    root.join("assets/structures")
}
