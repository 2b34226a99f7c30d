use std::{
    collections::{BTreeSet, HashSet},
    path::{Path, PathBuf},
};

use colored::Colorize;
use glob::{Pattern, glob};
use walkdir::WalkDir;

/// Check if a pattern contains glob wildcards (* or ?).
/// Patterns without wildcards are treated as literal paths.
fn is_glob_pattern(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Result of scanning for tree dumps.
pub struct ScanResult {
    pub files: HashSet<String>,
    pub skipped_count: usize,
}

/// What to skip while walking.
pub struct ScanFilter<'a> {
    pub ignore_patterns: &'a [String],
    /// Any path with a component equal to one of these names is skipped.
    pub excluded_names: &'a BTreeSet<String>,
}

pub fn scan_files(
    base_dir: &str,
    includes: &[String],
    filter: &ScanFilter<'_>,
    verbose: bool,
) -> ScanResult {
    let mut files: HashSet<String> = HashSet::new();
    let mut skipped_count = 0;

    let mut literal_ignore_paths: Vec<PathBuf> = Vec::new();
    let mut glob_patterns: Vec<Pattern> = Vec::new();

    for p in filter.ignore_patterns {
        if is_glob_pattern(p) {
            match Pattern::new(p) {
                Ok(pattern) => glob_patterns.push(pattern),
                Err(e) => {
                    if verbose {
                        eprintln!(
                            "{} Invalid ignore pattern '{}': {}",
                            "warning:".bold().yellow(),
                            p,
                            e
                        );
                    }
                }
            }
        } else {
            literal_ignore_paths.push(Path::new(base_dir).join(p));
        }
    }

    let dirs_to_scan: Vec<PathBuf> = if includes.is_empty() {
        vec![Path::new(base_dir).to_path_buf()]
    } else {
        let mut paths = Vec::new();
        for inc in includes {
            if is_glob_pattern(inc) {
                let full_pattern = Path::new(base_dir).join(inc);
                let pattern_str = full_pattern.to_string_lossy();
                match glob(&pattern_str) {
                    Ok(entries) => {
                        for entry in entries.flatten() {
                            if entry.is_dir() {
                                paths.push(entry);
                            }
                        }
                    }
                    Err(e) => {
                        if verbose {
                            eprintln!(
                                "{} Invalid glob pattern '{}': {}",
                                "warning:".bold().yellow(),
                                inc,
                                e
                            );
                        }
                    }
                }
            } else {
                let path = Path::new(base_dir).join(inc);
                if path.exists() {
                    paths.push(path);
                } else if verbose {
                    eprintln!(
                        "{} Include path does not exist: {}",
                        "warning:".bold().yellow(),
                        path.display()
                    );
                }
            }
        }
        paths
    };

    for dir in dirs_to_scan {
        let walker = WalkDir::new(&dir).into_iter().filter_entry(|entry| {
            // Only components below the include dir count as exclusions.
            let relative = entry.path().strip_prefix(&dir).unwrap_or(entry.path());
            !has_excluded_component(relative, filter.excluded_names)
        });

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    skipped_count += 1;
                    tracing::warn!(error = %e, "cannot access path");
                    continue;
                }
            };
            let path = entry.path();
            let path_str = path.to_string_lossy();

            if literal_ignore_paths
                .iter()
                .any(|ignore_path| path.starts_with(ignore_path))
            {
                continue;
            }

            if glob_patterns.iter().any(|p| p.matches(&path_str)) {
                continue;
            }

            if path.is_file() && is_tree_dump(path) {
                files.insert(path_str.into());
            }
        }
    }

    ScanResult {
        files,
        skipped_count,
    }
}

/// Whether any component of `path` (or its `.json`-stripped file name) is excluded.
///
/// A dump of `shop/tests.py` is usually stored as `shop/tests.py.json`, so the
/// file name is compared both with and without the `.json` suffix.
pub fn has_excluded_component(path: &Path, excluded: &BTreeSet<String>) -> bool {
    path.components().any(|component| {
        let name = component.as_os_str().to_string_lossy();
        excluded.contains(name.as_ref())
            || name
                .strip_suffix(".json")
                .is_some_and(|stem| excluded.contains(stem))
    })
}

/// Dumps are named after their module: `views.py` is dumped to `views.py.json`.
/// Other JSON (fixtures, `package.json`) is not a dump.
fn is_tree_dump(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_suffix(".py.json"))
        .is_some_and(|stem| !stem.is_empty() && !stem.starts_with('.'))
}
