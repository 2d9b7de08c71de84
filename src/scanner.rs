use log::{debug, warn};
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Locates the source units that make up a module ("package") of the program.
///
/// A module path such as `handlers::users` is mapped below the source root to
/// its module file (`handlers/users.rs` or `handlers/users/mod.rs`) followed by
/// every other `.rs` file directly inside `handlers/users/`, sorted by file
/// name. The crate root module maps to `lib.rs` and `main.rs`. Test units and
/// generated units are skipped.
///
/// # Example
///
/// ```no_run
/// use openapi_from_handlers::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./src"));
/// let result = scanner.package_units(&["handlers", "users"]);
/// println!("Found {} source units", result.rust_files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
}

/// Result of a package scan.
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Source units to parse, in visiting order
    pub rust_files: Vec<PathBuf>,
    /// Test or generated units that were left out
    pub skipped: Vec<PathBuf>,
    /// Warning messages for any issues encountered (e.g., inaccessible directories)
    pub warnings: Vec<String>,
}

impl FileScanner {
    /// Creates a new `FileScanner` rooted at the crate's source directory.
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Collects the source units of the module at `module_segments`.
    ///
    /// Missing files are not an error: the result is simply empty.
    pub fn package_units(&self, module_segments: &[&str]) -> ScanResult {
        let mut result = ScanResult::default();
        let mut candidates = Vec::new();

        match module_segments.split_last() {
            None => {
                candidates.push(self.root_path.join("lib.rs"));
                candidates.push(self.root_path.join("main.rs"));
            }
            Some((last, parents)) => {
                let parent_dir = parents
                    .iter()
                    .fold(self.root_path.clone(), |dir, segment| dir.join(segment));
                candidates.push(parent_dir.join(format!("{}.rs", last)));

                let module_dir = parent_dir.join(last);
                if module_dir.is_dir() {
                    candidates.push(module_dir.join("mod.rs"));
                    self.collect_dir(&module_dir, &mut candidates, &mut result.warnings);
                }
            }
        }

        for path in candidates {
            if !path.is_file() || result.rust_files.contains(&path) {
                continue;
            }
            if is_test_unit(&path) || is_generated_unit(&path) {
                debug!("Skipping unit: {}", path.display());
                result.skipped.push(path);
                continue;
            }
            result.rust_files.push(path);
        }

        debug!(
            "Module {:?} maps to {} units",
            module_segments,
            result.rust_files.len()
        );
        result
    }

    /// Pushes every `.rs` file directly inside `dir`, sorted by file name.
    fn collect_dir(&self, dir: &Path, out: &mut Vec<PathBuf>, warnings: &mut Vec<String>) {
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("rs") {
                        out.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }
    }
}

/// Unit tests live in `tests.rs` or `*_test(s).rs` files.
fn is_test_unit(path: &Path) -> bool {
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return false;
    };
    stem == "tests" || stem == "test" || stem.ends_with("_test") || stem.ends_with("_tests")
}

/// Generated files announce themselves on their first line.
fn is_generated_unit(path: &Path) -> bool {
    let Ok(file) = fs::File::open(path) else {
        return false;
    };
    let mut first_line = String::new();
    if BufReader::new(file).read_line(&mut first_line).is_err() {
        return false;
    }
    first_line.contains("@generated") || first_line.contains("Code generated")
}
