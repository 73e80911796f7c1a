//! Build-artifact resolution
//!
//! Drivers compile against whatever the host build system already produced. This module finds it without ever
//! running that build system:
//!
//! - **explicit paths** (`--artifacts`): directories become include dirs, `.o`/`.a`/`.so` files are link inputs,
//!   `.mod` files contribute their parent directory
//! - **auto-discovery**: the build system is detected by walking up from the test file (`fpm.toml` before
//!   `CMakeLists.txt` before `Makefile`). FPM projects contribute `build/gfortran_*` (and the same under
//!   `build/dependencies/*`); anything else contributes `build`/`Build`/`BUILD` directories within four ancestor
//!   levels. Subdirectories holding `.mod` files are added too.
//! - **module sources**: a `use`d module with no compiled `.mod` on the include path is looked up as source under
//!   `src/`, `app/`, `lib/`, `fortran/src/` (or the directory itself) within four ancestor levels, and compiled in
//!   ahead of the test file, dependencies first.
//! - **assertion module**: `--assertions FILE`, else `module_fortest_assertions.f90` near the test, unless a
//!   compiled `fortest_assertions.mod` is already on the include path.
//!
//! Anything not found is left to the compiler's default search path; a real gap surfaces as a compile error.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use fortest_core::lang::conventions;
use walkdir::WalkDir;

use crate::frontend::analyzer::{self, SourceAnalysis};

/// Ancestor levels searched (the test file's directory counts as the first).
const ANCESTOR_LEVELS: usize = 4;

const BUILD_DIR_NAMES: &[&str] = &["build", "Build", "BUILD"];

/// Conventional source locations, relative to each ancestor.
const SOURCE_DIRS: &[&str] = &["src", "app", "lib", "fortran/src", ""];

const LINK_EXTENSIONS: &[&str] = &["o", "a", "so"];

const MODULE_FILE_EXTENSION: &str = "mod";

/// How deep `.mod`-holding subdirectories are searched below a build directory.
const MOD_SCAN_DEPTH: usize = 4;

/// How deep module sources are searched below a source root.
const SOURCE_SCAN_DEPTH: usize = 3;

/// How deep the assertion module source is searched below a source root.
const ASSERTION_SCAN_DEPTH: usize = 2;

/// Host build system, detected by its manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildSystem {
    Fpm,
    CMake,
    Make,
}

impl BuildSystem {
    /// Detection order.
    pub const ALL: [BuildSystem; 3] = [BuildSystem::Fpm, BuildSystem::CMake, BuildSystem::Make];

    pub fn manifest(self) -> &'static str {
        match self {
            BuildSystem::Fpm => "fpm.toml",
            BuildSystem::CMake => "CMakeLists.txt",
            BuildSystem::Make => "Makefile",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BuildSystem::Fpm => "fpm",
            BuildSystem::CMake => "cmake",
            BuildSystem::Make => "make",
        }
    }
}

/// Detect the host build system above `start`, returning it with its project root.
pub fn detect_build_system(start: &Path) -> Option<(BuildSystem, PathBuf)> {
    BuildSystem::ALL.into_iter().find_map(|system| {
        start
            .ancestors()
            .find(|dir| dir.join(system.manifest()).is_file())
            .map(|root| (system, root.to_path_buf()))
    })
}

/// Everything a driver build needs beyond its own sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPaths {
    pub include_dirs: Vec<PathBuf>,
    pub link_inputs: Vec<PathBuf>,
    /// Module sources compiled ahead of the test file, dependencies first.
    pub module_sources: Vec<PathBuf>,
    pub assertion_source: Option<PathBuf>,
    pub build_system: Option<BuildSystem>,
}

impl SearchPaths {
    fn add_include(&mut self, dir: PathBuf) {
        if !self.include_dirs.contains(&dir) {
            self.include_dirs.push(dir);
        }
    }

    /// Whether a compiled `<module>.mod` is visible on the include path.
    pub fn has_compiled_module(&self, module: &str) -> bool {
        let file = format!("{}.{MODULE_FILE_EXTENSION}", module.to_ascii_lowercase());
        self.include_dirs.iter().any(|dir| dir.join(&file).is_file())
    }
}

/// Resolves [`SearchPaths`] for test files.
#[derive(Debug, Clone, Default)]
pub struct ArtifactResolver {
    explicit: Vec<PathBuf>,
    auto_discover: bool,
    assertion_override: Option<PathBuf>,
}

impl ArtifactResolver {
    pub fn new(explicit: Vec<PathBuf>, auto_discover: bool, assertion_override: Option<PathBuf>) -> Self {
        Self {
            explicit,
            auto_discover,
            assertion_override,
        }
    }

    #[tracing::instrument(skip_all, fields(file = %test_file.display()))]
    pub fn resolve(&self, test_file: &Path, analysis: &SourceAnalysis) -> SearchPaths {
        let test_dir = test_file.parent().unwrap_or(Path::new("."));
        let mut paths = SearchPaths::default();

        for artifact in &self.explicit {
            classify_explicit(artifact, &mut paths);
        }

        if self.auto_discover {
            let detected = detect_build_system(test_dir);
            paths.build_system = detected.as_ref().map(|(system, _)| *system);
            match detected {
                Some((BuildSystem::Fpm, root)) => {
                    for dir in fpm_include_dirs(&root) {
                        paths.add_include(dir);
                    }
                }
                _ => {
                    for dir in build_dir_includes(test_dir) {
                        paths.add_include(dir);
                    }
                }
            }
        }

        let roots = source_roots(test_dir);

        paths.assertion_source = match &self.assertion_override {
            Some(file) => Some(file.clone()),
            None if paths.has_compiled_module(conventions::ASSERTION_MODULE) => None,
            None => find_assertion_source(&roots),
        };

        paths.module_sources = resolve_module_sources(test_file, analysis, &paths, &roots);

        tracing::debug!(
            build_system = paths.build_system.map(BuildSystem::as_str),
            includes = paths.include_dirs.len(),
            link_inputs = paths.link_inputs.len(),
            module_sources = paths.module_sources.len(),
            assertion_source = paths.assertion_source.is_some(),
            "resolved search paths"
        );
        paths
    }
}

fn classify_explicit(artifact: &Path, paths: &mut SearchPaths) {
    if artifact.is_dir() {
        paths.add_include(artifact.to_path_buf());
        return;
    }
    if !artifact.is_file() {
        tracing::warn!(path = %artifact.display(), "artifact path does not exist; ignoring");
        return;
    }

    let ext = artifact
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    if LINK_EXTENSIONS.contains(&ext.as_str()) {
        if !paths.link_inputs.iter().any(|p| p == artifact) {
            paths.link_inputs.push(artifact.to_path_buf());
        }
    } else if ext == MODULE_FILE_EXTENSION {
        if let Some(parent) = artifact.parent() {
            paths.add_include(parent.to_path_buf());
        }
    } else {
        tracing::warn!(path = %artifact.display(), "unrecognized artifact type; ignoring");
    }
}

/// `build/gfortran_*` (plus `.mod` subdirectories) under an FPM root and its dependencies.
fn fpm_include_dirs(root: &Path) -> Vec<PathBuf> {
    let build = root.join("build");
    let mut dirs = Vec::new();

    for profile in compiler_profile_dirs(&build) {
        dirs.extend(with_mod_subdirs(&profile));
    }

    let deps = build.join("dependencies");
    for dep in sorted_subdirs(&deps) {
        for profile in compiler_profile_dirs(&dep.join("build")) {
            dirs.extend(with_mod_subdirs(&profile));
        }
    }
    dirs
}

fn compiler_profile_dirs(build: &Path) -> Vec<PathBuf> {
    sorted_subdirs(build)
        .into_iter()
        .filter(|d| d.file_name().is_some_and(|n| n.to_string_lossy().starts_with("gfortran_")))
        .collect()
}

/// `build`-named directories within the ancestor levels of `start`.
fn build_dir_includes(start: &Path) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    for ancestor in start.ancestors().take(ANCESTOR_LEVELS) {
        for name in BUILD_DIR_NAMES {
            let dir = ancestor.join(name);
            if dir.is_dir() {
                for d in with_mod_subdirs(&dir) {
                    if !dirs.contains(&d) {
                        dirs.push(d);
                    }
                }
            }
        }
    }
    dirs
}

/// `dir` itself followed by every subdirectory that holds `.mod` files.
fn with_mod_subdirs(dir: &Path) -> Vec<PathBuf> {
    let mut dirs = vec![dir.to_path_buf()];
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(MOD_SCAN_DEPTH)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && has_extension(e.path(), MODULE_FILE_EXTENSION))
    {
        if let Some(parent) = entry.path().parent() {
            if !dirs.iter().any(|d| d == parent) {
                dirs.push(parent.to_path_buf());
            }
        }
    }
    dirs
}

fn sorted_subdirs(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
        .map(|e| e.path())
        .collect();
    dirs.sort();
    dirs
}

/// Existing source roots, nearest ancestor first.
fn source_roots(start: &Path) -> Vec<PathBuf> {
    let mut roots = Vec::new();
    for ancestor in start.ancestors().take(ANCESTOR_LEVELS) {
        for sub in SOURCE_DIRS {
            let dir = if sub.is_empty() { ancestor.to_path_buf() } else { ancestor.join(sub) };
            if dir.is_dir() && !roots.contains(&dir) {
                roots.push(dir);
            }
        }
    }
    roots
}

fn find_assertion_source(roots: &[PathBuf]) -> Option<PathBuf> {
    roots.iter().find_map(|root| {
        fortran_files(root, ASSERTION_SCAN_DEPTH)
            .find(|p| p.file_name().is_some_and(|n| n == conventions::ASSERTION_MODULE_SOURCE))
    })
}

fn fortran_files(root: &Path, depth: usize) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(root)
        .max_depth(depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && has_extension(e.path(), conventions::SOURCE_EXTENSION))
        .map(|e| e.into_path())
}

fn is_skipped_dir(entry: &walkdir::DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || BUILD_DIR_NAMES.contains(&name.as_ref()) || name == "target"
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case(ext))
}

/// Module name → defining source file. Roots are scanned one at a time, nearest first, only as far as a lookup
/// needs.
struct ModuleIndex<'a> {
    roots: &'a [PathBuf],
    exclude: &'a Path,
    scanned: usize,
    modules: HashMap<String, PathBuf>,
    seen: HashSet<PathBuf>,
}

impl<'a> ModuleIndex<'a> {
    fn new(roots: &'a [PathBuf], exclude: &'a Path) -> Self {
        Self {
            roots,
            exclude,
            scanned: 0,
            modules: HashMap::new(),
            seen: HashSet::new(),
        }
    }

    fn lookup(&mut self, module: &str) -> Option<PathBuf> {
        loop {
            if let Some(file) = self.modules.get(module) {
                return Some(file.clone());
            }
            let root = self.roots.get(self.scanned)?;
            self.scanned += 1;
            self.scan(root);
        }
    }

    fn scan(&mut self, root: &Path) {
        for file in fortran_files(root, SOURCE_SCAN_DEPTH) {
            if file == self.exclude || !self.seen.insert(file.clone()) {
                continue;
            }
            let name = file.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            if conventions::is_test_file_name(&name) || name == conventions::ASSERTION_MODULE_SOURCE {
                continue;
            }
            let Ok(text) = fs::read_to_string(&file) else { continue };
            for module in analyzer::declared_modules(&text) {
                self.modules.entry(module).or_insert_with(|| file.clone());
            }
        }
    }
}

fn resolve_module_sources(
    test_file: &Path,
    analysis: &SourceAnalysis,
    paths: &SearchPaths,
    roots: &[PathBuf],
) -> Vec<PathBuf> {
    let mut index = ModuleIndex::new(roots, test_file);
    let mut ordered = Vec::new();
    let mut visited = HashSet::new();
    for module in analysis.external_uses() {
        visit_module(module, &mut index, paths, &mut visited, &mut ordered);
    }
    ordered
}

/// Post-order walk so a module's dependencies are compiled before it.
fn visit_module(
    module: &str,
    index: &mut ModuleIndex<'_>,
    paths: &SearchPaths,
    visited: &mut HashSet<PathBuf>,
    ordered: &mut Vec<PathBuf>,
) {
    if module == conventions::ASSERTION_MODULE || paths.has_compiled_module(module) {
        return;
    }
    let Some(file) = index.lookup(module) else {
        tracing::debug!(module, "no source found; relying on the compiler search path");
        return;
    };
    if !visited.insert(file.clone()) {
        return;
    }

    if let Ok(text) = fs::read_to_string(&file) {
        if let Ok(deps) = analyzer::analyze_source(&text) {
            for dep in deps.external_uses() {
                visit_module(dep, index, paths, visited, ordered);
            }
        }
    }
    ordered.push(file);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::frontend::analyzer::analyze_source;

    fn write(root: &Path, rel: &str, text: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_detects_fpm_before_cmake() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "fpm.toml", "name = 'x'");
        write(tmp.path(), "test/CMakeLists.txt", "");
        let (system, root) = detect_build_system(&tmp.path().join("test")).unwrap();
        assert_eq!(system, BuildSystem::Fpm);
        assert_eq!(root, tmp.path());
    }

    #[test]
    fn test_fpm_profile_dirs_and_mod_subdirs() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "fpm.toml", "");
        write(tmp.path(), "build/gfortran_ABC/app/x.o", "");
        write(tmp.path(), "build/gfortran_ABC/proj/math_utils.mod", "");
        write(tmp.path(), "build/dependencies/dep/build/gfortran_DEF/dep.mod", "");
        let test = write(tmp.path(), "test/test_math.f90", "module test_math\nuse math_utils\nend module");

        let analysis = analyze_source(&fs::read_to_string(&test).unwrap()).unwrap();
        let paths = ArtifactResolver::new(Vec::new(), true, None).resolve(&test, &analysis);

        assert_eq!(paths.build_system, Some(BuildSystem::Fpm));
        let build = tmp.path().join("build");
        assert!(paths.include_dirs.contains(&build.join("gfortran_ABC")));
        assert!(paths.include_dirs.contains(&build.join("gfortran_ABC/proj")));
        assert!(paths.include_dirs.contains(&build.join("dependencies/dep/build/gfortran_DEF")));
        assert!(paths.has_compiled_module("math_utils"));
        assert!(paths.module_sources.is_empty());
    }

    #[test]
    fn test_explicit_artifacts_are_classified() {
        let tmp = tempfile::tempdir().unwrap();
        let obj = write(tmp.path(), "out/lib.a", "");
        let module = write(tmp.path(), "mods/m.mod", "");
        let analysis = analyze_source("module test_x\nend module").unwrap();
        let test = write(tmp.path(), "t/test_x.f90", "");

        let resolver = ArtifactResolver::new(vec![tmp.path().join("out"), obj.clone(), module], false, None);
        let paths = resolver.resolve(&test, &analysis);
        assert_eq!(paths.include_dirs, [tmp.path().join("out"), tmp.path().join("mods")]);
        assert_eq!(paths.link_inputs, [obj]);
        assert_eq!(paths.build_system, None);
    }

    #[test]
    fn test_module_sources_resolve_dependencies_first() {
        let tmp = tempfile::tempdir().unwrap();
        let base = write(tmp.path(), "src/base.f90", "module base\nend module base\n");
        let utils = write(
            tmp.path(),
            "src/utils.f90",
            "module math_utils\nuse base\ncontains\nsubroutine add()\nend subroutine\nend module\n",
        );
        let assertions = write(tmp.path(), "test/module_fortest_assertions.f90", "module fortest_assertions\nend module\n");
        let test = write(
            tmp.path(),
            "test/test_math.f90",
            "module test_math\nuse fortest_assertions\nuse math_utils\nuse iso_fortran_env\nend module\n",
        );

        let analysis = analyze_source(&fs::read_to_string(&test).unwrap()).unwrap();
        let paths = ArtifactResolver::new(Vec::new(), false, None).resolve(&test, &analysis);
        assert_eq!(paths.module_sources, [base, utils]);
        assert_eq!(paths.assertion_source, Some(assertions));
    }

    #[test]
    fn test_assertion_override_wins() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "test/module_fortest_assertions.f90", "module fortest_assertions\nend module\n");
        let test = write(tmp.path(), "test/test_a.f90", "module test_a\nend module\n");
        let analysis = analyze_source("module test_a\nend module\n").unwrap();
        let custom = tmp.path().join("custom.f90");

        let paths = ArtifactResolver::new(Vec::new(), false, Some(custom.clone())).resolve(&test, &analysis);
        assert_eq!(paths.assertion_source, Some(custom));
    }
}
