//! BuildOrchestrator: compiles drivers into executables
//!
//! Every driver gets its own directory, so concurrent builds never share `.mod` or object files:
//!
//! ```text
//! <build root>/<file stem>_<hash of path>/<driver id>/
//!     fortest_<hash>.f90     generated driver source
//!     *.mod                  module files (-J)
//!     fortest_<hash>         executable
//! ```
//!
//! A single compiler invocation builds each driver:
//!
//! ```text
//! <compiler> -o <exe> [flags] -I <include>... -J <driver dir> [assertions] [module sources] <test file> [driver] [link inputs]
//! ```
//!
//! A compiler that exits nonzero or runs past the timeout is a [`BuildResult::CompileFailed`] carrying its
//! output; that is a test verdict, not an error. Errors are reserved for not being able to try at all.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use fortest_core::ident;
use thiserror::Error;

use super::artifacts::SearchPaths;
use super::driver::Driver;
use super::executor::{ProcessError, ProcessSpec, run_process};

/// Where per-file and per-driver build directories live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLayout {
    root: PathBuf,
}

impl BuildLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory shared by all drivers of one test file.
    pub fn file_dir(&self, test_file: &Path) -> PathBuf {
        let stem = test_file.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
        let hash = ident::short_hash(&[&test_file.to_string_lossy()]);
        self.root.join(format!("{}_{hash}", ident::slug(&stem)))
    }

    pub fn driver_dir(&self, test_file: &Path, driver: &Driver) -> PathBuf {
        self.file_dir(test_file).join(&driver.id)
    }
}

/// Outcome of trying to compile a driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildResult {
    /// Path to the executable.
    Compiled(PathBuf),
    /// Compiler diagnostics.
    CompileFailed(String),
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to prepare build directory {}: {source}", dir.display())]
    Prepare {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Process(#[from] ProcessError),
}

/// Compiles drivers with an external Fortran compiler.
#[derive(Debug, Clone)]
pub struct BuildOrchestrator {
    compiler: String,
    flags: Vec<String>,
    timeout: Duration,
    layout: BuildLayout,
}

impl BuildOrchestrator {
    pub fn new(compiler: impl Into<String>, flags: Vec<String>, timeout: Duration, layout: BuildLayout) -> Self {
        Self {
            compiler: compiler.into(),
            flags,
            timeout,
            layout,
        }
    }

    pub fn layout(&self) -> &BuildLayout {
        &self.layout
    }

    /// The compiler invocation for `driver`, built in `dir`.
    pub fn compile_command(&self, test_file: &Path, driver: &Driver, search: &SearchPaths, dir: &Path) -> ProcessSpec {
        let exe = dir.join(driver.executable_name());
        let mut spec = ProcessSpec::new(&self.compiler, self.timeout)
            .current_dir(dir)
            .arg("-o")
            .arg(exe)
            .args(&self.flags);

        for include in &search.include_dirs {
            spec = spec.arg("-I").arg(include);
        }
        spec = spec.arg("-J").arg(dir);

        if let Some(assertions) = &search.assertion_source {
            spec = spec.arg(assertions);
        }
        spec = spec.args(&search.module_sources).arg(test_file);
        if driver.source.is_some() {
            spec = spec.arg(dir.join(driver.source_file_name()));
        }
        spec.args(&search.link_inputs)
    }

    /// Write the driver source into a fresh driver directory and compile it.
    #[tracing::instrument(skip_all, fields(file = %test_file.display(), driver = %driver.id))]
    pub async fn build(&self, test_file: &Path, driver: &Driver, search: &SearchPaths) -> Result<BuildResult, BuildError> {
        let layout_dir = self.layout.driver_dir(test_file, driver);
        let prepare = |source| BuildError::Prepare {
            dir: layout_dir.clone(),
            source,
        };
        // The compiler runs inside `dir`, so every path on its command line must be absolute.
        let dir = std::path::absolute(&layout_dir).map_err(prepare)?;
        let source_file = std::path::absolute(test_file).map_err(prepare)?;
        prepare_dir(&dir, driver).map_err(prepare)?;

        let spec = self.compile_command(&source_file, driver, search, &dir);
        let record = run_process(&spec).await?;

        if record.timed_out {
            tracing::warn!(timeout_s = self.timeout.as_secs(), "compiler timed out");
            let mut message = format!("compiler timed out after {}s", self.timeout.as_secs());
            if !record.output.is_empty() {
                message.push('\n');
                message.push_str(&record.output);
            }
            return Ok(BuildResult::CompileFailed(message));
        }
        if record.exit_code != Some(0) {
            tracing::debug!(exit_code = ?record.exit_code, "compilation failed");
            return Ok(BuildResult::CompileFailed(record.output));
        }

        let exe = dir.join(driver.executable_name());
        tracing::debug!(exe = %exe.display(), elapsed_ms = record.duration.as_millis() as u64, "compiled");
        Ok(BuildResult::Compiled(exe))
    }

    /// Remove every build directory belonging to `test_file`.
    pub fn clean(&self, test_file: &Path) -> io::Result<()> {
        let dir = self.layout.file_dir(test_file);
        match fs::remove_dir_all(&dir) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

fn prepare_dir(dir: &Path, driver: &Driver) -> io::Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)?;
    if let Some(source) = &driver.source {
        fs::write(dir.join(driver.source_file_name()), source)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::driver::{error_stop_driver, normal_driver};
    use std::ffi::OsString;

    fn orchestrator(root: &Path) -> BuildOrchestrator {
        BuildOrchestrator::new(
            "gfortran",
            vec!["-O0".into(), "-g".into()],
            Duration::from_secs(30),
            BuildLayout::new(root),
        )
    }

    #[test]
    fn test_layout_separates_files_and_drivers() {
        let layout = BuildLayout::new("/b");
        let file = Path::new("/p/test_math.f90");
        let normal = normal_driver(file, "test_math", vec!["test_add".into()]);
        let es = error_stop_driver(file, "test_math", "test_error_stop_x");

        let dir = layout.file_dir(file);
        assert!(dir.file_name().unwrap().to_string_lossy().starts_with("test_math_"));
        assert_ne!(dir, layout.file_dir(Path::new("/q/test_math.f90")));
        assert_eq!(layout.driver_dir(file, &normal), dir.join("normal"));
        assert_ne!(layout.driver_dir(file, &normal), layout.driver_dir(file, &es));
    }

    #[test]
    fn test_compile_command_argument_order() {
        let file = Path::new("/p/test_math.f90");
        let driver = normal_driver(file, "test_math", vec!["test_add".into()]);
        let search = SearchPaths {
            include_dirs: vec!["/p/build".into()],
            link_inputs: vec!["/p/build/libmath.a".into()],
            module_sources: vec!["/p/src/math.f90".into()],
            assertion_source: Some("/p/module_fortest_assertions.f90".into()),
            build_system: None,
        };
        let dir = Path::new("/b/x/normal");
        let spec = orchestrator(Path::new("/b")).compile_command(file, &driver, &search, dir);

        let exe = dir.join(driver.executable_name());
        let src = dir.join(driver.source_file_name());
        let expected: Vec<OsString> = vec![
            "-o".into(),
            exe.into(),
            "-O0".into(),
            "-g".into(),
            "-I".into(),
            "/p/build".into(),
            "-J".into(),
            dir.into(),
            "/p/module_fortest_assertions.f90".into(),
            "/p/src/math.f90".into(),
            file.into(),
            src.into(),
            "/p/build/libmath.a".into(),
        ];
        assert_eq!(spec.program, PathBuf::from("gfortran"));
        assert_eq!(spec.args, expected);
        assert_eq!(spec.cwd.as_deref(), Some(dir));
    }

    #[test]
    fn test_prepare_writes_driver_source_and_clean_removes_it() {
        let tmp = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(tmp.path());
        let file = Path::new("/p/test_math.f90");
        let driver = normal_driver(file, "test_math", vec!["test_add".into()]);

        let dir = orchestrator.layout().driver_dir(file, &driver);
        prepare_dir(&dir, &driver).unwrap();
        let written = fs::read_to_string(dir.join(driver.source_file_name())).unwrap();
        assert_eq!(Some(written), driver.source);

        orchestrator.clean(file).unwrap();
        assert!(!orchestrator.layout().file_dir(file).exists());
        orchestrator.clean(file).unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_compiler_exit_is_compile_failed() {
        let tmp = tempfile::tempdir().unwrap();
        let orchestrator = BuildOrchestrator::new("false", Vec::new(), Duration::from_secs(10), BuildLayout::new(tmp.path()));
        let file = Path::new("/p/test_math.f90");
        let driver = normal_driver(file, "test_math", vec!["test_add".into()]);

        let result = orchestrator.build(file, &driver, &SearchPaths::default()).await.unwrap();
        assert!(matches!(result, BuildResult::CompileFailed(_)));
    }

    #[tokio::test]
    async fn test_missing_compiler_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let orchestrator = BuildOrchestrator::new(
            "/no/such/fortran-compiler",
            Vec::new(),
            Duration::from_secs(10),
            BuildLayout::new(tmp.path()),
        );
        let file = Path::new("/p/test_math.f90");
        let driver = normal_driver(file, "test_math", vec!["test_add".into()]);

        let err = orchestrator.build(file, &driver, &SearchPaths::default()).await.unwrap_err();
        assert!(matches!(err, BuildError::Process(ProcessError::Spawn { .. })));
    }

    /// A stand-in compiler that insists every `.f90` input exists, then writes its `-o` target.
    #[cfg(unix)]
    fn fake_compiler(dir: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("fake-fortran");
        fs::write(
            &script,
            "#!/bin/sh\nout=\nwhile [ $# -gt 0 ]; do\n  case \"$1\" in\n    -o) out=\"$2\"; shift ;;\n    *.f90) [ -f \"$1\" ] || { echo \"missing $1\"; exit 1; } ;;\n  esac\n  shift\ndone\ntouch \"$out\"\n",
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_relative_layout_root_still_compiles() {
        let tmp = tempfile::tempdir().unwrap();
        let compiler = fake_compiler(tmp.path());
        let file = tmp.path().join("test_m.f90");
        fs::write(&file, "module test_m\ncontains\nsubroutine test_a()\nend subroutine\nend module\n").unwrap();
        let driver = normal_driver(&file, "test_m", vec!["test_a".into()]);

        let root = PathBuf::from("target").join(format!("fortest_relative_layout_{}", std::process::id()));
        let orchestrator = BuildOrchestrator::new(
            compiler.to_string_lossy(),
            Vec::new(),
            Duration::from_secs(10),
            BuildLayout::new(&root),
        );

        let result = orchestrator.build(&file, &driver, &SearchPaths::default()).await.unwrap();
        let expected = std::path::absolute(orchestrator.layout().driver_dir(&file, &driver))
            .unwrap()
            .join(driver.executable_name());
        assert_eq!(result, BuildResult::Compiled(expected.clone()));
        assert!(expected.is_file());

        orchestrator.clean(&file).unwrap();
        assert!(!orchestrator.layout().file_dir(&file).exists());
        let _ = fs::remove_dir(&root);
    }
}
