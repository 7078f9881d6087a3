//! Trace process launch descriptors
//!
//! Builds the interpreter command line that runs the tracer module against
//! source code on stdin:
//!
//! ```text
//! python3 -m code_tracer                                      # no driver
//! python3 -m code_tracer --bad_driver <msg> - <module> <driver> [args...]
//! ```
//!
//! With a driver, the tracer runs the driver script and traces `<module>`
//! when the driver imports it; `<msg>` is shown if it never does.

use std::path::{Component, Path, PathBuf};

use livetrace_core::{LaunchError, LaunchSpec, TracerConfig};
use session::LaunchResolver;

/// Module search path variable handed to the interpreter
pub const SEARCH_PATH_VAR: &str = "PYTHONPATH";

/// Everything needed to resolve the tracer launch for one source file
#[derive(Debug, Clone)]
pub struct TracerLaunch {
    pub config: TracerConfig,
    pub main_file: PathBuf,
    pub driver: Option<PathBuf>,
    pub driver_args: Vec<String>,
    pub working_dir: PathBuf,
}

impl LaunchResolver for TracerLaunch {
    fn resolve(&self) -> Result<LaunchSpec, LaunchError> {
        build_launch(
            &self.config,
            &self.main_file,
            self.driver.as_deref(),
            &self.driver_args,
            &self.working_dir,
        )
    }
}

/// Build the launch spec for tracing `main_file`
pub fn build_launch(
    config: &TracerConfig,
    main_file: &Path,
    driver: Option<&Path>,
    driver_args: &[String],
    working_dir: &Path,
) -> Result<LaunchSpec, LaunchError> {
    if !main_file.is_file() {
        return Err(LaunchError::MissingSource(main_file.to_path_buf()));
    }
    if !working_dir.is_dir() {
        return Err(LaunchError::InvalidWorkingDir(working_dir.to_path_buf()));
    }

    let interpreter = find_executable(&config.interpreter)
        .ok_or_else(|| LaunchError::InterpreterNotFound(config.interpreter.clone()))?;

    let mut spec = LaunchSpec::new(interpreter)
        .arg("-m")
        .arg(&config.module)
        .current_dir(working_dir);

    // A driver that is the main file itself is no driver at all
    let driver = driver.filter(|d| !same_file(d, main_file));

    let module_dir = match driver {
        Some(driver) => {
            if !driver.is_file() {
                return Err(LaunchError::InvalidDriver {
                    path: driver.to_path_buf(),
                    reason: "file not found".to_string(),
                });
            }
            let module = module_name(main_file, working_dir);
            spec = spec
                .arg("--bad_driver")
                .arg(bad_driver_message(driver, &module))
                .arg("-")
                .arg(&module)
                .arg(driver)
                .args(driver_args);
            driver.parent()
        }
        None => main_file.parent(),
    };
    // A bare file name has an empty parent
    let module_dir = module_dir.map(|dir| if dir.as_os_str().is_empty() { working_dir } else { dir });

    let search_path = config
        .search_path
        .iter()
        .map(PathBuf::as_path)
        .chain(module_dir)
        .collect::<Vec<_>>();
    let joined = std::env::join_paths(search_path)
        .map_err(|e| LaunchError::InvalidSearchPath(e.to_string()))?;

    Ok(spec.env(SEARCH_PATH_VAR, joined))
}

/// Dotted module name of `file` relative to `root`
///
/// `root/pkg/mod.py` becomes `pkg.mod`. Files outside `root` fall back to
/// their bare stem.
pub fn module_name(file: &Path, root: &Path) -> String {
    let name = match file.strip_prefix(root) {
        Ok(relative) => relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("."),
        Err(_) => file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };

    match name.strip_suffix(".py") {
        Some(stripped) => stripped.to_string(),
        None => name,
    }
}

fn bad_driver_message(driver: &Path, module: &str) -> String {
    let driver_name = driver
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| driver.display().to_string());
    format!(
        "{} doesn't call the {} module. Try a different driver.",
        driver_name, module
    )
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Locate an executable by path or on `PATH`
pub fn find_executable(name: &str) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var).find_map(|dir| {
        let full = dir.join(name);
        if full.is_file() {
            return Some(full);
        }
        #[cfg(windows)]
        {
            let exe = full.with_extension("exe");
            if exe.is_file() {
                return Some(exe);
            }
        }
        None
    })
}
