//! The external closure optimizer, run as a subprocess.

use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

use super::{Optimizer, OptimizerJob};
use crate::abort::AbortHandle;
use crate::error::{Error, Result};

/// Program names looked up on `PATH`, in order.
pub const OPTIMIZER_PROGRAMS: [&str; 2] = ["google-closure-compiler", "closure-compiler"];

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs the closure optimizer.
#[derive(Debug, Clone)]
pub struct ClosureCompiler {
    program: PathBuf,
}

impl ClosureCompiler {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Use `configured` if given, otherwise the first of [`OPTIMIZER_PROGRAMS`] on `PATH`.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if no optimizer program can be found.
    pub fn locate(configured: Option<&Path>) -> Result<Self> {
        if let Some(program) = configured {
            // Bare names are resolved through PATH like the defaults.
            return match which::which(program) {
                Ok(path) => Ok(Self::new(path)),
                Err(_) if program.is_file() => Ok(Self::new(program)),
                Err(e) => Err(Error::Config(format!(
                    "optimizer '{}' not found: {}",
                    program.display(),
                    e
                ))),
            };
        }

        OPTIMIZER_PROGRAMS
            .iter()
            .find_map(|name| which::which(name).ok())
            .map(Self::new)
            .ok_or_else(|| {
                Error::Config(format!(
                    "no optimizer found on PATH (looked for {})",
                    OPTIMIZER_PROGRAMS.join(", ")
                ))
            })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Command-line arguments for `job`.
    pub fn arguments(&self, job: &OptimizerJob) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--compilation_level".into(),
            "ADVANCED_OPTIMIZATIONS".into(),
            "--js_output_file".into(),
            job.output.clone().into(),
            "--create_source_map".into(),
            source_map_path(&job.output).into(),
            "--source_map_format".into(),
            "V3".into(),
            "--entry_point".into(),
            format!("goog:{}", job.entry_point).into(),
        ];

        if job.strict {
            args.extend(
                [
                    "--warning_level",
                    "VERBOSE",
                    "--jscomp_error",
                    "checkTypes",
                    "--jscomp_error",
                    "missingRequire",
                ]
                .map(OsString::from),
            );
        } else {
            args.extend(["--warning_level", "QUIET"].map(OsString::from));
        }

        for extern_file in &job.externs {
            args.push("--externs".into());
            args.push(extern_file.clone().into());
        }
        for input in &job.inputs {
            args.push("--js".into());
            args.push(input.clone().into());
        }
        args
    }
}

impl Optimizer for ClosureCompiler {
    fn optimize(&self, job: &OptimizerJob, abort: &AbortHandle) -> Result<()> {
        tracing::info!(
            "Running {} on {} inputs",
            self.program.display(),
            job.inputs.len()
        );

        let mut child = Command::new(&self.program)
            .args(self.arguments(job))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                Error::Optimization(format!(
                    "failed to start optimizer '{}': {}",
                    self.program.display(),
                    e
                ))
            })?;

        // Drain both pipes so a chatty optimizer never blocks on a full pipe.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = loop {
            if abort.is_aborted() {
                kill(&mut child);
                return Err(Error::Aborted);
            }
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    kill(&mut child);
                    return Err(Error::Optimization(format!(
                        "failed to wait for optimizer: {}",
                        e
                    )));
                }
            }
        };

        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();
        if !stdout.trim().is_empty() {
            tracing::debug!("optimizer output:\n{}", stdout);
        }

        if !status.success() {
            return Err(Error::Optimization(if stderr.trim().is_empty() {
                format!("{} exited with {}", self.program.display(), status)
            } else {
                stderr
            }));
        }

        if !stderr.trim().is_empty() {
            tracing::warn!("optimizer warnings:\n{}", stderr);
        }
        Ok(())
    }
}

/// The source map written next to `bundle`.
pub fn source_map_path(bundle: &Path) -> PathBuf {
    let mut path = bundle.as_os_str().to_owned();
    path.push(".map");
    PathBuf::from(path)
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut text = String::new();
        if let Some(mut pipe) = pipe {
            let mut bytes = Vec::new();
            if pipe.read_to_end(&mut bytes).is_ok() {
                text = String::from_utf8_lossy(&bytes).into_owned();
            }
        }
        text
    })
}

fn kill(child: &mut Child) {
    if let Err(e) = child.kill() {
        tracing::warn!("Failed to kill optimizer: {}", e);
    }
    match child.wait() {
        Ok(status) => tracing::debug!("Optimizer reaped after kill: {}", status),
        Err(e) => tracing::debug!("Failed to reap optimizer: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn job(dir: &Path) -> OptimizerJob {
        OptimizerJob {
            inputs: vec![dir.join("base.js"), dir.join("App.js")],
            externs: vec![dir.join("externs.js")],
            output: dir.join("out/App.js"),
            strict: false,
            entry_point: "App".into(),
        }
    }

    #[test]
    fn test_arguments() {
        let dir = Path::new("/p");
        let args: Vec<String> = ClosureCompiler::new("cc")
            .arguments(&job(dir))
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        let joined = args.join(" ");

        assert!(joined.contains("--compilation_level ADVANCED_OPTIMIZATIONS"));
        assert!(joined.contains("--js_output_file /p/out/App.js"));
        assert!(joined.contains("--create_source_map /p/out/App.js.map"));
        assert!(joined.contains("--entry_point goog:App"));
        assert!(joined.contains("--warning_level QUIET"));
        assert!(joined.ends_with("--externs /p/externs.js --js /p/base.js --js /p/App.js"));
    }

    #[test]
    fn test_strict_arguments() {
        let mut strict = job(Path::new("/p"));
        strict.strict = true;
        let args = ClosureCompiler::new("cc").arguments(&strict);
        assert!(args.contains(&OsString::from("VERBOSE")));
        assert!(args.contains(&OsString::from("checkTypes")));
    }

    #[test]
    fn test_locate_missing_program() {
        let err = ClosureCompiler::locate(Some(Path::new("/nonexistent/optimizer"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_source_map_path() {
        assert_eq!(
            source_map_path(Path::new("/r/App.js")),
            PathBuf::from("/r/App.js.map")
        );
    }

    #[cfg(unix)]
    fn script(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-optimizer.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("Failed to write script");
        let mut perms = std::fs::metadata(&path)
            .expect("Failed to stat script")
            .permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).expect("Failed to chmod script");
        path
    }

    #[cfg(unix)]
    #[test]
    fn test_failure_passes_stderr_through() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let program = script(temp.path(), "echo 'App.js:3: ERROR - undefined name' >&2\nexit 2");

        let err = ClosureCompiler::new(program)
            .optimize(&job(temp.path()), &AbortHandle::new())
            .unwrap_err();

        match err {
            Error::Optimization(diagnostics) => {
                assert_eq!(diagnostics, "App.js:3: ERROR - undefined name\n");
            }
            other => panic!("Unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_success_receives_arguments() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let args_file = temp.path().join("args.txt");
        let program = script(
            temp.path(),
            &format!("printf '%s\\n' \"$@\" > '{}'", args_file.display()),
        );

        ClosureCompiler::new(program)
            .optimize(&job(temp.path()), &AbortHandle::new())
            .expect("Failed to optimize");

        let args = std::fs::read_to_string(&args_file).expect("Failed to read args");
        assert!(args.contains("goog:App\n"));
        assert!(args.contains(&format!("{}\n", temp.path().join("App.js").display())));
    }

    #[cfg(unix)]
    #[test]
    fn test_abort_kills_optimizer() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let program = script(temp.path(), "exec sleep 30");
        let abort = AbortHandle::new();

        let trigger = abort.clone();
        let killer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(200));
            trigger.abort();
        });

        let started = std::time::Instant::now();
        let err = ClosureCompiler::new(program)
            .optimize(&job(temp.path()), &abort)
            .unwrap_err();
        killer.join().expect("Abort thread panicked");

        assert!(matches!(err, Error::Aborted));
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
