//! Python through the embedded WebAssembly interpreter.
//!
//! The interpreter is an owned, lazily constructed resource: the first call
//! to [`EmbeddedPython::initialize`] loads it, every later call observes the
//! stored outcome. A failed load is final; there is no retry path.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

use crate::error::{PlaygroundError, Result};
use crate::executor::config::InterpreterConfig;
use crate::executor::output::{stderr_sink, stdout_sink, OutputBuffer, TextSink};
use crate::executor::wasm::WasmInterpreter;
use crate::executor::PythonRunner;

/// Shown in the output panel when the interpreter cannot be loaded.
pub const INIT_FAILURE_MESSAGE: &str =
    "Failed to initialize Python environment. Please try again later.";

/// Replaces the raw error when a snippet touches files or the OS.
pub const OS_UNSUPPORTED_MESSAGE: &str =
    "Error: File I/O and OS operations are not supported in sandboxed Python.";

/// Lifecycle of the embedded interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpreterState {
    Uninitialized,
    Loading,
    Ready,
    Failed,
}

impl fmt::Display for InterpreterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InterpreterState::Uninitialized => "uninitialized",
            InterpreterState::Loading => "loading",
            InterpreterState::Ready => "ready",
            InterpreterState::Failed => "failed",
        })
    }
}

/// Everything the interpreter needs at initialization.
#[derive(Clone)]
pub struct InterpreterOptions {
    pub config: InterpreterConfig,
    /// Receives each line the snippet writes to stdout.
    pub stdout: TextSink,
    /// Receives each line the snippet writes to stderr.
    pub stderr: TextSink,
}

impl InterpreterOptions {
    /// Options whose sinks feed `output` the way the panel expects.
    pub fn for_output(config: InterpreterConfig, output: &OutputBuffer) -> Self {
        Self {
            config,
            stdout: stdout_sink(output),
            stderr: stderr_sink(output),
        }
    }
}

/// Python runner backed by [`WasmInterpreter`].
pub struct EmbeddedPython {
    options: InterpreterOptions,
    output: OutputBuffer,
    state: Mutex<InterpreterState>,
    interpreter: OnceCell<Option<WasmInterpreter>>,
}

impl fmt::Debug for EmbeddedPython {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddedPython")
            .field("index_url", &self.options.config.index_url)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl EmbeddedPython {
    /// Create an uninitialized runner writing into `output`.
    pub fn new(config: InterpreterConfig, output: &OutputBuffer) -> Self {
        Self::with_options(InterpreterOptions::for_output(config, output), output)
    }

    /// Create an uninitialized runner with custom stream sinks.
    ///
    /// `output` still receives the initialization failure message.
    pub fn with_options(options: InterpreterOptions, output: &OutputBuffer) -> Self {
        Self {
            options,
            output: output.clone(),
            state: Mutex::new(InterpreterState::Uninitialized),
            interpreter: OnceCell::new(),
        }
    }

    pub fn state(&self) -> InterpreterState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: InterpreterState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Load the interpreter once and report the resulting state.
    ///
    /// Concurrent callers wait for the same load.
    pub async fn initialize(&self) -> InterpreterState {
        self.interpreter
            .get_or_init(|| async {
                self.set_state(InterpreterState::Loading);
                info!(index_url = %self.options.config.index_url, "initializing embedded Python");

                match WasmInterpreter::load(self.options.config.clone()).await {
                    Ok(interpreter) => {
                        self.set_state(InterpreterState::Ready);
                        info!("embedded Python ready");
                        Some(interpreter)
                    }
                    Err(e) => {
                        error!(error = %e, "failed to initialize embedded Python");
                        self.output.replace(INIT_FAILURE_MESSAGE);
                        self.set_state(InterpreterState::Failed);
                        None
                    }
                }
            })
            .await;
        self.state()
    }

    /// Run source text, streaming its output into the sinks.
    ///
    /// Fails when the interpreter is not ready, when a limit is hit, or when
    /// the snippet exits with an uncaught exception. Lines printed before the
    /// exception are still delivered to the stdout sink.
    pub async fn run_source(&self, code: &str) -> Result<()> {
        let Some(interpreter) = self.interpreter.get().and_then(Option::as_ref) else {
            return Err(PlaygroundError::InterpreterUnavailable(self.state()));
        };

        let result = interpreter.execute(code).await?;
        for line in result.stdout.lines() {
            (self.options.stdout)(line);
        }

        if result.is_success() {
            for line in result.stderr.lines() {
                (self.options.stderr)(line);
            }
            return Ok(());
        }

        Err(PlaygroundError::from_python_stderr(&result.stderr).unwrap_or_else(|| {
            let stderr = result.stderr.trim();
            if stderr.is_empty() {
                PlaygroundError::ExecutionFailed(format!(
                    "interpreter exited with status {}",
                    result.exit_code
                ))
            } else {
                PlaygroundError::ExecutionFailed(stderr.to_string())
            }
        }))
    }
}

/// Text the panel shows for a failed embedded run.
pub fn describe_failure(err: &PlaygroundError) -> String {
    let text = err.failure_text();
    if text.contains("OSError") && text.contains("Errno 29") {
        OS_UNSUPPORTED_MESSAGE.to_string()
    } else {
        format!("Error: {text}")
    }
}

impl PythonRunner for EmbeddedPython {
    async fn run_python(&self, code: &str) -> Option<String> {
        match self.run_source(code).await {
            Ok(()) => None,
            Err(PlaygroundError::InterpreterUnavailable(state)) => {
                debug!(%state, "ignoring Python run, interpreter not ready");
                None
            }
            Err(e) => {
                if e.is_python_exception() {
                    debug!(error = %e, "snippet raised");
                } else {
                    warn!(error = %e, "embedded run failed");
                }
                Some(describe_failure(&e))
            }
        }
    }

    fn is_loading(&self) -> bool {
        matches!(
            self.state(),
            InterpreterState::Uninitialized | InterpreterState::Loading
        )
    }

    async fn mount(&self) {
        self.initialize().await;
    }
}
