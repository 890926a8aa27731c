//! The language router and the runners behind it.

pub mod config;
pub mod embedded;
pub mod javascript;
pub mod limits;
pub mod output;
pub mod remote;
pub mod wasm;

use std::future::Future;

use tracing::debug;

use crate::error::Result;
use crate::executor::config::{PlaygroundConfig, PythonMode};
use crate::executor::embedded::EmbeddedPython;
use crate::executor::javascript::JavaScriptRunner;
use crate::executor::output::OutputBuffer;
use crate::executor::remote::RemotePython;
use crate::language::Language;

/// Something that can run Python source on behalf of the playground.
pub trait PythonRunner: Send + Sync {
    /// Run a snippet.
    ///
    /// Returns the text that replaces the output panel, or `None` when the
    /// runner already streamed its output into the panel (or had nothing to
    /// say).
    fn run_python(&self, code: &str) -> impl Future<Output = Option<String>> + Send;

    /// Whether the run control should be disabled right now.
    fn is_loading(&self) -> bool;

    /// One-time setup when the playground is mounted.
    fn mount(&self) -> impl Future<Output = ()> + Send;
}

/// The "code executor" capability the panel talks to.
pub trait CodeExecutor: Send + Sync {
    /// Clear the output, run `code` as `language`, and return the output
    /// panel text afterwards.
    fn run(&self, language: Language, code: &str) -> impl Future<Output = String> + Send;

    /// The output panel text.
    fn current_output(&self) -> String;

    /// Whether the run control should be disabled.
    fn is_loading(&self) -> bool;
}

/// The Python backend chosen at startup.
#[derive(Debug)]
pub enum PythonBackend {
    Embedded(EmbeddedPython),
    Remote(RemotePython),
}

impl PythonBackend {
    pub fn mode(&self) -> PythonMode {
        match self {
            PythonBackend::Embedded(_) => PythonMode::Embedded,
            PythonBackend::Remote(_) => PythonMode::Remote,
        }
    }
}

impl PythonRunner for PythonBackend {
    async fn run_python(&self, code: &str) -> Option<String> {
        match self {
            PythonBackend::Embedded(python) => python.run_python(code).await,
            PythonBackend::Remote(python) => python.run_python(code).await,
        }
    }

    fn is_loading(&self) -> bool {
        match self {
            PythonBackend::Embedded(python) => python.is_loading(),
            PythonBackend::Remote(python) => python.is_loading(),
        }
    }

    async fn mount(&self) {
        match self {
            PythonBackend::Embedded(python) => python.mount().await,
            PythonBackend::Remote(python) => python.mount().await,
        }
    }
}

/// Routes runs by language and owns the output panel.
///
/// Runs are not serialized: a second run may start while one is still in
/// flight, and whichever finishes last decides the panel text. Callers that
/// want the run control disabled should check [`CodeExecutor::is_loading`].
#[derive(Debug)]
pub struct Playground<P = PythonBackend> {
    output: OutputBuffer,
    javascript: JavaScriptRunner,
    python: P,
}

impl Playground<PythonBackend> {
    /// Build the playground and the Python backend selected by `config`.
    ///
    /// Nothing is loaded yet; call [`Playground::mount`].
    pub fn from_config(config: &PlaygroundConfig) -> Result<Self> {
        let output = OutputBuffer::new();
        let python = match config.python_mode {
            PythonMode::Embedded => {
                PythonBackend::Embedded(EmbeddedPython::new(config.interpreter.clone(), &output))
            }
            PythonMode::Remote => PythonBackend::Remote(RemotePython::new(
                config.remote_endpoint.clone(),
                config.request_timeout,
            )?),
        };
        Ok(Self::with_runner(
            output,
            JavaScriptRunner::new(config.javascript.clone()),
            python,
        ))
    }
}

impl<P: PythonRunner> Playground<P> {
    /// Assemble a playground from parts. `output` must be the buffer any
    /// streaming runner was built with.
    pub fn with_runner(output: OutputBuffer, javascript: JavaScriptRunner, python: P) -> Self {
        Self {
            output,
            javascript,
            python,
        }
    }

    /// Perform the runner's one-time setup (interpreter load in embedded mode).
    pub async fn mount(&self) {
        self.python.mount().await;
    }

    pub fn python(&self) -> &P {
        &self.python
    }

    pub fn output(&self) -> &OutputBuffer {
        &self.output
    }
}

impl<P: PythonRunner> CodeExecutor for Playground<P> {
    async fn run(&self, language: Language, code: &str) -> String {
        self.output.reset();
        debug!(%language, bytes = code.len(), "running snippet");

        let replacement = match language {
            Language::JavaScript => Some(self.javascript.run(code).await),
            Language::Python => self.python.run_python(code).await,
        };
        if let Some(text) = replacement {
            self.output.replace(text);
        }
        self.output.snapshot()
    }

    fn current_output(&self) -> String {
        self.output.snapshot()
    }

    fn is_loading(&self) -> bool {
        self.python.is_loading()
    }
}
