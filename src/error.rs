//! Error types for the playground executors.

use thiserror::Error;

use crate::executor::embedded::InterpreterState;

/// Errors that can occur while preparing or running a snippet.
///
/// None of these reach the visitor as-is: the executor turns every failure
/// into a line of text in the output panel. They exist so the individual
/// runners can be tested and composed with `?`.
#[derive(Error, Debug)]
pub enum PlaygroundError {
    /// The run exceeded the configured wall-clock timeout.
    #[error("execution timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The run exceeded its memory ceiling.
    #[error("memory limit exceeded: {0}")]
    MemoryLimitExceeded(String),

    /// An engine (wasmtime or QuickJS) could not be created or configured.
    #[error("failed to initialize runtime: {0}")]
    RuntimeInit(#[source] anyhow::Error),

    /// The Python interpreter binary could not be fetched, compiled or instantiated.
    #[error("failed to load Python interpreter: {0}")]
    ModuleLoad(#[source] anyhow::Error),

    /// The run failed for a reason other than a Python exception.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// An uncaught Python exception ended the run.
    #[error("Python {exception_type}: {message}")]
    PythonException {
        /// The exception class, e.g. `"OSError"`.
        exception_type: String,
        /// The exception message, possibly empty.
        message: String,
        /// The traceback text as printed by the interpreter, if any.
        traceback: Option<String>,
    },

    /// Python was requested before the embedded interpreter became ready.
    #[error("Python interpreter is not available ({0})")]
    InterpreterUnavailable(InterpreterState),

    /// I/O error while reading the interpreter binary.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The HTTP request to the execution service or interpreter index failed.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The execution service answered with a body that is not JSON.
    #[error("malformed response: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The interpreter wasm file was not found.
    #[error("Python interpreter wasm not found at: {0}")]
    InterpreterNotFound(String),

    /// The run exhausted its fuel budget.
    #[error("execution ran out of fuel after {consumed:?} instructions")]
    OutOfFuel {
        /// Number of instructions consumed before running out.
        consumed: Option<u64>,
    },
}

impl PlaygroundError {
    /// Build a Python exception error from the interpreter's stderr.
    pub fn from_python_stderr(stderr: &str) -> Option<Self> {
        parse_python_exception(stderr)
    }

    /// The message text a failed run reports to the output panel.
    ///
    /// Python exceptions render as the interpreter printed them (traceback
    /// included), so that substring checks such as the `OSError` special
    /// case see the same text a user would.
    pub fn failure_text(&self) -> String {
        match self {
            PlaygroundError::PythonException {
                traceback: Some(traceback),
                ..
            } => traceback.clone(),
            PlaygroundError::PythonException {
                exception_type,
                message,
                traceback: None,
            } if message.is_empty() => exception_type.clone(),
            PlaygroundError::PythonException {
                exception_type,
                message,
                traceback: None,
            } => format!("{exception_type}: {message}"),
            PlaygroundError::ExecutionFailed(text) => text.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, PlaygroundError::Timeout(_))
    }

    pub fn is_memory_limit(&self) -> bool {
        matches!(self, PlaygroundError::MemoryLimitExceeded(_))
    }

    pub fn is_python_exception(&self) -> bool {
        matches!(self, PlaygroundError::PythonException { .. })
    }

    pub fn is_out_of_fuel(&self) -> bool {
        matches!(self, PlaygroundError::OutOfFuel { .. })
    }

    /// Check if the error came from talking to a remote service rather
    /// than from user code.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            PlaygroundError::Transport(_) | PlaygroundError::MalformedResponse(_)
        )
    }
}

/// Result type alias for playground operations.
pub type Result<T> = std::result::Result<T, PlaygroundError>;

/// Parse an uncaught Python exception from interpreter stderr.
///
/// Recognizes the usual shape:
///
/// ```text
/// Traceback (most recent call last):
///   File "<string>", line 1, in <module>
/// OSError: [Errno 29] I/O error
/// ```
///
/// The last unindented line naming an exception wins. Returns `None` when no
/// such line exists.
pub fn parse_python_exception(stderr: &str) -> Option<PlaygroundError> {
    let lines: Vec<&str> = stderr.lines().collect();

    let (exception_idx, exception_line) = lines
        .iter()
        .enumerate()
        .rev()
        .find(|(_, line)| !line.starts_with(char::is_whitespace) && looks_like_exception(line))
        .map(|(idx, line)| (idx, *line))?;

    let (exception_type, message) = match exception_line.split_once(':') {
        Some((name, rest)) => (name.trim().to_string(), rest.trim().to_string()),
        None => (exception_line.trim().to_string(), String::new()),
    };

    let traceback = lines[..exception_idx]
        .iter()
        .rposition(|line| line.starts_with("Traceback (most recent call last):"))
        .map(|start| lines[start..=exception_idx].join("\n"));

    Some(PlaygroundError::PythonException {
        exception_type,
        message,
        traceback,
    })
}

const EXCEPTION_SUFFIXES: [&str; 3] = ["Error", "Exception", "Warning"];
const BARE_EXCEPTIONS: [&str; 4] = [
    "KeyboardInterrupt",
    "SystemExit",
    "StopIteration",
    "GeneratorExit",
];

/// Check whether a line starts with an exception class name.
///
/// The class name is the leading identifier (dotted module paths allowed);
/// it must be followed by `:` or the end of the line.
fn looks_like_exception(line: &str) -> bool {
    if !line.starts_with(|c: char| c.is_ascii_uppercase()) || line.starts_with("Traceback") {
        return false;
    }

    let name_end = line
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
        .unwrap_or(line.len());
    let name = &line[..name_end];
    let terminated = matches!(line[name_end..].chars().next(), None | Some(':'));
    if !terminated {
        return false;
    }

    let short_name = name.rsplit('.').next().unwrap_or(name);
    EXCEPTION_SUFFIXES
        .iter()
        .any(|suffix| short_name.ends_with(suffix))
        || BARE_EXCEPTIONS.contains(&short_name)
}
