//! Playground configuration with builder pattern.

use std::time::Duration;

/// Default address of the remote Python execution service.
pub const DEFAULT_REMOTE_ENDPOINT: &str = "http://127.0.0.1:5000/api/python";

/// Default location of the embedded Python interpreter binary.
pub const DEFAULT_INDEX_URL: &str = "assets/rustpython.wasm";

/// Where Python snippets run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PythonMode {
    /// In-process interpreter compiled to WebAssembly.
    Embedded,
    /// POST the source to a remote execution service.
    #[default]
    Remote,
}

/// Limits and location for the embedded Python interpreter.
#[derive(Debug, Clone)]
pub struct InterpreterConfig {
    /// Path or `http(s)` URL of the interpreter wasm binary.
    pub index_url: String,
    /// Maximum execution time of a single run.
    pub timeout: Duration,
    /// Maximum linear memory in bytes.
    pub max_memory: u64,
    /// Maximum fuel (instruction count limit).
    pub max_fuel: Option<u64>,
    /// Maximum bytes captured per stream per run.
    pub max_output_bytes: usize,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            index_url: DEFAULT_INDEX_URL.to_string(),
            timeout: Duration::from_secs(30),
            max_memory: 64 * 1024 * 1024, // 64MB
            max_fuel: None,
            max_output_bytes: 1024 * 1024,
        }
    }
}

/// Limits for the embedded JavaScript engine. Unlimited by default.
#[derive(Debug, Clone, Default)]
pub struct JavaScriptConfig {
    pub timeout: Option<Duration>,
    pub max_memory: Option<usize>,
}

/// Configuration for a playground instance.
#[derive(Debug, Clone)]
pub struct PlaygroundConfig {
    /// Which Python backend to build at startup.
    pub python_mode: PythonMode,
    /// Remote execution service URL.
    pub remote_endpoint: String,
    /// Remote request timeout. `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
    pub interpreter: InterpreterConfig,
    pub javascript: JavaScriptConfig,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        PlaygroundConfigBuilder::default().build()
    }
}

impl PlaygroundConfig {
    /// Create a new builder for PlaygroundConfig.
    pub fn builder() -> PlaygroundConfigBuilder {
        PlaygroundConfigBuilder::default()
    }
}

/// Builder for creating PlaygroundConfig instances.
#[derive(Debug, Clone, Default)]
pub struct PlaygroundConfigBuilder {
    python_mode: Option<PythonMode>,
    remote_endpoint: Option<String>,
    request_timeout: Option<Duration>,
    index_url: Option<String>,
    timeout: Option<Duration>,
    max_memory: Option<u64>,
    max_fuel: Option<u64>,
    max_output_bytes: Option<usize>,
    js_timeout: Option<Duration>,
    js_max_memory: Option<usize>,
}

impl PlaygroundConfigBuilder {
    /// Select the Python backend.
    pub fn python_mode(mut self, mode: PythonMode) -> Self {
        self.python_mode = Some(mode);
        self
    }

    /// Set the remote execution service URL.
    pub fn remote_endpoint(mut self, url: impl Into<String>) -> Self {
        self.remote_endpoint = Some(url.into());
        self
    }

    /// Give up on remote requests after this long.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the path or URL of the Python interpreter wasm.
    pub fn index_url(mut self, location: impl Into<String>) -> Self {
        self.index_url = Some(location.into());
        self
    }

    /// Set the maximum execution time of an embedded Python run.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the embedded interpreter's memory limit in bytes.
    pub fn max_memory(mut self, bytes: u64) -> Self {
        self.max_memory = Some(bytes);
        self
    }

    /// Set the embedded interpreter's fuel budget.
    pub fn max_fuel(mut self, fuel: u64) -> Self {
        self.max_fuel = Some(fuel);
        self
    }

    /// Set how many bytes of stdout/stderr a Python run may produce.
    pub fn max_output_bytes(mut self, bytes: usize) -> Self {
        self.max_output_bytes = Some(bytes);
        self
    }

    /// Interrupt JavaScript runs after this long.
    pub fn javascript_timeout(mut self, timeout: Duration) -> Self {
        self.js_timeout = Some(timeout);
        self
    }

    /// Cap the JavaScript heap in bytes.
    pub fn javascript_max_memory(mut self, bytes: usize) -> Self {
        self.js_max_memory = Some(bytes);
        self
    }

    /// Build the PlaygroundConfig.
    pub fn build(self) -> PlaygroundConfig {
        let interpreter_default = InterpreterConfig::default();
        PlaygroundConfig {
            python_mode: self.python_mode.unwrap_or_default(),
            remote_endpoint: self
                .remote_endpoint
                .unwrap_or_else(|| DEFAULT_REMOTE_ENDPOINT.to_string()),
            request_timeout: self.request_timeout,
            interpreter: InterpreterConfig {
                index_url: self.index_url.unwrap_or(interpreter_default.index_url),
                timeout: self.timeout.unwrap_or(interpreter_default.timeout),
                max_memory: self.max_memory.unwrap_or(interpreter_default.max_memory),
                max_fuel: self.max_fuel.or(interpreter_default.max_fuel),
                max_output_bytes: self
                    .max_output_bytes
                    .unwrap_or(interpreter_default.max_output_bytes),
            },
            javascript: JavaScriptConfig {
                timeout: self.js_timeout,
                max_memory: self.js_max_memory,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = PlaygroundConfig::builder().build();
        assert_eq!(config.python_mode, PythonMode::Remote);
        assert_eq!(config.remote_endpoint, DEFAULT_REMOTE_ENDPOINT);
        assert!(config.request_timeout.is_none());
        assert_eq!(config.interpreter.index_url, DEFAULT_INDEX_URL);
        assert_eq!(config.interpreter.timeout, Duration::from_secs(30));
        assert_eq!(config.interpreter.max_memory, 64 * 1024 * 1024);
        assert!(config.javascript.timeout.is_none());
    }

    #[test]
    fn test_builder() {
        let config = PlaygroundConfig::builder()
            .python_mode(PythonMode::Embedded)
            .index_url("/opt/python.wasm")
            .timeout(Duration::from_secs(5))
            .max_memory(32 * 1024 * 1024)
            .max_fuel(1_000_000)
            .javascript_timeout(Duration::from_millis(250))
            .build();

        assert_eq!(config.python_mode, PythonMode::Embedded);
        assert_eq!(config.interpreter.index_url, "/opt/python.wasm");
        assert_eq!(config.interpreter.timeout, Duration::from_secs(5));
        assert_eq!(config.interpreter.max_memory, 32 * 1024 * 1024);
        assert_eq!(config.interpreter.max_fuel, Some(1_000_000));
        assert_eq!(config.javascript.timeout, Some(Duration::from_millis(250)));
    }
}
