//! # Code Playground
//!
//! The execution side of a "Try it now" coding panel: pick JavaScript or
//! Python, run a snippet, get back the text for the output area.
//!
//! - **JavaScript** runs in an embedded QuickJS engine. The snippet is the
//!   body of a function that receives a capturing `console`; logged lines
//!   (or the return value, when nothing was logged) become the output.
//! - **Python** runs in one of two backends, chosen at startup:
//!   - *embedded*: a Python interpreter compiled to WebAssembly, hosted by
//!     wasmtime with no filesystem, network or environment access;
//!   - *remote*: the source is POSTed to an execution service and its
//!     `output` / `error` field is shown.
//!
//! Failures never escape as errors: every path ends with a string in the
//! output area.
//!
//! ## Example
//!
//! ```rust,ignore
//! use code_playground_rs::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = PlaygroundConfig::builder()
//!         .python_mode(PythonMode::Remote)
//!         .build();
//!
//!     let playground = Playground::from_config(&config)?;
//!     playground.mount().await;
//!
//!     let output = playground
//!         .run(Language::JavaScript, "console.log('hi'); console.warn('careful')")
//!         .await;
//!     assert_eq!(output, "hi\nWarning: careful");
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Trust model
//!
//! Snippets are arbitrary code. The JavaScript engine and the wasm sandbox
//! are the only isolation; the remote service is trusted to isolate itself.
//! Optional limits (timeouts, memory ceilings, fuel) bound resource use but
//! are not a security boundary for the JavaScript path.

pub mod error;
pub mod executor;
pub mod language;
pub mod panel;
pub mod prelude;

pub use error::{PlaygroundError, Result};
pub use executor::config::{
    InterpreterConfig, JavaScriptConfig, PlaygroundConfig, PlaygroundConfigBuilder, PythonMode,
};
pub use executor::embedded::{EmbeddedPython, InterpreterOptions, InterpreterState};
pub use executor::javascript::JavaScriptRunner;
pub use executor::output::{OutputBuffer, TextSink};
pub use executor::remote::{ExecuteResponse, RemotePython};
pub use executor::wasm::{ExecutionResult, WasmInterpreter};
pub use executor::{CodeExecutor, Playground, PythonBackend, PythonRunner};
pub use language::Language;
pub use panel::TryItPanel;
