//! Command-line stand-in for the "Try it now" panel.
//!
//! Reads a snippet from a file or stdin, runs it once and prints what the
//! output area would show. Diagnostics go to stderr (`RUST_LOG=debug`).

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use code_playground_rs::executor::config::{DEFAULT_INDEX_URL, DEFAULT_REMOTE_ENDPOINT};
use code_playground_rs::{
    InterpreterState, Language, Playground, PlaygroundConfig, PythonBackend, PythonMode,
    TryItPanel,
};

const MAX_MEMORY_MIB: u64 = 4096;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    /// Run Python in the embedded wasm interpreter.
    Embedded,
    /// Send Python to the remote execution service.
    Remote,
}

impl From<ModeArg> for PythonMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Embedded => PythonMode::Embedded,
            ModeArg::Remote => PythonMode::Remote,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "playground", about = "Run a JavaScript or Python snippet", version)]
struct Cli {
    /// File containing the snippet. Reads stdin when omitted.
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Language of the snippet (javascript or python).
    #[arg(short, long, default_value = "javascript")]
    language: Language,

    /// Where Python runs.
    #[arg(long = "python-mode", value_enum, default_value_t = ModeArg::Remote)]
    python_mode: ModeArg,

    /// Remote execution service URL.
    #[arg(long, default_value = DEFAULT_REMOTE_ENDPOINT)]
    endpoint: String,

    /// Remote request timeout in seconds. Waits indefinitely when omitted.
    #[arg(long = "request-timeout", value_name = "SECS")]
    request_timeout: Option<u64>,

    /// Path or URL of the embedded Python interpreter.
    #[arg(long = "index-url", default_value = DEFAULT_INDEX_URL)]
    index_url: String,

    /// Embedded Python run timeout in seconds.
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    timeout: u64,

    /// Embedded Python memory limit in MiB (wasm32 tops out at 4096).
    #[arg(
        long = "max-memory",
        value_name = "MIB",
        default_value_t = 64,
        value_parser = clap::value_parser!(u64).range(1..=MAX_MEMORY_MIB)
    )]
    max_memory: u64,

    /// JavaScript run timeout in milliseconds. Unlimited when omitted.
    #[arg(long = "js-timeout", value_name = "MILLIS")]
    js_timeout: Option<u64>,
}

impl Cli {
    fn config(&self) -> PlaygroundConfig {
        let mut builder = PlaygroundConfig::builder()
            .python_mode(self.python_mode.into())
            .remote_endpoint(self.endpoint.clone())
            .index_url(self.index_url.clone())
            .timeout(Duration::from_secs(self.timeout))
            .max_memory(self.max_memory.saturating_mul(1024 * 1024));
        if let Some(secs) = self.request_timeout {
            builder = builder.request_timeout(Duration::from_secs(secs));
        }
        if let Some(millis) = self.js_timeout {
            builder = builder.javascript_timeout(Duration::from_millis(millis));
        }
        builder.build()
    }

    fn read_code(&self) -> Result<String> {
        match &self.file {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display())),
            None => {
                let mut code = String::new();
                io::stdin()
                    .read_to_string(&mut code)
                    .context("failed to read snippet from stdin")?;
                Ok(code)
            }
        }
    }
}

fn print_output(output: &str) {
    if output.is_empty() {
        return;
    }
    if output.ends_with('\n') {
        print!("{output}");
    } else {
        println!("{output}");
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let code = cli.read_code()?;
    let playground = Playground::from_config(&cli.config())?;

    let mut panel = TryItPanel::new(playground);
    panel.select_language(cli.language);
    panel.set_code(code);
    panel.executor().mount().await;

    if let PythonBackend::Embedded(python) = panel.executor().python() {
        if cli.language == Language::Python && python.state() == InterpreterState::Failed {
            print_output(&panel.output());
            return Ok(ExitCode::FAILURE);
        }
    }

    let output = panel.run().await;
    print_output(&output);
    Ok(ExitCode::SUCCESS)
}
