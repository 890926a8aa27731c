//! The Python interpreter compiled to WebAssembly, hosted by wasmtime.

use std::path::Path;

use wasmtime::{Engine, Linker, Module, Store, Trap};
use wasmtime_wasi::pipe::MemoryOutputPipe;
use wasmtime_wasi::preview1;
use wasmtime_wasi::{I32Exit, WasiCtxBuilder};

use crate::error::{PlaygroundError, Result};
use crate::executor::config::InterpreterConfig;
use crate::executor::limits::{RunState, StoreLimiterExt};

/// Captured streams and exit status of one interpreter run.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    /// Exit code (0 for success).
    pub exit_code: i32,
}

impl ExecutionResult {
    /// Check if the run exited with status 0.
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// A compiled interpreter module, ready to run snippets.
///
/// Each run gets a fresh store and WASI context with no preopened
/// directories, no inherited environment and in-memory stdio, so runs share
/// nothing but the compiled code.
#[derive(Clone)]
pub struct WasmInterpreter {
    engine: Engine,
    module: Module,
    config: InterpreterConfig,
}

impl std::fmt::Debug for WasmInterpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WasmInterpreter")
            .field("index_url", &self.config.index_url)
            .finish_non_exhaustive()
    }
}

impl WasmInterpreter {
    /// Fetch and compile the interpreter named by `config.index_url`.
    ///
    /// `http://` and `https://` locations are downloaded; anything else is
    /// read from the local filesystem.
    pub async fn load(config: InterpreterConfig) -> Result<Self> {
        let engine = Self::engine_for(&config)?;

        let wasm_bytes = if is_remote(&config.index_url) {
            Some(fetch_remote(&config.index_url).await?)
        } else {
            None
        };

        let compile_engine = engine.clone();
        let location = config.index_url.clone();
        let module = tokio::task::spawn_blocking(move || {
            let bytes = match wasm_bytes {
                Some(bytes) => bytes,
                None => read_local(Path::new(&location))?,
            };
            Module::new(&compile_engine, &bytes).map_err(|e| {
                PlaygroundError::ModuleLoad(anyhow::anyhow!("failed to compile module: {}", e))
            })
        })
        .await
        .map_err(|e| PlaygroundError::ModuleLoad(anyhow::anyhow!("compile task failed: {}", e)))??;

        Ok(Self {
            engine,
            module,
            config,
        })
    }

    fn engine_for(config: &InterpreterConfig) -> Result<Engine> {
        let mut engine_config = wasmtime::Config::new();
        engine_config.epoch_interruption(true);
        engine_config.consume_fuel(config.max_fuel.is_some());

        Engine::new(&engine_config).map_err(|e| {
            PlaygroundError::RuntimeInit(anyhow::anyhow!("failed to create engine: {}", e))
        })
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Run Python source to completion and capture its streams.
    ///
    /// A non-zero exit (an uncaught exception, `sys.exit(1)`) is a normal
    /// result. Errors are reserved for limit violations and host failures.
    ///
    /// On timeout every in-flight run of this interpreter is interrupted,
    /// since they share one engine epoch.
    pub async fn execute(&self, code: &str) -> Result<ExecutionResult> {
        let code = code.to_string();
        let timeout = self.config.timeout;
        let engine = self.engine.clone();
        let module = self.module.clone();
        let config = self.config.clone();

        let exec_handle =
            tokio::task::spawn_blocking(move || Self::execute_sync(&engine, &module, &code, &config));

        tokio::select! {
            joined = exec_handle => match joined {
                Ok(result) => result,
                Err(e) => Err(PlaygroundError::ExecutionFailed(format!("task panicked: {}", e))),
            },
            _ = tokio::time::sleep(timeout) => {
                self.engine.increment_epoch();
                Err(PlaygroundError::Timeout(timeout))
            }
        }
    }

    fn execute_sync(
        engine: &Engine,
        module: &Module,
        code: &str,
        config: &InterpreterConfig,
    ) -> Result<ExecutionResult> {
        let stdout = MemoryOutputPipe::new(config.max_output_bytes);
        let stderr = MemoryOutputPipe::new(config.max_output_bytes);

        let wasi_ctx = WasiCtxBuilder::new()
            .args(&["python", "-c", code])
            .stdout(stdout.clone())
            .stderr(stderr.clone())
            .build_p1();

        let mut store = Store::new(engine, RunState::new(config.max_memory, wasi_ctx));
        store.enforce_limits();
        store.epoch_deadline_trap();
        store.set_epoch_deadline(1);

        if let Some(fuel) = config.max_fuel {
            store.set_fuel(fuel).map_err(|e| {
                PlaygroundError::RuntimeInit(anyhow::anyhow!("failed to set fuel: {}", e))
            })?;
        }

        let mut linker = Linker::new(engine);
        preview1::add_to_linker_sync(&mut linker, |state: &mut RunState| &mut state.wasi)
            .map_err(|e| PlaygroundError::RuntimeInit(anyhow::anyhow!("failed to link WASI: {}", e)))?;

        let instance = linker.instantiate(&mut store, module).map_err(|e| {
            if store.data().limiter.tripped() {
                return PlaygroundError::MemoryLimitExceeded(
                    "memory limit exceeded during instantiation".to_string(),
                );
            }
            PlaygroundError::ModuleLoad(anyhow::anyhow!("failed to instantiate: {}", e))
        })?;

        let start = instance
            .get_typed_func::<(), ()>(&mut store, "_start")
            .map_err(|e| {
                PlaygroundError::ModuleLoad(anyhow::anyhow!("missing _start export: {}", e))
            })?;

        let exit_code = match start.call(&mut store, ()) {
            Ok(()) => 0,
            Err(e) => {
                if store.data().limiter.tripped() {
                    return Err(PlaygroundError::MemoryLimitExceeded(format!(
                        "linear memory limit of {} bytes reached",
                        config.max_memory
                    )));
                }
                if let Some(exit) = e.downcast_ref::<I32Exit>() {
                    exit.0
                } else {
                    return Err(match e.downcast_ref::<Trap>() {
                        Some(Trap::Interrupt) => PlaygroundError::Timeout(config.timeout),
                        Some(Trap::OutOfFuel) => PlaygroundError::OutOfFuel {
                            consumed: config.max_fuel,
                        },
                        _ => PlaygroundError::ExecutionFailed(e.to_string()),
                    });
                }
            }
        };

        Ok(ExecutionResult {
            stdout: String::from_utf8_lossy(&stdout.contents()).into_owned(),
            stderr: String::from_utf8_lossy(&stderr.contents()).into_owned(),
            exit_code,
        })
    }
}

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

async fn fetch_remote(url: &str) -> Result<Vec<u8>> {
    tracing::debug!(%url, "downloading Python interpreter");
    let response = reqwest::get(url).await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

fn read_local(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PlaygroundError::InterpreterNotFound(path.display().to_string())
        } else {
            PlaygroundError::Io(e)
        }
    })
}
