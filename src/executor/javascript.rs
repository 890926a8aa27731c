//! JavaScript through an embedded QuickJS engine.
//!
//! The snippet becomes the body of `new Function('console', source)` and is
//! called with a stand-in console whose `log`, `error` and `warn` collect
//! lines instead of printing them. This is full evaluation of untrusted code;
//! the only isolation is the engine itself plus the optional limits in
//! [`JavaScriptConfig`].

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use rquickjs::function::Rest;
use rquickjs::{CatchResultExt, CaughtError, Coerced, Context, Ctx, Function, Object, Runtime, Value};
use tracing::debug;

use crate::error::{PlaygroundError, Result};
use crate::executor::config::JavaScriptConfig;

/// How a snippet finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// At least one console line was written; the return value is ignored.
    Logged(Vec<String>),
    /// Nothing was logged. Holds `String(result)`, or `None` for `undefined`.
    Returned(Option<String>),
    /// Construction, invocation or stringifying the result threw; carries
    /// the error message.
    Threw(String),
}

impl Completion {
    /// The text the output panel shows for this completion.
    pub fn render(self) -> String {
        match self {
            Completion::Logged(lines) => lines.join("\n"),
            Completion::Returned(value) => value.unwrap_or_default(),
            Completion::Threw(message) => format!("Error: {message}"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum LogLevel {
    Log,
    Error,
    Warn,
}

impl LogLevel {
    fn prefix(self) -> &'static str {
        match self {
            LogLevel::Log => "",
            LogLevel::Error => "Error: ",
            LogLevel::Warn => "Warning: ",
        }
    }
}

type LogLines = Rc<RefCell<Vec<String>>>;

/// Runs JavaScript snippets, one fresh engine per run.
#[derive(Debug, Clone, Default)]
pub struct JavaScriptRunner {
    config: JavaScriptConfig,
}

impl JavaScriptRunner {
    pub fn new(config: JavaScriptConfig) -> Self {
        Self { config }
    }

    /// Run `code` on the blocking pool and return the panel text.
    pub async fn run(&self, code: &str) -> String {
        let code = code.to_string();
        let config = self.config.clone();
        match tokio::task::spawn_blocking(move || render(&code, &config)).await {
            Ok(text) => text,
            Err(e) => format!("Error: {e}"),
        }
    }

    /// Run `code` on the current thread and return the panel text.
    pub fn run_blocking(&self, code: &str) -> String {
        render(code, &self.config)
    }
}

fn render(code: &str, config: &JavaScriptConfig) -> String {
    match evaluate(code, config) {
        Ok(completion) => completion.render(),
        Err(e) => format!("Error: {e}"),
    }
}

/// Evaluate a snippet with the capturing console.
///
/// Errors are reserved for engine setup; anything the snippet throws is a
/// [`Completion::Threw`].
pub fn evaluate(code: &str, config: &JavaScriptConfig) -> Result<Completion> {
    let runtime = Runtime::new().map_err(engine_error)?;
    if let Some(limit) = config.max_memory {
        runtime.set_memory_limit(limit);
    }
    if let Some(timeout) = config.timeout {
        let deadline = Instant::now() + timeout;
        runtime.set_interrupt_handler(Some(Box::new(move || Instant::now() >= deadline)));
    }
    let context = Context::full(&runtime).map_err(engine_error)?;

    let logs: LogLines = Rc::default();
    let completion = context.with(|ctx| -> Result<Completion> {
        let console = console_object(&ctx, &logs).map_err(engine_error)?;

        let finished = ctx
            .globals()
            .get::<_, Function>("Function")
            .and_then(|constructor| constructor.call::<_, Function>(("console", format!("\n{code}"))))
            .and_then(|function| function.call::<_, Value>((console,)))
            .and_then(|value| {
                if !logs.borrow().is_empty() {
                    return Ok(Completion::Logged(logs.borrow().clone()));
                }
                if value.is_undefined() {
                    return Ok(Completion::Returned(None));
                }
                js_string(&ctx, value).map(|text| Completion::Returned(Some(text)))
            })
            .catch(&ctx);

        Ok(finished.unwrap_or_else(|caught| Completion::Threw(thrown_message(&ctx, caught))))
    })?;

    debug!(?completion, "javascript run finished");
    Ok(completion)
}

fn engine_error(e: rquickjs::Error) -> PlaygroundError {
    PlaygroundError::RuntimeInit(anyhow::anyhow!("javascript engine: {}", e))
}

fn console_object<'js>(ctx: &Ctx<'js>, logs: &LogLines) -> rquickjs::Result<Object<'js>> {
    let console = Object::new(ctx.clone())?;
    for (name, level) in [
        ("log", LogLevel::Log),
        ("error", LogLevel::Error),
        ("warn", LogLevel::Warn),
    ] {
        let logs = Rc::clone(logs);
        let method = Function::new(ctx.clone(), move |args: Rest<Value<'js>>| -> rquickjs::Result<()> {
            let line = join_args(&args.0)?;
            logs.borrow_mut().push(format!("{}{}", level.prefix(), line));
            Ok(())
        })?;
        console.set(name, method)?;
    }
    Ok(console)
}

/// `Array.prototype.join(' ')`: nullish values render empty.
fn join_args(args: &[Value<'_>]) -> rquickjs::Result<String> {
    let parts = args
        .iter()
        .map(|arg| {
            if arg.is_null() || arg.is_undefined() {
                Ok(String::new())
            } else {
                arg.get::<Coerced<String>>().map(|coerced| coerced.0)
            }
        })
        .collect::<rquickjs::Result<Vec<_>>>()?;
    Ok(parts.join(" "))
}

/// `String(value)` through the global function, so symbols and custom
/// `toString` methods follow the language rules.
fn js_string<'js>(ctx: &Ctx<'js>, value: Value<'js>) -> rquickjs::Result<String> {
    ctx.globals()
        .get::<_, Function>("String")?
        .call::<_, String>((value,))
}

/// `error instanceof Error ? error.message : String(error)`.
fn thrown_message<'js>(ctx: &Ctx<'js>, caught: CaughtError<'js>) -> String {
    match caught {
        CaughtError::Exception(exception) => exception.message().unwrap_or_default(),
        CaughtError::Value(value) => js_string(ctx, value)
            .catch(ctx)
            .unwrap_or_else(|nested| match nested {
                CaughtError::Exception(exception) => exception.message().unwrap_or_default(),
                other => other.to_string(),
            }),
        CaughtError::Error(error) => error.to_string(),
    }
}
