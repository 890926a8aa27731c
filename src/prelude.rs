//! Prelude module for convenient imports.

pub use crate::error::{PlaygroundError, Result};
pub use crate::executor::{
    config::{PlaygroundConfig, PythonMode},
    CodeExecutor, Playground, PythonRunner,
};
pub use crate::language::Language;
pub use crate::panel::TryItPanel;
