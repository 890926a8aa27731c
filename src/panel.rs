//! Session state of the "Try it now" panel.

use crate::executor::CodeExecutor;
use crate::language::Language;

/// What the panel holds for one visitor: the selected language, the code
/// buffer and the executor that owns the output area.
///
/// The language selector and the code buffer are independent; switching
/// languages never touches the code.
#[derive(Debug)]
pub struct TryItPanel<E> {
    language: Language,
    code: String,
    executor: E,
}

impl<E: CodeExecutor> TryItPanel<E> {
    /// A fresh panel: JavaScript selected, empty code.
    pub fn new(executor: E) -> Self {
        Self {
            language: Language::default(),
            code: String::new(),
            executor,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn select_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Replace the code buffer, as an edit in the text area does.
    pub fn set_code(&mut self, code: impl Into<String>) {
        self.code = code.into();
    }

    /// Append to the code buffer.
    pub fn type_text(&mut self, text: &str) {
        self.code.push_str(text);
    }

    /// Text of the output area. Empty output means the area is hidden.
    pub fn output(&self) -> String {
        self.executor.current_output()
    }

    /// Whether the run button accepts clicks.
    pub fn run_enabled(&self) -> bool {
        !self.executor.is_loading()
    }

    /// Label of the run button.
    pub fn run_label(&self) -> &'static str {
        if self.executor.is_loading() {
            "Loading..."
        } else {
            "Run"
        }
    }

    /// Run the buffer with the selected language.
    ///
    /// This does not consult [`TryItPanel::run_enabled`]; gating clicks is
    /// the caller's job.
    pub async fn run(&self) -> String {
        self.executor.run(self.language, &self.code).await
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::javascript::JavaScriptRunner;
    use crate::executor::output::OutputBuffer;
    use crate::executor::{Playground, PythonRunner};

    struct IdlePython;

    impl PythonRunner for IdlePython {
        async fn run_python(&self, code: &str) -> Option<String> {
            Some(format!("ran {} bytes", code.len()))
        }

        fn is_loading(&self) -> bool {
            false
        }

        async fn mount(&self) {}
    }

    fn panel() -> TryItPanel<Playground<IdlePython>> {
        TryItPanel::new(Playground::with_runner(
            OutputBuffer::new(),
            JavaScriptRunner::default(),
            IdlePython,
        ))
    }

    #[test]
    fn test_fresh_panel() {
        let panel = panel();
        assert_eq!(panel.language(), Language::JavaScript);
        assert!(panel.code().is_empty());
        assert!(panel.output().is_empty());
        assert!(panel.run_enabled());
        assert_eq!(panel.run_label(), "Run");
    }

    #[test]
    fn test_language_does_not_touch_code() {
        let mut panel = panel();
        panel.type_text("console.log(");
        panel.type_text("'hi')");

        panel.select_language(Language::Python);
        assert_eq!(panel.code(), "console.log('hi')");
        panel.select_language(Language::JavaScript);
        assert_eq!(panel.code(), "console.log('hi')");
    }

    #[tokio::test]
    async fn test_run_uses_selected_language() {
        let mut panel = panel();
        panel.set_code("console.log('hi')");
        assert_eq!(panel.run().await, "hi");

        panel.select_language(Language::Python);
        assert_eq!(panel.run().await, "ran 17 bytes");
        assert_eq!(panel.output(), "ran 17 bytes");
    }
}
