// src/tasks/js.rs

use std::path::Path;

use anyhow::Context;

use crate::fs::SourceFile;
use crate::lint::{self, Language};
use crate::tasks::per_file::{FileOutput, FileTransform, TransformEnv};

/// Lint each script, optionally auto-fix it in place, and copy it to `dest`.
///
/// Findings are logged; they never stop the copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct LintAndCopy {
    pub fix: bool,
}

impl FileTransform for LintAndCopy {
    fn transform(
        &self,
        file: &SourceFile,
        dest: &Path,
        _env: &TransformEnv,
    ) -> anyhow::Result<Option<FileOutput>> {
        let source = std::fs::read_to_string(&file.path)
            .with_context(|| format!("reading {:?}", file.path))?;

        let mut rewrite_source = None;
        let mut text = source;
        if self.fix {
            let fixed = lint::fix(Language::Script, &text);
            if fixed != text {
                rewrite_source = Some(fixed.clone());
                text = fixed;
            }
        }

        let notes = lint::check(Language::Script, &text)
            .into_iter()
            .map(|d| format!("{}:{}  {}  {}  {}", d.line, d.col, d.severity, d.message, d.rule))
            .collect();

        Ok(Some(FileOutput {
            outputs: vec![(file.dest_path(dest), text.into_bytes())],
            rewrite_source,
            notes,
        }))
    }
}
