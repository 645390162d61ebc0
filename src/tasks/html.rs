// src/tasks/html.rs

use std::path::Path;

use anyhow::Context;

use crate::fs::SourceFile;
use crate::tasks::per_file::{FileOutput, FileTransform, TransformEnv};
use crate::transform::{PartialResolver, collapse_whitespace};

/// Inline partials; collapse whitespace in production.
#[derive(Debug, Clone)]
pub struct RenderHtml {
    pub resolver: PartialResolver,
}

impl FileTransform for RenderHtml {
    fn transform(
        &self,
        file: &SourceFile,
        dest: &Path,
        env: &TransformEnv,
    ) -> anyhow::Result<Option<FileOutput>> {
        let source = std::fs::read_to_string(&file.path)
            .with_context(|| format!("reading {:?}", file.path))?;
        let mut page = self.resolver.resolve(&source, &file.path)?;
        if env.mode.is_production() {
            page = collapse_whitespace(&page);
        }
        Ok(Some(FileOutput::single(file.dest_path(dest), page)))
    }
}
