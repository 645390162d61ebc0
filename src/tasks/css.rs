// src/tasks/css.rs

use std::path::Path;

use anyhow::Context;

use crate::fs::SourceFile;
use crate::tasks::per_file::{FileOutput, FileTransform, TransformEnv};
use crate::transform::{CssOptions, minify_css};

/// Minify plain stylesheets.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinifyCss;

impl FileTransform for MinifyCss {
    fn transform(
        &self,
        file: &SourceFile,
        dest: &Path,
        env: &TransformEnv,
    ) -> anyhow::Result<Option<FileOutput>> {
        let source = std::fs::read_to_string(&file.path)
            .with_context(|| format!("reading {:?}", file.path))?;
        let out = minify_css(&source, &env.display_path(&file.path), CssOptions::default())?;
        Ok(Some(FileOutput::single(file.dest_path(dest), out.code)))
    }
}
