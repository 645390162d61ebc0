// src/tasks/copy.rs

use std::path::Path;

use anyhow::Context;

use crate::fs::SourceFile;
use crate::tasks::per_file::{FileOutput, FileTransform, TransformEnv};

/// Passthrough copy (fonts, images, video).
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyFile;

impl FileTransform for CopyFile {
    fn transform(
        &self,
        file: &SourceFile,
        dest: &Path,
        _env: &TransformEnv,
    ) -> anyhow::Result<Option<FileOutput>> {
        let bytes =
            std::fs::read(&file.path).with_context(|| format!("reading {:?}", file.path))?;
        Ok(Some(FileOutput::single(file.dest_path(dest), bytes)))
    }
}
