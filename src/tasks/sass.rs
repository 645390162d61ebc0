// src/tasks/sass.rs

use std::path::Path;

use anyhow::anyhow;

use crate::fs::SourceFile;
use crate::tasks::per_file::{FileOutput, FileTransform, TransformEnv};
use crate::transform::{CssOptions, compile_scss, is_partial, minify_css};

/// Compile SCSS entries, then prefix and minify the result.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileSass;

impl FileTransform for CompileSass {
    fn transform(
        &self,
        file: &SourceFile,
        dest: &Path,
        env: &TransformEnv,
    ) -> anyhow::Result<Option<FileOutput>> {
        if is_partial(&file.path) {
            return Ok(None);
        }

        let load_paths: Vec<_> = file.path.parent().map(Path::to_path_buf).into_iter().collect();
        let expanded = compile_scss(&file.path, &load_paths)?;

        let css = minify_css(
            &expanded,
            &env.display_path(&file.path),
            CssOptions {
                prefix: true,
                source_map: env.sourcemaps,
            },
        )?;

        let out_path = file.dest_path(dest).with_extension("css");
        let mut output = FileOutput::default();
        match css.map {
            Some(map) => {
                let file_name = out_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .ok_or_else(|| anyhow!("invalid output name {out_path:?}"))?;
                let map_path = out_path.with_file_name(format!("{file_name}.map"));
                let code = format!("{}\n/*# sourceMappingURL={file_name}.map */", css.code);
                output.outputs.push((out_path, code.into_bytes()));
                output.outputs.push((map_path, map.into_bytes()));
            }
            None => output.outputs.push((out_path, css.code.into_bytes())),
        }
        Ok(Some(output))
    }
}
