//! file_write: save agent output under the output directory

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use super::{Tool, ToolError};

pub struct FileWriteTool {
    output_dir: PathBuf,
}

impl FileWriteTool {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FileWriteArgs {
    filename: String,
    content: String,
}

/// Join a relative name onto `root`, refusing anything that escapes it
pub fn resolve_in_dir(root: &Path, name: &str) -> Result<PathBuf, String> {
    let relative = Path::new(name.trim());
    if name.trim().is_empty() {
        return Err("filename is empty".to_string());
    }

    for component in relative.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => return Err(format!("Path {} is outside the output directory", name)),
        }
    }

    Ok(root.join(relative))
}

#[async_trait]
impl Tool for FileWriteTool {
    type Args = FileWriteArgs;

    fn name(&self) -> &str {
        "file_write"
    }

    fn description(&self) -> &str {
        "Write text to a file in the output directory. Args: {\"filename\": \"report.md\", \"content\": \"...\"}"
    }

    async fn call(&self, args: FileWriteArgs) -> Result<Value, ToolError> {
        let path = resolve_in_dir(&self.output_dir, &args.filename)?;
        debug!("Writing {} bytes to {:?}", args.content.len(), path);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &args.content).await?;

        Ok(json!({
            "path": path.display().to_string(),
            "bytes_written": args.content.len(),
        }))
    }
}
