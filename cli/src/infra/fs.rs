//! Filesystem infrastructure: boot script reads and cloud assembly writes.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::{AssemblyWriter, BootScriptSource};
use crate::domain::error::BootScriptError;

/// Production filesystem implementation of the file ports.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl BootScriptSource for LocalFs {
    fn read_boot_script(&self, path: &Path) -> Result<String> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(BootScriptError::NotFound(path.to_path_buf()).into());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("cannot read {}", path.display()));
            }
        };
        String::from_utf8(bytes).map_err(|_| BootScriptError::NotUtf8(path.to_path_buf()).into())
    }
}

impl AssemblyWriter for LocalFs {
    fn write_assembly(&self, dir: &Path, files: &[(String, String)]) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating assembly dir {}", dir.display()))?;
        files
            .iter()
            .map(|(name, content)| {
                let path = dir.join(name);
                std::fs::write(&path, content)
                    .with_context(|| format!("writing {}", path.display()))?;
                Ok(path)
            })
            .collect()
    }
}
