use std::path::PathBuf;

use anyhow::{Context, Result};

/// Somewhere exported bytes can be written under a file name.
pub trait ExportSink: Send + Sync {
    fn write_bytes(&self, name: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Writes into `root/<run_id>/`.
#[derive(Clone)]
pub struct FsExportSink {
    pub root: PathBuf,
}

impl FsExportSink {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn for_run(&self, run_id: &str) -> Result<Self> {
        let dir = self.root.join(run_id);
        std::fs::create_dir_all(&dir).with_context(|| format!("create export dir {}", dir.display()))?;
        Ok(Self { root: dir })
    }
}

impl ExportSink for FsExportSink {
    fn write_bytes(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.root).with_context(|| format!("create export dir {}", self.root.display()))?;
        let path = self.root.join(name);
        std::fs::write(&path, bytes).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_under_run_dir() {
        let dir = tempdir().unwrap();
        let sink = FsExportSink::new(dir.path().to_path_buf()).for_run("r1").unwrap();
        let p = sink.write_bytes("errors.log", b"x\n").unwrap();
        assert_eq!(p, dir.path().join("r1").join("errors.log"));
        assert_eq!(std::fs::read(&p).unwrap(), b"x\n");
    }
}
