//! Filesystem implementation of the `RuleStager` port.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::ports::{RuleStager, StagedRuleFile};

/// Stages rule text as `rule*.btm` files in a directory the agent can read.
pub struct TempFileStager {
    dir: PathBuf,
}

impl TempFileStager {
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl RuleStager for TempFileStager {
    fn stage(&self, text: &str) -> Result<StagedRuleFile> {
        let mut file = tempfile::Builder::new()
            .prefix("rule")
            .suffix(".btm")
            .tempfile_in(&self.dir)
            .with_context(|| format!("creating rule file in {}", self.dir.display()))?;
        file.write_all(text.as_bytes())
            .and_then(|()| file.flush())
            .with_context(|| format!("writing rule file {}", file.path().display()))?;
        // The handle is closed so the agent can open the file by path; the
        // TempPath still deletes it on drop.
        Ok(StagedRuleFile::new(file.into_temp_path(), text.to_string()))
    }

    fn release(&self, file: StagedRuleFile) -> Result<()> {
        let path = file.path().to_path_buf();
        match file.into_temp_path().close() {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("removing rule file {}", path.display())),
        }
    }
}
