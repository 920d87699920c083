//! File output

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::rotation::{self, RotationPolicy};
use super::traits::Output;
use crate::error::Result;

/// Appends fragments to a file, opening it for each write
///
/// Opening per write lets the file be rotated, deleted or moved away between
/// entries without the output holding a stale handle.
#[derive(Debug, Clone)]
pub struct FileOutput {
    path: PathBuf,
    rotation: Option<RotationPolicy>,
}

impl FileOutput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            rotation: None,
        }
    }

    /// Rotate the file once it reaches the policy's size
    pub fn with_rotation(mut self, policy: RotationPolicy) -> Self {
        self.rotation = Some(policy);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rotation(&self) -> Option<&RotationPolicy> {
        self.rotation.as_ref()
    }

    fn rotate(&self) {
        let Some(policy) = &self.rotation else {
            return;
        };
        match rotation::rotate_if_needed(&self.path, policy) {
            Ok(Some(archive)) => {
                rotation::spawn_housekeeping(self.path.clone(), archive, policy.clone())
            }
            Ok(None) => {}
            Err(e) => {
                crate::diag_error!("rotation check of {} failed: {}", self.path.display(), e)
            }
        }
    }
}

impl Output for FileOutput {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn write_fragment(&mut self, fragment: &str) -> Result<()> {
        self.rotate();

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(fragment.as_bytes())?;
        Ok(())
    }
}
