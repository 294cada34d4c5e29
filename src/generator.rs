//! Snapshot generation.
//!
//! Every record is written to `<generated>/<project>/<record>.json` as pretty
//! JSON with a trailing newline, keeping attribute order. Files whose content
//! would not change are left alone so their modification time survives, and
//! snapshots no record produces anymore are removed.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::ProjectFilter;
use crate::error::{ConfigError, GenerateError, Result};
use crate::resource::Record;

/// Writes record snapshots below one directory.
#[derive(Debug)]
pub struct SnapshotGenerator {
    dir: PathBuf,
}

/// What a generation run changed on disk.
#[derive(Debug, Default, Serialize)]
pub struct GenerateResult {
    /// Snapshots written because they were new or changed.
    pub written: Vec<PathBuf>,
    /// Number of snapshots already up to date.
    pub unchanged: usize,
    /// Stale files and directories removed.
    pub removed: Vec<PathBuf>,
}

impl SnapshotGenerator {
    /// Creates a generator writing below `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the snapshot for a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the project or kennel id is not a single plain
    /// path segment, which would place the file outside the snapshot
    /// directory.
    pub fn path_for(&self, record: &Record) -> Result<PathBuf> {
        let project = self.segment(record.project_id())?;
        self.segment(record.kennel_id())?;
        Ok(self
            .dir
            .join(project)
            .join(format!("{}.json", record.kennel_id())))
    }

    fn segment<'s>(&self, name: &'s str) -> Result<&'s str> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(name),
            _ => Err(GenerateError::OutsideRoot {
                segment: name.to_string(),
                root: self.dir.clone(),
            }
            .into()),
        }
    }

    /// Writes snapshots for `records` and removes stale ones in the projects
    /// selected by `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if two records share a tracking id or an id would
    /// leave the snapshot directory, both checked before anything is written,
    /// or if the file system refuses a change.
    pub fn generate(&self, records: &[Record], filter: &ProjectFilter) -> Result<GenerateResult> {
        check_duplicates(records)?;
        let paths = records
            .iter()
            .map(|record| self.path_for(record))
            .collect::<Result<Vec<_>>>()?;
        let scopes = self.cleanup_scopes(filter)?;

        let mut result = GenerateResult::default();
        let mut expected = HashSet::with_capacity(records.len());

        for (record, path) in records.iter().zip(paths) {
            let content = render(record)?;
            if write_if_changed(&path, &content)? {
                debug!("Wrote {}", path.display());
                result.written.push(path.clone());
            } else {
                result.unchanged += 1;
            }
            expected.insert(path);
        }

        for scope in scopes {
            self.remove_stale(&scope, &expected, &mut result)?;
        }

        info!(
            "Generated {} snapshots ({} written, {} removed)",
            records.len(),
            result.written.len(),
            result.removed.len()
        );
        Ok(result)
    }

    fn cleanup_scopes(&self, filter: &ProjectFilter) -> Result<Vec<PathBuf>> {
        match filter {
            ProjectFilter::All => Ok(vec![self.dir.clone()]),
            ProjectFilter::Only(ids) => ids
                .iter()
                .map(|id| self.segment(id).map(|segment| self.dir.join(segment)))
                .collect(),
        }
    }

    fn remove_stale(
        &self,
        scope: &Path,
        expected: &HashSet<PathBuf>,
        result: &mut GenerateResult,
    ) -> Result<()> {
        if !scope.is_dir() {
            return Ok(());
        }

        for entry in WalkDir::new(scope).contents_first(true).follow_links(false) {
            let entry = entry.map_err(std::io::Error::from)?;
            let path = entry.path();

            if entry.file_type().is_dir() {
                if path == self.dir || !is_empty_dir(path)? {
                    continue;
                }
                fs::remove_dir(path).map_err(|e| GenerateError::fs("remove", path, &e))?;
            } else if expected.contains(path) {
                continue;
            } else {
                fs::remove_file(path).map_err(|e| GenerateError::fs("remove", path, &e))?;
            }
            debug!("Removed {}", path.display());
            result.removed.push(path.to_path_buf());
        }
        Ok(())
    }
}

fn check_duplicates(records: &[Record]) -> Result<()> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        *counts.entry(record.tracking_id()).or_default() += 1;
    }
    for record in records {
        let count = counts[record.tracking_id()];
        if count > 1 {
            return Err(ConfigError::DuplicateTrackingId {
                tracking_id: record.tracking_id().to_string(),
                count,
            }
            .into());
        }
    }
    Ok(())
}

fn render(record: &Record) -> Result<String> {
    let mut content = serde_json::to_string_pretty(&Value::Object(record.attributes().clone()))
        .map_err(|e| GenerateError::Serialization {
            tracking_id: record.tracking_id().to_string(),
            message: e.to_string(),
        })?;
    content.push('\n');
    Ok(content)
}

/// Returns true if the file was written.
fn write_if_changed(path: &Path, content: &str) -> Result<bool> {
    if fs::read(path).is_ok_and(|existing| existing == content.as_bytes()) {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| GenerateError::fs("create", parent, &e))?;
    }
    fs::write(path, content).map_err(|e| GenerateError::fs("write", path, &e))?;
    Ok(true)
}

fn is_empty_dir(path: &Path) -> Result<bool> {
    let mut entries = fs::read_dir(path).map_err(|e| GenerateError::fs("read", path, &e))?;
    Ok(entries.next().is_none())
}
