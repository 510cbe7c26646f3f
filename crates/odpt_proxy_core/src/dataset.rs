use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use odpt_proxy_model::OdptBusstopPole;

use crate::busstop::parse_busstops;

pub const DATASET_FILE_PREFIX: &str = "odpt_BusstopPole_";
pub const DATASET_FILE_SUFFIX: &str = ".json";

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("no bus stop dataset for operator {0:?}")]
    NotFound(String),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse bus stop dataset for operator {operator:?}: {source}")]
    Parse {
        operator: String,
        #[source]
        source: serde_json::Error,
    },
}

pub fn dataset_file_name(operator_name: &str) -> String {
    format!("{}{}{}", DATASET_FILE_PREFIX, operator_name, DATASET_FILE_SUFFIX)
}

/// Inverse of [`dataset_file_name`].
pub fn operator_name_from_file(file_name: &str) -> Option<&str> {
    let name = file_name
        .strip_prefix(DATASET_FILE_PREFIX)?
        .strip_suffix(DATASET_FILE_SUFFIX)?;
    is_valid_operator_name(name).then_some(name)
}

fn is_valid_operator_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    File(PathBuf),
    Embedded(&'static [u8]),
}

/// Operators with a bus stop dataset. Directories are searched in order and
/// take precedence over datasets compiled into the binary.
#[derive(Debug, Clone, Default)]
pub struct DatasetRegistry {
    search_dirs: Vec<PathBuf>,
    embedded: BTreeMap<String, &'static [u8]>,
}

impl DatasetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        if !self.search_dirs.contains(&dir) {
            self.search_dirs.push(dir);
        }
        self
    }

    pub fn with_embedded(mut self, operator_name: impl Into<String>, data: &'static [u8]) -> Self {
        self.embedded.insert(operator_name.into(), data);
        self
    }

    /// Registers an embedded file under the operator encoded in its name.
    /// Files that do not follow the dataset naming scheme are ignored.
    pub fn with_embedded_file(self, file_name: &str, data: &'static [u8]) -> Self {
        match operator_name_from_file(file_name) {
            Some(name) => self.with_embedded(name, data),
            None => self,
        }
    }

    /// The first search directory holding an entry for the operator wins,
    /// even when that entry turns out to be unreadable.
    pub fn locate(&self, operator_name: &str) -> Option<DatasetSource> {
        if !is_valid_operator_name(operator_name) {
            return None;
        }
        let file_name = dataset_file_name(operator_name);
        self.search_dirs
            .iter()
            .map(|dir| dir.join(&file_name))
            .find(|path| path.exists())
            .map(DatasetSource::File)
            .or_else(|| {
                self.embedded
                    .get(operator_name)
                    .copied()
                    .map(DatasetSource::Embedded)
            })
    }

    pub fn load_raw(&self, operator_name: &str) -> Result<Cow<'static, [u8]>, DatasetError> {
        match self.locate(operator_name) {
            Some(DatasetSource::File(path)) => {
                tracing::debug!(path = %path.display(), "loading bus stop dataset");
                std::fs::read(&path)
                    .map(Cow::Owned)
                    .map_err(|source| DatasetError::Io { path, source })
            }
            Some(DatasetSource::Embedded(data)) => {
                tracing::debug!(operator = operator_name, "using embedded bus stop dataset");
                Ok(Cow::Borrowed(data))
            }
            None => Err(DatasetError::NotFound(operator_name.to_string())),
        }
    }

    pub fn load(&self, operator_name: &str) -> Result<Vec<OdptBusstopPole>, DatasetError> {
        let data = self.load_raw(operator_name)?;
        parse_busstops(&data).map_err(|source| DatasetError::Parse {
            operator: operator_name.to_string(),
            source,
        })
    }

    pub fn operator_names(&self) -> Vec<String> {
        let mut names: BTreeSet<String> = self.embedded.keys().cloned().collect();
        for dir in &self.search_dirs {
            names.extend(scan_dir(dir));
        }
        names.into_iter().collect()
    }
}

fn scan_dir(dir: &Path) -> Vec<String> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };
    entries
        .flatten()
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| {
            let file_name = entry.file_name();
            let file_name = file_name.to_str()?;
            operator_name_from_file(file_name).map(str::to_string)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    const EMBEDDED: &[u8] = br#"[{"@id": "embedded", "dc:title": "Embedded"}]"#;

    fn temp_dir(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        std::env::temp_dir().join(format!("{}_{}_{}", prefix, std::process::id(), nanos))
    }

    #[test]
    fn file_name_round_trip() {
        assert_eq!(dataset_file_name("Toei"), "odpt_BusstopPole_Toei.json");
        assert_eq!(operator_name_from_file("odpt_BusstopPole_Toei.json"), Some("Toei"));
        assert_eq!(operator_name_from_file("odpt_BusstopPole_.json"), None);
        assert_eq!(operator_name_from_file("README.md"), None);
    }

    #[test]
    fn loads_embedded_dataset() {
        let registry = DatasetRegistry::new().with_embedded_file("odpt_BusstopPole_Test.json", EMBEDDED);
        let poles = registry.load("Test").unwrap();
        assert_eq!(poles.len(), 1);
        assert_eq!(poles[0].id, "embedded");
        assert_eq!(registry.operator_names(), vec!["Test".to_string()]);
    }

    #[test]
    fn unknown_operator_is_not_found() {
        let registry = DatasetRegistry::new().with_embedded("Test", EMBEDDED);
        assert!(matches!(
            registry.load("Other"),
            Err(DatasetError::NotFound(name)) if name == "Other"
        ));
    }

    #[test]
    fn rejects_path_like_operator_names() {
        let dir = temp_dir("odpt_dataset_traversal");
        fs::create_dir_all(&dir).expect("create dir");
        let registry = DatasetRegistry::new().with_search_dir(&dir);
        assert_eq!(registry.locate("../secrets"), None);
        assert_eq!(registry.locate(""), None);
        assert_eq!(registry.locate("a/b"), None);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn directory_dataset_overrides_embedded() {
        let dir = temp_dir("odpt_dataset_override");
        fs::create_dir_all(&dir).expect("create dir");
        fs::write(
            dir.join("odpt_BusstopPole_Test.json"),
            r#"[{"@id": "from-disk"}]"#,
        )
        .expect("write file");
        fs::write(dir.join("odpt_BusstopPole_Disk.json"), "[]").expect("write file");
        fs::write(dir.join("notes.txt"), "ignored").expect("write file");

        let registry = DatasetRegistry::new()
            .with_search_dir(&dir)
            .with_embedded("Test", EMBEDDED);
        assert!(matches!(registry.locate("Test"), Some(DatasetSource::File(_))));
        assert_eq!(registry.load("Test").unwrap()[0].id, "from-disk");
        assert!(registry.load("Disk").unwrap().is_empty());
        assert_eq!(
            registry.operator_names(),
            vec!["Disk".to_string(), "Test".to_string()]
        );

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn search_dirs_are_tried_in_order() {
        let first = temp_dir("odpt_dataset_first");
        let second = temp_dir("odpt_dataset_second");
        fs::create_dir_all(&first).expect("create dir");
        fs::create_dir_all(&second).expect("create dir");
        fs::write(second.join("odpt_BusstopPole_Test.json"), r#"[{"@id": "second"}]"#)
            .expect("write file");

        let registry = DatasetRegistry::new()
            .with_search_dir(&first)
            .with_search_dir(&second);
        assert_eq!(registry.load("Test").unwrap()[0].id, "second");

        fs::write(first.join("odpt_BusstopPole_Test.json"), r#"[{"@id": "first"}]"#)
            .expect("write file");
        assert_eq!(registry.load("Test").unwrap()[0].id, "first");

        fs::remove_dir_all(&first).ok();
        fs::remove_dir_all(&second).ok();
    }

    #[test]
    fn unreadable_dataset_is_io_error() {
        let dir = temp_dir("odpt_dataset_unreadable");
        fs::create_dir_all(dir.join("odpt_BusstopPole_Test.json")).expect("create dir");

        let registry = DatasetRegistry::new()
            .with_search_dir(&dir)
            .with_embedded("Test", EMBEDDED);
        assert!(matches!(
            registry.load("Test"),
            Err(DatasetError::Io { path, .. }) if path.ends_with("odpt_BusstopPole_Test.json")
        ));
        assert!(registry.operator_names().contains(&"Test".to_string()));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn malformed_dataset_is_parse_error() {
        let registry = DatasetRegistry::new().with_embedded("Broken", b"{not json");
        assert!(matches!(
            registry.load("Broken"),
            Err(DatasetError::Parse { operator, .. }) if operator == "Broken"
        ));
    }
}
