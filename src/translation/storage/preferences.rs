//! 语言偏好存储
//!
//! 键值存储，控制器用它记住 `selectedLanguage`。内存实现对应会话作用域，
//! 文件实现对应用户配置作用域。

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::translation::error::{helpers, TranslationResult};

/// 键值偏好存储
pub trait PreferenceStore {
    fn get(&self, key: &str) -> TranslationResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> TranslationResult<()>;
    fn remove(&mut self, key: &str) -> TranslationResult<()>;
}

/// 会话内存存储
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferenceStore {
    values: HashMap<String, String>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, value: &str) -> Self {
        let mut store = Self::default();
        store.values.insert(key.to_string(), value.to_string());
        store
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> TranslationResult<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> TranslationResult<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> TranslationResult<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// JSON 文件存储
///
/// 每次读写都访问磁盘，其他进程的修改能被看到。
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    /// `path` 支持 `~` 展开
    pub fn new(path: &str) -> Self {
        Self {
            path: PathBuf::from(shellexpand::tilde(path).as_ref()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> TranslationResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            helpers::storage_error(format!("偏好文件格式错误 {}: {}", self.path.display(), e))
        })
    }

    fn save(&self, values: &BTreeMap<String, String>) -> TranslationResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> TranslationResult<Option<String>> {
        Ok(self.load()?.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> TranslationResult<()> {
        let mut values = self.load()?;
        values.insert(key.to_string(), value.to_string());
        self.save(&values)
    }

    fn remove(&mut self, key: &str) -> TranslationResult<()> {
        let mut values = self.load()?;
        if values.remove(key).is_some() {
            self.save(&values)?;
        }
        Ok(())
    }
}

/// 按配置选择存储：有路径用文件，否则用内存
pub fn open_preference_store(path: Option<&str>) -> Box<dyn PreferenceStore> {
    match path {
        Some(path) => {
            tracing::debug!("语言偏好保存在 {}", path);
            Box::new(FilePreferenceStore::new(path))
        }
        None => Box::new(MemoryPreferenceStore::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::config::constants::SELECTED_LANGUAGE_KEY;

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryPreferenceStore::new();
        assert_eq!(store.get(SELECTED_LANGUAGE_KEY).unwrap(), None);

        store.set(SELECTED_LANGUAGE_KEY, "fr").unwrap();
        assert_eq!(store.get(SELECTED_LANGUAGE_KEY).unwrap().as_deref(), Some("fr"));

        store.remove(SELECTED_LANGUAGE_KEY).unwrap();
        assert_eq!(store.get(SELECTED_LANGUAGE_KEY).unwrap(), None);
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");
        let path = path.to_str().unwrap();

        let mut store = FilePreferenceStore::new(path);
        store.set(SELECTED_LANGUAGE_KEY, "de").unwrap();
        store.set("theme", "dark").unwrap();

        let reopened = FilePreferenceStore::new(path);
        assert_eq!(reopened.get(SELECTED_LANGUAGE_KEY).unwrap().as_deref(), Some("de"));

        let mut reopened = reopened;
        reopened.remove(SELECTED_LANGUAGE_KEY).unwrap();
        assert_eq!(store.get(SELECTED_LANGUAGE_KEY).unwrap(), None);
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn test_corrupt_file_reports_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FilePreferenceStore::new(path.to_str().unwrap());
        let error = store.get(SELECTED_LANGUAGE_KEY).unwrap_err();
        assert_eq!(
            error.category(),
            crate::translation::error::ErrorCategory::Storage
        );
    }
}
