//! Home directory and the local JSON task store.
//!
//! The store is read whole and written whole; the last writer wins.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use studyhall_core::{CompletedTask, IncompleteTask, Task};

pub fn studyhall_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("STUDYHALL_HOME") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".studyhall"))
}

pub fn ensure_studyhall_home() -> Result<PathBuf> {
    let dir = studyhall_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn store_path() -> Result<PathBuf> {
    Ok(ensure_studyhall_home()?.join("store.json"))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Store {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub completed: Vec<CompletedTask>,
    #[serde(default)]
    pub incomplete: Vec<IncompleteTask>,
}

impl Store {
    pub fn load(p: &Path) -> Result<Self> {
        if !p.exists() {
            return Ok(Self::default());
        }
        let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
        serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))
    }

    pub fn save(&self, p: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("serialize store")?;
        fs::write(p, json).with_context(|| format!("write {}", p.display()))?;
        Ok(())
    }

    /// Position of the pending task whose id equals or uniquely starts with `needle`.
    pub fn find(&self, needle: &str) -> Result<usize> {
        if let Some(i) = self.tasks.iter().position(|t| t.id == needle) {
            return Ok(i);
        }
        let hits: Vec<usize> = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.id.starts_with(needle))
            .map(|(i, _)| i)
            .collect();
        match hits.as_slice() {
            [i] => Ok(*i),
            [] => bail!("no task with id '{needle}'"),
            _ => bail!("id prefix '{needle}' matches {} tasks", hits.len()),
        }
    }

    pub fn take(&mut self, needle: &str) -> Result<Task> {
        let i = self.find(needle)?;
        Ok(self.tasks.remove(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyhall_core::Category;

    fn sample() -> Store {
        Store {
            tasks: vec![
                Task::new("a1b2", "Read", Category::Daily),
                Task::new("a1c3", "Write", Category::Weekly),
                Task::new("ff00", "Lab", Category::General),
            ],
            ..Store::default()
        }
    }

    #[test]
    fn test_missing_store_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::load(&dir.path().join("store.json")).unwrap();
        assert!(store.tasks.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("store.json");
        let store = sample();
        store.save(&p).unwrap();
        assert_eq!(Store::load(&p).unwrap(), store);
    }

    #[test]
    fn test_load_recovers_malformed_fields() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("store.json");
        fs::write(
            &p,
            r#"{"tasks": [
                {"id": "x1", "title": "odd", "category": 7, "durationMinutes": "30"},
                {"id": "x2", "title": "fine", "category": "daily"}
            ]}"#,
        )
        .unwrap();
        let store = Store::load(&p).unwrap();
        assert_eq!(store.tasks.len(), 2);
        assert_eq!(store.tasks[0].category, Category::General);
        assert_eq!(store.tasks[0].duration_minutes, None);
        assert_eq!(store.tasks[1].category, Category::Daily);
    }

    #[test]
    fn test_find_by_prefix() {
        let store = sample();
        assert_eq!(store.find("ff").unwrap(), 2);
        assert_eq!(store.find("a1c3").unwrap(), 1);
        assert!(store.find("a1").is_err());
        assert!(store.find("zz").is_err());
    }

    #[test]
    fn test_take_removes() {
        let mut store = sample();
        let t = store.take("ff").unwrap();
        assert_eq!(t.title, "Lab");
        assert_eq!(store.tasks.len(), 2);
    }
}
