//! On-disk store of downloaded pages.
//!
//! Pages are kept as `<data_dir>/<kind>/<id>.html`, where the id is the last
//! path segment of the page URL.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::scraper::text::last_path_segment;

/// Page categories, one directory each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    Race,
    Horse,
}

impl PageKind {
    /// Get directory name for this category
    pub fn dir_name(&self) -> &'static str {
        match self {
            PageKind::Race => "race",
            PageKind::Horse => "horse",
        }
    }
}

/// Dump file name for a page URL: ".../race/202105020305/" -> "202105020305.html"
pub fn file_name_for_url(url: &str) -> String {
    format!("{}.html", last_path_segment(url))
}

/// File-based page store
pub struct PageStore {
    base_dir: PathBuf,
}

impl PageStore {
    /// Create a store rooted at the data directory
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Directory holding the pages of one kind
    pub fn dir(&self, kind: PageKind) -> PathBuf {
        self.base_dir.join(kind.dir_name())
    }

    /// Path a page URL is stored under
    pub fn path_for(&self, kind: PageKind, url: &str) -> PathBuf {
        self.dir(kind).join(file_name_for_url(url))
    }

    pub fn exists(&self, kind: PageKind, url: &str) -> bool {
        self.path_for(kind, url).exists()
    }

    /// Save page content, replacing any earlier copy
    pub fn save(&self, kind: PageKind, url: &str, html: &str) -> Result<PathBuf> {
        let dir = self.dir(kind);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let path = self.path_for(kind, url);
        std::fs::write(&path, html)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(path)
    }

    /// All stored pages of one kind, sorted by file name
    pub fn list(&self, kind: PageKind) -> Result<Vec<PathBuf>> {
        list_html_files(&self.dir(kind))
    }
}

/// Every `*.html` file directly inside `dir`, sorted. A missing directory is empty.
pub fn list_html_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "html") {
            files.push(path);
        }
    }
    files.sort();

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_name_for_url() {
        assert_eq!(
            file_name_for_url("https://db.netkeiba.com/race/202105020305/"),
            "202105020305.html"
        );
        assert_eq!(
            file_name_for_url("https://db.netkeiba.com/horse/ped/2018105027/"),
            "2018105027.html"
        );
    }

    #[test]
    fn test_save_and_list() {
        let tmp = TempDir::new().unwrap();
        let store = PageStore::new(tmp.path());

        assert!(store.list(PageKind::Race).unwrap().is_empty());

        let url_b = "https://db.netkeiba.com/race/202105020306/";
        let url_a = "https://db.netkeiba.com/race/202105020305/";
        store.save(PageKind::Race, url_b, "<html>b</html>").unwrap();
        store.save(PageKind::Race, url_a, "<html>a</html>").unwrap();

        assert!(store.exists(PageKind::Race, url_a));
        assert!(!store.exists(PageKind::Horse, url_a));

        let files = store.list(PageKind::Race).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("race/202105020305.html"));

        let content = std::fs::read_to_string(store.path_for(PageKind::Race, url_b)).unwrap();
        assert_eq!(content, "<html>b</html>");
    }

    #[test]
    fn test_list_ignores_other_files() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("1.html"), "").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "").unwrap();

        let files = list_html_files(tmp.path()).unwrap();
        assert_eq!(files, vec![tmp.path().join("1.html")]);
    }
}
