//! Scenario discovery from Gherkin feature files

use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;

use cukerun_common::{Error, Result, TestInfo};

static KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(Feature|Rule|Background|Scenario Outline|Scenario Template|Scenario|Example|Examples|Scenarios)\s*:\s*(.*)$",
    )
    .expect("gherkin keyword regex")
});

/// Lazily scanned, cached list of scenarios under a features directory
#[derive(Debug)]
pub struct TestCatalog {
    features_dir: PathBuf,
    tests: OnceCell<Vec<TestInfo>>,
}

impl TestCatalog {
    pub fn new(features_dir: impl Into<PathBuf>) -> Self {
        Self {
            features_dir: features_dir.into(),
            tests: OnceCell::new(),
        }
    }

    /// Every scenario, scanning the directory on first use
    pub fn all_tests(&self) -> Result<&[TestInfo]> {
        self.tests
            .get_or_try_init(|| scan_dir(&self.features_dir))
            .map(Vec::as_slice)
    }

    /// Distinct suite names in first-seen order
    pub fn suites(&self) -> Result<Vec<String>> {
        let mut suites: Vec<String> = Vec::new();
        for suite in self.all_tests()?.iter().filter_map(|t| t.suite.as_ref()) {
            if !suites.contains(suite) {
                suites.push(suite.clone());
            }
        }
        Ok(suites)
    }

    pub fn tests_in_suite(&self, suite: &str) -> Result<Vec<TestInfo>> {
        let suite = suite.trim_start_matches('@');
        Ok(self
            .all_tests()?
            .iter()
            .filter(|t| t.suite.as_deref() == Some(suite))
            .cloned()
            .collect())
    }

    pub fn tests_by_tag(&self, tag: &str) -> Result<Vec<TestInfo>> {
        let tag = tag.trim_start_matches('@');
        Ok(self
            .all_tests()?
            .iter()
            .filter(|t| t.tags.iter().any(|candidate| candidate == tag))
            .cloned()
            .collect())
    }
}

/// Scan a directory tree for `*.feature` files
pub fn scan_dir(dir: &Path) -> Result<Vec<TestInfo>> {
    if !dir.is_dir() {
        return Err(Error::Catalog(format!(
            "features directory not found: {}",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::Catalog(e.to_string()))?;
        let is_feature = entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .map(|ext| ext == "feature")
                .unwrap_or(false);
        if is_feature {
            files.push(entry.into_path());
        }
    }

    let mut tests = Vec::new();
    for path in &files {
        let content = std::fs::read_to_string(path)?;
        tests.extend(parse_feature(&content, &path.display().to_string()));
    }

    debug!(
        "Found {} scenario(s) in {} feature file(s) under {}",
        tests.len(),
        files.len(),
        dir.display()
    );
    Ok(tests)
}

/// Extract scenarios from one feature file.
///
/// A tag line applies to the keyword line right after it. Feature tags are
/// inherited by every scenario; the first one names the suite.
pub fn parse_feature(content: &str, file: &str) -> Vec<TestInfo> {
    let mut tests = Vec::new();
    let mut feature_tags: Vec<String> = Vec::new();
    let mut pending: Vec<String> = Vec::new();

    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('@') {
            pending.extend(
                line.split_whitespace()
                    .map(|t| t.trim_start_matches('@'))
                    .filter(|t| !t.is_empty())
                    .map(String::from),
            );
            continue;
        }

        let Some(caps) = KEYWORD.captures(line) else {
            pending.clear();
            continue;
        };

        match &caps[1] {
            "Feature" => feature_tags = std::mem::take(&mut pending),
            "Scenario" | "Scenario Outline" | "Scenario Template" | "Example" => {
                let mut tags = feature_tags.clone();
                for tag in pending.drain(..) {
                    if !tags.contains(&tag) {
                        tags.push(tag);
                    }
                }
                tests.push(TestInfo {
                    name: caps[2].trim().to_string(),
                    suite: feature_tags.first().cloned(),
                    tags,
                    file: file.to_string(),
                });
            }
            _ => pending.clear(),
        }
    }

    tests
}
