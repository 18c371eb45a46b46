use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::scan;

/// The five places a filename can live. A name is in at most one category at
/// any time; `Ledger::move_file` upholds this by removing before appending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Unused,
    Used,
    InProgress,
    Ignore,
    BRoll,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Category::Unused => "unused",
            Category::Used => "used",
            Category::InProgress => "inprogress",
            Category::Ignore => "ignore",
            Category::BRoll => "b-roll",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(default)]
    pub unused: Vec<String>,
    #[serde(default)]
    pub used: Vec<String>,
    #[serde(default)]
    pub inprogress: Vec<String>,
    #[serde(default)]
    pub ignore: Vec<String>,
    #[serde(rename = "b-roll", default)]
    pub b_roll: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_prefix: Option<String>,
}

impl Ledger {
    fn list_mut(&mut self, category: Category) -> &mut Vec<String> {
        match category {
            Category::Unused => &mut self.unused,
            Category::Used => &mut self.used,
            Category::InProgress => &mut self.inprogress,
            Category::Ignore => &mut self.ignore,
            Category::BRoll => &mut self.b_roll,
        }
    }

    /// Every filename the ledger knows about, across all five categories.
    pub fn known_names(&self) -> impl Iterator<Item = &str> {
        self.unused
            .iter()
            .chain(&self.used)
            .chain(&self.inprogress)
            .chain(&self.ignore)
            .chain(&self.b_roll)
            .map(String::as_str)
    }

    /// Move `name` from one category to another. A name missing from `from`
    /// is a no-op removal; the append still happens.
    pub fn move_file(&mut self, name: &str, from: Category, to: Category) {
        let list = self.list_mut(from);
        if let Some(pos) = list.iter().position(|n| n == name) {
            list.remove(pos);
        }
        self.list_mut(to).push(name.to_string());
    }
}

/// Result of reconciling the ledger file against the source directory.
#[derive(Debug)]
pub struct LoadOutcome {
    pub ledger: Ledger,
    pub created: bool,
    pub migrated: bool,
    pub added: usize,
}

/// Owns the ledger file path. Persistence is an explicit call sited after
/// each mutation; nothing here caches state between calls.
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Full-document rewrite, pretty-printed with 4-space indentation.
    pub fn save(&self, ledger: &Ledger) -> Result<()> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        ledger
            .serialize(&mut ser)
            .context("failed to serialize ledger")?;
        buf.push(b'\n');
        fs::write(&self.path, buf)
            .with_context(|| format!("failed to write ledger {}", self.path.display()))?;
        Ok(())
    }

    /// Create the ledger from a directory scan, or load it and fold in any
    /// newly discovered files. Legacy documents without a `b-roll` key are
    /// upgraded and persisted on the spot.
    pub fn load_or_create(&self, source_dir: &Path) -> Result<LoadOutcome> {
        let on_disk = scan::video_files(source_dir);

        if !self.path.exists() {
            let ledger = Ledger {
                unused: on_disk,
                ..Ledger::default()
            };
            self.save(&ledger)?;
            return Ok(LoadOutcome {
                ledger,
                created: true,
                migrated: false,
                added: 0,
            });
        }

        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read ledger {}", self.path.display()))?;
        let doc: Value = serde_json::from_str(&raw)
            .with_context(|| format!("ledger {} is not valid JSON", self.path.display()))?;
        let migrated = doc.get("b-roll").is_none();
        let mut ledger: Ledger = serde_json::from_value(doc)
            .with_context(|| format!("ledger {} has an unexpected shape", self.path.display()))?;
        if migrated {
            self.save(&ledger)?;
        }

        let new_videos: Vec<String> = {
            let known: HashSet<&str> = ledger.known_names().collect();
            on_disk
                .into_iter()
                .filter(|name| !known.contains(name.as_str()))
                .collect()
        };

        let added = new_videos.len();
        if added > 0 {
            ledger.unused.extend(new_videos);
            self.save(&ledger)?;
        }

        Ok(LoadOutcome {
            ledger,
            created: false,
            migrated,
            added,
        })
    }
}
