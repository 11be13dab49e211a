//! Run configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Group name used when no DAT name is configured.
pub const DEFAULT_GROUP_NAME: &str = "DAT";

/// RomVault packing hint written into the header.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ForcePacking {
    FileOnly,
    Archive,
    Split,
}

/// How to group a file that has no sub-path beneath its group level.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    AsRefStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LooseFilePolicy {
    /// Use the file name (optionally without extension) as the group.
    #[default]
    Strip,
    /// Use the parent directory as the group.
    Parent,
}

/// Descriptive metadata for the document header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatHeader {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    /// `YYYY-MM-DD`; today's date when unset.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl DatHeader {
    /// Header field tags, in document order.
    pub const FIELDS: [&'static str; 8] = [
        "name",
        "description",
        "category",
        "version",
        "date",
        "author",
        "comment",
        "url",
    ];

    /// Trim every field and drop the blank ones.
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            name: clean(self.name),
            description: clean(self.description),
            category: clean(self.category),
            version: clean(self.version),
            date: clean(self.date),
            author: clean(self.author),
            comment: clean(self.comment),
            url: clean(self.url),
        }
    }

    /// Mutable access to a field by tag.
    pub fn field_mut(&mut self, tag: &str) -> Option<&mut Option<String>> {
        match tag {
            "name" => Some(&mut self.name),
            "description" => Some(&mut self.description),
            "category" => Some(&mut self.category),
            "version" => Some(&mut self.version),
            "date" => Some(&mut self.date),
            "author" => Some(&mut self.author),
            "comment" => Some(&mut self.comment),
            "url" => Some(&mut self.url),
            _ => None,
        }
    }

    /// The configured date, or today's local date.
    pub fn date_or_today(&self) -> String {
        match self.date.as_deref().map(str::trim) {
            Some(date) if !date.is_empty() => date.to_string(),
            _ => chrono::Local::now().date_naive().format("%Y-%m-%d").to_string(),
        }
    }

    /// Non-empty header entries in document order, with the date resolved.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let date = self.date_or_today();
        let values = [
            self.name.as_deref(),
            self.description.as_deref(),
            self.category.as_deref(),
            self.version.as_deref(),
            Some(date.as_str()),
            self.author.as_deref(),
            self.comment.as_deref(),
            self.url.as_deref(),
        ];

        Self::FIELDS
            .iter()
            .zip(values)
            .filter_map(|(tag, value)| {
                value
                    .filter(|v| !v.is_empty())
                    .map(|v| (*tag, v.to_string()))
            })
            .collect()
    }
}

/// Configuration for a single cataloging run.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct RunConfig {
    /// Directory tree to catalog.
    pub source: PathBuf,

    /// Path of the document to write.
    pub output: PathBuf,

    /// Header metadata.
    #[builder(default)]
    #[serde(default)]
    pub header: DatHeader,

    /// Optional RomVault packing marker.
    #[builder(default)]
    #[serde(default)]
    pub force_packing: Option<ForcePacking>,

    /// Folder level that becomes a group (0 = one global group).
    #[builder(default = "1")]
    #[serde(default = "default_fold_depth")]
    pub fold_depth: usize,

    /// Grouping of files sitting directly at the group level.
    #[builder(default)]
    #[serde(default)]
    pub loose_files: LooseFilePolicy,

    /// Remove the extension from a loose file's group name.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub strip_extension: bool,
}

fn default_true() -> bool {
    true
}

fn default_fold_depth() -> usize {
    1
}

impl RunConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.source {
            Some(ref source) if source.as_os_str().is_empty() => {
                return Err("Source path cannot be empty".to_string());
            }
            None => return Err("Source path is required".to_string()),
            _ => {}
        }
        match self.output {
            Some(ref output) if output.as_os_str().is_empty() => {
                Err("Output path cannot be empty".to_string())
            }
            None => Err("Output path is required".to_string()),
            _ => Ok(()),
        }
    }
}

impl RunConfig {
    /// Create a new run config builder.
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::default()
    }

    /// Create a config with default options.
    pub fn new(source: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            output: output.into(),
            header: DatHeader::default(),
            force_packing: None,
            fold_depth: 1,
            loose_files: LooseFilePolicy::Strip,
            strip_extension: true,
        }
    }

    /// Group name used for depth 0 and for files shallower than the fold depth.
    pub fn fallback_group(&self) -> &str {
        self.header
            .name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_GROUP_NAME)
    }
}
