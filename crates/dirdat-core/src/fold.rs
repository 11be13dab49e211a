//! Mapping of relative paths onto the directory / group / leaf hierarchy.
//!
//! With fold depth `n`, the first `n - 1` path segments become nested
//! directories, segment `n` becomes the group and the remainder becomes the
//! leaf name. Depth 0 puts every file into one global group under its full
//! relative path.

use compact_str::CompactString;

use crate::config::{LooseFilePolicy, RunConfig};

/// Result of folding one relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldedPath {
    /// Directory chain above the group.
    pub dirs: Vec<CompactString>,
    /// Group the leaf belongs to.
    pub group: CompactString,
    /// Leaf name, `/`-separated if it still contains a sub-path.
    pub leaf: CompactString,
}

impl FoldedPath {
    /// A loose file has nothing beneath its group level.
    pub fn is_loose(&self) -> bool {
        self.group == self.leaf
    }
}

/// Folds path segments according to a run configuration.
#[derive(Debug, Clone)]
pub struct PathFolder {
    depth: usize,
    policy: LooseFilePolicy,
    strip_extension: bool,
    fallback_group: CompactString,
}

impl PathFolder {
    /// Create a folder from explicit settings.
    pub fn new(
        depth: usize,
        policy: LooseFilePolicy,
        strip_extension: bool,
        fallback_group: impl Into<CompactString>,
    ) -> Self {
        Self {
            depth,
            policy,
            strip_extension,
            fallback_group: fallback_group.into(),
        }
    }

    /// Create a folder for a run.
    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(
            config.fold_depth,
            config.loose_files,
            config.strip_extension,
            config.fallback_group(),
        )
    }

    /// Configured fold depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Fold `segments` and apply the loose-file policy.
    pub fn fold<S: AsRef<str>>(&self, segments: &[S]) -> FoldedPath {
        let folded = self.split(segments);
        if folded.is_loose() {
            self.apply_loose_policy(folded)
        } else {
            folded
        }
    }

    /// Fold `segments` without any loose-file handling.
    pub fn split<S: AsRef<str>>(&self, segments: &[S]) -> FoldedPath {
        let parts: Vec<&str> = segments.iter().map(AsRef::as_ref).collect();

        if self.depth == 0 || parts.is_empty() {
            return FoldedPath {
                dirs: Vec::new(),
                group: self.fallback_group.clone(),
                leaf: parts.join("/").into(),
            };
        }

        let depth = self.depth;
        let dirs = parts[..(depth - 1).min(parts.len())]
            .iter()
            .map(|s| CompactString::from(*s))
            .collect();
        let group = if parts.len() >= depth {
            CompactString::from(parts[depth - 1])
        } else {
            self.fallback_group.clone()
        };
        let leaf = if parts.len() > depth {
            parts[depth..].join("/").into()
        } else {
            CompactString::from(parts[parts.len() - 1])
        };

        FoldedPath { dirs, group, leaf }
    }

    /// Regroup a loose file according to the configured policy.
    pub fn apply_loose_policy(&self, mut folded: FoldedPath) -> FoldedPath {
        match self.policy {
            LooseFilePolicy::Parent => {
                if let Some(parent) = folded.dirs.pop() {
                    folded.group = parent;
                }
            }
            LooseFilePolicy::Strip if self.strip_extension => {
                let stem = file_stem(&folded.group);
                if stem.is_empty() {
                    tracing::warn!(
                        group = %folded.group,
                        "extension strip left no name, keeping original"
                    );
                } else {
                    folded.group = CompactString::from(stem);
                }
            }
            LooseFilePolicy::Strip => {}
        }
        folded
    }
}

/// Name without its trailing extension.
///
/// Leading dots do not start an extension, so `.profile` is kept whole.
pub fn file_stem(name: &str) -> &str {
    let body_start = name.len() - name.trim_start_matches('.').len();
    match name[body_start..].rfind('.') {
        Some(dot) => &name[..body_start + dot],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder(depth: usize, policy: LooseFilePolicy) -> PathFolder {
        PathFolder::new(depth, policy, true, "DAT")
    }

    fn segs(path: &str) -> Vec<&str> {
        path.split('/').collect()
    }

    #[test]
    fn test_depth_zero_keeps_full_path() {
        let folded = folder(0, LooseFilePolicy::Strip).fold(&segs("a/b/c.bin"));
        assert!(folded.dirs.is_empty());
        assert_eq!(folded.group, "DAT");
        assert_eq!(folded.leaf, "a/b/c.bin");
    }

    #[test]
    fn test_depth_one() {
        let folded = folder(1, LooseFilePolicy::Strip).fold(&segs("A/B/y.txt"));
        assert!(folded.dirs.is_empty());
        assert_eq!(folded.group, "A");
        assert_eq!(folded.leaf, "B/y.txt");
    }

    #[test]
    fn test_depth_two_builds_dirs() {
        let folded = folder(2, LooseFilePolicy::Strip).fold(&segs("Cat/Proj/docs/m.pdf"));
        assert_eq!(folded.dirs, vec![CompactString::from("Cat")]);
        assert_eq!(folded.group, "Proj");
        assert_eq!(folded.leaf, "docs/m.pdf");
    }

    #[test]
    fn test_depth_three_nests_dirs() {
        let folded = folder(3, LooseFilePolicy::Strip).fold(&segs("a/b/c/d/e.bin"));
        assert_eq!(folded.dirs, vec![CompactString::from("a"), CompactString::from("b")]);
        assert_eq!(folded.group, "c");
        assert_eq!(folded.leaf, "d/e.bin");
    }

    #[test]
    fn test_loose_file_strip_removes_extension() {
        let folded = folder(1, LooseFilePolicy::Strip).fold(&segs("game.zip"));
        assert_eq!(folded.group, "game");
        assert_eq!(folded.leaf, "game.zip");
    }

    #[test]
    fn test_loose_file_strip_disabled() {
        let folder = PathFolder::new(1, LooseFilePolicy::Strip, false, "DAT");
        let folded = folder.fold(&segs("game.zip"));
        assert_eq!(folded.group, "game.zip");
    }

    #[test]
    fn test_loose_file_strip_only_last_extension() {
        let folded = folder(2, LooseFilePolicy::Strip).fold(&segs("A/set.tar.gz"));
        assert_eq!(folded.dirs, vec![CompactString::from("A")]);
        assert_eq!(folded.group, "set.tar");
        assert_eq!(folded.leaf, "set.tar.gz");
    }

    #[test]
    fn test_loose_file_parent_promotes_directory() {
        let folded = folder(2, LooseFilePolicy::Parent).fold(&segs("Cat/loose.bin"));
        assert!(folded.dirs.is_empty());
        assert_eq!(folded.group, "Cat");
        assert_eq!(folded.leaf, "loose.bin");
    }

    #[test]
    fn test_loose_file_parent_without_dirs_is_unchanged() {
        let folded = folder(1, LooseFilePolicy::Parent).fold(&segs("top.bin"));
        assert_eq!(folded.group, "top.bin");
        assert_eq!(folded.leaf, "top.bin");
    }

    #[test]
    fn test_shallow_file_uses_fallback_group() {
        // Directory slots are taken from whatever segments exist.
        let folded = folder(3, LooseFilePolicy::Strip).fold(&segs("a/f.bin"));
        assert_eq!(
            folded.dirs,
            vec![CompactString::from("a"), CompactString::from("f.bin")]
        );
        assert_eq!(folded.group, "DAT");
        assert_eq!(folded.leaf, "f.bin");
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("a.txt"), "a");
        assert_eq!(file_stem("noext"), "noext");
        assert_eq!(file_stem(".profile"), ".profile");
        assert_eq!(file_stem("..x"), "..x");
        assert_eq!(file_stem(".cfg.bak"), ".cfg");
        assert_eq!(file_stem("a."), "a");
    }

    #[test]
    fn test_strip_never_empties_group() {
        let folder = folder(1, LooseFilePolicy::Strip);
        let folded = folder.apply_loose_policy(FoldedPath {
            dirs: Vec::new(),
            group: ".".into(),
            leaf: ".".into(),
        });
        assert_eq!(folded.group, ".");
    }
}
