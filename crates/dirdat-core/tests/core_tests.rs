use dirdat_core::{
    DigestResult, LooseFilePolicy, NodeKind, PathFolder, RunConfig, TreeBuilder,
};

fn digest(size: u64) -> DigestResult {
    DigestResult {
        size,
        crc32: 0xdeadbeef,
        md5: [0x11; 16],
        sha1: [0x22; 20],
    }
}

/// Fold and insert every path in order, the way a run does.
fn build(config: &RunConfig, paths: &[&str]) -> TreeBuilder {
    let folder = PathFolder::from_config(config);
    let mut builder = TreeBuilder::for_config(config);
    for (i, path) in paths.iter().enumerate() {
        let segments: Vec<&str> = path.split('/').collect();
        let folded = folder.fold(&segments);
        builder.insert_folded(&folded, digest(i as u64));
    }
    builder
}

#[test]
fn test_depth_one_groups_by_first_folder() {
    let config = RunConfig::new("/src", "out.dat");
    let builder = build(&config, &["A/x.txt", "A/B/y.txt"]);
    let tree = builder.tree();

    assert_eq!(tree.stats().groups, 1);
    let group = builder.group_id::<&str>(&[], "A").unwrap();
    let leaves: Vec<_> = tree.children(group).map(|n| n.name.as_str()).collect();
    assert_eq!(leaves, vec!["x.txt", "B/y.txt"]);
}

#[test]
fn test_depth_one_loose_root_file_is_its_own_group() {
    let config = RunConfig::new("/src", "out.dat");
    let builder = build(&config, &["readme.txt", "A/x.bin"]);

    let group = builder.group_id::<&str>(&[], "readme").unwrap();
    let leaves: Vec<_> = builder
        .tree()
        .children(group)
        .map(|n| n.name.as_str())
        .collect();
    assert_eq!(leaves, vec!["readme.txt"]);
}

#[test]
fn test_depth_zero_single_group_full_paths() {
    let mut config = RunConfig::new("/src", "out.dat");
    config.fold_depth = 0;
    let paths = ["top.bin", "A/x.txt", "A/B/C/deep.dat"];
    let tree = build(&config, &paths).finish();

    assert_eq!(tree.stats().groups, 1);
    assert_eq!(tree.stats().directories, 0);
    let group = tree.top_level().next().unwrap();
    assert_eq!(group.name.as_str(), "DAT");

    let names: Vec<_> = tree.leaf_entries().iter().map(|e| e.name).collect();
    assert_eq!(names, paths.to_vec());
}

#[test]
fn test_depth_zero_uses_configured_name() {
    let mut config = RunConfig::new("/src", "out.dat");
    config.fold_depth = 0;
    config.header.name = Some("Collection".into());
    let tree = build(&config, &["a"]).finish();

    assert_eq!(tree.top_level().next().unwrap().name.as_str(), "Collection");
}

#[test]
fn test_shared_prefix_resolves_to_same_directory() {
    let mut config = RunConfig::new("/src", "out.dat");
    config.fold_depth = 3;
    let builder = build(&config, &["A/B/g1/f1", "A/C/g2/f2", "A/B/g3/f3"]);
    let tree = builder.tree();

    // One "A", two children "B" and "C", no duplicates.
    assert_eq!(tree.roots().len(), 1);
    let a = builder.directory_id(&["A"]).unwrap();
    assert_eq!(tree.roots()[0], a);
    let names: Vec<_> = tree.children(a).map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["B", "C"]);

    let b = builder.directory_id(&["A", "B"]).unwrap();
    let groups: Vec<_> = tree.children(b).map(|n| n.name.as_str()).collect();
    assert_eq!(groups, vec!["g1", "g3"]);
}

#[test]
fn test_parent_policy_promotes_ancestor() {
    let mut config = RunConfig::new("/src", "out.dat");
    config.fold_depth = 2;
    config.loose_files = LooseFilePolicy::Parent;
    let builder = build(&config, &["Cat/loose.bin", "Cat/Proj/a.bin"]);
    let tree = builder.tree();

    // The loose file becomes a top-level group named after its folder.
    let promoted = builder.group_id::<&str>(&[], "Cat").unwrap();
    assert!(tree.roots().contains(&promoted));
    let leaves: Vec<_> = tree.children(promoted).map(|n| n.name.as_str()).collect();
    assert_eq!(leaves, vec!["loose.bin"]);

    // The regular file still sits under dir "Cat" / group "Proj".
    assert!(builder.group_id(&["Cat"], "Proj").is_some());
}

#[test]
fn test_strip_policy_merges_with_matching_folder_group() {
    let mut config = RunConfig::new("/src", "out.dat");
    config.fold_depth = 2;
    let builder = build(&config, &["Cat/game.zip", "Cat/game/readme.txt"]);

    let group = builder.group_id(&["Cat"], "game").unwrap();
    let leaves: Vec<_> = builder
        .tree()
        .children(group)
        .map(|n| n.name.as_str())
        .collect();
    assert_eq!(leaves, vec!["game.zip", "readme.txt"]);
}

#[test]
fn test_node_kinds_by_level() {
    let mut config = RunConfig::new("/src", "out.dat");
    config.fold_depth = 2;
    let tree = build(&config, &["D/G/f.bin"]).finish();

    let dir = tree.top_level().next().unwrap();
    assert!(dir.kind.is_dir());
    let group = tree.children(dir.id).next().unwrap();
    assert!(group.kind.is_group());
    let leaf = tree.children(group.id).next().unwrap();
    assert!(matches!(leaf.kind, NodeKind::Leaf(_)));
    assert_eq!(leaf.digest().unwrap().crc32_hex(), "deadbeef");
}
