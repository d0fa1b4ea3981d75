use super::*;
use std::fs;

fn map(entries: &[(&str, &str)]) -> FingerprintMap {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_every_path_in_exactly_one_set() {
    let local = map(&[("a", "1"), ("b", "2"), ("c", "3")]);
    let remote = map(&[("b", "2"), ("c", "x"), ("d", "4")]);
    let diff = compute_diff(&local, &remote);

    assert_eq!(diff.added, BTreeSet::from(["a".to_string()]));
    assert_eq!(diff.identical, BTreeSet::from(["b".to_string()]));
    assert_eq!(diff.different, BTreeSet::from(["c".to_string()]));
    assert_eq!(diff.removed, BTreeSet::from(["d".to_string()]));

    for path in ["a", "b", "c", "d"] {
        let hits = [&diff.added, &diff.removed, &diff.different, &diff.identical]
            .iter()
            .filter(|set| set.contains(path))
            .count();
        assert_eq!(hits, 1, "{path} classified {hits} times");
    }
    assert!(diff.has_changes());
}

#[test]
fn test_identical_trees_have_no_changes() {
    let both = map(&[("manifest.yml", "aa"), ("setup.sql", "bb")]);
    let diff = compute_diff(&both, &both);
    assert!(!diff.has_changes());
    assert_eq!(diff.identical.len(), 2);
    assert_eq!(
        diff.to_string(),
        "Your stage is up-to-date with your local deploy root."
    );
}

#[test]
fn test_only_removed_counts_as_change() {
    let diff = compute_diff(&FingerprintMap::new(), &map(&[("old.sql", "1")]));
    assert!(diff.has_changes());
    assert_eq!(diff.to_upload().count(), 0);
}

#[test]
fn test_display_lists_changes() {
    let diff = compute_diff(
        &map(&[("new.sql", "1"), ("changed.sql", "2")]),
        &map(&[("changed.sql", "3"), ("gone.sql", "4")]),
    );
    assert_eq!(
        diff.to_string(),
        "Local changes to be deployed:\n  added:    new.sql\n  modified: changed.sql\n  deleted:  gone.sql"
    );
    assert_eq!(diff.to_upload().collect::<Vec<_>>(), vec!["changed.sql", "new.sql"]);
}

#[test]
fn test_local_fingerprints_walks_subdirectories() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("ui/pages")).unwrap();
    fs::write(dir.path().join("manifest.yml"), "").unwrap();
    fs::write(dir.path().join("ui/pages/home.py"), "print('hi')").unwrap();

    let fingerprints = local_fingerprints(dir.path()).unwrap();
    assert_eq!(
        fingerprints.keys().collect::<Vec<_>>(),
        vec!["manifest.yml", "ui/pages/home.py"]
    );
    assert_eq!(fingerprints["manifest.yml"], "d41d8cd98f00b204e9800998ecf8427e");
}

#[test]
fn test_missing_root_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    assert!(local_fingerprints(&dir.path().join("nope")).unwrap().is_empty());
}
