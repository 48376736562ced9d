use dupelink::actions::{ResolveConfig, Resolver};
use dupelink::duplicates::{DuplicateFinder, FinderConfig};
use dupelink::scanner::hardlink::{is_supported, link_count};
use dupelink::scanner::{CandidateSource, Hasher, WalkerConfig};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn write_file(path: &Path, content: &[u8]) {
    File::create(path).unwrap().write_all(content).unwrap();
}

fn linking_resolver(force_link: bool) -> Arc<Resolver> {
    Arc::new(Resolver::new(
        ResolveConfig {
            link: true,
            force_link,
            silent: true,
            ..ResolveConfig::default()
        },
        Box::new(std::io::sink()),
    ))
}

fn scan(root: &Path, resolver: Arc<Resolver>) -> dupelink::duplicates::ScanSummary {
    DuplicateFinder::new(FinderConfig::default().with_workers(1), Hasher::default())
        .run_source(
            &CandidateSource::Roots(vec![root.to_path_buf()]),
            WalkerConfig::default().with_size_bounds(Some(0), None),
            resolver,
        )
        .unwrap()
}

#[cfg(unix)]
fn same_inode(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    let a = fs::metadata(a).unwrap();
    let b = fs::metadata(b).unwrap();
    a.dev() == b.dev() && a.ino() == b.ino()
}

#[test]
fn test_link_mode_merges_duplicates() {
    let dir = tempdir().unwrap();
    let content = vec![b'm'; 5000];
    write_file(&dir.path().join("a.bin"), &content);
    write_file(&dir.path().join("b.bin"), &content);
    write_file(&dir.path().join("c.bin"), b"different");

    let summary = scan(dir.path(), linking_resolver(false));

    assert_eq!(summary.duplicate_pairs, 1);
    assert_eq!(summary.relinked, 1);
    assert_eq!(summary.action_failures, 0);

    // Both names still resolve to the same bytes
    assert_eq!(fs::read(dir.path().join("a.bin")).unwrap(), content);
    assert_eq!(fs::read(dir.path().join("b.bin")).unwrap(), content);

    #[cfg(unix)]
    {
        assert!(same_inode(&dir.path().join("a.bin"), &dir.path().join("b.bin")));
        assert_eq!(link_count(&dir.path().join("a.bin")).unwrap(), 2);
        assert_eq!(link_count(&dir.path().join("c.bin")).unwrap(), 1);
    }
}

#[test]
fn test_second_link_run_is_suppressed() {
    let dir = tempdir().unwrap();
    let content = vec![b'r'; 5000];
    write_file(&dir.path().join("a.bin"), &content);
    write_file(&dir.path().join("b.bin"), &content);

    let first = scan(dir.path(), linking_resolver(false));
    assert_eq!(first.relinked, 1);

    let second = scan(dir.path(), linking_resolver(false));
    assert_eq!(second.duplicate_pairs, 1);
    if is_supported() {
        assert_eq!(second.suppressed, 1);
        assert_eq!(second.relinked, 0);
    }
}

#[test]
fn test_preexisting_hardlinks_are_suppressed() {
    let dir = tempdir().unwrap();
    let original = dir.path().join("original.bin");
    let hardlink = dir.path().join("zz_link.bin");
    write_file(&original, &[b'h'; 5000]);

    if let Err(e) = fs::hard_link(&original, &hardlink) {
        eprintln!("Skipping hardlink test: failed to create hardlink: {}", e);
        return;
    }

    let summary = scan(dir.path(), linking_resolver(false));

    assert_eq!(summary.duplicate_pairs, 1);
    if is_supported() {
        assert_eq!(summary.suppressed, 1);
        assert_eq!(summary.relinked, 0);
    }
    assert!(original.exists());
    assert!(hardlink.exists());
}

#[test]
fn test_force_link_acts_on_hardlinked_pairs() {
    let dir = tempdir().unwrap();
    let original = dir.path().join("original.bin");
    let hardlink = dir.path().join("zz_link.bin");
    write_file(&original, &[b'f'; 5000]);

    if let Err(e) = fs::hard_link(&original, &hardlink) {
        eprintln!("Skipping hardlink test: failed to create hardlink: {}", e);
        return;
    }

    let summary = scan(dir.path(), linking_resolver(true));

    assert_eq!(summary.suppressed, 0);
    assert_eq!(summary.relinked, 1);
    assert_eq!(fs::read(&hardlink).unwrap(), vec![b'f'; 5000]);
    #[cfg(unix)]
    assert!(same_inode(&original, &hardlink));
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_not_candidates() {
    let dir = tempdir().unwrap();
    let original = dir.path().join("original.bin");
    let symlink = dir.path().join("symlink.bin");
    write_file(&original, &[b's'; 5000]);
    std::os::unix::fs::symlink(&original, &symlink).unwrap();

    let summary = scan(dir.path(), linking_resolver(false));

    assert_eq!(summary.dispatched, 1);
    assert_eq!(summary.duplicate_pairs, 0);
    assert!(fs::symlink_metadata(&symlink).unwrap().file_type().is_symlink());
}

#[test]
fn test_link_three_copies_share_one_original() {
    let dir = tempdir().unwrap();
    let content = vec![b't'; 6000];
    for name in ["a.bin", "b.bin", "c.bin"] {
        write_file(&dir.path().join(name), &content);
    }

    let summary = scan(dir.path(), linking_resolver(false));

    assert_eq!(summary.duplicate_pairs, 2);
    assert_eq!(summary.relinked, 2);
    #[cfg(unix)]
    {
        assert!(same_inode(&dir.path().join("a.bin"), &dir.path().join("b.bin")));
        assert!(same_inode(&dir.path().join("a.bin"), &dir.path().join("c.bin")));
        assert_eq!(link_count(&dir.path().join("a.bin")).unwrap(), 3);
    }
}

#[cfg(unix)]
#[test]
fn test_listed_symlink_never_becomes_link_target() {
    let dir = tempdir().unwrap();
    let d1 = dir.path().join("d1");
    let d2 = dir.path().join("d2");
    fs::create_dir(&d1).unwrap();
    fs::create_dir(&d2).unwrap();
    let content = vec![b'y'; 5000];
    write_file(&d1.join("x"), &content);
    write_file(&d2.join("b"), &content);
    std::os::unix::fs::symlink("x", d1.join("s")).unwrap();

    let list = dir.path().join("list.txt");
    fs::write(
        &list,
        format!("{}\n{}\n", d1.join("s").display(), d2.join("b").display()),
    )
    .unwrap();

    let summary = DuplicateFinder::new(FinderConfig::default().with_workers(1), Hasher::default())
        .run_source(
            &CandidateSource::PathList(list),
            WalkerConfig::default().with_size_bounds(Some(0), None),
            linking_resolver(false),
        )
        .unwrap();

    assert_eq!(summary.dispatched, 1);
    assert_eq!(summary.relinked, 0);
    let meta = fs::symlink_metadata(d2.join("b")).unwrap();
    assert!(meta.file_type().is_file());
    assert_eq!(fs::read(d2.join("b")).unwrap(), content);
}

#[cfg(unix)]
#[test]
fn test_relink_across_filesystems_leaves_candidate_absent() {
    use dupelink::actions::{relink, ActionError};
    use std::os::unix::fs::MetadataExt;

    let Ok(shm) = tempfile::tempdir_in("/dev/shm") else {
        eprintln!("Skipping cross-device test: /dev/shm unavailable");
        return;
    };
    let local = tempfile::tempdir_in(env!("CARGO_TARGET_TMPDIR")).unwrap();
    if fs::metadata(shm.path()).unwrap().dev() == fs::metadata(local.path()).unwrap().dev() {
        eprintln!("Skipping cross-device test: both directories on one filesystem");
        return;
    }

    let original = shm.path().join("original.bin");
    let candidate = local.path().join("candidate.bin");
    write_file(&original, b"payload");
    write_file(&candidate, b"payload");

    let err = relink(&candidate, &original).unwrap_err();

    assert!(matches!(err, ActionError::LinkFailed { .. }));
    assert_eq!(err.path(), candidate.as_path());
    assert!(!candidate.exists());
    assert!(original.exists());
}
