//! End-to-end tests for the resolve-and-move pipeline.
//!
//! These drive the application the way `main` does: parse CLI arguments,
//! call `run_app`, and assert on exit codes and on-disk outcomes.

use clap::Parser;
use dupmove::cli::Cli;
use dupmove::error::ExitCode;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

struct Trees {
    reference: TempDir,
    candidate: TempDir,
    dest: TempDir,
}

impl Trees {
    fn new() -> Self {
        Self {
            reference: TempDir::new().unwrap(),
            candidate: TempDir::new().unwrap(),
            dest: TempDir::new().unwrap(),
        }
    }

    fn run(&self, extra: &[&str]) -> anyhow::Result<ExitCode> {
        let ref_s = self.reference.path().to_str().unwrap();
        let cand_s = self.candidate.path().to_str().unwrap();
        let dest_s = self.dest.path().to_str().unwrap();

        let mut args = vec!["dupmove", "--quiet"];
        args.extend_from_slice(extra);
        args.extend_from_slice(&[ref_s, cand_s, dest_s]);
        dupmove::run_app(Cli::try_parse_from(args).unwrap())
    }
}

fn write(dir: &Path, name: &str, content: &[u8]) {
    if let Some(parent) = dir.join(name).parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(dir.join(name), content).unwrap();
}

#[test]
fn test_duplicates_are_moved() {
    let t = Trees::new();
    write(t.reference.path(), "keep/x.bin", b"shared content");
    write(t.candidate.path(), "incoming/copy.bin", b"shared content");
    write(t.candidate.path(), "incoming/fresh.bin", b"unseen content!");

    let code = t.run(&[]).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(t.dest.path().join("copy.bin").is_file());
    assert!(!t.candidate.path().join("incoming/copy.bin").exists());
    // Non-duplicates stay exactly where they were
    assert_eq!(
        fs::read(t.candidate.path().join("incoming/fresh.bin")).unwrap(),
        b"unseen content!"
    );
}

#[test]
fn test_nothing_moved_exit_code() {
    let t = Trees::new();
    write(t.reference.path(), "a.bin", b"aaa");
    write(t.candidate.path(), "b.bin", b"bbbb");

    assert_eq!(t.run(&[]).unwrap(), ExitCode::NothingMoved);
}

#[test]
fn test_second_run_is_idempotent() {
    let t = Trees::new();
    write(t.reference.path(), "x.bin", b"dup");
    write(t.candidate.path(), "y.bin", b"dup");

    assert_eq!(t.run(&[]).unwrap(), ExitCode::Success);
    // The duplicate left the candidate tree on run one, so run two finds
    // nothing to do.
    assert_eq!(t.run(&[]).unwrap(), ExitCode::NothingMoved);
    assert!(t.dest.path().join("y.bin").is_file());
}

#[test]
fn test_equal_size_different_content_survives_unchanged() {
    let t = Trees::new();
    write(t.reference.path(), "ref.bin", b"0123456789");
    write(t.candidate.path(), "cand.bin", b"9876543210");

    assert_eq!(t.run(&[]).unwrap(), ExitCode::NothingMoved);
    assert_eq!(
        fs::read(t.candidate.path().join("cand.bin")).unwrap(),
        b"9876543210"
    );
}

#[test]
fn test_structure_collapse_and_collision() {
    let t = Trees::new();
    write(t.reference.path(), "ref.bin", b"dup");
    write(t.candidate.path(), "one/deep/name.bin", b"dup");
    write(t.candidate.path(), "two/name.bin", b"dup");

    let code = t.run(&[]).unwrap();

    // Both candidates collapse to dest/name.bin; the second move fails
    // and is reported, the walk completes.
    assert_eq!(code, ExitCode::PartialSuccess);
    assert!(t.dest.path().join("name.bin").is_file());
    let survivors = [
        t.candidate.path().join("one/deep/name.bin"),
        t.candidate.path().join("two/name.bin"),
    ];
    assert_eq!(survivors.iter().filter(|p| p.exists()).count(), 1);
}

#[test]
fn test_preexisting_destination_file_untouched() {
    let t = Trees::new();
    write(t.reference.path(), "ref.bin", b"dup");
    write(t.candidate.path(), "clash.bin", b"dup");
    write(t.dest.path(), "clash.bin", b"occupied");

    let code = t.run(&[]).unwrap();

    assert_eq!(code, ExitCode::PartialSuccess);
    assert_eq!(fs::read(t.dest.path().join("clash.bin")).unwrap(), b"occupied");
    assert!(t.candidate.path().join("clash.bin").is_file());
}

#[test]
fn test_mixed_size_bucket_matches_right_member() {
    let t = Trees::new();
    // Two 1000-byte reference files with different content share a bucket;
    // the candidate duplicates only one of them.
    write(t.reference.path(), "A/x.bin", &vec![1u8; 1000]);
    write(t.reference.path(), "B/y.bin", &vec![2u8; 1000]);
    write(t.candidate.path(), "C/z.bin", &vec![1u8; 1000]);

    assert_eq!(t.run(&[]).unwrap(), ExitCode::Success);
    assert!(t.dest.path().join("z.bin").is_file());
}

#[test]
fn test_hidden_entries_excluded_by_default() {
    let t = Trees::new();
    write(t.reference.path(), "ref.bin", b"dup");
    write(t.candidate.path(), ".hidden.bin", b"dup");
    write(t.candidate.path(), ".secret/inner.bin", b"dup");

    assert_eq!(t.run(&[]).unwrap(), ExitCode::NothingMoved);
    assert!(t.candidate.path().join(".hidden.bin").is_file());
    assert!(t.candidate.path().join(".secret/inner.bin").is_file());
}

#[test]
fn test_include_hidden_flag() {
    let t = Trees::new();
    write(t.reference.path(), "ref.bin", b"dup");
    write(t.candidate.path(), ".hidden.bin", b"dup");

    assert_eq!(t.run(&["--include-hidden"]).unwrap(), ExitCode::Success);
    assert!(t.dest.path().join(".hidden.bin").is_file());
}

#[test]
fn test_digest_index_strategy() {
    let t = Trees::new();
    write(t.reference.path(), "ref.bin", b"payload");
    write(t.candidate.path(), "same.bin", b"payload");
    write(t.candidate.path(), "close.bin", b"payloae"); // same size, off by one

    assert_eq!(t.run(&["--index", "digest"]).unwrap(), ExitCode::Success);
    assert!(t.dest.path().join("same.bin").is_file());
    assert!(t.candidate.path().join("close.bin").is_file());
}

#[test]
fn test_missing_reference_root_is_fatal() {
    let t = Trees::new();
    let missing = t.reference.path().join("nope");
    let cli = Cli::try_parse_from([
        "dupmove",
        "--quiet",
        missing.to_str().unwrap(),
        t.candidate.path().to_str().unwrap(),
        t.dest.path().to_str().unwrap(),
    ])
    .unwrap();

    assert!(dupmove::run_app(cli).is_err());
}

#[test]
fn test_missing_candidate_root_is_fatal() {
    let t = Trees::new();
    write(t.reference.path(), "ref.bin", b"x");
    let missing = t.candidate.path().join("nope");
    let cli = Cli::try_parse_from([
        "dupmove",
        "--quiet",
        t.reference.path().to_str().unwrap(),
        missing.to_str().unwrap(),
        t.dest.path().to_str().unwrap(),
    ])
    .unwrap();

    assert!(dupmove::run_app(cli).is_err());
}

#[test]
fn test_destination_created_on_demand() {
    let t = Trees::new();
    write(t.reference.path(), "ref.bin", b"dup");
    write(t.candidate.path(), "cand.bin", b"dup");
    let nested_dest = t.dest.path().join("made/on/demand");

    let cli = Cli::try_parse_from([
        "dupmove",
        "--quiet",
        t.reference.path().to_str().unwrap(),
        t.candidate.path().to_str().unwrap(),
        nested_dest.to_str().unwrap(),
    ])
    .unwrap();

    assert_eq!(dupmove::run_app(cli).unwrap(), ExitCode::Success);
    assert!(nested_dest.join("cand.bin").is_file());
}

#[cfg(unix)]
#[test]
fn test_one_unreadable_candidate_does_not_abort() {
    use std::os::unix::fs::PermissionsExt;

    let t = Trees::new();
    write(t.reference.path(), "ref.bin", b"dup");
    for i in 0..9 {
        write(t.candidate.path(), &format!("ok{i}.bin"), b"dup");
    }
    let locked = t.candidate.path().join("locked.bin");
    fs::write(&locked, b"dup").unwrap();
    let mut perms = fs::metadata(&locked).unwrap().permissions();
    perms.set_mode(0o000);
    fs::set_permissions(&locked, perms).unwrap();

    let code = t.run(&[]).unwrap();

    assert_eq!(code, ExitCode::PartialSuccess);
    for i in 0..9 {
        assert!(t.dest.path().join(format!("ok{i}.bin")).is_file());
    }
    assert!(locked.exists());
}
