// tests/install_flow.rs

//! End-to-end install pipeline tests over synthetic archives.
//!
//! These exercise the full stage chain (hash, decompress, re-chunk, unpack,
//! verify, replace) against the filesystem, without any network: the
//! pipeline consumes plain readers, and the HTTP client is a separate
//! collaborator.

mod common;

use common::{bzip2_multistream, gzip, make_tar, published_line};
use crossforge::artifact::{Artifact, ArtifactKind, Codec};
use crossforge::{CHECKSUM_FILE, Error, install_stream, state};
use std::fs;
use std::path::PathBuf;

fn sdk_artifact(root: PathBuf) -> Artifact {
    Artifact {
        kind: ArtifactKind::Sdk,
        name: "sdk (linux-x86_64)".to_string(),
        url: "https://mirror.example.com/sdk/linux-x86_64/crossforge-sdk-linux-x86_64.tar.bz2"
            .to_string(),
        install_root: root,
        strip: 2,
        codec: Codec::Bzip2,
    }
}

fn rustlib_artifact(root: PathBuf) -> Artifact {
    Artifact {
        kind: ArtifactKind::Rustlib,
        name: "rustlib 1.93.0".to_string(),
        url: "https://mirror.example.com/rustlib/crossforge-rustlib-1.93.0.tar.gz".to_string(),
        install_root: root,
        strip: 0,
        codec: Codec::Gzip,
    }
}

#[test]
fn fresh_sdk_install_verifies_and_strips_wrapper() {
    let base = tempfile::tempdir().unwrap();
    let root = base.path().join("sdk").join("linux-x86_64");
    let artifact = sdk_artifact(root.clone());

    // SDK archives carry a nested wrapper directory, stripped away with N=2
    let tar_bytes = make_tar(&[
        ("crossforge-sdk/sdk/", b""),
        ("crossforge-sdk/sdk/toolchain-mips-2019/", b""),
        ("crossforge-sdk/sdk/toolchain-mips-2019/bin/mips-gcc", b"#!gcc"),
        ("crossforge-sdk/sdk/VERSION", b"2019.4"),
    ]);
    let payload = bzip2_multistream(&tar_bytes);
    let expected = published_line(&payload, "crossforge-sdk-linux-x86_64.tar.bz2");

    // Before install: not installed
    let before = state::check(&artifact, Some(&expected));
    assert!(!before.exists);
    assert!(!before.checked);

    let outcome = install_stream(payload.as_slice(), &artifact, &expected).unwrap();
    assert_eq!(outcome.bytes, payload.len() as u64);

    // After install: marker contains exactly the published line
    let after = state::check(&artifact, Some(&expected));
    assert!(after.exists);
    assert!(after.checked);
    assert_eq!(fs::read_to_string(root.join(CHECKSUM_FILE)).unwrap(), expected);

    // Wrapper components are gone; contents live directly under the root
    assert!(root.join("toolchain-mips-2019/bin/mips-gcc").is_file());
    assert!(root.join("VERSION").is_file());
    assert!(!root.join("crossforge-sdk").exists());
}

#[test]
fn rustlib_install_preserves_paths_without_strip() {
    let base = tempfile::tempdir().unwrap();
    let root = base.path().join("rustlib").join("1.93.0");
    let artifact = rustlib_artifact(root.clone());

    let tar_bytes = make_tar(&[
        ("lib/", b""),
        ("lib/libcore.rlib", b"core"),
        ("lib/libstd.rlib", b"std"),
    ]);
    let payload = gzip(&tar_bytes);
    let expected = published_line(&payload, "crossforge-rustlib-1.93.0.tar.gz");

    install_stream(payload.as_slice(), &artifact, &expected).unwrap();

    assert_eq!(fs::read(root.join("lib/libcore.rlib")).unwrap(), b"core");
    assert_eq!(fs::read(root.join("lib/libstd.rlib")).unwrap(), b"std");
}

#[test]
fn second_install_is_detected_as_no_op() {
    let base = tempfile::tempdir().unwrap();
    let root = base.path().join("rustlib").join("1.93.0");
    let artifact = rustlib_artifact(root.clone());

    let payload = gzip(&make_tar(&[("lib/libcore.rlib", b"core")]));
    let expected = published_line(&payload, "crossforge-rustlib-1.93.0.tar.gz");

    install_stream(payload.as_slice(), &artifact, &expected).unwrap();

    // The skip decision the installer makes before downloading anything:
    // marker matches the published line, so no re-download happens.
    let state_one = state::check(&artifact, Some(&expected));
    assert!(state_one.exists && state_one.checked);

    // Idempotent: asking again without an intervening install is identical
    let state_two = state::check(&artifact, Some(&expected));
    assert_eq!(state_one, state_two);
}

#[test]
fn updated_digest_triggers_reinstall_decision() {
    let base = tempfile::tempdir().unwrap();
    let root = base.path().join("rustlib").join("1.93.0");
    let artifact = rustlib_artifact(root.clone());

    let payload = gzip(&make_tar(&[("lib/libcore.rlib", b"core")]));
    let expected = published_line(&payload, "crossforge-rustlib-1.93.0.tar.gz");
    install_stream(payload.as_slice(), &artifact, &expected).unwrap();

    // Mirror republishes with a different digest: exists but not checked
    let republished = published_line(b"different payload", "crossforge-rustlib-1.93.0.tar.gz");
    let state = state::check(&artifact, Some(&republished));
    assert!(state.exists);
    assert!(!state.checked);
}

#[test]
fn checksum_mismatch_leaves_previous_install_byte_for_byte() {
    let base = tempfile::tempdir().unwrap();
    let root = base.path().join("rustlib").join("1.93.0");
    let artifact = rustlib_artifact(root.clone());

    // Existing valid install
    let old_payload = gzip(&make_tar(&[("lib/libcore.rlib", b"old core")]));
    let old_line = published_line(&old_payload, "crossforge-rustlib-1.93.0.tar.gz");
    install_stream(old_payload.as_slice(), &artifact, &old_line).unwrap();

    // New download whose bytes do not match the published digest
    let corrupt = gzip(&make_tar(&[("lib/libcore.rlib", b"evil core")]));
    let err = install_stream(corrupt.as_slice(), &artifact, &old_line).unwrap_err();
    match err {
        Error::ChecksumMismatch {
            artifact: name,
            expected,
            actual,
        } => {
            assert_eq!(name, "rustlib 1.93.0");
            assert_eq!(expected, old_line);
            assert_ne!(actual, expected);
        }
        other => panic!("expected ChecksumMismatch, got {other:?}"),
    }

    // Previous install untouched, marker still matches
    assert_eq!(fs::read(root.join("lib/libcore.rlib")).unwrap(), b"old core");
    let state = state::check(&artifact, Some(&old_line));
    assert!(state.exists && state.checked);

    // No staging leftovers in the roots' parent
    let leftovers: Vec<_> = fs::read_dir(root.parent().unwrap())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with(".staging-"))
        .collect();
    assert!(leftovers.is_empty(), "staging not cleaned: {leftovers:?}");
}

#[test]
fn digest_filename_drift_fails_verification() {
    let base = tempfile::tempdir().unwrap();
    let root = base.path().join("rustlib").join("1.93.0");
    let artifact = rustlib_artifact(root.clone());

    let payload = gzip(&make_tar(&[("lib/libcore.rlib", b"core")]));
    // Right digest, wrong filename in the published line: strict equality
    // must reject it
    let drifted = published_line(&payload, "wrong-name.tar.gz");

    let err = install_stream(payload.as_slice(), &artifact, &drifted).unwrap_err();
    assert!(matches!(err, Error::ChecksumMismatch { .. }));
    assert!(!root.exists());
}

#[test]
fn installed_sdk_resolves_toolchain() {
    let base = tempfile::tempdir().unwrap();
    let root = base.path().join("sdk").join("linux-x86_64");
    let artifact = sdk_artifact(root.clone());

    let tar_bytes = make_tar(&[
        ("wrap/sdk/toolchain-mips-2019/", b""),
        ("wrap/sdk/toolchain-mips-2019/bin/mips-gcc", b"#!gcc"),
        ("wrap/sdk/docs/README", b"readme"),
    ]);
    let payload = bzip2_multistream(&tar_bytes);
    let expected = published_line(&payload, "crossforge-sdk-linux-x86_64.tar.bz2");
    install_stream(payload.as_slice(), &artifact, &expected).unwrap();

    let toolchain = crossforge::toolchain::locate_toolchain(&root).unwrap();
    assert!(
        toolchain
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("toolchain-")
    );
}
