use super::*;

fn fp(n: u64) -> ContentFingerprint {
    ContentFingerprint { hi: n, lo: !n }
}

#[test]
fn missing_file_is_an_empty_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let m = BuildManifest::load(dir.path().join("manifest.json")).unwrap();
    assert!(m.is_empty());
    assert!(m.reset_reason().is_none());
}

#[test]
fn record_persists_and_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state/manifest.json");
    let artifact = dir.path().join("home.qmd");
    std::fs::write(&artifact, "x").unwrap();

    let mut m = BuildManifest::empty(&path);
    m.record(
        "home",
        ManifestEntry {
            fingerprint: fp(7),
            artifact: artifact.clone(),
        },
    )
    .unwrap();

    let again = BuildManifest::load(&path).unwrap();
    assert_eq!(again.get("home").unwrap().fingerprint, fp(7));
    assert_eq!(again.classify("home", fp(7), true), UnitState::Fresh);
    assert_eq!(again.classify("home", fp(8), true), UnitState::Stale);
    assert_eq!(again.classify("home", fp(7), false), UnitState::Stale);
    assert_eq!(again.classify("other", fp(7), true), UnitState::Unknown);
    assert_eq!(again.classify("other", fp(7), false), UnitState::Stale);
    assert!(!dir.path().join("state/manifest.json.tmp").exists());
}

#[test]
fn deleted_artifact_makes_a_unit_stale() {
    let dir = tempfile::tempdir().unwrap();
    let mut m = BuildManifest::empty(dir.path().join("m.json"));
    m.record(
        "home",
        ManifestEntry {
            fingerprint: fp(1),
            artifact: dir.path().join("gone.qmd"),
        },
    )
    .unwrap();
    assert_eq!(m.classify("home", fp(1), true), UnitState::Stale);
}

#[test]
fn corrupt_manifest_is_a_cache_error_and_resets() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("m.json");
    std::fs::write(&path, "{not json").unwrap();
    assert!(matches!(BuildManifest::load(&path), Err(VizError::CacheIo(_))));

    let m = BuildManifest::load_or_reset(&path);
    assert!(m.is_empty());
    assert!(m.reset_reason().unwrap().contains("cache io error"));
}

#[test]
fn version_mismatch_is_a_cache_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("m.json");
    std::fs::write(&path, r#"{"version": 999, "units": {}}"#).unwrap();
    let err = BuildManifest::load(&path).unwrap_err();
    assert!(err.to_string().contains("version mismatch"));
}
