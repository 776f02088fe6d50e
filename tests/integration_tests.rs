//! 集成测试 - 端到端重映射

mod common;

use std::fs;

use common::*;
use symfix::symfix_core::archive::temp_path;
use symfix::{
    init_config, is_initialized, remap, remap_with_config, ErrorKind, RemapRequest, RunConfig,
    SidecarPolicy, SymfixError,
};

#[test]
fn test_end_to_end_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let jar = dir.path().join("example.jar");
    write_sample_jar(&jar);
    let mappings = write_mappings(dir.path());

    let output = remap_with_config(&RemapRequest::new(&jar, &mappings), &RunConfig::new()).unwrap();
    assert_eq!(output.output_path, jar);
    assert_eq!(output.game_version.as_deref(), Some("1.20.1"));
    assert_eq!(output.mapping_stats.inserted, 1);
    assert_eq!(output.report.classes_rewritten, 1);
    assert_eq!(output.report.sidecars_rewritten, 1);

    let entries = read_jar(&jar);
    let (methods, calls) = method_and_call_names(entry(&entries, "pkg/A.class"));
    assert_eq!(methods, vec!["doY"]);
    assert_eq!(calls, vec!["doY"]);

    let sidecar = String::from_utf8(entry(&entries, "example.accesswidener").to_vec()).unwrap();
    assert_eq!(sidecar, "accessWidener v1 named\n\naccessible method pkg/A doY ()V\n");
    assert!(!sidecar.contains('\t'));

    assert_eq!(entry(&entries, "META-INF/MANIFEST.MF"), MANIFEST.as_bytes());
    assert_eq!(entry(&entries, "fabric.mod.json"), MOD_JSON.as_bytes());
    assert!(!temp_path(&jar, "_temp").exists());
}

#[test]
fn test_separate_output_keeps_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("example.zip");
    write_sample_jar(&input);
    let original = fs::read(&input).unwrap();
    let mappings = write_mappings(dir.path());

    let stale = dir.path().join("example-remapped.jar");
    fs::write(&stale, b"stale").unwrap();

    let request = RemapRequest::new(&input, &mappings)
        .with_output(dir.path().join("example-remapped.zip"))
        .with_mappings_version("1.20.1+build.10");
    let output = remap_with_config(&request, &RunConfig::new()).unwrap();

    assert_eq!(output.output_path, stale);
    assert_eq!(fs::read(&input).unwrap(), original);

    let entries = read_jar(&output.output_path);
    let (methods, _) = method_and_call_names(entry(&entries, "pkg/A.class"));
    assert_eq!(methods, vec!["doY"]);
}

#[test]
fn test_dictionary_only_without_tree_delegate() {
    let dir = tempfile::tempdir().unwrap();
    let jar = dir.path().join("example.jar");
    write_sample_jar(&jar);
    let mappings = write_mappings(dir.path());

    let config = RunConfig {
        use_tree_delegate: false,
        ..RunConfig::new()
    };
    remap_with_config(&RemapRequest::new(&jar, &mappings), &config).unwrap();

    // 恒等委托只切换命名空间，成员名由字典替换
    let sidecar = String::from_utf8(entry(&read_jar(&jar), "example.accesswidener").to_vec()).unwrap();
    assert_eq!(sidecar, "accessWidener v1 named\n\naccessible method pkg/A doY ()V\n");
}

#[test]
fn test_malformed_sidecar_policies() {
    let dir = tempfile::tempdir().unwrap();
    let jar = dir.path().join("example.jar");
    let bad = b"accessWidener\tv1\tintermediary\nextendable\tfield\tpkg/A\tdoX\tI\n";
    let class = sample_class();
    write_jar(&jar, &[("pkg/A.class", &class), ("bad.accesswidener", bad)]);
    let mappings = write_mappings(dir.path());

    let abort = RunConfig {
        sidecar_policy: SidecarPolicy::Abort,
        ..RunConfig::new()
    };
    let before = fs::read(&jar).unwrap();
    let err = remap_with_config(&RemapRequest::new(&jar, &mappings), &abort).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedSidecar);
    assert_eq!(err.entry(), Some("bad.accesswidener"));
    assert_eq!(fs::read(&jar).unwrap(), before);

    let output = remap_with_config(&RemapRequest::new(&jar, &mappings), &RunConfig::new()).unwrap();
    assert_eq!(output.report.failed_sidecars, vec!["bad.accesswidener".to_string()]);
    let entries = read_jar(&jar);
    assert_eq!(entry(&entries, "bad.accesswidener"), bad.as_slice());
    assert_eq!(method_and_call_names(entry(&entries, "pkg/A.class")).0, vec!["doY"]);
}

#[test]
fn test_structural_failure_leaves_archive_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let jar = dir.path().join("broken.jar");
    write_jar(
        &jar,
        &[("readme.txt", b"hello"), ("pkg/Broken.class", b"\xCA\xFE\xBA\xBE\x00\x00")],
    );
    let before = fs::read(&jar).unwrap();
    let mappings = write_mappings(dir.path());

    let err = remap_with_config(&RemapRequest::new(&jar, &mappings), &RunConfig::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StructuralParse);

    let report = err.to_report();
    assert_eq!(report.entry.as_deref(), Some("pkg/Broken.class"));
    assert_eq!(fs::read(&jar).unwrap(), before);
    assert!(!temp_path(&jar, "_temp").exists());
}

#[test]
fn test_missing_mappings_abort_before_archive() {
    let dir = tempfile::tempdir().unwrap();
    let jar = dir.path().join("example.jar");
    write_sample_jar(&jar);
    let before = fs::read(&jar).unwrap();

    let request = RemapRequest::new(&jar, dir.path().join("absent.tiny"))
        .with_output(dir.path().join("out.jar"));
    let err = remap_with_config(&request, &RunConfig::new()).unwrap_err();

    assert!(matches!(err, SymfixError::MappingsUnavailable { .. }));
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(fs::read(&jar).unwrap(), before);
    assert!(!dir.path().join("out.jar").exists());
}

#[test]
fn test_global_config_api() {
    let dir = tempfile::tempdir().unwrap();
    let jar = dir.path().join("example.jar");
    write_sample_jar(&jar);
    let mappings = write_mappings(dir.path());

    if !is_initialized() {
        init_config(RunConfig::new());
    }
    let output = remap(&RemapRequest::new(&jar, &mappings)).unwrap();
    assert_eq!(output.report.classes_rewritten, 1);
}

#[test]
fn test_failed_run_keeps_previous_output() {
    let dir = tempfile::tempdir().unwrap();
    let jar = dir.path().join("broken.jar");
    write_jar(&jar, &[("pkg/Broken.class", b"\xCA\xFE\xBA\xBE\x00\x00")]);
    let mappings = write_mappings(dir.path());

    let out = dir.path().join("out.jar");
    fs::write(&out, b"previous good output").unwrap();

    let request = RemapRequest::new(&jar, &mappings).with_output(&out);
    let err = remap_with_config(&request, &RunConfig::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StructuralParse);

    assert_eq!(fs::read(&out).unwrap(), b"previous good output");
    assert!(!temp_path(&out, "_temp").exists());
    assert!(!temp_path(&temp_path(&out, "_temp"), "_temp").exists());
}

#[test]
fn test_failed_run_creates_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let jar = dir.path().join("broken.jar");
    write_jar(&jar, &[("pkg/Broken.class", b"\xCA\xFE\xBA\xBE\x00\x00")]);
    let mappings = write_mappings(dir.path());

    let out = dir.path().join("out.jar");
    let request = RemapRequest::new(&jar, &mappings).with_output(&out);
    assert!(remap_with_config(&request, &RunConfig::new()).is_err());

    let left: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert!(!out.exists());
    assert!(left.iter().all(|name| !name.starts_with("out.jar")), "{:?}", left);
}
