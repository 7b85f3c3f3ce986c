//! CLI integration tests for Keel.
//!
//! None of these run a compiler: the toolchain is pinned through
//! `.keel/toolchain.toml` and builds are planned with `--dry-run`.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the keel binary command, isolated from compiler overrides in the
/// caller's environment.
fn keel() -> Command {
    let mut cmd = Command::cargo_bin("keel").unwrap();
    for var in ["CC", "CXX", "FC", "AR"] {
        cmd.env_remove(var);
    }
    cmd
}

/// Create a temporary directory for test projects.
fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// A two-target project with the GCC toolchain pinned for Linux.
fn gcc_project() -> TempDir {
    let tmp = temp_dir();
    write(
        tmp.path(),
        "Keel.toml",
        r#"
[project]
name = "demo"
version = "1.2.0"

[targets.app]
kind = "exe"
sources = ["src/*.c"]
include = ["include"]

[targets.util]
kind = "staticlib"
sources = ["util/*.c"]
"#,
    );
    write(tmp.path(), "include/demo.h", "#pragma once\n");
    write(tmp.path(), "src/main.c", "#include \"demo.h\"\nint main(void) { return 0; }\n");
    write(tmp.path(), "util/util.c", "int util(void) { return 1; }\n");
    write(
        tmp.path(),
        ".keel/toolchain.toml",
        "[toolchain]\nvendor = \"gcc\"\nplatform = \"linux\"\n",
    );
    tmp
}

// ============================================================================
// keel scan
// ============================================================================

#[test]
fn test_scan_lists_includes_in_order() {
    let tmp = temp_dir();
    write(
        tmp.path(),
        "a.c",
        "#include <stdio.h>\n/* #include \"hidden.h\" */\n#  include \"local.h\"\n",
    );

    keel()
        .args(["scan", "a.c"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout("<stdio.h>\n\"local.h\"\n");
}

#[test]
fn test_scan_fortran_by_extension() {
    let tmp = temp_dir();
    write(tmp.path(), "solver.f90", "      include 'params.inc'\n      end\n");

    keel()
        .args(["scan", "solver.f90"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("params.inc"));
}

#[test]
fn test_scan_missing_file_fails() {
    let tmp = temp_dir();

    keel()
        .args(["scan", "nope.c"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}

// ============================================================================
// keel deps
// ============================================================================

#[test]
fn test_deps_prints_transitive_closure() {
    let tmp = temp_dir();
    write(tmp.path(), "src/main.c", "#include \"a.h\"\n");
    write(tmp.path(), "inc/a.h", "#include <b.h>\n");
    write(tmp.path(), "inc/b.h", "#include \"missing.h\"\n");

    keel()
        .args(["deps", "src/main.c", "-I", "inc", "--unresolved"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("a.h"))
        .stdout(predicate::str::contains("b.h"))
        .stdout(predicate::str::contains("unresolved \"missing.h\""));
}

#[test]
fn test_deps_without_search_path_finds_nothing_angled() {
    let tmp = temp_dir();
    write(tmp.path(), "main.c", "#include <a.h>\n");
    write(tmp.path(), "a.h", "\n");

    keel()
        .args(["deps", "main.c"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout("");
}

// ============================================================================
// keel flags
// ============================================================================

#[test]
fn test_flags_gcc_compile() {
    keel()
        .args([
            "flags", "--vendor", "gcc", "--platform", "linux", "-D", "LEVEL=2", "-U", "NDEBUG",
            "-I", "include", "-g", "a.c",
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("-c"))
        .stdout(predicate::str::contains("-DLEVEL=2"))
        .stdout(predicate::str::contains("-UNDEBUG"))
        .stdout(predicate::str::contains("-Iinclude"))
        .stdout(predicate::str::contains("a.c"));
}

#[test]
fn test_flags_msvc_shared_link() {
    keel()
        .args([
            "flags", "--vendor", "msvc", "--platform", "windows", "--kind", "shared", "a.obj",
            "b.obj",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("/DLL"))
        .stdout(predicate::str::contains("a.obj"));
}

#[test]
fn test_flags_negative_warning_level_clamps_to_zero() {
    keel()
        .args([
            "flags", "--vendor", "gcc", "--platform", "linux", "--warnings", "-1", "a.c",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("-w"));
}

#[test]
fn test_flags_rejects_unknown_vendor() {
    keel()
        .args(["flags", "--vendor", "tcc", "a.c"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown vendor `tcc`"));
}

#[test]
fn test_flags_rejects_bad_define() {
    keel()
        .args(["flags", "-D", "BAD NAME", "a.c"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid macro name"));
}

// ============================================================================
// keel build
// ============================================================================

#[test]
fn test_build_dry_run_prints_commands() {
    let tmp = gcc_project();

    keel()
        .args(["build", "--dry-run"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("gcc -c"))
        .stdout(predicate::str::contains("src/main.c"))
        .stdout(predicate::str::contains("ar rcs"));

    // A dry run leaves no state behind.
    assert!(!tmp.path().join(".keel/history.json").exists());
    assert!(!tmp.path().join("target").exists());
}

#[test]
fn test_build_dry_run_single_target() {
    let tmp = gcc_project();

    keel()
        .args(["build", "--dry-run", "--target", "util"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("util.c"))
        .stdout(predicate::str::contains("main.c").not());
}

#[test]
fn test_build_unknown_target() {
    let tmp = gcc_project();

    keel()
        .args(["build", "--dry-run", "--target", "nope"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "unknown target `nope`, available targets: app, util",
        ));
}

#[test]
fn test_build_emits_compile_commands() {
    let tmp = gcc_project();

    keel()
        .args(["build", "--dry-run", "--emit-compile-commands"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let db = fs::read_to_string(tmp.path().join(".keel/compile_commands.json")).unwrap();
    assert!(db.contains("main.c"));
    assert!(db.contains("util.c"));
}

#[test]
fn test_build_fails_without_manifest() {
    let tmp = temp_dir();

    keel()
        .arg("build")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not find Keel.toml"));
}

// ============================================================================
// keel explain
// ============================================================================

#[test]
fn test_explain_reports_missing_outputs() {
    let tmp = gcc_project();

    keel()
        .arg("explain")
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("app (executable)"))
        .stdout(predicate::str::contains("util (static library)"))
        .stdout(predicate::str::contains("output missing"));
}

// ============================================================================
// keel clean
// ============================================================================

#[test]
fn test_clean_keeps_toolchain_config() {
    let tmp = gcc_project();
    write(tmp.path(), "target/debug/app", "");
    write(tmp.path(), ".keel/deps.json", "{}");

    keel()
        .args(["clean", "--caches"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Removed"));

    assert!(!tmp.path().join("target").exists());
    assert!(!tmp.path().join(".keel/deps.json").exists());
    assert!(tmp.path().join(".keel/toolchain.toml").exists());
}

#[test]
fn test_clean_single_profile() {
    let tmp = gcc_project();
    write(tmp.path(), "target/debug/app", "");
    write(tmp.path(), "target/release/app", "");

    keel()
        .args(["clean", "--release"])
        .current_dir(tmp.path())
        .assert()
        .success();

    assert!(tmp.path().join("target/debug/app").exists());
    assert!(!tmp.path().join("target/release").exists());
}

// ============================================================================
// keel toolchain
// ============================================================================

#[test]
fn test_toolchain_show_configured_vendor() {
    let tmp = temp_dir();
    write(
        tmp.path(),
        ".keel/toolchain.toml",
        "[toolchain]\nvendor = \"msvc\"\nplatform = \"windows\"\n",
    );

    keel()
        .args(["toolchain", "show"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Vendor:   msvc"))
        .stdout(predicate::str::contains("Platform: windows"))
        .stdout(predicate::str::contains("lib"));
}

#[test]
fn test_toolchain_override_writes_config() {
    let tmp = temp_dir();

    keel()
        .args(["toolchain", "override", "--vendor", "clang", "--ar", "llvm-ar"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let config = fs::read_to_string(tmp.path().join(".keel/toolchain.toml")).unwrap();
    assert!(config.contains("vendor = \"clang\""));
    assert!(config.contains("ar = \"llvm-ar\""));
}

#[test]
fn test_toolchain_override_requires_a_setting() {
    let tmp = temp_dir();

    keel()
        .args(["toolchain", "override"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("nothing to override"));
}

// ============================================================================
// keel completions
// ============================================================================

#[test]
fn test_completions_bash() {
    keel()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("keel"));
}
