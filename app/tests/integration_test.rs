use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

use lasr_lang_asr::builder::{self, FunctionBuilder};
use lasr_lang_asr::{ArrayIndex, Asr, SymbolId, Ttype};
use lasr_lang_modfile::serialize_module;

fn lasr_cmd() -> Command {
    cargo_bin_cmd!("lasr")
}

/// Modfiles of `base` and of `vectors`, which uses `base` and has a subroutine
/// assigning an array section.
fn write_modules(dir: &Path, names: &[&str]) {
    let mut asr = Asr::new();
    let base = builder::add_module(&mut asr, "base", &[]).unwrap();
    let vectors = builder::add_module(&mut asr, "vectors", &["base"]).unwrap();
    let scope = asr.symbol(vectors).symtab().unwrap();
    let y_ty = builder::array_of(&mut asr, Ttype::real(), &[10]);
    let y = builder::add_variable(&mut asr, scope, "y", y_ty).unwrap();
    let x_ty = builder::array_of(&mut asr, Ttype::real(), &[4]);
    let shift = FunctionBuilder::new(&mut asr, scope, "shift").local("x", x_ty).finish().unwrap();
    let shift_scope = asr.symbol(shift).symtab().unwrap();
    let x = asr.symtab(shift_scope).get("x").unwrap();
    let (x, y) = (asr.var(x), asr.var(y));
    let (lo, hi) = (asr.int(2), asr.int(5));
    let section = asr.section(y, vec![ArrayIndex { left: Some(lo), right: Some(hi), step: None }]);
    let assign = asr.assign(x, section);
    builder::push_stmt(&mut asr, shift, assign);

    let modules: [(&str, SymbolId); 2] = [("base", base), ("vectors", vectors)];
    for (name, module) in modules {
        if names.contains(&name) {
            let text = serialize_module(&asr, module).unwrap();
            std::fs::write(dir.join(format!("{name}.mod")), text).unwrap();
        }
    }
}

fn modules(names: &[&str]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    write_modules(dir.path(), names);
    let vectors = dir.path().join("vectors.mod");
    (dir, vectors)
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    String::from_utf8(output.stdout).unwrap()
}

/// Check that "lasr --version" works correctly
#[test]
fn version_command() {
    let assert = lasr_cmd().arg("--version").assert();
    assert.success().stdout("lasr 0.1.0\n");
}

/// Check that "lasr passes" lists the default pipeline
#[test]
fn passes_command() {
    let assert = lasr_cmd().arg("passes").assert();
    assert.success().stdout(
        "global_stmts\ninstantiate_template\nimplied_do_loops\nclass_constructor\nwhere\n\
         arr_slice\nprint_list_tuple\nprint_arr\n",
    );
}

#[test]
fn passes_command_fast() {
    let stdout = stdout_of(lasr_cmd().args(["passes", "--fast"]));
    let passes: Vec<&str> = stdout.lines().collect();
    assert_eq!(passes.len(), 11);
    assert_eq!(passes.last(), Some(&"unused_functions"));
}

/// Check that "lasr verify" works correctly
#[test]
fn verify_command() {
    let (_dir, vectors) = modules(&["base", "vectors"]);
    let assert = lasr_cmd().arg("verify").arg(&vectors).assert();
    assert.success().stdout(format!("{} verified successfully!\n", vectors.display()));
}

#[test]
fn verify_reports_missing_modules() {
    let (_dir, vectors) = modules(&["vectors"]);
    lasr_cmd().arg("verify").arg(&vectors).assert().failure().code(1);
    lasr_cmd().arg("verify").arg(&vectors).arg("--no-external").assert().success();
}

#[test]
fn used_modules_are_found_through_include_dirs() {
    let (_dir, vectors) = modules(&["vectors"]);
    let lib = tempfile::tempdir().unwrap();
    write_modules(lib.path(), &["base"]);
    let mut cmd = lasr_cmd();
    cmd.arg("deps").arg(&vectors).arg("-I").arg(lib.path());
    assert_eq!(stdout_of(&mut cmd), "base\nvectors\n");
}

/// Check that "lasr run" lowers the array section into a loop
#[test]
fn run_command() {
    let (_dir, vectors) = modules(&["base", "vectors"]);
    let stdout = stdout_of(lasr_cmd().arg("run").arg(&vectors));
    assert!(stdout.contains("DoLoop"));
    assert!(!stdout.contains("ArraySection"));
}

#[test]
fn run_command_skipping_the_slice_pass() {
    let (_dir, vectors) = modules(&["base", "vectors"]);
    let stdout = stdout_of(lasr_cmd().arg("run").arg(&vectors).args(["--skip-pass", "arr_slice"]));
    assert!(stdout.contains("ArraySection"));
}

#[test]
fn run_command_dumps_every_pass() {
    let (_dir, vectors) = modules(&["base", "vectors"]);
    let stdout = stdout_of(
        lasr_cmd().arg("run").arg(&vectors).args(["--pass", "where,arr_slice", "--dump-all-passes"]),
    );
    assert!(stdout.contains("// pass_01_where"));
    assert!(stdout.contains("// pass_02_arr_slice"));
}

#[test]
fn unknown_pass_is_an_error() {
    let (_dir, vectors) = modules(&["base", "vectors"]);
    lasr_cmd().arg("run").arg(&vectors).args(["--pass", "no_such_pass"]).assert().failure().code(1);
}

/// A malformed tree is a bug of whoever wrote it, reported as an internal error
#[test]
fn malformed_modfile_is_an_internal_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut asr = Asr::new();
    let module = builder::add_module(&mut asr, "broken", &["not a name"]).unwrap();
    let path = dir.path().join("broken.mod");
    std::fs::write(&path, serialize_module(&asr, module).unwrap()).unwrap();

    lasr_cmd().arg("verify").arg(&path).arg("--no-external").assert().failure().code(101);
}
