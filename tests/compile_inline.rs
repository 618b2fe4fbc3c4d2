use std::io::Write;
use std::process::Command;

fn dorothy() -> Command {
    Command::new(env!("CARGO_BIN_EXE_dorothy"))
}

// --- Inline source: assembly listing ---

#[test]
fn inline_compiles_to_listing() {
    let out = dorothy()
        .arg("func main() { return 0; }")
        .output()
        .expect("failed to run dorothy");
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    let lines: Vec<&str> = stdout.trim().lines().collect();
    // prologue 2 + return 6 + implicit epilogue 6
    assert_eq!(lines.len(), 14);
    assert!(lines[0].ends_with("PUSHR 0 0"), "got: {}", lines[0]);
    assert!(lines[1].ends_with("MOVE 0 1"), "got: {}", lines[1]);
    assert!(lines[2].ends_with("PUSHI 0 0"), "got: {}", lines[2]);
    assert!(lines.last().unwrap().ends_with("RET 0 0"));
}

#[test]
fn inline_recursive_program_compiles() {
    let source = "\
func fact(int n) {
  if (n < 2) {
    return 1;
  }
  return n * fact(n - 1);
}";
    let out = dorothy().arg(source).output().expect("failed to run dorothy");
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    // Self-recursion resolves to the function's own entry, 0 + 3.
    assert!(stdout.contains("CALL 3 0"), "expected CALL 3 0 in:\n{stdout}");
}

// --- Inline source: other emit modes ---

#[test]
fn inline_emit_ast_prints_json() {
    let out = dorothy()
        .args(["func main() { return 0; }", "--emit", "ast"])
        .output()
        .expect("failed to run dorothy");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("invalid JSON");
    assert_eq!(json["functions"][0]["name"], "main");
}

#[test]
fn inline_emit_fmt_round_trips() {
    let source = "func f(int x){while(x>0){x=x-1;}return x;}";
    let out = dorothy()
        .args([source, "--emit", "fmt"])
        .output()
        .expect("failed to run dorothy");
    assert!(out.status.success());
    let formatted = String::from_utf8_lossy(&out.stdout).to_string();
    // Feeding the formatter's output back in yields the same text.
    let again = dorothy()
        .args([formatted.trim_end(), "--emit", "fmt"])
        .output()
        .expect("failed to run dorothy");
    assert!(again.status.success());
    assert_eq!(String::from_utf8_lossy(&again.stdout), formatted);
}

// --- File input ---

#[test]
fn file_input_compiles() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prog.dor");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "func main() {{ int x; x = 6 * 7; return x; }}").unwrap();
    let out = dorothy().arg(path.to_str().unwrap()).output().expect("failed to run dorothy");
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("MUL 0 0"), "expected MUL in:\n{stdout}");
}

// --- Error reporting ---

#[test]
fn compile_error_reports_and_fails() {
    let out = dorothy()
        .arg("func f() { g(); }")
        .output()
        .expect("failed to run dorothy");
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("undefined function: g"), "stderr:\n{stderr}");
}

#[test]
fn parse_error_points_at_offending_token() {
    let out = dorothy()
        .arg("func f() { return 1 }")
        .output()
        .expect("failed to run dorothy");
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("error:"), "stderr:\n{stderr}");
    assert!(stderr.contains("-->"), "expected location marker in:\n{stderr}");
}

#[test]
fn lex_error_reports_snippet() {
    let out = dorothy()
        .arg("func f() { return $; }")
        .output()
        .expect("failed to run dorothy");
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("unexpected token '$'"), "stderr:\n{stderr}");
}
