use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};

use tempfile::TempDir;

fn minish(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_minish"));
    cmd.current_dir(dir)
        .env_remove("RUST_LOG")
        .env_remove("MINISH_CONFIG")
        .env("HOME", dir);
    cmd
}

fn run_c(dir: &Path, line: &str) -> Output {
    minish(dir).arg("-c").arg(line).output().unwrap()
}

fn run_script(dir: &Path, script: impl AsRef<[u8]>) -> Output {
    let mut child = minish(dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(script.as_ref())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn test_simple_command() {
    let dir = TempDir::new().unwrap();
    let out = run_c(dir.path(), "echo hello 'big world'");
    assert_eq!(stdout(&out), "hello big world\n");
    assert_eq!(out.status.code(), Some(0));
}

#[test]
fn test_output_redirect_truncates_then_appends() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("out.txt"), "stale\n").unwrap();
    let out = run_c(dir.path(), "echo one > out.txt; echo two >> out.txt");
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(stdout(&out), "");
    assert_eq!(
        fs::read_to_string(dir.path().join("out.txt")).unwrap(),
        "one\ntwo\n"
    );
}

#[test]
fn test_input_redirect() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("in.txt"), "b\na\nb\n").unwrap();
    let out = run_c(dir.path(), "sort < in.txt | uniq");
    assert_eq!(stdout(&out), "a\nb\n");
}

#[test]
fn test_last_redirect_wins() {
    let dir = TempDir::new().unwrap();
    let out = run_c(dir.path(), "echo hi > first.txt > second.txt");
    assert_eq!(out.status.code(), Some(0));
    assert!(!dir.path().join("first.txt").exists());
    assert_eq!(
        fs::read_to_string(dir.path().join("second.txt")).unwrap(),
        "hi\n"
    );
}

#[test]
fn test_missing_input_file() {
    let dir = TempDir::new().unwrap();
    let out = run_c(dir.path(), "cat < missing.txt");
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("missing.txt"), "{}", stderr(&out));
}

#[test]
fn test_pipeline_chain() {
    let dir = TempDir::new().unwrap();
    let out = run_c(dir.path(), "printf 'x\\ny\\nz\\n' | cat | wc -l");
    assert_eq!(stdout(&out).trim(), "3");
}

#[test]
fn test_pipeline_status_is_last_stage() {
    let dir = TempDir::new().unwrap();
    assert_eq!(run_c(dir.path(), "false | true").status.code(), Some(0));
    assert_eq!(run_c(dir.path(), "true | false").status.code(), Some(1));
}

#[test]
fn test_and_or_short_circuit() {
    let dir = TempDir::new().unwrap();
    let out = run_c(dir.path(), "false && echo no; true && echo yes; false || echo fallback");
    assert_eq!(stdout(&out), "yes\nfallback\n");
    assert_eq!(out.status.code(), Some(0));

    let out = run_c(dir.path(), "true || echo skipped");
    assert_eq!(stdout(&out), "");
}

#[test]
fn test_command_not_found() {
    let dir = TempDir::new().unwrap();
    let out = run_c(dir.path(), "no-such-program-xyz || echo fallback");
    assert_eq!(stdout(&out), "fallback\n");
    assert!(stderr(&out).contains("no-such-program-xyz: command not found"));

    let out = run_c(dir.path(), "no-such-program-xyz");
    assert_eq!(out.status.code(), Some(127));
}

#[test]
fn test_signal_death_status() {
    let dir = TempDir::new().unwrap();
    let out = run_c(dir.path(), "sh -c 'kill -TERM $$'");
    assert_eq!(out.status.code(), Some(128 + 15));
}

#[test]
fn test_cd_changes_shell_directory() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    let out = run_c(dir.path(), "cd sub && pwd");
    let expected = dir.path().join("sub").canonicalize().unwrap();
    assert_eq!(
        Path::new(stdout(&out).trim()).canonicalize().unwrap(),
        expected
    );
}

#[test]
fn test_cd_failure_keeps_directory() {
    let dir = TempDir::new().unwrap();
    let out = run_c(dir.path(), "cd nowhere; pwd");
    assert!(stderr(&out).contains("cd: nowhere"));
    assert_eq!(
        Path::new(stdout(&out).trim()).canonicalize().unwrap(),
        dir.path().canonicalize().unwrap()
    );

    let out = run_c(dir.path(), "cd nowhere");
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn test_cd_without_argument_goes_home() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    let out = minish(&dir.path().join("sub"))
        .env("HOME", dir.path())
        .arg("-c")
        .arg("cd; pwd")
        .output()
        .unwrap();
    assert_eq!(
        Path::new(stdout(&out).trim()).canonicalize().unwrap(),
        dir.path().canonicalize().unwrap()
    );
}

#[test]
fn test_subshell_isolates_directory() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    let out = run_c(dir.path(), "(cd sub; pwd); pwd");
    let text = stdout(&out);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2, "{:?}", lines);
    assert_eq!(
        Path::new(lines[0]).canonicalize().unwrap(),
        dir.path().join("sub").canonicalize().unwrap()
    );
    assert_eq!(
        Path::new(lines[1]).canonicalize().unwrap(),
        dir.path().canonicalize().unwrap()
    );
}

#[test]
fn test_subshell_output_is_redirectable_through_pipe() {
    let dir = TempDir::new().unwrap();
    let out = run_c(dir.path(), "(echo a; echo b) | wc -l");
    assert_eq!(stdout(&out).trim(), "2");
}

#[test]
fn test_exit_inside_subshell_only_ends_subshell() {
    let dir = TempDir::new().unwrap();
    let out = run_c(dir.path(), "(exit 4) || echo after");
    assert_eq!(stdout(&out), "after\n");
    assert_eq!(out.status.code(), Some(0));
}

#[test]
fn test_background_returns_immediately() {
    let dir = TempDir::new().unwrap();
    let started = Instant::now();
    let status = minish(dir.path())
        .arg("-c")
        .arg("sleep 3 &")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(0));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn test_background_job_is_reported_when_done() {
    let dir = TempDir::new().unwrap();
    let out = run_script(dir.path(), "true &\nsleep 1\necho next\n");
    let text = stdout(&out);
    assert!(text.starts_with("[1] "), "{}", text);
    assert!(text.contains("Done"), "{}", text);
    assert!(text.ends_with("next\n"), "{}", text);
}

#[test]
fn test_script_keeps_going_after_errors() {
    let dir = TempDir::new().unwrap();
    let out = run_script(dir.path(), "echo 'unterminated\nls |\n\necho ok\n");
    assert_eq!(stdout(&out), "ok\n");
    let err = stderr(&out);
    assert!(err.contains("syntax error"), "{}", err);
    assert_eq!(out.status.code(), Some(0));
}

#[test]
fn test_invalid_utf8_line_is_skipped() {
    let dir = TempDir::new().unwrap();
    let out = run_script(dir.path(), b"echo \xff\necho ok\n");
    assert_eq!(stdout(&out), "ok\n");
    let err = stderr(&out);
    assert!(err.contains("not valid UTF-8"), "{}", err);
    assert_eq!(out.status.code(), Some(0));

    let out = run_script(dir.path(), b"echo ok\necho \xff\n");
    assert_eq!(stdout(&out), "ok\n");
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn test_quoted_backslash_reaches_command() {
    let dir = TempDir::new().unwrap();
    let out = run_c(dir.path(), "printf 'a\\tb\\n'");
    assert_eq!(stdout(&out), "a\tb\n");
}

#[test]
fn test_syntax_error_status() {
    let dir = TempDir::new().unwrap();
    let out = run_c(dir.path(), "ls && || ls");
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("syntax error"));
}

#[test]
fn test_exit_stops_script() {
    let dir = TempDir::new().unwrap();
    let out = run_script(dir.path(), "echo before\nexit 3\necho after\n");
    assert_eq!(stdout(&out), "before\n");
    assert_eq!(out.status.code(), Some(3));
}

#[test]
fn test_commands_read_rest_of_script() {
    let dir = TempDir::new().unwrap();
    let out = run_script(
        dir.path(),
        "sh -c 'read line; echo got $line'\nfrom stdin\necho done\n",
    );
    assert_eq!(stdout(&out), "got from stdin\ndone\n");
}

#[test]
fn test_builtin_output_redirect() {
    let dir = TempDir::new().unwrap();
    let out = run_c(dir.path(), "help > help.txt; echo back");
    assert_eq!(stdout(&out), "back\n");
    let help = fs::read_to_string(dir.path().join("help.txt")).unwrap();
    assert!(help.contains("cd [DIR]"));
}

#[test]
fn test_dump_ast() {
    let dir = TempDir::new().unwrap();
    let out = minish(dir.path())
        .args(["--dump-ast", "-c", "cat < in | sort && echo done"])
        .output()
        .unwrap();
    assert_eq!(
        stdout(&out),
        "AND\n  PIPE\n    COMMAND: cat < in\n    COMMAND: sort\n  COMMAND: echo done\n"
    );
}

#[test]
fn test_config_file_prompt_is_hidden_without_terminal() {
    let dir = TempDir::new().unwrap();
    let conf = dir.path().join("minish.conf");
    fs::write(&conf, "prompt=PROMPT> \nnotify_jobs=false\n").unwrap();
    let mut child = minish(dir.path())
        .arg("--config")
        .arg(&conf)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(b"echo hi\n").unwrap();
    let out = child.wait_with_output().unwrap();
    assert_eq!(stdout(&out), "hi\n");
}

#[test]
fn test_bad_config_file() {
    let dir = TempDir::new().unwrap();
    let conf = dir.path().join("bad.conf");
    fs::write(&conf, "colour=blue\n").unwrap();
    let out = minish(dir.path())
        .arg("--config")
        .arg(&conf)
        .args(["-c", "echo hi"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("unknown key: colour"));
}
