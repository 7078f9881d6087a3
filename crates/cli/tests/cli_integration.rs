//! End-to-end tests for the `lt` binary
//!
//! Every test runs with its own config file and state directory.

#[allow(dead_code)]
mod common;

use common::TestEnv;

#[test]
fn test_config_example() {
    let env = TestEnv::new();
    let result = env.lt(&["config", "example"]).assert_success().unwrap();

    assert!(result.contains_stdout("[session]"));
    assert!(result.contains_stdout("debounce_ms = 300"));
    assert!(result.contains_stdout("[tracer]"));
}

#[test]
fn test_config_set_then_get() {
    let env = TestEnv::new();

    env.lt(&["config", "set", "session.debounce_ms", "150"])
        .assert_success()
        .unwrap();
    assert!(env.config_path().exists());

    let result = env.lt(&["config", "get", "session.debounce_ms"])
        .assert_success()
        .unwrap();
    assert_eq!(result.stdout.trim(), "150");

    // Untouched keys keep their defaults
    let result = env.lt(&["config", "get", "tracer.module"])
        .assert_success()
        .unwrap();
    assert_eq!(result.stdout.trim(), "code_tracer");
}

#[test]
fn test_config_rejects_out_of_range() {
    let env = TestEnv::new();

    let result = env.lt(&["config", "set", "session.debounce_ms", "5"])
        .assert_failure()
        .unwrap();
    assert!(result.contains_stderr("debounce_ms"));
    assert!(!env.config_path().exists());
}

#[test]
fn test_config_unknown_key() {
    let env = TestEnv::new();
    let result = env.lt(&["config", "get", "session.nope"])
        .assert_failure()
        .unwrap();
    assert!(result.contains_stderr("Unknown config key"));
}

#[test]
fn test_config_path_create() {
    let env = TestEnv::new();

    let result = env.lt(&["config", "path"]).assert_success().unwrap();
    assert!(result.contains_stdout("does not exist"));

    env.lt(&["config", "path", "--create"]).assert_success().unwrap();
    let written = std::fs::read_to_string(env.config_path()).unwrap();
    assert!(written.contains("kill_grace_ms"));
}

#[test]
fn test_run_missing_source() {
    let env = TestEnv::new();
    let result = env.lt(&["run", "missing.py"]).assert_failure().unwrap();
    assert!(result.contains_stderr("not found"));
}

#[test]
fn test_run_missing_interpreter() {
    let env = TestEnv::new();
    env.write_file("main.py", "x = 1\n");
    env.lt(&["config", "set", "tracer.interpreter", "lt-no-such-interpreter"])
        .assert_success()
        .unwrap();

    let result = env.lt(&["run", "main.py"]).assert_failure().unwrap();
    assert!(result.contains_stderr("lt-no-such-interpreter"));
}

#[test]
fn test_status_without_session() {
    let env = TestEnv::new();
    env.write_file("main.py", "x = 1\n");

    let result = env.lt(&["status", "main.py"]).assert_success().unwrap();
    assert!(result.contains_stdout("Not running"));
}

#[cfg(unix)]
mod unix {
    use super::common::cli::wait_until;
    use super::common::TestEnv;
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;
    use std::time::Duration;

    fn use_interpreter(env: &TestEnv, body: &str) {
        let interpreter = env.fake_interpreter(body).to_string_lossy().into_owned();
        env.lt(&["config", "set", "tracer.interpreter", interpreter.as_str()])
            .assert_success()
            .unwrap();
    }

    #[test]
    fn test_run_prints_trace() {
        let env = TestEnv::new();
        env.write_file("main.py", "x = 1\n");
        use_interpreter(&env, "printf 'traced: '\nexec cat");

        let result = env.lt(&["run", "main.py"]).assert_success().unwrap();
        assert_eq!(result.stdout, "traced: x = 1\n");
    }

    #[test]
    fn test_run_passes_module_and_driver() {
        let env = TestEnv::new();
        env.write_file("main.py", "x = 1\n");
        env.write_file("driver.py", "import main\n");
        use_interpreter(&env, "cat >/dev/null\nprintf '%s\\n' \"$@\"");

        let result = env.lt(&["run", "main.py"]).assert_success().unwrap();
        assert_eq!(result.stdout, "-m\ncode_tracer\n");

        let result = env.lt(&["run", "main.py", "--driver", "driver.py", "--", "--fast"])
            .assert_success()
            .unwrap();
        let args: Vec<&str> = result.stdout.lines().collect();
        assert_eq!(args[..3], ["-m", "code_tracer", "--bad_driver"]);
        assert!(args[3].contains("driver.py doesn't call the main module"));
        assert_eq!(args[4..], ["-", "main", "driver.py", "--fast"]);
    }

    #[test]
    fn test_run_stderr_is_not_failure() {
        let env = TestEnv::new();
        env.write_file("main.py", "x = 1\n");
        use_interpreter(&env, "cat >/dev/null\necho 'partial'\necho 'Traceback' >&2\nexit 1");

        let result = env.lt(&["run", "main.py"]).assert_success().unwrap();
        assert_eq!(result.stdout, "partial\n");
        assert!(result.contains_stderr("Traceback"));
    }

    #[test]
    fn test_watch_traces_edits_until_interrupted() {
        let env = TestEnv::new();
        let source = env.write_file("main.py", "x = 1\n");
        let output = env.root().join("trace.txt");
        use_interpreter(&env, "printf 'traced: '\nexec cat");

        let mut child = env
            .lt(&["watch", "main.py", "--output", "trace.txt", "--debounce-ms", "50"])
            .spawn()
            .unwrap();

        let read_output = || std::fs::read_to_string(&output).unwrap_or_default();

        // Initial trace, without waiting for an edit
        assert!(wait_until(Duration::from_secs(10), || read_output() == "traced: x = 1\n"));

        // The session holds the file's lock
        let status = env.lt(&["status", "main.py"]).assert_success().unwrap();
        assert!(status.contains_stdout("Running"));

        std::fs::write(&source, "x = 2\n").unwrap();
        assert!(wait_until(Duration::from_secs(10), || read_output() == "traced: x = 2\n"));

        kill(Pid::from_raw(child.id() as i32), Signal::SIGINT).unwrap();
        let exit = child.wait().unwrap();
        assert!(exit.success());

        let status = env.lt(&["status", "main.py"]).assert_success().unwrap();
        assert!(status.contains_stdout("Not running"));
    }

    #[test]
    fn test_watch_skips_identical_rewrite() {
        use std::os::unix::fs::MetadataExt;

        let env = TestEnv::new();
        let source = env.write_file("main.py", "x = 1\n");
        let output = env.root().join("trace.txt");
        use_interpreter(&env, "printf 'traced: '\nexec cat");

        let mut child = env
            .lt(&["watch", "main.py", "--output", "trace.txt", "--debounce-ms", "50"])
            .spawn()
            .unwrap();

        let read_output = || std::fs::read_to_string(&output).unwrap_or_default();
        assert!(wait_until(Duration::from_secs(10), || read_output() == "traced: x = 1\n"));
        let before = std::fs::metadata(&output).unwrap();

        // Same bytes again: no new run, so the output is never replaced
        std::fs::write(&source, "x = 1\n").unwrap();
        std::thread::sleep(Duration::from_millis(800));
        let after = std::fs::metadata(&output).unwrap();
        assert_eq!(after.ino(), before.ino());
        assert_eq!(after.modified().unwrap(), before.modified().unwrap());

        // The session is still live for real edits
        std::fs::write(&source, "x = 3\n").unwrap();
        assert!(wait_until(Duration::from_secs(10), || read_output() == "traced: x = 3\n"));

        kill(Pid::from_raw(child.id() as i32), Signal::SIGINT).unwrap();
        assert!(child.wait().unwrap().success());
    }
}
