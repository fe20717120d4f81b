//! End-to-end tests for the interception engine.
//!
//! These tests drive the full pipeline with real side effects: shell
//! commands that create files, an observable in-memory SQL backend, and a
//! code runtime that writes files on request. Each test asserts both the
//! returned value and whether the side effect actually happened.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use callguard::web::DemoRuntime;
use callguard::{
    activate, bootstrap, configure, deactivate, registry, set_code_runtime, set_sql_backend,
    CallSite, MemoryBackend, Settings, Signature, Strategy,
};

// The policy store and provider table are process-global; every test
// takes this lock and installs its own settings.
static POLICY_LOCK: Mutex<()> = Mutex::new(());

fn setup() -> MutexGuard<'static, ()> {
    static INIT: OnceLock<()> = OnceLock::new();
    INIT.get_or_init(|| {
        // Register original providers before the first activation so the
        // originals snapshot captures them.
        set_sql_backend(Arc::new(MemoryBackend::with_rows(vec![
            vec!["1".to_string(), "test_instance_1".to_string()],
            vec!["2".to_string(), "test_instance_2".to_string()],
        ])));
        set_code_runtime(Arc::new(DemoRuntime));
        activate();
    });
    POLICY_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

fn scratch(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("callguard_it_{name}"));
    let _ = std::fs::remove_file(&path);
    path
}

// Call sites in this file live under tests/, so "tests" is the app root.
fn app_settings() -> Settings {
    Settings::new("tests")
}

#[test]
fn deactivated_engine_lets_the_real_command_run() {
    let _guard = setup();
    configure(app_settings().strategy_for_all(Strategy::blocking()));

    deactivate();
    let path = scratch("allow");
    let command = format!("echo test_os > {}", path.display());
    let status = callguard::system!(command.as_str()).unwrap();
    activate();

    assert_eq!(status, 0);
    assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "test_os");
    let _ = std::fs::remove_file(&path);
}

#[test]
fn default_strategy_neutralizes_shell_execution() {
    let _guard = setup();
    configure(app_settings());

    let path = scratch("nullify");
    let command = format!("echo test_os > {}", path.display());
    let status = callguard::system!(command.as_str()).unwrap();

    // Success status, but the command never ran.
    assert_eq!(status, 0);
    assert!(!path.exists());
}

#[test]
fn blocking_strategy_refuses_shell_execution() {
    let _guard = setup();
    configure(app_settings().strategy(Signature::ShellSystem, Strategy::blocking()));

    let path = scratch("block");
    let command = format!("echo test_os > {}", path.display());
    let err = callguard::system!(command.as_str()).unwrap_err();

    assert!(err.is_blocked());
    assert!(!path.exists());
    // The error names the call site, never the command line.
    let message = err.to_string();
    assert!(message.contains("shell.system"));
    assert!(message.contains("tests/integration_test.rs"));
    assert!(!message.contains("echo test_os"));
}

#[test]
fn blocking_strategy_refuses_popen() {
    let _guard = setup();
    configure(app_settings().strategy(Signature::ShellPopen, Strategy::blocking()));

    let path = scratch("popen_block");
    let command = format!("echo test_os > {}", path.display());
    let err = callguard::popen!(command.as_str()).unwrap_err();

    assert!(err.is_blocked());
    assert!(err.to_string().contains("shell.popen"));
    assert!(!path.exists());
}

#[test]
fn blocking_strategy_refuses_spawn() {
    let _guard = setup();
    configure(app_settings().strategy(Signature::ProcessSpawn, Strategy::blocking()));

    let path = scratch("spawn_block");
    let options = callguard::SpawnOptions {
        shell: true,
        capture_stdout: true,
        capture_stderr: false,
    };
    let command = format!("echo test_os > {}", path.display());
    let err = callguard::spawn!(command.as_str(), options).unwrap_err();

    assert!(err.is_blocked());
    assert!(err.to_string().contains("process.spawn"));
    assert!(!path.exists());
}

#[test]
fn neutralized_popen_is_an_empty_well_behaved_pipe() {
    let _guard = setup();
    configure(app_settings());

    let mut pipe = callguard::popen!("echo should_not_appear").unwrap();
    assert_eq!(pipe.read_to_string().unwrap(), "");

    let pipe = callguard::popen!("echo should_not_appear").unwrap();
    assert_eq!(pipe.close().unwrap(), 0);
}

#[test]
fn neutralized_spawn_keeps_the_requested_streams() {
    let _guard = setup();
    configure(app_settings());

    let options = callguard::SpawnOptions {
        shell: true,
        capture_stdout: true,
        capture_stderr: true,
    };
    let mut child = callguard::spawn!("echo should_not_appear", options).unwrap();
    assert!(child.read_stdout().unwrap().is_empty());
    assert!(child.read_stderr().unwrap().is_empty());
    assert_eq!(child.wait().unwrap(), 0);
}

#[test]
fn neutralized_check_output_is_empty() {
    let _guard = setup();
    configure(app_settings());

    let bytes = callguard::check_output!("echo should_not_appear").unwrap();
    assert!(bytes.is_empty());
}

#[test]
fn raw_sql_is_neutralized_then_restored() {
    let _guard = setup();
    configure(app_settings());

    // Neutralized: no results, backend untouched.
    let rows = callguard::raw_sql!("SELECT * FROM app_testmodel").unwrap();
    assert!(rows.is_none());

    // Deactivated: the registered backend answers.
    deactivate();
    let rows = callguard::raw_sql!("SELECT * FROM app_testmodel")
        .unwrap()
        .expect("rows from the live backend");
    activate();
    assert_eq!(rows[0][1], "test_instance_1");
    assert_eq!(rows[1][1], "test_instance_2");
}

#[test]
fn neutralized_cursor_accepts_the_protocol_and_returns_nothing() {
    let _guard = setup();
    configure(app_settings());

    let rows = callguard::sql_cursor!().unwrap().scope(|cursor| {
        cursor.execute("SELECT * FROM app_testmodel");
        cursor.fetch_all()
    });
    assert!(rows.is_empty());
}

#[test]
fn neutralized_exec_never_reaches_the_runtime() {
    let _guard = setup();
    configure(app_settings());

    let path = scratch("exec");
    let script = format!("write {} test_exec_eval", path.display());
    callguard::exec!(script.as_str()).unwrap();
    assert!(!path.exists());

    // Deactivated, the registered runtime performs the write.
    deactivate();
    callguard::exec!(script.as_str()).unwrap();
    activate();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "test_exec_eval");
    let _ = std::fs::remove_file(&path);
}

#[test]
fn neutralized_eval_returns_nothing() {
    let _guard = setup();
    configure(app_settings());

    assert!(callguard::eval!("6 * 7").unwrap().is_none());

    deactivate();
    let value = callguard::eval!("6 * 7").unwrap();
    activate();
    assert_eq!(value.as_deref(), Some("6 * 7"));
}

#[test]
fn neutralized_mark_safe_renders_escaped() {
    let _guard = setup();
    configure(app_settings());

    let markup = callguard::mark_safe!("<script>alert(1)</script>".to_string()).unwrap();
    assert!(!markup.is_trusted());
    assert_eq!(
        markup.render(),
        "&lt;script&gt;alert(1)&lt;/script&gt;"
    );
}

#[test]
fn blocked_mark_safe_is_an_error() {
    let _guard = setup();
    configure(app_settings().strategy(Signature::MarkSafe, Strategy::blocking()));

    let err = callguard::mark_safe!("<b>x</b>".to_string()).unwrap_err();
    assert!(err.is_blocked());
    assert!(err.to_string().contains("markup.mark_safe"));
}

#[test]
fn bootstrap_scope_defers_even_under_a_blocking_policy() {
    let _guard = setup();
    configure(app_settings().strategy_for_all(Strategy::blocking()));

    let path = scratch("bootstrap");
    let command = format!("echo loaded > {}", path.display());
    let status = bootstrap(|| callguard::system!(command.as_str()).unwrap());

    // The middleware-loading path runs the real primitive.
    assert_eq!(status, 0);
    assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "loaded");
    let _ = std::fs::remove_file(&path);
}

#[test]
fn panicking_bootstrap_does_not_leave_the_guard_set() {
    let _guard = setup();
    configure(app_settings());

    let result = std::panic::catch_unwind(|| {
        bootstrap(|| panic!("middleware exploded"));
    });
    assert!(result.is_err());

    // Interception is back on this thread.
    let path = scratch("after_panic");
    let command = format!("echo test_os > {}", path.display());
    assert_eq!(callguard::system!(command.as_str()).unwrap(), 0);
    assert!(!path.exists());
}

#[test]
fn out_of_scope_call_sites_pass_through() {
    let _guard = setup();
    // An app root this file is not under: these call sites read as
    // framework internals.
    configure(Settings::new("src/app").strategy_for_all(Strategy::blocking()));

    let path = scratch("out_of_scope");
    let command = format!("echo vendored > {}", path.display());
    let status = callguard::system!(command.as_str()).unwrap();

    assert_eq!(status, 0);
    assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "vendored");
    let _ = std::fs::remove_file(&path);
}

#[test]
fn unattributed_calls_pass_through() {
    let _guard = setup();
    configure(app_settings().strategy_for_all(Strategy::blocking()));

    let path = scratch("unattributed");
    let command = format!("echo direct > {}", path.display());
    let status = registry::shell()
        .system(&CallSite::unknown(), &command)
        .unwrap();

    assert_eq!(status, 0);
    assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "direct");
    let _ = std::fs::remove_file(&path);
}

#[test]
fn live_reload_applies_to_the_next_call() {
    let _guard = setup();

    configure(app_settings());
    let status = callguard::system!("echo reload_probe").unwrap();
    assert_eq!(status, 0);

    configure(app_settings().strategy(Signature::ShellSystem, Strategy::blocking()));
    assert!(callguard::system!("echo reload_probe").is_err());

    configure(app_settings());
    assert!(callguard::system!("echo reload_probe").is_ok());
}

mod reporting {
    use super::*;
    use std::io::Write;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap_or_else(PoisonError::into_inner))
                .into_owned()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for SharedBuf {
        type Writer = SharedBuf;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture_warnings(f: impl FnOnce()) -> String {
        let buf = SharedBuf::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(buf.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        buf.contents()
    }

    #[test]
    fn report_strategy_emits_a_warning_with_the_call_site() {
        let _guard = setup();
        configure(app_settings());

        let log = capture_warnings(|| {
            let _ = callguard::system!("echo report_probe");
        });

        assert!(log.contains("shell.system"), "missing signature: {log}");
        assert!(
            log.contains("tests/integration_test.rs"),
            "missing file: {log}"
        );
        assert!(log.contains("dangerous primitive"), "missing message: {log}");
    }

    #[test]
    fn quiet_strategy_emits_nothing() {
        let _guard = setup();
        configure(app_settings().strategy(Signature::ShellSystem, Strategy::quiet()));

        let log = capture_warnings(|| {
            let _ = callguard::system!("echo quiet_probe");
        });

        assert!(!log.contains("shell.system"), "unexpected report: {log}");
    }
}
