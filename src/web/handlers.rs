//! Request handlers exercising every guarded primitive.
//!
//! These handlers model the routes of a small framework application. Each
//! one invokes its primitive through the attributing macros, which makes
//! this file first-party application code in the eyes of the interception
//! engine: the configured strategies apply to these call sites exactly as
//! they would in a real deployment.

use std::sync::Arc;

use crate::callsite::CallSite;
use crate::code::DynamicCode;
use crate::db::{MemoryBackend, Row};
use crate::error::Error;
use crate::process::SpawnOptions;
use crate::registry;
use crate::settings::{configure, Settings};

/// One route per guarded primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Shell execution via `system!`.
    System,
    /// Piped shell execution via `popen!`.
    Popen,
    /// Subprocess spawn via `spawn!`.
    Spawn,
    /// Captured-output execution via `check_output!`.
    CheckOutput,
    /// Raw SQL via `raw_sql!`.
    RawSql,
    /// Cursor acquisition via `sql_cursor!`.
    SqlCursor,
    /// Expression evaluation via `eval!`.
    Eval,
    /// Statement execution via `exec!`.
    Exec,
    /// Trust grant via `mark_safe!`.
    MarkSafe,
    /// Template trust grant via `safe!`.
    SafeFilter,
}

impl Endpoint {
    /// Resolves a request path to its endpoint.
    ///
    /// # Examples
    ///
    /// ```
    /// use callguard::web::Endpoint;
    ///
    /// assert_eq!(Endpoint::from_path("/shell/system"), Some(Endpoint::System));
    /// assert_eq!(Endpoint::from_path("/nope"), None);
    /// ```
    pub fn from_path(path: &str) -> Option<Endpoint> {
        match path {
            "/shell/system" => Some(Endpoint::System),
            "/shell/popen" => Some(Endpoint::Popen),
            "/process/spawn" => Some(Endpoint::Spawn),
            "/process/check-output" => Some(Endpoint::CheckOutput),
            "/db/raw" => Some(Endpoint::RawSql),
            "/db/cursor" => Some(Endpoint::SqlCursor),
            "/code/eval" => Some(Endpoint::Eval),
            "/code/exec" => Some(Endpoint::Exec),
            "/markup/mark-safe" => Some(Endpoint::MarkSafe),
            "/template/safe" => Some(Endpoint::SafeFilter),
            _ => None,
        }
    }
}

/// A rendered HTTP response: status code plus body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl Response {
    /// 200 with the given body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// 403 with the given body. Produced for every policy block.
    pub fn forbidden(body: impl Into<String>) -> Self {
        Self {
            status: 403,
            body: body.into(),
        }
    }

    /// 500 with the given body.
    pub fn error(body: impl Into<String>) -> Self {
        Self {
            status: 500,
            body: body.into(),
        }
    }
}

/// Dispatches one request to its handler and renders the outcome.
///
/// Policy blocks become 403; host failures become 500; everything else is
/// a 200 carrying the handler's body.
pub fn handle(endpoint: Endpoint, payload: &str) -> Response {
    let result = match endpoint {
        Endpoint::System => run_system(payload),
        Endpoint::Popen => run_popen(payload),
        Endpoint::Spawn => run_spawn(payload),
        Endpoint::CheckOutput => run_check_output(payload),
        Endpoint::RawSql => run_raw_sql(payload),
        Endpoint::SqlCursor => run_sql_cursor(payload),
        Endpoint::Eval => run_eval(payload),
        Endpoint::Exec => run_exec(payload),
        Endpoint::MarkSafe => run_mark_safe(payload),
        Endpoint::SafeFilter => run_safe_filter(payload),
    };
    match result {
        Ok(body) => Response::ok(body),
        Err(err) if err.is_blocked() => Response::forbidden(err.to_string()),
        Err(err) => Response::error(err.to_string()),
    }
}

fn run_system(command: &str) -> Result<String, Error> {
    let status = crate::system!(command)?;
    Ok(format!("exit status {status}"))
}

fn run_popen(command: &str) -> Result<String, Error> {
    let mut pipe = crate::popen!(command)?;
    pipe.read_to_string()
}

fn run_spawn(command: &str) -> Result<String, Error> {
    let options = SpawnOptions {
        shell: true,
        capture_stdout: true,
        capture_stderr: false,
    };
    let mut child = crate::spawn!(command, options)?;
    let stdout = child.read_stdout()?;
    Ok(String::from_utf8_lossy(&stdout).into_owned())
}

fn run_check_output(command: &str) -> Result<String, Error> {
    let bytes = crate::check_output!(command)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn run_raw_sql(sql: &str) -> Result<String, Error> {
    match crate::raw_sql!(sql)? {
        Some(rows) => Ok(render_rows(&rows)),
        None => Ok("No results from SQL".to_string()),
    }
}

fn run_sql_cursor(sql: &str) -> Result<String, Error> {
    let rows = crate::sql_cursor!()?.scope(|cursor| {
        cursor.execute(sql);
        cursor.fetch_all()
    });
    if rows.is_empty() {
        Ok("No results from SQL".to_string())
    } else {
        Ok(render_rows(&rows))
    }
}

fn run_eval(expression: &str) -> Result<String, Error> {
    Ok(crate::eval!(expression)?.unwrap_or_default())
}

fn run_exec(statements: &str) -> Result<String, Error> {
    crate::exec!(statements)?;
    Ok("executed".to_string())
}

fn run_mark_safe(text: &str) -> Result<String, Error> {
    let markup = crate::mark_safe!(text.to_string())?;
    Ok(markup.render().into_owned())
}

fn run_safe_filter(text: &str) -> Result<String, Error> {
    let markup = crate::safe!(text.to_string())?;
    Ok(format!("<p>{markup}</p>"))
}

fn render_rows(rows: &[Row]) -> String {
    rows.iter()
        .map(|row| row.join(", "))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The application startup sequence.
///
/// Mirrors what a framework startup hook runs once, in order: install
/// settings, register the application's original providers, activate
/// interception, then load middleware inside the bootstrap scope so
/// startup-time primitive use is never policed.
#[derive(Debug)]
pub struct App;

impl App {
    /// Boots the demo application with the given settings.
    pub fn start(settings: Settings) {
        configure(settings);
        registry::set_sql_backend(Arc::new(MemoryBackend::with_rows(vec![
            vec!["1".to_string(), "test_instance_1".to_string()],
            vec!["2".to_string(), "test_instance_2".to_string()],
        ])));
        registry::set_code_runtime(Arc::new(DemoRuntime));
        registry::activate();
        registry::bootstrap(Self::load_middleware);
        tracing::info!(target: "callguard", "interception active");
    }

    fn load_middleware() {
        // Frameworks touch guarded primitives while wiring themselves up;
        // inside the bootstrap scope these reach the real providers even
        // under a blocking policy.
        let _ = crate::system!(":");
    }
}

/// Stand-in dynamic-code runtime with an observable side effect.
///
/// Interprets a one-line script language: `write <path> <contents>`
/// writes a file (and evaluates to nothing); any other input evaluates to
/// itself. Enough to observe, from a test, whether a guarded `eval!` or
/// `exec!` actually reached the runtime.
#[derive(Debug, Default)]
pub struct DemoRuntime;

impl DemoRuntime {
    fn run(script: &str) -> Result<Option<String>, Error> {
        let mut parts = script.splitn(3, ' ');
        match parts.next() {
            Some("write") => {
                let path = parts.next().ok_or_else(|| {
                    Error::Io(std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "write needs a path",
                    ))
                })?;
                let contents = parts.next().unwrap_or("");
                std::fs::write(path, contents).map_err(Error::Io)?;
                Ok(None)
            }
            _ => Ok(Some(script.to_string())),
        }
    }
}

impl DynamicCode for DemoRuntime {
    fn eval(&self, _site: &CallSite, expression: &str) -> Result<Option<String>, Error> {
        Self::run(expression)
    }

    fn exec(&self, _site: &CallSite, statements: &str) -> Result<(), Error> {
        Self::run(statements)?;
        Ok(())
    }
}
