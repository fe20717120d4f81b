//! Report-only interception demonstration.
//!
//! This example shows the default posture: every in-scope dangerous
//! primitive is reported and neutralized, while out-of-scope callers keep
//! working untouched.
//!
//! Run with: `cargo run --example report_only`

use callguard::web::App;
use callguard::{registry, CallSite, Settings};

fn main() {
    // Show the warning diagnostics the report strategy emits.
    tracing_subscriber::fmt().with_target(false).init();

    println!("=== Report-Only Interception Example ===\n");

    // This binary's call sites live under demos/, so that is the
    // application root. No per-primitive strategies: everything gets the
    // default (report + neutralize).
    App::start(Settings::new("demos"));

    println!("--- Scenario 1: Shell Execution ---");
    let status = callguard::system!("echo you should never see this").unwrap();
    println!("system! returned exit status {} (nothing ran)\n", status);

    println!("--- Scenario 2: Piped Shell Execution ---");
    let mut pipe = callguard::popen!("echo hidden output").unwrap();
    let output = pipe.read_to_string().unwrap();
    println!("popen! produced {:?} (an empty, well-behaved pipe)\n", output);

    println!("--- Scenario 3: Raw SQL ---");
    let rows = callguard::raw_sql!("SELECT * FROM app_testmodel").unwrap();
    match rows {
        Some(rows) => println!("unexpected rows: {:?}", rows),
        None => println!("raw_sql! returned no results (backend never queried)\n"),
    }

    println!("--- Scenario 4: Markup Trust ---");
    let markup = callguard::mark_safe!("<script>alert(1)</script>".to_string()).unwrap();
    println!("mark_safe! handed back untrusted markup");
    println!("rendered: {}\n", markup);

    println!("--- Scenario 5: Library-Internal Callers ---");
    // Code with no call-site attribution (framework and dependency
    // internals) always reaches the real provider.
    let status = registry::shell()
        .system(&CallSite::unknown(), "echo library code still runs")
        .unwrap();
    println!("unattributed call ran for real, exit status {}", status);

    println!("\n=== Key Takeaways ===");
    println!("1. In-scope calls are neutralized, not failed");
    println!("2. Every neutralized call left a warning in the log above");
    println!("3. Substitutes keep the caller's protocol working");
    println!("4. Unattributed callers are never policed");
}
