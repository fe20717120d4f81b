//! Blocking enforcement demonstration.
//!
//! This example switches every primitive to the blocking strategy:
//! in-scope calls fail with a permission-denied error instead of being
//! quietly neutralized. It also shows deactivation restoring the real
//! primitives.
//!
//! Run with: `cargo run --example block_mode`

use callguard::web::App;
use callguard::{deactivate, Settings, Strategy};

fn main() {
    tracing_subscriber::fmt().with_target(false).init();

    println!("=== Blocking Enforcement Example ===\n");

    App::start(Settings::new("demos").strategy_for_all(Strategy::blocking()));

    println!("--- Scenario 1: Blocked Shell Execution ---");
    match callguard::system!("echo forbidden") {
        Ok(status) => println!("unexpected success: {}", status),
        Err(err) => {
            println!("blocked: {}", err);
            println!("is_blocked = {} (HTTP handlers map this to 403)\n", err.is_blocked());
        }
    }

    println!("--- Scenario 2: Blocked Dynamic Code ---");
    match callguard::eval!("2 + 2") {
        Ok(value) => println!("unexpected success: {:?}", value),
        Err(err) => println!("blocked: {}\n", err),
    }

    println!("--- Scenario 3: Blocked Trust Grant ---");
    match callguard::mark_safe!("<b>payload</b>".to_string()) {
        Ok(markup) => println!("unexpected success: {}", markup),
        Err(err) => println!("blocked: {}\n", err),
    }

    println!("--- Scenario 4: Deactivation ---");
    deactivate();
    let status = callguard::system!("echo primitives are live again").unwrap();
    println!("after deactivate(), system! ran for real, exit status {}", status);

    println!("\n=== Key Takeaways ===");
    println!("1. Blocking strategies refuse the call with an error");
    println!("2. The error names the call site, never the payload");
    println!("3. deactivate() restores the captured originals");
}
