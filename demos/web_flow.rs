//! Web request flow demonstration.
//!
//! This example drives the framework-agnostic web surface: the app boots
//! with a mixed policy, then a handful of simulated requests hit the
//! endpoint handlers, whose call sites live in the application tree and
//! are therefore subject to interception.
//!
//! Run with: `cargo run --example web_flow`

use callguard::web::{handle, App, Endpoint};
use callguard::{Settings, Signature, Strategy};

fn request(path: &str, payload: &str) {
    println!("POST {} payload={:?}", path, payload);
    match Endpoint::from_path(path) {
        Some(endpoint) => {
            let response = handle(endpoint, payload);
            println!("  -> {} {:?}\n", response.status, response.body);
        }
        None => println!("  -> 404\n"),
    }
}

fn main() {
    tracing_subscriber::fmt().with_target(false).init();

    println!("=== Web Request Flow Example ===\n");

    // The endpoint handlers live under src/, so that is the application
    // root here. Shell execution is blocked outright; everything else
    // keeps the report-and-neutralize default.
    App::start(
        Settings::new("src").strategy(Signature::ShellSystem, Strategy::blocking()),
    );

    println!("--- Blocked Endpoint ---");
    request("/shell/system", "echo pwned > /tmp/proof");

    println!("--- Neutralized Endpoints ---");
    request("/db/raw", "SELECT * FROM app_testmodel");
    request("/code/eval", "write /tmp/proof payload");
    request("/markup/mark-safe", "<script>alert(1)</script>");

    println!("--- Unknown Route ---");
    request("/admin/debug", "");

    println!("=== Key Takeaways ===");
    println!("1. Policy blocks surface as HTTP 403");
    println!("2. Neutralized handlers degrade gracefully (empty results, escaped markup)");
    println!("3. The web surface carries no framework dependency");
}
