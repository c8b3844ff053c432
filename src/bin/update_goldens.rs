//! Convenience binary to regenerate golden fixture expected outputs.
//!
//! Usage: `cargo run -p graph-engine --bin update_goldens`
//!
//! This is equivalent to running:
//!   `GOLDEN_UPDATE=1 cargo test -p graph-engine --test golden`

fn main() {
    std::env::set_var("GOLDEN_UPDATE", "1");

    let status = std::process::Command::new("cargo")
        .args(["test", "-p", "graph-engine", "--test", "golden", "--", "--nocapture"])
        .status()
        .expect("Failed to run cargo test");

    if !status.success() {
        std::process::exit(1);
    }
}
