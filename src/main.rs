//! terminator - a cross-platform terminal emulator
//!
//! This is the main entry point; everything interesting happens in
//! terminator-app.

fn main() {
    std::process::exit(terminator_app::run());
}
