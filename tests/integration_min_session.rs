// Drives the compiled binary through a PTY to exercise the real event loop
// and crossterm input handling.
//
// Requires a TTY; ignored by default.
// Run manually via: `cargo test --test integration_min_session -- --ignored`.

#![cfg(unix)]

use std::time::Duration;

use expectrl::{spawn, Eof};

#[test]
#[ignore]
fn minimal_session_completes_and_exits() -> Result<(), Box<dyn std::error::Error>> {
    let state = tempfile::tempdir()?;
    let bin = assert_cmd::cargo::cargo_bin("mathdrill");
    let cmd = format!(
        "{} --set addition -n 1 --state-dir {}",
        bin.display(),
        state.path().display()
    );

    let mut p = spawn(cmd)?;
    std::thread::sleep(Duration::from_millis(200));

    // start, reveal, grade
    p.send(" ")?;
    std::thread::sleep(Duration::from_millis(100));
    p.send(" ")?;
    std::thread::sleep(Duration::from_millis(100));
    p.send("y")?;
    std::thread::sleep(Duration::from_millis(200));

    p.send("\x1b")?; // ESC
    p.expect(Eof)?;

    assert!(state.path().join("results.csv").exists());
    Ok(())
}
