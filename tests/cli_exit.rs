// tests/cli_exit.rs - Exit code tests
use codegauge_core::cli::dispatch::execute;
use codegauge_core::cli::Commands;
use codegauge_core::exit::GaugeExit;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn project() -> TempDir {
    let d = tempfile::tempdir().unwrap();
    fs::write(d.path().join("main.py"), "def main():\n    return 0\n").unwrap();
    d
}

fn scan(path: PathBuf, fail_under: Option<f64>) -> Commands {
    Commands::Scan {
        path,
        json: true,
        workers: Some(2),
        exclude: Vec::new(),
        include: Vec::new(),
        fail_under,
        quiet: true,
    }
}

#[test]
fn test_exit_0_scan() {
    let d = project();
    let code = execute(scan(d.path().to_path_buf(), None)).unwrap();
    assert_eq!(code, GaugeExit::Success);
}

#[test]
fn test_exit_3_below_threshold() {
    let d = project();
    let code = execute(scan(d.path().to_path_buf(), Some(101.0))).unwrap();
    assert_eq!(code, GaugeExit::CheckFailed);
}

#[test]
fn test_exit_2_missing_directory() {
    let d = project();
    let code = execute(scan(d.path().join("nope"), None)).unwrap();
    assert_eq!(code, GaugeExit::InvalidInput);
}

#[test]
fn test_exit_2_unsupported_file() {
    let d = project();
    let notes = d.path().join("notes.txt");
    fs::write(&notes, "hello").unwrap();
    let code = execute(Commands::File {
        path: notes,
        json: true,
    })
    .unwrap();
    assert_eq!(code, GaugeExit::InvalidInput);
}

#[test]
fn test_exit_0_single_file_and_walk() {
    let d = project();
    let file = execute(Commands::File {
        path: d.path().join("main.py"),
        json: true,
    })
    .unwrap();
    assert_eq!(file, GaugeExit::Success);

    let walk = execute(Commands::Walk {
        path: d.path().to_path_buf(),
        json: true,
    })
    .unwrap();
    assert_eq!(walk, GaugeExit::Success);
}

#[test]
fn test_exit_codes_distinct() {
    let codes = [
        GaugeExit::Success.code(),
        GaugeExit::Error.code(),
        GaugeExit::InvalidInput.code(),
        GaugeExit::CheckFailed.code(),
    ];
    for (i, a) in codes.iter().enumerate() {
        for b in &codes[i + 1..] {
            assert_ne!(a, b);
        }
    }
}
