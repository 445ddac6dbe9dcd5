use std::{fs, path::Path, process::Command};

fn tile_merge(highscore: &Path, moves: &str) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_tile-merge"))
        .args(["--seed", "2048", "--format", "text", "--frame-ms", "20"])
        .arg("--highscore")
        .arg(highscore)
        .args(["--moves", moves])
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to launch tile-merge binary")
}

#[test]
fn scripted_session_prints_boards_and_persists_highscore() {
    let dir = tempfile::tempdir().expect("tempdir");
    let highscore = dir.path().join("best.txt");
    let moves = "LDRU".repeat(20);

    let output = tile_merge(&highscore, &moves);
    assert!(output.status.success(), "scripted run should succeed");

    let stdout = String::from_utf8(output.stdout).expect("utf8 output");
    assert!(stdout.starts_with("tile-merge\n"));
    assert_eq!(stdout.matches("score ").count(), moves.len() + 1);

    let saved: u64 = fs::read_to_string(&highscore)
        .expect("high score written on exit")
        .trim()
        .parse()
        .expect("decimal high score");
    assert!(saved > 0, "eighty moves always merge something");

    let replay = tile_merge(&highscore, "Q");
    let stdout = String::from_utf8(replay.stdout).expect("utf8 output");
    assert!(
        stdout.contains(&format!("best {saved}")),
        "second run loads the stored high score"
    );
}

#[test]
fn unknown_script_key_fails_the_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = tile_merge(&dir.path().join("best.txt"), "LZ");
    assert!(!output.status.success());
}

#[test]
fn color_flag_paints_the_board() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = Command::new(env!("CARGO_BIN_EXE_tile-merge"))
        .args(["--seed", "5", "--format", "text", "--color", "--moves", "LQ"])
        .arg("--highscore")
        .arg(dir.path().join("best.txt"))
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to launch tile-merge binary");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("utf8 output");
    assert!(stdout.starts_with("\x1b[48;2;250;248;239m"), "title on the clear color");
    assert!(stdout.contains("\x1b[48;2;238;228;218m"), "seeded 2-tiles use their palette fill");
}
