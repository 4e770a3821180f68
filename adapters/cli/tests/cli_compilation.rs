use std::process::Command;

#[test]
fn cli_compiles_without_warnings() {
    let status = Command::new(env!("CARGO"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args(["check", "--quiet", "--bin", "theme-park"])
        .status()
        .expect("failed to invoke cargo check for theme-park CLI binary");

    assert!(status.success(), "cargo check --bin theme-park should succeed");
}

#[test]
fn generate_prints_a_seeded_map() {
    let output = Command::new(env!("CARGO_BIN_EXE_theme-park"))
        .args(["--seed", "8", "generate"])
        .output()
        .expect("failed to run theme-park generate");

    assert!(output.status.success());
    let map = String::from_utf8(output.stdout).expect("map is utf-8");
    assert_eq!(map.lines().count(), 55);
    assert!(map.lines().all(|row| row.chars().count() == 100));

    let again = Command::new(env!("CARGO_BIN_EXE_theme-park"))
        .args(["--seed", "8", "generate"])
        .output()
        .expect("failed to run theme-park generate");
    assert_eq!(String::from_utf8_lossy(&again.stdout), map);
}
