use std::{fs::File, io::Write};

use assert_cmd::Command;
use predicates::prelude::predicate;

#[test]
fn print_debug_info() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let file_path = dir.path().join("config.yaml");
    let mut file = File::create(&file_path)?;
    writeln!(file, "packages: []")?;

    let mut cmd = Command::cargo_bin("pkg-converge")?;
    cmd.arg("--config").arg(file_path).arg("--print-debug-info");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Printing debug info"));

    Ok(())
}

#[test]
fn missing_config_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let file_path = dir.path().join("absent.yaml");

    let mut cmd = Command::cargo_bin("pkg-converge")?;
    cmd.arg("--config").arg(file_path).arg("--dry-run");
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("could not read config"));

    Ok(())
}

#[test]
fn conflicting_packages_fail_before_touching_the_system() -> Result<(), Box<dyn std::error::Error>>
{
    let dir = tempfile::tempdir()?;
    let file_path = dir.path().join("config.yaml");
    let mut file = File::create(&file_path)?;
    writeln!(
        file,
        r#"
packages:
  - names: [nginx]
  - names: [nginx]
    present: false
"#
    )?;

    let mut cmd = Command::cargo_bin("pkg-converge")?;
    cmd.arg("--config").arg(file_path);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains(
            "package `nginx` is requested both present and absent",
        ));

    Ok(())
}

#[test]
fn unknown_config_field_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let file_path = dir.path().join("config.yaml");
    let mut file = File::create(&file_path)?;
    writeln!(file, "agents: {{}}")?;

    let mut cmd = Command::cargo_bin("pkg-converge")?;
    cmd.arg("--config").arg(file_path).arg("--dry-run");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid config"));

    Ok(())
}

#[test]
fn version_is_printed() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("pkg-converge")?;
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));

    Ok(())
}
