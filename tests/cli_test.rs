use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

const FIXTURE: &str = "tests/fixtures/marketplace.csv";

#[test]
fn test_cli_jobs_report() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!("oddjobs"));
    cmd.arg(FIXTURE);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "job,title,status,employer,worker,budget_min,budget_max,rating",
        ))
        .stdout(predicate::str::contains("100,Garden cleanup,completed,1,2,300,500,5"))
        .stdout(predicate::str::contains("101,Fix gate,assigned,1,3,100,200,"))
        .stdout(predicate::str::contains("102,Wash car,cancelled,1,,50,80,"));

    Ok(())
}

#[test]
fn test_cli_payments_report() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!("oddjobs"));
    cmd.arg(FIXTURE).arg("--report").arg("payments");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "job,type,employer,worker,amount,platform_fee,total,status",
        ))
        // 15% of the 500 budget ceiling on top, tip settled separately
        .stdout(predicate::str::contains("100,job_payment,1,2,500,75,575,completed"))
        .stdout(predicate::str::contains("100,tip,1,2,50,0,50,completed"))
        .stdout(predicate::str::contains("102,").not());

    Ok(())
}

#[test]
fn test_cli_users_report() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!("oddjobs"));
    cmd.arg(FIXTURE).arg("--report").arg("users");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1,Thandi,employer,3,1,1,625,"))
        .stdout(predicate::str::contains("2,Sipho,worker,1,0,1,550,5"))
        .stdout(predicate::str::contains("3,Lerato,worker,1,1,0,0,"))
        .stdout(predicate::str::contains("9,Ops,admin,,,,,"));

    Ok(())
}

#[test]
fn test_cli_platform_report() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!("oddjobs"));
    cmd.arg(FIXTURE).arg("--report").arg("platform");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("users,4"))
        .stdout(predicate::str::contains("jobs_completed,1"))
        .stdout(predicate::str::contains("jobs_cancelled,1"))
        .stdout(predicate::str::contains("fees_collected,75"))
        .stdout(predicate::str::contains("payments_in_flight,0"));

    Ok(())
}

#[test]
fn test_cli_fee_rate_override() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!("oddjobs"));
    cmd.arg(FIXTURE)
        .arg("--report")
        .arg("payments")
        .arg("--fee-rate")
        .arg("0.1");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("100,job_payment,1,2,500,50,550,completed"));

    Ok(())
}

#[test]
fn test_cli_config_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = tempfile::NamedTempFile::new()?;
    std::io::Write::write_all(&mut config, br#"{"platform_fee_rate": "0.2"}"#)?;

    let mut cmd = Command::new(cargo_bin!("oddjobs"));
    cmd.arg(FIXTURE)
        .arg("--report")
        .arg("payments")
        .arg("--config")
        .arg(config.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("100,job_payment,1,2,500,100,600,completed"));

    Ok(())
}

#[test]
fn test_cli_invalid_fee_rate_fails() {
    let mut cmd = Command::new(cargo_bin!("oddjobs"));
    cmd.arg(FIXTURE).arg("--fee-rate").arg("1.5");

    cmd.assert().failure();
}

#[test]
fn test_cli_missing_input_fails() {
    let mut cmd = Command::new(cargo_bin!("oddjobs"));
    cmd.arg("tests/fixtures/does_not_exist.csv");

    cmd.assert().failure();
}

#[test]
fn test_cli_empty_report_keeps_columns() -> Result<(), Box<dyn std::error::Error>> {
    let mut log = tempfile::NamedTempFile::new()?;
    std::io::Write::write_all(
        &mut log,
        b"type, actor, job, target, min, max, rating, tip, note\nemployer, 1, , , , , , , Thandi\n",
    )?;

    let mut cmd = Command::new(cargo_bin!("oddjobs"));
    cmd.arg(log.path()).arg("--report").arg("payments");

    cmd.assert()
        .success()
        .stdout("job,type,employer,worker,amount,platform_fee,total,status\n");

    Ok(())
}
