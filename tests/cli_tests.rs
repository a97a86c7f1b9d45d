mod common;

use common::fixtures::{DEVICE_LIB, resistor_schematic};
use common::{Project, TestResult, read};
use std::process::Command;

fn schsvg() -> Command {
    Command::new(env!("CARGO_BIN_EXE_schsvg"))
}

#[test]
fn test_cli_writes_output_file() -> TestResult {
    let project = Project::new()?;
    let input = project.write("main.sch", &resistor_schematic(&["device"]))?;
    project.write("device.lib", DEVICE_LIB)?;
    let output = project.path("main.svg");

    let status = schsvg()
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .args(["--unit", "in", "--hidden-pins"])
        .status()?;
    assert!(status.success());

    let svg = read(&output);
    let doc = roxmltree::Document::parse(&svg)?;
    assert_eq!(doc.root_element().attribute("height"), Some("8.268in"));
    Ok(())
}

#[test]
fn test_cli_writes_stdout() -> TestResult {
    let project = Project::new()?;
    let input = project.write("main.sch", &resistor_schematic(&[]))?;

    let output = schsvg().arg(&input).arg("--no-components").output()?;
    assert!(output.status.success());
    let svg = String::from_utf8(output.stdout)?;
    assert!(svg.starts_with("<svg"));
    assert!(!svg.contains("class=\"symbol\""));
    Ok(())
}

#[test]
fn test_cli_reports_format_errors() -> TestResult {
    let project = Project::new()?;
    let input = project.write("broken.sch", "EESchema Schematic File Version 2\n$Descr A4 x 8268\n")?;
    let output_path = project.path("broken.svg");

    let output = schsvg().arg(&input).arg("-o").arg(&output_path).output()?;
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("integer"), "{stderr}");
    assert!(stderr.contains("line 2"), "{stderr}");
    assert!(!output_path.exists());
    Ok(())
}
