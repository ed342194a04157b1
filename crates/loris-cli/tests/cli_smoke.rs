use std::process::Command;

fn demo(name: &str) -> String {
    format!("{}/../../demos/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn loris(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_loris"))
        .args(args)
        .output()
        .expect("failed to execute loris")
}

#[test]
fn help_lists_commands() {
    let output = loris(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("explore"));
    assert!(stdout.contains("check"));
}

#[test]
fn check_prints_definitions_and_root() {
    let output = loris(&["check", &demo("relay.pi")]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Relay(c,d) = c(x).d'<x>.Relay(c,d)"));
    assert!(stdout.contains("Relay(a,b) | Relay(b,a) | a'<m>.0"));
}

#[test]
fn explore_pretty_output() {
    let output = loris(&["explore", &demo("choice.pi")]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("s0 = {(1,a),(2,b),(3,c),(4,d)} |- "));
    assert!(stdout.contains("s0  1' 2  s1"));
    assert!(stdout.contains("s0  3' 4  s1"));
}

#[test]
fn explore_dot_output() {
    let output = loris(&["explore", &demo("handshake.pi"), "--format", "dot", "--state-numbers"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("digraph {"));
    assert!(stdout.contains("s0 [peripheries=2,label=\"s0\"]"));
    assert!(stdout.contains("label=\"τ\""));
}

#[test]
fn explore_json_output() {
    let output = loris(&["explore", &demo("choice.pi"), "--format", "json"]);
    assert!(output.status.success());
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("valid JSON on stdout");
    assert_eq!(value["states"].as_array().unwrap().len(), 2);
    assert_eq!(value["transitions"].as_array().unwrap().len(), 2);
}

#[test]
fn unknown_format_fails() {
    let output = loris(&["explore", &demo("choice.pi"), "--format", "yaml"]);
    assert!(!output.status.success());
}

#[test]
fn parse_errors_are_reported() {
    let output = loris(&["check", &demo("../README.md")]);
    assert!(!output.status.success());
}
