use assert_cmd::Command;
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

fn fixture(name: &str) -> PathBuf {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("expected crates/<name> layout")
        .join("neuron-canvas")
        .join("tests")
        .join("fixtures")
        .join(name);
    assert!(path.exists(), "fixture missing: {}", path.display());
    path
}

fn cli() -> Command {
    Command::new(assert_cmd::cargo_bin!("neuron-canvas-cli"))
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("run cli");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn layout_emits_nodes_left_to_right() {
    let out = stdout_json(cli().args(["layout", fixture("lenet5.json").to_str().unwrap()]));
    let nodes = out["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 10);
    assert_eq!(nodes[0]["id"], "input");
    assert_eq!(nodes[0]["type"], "inputNode");
    assert_eq!(nodes[0]["position"]["x"], 120.0);
    let xs: Vec<f64> = nodes
        .iter()
        .map(|n| n["position"]["x"].as_f64().unwrap())
        .collect();
    assert!(xs.windows(2).all(|w| w[0] < w[1]), "{xs:?}");
    assert_eq!(out["edges"].as_array().unwrap().len(), 9);
}

#[test]
fn layout_direction_flag_switches_axis() {
    let out = stdout_json(cli().args([
        "layout",
        "--direction",
        "TB",
        fixture("lenet5.json").to_str().unwrap(),
    ]));
    let nodes = out["nodes"].as_array().unwrap();
    let ys: Vec<f64> = nodes
        .iter()
        .map(|n| n["position"]["y"].as_f64().unwrap())
        .collect();
    assert!(ys.windows(2).all(|w| w[0] < w[1]), "{ys:?}");
}

#[test]
fn layout_reads_stdin_and_keeps_saved_positions() {
    let record = r#"{
        "layers": [
            { "id": "a", "name": "A", "type": "input" },
            { "id": "b", "name": "B", "type": "relu" }
        ],
        "edges": [{ "id": "ab", "source": "a", "target": "b" }],
        "nodePositions": { "b": { "x": -5.0, "y": 7.5 } },
        "savedAt": 1700000000000
    }"#;
    let out = stdout_json(cli().arg("layout").write_stdin(record));
    assert_eq!(out["nodes"][1]["position"]["x"], -5.0);
    assert_eq!(out["nodes"][1]["position"]["y"], 7.5);

    let out = stdout_json(cli().args(["layout", "--ignore-positions", "-"]).write_stdin(record));
    assert_ne!(out["nodes"][1]["position"]["x"], -5.0);
}

#[test]
fn layout_config_file_is_merged_over_defaults() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let config = tmp.path().join("config.json");
    fs::write(&config, r#"{ "layout": { "marginX": 10 } }"#).unwrap();
    let out = stdout_json(cli().args([
        "layout",
        "--config",
        config.to_str().unwrap(),
        fixture("lenet5.json").to_str().unwrap(),
    ]));
    assert_eq!(out["nodes"][0]["position"]["x"], 10.0);
}

#[test]
fn validate_accepts_fixtures() {
    for name in ["lenet5.json", "residual_block.json"] {
        let out = stdout_json(cli().args(["validate", fixture(name).to_str().unwrap()]));
        assert!(out["layers"].as_u64().unwrap() > 0, "{name}");
    }
}

#[test]
fn validate_reports_dangling_edges() {
    let model = r#"{
        "layers": [{ "id": "a", "name": "A", "type": "input" }],
        "edges": [{ "id": "e", "source": "a", "target": "ghost" }]
    }"#;
    let output = cli().arg("validate").write_stdin(model).output().unwrap();
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown layer `ghost`"), "{stderr}");
}

#[test]
fn malformed_models_fail() {
    cli()
        .arg("validate")
        .write_stdin(r#"{"foo": 1}"#)
        .assert()
        .code(1);
    cli()
        .args(["fmt", "/definitely/not/here.json"])
        .assert()
        .failure();
}

#[test]
fn fmt_writes_normalized_json() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let out = tmp.path().join("out.json");
    cli()
        .args([
            "fmt",
            "--out",
            out.to_str().unwrap(),
            fixture("residual_block.json").to_str().unwrap(),
        ])
        .assert()
        .success();
    let text = fs::read_to_string(&out).unwrap();
    assert!(text.starts_with("{\n  \"metadata\""));

    // Formatting is idempotent.
    let again = cli()
        .args(["fmt", out.to_str().unwrap()])
        .output()
        .unwrap();
    assert_eq!(String::from_utf8(again.stdout).unwrap(), text);
}

#[test]
fn node_types_lists_the_palette() {
    let out = stdout_json(cli().arg("node-types"));
    let types = out.as_array().unwrap();
    assert_eq!(types.len(), 22);
    assert_eq!(types[0]["type"], "input");
    assert!(types.iter().any(|t| t["type"] == "self-attention"));
}

#[test]
fn new_node_prints_a_default_layer() {
    let out = stdout_json(cli().args(["new-node", "conv2d"]));
    assert_eq!(out["type"], "conv2d");
    assert_eq!(out["filters"], 32);
    assert!(out["id"].as_str().unwrap().starts_with("layer_conv2d_"));

    let output = cli().args(["new-node", "lstm"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown layer type: lstm"));
}

#[test]
fn bad_usage_exits_with_two() {
    cli().arg("--bogus").assert().code(2);
    cli().arg("--help").assert().code(2);
}
