use neuron_canvas::codec::{export_to_json, import_from_value};
use neuron_canvas::config::{RankDir, SandboxConfig};
use neuron_canvas::factory::{available_node_types, create_node_by_type};
use neuron_canvas::layout::{calculate_layout, merge_positions};
use neuron_canvas::model::{Model, NodePositions};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::io::Read;

const LOG_ENV: &str = "NEURON_CANVAS_LOG";

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Model(neuron_canvas::Error),
    Json(serde_json::Error),
    Invalid(Vec<String>),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Model(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::Invalid(issues) => {
                write!(f, "model has {} problem(s):", issues.len())?;
                for issue in issues {
                    write!(f, "\n  - {issue}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<neuron_canvas::Error> for CliError {
    fn from(value: neuron_canvas::Error) -> Self {
        Self::Model(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Command {
    #[default]
    Layout,
    Validate,
    Fmt,
    NodeTypes,
    NewNode,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    /// Input path for model commands, layer type for `new-node`.
    positional: Option<String>,
    pretty: bool,
    direction: Option<RankDir>,
    config: Option<String>,
    ignore_positions: bool,
    out: Option<String>,
}

#[derive(Serialize)]
struct NodeTypeOut {
    #[serde(rename = "type")]
    layer_type: &'static str,
    name: &'static str,
}

#[derive(Serialize)]
struct ValidateOut<'a> {
    name: &'a str,
    layers: usize,
    edges: usize,
}

fn usage() -> &'static str {
    "neuron-canvas-cli\n\
\n\
USAGE:\n\
  neuron-canvas-cli [layout] [--pretty] [--direction TB|BT|LR|RL] [--config <path>] [--ignore-positions] [<path>|-]\n\
  neuron-canvas-cli validate [<path>|-]\n\
  neuron-canvas-cli fmt [--out <path>] [<path>|-]\n\
  neuron-canvas-cli node-types [--pretty]\n\
  neuron-canvas-cli new-node [--pretty] <type>\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - Input is a model file ({ metadata, layers, edges }) or a saved sandbox record.\n\
  - layout keeps positions found under nodePositions unless --ignore-positions is given.\n\
  - --config reads a JSON sandbox config; only its layout section is used.\n\
  - Set NEURON_CANVAS_LOG (e.g. debug) to enable logging on stderr.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "layout" => args.command = Command::Layout,
            "validate" => args.command = Command::Validate,
            "fmt" => args.command = Command::Fmt,
            "node-types" => args.command = Command::NodeTypes,
            "new-node" => args.command = Command::NewNode,
            "--pretty" => args.pretty = true,
            "--ignore-positions" => args.ignore_positions = true,
            "--direction" => {
                let Some(dir) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.direction = Some(
                    dir.parse::<RankDir>()
                        .map_err(|_| CliError::Usage(usage()))?,
                );
            }
            "--config" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.config = Some(path.clone());
            }
            "--out" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out.clone());
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.positional.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.positional = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            "-" => {
                if args.positional.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.positional = Some("-".to_string());
            }
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
            value => {
                if args.positional.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.positional = Some(value.to_string());
            }
        }
    }

    if args.command == Command::NewNode && args.positional.is_none() {
        return Err(CliError::Usage(usage()));
    }
    Ok(args)
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    println!();
    Ok(())
}

fn write_text(text: &str, out: Option<&str>) -> Result<(), CliError> {
    match out {
        None => {
            println!("{text}");
            Ok(())
        }
        Some(path) => {
            std::fs::write(path, format!("{text}\n"))?;
            Ok(())
        }
    }
}

/// Reads a model file or saved sandbox record, returning the model and any pinned positions.
fn load_model(input: Option<&str>) -> Result<(Model, NodePositions), CliError> {
    let text = read_input(input)?;
    let value: Value = serde_json::from_str(&text)?;
    let positions = match value.get("nodePositions") {
        Some(raw) if !raw.is_null() => serde_json::from_value(raw.clone())?,
        _ => NodePositions::new(),
    };
    let model = import_from_value(value)?;
    tracing::debug!(
        layers = model.layers.len(),
        edges = model.edges.len(),
        pinned = positions.len(),
        "model loaded"
    );
    Ok((model, positions))
}

fn load_config(path: Option<&str>) -> Result<SandboxConfig, CliError> {
    let Some(path) = path else {
        return Ok(SandboxConfig::default());
    };
    let value: Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    Ok(SandboxConfig::from_value(&value)?)
}

/// Structural problems the editor would silently repair on load.
fn model_issues(model: &Model) -> Vec<String> {
    let mut issues = Vec::new();
    let mut layer_ids = HashSet::new();
    for layer in &model.layers {
        if !layer_ids.insert(layer.id.as_str()) {
            issues.push(format!("duplicate layer id `{}`", layer.id));
        }
    }
    let mut edge_ids = HashSet::new();
    let mut pairs = HashSet::new();
    for edge in &model.edges {
        if !edge_ids.insert(edge.id.as_str()) {
            issues.push(format!("duplicate edge id `{}`", edge.id));
        }
        for endpoint in [&edge.source, &edge.target] {
            if !layer_ids.contains(endpoint.as_str()) {
                issues.push(format!("edge `{}` references unknown layer `{endpoint}`", edge.id));
            }
        }
        if edge.source == edge.target {
            issues.push(format!("edge `{}` connects `{}` to itself", edge.id, edge.source));
        } else if !pairs.insert((edge.source.as_str(), edge.target.as_str())) {
            issues.push(format!(
                "edge `{}` duplicates the connection `{}` -> `{}`",
                edge.id, edge.source, edge.target
            ));
        }
    }
    issues
}

fn run(args: Args) -> Result<(), CliError> {
    match args.command {
        Command::Layout => {
            let mut config = load_config(args.config.as_deref())?.layout;
            if let Some(direction) = args.direction {
                config.direction = direction;
            }
            let (model, positions) = load_model(args.positional.as_deref())?;
            let mut result = calculate_layout(&model.layers, &model.edges, &config);
            if !args.ignore_positions {
                result = merge_positions(result, &positions);
            }
            write_json(&result, args.pretty)
        }
        Command::Validate => {
            let (model, _) = load_model(args.positional.as_deref())?;
            let issues = model_issues(&model);
            if !issues.is_empty() {
                return Err(CliError::Invalid(issues));
            }
            write_json(
                &ValidateOut {
                    name: &model.metadata.name,
                    layers: model.layers.len(),
                    edges: model.edges.len(),
                },
                false,
            )
        }
        Command::Fmt => {
            let (model, _) = load_model(args.positional.as_deref())?;
            let text = export_to_json(&model)?;
            write_text(&text, args.out.as_deref())
        }
        Command::NodeTypes => {
            let types: Vec<NodeTypeOut> = available_node_types()
                .iter()
                .map(|t| NodeTypeOut {
                    layer_type: t.as_str(),
                    name: t.display_name(),
                })
                .collect();
            write_json(&types, args.pretty)
        }
        Command::NewNode => {
            let layer_type = args.positional.as_deref().unwrap_or_default();
            let layer = create_node_by_type(layer_type)?;
            write_json(&layer, args.pretty)
        }
    }
}

fn main() {
    init_tracing();

    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    match run(args) {
        Ok(()) => {}
        Err(err @ CliError::Invalid(_)) => {
            eprintln!("{err}");
            std::process::exit(3);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
