#![forbid(unsafe_code)]

use std::path::PathBuf;

use clap::Parser;
use ids_core::config::load_from_path;
use ids_core::engine::{Engine, RuleSpec};
use ids_core::packet::IpProto;
use ids_core::signature::ProtoMask;
use serde::Deserialize;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Detection-core load harness")]
struct Cli {
    /// Path to the node's pool/detection/logging configuration.
    #[arg(short, long, value_name = "FILE", default_value = "ids-node.toml")]
    config: PathBuf,

    /// Path to the rule-set description to compile.
    #[arg(short, long, value_name = "FILE", default_value = "rules.toml")]
    rules: PathBuf,
}

#[derive(Debug, Deserialize, Default)]
struct RuleSetFile {
    #[serde(default)]
    rule: Vec<RuleDef>,
}

#[derive(Debug, Deserialize)]
struct RuleDef {
    name: String,
    src: String,
    dst: String,
    #[serde(default)]
    protocols: Vec<String>,
    #[serde(default)]
    src_port: Option<String>,
    #[serde(default)]
    dst_port: Option<String>,
}

fn proto_mask_from_names(names: &[String]) -> ProtoMask {
    if names.is_empty() {
        return ProtoMask::any();
    }
    names.iter().fold(ProtoMask::default(), |mask, name| match name.as_str() {
        "tcp" => mask.allow(IpProto::Tcp),
        "udp" => mask.allow(IpProto::Udp),
        "icmp" => mask.allow(IpProto::Icmp),
        other => {
            warn!(protocol = other, "unknown protocol name in rule, ignoring");
            mask
        }
    })
}

fn no_vars(_: &str) -> Option<String> {
    None
}

fn main() {
    let cli = Cli::parse();

    let node_config = match load_from_path(&cli.config) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("failed to load node configuration: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = ids_core::init_tracing(&node_config.logging.level) {
        eprintln!("failed to initialize tracing: {err}");
        std::process::exit(1);
    }

    info!(config = %cli.config.display(), "node configuration loaded");

    let rule_text = match std::fs::read_to_string(&cli.rules) {
        Ok(text) => text,
        Err(err) => {
            error!(%err, rules = %cli.rules.display(), "failed to read rule-set file");
            std::process::exit(1);
        }
    };
    let rule_file: RuleSetFile = match toml::from_str(&rule_text) {
        Ok(file) => file,
        Err(err) => {
            error!(%err, "failed to parse rule-set file");
            std::process::exit(1);
        }
    };

    let rules: Vec<RuleSpec> = rule_file
        .rule
        .into_iter()
        .map(|def| RuleSpec {
            name: def.name,
            proto_mask: proto_mask_from_names(&def.protocols),
            src: def.src,
            dst: def.dst,
            src_port: def.src_port,
            dst_port: def.dst_port,
        })
        .collect();

    match Engine::build(&rules, &no_vars, &node_config.detection) {
        Ok(engine) => {
            info!(signatures = engine.signatures().len(), "engine build complete");
        }
        Err(err) => {
            error!(%err, "failed to compile rule set");
            std::process::exit(1);
        }
    }
}
