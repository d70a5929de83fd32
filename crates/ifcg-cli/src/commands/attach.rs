//! Device attachment command.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde_json::Value;

use ifcg_core::{AppConfig, DeviceEntity, IfcgError, IfcgResult};
use ifcg_graph::{AttachOutcome, DeviceAttacher};

#[derive(Args)]
pub struct AttachArgs {
    /// `nid` of the model node to attach to
    pub nid: i64,

    /// Device identifier
    pub device_id: String,

    /// Device type, e.g. TemperatureSensor
    pub device_type: String,

    /// Extra device property as key=value (repeatable)
    #[arg(long = "prop", value_name = "KEY=VALUE")]
    pub props: Vec<String>,
}

pub async fn execute(args: AttachArgs, config: &AppConfig) -> Result<()> {
    let mut device = DeviceEntity::new(&args.device_id, &args.device_type);
    for raw in &args.props {
        let (key, value) = parse_prop(raw)?;
        device = device.with_attribute(key, value);
    }

    let store = super::connect_store(config).await?;
    let attacher = DeviceAttacher::new(store);

    match attacher.attach(args.nid, &device).await? {
        AttachOutcome::Attached { links, .. } => {
            println!(
                "{} Device {} attached to node {}",
                "✓".green(),
                device.device_id.cyan(),
                args.nid.to_string().yellow()
            );
            if links == 0 {
                println!("  {}", "Target disappeared before linking; device node left unlinked.".yellow());
            }
            Ok(())
        }
        AttachOutcome::TargetNotFound { nid } => Err(IfcgError::NodeNotFound(nid).into()),
    }
}

/// `key=value`, with the value read as integer, float, boolean or string.
fn parse_prop(raw: &str) -> IfcgResult<(String, Value)> {
    let (key, value) = raw
        .split_once('=')
        .filter(|(k, _)| !k.trim().is_empty())
        .ok_or_else(|| IfcgError::validation(format!("expected KEY=VALUE, got '{}'", raw)))?;

    let value = value.trim();
    let parsed = if let Ok(i) = value.parse::<i64>() {
        Value::from(i)
    } else if let Ok(f) = value.parse::<f64>() {
        Value::from(f)
    } else if let Ok(b) = value.parse::<bool>() {
        Value::from(b)
    } else {
        Value::from(value)
    };

    Ok((key.trim().to_string(), parsed))
}
