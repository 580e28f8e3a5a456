// crates/canopy-cli/src/commands/access.rs
//
// `canopy access` command: check a requester against an access requirement.

use chrono::{DateTime, Utc};
use clap::Args;

use canopy_access::{check_access, AccessCheckResult, AccessRequirement};
use canopy_core::RequesterCredentials;
use canopy_feedback::DefaultTemplateCatalog;

use super::{engine, load_stores, read_json, Context};
use crate::output::{format_json, format_table, join_or_dash, FieldRow, OutputFormat};

#[derive(Debug, Args)]
pub struct AccessCmd {
    /// JSON file with the requester's credentials. Omit to check as anonymous.
    #[arg(long)]
    pub requester: Option<String>,

    /// JSON file with the access requirement.
    #[arg(long)]
    pub requirement: String,

    /// JSON store snapshot. With --content-id, the content's reach is also checked.
    #[arg(long, requires = "content_id")]
    pub fixture: Option<String>,

    /// Content item whose effective reach bounds access.
    #[arg(long, requires = "fixture")]
    pub content_id: Option<String>,

    /// Evaluation time (RFC 3339). Defaults to now.
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

pub fn run(ctx: &Context, cmd: &AccessCmd) -> Result<(), Box<dyn std::error::Error>> {
    let requirement: AccessRequirement = read_json(&cmd.requirement)?;
    let requester = match &cmd.requester {
        Some(path) => read_json::<RequesterCredentials>(path)?,
        None => RequesterCredentials::anonymous(),
    };

    let result = match (&cmd.fixture, &cmd.content_id) {
        (Some(fixture), Some(content_id)) => {
            let stores = load_stores(fixture)?;
            let templates = DefaultTemplateCatalog::new();
            let engine = engine(ctx, &stores, &templates);
            let now = cmd.at.unwrap_or_else(Utc::now);
            engine.check_content_access(&requester, &requirement, content_id, now)?
        }
        _ => check_access(&requester, &requirement),
    };

    match ctx.format {
        OutputFormat::Json => println!("{}", format_json(&result)),
        OutputFormat::Table => print_result(&result),
    }
    Ok(())
}

fn print_result(result: &AccessCheckResult) {
    let action = result
        .required_action
        .as_ref()
        .map(|a| serde_json::to_string(a).unwrap_or_else(|e| format!("<{}>", e)))
        .unwrap_or_else(|| "-".to_string());
    let rows = vec![
        FieldRow::new("Access", if result.can_access { "granted" } else { "denied" }),
        FieldRow::new("Reason", join_or_dash(result.denial_reason)),
        FieldRow::new("Required action", action),
        FieldRow::new("Missing attestations", join_or_dash(&result.missing_attestations)),
        FieldRow::new("Missing paths", join_or_dash(&result.missing_paths)),
    ];
    println!("{}", format_table(&rows));
}
