// crates/canopy-cli/src/commands/trust.rs
//
// `canopy trust` command: resolve a content item's trust profile.

use chrono::{DateTime, Utc};
use clap::Args;
use tabled::Tabled;

use canopy_feedback::DefaultTemplateCatalog;
use canopy_reach::{ContentTrustProfile, FlagSource};

use super::{engine, load_stores, Context};
use crate::output::{format_json, format_table, join_or_dash, FieldRow, OutputFormat};

#[derive(Debug, Args)]
pub struct TrustCmd {
    /// JSON store snapshot to evaluate.
    #[arg(long)]
    pub fixture: String,

    /// Content item to resolve.
    #[arg(long)]
    pub content_id: String,

    /// Evaluation time (RFC 3339). Defaults to now.
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

/// Table row for an attestation on the profile.
#[derive(Tabled)]
struct AttestationRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Type")]
    attestation_type: String,
    #[tabled(rename = "Reach")]
    reach: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Granted")]
    granted_at: String,
}

/// Table row for an open flag.
#[derive(Tabled)]
struct FlagRow {
    #[tabled(rename = "Flag")]
    flag_type: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Raised")]
    raised_at: String,
}

pub fn run(ctx: &Context, cmd: &TrustCmd) -> Result<(), Box<dyn std::error::Error>> {
    let stores = load_stores(&cmd.fixture)?;
    let templates = DefaultTemplateCatalog::new();
    let engine = engine(ctx, &stores, &templates);

    let now = cmd.at.unwrap_or_else(Utc::now);
    let profile = engine.trust_profile(&cmd.content_id, now)?;

    match ctx.format {
        OutputFormat::Json => println!("{}", format_json(&profile)),
        OutputFormat::Table => print_profile(&profile),
    }
    Ok(())
}

fn print_profile(profile: &ContentTrustProfile) {
    let summary = vec![
        FieldRow::new("Content", &profile.content_id),
        FieldRow::new("Effective reach", profile.effective_reach),
        FieldRow::new("Candidate reach", profile.candidate_reach),
        FieldRow::new("Trust score", format!("{:.4}", profile.trust_score)),
        FieldRow::new("Endorsements", profile.endorsement_count),
        FieldRow::new("Open flags", join_or_dash(profile.open_flag_types())),
        FieldRow::new("Computed at", profile.computed_at.to_rfc3339()),
    ];
    println!("{}", format_table(&summary));

    if profile.has_attestations() {
        let rows: Vec<AttestationRow> = profile
            .active_attestations
            .iter()
            .chain(profile.historical_attestations.iter())
            .map(|a| AttestationRow {
                id: a.id.clone(),
                attestation_type: a.attestation_type.to_string(),
                reach: a.reach_granted.to_string(),
                status: a.status.to_string(),
                granted_at: a.granted_at.to_rfc3339(),
            })
            .collect();
        println!("\nAttestations:");
        println!("{}", format_table(&rows));
    }

    if !profile.flags.is_empty() {
        let rows: Vec<FlagRow> = profile
            .flags
            .iter()
            .map(|f| FlagRow {
                flag_type: f.flag_type.to_string(),
                source: match &f.source {
                    FlagSource::Explicit { flag_id } => format!("flag {}", flag_id),
                    FlagSource::Attestation { attestation_id } => format!("attestation {}", attestation_id),
                },
                raised_at: f.raised_at.to_rfc3339(),
            })
            .collect();
        println!("\nFlags:");
        println!("{}", format_table(&rows));
    }
}
