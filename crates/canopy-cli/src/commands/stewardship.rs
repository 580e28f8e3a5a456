// crates/canopy-cli/src/commands/stewardship.rs
//
// `canopy stewardship` command: show who stewards a content item.

use clap::Args;
use tabled::Tabled;

use canopy_feedback::DefaultTemplateCatalog;

use super::{engine, load_stores, Context};
use crate::output::{format_json, format_table, FieldRow, OutputFormat};

#[derive(Debug, Args)]
pub struct StewardshipCmd {
    /// JSON store snapshot to read.
    #[arg(long)]
    pub fixture: String,

    /// Content item to show.
    #[arg(long)]
    pub content_id: String,
}

/// Table row for a live allocation.
#[derive(Tabled)]
struct AllocationRow {
    #[tabled(rename = "Steward")]
    steward_id: String,
    #[tabled(rename = "Ratio")]
    ratio: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Recognition")]
    recognition: String,
    #[tabled(rename = "Allocation")]
    id: String,
}

pub fn run(ctx: &Context, cmd: &StewardshipCmd) -> Result<(), Box<dyn std::error::Error>> {
    let stores = load_stores(&cmd.fixture)?;
    let templates = DefaultTemplateCatalog::new();
    let engine = engine(ctx, &stores, &templates);

    let view = engine.stewardship().content_stewardship(&cmd.content_id)?;

    match ctx.format {
        OutputFormat::Json => println!("{}", format_json(&view)),
        OutputFormat::Table => {
            let summary = vec![
                FieldRow::new("Content", &view.content_id),
                FieldRow::new("Stewards", view.steward_count()),
                FieldRow::new("Total ratio", format!("{:.4}", view.total_ratio)),
                FieldRow::new("Contested ratio", format!("{:.4}", view.contested_ratio)),
                FieldRow::new("Disputes", view.has_disputes),
                FieldRow::new("Primary steward", view.primary_steward.as_deref().unwrap_or("-")),
            ];
            println!("{}", format_table(&summary));

            if view.allocations.is_empty() {
                println!("No live allocations.");
            } else {
                let rows: Vec<AllocationRow> = view
                    .allocations
                    .iter()
                    .map(|a| AllocationRow {
                        steward_id: a.steward_id.clone(),
                        ratio: format!("{:.4}", a.ratio),
                        state: a.governance_state.to_string(),
                        recognition: format!("{:.2}", a.recognition_accumulated),
                        id: a.id.clone(),
                    })
                    .collect();
                println!("\n{}", format_table(&rows));
            }
        }
    }
    Ok(())
}
