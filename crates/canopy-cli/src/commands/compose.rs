// crates/canopy-cli/src/commands/compose.rs
//
// `canopy compose` command: compose feedback profiles along a learning path.

use clap::Args;

use canopy_core::FeedbackProfile;
use canopy_feedback::compose_for_path;

use super::{read_json, Context};
use crate::output::{format_json, format_table, join_or_dash, FieldRow, OutputFormat};

#[derive(Debug, Args)]
pub struct ComposeCmd {
    /// JSON file holding an array of feedback profiles, one per path item.
    #[arg(long)]
    pub profiles: String,
}

pub fn run(ctx: &Context, cmd: &ComposeCmd) -> Result<(), Box<dyn std::error::Error>> {
    let profiles: Vec<FeedbackProfile> = read_json(&cmd.profiles)?;
    let composed = compose_for_path(&profiles);
    tracing::debug!("Composed {} profiles", profiles.len());

    match ctx.format {
        OutputFormat::Json => println!("{}", format_json(&composed)),
        OutputFormat::Table => {
            let rows = vec![
                FieldRow::new("Content items", join_or_dash(&composed.content_ids)),
                FieldRow::new("Permitted", join_or_dash(&composed.permitted_mechanisms)),
                FieldRow::new("Prohibited", join_or_dash(&composed.prohibited_mechanisms)),
                FieldRow::new("Min friction", format!("{:?}", composed.min_friction()).to_lowercase()),
            ];
            println!("{}", format_table(&rows));
        }
    }
    Ok(())
}
