use super::{sdk, OutputFormat};
use crate::{config::Config, display::display_templates_table, Result};
use clap::Args;

#[derive(Args, Debug)]
pub struct TemplatesArgs {
    /// Only templates whose name or image contains this text
    #[arg(value_name = "SEARCH")]
    pub search: Option<String>,

    /// Only templates you own
    #[arg(short, long)]
    pub mine: bool,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

pub async fn handle(args: TemplatesArgs, config: &Config) -> Result<()> {
    let lium = sdk(config)?;
    let templates = lium.templates(args.search.as_deref(), args.mine).await?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&templates)?),
        _ => display_templates_table(&templates),
    }
    Ok(())
}
