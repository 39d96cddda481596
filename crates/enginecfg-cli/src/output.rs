use anyhow::Result;
use comfy_table::Table;

use crate::cli::OutputFormat;
use enginecfg_core::EnvVar;

pub fn print_env_vars(vars: &[EnvVar], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(vars)?);
        }
        OutputFormat::Text => {
            if vars.is_empty() {
                println!("No environment variables configured.");
                return Ok(());
            }
            let mut table = Table::new();
            table.set_header(vec!["NAME", "VALUE"]);
            for var in vars {
                table.add_row(vec![var.name.as_str(), var.value.as_str()]);
            }
            println!("{table}");
        }
    }
    Ok(())
}
