use crate::{
    config::{Config, KNOWN_KEYS},
    display::{print_info, print_success, print_warning, prompt_confirm},
    CliError, Result,
};
use clap::Subcommand;
use log::debug;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the configuration with secrets masked
    Show,
    /// Print one value, e.g. `lium config get ssh.user`
    Get { key: String },
    /// Set one value
    Set { key: String, value: String },
    /// Remove one value
    Unset { key: String },
    /// Print the config file path
    Path,
    /// Remove every setting
    Reset {
        #[arg(short, long)]
        yes: bool,
    },
    /// Open the config file in $EDITOR
    Edit,
}

pub async fn handle(action: ConfigCommands, config: &mut Config) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let rendered = config.show();
            if rendered.trim().is_empty() {
                print_info("No configuration yet. Run 'lium init'.");
            } else {
                println!("{}", rendered.trim_end());
            }
        }
        ConfigCommands::Get { key } => match config.get(&key)? {
            Some(value) => println!("{}", value),
            None => {
                return Err(CliError::NotFound(format!("{} is not set", key)));
            }
        },
        ConfigCommands::Set { key, value } => {
            config.set(&key, &value)?;
            config.save()?;
            print_success(&format!("Set {}", key));
        }
        ConfigCommands::Unset { key } => {
            if config.unset(&key)? {
                config.save()?;
                print_success(&format!("Removed {}", key));
            } else {
                print_warning(&format!("{} was not set", key));
            }
        }
        ConfigCommands::Path => println!("{}", config.config_path.display()),
        ConfigCommands::Reset { yes } => {
            if !yes && !prompt_confirm("Remove all configuration, API key included?", false)? {
                print_info("Cancelled");
                return Ok(());
            }
            config.reset();
            config.save()?;
            print_success("Configuration reset");
        }
        ConfigCommands::Edit => edit(config).await?,
    }
    Ok(())
}

async fn edit(config: &Config) -> Result<()> {
    if !config.config_path.exists() {
        config.save()?;
    }

    let editor = std::env::var("EDITOR")
        .ok()
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| "vi".to_string());
    let mut parts = editor.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| CliError::InvalidInput("EDITOR is empty".to_string()))?;
    debug!("opening {} with {}", config.config_path.display(), editor);

    let status = tokio::process::Command::new(program)
        .args(parts)
        .arg(&config.config_path)
        .status()
        .await
        .map_err(|e| CliError::OperationFailed(format!("Editor not found: {} ({})", program, e)))?;
    if !status.success() {
        return Err(CliError::OperationFailed(format!(
            "{} exited with {}",
            program,
            status.code().unwrap_or(-1)
        )));
    }

    // Re-read so a broken edit is reported right away
    let dir = config
        .config_path
        .parent()
        .ok_or_else(|| CliError::OperationFailed("Config path has no parent".to_string()))?;
    match Config::load_from(dir) {
        Ok(_) => print_success("Configuration saved"),
        Err(e) => print_warning(&format!(
            "Config file no longer parses: {}. Known keys: {}",
            e,
            KNOWN_KEYS.join(", ")
        )),
    }
    Ok(())
}
