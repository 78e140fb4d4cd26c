use crate::config::Config;
use crate::display::print_success;
use crate::{CliError, Result};
use clap::Subcommand;
use dialoguer::{theme::ColorfulTheme, Select};

const AVAILABLE_THEMES: &[(&str, &str)] = &[
    ("default", "Coloured output"),
    ("mono", "No colours"),
];

#[derive(Subcommand, Debug)]
pub enum ThemeCommands {
    /// List available themes
    List,
    /// Set the theme; prompts when no name is given
    Set { name: Option<String> },
}

pub async fn handle(action: ThemeCommands, config: &mut Config) -> Result<()> {
    match action {
        ThemeCommands::List => {
            let current = config.theme();
            for (name, description) in AVAILABLE_THEMES {
                let marker = if *name == current { "*" } else { " " };
                println!("{} {:<8} {}", marker, name, description);
            }
            Ok(())
        }
        ThemeCommands::Set { name } => {
            let name = match name {
                Some(name) => validate(&name)?,
                None => choose()?,
            };
            config.set("ui.theme", &name)?;
            config.save()?;
            apply(&name);
            print_success(&format!("Theme set to {}", name));
            Ok(())
        }
    }
}

/// Switch colour output for the rest of the process
pub fn apply(theme: &str) {
    if theme == "mono" {
        colored::control::set_override(false);
    }
}

fn validate(name: &str) -> Result<String> {
    let name = name.trim().to_lowercase();
    if AVAILABLE_THEMES.iter().any(|(theme, _)| *theme == name) {
        Ok(name)
    } else {
        Err(CliError::InvalidInput(format!(
            "Unknown theme: {}. Use 'lium theme list' to see available themes.",
            name
        )))
    }
}

fn choose() -> Result<String> {
    let options: Vec<String> = AVAILABLE_THEMES
        .iter()
        .map(|(name, desc)| format!("{} - {}", name, desc))
        .collect();
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select a theme")
        .items(&options)
        .default(0)
        .interact()?;
    Ok(AVAILABLE_THEMES[selection].0.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_theme() {
        assert_eq!(validate("Mono").unwrap(), "mono");
        assert_eq!(validate("default").unwrap(), "default");
        assert!(validate("cyberpunk").is_err());
    }
}
