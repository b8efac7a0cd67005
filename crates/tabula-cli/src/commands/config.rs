use anyhow::{Result, bail};
use colored::Colorize;
use tabula_infrastructure::{ConfigService, TabulaPaths};

use crate::render;

pub fn show(paths: &TabulaPaths) -> Result<()> {
    let config = ConfigService::new(paths).load()?;
    let rendered = toml::to_string_pretty(&config)?;
    println!("{}", format!("# {}", paths.config_file().display()).dimmed());
    print!("{}", rendered);
    Ok(())
}

pub fn paths(paths: &TabulaPaths) -> Result<()> {
    println!("{:<8} {}", "config".bold(), paths.config_file().display());
    println!("{:<8} {}", "token".bold(), paths.token_file().display());
    println!("{:<8} {}", "logs".bold(), paths.logs_dir().display());
    Ok(())
}

pub fn set_api_url(paths: &TabulaPaths, url: &str) -> Result<()> {
    let url = url.trim().trim_end_matches('/');
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        bail!("The API URL must start with http:// or https://");
    }

    ConfigService::new(paths).update(|config| {
        config.api.base_url = url.to_string();
        Ok(())
    })?;
    render::success(&format!("API URL set to {}", url.cyan()));
    Ok(())
}
