use anyhow::Result;
use attendance_core::BranchDirectory;
use owo_colors::OwoColorize;

use crate::config;

pub fn run(cfg: &config::Config) -> Result<()> {
    println!("{}", render(&cfg.branch_directory()));
    Ok(())
}

pub fn render(directory: &BranchDirectory) -> String {
    if directory.is_empty() {
        return "No branches configured. Add [[branches]] entries to config.toml"
            .dimmed()
            .to_string();
    }
    directory
        .iter()
        .map(|b| format!("{:>4}  {}", b.id.dimmed(), b.name))
        .collect::<Vec<_>>()
        .join("\n")
}
