use anyhow::{Context, Result};

use crate::config;
use crate::render::Render;

use super::connect;

pub async fn run(cfg: &config::Config) -> Result<()> {
    let (session, client) = connect(cfg)?;

    let tracks = client.list_tracks().await.context("Failed to fetch tracks")?;
    if tracks.is_empty() {
        println!("No tracks.");
    }
    for track in &tracks {
        println!("{}", track.render());
    }

    session.dispose();
    Ok(())
}
