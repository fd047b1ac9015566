use std::{fs, path::PathBuf};

use chrono::Utc;
use clap::Subcommand;
use colored::Colorize;
use tracing::info;
use urbaneye_lib::{
    Repository, Result,
    header::{PickedFile, UploadTarget},
};

use crate::profile::signed_in_editor;

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Replace the avatar
    Avatar { file: PathBuf },
    /// Replace the banner
    Banner { file: PathBuf },
}

pub fn handle(repo: &Repository, cmd: &Command) -> Result<()> {
    let (target, path) = match cmd {
        Command::Avatar { file } => (UploadTarget::Avatar, file),
        Command::Banner { file } => (UploadTarget::Banner, file),
    };

    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file = PickedFile::new(name, fs::read(path)?);

    let mut editor = signed_in_editor(repo)?;
    editor.begin_edit();

    let url = editor.upload(repo, target, file)?;
    info!("Uploaded {} to {url}", path.display());

    editor.save(repo, Utc::now())?;
    println!("{} {target} set to {url}", "Saved".green());

    Ok(())
}
