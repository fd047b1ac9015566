use chrono::Utc;
use clap::Subcommand;
use colored::Colorize;
use urbaneye_lib::{
    Error, Repository, Result,
    backend::AuthSession,
    header::ProfileEditor,
    page::{ProfilePage, display_name},
    repository::{BannerOffset, NewProfile, Profile},
};

use crate::field;

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show a profile, the signed-in user's by default
    Show {
        #[arg(long)]
        user: Option<String>,
    },
    /// List every profile
    List,
    /// Register a new profile
    Add {
        user_id: String,
        email: String,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Edit the signed-in user's profile
    Set {
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        /// Vertical banner position in pixels, clamped to -200..=200
        #[arg(long, allow_hyphen_values = true)]
        banner_offset: Option<f64>,
    },
}

pub fn handle(repo: &Repository, cmd: &Command) -> Result<()> {
    match cmd {
        Command::Show { user } => {
            let profile = match user {
                Some(user_id) => repo
                    .profile(user_id)?
                    .ok_or_else(|| Error::ProfileNotFound(user_id.clone()))?,
                None => signed_in_editor(repo)?.profile().clone(),
            };
            print_profile(&profile);
        }
        Command::List => {
            for profile in repo.profiles()? {
                println!(
                    "{} {}",
                    profile.user_id.bold(),
                    display_name(Some(&profile))
                );
            }
        }
        Command::Add {
            user_id,
            email,
            full_name,
            phone,
        } => {
            let mut new_profile = NewProfile::new(user_id, email);
            if let Some(full_name) = full_name {
                new_profile = new_profile.full_name(full_name);
            }
            if let Some(phone) = phone {
                new_profile = new_profile.phone(phone);
            }

            let profile = repo.add_profile(new_profile)?;
            println!("Added profile {}", profile.user_id.bold());
        }
        Command::Set {
            full_name,
            email,
            phone,
            banner_offset,
        } => {
            let mut editor = signed_in_editor(repo)?;
            editor.begin_edit();

            if let Some(full_name) = full_name {
                editor.set_full_name(full_name.clone());
            }
            if let Some(email) = email {
                editor.set_email(email.clone());
            }
            if let Some(phone) = phone {
                editor.set_phone(phone.clone());
            }
            if let Some(offset) = banner_offset {
                editor.set_banner_offset(BannerOffset::new(*offset));
            }

            editor.save(repo, Utc::now())?;
            println!("{}", "Profile updated".green());
            print_profile(editor.profile());
        }
    }

    Ok(())
}

/// Editor over the signed-in user's own profile.
pub fn signed_in_editor(repo: &Repository) -> Result<ProfileEditor> {
    let page = ProfilePage::new(repo.session()?);
    let user_id = page.session().user_id().ok_or(Error::NotSignedIn)?;

    page.editor()
        .ok_or_else(|| Error::ProfileNotFound(user_id.to_string()))
}

fn print_profile(profile: &Profile) {
    println!("{}", display_name(Some(profile)).bold());
    field("user", &profile.user_id);
    field("email", &profile.email);
    field("phone", &profile.phone);
    field("avatar", profile.avatar_url.as_deref().unwrap_or("-"));
    field("banner", profile.banner_url.as_deref().unwrap_or("-"));
    field("banner offset", profile.banner_offset_y);
    if let Some(updated_at) = profile.updated_at {
        field("updated", updated_at.to_rfc3339());
    }
}
