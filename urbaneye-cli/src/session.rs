use clap::Subcommand;
use colored::Colorize;
use urbaneye_lib::{Repository, Result, backend::AuthSession, page::display_name};

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Sign in as an existing user
    SignIn { user_id: String },
    /// Forget the signed-in user
    SignOut,
    /// Show who is signed in
    Show,
}

pub fn handle(repo: &Repository, cmd: &Command) -> Result<()> {
    match cmd {
        Command::SignIn { user_id } => {
            repo.sign_in(user_id)?;
            println!("Signed in as {}", user_id.bold());
        }
        Command::SignOut => {
            repo.sign_out()?;
            println!("Signed out");
        }
        Command::Show => {
            let session = repo.session()?;
            match session.user_id() {
                Some(user_id) => {
                    let name = display_name(session.profile.as_ref());
                    println!("Signed in as {} ({name})", user_id.bold());
                }
                None => println!("{}", "Not signed in".yellow()),
            }
        }
    }

    Ok(())
}
