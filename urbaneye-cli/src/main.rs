use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use sysexits::ExitCode;
use tracing::{Level, debug};
use urbaneye_lib::{Error, Repository};

mod issue;
mod posts;
mod profile;
mod session;
mod upload;

#[derive(Parser, Debug)]
#[command(name = "urbaneye")]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log more, repeat for even more
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Operate on profiles
    #[command(subcommand)]
    Profile(profile::Command),
    /// Sign in and out
    #[command(subcommand)]
    Session(session::Command),
    /// Operate on reported issues
    #[command(subcommand)]
    Issue(issue::Command),
    /// Show the post feed of the signed-in user
    Posts,
    /// Replace a profile image
    #[command(subcommand)]
    Upload(upload::Command),
}

fn main() -> ExitCode {
    human_panic::setup_panic!();

    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let result = Repository::new().and_then(|repo| match &cli.command {
        Command::Profile(cmd) => profile::handle(&repo, cmd),
        Command::Session(cmd) => session::handle(&repo, cmd),
        Command::Issue(cmd) => issue::handle(&repo, cmd),
        Command::Posts => posts::handle(&repo),
        Command::Upload(cmd) => upload::handle(&repo, cmd),
    });

    match result {
        Ok(()) => ExitCode::Ok,
        Err(e) => {
            debug!("{e:?}");
            eprintln!("{} {e}", "error:".red().bold());
            exit_code(&e)
        }
    }
}

fn exit_code(error: &Error) -> ExitCode {
    match error {
        Error::Internal(_) | Error::NotEditing => ExitCode::Software,
        Error::Io(_) => ExitCode::IoErr,
        Error::ProfileNotFound(_) => ExitCode::NoUser,
        Error::IssueNotFound(_) => ExitCode::NoInput,
        Error::DuplicateProfile(_) | Error::AlreadyVoted { .. } => ExitCode::CantCreat,
        Error::NotSignedIn => ExitCode::NoPerm,
        Error::InvalidTimestamp(_) | Error::InvalidObjectPath(_) => ExitCode::DataErr,
    }
}

/// `label: value` with the label dimmed, for record listings.
fn field(label: &str, value: impl std::fmt::Display) {
    println!("{} {value}", format!("{label}:").dimmed());
}
