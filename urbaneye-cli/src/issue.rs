use std::str::FromStr;

use chrono::Utc;
use clap::Subcommand;
use colored::Colorize;
use urbaneye_lib::{
    Error, Repository, Result,
    backend::{AuthSession, IssuesSource},
    page::issue_filter,
    posts::relative_time,
    repository::{Issue, IssueCategory, IssueFilter, IssuePriority, IssueStatus, NewIssue},
};

use crate::field;

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List issues, the signed-in user's by default
    List {
        /// Only issues reported by this user
        #[arg(long, conflicts_with = "all")]
        reporter: Option<String>,
        /// Issues from every reporter
        #[arg(long)]
        all: bool,
        #[arg(long, value_parser = IssueCategory::from_str)]
        category: Option<IssueCategory>,
        #[arg(long, value_parser = IssueStatus::from_str)]
        status: Option<IssueStatus>,
        #[arg(long, value_parser = IssuePriority::from_str)]
        priority: Option<IssuePriority>,
    },
    /// Report a new issue as the signed-in user
    Add {
        title: String,
        description: String,
        #[arg(long, value_parser = IssueCategory::from_str)]
        category: Option<IssueCategory>,
        #[arg(long, value_parser = IssuePriority::from_str)]
        priority: Option<IssuePriority>,
    },
    /// Upvote an issue as the signed-in user
    Vote { id: String },
    /// Move an issue to a new status
    Status {
        id: String,
        #[arg(value_parser = IssueStatus::from_str)]
        status: IssueStatus,
    },
    /// Count issues by status, category and priority
    Stats {
        #[arg(long)]
        all: bool,
    },
}

pub fn handle(repo: &Repository, cmd: &Command) -> Result<()> {
    match cmd {
        Command::List {
            reporter,
            all,
            category,
            status,
            priority,
        } => {
            let filter = match (reporter, all) {
                (Some(reporter), _) => IssueFilter::reporter(Some(reporter.as_str())),
                (None, true) => IssueFilter::default(),
                (None, false) => issue_filter(&repo.session()?),
            }
            .category(*category)
            .status(*status)
            .priority(*priority);

            let issues = repo.issues(&filter)?;
            if issues.is_empty() {
                println!("{}", "No issues".dimmed());
            }
            for issue in &issues {
                print_issue(issue);
            }
        }
        Command::Add {
            title,
            description,
            category,
            priority,
        } => {
            let session = repo.session()?;
            let reporter = session.user_id().ok_or(Error::NotSignedIn)?;

            let new_issue = NewIssue::new(title, description)
                .category(category.unwrap_or_default())
                .priority(priority.unwrap_or_default());
            let issue = repo.add_issue(reporter, new_issue)?;

            println!("Reported issue {}", issue.id.bold());
        }
        Command::Vote { id } => {
            let session = repo.session()?;
            let voter = session.user_id().ok_or(Error::NotSignedIn)?;

            let issue = repo.vote(id, voter)?;
            println!("{} now has {} votes", issue.title.bold(), issue.votes_count);
        }
        Command::Status { id, status } => {
            let issue = repo.set_issue_status(id, *status)?;
            println!("{} is now {}", issue.title.bold(), issue.status);
        }
        Command::Stats { all } => {
            let filter = if *all {
                IssueFilter::default()
            } else {
                issue_filter(&repo.session()?)
            };
            let stats = repo.issue_stats(&filter)?;

            field("total", stats.total);
            field("votes", stats.votes);
            for (status, count) in &stats.by_status {
                field(&format!("status {status}"), count);
            }
            for (category, count) in &stats.by_category {
                field(&format!("category {category}"), count);
            }
            for (priority, count) in &stats.by_priority {
                field(&format!("priority {priority}"), count);
            }
        }
    }

    Ok(())
}

fn print_issue(issue: &Issue) {
    let status = match issue.status {
        IssueStatus::New => issue.status.to_string().cyan(),
        IssueStatus::Acknowledged | IssueStatus::InProgress => issue.status.to_string().yellow(),
        IssueStatus::Resolved => issue.status.to_string().green(),
        IssueStatus::Rejected => issue.status.to_string().red(),
    };

    println!(
        "{} [{status}] {} {}",
        issue.id.dimmed(),
        issue.title.bold(),
        format!(
            "({}, {}, {} votes, {})",
            issue.category,
            issue.priority,
            issue.votes_count,
            relative_time(issue.created_at, Utc::now())
        )
        .dimmed()
    );
}
