use chrono::Utc;
use colored::Colorize;
use urbaneye_lib::{
    Error, Repository, Result,
    page::ProfilePage,
    posts::FeedContent,
};

pub fn handle(repo: &Repository) -> Result<()> {
    let page = ProfilePage::load(repo, repo)?;
    if page.session().user_id().is_none() {
        return Err(Error::NotSignedIn);
    }

    let section = page.posts_section();
    println!("{}", section.heading().bold().underline());

    match section.render(Utc::now()) {
        FeedContent::Placeholder(placeholder) => println!("{}", placeholder.dimmed()),
        FeedContent::Cards(cards) => {
            for card in cards {
                println!();
                println!(
                    "{} {} {}",
                    format!("[{}]", card.author_initials).cyan(),
                    card.author.bold(),
                    card.posted.dimmed()
                );
                println!("{}", card.content);
                println!("{}", format!("{}  {}", card.likes, card.comments).dimmed());
            }
        }
    }

    Ok(())
}
