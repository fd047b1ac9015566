//! The post feed shown under the profile header.
//!
//! Posts are a view of the user's reported issues. They are projected on every render and never
//! stored.

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::repository::Issue;

pub const HEADING: &str = "Recent Posts";
pub const NO_POSTS: &str = "No posts yet.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub likes: u64,
    pub comments: u64,
}

impl From<&Issue> for Post {
    fn from(issue: &Issue) -> Self {
        Self {
            id: issue.id.clone(),
            content: issue.description.clone(),
            created_at: issue.created_at,
            likes: issue.votes_count,
            comments: 0,
        }
    }
}

/// One rendered post, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostCard {
    pub id: String,
    pub author: String,
    pub author_initials: String,
    pub author_avatar: Option<String>,
    pub posted: String,
    pub content: String,
    pub likes: String,
    pub comments: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedContent {
    /// Shown instead of cards when there is nothing to list
    Placeholder(&'static str),
    Cards(Vec<PostCard>),
}

#[derive(Debug, Clone)]
pub struct PostsSection {
    display_name: String,
    avatar_url: Option<String>,
    posts: Vec<Post>,
}

impl PostsSection {
    pub fn new(display_name: &str, avatar_url: Option<&str>, posts: Vec<Post>) -> Self {
        Self {
            display_name: display_name.to_string(),
            avatar_url: avatar_url.filter(|url| !url.is_empty()).map(str::to_string),
            posts,
        }
    }

    pub fn heading(&self) -> &'static str {
        HEADING
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    /// Cards in input order, with times relative to `now`.
    pub fn render(&self, now: DateTime<Utc>) -> FeedContent {
        if self.posts.is_empty() {
            return FeedContent::Placeholder(NO_POSTS);
        }

        let initials = initials(&self.display_name);

        FeedContent::Cards(
            self.posts
                .iter()
                .map(|post| PostCard {
                    id: post.id.clone(),
                    author: self.display_name.clone(),
                    author_initials: initials.clone(),
                    author_avatar: self.avatar_url.clone(),
                    posted: relative_time(post.created_at, now),
                    content: post.content.clone(),
                    likes: format!("{} likes", post.likes),
                    comments: format!("{} comments", post.comments),
                })
                .collect(),
        )
    }
}

/// First character of every word in `name`.
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .collect()
}

const MINUTES_IN_HOUR: i64 = 60;
const MINUTES_IN_DAY: i64 = 1440;
const MINUTES_IN_ALMOST_TWO_DAYS: i64 = 2520;
const MINUTES_IN_MONTH: i64 = 43200;

/// Human label for how far `time` is from `now`, e.g. `3 days ago` or `in about 1 hour`.
pub fn relative_time(time: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let (earlier, later) = if time <= now { (time, now) } else { (now, time) };
    let distance = distance(earlier, later);

    if time <= now {
        format!("{distance} ago")
    } else {
        format!("in {distance}")
    }
}

fn distance(earlier: DateTime<Utc>, later: DateTime<Utc>) -> String {
    let seconds = (later - earlier).num_seconds();
    let minutes = round_div(seconds, 60);

    if minutes < 2 {
        return match minutes {
            0 => "less than a minute".into(),
            _ => "1 minute".into(),
        };
    }
    if minutes < 45 {
        return format!("{minutes} minutes");
    }
    if minutes < 90 {
        return "about 1 hour".into();
    }
    if minutes < MINUTES_IN_DAY {
        return format!("about {} hours", round_div(minutes, MINUTES_IN_HOUR));
    }
    if minutes < MINUTES_IN_ALMOST_TWO_DAYS {
        return "1 day".into();
    }
    if minutes < MINUTES_IN_MONTH {
        return plural(round_div(minutes, MINUTES_IN_DAY), "day");
    }
    if minutes < MINUTES_IN_MONTH.saturating_mul(2) {
        return format!("about {}", plural(round_div(minutes, MINUTES_IN_MONTH), "month"));
    }

    let months = calendar_months(earlier, later);
    if months < 12 {
        return plural(round_div(minutes, MINUTES_IN_MONTH), "month");
    }

    let years = months.div_euclid(12);
    match months.rem_euclid(12) {
        0..3 => format!("about {}", plural(years, "year")),
        3..9 => format!("over {}", plural(years, "year")),
        _ => format!("almost {}", plural(years.saturating_add(1), "year")),
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

/// `value / by` rounded half up, for non-negative values.
fn round_div(value: i64, by: i64) -> i64 {
    value
        .saturating_mul(2)
        .saturating_add(by)
        .div_euclid(by.saturating_mul(2))
}

/// Whole calendar months from `earlier` to `later`.
fn calendar_months(earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
    let months = i64::from(later.year())
        .saturating_sub(i64::from(earlier.year()))
        .saturating_mul(12)
        .saturating_add(i64::from(later.month()))
        .saturating_sub(i64::from(earlier.month()));

    let within = |t: DateTime<Utc>| (t.day(), t.num_seconds_from_midnight(), t.nanosecond());
    if within(later) < within(earlier) {
        months.saturating_sub(1)
    } else {
        months
    }
}

#[cfg(test)]
mod test {
    use chrono::{Duration, TimeZone, Utc};

    use super::{FeedContent, HEADING, NO_POSTS, Post, PostsSection, initials, relative_time};
    use crate::repository::{Issue, IssueCategory, IssuePriority, IssueStatus};

    fn issue() -> Issue {
        Issue {
            id: "i1".into(),
            reporter_id: "u1".into(),
            title: "Pothole".into(),
            description: "Pothole on 5th".into(),
            category: IssueCategory::Roads,
            priority: IssuePriority::High,
            status: IssueStatus::New,
            votes_count: 4,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_post_from_issue() {
        let post = Post::from(&issue());

        assert_eq!(post.id, "i1");
        assert_eq!(post.content, "Pothole on 5th");
        assert_eq!(post.likes, 4);
        assert_eq!(post.comments, 0);
        assert_eq!(post.created_at, issue().created_at);
    }

    #[test]
    fn test_empty_feed() {
        let section = PostsSection::new("Ada Lovelace", None, Vec::new());

        assert_eq!(section.heading(), HEADING);
        assert_eq!(section.render(Utc::now()), FeedContent::Placeholder(NO_POSTS));
    }

    #[test]
    fn test_render_cards() {
        let now = Utc.with_ymd_and_hms(2024, 1, 4, 0, 0, 0).unwrap();
        let section = PostsSection::new("Ada Lovelace", Some(""), vec![Post::from(&issue())]);

        let FeedContent::Cards(cards) = section.render(now) else {
            panic!("expected cards");
        };

        assert_eq!(cards.len(), 1);
        let card = cards.first().unwrap();
        assert_eq!(card.author, "Ada Lovelace");
        assert_eq!(card.author_initials, "AL");
        assert_eq!(card.author_avatar, None);
        assert_eq!(card.posted, "3 days ago");
        assert_eq!(card.content, "Pothole on 5th");
        assert_eq!(card.likes, "4 likes");
        assert_eq!(card.comments, "0 comments");
    }

    #[test]
    fn test_render_keeps_order() {
        let now = Utc::now();
        let posts = ["b", "a", "c"]
            .into_iter()
            .map(|id| Post {
                id: id.into(),
                content: String::new(),
                created_at: now,
                likes: 0,
                comments: 0,
            })
            .collect();

        let FeedContent::Cards(cards) = PostsSection::new("", None, posts).render(now) else {
            panic!("expected cards");
        };

        let ids: Vec<_> = cards.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["b", "a", "c"]);
    }

    #[test]
    fn test_initials() {
        assert_eq!(initials("Ada Lovelace"), "AL");
        assert_eq!(initials("  grace   brewster hopper "), "gbh");
        assert_eq!(initials(""), "");
    }

    #[test]
    fn test_relative_time() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let ago = |d: Duration| relative_time(now - d, now);

        assert_eq!(ago(Duration::seconds(10)), "less than a minute ago");
        assert_eq!(ago(Duration::seconds(80)), "1 minute ago");
        assert_eq!(ago(Duration::minutes(12)), "12 minutes ago");
        assert_eq!(ago(Duration::minutes(50)), "about 1 hour ago");
        assert_eq!(ago(Duration::hours(5)), "about 5 hours ago");
        assert_eq!(ago(Duration::hours(30)), "1 day ago");
        assert_eq!(ago(Duration::days(3)), "3 days ago");
        assert_eq!(ago(Duration::days(40)), "about 1 month ago");
        assert_eq!(ago(Duration::days(150)), "5 months ago");
        assert_eq!(ago(Duration::days(400)), "about 1 year ago");
        assert_eq!(ago(Duration::days(600)), "over 1 year ago");
        assert_eq!(ago(Duration::days(700)), "almost 2 years ago");
    }

    #[test]
    fn test_relative_time_future() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();

        assert_eq!(
            relative_time(now + Duration::minutes(60), now),
            "in about 1 hour"
        );
        assert_eq!(relative_time(now + Duration::days(2), now), "in 2 days");
    }
}
