//! Composition of the profile page: who is signed in, which issues belong to them and what the
//! header and feed are built from.

use tracing::debug;

use crate::{
    Result,
    backend::{AuthSession, IssuesSource, Session},
    header::ProfileEditor,
    posts::{Post, PostsSection},
    repository::{Issue, IssueFilter, Profile},
};

/// Name shown for a profile: the full name, else the email, else nothing.
pub fn display_name(profile: Option<&Profile>) -> String {
    profile
        .map(|p| {
            if p.full_name.is_empty() {
                p.email.clone()
            } else {
                p.full_name.clone()
            }
        })
        .unwrap_or_default()
}

/// Issues to request for `session`. Without a user the listing is unfiltered.
pub fn issue_filter(session: &Session) -> IssueFilter {
    IssueFilter::reporter(session.user_id())
}

/// Posts for the feed. Nothing is shown while issues are still loading.
pub fn visible_posts(issues: Option<&[Issue]>) -> Vec<Post> {
    issues
        .unwrap_or_default()
        .iter()
        .map(Post::from)
        .collect()
}

/// Data behind one profile page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfilePage {
    session: Session,
    /// `None` while loading
    issues: Option<Vec<Issue>>,
}

impl ProfilePage {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            issues: None,
        }
    }

    /// Read the session, then the issues reported by its user.
    pub fn load(auth: &impl AuthSession, source: &impl IssuesSource) -> Result<Self> {
        let mut page = Self::new(auth.session()?);
        let issues = source.issues(&page.begin_issue_load())?;
        debug!("Loaded {} issues for the profile page", issues.len());
        page.set_issues(issues);

        Ok(page)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.session.profile.as_ref()
    }

    pub fn issues(&self) -> Option<&[Issue]> {
        self.issues.as_deref()
    }

    pub fn set_session(&mut self, session: Session) {
        if self.session.user_id() != session.user_id() {
            self.issues = None;
        }
        self.session = session;
    }

    /// Forget the current issues until a new listing arrives, returning the filter to load it with.
    pub fn begin_issue_load(&mut self) -> IssueFilter {
        self.issues = None;
        self.issue_filter()
    }

    pub fn set_issues(&mut self, issues: Vec<Issue>) {
        self.issues = Some(issues);
    }

    pub fn display_name(&self) -> String {
        display_name(self.profile())
    }

    pub fn issue_filter(&self) -> IssueFilter {
        issue_filter(&self.session)
    }

    pub fn posts_section(&self) -> PostsSection {
        PostsSection::new(
            &self.display_name(),
            self.profile().and_then(|p| p.avatar_url.as_deref()),
            visible_posts(self.issues()),
        )
    }

    /// Header editor for the session's profile. Only the signed-in user owns it.
    pub fn editor(&self) -> Option<ProfileEditor> {
        let profile = self.profile()?;
        let is_owner = self.session.user_id() == Some(profile.user_id.as_str());

        Some(ProfileEditor::new(profile.clone(), is_owner))
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;

    use super::{ProfilePage, display_name, issue_filter, visible_posts};
    use crate::{
        Repository,
        backend::{AuthSession, Session, User},
        posts::{FeedContent, NO_POSTS},
        repository::{BannerOffset, IssueFilter, NewIssue, NewProfile, Profile},
    };

    fn profile(full_name: &str, email: &str) -> Profile {
        Profile {
            user_id: "u1".into(),
            full_name: full_name.into(),
            email: email.into(),
            phone: String::new(),
            avatar_url: None,
            banner_url: None,
            banner_offset_y: BannerOffset::default(),
            updated_at: None,
        }
    }

    #[test]
    fn test_display_name_fallbacks() {
        assert_eq!(display_name(Some(&profile("Ada", "ada@x.test"))), "Ada");
        assert_eq!(display_name(Some(&profile("", "ada@x.test"))), "ada@x.test");
        assert_eq!(display_name(Some(&profile("", ""))), "");
        assert_eq!(display_name(None), "");
    }

    #[test]
    fn test_issue_filter() {
        assert_eq!(issue_filter(&Session::default()), IssueFilter::default());

        let session = Session {
            user: Some(User { id: "u1".into() }),
            profile: None,
        };
        assert_eq!(
            issue_filter(&session).reporter_id.as_deref(),
            Some("u1")
        );
    }

    #[test]
    fn test_no_posts_while_loading() {
        assert!(visible_posts(None).is_empty());

        let page = ProfilePage::new(Session::default());
        assert_eq!(
            page.posts_section().render(Utc::now()),
            FeedContent::Placeholder(NO_POSTS)
        );
    }

    #[test]
    fn test_load_from_repository() {
        let repo = Repository::mock();
        repo.add_profile(NewProfile::new("u1", "ada@example.com").full_name("Ada Lovelace"))
            .unwrap();
        repo.add_issue("u1", NewIssue::new("Pothole", "Pothole on 5th"))
            .unwrap();
        repo.add_issue("u2", NewIssue::new("Graffiti", "On the bridge"))
            .unwrap();
        repo.sign_in("u1").unwrap();

        let page = ProfilePage::load(&repo, &repo).unwrap();

        assert_eq!(page.display_name(), "Ada Lovelace");
        let posts = page.posts_section();
        assert_eq!(posts.posts().len(), 1);
        assert_eq!(posts.posts().first().unwrap().content, "Pothole on 5th");
        assert!(page.editor().unwrap().is_owner());
    }

    #[test]
    fn test_signed_out_page_lists_everything() {
        let repo = Repository::mock();
        repo.add_issue("u1", NewIssue::new("Pothole", "Pothole on 5th"))
            .unwrap();
        repo.add_issue("u2", NewIssue::new("Graffiti", "On the bridge"))
            .unwrap();

        let page = ProfilePage::load(&repo, &repo).unwrap();

        assert!(page.editor().is_none());
        assert_eq!(page.issues().unwrap().len(), 2);
    }

    #[test]
    fn test_changing_user_resets_issues() {
        let mut page = ProfilePage::new(Session::default());
        page.set_issues(Vec::new());

        page.set_session(Session {
            user: Some(User { id: "u1".into() }),
            profile: None,
        });

        assert!(page.issues().is_none());
    }

    #[test]
    fn test_reload_for_same_user_hides_stale_issues() {
        let repo = Repository::mock();
        repo.add_profile(NewProfile::new("u1", "ada@example.com"))
            .unwrap();
        repo.add_issue("u1", NewIssue::new("Pothole", "Pothole on 5th"))
            .unwrap();
        repo.sign_in("u1").unwrap();

        let mut page = ProfilePage::load(&repo, &repo).unwrap();
        assert_eq!(page.issues().unwrap().len(), 1);

        page.set_session(repo.session().unwrap());
        let filter = page.begin_issue_load();

        assert!(page.issues().is_none());
        assert_eq!(
            page.posts_section().render(Utc::now()),
            FeedContent::Placeholder(NO_POSTS)
        );
        assert_eq!(filter.reporter_id.as_deref(), Some("u1"));
    }
}
