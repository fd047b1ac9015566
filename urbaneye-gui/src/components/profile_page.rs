use chrono::{DateTime, Utc};
use iced::{
    Element,
    Length::Fill,
    Task,
    widget::{center, column, container, scrollable, text},
};
use tokio::task::spawn_blocking;
use tracing::{error, warn};
use urbaneye_lib::{
    Repository,
    backend::{AuthSession, IssuesSource, Session},
    page,
    repository::{Issue, IssueFilter},
};

use crate::components::{
    Notice, posts_section,
    profile_header::{self, ProfileHeader},
};

const MAX_WIDTH: f32 = 896.0;

#[derive(Debug, Clone)]
pub enum Message {
    SessionLoaded(Result<Session, String>),
    IssuesLoaded(Result<Vec<Issue>, String>),
    Tick(DateTime<Utc>),
    // Components
    Header(profile_header::Message),
}

/// Action used for communicating with the parent component
#[derive(Debug)]
pub enum Action {
    None,
    Run(Task<Message>),
    Notify(Notice),
    /// The profile was saved; run the reload task
    Saved(Task<Message>),
}

#[derive(Debug, Clone)]
pub enum State {
    Loading,
    Error(String),
    Loaded,
}

pub struct ProfilePage {
    repo: Repository,
    state: State,
    page: page::ProfilePage,
    now: DateTime<Utc>,
    // Components
    header: Option<ProfileHeader>,
}

impl ProfilePage {
    pub fn new(repo: Repository) -> (Self, Task<Message>) {
        (
            Self {
                repo: repo.clone(),
                state: State::Loading,
                page: page::ProfilePage::default(),
                now: Utc::now(),
                header: None,
            },
            load_session(repo),
        )
    }

    pub fn refresh(&self) -> Task<Message> {
        load_session(self.repo.clone())
    }

    pub fn update(&mut self, message: Message) -> Action {
        match message {
            Message::SessionLoaded(Ok(session)) => {
                self.state = State::Loaded;
                self.page.set_session(session);
                self.sync_header();

                Action::Run(load_issues(self.repo.clone(), self.page.begin_issue_load()))
            }
            Message::SessionLoaded(Err(e)) => {
                error!("Failed to load session: {e}");
                self.state = State::Error(e);
                Action::None
            }
            Message::IssuesLoaded(Ok(issues)) => {
                self.page.set_issues(issues);
                Action::None
            }
            Message::IssuesLoaded(Err(e)) => {
                warn!("Failed to load issues: {e}");
                Action::Notify(Notice::error("Could not load posts", e))
            }
            Message::Tick(now) => {
                self.now = now;
                Action::None
            }
            Message::Header(message) => {
                let Some(header) = self.header.as_mut() else {
                    return Action::None;
                };

                match header.update(message) {
                    profile_header::Action::None => Action::None,
                    profile_header::Action::Run(task) => Action::Run(task.map(Message::Header)),
                    profile_header::Action::Notify(notice) => Action::Notify(notice),
                    profile_header::Action::Saved => Action::Saved(self.refresh()),
                }
            }
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        match &self.state {
            State::Loading => center(text("Loading profile...")).into(),
            State::Error(e) => center(text(e)).into(),
            State::Loaded => {
                let Some(header) = &self.header else {
                    return center(text(
                        "No one is signed in. Run `urbaneye session sign-in <user-id>` first.",
                    ))
                    .into();
                };

                let content = column![
                    container(header.view().map(Message::Header)).style(container::bordered_box),
                    posts_section::view(
                        &self.page.posts_section(),
                        self.repo.storage(),
                        self.now
                    ),
                ]
                .spacing(32)
                .padding(32)
                .max_width(MAX_WIDTH);

                scrollable(container(content).center_x(Fill)).into()
            }
        }
    }

    /// Keep the header in step with the session: a new user gets a new editor, the same user
    /// just has their profile refreshed.
    fn sync_header(&mut self) {
        let Some(profile) = self.page.profile().cloned() else {
            self.header = None;
            return;
        };

        if let Some(header) = self
            .header
            .as_mut()
            .filter(|h| h.editor().user_id() == profile.user_id)
        {
            header.sync(profile);
            return;
        }

        self.header = self
            .page
            .editor()
            .map(|editor| ProfileHeader::new(self.repo.clone(), editor));
    }
}

fn load_session(repo: Repository) -> Task<Message> {
    Task::perform(
        async move {
            spawn_blocking(move || repo.session().map_err(|e| e.to_string()))
                .await
                .unwrap_or_else(|e| Err(e.to_string()))
        },
        Message::SessionLoaded,
    )
}

fn load_issues(repo: Repository, filter: IssueFilter) -> Task<Message> {
    Task::perform(
        async move {
            spawn_blocking(move || repo.issues(&filter).map_err(|e| e.to_string()))
                .await
                .unwrap_or_else(|e| Err(e.to_string()))
        },
        Message::IssuesLoaded,
    )
}
