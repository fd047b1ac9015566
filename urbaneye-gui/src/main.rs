use std::{sync::Arc, time::Duration};

use chrono::Utc;
use iced::{
    Color, Element, Length, Subscription, Task, Theme, application,
    widget::{button, center, column, container, mouse_area, opaque, row, space, stack, text},
};
use parking_lot::RwLock;
use tracing::{Level, error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use urbaneye_lib::Repository;

use crate::{
    components::{
        Notice,
        profile_page::{self, ProfilePage},
    },
    config::{Cfg, GuiConfig},
    icons::icon,
};

pub mod components;
pub mod config;
pub mod icons;

fn main() -> iced::Result {
    // Human friendly panicking in release mode
    human_panic::setup_panic!();

    // Logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::TRACE)
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    let repo = match Repository::new() {
        Ok(repo) => repo,
        Err(e) => {
            error!("Failed to open the Urban Eye data store: {e}");
            std::process::exit(1);
        }
    };

    #[cfg(feature = "debug")]
    if let Err(e) = seed(&repo) {
        error!("Failed to seed demo data: {e}");
    }

    application(move || App::new(repo.clone()), App::update, App::view)
        .subscription(App::subscription)
        .theme(App::theme)
        .title(App::title)
        .run()
}

#[derive(Debug, Clone)]
enum Message {
    ProfilePage(profile_page::Message),
    Tick,
    DismissNotice,
}

struct App {
    title: String,
    cfg: Cfg,
    notice: Option<Notice>,
    // Components
    profile_page: ProfilePage,
}

impl App {
    pub fn new(repo: Repository) -> (Self, Task<Message>) {
        let cfg = Arc::new(RwLock::new(GuiConfig::load()));
        let (profile_page, profile_page_task) = ProfilePage::new(repo);

        (
            Self {
                title: "Urban Eye".into(),
                cfg,
                notice: None,
                profile_page,
            },
            profile_page_task.map(Message::ProfilePage),
        )
    }

    // Update application state based on messages passed by view()
    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            // Redirect messages to relevant child components
            Message::ProfilePage(message) => match self.profile_page.update(message) {
                profile_page::Action::None => Task::none(),
                profile_page::Action::Run(task) => task.map(Message::ProfilePage),
                profile_page::Action::Notify(notice) => {
                    self.notice = Some(notice);
                    Task::none()
                }
                profile_page::Action::Saved(task) => {
                    info!("Profile saved");
                    self.notice = Some(Notice::info(
                        "Profile updated",
                        "Your changes have been saved.",
                    ));
                    task.map(Message::ProfilePage)
                }
            },
            Message::Tick => self
                .update(Message::ProfilePage(profile_page::Message::Tick(Utc::now()))),
            Message::DismissNotice => {
                self.notice = None;
                Task::none()
            }
        }
    }

    // Render the application and pass along messages from components to update()
    pub fn view(&self) -> Element<'_, Message> {
        let content = self.profile_page.view().map(Message::ProfilePage);

        match &self.notice {
            Some(notice) => modal(
                content,
                notice_card(notice),
                Some(Message::DismissNotice),
            ),
            None => content,
        }
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let secs = self.cfg.read().profile_page.clock_interval_secs.max(1);
        iced::time::every(Duration::from_secs(secs)).map(|_| Message::Tick)
    }

    pub fn title(&self) -> String {
        self.title.clone()
    }

    pub fn theme(&self) -> Theme {
        self.cfg.read().theme()
    }
}

fn notice_card(notice: &Notice) -> Element<'_, Message> {
    let title = text(&notice.title).size(18);
    let title = if notice.error {
        title.style(text::danger)
    } else {
        title
    };

    container(
        column![
            row![
                title,
                space::horizontal(),
                button(icon("close"))
                    .style(button::text)
                    .on_press(Message::DismissNotice)
            ],
            text(&notice.description),
        ]
        .spacing(8),
    )
    .padding(20)
    .width(360)
    .style(container::rounded_box)
    .into()
}

pub fn modal<'a, Message>(
    base: impl Into<Element<'a, Message>>,
    content: impl Into<Element<'a, Message>>,
    on_click_outside: Option<Message>,
) -> Element<'a, Message>
where
    Message: Clone + 'a,
{
    let mouse_area = mouse_area(center(opaque(content)).style(|_theme| {
        container::Style {
            background: Some(
                Color {
                    a: 0.8,
                    ..Color::BLACK
                }
                .into(),
            ),
            ..container::Style::default()
        }
    }));

    stack![
        base.into(),
        opaque(if let Some(msg) = on_click_outside {
            mouse_area.on_press(msg)
        } else {
            mouse_area
        })
    ]
    .width(Length::Fill)
    .height(Length::Fill)
    .into()
}

/// Fill an empty data store with a signed-in demo user and a few reports.
#[cfg(feature = "debug")]
fn seed(repo: &Repository) -> urbaneye_lib::Result<()> {
    use urbaneye_lib::repository::{IssueCategory, IssuePriority, NewIssue, NewProfile};

    if !repo.profiles()?.is_empty() {
        return Ok(());
    }

    let profile = repo.add_profile(
        NewProfile::new("demo", "demo@urbaneye.test")
            .full_name("Demo Citizen")
            .phone("+910000000000"),
    )?;

    for (title, description, category, priority) in [
        (
            "Pothole",
            "Deep pothole near the bus stop on 5th Avenue",
            IssueCategory::Roads,
            IssuePriority::High,
        ),
        (
            "Streetlight out",
            "The streetlight outside building 12 has been dark for a week",
            IssueCategory::Streetlights,
            IssuePriority::Medium,
        ),
        (
            "Overflowing bins",
            "Garbage bins in the park are overflowing",
            IssueCategory::WasteManagement,
            IssuePriority::Low,
        ),
    ] {
        repo.add_issue(
            &profile.user_id,
            NewIssue::new(title, description)
                .category(category)
                .priority(priority),
        )?;
    }

    repo.sign_in(&profile.user_id)
}
