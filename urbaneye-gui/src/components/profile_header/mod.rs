use chrono::Utc;
use iced::{
    Alignment, ContentFit, Element,
    Length::Fill,
    Point, Task, mouse,
    widget::{
        button, column, container, image, mouse_area, pin, row, space, stack, text, text_input,
    },
};
use rfd::AsyncFileDialog;
use tokio::task::spawn_blocking;
use tracing::{error, trace};
use urbaneye_lib::{
    Repository,
    backend::ProfileStore,
    header::{PickedFile, ProfileEditor, UploadTarget},
    repository::{BannerOffset, Profile, ProfileUpdate},
};

use crate::{
    components::{Notice, profile_header::state::PreviewCache},
    icons::icon,
};

pub mod state;

const BANNER_HEIGHT: f32 = 160.0;
const AVATAR_SIZE: f32 = 128.0;
const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "gif", "webp", "bmp", "svg"];

#[derive(Debug, Clone)]
pub enum Message {
    EditPressed,
    SavePressed,
    CancelPressed,
    FullNameInput(String),
    EmailInput(String),
    PhoneInput(String),
    PickImage(UploadTarget),
    ImagePicked(UploadTarget, Option<PickedFile>),
    Uploaded {
        target: UploadTarget,
        seq: u64,
        result: Result<String, String>,
    },
    Saved {
        update: ProfileUpdate,
        result: Result<(), String>,
    },
    RemoveBannerPressed,
    BannerHovered(Point),
    BannerPressed,
    BannerReleased,
}

/// Action used for communicating with the parent component
#[derive(Debug)]
pub enum Action {
    None,
    Run(Task<Message>),
    Notify(Notice),
    /// The profile was written, the session should be reloaded
    Saved,
}

pub struct ProfileHeader {
    repo: Repository,
    editor: ProfileEditor,
    previews: PreviewCache,
    pointer_y: f32,
}

impl ProfileHeader {
    pub fn new(repo: Repository, editor: ProfileEditor) -> Self {
        Self {
            repo,
            editor,
            previews: PreviewCache::default(),
            pointer_y: 0.0,
        }
    }

    pub fn editor(&self) -> &ProfileEditor {
        &self.editor
    }

    /// Take in a fresh profile from the session.
    pub fn sync(&mut self, profile: Profile) {
        self.editor.sync(profile);
        self.previews.retain(self.editor.draft());
    }

    pub fn update(&mut self, message: Message) -> Action {
        let action = match message {
            Message::EditPressed => {
                self.editor.begin_edit();
                Action::None
            }
            Message::SavePressed => match self.editor.begin_save(Utc::now()) {
                Some(update) => Action::Run(save(
                    self.repo.clone(),
                    self.editor.user_id().to_string(),
                    update,
                )),
                None => Action::None,
            },
            Message::Saved { update, result } => {
                self.editor.finish_save(&update, result.is_ok());

                match result {
                    Ok(()) => Action::Saved,
                    Err(e) => {
                        error!("Failed to save profile: {e}");
                        Action::Notify(Notice::error("Save failed", e))
                    }
                }
            }
            Message::CancelPressed => {
                self.editor.cancel();
                Action::None
            }
            Message::FullNameInput(content) => {
                self.editor.set_full_name(content);
                Action::None
            }
            Message::EmailInput(content) => {
                self.editor.set_email(content);
                Action::None
            }
            Message::PhoneInput(content) => {
                self.editor.set_phone(content);
                Action::None
            }
            Message::PickImage(target) => Action::Run(Task::perform(pick_image(), move |file| {
                Message::ImagePicked(target, file)
            })),
            // Dialog dismissed
            Message::ImagePicked(_, None) => Action::None,
            Message::ImagePicked(target, Some(file)) => {
                match self.editor.begin_upload(target, file) {
                    Some(pending) => {
                        self.previews.insert(pending.seq, &pending.file.bytes);

                        let repo = self.repo.clone();
                        let (seq, target) = (pending.seq, pending.target);
                        Action::Run(Task::perform(
                            async move {
                                spawn_blocking(move || {
                                    pending.run(&repo).map_err(|e| e.to_string())
                                })
                                .await
                                .unwrap_or_else(|e| Err(e.to_string()))
                            },
                            move |result| Message::Uploaded {
                                target,
                                seq,
                                result,
                            },
                        ))
                    }
                    None => Action::None,
                }
            }
            Message::Uploaded {
                target,
                seq,
                result,
            } => {
                let applied = self.editor.finish_upload(target, seq, result.clone());

                match result {
                    _ if !applied => Action::None,
                    Ok(_) => Action::Notify(Notice::info(
                        format!("{} updated", capitalized(target)),
                        "Remember to Save to persist profile.",
                    )),
                    Err(e) => {
                        error!("Failed to upload {target}: {e}");
                        Action::Notify(Notice::error(
                            "Upload failed",
                            format!("Could not upload {target}"),
                        ))
                    }
                }
            }
            Message::RemoveBannerPressed => {
                self.editor.remove_banner();
                Action::None
            }
            Message::BannerHovered(position) => {
                self.pointer_y = position.y;
                self.editor.drag_move(f64::from(position.y));
                Action::None
            }
            Message::BannerPressed => {
                self.editor.drag_start(f64::from(self.pointer_y));
                Action::None
            }
            Message::BannerReleased => {
                self.editor.drag_end();
                Action::None
            }
        };

        self.previews.retain(self.editor.draft());
        trace!("{} previews cached", self.previews.len());

        action
    }

    pub fn view(&self) -> Element<'_, Message> {
        column![self.banner(), self.identity()].into()
    }

    fn banner(&self) -> Element<'_, Message> {
        let controls = self.editor.controls();
        let draft = self.editor.draft();

        let picture: Element<'_, Message> =
            match self.previews.handle(&draft.banner, self.repo.storage()) {
                Some(handle) => pin(image(handle).width(Fill).content_fit(ContentFit::Cover))
                    .y(pixels(draft.banner_offset_y))
                    .into(),
                None => space::horizontal().into(),
            };

        let interaction = if self.editor.is_dragging() {
            mouse::Interaction::Grabbing
        } else if controls.drag_hint {
            mouse::Interaction::Grab
        } else {
            mouse::Interaction::Idle
        };

        let surface = mouse_area(
            container(picture)
                .width(Fill)
                .height(BANNER_HEIGHT)
                .clip(true)
                .style(container::primary),
        )
        .on_move(Message::BannerHovered)
        .on_press(Message::BannerPressed)
        .on_release(Message::BannerReleased)
        .on_exit(Message::BannerReleased)
        .interaction(interaction);

        let toolbar = row![
            space::horizontal(),
            controls.drag_hint.then(|| {
                container(row![icon("move"), text("Drag to reposition").size(12)].spacing(4))
                    .padding([4, 8])
                    .style(container::rounded_box)
            }),
            controls.change_cover.then(|| {
                button(row![icon("image"), text("Change cover")].spacing(4))
                    .style(button::secondary)
                    .on_press(Message::PickImage(UploadTarget::Banner))
            }),
            controls.remove_banner.then(|| {
                button(row![icon("delete"), text("Remove")].spacing(4))
                    .style(button::danger)
                    .on_press(Message::RemoveBannerPressed)
            }),
        ]
        .spacing(8)
        .padding(8);

        stack![surface, toolbar].into()
    }

    fn identity(&self) -> Element<'_, Message> {
        let controls = self.editor.controls();
        let draft = self.editor.draft();

        let avatar: Element<'_, Message> =
            match self.previews.handle(&draft.avatar, self.repo.storage()) {
                Some(handle) => image(handle)
                    .width(AVATAR_SIZE)
                    .height(AVATAR_SIZE)
                    .content_fit(ContentFit::Cover)
                    .into(),
                None => container(text(self.editor.initials()).size(28))
                    .center(AVATAR_SIZE)
                    .style(container::rounded_box)
                    .into(),
            };

        let avatar = row![
            avatar,
            controls.camera.then(|| {
                button(icon("camera"))
                    .style(button::secondary)
                    .on_press(Message::PickImage(UploadTarget::Avatar))
            })
        ]
        .align_y(Alignment::End);

        let details: Element<'_, Message> = if controls.inputs {
            column![
                text_input("Full Name", &draft.full_name)
                    .on_input(Message::FullNameInput)
                    .size(24),
                text_input("Email", &draft.email).on_input(Message::EmailInput),
                text_input("Phone Number", &draft.phone).on_input(Message::PhoneInput),
            ]
            .spacing(8)
            .into()
        } else {
            column![
                text(&draft.full_name).size(30),
                controls.contact.then(|| text(&draft.email)),
                controls.contact.then(|| text(&draft.phone)),
            ]
            .spacing(4)
            .into()
        };

        let actions = row![
            controls.save.then(|| {
                let label = if self.editor.is_saving() {
                    "Saving..."
                } else {
                    "Save"
                };
                button(row![icon("save"), text(label)].spacing(4))
                    .on_press_maybe(controls.save_enabled.then_some(Message::SavePressed))
            }),
            controls.cancel.then(|| {
                button(row![icon("close"), text("Cancel")].spacing(4))
                    .style(button::secondary)
                    .on_press(Message::CancelPressed)
            }),
            controls.edit.then(|| {
                button(row![icon("edit"), text("Edit Profile")].spacing(4))
                    .style(button::secondary)
                    .on_press(Message::EditPressed)
            }),
        ]
        .spacing(8);

        container(
            row![avatar, details, space::horizontal(), actions]
                .spacing(24)
                .align_y(Alignment::Start),
        )
        .padding(24)
        .into()
    }
}

fn save(repo: Repository, user_id: String, update: ProfileUpdate) -> Task<Message> {
    let write = update.clone();

    Task::perform(
        async move {
            spawn_blocking(move || {
                repo.update_profile(&user_id, &write)
                    .map_err(|e| e.to_string())
            })
            .await
            .unwrap_or_else(|e| Err(e.to_string()))
        },
        move |result| Message::Saved { update, result },
    )
}

async fn pick_image() -> Option<PickedFile> {
    let handle = AsyncFileDialog::new()
        .add_filter("Images", &IMAGE_EXTENSIONS)
        .pick_file()
        .await?;

    let bytes = handle.read().await;
    Some(PickedFile::new(handle.file_name(), bytes))
}

fn capitalized(target: UploadTarget) -> &'static str {
    match target {
        UploadTarget::Avatar => "Avatar",
        UploadTarget::Banner => "Banner",
    }
}

#[allow(clippy::cast_possible_truncation)] // Offsets are clamped to a few hundred pixels
fn pixels(offset: BannerOffset) -> f32 {
    offset.get() as f32
}
