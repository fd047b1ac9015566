use include_dir::{Dir, include_dir};
use iced::widget::{Svg, svg};
use tracing::warn;

static ICONS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/assets/icons");

/// Load a bundled icon by file stem, e.g. `icon("camera")`.
pub fn icon(name: &str) -> Svg<'static> {
    let handle = match ICONS.get_file(format!("{name}.svg")) {
        Some(file) => svg::Handle::from_memory(file.contents()),
        None => {
            warn!("Missing icon {name}");
            svg::Handle::from_memory(Vec::<u8>::new())
        }
    };

    svg(handle).width(16).height(16)
}
