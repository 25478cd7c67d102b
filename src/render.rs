use std::sync::OnceLock;

use streamdeck_lib::Context;
use streamdeck_render::{Canvas, FontHandle, FontRegistry, TextOptions, WrapOptions, wrap_text};
use tracing::warn;

use crate::clock::format_time;

/// DSEG7 ships in the plugin bundle, which is the working directory Stream
/// Deck starts the plugin in.
const FONT_PATH: &str = "fonts/DSEG7Classic-Bold.ttf";

static FONT: OnceLock<Option<FontHandle>> = OnceLock::new();

fn font() -> Option<&'static FontHandle> {
    FONT.get_or_init(|| {
        let bytes = match std::fs::read(FONT_PATH) {
            Ok(b) => b,
            Err(e) => {
                warn!(path = FONT_PATH, "seven-segment font unavailable: {e}");
                return None;
            }
        };
        // Loaded once for the life of the process.
        let bytes: &'static [u8] = Vec::leak(bytes);
        let mut reg = FontRegistry::new();
        match reg.load_bytes("dseg7", bytes) {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(path = FONT_PATH, "seven-segment font rejected: {e:?}");
                None
            }
        }
    })
    .as_ref()
}

/// Render the counter value over the elapsed `HH:MM:SS` readout (144×144 PNG).
///
/// Both lines share one font size, the largest at which each fits on a
/// single line.
pub fn render_display(cx: &Context, ctx_id: &str, value: i64, elapsed_secs: u64) {
    let Some(font) = font() else {
        return;
    };
    let [value_text, clock_text] = face_text(value, elapsed_secs);

    let sizes = [44.0_f32, 36.0, 28.0, 22.0, 16.0];
    let max_width = 136.0_f32;
    let opts = WrapOptions { max_width, max_lines: 1 };

    let fits = |size: f32, text: &str| {
        let lines = wrap_text(font, size, text, &opts);
        lines.len() == 1 && lines[0].width_px <= max_width
    };
    let size = sizes
        .iter()
        .copied()
        .find(|&size| fits(size, &value_text) && fits(size, &clock_text))
        .unwrap_or(16.0);

    let mut lines = wrap_text(font, size, &value_text, &opts);
    lines.extend(wrap_text(font, size, &clock_text, &opts));

    let mut canvas = Canvas::key_icon();
    canvas.draw_text(&lines, &TextOptions::new(font.clone(), size)).ok();

    if let Ok(data_url) = canvas.finish().to_data_url() {
        cx.sd().set_image(ctx_id, Some(data_url), None, None);
    }
}

/// The two lines on the key face.
fn face_text(value: i64, elapsed_secs: u64) -> [String; 2] {
    [value.to_string(), format_time(elapsed_secs)]
}
