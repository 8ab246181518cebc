use serde_json::{Value as Json, json};

use crate::terminal::TerminalSize;
use crate::ui::render::RenderFrame;
use crate::ui::span::{clip_line, line_text};
use crate::ui::style::{Color, Style};

/// Snapshot of a frame as it would be drawn at `size`, lines clipped to the
/// terminal width.
pub fn frame_to_json(frame: &RenderFrame, size: TerminalSize) -> Json {
    let width = usize::from(size.width);
    let lines = frame
        .lines
        .iter()
        .map(|line| {
            let clipped = clip_line(line, width);
            json!({
                "text": line_text(&clipped),
                "spans": clipped
                    .iter()
                    .map(|span| json!({ "text": span.text, "style": style_to_json(span.style) }))
                    .collect::<Vec<_>>(),
            })
        })
        .collect::<Vec<_>>();

    json!({
        "terminal": {
            "width": size.width,
            "height": size.height,
        },
        "cursor": frame.cursor.map(|c| json!({ "row": c.row, "col": c.col })),
        "lines": lines,
    })
}

fn style_to_json(style: Style) -> Json {
    if style.is_plain() {
        return Json::Null;
    }
    json!({
        "color": style.color.map(color_name),
        "background": style.background.map(color_name),
        "bold": style.bold,
    })
}

fn color_name(color: Color) -> &'static str {
    match color {
        Color::Reset => "reset",
        Color::DarkGrey => "dark_grey",
        Color::Red => "red",
        Color::Green => "green",
        Color::Yellow => "yellow",
        Color::Cyan => "cyan",
        Color::White => "white",
    }
}
