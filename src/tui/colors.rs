//! Color constants for the terminal user interface.

use ratatui::style::Color;

/// Used for "to do" style statuses
pub const SLATE: Color = Color::Rgb(135, 144, 158);
/// Used for "in progress"
pub const SKY: Color = Color::Rgb(65, 148, 246);
/// Used for "review"
pub const AMBER: Color = Color::Rgb(255, 191, 0);
/// Used for "done"
pub const DARK_GREEN: Color = Color::Rgb(0, 150, 60);
/// Accent for borders and the selected tab
pub const GOLD: Color = Color::Rgb(255, 215, 0);

/// Chart palette, cycled by bucket position.
const PALETTE: [Color; 6] = [SLATE, SKY, DARK_GREEN, AMBER, Color::Magenta, Color::Cyan];

/// Color for a status label, matched case-insensitively on common names.
pub fn status_color(key: &str) -> Color {
    match key {
        "to do" | "todo" | "open" => SLATE,
        "in progress" => SKY,
        "review" | "in review" => AMBER,
        "done" | "complete" | "closed" => DARK_GREEN,
        _ => Color::Gray,
    }
}

/// Color for the `index`-th burndown bucket, preferring the status color.
pub fn bucket_color(index: usize, key: &str) -> Color {
    match status_color(key) {
        Color::Gray => PALETTE[index % PALETTE.len()],
        c => c,
    }
}
