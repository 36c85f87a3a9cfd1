use ratatui::style::Color;

// Dark palette with an indigo accent; keep new roles here instead of
// scattering raw colors through the render code.
pub const BG: Color = Color::Rgb(24, 26, 27);
pub const SURFACE: Color = Color::Rgb(35, 39, 46);
pub const BAR_BG: Color = Color::Rgb(26, 29, 31);

pub const FG: Color = Color::Rgb(229, 231, 235);
pub const MUTED: Color = Color::Rgb(156, 163, 175);
pub const DIM: Color = Color::Rgb(107, 114, 128);
pub const BORDER: Color = Color::Rgb(55, 65, 81);

pub const ACCENT: Color = Color::Rgb(99, 102, 241);
pub const ACCENT_ALT: Color = Color::Rgb(147, 51, 234);

pub const SUCCESS: Color = Color::Rgb(134, 239, 172);
pub const ERROR: Color = Color::Rgb(248, 113, 113);
