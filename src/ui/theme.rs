use ratatui::style::Color;

// Small cohesive palette: near-black surfaces, gray text ramp, teal accent.
// Prefer adding roles here over sprinkling raw colors through the UI.
pub const BG: Color = Color::Rgb(13, 15, 18);
pub const SURFACE: Color = Color::Rgb(20, 24, 30);
pub const BAR_BG: Color = Color::Rgb(16, 20, 26);

pub const FG: Color = Color::Rgb(226, 229, 233);
pub const MUTED: Color = Color::Rgb(150, 158, 170);
pub const DIM: Color = Color::Rgb(100, 108, 120);
pub const BORDER: Color = Color::Rgb(52, 60, 72);

pub const ACCENT: Color = Color::Rgb(64, 199, 183);
pub const ACCENT_BG: Color = Color::Rgb(16, 42, 40);

// Semantic colors (keep minimal).
pub const SUCCESS: Color = Color::Rgb(134, 239, 172);
pub const ERROR: Color = Color::Rgb(248, 113, 113);
