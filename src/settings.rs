use std::path::PathBuf;

use crate::components::tools::{
    parse_hex_color, to_hex_color, ToolState, DEFAULT_BRUSH_WIDTH, DEFAULT_ERASER_WIDTH, MAX_WIDTH, MIN_WIDTH,
};

const SETTINGS_FILE_NAME: &str = "diary_draw.cfg";

pub const DEFAULT_CANVAS_WIDTH: u32 = 600;
pub const DEFAULT_CANVAS_HEIGHT: u32 = 400;

/// Persistent preferences for the drawing window, stored as `key=value`
/// lines.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawSettings {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub brush_color: [u8; 3],
    pub brush_width: u32,
    pub eraser_width: u32,
    pub opacity: u8,
    /// Where `drawing_YYYY-MM-DD.png` files live.  Empty means the settings
    /// directory.
    pub data_dir: String,
}

impl Default for DrawSettings {
    fn default() -> Self {
        Self {
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
            brush_color: [0, 0, 0],
            brush_width: DEFAULT_BRUSH_WIDTH,
            eraser_width: DEFAULT_ERASER_WIDTH,
            opacity: 255,
            data_dir: String::new(),
        }
    }
}

impl DrawSettings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/diary-draw/diary_draw.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\DiaryDraw\diary_draw.cfg
    /// On macOS:   ~/Library/Application Support/DiaryDraw/diary_draw.cfg
    pub(crate) fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
                    PathBuf::from(home).join(".config")
                })
                .join("diary-draw");
            let _ = std::fs::create_dir_all(&config_dir);
            return Some(config_dir.join(SETTINGS_FILE_NAME));
        }
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA").or_else(|_| std::env::var("USERPROFILE")).ok()?;
            let config_dir = PathBuf::from(appdata).join("DiaryDraw");
            let _ = std::fs::create_dir_all(&config_dir);
            return Some(config_dir.join(SETTINGS_FILE_NAME));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").ok()?;
            let config_dir = PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("DiaryDraw");
            let _ = std::fs::create_dir_all(&config_dir);
            return Some(config_dir.join(SETTINGS_FILE_NAME));
        }
        #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
        {
            std::env::current_exe().ok().and_then(|p| p.parent().map(|d| d.join(SETTINGS_FILE_NAME)))
        }
    }

    /// Load settings from disk (defaults if the file is missing or unreadable).
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else { return Self::default() };
        let Ok(content) = std::fs::read_to_string(&path) else { return Self::default() };
        Self::parse(&content)
    }

    /// Save settings to disk.  Failures are logged, not fatal.
    pub fn save(&self) {
        let Some(path) = Self::settings_path() else { return };
        if let Err(e) = std::fs::write(&path, self.to_config_string()) {
            crate::log_warn!("Could not save settings to {}: {}", path.display(), e);
        }
    }

    /// Parse `key=value` lines.  Unknown keys are skipped; malformed values
    /// keep their default.
    pub fn parse(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else { continue };
            let val = val.trim();
            match key.trim() {
                "canvas_width" => {
                    if let Some(v) = val.parse().ok().filter(|v| *v > 0) {
                        s.canvas_width = v;
                    }
                }
                "canvas_height" => {
                    if let Some(v) = val.parse().ok().filter(|v| *v > 0) {
                        s.canvas_height = v;
                    }
                }
                "brush_color" => {
                    s.brush_color = parse_hex_color(val).unwrap_or([0, 0, 0]);
                }
                "brush_width" => {
                    if let Ok(v) = val.parse::<u32>() {
                        s.brush_width = v.clamp(MIN_WIDTH, MAX_WIDTH);
                    }
                }
                "eraser_width" => {
                    if let Ok(v) = val.parse::<u32>() {
                        s.eraser_width = v.clamp(MIN_WIDTH, MAX_WIDTH);
                    }
                }
                "opacity" => {
                    if let Ok(v) = val.parse() {
                        s.opacity = v;
                    }
                }
                "data_dir" => s.data_dir = val.to_string(),
                _ => {}
            }
        }
        s
    }

    pub fn to_config_string(&self) -> String {
        let mut content = String::new();
        content.push_str(&format!("canvas_width={}\n", self.canvas_width));
        content.push_str(&format!("canvas_height={}\n", self.canvas_height));
        content.push_str(&format!("brush_color={}\n", to_hex_color(self.brush_color)));
        content.push_str(&format!("brush_width={}\n", self.brush_width));
        content.push_str(&format!("eraser_width={}\n", self.eraser_width));
        content.push_str(&format!("opacity={}\n", self.opacity));
        content.push_str(&format!("data_dir={}\n", self.data_dir));
        content
    }

    /// Initial tool state for a new drawing window.
    pub fn tool_state(&self) -> ToolState {
        ToolState::new(self.brush_color, self.brush_width, self.eraser_width, self.opacity)
    }

    /// Copy with the tool preferences taken from `tools`.
    pub fn with_tools(&self, tools: &ToolState) -> Self {
        Self {
            brush_color: tools.color(),
            brush_width: tools.brush_width(),
            eraser_width: tools.eraser_width(),
            opacity: tools.opacity(),
            ..self.clone()
        }
    }

    /// Directory that holds the per-date drawing files.
    pub fn resolved_data_dir(&self) -> PathBuf {
        if !self.data_dir.is_empty() {
            return PathBuf::from(&self.data_dir);
        }
        Self::settings_path()
            .and_then(|p| p.parent().map(|d| d.to_path_buf()))
            .unwrap_or_else(|| crate::logger::data_dir().join("DiaryDraw"))
    }
}
