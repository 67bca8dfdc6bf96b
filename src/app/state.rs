//! Transient view state
//!
//! Nothing here is persisted; every session starts from the defaults.

use std::fmt;
use std::str::FromStr;

/// Width of the reading column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContentWidth {
    #[default]
    Standard,
    Wide,
    Narrow,
}

impl FromStr for ContentWidth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" | "default" => Ok(ContentWidth::Standard),
            "wide" => Ok(ContentWidth::Wide),
            "narrow" => Ok(ContentWidth::Narrow),
            other => Err(format!("unknown width {other:?} (standard, wide, narrow)")),
        }
    }
}

impl fmt::Display for ContentWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContentWidth::Standard => "standard",
            ContentWidth::Wide => "wide",
            ContentWidth::Narrow => "narrow",
        };
        f.write_str(name)
    }
}

/// Which overlays and panels are showing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    pub notes_open: bool,
    pub sidebar_open: bool,
    pub command_palette_open: bool,
    pub search_open: bool,
    pub content_width: ContentWidth,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            notes_open: false,
            sidebar_open: true,
            command_palette_open: false,
            search_open: false,
            content_width: ContentWidth::Standard,
        }
    }
}

impl UiState {
    pub fn open_notes(&mut self) {
        self.notes_open = true;
    }

    pub fn close_notes(&mut self) {
        self.notes_open = false;
    }

    pub fn toggle_notes(&mut self) {
        self.notes_open = !self.notes_open;
    }

    pub fn set_content_width(&mut self, width: ContentWidth) {
        self.content_width = width;
    }

    /// Show the sidebar; the reading column returns to standard width
    pub fn open_sidebar(&mut self) {
        self.sidebar_open = true;
        self.content_width = ContentWidth::Standard;
    }

    /// Hide the sidebar, keeping the chosen width
    pub fn close_sidebar(&mut self) {
        self.sidebar_open = false;
    }

    /// Toggle the sidebar ("zen mode"); returns whether it is now open
    pub fn toggle_sidebar(&mut self) -> bool {
        if self.sidebar_open {
            self.close_sidebar();
        } else {
            self.open_sidebar();
        }
        self.sidebar_open
    }

    pub fn open_command_palette(&mut self) {
        self.command_palette_open = true;
    }

    pub fn close_command_palette(&mut self) {
        self.command_palette_open = false;
    }

    pub fn toggle_command_palette(&mut self) {
        self.command_palette_open = !self.command_palette_open;
    }

    pub fn open_search(&mut self) {
        self.search_open = true;
    }

    pub fn close_search(&mut self) {
        self.search_open = false;
    }

    pub fn toggle_search(&mut self) {
        self.search_open = !self.search_open;
    }

    /// Close every overlay, as Escape does
    pub fn dismiss_overlays(&mut self) {
        self.notes_open = false;
        self.command_palette_open = false;
        self.search_open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let ui = UiState::default();
        assert!(ui.sidebar_open);
        assert!(!ui.notes_open);
        assert!(!ui.search_open);
        assert_eq!(ui.content_width, ContentWidth::Standard);
    }

    #[test]
    fn toggles_flip_flags() {
        let mut ui = UiState::default();
        ui.toggle_notes();
        ui.toggle_search();
        ui.toggle_command_palette();
        assert!(ui.notes_open && ui.search_open && ui.command_palette_open);

        ui.dismiss_overlays();
        assert!(!ui.notes_open && !ui.search_open && !ui.command_palette_open);
    }

    #[test]
    fn closing_sidebar_keeps_width() {
        let mut ui = UiState::default();
        ui.set_content_width(ContentWidth::Wide);
        assert!(!ui.toggle_sidebar());
        assert_eq!(ui.content_width, ContentWidth::Wide);
    }

    #[test]
    fn reopening_sidebar_resets_width() {
        let mut ui = UiState::default();
        ui.close_sidebar();
        ui.set_content_width(ContentWidth::Narrow);

        assert!(ui.toggle_sidebar());
        assert_eq!(ui.content_width, ContentWidth::Standard);
    }

    #[test]
    fn width_parses() {
        assert_eq!("WIDE".parse::<ContentWidth>().unwrap(), ContentWidth::Wide);
        assert!("huge".parse::<ContentWidth>().is_err());
    }
}
