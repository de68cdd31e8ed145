//! Defines custom traits, trait implementations for `egui` types, and general utility traits.
//!
//! This module centralizes extensions to existing types (`egui::Context`, `egui::Ui`,
//! `std::path::Path`, `Vec`) and defines interfaces (`Notification`) for common UI patterns.
//! It interacts primarily with `layout.rs` (for styling, notifications) and `container.rs`
//! (for sortable headers).

use crate::SortState;

use egui::{
    Align, Color32,
    FontFamily::Proportional,
    FontId, Frame, Layout, Response, Spacing, Stroke, Style,
    TextStyle::{Body, Button, Heading, Monospace, Small},
    Ui, Vec2, Visuals, Window,
    style::ScrollStyle,
};

use std::{collections::HashSet, ffi::OsStr, hash::Hash, path::Path};

/// Defines custom text styles for the egui context.
/// Overrides default `egui` font sizes for different logical text styles (Heading, Body, etc.).
/// Used by `MyStyle::set_style_init`.
pub const CUSTOM_TEXT_STYLE: [(egui::TextStyle, egui::FontId); 5] = [
    (Heading, FontId::new(18.0, Proportional)),
    (Body, FontId::new(16.0, Proportional)),
    (Button, FontId::new(16.0, Proportional)),
    (Monospace, FontId::new(15.0, Proportional)), // Adjusted size for Proportional font
    (Small, FontId::new(14.0, Proportional)),
];

/// A trait for applying custom styling to the `egui` context (`Context`).
/// Used at startup and on every theme toggle by `layout.rs`.
pub trait MyStyle {
    /// Applies a pre-defined application style to the `egui` context.
    fn set_style_init(&self, visuals: Visuals);
}

impl MyStyle for egui::Context {
    /// Configures the application's look and feel (theme, spacing, text styles).
    fn set_style_init(&self, visuals: Visuals) {
        let scroll = ScrollStyle {
            handle_min_length: 32.0,
            ..ScrollStyle::default()
        };

        let spacing = Spacing {
            scroll,
            item_spacing: [8.0, 6.0].into(),
            ..Spacing::default()
        };

        let style = Style {
            visuals,                               // Apply provided theme (Light/Dark).
            spacing,                               // Apply custom spacing.
            text_styles: CUSTOM_TEXT_STYLE.into(), // Apply custom text styles.
            ..Style::default()
        };

        self.set_style(style);
    }
}

/// Trait for modal Notification windows (like errors).
/// Allows `layout.rs` to manage different notification types polymorphically
/// via `Box<dyn Notification>`.
pub trait Notification: Send + Sync + 'static {
    /// Renders the notification window using `egui::Window`.
    /// Called repeatedly by `layout.rs::check_notification` while the notification is active.
    ///
    /// ### Returns
    /// `true` if the window should remain open, `false` if closed.
    fn show(&mut self, ctx: &egui::Context) -> bool;
}

/// Notification struct for displaying error messages. Implements `Notification`.
pub struct Error {
    /// The error message content. Set by the caller in `layout.rs`.
    pub message: String,
}

impl Notification for Error {
    /// Renders the Error notification window.
    fn show(&mut self, ctx: &egui::Context) -> bool {
        let mut open = true;

        Window::new("Error")
            .collapsible(false)
            .open(&mut open)
            .show(ctx, |ui| {
                let width_max = ui.available_width() * 0.80;
                ui.allocate_ui_with_layout(
                    Vec2::new(width_max, ui.available_height()),
                    Layout::top_down(Align::LEFT),
                    |ui| {
                        Frame::default()
                            .fill(Color32::from_rgb(255, 200, 200)) // Light red bg
                            .stroke(Stroke::new(1.0, Color32::DARK_RED)) // Dark red border
                            .outer_margin(2.0)
                            .inner_margin(10.0)
                            .show(ui, |ui| {
                                ui.colored_label(Color32::BLACK, &self.message);
                                ui.disable();
                            });
                    },
                );
            });

        open
    }
}

/// Adds interactions beyond the standard egui widgets.
/// Used by `container.rs` to render the clickable sort header of each column.
pub trait ExtraInteractions {
    /// Renders a sort button showing the column name with a state icon.
    /// A click stores the next state of the cycle in `current`.
    ///
    /// ### Arguments
    /// * `current`: The grid's active sort criterion, updated on click.
    /// * `state`: The sort state of *this* column (NotSorted, Ascending or Descending).
    fn sort_button(&mut self, current: &mut Option<SortState>, state: SortState) -> Response;
}

impl ExtraInteractions for Ui {
    fn sort_button(&mut self, current: &mut Option<SortState>, state: SortState) -> Response {
        let label = format!("{} {}", state.get_icon(), state.column_name());
        let response = self
            .button(label)
            .on_hover_text(format!("Click to sort by: {}", state.column_name()));

        if response.clicked() {
            *current = Some(state.cycle_next());
        }

        response
    }
}

/// Trait to extend `Path` with a convenient method for getting the lowercase file extension.
/// Used by `export.rs` to map a chosen save path to an export format.
pub trait PathExtension {
    /// Returns the file extension as a lowercase `String`, or `None`.
    fn extension_as_lowercase(&self) -> Option<String>;
}

impl PathExtension for Path {
    /// Implementation for `Path`. Gets extension, converts to &str (lossy), then lowercases.
    fn extension_as_lowercase(&self) -> Option<String> {
        self.extension()
            .and_then(OsStr::to_str)
            .map(str::to_lowercase)
    }
}

/// A trait for deduplicating vectors while preserving the original order of elements.
/// Added to `Vec<T>`. Used by `history.rs` for the recent-query list.
pub trait UniqueElements<T> {
    /// Removes duplicate elements in place, keeping the first occurrence.
    fn unique(&mut self)
    where
        T: Eq + Hash + Clone;
}

impl<T> UniqueElements<T> for Vec<T> {
    /// Implementation using `HashSet` for efficiency.
    fn unique(&mut self)
    where
        T: Eq + Hash + Clone, // Constraints required for HashSet.
    {
        let mut seen = HashSet::new();
        self.retain(|x| seen.insert(x.clone()));
    }
}

// --- Unit Tests ---

#[cfg(test)]
mod tests_path_extension {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_extension_as_lowercase_some() {
        let path = PathBuf::from("results.CSV");
        assert_eq!(path.extension_as_lowercase(), Some("csv".to_string()));
    }

    #[test]
    fn test_extension_as_lowercase_none() {
        let path = PathBuf::from("results");
        assert_eq!(path.extension_as_lowercase(), None);
    }

    #[test]
    fn test_extension_as_lowercase_multiple_dots() {
        let path = PathBuf::from("customers_query_results.backup.json");
        assert_eq!(path.extension_as_lowercase(), Some("json".to_string()));
    }
}

#[cfg(test)]
mod tests_unique {
    use super::*;

    #[test]
    fn test_unique() {
        let mut vec = vec![1, 2, 2, 3, 1, 4, 3, 2, 5];
        vec.unique();
        assert_eq!(vec, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_unique_strings() {
        let mut vec = vec!["a", "b", "b", "c", "a"];
        vec.unique();
        assert_eq!(vec, vec!["a", "b", "c"]);
    }
}
