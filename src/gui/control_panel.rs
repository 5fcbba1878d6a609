//! Control Panel Widget
//! Left side panel with data folder, metric and country selection controls.

use crate::data::{parse_selection, Metric, ValidCountryList};
use egui::{Color32, ComboBox, RichText, ScrollArea};
use std::path::PathBuf;

/// Left side control panel with data source, metric and country selection.
pub struct ControlPanel {
    pub data_dir: PathBuf,
    pub metric: Metric,
    pub countries: ValidCountryList,
    pub selected: Vec<bool>,
    pub search: String,
    pub entry: String,
    pub entry_feedback: Option<String>,
    pub progress: f32,
    pub status: String,
    pub export_enabled: bool,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self::new(PathBuf::from("data"))
    }
}

impl ControlPanel {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            metric: Metric::default(),
            countries: ValidCountryList::default(),
            selected: Vec::new(),
            search: String::new(),
            entry: String::new(),
            entry_feedback: None,
            progress: 0.0,
            status: "Ready".to_string(),
            export_enabled: false,
        }
    }

    /// Replace the country list after a load, keeping selections that still exist.
    pub fn update_countries(&mut self, countries: ValidCountryList) {
        let previous = self.selected_countries();
        self.selected = countries
            .iter()
            .map(|c| previous.iter().any(|p| p == c))
            .collect();
        self.countries = countries;
    }

    /// Selected countries in list order.
    pub fn selected_countries(&self) -> Vec<String> {
        self.countries
            .iter()
            .zip(self.selected.iter())
            .filter(|(_, &selected)| selected)
            .map(|(country, _)| country.to_string())
            .collect()
    }

    /// Select every valid name typed in the entry box and report the rest.
    pub fn apply_entry(&mut self) -> bool {
        let selection = parse_selection(&self.entry, &self.countries);
        let mut changed = false;
        for (country, selected) in self.countries.iter().zip(self.selected.iter_mut()) {
            if !*selected && selection.accepted.iter().any(|a| a == country) {
                *selected = true;
                changed = true;
            }
        }

        self.entry_feedback = if selection.rejected.is_empty() {
            None
        } else {
            Some(
                selection
                    .rejected
                    .iter()
                    .map(|c| format!("{c} is not a valid entry"))
                    .collect::<Vec<_>>()
                    .join("\n"),
            )
        };
        self.entry.clear();
        changed
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🦠 COVID Charts")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("Confirmed · Deaths · Recovered")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Folder Section =====
        ui.label(RichText::new("📁 Data Folder").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(self.data_dir.display().to_string()).size(12.0));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("🔄").on_hover_text("Reload").clicked() {
                            action = ControlPanelAction::Reload;
                        }
                        if ui.button("📂 Browse").clicked() {
                            action = ControlPanelAction::BrowseFolder;
                        }
                    });
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Metric Section =====
        ui.label(RichText::new("📈 Metric").size(14.0).strong());
        ui.add_space(5.0);

        ComboBox::from_id_salt("metric")
            .width(220.0)
            .selected_text(self.metric.label())
            .show_ui(ui, |ui| {
                for metric in Metric::ALL {
                    if ui
                        .selectable_value(&mut self.metric, metric, metric.label())
                        .changed()
                    {
                        action = ControlPanelAction::SelectionChanged;
                    }
                }
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Country Section =====
        ui.label(
            RichText::new(format!(
                "🌍 Countries ({} of {})",
                self.selected.iter().filter(|s| **s).count(),
                self.countries.len()
            ))
            .size(14.0)
            .strong(),
        );
        ui.add_space(5.0);

        ui.horizontal(|ui| {
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.entry)
                    .hint_text("China, Italy, US")
                    .desired_width(200.0),
            );
            let submitted =
                response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if (ui.button("Add").clicked() || submitted) && self.apply_entry() {
                action = ControlPanelAction::SelectionChanged;
            }
        });

        if let Some(feedback) = &self.entry_feedback {
            ui.label(
                RichText::new(feedback)
                    .size(11.0)
                    .color(Color32::from_rgb(220, 53, 69)),
            );
        }

        if self.countries.is_empty() {
            ui.label(
                RichText::new("No countries loaded")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        }

        ui.add_space(5.0);
        ui.add(egui::TextEdit::singleline(&mut self.search).hint_text("🔍 Search countries"));
        ui.add_space(5.0);

        let needle = self.search.to_lowercase();
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(5.0)
            .show(ui, |ui| {
                ScrollArea::vertical()
                    .id_salt("countries")
                    .max_height(260.0)
                    .show(ui, |ui| {
                        for (country, selected) in
                            self.countries.iter().zip(self.selected.iter_mut())
                        {
                            if !needle.is_empty() && !country.to_lowercase().contains(&needle) {
                                continue;
                            }
                            if ui.checkbox(selected, country).changed() {
                                action = ControlPanelAction::SelectionChanged;
                            }
                        }
                    });
            });

        ui.add_space(5.0);
        ui.horizontal(|ui| {
            if ui.small_button("Clear All").clicked() {
                self.selected.iter_mut().for_each(|v| *v = false);
                action = ControlPanelAction::SelectionChanged;
            }
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Action Buttons =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.export_enabled, |ui| {
                let button = egui::Button::new(RichText::new("🖼 Export PNG").size(14.0))
                    .min_size(egui::vec2(150.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::ExportPng;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Progress Section =====
        ui.label(RichText::new("📊 Progress").size(14.0).strong());
        ui.add_space(5.0);

        ui.add(
            egui::ProgressBar::new(self.progress / 100.0)
                .show_percentage()
                .animate(self.progress > 0.0 && self.progress < 100.0),
        );

        ui.add_space(5.0);

        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.contains("Complete") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    /// Set progress and status
    pub fn set_progress(&mut self, progress: f32, status: &str) {
        self.progress = progress;
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseFolder,
    Reload,
    SelectionChanged,
    ExportPng,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel() -> ControlPanel {
        let mut panel = ControlPanel::default();
        panel.update_countries(ValidCountryList::new(
            ["China", "Italy", "South Korea"].into_iter().map(String::from),
        ));
        panel
    }

    #[test]
    fn entry_selects_valid_and_reports_invalid() {
        let mut panel = panel();
        panel.entry = "Italy, Narnia, Oz".to_string();
        assert!(panel.apply_entry());
        assert_eq!(panel.selected_countries(), vec!["Italy"]);
        assert_eq!(
            panel.entry_feedback.as_deref(),
            Some("Narnia is not a valid entry\nOz is not a valid entry")
        );
        assert!(panel.entry.is_empty());
    }

    #[test]
    fn reselecting_is_not_a_change() {
        let mut panel = panel();
        panel.entry = "China".to_string();
        assert!(panel.apply_entry());
        panel.entry = "China".to_string();
        assert!(!panel.apply_entry());
        assert_eq!(panel.entry_feedback, None);
    }

    #[test]
    fn reload_keeps_surviving_selections() {
        let mut panel = panel();
        panel.entry = "China, South Korea".to_string();
        panel.apply_entry();
        panel.update_countries(ValidCountryList::new(
            ["South Korea", "US"].into_iter().map(String::from),
        ));
        assert_eq!(panel.selected_countries(), vec!["South Korea"]);
        assert_eq!(panel.selected.len(), 2);
    }
}
