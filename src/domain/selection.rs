// Series selection state for the multi-series chart
use serde::Serialize;

/// How many series are shown before the user picks any
pub const DEFAULT_SELECTED_SERIES: usize = 4;

const SERIES_COLORS: [&str; 8] = [
    "#3b82f6", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6", "#ec4899", "#06b6d4", "#f97316",
];

/// Line color for the series at `index` of the available list
pub fn series_color(index: usize) -> &'static str {
    SERIES_COLORS[index % SERIES_COLORS.len()]
}

/// The set of series the user has toggled on.
///
/// Independent of the time window, so it survives window changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesSelection {
    selected: Vec<String>,
}

impl SeriesSelection {
    pub fn new(selected: Vec<String>) -> Self {
        let mut selection = Self::default();
        for name in selected {
            if !selection.selected.contains(&name) {
                selection.selected.push(name);
            }
        }
        selection
    }

    /// Parse a comma separated list, ignoring blanks
    pub fn from_param(param: &str) -> Self {
        Self::new(
            param
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.selected.iter().any(|s| s == name)
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    /// Pre-select the first few available series when nothing is selected yet
    pub fn initialize(&mut self, available: &[String]) {
        if self.selected.is_empty() {
            self.selected = available
                .iter()
                .take(DEFAULT_SELECTED_SERIES)
                .cloned()
                .collect();
        }
    }

    pub fn toggle(&mut self, name: &str) {
        match self.selected.iter().position(|s| s == name) {
            Some(idx) => {
                self.selected.remove(idx);
            }
            None => self.selected.push(name.to_string()),
        }
    }

    /// Selected series that exist in `available`, in selection order
    pub fn visible<'a>(&'a self, available: &[String]) -> Vec<&'a str> {
        self.selected
            .iter()
            .filter(|s| available.contains(s))
            .map(String::as_str)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesOption {
    pub name: String,
    pub color: &'static str,
    pub selected: bool,
}

/// Picker entries for every available series
pub fn series_options(available: &[String], selection: &SeriesSelection) -> Vec<SeriesOption> {
    available
        .iter()
        .enumerate()
        .map(|(i, name)| SeriesOption {
            name: name.clone(),
            color: series_color(i),
            selected: selection.is_selected(name),
        })
        .collect()
}
