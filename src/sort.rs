//! Defines the representation of sorting criteria for the result grid.

/// Represents the sort state of a single column in the result grid.
///
/// Each variant stores the column name it refers to. A header click cycles:
/// NotSorted -> Descending -> Ascending -> Descending -> ...
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum SortState {
    /// Column is not sorted.
    NotSorted(String),
    /// Column sorted ascending.
    Ascending(String),
    /// Column sorted descending.
    Descending(String),
}

impl SortState {
    /// The column name this state refers to.
    pub fn column_name(&self) -> &str {
        match self {
            SortState::NotSorted(name)
            | SortState::Ascending(name)
            | SortState::Descending(name) => name,
        }
    }

    /// Returns `true` if this state sorts the given column.
    pub fn is_sorted_column(&self, name: &str) -> bool {
        !matches!(self, SortState::NotSorted(_)) && self.column_name() == name
    }

    /// The next state in the header click cycle.
    pub fn cycle_next(&self) -> Self {
        let name = self.column_name().to_string();
        match self {
            SortState::NotSorted(_) => SortState::Descending(name),
            SortState::Descending(_) => SortState::Ascending(name),
            SortState::Ascending(_) => SortState::Descending(name),
        }
    }

    /// Unicode icon representing the state, displayed in the header.
    pub fn get_icon(&self) -> &'static str {
        match self {
            SortState::Descending(_) => "⬇",
            SortState::Ascending(_) => "⬆",
            SortState::NotSorted(_) => "↕", // U+2195 UP DOWN ARROW
        }
    }
}

#[cfg(test)]
mod tests_sort {
    use super::*;

    #[test]
    fn click_cycle() {
        let state = SortState::NotSorted("id".to_string());
        let state = state.cycle_next();
        assert_eq!(state, SortState::Descending("id".to_string()));
        let state = state.cycle_next();
        assert_eq!(state, SortState::Ascending("id".to_string()));
        let state = state.cycle_next();
        assert_eq!(state, SortState::Descending("id".to_string()));
    }

    #[test]
    fn sorted_column_check() {
        let state = SortState::Ascending("value".to_string());
        assert!(state.is_sorted_column("value"));
        assert!(!state.is_sorted_column("id"));
        assert!(!SortState::NotSorted("value".to_string()).is_sorted_column("value"));
    }
}
