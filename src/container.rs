//! Holds the active result set and renders it as an interactive `egui` grid
//! with client-side sorting and filtering.

use egui::{Align, Direction, Layout, TextStyle, Ui};
use egui_extras::{Column, TableBuilder, TableRow};
use std::sync::Arc;

use crate::{ExtraInteractions, Record, SortState, Value};

/// The active result set: explicit column list plus the record rows.
///
/// Columns are carried as data instead of being re-derived from record shape
/// at each render, so heterogeneous records and empty result sets are
/// unambiguous.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
}

impl ResultSet {
    /// Builds a result set from records; the column list is the union of the
    /// record keys in first-seen order.
    pub fn from_records(rows: Vec<Record>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.to_string());
                }
            }
        }
        ResultSet { columns, rows }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }
}

/// Contains the active `ResultSet` together with the grid's presentation
/// state (sort criterion and filter text).
///
/// Replaced wholesale on each successful pseudo-execution and cleared when
/// the table selection changes.
#[derive(Debug, Clone)]
pub struct ResultContainer {
    /// The result set, wrapped in an Arc for cheap sharing with async tasks.
    pub result: Arc<ResultSet>,
    /// Applied sort criterion, if any.
    pub sort: Option<SortState>,
    /// Case-insensitive substring filter over all cells.
    pub filter: String,
    /// Indices into `result.rows` after filtering and sorting, in display order.
    view: Vec<usize>,
}

impl ResultContainer {
    pub fn new(result: ResultSet) -> Self {
        let mut container = ResultContainer {
            view: (0..result.rows.len()).collect(),
            result: Arc::new(result),
            sort: None,
            filter: String::new(),
        };
        container.rebuild_view();
        container
    }

    /// Applies a new sort criterion and recomputes the display order.
    pub fn set_sort(&mut self, sort: Option<SortState>) {
        tracing::debug!("set_sort: {sort:?}");
        self.sort = sort;
        self.rebuild_view();
    }

    /// Applies a new filter string and recomputes the display order.
    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into();
        self.rebuild_view();
    }

    /// The currently visible (filtered, sorted) rows. Export operates on
    /// this view, not on the full result set.
    pub fn filtered_rows(&self) -> Vec<Record> {
        self.view
            .iter()
            .map(|&i| self.result.rows[i].clone())
            .collect()
    }

    /// Number of rows currently visible.
    pub fn visible_count(&self) -> usize {
        self.view.len()
    }

    /// Recomputes `view`: filter first, then a stable, value-aware sort.
    fn rebuild_view(&mut self) {
        let needle = self.filter.trim().to_lowercase();

        self.view = self
            .result
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                needle.is_empty()
                    || row
                        .values()
                        .any(|v| v.display().to_lowercase().contains(&needle))
            })
            .map(|(i, _)| i)
            .collect();

        if let Some(sort) = &self.sort {
            let (column, ascending) = match sort {
                SortState::Ascending(name) => (name.clone(), true),
                SortState::Descending(name) => (name.clone(), false),
                SortState::NotSorted(_) => return,
            };

            let rows = &self.result.rows;
            // Stable sort keeps the original order of equal elements.
            self.view.sort_by(|&a, &b| {
                let left = rows[a].get(&column).unwrap_or(&Value::Null);
                let right = rows[b].get(&column).unwrap_or(&Value::Null);
                let ordering = left.compare(right);
                if ascending { ordering } else { ordering.reverse() }
            });
        }
    }

    /// Renders the result set as an `egui` table.
    ///
    /// ### Returns
    ///
    /// An `Option<SortState>` containing the new sort criterion if the user
    /// clicked a column header, or `None` otherwise.
    pub fn render_table(&self, ui: &mut Ui) -> Option<SortState> {
        let mut sorted_column = self.sort.clone();
        let mut changed: Option<SortState> = None;

        // Header rendering closure: creates sort buttons for each column.
        let analyze_header = |mut table_row: TableRow<'_, '_>| {
            for column_name in &self.result.columns {
                table_row.col(|ui| {
                    // Determine current sort state of the column.
                    let sort_state = match &self.sort {
                        Some(sort) if sort.is_sorted_column(column_name) => sort.clone(),
                        _ => SortState::NotSorted(column_name.to_string()),
                    };

                    ui.horizontal_centered(|ui| {
                        // The `sort_button` method is provided by the `ExtraInteractions` trait.
                        if ui.sort_button(&mut sorted_column, sort_state).clicked() {
                            changed = sorted_column.clone();
                        }
                    });
                });
            }
        };

        // Rows rendering closure: displays the data for each visible row.
        let analyze_rows = |mut table_row: TableRow<'_, '_>| {
            let row_index = table_row.index();
            let record = &self.result.rows[self.view[row_index]];

            for column_name in &self.result.columns {
                let value = record.get(column_name).unwrap_or(&Value::Null);

                // Numbers right-aligned, everything else left-aligned.
                let layout = match value {
                    Value::Int(_) | Value::Float(_) => Layout::right_to_left(Align::Center),
                    Value::Timestamp(_) => Layout::centered_and_justified(Direction::LeftToRight),
                    _ => Layout::left_to_right(Align::Center),
                };

                table_row.col(|ui| {
                    ui.with_layout(layout.with_main_wrap(false), |ui| {
                        ui.label(value.display());
                    });
                });
            }
        };

        let style = ui.style();
        let text_height = TextStyle::Body.resolve(style).size;
        let col_number = self.result.width().max(1) as f32;
        let available_space = ui.available_width()
            - col_number * style.spacing.item_spacing.x
            - style.spacing.scroll.bar_width;

        // Initial and minimal column widths, calculated based on available space and number of columns.
        let initial_col_width = available_space / col_number;
        let header_height = style.spacing.interact_size.y + 2.0 * style.spacing.item_spacing.y;
        let min_col_width = style.spacing.interact_size.x.max(initial_col_width / 4.0);

        let column = Column::initial(initial_col_width)
            .at_least(min_col_width)
            .resizable(true)
            .clip(true);

        // Build and display the table using `egui_extras::TableBuilder`.
        TableBuilder::new(ui)
            .striped(true) // Alternate row background colors for better readability.
            .columns(column, self.result.width())
            .column(Column::remainder())
            .auto_shrink([false, false])
            .header(header_height, analyze_header)
            .body(|body| {
                body.rows(text_height, self.view.len(), analyze_rows);
            });

        changed
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//

/// Run tests with:
/// `cargo test -- --show-output tests_container`
#[cfg(test)]
mod tests_container {
    use super::*;
    use crate::CATALOG;

    fn customers_container() -> ResultContainer {
        let table = CATALOG.get("customers").unwrap();
        let rows = table.query_by_id("customers_all").unwrap().results.clone();
        ResultContainer::new(ResultSet::from_records(rows))
    }

    #[test]
    fn columns_in_first_seen_order() {
        let container = customers_container();
        assert_eq!(
            container.result.columns,
            ["id", "name", "email", "country", "created_at", "status"]
        );
        assert_eq!(container.visible_count(), 5);
    }

    #[test]
    fn filter_narrows_the_export_view() {
        let mut container = customers_container();
        container.set_filter("usa");
        assert_eq!(container.visible_count(), 2);

        let rows = container.filtered_rows();
        assert!(
            rows.iter()
                .all(|r| r.get("country") == Some(&Value::Str("USA".to_string())))
        );

        // Clearing the filter restores the full view.
        container.set_filter("");
        assert_eq!(container.visible_count(), 5);
    }

    #[test]
    fn sort_is_value_aware_and_reversible() {
        let mut container = customers_container();

        container.set_sort(Some(SortState::Descending("id".to_string())));
        let rows = container.filtered_rows();
        assert_eq!(rows[0].get("id"), Some(&Value::Int(5)));

        container.set_sort(Some(SortState::Ascending("name".to_string())));
        let rows = container.filtered_rows();
        assert_eq!(
            rows[0].get("name"),
            Some(&Value::Str("Emily Davis".to_string()))
        );
    }

    #[test]
    fn filter_and_sort_compose() {
        let mut container = customers_container();
        container.set_filter("active");
        container.set_sort(Some(SortState::Descending("id".to_string())));

        let rows = container.filtered_rows();
        // "inactive" also contains "active" as a substring; all 5 rows match.
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].get("id"), Some(&Value::Int(5)));
    }

    #[test]
    fn empty_result_set_has_no_columns() {
        let set = ResultSet::from_records(vec![]);
        assert!(set.columns.is_empty());
        assert_eq!(set.height(), 0);
    }
}
