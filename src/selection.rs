//! Tracks which table and query are currently selected, and the current
//! (possibly hand-edited) query text.

use crate::Catalog;

/// The current selection: table name, query id and editable query text.
///
/// Invariants:
/// - Changing the table resets the query id and text to the table's first
///   query (or clears them if the table has none).
/// - Changing the query id resynchronizes the text to that query's literal
///   SQL. The user may freely diverge the text afterwards; the id is left
///   untouched by edits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub table: String,
    pub query_id: String,
    pub query_text: String,
}

impl Selection {
    /// Initial selection: the catalog's first table with its first query.
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let mut selection = Selection::default();
        if let Some(table) = catalog.first_table() {
            let name = table.name.clone();
            selection.select_table(catalog, &name);
        }
        selection
    }

    /// Selects a table by name and resets the query selection to the table's
    /// first query. `name` must be a key of the catalog; unknown names leave
    /// the selection unchanged. The caller must clear the active result set
    /// after a table change.
    pub fn select_table(&mut self, catalog: &Catalog, name: &str) {
        let Some(table) = catalog.get(name) else {
            tracing::debug!("select_table: unknown table {name:?}, selection unchanged");
            return;
        };

        self.table = table.name.clone();
        match table.first_query() {
            Some(query) => {
                self.query_id = query.id.clone();
                self.query_text = query.sql.clone();
            }
            None => {
                // A table with zero queries is not an error: id and text
                // simply become empty.
                self.query_id.clear();
                self.query_text.clear();
            }
        }
        tracing::debug!(
            "select_table: table={:?} query_id={:?}",
            self.table,
            self.query_id
        );
    }

    /// Selects a query by id within the current table and resynchronizes the
    /// text to its literal SQL. Callers must only pass ids drawn from the
    /// current table's query list; other ids leave the selection unchanged.
    pub fn select_query(&mut self, catalog: &Catalog, id: &str) {
        let Some(query) = catalog.get(&self.table).and_then(|t| t.query_by_id(id)) else {
            tracing::debug!("select_query: id {id:?} not in table {:?}", self.table);
            return;
        };

        self.query_id = query.id.clone();
        self.query_text = query.sql.clone();
    }

    /// Overwrites the current query text. Does not touch the query id.
    pub fn edit_query_text(&mut self, text: impl Into<String>) {
        self.query_text = text.into();
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//

/// Run tests with:
/// `cargo test -- --show-output tests_selection`
#[cfg(test)]
mod tests_selection {
    use super::*;
    use crate::CATALOG;

    #[test]
    fn table_change_resets_to_first_query() {
        let catalog = &*CATALOG;
        let mut selection = Selection::from_catalog(catalog);
        assert_eq!(selection.table, "customers");
        assert_eq!(selection.query_id, "customers_all");
        assert_eq!(selection.query_text, "SELECT * FROM customers;");

        selection.select_table(catalog, "orders");
        assert_eq!(selection.query_id, "orders_all");
        assert_eq!(selection.query_text, "SELECT * FROM orders;");
    }

    #[test]
    fn select_query_resynchronizes_text() {
        let catalog = &*CATALOG;

        // For every table: selecting the first query yields exactly its SQL.
        for name in catalog.table_names() {
            let mut selection = Selection::default();
            selection.select_table(catalog, name);
            let table = catalog.get(name).unwrap();
            let first = table.first_query().unwrap();

            selection.select_query(catalog, &first.id);
            assert_eq!(selection.query_text, first.sql);
        }
    }

    #[test]
    fn edits_diverge_text_but_keep_id() {
        let catalog = &*CATALOG;
        let mut selection = Selection::from_catalog(catalog);

        selection.edit_query_text("SELECT 1;");
        assert_eq!(selection.query_id, "customers_all");
        assert_eq!(selection.query_text, "SELECT 1;");

        // Re-selecting the query snaps the text back.
        selection.select_query(catalog, "customers_all");
        assert_eq!(selection.query_text, "SELECT * FROM customers;");
    }

    #[test]
    fn foreign_query_id_is_ignored() {
        let catalog = &*CATALOG;
        let mut selection = Selection::from_catalog(catalog);

        selection.select_query(catalog, "orders_all");
        assert_eq!(selection.query_id, "customers_all");
    }
}
