use crate::{
    Arguments, CATALOG, Error, ExecutionOutcome, ExportFormat, KEY_DARK_MODE, MyStyle,
    Notification, QueryHistory, QueryRunner, QueryRunnerResult, ResultContainer, ResultSet,
    SavedQuery, Selection, Storage, export_dialog, split_column_label,
};

use egui::{
    Button, CentralPanel, Context, Grid, RichText, ScrollArea, SidePanel, TextEdit, TextStyle,
    TopBottomPanel, ViewportCommand, menu, style::Visuals, warn_if_debug_build,
};
use std::time::Duration;
use tokio::sync::oneshot::{self, Receiver, error::TryRecvError};
use tracing::{debug, error};

/// Type alias for a Result with an `ExecutionOutcome`.
pub type OutcomeResult = QueryRunnerResult<ExecutionOutcome>;
/// Type alias for a boxed, dynamically dispatched Future that returns an `OutcomeResult`.
pub type OutcomeFuture = Box<dyn Future<Output = OutcomeResult> + Unpin + Send + 'static>;

/// Summary of the last applied execution, shown in the status bar.
#[derive(Debug, Clone, Copy)]
struct ExecutionSummary {
    row_count: usize,
    elapsed: Duration,
}

/// Deferred UI actions on the history lists.
///
/// Collected while rendering (the lists are borrowed immutably there) and
/// applied afterwards.
enum HistoryAction {
    Load(String),
    ToggleFavorite(i64),
    DeleteSaved(i64),
    DeleteRecent(String),
}

/// The main application struct for the SQL Query Runner.
pub struct QueryRunnerApp {
    /// Current table, query id and editable query text.
    pub selection: Selection,
    /// The active result set with its grid state, if a query has run.
    pub container: Option<ResultContainer>,
    /// Saved and recent query lists, persisted across sessions.
    pub history: QueryHistory,
    /// Key-value persistence for the theme flag.
    pub storage: Storage,
    /// Optional Notification window for displaying errors.
    pub notification: Option<Box<dyn Notification>>,
    /// Current theme. Persisted under the `darkMode` key on every toggle.
    pub dark_mode: bool,

    /// Validates query text and schedules pseudo-executions.
    runner: QueryRunner,
    /// Summary of the last applied execution.
    execution: Option<ExecutionSummary>,
    /// Tokio runtime for asynchronous operations (execution delay, exports).
    runtime: tokio::runtime::Runtime,
    /// Channel for receiving the result of the pending execution.
    pipe: Option<Receiver<OutcomeResult>>,
    /// Channel for receiving the result of a pending export.
    export_pipe: Option<Receiver<QueryRunnerResult<()>>>,
    /// Vector of active asynchronous tasks. Used to prevent the app from hanging.
    tasks: Vec<tokio::task::JoinHandle<()>>,
}

impl QueryRunnerApp {
    /// Creates a new `QueryRunnerApp` instance from the command-line arguments.
    pub fn new(cc: &eframe::CreationContext<'_>, args: Arguments) -> QueryRunnerResult<Self> {
        let storage_dir = match args.storage_dir {
            Some(dir) => dir,
            None => Storage::default_dir()?,
        };
        let storage = Storage::new(storage_dir);

        // The command-line flag overrides the persisted theme.
        let dark_mode = args.dark || storage.read_key(KEY_DARK_MODE).unwrap_or(false);
        let visuals = if dark_mode {
            Visuals::dark()
        } else {
            Visuals::light()
        };
        cc.egui_ctx.set_style_init(visuals);

        let mut selection = Selection::from_catalog(&CATALOG);
        if let Some(table) = &args.table {
            selection.select_table(&CATALOG, table);
        }

        Ok(QueryRunnerApp {
            selection,
            container: None,
            history: QueryHistory::load(storage.clone()),
            storage,
            notification: None,
            dark_mode,
            runner: QueryRunner::new(Duration::from_millis(args.delay_ms)),
            execution: None,
            runtime: tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?,
            pipe: None,
            export_pipe: None,
            tasks: Vec::new(),
        })
    }

    /// Checks if a Notification is active and displays it.
    fn check_notification(&mut self, ctx: &Context) {
        if let Some(notification) = &mut self.notification {
            if !notification.show(ctx) {
                self.notification = None; // Remove closed Notification.
            }
        }
    }

    /// Checks if there is a pending execution (asynchronous).
    /// If an outcome is available or an error occurred, process it. If the
    /// execution is still in progress, keeps it in the `pipe`. Returns `true`
    /// while the execution is pending, `false` once it is complete.
    fn check_data_pending(&mut self) -> bool {
        // Attempt to take ownership of the receiver. If it's None (no pending execution), return false.
        let Some(mut output) = self.pipe.take() else {
            return false;
        };

        // Try to receive a value from the channel without blocking.
        match output.try_recv() {
            Ok(outcome_result) => {
                match outcome_result {
                    Ok(outcome) => {
                        // Apply the outcome only if no table change or newer
                        // request superseded it while it was in flight.
                        if self.runner.is_current(&outcome) {
                            self.execution = Some(ExecutionSummary {
                                row_count: outcome.rows.len(),
                                elapsed: outcome.elapsed,
                            });
                            self.container =
                                Some(ResultContainer::new(ResultSet::from_records(outcome.rows)));

                            // Successful executions feed the recent-query list.
                            if let Err(err) = self.history.record_execution(&outcome.query_text) {
                                error!("Failed to persist recent queries: {err}");
                            }
                        } else {
                            debug!(
                                "Discarding stale outcome (request_id {})",
                                outcome.request_id
                            );
                        }
                        false
                    }
                    Err(err) => {
                        // Create and display the error Notification (to the user).
                        self.notification = Some(Box::new(Error {
                            message: err.to_string(),
                        }));
                        error!("Execution failed: {err}");
                        false
                    }
                }
            }
            Err(try_recv_error) => match try_recv_error {
                // The channel is empty (outcome not yet available). This is the normal "pending" state.
                TryRecvError::Empty => {
                    // Put the receiver back into `self.pipe` to check again later.
                    self.pipe = Some(output);
                    true
                }
                // The channel is closed (the sender was dropped). This is an unexpected error state.
                TryRecvError::Closed => {
                    let err_msg = "Execution terminated without response.".to_string();
                    self.notification = Some(Box::new(Error {
                        message: err_msg.clone(),
                    }));
                    error!("{err_msg}");
                    false
                }
            },
        }
    }

    /// Checks if a pending export finished. Failures surface as a generic
    /// error Notification; the cause is logged. Cancelled dialogs and
    /// successful writes are silent.
    fn check_export_result(&mut self) {
        let Some(mut output) = self.export_pipe.take() else {
            return;
        };

        match output.try_recv() {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                self.notification = Some(Box::new(Error {
                    message: "Error generating export file. Please try again.".to_string(),
                }));
                error!("Export failed: {err}");
            }
            Err(TryRecvError::Empty) => {
                self.export_pipe = Some(output);
            }
            Err(TryRecvError::Closed) => {
                error!("Export task terminated without response.");
            }
        }
    }

    /// Runs an `OutcomeFuture` asynchronously.
    ///
    /// This function takes a future, spawns a Tokio task, and sets up a channel to receive the result.
    fn run_data_future(&mut self, future: OutcomeFuture, ctx: &Context) {
        // Before scheduling a new future, ensure no tasks are stuck
        self.tasks.retain(|task| !task.is_finished());

        // Create a oneshot channel for sending the outcome from the async task to the UI thread.
        let (tx, rx) = oneshot::channel::<OutcomeResult>();
        self.pipe = Some(rx);

        // Clone the context for use within the asynchronous task (to request repaints).
        let ctx_clone = ctx.clone();

        let handle = self.runtime.spawn(async move {
            let outcome = future.await;
            // Handle potential error if the receiver is dropped.
            if tx.send(outcome).is_err() {
                error!("Receiver dropped before the outcome could be sent.");
            }

            // Request a repaint of the UI to display the result set.
            ctx_clone.request_repaint();
        });

        self.tasks.push(handle); // Track the task.
    }

    /// Validates the current query text and schedules its pseudo-execution.
    /// Validation failures surface immediately as an error Notification.
    fn run_query(&mut self, ctx: &Context) {
        let Some(table) = CATALOG.get(&self.selection.table) else {
            return;
        };

        match self.runner.execute(table, &self.selection.query_text) {
            Ok(future) => self.run_data_future(Box::new(Box::pin(future)), ctx),
            Err(err) => {
                self.notification = Some(Box::new(Error {
                    message: err.to_string(),
                }));
            }
        }
    }

    /// Switches the active table: the query selection resets to the table's
    /// first query, the result set is cleared and any in-flight execution is
    /// invalidated.
    fn switch_table(&mut self, name: &str) {
        self.selection.select_table(&CATALOG, name);
        self.container = None;
        self.execution = None;
        self.runner.invalidate();
    }

    /// Flips the theme, applies it and persists the flag.
    fn toggle_theme(&mut self, ctx: &Context) {
        self.dark_mode = !self.dark_mode;
        let visuals = if self.dark_mode {
            Visuals::dark()
        } else {
            Visuals::light()
        };
        ctx.set_style_init(visuals);

        if let Err(err) = self.storage.write_key(KEY_DARK_MODE, &self.dark_mode) {
            error!("Failed to persist theme: {err}");
        }
    }

    /// Exports the currently visible (filtered, sorted) rows in the chosen
    /// format via a save dialog. Runs on the Tokio runtime so the dialog and
    /// the file write never block the UI thread.
    fn export_visible_rows(&mut self, format: ExportFormat, ctx: &Context) {
        let Some(container) = &self.container else {
            return;
        };
        let rows = container.filtered_rows();
        if rows.is_empty() {
            return;
        }

        let file_name = format.default_file_name(&self.selection.table);
        let ctx_clone = ctx.clone();

        let (tx, rx) = oneshot::channel::<QueryRunnerResult<()>>();
        self.export_pipe = Some(rx);

        let handle = self.runtime.spawn(async move {
            let result = export_dialog(rows, format, file_name, ctx_clone.clone()).await;
            if tx.send(result).is_err() {
                error!("Receiver dropped before the export result could be sent.");
            }
            ctx_clone.request_repaint();
        });

        self.tasks.push(handle);
    }

    /// Renders one saved-query entry with its load, favorite and delete
    /// controls, appending the chosen action.
    fn render_saved_entry(ui: &mut egui::Ui, entry: &SavedQuery, actions: &mut Vec<HistoryAction>) {
        ui.horizontal(|ui| {
            let star = if entry.is_favorite { "★" } else { "☆" };
            if ui
                .small_button(star)
                .on_hover_text("Toggle favorite")
                .clicked()
            {
                actions.push(HistoryAction::ToggleFavorite(entry.id));
            }

            if ui
                .link(&entry.name)
                .on_hover_text(&entry.query)
                .clicked()
            {
                actions.push(HistoryAction::Load(entry.query.clone()));
            }

            if ui.small_button("🗑").on_hover_text("Delete").clicked() {
                actions.push(HistoryAction::DeleteSaved(entry.id));
            }
        });
    }

    /// Applies deferred history actions collected during rendering.
    fn apply_history_actions(&mut self, actions: Vec<HistoryAction>) {
        for action in actions {
            let result = match action {
                HistoryAction::Load(query) => {
                    self.selection.edit_query_text(query);
                    Ok(())
                }
                HistoryAction::ToggleFavorite(id) => self.history.toggle_favorite(id),
                HistoryAction::DeleteSaved(id) => self.history.delete_saved(id),
                HistoryAction::DeleteRecent(text) => self.history.delete_recent(&text),
            };

            if let Err(err) = result {
                error!("Failed to persist query history: {err}");
            }
        }
    }
}

// See
// https://github.com/emilk/egui/blob/master/examples/custom_window_frame/src/main.rs
// https://rodneylab.com/trying-egui/

impl eframe::App for QueryRunnerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        // Check and display any active Notifications (errors).
        self.check_notification(ctx);

        // Poll the pending execution and any pending export once per frame.
        let pending = self.check_data_pending();
        self.check_export_result();

        // Define the main UI layout.
        //
        //  | title              theme |
        //  ---------------------------
        //  | tables  |  editor       |
        //  | queries |  run/export   |
        //  | schema  |  result       |
        //  | history |  grid         |
        //  ---------------------------
        //  | rows / execution time   |

        TopBottomPanel::top("top_panel").show(ctx, |ui| {
            menu::bar(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.menu_button("File", |ui| {
                        if ui.button("Quit").clicked() {
                            ui.ctx().send_viewport_cmd(ViewportCommand::Close);
                        }
                    });

                    ui.label(RichText::new("SQL Query Runner").strong());

                    // Align the theme toggle to the right.
                    let delta = ui.available_width() - 30.0;
                    if delta > 0.0 {
                        ui.add_space(delta);
                    }
                    let icon = if self.dark_mode { "☀" } else { "🌙" };
                    if ui.button(icon).on_hover_text("Toggle theme").clicked() {
                        self.toggle_theme(ctx);
                    }
                });
            });
        });

        let mut history_actions: Vec<HistoryAction> = Vec::new();

        SidePanel::left("side_panel")
            .resizable(true)
            .show(ctx, |ui| {
                ScrollArea::vertical().show(ui, |ui| {
                    ui.heading("Tables");
                    let table_names: Vec<&str> = CATALOG.table_names().collect();
                    for name in table_names {
                        let selected = self.selection.table == name;
                        if ui.selectable_label(selected, name).clicked() && !selected {
                            self.switch_table(name);
                        }
                    }

                    ui.separator();

                    let table_name = self.selection.table.clone();
                    if let Some(table) = CATALOG.get(&table_name) {
                        ui.collapsing("Queries", |ui| {
                            for query in &table.queries {
                                let selected = self.selection.query_id == query.id;
                                if ui
                                    .selectable_label(selected, &query.name)
                                    .on_hover_text(&query.sql)
                                    .clicked()
                                {
                                    self.selection.select_query(&CATALOG, &query.id);
                                }
                            }
                        });

                        ui.collapsing("Table Structure", |ui| {
                            Grid::new("schema_grid")
                                .num_columns(2)
                                .striped(true)
                                .show(ui, |ui| {
                                    for column in &table.columns {
                                        let (name, data_type) = split_column_label(column);
                                        ui.label(name);
                                        ui.label(data_type.unwrap_or(""));
                                        ui.end_row();
                                    }
                                });
                        });
                    }

                    ui.separator();

                    ui.collapsing("Saved Queries", |ui| {
                        if self.history.saved.is_empty() {
                            ui.label("No saved queries yet.");
                        }
                        for entry in &self.history.saved {
                            Self::render_saved_entry(ui, entry, &mut history_actions);
                        }
                    });

                    ui.collapsing("Favorites", |ui| {
                        if self.history.favorites().next().is_none() {
                            ui.label("No favorites yet.");
                        }
                        for entry in self.history.favorites() {
                            Self::render_saved_entry(ui, entry, &mut history_actions);
                        }
                    });

                    ui.collapsing("Recent Queries", |ui| {
                        if self.history.recent.is_empty() {
                            ui.label("No recent queries yet.");
                        }
                        for text in &self.history.recent {
                            ui.horizontal(|ui| {
                                if ui.link(text).on_hover_text("Load into editor").clicked() {
                                    history_actions.push(HistoryAction::Load(text.clone()));
                                }
                                if ui.small_button("🗑").on_hover_text("Remove").clicked() {
                                    history_actions.push(HistoryAction::DeleteRecent(text.clone()));
                                }
                            });
                        }
                    });
                });
            });

        self.apply_history_actions(history_actions);

        TopBottomPanel::bottom("bottom_panel").show(ctx, |ui| {
            ui.horizontal(|ui| match (&self.execution, &self.container) {
                (Some(summary), Some(container)) => {
                    ui.label(format!("{} rows returned", summary.row_count));
                    ui.separator();
                    ui.label(format!(
                        "{} rows visible",
                        container.visible_count()
                    ));
                    ui.separator();
                    ui.label(format!(
                        "Execution time: {} ms",
                        summary.elapsed.as_millis()
                    ));
                }
                _ => {
                    ui.label("No query executed yet.");
                }
            });
        });

        // Main area: editor, controls and result grid.
        // CentralPanel must be added after all other panels in your egui layout!
        CentralPanel::default().show(ctx, |ui| {
            // Display a warning message if the application is built in debug mode.
            warn_if_debug_build(ui);

            ui.add(
                TextEdit::multiline(&mut self.selection.query_text)
                    .font(TextStyle::Monospace)
                    .desired_width(f32::INFINITY)
                    .desired_rows(4)
                    .hint_text("SQL query"),
            );

            ui.horizontal(|ui| {
                // One execution in flight at a time.
                if ui
                    .add_enabled(!pending, Button::new("▶ Run Query"))
                    .clicked()
                {
                    self.run_query(ctx);
                }

                if ui.button("Save Query").clicked() {
                    let text = self.selection.query_text.clone();
                    if let Err(err) = self.history.save_query(&text) {
                        error!("Failed to persist saved queries: {err}");
                    }
                }

                let has_rows = self
                    .container
                    .as_ref()
                    .is_some_and(|c| c.visible_count() > 0);
                ui.add_enabled_ui(has_rows, |ui| {
                    ui.menu_button("Export", |ui| {
                        for format in ExportFormat::ALL {
                            if ui.button(format.label()).clicked() {
                                self.export_visible_rows(format, ctx);
                                ui.close_menu();
                            }
                        }
                    });
                });

                if let Some(container) = &mut self.container {
                    ui.separator();
                    ui.label("Filter:");
                    let mut filter = container.filter.clone();
                    if ui.text_edit_singleline(&mut filter).changed() {
                        container.set_filter(filter);
                    }
                }
            });

            ui.separator();

            match &self.container {
                Some(container) => {
                    // Store the optional sort change here, *before* the ScrollArea.
                    let mut opt_sort = None;

                    ScrollArea::horizontal()
                        .auto_shrink([false, false]) // Prevent the scroll area from shrinking.
                        .show(ui, |ui| {
                            // Customize the minimum length of the scrollbar handle for better user interaction.
                            ui.style_mut().spacing.scroll.handle_min_length = 32.0;

                            // Returns the new sort criterion if the user clicked a column header.
                            opt_sort = container.render_table(ui);
                        }); // Close ScrollArea *before* mutating the container.

                    if let Some(sort) = opt_sort {
                        if let Some(container) = &mut self.container {
                            container.set_sort(Some(sort));
                        }
                    }
                }
                None => {
                    if pending {
                        // Execution in progress, show a spinner in the center of the panel.
                        ui.centered_and_justified(|ui| {
                            ui.spinner();
                        });
                    } else {
                        ui.centered_and_justified(|ui| {
                            ui.label("Run a query to see results.");
                        });
                    }
                }
            }
        });

        // Keep repainting while an execution is pending so the spinner
        // animates and the outcome is picked up promptly.
        if pending {
            ctx.request_repaint_after(Duration::from_millis(50));
        }
    }
}
