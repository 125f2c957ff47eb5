use crate::core::{CatalogSession, ExportSinkOperations, StoreError, category_store};
use crate::platform_layer::{
    AppEvent, CategoryListEntry, MessageSeverity, PlatformEventHandler, UiCommand,
};
use std::collections::VecDeque;

// Made pub(crate) for access from handler_tests.rs
pub(crate) const APP_NAME_FOR_STORAGE: &str = "MasterListApp";

pub(crate) const READY_MESSAGE: &str =
    "Ready. Import JSON to load your data. Autosave is ON (this device).";

/*
 * Manages the catalog session and the UI logic in a platform-agnostic manner.
 * It receives `AppEvent`s from the platform layer, applies them to the
 * `CatalogSession`, and queues `UiCommand`s describing what the views should
 * show. Views are only re-rendered after an operation has succeeded, so they
 * never observe a half-applied state.
 *
 * Events go through a FIFO queue and each one is processed to completion
 * before the next is taken, so two rapid triggers of the same action (e.g.
 * a double click) run one after the other and never merge.
 */
pub struct MyAppLogic {
    pub(crate) session: CatalogSession,
    pub(crate) preferred_sink: Option<Box<dyn ExportSinkOperations>>,
    pub(crate) fallback_sink: Box<dyn ExportSinkOperations>,
    pending_events: VecDeque<AppEvent>,
    pending_commands: VecDeque<UiCommand>,
}

impl MyAppLogic {
    pub fn new(
        session: CatalogSession,
        preferred_sink: Option<Box<dyn ExportSinkOperations>>,
        fallback_sink: Box<dyn ExportSinkOperations>,
    ) -> Self {
        MyAppLogic {
            session,
            preferred_sink,
            fallback_sink,
            pending_events: VecDeque::new(),
            pending_commands: VecDeque::new(),
        }
    }

    #[cfg(test)]
    pub fn session(&self) -> &CatalogSession {
        &self.session
    }

    /*
     * Queues the initial views after the session has been opened: category
     * list, dropdowns, status line, and a ready message.
     */
    pub fn on_startup(&mut self) {
        self.render_catalog_views();
        self.message(READY_MESSAGE, MessageSeverity::Information);
    }

    // Adds an event to the queue without processing it.
    pub fn enqueue_event(&mut self, event: AppEvent) {
        self.pending_events.push_back(event);
    }

    pub fn process_pending_events(&mut self) {
        while let Some(event) = self.pending_events.pop_front() {
            log::trace!("AppLogic: Processing {event:?}");
            self.dispatch(event);
        }
    }

    fn dispatch(&mut self, event: AppEvent) {
        match event {
            AppEvent::AddCategory { name } => self.on_add_category(&name),
            AppEvent::DeleteCategory { name } => self.on_delete_category(&name),
            AppEvent::AddItem { category, item } => self.on_add_item(&category, &item),
            AppEvent::RemoveItem { category, item } => self.on_remove_item(&category, &item),
            AppEvent::ClearItems { category } => self.on_clear_items(&category),
            AppEvent::EditItem {
                category,
                old_item,
                new_item,
            } => self.on_edit_item(&category, &old_item, &new_item),
            AppEvent::ImportFileRead {
                file_name,
                contents,
            } => self.on_import_file_read(&file_name, contents),
            AppEvent::ExportRequested => self.on_export_requested(),
            AppEvent::NewDatabaseRequested => self.on_new_database(),
            AppEvent::ShowCategory { name } => self.on_show_category(&name),
            AppEvent::ShowReport => {
                let text = self.session.store().full_report();
                self.push(UiCommand::ShowReport { text });
            }
            AppEvent::RefreshList => {
                self.push(self.category_list_command());
                self.message("List refreshed.", MessageSeverity::Information);
            }
            AppEvent::ShowStatus => self.push_status(),
        }
    }

    fn push(&mut self, command: UiCommand) {
        self.pending_commands.push_back(command);
    }

    fn message(&mut self, text: impl Into<String>, severity: MessageSeverity) {
        self.push(UiCommand::ShowMessage {
            text: text.into(),
            severity,
        });
    }

    pub(crate) fn status_text(&self) -> String {
        let session = &self.session;
        let file_part = match session.source_file_name() {
            Some(name) => format!("Loaded: {name}"),
            None => "Working set (not imported)".to_string(),
        };
        let mut text = format!(
            "{file_part} | v{} | updated {} | categories {} | autosave on",
            session.version(),
            session.updated_at(),
            session.store().len()
        );
        if session.autosave_failed() {
            text.push_str(" | autosave failed");
        }
        text
    }

    fn push_status(&mut self) {
        let text = self.status_text();
        self.push(UiCommand::SetStatusText { text });
    }

    fn category_list_command(&self) -> UiCommand {
        let entries = self
            .session
            .store()
            .rows()
            .iter()
            .map(|row| CategoryListEntry {
                name: row[0].clone(),
                items: row[1..].to_vec(),
            })
            .collect();
        UiCommand::RenderCategoryList { entries }
    }

    fn item_options_command(&self, category: &str) -> Option<UiCommand> {
        let items = self.session.store().items(category).ok()?.to_vec();
        Some(UiCommand::RenderItemOptions {
            category: self.stored_name(category),
            items,
        })
    }

    // The category's name as stored, falling back to the trimmed input.
    fn stored_name(&self, category: &str) -> String {
        let store = self.session.store();
        match store.lookup(category) {
            Ok(idx) => store.rows()[idx][0].clone(),
            Err(_) => category_store::normalize(category).to_string(),
        }
    }

    /*
     * Success message for a committed change. If the autosave that followed
     * it failed, a warning is queued too, so front ends that do not show the
     * status line still learn that the change exists only in memory.
     */
    fn report_committed(&mut self, text: String) {
        self.message(text, MessageSeverity::Information);
        if let Some(reason) = self.session.autosave_error().map(str::to_string) {
            self.message(
                format!("Autosave failed: {reason}"),
                MessageSeverity::Warning,
            );
        }
    }

    fn render_catalog_views(&mut self) {
        self.push(self.category_list_command());
        self.push(UiCommand::RenderDropdownOptions {
            names: self.session.store().category_names(),
        });
        self.push_status();
    }

    fn render_after_item_change(&mut self, category: &str) {
        if let Some(command) = self.item_options_command(category) {
            self.push(command);
        }
        self.push(self.category_list_command());
        self.push_status();
    }

    fn report_store_error(&mut self, error: &StoreError) {
        let text = match error {
            StoreError::EmptyName => "Type a category name.".to_string(),
            StoreError::EmptyItem => "Type an item value.".to_string(),
            StoreError::DuplicateName(_) => "Category already exists.".to_string(),
            StoreError::CategoryNotFound(name) => format!("Category not found: {name}"),
            StoreError::ItemNotFound { item, .. } => format!("Item not found: \"{item}\""),
        };
        if error.is_not_found() {
            log::debug!("AppLogic: Lookup failed: {error}");
        } else {
            log::debug!("AppLogic: Mutation rejected: {error}");
        }
        self.message(text, MessageSeverity::Warning);
    }

    fn on_add_category(&mut self, name: &str) {
        match self.session.add_category(name) {
            Ok(_) => {
                self.render_catalog_views();
                let name = self.stored_name(name);
                self.report_committed(format!("Added category: {name}"));
            }
            Err(e) => self.report_store_error(&e),
        }
    }

    fn on_delete_category(&mut self, name: &str) {
        let name = self.stored_name(name);
        match self.session.delete_category(&name) {
            Ok(removed) => {
                self.render_catalog_views();
                let text = if removed > 1 {
                    format!("Deleted category: {name} ({removed} rows)")
                } else {
                    format!("Deleted category: {name}")
                };
                self.report_committed(text);
            }
            Err(e) => self.report_store_error(&e),
        }
    }

    fn on_add_item(&mut self, category: &str, item: &str) {
        match self.session.add_item(category, item) {
            Ok(()) => {
                self.render_after_item_change(category);
                self.report_committed(format!(
                    "Added \"{}\" to {}.",
                    category_store::normalize(item),
                    self.stored_name(category)
                ));
            }
            Err(e) => self.report_store_error(&e),
        }
    }

    fn on_remove_item(&mut self, category: &str, item: &str) {
        match self.session.remove_item(category, item) {
            Ok(removed) => {
                self.render_after_item_change(category);
                self.report_committed(format!(
                    "Removed \"{removed}\" from {}.",
                    self.stored_name(category)
                ));
            }
            Err(e) => self.report_store_error(&e),
        }
    }

    fn on_clear_items(&mut self, category: &str) {
        match self.session.clear_items(category) {
            Ok(_) => {
                self.render_after_item_change(category);
                self.report_committed(format!("Cleared items in {}.", self.stored_name(category)));
            }
            Err(e) => self.report_store_error(&e),
        }
    }

    fn on_edit_item(&mut self, category: &str, old_item: &str, new_item: &str) {
        match self.session.edit_item(category, old_item, new_item) {
            Ok(()) => {
                self.render_after_item_change(category);
                self.report_committed(format!(
                    "Replaced \"{}\" with \"{}\" in {}.",
                    category_store::normalize(old_item),
                    category_store::normalize(new_item),
                    self.stored_name(category)
                ));
            }
            Err(e) => self.report_store_error(&e),
        }
    }

    fn on_import_file_read(&mut self, file_name: &str, contents: Result<String, String>) {
        let text = match contents {
            Ok(text) => text,
            Err(reason) => {
                log::warn!("AppLogic: Could not read import file '{file_name}': {reason}");
                self.message(
                    format!("Could not read {file_name}: {reason}"),
                    MessageSeverity::Error,
                );
                return;
            }
        };
        match self.session.import_text(file_name, &text) {
            Ok(_) => {
                self.render_catalog_views();
                self.report_committed(format!("Imported: {file_name}"));
            }
            Err(e) => {
                log::warn!("AppLogic: Import of '{file_name}' rejected: {e}");
                self.message(e.to_string(), MessageSeverity::Error);
            }
        }
    }

    fn on_export_requested(&mut self) {
        let result = self
            .session
            .export(self.preferred_sink.as_deref(), &*self.fallback_sink);
        match result {
            Ok(receipt) => {
                log::debug!("AppLogic: Export written to {:?}", receipt.path);
                let text = match receipt.sink_name {
                    "folder" => format!("Saved to folder: {}", receipt.file_name),
                    _ => format!("Exported (downloaded): {}", receipt.file_name),
                };
                self.message(text, MessageSeverity::Information);
            }
            Err(e) => {
                log::error!("AppLogic: Export failed: {e}");
                self.message(format!("Export failed: {e}"), MessageSeverity::Error);
            }
        }
    }

    fn on_new_database(&mut self) {
        self.session.new_database();
        self.render_catalog_views();
        self.report_committed("New empty database. Autosave is ON (this device).".to_string());
    }

    fn on_show_category(&mut self, name: &str) {
        match self.item_options_command(name) {
            Some(command) => self.push(command),
            None => self.message(
                format!("Category not found: {}", category_store::normalize(name)),
                MessageSeverity::Warning,
            ),
        }
    }
}

impl PlatformEventHandler for MyAppLogic {
    fn handle_event(&mut self, event: AppEvent) {
        self.enqueue_event(event);
        self.process_pending_events();
    }

    fn try_dequeue_command(&mut self) -> Option<UiCommand> {
        self.pending_commands.pop_front()
    }
}
