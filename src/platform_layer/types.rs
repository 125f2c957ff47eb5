/*
 * This module defines the data types exchanged between the application logic
 * and whatever presents the catalog to the user. It includes the
 * platform-agnostic events the front end sends in (`AppEvent`), the commands
 * the application logic sends back (`UiCommand`), message severities, and the
 * `PlatformEventHandler` trait the application logic implements.
 *
 * The core never touches a view. Each view concept (category list, dropdown
 * options, item options, status text) has its own typed command carrying
 * plain data.
 */

// --- Events from Platform to App Logic ---

/*
 * User intents, already decoupled from how they were triggered (button,
 * menu, command line). File contents for imports are read by the platform
 * and delivered here; a read failure arrives as `Err` with a description.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    AddCategory {
        name: String,
    },
    DeleteCategory {
        name: String,
    },
    AddItem {
        category: String,
        item: String,
    },
    RemoveItem {
        category: String,
        item: String,
    },
    ClearItems {
        category: String,
    },
    EditItem {
        category: String,
        old_item: String,
        new_item: String,
    },
    ImportFileRead {
        file_name: String,
        contents: Result<String, String>,
    },
    ExportRequested,
    NewDatabaseRequested,
    ShowCategory {
        name: String,
    },
    ShowReport,
    RefreshList,
    ShowStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSeverity {
    Information,
    Warning,
    Error,
}

// One row of the category list view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryListEntry {
    pub name: String,
    pub items: Vec<String>,
}

// --- Commands from App Logic to Platform ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    RenderCategoryList {
        entries: Vec<CategoryListEntry>,
    },
    // Category names for every category selector.
    RenderDropdownOptions {
        names: Vec<String>,
    },
    RenderItemOptions {
        category: String,
        items: Vec<String>,
    },
    SetStatusText {
        text: String,
    },
    ShowMessage {
        text: String,
        severity: MessageSeverity,
    },
    ShowReport {
        text: String,
    },
}

// --- Trait for App Logic to Handle Events ---

pub trait PlatformEventHandler {
    // Handles one event to completion. Events are processed strictly in
    // arrival order; commands produced are queued for `try_dequeue_command`.
    fn handle_event(&mut self, event: AppEvent);

    // Attempts to dequeue a single `UiCommand` from the internal queue.
    fn try_dequeue_command(&mut self) -> Option<UiCommand>;
}
