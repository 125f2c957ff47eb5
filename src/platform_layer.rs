/*
 * The platform layer sits between the user and `MyAppLogic`. `types` holds
 * the event and command vocabulary both sides share; `console` renders
 * commands to a terminal.
 */
pub mod console;
pub mod types;

pub use console::{ConsoleRenderer, RenderMode};
pub use types::{
    AppEvent, CategoryListEntry, MessageSeverity, PlatformEventHandler, UiCommand,
};
