/*
 * Clap command tree for `masterlist`, shared between one-shot mode (the
 * top-level command) and shell mode (a multicall command parsing one line at
 * a time). Parsed sub-commands are turned into `CliAction`s; everything that
 * touches the catalog becomes an `AppEvent` for `MyAppLogic`.
 */
use crate::platform_layer::{AppEvent, RenderMode};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, PartialEq)]
pub enum CliAction {
    Event(AppEvent, RenderMode),
    Shell,
    Quit,
}

pub fn build_cli() -> Command {
    let cli = Command::new("masterlist")
        .about("Keep a master list of categories and their items")
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .help("Directory holding the autosave slots (default: per-user config dir)")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("export-dir")
                .long("export-dir")
                .help("Folder exports are saved to; falls back to the download folder")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("More log output on stderr (repeat for more)")
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand(Command::new("shell").about("Read one sub-command per line from stdin"));
    catalog_subcommands(cli)
}

// Multicall tree for shell mode, without the global flags.
pub fn build_shell_cmd() -> Command {
    let shell = Command::new("shell")
        .multicall(true)
        .subcommand_required(true)
        .subcommand(Command::new("quit").alias("exit").about("Leave the shell"));
    catalog_subcommands(shell)
}

fn positional(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).help(help).required(true)
}

fn catalog_subcommands(cmd: Command) -> Command {
    cmd.subcommand(Command::new("list").about("List all categories with their items"))
        .subcommand(
            Command::new("show")
                .about("Show the items of one category")
                .arg(positional("category", "Category name")),
        )
        .subcommand(Command::new("report").about("Print the full report"))
        .subcommand(Command::new("status").about("Print the status line"))
        .subcommand(
            Command::new("add-category")
                .about("Add a new category")
                .arg(positional("name", "Category name")),
        )
        .subcommand(
            Command::new("delete-category")
                .about("Delete a category and all its items")
                .arg(positional("name", "Category name")),
        )
        .subcommand(
            Command::new("add-item")
                .about("Append an item to a category")
                .arg(positional("category", "Category name"))
                .arg(positional("item", "Item value")),
        )
        .subcommand(
            Command::new("remove-item")
                .about("Remove the first matching item (case-insensitive)")
                .arg(positional("category", "Category name"))
                .arg(positional("item", "Item value")),
        )
        .subcommand(
            Command::new("clear-items")
                .about("Remove every item of a category")
                .arg(positional("category", "Category name")),
        )
        .subcommand(
            Command::new("edit-item")
                .about("Replace an item with a new value")
                .arg(positional("category", "Category name"))
                .arg(positional("old", "Current item value"))
                .arg(positional("new", "New item value")),
        )
        .subcommand(
            Command::new("import")
                .about("Replace the catalog with the contents of a JSON file")
                .arg(positional("file", "Path to the JSON file").value_parser(value_parser!(PathBuf))),
        )
        .subcommand(Command::new("export").about("Write a versioned copy of the catalog"))
        .subcommand(Command::new("new").about("Start a new, empty catalog"))
}

fn string_arg(matches: &ArgMatches, id: &str) -> String {
    matches.get_one::<String>(id).cloned().unwrap_or_default()
}

/*
 * Reads an import file on the front-end side. A read failure is passed along
 * as the event's `Err` so the application logic reports it like any other
 * rejected import.
 */
pub fn read_import_file(path: &Path) -> AppEvent {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let contents = fs::read_to_string(path).map_err(|e| e.to_string());
    if let Err(reason) = &contents {
        log::debug!("Cli: Failed to read {path:?}: {reason}");
    }
    AppEvent::ImportFileRead {
        file_name,
        contents,
    }
}

// `None` when no sub-command was given.
pub fn matches_to_action(matches: &ArgMatches) -> Option<CliAction> {
    let (name, sub) = matches.subcommand()?;
    let view = |event| CliAction::Event(event, RenderMode::Full);
    let change = |event| CliAction::Event(event, RenderMode::MessagesOnly);
    let action = match name {
        "shell" => CliAction::Shell,
        "quit" => CliAction::Quit,
        "list" => view(AppEvent::RefreshList),
        "show" => view(AppEvent::ShowCategory {
            name: string_arg(sub, "category"),
        }),
        "report" => view(AppEvent::ShowReport),
        "status" => view(AppEvent::ShowStatus),
        "add-category" => change(AppEvent::AddCategory {
            name: string_arg(sub, "name"),
        }),
        "delete-category" => change(AppEvent::DeleteCategory {
            name: string_arg(sub, "name"),
        }),
        "add-item" => change(AppEvent::AddItem {
            category: string_arg(sub, "category"),
            item: string_arg(sub, "item"),
        }),
        "remove-item" => change(AppEvent::RemoveItem {
            category: string_arg(sub, "category"),
            item: string_arg(sub, "item"),
        }),
        "clear-items" => change(AppEvent::ClearItems {
            category: string_arg(sub, "category"),
        }),
        "edit-item" => change(AppEvent::EditItem {
            category: string_arg(sub, "category"),
            old_item: string_arg(sub, "old"),
            new_item: string_arg(sub, "new"),
        }),
        "import" => {
            let path = sub.get_one::<PathBuf>("file")?;
            change(read_import_file(path))
        }
        "export" => change(AppEvent::ExportRequested),
        "new" => change(AppEvent::NewDatabaseRequested),
        other => {
            log::warn!("Cli: Unhandled sub-command '{other}'");
            return None;
        }
    };
    Some(action)
}
