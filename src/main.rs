// src/main.rs

mod app_logic;
mod cli;
mod core;
mod platform_layer;

use crate::app_logic::MyAppLogic;
use crate::app_logic::handler::APP_NAME_FOR_STORAGE;
use crate::cli::CliAction;
use crate::core::{
    CatalogSession, CorePersistenceManager, DownloadSink, ExportSinkOperations, FolderSink,
    path_utils,
};
use crate::platform_layer::{ConsoleRenderer, PlatformEventHandler, RenderMode};

use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::process;

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if let Err(e) = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ) {
        eprintln!("Failed to initialize logger: {e}");
    }
}

fn build_app_logic(data_dir: Option<PathBuf>, export_dir: Option<PathBuf>) -> MyAppLogic {
    let persistence = match data_dir {
        Some(dir) => CorePersistenceManager::new(dir),
        None => CorePersistenceManager::for_app(APP_NAME_FOR_STORAGE),
    };
    log::debug!("Main: Autosave directory: {:?}", persistence.data_dir());
    let session = CatalogSession::open(Box::new(persistence));

    let preferred: Option<Box<dyn ExportSinkOperations>> =
        Some(Box::new(FolderSink::new(export_dir)));
    let fallback = Box::new(DownloadSink::new(path_utils::get_default_download_dir()));
    MyAppLogic::new(session, preferred, fallback)
}

fn run_event(
    logic: &mut MyAppLogic,
    renderer: &mut ConsoleRenderer<io::Stdout>,
    action: CliAction,
) -> io::Result<()> {
    if let CliAction::Event(event, mode) = action {
        renderer.set_mode(mode);
        logic.handle_event(event);
        renderer.drain(logic)?;
    }
    Ok(())
}

/*
 * Shell mode: one sub-command per line of stdin, tokenized like a POSIX
 * shell. Blank lines and `#` comments are skipped; `quit` or end of input
 * ends the session.
 */
fn run_shell(logic: &mut MyAppLogic, renderer: &mut ConsoleRenderer<io::Stdout>) -> io::Result<()> {
    let interactive = io::stdin().is_terminal();
    logic.on_startup();
    renderer.set_mode(RenderMode::Full);
    renderer.drain(logic)?;

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        if interactive {
            print!("masterlist> ");
            io::stdout().flush()?;
        }
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some(tokens) = shlex::split(trimmed) else {
            eprintln!("error: Invalid quoting: {trimmed}");
            continue;
        };
        let matches = match cli::build_shell_cmd().try_get_matches_from(tokens) {
            Ok(m) => m,
            Err(e) => {
                let _ = e.print();
                continue;
            }
        };
        match cli::matches_to_action(&matches) {
            Some(CliAction::Quit) => break,
            Some(action) => run_event(logic, renderer, action)?,
            None => {}
        }
    }
    Ok(())
}

fn main() {
    let matches = cli::build_cli().get_matches();
    init_logging(matches.get_count("verbose"));
    log::info!("Main: Starting masterlist.");

    let Some(action) = cli::matches_to_action(&matches) else {
        let _ = cli::build_cli().print_help();
        println!();
        process::exit(2);
    };

    let mut logic = build_app_logic(
        matches.get_one::<PathBuf>("data-dir").cloned(),
        matches.get_one::<PathBuf>("export-dir").cloned(),
    );
    let mut renderer = ConsoleRenderer::stdout();

    let result = match action {
        CliAction::Shell => run_shell(&mut logic, &mut renderer),
        other => run_event(&mut logic, &mut renderer, other),
    };
    if let Err(e) = result {
        log::error!("Main: Console I/O failed: {e}");
        process::exit(1);
    }
    log::info!("Main: Exiting with {} problem(s).", renderer.problems());
    if renderer.problems() > 0 {
        process::exit(1);
    }
}
