use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io::{self, ConfigError, Settings};
use crate::io::gateway::{HttpGateway, TaskGateway};
use crate::model::column::Column;
use crate::model::task::{Task, TaskId};
use crate::ops::board_ops::{self, BoardError};
use crate::ops::controller::{BoardController, MoveOutcome};
use crate::ops::validate::TaskForm;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let Some(command) = cli.command else {
        return Err("no subcommand given (try `tb --help`)".into());
    };

    // Config commands work without a base URL
    if let Commands::Config(args) = command {
        return cmd_config(args, cli.config.as_deref());
    }

    let settings = config_io::load_settings(cli.config.as_deref(), cli.api_url.as_deref())?;
    let mut controller = connect(&settings)?;

    match command {
        // Read commands
        Commands::List(args) => cmd_list(&mut controller, args, json),
        Commands::Show(args) => cmd_show(&mut controller, args, json),

        // Write commands
        Commands::Add(args) => cmd_add(&mut controller, args, json),
        Commands::Edit(args) => cmd_edit(&mut controller, args),
        Commands::Delete(args) => cmd_delete(&mut controller, args),
        Commands::Move(args) => cmd_move(&mut controller, args, json),

        Commands::Config(_) => unreachable!(),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build an HTTP gateway for the resolved settings
pub fn connect_gateway(
    settings: &Settings,
) -> Result<Arc<dyn TaskGateway>, Box<dyn std::error::Error>> {
    let timeout = Duration::from_secs(settings.config.api.timeout_secs);
    let gateway = HttpGateway::new(&settings.base_url, timeout)?;
    tracing::debug!(base_url = gateway.base_url(), "using task API");
    Ok(Arc::new(gateway))
}

fn connect(
    settings: &Settings,
) -> Result<BoardController<Arc<dyn TaskGateway>>, Box<dyn std::error::Error>> {
    Ok(BoardController::new(connect_gateway(settings)?))
}

fn find_task<G: TaskGateway>(
    controller: &BoardController<G>,
    id: TaskId,
) -> Result<Task, BoardError> {
    controller
        .board()
        .find_task(id)
        .cloned()
        .ok_or(BoardError::TaskNotFound(id))
}

// ---------------------------------------------------------------------------
// Read command handlers
// ---------------------------------------------------------------------------

fn cmd_list<G: TaskGateway>(
    controller: &mut BoardController<G>,
    args: ListArgs,
    json: bool,
) -> CmdResult {
    controller.load()?;
    if let Some(term) = args.search.as_deref() {
        controller.set_search(term);
    }

    let board = controller.board();
    let columns = board_ops::partition(&board.tasks, &board.search);
    if json {
        let output = board_to_json(&columns, &board.search);
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for line in format_board(&columns) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_show<G: TaskGateway>(
    controller: &mut BoardController<G>,
    args: ShowArgs,
    json: bool,
) -> CmdResult {
    controller.load()?;
    let task = find_task(controller, args.id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&task_to_json(&task))?);
    } else {
        for line in format_task_detail(&task) {
            println!("{}", line);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write command handlers
// ---------------------------------------------------------------------------

fn cmd_add<G: TaskGateway>(
    controller: &mut BoardController<G>,
    args: AddArgs,
    json: bool,
) -> CmdResult {
    let form = TaskForm {
        title: args.title,
        details: args.details,
        author: args.author,
        status: args.status.to_uppercase(),
    };

    match controller.create_task(&form)? {
        Some(task) if json => {
            println!("{}", serde_json::to_string_pretty(&task_to_json(&task))?)
        }
        Some(task) => println!("{}", task.id),
        None => println!("created"),
    }
    Ok(())
}

/// Fields not given on the command line keep their current value; the merged
/// task is validated as a whole.
fn cmd_edit<G: TaskGateway>(controller: &mut BoardController<G>, args: EditArgs) -> CmdResult {
    controller.load()?;
    let current = find_task(controller, args.id)?;

    let mut form = TaskForm::from_task(&current);
    if let Some(title) = args.title {
        form.title = title;
    }
    if let Some(details) = args.details {
        form.details = details;
    }
    if let Some(author) = args.author {
        form.author = author;
    }
    if let Some(status) = args.status {
        form.status = status.to_uppercase();
    }

    controller.edit_task(args.id, &form)?;
    println!("{} updated", args.id);
    Ok(())
}

fn cmd_delete<G: TaskGateway>(controller: &mut BoardController<G>, args: DeleteArgs) -> CmdResult {
    controller.delete_task(args.id)?;
    println!("{} deleted", args.id);
    Ok(())
}

fn cmd_move<G: TaskGateway>(
    controller: &mut BoardController<G>,
    args: MoveArgs,
    json: bool,
) -> CmdResult {
    let dest: Column = args.column.parse()?;
    controller.load()?;

    let board = controller.board();
    if board.find_task(args.id).is_none() {
        return Err(BoardError::TaskNotFound(args.id).into());
    }
    let source = board_ops::locate(&board.tasks, &board.search, args.id)
        .ok_or(BoardError::NotOnBoard(args.id))?;

    if source.column == dest {
        // Ordering is never sent to the server
        controller.reorder_within_column(dest, source.index, args.index)?;
        println!("{} already in {}", args.id, dest);
        return Ok(());
    }

    match controller.move_across_columns(source.column, dest, source.index, args.index)? {
        MoveOutcome::Committed { task_id } => {
            if json {
                let output = MoveJson {
                    id: task_id,
                    status: dest.status(),
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{} → {}", task_id, dest);
            }
            Ok(())
        }
        MoveOutcome::RolledBack { error, .. } => Err(format!(
            "move rolled back: {}",
            error.user_message("failed to update status")
        )
        .into()),
    }
}

// ---------------------------------------------------------------------------
// Config handlers
// ---------------------------------------------------------------------------

fn cmd_config(args: ConfigCmd, config_flag: Option<&Path>) -> CmdResult {
    let path = config_io::config_path(config_flag).ok_or(ConfigError::NoConfigDir)?;
    match args.action {
        ConfigAction::Path => {
            println!("{}", path.display());
        }
        ConfigAction::SetUrl(a) => {
            config_io::set_base_url(&path, &a.url)?;
            println!("base_url set in {}", path.display());
        }
    }
    Ok(())
}
