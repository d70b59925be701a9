use anyhow::{
  Context,
  anyhow
};
use tracing::{
  debug,
  info,
  instrument
};

use crate::board::TaskBoard;
use crate::cli::{
  Command,
  ListArgs,
  SuggestArgs
};
use crate::config::Config;
use crate::render::Renderer;
use crate::store::TaskStore;
use crate::suggest;
use crate::task::{
  Status,
  TaskId
};
use crate::view::ViewState;

#[instrument(skip(
  board, cfg, renderer, command
))]
pub fn dispatch<S: TaskStore>(
  board: &mut TaskBoard<S>,
  cfg: &Config,
  renderer: &mut Renderer,
  command: Option<Command>
) -> anyhow::Result<()> {
  let command = command.unwrap_or_else(
    || Command::List(ListArgs::default())
  );

  debug!(?command, "dispatching command");

  match command {
    | Command::Add {
      title,
      notes
    } => {
      cmd_add(
        board,
        &title.join(" "),
        notes.as_deref()
      )
    }
    | Command::Edit {
      id,
      title,
      notes,
      clear_notes
    } => {
      cmd_edit(
        board,
        &id,
        title,
        notes,
        clear_notes
      )
    }
    | Command::Done {
      id
    } => {
      cmd_set_status(
        board,
        &id,
        Status::Completed
      )
    }
    | Command::Reopen {
      id
    } => {
      cmd_set_status(
        board,
        &id,
        Status::Pending
      )
    }
    | Command::Toggle {
      id
    } => cmd_toggle(board, &id),
    | Command::Delete {
      id
    } => cmd_delete(board, &id),
    | Command::Info {
      id
    } => cmd_info(board, renderer, &id),
    | Command::List(args) => {
      cmd_list(
        board, cfg, renderer, args
      )
    }
    | Command::Stats => {
      cmd_stats(board, renderer)
    }
    | Command::Suggest(args) => {
      cmd_suggest(
        board, renderer, args
      )
    }
  }
}

/// Merges explicit list flags over the
/// configured view defaults.
pub fn resolve_view(
  cfg: &Config,
  args: ListArgs
) -> anyhow::Result<ViewState> {
  let status = match args.status {
    | Some(status) => status,
    | None => cfg.status_filter()?
  };
  let sort = match args.sort {
    | Some(sort) => sort,
    | None => cfg.sort_order()?
  };

  Ok(ViewState {
    search: args
      .search
      .unwrap_or_default(),
    status,
    sort
  })
}

#[instrument(skip(board, title, notes))]
fn cmd_add<S: TaskStore>(
  board: &mut TaskBoard<S>,
  title: &str,
  notes: Option<&str>
) -> anyhow::Result<()> {
  info!("command add");

  let id =
    board.create_task(title, notes)?;
  println!(
    "Created task {}.",
    short(id)
  );
  Ok(())
}

#[instrument(skip(
  board,
  title,
  notes
))]
fn cmd_edit<S: TaskStore>(
  board: &mut TaskBoard<S>,
  id_text: &str,
  title: Option<String>,
  notes: Option<String>,
  clear_notes: bool
) -> anyhow::Result<()> {
  info!("command edit");

  if title.is_none()
    && notes.is_none()
    && !clear_notes
  {
    return Err(anyhow!(
      "edit requires --title, --notes \
       or --clear-notes"
    ));
  }

  let id = board.resolve_id(id_text)?;
  let current = board
    .get(id)
    .ok_or_else(|| {
      anyhow!("task vanished: {id}")
    })?
    .clone();

  let title =
    title.unwrap_or(current.title);
  let notes = if clear_notes {
    None
  } else {
    notes.or(current.notes)
  };

  board.edit_task(
    id,
    &title,
    notes.as_deref()
  )?;
  println!(
    "Updated task {}.",
    short(id)
  );
  Ok(())
}

#[instrument(skip(board))]
fn cmd_set_status<S: TaskStore>(
  board: &mut TaskBoard<S>,
  id_text: &str,
  status: Status
) -> anyhow::Result<()> {
  info!("command set status");

  let id = board.resolve_id(id_text)?;
  board.set_status(id, status)?;
  println!(
    "Task {} is now {status}.",
    short(id)
  );
  Ok(())
}

#[instrument(skip(board))]
fn cmd_toggle<S: TaskStore>(
  board: &mut TaskBoard<S>,
  id_text: &str
) -> anyhow::Result<()> {
  info!("command toggle");

  let id = board.resolve_id(id_text)?;
  let status = board.toggle_status(id)?;
  println!(
    "Task {} is now {status}.",
    short(id)
  );
  Ok(())
}

#[instrument(skip(board))]
fn cmd_delete<S: TaskStore>(
  board: &mut TaskBoard<S>,
  id_text: &str
) -> anyhow::Result<()> {
  info!("command delete");

  let id = board.resolve_id(id_text)?;
  board.delete_task(id)?;
  println!(
    "Deleted task {}.",
    short(id)
  );
  Ok(())
}

#[instrument(skip(board, renderer))]
fn cmd_info<S: TaskStore>(
  board: &TaskBoard<S>,
  renderer: &mut Renderer,
  id_text: &str
) -> anyhow::Result<()> {
  let id = board.resolve_id(id_text)?;
  let task = board
    .get(id)
    .ok_or_else(|| {
      anyhow!("task vanished: {id}")
    })?;
  renderer.print_task_info(task)
}

#[instrument(skip(
  board, cfg, renderer, args
))]
fn cmd_list<S: TaskStore>(
  board: &TaskBoard<S>,
  cfg: &Config,
  renderer: &mut Renderer,
  args: ListArgs
) -> anyhow::Result<()> {
  let view = resolve_view(cfg, args)?;
  debug!(?view, "listing tasks");
  let projection = board.project(&view);
  renderer.print_projection(&projection)
}

#[instrument(skip(board, renderer))]
fn cmd_stats<S: TaskStore>(
  board: &TaskBoard<S>,
  renderer: &mut Renderer
) -> anyhow::Result<()> {
  let projection =
    board.project(&ViewState::default());
  renderer.print_stats(&projection.stats)
}

#[instrument(skip(
  board, renderer, args
))]
fn cmd_suggest<S: TaskStore>(
  board: &mut TaskBoard<S>,
  renderer: &mut Renderer,
  args: SuggestArgs
) -> anyhow::Result<()> {
  info!("command suggest");

  if args.themes {
    for keyword in suggest::keywords() {
      println!("{keyword}");
    }
    return Ok(());
  }

  let goal = args.goal.join(" ");
  let suggestions =
    board.suggest(&goal)?;
  renderer
    .print_suggestions(&suggestions)?;

  let picks =
    selected_indices(&args, suggestions.len())?;
  for idx in picks {
    let suggestion = &suggestions[idx];
    let id = board
      .save_suggestion(suggestion)
      .with_context(|| {
        format!(
          "failed saving suggestion {}",
          idx + 1
        )
      })?;
    println!(
      "Saved \"{}\" as task {}.",
      suggestion.title,
      short(id)
    );
  }

  Ok(())
}

/// Zero-based indices to save, in the
/// order given. Repeats are kept: each
/// pick saves another task.
fn selected_indices(
  args: &SuggestArgs,
  available: usize
) -> anyhow::Result<Vec<usize>> {
  if args.save_all {
    return Ok((0..available).collect());
  }

  args
    .save
    .iter()
    .map(|&number| {
      if number == 0 || number > available
      {
        Err(anyhow!(
          "suggestion {number} out of \
           range (1-{available})"
        ))
      } else {
        Ok(number - 1)
      }
    })
    .collect()
}

fn short(id: TaskId) -> String {
  id.to_string()
    .chars()
    .take(8)
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::view::{
    SortOrder,
    StatusFilter
  };

  fn suggest_args(
    save: Vec<usize>,
    save_all: bool
  ) -> SuggestArgs {
    SuggestArgs {
      goal: vec!["travel".to_string()],
      save,
      save_all,
      themes: false
    }
  }

  #[test]
  fn save_indices_are_one_based() {
    assert_eq!(
      selected_indices(
        &suggest_args(vec![2, 1, 2], false),
        5
      )
      .expect("indices"),
      vec![1, 0, 1]
    );
    assert_eq!(
      selected_indices(
        &suggest_args(vec![], true),
        4
      )
      .expect("indices"),
      vec![0, 1, 2, 3]
    );
    assert!(
      selected_indices(
        &suggest_args(vec![0], false),
        4
      )
      .is_err()
    );
    assert!(
      selected_indices(
        &suggest_args(vec![5], false),
        4
      )
      .is_err()
    );
  }

  #[test]
  fn list_flags_override_config_defaults()
   {
    let mut cfg = Config::default();
    cfg.apply_overrides(vec![(
      "view.sort".to_string(),
      "oldest".to_string()
    )]);

    let view = resolve_view(
      &cfg,
      ListArgs::default()
    )
    .expect("view");
    assert_eq!(view.sort, SortOrder::Oldest);
    assert_eq!(view.status, StatusFilter::All);

    let view = resolve_view(
      &cfg,
      ListArgs {
        search: Some("milk".to_string()),
        status: Some(
          StatusFilter::Pending
        ),
        sort: Some(SortOrder::Latest)
      }
    )
    .expect("view");
    assert_eq!(view.search, "milk");
    assert_eq!(
      view.status,
      StatusFilter::Pending
    );
    assert_eq!(view.sort, SortOrder::Latest);
  }
}
