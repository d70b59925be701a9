pub mod board;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod error;
pub mod render;
pub mod store;
pub mod suggest;
pub mod task;
pub mod view;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

pub use board::{
  BoardError,
  TaskBoard
};
pub use error::{
  StorageError,
  ValidationError
};
pub use store::{
  JsonlStore,
  TaskStore
};
pub use suggest::{
  SuggestedTask,
  generate
};
pub use task::{
  NewTask,
  Status,
  Task,
  TaskId,
  TaskPatch
};
pub use view::{
  Projection,
  SortOrder,
  StatusFilter,
  TaskStats,
  ViewState,
  project
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting taskdeck CLI"
  );

  let mut cfg = config::Config::load(
    cli.taskdeckrc.as_deref()
  )?;
  cfg.apply_overrides(
    cli
      .rc_overrides
      .into_iter()
      .map(|kv| (kv.key, kv.value))
  );
  debug!(
    files = ?cfg.loaded_files,
    "configuration loaded"
  );

  let data_dir =
    config::resolve_data_dir(
      &cfg,
      cli.data.as_deref()
    )
    .context(
      "failed to resolve data \
       directory"
    )?;
  let owner = config::resolve_owner(
    &cfg,
    cli.owner.as_deref()
  );

  let store = store::JsonlStore::open(
    &data_dir
  )
  .with_context(|| {
    format!(
      "failed to open task store at {}",
      data_dir.display()
    )
  })?;

  let mut board =
    board::TaskBoard::open(
      store, &owner
    )
    .with_context(|| {
      format!(
        "failed to load tasks for \
         {owner}"
      )
    })?;

  let mut renderer =
    render::Renderer::new(&cfg)?;

  commands::dispatch(
    &mut board,
    &cfg,
    &mut renderer,
    cli.command
  )?;

  info!("done");
  Ok(())
}
