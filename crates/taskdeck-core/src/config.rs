use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

use crate::view::{
  SortOrder,
  StatusFilter
};

const DEFAULT_OWNER: &str = "local";

#[derive(Debug, Clone)]
pub struct Config {
  map: HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    let mut map = HashMap::new();
    map.insert(
      "data.location".to_string(),
      "~/.taskdeck".to_string()
    );
    map.insert(
      "color".to_string(),
      "on".to_string()
    );
    map.insert(
      "view.status".to_string(),
      "all".to_string()
    );
    map.insert(
      "view.sort".to_string(),
      "latest".to_string()
    );

    Self {
      map,
      loaded_files: vec![]
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    let rc = resolve_rc_path(rc_override)?;
    if let Some(path) = rc {
      info!(rc = %path.display(), "loading taskdeckrc");
      cfg.load_file(&path)?;
    } else {
      debug!(
        "no taskdeckrc found; using \
         defaults"
      );
    }

    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  pub fn status_filter(
    &self
  ) -> anyhow::Result<StatusFilter> {
    let raw = self
      .get("view.status")
      .unwrap_or_default();
    raw.parse().with_context(|| {
      format!(
        "invalid view.status setting: \
         {raw}"
      )
    })
  }

  pub fn sort_order(
    &self
  ) -> anyhow::Result<SortOrder> {
    let raw = self
      .get("view.sort")
      .unwrap_or_default();
    raw.parse().with_context(|| {
      format!(
        "invalid view.sort setting: \
         {raw}"
      )
    })
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;

    self
      .loaded_files
      .push(path.clone());

    let base_dir = path
      .parent()
      .map(|p| p.to_path_buf())
      .unwrap_or_else(|| {
        PathBuf::from(".")
      });

    self.load_text(&text, &path, &base_dir)
  }

  fn load_text(
    &mut self,
    text: &str,
    path: &Path,
    base_dir: &Path
  ) -> anyhow::Result<()> {
    for (line_num, raw_line) in
      text.lines().enumerate()
    {
      let mut line = raw_line.trim();
      if line.is_empty()
        || line.starts_with('#')
      {
        continue;
      }

      if let Some((before, _)) =
        line.split_once('#')
      {
        line = before.trim();
      }

      if line.is_empty() {
        continue;
      }

      if let Some(include_rest) =
        line.strip_prefix("include ")
      {
        let include_path =
          resolve_include_path(
            base_dir,
            include_rest.trim()
          )?;
        debug!(
            file = %path.display(),
            include = %include_path.display(),
            line = line_num + 1,
            "processing include"
        );

        if self
          .loaded_files
          .contains(&include_path)
        {
          warn!(include = %include_path.display(), "include cycle detected; skipping");
        } else if include_path.exists()
        {
          self
            .load_file(&include_path)?;
        } else {
          warn!(include = %include_path.display(), "include file does not exist; skipping");
        }
        continue;
      }

      let (k, v) = line
        .split_once('=')
        .ok_or_else(|| {
          anyhow!(
            "invalid config line \
             {}:{}: {}",
            path.display(),
            line_num + 1,
            raw_line
          )
        })?;

      let key = k.trim().to_string();
      let value = v.trim().to_string();
      trace!(key = %key, value = %value, "loaded config key");
      self.map.insert(key, value);
    }

    Ok(())
  }
}

#[tracing::instrument(skip(
  cfg,
  override_dir
))]
pub fn resolve_data_dir(
  cfg: &Config,
  override_dir: Option<&Path>
) -> anyhow::Result<PathBuf> {
  let dir = if let Some(path) =
    override_dir
  {
    path.to_path_buf()
  } else if let Some(cfg_value) =
    cfg.get("data.location")
  {
    expand_tilde(Path::new(&cfg_value))
  } else {
    default_data_dir()?
  };

  if !dir.exists() {
    info!(dir = %dir.display(), "creating data directory");
    fs::create_dir_all(&dir)
      .with_context(|| {
        format!(
          "failed to create {}",
          dir.display()
        )
      })?;
  }

  Ok(dir)
}

/// `--owner`, then the `owner` key,
/// then `$USER`, then `local`.
pub fn resolve_owner(
  cfg: &Config,
  override_owner: Option<&str>
) -> String {
  override_owner
    .map(str::to_string)
    .or_else(|| cfg.get("owner"))
    .or_else(|| {
      std::env::var("USER").ok()
    })
    .map(|owner| {
      owner.trim().to_string()
    })
    .filter(|owner| !owner.is_empty())
    .unwrap_or_else(|| {
      DEFAULT_OWNER.to_string()
    })
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_rc_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(rc_env) =
    std::env::var("TASKDECKRC")
  {
    if rc_env == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      rc_env
    )));
  }

  let home = dirs::home_dir()
    .ok_or_else(|| {
      anyhow!(
        "cannot determine home \
         directory"
      )
    })?;
  let candidate =
    home.join(".taskdeckrc");
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn default_data_dir()
-> anyhow::Result<PathBuf> {
  let home = dirs::home_dir()
    .ok_or_else(|| {
      anyhow!(
        "cannot determine home \
         directory"
      )
    })?;
  Ok(home.join(".taskdeck"))
}

fn resolve_include_path(
  base_dir: &Path,
  include: &str
) -> anyhow::Result<PathBuf> {
  if include.trim().is_empty() {
    return Err(anyhow!(
      "include path cannot be empty"
    ));
  }

  let raw = PathBuf::from(include);
  let expanded = expand_tilde(&raw);
  if expanded.is_absolute() {
    Ok(expanded)
  } else {
    Ok(base_dir.join(expanded))
  }
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use std::fs;

  use tempfile::tempdir;

  use super::*;

  #[test]
  fn rc_file_with_include_and_overrides()
   {
    let temp =
      tempdir().expect("tempdir");
    let extra =
      temp.path().join("extra.rc");
    fs::write(
      &extra,
      "view.sort = oldest\n"
    )
    .expect("write include");
    let main = temp.path().join("main.rc");
    fs::write(
      &main,
      "# comment\nowner = ana # trailing\n\ninclude extra.rc\ninclude missing.rc\ncolor=off\n"
    )
    .expect("write rc");

    let mut cfg =
      Config::load(Some(&main))
        .expect("load config");
    assert_eq!(cfg.loaded_files.len(), 2);
    assert_eq!(
      cfg.get("owner").as_deref(),
      Some("ana")
    );
    assert_eq!(
      cfg.get("color").as_deref(),
      Some("off")
    );
    assert_eq!(
      cfg.sort_order().expect("sort"),
      SortOrder::Oldest
    );
    assert_eq!(
      cfg.status_filter().expect("status"),
      StatusFilter::All
    );

    cfg.apply_overrides(vec![(
      "rc.view.status".to_string(),
      "completed".to_string()
    )]);
    assert_eq!(
      cfg.status_filter().expect("status"),
      StatusFilter::Completed
    );
    assert_eq!(
      resolve_owner(&cfg, Some("bo")),
      "bo"
    );
    assert_eq!(
      resolve_owner(&cfg, None),
      "ana"
    );
  }

  #[test]
  fn malformed_line_is_an_error() {
    let temp =
      tempdir().expect("tempdir");
    let rc = temp.path().join("bad.rc");
    fs::write(&rc, "owner ana\n")
      .expect("write rc");
    let err = Config::load(Some(&rc))
      .expect_err("should fail");
    assert!(
      err
        .to_string()
        .contains("invalid config line")
    );
  }

  #[test]
  fn invalid_view_setting_is_reported() {
    let mut cfg = Config::default();
    cfg.apply_overrides(vec![(
      "view.sort".to_string(),
      "newest".to_string()
    )]);
    assert!(cfg.sort_order().is_err());
  }

  #[test]
  fn data_dir_override_is_created() {
    let temp =
      tempdir().expect("tempdir");
    let target =
      temp.path().join("nested/data");
    let dir = resolve_data_dir(
      &Config::default(),
      Some(&target)
    )
    .expect("resolve");
    assert_eq!(dir, target);
    assert!(dir.is_dir());
  }
}
