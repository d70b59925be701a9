use std::fs;
use std::path::{
  Path,
  PathBuf
};
use std::sync::OnceLock;

use chrono::{
  DateTime,
  Utc
};
use chrono_tz::Tz;
use serde::Deserialize;

const TIMEZONE_CONFIG_FILE: &str =
  "taskdeck-time.toml";
const TIMEZONE_ENV_VAR: &str =
  "TASKDECK_TIMEZONE";
const TIMEZONE_CONFIG_ENV_VAR: &str =
  "TASKDECK_TIME_CONFIG";

#[derive(Debug, Deserialize)]
struct TimezoneConfig {
  timezone: Option<String>,
  time:     Option<TimezoneSection>
}

#[derive(Debug, Deserialize)]
struct TimezoneSection {
  timezone: Option<String>
}

/// Timezone used when showing
/// creation timestamps. Resolved once
/// per process.
pub fn display_timezone() -> &'static Tz
{
  static DISPLAY_TZ: OnceLock<Tz> =
    OnceLock::new();
  DISPLAY_TZ.get_or_init(
    resolve_display_timezone
  )
}

#[must_use]
pub fn format_display_date(
  dt: DateTime<Utc>
) -> String {
  format_in(dt, display_timezone())
}

#[must_use]
pub fn format_display_timestamp(
  dt: DateTime<Utc>
) -> String {
  dt.with_timezone(display_timezone())
    .format("%Y-%m-%d %H:%M %Z")
    .to_string()
}

fn format_in(
  dt: DateTime<Utc>,
  tz: &Tz
) -> String {
  dt.with_timezone(tz)
    .format("%Y-%m-%d")
    .to_string()
}

fn resolve_display_timezone() -> Tz {
  if let Ok(raw) =
    std::env::var(TIMEZONE_ENV_VAR)
    && let Some(tz) = parse_timezone(
      &raw,
      TIMEZONE_ENV_VAR
    )
  {
    return tz;
  }

  if let Some(path) =
    timezone_config_path()
    && let Some(tz) =
      load_timezone_from_file(&path)
  {
    return tz;
  }

  tracing::debug!(
    "no display timezone configured; \
     using UTC"
  );
  chrono_tz::UTC
}

fn timezone_config_path()
-> Option<PathBuf> {
  if let Ok(raw) = std::env::var(
    TIMEZONE_CONFIG_ENV_VAR
  ) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(PathBuf::from(
        trimmed
      ));
    }
  }

  std::env::current_dir().ok().map(
    |dir| {
      dir.join(TIMEZONE_CONFIG_FILE)
    }
  )
}

fn load_timezone_from_file(
  path: &Path
) -> Option<Tz> {
  if !path.exists() {
    tracing::debug!(
      file = %path.display(),
      "timezone config file not found"
    );
    return None;
  }

  let raw = match fs::read_to_string(
    path
  ) {
    | Ok(raw) => raw,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed reading timezone config file"
      );
      return None;
    }
  };

  parse_timezone_config(
    &raw,
    &format!("file:{}", path.display())
  )
}

fn parse_timezone_config(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let parsed = match toml::from_str::<
    TimezoneConfig
  >(raw)
  {
    | Ok(parsed) => parsed,
    | Err(err) => {
      tracing::error!(
        source,
        error = %err,
        "failed parsing timezone config"
      );
      return None;
    }
  };

  let timezone =
    parsed.timezone.or_else(|| {
      parsed.time.and_then(|section| {
        section.timezone
      })
    });
  let Some(timezone) = timezone else {
    tracing::warn!(
      source,
      "timezone config had no timezone field"
    );
    return None;
  };

  parse_timezone(
    timezone.as_str(),
    source
  )
}

fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::info!(
        source,
        timezone = %trimmed,
        "configured display timezone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id"
      );
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::{
    TimeZone,
    Utc
  };

  use super::{
    format_in,
    parse_timezone,
    parse_timezone_config
  };

  #[test]
  fn reads_top_level_and_sectioned_timezone()
   {
    assert_eq!(
      parse_timezone_config(
        "timezone = \"Europe/Madrid\"",
        "test"
      ),
      Some(chrono_tz::Europe::Madrid)
    );
    assert_eq!(
      parse_timezone_config(
        "[time]\ntimezone = \"Asia/Tokyo\"",
        "test"
      ),
      Some(chrono_tz::Asia::Tokyo)
    );
    assert_eq!(
      parse_timezone_config(
        "other = 1",
        "test"
      ),
      None
    );
  }

  #[test]
  fn rejects_unknown_zone() {
    assert_eq!(
      parse_timezone(
        "Mars/Olympus",
        "test"
      ),
      None
    );
    assert_eq!(
      parse_timezone("  ", "test"),
      None
    );
  }

  #[test]
  fn formats_in_given_zone() {
    let dt = Utc
      .with_ymd_and_hms(
        2026, 2, 17, 2, 0, 0
      )
      .single()
      .expect("valid instant");
    assert_eq!(
      format_in(
        dt,
        &chrono_tz::America::Mexico_City
      ),
      "2026-02-16"
    );
    assert_eq!(
      format_in(dt, &chrono_tz::UTC),
      "2026-02-17"
    );
  }
}
