//! Extracting column names from remote schema error messages.
//!
//! The remote protocol reports a missing column only inside its human-readable
//! message, so every retry decision that strips a field goes through
//! [`missing_column`]. Message shapes currently recognised:
//!
//! | Source | Example |
//! |--------|---------|
//! | PostgreSQL `42703` | `column "color" of relation "services" does not exist` |
//! | PostgREST `PGRST204` | `Could not find the 'color' column of 'services' in the schema cache` |
//! | PostgreSQL, qualified | `column services.color does not exist` |

use std::sync::LazyLock;

use regex::Regex;

static QUOTED_AFTER_COLUMN: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r#"(?i)\bcolumn\s+"([^"]+)""#).expect("valid regex"));

static QUOTED_BEFORE_COLUMN: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)'([^']+)'\s+column\b").expect("valid regex"));

static BARE_QUALIFIED: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)\bcolumn\s+([A-Za-z_][\w$]*(?:\.[A-Za-z_][\w$]*)*)\s+does not exist")
    .expect("valid regex")
});

/// Name of the column a schema error complains about, if the message names
/// one. Qualified names (`table.column`) yield the last segment.
pub fn missing_column(message: &str) -> Option<String> {
  [&*QUOTED_AFTER_COLUMN, &*QUOTED_BEFORE_COLUMN, &*BARE_QUALIFIED]
    .into_iter()
    .find_map(|re| re.captures(message))
    .and_then(|caps| caps.get(1))
    .map(|m| unqualify(m.as_str()).to_owned())
    .filter(|name| !name.is_empty())
}

/// Whether `message` refers to `field` anywhere, including inside constraint
/// names such as `orders_user_id_fkey`.
pub fn mentions_field(message: &str, field: &str) -> bool {
  !field.is_empty() && message.contains(field)
}

fn unqualify(name: &str) -> &str { name.rsplit('.').next().unwrap_or(name) }
