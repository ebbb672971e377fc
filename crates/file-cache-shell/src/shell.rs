//! Line commands over a cache of JSON values

use crate::error::{Result, ShellError};
use chrono::Duration;
use file_cache::FileCache;
use serde_json::Value;

const DEFAULT_TTL_SECS: i64 = 60 * 60;

pub const HELP: &str = "\
commands:
  set <key> <json> [ttl_secs]      store unconditionally
  add <key> <json> [ttl_secs]      store if absent
  replace <key> <json> [ttl_secs]  overwrite if present
  get <key> | delete <key> | has <key>
  count | clear | sweep | stats | help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Set { key: String, value: Value, ttl: Duration },
    Add { key: String, value: Value, ttl: Duration },
    Replace { key: String, value: Value, ttl: Duration },
    Get(String),
    Delete(String),
    Has(String),
    Count,
    Clear,
    Sweep,
    Stats,
    Help,
    Quit,
}

/// Parse one input line. Blank lines and `#` comments yield `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (verb, rest) = split_word(line);
    let command = match verb.to_ascii_lowercase().as_str() {
        "set" => {
            let (key, value, ttl) = parse_write(rest)?;
            Command::Set { key, value, ttl }
        }
        "add" => {
            let (key, value, ttl) = parse_write(rest)?;
            Command::Add { key, value, ttl }
        }
        "replace" => {
            let (key, value, ttl) = parse_write(rest)?;
            Command::Replace { key, value, ttl }
        }
        "get" => Command::Get(parse_key(rest)?),
        "delete" | "del" => Command::Delete(parse_key(rest)?),
        "has" => Command::Has(parse_key(rest)?),
        "count" => Command::Count,
        "clear" => Command::Clear,
        "sweep" => Command::Sweep,
        "stats" => Command::Stats,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(ShellError::Parse(format!("unknown command: {}", other))),
    };

    Ok(Some(command))
}

fn split_word(s: &str) -> (&str, &str) {
    match s.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (s, ""),
    }
}

fn parse_key(rest: &str) -> Result<String> {
    let (key, extra) = split_word(rest);
    if key.is_empty() {
        return Err(ShellError::Parse("missing key".to_string()));
    }
    if !extra.is_empty() {
        return Err(ShellError::Parse(format!("unexpected input: {}", extra)));
    }
    Ok(key.to_string())
}

/// `<key> <json> [ttl_secs]`. The JSON value may contain spaces, so a
/// trailing integer is only taken as the TTL when what precedes it is valid JSON.
fn parse_write(rest: &str) -> Result<(String, Value, Duration)> {
    let (key, payload) = split_word(rest);
    if key.is_empty() {
        return Err(ShellError::Parse("missing key".to_string()));
    }
    if payload.is_empty() {
        return Err(ShellError::Parse("missing value".to_string()));
    }

    if let Some((head, tail)) = payload.rsplit_once(char::is_whitespace) {
        if let (Ok(secs), Ok(value)) = (
            tail.parse::<i64>(),
            serde_json::from_str::<Value>(head.trim()),
        ) {
            let ttl = Duration::try_seconds(secs)
                .ok_or_else(|| ShellError::Parse(format!("ttl out of range: {}", secs)))?;
            return Ok((key.to_string(), value, ttl));
        }
    }

    let value = serde_json::from_str::<Value>(payload)
        .map_err(|e| ShellError::Parse(format!("invalid JSON value: {}", e)))?;
    Ok((key.to_string(), value, Duration::seconds(DEFAULT_TTL_SECS)))
}

/// Run a command against the cache and render its output line
pub async fn execute(cache: &FileCache<Value>, command: Command) -> Result<String> {
    let output = match command {
        Command::Set { key, value, ttl } => {
            cache.set(&key, &value, ttl).await?;
            "OK".to_string()
        }
        Command::Add { key, value, ttl } => {
            cache.add(&key, &value, ttl).await?;
            "OK".to_string()
        }
        Command::Replace { key, value, ttl } => {
            let old = cache.replace(&key, &value, ttl).await?;
            format!("OK (was {})", old)
        }
        Command::Get(key) => match cache.get(&key).await {
            Some(value) => value.to_string(),
            None => "(nil)".to_string(),
        },
        Command::Delete(key) => cache.delete(&key).await?.to_string(),
        Command::Has(key) => cache.has(&key).await.to_string(),
        Command::Count => cache.item_count().await.to_string(),
        Command::Clear => {
            cache.clear().await?;
            "OK".to_string()
        }
        Command::Sweep => {
            let removed = cache.delete_expired().await?;
            format!("removed {}", removed)
        }
        Command::Stats => {
            let stats = cache.stats().await;
            serde_json::to_string(&stats)?
        }
        Command::Help => HELP.to_string(),
        Command::Quit => String::new(),
    };

    Ok(output)
}
