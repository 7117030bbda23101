#![forbid(unsafe_code)]

use std::path::PathBuf;

use portal_contracts::visitor::VisitorRecord;
use portal_engines::sha256_hex;
use portal_storage::visitor_log::default_visitor_log_path;
use portal_storage::VisitorLogRepo;

pub const USAGE: &str =
    "usage: portal admin hash-password | portal visitors <ls|count> [log_path]";

pub fn execute_admin_command(subcommand: &str, password: Option<&str>) -> Result<String, String> {
    match subcommand {
        "hash-password" => {
            let password = password.ok_or_else(|| "missing password input".to_string())?;
            if password.is_empty() {
                return Err("password must not be empty".to_string());
            }
            Ok(sha256_hex(password.as_bytes()))
        }
        _ => Err(format!(
            "unknown admin subcommand: {subcommand}. expected one of: hash-password"
        )),
    }
}

pub fn execute_visitors_command(
    log: &dyn VisitorLogRepo,
    subcommand: &str,
) -> Result<String, String> {
    match subcommand {
        "ls" => {
            let rows = log
                .load_visitor_rows()
                .map_err(|e| format!("failed to read visitor log: {e}"))?;
            Ok(rows.iter().map(visitor_line).collect::<Vec<_>>().join("\n"))
        }
        "count" => {
            let rows = log
                .load_visitor_rows()
                .map_err(|e| format!("failed to read visitor log: {e}"))?;
            Ok(rows.len().to_string())
        }
        _ => Err(format!(
            "unknown visitors subcommand: {subcommand}. expected one of: ls, count"
        )),
    }
}

/// Explicit argument first, then `PORTAL_DATA_PATH`, then the server's default location.
pub fn resolve_log_path<F>(explicit: Option<&str>, lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = explicit.filter(|p| !p.trim().is_empty()) {
        return PathBuf::from(path);
    }
    let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    match var("PORTAL_DATA_PATH") {
        Some(path) => PathBuf::from(path),
        None => default_visitor_log_path(var("HOME").as_deref()),
    }
}

fn visitor_line(record: &VisitorRecord) -> String {
    [
        record.server_timestamp.as_str(),
        record.full_name.as_str(),
        record.purpose.as_str(),
        record.source_address.as_str(),
    ]
    .join("\t")
}
