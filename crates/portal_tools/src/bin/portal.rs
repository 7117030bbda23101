#![forbid(unsafe_code)]

use std::env;
use std::io::{self, IsTerminal, Read};

use portal_storage::visitor_log::JsonFileVisitorLog;
use portal_tools::operator_cli::{
    execute_admin_command, execute_visitors_command, resolve_log_path, USAGE,
};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = env::args().skip(1).collect();
    let group = args.first().map(String::as_str);
    let subcommand = args
        .get(1)
        .map(String::as_str)
        .ok_or_else(|| USAGE.to_string())?;

    let output = match group {
        Some("admin") => {
            let password = if subcommand == "hash-password" {
                Some(read_password()?)
            } else {
                None
            };
            execute_admin_command(subcommand, password.as_deref())?
        }
        Some("visitors") => {
            let path = resolve_log_path(args.get(2).map(String::as_str), |key| env::var(key).ok());
            let log = JsonFileVisitorLog::attach_read_only(path);
            execute_visitors_command(&log, subcommand)?
        }
        _ => return Err(USAGE.to_string()),
    };
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}

fn read_password() -> Result<String, String> {
    if io::stdin().is_terminal() {
        let value =
            rpassword::prompt_password("Admin password: ").map_err(|e| e.to_string())?;
        if value.is_empty() {
            return Err("password must not be empty".to_string());
        }
        Ok(value)
    } else {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .map_err(|e| e.to_string())?;
        let value = input.trim_end_matches(['\r', '\n']).to_string();
        if value.is_empty() {
            return Err("password must not be empty".to_string());
        }
        Ok(value)
    }
}
