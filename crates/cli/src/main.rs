//! `grouper`: query and change Grouper groups from the command line.
//!
//! Configuration comes from `GROUPER_*` environment variables (a `.env`
//! file is honoured) or a `grouper.json` / `grouper.toml` config file.
//! Results are printed to stdout as JSON; logs go to stderr.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::env;
use std::process::ExitCode;

use anyhow::{anyhow, Context};
use grouper_domain::constants::ENV_DEFAULT_STEM;
use grouper_domain::Page;
use grouper_infra::{config, observability, GrouperClient};
use serde_json::{json, Value};

/// Set to `1` or `true` for JSON log lines.
const LOG_JSON_ENV: &str = "GROUPER_LOG_JSON";

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    observability::init_tracing(
        env::var(LOG_JSON_ENV).is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true")),
    );

    let args: Vec<String> = env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        print_help();
        return ExitCode::SUCCESS;
    };
    if command == "help" {
        print_help();
        return ExitCode::SUCCESS;
    }

    match run(command, rest).await {
        Ok(output) => {
            println!("{output:#}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("grouper {command} failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: &str, args: &[String]) -> anyhow::Result<Value> {
    if !KNOWN_COMMANDS.contains(&command) {
        print_help();
        return Err(anyhow!("unknown command: {command}"));
    }

    let config = config::load().context("loading Grouper configuration")?;
    let client = GrouperClient::from_config(config)?;

    let output = match command {
        "group-exists" => {
            let name = arg(args, 0, "group name")?;
            json!({ "group": name, "exists": client.group_exists(name).await? })
        }
        "groups" => {
            let stem = args.first().map(String::as_str);
            serde_json::to_value(client.get_groups(stem, Page::default()).await?)?
        }
        "members" => {
            let group = arg(args, 0, "group name")?;
            serde_json::to_value(client.get_group_members(group).await?)?
        }
        "add" => {
            let group = arg(args, 0, "group name")?;
            let subjects = subjects(args)?;
            serde_json::to_value(client.add_members_to_group(group, subjects).await?)?
        }
        "remove" => {
            let group = arg(args, 0, "group name")?;
            let subjects = subjects(args)?;
            serde_json::to_value(client.remove_members_from_group(group, subjects).await?)?
        }
        "user-exists" => {
            let identifier = arg(args, 0, "identifier")?;
            json!({ "identifier": identifier, "exists": client.user_exists(identifier).await? })
        }
        "create-group" => {
            let name = arg(args, 0, "group name")?;
            let display_name = args.get(1).map(String::as_str);
            serde_json::to_value(client.create_group(name, display_name, None).await?)?
        }
        "delete-group" => {
            let name = arg(args, 0, "group name")?;
            json!({ "group": name, "deleted": client.delete_group(name).await? })
        }
        other => return Err(anyhow!("unknown command: {other}")),
    };

    Ok(output)
}

const KNOWN_COMMANDS: &[&str] = &[
    "group-exists",
    "groups",
    "members",
    "add",
    "remove",
    "user-exists",
    "create-group",
    "delete-group",
];

fn arg<'a>(args: &'a [String], index: usize, what: &str) -> anyhow::Result<&'a str> {
    args.get(index).map(String::as_str).ok_or_else(|| anyhow!("missing argument: {what}"))
}

fn subjects(args: &[String]) -> anyhow::Result<&[String]> {
    match args.get(1..) {
        Some(subjects) if !subjects.is_empty() => Ok(subjects),
        _ => Err(anyhow!("at least one subject is required")),
    }
}

fn print_help() {
    println!("Grouper command-line client");
    println!();
    println!("USAGE:");
    println!("    grouper <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    group-exists <name>              Check whether a group exists");
    println!("    groups [stem]                    List groups below a stem");
    println!("    members <group>                  List the members of a group");
    println!("    add <group> <subject>...         Add subjects to a group");
    println!("    remove <group> <subject>...      Remove subjects from a group");
    println!("    user-exists <identifier>         Check whether a subject exists");
    println!("    create-group <name> [display]    Create a group (idempotent)");
    println!("    delete-group <name>              Delete a group (idempotent)");
    println!("    help                             Show this help message");
    println!();
    println!("Names without ':' are resolved below ${ENV_DEFAULT_STEM}.");
    println!("Set {LOG_JSON_ENV}=1 for JSON logs; RUST_LOG overrides the log filter.");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn subjects_follow_the_group_argument() {
        let args = strings(&["admins", "alice", "bob"]);
        assert_eq!(subjects(&args).unwrap(), ["alice", "bob"]);
        assert!(subjects(&strings(&["admins"])).is_err());
        assert!(subjects(&[]).is_err());
    }

    #[test]
    fn missing_argument_names_what_is_missing() {
        let err = arg(&[], 0, "group name").unwrap_err();
        assert_eq!(err.to_string(), "missing argument: group name");
    }

    #[tokio::test]
    async fn unknown_command_fails_before_loading_config() {
        let err = run("frobnicate", &[]).await.unwrap_err();
        assert!(err.to_string().contains("frobnicate"));
    }
}
