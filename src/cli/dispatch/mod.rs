use crate::cli::actions::Action;
use crate::collectors::config::DisableSet;
use anyhow::{Result, anyhow};
use clap::ArgMatches;
use secrecy::SecretString;
use std::path::PathBuf;
use tracing::info;

pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let listen_port = matches
        .get_one::<u16>("port")
        .copied()
        .ok_or_else(|| anyhow!("Port is required. Please provide it using the --port flag."))?;

    let server = required_string(matches, "server")?;
    let altibase_port = matches
        .get_one::<u16>("altibase-port")
        .copied()
        .ok_or_else(|| anyhow!("Altibase port is required."))?;
    let user = required_string(matches, "user")?;
    let password = SecretString::from(required_string(matches, "password")?);
    let database = required_string(matches, "database")?;
    let connect_timeout = matches
        .get_one::<u64>("connect-timeout")
        .copied()
        .ok_or_else(|| anyhow!("Connect timeout is required."))?;

    let queries_file = matches
        .get_one::<String>("queries-file")
        .map(PathBuf::from);

    let disabled = matches
        .get_one::<String>("disabled-metrics")
        .map(|s| DisableSet::parse(s))
        .unwrap_or_default();

    info!(disabled = %disabled, "disabled metrics");

    Ok(Action::Run {
        server,
        altibase_port,
        user,
        password,
        database,
        listen_port,
        connect_timeout,
        queries_file,
        disabled,
    })
}

fn required_string(matches: &ArgMatches, name: &str) -> Result<String> {
    matches
        .get_one::<String>(name)
        .map(ToString::to_string)
        .ok_or_else(|| anyhow!("{name} is required. Please provide it using the --{name} flag."))
}
