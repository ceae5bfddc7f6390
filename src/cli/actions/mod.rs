pub mod run;

use crate::collectors::config::DisableSet;
use secrecy::SecretString;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Action {
    Run {
        server: String,
        altibase_port: u16,
        user: String,
        password: SecretString,
        database: String,
        listen_port: u16,
        connect_timeout: u64,
        queries_file: Option<PathBuf>,
        disabled: DisableSet,
    },
}
