use crate::cli::actions::Action;
use crate::exporter::{self, Settings};
use anyhow::Result;

/// Handle the run action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Run {
            server,
            altibase_port,
            user,
            password,
            database,
            listen_port,
            connect_timeout,
            queries_file,
            disabled,
        } => {
            exporter::new(Settings {
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
            .await?;
        }
    }

    Ok(())
}
