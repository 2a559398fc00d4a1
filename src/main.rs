use anyhow::Result;
use clap::{Arg, Command};
use tokio::sync::mpsc;
use tracing::info;

use minichat::config::resolver::{self, LaunchQuery};
use minichat::core::host::HostContext;
use minichat::core::ipc;
use minichat::core::session::{run, Session};
use minichat::utils::constants::DEFAULT_IPC_PORT;
use minichat::utils::enums::{RunMessage, SessionEvent};
use minichat::utils::logger;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("minichat")
        .arg(Arg::new("query").short('q').long("query"))
        .arg(Arg::new("host").long("host"))
        .arg(Arg::new("port").short('p').long("port"))
        .arg(Arg::new("log-dir").long("log-dir"))
        .get_matches();

    match matches.get_one::<String>("log-dir") {
        Some(dir) => logger::init_file_tracing(dir),
        None => logger::init_tracing(),
    }

    let query = matches
        .get_one::<String>("query")
        .map(|raw| LaunchQuery::parse(raw))
        .unwrap_or_default();

    let host = match matches.get_one::<String>("host") {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            Some(serde_json::from_str::<HostContext>(&raw)?)
        }
        None => None,
    };

    match &host {
        Some(host) => {
            host.ready();
            host.expand();
        }
        None => info!("Not running inside a host shell"),
    }

    let config = resolver::resolve(host.as_ref(), &query);
    info!("Resolved backend: {}", config.backend);

    let (command_tx, command_rx) = mpsc::channel(100);
    let (task_tx, task_rx) = mpsc::channel(100);
    //Used to send data back out through the socket
    let (data_tx, data_rx) = mpsc::channel(100);

    let port = matches
        .get_one::<String>("port")
        .cloned()
        .unwrap_or_else(|| DEFAULT_IPC_PORT.to_string());
    let runtime_tx = command_tx.clone();
    tokio::spawn(async move { ipc::listen(data_rx, runtime_tx, port).await });

    let session = Session::new(config, host.as_ref());
    info!("{}", session.greeting());

    //Initial load happens before the first UI command arrives
    command_tx
        .send(SessionEvent::Command(RunMessage::LoadUsers))
        .await?;
    run(session, command_rx, task_tx, task_rx, data_tx).await?;
    Ok(())
}
