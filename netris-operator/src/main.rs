use std::{env::var, process::exit, sync::Arc};

use kube::Client;
use log::{error, info, LevelFilter};
use netris_operator_core::config::{OperatorConfig, DEV_MODE_ENV};

use crate::{
    controller::{context::ReconcilerContext, start_controllers},
    storage::{refresh_loop, Storage},
};

mod controller;
mod lbwatcher;
mod storage;

#[tokio::main]
async fn main() {
    configure_logger();

    let config = load_config();
    let netris = Arc::new(connect_controller(&config).await);
    let client = create_client().await;
    let storage = Arc::new(Storage::new());

    info!("Priming the controller caches...");
    storage.refresh_all(&netris).await;

    let context = Arc::new(ReconcilerContext {
        config,
        client,
        netris: netris.clone(),
        storage: storage.clone(),
    });

    tokio::join!(
        refresh_loop(storage, netris),
        lbwatcher::watch_loop(context.clone()),
        start_controllers(context),
    );
}

fn load_config() -> OperatorConfig {
    match OperatorConfig::load() {
        Ok(config) => config,
        Err(error) => {
            error!("Couldn't load the operator configuration! {error:?}");
            exit(7)
        }
    }
}

async fn connect_controller(config: &OperatorConfig) -> netris_operator_api::Client {
    let netris = match netris_operator_api::Client::new(
        &config.controller.host,
        &config.controller.login,
        &config.controller.password,
        config.controller.insecure,
    ) {
        Ok(netris) => netris,
        Err(error) => {
            error!("Couldn't create the controller client! {error:?}");
            exit(8)
        }
    };

    if let Err(error) = netris.login().await {
        error!("Couldn't authenticate against the controller! {error:?}");
        exit(9)
    }

    netris
}

async fn create_client() -> Client {
    match Client::try_default().await {
        Ok(client) => client,
        Err(error) => {
            error!("Couldn't create client! {error:?}");
            exit(6)
        }
    }
}

fn configure_logger() {
    let default_level = if dev_mode_requested() {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::builder()
        .default_format()
        .format_module_path(false)
        .filter_level(default_level)
        .parse_default_env()
        .init()
}

fn dev_mode_requested() -> bool {
    var(DEV_MODE_ENV)
        .map(|value| value == "1" || value == "true")
        .unwrap_or(false)
}
