mod config;
mod defaults;
mod element;
mod error;
mod format;
mod i18n;
mod loader;
mod poll;
mod render;
mod server;
mod status;
mod version;
mod view;

use crate::{
    loader::{Loader, SystemRunner},
    poll::Poller,
    server::{render_document, DashboardServer},
    view::StatusView,
};
use clap::Parser;
use config::DashboardConfig;
use error::DashErrors;
use log::{debug, info, warn};
use std::{error::Error, io::Read, path::Path};

/// Tailscale status dashboard
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct DashArgs {
    /// Print a new config to stdout
    #[arg(long)]
    genconf: bool,

    /// Read HJSON/JSON config from stdin
    #[arg(long)]
    useconf: bool,

    /// Read HJSON/JSON config from specified file path
    #[arg(long)]
    useconffile: Option<std::path::PathBuf>,

    /// Use in combination with either --useconf or --useconffile, outputs your configuration normalised
    #[arg(long)]
    normaliseconf: bool,

    /// Print configuration from --genconf or --normaliseconf as JSON instead of HJSON
    #[arg(long)]
    confjson: bool,

    /// Prints the version of this build
    #[arg(long)]
    ver: bool,

    /// Render the dashboard once to stdout and exit
    #[arg(long)]
    once: bool,

    /// Listen address for the dashboard, "tcp://host:port" or "unix:///path"
    #[arg(long)]
    listen: Option<String>,

    /// Loglevel to enable
    #[arg(long, default_value = "info")]
    loglevel: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = DashArgs::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.loglevel))
        .init();
    run(args).await
}

fn read_config(useconf: bool, useconffile: Option<&Path>) -> Result<DashboardConfig, DashErrors> {
    // If --useconffile, the configuration is read from the filesystem; if
    // --useconf, from stdin. Otherwise the platform default file is used when
    // it exists, and built-in defaults when it does not.
    let mut conf = String::new();
    if let Some(path) = useconffile {
        conf = std::fs::read_to_string(path)?;
    } else if useconf {
        std::io::stdin().read_to_string(&mut conf)?;
    } else {
        let default_file = defaults::get_defaults().default_config_file;
        match std::fs::read_to_string(&default_file) {
            Ok(raw) => {
                debug!("Using config file {}", default_file);
                conf = raw;
            }
            Err(_) => return Ok(DashboardConfig::default()),
        }
    }
    DashboardConfig::from_hjson(&conf)
}

fn print_config(cfg: &DashboardConfig, is_json: bool) -> Result<(), DashErrors> {
    let out = if is_json {
        cfg.to_json()?
    } else {
        cfg.to_hjson()?
    };
    println!("{}", out);
    Ok(())
}

async fn run(args: DashArgs) -> Result<(), Box<dyn Error>> {
    if args.ver {
        println!("Build name: {}", version::build_name());
        println!("Build version: {}", version::build_version());
        return Ok(());
    }
    if args.genconf {
        print_config(&defaults::generate_config(), args.confjson)?;
        return Ok(());
    }

    let mut cfg = read_config(args.useconf, args.useconffile.as_deref())?;
    if args.normaliseconf {
        if !args.useconf && args.useconffile.is_none() {
            warn!("--normaliseconf without --useconf or --useconffile prints the defaults");
        }
        print_config(&cfg, args.confjson)?;
        return Ok(());
    }
    if let Some(listen) = args.listen {
        cfg.listen = listen;
    }

    let loader = Loader::new(
        SystemRunner,
        cfg.interfaces_cmd(),
        cfg.status_cmd(),
        &cfg.interface_pattern,
    )?;
    let view = StatusView::new(
        loader,
        cfg.locale(),
        cfg.title.clone(),
        cfg.description.clone(),
    );
    let poller = Poller::new(cfg.poll_interval());

    let initial = view.load().await;
    if args.once {
        let page = view.render(&initial, &poller);
        poller.stop();
        print!("{}", render_document(&page, &cfg.title, poller.interval()));
        return Ok(());
    }

    let page = view.render(&initial, &poller);
    info!(
        "Polling {} and {} every {}s",
        cfg.ip_command,
        cfg.status_command,
        cfg.poll_interval().as_secs()
    );
    let server = DashboardServer::new(
        page,
        cfg.title.clone(),
        poller.interval(),
        view.actions(),
        cfg.listen.clone(),
    );
    if let Err(e) = server.listen().await {
        poller.stop();
        return Err(e.into());
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    poller.stop();
    Ok(())
}
