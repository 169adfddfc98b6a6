//! # layerfig live reload demo
//!
//! A tiny service that loads its config with layerfig, then keeps it live
//! while it runs. This is **not** a real service; it exists to demonstrate
//! and manually verify layerfig's features.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example live_reload
//! cargo run --example live_reload -- -c demos/live_reload/config.yaml -t yaml
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature              | How to exercise it                                                   |
//! |----------------------|----------------------------------------------------------------------|
//! | Compiled defaults    | Run with no config file and no env vars                              |
//! | Config file          | `-c demos/live_reload/config.yaml -t yaml`                           |
//! | Env var fallback     | `HTTP_PORT=9000 cargo run --example live_reload` (no `config.yaml`)  |
//! | Env prefix           | `DEMO_HTTP_PORT=9000 cargo run --example live_reload -- -t env -p demo` |
//! | `.env` file          | `-t .env -c demos/live_reload/` with a `.env` in that directory      |
//! | Live reload          | Edit the config file while the demo runs                             |
//!
//! Set `RUST_LOG=layerfig=debug` to see which source won and each reload.

use std::time::Duration;

use clap::Parser;
use confique::Config;
use layerfig::{Layerfig, LoaderArgs, ReloadEvent};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Config, Debug)]
struct DemoConfig {
    /// Minimum log level.
    #[config(default = "info")]
    log_level: String,

    #[config(nested)]
    http: HttpConfig,
}

#[derive(Config, Debug)]
struct HttpConfig {
    /// Interface to bind.
    #[config(default = "0.0.0.0")]
    host: String,

    #[config(default = 8080)]
    port: u16,
}

/// layerfig demo: print the config, then reprint it on every reload.
#[derive(Parser, Debug)]
#[command(name = "layerfig-demo")]
struct Cli {
    #[command(flatten)]
    loader: LoaderArgs,

    /// Stop after this many seconds.
    #[arg(long, default_value_t = 60)]
    seconds: u64,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let builder = Layerfig::builder::<DemoConfig>()
        .name("config")
        .file_path("demos/live_reload")
        .file_type("yaml")
        .use_env()
        .use_defaults()
        .enable_fallback();
    let loader = cli.loader.apply(builder).build();

    let live = match loader.load_live() {
        Ok(live) => live,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    println!("{:#?}", live.get());

    let shutdown = CancellationToken::new();
    let mut events = match loader.enable_live_reload(&live, shutdown.clone()) {
        Ok(events) => events,
        Err(e) => {
            // Env-only setups have no file to watch.
            eprintln!("Live reload disabled: {e}");
            return;
        }
    };

    let deadline = tokio::time::sleep(Duration::from_secs(cli.seconds));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Some(ReloadEvent::Reloaded) => println!("{:#?}", live.get()),
                Some(ReloadEvent::Failed(e)) => eprintln!("Reload failed: {e}"),
                None => break,
            },
        }
    }

    shutdown.cancel();
}
