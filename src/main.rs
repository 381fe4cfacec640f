use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use marquee::catalog::Catalog;
use marquee::config::{FileLogSettings, Settings};
use marquee::devserver::{UdpLanProbe, prepare_urls};
use marquee::preview::run_preview;
use marquee::server::{print_banner, run_dev_server};

#[derive(Debug, Parser)]
#[command(name = "marquee", about = "Movie pages with actor hover cards")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Serve the movie catalog API.
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the local and LAN URLs the dev server would announce.
    Urls {
        #[arg(long)]
        protocol: Option<String>,
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        path: Option<String>,
    },
    /// Render a movie page headlessly and hover one of its cast members.
    Preview {
        movie_id: String,
        #[arg(long)]
        actor: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut settings = Settings::from_env().context("failed to load configuration")?;
    let _log_guard = init_tracing(settings.file_log.as_ref())?;

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                settings.host = host;
            }
            if let Some(port) = port {
                settings.port = port;
            }
            let catalog = Catalog::load(&settings.catalog_path).with_context(|| {
                format!(
                    "failed to load catalog `{}`",
                    settings.catalog_path.display()
                )
            })?;
            run_dev_server(&settings, catalog).await?;
        }
        Commands::Urls {
            protocol,
            host,
            port,
            path,
        } => {
            if let Some(protocol) = protocol {
                settings.protocol = protocol.parse().context("invalid --protocol")?;
            }
            let host = host.unwrap_or_else(|| settings.host.clone());
            let port = port.unwrap_or(settings.port);
            let urls = prepare_urls(
                settings.protocol.as_str(),
                &host,
                port,
                path.as_deref(),
                &UdpLanProbe,
            );
            print_banner(&urls);
            if let Some(lan) = urls.lan_url_for_config {
                println!("LAN address: {lan}");
            }
            println!("Browser URL: {}", urls.local_url_for_browser);
        }
        Commands::Preview { movie_id, actor } => {
            run_preview(&settings, &movie_id, actor.as_deref()).await?;
        }
    }

    Ok(())
}

fn init_tracing(file_log: Option<&FileLogSettings>) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,marquee=debug"));
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .with_filter(env_filter);

    let (file_layer, guard) = match file_log {
        Some(file_log) => {
            std::fs::create_dir_all(&file_log.dir).with_context(|| {
                format!("failed to create log directory `{}`", file_log.dir.display())
            })?;
            let appender = tracing_appender::rolling::daily(&file_log.dir, "marquee.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(EnvFilter::new(&file_log.filter));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(guard)
}
