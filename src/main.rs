use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use backdrop::config::Configuration;
use backdrop::events::Notification;
use backdrop::fit::{aspect_ratio, cover_fit};
use backdrop::registry::Registry;
use backdrop::surface::measure_viewport;
use backdrop::tasks::headless::{TracingHostFactory, resolve_source};
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "backdrop",
    version,
    about = "cover-fit background slideshow, rendered headlessly"
)]
struct Args {
    /// Path to YAML config
    #[arg(value_name = "CONFIG")]
    config: PathBuf,
    /// Print the placement of the next N slides without running the show
    #[arg(long = "plan", value_name = "SLIDES")]
    plan: Option<usize>,
    /// Stop after this many slide transitions have completed
    #[arg(long = "cycles", value_name = "COUNT")]
    cycles: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // init tracing (RUST_LOG controls level, default = info)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let Args {
        config,
        plan,
        cycles,
    } = Args::parse();

    let cfg = Configuration::from_yaml_file(&config)
        .with_context(|| format!("failed to load configuration from {}", config.display()))?
        .validated()
        .context("invalid configuration values")?;
    tracing::info!(
        "Loaded configuration from {}:\n{:#?}",
        config.display(),
        cfg
    );
    let base_dir = config
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    if let Some(slides) = plan {
        print_plan(&cfg, &base_dir, slides);
        return Ok(());
    }

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            tracing::info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    let factory = TracingHostFactory::new(cfg.surface, base_dir);
    let mut registry = Registry::new(factory, cfg.capabilities).with_cancellation(cancel.clone());
    let mut events = registry.subscribe();
    registry
        .attach(cfg.container_id(), cfg.slides.clone(), cfg.options.clone())
        .await
        .context("failed to attach slideshow")?;

    let mut completed = 0usize;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            received = events.recv() => match received {
                Ok(event) => {
                    tracing::info!(
                        container = %event.container,
                        notification = ?event.notification,
                        "slideshow event"
                    );
                    if matches!(event.notification, Notification::After(_)) {
                        completed += 1;
                        if cycles.is_some_and(|max| completed >= max) {
                            tracing::info!(completed, "requested cycles reached");
                            break;
                        }
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "slideshow event stream lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    registry.shutdown().await;
    Ok(())
}

fn print_plan(cfg: &Configuration, base_dir: &Path, count: usize) {
    let container = cfg.container_id();
    let viewport = measure_viewport(&container, &cfg.capabilities, &cfg.surface);
    let len = cfg.slides.len();
    let start = cfg.options.start.clamp(0, len as i64 - 1) as usize;

    println!(
        "# placement plan\n# container: {}\n# surface: {}x{}\n# slides: {}\n",
        container, viewport.width, viewport.height, len
    );

    for step in 0..count {
        let index = (start + step) % len;
        let slide = &cfg.slides[index];
        let path = resolve_source(base_dir, &slide.source);
        let ratio = match image::image_dimensions(&path) {
            Ok((w, h)) => aspect_ratio(w, h),
            Err(err) => {
                println!("  {:>4}: {} (unreadable: {err})", step + 1, slide.source);
                continue;
            }
        };
        let placement = ratio.and_then(|r| cover_fit(viewport, r, &cfg.options.fit_for(slide)));
        match placement {
            Some(p) => println!(
                "  {:>4}: {} -> {:.1}x{:.1} at ({:.1}, {:.1})",
                step + 1,
                slide.source,
                p.width,
                p.height,
                p.left,
                p.top
            ),
            None => println!("  {:>4}: {} (no usable size)", step + 1, slide.source),
        }
    }
}
