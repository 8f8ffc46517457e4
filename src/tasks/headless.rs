//! Host that renders into the log.
//!
//! Natural sizes are read from local files with the `image` crate and fades complete after
//! their duration elapses, so the controller runs exactly as it would against a real surface.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::mpsc::Sender;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::captions::{CaptionRecord, CaptionSwap};
use crate::controller::Host;
use crate::events::{HostEvent, TransitionToken};
use crate::fit::{Placement, Viewport};
use crate::registry::HostFactory;
use crate::surface::{ContainerId, IMAGE_Z_INDEX, SurfaceMetrics, SurfaceSetup};

pub struct TracingHost {
    container: ContainerId,
    metrics: SurfaceMetrics,
    base_dir: PathBuf,
    events: Sender<HostEvent>,
}

impl TracingHost {
    pub fn new(
        container: ContainerId,
        metrics: SurfaceMetrics,
        base_dir: impl Into<PathBuf>,
        events: Sender<HostEvent>,
    ) -> Self {
        Self {
            container,
            metrics,
            base_dir: base_dir.into(),
            events,
        }
    }

    fn resolve(&self, source: &str) -> PathBuf {
        resolve_source(&self.base_dir, source)
    }
}

/// Relative sources are looked up next to the configuration file.
pub fn resolve_source(base_dir: &Path, source: &str) -> PathBuf {
    let path = Path::new(source);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

impl Host for TracingHost {
    fn metrics(&self) -> SurfaceMetrics {
        self.metrics
    }

    fn prepare_surface(&mut self, setup: &SurfaceSetup) {
        info!(
            container = %self.container,
            position = ?setup.position,
            z_index = setup.z_index,
            adjust_container = setup.adjust_container,
            "surface prepared"
        );
    }

    fn preload(&mut self, source: &str) {
        debug!(source, "preload requested");
    }

    fn load_image(&mut self, token: TransitionToken, source: &str) {
        let path = self.resolve(source);
        let events = self.events.clone();
        debug!(%token, path = %path.display(), z_index = IMAGE_Z_INDEX, "loading image");
        tokio::spawn(async move {
            let probe = path.clone();
            let dims = tokio::task::spawn_blocking(move || image::image_dimensions(&probe)).await;
            let event = match dims {
                Ok(Ok((width, height))) => HostEvent::ImageLoaded {
                    token,
                    width,
                    height,
                },
                Ok(Err(err)) => {
                    warn!(path = %path.display(), "failed to read image: {err}");
                    HostEvent::ImageFailed { token }
                }
                Err(err) => {
                    warn!(path = %path.display(), "image probe panicked: {err}");
                    HostEvent::ImageFailed { token }
                }
            };
            // The controller may be gone already; late completions are dropped.
            let _ = events.send(event).await;
        });
    }

    fn place_image(&mut self, token: TransitionToken, viewport: Viewport, placement: &Placement) {
        info!(
            %token,
            surface_w = viewport.width,
            surface_h = viewport.height,
            width = placement.width,
            height = placement.height,
            left = placement.left,
            top = placement.top,
            "image placed"
        );
    }

    fn fade_in(&mut self, token: TransitionToken, duration: Duration) {
        let events = self.events.clone();
        tokio::spawn(async move {
            sleep(duration).await;
            let _ = events.send(HostEvent::FadeFinished { token }).await;
        });
    }

    fn remove_image(&mut self, token: TransitionToken) {
        debug!(%token, "image removed");
    }

    fn mount_caption(&mut self, mount: &str, attribute: &str, record: &CaptionRecord) {
        debug!(
            mount,
            attribute,
            tag = %record.tag,
            hidden = record.hidden,
            "caption mounted"
        );
    }

    fn swap_caption(&mut self, swap: &CaptionSwap) {
        info!(
            outgoing = swap.outgoing.as_deref(),
            incoming = swap.incoming.as_deref(),
            fade_out_ms = swap.fade_out.as_millis() as u64,
            reveal = ?swap.reveal,
            "caption swapped"
        );
    }

    fn unmount_caption(&mut self, tag: &str) {
        debug!(tag, "caption unmounted");
    }

    fn teardown(&mut self, preserve_visual: bool) {
        info!(container = %self.container, preserve_visual, "surface torn down");
    }
}

/// Builds a [`TracingHost`] per container, all sharing one surface size.
pub struct TracingHostFactory {
    metrics: SurfaceMetrics,
    base_dir: PathBuf,
}

impl TracingHostFactory {
    pub fn new(metrics: SurfaceMetrics, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            metrics,
            base_dir: base_dir.into(),
        }
    }
}

impl HostFactory for TracingHostFactory {
    type Host = TracingHost;

    fn create(&mut self, container: &ContainerId, events: Sender<HostEvent>) -> TracingHost {
        TracingHost::new(container.clone(), self.metrics, self.base_dir.clone(), events)
    }
}
