//! Explicit container → controller bookkeeping.

use std::collections::HashMap;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{OptionsPatch, Slide, SlideshowOptions, validate_slides};
use crate::controller::{Host, Slideshow};
use crate::error::{Error, Result};
use crate::events::{Command, HostEvent, SlideEvent};
use crate::surface::{ContainerId, PlatformCapabilities};
use crate::tasks::driver;

const COMMAND_CAPACITY: usize = 16;
const HOST_EVENT_CAPACITY: usize = 64;
const EVENT_CAPACITY: usize = 256;

/// Creates the host that renders a controller attached to `container`.
pub trait HostFactory {
    type Host: Host + Send + 'static;

    /// `events` is where the host reports load/fade completions and resize signals.
    fn create(&mut self, container: &ContainerId, events: mpsc::Sender<HostEvent>) -> Self::Host;
}

/// A live controller as seen from the registry.
pub struct Attachment {
    container: ContainerId,
    options: SlideshowOptions,
    commands: mpsc::Sender<Command>,
    cancel: CancellationToken,
    task: JoinHandle<anyhow::Result<()>>,
}

impl Attachment {
    /// Options after clamping and merging; reused when the container is re-attached.
    pub fn options(&self) -> &SlideshowOptions {
        &self.options
    }

    pub fn is_live(&self) -> bool {
        !self.task.is_finished()
    }

    pub async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| Error::Detached(self.container.clone()))
    }

    async fn shutdown(self, preserve_visual: bool) {
        if self
            .commands
            .send(Command::Destroy { preserve_visual })
            .await
            .is_err()
        {
            self.cancel.cancel();
        }
        match self.task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("slideshow task error: {e:?}"),
            Err(e) => warn!("slideshow join error: {e}"),
        }
    }
}

/// Owns every attached slideshow, keyed by container identity.
pub struct Registry<F> {
    factory: F,
    capabilities: PlatformCapabilities,
    attached: HashMap<ContainerId, Attachment>,
    events: broadcast::Sender<SlideEvent>,
    cancel: CancellationToken,
}

impl<F: HostFactory> Registry<F> {
    pub fn new(factory: F, capabilities: PlatformCapabilities) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            factory,
            capabilities,
            attached: HashMap::new(),
            events,
            cancel: CancellationToken::new(),
        }
    }

    /// Cancel every controller when `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Notifications from every controller this registry creates.
    pub fn subscribe(&self) -> broadcast::Receiver<SlideEvent> {
        self.events.subscribe()
    }

    /// Whether `container` currently has a live controller.
    pub fn contains(&self, container: &ContainerId) -> bool {
        self.attached.get(container).is_some_and(Attachment::is_live)
    }

    /// Attach `slides` to `container`.
    ///
    /// An existing controller on the same container is replaced: `patch` is merged over its
    /// options and it is destroyed with its visual preserved so the new one can take over
    /// the wrap.
    pub async fn attach(
        &mut self,
        container: ContainerId,
        slides: Vec<Slide>,
        patch: impl Into<OptionsPatch>,
    ) -> Result<&Attachment> {
        validate_slides(&slides)?;
        let patch = patch.into();

        let base = self
            .attached
            .get(&container)
            .map(|previous| previous.options.clone())
            .unwrap_or_default();
        let mut options = base.merged(patch);
        options.validate()?;
        let last = slides.len() as i64 - 1;
        options.start = options.start.clamp(0, last);

        if let Some(previous) = self.attached.remove(&container) {
            debug!(%container, "replacing existing slideshow");
            previous.shutdown(true).await;
        }

        let (host_tx, host_rx) = mpsc::channel(HOST_EVENT_CAPACITY);
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CAPACITY);
        let host = self.factory.create(&container, host_tx);
        let mut show = Slideshow::new(
            container.clone(),
            slides,
            options.clone(),
            self.capabilities,
            host,
        )?
        .with_events(self.events.clone());
        show.start();

        let cancel = self.cancel.child_token();
        let task = tokio::spawn(driver::run(show, cmd_rx, host_rx, cancel.clone()));
        info!(%container, "slideshow task spawned");

        let attachment = Attachment {
            container: container.clone(),
            options,
            commands: cmd_tx,
            cancel,
            task,
        };
        self.attached.insert(container.clone(), attachment);
        Ok(&self.attached[&container])
    }

    /// Invoke a named method on the controller attached to `container`.
    pub async fn call(
        &mut self,
        container: &ContainerId,
        method: &str,
        arg: Option<i64>,
    ) -> Result<()> {
        let command = Command::parse(method, arg)?;
        self.dispatch(container, command).await
    }

    /// Re-attachment entry point that accepts either a method name or a single source.
    ///
    /// With a live controller and a recognized method name the method is invoked; any other
    /// string is treated as a one-slide sequence and attached.
    pub async fn attach_or_call(
        &mut self,
        container: ContainerId,
        arg: &str,
        method_arg: Option<i64>,
        patch: impl Into<OptionsPatch>,
    ) -> Result<()> {
        if self.contains(&container) {
            match Command::parse(arg, method_arg) {
                Ok(command) => return self.dispatch(&container, command).await,
                Err(Error::UnknownMethod(_)) => {}
                Err(e) => return Err(e),
            }
        }
        self.attach(container, vec![Slide::from(arg)], patch).await?;
        Ok(())
    }

    /// Destroy the controller on `container`. Returns `false` when none was attached.
    pub async fn detach(&mut self, container: &ContainerId, preserve_visual: bool) -> bool {
        match self.attached.remove(container) {
            Some(attachment) => {
                attachment.shutdown(preserve_visual).await;
                true
            }
            None => false,
        }
    }

    /// Destroy every controller, preserving nothing.
    pub async fn shutdown(&mut self) {
        let containers: Vec<ContainerId> = self.attached.keys().cloned().collect();
        for container in containers {
            self.detach(&container, false).await;
        }
    }

    async fn dispatch(&mut self, container: &ContainerId, command: Command) -> Result<()> {
        if !self.contains(container) {
            return Err(Error::Detached(container.clone()));
        }
        if let Command::Destroy { preserve_visual } = command {
            self.detach(container, preserve_visual).await;
            return Ok(());
        }
        match self.attached.get(container) {
            Some(attachment) => attachment.send(command).await,
            None => Err(Error::Detached(container.clone())),
        }
    }
}
