use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::Receiver;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::controller::{Host, Slideshow, TimerHandle};
use crate::events::{Command, HostEvent};

struct ArmedTimer {
    handle: TimerHandle,
    interval: Interval,
}

impl ArmedTimer {
    fn new(handle: TimerHandle) -> Self {
        let mut interval = interval_at(Instant::now() + handle.period, handle.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { handle, interval }
    }
}

async fn next_tick(timer: &mut Option<ArmedTimer>) -> TimerHandle {
    match timer {
        Some(armed) => {
            armed.interval.tick().await;
            armed.handle
        }
        None => std::future::pending().await,
    }
}

/// Owns one controller and serializes every input it receives.
///
/// Rules:
/// - Commands, host completions, resize signals and timer ticks are handled one at a time.
/// - The tokio interval mirrors the controller's timer handle; a new handle restarts it.
/// - `Destroy`, cancellation, or the command channel closing end the task.
///   Cancellation and a dropped sender tear down while preserving the visual.
pub async fn run<H: Host>(
    mut show: Slideshow<H>,
    mut commands: Receiver<Command>,
    mut host_events: Receiver<HostEvent>,
    cancel: CancellationToken,
) -> Result<()> {
    let mut timer: Option<ArmedTimer> = None;

    loop {
        let wanted = show.timer();
        if timer.as_ref().map(|t| t.handle) != wanted {
            timer = wanted.map(ArmedTimer::new);
        }

        select! {
            _ = cancel.cancelled() => {
                show.destroy(true);
                break;
            }

            maybe_cmd = commands.recv() => {
                match maybe_cmd {
                    Some(cmd) => {
                        debug!(container = %show.container(), ?cmd, "slideshow command");
                        show.apply(cmd);
                        if show.is_destroyed() {
                            break;
                        }
                    }
                    None => {
                        // Registry side dropped; nobody can reach this controller anymore.
                        show.destroy(true);
                        break;
                    }
                }
            }

            Some(event) = host_events.recv() => {
                show.handle(event);
            }

            handle = next_tick(&mut timer) => {
                show.on_tick(handle);
            }
        }
    }

    Ok(())
}
