use std::fmt;

use crate::error::Error;
use crate::surface::ContainerId;

/// Identifies one transition; completions carrying an older token are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TransitionToken(u64);

impl TransitionToken {
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for TransitionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle notification for a slide change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// A slide change was accepted; the new image has not been shown yet.
    Before(usize),
    /// The new image finished fading in and the previous one was removed.
    After(usize),
    /// Alias of `After`, emitted right after it.
    Show(usize),
}

impl Notification {
    pub fn index(&self) -> usize {
        match *self {
            Self::Before(i) | Self::After(i) | Self::Show(i) => i,
        }
    }
}

/// A notification tagged with the container whose controller emitted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideEvent {
    pub container: ContainerId,
    pub notification: Notification,
}

/// Completion and signal callbacks from the host platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    ImageLoaded {
        token: TransitionToken,
        width: u32,
        height: u32,
    },
    ImageFailed {
        token: TransitionToken,
    },
    FadeFinished {
        token: TransitionToken,
    },
    Resized,
    OrientationChanged,
}

/// Requests accepted by a running controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Show(isize),
    Next,
    Prev,
    Pause,
    Resume,
    Cycle,
    Destroy { preserve_visual: bool },
}

impl Command {
    /// Resolve a method name as accepted on re-attachment.
    ///
    /// `show` requires an index; `destroy` treats a non-zero argument as "preserve visual".
    pub fn parse(name: &str, arg: Option<i64>) -> Result<Self, Error> {
        let cmd = match name {
            "show" => {
                let index = arg.ok_or_else(|| {
                    Error::InvalidOptions("show requires a slide index".to_string())
                })?;
                let index = isize::try_from(index).map_err(|_| {
                    Error::InvalidOptions(format!("slide index {index} is out of range"))
                })?;
                Self::Show(index)
            }
            "next" => Self::Next,
            "prev" => Self::Prev,
            "pause" => Self::Pause,
            "resume" => Self::Resume,
            "cycle" => Self::Cycle,
            "destroy" => Self::Destroy {
                preserve_visual: arg.is_some_and(|v| v != 0),
            },
            other => return Err(Error::UnknownMethod(other.to_string())),
        };
        Ok(cmd)
    }
}
