//! Slideshow state machine.
//!
//! The controller owns the slide sequence, the current index, the pause flag, the timer
//! handle and the caption records. Everything visible is delegated to a [`Host`], which
//! reports completions back as [`HostEvent`]s tagged with the transition token they belong to.

use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::captions::{CaptionKey, CaptionRecord, CaptionRegistry, CaptionSwap};
use crate::config::{Slide, SlideshowOptions, validate_slides};
use crate::error::Error;
use crate::events::{Command, HostEvent, Notification, SlideEvent, TransitionToken};
use crate::fit::{Placement, Viewport, aspect_ratio, cover_fit};
use crate::surface::{ContainerId, PlatformCapabilities, SurfaceMetrics, SurfaceSetup, measure_viewport};

const EVENT_CAPACITY: usize = 64;

/// Rendering operations the controller delegates to the platform.
///
/// Calls never block; anything asynchronous (image load, fade) is reported back through
/// a [`HostEvent`] carrying the token passed in.
pub trait Host {
    /// Current size of the container and the screen.
    fn metrics(&self) -> SurfaceMetrics;
    /// Create the clipping wrap, or reuse one left behind by a preserved controller.
    fn prepare_surface(&mut self, setup: &SurfaceSetup);
    /// Warm the platform cache for `source`.
    fn preload(&mut self, source: &str);
    /// Create a hidden image element for `token` and start loading `source` into it.
    fn load_image(&mut self, token: TransitionToken, source: &str);
    fn place_image(&mut self, token: TransitionToken, viewport: Viewport, placement: &Placement);
    fn fade_in(&mut self, token: TransitionToken, duration: Duration);
    fn remove_image(&mut self, token: TransitionToken);
    /// Mount a hidden caption element; mounting an existing tag replaces it.
    fn mount_caption(&mut self, mount: &str, attribute: &str, record: &CaptionRecord);
    fn swap_caption(&mut self, swap: &CaptionSwap);
    fn unmount_caption(&mut self, tag: &str);
    /// Stop resize/orientation delivery; remove the wrap unless `preserve_visual`.
    fn teardown(&mut self, preserve_visual: bool);
}

/// Handle of an armed recurring timer; a new handle is issued on every re-arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle {
    pub generation: u64,
    pub period: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Transitioning(TransitionToken),
}

#[derive(Debug)]
struct LiveImage {
    token: TransitionToken,
    index: usize,
    ratio: Option<f64>,
}

pub struct Slideshow<H> {
    container: ContainerId,
    slides: Vec<Slide>,
    options: SlideshowOptions,
    capabilities: PlatformCapabilities,
    host: H,
    index: usize,
    paused: bool,
    phase: Phase,
    token: TransitionToken,
    timer: Option<TimerHandle>,
    timer_generation: u64,
    images: Vec<LiveImage>,
    captions: CaptionRegistry,
    events: broadcast::Sender<SlideEvent>,
    destroyed: bool,
}

impl<H: Host> Slideshow<H> {
    /// Build a controller without showing anything; call [`Slideshow::start`] next.
    pub fn new(
        container: ContainerId,
        slides: Vec<Slide>,
        options: SlideshowOptions,
        capabilities: PlatformCapabilities,
        host: H,
    ) -> Result<Self, Error> {
        validate_slides(&slides)?;
        options.validate()?;

        let last = slides.len() as i64 - 1;
        let index = options.start.clamp(0, last) as usize;
        let captions = CaptionRegistry::new(options.caption_index_separator.clone());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            container,
            paused: options.paused,
            slides,
            options,
            capabilities,
            host,
            index,
            phase: Phase::Idle,
            token: TransitionToken::default(),
            timer: None,
            timer_generation: 0,
            images: Vec::new(),
            captions,
            events,
            destroyed: false,
        })
    }

    /// Deliver notifications through `events` instead of the controller's own channel.
    pub fn with_events(mut self, events: broadcast::Sender<SlideEvent>) -> Self {
        self.events = events;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SlideEvent> {
        self.events.subscribe()
    }

    /// Prepare the surface, preload, mount captions and show the starting slide.
    pub fn start(&mut self) {
        let setup = SurfaceSetup::for_container(&self.container, &self.capabilities);
        self.host.prepare_surface(&setup);
        self.preload_and_register_captions();
        info!(
            container = %self.container,
            slides = self.slides.len(),
            start = self.index,
            paused = self.paused,
            "slideshow attached"
        );
        self.show(self.index as isize);
    }

    fn preload_and_register_captions(&mut self) {
        let lazy = self.options.lazy_load;
        if lazy {
            self.host.preload(&self.slides[self.index].source);
        }
        for (index, slide) in self.slides.iter().enumerate() {
            if !lazy {
                self.host.preload(&slide.source);
            }
            if lazy || slide.caption.is_some() {
                let record = self.captions.register(
                    CaptionKey::new(slide.source.clone(), index),
                    slide.caption.as_deref(),
                    index != 0,
                );
                self.host.mount_caption(
                    &self.options.caption_mount,
                    &self.options.caption_attribute,
                    record,
                );
            }
        }
    }

    pub fn container(&self) -> &ContainerId {
        &self.container
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn timer(&self) -> Option<TimerHandle> {
        self.timer
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn captions(&self) -> &CaptionRegistry {
        &self.captions
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    #[cfg(test)]
    fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Whether `index` passes the bounds check of [`Slideshow::show`].
    ///
    /// The check is symmetric: negative indices down to `-(len - 1)` are accepted and
    /// count back from the end of the sequence.
    pub fn accepts_index(&self, index: isize) -> bool {
        index.unsigned_abs() < self.slides.len()
    }

    /// Switch to the slide at `index`. Returns `false` when the index is rejected.
    pub fn show(&mut self, index: isize) -> bool {
        if self.destroyed {
            return false;
        }
        if !self.accepts_index(index) {
            debug!(index, len = self.slides.len(), "show: index out of range");
            return false;
        }
        let new_index = if index < 0 {
            self.slides.len() - index.unsigned_abs()
        } else {
            index as usize
        };
        let previous = self.index;

        self.emit(Notification::Before(new_index));
        self.index = new_index;
        self.timer = None;
        self.update_caption(previous, new_index);

        self.token = self.token.next();
        let token = self.token;
        self.images.push(LiveImage {
            token,
            index: new_index,
            ratio: None,
        });
        self.phase = Phase::Transitioning(token);
        debug!(%token, from = previous, to = new_index, "transition started");
        self.host.load_image(token, &self.slides[new_index].source);
        true
    }

    pub fn next(&mut self) -> bool {
        let next = (self.index + 1) % self.slides.len();
        self.show(next as isize)
    }

    pub fn prev(&mut self) -> bool {
        let prev = if self.index == 0 {
            self.slides.len() - 1
        } else {
            self.index - 1
        };
        self.show(prev as isize)
    }

    /// Stop advancing; a transition already in flight still completes.
    pub fn pause(&mut self) {
        self.paused = true;
        self.timer = None;
        debug!(container = %self.container, "slideshow paused");
    }

    pub fn resume(&mut self) {
        self.paused = false;
        debug!(container = %self.container, "slideshow resumed");
        self.next();
    }

    /// Arm (or re-arm) the recurring timer.
    ///
    /// The timer only exists while there is more than one slide, the show is not paused
    /// and no transition is in flight.
    pub fn cycle(&mut self) {
        if self.destroyed || self.slides.len() <= 1 || self.paused || self.phase != Phase::Idle
        {
            return;
        }
        self.timer_generation += 1;
        self.timer = Some(TimerHandle {
            generation: self.timer_generation,
            period: self.options.duration(),
        });
    }

    /// Timer callback. Ticks of a replaced or disarmed timer are ignored.
    pub fn on_tick(&mut self, handle: TimerHandle) {
        if self.timer != Some(handle) || self.paused {
            return;
        }
        self.next();
    }

    pub fn destroy(&mut self, preserve_visual: bool) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.timer = None;
        if !preserve_visual {
            for record in self.captions.records() {
                self.host.unmount_caption(&record.tag);
            }
        }
        self.host.teardown(preserve_visual);
        info!(container = %self.container, preserve_visual, "slideshow destroyed");
    }

    pub fn apply(&mut self, command: Command) {
        match command {
            Command::Show(index) => {
                self.show(index);
            }
            Command::Next => {
                self.next();
            }
            Command::Prev => {
                self.prev();
            }
            Command::Pause => self.pause(),
            Command::Resume => self.resume(),
            Command::Cycle => self.cycle(),
            Command::Destroy { preserve_visual } => self.destroy(preserve_visual),
        }
    }

    pub fn handle(&mut self, event: HostEvent) {
        if self.destroyed {
            debug!(?event, "host event after destroy ignored");
            return;
        }
        match event {
            HostEvent::ImageLoaded {
                token,
                width,
                height,
            } => self.on_image_loaded(token, width, height),
            HostEvent::ImageFailed { token } => {
                warn!(%token, index = self.index, "slide image failed to load");
            }
            HostEvent::FadeFinished { token } => self.on_fade_finished(token),
            HostEvent::Resized | HostEvent::OrientationChanged => self.resize(),
        }
    }

    /// Re-fit the current image to the surface. Skipped until its ratio is known.
    pub fn resize(&mut self) {
        if self.destroyed {
            return;
        }
        let Some(image) = self.images.last() else {
            return;
        };
        let Some(ratio) = image.ratio else {
            debug!(token = %image.token, "resize before image ratio is known");
            return;
        };
        let token = image.token;
        let slide = &self.slides[image.index];
        let viewport = measure_viewport(&self.container, &self.capabilities, &self.host.metrics());
        let fit = self.options.fit_for(slide);
        match cover_fit(viewport, ratio, &fit) {
            Some(placement) => self.host.place_image(token, viewport, &placement),
            None => debug!(%token, ?viewport, ratio, "unusable geometry; placement skipped"),
        }
    }

    fn on_image_loaded(&mut self, token: TransitionToken, width: u32, height: u32) {
        if !self.is_current(token) {
            debug!(%token, "stale image load ignored");
            return;
        }
        let ratio = aspect_ratio(width, height);
        if ratio.is_none() {
            warn!(%token, width, height, "image has no usable natural size; fit skipped");
        }
        if let Some(image) = self.images.last_mut() {
            image.ratio = ratio;
        }
        self.host.fade_in(token, self.options.fade());
        self.resize();
    }

    fn on_fade_finished(&mut self, token: TransitionToken) {
        if !self.is_current(token) {
            debug!(%token, "stale fade completion ignored");
            return;
        }
        let retired: Vec<TransitionToken> = self
            .images
            .iter()
            .map(|image| image.token)
            .filter(|t| *t != token)
            .collect();
        for old in retired {
            self.host.remove_image(old);
        }
        self.images.retain(|image| image.token == token);
        self.phase = Phase::Idle;
        if !self.paused {
            self.cycle();
        }
        let index = self.index;
        debug!(%token, index, "transition finished");
        self.emit(Notification::After(index));
        self.emit(Notification::Show(index));
    }

    fn is_current(&self, token: TransitionToken) -> bool {
        self.phase == Phase::Transitioning(token)
    }

    fn update_caption(&mut self, previous: usize, next: usize) {
        let outgoing = CaptionKey::new(self.slides[previous].source.clone(), previous);
        let incoming = CaptionKey::new(self.slides[next].source.clone(), next);
        if let Some(swap) = self.captions.swap(
            &outgoing,
            &incoming,
            self.options.fade(),
            &self.options.caption_hidden_class,
        ) {
            self.host.swap_caption(&swap);
        }
    }

    fn emit(&self, notification: Notification) {
        // No receivers is fine; notifications are fire-and-forget.
        let _ = self.events.send(SlideEvent {
            container: self.container.clone(),
            notification,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captions::Reveal;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Prepare(SurfaceSetup),
        Preload(String),
        Load(TransitionToken, String),
        Place(TransitionToken, Placement),
        Fade(TransitionToken, Duration),
        Remove(TransitionToken),
        Mount(String, bool),
        Swap(CaptionSwap),
        Unmount(String),
        Teardown(bool),
    }

    struct RecordingHost {
        metrics: SurfaceMetrics,
        calls: Vec<Call>,
    }

    impl RecordingHost {
        fn new() -> Self {
            Self {
                metrics: SurfaceMetrics::uniform(800.0, 600.0),
                calls: Vec::new(),
            }
        }

        fn last_load(&self) -> Option<(TransitionToken, String)> {
            self.calls.iter().rev().find_map(|c| match c {
                Call::Load(t, s) => Some((*t, s.clone())),
                _ => None,
            })
        }
    }

    impl Host for RecordingHost {
        fn metrics(&self) -> SurfaceMetrics {
            self.metrics
        }
        fn prepare_surface(&mut self, setup: &SurfaceSetup) {
            self.calls.push(Call::Prepare(*setup));
        }
        fn preload(&mut self, source: &str) {
            self.calls.push(Call::Preload(source.to_string()));
        }
        fn load_image(&mut self, token: TransitionToken, source: &str) {
            self.calls.push(Call::Load(token, source.to_string()));
        }
        fn place_image(&mut self, token: TransitionToken, _viewport: Viewport, placement: &Placement) {
            self.calls.push(Call::Place(token, *placement));
        }
        fn fade_in(&mut self, token: TransitionToken, duration: Duration) {
            self.calls.push(Call::Fade(token, duration));
        }
        fn remove_image(&mut self, token: TransitionToken) {
            self.calls.push(Call::Remove(token));
        }
        fn mount_caption(&mut self, _mount: &str, _attribute: &str, record: &CaptionRecord) {
            self.calls.push(Call::Mount(record.tag.clone(), record.hidden));
        }
        fn swap_caption(&mut self, swap: &CaptionSwap) {
            self.calls.push(Call::Swap(swap.clone()));
        }
        fn unmount_caption(&mut self, tag: &str) {
            self.calls.push(Call::Unmount(tag.to_string()));
        }
        fn teardown(&mut self, preserve_visual: bool) {
            self.calls.push(Call::Teardown(preserve_visual));
        }
    }

    fn slides(names: &[&str]) -> Vec<Slide> {
        names.iter().map(|n| Slide::from(*n)).collect()
    }

    fn build(names: &[&str], options: SlideshowOptions) -> Slideshow<RecordingHost> {
        Slideshow::new(
            ContainerId::Body,
            slides(names),
            options,
            PlatformCapabilities::default(),
            RecordingHost::new(),
        )
        .expect("valid slideshow")
    }

    /// Drive the in-flight transition to completion.
    fn complete(show: &mut Slideshow<RecordingHost>) {
        let (token, _) = show.host().last_load().expect("a load was requested");
        show.handle(HostEvent::ImageLoaded {
            token,
            width: 1600,
            height: 800,
        });
        show.handle(HostEvent::FadeFinished { token });
    }

    fn drain(rx: &mut broadcast::Receiver<SlideEvent>) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev.notification);
        }
        out
    }

    #[test]
    fn empty_sequence_is_rejected() {
        let err = Slideshow::new(
            ContainerId::Body,
            Vec::new(),
            SlideshowOptions::default(),
            PlatformCapabilities::default(),
            RecordingHost::new(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, Error::NoImages));
    }

    #[test]
    fn start_index_is_clamped_and_navigation_wraps() {
        let options = SlideshowOptions {
            start: 5,
            ..SlideshowOptions::default()
        };
        let mut show = build(&["a", "b", "c"], options);
        show.start();
        assert_eq!(show.index(), 2);
        assert_eq!(show.host().last_load().unwrap().1, "c");

        complete(&mut show);
        assert!(show.next());
        assert_eq!(show.index(), 0);
        assert!(show.prev());
        assert_eq!(show.index(), 2);

        let options = SlideshowOptions {
            start: -4,
            ..SlideshowOptions::default()
        };
        let show = build(&["a", "b", "c"], options);
        assert_eq!(show.index(), 0);
    }

    #[test]
    fn next_then_prev_returns_to_origin() {
        let mut show = build(&["a", "b", "c", "d"], SlideshowOptions::default());
        show.start();
        for origin in 0..4isize {
            show.show(origin);
            show.next();
            show.prev();
            assert_eq!(show.index(), origin as usize);
        }
    }

    #[test]
    fn out_of_range_show_is_a_silent_no_op() {
        let mut show = build(&["a", "b", "c"], SlideshowOptions::default());
        show.start();
        complete(&mut show);
        let mut rx = show.subscribe();
        let calls_before = show.host().calls.len();

        assert!(!show.show(3));
        assert!(!show.show(-3));
        assert!(!show.show(isize::MIN));
        assert_eq!(show.index(), 0);
        assert_eq!(show.phase(), Phase::Idle);
        assert!(show.timer().is_some());
        assert_eq!(show.host().calls.len(), calls_before);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn negative_index_counts_back_from_the_end() {
        let mut show = build(&["a", "b", "c"], SlideshowOptions::default());
        show.start();
        assert!(show.show(-1));
        assert_eq!(show.index(), 2);
        assert!(show.show(-2));
        assert_eq!(show.index(), 1);
    }

    #[test]
    fn notifications_follow_transition_lifecycle() {
        let mut show = build(&["a", "b"], SlideshowOptions::default());
        let mut rx = show.subscribe();
        show.start();
        assert_eq!(drain(&mut rx), vec![Notification::Before(0)]);
        assert!(show.timer().is_none(), "no timer while transitioning");

        complete(&mut show);
        assert_eq!(
            drain(&mut rx),
            vec![Notification::After(0), Notification::Show(0)]
        );
        let timer = show.timer().expect("timer armed after transition");
        assert_eq!(timer.period, Duration::from_millis(5000));

        show.on_tick(timer);
        assert_eq!(drain(&mut rx), vec![Notification::Before(1)]);
        assert_eq!(show.index(), 1);
        assert!(show.timer().is_none());
    }

    #[test]
    fn load_places_image_with_cover_fit_before_fading() {
        let options = SlideshowOptions {
            fade_ms: 300,
            ..SlideshowOptions::default()
        };
        let mut show = build(&["wide.jpg"], options);
        show.start();
        let (token, _) = show.host().last_load().unwrap();
        show.handle(HostEvent::ImageLoaded {
            token,
            width: 1600,
            height: 800,
        });
        let calls = &show.host().calls;
        assert!(calls.contains(&Call::Fade(token, Duration::from_millis(300))));
        assert!(calls.contains(&Call::Place(
            token,
            Placement {
                width: 1200.0,
                height: 600.0,
                left: -200.0,
                top: 0.0
            }
        )));
    }

    #[test]
    fn single_slide_never_arms_timer() {
        let mut show = build(&["only"], SlideshowOptions::default());
        show.start();
        complete(&mut show);
        assert_eq!(show.phase(), Phase::Idle);
        assert!(show.timer().is_none());
        show.cycle();
        assert!(show.timer().is_none());
    }

    #[test]
    fn pause_stops_ticks_and_resume_advances_once() {
        let mut show = build(&["a", "b", "c"], SlideshowOptions::default());
        show.start();
        complete(&mut show);
        let timer = show.timer().unwrap();

        show.pause();
        assert!(show.timer().is_none());
        for _ in 0..5 {
            show.on_tick(timer);
        }
        assert_eq!(show.index(), 0);

        show.resume();
        assert_eq!(show.index(), 1);
        complete(&mut show);
        assert!(show.timer().is_some());
    }

    #[test]
    fn paused_from_options_keeps_timer_disarmed() {
        let options = SlideshowOptions {
            paused: true,
            ..SlideshowOptions::default()
        };
        let mut show = build(&["a", "b"], options);
        show.start();
        complete(&mut show);
        assert!(show.is_paused());
        assert!(show.timer().is_none());
    }

    #[test]
    fn pause_lets_in_flight_transition_finish() {
        let mut show = build(&["a", "b"], SlideshowOptions::default());
        let mut rx = show.subscribe();
        show.start();
        show.pause();
        complete(&mut show);
        assert_eq!(
            drain(&mut rx),
            vec![
                Notification::Before(0),
                Notification::After(0),
                Notification::Show(0)
            ]
        );
        assert!(show.timer().is_none());
    }

    #[test]
    fn stale_completions_are_discarded() {
        let mut show = build(&["a", "b", "c"], SlideshowOptions::default());
        let mut rx = show.subscribe();
        show.start();
        let (first, _) = show.host().last_load().unwrap();
        show.next();
        let (second, _) = show.host().last_load().unwrap();
        assert_ne!(first, second);
        drain(&mut rx);

        show.handle(HostEvent::ImageLoaded {
            token: first,
            width: 100,
            height: 100,
        });
        show.handle(HostEvent::FadeFinished { token: first });
        assert!(drain(&mut rx).is_empty());
        assert_eq!(show.phase(), Phase::Transitioning(second));
        assert!(!show.host().calls.contains(&Call::Fade(first, Duration::ZERO)));

        complete(&mut show);
        assert!(show.host().calls.contains(&Call::Remove(first)));
        assert_eq!(
            drain(&mut rx),
            vec![Notification::After(1), Notification::Show(1)]
        );
    }

    #[test]
    fn previous_image_removed_after_fade() {
        let mut show = build(&["a", "b"], SlideshowOptions::default());
        show.start();
        complete(&mut show);
        let (first, _) = show.host().last_load().unwrap();
        show.next();
        let (second, _) = show.host().last_load().unwrap();
        assert!(!show.host().calls.contains(&Call::Remove(first)));
        complete(&mut show);
        assert!(show.host().calls.contains(&Call::Remove(first)));
        assert!(!show.host().calls.contains(&Call::Remove(second)));
    }

    #[test]
    fn failed_load_stalls_until_navigation() {
        let mut show = build(&["a", "b"], SlideshowOptions::default());
        show.start();
        let (token, _) = show.host().last_load().unwrap();
        show.handle(HostEvent::ImageFailed { token });
        assert_eq!(show.phase(), Phase::Transitioning(token));
        assert!(show.timer().is_none());
        show.next();
        complete(&mut show);
        assert_eq!(show.index(), 1);
        assert_eq!(show.phase(), Phase::Idle);
    }

    #[test]
    fn resize_before_ratio_known_is_skipped() {
        let mut show = build(&["a"], SlideshowOptions::default());
        show.start();
        show.handle(HostEvent::Resized);
        assert!(
            !show
                .host()
                .calls
                .iter()
                .any(|c| matches!(c, Call::Place(..)))
        );
    }

    #[test]
    fn zero_sized_image_still_fades_and_cycles() {
        let options = SlideshowOptions {
            fade_ms: 200,
            ..SlideshowOptions::default()
        };
        let mut show = build(&["a", "b", "c"], options);
        let mut rx = show.subscribe();
        show.start();
        complete(&mut show);
        let timer = show.timer().expect("timer armed after first slide");
        show.on_tick(timer);
        drain(&mut rx);

        let (token, source) = show.host().last_load().unwrap();
        assert_eq!(source, "b");
        show.handle(HostEvent::ImageLoaded {
            token,
            width: 0,
            height: 0,
        });
        let calls = &show.host().calls;
        assert!(calls.contains(&Call::Fade(token, Duration::from_millis(200))));
        assert!(
            !calls
                .iter()
                .any(|c| matches!(c, Call::Place(t, _) if *t == token))
        );

        show.handle(HostEvent::Resized);
        assert!(
            !show
                .host()
                .calls
                .iter()
                .any(|c| matches!(c, Call::Place(t, _) if *t == token))
        );

        show.handle(HostEvent::FadeFinished { token });
        assert_eq!(show.phase(), Phase::Idle);
        assert!(show.timer().is_some());
        assert_eq!(
            drain(&mut rx),
            vec![Notification::After(1), Notification::Show(1)]
        );
    }

    #[test]
    fn resize_refits_with_slide_offsets() {
        let slides = vec![Slide::new("tall.jpg").with_offsets(None, Some(0.0))];
        let mut show = Slideshow::new(
            ContainerId::Body,
            slides,
            SlideshowOptions::default(),
            PlatformCapabilities::default(),
            RecordingHost::new(),
        )
        .unwrap();
        show.start();
        let (token, _) = show.host().last_load().unwrap();
        show.handle(HostEvent::ImageLoaded {
            token,
            width: 400,
            height: 800,
        });
        show.host_mut().metrics = SurfaceMetrics::uniform(400.0, 300.0);
        show.handle(HostEvent::OrientationChanged);
        let last_place = show.host().calls.iter().rev().find_map(|c| match c {
            Call::Place(_, p) => Some(*p),
            _ => None,
        });
        assert_eq!(
            last_place,
            Some(Placement {
                width: 400.0,
                height: 800.0,
                left: 0.0,
                top: 0.0
            })
        );
    }

    #[test]
    fn preloads_everything_unless_lazy() {
        let mut show = build(&["a", "b", "c"], SlideshowOptions::default());
        show.start();
        let preloads = show
            .host()
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Preload(_)))
            .count();
        assert_eq!(preloads, 3);

        let options = SlideshowOptions {
            lazy_load: true,
            start: 1,
            ..SlideshowOptions::default()
        };
        let mut show = build(&["a", "b", "c"], options);
        show.start();
        let preloads: Vec<_> = show
            .host()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Preload(s) => Some(s.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(preloads, vec!["b"]);
        // lazy mode registers a placeholder caption for every slide
        assert_eq!(show.captions().records().len(), 3);
    }

    #[test]
    fn captions_mount_hidden_and_swap_on_navigation() {
        let slides = vec![
            Slide::new("a.jpg").with_caption("Alpha"),
            Slide::new("b.jpg"),
            Slide::new("c.jpg").with_caption("Gamma"),
        ];
        let options = SlideshowOptions {
            fade_ms: 1000,
            ..SlideshowOptions::default()
        };
        let mut show = Slideshow::new(
            ContainerId::element("#hero"),
            slides,
            options,
            PlatformCapabilities::default(),
            RecordingHost::new(),
        )
        .unwrap();
        show.start();
        let mounts: Vec<_> = show
            .host()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Mount(tag, hidden) => Some((tag.clone(), *hidden)),
                _ => None,
            })
            .collect();
        assert_eq!(
            mounts,
            vec![("a.jpg_0".to_string(), false), ("c.jpg_2".to_string(), true)]
        );

        complete(&mut show);
        show.show(2);
        let swap = show.host().calls.iter().rev().find_map(|c| match c {
            Call::Swap(s) => Some(s.clone()),
            _ => None,
        });
        let swap = swap.expect("caption swap requested");
        assert_eq!(swap.outgoing.as_deref(), Some("a.jpg_0"));
        assert_eq!(swap.incoming.as_deref(), Some("c.jpg_2"));
        assert_eq!(swap.reveal, Reveal::Fade(Duration::from_millis(500)));
        assert_eq!(swap.hidden_class, "hide");
    }

    #[test]
    fn destroy_disarms_and_ignores_late_callbacks() {
        let slides = vec![Slide::new("a.jpg").with_caption("Alpha"), Slide::new("b.jpg")];
        let mut show = Slideshow::new(
            ContainerId::Body,
            slides,
            SlideshowOptions::default(),
            PlatformCapabilities::default(),
            RecordingHost::new(),
        )
        .unwrap();
        let mut rx = show.subscribe();
        show.start();
        let (token, _) = show.host().last_load().unwrap();
        show.destroy(false);
        drain(&mut rx);

        assert!(show.is_destroyed());
        assert!(show.timer().is_none());
        assert!(show.host().calls.contains(&Call::Unmount("a.jpg_0".into())));
        assert!(show.host().calls.contains(&Call::Teardown(false)));

        show.handle(HostEvent::ImageLoaded {
            token,
            width: 10,
            height: 10,
        });
        show.handle(HostEvent::FadeFinished { token });
        assert!(!show.next());
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn destroy_preserving_visual_keeps_captions() {
        let slides = vec![Slide::new("a.jpg").with_caption("Alpha")];
        let mut show = Slideshow::new(
            ContainerId::Body,
            slides,
            SlideshowOptions::default(),
            PlatformCapabilities::default(),
            RecordingHost::new(),
        )
        .unwrap();
        show.start();
        show.destroy(true);
        assert!(show.host().calls.contains(&Call::Teardown(true)));
        assert!(
            !show
                .host()
                .calls
                .iter()
                .any(|c| matches!(c, Call::Unmount(_)))
        );
    }
}
