//! The timeline engine: one instance per session.
//!
//! The engine owns all mutable state (journey, viewport, filter, playback,
//! selection) and changes it only through its command methods. After every
//! successful mutation, subscribers receive a fresh [`EngineState`] snapshot.
//! Derived views (filtered events, clusters, ticks) are pure functions of
//! that state, recomputed on each read.

use jiff::Timestamp;
use serde::Serialize;
use tracing::debug;

use crate::cluster::{self, ClusterOptions, VisibleItem};
use crate::filter::{self, DateRange, TimelineFilter};
use crate::input::{self, Command, Input};
use crate::journey::{Journey, JourneyStore};
use crate::model::{
    EventType, JourneyData, JourneyEvent, JourneyRequest, PlaybackState, SavedViewport, Scale, Viewport,
    ticks,
};
use crate::persist;
use crate::playback::{Animator, DEFAULT_BASE_STEP, FrameScheduler, Step};
use crate::provider::{self, JourneyProvider};
use crate::storage::KeyValueStore;
use crate::viewport::ViewportController;

/// Tunables fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineOptions {
    pub cluster: ClusterOptions,
    /// Position advanced per playback frame at speed 1.0.
    pub base_step: f64,
    /// Scale to open at when no viewport was saved.
    pub default_scale: Scale,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            cluster: ClusterOptions::default(),
            base_step: DEFAULT_BASE_STEP,
            default_scale: Scale::default(),
        }
    }
}

/// Read-only snapshot handed to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineState {
    pub viewport: Viewport,
    pub playback: PlaybackState,
    pub filter: TimelineFilter,
    pub selected_event: Option<String>,
    pub hovered_event: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
    pub last_update: Option<Timestamp>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&EngineState)>;

pub struct Engine {
    provider: Box<dyn JourneyProvider>,
    store: Box<dyn KeyValueStore>,
    options: EngineOptions,
    journey: JourneyStore,
    viewport: ViewportController,
    filter: TimelineFilter,
    animator: Animator,
    scheduler: FrameScheduler,
    selected: Option<String>,
    hovered: Option<String>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl Engine {
    /// Creates an engine, restoring the last saved viewport from `store`.
    pub fn new(
        provider: Box<dyn JourneyProvider>,
        store: Box<dyn KeyValueStore>,
        options: EngineOptions,
    ) -> Self {
        let fallback = SavedViewport {
            scale: options.default_scale,
            position: 0.0,
        };
        let saved = persist::restore_viewport_or(&*store, fallback);
        Self {
            provider,
            store,
            options,
            journey: JourneyStore::default(),
            viewport: ViewportController::new(saved.scale, saved.position),
            filter: TimelineFilter::default(),
            animator: Animator::new(options.base_step),
            scheduler: FrameScheduler::default(),
            selected: None,
            hovered: None,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    // ── State ──

    pub fn state(&self) -> EngineState {
        EngineState {
            viewport: *self.viewport.viewport(),
            playback: self.animator.state(),
            filter: self.filter.clone(),
            selected_event: self.selected.clone(),
            hovered_event: self.hovered.clone(),
            loading: self.journey.is_loading(),
            error: self.journey.error().map(str::to_string),
            last_update: self.viewport.last_update(),
        }
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&EngineState) + 'static) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns `false` if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    pub fn journey(&self) -> Option<&Journey> {
        self.journey.journey()
    }

    // ── Loading ──

    /// Fetches from the provider. A failure lands in `error`; nothing retries.
    pub fn load(&mut self, request: &JourneyRequest) -> bool {
        self.begin_load();
        let result = self.provider.fetch(request);
        self.finish_load(result)
    }

    /// Marks a fetch as started, for hosts that fetch on their own.
    pub fn begin_load(&mut self) {
        self.journey.begin_load();
        self.notify();
    }

    pub fn finish_load(&mut self, result: provider::Result<JourneyData>) -> bool {
        let loaded = self.journey.finish_load(result);
        if loaded && let Some(journey) = self.journey.journey() {
            self.viewport.attach(journey);
            if self.selected.as_deref().is_some_and(|id| journey.event(id).is_none()) {
                self.selected = None;
            }
            if self.hovered.as_deref().is_some_and(|id| journey.event(id).is_none()) {
                self.hovered = None;
            }
        }
        self.notify();
        loaded
    }

    // ── Navigation ──

    pub fn set_scale(&mut self, scale: Scale) -> bool {
        let changed = self.viewport.set_scale(self.journey.journey(), scale);
        self.after_viewport_change(changed)
    }

    pub fn set_position(&mut self, position: f64) -> bool {
        let changed = self.viewport.set_position(self.journey.journey(), position);
        self.after_viewport_change(changed)
    }

    pub fn pan(&mut self, delta: f64) -> bool {
        let changed = self.viewport.pan(self.journey.journey(), delta);
        self.after_viewport_change(changed)
    }

    pub fn jump_to_event(&mut self, id: &str) -> bool {
        let changed = self.viewport.jump_to_event(self.journey.journey(), id);
        self.after_viewport_change(changed)
    }

    /// Steps one scale finer. No-op at the finest scale.
    pub fn zoom_in(&mut self) -> bool {
        match self.viewport.viewport().scale.finer() {
            Some(scale) => self.set_scale(scale),
            None => false,
        }
    }

    /// Steps one scale coarser. No-op at `full`.
    pub fn zoom_out(&mut self) -> bool {
        match self.viewport.viewport().scale.coarser() {
            Some(scale) => self.set_scale(scale),
            None => false,
        }
    }

    // ── Selection ──

    pub fn select_event(&mut self, id: &str) -> bool {
        if !self.has_event(id) {
            return false;
        }
        self.selected = Some(id.to_string());
        self.notify();
        true
    }

    pub fn hover_event(&mut self, id: Option<&str>) -> bool {
        if let Some(id) = id
            && !self.has_event(id)
        {
            return false;
        }
        self.hovered = id.map(str::to_string);
        self.notify();
        true
    }

    pub fn deselect(&mut self) -> bool {
        if self.selected.take().is_none() {
            return false;
        }
        self.notify();
        true
    }

    // ── Playback ──

    /// Starts playback. Ignored without data, at `full`, or when already playing.
    pub fn play(&mut self) -> bool {
        if self.journey.journey().is_none() || self.viewport.viewport().scale.is_full() {
            return false;
        }
        let started = self.animator.play(&mut self.scheduler);
        if started {
            self.notify();
        }
        started
    }

    pub fn pause(&mut self) -> bool {
        let paused = self.animator.pause();
        if paused {
            self.notify();
        }
        paused
    }

    pub fn toggle_playback(&mut self) -> bool {
        if self.animator.is_playing() {
            self.pause()
        } else {
            self.play()
        }
    }

    /// Stops playback and rewinds to the start.
    ///
    /// Returns whether anything changed.
    pub fn restart(&mut self) -> bool {
        let paused = self.animator.pause();
        let moved = self.viewport.rewind(self.journey.journey());
        if moved {
            persist::save_viewport(&*self.store, self.viewport.viewport());
        }
        let changed = paused || moved;
        self.notify_if(changed);
        changed
    }

    pub fn set_play_speed(&mut self, speed: f64) {
        self.animator.set_speed(speed);
        self.notify();
    }

    /// Runs the next scheduled frame, if any.
    pub fn advance_frame(&mut self) -> Option<Step> {
        let frame = self.scheduler.next_frame()?;

        if self.viewport.viewport().scale.is_full() {
            debug!("scale became full during playback, pausing");
            self.pause();
            return Some(Step::Skipped);
        }

        let position = self.viewport.viewport().position;
        let step = self.animator.step(&frame, position, &mut self.scheduler);
        match step {
            Step::Advanced(next) => {
                let changed = self.viewport.set_position(self.journey.journey(), next);
                self.after_viewport_change(changed);
            }
            Step::Finished => {
                let changed = self.viewport.set_position(self.journey.journey(), 1.0);
                self.after_viewport_change(changed);
                self.notify_if(!changed);
            }
            Step::Skipped => {}
        }
        Some(step)
    }

    /// Runs frames until playback stops or `max_frames` have run.
    pub fn run_until_stopped(&mut self, max_frames: usize) -> usize {
        let mut frames = 0;
        while frames < max_frames && self.advance_frame().is_some() {
            frames += 1;
        }
        frames
    }

    // ── Filters ──

    pub fn set_filter(&mut self, filter: TimelineFilter) {
        self.filter = filter;
        self.notify();
    }

    pub fn toggle_project(&mut self, project: &str) {
        self.filter.toggle_project(project);
        self.notify();
    }

    pub fn toggle_event_type(&mut self, kind: EventType) {
        self.filter.toggle_event_type(kind);
        self.notify();
    }

    pub fn toggle_tag(&mut self, tag: &str) {
        self.filter.toggle_tag(tag);
        self.notify();
    }

    pub fn set_date_range(&mut self, range: Option<DateRange>) {
        self.filter.date_range = range;
        self.notify();
    }

    pub fn set_search_query(&mut self, query: &str) {
        self.filter.search_query = query.to_string();
        self.notify();
    }

    pub fn clear_filters(&mut self) {
        self.filter = TimelineFilter::default();
        self.notify();
    }

    // ── Input ──

    /// Applies one user input. Returns whether anything changed.
    pub fn handle_input(&mut self, input: Input) -> bool {
        let Some(command) = input::dispatch(input) else {
            return false;
        };
        match command {
            Command::TogglePlayback => self.toggle_playback(),
            Command::Pan(delta) => self.pan(delta),
            Command::SetPosition(position) => self.set_position(position),
            Command::Deselect => self.deselect(),
            Command::ZoomIn => self.zoom_in(),
            Command::ZoomOut => self.zoom_out(),
            Command::Select(id) => self.select_event(&id),
            Command::SelectAndJump(id) => self.select_event(&id) && self.jump_to_event(&id),
            Command::Hover(id) => self.hover_event(id.as_deref()),
        }
    }

    // ── Derived views ──

    /// All events passing the filter, in journey order.
    pub fn filtered_events(&self) -> Vec<&JourneyEvent> {
        match self.journey.journey() {
            Some(journey) => filter::apply(journey.events(), &self.filter),
            None => Vec::new(),
        }
    }

    /// Filtered events inside the viewport window.
    pub fn viewport_events(&self) -> Vec<&JourneyEvent> {
        let Some(journey) = self.journey.journey() else {
            return Vec::new();
        };
        let viewport = self.viewport.viewport();
        filter::apply(
            journey.events_between(viewport.start_time, viewport.end_time),
            &self.filter,
        )
    }

    /// Render-ready markers: filtered, windowed, and clustered.
    pub fn visible_items(&self) -> Vec<VisibleItem<'_>> {
        cluster::cluster(
            &self.viewport_events(),
            self.viewport.viewport(),
            self.options.cluster,
        )
    }

    pub fn ticks(&self) -> Vec<Timestamp> {
        if self.journey.journey().is_none() {
            return Vec::new();
        }
        let viewport = self.viewport.viewport();
        ticks(viewport.scale, viewport.start_time, viewport.end_time)
    }

    // ── Internals ──

    fn has_event(&self, id: &str) -> bool {
        self.journey
            .journey()
            .is_some_and(|journey| journey.event(id).is_some())
    }

    fn after_viewport_change(&mut self, changed: bool) -> bool {
        if changed {
            persist::save_viewport(&*self.store, self.viewport.viewport());
            self.notify();
        }
        changed
    }

    fn notify_if(&mut self, condition: bool) {
        if condition {
            self.notify();
        }
    }

    fn notify(&mut self) {
        if self.listeners.is_empty() {
            return;
        }
        let state = self.state();
        for (_, listener) in &mut self.listeners {
            listener(&state);
        }
    }
}
