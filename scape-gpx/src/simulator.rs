//! GPX simulator
//!
//! Replays a GPX document as a live [`LocationProvider`]. Points are emitted in
//! track, segment, point order. The gap between two points is the difference
//! of their timestamps when that is at least the tick interval, otherwise the
//! tick interval itself.
//!
//! **State machine:** the simulator is stopped until the first of location,
//! course or device heading updates is switched on, and stops again when the
//! last of them is switched off. While simulating it can be paused, resumed
//! and moved with jumps. Running past the last point ends the simulation: the
//! activity drops to stationary and [`SensorEvent::SimulationEnded`] is sent.
//! A later jump back resumes emitting.
//!
//! **Timers:** at most one one-shot Tokio task is pending at any time. Its
//! handle is aborted before every reschedule, pause, jump and stop.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use scape_common::config::SimulatorConfig;
use scape_common::geo::Polygon;
use scape_common::time::{seconds_between, secs_to_duration};
use scape_common::Location;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::document::{GpxDocument, GpxLocation, GpxTrackPoint};
use crate::error::{Error, Result};
use crate::index::GpxIndex;
use crate::parser;
use crate::provider::{LocationProvider, SensorEvent, SimulatedActivity};
use crate::significant::SignificantChangeOrigin;

/// Capacity of the sensor event channel
const EVENT_CAPACITY: usize = 256;

const KEYWORD_STATIONARY: &str = "activity:stationary";
const KEYWORD_WALKING: &str = "activity:walking";
const KEYWORD_AUTOMOTIVE: &str = "activity:automotive";
const KEYWORD_TIME_INTERVAL: &str = "time_interval:";

/// Replay settings, after metadata keywords were applied
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorSettings {
    pub tick_interval_secs: f64,
    pub synthesize_course: bool,
    pub synthesize_speed: bool,
    pub significant_change_distance_m: f64,
    pub activity: SimulatedActivity,
}

impl SimulatorSettings {
    pub fn from_config(config: &SimulatorConfig) -> Self {
        Self {
            tick_interval_secs: config.tick_interval_secs,
            synthesize_course: config.synthesize_course,
            synthesize_speed: config.synthesize_speed,
            significant_change_distance_m: config.significant_change_distance_m,
            activity: SimulatedActivity::Walking,
        }
    }

    /// Replace the tick interval, which must be a positive number of seconds
    pub fn with_tick_interval(mut self, secs: f64) -> scape_common::Result<Self> {
        if !(secs.is_finite() && secs > 0.0) {
            return Err(scape_common::Error::InvalidInput(format!(
                "tick interval must be positive, got {}",
                secs
            )));
        }
        self.tick_interval_secs = secs;
        Ok(self)
    }

    /// Apply `activity:<kind>` and `time_interval:<seconds>` keywords
    pub fn apply_keywords(&mut self, keywords: &str) {
        if keywords.contains(KEYWORD_STATIONARY) {
            self.activity = SimulatedActivity::Stationary;
        } else if keywords.contains(KEYWORD_WALKING) {
            self.activity = SimulatedActivity::Walking;
        } else if keywords.contains(KEYWORD_AUTOMOTIVE) {
            self.activity = SimulatedActivity::Automotive;
        }

        let Some(start) = keywords.find(KEYWORD_TIME_INTERVAL) else {
            return;
        };
        let rest = &keywords[start + KEYWORD_TIME_INTERVAL.len()..];
        let number: String = rest
            .trim_start()
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == '-' || *c == '+' || *c == 'e' || *c == 'E')
            .collect();

        match number.parse::<f64>() {
            Ok(secs) if secs.is_finite() && secs > 0.0 => self.tick_interval_secs = secs,
            _ => warn!("Ignoring invalid time interval keyword in '{}'", keywords),
        }
    }
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self::from_config(&SimulatorConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationPhase {
    Stopped,
    Running,
    Paused,
}

struct SimState {
    phase: SimulationPhase,
    current: GpxIndex,
    location_active: bool,
    course_active: bool,
    heading_active: bool,
    reached_end: bool,
    significant: Option<SignificantChangeOrigin>,
    pending: Option<JoinHandle<()>>,
    /// Bumped on every cancel; a fired tick with an older value is stale
    generation: u64,
}

impl SimState {
    fn new() -> Self {
        Self {
            phase: SimulationPhase::Stopped,
            current: GpxIndex::ZERO,
            location_active: false,
            course_active: false,
            heading_active: false,
            reached_end: false,
            significant: None,
            pending: None,
            generation: 0,
        }
    }

    fn is_simulating(&self) -> bool {
        self.phase != SimulationPhase::Stopped
    }

    fn any_active(&self) -> bool {
        self.location_active || self.course_active || self.heading_active
    }

    fn cancel_pending(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }

    fn reset(&mut self) {
        self.cancel_pending();
        self.phase = SimulationPhase::Stopped;
        self.current = GpxIndex::ZERO;
        self.reached_end = false;
    }
}

/// Which update kind a start/stop call refers to
#[derive(Debug, Clone, Copy)]
enum UpdateKind {
    Location,
    Course,
    DeviceHeading,
}

struct Inner {
    document: GpxDocument,
    settings: SimulatorSettings,
    /// Footprints used as significant-change origins
    regions: Vec<Polygon>,
    state: Mutex<SimState>,
    events: broadcast::Sender<SensorEvent>,
}

pub struct GpxSimulator {
    inner: Arc<Inner>,
}

impl GpxSimulator {
    /// Simulator over `document`, `None` when it has no first track point
    ///
    /// Metadata keywords override the activity and tick interval in `settings`.
    pub fn new(document: GpxDocument, mut settings: SimulatorSettings) -> Option<Self> {
        document.track_point(GpxIndex::ZERO)?;

        if let Some(keywords) = document.keywords() {
            settings.apply_keywords(keywords);
        }

        info!(
            "GPX simulator ready: {} points, {} activity, {:.2}s tick",
            document.point_count(),
            settings.activity,
            settings.tick_interval_secs
        );

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Some(Self {
            inner: Arc::new(Inner {
                document,
                settings,
                regions: Vec::new(),
                state: Mutex::new(SimState::new()),
                events,
            }),
        })
    }

    pub fn from_config(document: GpxDocument, config: &SimulatorConfig) -> Option<Self> {
        Self::new(document, SimulatorSettings::from_config(config))
    }

    /// Parse `path` and build a simulator over it
    pub fn from_file(path: &Path, settings: SimulatorSettings) -> Result<Self> {
        let document = parser::parse_file(path)?;
        Self::new(document, settings).ok_or(Error::EmptyDocument)
    }

    /// Use `regions` as significant-change origins when a fix falls inside one
    ///
    /// Only effective before the simulator is shared.
    pub fn with_regions(mut self, regions: Vec<Polygon>) -> Self {
        match Arc::get_mut(&mut self.inner) {
            Some(inner) => inner.regions = regions,
            None => warn!("Simulator already shared, ignoring significant-change regions"),
        }
        self
    }

    pub fn document(&self) -> &GpxDocument {
        &self.inner.document
    }

    pub fn settings(&self) -> &SimulatorSettings {
        &self.inner.settings
    }

    pub fn activity(&self) -> SimulatedActivity {
        self.inner.settings.activity
    }

    pub fn phase(&self) -> SimulationPhase {
        self.inner.lock().phase
    }

    pub fn is_simulating(&self) -> bool {
        self.inner.lock().is_simulating()
    }

    pub fn is_paused(&self) -> bool {
        self.phase() == SimulationPhase::Paused
    }

    pub fn current_index(&self) -> GpxIndex {
        self.inner.lock().current
    }

    pub fn has_reached_end(&self) -> bool {
        self.inner.lock().reached_end
    }

    /// Fix for `index` with course and speed synthesized where allowed
    pub fn location_at(&self, index: GpxIndex) -> Option<GpxLocation> {
        self.inner.location_at(index)
    }

    pub fn all_track_points(&self) -> Vec<&GpxTrackPoint> {
        self.inner.document.all_track_points()
    }

    pub fn all_track_locations(&self) -> Vec<Location> {
        self.inner
            .document
            .all_track_points()
            .into_iter()
            .map(|p| p.gpx_location().location)
            .collect()
    }

    /// Point nearest to `location`; the later point wins a tie
    pub fn closest_track_point(&self, location: &Location) -> Option<&GpxTrackPoint> {
        let mut closest: Option<(&GpxTrackPoint, f64)> = None;
        for point in self.inner.document.all_track_points() {
            let distance = location.coordinate.distance_to(&point.coordinate());
            if closest.map_or(true, |(_, best)| distance <= best) {
                closest = Some((point, distance));
            }
        }
        closest.map(|(point, _)| point)
    }

    /// Index of the first point equal to `point`
    pub fn index_of(&self, point: &GpxTrackPoint) -> Option<GpxIndex> {
        self.inner
            .document
            .indexed_points()
            .find(|(_, candidate)| *candidate == point)
            .map(|(index, _)| index)
    }

    pub fn pause(&self) {
        let mut state = self.inner.lock();
        if !state.is_simulating() {
            return;
        }
        state.phase = SimulationPhase::Paused;
        state.cancel_pending();
        debug!("Simulation paused at {}", state.current);
    }

    /// Resume and emit the next point right away
    pub fn resume(&self) {
        {
            let mut state = self.inner.lock();
            if !state.is_simulating() {
                return;
            }
            state.phase = SimulationPhase::Running;
        }
        debug!("Simulation resumed");
        self.inner.simulate_jump(1);
    }

    pub fn toggle_simulation_state(&self) {
        if self.is_paused() {
            self.resume();
        } else {
            self.pause();
        }
    }

    pub fn simulate_next_location(&self) {
        self.inner.simulate_jump(1);
    }

    pub fn simulate_previous_location(&self) {
        self.inner.simulate_jump(-1);
    }

    pub fn simulate_jump_forward(&self, points: usize) {
        self.inner.simulate_jump(i64::try_from(points).unwrap_or(i64::MAX));
    }

    pub fn simulate_jump_back(&self, points: usize) {
        self.inner
            .simulate_jump(i64::try_from(points).unwrap_or(i64::MAX).saturating_neg());
    }

    /// Move to `index` and emit it now
    pub fn simulate_location(&self, index: GpxIndex) {
        self.inner.simulate_location(index);
    }
}

impl Drop for GpxSimulator {
    fn drop(&mut self) {
        self.inner.lock().cancel_pending();
    }
}

impl LocationProvider for GpxSimulator {
    fn start_location_updates(&self) {
        self.inner.start_updates(UpdateKind::Location);
    }

    fn stop_location_updates(&self) {
        self.inner.stop_updates(UpdateKind::Location);
    }

    fn start_course_updates(&self) {
        self.inner.start_updates(UpdateKind::Course);
    }

    fn stop_course_updates(&self) {
        self.inner.stop_updates(UpdateKind::Course);
    }

    fn start_device_heading_updates(&self) {
        self.inner.start_updates(UpdateKind::DeviceHeading);
    }

    fn stop_device_heading_updates(&self) {
        self.inner.stop_updates(UpdateKind::DeviceHeading);
    }

    fn start_monitoring_significant_location_changes(&self) -> bool {
        let current = self.inner.lock().current;
        let Some(gpx) = self.inner.location_at(current) else {
            return false;
        };

        {
            let mut state = self.inner.lock();
            state.significant = Some(SignificantChangeOrigin::new(
                &gpx.location,
                &self.inner.regions,
                self.inner.settings.significant_change_distance_m,
            ));
            if !state.is_simulating() {
                state.phase = SimulationPhase::Running;
            }
            state.location_active = true;
        }

        info!("Monitoring significant location changes from {}", current);
        self.inner.simulate_location(current);
        true
    }

    fn stop_monitoring_significant_location_changes(&self) {
        let mut state = self.inner.lock();
        state.significant = None;
        // Stopped with a kind still flagged would swallow that kind's next start
        state.location_active = false;
        state.course_active = false;
        state.heading_active = false;
        state.cancel_pending();
        state.phase = SimulationPhase::Stopped;
        info!("Stopped monitoring significant location changes");
    }

    fn subscribe(&self) -> broadcast::Receiver<SensorEvent> {
        self.inner.events.subscribe()
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: SensorEvent) {
        if self.events.send(event).is_err() {
            trace!("No sensor event subscribers");
        }
    }

    fn start_updates(self: &Arc<Self>, kind: UpdateKind) {
        {
            let mut state = self.lock();
            let flag = match kind {
                UpdateKind::Location => &mut state.location_active,
                UpdateKind::Course => &mut state.course_active,
                UpdateKind::DeviceHeading => &mut state.heading_active,
            };
            if *flag {
                return;
            }
            *flag = true;
            debug!("{:?} updates on", kind);

            if state.is_simulating() {
                return;
            }

            state.reset();
            state.phase = SimulationPhase::Running;
        }

        info!("Simulation started");
        self.emit(SensorEvent::Activity(self.settings.activity));
        self.simulate_location(GpxIndex::ZERO);
    }

    fn stop_updates(&self, kind: UpdateKind) {
        let mut state = self.lock();
        let flag = match kind {
            UpdateKind::Location => &mut state.location_active,
            UpdateKind::Course => &mut state.course_active,
            UpdateKind::DeviceHeading => &mut state.heading_active,
        };
        if !*flag {
            return;
        }
        *flag = false;
        debug!("{:?} updates off", kind);

        if !state.any_active() {
            state.reset();
            info!("Simulation stopped");
        }
    }

    fn simulate_jump(self: &Arc<Self>, points: i64) {
        let next = {
            let state = self.lock();
            if !state.is_simulating() {
                return;
            }
            state.current.jumped(&self.document, points)
        };

        match next {
            Some(index) => self.simulate_location(index),
            None => self.reached_end(),
        }
    }

    fn simulate_location(self: &Arc<Self>, index: GpxIndex) {
        let mut state = self.lock();
        if !state.is_simulating() {
            return;
        }

        let Some(gpx) = self.location_at(index) else {
            // Only reachable through an explicit out-of-range index
            info!("Simulated location index {} is out of bounds", index);
            drop(state);
            self.reached_end();
            return;
        };

        if let Some(origin) = state.significant.as_ref() {
            if !origin.should_update(&gpx.location) {
                trace!("Suppressing insignificant fix at {}", index);
                state.cancel_pending();
                state.current = index;
                self.schedule_next(&mut state);
                return;
            }

            state.significant = Some(SignificantChangeOrigin::new(
                &gpx.location,
                &self.regions,
                self.settings.significant_change_distance_m,
            ));
        }

        if state.reached_end {
            state.reached_end = false;
            self.emit(SensorEvent::Activity(self.settings.activity));
        }

        state.cancel_pending();
        state.current = index;
        trace!("Simulating {} at {}", index, gpx.location.coordinate.latitude);

        if state.location_active {
            self.emit(SensorEvent::Location(gpx.location.clone()));
        }
        if state.course_active {
            self.emit(SensorEvent::Course {
                course: gpx.location.course,
                speed: gpx.location.speed,
            });
        }
        if state.heading_active {
            let heading = gpx
                .device_heading
                .filter(|h| scape_common::geo::is_valid_direction(*h));
            self.emit(SensorEvent::DeviceHeading(heading));
        }

        self.schedule_next(&mut state);
    }

    fn schedule_next(self: &Arc<Self>, state: &mut SimState) {
        if state.phase != SimulationPhase::Running {
            return;
        }

        let current = state.current;
        let Some(next) = current.jumped(&self.document, 1) else {
            self.mark_end(state);
            return;
        };
        let (Some(point), Some(next_point)) = (
            self.document.track_point(current),
            self.document.track_point(next),
        ) else {
            self.mark_end(state);
            return;
        };

        let delay = self.delay_between(point, next_point);
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!("Cannot schedule next simulated location without a Tokio runtime: {}", e);
                return;
            }
        };

        trace!("Next simulated location {} in {:?}", next, delay);
        let weak: Weak<Inner> = Arc::downgrade(self);
        let generation = state.generation;
        state.pending = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                inner.fire_tick(generation);
            }
        }));
    }

    fn fire_tick(self: &Arc<Self>, generation: u64) {
        {
            let mut state = self.lock();
            if state.generation != generation || state.phase != SimulationPhase::Running {
                trace!("Dropping stale simulator tick");
                return;
            }
            // Detach so the reschedule below does not abort this task
            state.pending.take();
        }
        self.simulate_jump(1);
    }

    fn delay_between(&self, point: &GpxTrackPoint, next: &GpxTrackPoint) -> Duration {
        let tick = self.settings.tick_interval_secs;
        let secs = match (&point.time, &next.time) {
            (Some(a), Some(b)) => {
                let delta = seconds_between(a, b);
                if delta >= tick {
                    delta
                } else {
                    tick
                }
            }
            _ => tick,
        };
        secs_to_duration(secs)
    }

    fn reached_end(&self) {
        let mut state = self.lock();
        if state.is_simulating() {
            self.mark_end(&mut state);
        }
    }

    fn mark_end(&self, state: &mut SimState) {
        info!("Reached end of simulated locations at {}", state.current);
        state.cancel_pending();
        state.reached_end = true;
        self.emit(SensorEvent::Activity(SimulatedActivity::Stationary));
        self.emit(SensorEvent::SimulationEnded);
    }

    fn location_at(&self, index: GpxIndex) -> Option<GpxLocation> {
        let point = self.document.track_point(index)?;
        let mut gpx = point.gpx_location();
        let recorded = point.has_soundscape_extension();

        if gpx.location.course.is_none() && self.settings.synthesize_course && !recorded {
            if let Some(course) = self.course_for(index) {
                gpx.location = gpx.location.with_course(course);
            }
        }

        if gpx.location.speed.is_none() && self.settings.synthesize_speed && !recorded {
            if let Some(speed) = self.speed_for(index) {
                gpx.location = gpx.location.with_speed(speed);
            }
        }

        Some(gpx)
    }

    /// Recorded course, else the bearing to the next point
    ///
    /// The last point of a segment, and a point sharing its coordinate with
    /// the next one, inherit the previous point's course.
    fn course_for(&self, index: GpxIndex) -> Option<f64> {
        let point = self.document.track_point(index)?;
        if let Some(course) = point.recorded_course() {
            return Some(course);
        }

        let previous = || {
            let point = index.point.checked_sub(1)?;
            self.course_for(GpxIndex::new(index.track, index.segment, point))
        };

        let segment = self.document.segment(index.track, index.segment)?;
        if index.point + 1 >= segment.points.len() {
            return previous();
        }

        let next = self.document.track_point(index.next_point())?;
        if point.latitude == next.latitude && point.longitude == next.longitude {
            return previous();
        }

        Some(point.coordinate().bearing_to(&next.coordinate()))
    }

    /// Recorded speed, else distance from the previous point over one tick
    ///
    /// The first point of a segment is stationary.
    fn speed_for(&self, index: GpxIndex) -> Option<f64> {
        let point = self.document.track_point(index)?;
        if let Some(speed) = point.recorded_speed() {
            return Some(speed);
        }

        let Some(previous) = index.point.checked_sub(1) else {
            return Some(0.0);
        };
        let previous = self
            .document
            .track_point(GpxIndex::new(index.track, index.segment, previous))?;

        let distance = point.coordinate().distance_to(&previous.coordinate());
        Some(distance / self.settings.tick_interval_secs)
    }
}
