//! Simulator timing and control tests
//!
//! Tokio time is paused, so sleeps complete as soon as the runtime is idle and
//! elapsed times are exact.

use std::time::Duration;

use scape_gpx::parser::parse_str;
use scape_gpx::simulator::SimulationPhase;
use scape_gpx::{GpxIndex, GpxSimulator, LocationProvider, SensorEvent, SimulatedActivity, SimulatorSettings};
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::broadcast::Receiver;
use tokio::time::Instant;

const TIMED_WALK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="simulator test"
     xmlns="http://www.topografix.com/GPX/1/1"
     xmlns:gpxsc="https://microsoft.com/Soundscape">
  <trk>
    <trkseg>
      <trkpt lat="47.6000" lon="-122.3000">
        <time>2024-05-01T12:00:00Z</time>
        <extensions>
          <gpxsc:trkex>
            <gpxsc:deviceHeading>15</gpxsc:deviceHeading>
          </gpxsc:trkex>
        </extensions>
      </trkpt>
      <trkpt lat="47.6001" lon="-122.3000"><time>2024-05-01T12:00:02Z</time></trkpt>
      <trkpt lat="47.6002" lon="-122.3000"><time>2024-05-01T12:00:05Z</time></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

const DRIVE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="simulator test" xmlns="http://www.topografix.com/GPX/1/1">
  <metadata><keywords>activity:automotive, time_interval:0.5</keywords></metadata>
  <trk>
    <trkseg>
      <trkpt lat="0.0" lon="0.0"/>
      <trkpt lat="0.0001" lon="0.0"/>
    </trkseg>
    <trkseg>
      <trkpt lat="0.0002" lon="0.0"/>
    </trkseg>
  </trk>
</gpx>"#;

/// ~0, 11, 22, 56 and 67 m north of the origin
const SHUFFLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="simulator test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <trkseg>
      <trkpt lat="0.0" lon="0.0"/>
      <trkpt lat="0.0001" lon="0.0"/>
      <trkpt lat="0.0002" lon="0.0"/>
      <trkpt lat="0.0005" lon="0.0"/>
      <trkpt lat="0.0006" lon="0.0"/>
    </trkseg>
  </trk>
</gpx>"#;

fn simulator(xml: &str) -> GpxSimulator {
    GpxSimulator::new(parse_str(xml).unwrap(), SimulatorSettings::default()).unwrap()
}

async fn next_event(events: &mut Receiver<SensorEvent>) -> SensorEvent {
    tokio::time::timeout(Duration::from_secs(60), events.recv())
        .await
        .expect("no sensor event within a minute")
        .unwrap()
}

async fn next_latitude(events: &mut Receiver<SensorEvent>) -> f64 {
    match next_event(events).await {
        SensorEvent::Location(location) => location.coordinate.latitude,
        other => panic!("expected a location, got {:?}", other),
    }
}

fn assert_elapsed(start: Instant, secs: f64) {
    let elapsed = start.elapsed().as_secs_f64();
    assert!(
        (elapsed - secs).abs() < 0.01,
        "expected {}s elapsed, got {}s",
        secs,
        elapsed
    );
}

#[tokio::test(start_paused = true)]
async fn test_replays_at_recorded_pace() {
    let sim = simulator(TIMED_WALK);
    let mut events = sim.subscribe();
    let start = Instant::now();

    sim.start_location_updates();
    assert_eq!(next_event(&mut events).await, SensorEvent::Activity(SimulatedActivity::Walking));
    assert_eq!(next_latitude(&mut events).await, 47.6);
    assert_elapsed(start, 0.0);

    assert_eq!(next_latitude(&mut events).await, 47.6001);
    assert_elapsed(start, 2.0);

    assert_eq!(next_latitude(&mut events).await, 47.6002);
    assert_elapsed(start, 5.0);

    assert_eq!(next_event(&mut events).await, SensorEvent::Activity(SimulatedActivity::Stationary));
    assert_eq!(next_event(&mut events).await, SensorEvent::SimulationEnded);
    assert_elapsed(start, 5.0);
    assert!(sim.has_reached_end());
}

#[tokio::test(start_paused = true)]
async fn test_keywords_set_activity_and_tick() {
    let sim = simulator(DRIVE);
    assert_eq!(sim.activity(), SimulatedActivity::Automotive);

    let mut events = sim.subscribe();
    let start = Instant::now();
    sim.start_location_updates();

    assert_eq!(next_event(&mut events).await, SensorEvent::Activity(SimulatedActivity::Automotive));
    assert_eq!(next_latitude(&mut events).await, 0.0);
    assert_eq!(next_latitude(&mut events).await, 0.0001);
    assert_elapsed(start, 0.5);

    // Rolls over into the next segment
    assert_eq!(next_latitude(&mut events).await, 0.0002);
    assert_elapsed(start, 1.0);
    assert_eq!(sim.current_index(), GpxIndex::new(0, 1, 0));
}

#[tokio::test(start_paused = true)]
async fn test_update_kinds_are_independent() {
    let sim = simulator(TIMED_WALK);
    let mut events = sim.subscribe();

    sim.start_device_heading_updates();
    assert_eq!(next_event(&mut events).await, SensorEvent::Activity(SimulatedActivity::Walking));
    assert_eq!(next_event(&mut events).await, SensorEvent::DeviceHeading(Some(15.0)));

    // Joins the running simulation without an extra fix
    sim.start_course_updates();
    match next_event(&mut events).await {
        SensorEvent::Course { course, speed } => {
            assert!(course.unwrap().abs() < 1e-6);
            assert!((speed.unwrap() - 11.13).abs() < 0.05);
        }
        other => panic!("expected a course, got {:?}", other),
    }
    assert_eq!(next_event(&mut events).await, SensorEvent::DeviceHeading(None));

    // Still simulating while one kind remains on
    sim.stop_course_updates();
    assert!(sim.is_simulating());
    sim.stop_device_heading_updates();
    assert_eq!(sim.phase(), SimulationPhase::Stopped);
    assert_eq!(sim.current_index(), GpxIndex::ZERO);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test(start_paused = true)]
async fn test_pause_and_resume() {
    let sim = simulator(TIMED_WALK);
    let mut events = sim.subscribe();

    sim.start_location_updates();
    next_event(&mut events).await;
    assert_eq!(next_latitude(&mut events).await, 47.6);

    sim.toggle_simulation_state();
    assert!(sim.is_paused());
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(events.try_recv(), Err(TryRecvError::Empty));

    let resumed = Instant::now();
    sim.toggle_simulation_state();
    assert!(!sim.is_paused());
    assert_eq!(next_latitude(&mut events).await, 47.6001);
    assert_elapsed(resumed, 0.0);

    assert_eq!(next_latitude(&mut events).await, 47.6002);
    assert_elapsed(resumed, 3.0);
}

#[tokio::test(start_paused = true)]
async fn test_jumps_emit_immediately() {
    let sim = simulator(SHUFFLE);
    let mut events = sim.subscribe();

    sim.start_location_updates();
    next_event(&mut events).await;
    assert_eq!(next_latitude(&mut events).await, 0.0);

    let jumped = Instant::now();
    sim.simulate_jump_forward(3);
    assert_eq!(next_latitude(&mut events).await, 0.0005);
    assert_elapsed(jumped, 0.0);

    sim.simulate_jump_back(10);
    assert_eq!(next_latitude(&mut events).await, 0.0);
    assert_eq!(sim.current_index(), GpxIndex::ZERO);

    sim.simulate_jump_forward(10);
    assert_eq!(next_event(&mut events).await, SensorEvent::Activity(SimulatedActivity::Stationary));
    assert_eq!(next_event(&mut events).await, SensorEvent::SimulationEnded);

    // Moving back after the end restores the activity
    sim.simulate_previous_location();
    assert_eq!(next_event(&mut events).await, SensorEvent::Activity(SimulatedActivity::Walking));
    assert_eq!(next_latitude(&mut events).await, 0.0);
}

#[tokio::test(start_paused = true)]
async fn test_significant_change_suppresses_small_moves() {
    let sim = simulator(SHUFFLE);
    let mut events = sim.subscribe();
    let start = Instant::now();

    assert!(sim.start_monitoring_significant_location_changes());

    // The points in between are suppressed but still take their tick
    assert_eq!(next_latitude(&mut events).await, 0.0005);
    assert_elapsed(start, 3.0);

    assert_eq!(next_event(&mut events).await, SensorEvent::Activity(SimulatedActivity::Stationary));
    assert_eq!(next_event(&mut events).await, SensorEvent::SimulationEnded);
    assert_elapsed(start, 4.0);

    sim.stop_monitoring_significant_location_changes();
    assert!(!sim.is_simulating());
}

#[tokio::test(start_paused = true)]
async fn test_location_updates_restart_after_significant_monitoring() {
    let sim = simulator(SHUFFLE);
    let mut events = sim.subscribe();

    assert!(sim.start_monitoring_significant_location_changes());
    sim.simulate_jump_forward(3);
    assert_eq!(next_latitude(&mut events).await, 0.0005);

    sim.stop_monitoring_significant_location_changes();
    assert_eq!(sim.phase(), SimulationPhase::Stopped);

    sim.start_location_updates();
    assert!(sim.is_simulating());
    assert_eq!(next_event(&mut events).await, SensorEvent::Activity(SimulatedActivity::Walking));
    assert_eq!(next_latitude(&mut events).await, 0.0);
    assert_eq!(next_latitude(&mut events).await, 0.0001);
}

#[tokio::test(start_paused = true)]
async fn test_extreme_jumps_end_or_clamp() {
    let sim = simulator(SHUFFLE);
    let mut events = sim.subscribe();

    sim.start_location_updates();
    next_event(&mut events).await;
    assert_eq!(next_latitude(&mut events).await, 0.0);

    sim.simulate_next_location();
    sim.simulate_next_location();
    assert_eq!(next_latitude(&mut events).await, 0.0001);
    assert_eq!(next_latitude(&mut events).await, 0.0002);

    sim.simulate_jump_back(usize::MAX);
    assert_eq!(next_latitude(&mut events).await, 0.0);
    assert_eq!(sim.current_index(), GpxIndex::ZERO);

    sim.simulate_jump_forward(usize::MAX);
    assert_eq!(next_event(&mut events).await, SensorEvent::Activity(SimulatedActivity::Stationary));
    assert_eq!(next_event(&mut events).await, SensorEvent::SimulationEnded);
    assert!(sim.has_reached_end());
}

const GAPPED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="simulator test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <trkseg><trkpt lat="0.0" lon="0.0"/></trkseg>
    <trkseg/>
    <trkseg><trkpt lat="0.0001" lon="0.0"/></trkseg>
  </trk>
</gpx>"#;

#[tokio::test(start_paused = true)]
async fn test_empty_segment_is_skipped() {
    let sim = simulator(GAPPED);
    let mut events = sim.subscribe();
    let start = Instant::now();

    sim.start_location_updates();
    next_event(&mut events).await;
    assert_eq!(next_latitude(&mut events).await, 0.0);
    assert_eq!(next_latitude(&mut events).await, 0.0001);
    assert_elapsed(start, 1.0);
    assert_eq!(sim.current_index(), GpxIndex::new(0, 2, 0));
}
