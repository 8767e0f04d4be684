use crate::models::{NewWorkout, Workout};
use crate::timer::ActivityTimer;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::info;

/// A recommended home-workout activity. The catalog is static; what the backend
/// stores are the logged sessions.
#[derive(Debug, Clone, Serialize)]
pub struct Activity {
    pub id: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    /// Recommended duration in minutes; seeds the timer target.
    pub minutes: u32,
    pub frequency: &'static str,
    pub instructions: &'static str,
}

pub const ACTIVITIES: &[Activity] = &[
    Activity {
        id: "bead-threading",
        name: "Bead Threading",
        category: "fine-motor",
        minutes: 10,
        frequency: "daily",
        instructions: "Thread large beads onto a shoelace. Encourage a pincer grip and switch hands halfway through.",
    },
    Activity {
        id: "balance-beam",
        name: "Balance Beam Walk",
        category: "gross-motor",
        minutes: 15,
        frequency: "daily",
        instructions: "Walk heel-to-toe along a taped line or low beam. Spot from the side; count steps out loud.",
    },
    Activity {
        id: "memory-cards",
        name: "Memory Card Pairs",
        category: "cognitive",
        minutes: 10,
        frequency: "3x per week",
        instructions: "Lay 8 card pairs face down and take turns finding matches. Name each picture when it is turned.",
    },
    Activity {
        id: "texture-bin",
        name: "Texture Discovery Bin",
        category: "sensory",
        minutes: 10,
        frequency: "daily",
        instructions: "Hide small toys in a bin of rice or beans. Let the child search by touch and describe what they feel.",
    },
    Activity {
        id: "story-retell",
        name: "Story Retelling",
        category: "communication",
        minutes: 15,
        frequency: "3x per week",
        instructions: "Read a short picture book together, then ask the child to retell it in their own words.",
    },
    Activity {
        id: "turn-taking-game",
        name: "Turn-Taking Board Game",
        category: "social",
        minutes: 20,
        frequency: "2x per week",
        instructions: "Play a simple board game with the family. Practise waiting, turn-taking and losing gracefully.",
    },
    Activity {
        id: "dressing-practice",
        name: "Dressing Practice",
        category: "adl",
        minutes: 10,
        frequency: "daily",
        instructions: "Practise buttons, zips and shoes on real clothing. Start with larger fasteners and reduce help gradually.",
    },
    Activity {
        id: "puzzle-focus",
        name: "Puzzle Focus Time",
        category: "attention",
        minutes: 15,
        frequency: "daily",
        instructions: "Work on a 20-30 piece puzzle at a cleared table. One sitting, minimal prompts, praise on completion.",
    },
];

pub fn activity(id: &str) -> Option<&'static Activity> {
    ACTIVITIES.iter().find(|a| a.id == id)
}

/// The open activity modal: instructions, the timer, and the task driving it.
/// Only one session exists at a time; opening a new one replaces this.
pub struct TrackerSession {
    pub activity_id: String,
    pub timer: ActivityTimer,
    cue_pending: bool,
    ticker: Option<JoinHandle<()>>,
}

impl TrackerSession {
    fn new(activity: &Activity) -> Self {
        Self {
            activity_id: activity.id.to_string(),
            timer: ActivityTimer::new(u64::from(activity.minutes) * 60),
            cue_pending: false,
            ticker: None,
        }
    }

    fn stop_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}

impl Drop for TrackerSession {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}

/// Workout tracker view-model: the selected patient, the open session, the
/// completion badges, and the cached log (mirror of the last successful fetch).
#[derive(Default)]
pub struct Tracker {
    pub patient_id: Option<String>,
    pub session: Option<TrackerSession>,
    pub completed: BTreeSet<String>,
    pub log: Vec<Workout>,
}

impl Tracker {
    pub fn close_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.stop_ticker();
        }
    }
}

/// Snapshot of the tracker for the page; polled while the modal is open.
#[derive(Debug, Clone, Serialize)]
pub struct TrackerStatus {
    pub open: bool,
    pub activity_id: Option<String>,
    pub activity_name: Option<String>,
    pub instructions: Option<String>,
    pub display: String,
    pub running: bool,
    pub elapsed_secs: u64,
    pub target_secs: u64,
    /// Pre-fill for the log form: elapsed minutes rounded up, or the
    /// recommended duration when nothing has elapsed.
    pub prefill_minutes: u32,
    /// True exactly once, on the poll after the timer reached its target.
    pub completion_cue: bool,
    pub completed: Vec<String>,
}

/// Builds the status snapshot and consumes a pending completion cue.
pub fn status(tracker: &mut Tracker) -> TrackerStatus {
    let completed = tracker.completed.iter().cloned().collect();
    match tracker.session.as_mut() {
        Some(session) => {
            let act = activity(&session.activity_id);
            let cue = std::mem::take(&mut session.cue_pending);
            let prefill = if session.timer.elapsed_secs() > 0 {
                session.timer.logged_minutes()
            } else {
                act.map(|a| a.minutes).unwrap_or(0)
            };
            TrackerStatus {
                open: true,
                activity_id: Some(session.activity_id.clone()),
                activity_name: act.map(|a| a.name.to_string()),
                instructions: act.map(|a| a.instructions.to_string()),
                display: session.timer.display(),
                running: session.timer.is_running(),
                elapsed_secs: session.timer.elapsed_secs(),
                target_secs: session.timer.target_secs(),
                prefill_minutes: prefill,
                completion_cue: cue,
                completed,
            }
        }
        None => TrackerStatus {
            open: false,
            activity_id: None,
            activity_name: None,
            instructions: None,
            display: "00:00".to_string(),
            running: false,
            elapsed_secs: 0,
            target_secs: 0,
            prefill_minutes: 0,
            completion_cue: false,
            completed,
        },
    }
}

/// Opens a session for the activity, replacing (and stopping) any previous one.
pub fn start_activity(tracker: &mut Tracker, activity: &Activity) {
    tracker.close_session();
    tracker.session = Some(TrackerSession::new(activity));
}

/// Flips run/pause. While running, a one-second interval task owned by the
/// session drives the timer; pausing aborts it.
pub async fn toggle_timer(shared: &Arc<Mutex<Tracker>>) {
    let spawn_ticker = {
        let mut tracker = shared.lock().await;
        match tracker.session.as_mut() {
            Some(session) => {
                let running = session.timer.toggle();
                if !running {
                    session.stop_ticker();
                }
                running
            }
            None => false,
        }
    };

    if spawn_ticker {
        let handle = tokio::spawn(run_ticker(Arc::clone(shared)));
        let mut tracker = shared.lock().await;
        match tracker.session.as_mut() {
            Some(session) if session.timer.is_running() => {
                session.stop_ticker();
                session.ticker = Some(handle);
            }
            // Session paused or closed between the locks; drop the task.
            _ => handle.abort(),
        }
    }
}

async fn run_ticker(shared: Arc<Mutex<Tracker>>) {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    interval.tick().await; // first tick resolves immediately
    loop {
        interval.tick().await;
        let mut tracker = shared.lock().await;
        let Some(session) = tracker.session.as_mut() else {
            return;
        };
        if !session.timer.is_running() {
            return;
        }
        if session.timer.tick() {
            session.cue_pending = true;
            info!(activity = %session.activity_id, "activity timer reached its target");
        }
    }
}

pub async fn reset_timer(shared: &Arc<Mutex<Tracker>>) {
    let mut tracker = shared.lock().await;
    if let Some(session) = tracker.session.as_mut() {
        session.stop_ticker();
        session.timer.reset();
        session.cue_pending = false;
    }
}

/// Assembles the workout record to post. Duration precedence: ceil of the
/// elapsed timer when one ran for this activity, else the manually entered
/// minutes, else the recommended duration.
pub fn build_log_entry(
    act: &Activity,
    patient_id: &str,
    timer_minutes: Option<u32>,
    manual_minutes: Option<u32>,
    timestamp: DateTime<Utc>,
) -> NewWorkout {
    let duration = timer_minutes
        .filter(|m| *m > 0)
        .or(manual_minutes.filter(|m| *m > 0))
        .unwrap_or(act.minutes);
    NewWorkout {
        patient_id: patient_id.to_string(),
        activity_name: act.name.to_string(),
        category: act.category.to_string(),
        duration,
        frequency: act.frequency.to_string(),
        instructions: Some(act.instructions.to_string()),
        timestamp,
    }
}
