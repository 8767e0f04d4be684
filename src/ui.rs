use crate::assessment::{compute_score, AssessmentForm, FieldKind, Phase, FIELDS};
use crate::charts::escape;
use crate::models::{
    AssessmentRecord, DashboardStats, Patient, SessionRow, SkillPerformanceRow, Workout,
};
use crate::reports::{status_class, ReportFilters, REPORT_TYPES};
use crate::tracker::{Activity, ACTIVITIES};
use std::collections::BTreeSet;
use std::fmt::Write;

pub fn render_dashboard(
    patients: &[Patient],
    selected: Option<&str>,
    stats: Option<&DashboardStats>,
    recent: &[AssessmentRecord],
    progress_svg: &str,
    skills_svg: &str,
) -> String {
    let body = DASHBOARD_HTML
        .replace("{{PATIENT_OPTIONS}}", &patient_options(patients, selected))
        .replace("{{KPI_CARDS}}", &kpi_cards(stats))
        .replace("{{RECENT_ROWS}}", &recent_assessment_rows(recent))
        .replace("{{PROGRESS_CHART}}", progress_svg)
        .replace("{{SKILLS_CHART}}", skills_svg);
    page("Dashboard", "/", &body)
}

pub fn render_tracker(
    patients: &[Patient],
    selected: Option<&str>,
    completed: &BTreeSet<String>,
    log: &[Workout],
) -> String {
    let body = TRACKER_HTML
        .replace("{{PATIENT_OPTIONS}}", &patient_options(patients, selected))
        .replace("{{ACTIVITY_CARDS}}", &activity_cards(completed))
        .replace("{{LOG_ROWS}}", &workout_rows(log))
        .replace("{{SELECTED_PATIENT}}", &escape(selected.unwrap_or("")));
    page("Home Workouts", "/tracker", &body)
}

pub fn render_assessment(patients: &[Patient], form: &AssessmentForm) -> String {
    let message = match (&form.message, form.phase) {
        (Some(msg), Phase::Failed) => {
            format!("<div class=\"status\" data-type=\"error\">{}</div>", escape(msg))
        }
        (Some(msg), _) => {
            format!("<div class=\"status\" data-type=\"ok\">{}</div>", escape(msg))
        }
        (None, _) => String::new(),
    };
    let form_html = if form.patient_id.is_some() {
        assessment_form(form)
    } else {
        "<p class=\"hint\">Select a patient to begin an assessment.</p>".to_string()
    };
    let body = ASSESSMENT_HTML
        .replace(
            "{{PATIENT_OPTIONS}}",
            &patient_options(patients, form.patient_id.as_deref()),
        )
        .replace("{{MESSAGE}}", &message)
        .replace("{{FORM}}", &form_html);
    page("Assessment", "/assessment", &body)
}

pub fn render_reports(
    patients: &[Patient],
    filters: &ReportFilters,
    skills: &[SkillPerformanceRow],
    sessions: &[SessionRow],
    weekly_svg: &str,
    distribution_svg: &str,
) -> String {
    let body = REPORTS_HTML
        .replace(
            "{{PATIENT_OPTIONS}}",
            &patient_options(patients, filters.patient()),
        )
        .replace("{{TYPE_OPTIONS}}", &report_type_options(filters.report_type()))
        .replace("{{SKILL_ROWS}}", &skill_rows(skills))
        .replace("{{SESSION_ROWS}}", &session_rows(sessions))
        .replace("{{WEEKLY_CHART}}", weekly_svg)
        .replace("{{DISTRIBUTION_CHART}}", distribution_svg)
        .replace("{{SELECTED_PATIENT}}", &escape(filters.patient().unwrap_or("")));
    page("Reports", "/reports", &body)
}

fn page(title: &str, active: &str, body: &str) -> String {
    let nav: String = [
        ("/", "Dashboard"),
        ("/tracker", "Home Workouts"),
        ("/assessment", "Assessment"),
        ("/reports", "Reports"),
    ]
    .iter()
    .map(|(href, label)| {
        let class = if *href == active { " class=\"active\"" } else { "" };
        format!("<a href=\"{href}\"{class}>{label}</a>")
    })
    .collect();

    LAYOUT_HTML
        .replace("{{TITLE}}", &escape(title))
        .replace("{{NAV}}", &nav)
        .replace("{{BODY}}", body)
}

fn patient_options(patients: &[Patient], selected: Option<&str>) -> String {
    let mut html = String::from("<option value=\"\">All patients</option>");
    for patient in patients {
        let sel = if Some(patient.id.as_str()) == selected {
            " selected"
        } else {
            ""
        };
        let age = patient
            .age
            .map(|a| format!(" ({a})"))
            .unwrap_or_default();
        let _ = write!(
            html,
            "<option value=\"{}\"{sel}>{}{age}</option>",
            escape(&patient.id),
            escape(&patient.name)
        );
    }
    html
}

fn report_type_options(selected: &str) -> String {
    REPORT_TYPES
        .iter()
        .map(|(value, label)| {
            let sel = if *value == selected { " selected" } else { "" };
            format!("<option value=\"{value}\"{sel}>{label}</option>")
        })
        .collect()
}

fn kpi_cards(stats: Option<&DashboardStats>) -> String {
    let value = |v: Option<u64>, suffix: &str| match v {
        Some(v) => format!("{v}{suffix}"),
        None => "--".to_string(),
    };
    let cards = [
        ("Active Patients", value(stats.map(|s| s.active_patients), "")),
        (
            "Today's Assessments",
            value(stats.map(|s| s.todays_assessments), ""),
        ),
        (
            "Average Progress",
            value(stats.map(|s| s.average_progress), "%"),
        ),
        ("Home Workouts", value(stats.map(|s| s.home_workouts), "")),
    ];
    cards
        .iter()
        .map(|(label, val)| {
            format!(
                "<div class=\"stat\"><span class=\"label\">{label}</span><span class=\"value\">{val}</span></div>"
            )
        })
        .collect()
}

fn recent_assessment_rows(recent: &[AssessmentRecord]) -> String {
    if recent.is_empty() {
        return "<tr><td colspan=\"3\" class=\"hint\">No assessments recorded yet.</td></tr>"
            .to_string();
    }
    recent
        .iter()
        .map(|record| {
            let who = record
                .patient_name
                .as_deref()
                .unwrap_or(record.patient_id.as_str());
            let who = match record.patient_age {
                Some(age) => format!("{} ({age})", escape(who)),
                None => escape(who),
            };
            format!(
                "<tr><td>{}</td><td>{who}</td><td>{}%</td></tr>",
                record.timestamp.format("%Y-%m-%d"),
                compute_score(&record.data)
            )
        })
        .collect()
}

fn activity_cards(completed: &BTreeSet<String>) -> String {
    let mut html = String::new();
    for activity in ACTIVITIES {
        html.push_str(&activity_card(activity, completed.contains(activity.id)));
    }
    html
}

fn activity_card(activity: &Activity, done: bool) -> String {
    let badge = if done {
        "<span class=\"badge ok\">Completed</span>"
    } else {
        "<span class=\"badge\">Pending</span>"
    };
    format!(
        "<div class=\"card activity\" data-activity=\"{id}\">\
         <div class=\"card-head\"><h3>{name}</h3>{badge}</div>\
         <p class=\"hint\">{category} &middot; {minutes} min &middot; {frequency}</p>\
         <button type=\"button\" class=\"btn-start\" data-activity=\"{id}\">Start activity</button>\
         </div>",
        id = activity.id,
        name = escape(activity.name),
        category = activity.category,
        minutes = activity.minutes,
        frequency = activity.frequency,
    )
}

fn workout_rows(log: &[Workout]) -> String {
    if log.is_empty() {
        return "<tr><td colspan=\"5\" class=\"hint\">No workouts logged yet.</td></tr>".to_string();
    }
    let mut rows: Vec<&Workout> = log.iter().collect();
    rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    rows.iter()
        .map(|w| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{} min</td><td>{}</td></tr>",
                w.timestamp.format("%Y-%m-%d %H:%M"),
                escape(&w.activity_name),
                w.category,
                w.duration,
                escape(&w.frequency)
            )
        })
        .collect()
}

fn skill_rows(rows: &[SkillPerformanceRow]) -> String {
    if rows.is_empty() {
        return "<tr><td colspan=\"5\" class=\"hint\">No assessment data yet.</td></tr>".to_string();
    }
    rows.iter()
        .map(|r| {
            format!(
                "<tr><td>{}</td><td>{}%</td><td>{}%</td><td>{}%</td><td><span class=\"{}\">{}</span></td></tr>",
                escape(&r.skill),
                r.current,
                r.previous,
                r.goal,
                status_class(&r.status),
                escape(&r.status)
            )
        })
        .collect()
}

fn session_rows(rows: &[SessionRow]) -> String {
    if rows.is_empty() {
        return "<tr><td colspan=\"6\" class=\"hint\">No sessions recorded yet.</td></tr>".to_string();
    }
    rows.iter()
        .map(|s| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{} min</td><td>{}</td><td>{}%</td><td>{}</td></tr>",
                escape(&s.date),
                escape(&s.patient),
                s.duration,
                escape(&s.activities),
                s.score,
                escape(&s.notes)
            )
        })
        .collect()
}

fn assessment_form(form: &AssessmentForm) -> String {
    let mut sections: Vec<&str> = Vec::new();
    for spec in FIELDS {
        if !sections.contains(&spec.section) {
            sections.push(spec.section);
        }
    }

    let mut html = String::from("<form method=\"post\" action=\"/assessment/submit\" class=\"assessment\">");
    for section in sections {
        let _ = write!(html, "<fieldset><legend>{section}</legend>");
        for spec in FIELDS.iter().filter(|f| f.section == section) {
            let value = form
                .fields
                .get(spec.key)
                .map(|v| escape(v))
                .unwrap_or_default();
            let required = if spec.required { " required" } else { "" };
            match spec.kind {
                FieldKind::Score => {
                    let _ = write!(
                        html,
                        "<label>{label}<input type=\"number\" name=\"{key}\" min=\"0\" max=\"5\" value=\"{value}\" data-field=\"{key}\"{required} /></label>",
                        label = spec.label,
                        key = spec.key,
                    );
                }
                FieldKind::Number { min, max } => {
                    let _ = write!(
                        html,
                        "<label>{label}<input type=\"number\" name=\"{key}\" min=\"{min}\" max=\"{max}\" value=\"{value}\" data-field=\"{key}\"{required} /></label>",
                        label = spec.label,
                        key = spec.key,
                    );
                }
                FieldKind::Text => {
                    let _ = write!(
                        html,
                        "<label class=\"wide\">{label}<textarea name=\"{key}\" data-field=\"{key}\">{value}</textarea></label>",
                        label = spec.label,
                        key = spec.key,
                    );
                }
            }
        }
        html.push_str("</fieldset>");
    }
    let _ = write!(
        html,
        "<div class=\"form-foot\"><span class=\"hint\">Current score: <strong id=\"live-score\">{}%</strong></span>\
         <button type=\"submit\">Save assessment</button></div></form>",
        form.current_score()
    );
    html
}

const LAYOUT_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}} - Therapy Home Dashboard</title>
  <style>
    :root {
      --bg-1: #f8f3e6;
      --ink: #2b2a28;
      --accent: #ff6b4a;
      --accent-2: #2f4858;
      --card: #ffffff;
      --shadow: 0 16px 40px rgba(47, 72, 88, 0.12);
    }
    * { box-sizing: border-box; }
    body {
      margin: 0; min-height: 100vh; background: var(--bg-1); color: var(--ink);
      font-family: "Trebuchet MS", "Segoe UI", sans-serif; padding: 24px 18px 48px;
    }
    nav { display: flex; gap: 10px; max-width: 960px; margin: 0 auto 20px; }
    nav a {
      text-decoration: none; color: var(--accent-2); font-weight: 600;
      padding: 8px 16px; border-radius: 999px; background: rgba(47, 72, 88, 0.08);
    }
    nav a.active { background: var(--accent-2); color: white; }
    main.app { max-width: 960px; margin: 0 auto; display: grid; gap: 20px; }
    h1 { margin: 0; font-size: 1.8rem; }
    h2 { margin: 0 0 10px; font-size: 1.2rem; }
    .panel { display: grid; grid-template-columns: repeat(auto-fit, minmax(180px, 1fr)); gap: 14px; }
    .card, .stat {
      background: var(--card); border-radius: 16px; padding: 16px;
      border: 1px solid rgba(47, 72, 88, 0.08); box-shadow: var(--shadow);
    }
    .stat .label { display: block; font-size: 0.8rem; text-transform: uppercase; letter-spacing: 0.1em; color: #8b857d; }
    .stat .value { display: block; font-size: 1.6rem; font-weight: 600; color: var(--accent-2); }
    .card-head { display: flex; justify-content: space-between; align-items: center; gap: 8px; }
    .card-head h3 { margin: 0; font-size: 1rem; }
    .badge { font-size: 0.75rem; padding: 3px 10px; border-radius: 999px; background: rgba(47, 72, 88, 0.12); color: var(--accent-2); }
    .badge.ok { background: #d9efe0; color: #2d7a4b; }
    .badge.info { background: #dcebf6; color: #2f6690; }
    .badge.warn { background: #fbe3d9; color: #c63b2b; }
    button {
      appearance: none; border: none; border-radius: 999px; padding: 10px 18px;
      font-weight: 600; cursor: pointer; background: var(--accent); color: white;
    }
    button.secondary { background: var(--accent-2); }
    form.inline { display: flex; flex-wrap: wrap; gap: 10px; align-items: end; }
    label { display: grid; gap: 4px; font-size: 0.85rem; color: #5f5c57; }
    input, select, textarea {
      font: inherit; padding: 8px 10px; border-radius: 10px;
      border: 1px solid rgba(47, 72, 88, 0.25); background: white;
    }
    table { width: 100%; border-collapse: collapse; font-size: 0.9rem; }
    th, td { text-align: left; padding: 8px 10px; border-bottom: 1px solid rgba(47, 72, 88, 0.1); }
    th { font-size: 0.78rem; text-transform: uppercase; letter-spacing: 0.08em; color: #8b857d; }
    .hint { color: #6f6a65; font-size: 0.9rem; margin: 0; }
    .status { font-size: 0.95rem; min-height: 1.2em; }
    .status[data-type="error"] { color: #c63b2b; }
    .status[data-type="ok"] { color: #2d7a4b; }
    .chart { width: 100%; height: auto; display: block; }
    .chart-line { fill: none; stroke: var(--accent); stroke-width: 3; }
    .chart-point { fill: white; stroke: var(--accent); stroke-width: 2; }
    .chart-grid { stroke: rgba(47, 72, 88, 0.12); }
    .chart-axis { stroke: rgba(47, 72, 88, 0.25); stroke-dasharray: 4 6; }
    .chart-label { fill: #7a746d; font-size: 11px; }
    .chart-slice { stroke: white; stroke-width: 1; }
    #timer-modal { display: none; }
    #timer-modal.open { display: block; }
    .timer-display { font-size: 2.6rem; font-weight: 700; color: var(--accent-2); letter-spacing: 0.08em; }
    fieldset { border: 1px solid rgba(47, 72, 88, 0.15); border-radius: 12px; display: grid; gap: 10px; grid-template-columns: repeat(auto-fit, minmax(210px, 1fr)); }
    legend { font-weight: 600; color: var(--accent-2); padding: 0 6px; }
    .form-foot { display: flex; justify-content: space-between; align-items: center; margin-top: 12px; }
    .toolbar { display: flex; gap: 10px; align-items: center; flex-wrap: wrap; }
    a.plain { color: var(--accent-2); font-weight: 600; }
  </style>
</head>
<body>
  <nav>{{NAV}}</nav>
  <main class="app">{{BODY}}</main>
</body>
</html>
"#;

const DASHBOARD_HTML: &str = r#"<header><h1>Therapy Dashboard</h1></header>
<form class="inline" method="get" action="/">
  <label>Patient filter
    <select name="patientId" onchange="this.form.submit()">{{PATIENT_OPTIONS}}</select>
  </label>
</form>
<section class="panel">{{KPI_CARDS}}</section>
<section class="panel" style="grid-template-columns: 1fr 1fr;">
  <div class="card"><h2>Progress (last 7 days)</h2>{{PROGRESS_CHART}}</div>
  <div class="card"><h2>Skill breakdown</h2>{{SKILLS_CHART}}</div>
</section>
<section class="card">
  <h2>Recent assessments</h2>
  <table>
    <thead><tr><th>Date</th><th>Patient</th><th>Score</th></tr></thead>
    <tbody>{{RECENT_ROWS}}</tbody>
  </table>
</section>
<section class="card">
  <h2>Register patient</h2>
  <form class="inline" method="post" action="/patients">
    <label>Name <input name="name" required /></label>
    <label>Age <input name="age" type="number" min="0" max="18" /></label>
    <button type="submit">Add patient</button>
  </form>
</section>
"#;

const TRACKER_HTML: &str = r#"<header><h1>Home Workouts</h1></header>
<form class="inline" method="get" action="/tracker">
  <label>Patient
    <select name="patientId" onchange="this.form.submit()">{{PATIENT_OPTIONS}}</select>
  </label>
</form>
<section class="panel">{{ACTIVITY_CARDS}}</section>
<section class="card" id="timer-modal">
  <div class="card-head"><h2 id="timer-activity">Activity</h2><span class="badge" id="timer-state">Paused</span></div>
  <p class="hint" id="timer-instructions"></p>
  <div class="timer-display" id="timer-display">00:00</div>
  <div class="toolbar">
    <button type="button" id="timer-toggle">Start</button>
    <button type="button" class="secondary" id="timer-reset">Reset</button>
  </div>
  <form class="inline" method="post" action="/tracker/log" id="log-form">
    <input type="hidden" name="activity_id" id="log-activity" value="" />
    <input type="hidden" name="patient_id" value="{{SELECTED_PATIENT}}" />
    <label>Minutes <input type="number" name="duration" id="log-duration" min="1" max="240" required /></label>
    <button type="submit">Log activity</button>
  </form>
  <div class="status" id="tracker-status"></div>
</section>
<section class="card">
  <div class="card-head"><h2>Workout log</h2><a class="plain" href="/tracker/export.csv">Export CSV</a></div>
  <table>
    <thead><tr><th>Date</th><th>Activity</th><th>Category</th><th>Duration</th><th>Frequency</th></tr></thead>
    <tbody>{{LOG_ROWS}}</tbody>
  </table>
</section>
<script>
  const modal = document.getElementById('timer-modal');
  const display = document.getElementById('timer-display');
  const stateBadge = document.getElementById('timer-state');
  const toggleBtn = document.getElementById('timer-toggle');
  const statusEl = document.getElementById('tracker-status');

  const applyStatus = (s) => {
    modal.classList.toggle('open', s.open);
    if (!s.open) return;
    document.getElementById('timer-activity').textContent = s.activity_name || '';
    document.getElementById('timer-instructions').textContent = s.instructions || '';
    document.getElementById('log-activity').value = s.activity_id || '';
    document.getElementById('log-duration').value = s.prefill_minutes || 1;
    display.textContent = s.display;
    stateBadge.textContent = s.running ? 'Running' : 'Paused';
    toggleBtn.textContent = s.running ? 'Pause' : 'Start';
    if (s.completion_cue) { cue(); }
  };

  const cue = () => {
    try {
      const ctx = new (window.AudioContext || window.webkitAudioContext)();
      const osc = ctx.createOscillator();
      osc.frequency.value = 880;
      osc.connect(ctx.destination);
      osc.start();
      setTimeout(() => { osc.stop(); ctx.close(); }, 400);
    } catch (err) {
      console.log('completion cue unavailable', err);
    }
  };

  const call = async (path, body) => {
    const res = await fetch(path, {
      method: 'POST',
      headers: { 'content-type': 'application/x-www-form-urlencoded' },
      body: body || ''
    });
    if (!res.ok) { throw new Error(await res.text()); }
    applyStatus(await res.json());
  };

  document.querySelectorAll('.btn-start').forEach((btn) => {
    btn.addEventListener('click', () => {
      call('/api/tracker/start', 'activity_id=' + encodeURIComponent(btn.dataset.activity))
        .catch((err) => { statusEl.textContent = err.message; statusEl.dataset.type = 'error'; });
    });
  });
  toggleBtn.addEventListener('click', () => {
    call('/api/tracker/toggle').catch((err) => { statusEl.textContent = err.message; });
  });
  document.getElementById('timer-reset').addEventListener('click', () => {
    call('/api/tracker/reset').catch((err) => { statusEl.textContent = err.message; });
  });

  const poll = async () => {
    try {
      const res = await fetch('/api/tracker/status');
      if (res.ok) { applyStatus(await res.json()); }
    } catch (err) {
      console.log('status poll failed', err);
    }
  };
  poll();
  setInterval(poll, 1000);
</script>
"#;

const ASSESSMENT_HTML: &str = r#"<header><h1>Clinical Assessment</h1></header>
{{MESSAGE}}
<section class="card">
  <form class="inline" method="post" action="/assessment/select">
    <label>Patient
      <select name="patient_id">{{PATIENT_OPTIONS}}</select>
    </label>
    <button type="submit" class="secondary">Select patient</button>
  </form>
</section>
<section class="card">{{FORM}}</section>
<script>
  document.querySelectorAll('[data-field]').forEach((input) => {
    input.addEventListener('input', async () => {
      try {
        const res = await fetch('/api/assessment/field', {
          method: 'POST',
          headers: { 'content-type': 'application/json' },
          body: JSON.stringify({ key: input.dataset.field, value: input.value })
        });
        if (!res.ok) return;
        const body = await res.json();
        const score = document.getElementById('live-score');
        if (score) { score.textContent = body.score + '%'; }
        input.setCustomValidity(body.error || '');
      } catch (err) {
        console.log('draft save failed', err);
      }
    });
  });
</script>
"#;

const REPORTS_HTML: &str = r#"<header><h1>Reports</h1></header>
<form class="inline" method="get" action="/reports">
  <label>Patient
    <select name="patientId">{{PATIENT_OPTIONS}}</select>
  </label>
  <label>Report type
    <select name="type">{{TYPE_OPTIONS}}</select>
  </label>
  <button type="submit" class="secondary">Apply filters</button>
</form>
<section class="panel" style="grid-template-columns: 1fr 1fr;">
  <div class="card"><h2>Weekly activity</h2>{{WEEKLY_CHART}}</div>
  <div class="card"><h2>Activity distribution</h2>{{DISTRIBUTION_CHART}}</div>
</section>
<section class="card">
  <h2>Skill performance</h2>
  <table>
    <thead><tr><th>Skill</th><th>Current</th><th>Previous</th><th>Goal</th><th>Status</th></tr></thead>
    <tbody>{{SKILL_ROWS}}</tbody>
  </table>
</section>
<section class="card">
  <div class="card-head"><h2>Session history</h2><a class="plain" href="/reports/sessions.csv?patientId={{SELECTED_PATIENT}}">Export CSV</a></div>
  <table>
    <thead><tr><th>Date</th><th>Patient</th><th>Duration</th><th>Activities</th><th>Score</th><th>Notes</th></tr></thead>
    <tbody>{{SESSION_ROWS}}</tbody>
  </table>
</section>
<section class="card">
  <h2>Generate report</h2>
  <form class="inline" method="post" action="/reports/generate">
    <input type="hidden" name="patient_id" value="{{SELECTED_PATIENT}}" />
    <label>Report type <select name="report_type">{{TYPE_OPTIONS}}</select></label>
    <label>From <input type="date" name="start_date" /></label>
    <label>To <input type="date" name="end_date" /></label>
    <label>Format
      <select name="format"><option value="pdf">PDF</option><option value="text">Text</option></select>
    </label>
    <button type="submit">Generate</button>
  </form>
</section>
"#;
