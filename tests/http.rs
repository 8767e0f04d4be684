use reqwest::Client;
use serde_json::json;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct TestApp {
    base_url: String,
    upstream: MockServer,
    child: Child,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[cfg(unix)]
mod cleanup {
    use once_cell::sync::Lazy;
    use std::sync::{Mutex, Once};

    static REGISTER: Once = Once::new();
    static PIDS: Lazy<Mutex<Vec<i32>>> = Lazy::new(|| Mutex::new(Vec::new()));

    pub fn register(pid: u32) {
        REGISTER.call_once(|| unsafe {
            libc::atexit(on_exit);
        });
        PIDS.lock().unwrap().push(pid as i32);
    }

    extern "C" fn on_exit() {
        for pid in PIDS.lock().unwrap().iter() {
            if *pid > 0 {
                unsafe {
                    libc::kill(*pid, libc::SIGTERM);
                }
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_draft_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!(
        "rehab_dashboard_draft_{}_{}.json",
        std::process::id(),
        nanos
    ));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client
            .get(format!("{base_url}/api/tracker/status"))
            .send()
            .await
        {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_app() -> TestApp {
    spawn_app_with_draft(&unique_draft_path()).await
}

async fn spawn_app_with_draft(draft_path: &str) -> TestApp {
    let upstream = MockServer::start().await;
    let port = pick_free_port();
    let child = Command::new(env!("CARGO_BIN_EXE_rehab_dashboard"))
        .env("PORT", port.to_string())
        .env("API_BASE_URL", format!("{}/api", upstream.uri()))
        .env("DRAFT_PATH", draft_path)
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestApp {
        base_url,
        upstream,
        child,
    }
}

async fn mount_patients(app: &TestApp) {
    Mock::given(method("GET"))
        .and(path("/api/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "1", "name": "Amira", "age": 6 },
            { "id": "2", "name": "Ben", "age": 8 }
        ])))
        .mount(&app.upstream)
        .await;
}

#[tokio::test]
async fn dashboard_renders_kpis_and_charts_from_upstream() {
    let app = spawn_app().await;
    mount_patients(&app).await;
    Mock::given(method("GET"))
        .and(path("/api/stats/dashboard"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "activePatients": 3,
            "todaysAssessments": 1,
            "averageProgress": 68,
            "homeWorkouts": 9
        })))
        .mount(&app.upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/charts/dashboard/progress"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "labels": ["Mar 01", "Mar 02", "Mar 03"],
            "data": [40.0, 55.0, 62.0]
        })))
        .mount(&app.upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/charts/dashboard/skills"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "labels": ["Fine Motor", "Gross Motor"],
            "data": [70.0, 30.0]
        })))
        .mount(&app.upstream)
        .await;

    let body = Client::new()
        .get(&app.base_url)
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(body.contains("Active Patients"));
    assert!(body.contains(">68%<"));
    assert!(body.contains("Amira"));
    assert!(body.contains("chart-point"));
    assert!(body.contains("chart-slice"));
}

#[tokio::test]
async fn dashboard_degrades_when_upstream_is_down() {
    let app = spawn_app().await;
    // nothing mounted: every upstream call 404s

    let response = Client::new().get(&app.base_url).send().await.unwrap();
    assert!(response.status().is_success());
    let body = response.text().await.unwrap();
    assert!(body.contains("--"));
    assert!(body.contains("No data yet"));
}

#[tokio::test]
async fn tracker_timer_runs_pauses_and_resets() {
    let app = spawn_app().await;
    let client = Client::new();

    let status: serde_json::Value = client
        .post(format!("{}/api/tracker/start", app.base_url))
        .form(&[("activity_id", "bead-threading")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["open"], json!(true));
    assert_eq!(status["display"], json!("00:00"));
    assert_eq!(status["target_secs"], json!(600));
    assert_eq!(status["prefill_minutes"], json!(10));

    let status: serde_json::Value = client
        .post(format!("{}/api/tracker/toggle", app.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["running"], json!(true));

    sleep(Duration::from_millis(2300)).await;

    let status: serde_json::Value = client
        .post(format!("{}/api/tracker/toggle", app.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["running"], json!(false));
    let elapsed = status["elapsed_secs"].as_u64().unwrap();
    assert!((1..=4).contains(&elapsed), "elapsed was {elapsed}");

    // paused timer must not advance
    sleep(Duration::from_millis(1200)).await;
    let status: serde_json::Value = client
        .get(format!("{}/api/tracker/status", app.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["elapsed_secs"].as_u64().unwrap(), elapsed);

    let status: serde_json::Value = client
        .post(format!("{}/api/tracker/reset", app.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["display"], json!("00:00"));
    assert_eq!(status["running"], json!(false));
}

#[tokio::test]
async fn logging_a_workout_posts_upstream_and_marks_the_badge() {
    let app = spawn_app().await;
    mount_patients(&app).await;
    Mock::given(method("POST"))
        .and(path("/api/workouts"))
        .and(body_partial_json(json!({
            "patientId": "1",
            "activityName": "Bead Threading",
            "category": "fine-motor",
            "duration": 7
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Workout saved successfully",
            "id": "WORK_1"
        })))
        .expect(1)
        .mount(&app.upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/workouts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "patientId": "1",
            "activityName": "Bead Threading",
            "category": "fine-motor",
            "duration": 7,
            "frequency": "daily",
            "timestamp": "2026-03-02T09:00:00Z"
        }])))
        .mount(&app.upstream)
        .await;

    let client = Client::new();
    let response = client
        .post(format!("{}/tracker/log", app.base_url))
        .form(&[
            ("activity_id", "bead-threading"),
            ("patient_id", "1"),
            ("duration", "7"),
        ])
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let page = response.text().await.unwrap();
    assert!(page.contains("Completed"));

    let status: serde_json::Value = client
        .get(format!("{}/api/tracker/status", app.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(status["completed"]
        .as_array()
        .unwrap()
        .contains(&json!("bead-threading")));
}

#[tokio::test]
async fn workout_csv_exports_cached_log_newest_first() {
    let app = spawn_app().await;
    mount_patients(&app).await;
    Mock::given(method("GET"))
        .and(path("/api/workouts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "patientId": "1",
                "activityName": "Bead Threading",
                "category": "fine-motor",
                "duration": 10,
                "frequency": "daily",
                "timestamp": "2026-03-01T09:00:00Z"
            },
            {
                "patientId": "1",
                "activityName": "Balance Beam Walk",
                "category": "gross-motor",
                "duration": 15,
                "frequency": "daily",
                "timestamp": "2026-03-02T09:00:00Z"
            }
        ])))
        .mount(&app.upstream)
        .await;

    let client = Client::new();
    // visiting the page fills the cache the export reads from
    client
        .get(format!("{}/tracker?patientId=1", app.base_url))
        .send()
        .await
        .unwrap();

    let csv = client
        .get(format!("{}/tracker/export.csv", app.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    let lines: Vec<&str> = csv.trim_end().lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("\"Date\""));
    assert!(lines[1].contains("Balance Beam Walk"));
    assert!(lines[2].contains("Bead Threading"));
}

#[tokio::test]
async fn assessment_submit_posts_flat_payload_and_reports_score() {
    let app = spawn_app().await;
    mount_patients(&app).await;
    Mock::given(method("POST"))
        .and(path("/api/assessments"))
        .and(body_partial_json(json!({
            "patientId": "1",
            "fineMotor_grip": 4
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Assessment saved successfully",
            "id": "ASSESS_1",
            "score": 80
        })))
        .expect(1)
        .mount(&app.upstream)
        .await;

    let client = Client::new();
    client
        .post(format!("{}/assessment/select", app.base_url))
        .form(&[("patient_id", "1")])
        .send()
        .await
        .unwrap();

    let scored = [
        "fineMotor_grip",
        "fineMotor_beads",
        "grossMotor_balance",
        "cognitive_approach",
        "cognitive_memory",
        "sensory_behavior",
        "emotional_quality",
        "communication_clarity",
        "communication_grammar",
        "social_interaction",
        "adl_independence",
        "attention_span",
    ];
    let form: Vec<(&str, &str)> = scored.iter().map(|k| (*k, "4")).collect();

    let response = client
        .post(format!("{}/assessment/submit", app.base_url))
        .form(&form)
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let page = response.text().await.unwrap();
    assert!(page.contains("Assessment saved successfully (score 80%)"));
}

#[tokio::test]
async fn assessment_draft_survives_a_restart() {
    let draft_path = unique_draft_path();
    {
        let app = spawn_app_with_draft(&draft_path).await;
        let saved: serde_json::Value = Client::new()
            .post(format!("{}/api/assessment/field", app.base_url))
            .json(&json!({ "key": "fineMotor_grip", "value": "3" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(saved["error"], json!(null));
        assert_eq!(saved["score"], json!(60));
    }

    let app = spawn_app_with_draft(&draft_path).await;
    mount_patients(&app).await;
    let page = Client::new()
        .post(format!("{}/assessment/select", app.base_url))
        .form(&[("patient_id", "1")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("name=\"fineMotor_grip\" min=\"0\" max=\"5\" value=\"3\""));
    let _ = std::fs::remove_file(&draft_path);
}

#[tokio::test]
async fn corrupt_draft_file_starts_with_an_empty_form() {
    let draft_path = unique_draft_path();
    std::fs::write(&draft_path, b"{these are not fields").unwrap();

    // readiness alone proves startup tolerated the bad file
    let app = spawn_app_with_draft(&draft_path).await;
    mount_patients(&app).await;
    let page = Client::new()
        .post(format!("{}/assessment/select", app.base_url))
        .form(&[("patient_id", "1")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("name=\"fineMotor_grip\" min=\"0\" max=\"5\" value=\"\""));
    let _ = std::fs::remove_file(&draft_path);
}

#[tokio::test]
async fn report_generation_falls_back_to_text_download() {
    let app = spawn_app().await;
    Mock::given(method("POST"))
        .and(path("/api/reports/generate"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "content": "Weekly summary body" })),
        )
        .mount(&app.upstream)
        .await;

    let response = Client::new()
        .post(format!("{}/reports/generate", app.base_url))
        .form(&[("report_type", "weekly"), ("format", "text")])
        .send()
        .await
        .unwrap();

    assert!(response.status().is_success());
    let disposition = response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("report_weekly_all.txt"));
    assert_eq!(response.text().await.unwrap(), "Weekly summary body");
}

#[tokio::test]
async fn report_generation_passes_pdf_through() {
    let app = spawn_app().await;
    let pdf_bytes = b"%PDF-1.4 fake".to_vec();
    Mock::given(method("POST"))
        .and(path("/api/reports/generate"))
        .and(body_partial_json(json!({ "reportType": "daily", "format": "pdf" })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(pdf_bytes.clone()),
        )
        .mount(&app.upstream)
        .await;

    let response = Client::new()
        .post(format!("{}/reports/generate", app.base_url))
        .form(&[
            ("patient_id", "12"),
            ("report_type", "daily"),
            ("format", "pdf"),
        ])
        .send()
        .await
        .unwrap();

    assert!(response.status().is_success());
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/pdf"
    );
    let disposition = response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("report_daily_12.pdf"));
    assert_eq!(response.bytes().await.unwrap().to_vec(), pdf_bytes);
}
