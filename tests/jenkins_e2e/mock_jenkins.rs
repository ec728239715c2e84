//! Mock Jenkins for E2E tests.
//!
//! Starts an in-process HTTP server answering the Allure export reads, the
//! job-list probe and the login page. Each read can be scripted per build.

use actix_web::{App, HttpRequest, HttpResponse, HttpServer, get, http::header, web};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How the mock answers one read.
#[derive(Clone, Debug)]
pub enum Reply {
    Json(Value),
    /// Answer after a delay, to trip the client's request timeout
    Delayed(Duration, Value),
    Status(u16),
    /// Expired-session behaviour: 302 to the login page
    LoginRedirect,
    Garbage,
}

/// Scripted answers for one build.
#[derive(Clone, Debug)]
pub struct MockBuild {
    pub summary: Reply,
    pub results: Reply,
}

impl MockBuild {
    pub fn ok(summary: Value, results: Value) -> Self {
        Self {
            summary: Reply::Json(summary),
            results: Reply::Json(results),
        }
    }

    pub fn both(reply: Reply) -> Self {
        Self {
            summary: reply.clone(),
            results: reply,
        }
    }
}

/// Shared state for the mock Jenkins.
#[derive(Default)]
pub struct MockJenkinsState {
    /// Session value the mock accepts; `None` accepts anything
    pub session: Option<String>,
    pub builds: HashMap<(String, u64), MockBuild>,
    pub jobs: Vec<String>,
    /// Request count per path
    pub hits: HashMap<String, usize>,
    /// Cookie headers seen, in arrival order
    pub cookies: Vec<Option<String>>,
}

fn session_accepted(state: &MockJenkinsState, req: &HttpRequest) -> bool {
    let Some(expected) = state.session.as_ref() else {
        return true;
    };
    req.headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|c| c.split(';').any(|p| p.trim() == format!("JSESSIONID={}", expected)))
}

fn record_hit(state: &mut MockJenkinsState, req: &HttpRequest) {
    *state.hits.entry(req.path().to_string()).or_default() += 1;
    state.cookies.push(
        req.headers()
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    );
}

async fn render(reply: Reply) -> HttpResponse {
    match reply {
        Reply::Json(body) => HttpResponse::Ok().json(body),
        Reply::Delayed(delay, body) => {
            tokio::time::sleep(delay).await;
            HttpResponse::Ok().json(body)
        }
        Reply::Status(code) => HttpResponse::build(
            actix_web::http::StatusCode::from_u16(code).unwrap(),
        )
        .body("mock error"),
        Reply::LoginRedirect => HttpResponse::Found()
            .insert_header((header::LOCATION, "/login?from=%2F"))
            .finish(),
        Reply::Garbage => HttpResponse::Ok()
            .content_type("application/json")
            .body("<html>not json</html>"),
    }
}

#[get("/job/{job}/{number}/allure-results/api/rs/allure2/export/{file}")]
async fn allure_export(
    req: HttpRequest,
    path: web::Path<(String, u64, String)>,
    state: web::Data<Arc<Mutex<MockJenkinsState>>>,
) -> HttpResponse {
    let (job, number, file) = path.into_inner();
    let reply = {
        let mut state = state.lock().unwrap();
        record_hit(&mut state, &req);
        if !session_accepted(&state, &req) {
            Reply::LoginRedirect
        } else {
            match state.builds.get(&(job, number)) {
                None => Reply::Status(404),
                Some(build) => match file.as_str() {
                    "summary.json" => build.summary.clone(),
                    "testresult.json" => build.results.clone(),
                    _ => Reply::Status(404),
                },
            }
        }
    };
    render(reply).await
}

#[get("/api/json")]
async fn job_list(
    req: HttpRequest,
    state: web::Data<Arc<Mutex<MockJenkinsState>>>,
) -> HttpResponse {
    let mut state = state.lock().unwrap();
    record_hit(&mut state, &req);
    if !session_accepted(&state, &req) {
        return HttpResponse::Forbidden().body("Authentication required");
    }
    let jobs: Vec<Value> = state.jobs.iter().map(|name| json!({ "name": name })).collect();
    HttpResponse::Ok().json(json!({ "jobs": jobs }))
}

#[get("/login")]
async fn login_page() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html")
        .body("<html><body>Sign in to Jenkins</body></html>")
}

/// Mock Jenkins serving Allure exports.
pub struct MockJenkins {
    pub base_url: String,
    pub state: Arc<Mutex<MockJenkinsState>>,
}

impl MockJenkins {
    /// Start the mock on an ephemeral port, accepting `session` only.
    pub async fn start(session: Option<&str>) -> Self {
        let state = Arc::new(Mutex::new(MockJenkinsState {
            session: session.map(str::to_string),
            ..Default::default()
        }));

        let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind");
        let port = listener.local_addr().unwrap().port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let state_data = state.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(state_data.clone()))
                .service(allure_export)
                .service(job_list)
                .service(login_page)
        })
        .workers(2)
        .listen(listener)
        .expect("failed to listen")
        .disable_signals()
        .run();

        // Lives for the rest of the test runtime
        tokio::spawn(server);

        MockJenkins { base_url, state }
    }

    /// Script the answers for one build.
    pub fn set_build(&self, job: &str, number: u64, build: MockBuild) {
        let mut state = self.state.lock().unwrap();
        state.builds.insert((job.to_string(), number), build);
        if !state.jobs.iter().any(|j| j == job) {
            state.jobs.push(job.to_string());
        }
    }

    /// Change the session the mock accepts, as if the old one expired.
    pub fn rotate_session(&self, session: &str) {
        self.state.lock().unwrap().session = Some(session.to_string());
    }

    /// Number of requests that hit `path`.
    pub fn hits(&self, path: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .hits
            .get(path)
            .copied()
            .unwrap_or(0)
    }

    pub fn cookies_seen(&self) -> Vec<Option<String>> {
        self.state.lock().unwrap().cookies.clone()
    }

    /// Canonical build URL on this mock.
    pub fn build_url(&self, job: &str, number: u64) -> String {
        format!("{}/job/{}/{}/", self.base_url, job, number)
    }
}
