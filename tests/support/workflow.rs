//! A stand-in for the workflow under test.
//!
//! Control-plane calls are answered by wiremock and flip patch status at once.
//! Follow-on writes (strategy version, brief, campaign, reflection proposals)
//! are applied later by a background worker, so the harness has to poll for
//! them the same way it does against the real service.

use hitl_harness::HarnessConfig;
use hitl_harness::store::{MemoryStore, PatchFilter, PatchSource, PatchStatus, ProjectStore};
use serde_json::{Value, json};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const WORKER_TICK: Duration = Duration::from_millis(15);

/// Misbehaviours the simulated workflow can be told to exhibit.
#[derive(Debug, Clone, Copy, Default)]
pub struct Behaviour {
    /// Launch two campaigns per approval.
    pub duplicate_campaigns: bool,
    /// Accept approval of a patch that is no longer proposed.
    pub allow_reapprove: bool,
    /// Extra reflection proposals raised once the first reflection is applied.
    pub follow_up_proposals: usize,
}

#[derive(Default)]
struct Progress {
    project_id: Option<String>,
    seeded_strategy: bool,
    runs: u32,
    applied: HashSet<String>,
    reflected: bool,
    followed_up: bool,
}

#[derive(Clone)]
pub struct SimulatedWorkflow {
    store: MemoryStore,
    behaviour: Behaviour,
    progress: Arc<Mutex<Progress>>,
}

/// Routes one endpoint to a workflow handler.
struct Route {
    workflow: SimulatedWorkflow,
    handler: fn(&SimulatedWorkflow, &Request) -> ResponseTemplate,
}

impl Respond for Route {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        (self.handler)(&self.workflow, request)
    }
}

fn body_of(request: &Request) -> Value {
    serde_json::from_slice(&request.body).unwrap_or(Value::Null)
}

fn field(body: &Value, key: &str) -> String {
    body.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// `{id}` out of `/api/projects/{id}/...`.
fn project_in_path(request: &Request) -> String {
    request
        .url
        .path()
        .split('/')
        .nth(3)
        .unwrap_or_default()
        .to_string()
}

fn conflict(message: &str) -> ResponseTemplate {
    ResponseTemplate::new(409).set_body_json(json!({ "detail": message }))
}

impl SimulatedWorkflow {
    pub fn new(store: MemoryStore) -> Self {
        Self::with_behaviour(store, Behaviour::default())
    }

    pub fn with_behaviour(store: MemoryStore, behaviour: Behaviour) -> Self {
        Self {
            store,
            behaviour,
            progress: Arc::new(Mutex::new(Progress::default())),
        }
    }

    pub fn runs(&self) -> u32 {
        self.progress.lock().unwrap().runs
    }

    pub async fn mount(&self, server: &MockServer) {
        self.mount_without_run_start(server).await;

        Mock::given(method("POST"))
            .and(path("/api/run/start"))
            .respond_with(Route {
                workflow: self.clone(),
                handler: Self::start_run,
            })
            .mount(server)
            .await;
    }

    /// Everything except `/api/run/start`, which then answers 404.
    pub async fn mount_without_run_start(&self, server: &MockServer) {
        Mock::given(method("POST"))
            .and(path_regex(r"^/api/projects/[^/]+/strategy/approve$"))
            .respond_with(Route {
                workflow: self.clone(),
                handler: Self::approve,
            })
            .mount(server)
            .await;

        Mock::given(method("POST"))
            .and(path_regex(r"^/api/projects/[^/]+/strategy/reject$"))
            .respond_with(Route {
                workflow: self.clone(),
                handler: Self::reject,
            })
            .mount(server)
            .await;

        Mock::given(method("POST"))
            .and(path_regex(r"^/api/projects/[^/]+/strategy/edit$"))
            .respond_with(Route {
                workflow: self.clone(),
                handler: Self::edit,
            })
            .mount(server)
            .await;

        Mock::given(method("POST"))
            .and(path_regex(r"^/api/projects/[^/]+/upload$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .mount(server)
            .await;
    }

    fn start_run(&self, request: &Request) -> ResponseTemplate {
        let project_id = field(&body_of(request), "projectId");
        let (runs, first_run) = {
            let mut progress = self.progress.lock().unwrap();
            progress.project_id = Some(project_id.clone());
            progress.runs += 1;
            let first_run = !progress.seeded_strategy;
            progress.seeded_strategy = true;
            (progress.runs, first_run)
        };

        if first_run {
            self.store.insert_strategy_version(&project_id).unwrap();
        }
        self.store
            .insert_patch(&project_id, PatchSource::Insights, PatchStatus::Proposed)
            .unwrap();

        ResponseTemplate::new(200)
            .set_body_json(json!({ "success": true, "runId": format!("run-{runs}") }))
    }

    fn approve(&self, request: &Request) -> ResponseTemplate {
        let patch_id = field(&body_of(request), "patchId");
        let moved = self
            .store
            .transition_patch(&patch_id, PatchStatus::Proposed, PatchStatus::Approved)
            .unwrap();
        if moved || self.behaviour.allow_reapprove {
            ResponseTemplate::new(200).set_body_json(json!({ "success": true, "action": "approve" }))
        } else {
            conflict("patch is not awaiting review")
        }
    }

    fn reject(&self, request: &Request) -> ResponseTemplate {
        let patch_id = field(&body_of(request), "patchId");
        let moved = self
            .store
            .transition_patch(&patch_id, PatchStatus::Proposed, PatchStatus::Rejected)
            .unwrap();
        if moved {
            ResponseTemplate::new(200).set_body_json(json!({ "success": true, "action": "reject" }))
        } else {
            conflict("patch is not awaiting review")
        }
    }

    /// The edited patch replaces the original and is approved straight away.
    fn edit(&self, request: &Request) -> ResponseTemplate {
        let project_id = project_in_path(request);
        let patch_id = field(&body_of(request), "patchId");
        let moved = self
            .store
            .transition_patch(&patch_id, PatchStatus::Proposed, PatchStatus::Superseded)
            .unwrap();
        if !moved {
            return conflict("patch is not awaiting review");
        }
        let edited = self
            .store
            .insert_patch(&project_id, PatchSource::EditedLlm, PatchStatus::Approved)
            .unwrap();
        ResponseTemplate::new(200).set_body_json(json!({ "success": true, "patchId": edited.id }))
    }

    /// Run the follow-on writer until the handle is aborted or dropped with the runtime.
    pub fn spawn(&self) -> JoinHandle<()> {
        let wf = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(WORKER_TICK).await;
                wf.step().await;
            }
        })
    }

    async fn step(&self) {
        let project_id = self.progress.lock().unwrap().project_id.clone();
        let Some(project_id) = project_id else {
            return;
        };

        let approved = self
            .store
            .get_patches(&project_id, PatchFilter::new(None, Some(PatchStatus::Approved)))
            .await
            .unwrap();
        for patch in approved {
            let fresh = self.progress.lock().unwrap().applied.insert(patch.id.clone());
            if !fresh {
                continue;
            }
            self.apply(&project_id);
            if patch.source == PatchSource::Reflection {
                self.raise_follow_ups(&project_id);
            }
        }

        let metrics = self.store.get_metrics(&project_id).await.unwrap().len();
        let reflect = {
            let mut progress = self.progress.lock().unwrap();
            let due = metrics >= 5 && !progress.reflected;
            progress.reflected |= due;
            due
        };
        if reflect {
            self.store
                .insert_patch(&project_id, PatchSource::Reflection, PatchStatus::Proposed)
                .unwrap();
        }
    }

    fn apply(&self, project_id: &str) {
        let strategy = self.store.insert_strategy_version(project_id).unwrap();
        self.store.insert_brief(&strategy.id).unwrap();
        self.store.insert_campaign(project_id, &strategy.id).unwrap();
        if self.behaviour.duplicate_campaigns {
            self.store.insert_campaign(project_id, &strategy.id).unwrap();
        }
    }

    fn raise_follow_ups(&self, project_id: &str) {
        let due = {
            let mut progress = self.progress.lock().unwrap();
            let due = !progress.followed_up;
            progress.followed_up = true;
            due
        };
        if due {
            for _ in 0..self.behaviour.follow_up_proposals {
                self.store
                    .insert_patch(project_id, PatchSource::Reflection, PatchStatus::Proposed)
                    .unwrap();
            }
        }
    }
}

/// Config pointed at `server` with budgets sized for tests.
pub fn test_config(server: &MockServer, screenshot_dir: PathBuf) -> HarnessConfig {
    let mut config = HarnessConfig::default();
    config.orchestrator.base_url = server.uri();
    config.orchestrator.project_name = Some("Simulated Project".into());
    config.poll.timeout_ms = 5_000;
    config.poll.retry_interval_ms = 20;
    config.poll.max_retries = 250;
    config.browser.ui_timeout_ms = 60;
    config.browser.screenshot_dir = screenshot_dir.display().to_string();
    config.fixtures.artifact_path =
        concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/sample_artifact.csv").into();
    config.http.request_timeout_secs = 5;
    config
}
