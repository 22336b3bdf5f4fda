#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

use webpwrecover::config::Config;
use webpwrecover::email::{EmailError, EmailSender};
use webpwrecover::infrastructure::{AppState, Startup};

/// A message captured by [`RecordingEmailSender`]
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Email sender that keeps every message in memory
#[derive(Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<SentEmail>>,
}

impl RecordingEmailSender {
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_to(&self, to: &str) -> Option<SentEmail> {
        self.sent().into_iter().rev().find(|m| m.to == to)
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send_email(
        &self,
        email: &str,
        subject: &str,
        html_message: &str,
    ) -> Result<(), EmailError> {
        self.sent.lock().unwrap().push(SentEmail {
            to: email.to_string(),
            subject: subject.to_string(),
            html: html_message.to_string(),
        });
        Ok(())
    }
}

pub fn test_config(overrides: &[(&str, &str)]) -> Config {
    let mut values: HashMap<String, String> = [
        ("DEFAULT_CONNECTION", "sqlite::memory:"),
        ("SENDGRID_USER", "Test Sender"),
        ("SENDGRID_KEY", "SG.test-key"),
        ("APP_ENVIRONMENT", "Development"),
        ("PUBLIC_URL", "http://localhost:8000"),
        (
            "DATA_PROTECTION_KEY",
            "0123456789abcdef0123456789abcdef-test-key",
        ),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    for (key, value) in overrides {
        values.insert(key.to_string(), value.to_string());
    }

    Config::from_lookup(|key| values.get(key).cloned()).expect("valid test configuration")
}

/// Fully configured application over in-memory sqlite
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub mail: Arc<RecordingEmailSender>,
    pub static_root: TempDir,
}

impl TestApp {
    pub async fn spawn(overrides: &[(&str, &str)]) -> Self {
        let static_root = tempfile::tempdir().expect("temp static root");
        std::fs::write(static_root.path().join("site.css"), "body { color: black; }")
            .expect("write static asset");

        let mut all: Vec<(&str, &str)> = overrides.to_vec();
        let static_dir = static_root.path().to_string_lossy().to_string();
        all.push(("STATIC_DIR", static_dir.as_str()));

        let startup = Startup::new(test_config(&all));
        let mail = Arc::new(RecordingEmailSender::default());
        let state = startup
            .configure_services_with(mail.clone())
            .await
            .expect("services configured");
        let router = startup.configure(state.clone());

        Self {
            router,
            state,
            mail,
            static_root,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

/// Pulls the decoded value of `name` out of the first link in an email body
pub fn query_param(html: &str, name: &str) -> Option<String> {
    let start = html.find("href=\"")? + "href=\"".len();
    let end = start + html[start..].find('"')?;
    let link = html[start..end].replace("&amp;", "&");
    let query = link.split_once('?')?.1;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .and_then(|(_, value)| urlencoding::decode(value).ok())
        .map(|value| value.into_owned())
}
