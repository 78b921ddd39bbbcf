//! In-process stand-in for the Firestore REST endpoint.

use std::{thread, time::Duration};

use tiny_http::{Response, Server};

use crate::config::RemoteConfig;

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub url: String,
    pub body: String,
}

impl CapturedRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

pub enum Reply {
    Status(u16, String),
    /// Hold the connection open without answering.
    Stall(Duration),
}

pub struct FakeFirestore {
    pub base_url: String,
    handle: thread::JoinHandle<Vec<CapturedRequest>>,
}

impl FakeFirestore {
    /// Answers one request per reply, in order, then shuts down.
    pub fn start(replies: Vec<Reply>) -> Self {
        let server = Server::http("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}/v1", server.server_addr());

        let handle = thread::spawn(move || {
            let mut captured = Vec::new();
            for reply in replies {
                let Ok(mut request) = server.recv() else {
                    break;
                };
                let mut body = String::new();
                request.as_reader().read_to_string(&mut body).unwrap();
                captured.push(CapturedRequest {
                    method: request.method().to_string(),
                    url: request.url().to_string(),
                    body,
                });

                match reply {
                    Reply::Status(code, body) => {
                        let _ = request.respond(Response::from_string(body).with_status_code(code));
                    }
                    Reply::Stall(hold) => {
                        thread::sleep(hold);
                        drop(request);
                    }
                }
            }
            captured
        });

        Self { base_url, handle }
    }

    pub fn config(&self) -> RemoteConfig {
        RemoteConfig {
            base_url: self.base_url.clone(),
            project_id: "demo".into(),
            api_key: "test-key".into(),
            timeout_ms: 2_000,
            ..RemoteConfig::default()
        }
    }

    pub fn finish(self) -> Vec<CapturedRequest> {
        self.handle.join().unwrap()
    }
}
