#![allow(dead_code)]

use std::{
    collections::HashMap,
    io::{BufRead, BufReader, Read, Write},
    net::{TcpListener, TcpStream},
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use serde_json::{Value, json};
use uuid::Uuid;

/// A request as seen by the loopback server.
#[derive(Clone, Debug)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub content_type: Option<String>,
    pub body: String,
}

/// What the loopback server answers with.
#[derive(Clone, Debug)]
pub struct Reply {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl Reply {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn raw(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn empty(status: u16) -> Self {
        Self::raw(status, "")
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

pub struct TestServer {
    pub url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl TestServer {
    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

/// Spins up an HTTP/1.1 server on a loopback port. Each connection is served
/// on its own thread and closed after one response.
pub fn serve<F>(handler: F) -> TestServer
where
    F: Fn(&Recorded) -> Reply + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server");
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let handler = Arc::new(handler);

    let recorded = Arc::clone(&requests);
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { continue };
            let handler = Arc::clone(&handler);
            let recorded = Arc::clone(&recorded);
            thread::spawn(move || {
                let Some(request) = read_request(&stream) else {
                    return;
                };
                recorded.lock().unwrap().push(request.clone());
                let reply = handler(&request);
                if !reply.delay.is_zero() {
                    thread::sleep(reply.delay);
                }
                write_reply(stream, &reply);
            });
        }
    });

    TestServer {
        url: format!("http://{addr}"),
        requests,
    }
}

/// Serves the same reply to every request.
pub fn serve_fixed(reply: Reply) -> TestServer {
    serve(move |_| reply.clone())
}

/// A port with nothing listening on it.
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind probe");
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

fn read_request(stream: &TcpStream) -> Option<Recorded> {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line).ok()?;
    let mut parts = line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut content_length = 0usize;
    let mut content_type = None;
    loop {
        let mut header = String::new();
        reader.read_line(&mut header).ok()?;
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            let value = value.trim();
            match name.to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.parse().ok()?,
                "content-type" => content_type = Some(value.to_string()),
                _ => {}
            }
        }
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).ok()?;

    Some(Recorded {
        method,
        path,
        content_type,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

fn write_reply(mut stream: TcpStream, reply: &Reply) {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nContent-Type: application/json\r\nConnection: close\r\n\r\n{}",
        reply.status,
        reason(reply.status),
        reply.body.len(),
        reply.body
    );
    // The client may already have given up on the exchange.
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

/// In-memory implementation of the deployment REST contract.
pub fn serve_deployments() -> TestServer {
    let store: Mutex<HashMap<Uuid, Value>> = Mutex::new(HashMap::new());
    serve(move |request| {
        let mut store = store.lock().unwrap();
        let segments: Vec<&str> = request
            .path
            .trim_start_matches('/')
            .split('/')
            .collect();

        match (request.method.as_str(), segments.as_slice()) {
            ("POST", ["deployments"]) => create(&mut store, &request.body),
            ("GET", ["deployments", id]) => match lookup(&store, id) {
                Ok(deployment) => Reply::json(200, deployment),
                Err(reply) => reply,
            },
            ("DELETE", ["deployments", id]) => match parse_id(id) {
                Some(uuid) if store.remove(&uuid).is_some() => Reply::empty(204),
                _ => not_found(id),
            },
            _ => Reply::json(405, json!({ "message": "method not allowed", "code": 405 })),
        }
    })
}

fn create(store: &mut HashMap<Uuid, Value>, body: &str) -> Reply {
    let Ok(mut deployment) = serde_json::from_str::<Value>(body) else {
        return Reply::json(400, json!({ "message": "malformed body", "code": 1000 }));
    };

    let id = deployment["id"]
        .as_str()
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .filter(|id| !id.is_nil());
    let mut failed = Vec::new();
    if id.is_none() {
        failed.push("id");
    }
    if deployment["replicas"].as_u64().unwrap_or(0) == 0 {
        failed.push("replicas");
    }
    if deployment["image"].as_str().unwrap_or("").is_empty() {
        failed.push("image");
    }
    if deployment["ports"].as_array().is_none_or(Vec::is_empty) {
        failed.push("ports");
    }
    let Some(id) = id.filter(|_| failed.is_empty()) else {
        return Reply::json(
            400,
            json!({
                "message": "invalid deployment",
                "code": 1001,
                "extras": { "failed_fields": failed }
            }),
        );
    };

    if store.contains_key(&id) {
        return Reply::json(
            409,
            json!({ "message": "deployment already exists", "code": 1002 }),
        );
    }

    deployment["created_at"] = json!(chrono::Utc::now().to_rfc3339());
    store.insert(id, deployment.clone());
    Reply::json(201, deployment)
}

fn lookup(store: &HashMap<Uuid, Value>, id: &str) -> Result<Value, Reply> {
    parse_id(id)
        .and_then(|uuid| store.get(&uuid).cloned())
        .ok_or_else(|| not_found(id))
}

fn parse_id(id: &str) -> Option<Uuid> {
    Uuid::parse_str(id).ok()
}

fn not_found(id: &str) -> Reply {
    match parse_id(id) {
        Some(uuid) => Reply::json(404, json!({ "id": uuid, "resource": "deployment" })),
        None => Reply::json(404, json!({ "message": "not found", "code": 404 })),
    }
}
