use std::fmt;
use std::io::{self, Write};

use hyper::client::HttpConnector;
use hyper::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use hyper::{Body, Client, Method, Request, StatusCode};
use keyval_core::server::{SetParams, TtlParams, ValueParams};

const DEFAULT_HOST: &str = "http://127.0.0.1:8000";
const CLIENT_USER_AGENT: &str = concat!("keyval-client/", env!("CARGO_PKG_VERSION"));

/// Errors surfaced by the API client.
#[derive(Debug)]
pub enum ClientError {
    Http(hyper::Error),
    Request(hyper::http::Error),
    Json(serde_json::Error),
    /// The server answered with an unexpected status, e.g. 400 for a
    /// wrong-type operation.
    Status(StatusCode),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Http(err) => write!(f, "http error: {}", err),
            ClientError::Request(err) => write!(f, "bad request: {}", err),
            ClientError::Json(err) => write!(f, "bad response body: {}", err),
            ClientError::Status(status) => write!(f, "unexpected status: {}", status),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Http(err) => Some(err),
            ClientError::Request(err) => Some(err),
            ClientError::Json(err) => Some(err),
            ClientError::Status(_) => None,
        }
    }
}

impl From<hyper::Error> for ClientError {
    fn from(err: hyper::Error) -> Self {
        ClientError::Http(err)
    }
}

impl From<hyper::http::Error> for ClientError {
    fn from(err: hyper::http::Error) -> Self {
        ClientError::Request(err)
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Json(err)
    }
}

/// HTTP client for the keyval API. Absence comes back as `None`, mirroring
/// the server's 404 mapping.
pub struct ApiClient {
    host: String,
    http: Client<HttpConnector>,
}

impl ApiClient {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            http: Client::new(),
        }
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Request<Body>, ClientError> {
        let mut builder = Request::builder()
            .method(method)
            .uri(format!("{}{}", self.host, path))
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, CLIENT_USER_AGENT);

        if body.is_some() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }

        let request = match body {
            Some(bytes) => builder.body(Body::from(bytes))?,
            None => builder.body(Body::empty())?,
        };
        Ok(request)
    }

    async fn send(&self, request: Request<Body>) -> Result<(StatusCode, Vec<u8>), ClientError> {
        let response = self.http.request(request).await?;
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await?;
        Ok((status, bytes.to_vec()))
    }

    /// Reads an optional value: 200 yields the value, 404 yields `None`.
    async fn fetch_value(&self, path: &str) -> Result<Option<String>, ClientError> {
        let request = self.request(Method::GET, path, None)?;
        let (status, body) = self.send(request).await?;
        match status {
            StatusCode::OK => {
                let params: ValueParams = serde_json::from_slice(&body)?;
                Ok(Some(params.value))
            }
            StatusCode::NOT_FOUND => Ok(None),
            other => Err(ClientError::Status(other)),
        }
    }

    async fn post(&self, path: &str, body: Option<Vec<u8>>) -> Result<StatusCode, ClientError> {
        let request = self.request(Method::POST, path, body)?;
        let (status, _) = self.send(request).await?;
        Ok(status)
    }

    fn expect_ok(status: StatusCode) -> Result<(), ClientError> {
        if status == StatusCode::OK {
            Ok(())
        } else {
            Err(ClientError::Status(status))
        }
    }

    pub async fn keys(&self) -> Result<Vec<String>, ClientError> {
        let request = self.request(Method::GET, "/api/keys", None)?;
        let (status, body) = self.send(request).await?;
        Self::expect_ok(status)?;
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        self.fetch_value(&format!("/api/get/{}", key)).await
    }

    /// Sets a scalar value with a TTL in milliseconds (0 = no expiration).
    pub async fn set(&self, key: &str, value: &str, ttl_ms: i64) -> Result<(), ClientError> {
        let params = SetParams {
            value: value.to_string(),
            ttl: ttl_ms,
        };
        let status = self
            .post(&format!("/api/set/{}", key), Some(serde_json::to_vec(&params)?))
            .await?;
        Self::expect_ok(status)
    }

    pub async fn remove(&self, key: &str) -> Result<(), ClientError> {
        let status = self.post(&format!("/api/remove/{}", key), None).await?;
        Self::expect_ok(status)
    }

    /// Returns `true` if the key existed and its expiration was updated.
    pub async fn expire(&self, key: &str, ttl_ms: i64) -> Result<bool, ClientError> {
        let params = TtlParams { ttl: ttl_ms };
        let status = self
            .post(
                &format!("/api/expire/{}", key),
                Some(serde_json::to_vec(&params)?),
            )
            .await?;
        match status {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            other => Err(ClientError::Status(other)),
        }
    }

    pub async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, ClientError> {
        self.fetch_value(&format!("/api/hget/{}/{}", key, field)).await
    }

    pub async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), ClientError> {
        let params = ValueParams {
            value: value.to_string(),
        };
        let status = self
            .post(
                &format!("/api/hset/{}/{}", key, field),
                Some(serde_json::to_vec(&params)?),
            )
            .await?;
        Self::expect_ok(status)
    }

    pub async fn hdel(&self, key: &str, field: &str) -> Result<(), ClientError> {
        let status = self.post(&format!("/api/hdel/{}/{}", key, field), None).await?;
        Self::expect_ok(status)
    }
}

/// Interactive command loop against a running server.
pub async fn run_client(host: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let host = host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let client = ApiClient::new(host.clone());

    println!("Connected to {}. Type commands (or 'QUIT' to exit):", host);

    let mut line = String::new();
    loop {
        print!("keyval> ");
        io::stdout().flush()?;

        line.clear();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        match run_command(&client, &parts).await {
            Ok(ClientLoop::Continue) => {}
            Ok(ClientLoop::Quit) => break,
            Err(err) => println!("ERROR: {}", err),
        }
    }

    println!("Goodbye!");
    Ok(())
}

enum ClientLoop {
    Continue,
    Quit,
}

async fn run_command(client: &ApiClient, parts: &[&str]) -> Result<ClientLoop, ClientError> {
    match (parts[0].to_uppercase().as_str(), &parts[1..]) {
        ("QUIT", _) => return Ok(ClientLoop::Quit),
        ("KEYS", []) => {
            for key in client.keys().await? {
                println!("{}", key);
            }
        }
        ("GET", [key]) => print_value(client.get(key).await?),
        ("SET", [key, value]) => client.set(key, value, 0).await?,
        ("SET", [key, value, ttl]) => {
            let ttl: i64 = ttl.parse().unwrap_or(-1);
            client.set(key, value, ttl).await?;
        }
        ("REMOVE", [key]) => client.remove(key).await?,
        ("EXPIRE", [key, ttl]) => {
            let ttl: i64 = ttl.parse().unwrap_or(-1);
            if !client.expire(key, ttl).await? {
                println!("(no such key)");
            }
        }
        ("HGET", [key, field]) => print_value(client.hget(key, field).await?),
        ("HSET", [key, field, value]) => client.hset(key, field, value).await?,
        ("HDEL", [key, field]) => client.hdel(key, field).await?,
        _ => println!(
            "commands: KEYS | GET k | SET k v [ttl_ms] | REMOVE k | EXPIRE k ttl_ms | HGET k f | HSET k f v | HDEL k f | QUIT"
        ),
    }
    Ok(ClientLoop::Continue)
}

fn print_value(value: Option<String>) {
    match value {
        Some(value) => println!("{}", value),
        None => println!("(nil)"),
    }
}
