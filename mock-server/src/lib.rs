use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;

pub const SCRIPT_PATH: &str = "/db/data/ext/GremlinPlugin/graphdb/execute_script";

/// Node id of the reference node, which always exists and cannot be deleted.
pub const REFERENCE_NODE: u64 = 0;

#[derive(Debug, Default)]
pub struct Graph {
    nodes: HashMap<u64, Map<String, Value>>,
    next_id: u64,
}

impl Graph {
    pub fn new() -> Self {
        let mut graph = Self::default();
        graph.create(Map::new());
        graph
    }

    fn create(&mut self, properties: Map<String, Value>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(id, properties);
        id
    }
}

pub type Db = Arc<RwLock<Graph>>;

#[derive(Deserialize)]
pub struct ScriptInput {
    pub script: String,
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Graph::new()));
    Router::new()
        .route("/db/data/", get(root))
        .route("/db/data/node", post(create_node))
        .route("/db/data/node/{id}", get(get_node).delete(delete_node))
        .route(
            "/db/data/node/{id}/properties",
            get(get_properties).put(set_properties),
        )
        .route(SCRIPT_PATH, post(execute_script))
        .route("/redirect/{hops}", get(redirect_chain))
        .route("/moved/{code}", any(moved_to_echo))
        .route("/echo", any(echo))
        .route("/status/{code}", any(fixed_status))
        .route("/text", get(plain_text))
        .route("/large/{bytes}", get(large_document))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock server listening");
    }
    axum::serve(listener, app()).await
}

fn host_of(headers: &HeaderMap) -> &str {
    headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost")
}

fn node_uri(headers: &HeaderMap, id: u64) -> String {
    format!("http://{}/db/data/node/{id}", host_of(headers))
}

fn node_json(headers: &HeaderMap, id: u64, properties: &Map<String, Value>) -> Value {
    let uri = node_uri(headers, id);
    json!({
        "self": uri,
        "properties": format!("{uri}/properties"),
        "data": properties,
    })
}

fn redirect(status: StatusCode, location: String) -> Response {
    (status, [(header::LOCATION, location)]).into_response()
}

async fn root(headers: HeaderMap) -> Json<Value> {
    let base = format!("http://{}/db/data", host_of(&headers));
    Json(json!({
        "node": format!("{base}/node"),
        "reference_node": format!("{base}/node/{REFERENCE_NODE}"),
        "neo4j_version": "1.5",
        "extensions": {
            "GremlinPlugin": {
                "execute_script": format!("http://{}{SCRIPT_PATH}", host_of(&headers)),
            }
        },
    }))
}

async fn create_node(State(db): State<Db>, headers: HeaderMap, body: Bytes) -> Response {
    let properties = if body.is_empty() {
        Map::new()
    } else {
        match serde_json::from_slice::<Value>(&body) {
            Ok(Value::Object(map)) => map,
            _ => return bad_request("properties must be a JSON object"),
        }
    };
    let id = db.write().await.create(properties.clone());
    let location = node_uri(&headers, id);
    (
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(node_json(&headers, id, &properties)),
    )
        .into_response()
}

async fn get_node(
    State(db): State<Db>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    let graph = db.read().await;
    let properties = graph.nodes.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(node_json(&headers, id, properties)))
}

async fn delete_node(State(db): State<Db>, Path(id): Path<u64>) -> StatusCode {
    if id == REFERENCE_NODE {
        return StatusCode::CONFLICT;
    }
    match db.write().await.nodes.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

async fn get_properties(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<Response, StatusCode> {
    let graph = db.read().await;
    let properties = graph.nodes.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    if properties.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    Ok(Json(properties.clone()).into_response())
}

async fn set_properties(State(db): State<Db>, Path(id): Path<u64>, body: Bytes) -> Response {
    let properties = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(map)) => map,
        _ => return bad_request("properties must be a JSON object"),
    };
    let mut graph = db.write().await;
    match graph.nodes.get_mut(&id) {
        Some(existing) => {
            *existing = properties;
            StatusCode::NO_CONTENT.into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn execute_script(Json(input): Json<ScriptInput>) -> Response {
    if input.script.trim().is_empty() {
        return bad_request("empty script");
    }
    Json(json!([{ "script": input.script, "length": input.script.len() }])).into_response()
}

/// `/redirect/{n}` redirects through `n` more hops before landing on the
/// service root.
async fn redirect_chain(Path(hops): Path<u32>) -> Response {
    let location = if hops == 0 {
        "/db/data/".to_string()
    } else {
        format!("/redirect/{}", hops - 1)
    };
    redirect(StatusCode::FOUND, location)
}

async fn moved_to_echo(Path(code): Path<u16>) -> Response {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::TEMPORARY_REDIRECT);
    redirect(status, "/echo".to_string())
}

async fn echo(method: Method, body: Bytes) -> Json<Value> {
    let body = serde_json::from_slice::<Value>(&body).unwrap_or(Value::Null);
    Json(json!({ "method": method.as_str(), "body": body }))
}

async fn fixed_status(Path(code): Path<u16>) -> Response {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({ "status": code }))).into_response()
}

async fn plain_text() -> &'static str {
    "this is not json"
}

/// Largest document `/large/{bytes}` will build.
pub const MAX_LARGE_DOCUMENT: usize = 64 * 1024 * 1024;

/// A JSON document whose `data` string is `bytes` characters long.
async fn large_document(Path(bytes): Path<usize>) -> Json<Value> {
    Json(json!({ "data": "x".repeat(bytes.min(MAX_LARGE_DOCUMENT)) }))
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "message": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_starts_with_reference_node() {
        let graph = Graph::new();
        assert!(graph.nodes.contains_key(&REFERENCE_NODE));
        assert_eq!(graph.next_id, 1);
    }

    #[test]
    fn graph_assigns_increasing_ids() {
        let mut graph = Graph::new();
        let a = graph.create(Map::new());
        let b = graph.create(Map::new());
        assert_eq!((a, b), (1, 2));
    }

    #[test]
    fn node_json_uses_host_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "db.example:7474".parse().unwrap());
        let mut properties = Map::new();
        properties.insert("name".to_string(), json!("Alice"));

        let node = node_json(&headers, 3, &properties);
        assert_eq!(node["self"], "http://db.example:7474/db/data/node/3");
        assert_eq!(node["properties"], "http://db.example:7474/db/data/node/3/properties");
        assert_eq!(node["data"]["name"], "Alice");
    }

    #[test]
    fn script_input_requires_script() {
        assert!(serde_json::from_str::<ScriptInput>(r#"{"code":"g"}"#).is_err());
        let input: ScriptInput = serde_json::from_str(r#"{"script":"g.v(0)"}"#).unwrap();
        assert_eq!(input.script, "g.v(0)");
    }
}
