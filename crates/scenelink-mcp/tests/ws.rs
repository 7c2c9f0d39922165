//! WebSocket MCP session tests against an in-process JSON-RPC server.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

use scenelink_core::SceneLinkError;
use scenelink_core::mcp::{extract_spawn_uuid, object_uri};
use scenelink_mcp::{McpWsConfig, McpWsSession};

type ServerWs = WebSocketStream<TcpStream>;

async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let uri = format!("ws://{}", listener.local_addr().unwrap());
    (listener, uri)
}

fn session_for(uri: String) -> McpWsSession {
    McpWsSession::with_config(McpWsConfig {
        uri,
        connect_timeout: Duration::from_secs(5),
        request_timeout: Duration::from_secs(2),
    })
}

async fn recv_request(ws: &mut ServerWs) -> Value {
    loop {
        match ws.next().await.unwrap().unwrap() {
            Message::Text(text) => return serde_json::from_str(&text).unwrap(),
            _ => continue,
        }
    }
}

async fn send_json(ws: &mut ServerWs, value: Value) {
    ws.send(Message::Text(value.to_string())).await.unwrap();
}

/// Answer requests the way the Scene Host's MCP endpoint does.
async fn serve_ping_pong(listener: TcpListener, rounds: usize) -> Vec<Value> {
    let (stream, _) = listener.accept().await.unwrap();
    let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
    let mut received = Vec::new();

    for _ in 0..rounds {
        let request = recv_request(&mut ws).await;
        let id = request["id"].clone();
        let result = match request["method"].as_str().unwrap() {
            "tools/list" => json!({"tools": [{"name": "spawn_object"}, {"name": "transform_object"}]}),
            "resources/list" => json!({"resources": [{"uri": "mcp://unity/scenes/MainScene"}]}),
            "tools/call" => match request["params"]["name"].as_str().unwrap() {
                "spawn_object" => json!({"success": true, "data": {"uuid": "u1"}}),
                "transform_object" => json!({"success": true, "data": {}}),
                other => json!({"success": false, "message": format!("unknown tool {other}")}),
            },
            "resources/read" => json!({"contents": [{"uri": request["params"]["uri"]}]}),
            _ => {
                send_json(
                    &mut ws,
                    json!({"jsonrpc": "2.0", "id": id,
                           "error": {"code": -32601, "message": "Method not found"}}),
                )
                .await;
                received.push(request);
                continue;
            }
        };
        send_json(&mut ws, json!({"jsonrpc": "2.0", "id": id, "result": result})).await;
        received.push(request);
    }
    received
}

#[tokio::test]
async fn request_ids_increment_per_call() {
    let (listener, uri) = bind().await;
    let server = tokio::spawn(serve_ping_pong(listener, 2));

    let mut session = session_for(uri);
    session.connect().await.unwrap();
    session.tools_list().await.unwrap();
    session.resources_list().await.unwrap();
    session.disconnect().await;

    let received = server.await.unwrap();
    assert_eq!(received[0]["id"], 1);
    assert_eq!(received[1]["id"], 2);
}

#[tokio::test]
async fn spawn_result_chains_into_read_and_transform() {
    let (listener, uri) = bind().await;
    let server = tokio::spawn(serve_ping_pong(listener, 3));

    let mut session = session_for(uri);
    session.connect().await.unwrap();

    let spawn = session
        .call_tool(
            "spawn_object",
            json!({"prefab_key": "Cube", "position": [0, 2, 0], "name": "MCP_Spawned_Cube"}),
        )
        .await
        .unwrap();
    let uuid = extract_spawn_uuid(&spawn).unwrap();
    assert_eq!(uuid, "u1");

    let read = session
        .read_resource(&object_uri("MainScene", &uuid))
        .await
        .unwrap();
    assert_eq!(
        read["contents"][0]["uri"],
        "mcp://unity/scenes/MainScene/objects/u1"
    );

    let transformed = session
        .call_tool("transform_object", json!({"uuid": uuid, "position": [0, 5, 0]}))
        .await
        .unwrap();
    assert_eq!(transformed["success"], true);

    session.disconnect().await;
    let received = server.await.unwrap();
    assert_eq!(received[1]["method"], "resources/read");
    assert_eq!(
        received[1]["params"]["uri"],
        "mcp://unity/scenes/MainScene/objects/u1"
    );
}

#[tokio::test]
async fn rpc_error_surfaces_as_err() {
    let (listener, uri) = bind().await;
    let server = tokio::spawn(serve_ping_pong(listener, 1));

    let mut session = session_for(uri);
    session.connect().await.unwrap();

    let err = session
        .call("scene/unknown", json!({}))
        .await
        .unwrap()
        .into_result()
        .unwrap_err();
    assert!(matches!(err, SceneLinkError::Rpc { code: -32601, .. }));

    session.disconnect().await;
    server.await.unwrap();
}
