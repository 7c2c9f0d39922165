//! MCP demo over the WebSocket transport
//!
//! Exercises the simplified WebSocket variant: list tools and resources,
//! spawn an object, then chain the returned uuid into a resource read and
//! a transform call.

use anyhow::Result;
use serde_json::{Value, json};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use scenelink_core::mcp::{extract_spawn_uuid, object_uri};
use scenelink_mcp::McpWsSession;

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::WARN)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut session = McpWsSession::new();
    println!("Connecting to the Scene Host's MCP endpoint...");
    if let Err(e) = session.connect().await {
        println!("Error: could not connect to the Scene Host ({e}).");
        println!("Make sure the Scene Host is running with MCP enabled.");
        return Ok(());
    }
    println!("Connected!");

    let outcome = exercise(&mut session).await;
    session.disconnect().await;
    if let Err(e) = outcome {
        println!("Error: {e}");
    }
    Ok(())
}

async fn exercise(session: &mut McpWsSession) -> scenelink_core::Result<()> {
    println!("\n--- Testing tools/list ---");
    let tools = session.tools_list().await?;
    print_json(&tools);

    println!("\n--- Testing resources/list ---");
    let resources = session.resources_list().await?;
    print_json(&resources);

    println!("\n--- Testing tools/call (spawn_object) ---");
    let spawn = session
        .call_tool(
            "spawn_object",
            json!({
                "prefab_key": "Cube",
                "position": [0, 2, 0],
                "name": "MCP_Spawned_Cube"
            }),
        )
        .await?;
    print_json(&spawn);

    let Some(uuid) = extract_spawn_uuid(&spawn) else {
        println!("\nSpawn returned no uuid; skipping read/transform follow-ups.");
        return Ok(());
    };

    println!("\n--- Testing resources/read (for {uuid}) ---");
    let read = session.read_resource(&object_uri("MainScene", &uuid)).await?;
    print_json(&read);

    println!("\n--- Testing tools/call (transform_object for {uuid}) ---");
    let transformed = session
        .call_tool(
            "transform_object",
            json!({"uuid": uuid, "position": [0, 5, 0]}),
        )
        .await?;
    print_json(&transformed);

    Ok(())
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(_) => println!("{value}"),
    }
}
