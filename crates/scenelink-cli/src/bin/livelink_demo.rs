//! LiveLink demo client
//!
//! Connects to the Scene Host's LiveLink WebSocket server and drives it
//! interactively, or runs a one-shot scripted exchange with `--simple`.

use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use scenelink_core::SceneLinkError;
use scenelink_livelink::{LiveLinkSession, format_object};

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::WARN)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if std::env::args().nth(1).as_deref() == Some("--simple") {
        simple_demo().await
    } else {
        interactive_demo().await
    }
}

async fn interactive_demo() -> Result<()> {
    let mut session = LiveLinkSession::new();

    if let Err(e) = session.connect().await {
        report_connect_failure(&e);
        return Ok(());
    }
    println!("Connected!");
    print_objects(&session);
    print_menu();

    let outcome = command_loop(&mut session).await;
    session.disconnect().await;
    outcome
}

async fn command_loop(session: &mut LiveLinkSession) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt()?;
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("\nInterrupted.");
                return Ok(());
            }
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            return Ok(()); // EOF
        };

        let outcome = match line.trim().to_lowercase().as_str() {
            "" => Ok(()),
            "quit" | "q" => return Ok(()),
            "list" | "l" => {
                print_objects(session);
                Ok(())
            }
            "spawn" | "s" => spawn_cube(session).await,
            "ping" | "p" => do_ping(session).await,
            "refresh" | "r" => do_refresh(session).await,
            other => {
                println!("Unknown command: {other}");
                Ok(())
            }
        };
        report_step(outcome)?;
    }
}

/// Downgrade Scene Host errors to a printed message; transport loss still
/// aborts the loop.
fn report_step(outcome: scenelink_core::Result<()>) -> Result<()> {
    match outcome {
        Ok(()) => Ok(()),
        Err(e @ (SceneLinkError::Connection(_) | SceneLinkError::NotConnected)) => {
            Err(anyhow::anyhow!(e))
        }
        Err(e) => {
            println!("Command failed: {e}");
            Ok(())
        }
    }
}

async fn spawn_cube(session: &mut LiveLinkSession) -> scenelink_core::Result<()> {
    let result = session
        .spawn("Cube", Some([0.0, 2.0, 0.0]), None, Some("Test Cube"))
        .await?;
    println!("Spawn result: {} - {}", result.success, result.message);
    if let Some(uuid) = result.data.get("uuid").and_then(|v| v.as_str()) {
        println!("  UUID: {uuid}");
    }
    Ok(())
}

async fn do_ping(session: &mut LiveLinkSession) -> scenelink_core::Result<()> {
    let result = session.ping().await?;
    println!("Ping: {}", result.message);
    Ok(())
}

async fn do_refresh(session: &mut LiveLinkSession) -> scenelink_core::Result<()> {
    session.request_scene_dump().await?;
    print_objects(session);
    Ok(())
}

async fn simple_demo() -> Result<()> {
    println!("SceneLink LiveLink - client demo");
    println!("{}", "=".repeat(40));

    let mut session = LiveLinkSession::new();
    if let Err(e) = session.connect().await {
        report_connect_failure(&e);
        return Ok(());
    }

    let outcome = simple_exchange(&mut session).await;
    session.disconnect().await;
    if let Err(e) = outcome {
        println!("Demo failed: {e}");
    }
    Ok(())
}

async fn simple_exchange(session: &mut LiveLinkSession) -> scenelink_core::Result<()> {
    println!("\nConnected to the Scene Host!");
    println!("Scene: {}", display_scene_name(session));
    println!("Objects: {}", session.objects().len());

    let pong = session.ping().await?;
    println!("\nPing response: {}", pong.message);

    println!("\nScene objects:");
    for obj in session.objects().values() {
        println!("  - {}", format_object(obj));
    }
    Ok(())
}

fn print_objects(session: &LiveLinkSession) {
    println!("\n--- Scene Objects ({}) ---", session.objects().len());
    for obj in session.objects().values() {
        println!("  {}", format_object(obj));
    }
    println!();
}

fn print_menu() {
    println!("\nCommands:");
    println!("  list    - List scene objects");
    println!("  spawn   - Spawn a Cube");
    println!("  ping    - Test connection");
    println!("  refresh - Request scene dump");
    println!("  quit    - Exit");
    println!();
}

fn display_scene_name(session: &LiveLinkSession) -> &str {
    if session.scene_name().is_empty() {
        "Unknown"
    } else {
        session.scene_name()
    }
}

fn report_connect_failure(err: &SceneLinkError) {
    println!("Error: could not connect to the Scene Host ({err}).");
    println!("Make sure the Scene Host is running with LiveLink enabled.");
}

fn prompt() -> Result<()> {
    print!("> ");
    std::io::stdout().flush()?;
    Ok(())
}
