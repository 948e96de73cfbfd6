use action_overlay::dispatch::{
    announce, capture_settle, hide_for_capture, is_screen_capture, run_with_overlay,
};
use action_overlay::overlay::{session, OverlayEngine};
use action_overlay::settings::OverlaySettings;
use action_overlay::{logging, ActionDescriptor};
use serde_json::json;
use std::time::Duration;

const SETTINGS_FILE: &str = "overlay_settings.json";
const STEP_PAUSE: Duration = Duration::from_millis(1500);

fn scripted_actions() -> Vec<Vec<ActionDescriptor>> {
    vec![
        vec![ActionDescriptor::new(
            "computer",
            json!({ "action": "cursor_position" }),
        )],
        vec![ActionDescriptor::new(
            "computer",
            json!({ "action": "key", "text": "command+space" }),
        )],
        vec![ActionDescriptor::new(
            "computer",
            json!({ "action": "type", "text": "Hello from overlay!" }),
        )],
        vec![ActionDescriptor::new(
            "computer",
            json!({ "action": "screenshot" }),
        )],
        vec![
            ActionDescriptor::new("bash", json!({ "command": "ls -la" })),
            ActionDescriptor::new(
                "str_replace_editor",
                json!({ "command": "view", "path": "/tmp/notes.txt" }),
            ),
            ActionDescriptor::new("computer", json!({ "action": "key", "text": "Return" })),
        ],
    ]
}

fn replay(engine: &OverlayEngine, batches: &[Vec<ActionDescriptor>]) {
    for batch in batches {
        announce(engine, batch);
        for action in batch {
            if is_screen_capture(action) {
                let confirmed = hide_for_capture(engine, capture_settle(engine));
                tracing::info!(confirmed, "overlay hidden for capture");
                engine.reshow();
            }
            tracing::info!(tool = %action.tool_name, label = %action.describe(), "executed");
        }
        std::thread::sleep(STEP_PAUSE);
    }
}

fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| SETTINGS_FILE.to_string());
    let settings = OverlaySettings::load(&path)?;
    logging::init(settings.debug_logging, settings.log_file.clone());

    session().configure(settings);
    let engine = session().get_or_create();
    tracing::info!(lifecycle = ?engine.lifecycle(), "overlay demo starting");

    run_with_overlay(&engine, |engine| replay(engine, &scripted_actions()));

    session().release();
    tracing::info!("overlay demo finished");
    Ok(())
}
