//! Headless editor session
//!
//! Runs a scripted create / mirror / undo / redo session against the
//! primitive kernel and logs what happens. Pass a RON config path as the
//! first argument to override the defaults.

use std::error::Error;

use facet_core::EditorConfig;
use facet_editor::Editor;
use facet_editor::commands::{MirrorCommand, SphereCommand};
use glam::Vec3;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "facet_editor=debug,facet_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => EditorConfig::load(&path)?,
        None => EditorConfig::default(),
    };

    tracing::info!("Starting headless session");
    let editor = Editor::new(config, facet_kernel::default_kernel());
    pollster::block_on(run(&editor))?;
    tracing::info!("Session finished");
    Ok(())
}

async fn run(editor: &Editor) -> Result<(), Box<dyn Error>> {
    let mut sphere = editor.factory(SphereCommand::new(Vec3::new(2.0, 0.0, 0.0), 1.0));
    sphere.update().await?;
    let outcome = sphere.transaction(|c| {
        c.params.radius = 1.5;
        Ok(())
    });
    tracing::debug!(?outcome, "Adjusted radius");
    sphere.update().await?;
    let created = editor.execute(&mut sphere).await?;

    for item in &created {
        let mut mirror = editor.factory(MirrorCommand::new(item.clone(), Vec3::ZERO, Vec3::X));
        mirror.update().await?;
        editor.execute(&mut mirror).await?;
    }
    report(editor, "after mirror");

    editor.undo()?;
    report(editor, "after undo");
    editor.redo()?;
    report(editor, "after redo");
    Ok(())
}

fn report(editor: &Editor, stage: &str) {
    let history = editor.history();
    tracing::info!(
        stage,
        items = editor.db().items().len(),
        undo = ?history.undo_labels(),
        redo = ?history.redo_labels(),
        "Document state"
    );
}
