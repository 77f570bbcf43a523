//! The interactive read-eval-print loop.

use anyhow::Result;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use std::io::Stdout;

use keel_core::command::Command;

use crate::app::{App, Flow};
use crate::helper::CliHelper;
use crate::theme::{self, Status};

pub async fn run(app: &mut App<Stdout>) -> Result<()> {
    let mut rl: Editor<CliHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    app.welcome()?;

    loop {
        if let Some(helper) = rl.helper_mut() {
            helper.set_project_names(app.project_names());
        }

        match rl.readline(&app.prompt()) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = rl.add_history_entry(line.as_str());
                }

                if app.handle_line(&line).await? == Flow::Exit {
                    offer_save(&mut rl, app)?;
                    println!("{}", theme::status(Status::Success, "Goodbye!"));
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!(
                    "{}",
                    theme::status(
                        Status::Warning,
                        "Interrupted. Type exit to quit or continue chatting."
                    )
                );
            }
            Err(ReadlineError::Eof) => {
                println!("{}", theme::status(Status::Success, "Goodbye!"));
                break;
            }
            Err(err) => {
                tracing::error!("Readline failed: {}", err);
                return Err(err.into());
            }
        }
    }

    Ok(())
}

fn offer_save(rl: &mut Editor<CliHelper, DefaultHistory>, app: &mut App<Stdout>) -> Result<()> {
    if !app.should_offer_save() {
        return Ok(());
    }

    match rl.readline("Save current session? (y/n): ") {
        Ok(answer) if answer.trim().eq_ignore_ascii_case("y") => app.execute(Command::SessionSave),
        Ok(_) | Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(()),
        Err(err) => Err(err.into()),
    }
}
