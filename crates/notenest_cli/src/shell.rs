//! Interactive shell over one notes session.
//!
//! The grace timer is polled before every command, so an undo typed after
//! the window closed finds nothing pending.

use anyhow::Result;
use notenest_core::{
    CommitReport, NoteDraft, NoteId, NoteStore, NotesSession, SaveOutcome, ViewEvent,
};
use std::io::{self, BufRead, Write};

const HELP: &str = "\
Commands:
  list                          Show notes with their index
  add <title> | <content>       Create a note
  edit <index> <title> | <content>
                                Replace a note's title and content
  del <index>[,<index>...]      Delete notes (undoable for a short time)
  undo                          Restore the last deletion
  confirm                       Commit the last deletion now
  help                          Show this text
  quit                          Leave, committing any pending deletion";

pub fn run(mut session: NotesSession<NoteStore>, grace_period_ms: u64) -> Result<()> {
    session.refresh()?;
    println!("{} note(s). Type 'help' for commands.", session.view().len());

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();
    loop {
        print!("notenest> ");
        stdout.flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        if let Some(report) = session.poll() {
            print_commit(&report);
        }

        let input = line.trim();
        let (command, rest) = input.split_once(' ').unwrap_or((input, ""));
        match command {
            "" => {}
            "list" | "ls" => print_view(&session),
            "add" => {
                let (title, content) = split_fields(rest);
                save(&mut session, NoteDraft::new(title, content))?;
            }
            "edit" => {
                let (index, fields) = rest.split_once(' ').unwrap_or((rest, ""));
                match parse_index(index).and_then(|index| session.view().get(index)) {
                    Some(note) => {
                        let id = note.id;
                        let (title, content) = split_fields(fields);
                        save(&mut session, NoteDraft::edit(id, title, content))?;
                    }
                    None => println!("No note at index `{index}`."),
                }
            }
            "del" | "rm" => delete(&mut session, rest, grace_period_ms),
            "undo" => match session.undo() {
                Ok(events) => {
                    println!("Restored.");
                    log_events(&events);
                }
                Err(err) => println!("{err}."),
            },
            "confirm" => match session.confirm_delete() {
                Ok(report) => print_commit(&report),
                Err(err) => println!("{err}."),
            },
            "help" | "?" => println!("{HELP}"),
            "quit" | "exit" => break,
            other => println!("Unknown command `{other}`. Type 'help'."),
        }
    }

    if let Some(report) = session.close() {
        print_commit(&report);
    }
    Ok(())
}

fn save(session: &mut NotesSession<NoteStore>, draft: NoteDraft) -> Result<()> {
    let report = session.save(&draft)?;
    match report.outcome {
        SaveOutcome::Created(id) => println!("Created note {id}."),
        SaveOutcome::Updated(id) => println!("Updated note {id}."),
        SaveOutcome::Missing(id) => println!("Note {id} no longer exists."),
        SaveOutcome::Rejected => println!("Note could not be saved."),
    }
    log_events(&report.events);
    Ok(())
}

fn delete(session: &mut NotesSession<NoteStore>, rest: &str, grace_period_ms: u64) {
    let mut ids: Vec<NoteId> = Vec::new();
    for raw in rest.split(',') {
        match parse_index(raw).and_then(|index| session.view().get(index)) {
            Some(note) => ids.push(note.id),
            None => {
                println!("No note at index `{}`.", raw.trim());
                return;
            }
        }
    }

    match session.delete_ids(&ids) {
        Ok(outcome) => {
            if let Some(report) = outcome.superseded.as_ref() {
                print_commit(report);
            }
            println!(
                "Deleted {} note(s). Type 'undo' within {:.1}s to restore.",
                ids.len(),
                grace_period_ms as f64 / 1000.0
            );
            log_events(&outcome.events);
        }
        Err(err) => println!("{err}."),
    }
}

fn print_view(session: &NotesSession<NoteStore>) {
    if session.view().is_empty() {
        println!("No notes.");
        return;
    }
    for (index, note) in session.view().iter().enumerate() {
        let title = if note.title.is_empty() {
            "(untitled)"
        } else {
            note.title.as_str()
        };
        println!("{index:>3}  {}  {title}", note.timestamp);
    }
}

fn print_commit(report: &CommitReport) {
    if report.is_clean() {
        println!("{} note(s) deleted for good.", report.deleted.len());
    } else {
        println!(
            "{} note(s) deleted; {} were already gone or could not be removed.",
            report.deleted.len(),
            report.unresolved.len()
        );
    }
}

fn log_events(events: &[ViewEvent]) {
    if events.is_empty() {
        return;
    }
    if let Ok(json) = serde_json::to_string(events) {
        log::debug!("event=view_events module=cli status=ok events={json}");
    }
}

fn parse_index(raw: &str) -> Option<usize> {
    raw.trim().parse().ok()
}

fn split_fields(raw: &str) -> (String, String) {
    match raw.split_once('|') {
        Some((title, content)) => (title.trim().to_string(), content.trim().to_string()),
        None => (raw.trim().to_string(), String::new()),
    }
}
