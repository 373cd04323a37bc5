//! Quiz command handlers

use std::collections::BTreeMap;

use anyhow::Result;

use lectern_core::{QuizScore, SessionUser, Store};

use crate::commands::session;
use crate::output::{Output, OutputFormat};

/// Record a graded quiz attempt for the current user
pub fn record(
    store: &mut Store,
    session: Option<&SessionUser>,
    chapter: u32,
    correct: u32,
    total: u32,
    output: &Output,
) -> Result<()> {
    let user = session::require(session)?;
    if total == 0 {
        anyhow::bail!("A quiz needs at least one question (--total must be > 0).");
    }
    if correct > total {
        anyhow::bail!("--correct cannot exceed --total.");
    }

    let score = QuizScore::from_counts(correct, total);
    let result = store
        .quiz_results()
        .record(&user.id, chapter, score, BTreeMap::new());

    // A perfect score completes the chapter, as in the app
    if score.is_perfect {
        store.modules().mark_chapter_completed(chapter);
    }

    match output.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(&result)?);
        }
        OutputFormat::Quiet => {
            println!("{}", result.id);
        }
        OutputFormat::Human => {
            println!(
                "Recorded: chapter {} - {}/{} ({}%)",
                chapter, score.correct, score.total, score.percentage
            );
            if score.is_perfect {
                println!("Perfect score! Chapter {} marked completed.", chapter);
            }
        }
    }

    Ok(())
}

/// List quiz attempts for the current user
pub fn list(
    store: &mut Store,
    session: Option<&SessionUser>,
    chapter: Option<u32>,
    output: &Output,
) -> Result<()> {
    let user = session::require(session)?;
    let results = store.quiz_results().filtered(Some(&user.id), chapter);

    match output.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(&results)?);
        }
        OutputFormat::Quiet => {
            for result in &results {
                println!("{}", result.id);
            }
        }
        OutputFormat::Human => {
            if results.is_empty() {
                match chapter {
                    Some(chapter) => println!("No attempts for chapter {} yet.", chapter),
                    None => println!("No attempts yet."),
                }
                return Ok(());
            }
            for result in &results {
                output.print_quiz_result_row(result);
            }
            println!();
            println!("{} attempt(s)", results.len());
        }
    }

    Ok(())
}
