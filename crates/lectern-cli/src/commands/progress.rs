//! Progress command handlers

use anyhow::Result;

use lectern_core::{SessionUser, Store};

use crate::output::{Output, OutputFormat};

/// Show completion status per chapter, with attempt counts
pub fn show(
    store: &mut Store,
    session: Option<&SessionUser>,
    chapters: u32,
    output: &Output,
) -> Result<()> {
    let user_id = session.map(|s| s.id.as_str());

    let mut rows = Vec::new();
    for chapter in 1..=chapters {
        let completed = store.modules().is_chapter_completed(chapter);
        let attempts = store
            .quiz_results()
            .filtered(user_id, Some(chapter))
            .len();
        rows.push((chapter, completed, attempts));
    }
    let completed_count = rows.iter().filter(|(_, completed, _)| *completed).count();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "chapters": rows
                        .iter()
                        .map(|(chapter, completed, attempts)| serde_json::json!({
                            "chapter": chapter,
                            "completed": completed,
                            "attempts": attempts,
                        }))
                        .collect::<Vec<_>>(),
                    "completed": completed_count,
                    "total": chapters,
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}/{}", completed_count, chapters);
        }
        OutputFormat::Human => {
            for (chapter, completed, attempts) in &rows {
                let mark = if *completed { "x" } else { " " };
                let attempts_note = match attempts {
                    0 => String::new(),
                    1 => "  (1 attempt)".to_string(),
                    n => format!("  ({} attempts)", n),
                };
                println!("[{}] Chapter {}{}", mark, chapter, attempts_note);
            }
            println!();
            println!("{} of {} chapters completed", completed_count, chapters);
        }
    }

    Ok(())
}

/// Mark a chapter completed
pub fn complete(store: &mut Store, chapter: u32, output: &Output) -> Result<()> {
    store.modules().mark_chapter_completed(chapter);

    if !output.is_quiet() {
        println!("Chapter {} marked completed.", chapter);
    }
    Ok(())
}

/// Mark a chapter not completed
pub fn uncomplete(store: &mut Store, chapter: u32, output: &Output) -> Result<()> {
    let existed = store.modules().by_chapter(chapter).is_some();
    store.modules().mark_chapter_incomplete(chapter);

    if !output.is_quiet() {
        if existed {
            println!("Chapter {} marked not completed.", chapter);
        } else {
            println!("Chapter {} was never completed; nothing to do.", chapter);
        }
    }
    Ok(())
}
