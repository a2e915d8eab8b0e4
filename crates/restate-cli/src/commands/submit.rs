//! The `restate submit` command.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use restate_core::model::{Attachment, Caller, Submission};

use super::{format_rate, format_time, Session};

pub struct SubmitArgs {
    pub original: Option<String>,
    pub attach: Option<PathBuf>,
    pub user: Option<String>,
    pub user_file: Option<PathBuf>,
    pub owner: Option<i64>,
    pub name: Option<String>,
    pub json: bool,
}

pub async fn execute(session: &Session, args: SubmitArgs) -> Result<()> {
    let user_text = match (args.user, args.user_file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, None) => bail!("a restatement is required (--user or --user-file)"),
    };

    let attachment = args.attach.as_deref().map(read_attachment).transpose()?;

    let caller = match args.owner {
        Some(id) => Caller::owner(id, args.name),
        None => Caller::anonymous(),
    };

    let outcome = session
        .service
        .submit(
            &caller,
            Submission {
                original_text: args.original,
                user_text,
                attachment,
            },
        )
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    let result = &outcome.result;
    println!(
        "Score: {} (engine: {})",
        format_rate(result.matching_rate),
        session.service.engine_name()
    );
    match (outcome.record_id, outcome.version_no) {
        (Some(id), Some(version)) => println!("Saved record #{id} (version {version})"),
        _ => println!("Not saved (anonymous submission)"),
    }
    if !outcome.subject.is_empty() {
        println!("Subject: {}", outcome.subject);
    }
    println!("Hash: {}", outcome.content_hash.short());
    println!("Created: {}", format_time(&outcome.created_at));
    println!(
        "Words: {} matched / {} original / {} yours",
        result.matched_words, result.total_original_words, result.total_user_words
    );
    print_keywords("Matched", &result.keyword_matches);
    print_keywords("Missed", &result.missed_keywords);
    print_keywords("Extra", &result.extra_keywords);

    Ok(())
}

fn print_keywords(label: &str, words: &[String]) {
    if !words.is_empty() {
        println!("{label}: {}", words.join(", "));
    }
}

fn read_attachment(path: &Path) -> Result<Attachment> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let content_type = match path.extension().and_then(|e| e.to_str()) {
        Some("txt") => Some("text/plain"),
        Some("md") => Some("text/markdown"),
        _ => None,
    };
    Ok(Attachment {
        file_name: path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned()),
        content_type: content_type.map(str::to_string),
        bytes,
    })
}
