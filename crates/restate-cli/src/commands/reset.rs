//! The `restate reset` command.

use anyhow::Result;

use restate_core::model::ResetStatus;

use super::Session;

pub async fn execute(session: &Session, id: i64) -> Result<()> {
    let outcome = session.service.reset_understanding(id).await?;

    match outcome.status {
        ResetStatus::NotApplicable => println!("Record #{id}: {}", outcome.message()),
        ResetStatus::Reopened => println!(
            "{}: record #{} (version {}) is ready for a new attempt",
            outcome.message(),
            outcome.new_record_id(),
            outcome.version_no()
        ),
        ResetStatus::Created => println!(
            "{}: created record #{} (version {}) for a new attempt",
            outcome.message(),
            outcome.new_record_id(),
            outcome.version_no()
        ),
    }

    Ok(())
}
