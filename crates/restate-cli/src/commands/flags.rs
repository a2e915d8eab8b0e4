//! The `restate important`, `restate hide` and `restate restore` commands.

use anyhow::Result;

use super::{format_time, Session};

pub async fn important(session: &Session, id: i64) -> Result<()> {
    let flagged = session.service.toggle_important(id).await?;
    if flagged {
        println!("Record #{id} marked important");
    } else {
        println!("Record #{id} no longer important");
    }
    Ok(())
}

pub async fn hide(session: &Session, id: i64) -> Result<()> {
    let record = session.service.hide(id).await?;
    match record.scheduled_deletion() {
        Some(at) => println!(
            "Record #{id} hidden; scheduled for deletion on {}",
            format_time(&at)
        ),
        None => println!("Record #{id} hidden"),
    }
    Ok(())
}

pub async fn restore(session: &Session, id: i64) -> Result<()> {
    session.service.restore(id).await?;
    println!("Record #{id} restored");
    Ok(())
}
