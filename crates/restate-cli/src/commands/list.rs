//! The listing commands: `list`, `hidden`, `latest`, `related` and `trend`.

use anyhow::{bail, Context, Result};

use restate_core::hashing::ContentHash;
use restate_core::model::{LatestQuery, SearchKind};

use super::{format_rate, print_page_footer, print_records, print_summaries, Paging, Session};

pub async fn visible(session: &Session, owner: i64, paging: Paging) -> Result<()> {
    let request = paging.request(session.config.default_page_size);
    let page = session.service.list_visible(owner, request).await?;

    if page.items.is_empty() {
        println!("No records.");
        return Ok(());
    }
    print_summaries(&page.items, false);
    print_page_footer(page.page, page.total_items, page.total_pages());
    Ok(())
}

pub async fn hidden(session: &Session, owner: i64, paging: Paging) -> Result<()> {
    let request = paging.request(session.config.default_page_size);
    let page = session.service.list_hidden(owner, request).await?;
    let count = session.service.count_hidden(owner).await?;

    println!("{count} hidden record(s)");
    if !page.items.is_empty() {
        print_summaries(&page.items, true);
        print_page_footer(page.page, page.total_items, page.total_pages());
    }
    Ok(())
}

pub async fn latest(
    session: &Session,
    owner: Option<i64>,
    keyword: Option<String>,
    search_type: SearchKind,
    paging: Paging,
) -> Result<()> {
    let query = LatestQuery::new(owner, keyword.as_deref(), Some(search_type));
    let request = paging.request(session.config.default_page_size);
    let page = session
        .service
        .list_latest_per_original(&query, request)
        .await?;

    if page.items.is_empty() {
        println!("No records.");
        return Ok(());
    }
    print_records(&page.items);
    print_page_footer(page.page, page.total_items, page.total_pages());
    Ok(())
}

pub async fn related(session: &Session, id: i64, paging: Paging) -> Result<()> {
    let request = paging.request(session.config.related_page_size);
    let page = session.service.list_related(id, request).await?;

    if page.items.is_empty() {
        println!("No other attempts at this original.");
        return Ok(());
    }
    print_records(&page.items);
    print_page_footer(page.page, page.total_items, page.total_pages());
    Ok(())
}

pub async fn trend(
    session: &Session,
    owner: i64,
    hash: Option<String>,
    record: Option<i64>,
) -> Result<()> {
    let hash = match (hash, record) {
        (Some(hex), _) => ContentHash::from_hex(hex).context("invalid --hash")?,
        (None, Some(id)) => session.service.get_record(id).await?.content_hash,
        (None, None) => bail!("either --hash or --record is required"),
    };

    let history = session.service.list_trend(owner, &hash).await?;
    let (Some(first), Some(last)) = (history.first(), history.last()) else {
        println!("No attempts by owner {owner} for {}.", hash.short());
        return Ok(());
    };

    print_records(&history);
    println!(
        "{} attempt(s), {} -> {} ({:+.2} points)",
        history.len(),
        format_rate(first.matching_rate),
        format_rate(last.matching_rate),
        last.matching_rate - first.matching_rate
    );
    Ok(())
}
