use std::collections::BTreeSet;

use crate::{error::Result, spotify::CatalogClient, types::PageCursor};

/// Collects the ids of every artist the user follows.
///
/// Pages are requested strictly one after another since each cursor comes
/// from the previous response. Any failed page fails the whole resolution;
/// pages fetched before it are discarded.
///
/// Pagination ends when a page carries no cursor, or carries the cursor that
/// was just used (guards against an upstream that keeps echoing the last one).
///
/// # Returns
///
/// The distinct artist ids, empty when the user follows nobody.
///
/// # Errors
///
/// Whatever the failing page request returned.
pub async fn followed_artist_ids<C>(catalog: &C) -> Result<BTreeSet<String>>
where
    C: CatalogClient + ?Sized,
{
    let mut artist_ids = BTreeSet::new();
    let mut cursor: Option<PageCursor> = None;
    let mut pages = 0usize;

    loop {
        let page = catalog.followed_artists(cursor.as_ref()).await?;
        pages += 1;
        artist_ids.extend(page.artist_ids);

        match page.next {
            Some(next) if Some(&next) != cursor.as_ref() => cursor = Some(next),
            _ => break,
        }
    }

    tracing::debug!(artists = artist_ids.len(), pages, "resolved followed artists");
    Ok(artist_ids)
}
