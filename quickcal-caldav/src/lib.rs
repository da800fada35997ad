//! CalDAV transport for quickcal, built on libdav.
//!
//! - [`discover_calendars`]: principal, then calendar home set, then its calendar collections
//! - [`query_in_range`]: calendar objects overlapping a [`QueryWindow`]
//! - [`put_object`]: upload a new calendar object

mod client;
mod requests;

use anyhow::{Context, Result};
use libdav::caldav::FindCalendarHomeSet;
use libdav::dav::{PutResource, mime_types};
use quickcal_core::QueryWindow;
use tracing::debug;

pub use client::{DavClient, create_client, url_to_href};
pub use requests::{CalendarCollection, CalendarQuery, CalendarResource, ListCalendarCollections};

/// List the calendar collections of the authenticated user.
pub async fn discover_calendars(client: &DavClient) -> Result<Vec<CalendarCollection>> {
    let principal = client
        .find_current_user_principal()
        .await
        .context("Failed to find current user principal")?
        .ok_or_else(|| anyhow::anyhow!("Server did not report a principal. Check the credentials."))?;

    let home_set_response = client
        .request(FindCalendarHomeSet::new(&principal))
        .await
        .context("Failed to find calendar home set")?;

    let mut collections = Vec::new();

    for home in home_set_response.home_sets {
        debug!(home = home.path(), "Listing calendar home set");

        let response = client
            .request(ListCalendarCollections::new(home.path()))
            .await
            .with_context(|| format!("Failed to list calendars in {}", home.path()))?;

        collections.extend(response.collections);
    }

    Ok(collections)
}

/// Fetch the calendar objects in `collection` with a VEVENT overlapping `window`.
pub async fn query_in_range(
    client: &DavClient,
    collection: &str,
    window: &QueryWindow,
) -> Result<Vec<CalendarResource>> {
    let href = url_to_href(collection);

    let resources = client
        .request(CalendarQuery::new(&href, window))
        .await
        .with_context(|| format!("Failed to query {}", href))?;

    debug!(collection = %href, count = resources.len(), "Fetched calendar objects");

    Ok(resources)
}

/// Create the resource at `href`. Fails if it already exists (`If-None-Match: *`).
pub async fn put_object(client: &DavClient, href: &str, ics: &str) -> Result<()> {
    let href = url_to_href(href);

    client
        .request(PutResource::new(&href).create(ics, mime_types::CALENDAR))
        .await
        .with_context(|| format!("Failed to create {}", href))?;

    debug!(href = %href, "Created calendar object");

    Ok(())
}
