//! Custom CalDAV requests not covered by libdav.

use http::Method;
use libdav::requests::{DavRequest, ParseResponseError, PreparedRequest};
use quickcal_core::QueryWindow;

// ============================================================================
// Time-range filtered calendar query
// ============================================================================

/// `calendar-query` REPORT for the objects with a VEVENT overlapping a window.
pub struct CalendarQuery<'a> {
    collection_href: &'a str,
    window: &'a QueryWindow,
}

impl<'a> CalendarQuery<'a> {
    pub fn new(collection_href: &'a str, window: &'a QueryWindow) -> Self {
        Self {
            collection_href,
            window,
        }
    }

    fn body(&self) -> String {
        let (start, end) = self.window.caldav_bounds();
        let filter = format!(
            r#"<C:comp-filter name="VCALENDAR"><C:comp-filter name="VEVENT"><C:time-range start="{start}" end="{end}"/></C:comp-filter></C:comp-filter>"#
        );

        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<C:calendar-query xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
  <D:prop><D:getetag/><C:calendar-data/></D:prop>
  <C:filter>{filter}</C:filter>
</C:calendar-query>"#
        )
    }
}

/// A fetched calendar object with its ICS data.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarResource {
    pub href: String,
    pub etag: Option<String>,
    pub data: String,
}

impl DavRequest for CalendarQuery<'_> {
    type Response = Vec<CalendarResource>;
    type ParseError = ParseResponseError;
    type Error<E> = libdav::dav::WebDavError<E>;

    fn prepare_request(&self) -> Result<PreparedRequest, http::Error> {
        Ok(PreparedRequest {
            method: Method::from_bytes(b"REPORT")?,
            path: self.collection_href.to_string(),
            body: self.body(),
            headers: vec![("Depth".to_string(), "1".to_string())],
        })
    }

    fn parse_response(
        &self,
        parts: &http::response::Parts,
        body: &[u8],
    ) -> Result<Self::Response, ParseResponseError> {
        if !parts.status.is_success() {
            return Err(ParseResponseError::BadStatusCode(parts.status));
        }
        parse_calendar_resources(body)
    }
}

/// Parse calendar resources from a multistatus response. Responses without
/// calendar-data are skipped.
pub(crate) fn parse_calendar_resources(body: &[u8]) -> Result<Vec<CalendarResource>, ParseResponseError> {
    let text = std::str::from_utf8(body)?;
    let doc = roxmltree::Document::parse(text)?;

    let mut resources = Vec::new();

    for response in doc.root_element().descendants().filter(|n| n.has_tag_name_local("response")) {
        let Some(href) = child_text(&response, "href") else {
            continue;
        };
        let etag = child_text(&response, "getetag");

        if let Some(data) = child_text(&response, "calendar-data") {
            resources.push(CalendarResource { href, etag, data });
        }
    }

    Ok(resources)
}

// ============================================================================
// Calendar collection listing
// ============================================================================

/// Depth-1 PROPFIND on a calendar home set listing its calendar collections.
pub struct ListCalendarCollections<'a> {
    home_href: &'a str,
}

impl<'a> ListCalendarCollections<'a> {
    pub fn new(home_href: &'a str) -> Self {
        Self { home_href }
    }
}

/// A calendar collection found under the home set.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarCollection {
    pub href: String,
    /// `displayname`, or the last path segment when the server sends none.
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug)]
pub struct ListCalendarCollectionsResponse {
    pub collections: Vec<CalendarCollection>,
}

impl DavRequest for ListCalendarCollections<'_> {
    type Response = ListCalendarCollectionsResponse;
    type ParseError = ParseResponseError;
    type Error<E> = libdav::dav::WebDavError<E>;

    fn prepare_request(&self) -> Result<PreparedRequest, http::Error> {
        let body = r#"<propfind xmlns="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
    <prop>
        <resourcetype/>
        <displayname/>
        <C:calendar-description/>
    </prop>
</propfind>"#
            .to_string();

        Ok(PreparedRequest {
            method: Method::from_bytes(b"PROPFIND")?,
            path: self.home_href.to_string(),
            body,
            headers: vec![("Depth".to_string(), "1".to_string())],
        })
    }

    fn parse_response(
        &self,
        parts: &http::response::Parts,
        body: &[u8],
    ) -> Result<Self::Response, ParseResponseError> {
        if !parts.status.is_success() {
            return Err(ParseResponseError::BadStatusCode(parts.status));
        }

        let collections = parse_calendar_collections(body)?;
        Ok(ListCalendarCollectionsResponse { collections })
    }
}

/// Keep only responses whose resourcetype contains a CalDAV `calendar` element.
pub(crate) fn parse_calendar_collections(
    body: &[u8],
) -> Result<Vec<CalendarCollection>, ParseResponseError> {
    let text = std::str::from_utf8(body)?;
    let doc = roxmltree::Document::parse(text)?;

    let mut collections = Vec::new();

    for response in doc.root_element().descendants().filter(|n| n.has_tag_name_local("response")) {
        let is_calendar = response
            .descendants()
            .filter(|n| n.has_tag_name_local("resourcetype"))
            .any(|rt| rt.children().any(|c| c.has_tag_name_local("calendar")));
        if !is_calendar {
            continue;
        }

        let Some(href) = child_text(&response, "href") else {
            continue;
        };

        let name = child_text(&response, "displayname").unwrap_or_else(|| {
            href.trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string()
        });
        let description = child_text(&response, "calendar-description");

        collections.push(CalendarCollection {
            href,
            name,
            description,
        });
    }

    Ok(collections)
}

trait LocalName {
    fn has_tag_name_local(&self, name: &str) -> bool;
}

impl LocalName for roxmltree::Node<'_, '_> {
    fn has_tag_name_local(&self, name: &str) -> bool {
        self.is_element() && self.tag_name().name() == name
    }
}

/// Trimmed, non-empty text of the first descendant named `name`.
fn child_text(node: &roxmltree::Node<'_, '_>, name: &str) -> Option<String> {
    node.descendants()
        .find(|n| n.has_tag_name_local(name))
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
