//! ICS text decoding using the icalendar crate's parser.

use icalendar::parser::{self, read_calendar, unfold};

use super::{Component, Property, VCALENDAR};
use crate::error::{QuickCalError, QuickCalResult};

/// Decode the ICS text of one calendar resource into its root component.
///
/// Text wrapped in `BEGIN:VCALENDAR` yields a VCALENDAR root. A bare component
/// (e.g. a lone VEVENT) is returned as the root as-is, so callers can tell the
/// two apart.
pub fn decode(content: &str) -> QuickCalResult<Component> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).map_err(|e| QuickCalError::IcsParse(e.to_string()))?;

    let mut components: Vec<Component> = calendar.components.iter().map(to_component).collect();

    if components.len() == 1 && components[0].is(VCALENDAR) {
        return Ok(components.remove(0));
    }

    if has_calendar_wrapper(&unfolded) {
        return Ok(Component {
            name: VCALENDAR.to_string(),
            properties: calendar.properties.iter().map(to_property).collect(),
            components,
        });
    }

    match components.len() {
        0 => Err(QuickCalError::IcsParse("no components found".into())),
        1 => Ok(components.remove(0)),
        n => Err(QuickCalError::IcsParse(format!(
            "{n} top-level components without a VCALENDAR wrapper"
        ))),
    }
}

fn has_calendar_wrapper(unfolded: &str) -> bool {
    unfolded
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .is_some_and(|line| line.eq_ignore_ascii_case("BEGIN:VCALENDAR"))
}

fn to_component(component: &parser::Component) -> Component {
    Component {
        name: component.name.to_string(),
        properties: component.properties.iter().map(to_property).collect(),
        components: component.components.iter().map(to_component).collect(),
    }
}

fn to_property(prop: &parser::Property) -> Property {
    let params = prop
        .params
        .iter()
        .map(|p| {
            let value = p.val.as_ref().map(|v| v.to_string()).unwrap_or_default();
            (p.key.to_string(), value)
        })
        .collect();

    Property {
        name: prop.name.to_string(),
        value: prop.val.to_string(),
        params,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ics::{DTSTART, PARAM_TZID, SUMMARY, VEVENT};

    #[test]
    fn test_decode_keeps_calendar_root_and_params() {
        let ics = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:TEST\r\n\
BEGIN:VEVENT\r\n\
UID:test-123\r\n\
SUMMARY:Standup\r\n\
DTSTART;TZID=Europe/Berlin:20250601T090000\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

        let root = decode(ics).expect("Should decode");

        assert!(root.is(VCALENDAR));
        assert_eq!(root.components.len(), 1);
        let event = &root.components[0];
        assert!(event.is(VEVENT));
        assert_eq!(event.text(SUMMARY), "Standup");
        let start = event.find_prop(DTSTART).expect("DTSTART");
        assert_eq!(start.param(PARAM_TZID), Some("Europe/Berlin"));
        assert_eq!(start.value, "20250601T090000");
    }

    #[test]
    fn test_decode_unfolds_long_lines() {
        let ics = "BEGIN:VCALENDAR\r\n\
BEGIN:VEVENT\r\n\
UID:test-123\r\n\
SUMMARY:Quarterly \r\n planning\r\n\
DTSTART;VALUE=DATE:20250610\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

        let root = decode(ics).expect("Should decode");
        assert_eq!(root.components[0].text(SUMMARY), "Quarterly planning");
    }
}
