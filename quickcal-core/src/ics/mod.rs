//! Decoded iCalendar object model.
//!
//! Calendar objects coming back from a CalDAV server are decoded into an owned
//! tree of [`Component`]s and [`Property`]s. The projector only ever looks at this
//! tree, so it can be exercised without going through ICS text.

mod decode;
mod generate;

pub use decode::decode;
pub use generate::generate_ics;

pub const VCALENDAR: &str = "VCALENDAR";
pub const VEVENT: &str = "VEVENT";
pub const VALARM: &str = "VALARM";

pub const UID: &str = "UID";
pub const SUMMARY: &str = "SUMMARY";
pub const DTSTART: &str = "DTSTART";
pub const DTEND: &str = "DTEND";
pub const RRULE: &str = "RRULE";
pub const EXDATE: &str = "EXDATE";
pub const RECURRENCE_ID: &str = "RECURRENCE-ID";

pub const PARAM_TZID: &str = "TZID";
pub const PARAM_VALUE: &str = "VALUE";
pub const VALUE_DATE: &str = "DATE";

/// Layout of DATE values (`20250610`).
pub const DATE_LAYOUT: &str = "%Y%m%d";
/// Layout of local DATE-TIME values (`20250601T090000`).
pub const DATE_TIME_LAYOUT: &str = "%Y%m%dT%H%M%S";

/// A calendar object as returned by the server: the root component of one resource.
pub type CalendarObject = Component;

/// A named iCalendar component (VCALENDAR, VEVENT, VALARM, ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Component {
    pub name: String,
    pub properties: Vec<Property>,
    pub components: Vec<Component>,
}

impl Component {
    pub fn new(name: &str) -> Self {
        Component {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// First property with the given name.
    pub fn find_prop(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.is(name))
    }

    /// All properties with the given name, in document order.
    pub fn props<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Property> {
        self.properties.iter().filter(move |p| p.is(name))
    }

    /// Value of the first property with the given name, or "" when absent.
    pub fn text(&self, name: &str) -> &str {
        self.find_prop(name).map(|p| p.value.as_str()).unwrap_or_default()
    }

    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    pub fn with_component(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }
}

/// A content line: name, parameters and raw value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Property {
    pub name: String,
    pub value: String,
    pub params: Vec<(String, String)>,
}

impl Property {
    pub fn new(name: &str, value: &str) -> Self {
        Property {
            name: name.to_string(),
            value: value.to_string(),
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: &str) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Value of a parameter; empty parameter values count as absent.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookups_ignore_ascii_case() {
        let event = Component::new("vevent")
            .with_property(Property::new("dtstart", "20250610").with_param("value", "DATE"));

        assert!(event.is(VEVENT));
        let start = event.find_prop(DTSTART).expect("DTSTART");
        assert_eq!(start.param(PARAM_VALUE), Some("DATE"));
        assert_eq!(start.param(PARAM_TZID), None);
    }

    #[test]
    fn test_missing_text_property_is_empty() {
        let event = Component::new(VEVENT).with_property(Property::new(UID, "abc"));

        assert_eq!(event.text(UID), "abc");
        assert_eq!(event.text(SUMMARY), "");
    }

    #[test]
    fn test_empty_param_value_counts_as_absent() {
        let prop = Property::new(DTSTART, "20250601T090000").with_param(PARAM_TZID, "");
        assert_eq!(prop.param(PARAM_TZID), None);
    }
}
