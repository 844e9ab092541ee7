//! Text readout of a [`LinkSnapshot`]

use super::LinkSnapshot;
use crate::controller::sample::{OutputName, AXIS_PREFIX, BUTTON_PREFIX};
use crate::controller::session::SessionStatus;
use std::fmt;

/// Renders the controller status, then all axes and all buttons by name
pub fn render_status(snapshot: &LinkSnapshot) -> String {
    StatusReport(snapshot).to_string()
}

struct StatusReport<'a>(&'a LinkSnapshot);

impl fmt::Display for StatusReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.0;

        match &snapshot.status {
            SessionStatus::Connected { name, kind } => {
                writeln!(f, "Controller: {} ({})", name, kind)?
            }
            SessionStatus::NoController => writeln!(f, "No controller detected.")?,
        }
        writeln!(
            f,
            "Updated {} (tick {})",
            snapshot.taken_at.format("%H:%M:%S.%3f"),
            snapshot.tick
        )?;

        for (title, prefix) in [("Axes:", AXIS_PREFIX), ("Buttons:", BUTTON_PREFIX)] {
            writeln!(f, "{}", title)?;
            for (name, value) in snapshot.properties.with_prefix(prefix) {
                writeln!(f, "  {}: {}", OutputName::from(name).label(), value)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::session::DeviceKind;
    use crate::outputs::property::{PropertyBag, PropertyValue};
    use chrono::{Local, TimeZone};

    fn snapshot(status: SessionStatus, properties: PropertyBag) -> LinkSnapshot {
        LinkSnapshot {
            tick: 7,
            status,
            properties,
            taken_at: Local.with_ymd_and_hms(2024, 5, 1, 12, 30, 15).unwrap(),
        }
    }

    #[test]
    fn lists_axes_then_buttons_sorted() {
        let mut properties = PropertyBag::new();
        properties.insert("controller_button_b", PropertyValue::Bool(false));
        properties.insert("controller_axis_lefty", PropertyValue::Float(-0.5));
        properties.insert("controller_button_a", PropertyValue::Bool(true));
        properties.insert("controller_axis_leftx", PropertyValue::Float(1.0));
        properties.insert("location", PropertyValue::Float(3.0));

        let status = SessionStatus::Connected {
            name: "Pad".to_string(),
            kind: DeviceKind::MappedController,
        };
        let text = render_status(&snapshot(status, properties));

        assert_eq!(
            text,
            "Controller: Pad (Game Controller)\n\
             Updated 12:30:15.000 (tick 7)\n\
             Axes:\n  Leftx: 1.000\n  Lefty: -0.500\n\
             Buttons:\n  A: on\n  B: off\n"
        );
    }

    #[test]
    fn reports_missing_controller() {
        let text = render_status(&snapshot(SessionStatus::NoController, PropertyBag::new()));
        assert!(text.starts_with("No controller detected.\n"));
        assert!(text.ends_with("Axes:\nButtons:\n"));
    }
}
