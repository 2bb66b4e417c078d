//! Tab stops: host-configured positions and alignment rules.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How text following a tab aligns to its stop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabDirection {
    /// Text starts at the stop.
    Left,
    /// Text ends at the stop.
    Right,
    /// Text is centred on the stop.
    Middle,
}

/// A stop at `position` layout units from the content edge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TabStop {
    pub direction: TabDirection,
    pub position: f32,
}

impl TabStop {
    pub fn new(direction: TabDirection, position: f32) -> Self {
        Self {
            direction,
            position,
        }
    }

    pub fn left(position: f32) -> Self {
        Self::new(TabDirection::Left, position)
    }
}

/// Check a stop list before it is handed to layout.
pub fn validate(stops: &[TabStop]) -> Result<(), ConfigError> {
    for (index, stop) in stops.iter().enumerate() {
        if !stop.position.is_finite() || stop.position < 0.0 {
            return Err(ConfigError::InvalidTabStop {
                index,
                position: stop.position,
            });
        }
    }
    Ok(())
}

/// Parse a JSON list such as `[{"direction":"left","position":100}]`.
pub fn parse_stops(json: &str) -> Result<Vec<TabStop>, ConfigError> {
    let stops: Vec<TabStop> =
        serde_json::from_str(json).map_err(|e| ConfigError::TabStopList(e.to_string()))?;
    validate(&stops)?;
    Ok(stops)
}

/// Insert a left stop at `position`, keeping the list ordered.
///
/// Returns the index the stop landed at.
pub fn add_stop(stops: &mut Vec<TabStop>, position: f32) -> usize {
    let index = stops.partition_point(|s| s.position <= position);
    stops.insert(index, TabStop::left(position));
    index
}

/// Advance the stop at `index` through left, right, middle, then removal.
///
/// Returns the new stop, or `None` once it has been removed.
pub fn cycle_stop(stops: &mut Vec<TabStop>, index: usize) -> Option<TabStop> {
    let next = match stops.get(index)?.direction {
        TabDirection::Left => TabDirection::Right,
        TabDirection::Right => TabDirection::Middle,
        TabDirection::Middle => {
            stops.remove(index);
            return None;
        }
    };
    stops[index].direction = next;
    Some(stops[index])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stops() {
        let stops =
            parse_stops(r#"[{"direction":"left","position":100},{"direction":"middle","position":250.5}]"#)
                .unwrap();
        assert_eq!(
            stops,
            vec![
                TabStop::left(100.0),
                TabStop::new(TabDirection::Middle, 250.5)
            ]
        );
    }

    #[test]
    fn test_rejects_bad_stops() {
        assert!(matches!(
            parse_stops(r#"[{"direction":"left","position":-4}]"#),
            Err(ConfigError::InvalidTabStop { index: 0, .. })
        ));
        assert!(matches!(
            parse_stops(r#"[{"direction":"up","position":4}]"#),
            Err(ConfigError::TabStopList(_))
        ));
        assert!(matches!(
            parse_stops(r#"{"direction":"left"}"#),
            Err(ConfigError::TabStopList(_))
        ));
    }

    #[test]
    fn test_add_stop_keeps_order() {
        let mut stops = vec![TabStop::left(50.0), TabStop::left(200.0)];
        assert_eq!(add_stop(&mut stops, 120.0), 1);
        let positions: Vec<_> = stops.iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![50.0, 120.0, 200.0]);
    }

    #[test]
    fn test_cycle_stop() {
        let mut stops = vec![TabStop::left(50.0)];
        assert_eq!(cycle_stop(&mut stops, 0).unwrap().direction, TabDirection::Right);
        assert_eq!(cycle_stop(&mut stops, 0).unwrap().direction, TabDirection::Middle);
        assert_eq!(cycle_stop(&mut stops, 0), None);
        assert!(stops.is_empty());
        assert_eq!(cycle_stop(&mut stops, 0), None);
    }
}
