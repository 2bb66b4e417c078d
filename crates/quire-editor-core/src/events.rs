//! Notifications drained by the host with `RichTextEditor::take_events`.

use crate::tabs::TabStop;

#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum EditorEvent {
    /// The serialized value settled to a new string.
    ValueChanged(String),
    /// The HTML projection settled to a new string.
    HtmlChanged(String),
    /// A committed interaction changed the value since the last `Change`.
    Change { value: String },
    /// The tab stop list was edited through the ruler.
    TabStopsChanged(Vec<TabStop>),
}
