//! Width measurement used by tab layout.
//!
//! Layout needs rendered widths. Hosts with a real renderer implement
//! [`TextMeasure`]; the built-in [`MonospaceMeasure`] treats every visible
//! character as the same width, which is what headless rendering and tests use.

use quire_delta::{AttributeMap, Embed};

use crate::types::PLACEHOLDER;

/// Measures inline content in layout units.
pub trait TextMeasure {
    /// Width of a run of text with the given formatting.
    fn text_width(&self, text: &str, attributes: Option<&AttributeMap>) -> f32;

    /// Width of an inline embed.
    fn embed_width(&self, embed: &Embed) -> f32;

    /// Width of a literal horizontal tab glyph.
    fn tab_width(&self) -> f32;
}

impl<T: TextMeasure + ?Sized> TextMeasure for &T {
    fn text_width(&self, text: &str, attributes: Option<&AttributeMap>) -> f32 {
        (**self).text_width(text, attributes)
    }

    fn embed_width(&self, embed: &Embed) -> f32 {
        (**self).embed_width(embed)
    }

    fn tab_width(&self) -> f32 {
        (**self).tab_width()
    }
}

impl<T: TextMeasure + ?Sized> TextMeasure for Box<T> {
    fn text_width(&self, text: &str, attributes: Option<&AttributeMap>) -> f32 {
        (**self).text_width(text, attributes)
    }

    fn embed_width(&self, embed: &Embed) -> f32 {
        (**self).embed_width(embed)
    }

    fn tab_width(&self) -> f32 {
        (**self).tab_width()
    }
}

/// Fixed-advance measurement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonospaceMeasure {
    pub char_width: f32,
    pub tab_width: f32,
}

impl Default for MonospaceMeasure {
    fn default() -> Self {
        Self {
            char_width: 8.0,
            tab_width: 32.0,
        }
    }
}

impl TextMeasure for MonospaceMeasure {
    fn text_width(&self, text: &str, _attributes: Option<&AttributeMap>) -> f32 {
        text.chars()
            .map(|c| match c {
                PLACEHOLDER => 0.0,
                '\t' => self.tab_width,
                _ => self.char_width,
            })
            .sum()
    }

    fn embed_width(&self, embed: &Embed) -> f32 {
        match embed.kind.as_str() {
            // Images are sized by the host; headless they take no space
            "image" => 0.0,
            _ => self.char_width,
        }
    }

    fn tab_width(&self) -> f32 {
        self.tab_width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monospace_widths() {
        let m = MonospaceMeasure::default();
        assert_eq!(m.text_width("abc", None), 24.0);
        assert_eq!(m.text_width("\u{FEFF}", None), 0.0);
        assert_eq!(m.text_width("a\tb", None), 48.0);
        assert_eq!(m.embed_width(&Embed::new("nbsp", true)), 8.0);
    }
}
