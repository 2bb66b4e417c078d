//! HTML output: the framework-flavoured writer and the public projection.

mod projection;
mod writer;

pub use projection::{HtmlProjection, project};
pub use writer::{EMPTY_DOCUMENT_HTML, HtmlWriter, render_html, write_html_fmt};
