//! Error types for the editor core.
//!
//! Configuration errors are returned at setup. Value errors and guard
//! rollbacks never reach the caller: they are logged and pushed onto the
//! editor's diagnostic channel as [`EditorDiagnostic`].

use miette::Diagnostic;
use quire_delta::DeltaError;
use smol_str::SmolStr;
use thiserror::Error;

use crate::registry::RegionKind;
use crate::types::Selection;

/// Setup-time errors: a bad registry or tab stop list.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
#[non_exhaustive]
pub enum ConfigError {
    /// A region kind was registered twice.
    #[error("region kind `{0}` is already registered")]
    #[diagnostic(code(quire::config::duplicate_region))]
    DuplicateRegion(RegionKind),

    /// A region kind was referenced without being registered.
    #[error("region kind `{0}` is not registered")]
    #[diagnostic(
        code(quire::config::unregistered_region),
        help("register every kind before naming it as an allowed child")
    )]
    UnregisteredRegion(RegionKind),

    /// A tab stop position was negative or not finite.
    #[error("tab stop {index} has invalid position {position}")]
    #[diagnostic(
        code(quire::config::tab_stop),
        help("tab stop positions must be finite and non-negative")
    )]
    InvalidTabStop { index: usize, position: f32 },

    /// A serialized tab stop list could not be read.
    #[error("malformed tab stop list: {0}")]
    #[diagnostic(code(quire::config::tab_stop_list))]
    TabStopList(String),

    /// A serialized editor configuration could not be read.
    #[error("malformed editor configuration: {0}")]
    #[diagnostic(code(quire::config::parse))]
    Parse(String),
}

/// A rejected external value.
#[derive(Error, Debug, Diagnostic)]
#[error("invalid editor value: {source}")]
#[diagnostic(
    code(quire::value),
    help("the value must be a JSON array of insert operations")
)]
pub struct ValueError {
    pub source: DeltaError,
    /// The string that was rejected.
    pub rejected: String,
}

/// Errors returned by editing commands.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EditError {
    #[error("editor is disabled")]
    Disabled,

    #[error("editor is read-only")]
    ReadOnly,

    #[error("unknown format `{0}`")]
    UnknownFormat(SmolStr),

    #[error("position {index} is outside the document (length {len})")]
    OutOfBounds { index: usize, len: usize },

    #[error("no tab stop at index {0}")]
    NoTabStop(usize),
}

/// Recoverable conditions reported on the diagnostic channel.
#[derive(Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum EditorDiagnostic {
    #[error(transparent)]
    #[diagnostic(transparent)]
    InvalidValue(#[from] ValueError),

    /// A user edit would have removed a read-only section and was reverted.
    #[error(
        "edit reverted: read-only sections went from {before} to {after}"
    )]
    #[diagnostic(code(quire::guard::rollback), severity(Warning))]
    GuardRollback {
        before: usize,
        after: usize,
        restored: Selection,
    },
}
