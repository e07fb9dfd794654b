//! Lookup errors raised while assembling or disassembling.

/// Errors raised when assignments or images do not fit the database.
///
/// Every variant aborts the conversion before any output is produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// An assignment names a feature the database does not have.
    #[error("unknown feature '{name}'{}", at_line(.line))]
    UnknownFeature {
        /// The feature name.
        name: String,
        /// Source line of the assignment, if parsed from text.
        line: Option<usize>,
    },

    /// An assignment's width differs from the feature's declared width.
    #[error("feature '{name}' is declared with width {declared} but assigned width {assigned}{}", at_line(.line))]
    WidthMismatch {
        /// The feature name.
        name: String,
        /// Width in the database.
        declared: u32,
        /// Width of the assigned value.
        assigned: u32,
        /// Source line of the assignment, if parsed from text.
        line: Option<usize>,
    },

    /// The image was not sized for the database's device geometry.
    #[error("image geometry does not match the database for device '{device}'")]
    GeometryMismatch {
        /// The database device.
        device: String,
    },

    /// A default-assignment name that matches no feature.
    #[error("no feature matches '{0}'")]
    NoMatch(String),
}

fn at_line(line: &Option<usize>) -> String {
    line.map(|l| format!(" (line {l})")).unwrap_or_default()
}
