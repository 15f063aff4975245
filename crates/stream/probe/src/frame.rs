use sluice_primitives::Asset;

/// STREAM frames relevant to quoting. Anything else is [`Frame::Other`].
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Receiver's asset declaration.
    AssetDetails(Asset),
    /// Receiver closed the connection.
    ConnectionClose {
        /// STREAM error code.
        code: u8,
        /// Free-form reason.
        message: String,
    },
    /// Frame with no bearing on quoting.
    Other,
}
