use std::fmt;

/// Linear lifecycle of one export run. There is no branching and no rollback:
/// a failure at any stage ends the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ExportStage {
    Init,
    Connected,
    HeaderFetched,
    Streaming,
    StreamDone,
    Archived,
    CleanedUp,
}

impl ExportStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportStage::Init => "Init",
            ExportStage::Connected => "Connected",
            ExportStage::HeaderFetched => "HeaderFetched",
            ExportStage::Streaming => "Streaming",
            ExportStage::StreamDone => "StreamDone",
            ExportStage::Archived => "Archived",
            ExportStage::CleanedUp => "CleanedUp",
        }
    }

    /// The only stage allowed to follow this one.
    pub fn next(&self) -> Option<ExportStage> {
        match self {
            ExportStage::Init => Some(ExportStage::Connected),
            ExportStage::Connected => Some(ExportStage::HeaderFetched),
            ExportStage::HeaderFetched => Some(ExportStage::Streaming),
            ExportStage::Streaming => Some(ExportStage::StreamDone),
            ExportStage::StreamDone => Some(ExportStage::Archived),
            ExportStage::Archived => Some(ExportStage::CleanedUp),
            ExportStage::CleanedUp => None,
        }
    }
}

impl fmt::Display for ExportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
