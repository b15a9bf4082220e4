use serde::{Deserialize, Serialize};

/// A raster image ready to be embedded as a `DCTDecode` XObject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    pub width: u32,
    pub height: u32,
    /// Baseline RGB JPEG data.
    pub jpeg: Vec<u8>,
}

/// One unit of document content, laid out top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Title(String),
    /// Small grey line under the title.
    Meta(String),
    Heading(String),
    Paragraph(String),
    /// Monospaced lines, never re-wrapped unless wider than the page.
    Preformatted(Vec<String>),
    KeyValues(Vec<(String, String)>),
    Bullets(Vec<String>),
    /// Scaled to the content width, or down to the page height.
    Image(EmbeddedImage),
    /// Italic-free caption set in small type, centered.
    Caption(String),
    PageBreak,
}

/// Everything needed to produce one PDF.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentSpec {
    pub title: String,
    pub author: Option<String>,
    pub subject: Option<String>,
    /// Pre-formatted PDF date, e.g. `D:20240501123000Z`.
    pub created: Option<String>,
    pub blocks: Vec<Block>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub page_count: usize,
    pub creator: Option<String>,
    pub producer: Option<String>,
}
