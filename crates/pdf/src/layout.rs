//! Flow layout of [`Block`]s onto fixed-size pages.
//!
//! Coordinates in the output are PDF user space: origin at the bottom-left,
//! y growing upwards, all values in points.

use crate::text::{self, Font};
use crate::types::{Block, DocumentSpec};

pub const PAGE_WIDTH: f32 = 595.0;
pub const PAGE_HEIGHT: f32 = 842.0;
pub const MARGIN: f32 = 50.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
const FOOTER_Y: f32 = 25.0;

const TITLE_SIZE: f32 = 22.0;
const META_SIZE: f32 = 9.0;
const HEADING_SIZE: f32 = 15.0;
const BODY_SIZE: f32 = 10.5;
const MONO_SIZE: f32 = 8.5;
const CAPTION_SIZE: f32 = 8.0;
const LEADING: f32 = 1.35;

const KEY_COLUMN: f32 = 170.0;
const BULLET_INDENT: f32 = 14.0;

pub type Rgb = (f32, f32, f32);

const TEXT_COLOR: Rgb = (0.1, 0.1, 0.12);
const HEADING_COLOR: Rgb = (0.11, 0.27, 0.53);
const MUTED_COLOR: Rgb = (0.42, 0.45, 0.5);

#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub font: Font,
    pub size: f32,
    pub color: Rgb,
    pub x: f32,
    /// Baseline.
    pub y: f32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImagePlacement {
    /// Position of the image among the document's image blocks.
    pub index: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Horizontal rule from `x1` to `x2` at height `y`.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub x1: f32,
    pub x2: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub texts: Vec<TextRun>,
    pub images: Vec<ImagePlacement>,
    pub rules: Vec<Rule>,
}

struct Flow {
    pages: Vec<Page>,
    /// Distance from the top edge of the current page.
    cursor: f32,
    image_count: usize,
}

impl Flow {
    fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            cursor: MARGIN,
            image_count: 0,
        }
    }

    fn page(&mut self) -> &mut Page {
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn at_page_top(&self) -> bool {
        self.cursor <= MARGIN
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.cursor = MARGIN;
    }

    fn remaining(&self) -> f32 {
        PAGE_HEIGHT - MARGIN - self.cursor
    }

    /// Break the page unless `height` still fits.
    fn reserve(&mut self, height: f32) {
        if height > self.remaining() && !self.at_page_top() {
            self.new_page();
        }
    }

    fn gap(&mut self, height: f32) {
        if !self.at_page_top() {
            self.cursor += height;
        }
    }

    fn line(&mut self, font: Font, size: f32, color: Rgb, x: f32, text: String) {
        let height = size * LEADING;
        self.reserve(height);
        self.cursor += height;
        let y = PAGE_HEIGHT - self.cursor + size * (LEADING - 1.0);
        self.page().texts.push(TextRun {
            font,
            size,
            color,
            x,
            y,
            text,
        });
    }

    fn wrapped(&mut self, content: &str, font: Font, size: f32, color: Rgb, x: f32, width: f32) {
        for line in text::wrap(&text::sanitize(content), font, size, width) {
            self.line(font, size, color, x, line);
        }
    }

    fn rule(&mut self) {
        let y = PAGE_HEIGHT - self.cursor - 4.0;
        self.page().rules.push(Rule {
            x1: MARGIN,
            x2: PAGE_WIDTH - MARGIN,
            y,
        });
        self.cursor += 8.0;
    }

    fn block(&mut self, block: &Block) {
        match block {
            Block::Title(title) => {
                self.wrapped(title, Font::Bold, TITLE_SIZE, HEADING_COLOR, MARGIN, CONTENT_WIDTH);
                self.rule();
            }
            Block::Meta(meta) => {
                self.wrapped(meta, Font::Regular, META_SIZE, MUTED_COLOR, MARGIN, CONTENT_WIDTH);
            }
            Block::Heading(heading) => {
                self.gap(14.0);
                // Keep a heading with at least two lines of what follows.
                self.reserve(HEADING_SIZE * LEADING + 2.0 * BODY_SIZE * LEADING);
                self.wrapped(heading, Font::Bold, HEADING_SIZE, HEADING_COLOR, MARGIN, CONTENT_WIDTH);
                self.cursor += 2.0;
            }
            Block::Paragraph(paragraph) => {
                self.gap(4.0);
                self.wrapped(paragraph, Font::Regular, BODY_SIZE, TEXT_COLOR, MARGIN, CONTENT_WIDTH);
            }
            Block::Preformatted(lines) => {
                self.gap(4.0);
                for line in lines {
                    self.wrapped(line, Font::Mono, MONO_SIZE, TEXT_COLOR, MARGIN, CONTENT_WIDTH);
                }
            }
            Block::KeyValues(pairs) => {
                self.gap(4.0);
                for (key, value) in pairs {
                    self.key_value(key, value);
                }
            }
            Block::Bullets(items) => {
                self.gap(4.0);
                for item in items {
                    self.bullet(item);
                }
            }
            Block::Image(image) => {
                self.gap(8.0);
                let (width, height) = fit(image.width as f32, image.height as f32);
                self.reserve(height);
                let index = self.image_count;
                self.image_count += 1;
                self.cursor += height;
                let x = MARGIN + (CONTENT_WIDTH - width) / 2.0;
                let y = PAGE_HEIGHT - self.cursor;
                self.page().images.push(ImagePlacement {
                    index,
                    x,
                    y,
                    width,
                    height,
                });
            }
            Block::Caption(caption) => {
                let caption = text::sanitize(caption);
                for line in text::wrap(&caption, Font::Regular, CAPTION_SIZE, CONTENT_WIDTH) {
                    let x = MARGIN
                        + (CONTENT_WIDTH - text::text_width(&line, Font::Regular, CAPTION_SIZE)) / 2.0;
                    self.line(Font::Regular, CAPTION_SIZE, MUTED_COLOR, x, line);
                }
            }
            Block::PageBreak => {
                if !self.at_page_top() {
                    self.new_page();
                }
            }
        }
    }

    fn key_value(&mut self, key: &str, value: &str) {
        let keys = text::wrap(&text::sanitize(key), Font::Bold, BODY_SIZE, KEY_COLUMN - 10.0);
        let values = text::wrap(
            &text::sanitize(value),
            Font::Regular,
            BODY_SIZE,
            CONTENT_WIDTH - KEY_COLUMN,
        );

        let rows = keys.len().max(values.len());
        self.reserve(rows.min(3) as f32 * BODY_SIZE * LEADING);

        for row in 0..rows {
            let height = BODY_SIZE * LEADING;
            self.reserve(height);
            self.cursor += height;
            let y = PAGE_HEIGHT - self.cursor + BODY_SIZE * (LEADING - 1.0);

            let page = self.page();
            if let Some(key) = keys.get(row) {
                page.texts.push(TextRun {
                    font: Font::Bold,
                    size: BODY_SIZE,
                    color: TEXT_COLOR,
                    x: MARGIN,
                    y,
                    text: key.clone(),
                });
            }
            if let Some(value) = values.get(row) {
                page.texts.push(TextRun {
                    font: Font::Regular,
                    size: BODY_SIZE,
                    color: TEXT_COLOR,
                    x: MARGIN + KEY_COLUMN,
                    y,
                    text: value.clone(),
                });
            }
        }
    }

    fn bullet(&mut self, item: &str) {
        let lines = text::wrap(
            &text::sanitize(item),
            Font::Regular,
            BODY_SIZE,
            CONTENT_WIDTH - BULLET_INDENT,
        );

        for (i, line) in lines.into_iter().enumerate() {
            self.line(Font::Regular, BODY_SIZE, TEXT_COLOR, MARGIN + BULLET_INDENT, line);
            if i == 0 {
                let y = self.page().texts.last().map(|t| t.y).unwrap_or_default();
                self.page().texts.push(TextRun {
                    font: Font::Regular,
                    size: BODY_SIZE,
                    color: HEADING_COLOR,
                    x: MARGIN + 2.0,
                    y,
                    text: "•".to_string(),
                });
            }
        }
    }
}

/// Scale an image to the content width, then down to the content height.
fn fit(width: f32, height: f32) -> (f32, f32) {
    let max_height = PAGE_HEIGHT - 2.0 * MARGIN;
    let scale = (CONTENT_WIDTH / width).min(max_height / height);
    (width * scale, height * scale)
}

/// Lay out every block of `spec` and number the resulting pages.
pub fn layout(spec: &DocumentSpec) -> Vec<Page> {
    let mut flow = Flow::new();
    for block in &spec.blocks {
        flow.block(block);
    }

    let mut pages = flow.pages;
    // A trailing page break leaves an empty page behind.
    if pages.len() > 1 && pages.last().is_some_and(|p| *p == Page::default()) {
        pages.pop();
    }

    let total = pages.len();
    for (i, page) in pages.iter_mut().enumerate() {
        let footer = format!("Page {} of {}", i + 1, total);
        let x = (PAGE_WIDTH - text::text_width(&footer, Font::Regular, CAPTION_SIZE)) / 2.0;
        page.texts.push(TextRun {
            font: Font::Regular,
            size: CAPTION_SIZE,
            color: MUTED_COLOR,
            x,
            y: FOOTER_Y,
            text: footer,
        });
    }

    pages
}
