use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::layout::{Page, Rgb, PAGE_HEIGHT, PAGE_WIDTH};
use crate::text::{self, Font};
use crate::types::{Block, DocumentSpec, EmbeddedImage};
use crate::PdfError;

pub const PRODUCER: &str = concat!("figdoc pdf ", env!("CARGO_PKG_VERSION"));

/// Serialize laid out `pages` of `spec` into PDF bytes.
///
/// Output is a pure function of the inputs: no timestamps or random IDs are
/// added beyond what `spec` carries.
pub fn write(spec: &DocumentSpec, pages: &[Page]) -> Result<Vec<u8>, PdfError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut fonts = lopdf::Dictionary::new();
    for font in Font::ALL {
        let id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(font.resource_name(), id);
    }
    let fonts_id = doc.add_object(fonts);

    let images: Vec<ObjectId> = spec
        .blocks
        .iter()
        .filter_map(|block| match block {
            Block::Image(image) => Some(image),
            _ => None,
        })
        .map(|image| doc.add_object(image_stream(image)))
        .collect();

    let mut kids = Vec::with_capacity(pages.len());
    for page in pages {
        let content = Content {
            operations: page_operations(page),
        };
        let encoded = content
            .encode()
            .map_err(|e| PdfError::Encode(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(lopdf::Dictionary::new(), encoded));

        let mut xobjects = lopdf::Dictionary::new();
        for placed in &page.images {
            let id = images
                .get(placed.index)
                .ok_or_else(|| PdfError::Encode(format!("missing image {}", placed.index)))?;
            xobjects.set(image_name(placed.index), *id);
        }

        let mut resources = dictionary! { "Font" => fonts_id };
        if !page.images.is_empty() {
            resources.set("XObject", xobjects);
        }

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            "Contents" => content_id,
            "Resources" => resources,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });

    let mut info = dictionary! {
        "Title" => info_string(&spec.title),
        "Producer" => info_string(PRODUCER),
        "Creator" => info_string("figdoc"),
    };
    if let Some(author) = &spec.author {
        info.set("Author", info_string(author));
    }
    if let Some(subject) = &spec.subject {
        info.set("Subject", info_string(subject));
    }
    if let Some(created) = &spec.created {
        info.set("CreationDate", info_string(created));
    }
    let info_id = doc.add_object(info);

    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| PdfError::Encode(e.to_string()))?;
    Ok(bytes)
}

fn image_name(index: usize) -> String {
    format!("Im{index}")
}

fn image_stream(image: &EmbeddedImage) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(image.width),
            "Height" => i64::from(image.height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        image.jpeg.clone(),
    )
    // Already DCT encoded.
    .with_compression(false)
}

/// Info dictionary string: literal when ASCII, UTF-16BE with BOM otherwise.
fn info_string(value: &str) -> Object {
    if value.is_ascii() {
        return Object::string_literal(value);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in value.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn color(op: &str, (r, g, b): Rgb) -> Operation {
    Operation::new(op, vec![r.into(), g.into(), b.into()])
}

fn page_operations(page: &Page) -> Vec<Operation> {
    let mut ops = Vec::new();

    for placed in &page.images {
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new(
            "cm",
            vec![
                placed.width.into(),
                0.into(),
                0.into(),
                placed.height.into(),
                placed.x.into(),
                placed.y.into(),
            ],
        ));
        ops.push(Operation::new(
            "Do",
            vec![Object::Name(image_name(placed.index).into_bytes())],
        ));
        ops.push(Operation::new("Q", vec![]));
    }

    for rule in &page.rules {
        ops.push(color("RG", (0.8, 0.82, 0.86)));
        ops.push(Operation::new("w", vec![0.75_f32.into()]));
        ops.push(Operation::new("m", vec![rule.x1.into(), rule.y.into()]));
        ops.push(Operation::new("l", vec![rule.x2.into(), rule.y.into()]));
        ops.push(Operation::new("S", vec![]));
    }

    for run in &page.texts {
        ops.push(Operation::new("BT", vec![]));
        ops.push(color("rg", run.color));
        ops.push(Operation::new(
            "Tf",
            vec![run.font.resource_name().into(), run.size.into()],
        ));
        ops.push(Operation::new("Td", vec![run.x.into(), run.y.into()]));
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(text::encode(&run.text), StringFormat::Literal)],
        ));
        ops.push(Operation::new("ET", vec![]));
    }

    ops
}
