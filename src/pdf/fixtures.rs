//! Small synthetic PDFs for tests. Each page draws the text "Page N" so
//! tests can tell which original page ended up where.

use lopdf::{dictionary, Document, Object, ObjectId, Stream};

fn page_with_marker(doc: &mut Document, parent: ObjectId, n: u32) -> ObjectId {
    let content = format!("BT /F1 24 Tf 72 720 Td (Page {}) Tj ET", n);
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
    doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => parent,
        "Contents" => content_id,
    })
}

fn finish(mut doc: Document, pages_id: ObjectId) -> Vec<u8> {
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal("Sample"),
        "Producer" => Object::string_literal("fixtures"),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn resources(doc: &mut Document) -> ObjectId {
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    })
}

/// A flat document of `pages` pages.
pub fn sample_pdf(pages: u32) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let resources_id = resources(&mut doc);

    let kids: Vec<Object> = (1..=pages)
        .map(|n| page_with_marker(&mut doc, pages_id, n).into())
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    finish(doc, pages_id)
}

/// Four pages under two intermediate nodes. Pages 1-2 inherit a small
/// MediaBox and a rotation from their node; pages 3-4 inherit only from the
/// root.
pub fn nested_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let root_id = doc.new_object_id();
    let left_id = doc.new_object_id();
    let right_id = doc.new_object_id();
    let resources_id = resources(&mut doc);

    let left: Vec<Object> = (1..=2)
        .map(|n| page_with_marker(&mut doc, left_id, n).into())
        .collect();
    let right: Vec<Object> = (3..=4)
        .map(|n| page_with_marker(&mut doc, right_id, n).into())
        .collect();

    doc.objects.insert(
        left_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Parent" => root_id,
            "Kids" => left,
            "Count" => 2,
            "MediaBox" => vec![0.into(), 0.into(), 200.into(), 200.into()],
            "Rotate" => 90,
        }),
    );
    doc.objects.insert(
        right_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Parent" => root_id,
            "Kids" => right,
            "Count" => 2,
        }),
    );
    doc.objects.insert(
        root_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![left_id.into(), right_id.into()],
            "Count" => 4,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    finish(doc, root_id)
}

/// The N of the "Page N" marker in a content stream.
pub fn page_marker(content: &[u8]) -> u32 {
    let text = String::from_utf8_lossy(content);
    let start = text.find("(Page ").expect("page marker") + "(Page ".len();
    let end = start + text[start..].find(')').expect("closing paren");
    text[start..end].parse().expect("marker number")
}

/// Markers of every page of a serialized document, in page order.
pub fn page_markers(bytes: &[u8]) -> Vec<u32> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .values()
        .map(|&id| page_marker(&doc.get_page_content(id).unwrap()))
        .collect()
}
