// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fixture PDFs for unit tests: image-only pages built directly with lopdf.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

/// Content of every fixture page: paint a 1x1 grey "scan" over the page.
pub fn scan_content(width: f32, height: f32) -> Vec<u8> {
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    width.into(),
                    0.into(),
                    0.into(),
                    height.into(),
                    0.into(),
                    0.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    content.encode().expect("fixture content stream")
}

fn add_scan_image(doc: &mut Document) -> ObjectId {
    let image = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 1,
            "Height" => 1,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
        },
        vec![0x80],
    );
    doc.add_object(image)
}

fn finish(mut doc: Document, pages_id: ObjectId, pages: Dictionary) -> Vec<u8> {
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut output = Vec::new();
    doc.save_to(&mut output).expect("fixture PDF");
    output
}

/// One image-only page with the given MediaBox and `/Rotate`.
pub fn single_page_pdf(media_box: [f32; 4], rotation: i64) -> Vec<u8> {
    pdf_with_pages(1, media_box, rotation)
}

/// `count` image-only pages, each carrying its own MediaBox and `/Rotate`.
pub fn pdf_with_pages(count: usize, media_box: [f32; 4], rotation: i64) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let image_id = add_scan_image(&mut doc);

    let width = media_box[2] - media_box[0];
    let height = media_box[3] - media_box[1];

    let mut kids = Vec::with_capacity(count);
    for _ in 0..count {
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            scan_content(width, height),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => media_box.iter().map(|&v| Object::Real(v)).collect::<Vec<_>>(),
            "Rotate" => rotation,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
        });
        kids.push(Object::Reference(page_id));
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count as i64,
    };
    finish(doc, pages_id, pages)
}

/// Two pages inheriting MediaBox, `/Rotate` and Resources from the page tree
/// node. The shared Resources dictionary is an indirect object and the first
/// page's Contents is an array.
pub fn two_page_pdf_with_inherited_box(media_box: [f32; 4], rotation: i64) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let image_id = add_scan_image(&mut doc);
    let resources_id = doc.add_object(dictionary! {
        "XObject" => dictionary! { "Im0" => image_id },
    });

    let width = media_box[2] - media_box[0];
    let height = media_box[3] - media_box[1];

    let first_content = doc.add_object(Stream::new(
        Dictionary::new(),
        scan_content(width, height),
    ));
    let trailing_content = doc.add_object(Stream::new(Dictionary::new(), b"q Q".to_vec()));
    let first_page = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => vec![Object::Reference(first_content), Object::Reference(trailing_content)],
    });

    let second_content = doc.add_object(Stream::new(
        Dictionary::new(),
        scan_content(width, height),
    ));
    let second_page = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => second_content,
    });

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![Object::Reference(first_page), Object::Reference(second_page)],
        "Count" => 2,
        "MediaBox" => media_box.iter().map(|&v| Object::Real(v)).collect::<Vec<_>>(),
        "Rotate" => rotation,
        "Resources" => resources_id,
    };
    finish(doc, pages_id, pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_load_back() {
        let letter = [0.0, 0.0, 612.0, 792.0];
        assert!(!scan_content(612.0, 792.0).is_empty());

        let single = Document::load_mem(&single_page_pdf(letter, 0)).unwrap();
        assert_eq!(single.get_pages().len(), 1);

        let three = Document::load_mem(&pdf_with_pages(3, letter, 0)).unwrap();
        assert_eq!(three.get_pages().len(), 3);

        let inherited = Document::load_mem(&two_page_pdf_with_inherited_box(letter, 90)).unwrap();
        assert_eq!(inherited.get_pages().len(), 2);
    }
}
