//! PDF assembly: one page per slide image, in the order given.
//!
//! Each image is decoded to 8-bit RGB and embedded as an image XObject on a
//! page exactly its pixel size (1 px = 1 pt). Decoding and compression are
//! CPU-bound and run inside `spawn_blocking`. The file is written next to its
//! final location and renamed into place, so a reader never sees a partial
//! PDF.

use crate::error::DocSendError;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Assemble `image_paths` into a PDF at `output_path`.
///
/// Missing parent directories are created. Returns the size of the written
/// file in bytes.
///
/// # Errors
/// - [`DocSendError::EmptyImageList`] for an empty list
/// - [`DocSendError::ImageNotFound`] if any path does not exist (checked
///   before anything is decoded)
/// - [`DocSendError::ImageDecode`] / [`DocSendError::PdfAssembly`] when an
///   image or the document cannot be encoded
/// - [`DocSendError::OutputWriteFailed`] when the file cannot be written
pub async fn assemble_pdf(
    image_paths: &[PathBuf],
    output_path: &Path,
) -> Result<u64, DocSendError> {
    if image_paths.is_empty() {
        return Err(DocSendError::EmptyImageList);
    }
    if let Some(missing) = image_paths.iter().find(|p| !p.exists()) {
        return Err(DocSendError::ImageNotFound {
            path: missing.clone(),
        });
    }

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DocSendError::OutputWriteFailed {
                path: output_path.to_path_buf(),
                source: e,
            })?;
    }

    let paths = image_paths.to_vec();
    let bytes = tokio::task::spawn_blocking(move || build_pdf(&paths))
        .await
        .map_err(|e| DocSendError::Internal(format!("PDF assembly task panicked: {}", e)))??;

    let tmp_path = output_path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, &bytes)
        .await
        .map_err(|e| DocSendError::OutputWriteFailed {
            path: output_path.to_path_buf(),
            source: e,
        })?;
    tokio::fs::rename(&tmp_path, output_path)
        .await
        .map_err(|e| DocSendError::OutputWriteFailed {
            path: output_path.to_path_buf(),
            source: e,
        })?;

    info!(
        "Wrote {} ({} pages, {} bytes)",
        output_path.display(),
        image_paths.len(),
        bytes.len()
    );
    Ok(bytes.len() as u64)
}

/// Build the serialised PDF in memory.
fn build_pdf(image_paths: &[PathBuf]) -> Result<Vec<u8>, DocSendError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::with_capacity(image_paths.len());
    for path in image_paths {
        let page_id = add_image_page(&mut doc, pages_id, path)?;
        kids.push(page_id.into());
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
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| DocSendError::PdfAssembly(e.to_string()))?;
    Ok(out)
}

/// Decode `path` and append it as a full-bleed page under `pages_id`.
fn add_image_page(
    doc: &mut Document,
    pages_id: ObjectId,
    path: &Path,
) -> Result<ObjectId, DocSendError> {
    let rgb = image::open(path)
        .map_err(|e| DocSendError::ImageDecode {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?
        .to_rgb8();
    let (width, height) = rgb.dimensions();
    debug!("Embedding {} ({}x{})", path.display(), width, height);

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        rgb.into_raw(),
    ));

    let (w, h) = (i64::from(width), i64::from(height));
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![w.into(), 0.into(), 0.into(), h.into(), 0.into(), 0.into()],
            ),
            Operation::new("Do", vec!["Im0".into()]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_bytes = content
        .encode()
        .map_err(|e| DocSendError::PdfAssembly(e.to_string()))?;
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content_bytes));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), w.into(), h.into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                "Im0" => image_id,
            },
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_png(dir: &Path, name: &str, w: u32, h: u32, shade: u8) -> PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(w, h, Rgb([shade, 0, 255 - shade]))
            .save(&path)
            .unwrap();
        path
    }

    #[tokio::test]
    async fn single_image_single_page() {
        let dir = tempfile::tempdir().unwrap();
        let img = write_png(dir.path(), "slide_01.png", 100, 100, 200);
        let out = dir.path().join("deck.pdf");

        let size = assemble_pdf(&[img], &out).await.unwrap();

        assert!(size > 0);
        assert_eq!(std::fs::metadata(&out).unwrap().len(), size);
        let doc = Document::load(&out).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
        assert!(!dir.path().join("deck.pdf.tmp").exists());
    }

    #[tokio::test]
    async fn pages_follow_image_order_and_size() {
        let dir = tempfile::tempdir().unwrap();
        let imgs = vec![
            write_png(dir.path(), "slide_01.png", 100, 50, 0),
            write_png(dir.path(), "slide_02.png", 100, 50, 100),
            write_png(dir.path(), "slide_03.png", 40, 80, 250),
        ];
        let out = dir.path().join("deck.pdf");

        assemble_pdf(&imgs, &out).await.unwrap();

        let doc = Document::load(&out).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 3);

        let third = doc.get_dictionary(pages[&3]).unwrap();
        let media_box = third.get(b"MediaBox").unwrap().as_array().unwrap();
        assert_eq!(media_box[2].as_i64().unwrap(), 40);
        assert_eq!(media_box[3].as_i64().unwrap(), 80);
    }

    #[tokio::test]
    async fn creates_nested_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let img = write_png(dir.path(), "slide_01.png", 10, 10, 0);
        let out = dir.path().join("a").join("b").join("deck.pdf");

        assemble_pdf(&[img], &out).await.unwrap();
        assert!(out.exists());
    }

    #[tokio::test]
    async fn empty_list_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = assemble_pdf(&[], &dir.path().join("x.pdf")).await.unwrap_err();
        assert!(matches!(err, DocSendError::EmptyImageList));
        assert!(!dir.path().join("x.pdf").exists());
    }

    #[tokio::test]
    async fn missing_image_rejected_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_png(dir.path(), "slide_01.png", 10, 10, 0);
        let missing = dir.path().join("nonexistent.png");
        let out = dir.path().join("x.pdf");

        let err = assemble_pdf(&[good, missing.clone()], &out).await.unwrap_err();
        match err {
            DocSendError::ImageNotFound { path } => assert_eq!(path, missing),
            other => panic!("expected ImageNotFound, got {other:?}"),
        }
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn undecodable_image_reported() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("slide_01.png");
        std::fs::write(&bogus, b"definitely not a png").unwrap();

        let err = assemble_pdf(&[bogus], &dir.path().join("x.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, DocSendError::ImageDecode { .. }));
    }
}
