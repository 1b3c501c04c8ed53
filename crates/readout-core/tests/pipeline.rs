//! End-to-end extraction over PDFs built in memory.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use image::DynamicImage;
use lopdf::{dictionary, Document, Object, Stream};
use pretty_assertions::assert_eq;

use readout_core::models::config::{RendererKind, ReadoutConfig};
use readout_core::{
    extract_all, EmbeddedImageRenderer, ExtractionPipeline, OcrError, PageRenderer, PdfError,
    ReadoutError, TextRecognizer,
};

/// Write a one-page scanned PDF: a gray image of `image_px` pixels drawn
/// over a page of `page_pt` points. MediaBox sits on the Pages node so the
/// page has to inherit it.
fn scanned_pdf(path: &Path, page_pt: (i64, i64), image_px: Option<(u32, u32)>) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let page_id = add_scanned_page(&mut doc, pages_id, page_pt, image_px, false);
    finish(doc, path, pages_id, vec![page_id], Some(page_pt));
}

/// Write a PDF with one scanned page per entry, each carrying its own
/// MediaBox.
fn scanned_pdf_pages(path: &Path, pages: &[((i64, i64), (u32, u32))]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let kids = pages
        .iter()
        .map(|&(page_pt, image_px)| {
            add_scanned_page(&mut doc, pages_id, page_pt, Some(image_px), true)
        })
        .collect();
    finish(doc, path, pages_id, kids, None);
}

fn media_box(page_pt: (i64, i64)) -> Vec<Object> {
    vec![0.into(), 0.into(), page_pt.0.into(), page_pt.1.into()]
}

fn add_scanned_page(
    doc: &mut Document,
    pages_id: lopdf::ObjectId,
    page_pt: (i64, i64),
    image_px: Option<(u32, u32)>,
    own_media_box: bool,
) -> lopdf::ObjectId {
    let mut xobjects = lopdf::Dictionary::new();
    if let Some((width, height)) = image_px {
        let pixels = vec![200u8; (width * height) as usize];
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(width),
                "Height" => i64::from(height),
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            pixels,
        ));
        xobjects.set("Im0", image_id);
    }

    let content = format!("q {} 0 0 {} 0 0 cm /Im0 Do Q", page_pt.0, page_pt.1);
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
    let resources_id = doc.add_object(dictionary! {
        "XObject" => xobjects,
    });
    let mut page = dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
    };
    if own_media_box {
        page.set("MediaBox", media_box(page_pt));
    }
    doc.add_object(page)
}

fn finish(
    mut doc: Document,
    path: &Path,
    pages_id: lopdf::ObjectId,
    kids: Vec<lopdf::ObjectId>,
    inherited_media_box: Option<(i64, i64)>,
) {
    let mut pages = dictionary! {
        "Type" => "Pages",
        "Count" => kids.len() as i64,
        "Kids" => kids.into_iter().map(Object::from).collect::<Vec<_>>(),
    };
    if let Some(page_pt) = inherited_media_box {
        pages.set("MediaBox", media_box(page_pt));
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

/// Returns fixed text and remembers the size of every image it was shown.
struct Scripted {
    text: &'static str,
    seen: Arc<Mutex<Vec<(u32, u32)>>>,
}

impl TextRecognizer for Scripted {
    fn recognize(&mut self, image: &DynamicImage) -> Result<String, OcrError> {
        self.seen.lock().unwrap().push((image.width(), image.height()));
        Ok(self.text.to_string())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

fn embedded_config() -> ReadoutConfig {
    let mut config = ReadoutConfig::default();
    config.render.renderer = RendererKind::Embedded;
    config
}

fn pipeline_with_text(text: &'static str) -> (ExtractionPipeline, Arc<Mutex<Vec<(u32, u32)>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recognizer = Scripted {
        text,
        seen: Arc::clone(&seen),
    };
    let pipeline = ExtractionPipeline::new(
        &embedded_config(),
        Box::new(EmbeddedImageRenderer::new()),
        Box::new(recognizer),
    )
    .unwrap();
    (pipeline, seen)
}

#[test]
fn test_scan_is_resampled_to_page_scale() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("form.pdf");
    scanned_pdf(&path, (200, 520), Some((100, 260)));

    let page = EmbeddedImageRenderer::new().render_first_page(&path, 6.0).unwrap();
    assert_eq!((page.width(), page.height()), (1200, 3120));

    let page = EmbeddedImageRenderer::new().render_first_page(&path, 0.5).unwrap();
    assert_eq!((page.width(), page.height()), (100, 260));
}

#[test]
fn test_only_first_page_is_rendered() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("two_pages.pdf");
    scanned_pdf_pages(&path, &[((200, 520), (100, 260)), ((100, 100), (40, 40))]);

    let page = EmbeddedImageRenderer::new().render_first_page(&path, 6.0).unwrap();
    assert_eq!((page.width(), page.height()), (1200, 3120));

    // Same pages the other way round: the small page now wins
    let path = dir.path().join("swapped.pdf");
    scanned_pdf_pages(&path, &[((100, 100), (40, 40)), ((200, 520), (100, 260))]);

    let page = EmbeddedImageRenderer::new().render_first_page(&path, 6.0).unwrap();
    assert_eq!((page.width(), page.height()), (600, 600));
}

#[test]
fn test_oversized_page_fails_without_rendering() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("poster.pdf");
    scanned_pdf(&path, (14400, 14400), Some((10, 10)));

    let (pipeline, seen) = pipeline_with_text("900");
    let err = pipeline.extract(&path).unwrap_err();
    assert!(matches!(
        err,
        ReadoutError::DocumentOpen {
            source: PdfError::Render(_),
            ..
        }
    ));
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn test_split_denylisted_reading_yields_none() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("form.pdf");
    scanned_pdf(&path, (200, 520), Some((100, 260)));

    let (pipeline, seen) = pipeline_with_text("Reading: 1 123 units");
    let result = pipeline.extract(&path).unwrap();

    assert_eq!(result.token_list, vec!["1123".to_string()]);
    assert_eq!(result.selected_number, None);
    assert_eq!(*seen.lock().unwrap(), vec![(1200, 900)]);
}

#[test]
fn test_reading_is_selected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("form.pdf");
    scanned_pdf(&path, (200, 520), Some((100, 260)));

    let (pipeline, _) = pipeline_with_text("Zahlerstand\n1 045 m3\n778 55");
    let result = pipeline.extract(&path).unwrap();

    assert_eq!(result.token_list, vec!["1045", "778", "55"]);
    assert_eq!(result.selected_number, Some(1045.0));
}

#[test]
fn test_unreadable_path_is_document_open_error() {
    let (pipeline, seen) = pipeline_with_text("900");
    let err = pipeline
        .extract(Path::new("/nonexistent/dir/form.pdf"))
        .unwrap_err();

    match err {
        ReadoutError::DocumentOpen { path, source } => {
            assert_eq!(path, PathBuf::from("/nonexistent/dir/form.pdf"));
            assert!(matches!(source, PdfError::Read(_)));
        }
        other => panic!("expected DocumentOpen, got {:?}", other),
    }
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn test_page_without_scan_is_document_open_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vector.pdf");
    scanned_pdf(&path, (200, 520), None);

    let (pipeline, _) = pipeline_with_text("900");
    let err = pipeline.extract(&path).unwrap_err();
    assert!(matches!(
        err,
        ReadoutError::DocumentOpen {
            source: PdfError::NoImage(_),
            ..
        }
    ));
}

#[test]
fn test_wrong_layout_is_region_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("letter.pdf");
    // Too short for the reading field at scale 6
    scanned_pdf(&path, (200, 500), Some((100, 250)));

    let (pipeline, seen) = pipeline_with_text("900");
    let err = pipeline.extract(&path).unwrap_err();
    assert!(matches!(err, ReadoutError::RegionOutOfBounds { .. }));
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_batch_keeps_going_after_bad_file() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.pdf");
    let junk = dir.path().join("junk.pdf");
    let other = dir.path().join("other.pdf");
    scanned_pdf(&good, (200, 520), Some((100, 260)));
    std::fs::write(&junk, b"%PDF-1.4 truncated").unwrap();
    scanned_pdf(&other, (200, 520), Some((50, 130)));

    let (pipeline, _) = pipeline_with_text("Reading 950");
    let outcomes = extract_all(
        Arc::new(pipeline),
        vec![good.clone(), junk.clone(), other.clone()],
        2,
    )
    .await;

    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0].path, good);
    assert_eq!(
        outcomes[0].result.as_ref().unwrap().selected_number,
        Some(950.0)
    );
    assert!(matches!(
        outcomes[1].result,
        Err(ReadoutError::DocumentOpen { .. })
    ));
    assert_eq!(
        outcomes[2].result.as_ref().unwrap().selected_number,
        Some(950.0)
    );
}

/// Fails the test if two calls ever overlap.
struct Exclusive {
    busy: Arc<AtomicBool>,
    overlaps: Arc<AtomicUsize>,
}

impl Exclusive {
    fn enter(&self) {
        if self.busy.swap(true, Ordering::SeqCst) {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        thread::sleep(Duration::from_millis(5));
    }

    fn leave(&self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}

impl PageRenderer for Exclusive {
    fn render_first_page(
        &mut self,
        _path: &Path,
        _scale: f32,
    ) -> readout_core::pdf::Result<DynamicImage> {
        self.enter();
        let page = DynamicImage::new_luma8(1200, 3100);
        self.leave();
        Ok(page)
    }

    fn name(&self) -> &'static str {
        "exclusive"
    }
}

impl TextRecognizer for Exclusive {
    fn recognize(&mut self, _image: &DynamicImage) -> Result<String, OcrError> {
        self.enter();
        self.leave();
        Ok("1 1 23 700".to_string())
    }

    fn name(&self) -> &'static str {
        "exclusive"
    }
}

#[test]
fn test_render_and_ocr_never_overlap() {
    let busy = Arc::new(AtomicBool::new(false));
    let overlaps = Arc::new(AtomicUsize::new(0));
    let engine = || Exclusive {
        busy: Arc::clone(&busy),
        overlaps: Arc::clone(&overlaps),
    };

    let pipeline = Arc::new(
        ExtractionPipeline::new(&ReadoutConfig::default(), Box::new(engine()), Box::new(engine()))
            .unwrap(),
    );

    let workers: Vec<_> = (0..6)
        .map(|i| {
            let pipeline = Arc::clone(&pipeline);
            thread::spawn(move || pipeline.extract(Path::new(&format!("doc{}.pdf", i))))
        })
        .collect();

    for worker in workers {
        let result = worker.join().unwrap().unwrap();
        assert_eq!(result.token_list, vec!["11", "23", "700"]);
        assert_eq!(result.selected_number, Some(700.0));
    }
    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
}
