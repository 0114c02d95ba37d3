//! PDF text and embedded-image extraction using lopdf and pdf-extract.

use image::{DynamicImage, ImageBuffer, Rgba};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace};

use super::{METHOD_LOPDF, METHOD_PDF_EXTRACT, Result};
use crate::error::PdfError;

/// Native text layer plus the route that produced it.
#[derive(Debug, Clone)]
pub struct NativeText {
    pub text: String,
    /// METHOD_PDF_EXTRACT or METHOD_LOPDF.
    pub method: &'static str,
    /// Characters per page, in page order, when available.
    pub page_chars: Vec<usize>,
}

/// A loaded PDF ready for text or image extraction.
pub struct PdfDocument {
    document: Document,
    /// Decrypted bytes for pdf-extract, which parses independently.
    raw_data: Vec<u8>,
}

impl PdfDocument {
    /// Parse a PDF from memory, decrypting empty-password encryption.
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut document = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        let raw_data = if document.is_encrypted() {
            if document.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("decrypted PDF with empty password");
            let mut decrypted = Vec::new();
            document
                .save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(e.to_string()))?;
            decrypted
        } else {
            data.to_vec()
        };

        if document.get_pages().is_empty() {
            return Err(PdfError::NoPages);
        }
        debug!(pages = document.get_pages().len(), "loaded PDF");

        Ok(Self { document, raw_data })
    }

    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// Pull the native text layer, trying pdf-extract first and the
    /// lopdf content-stream decoder second.
    ///
    /// Returns `None` when neither route yields at least `min_len`
    /// non-whitespace characters; the caller then falls back to OCR.
    pub fn native_text(&self, min_len: usize) -> Option<NativeText> {
        if let Ok(text) = pdf_extract::extract_text_from_mem(&self.raw_data) {
            if usable_len(&text) >= min_len {
                return Some(NativeText {
                    page_chars: vec![text.len()],
                    text,
                    method: METHOD_PDF_EXTRACT,
                });
            }
            trace!("pdf-extract text layer below threshold");
        }

        let page_numbers: Vec<u32> = self.document.get_pages().keys().copied().collect();
        let mut page_chars = Vec::with_capacity(page_numbers.len());
        let mut combined = String::new();
        for number in &page_numbers {
            let page_text = self.document.extract_text(&[*number]).unwrap_or_default();
            page_chars.push(page_text.len());
            if !page_text.is_empty() {
                if !combined.is_empty() {
                    combined.push_str("\n\n");
                }
                combined.push_str(&page_text);
            }
        }
        if usable_len(&combined) >= min_len {
            return Some(NativeText {
                text: combined,
                method: METHOD_LOPDF,
                page_chars,
            });
        }
        trace!("lopdf text layer below threshold");
        None
    }

    /// Embedded page images for the first `max_pages` pages, in page
    /// order, one representative image per page.
    pub fn page_images(&self, max_pages: u32) -> Vec<(u32, DynamicImage)> {
        let mut images = Vec::new();
        for (number, page_id) in self.document.get_pages() {
            if number > max_pages {
                break;
            }
            match self.images_on_page(page_id) {
                Some(page_images) if !page_images.is_empty() => {
                    // Largest image on the page is the scan.
                    if let Some(best) = page_images
                        .into_iter()
                        .max_by_key(|img| img.width() as u64 * img.height() as u64)
                    {
                        images.push((number, best));
                    }
                }
                _ => trace!(page = number, "no decodable images on page"),
            }
        }
        if images.is_empty() {
            // Some scanners emit image streams unreferenced by page
            // resources; pair a document-wide scan with page numbers.
            for (idx, image) in self.all_images().into_iter().enumerate() {
                let number = idx as u32 + 1;
                if number > max_pages {
                    break;
                }
                images.push((number, image));
            }
        }
        debug!(pages = images.len(), "collected PDF page images for OCR");
        images
    }

    fn images_on_page(&self, page_id: ObjectId) -> Option<Vec<DynamicImage>> {
        let resources = self.page_resources(page_id)?;
        let xobjects = resources.get(b"XObject").ok()?;
        let (_, Object::Dictionary(xobjects)) = self.document.dereference(xobjects).ok()? else {
            return None;
        };
        let mut images = Vec::new();
        for (_name, reference) in xobjects.iter() {
            if let Ok((_, object)) = self.document.dereference(reference) {
                if let Some(image) = self.decode_image_object(object) {
                    images.push(image);
                }
            }
        }
        Some(images)
    }

    fn all_images(&self) -> Vec<DynamicImage> {
        self.document
            .objects
            .values()
            .filter_map(|object| self.decode_image_object(object))
            .collect()
    }

    fn decode_image_object(&self, object: &Object) -> Option<DynamicImage> {
        let Object::Stream(stream) = object else {
            return None;
        };
        let dict = &stream.dict;
        if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
            return None;
        }
        let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
        let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;
        trace!(width, height, "found image xobject");

        if let Ok(filter) = dict.get(b"Filter") {
            let filter_name = match filter {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
                _ => None,
            };
            match filter_name {
                Some(b"DCTDecode") => {
                    return image::load_from_memory_with_format(
                        &stream.content,
                        image::ImageFormat::Jpeg,
                    )
                    .ok();
                }
                Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                    trace!("unsupported image codec in PDF stream");
                    return None;
                }
                _ => {}
            }
        }

        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());
        let color_space = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|o| match o {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
                Object::Reference(r) => self
                    .document
                    .get_object(*r)
                    .ok()
                    .and_then(|o| o.as_name().ok()),
                _ => None,
            })
            .unwrap_or(b"DeviceRGB");
        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8);
        if bits != 8 {
            return None;
        }
        raw_to_image(&data, width, height, color_space)
    }

    fn page_resources(&self, page_id: ObjectId) -> Option<Dictionary> {
        let mut node_id = page_id;
        // Resources inherit down the page tree.
        loop {
            let Object::Dictionary(dict) = self.document.get_object(node_id).ok()? else {
                return None;
            };
            if let Ok(resources) = dict.get(b"Resources") {
                if let Ok((_, Object::Dictionary(found))) = self.document.dereference(resources) {
                    return Some(found.clone());
                }
            }
            match dict.get(b"Parent") {
                Ok(Object::Reference(parent_id)) => node_id = *parent_id,
                _ => return None,
            }
        }
    }
}

fn usable_len(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

fn raw_to_image(data: &[u8], width: u32, height: u32, color_space: &[u8]) -> Option<DynamicImage> {
    let pixels = (width as usize) * (height as usize);
    let mut rgba = Vec::with_capacity(pixels * 4);
    match color_space {
        b"DeviceRGB" | b"RGB" if data.len() >= pixels * 3 => {
            for chunk in data[..pixels * 3].chunks_exact(3) {
                rgba.extend_from_slice(&[chunk[0], chunk[1], chunk[2], 255]);
            }
        }
        b"DeviceGray" | b"G" if data.len() >= pixels => {
            for &gray in &data[..pixels] {
                rgba.extend_from_slice(&[gray, gray, gray, 255]);
            }
        }
        _ => {
            trace!(
                colorspace = %String::from_utf8_lossy(color_space),
                data_len = data.len(),
                "could not decode raw image stream"
            );
            return None;
        }
    }
    ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, rgba).map(DynamicImage::ImageRgba8)
}
