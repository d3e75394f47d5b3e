//! Bitmap decoding and the per-element bitmap store.
//!
//! Decoding and IO are front-loaded here so rendering stays deterministic
//! and IO-free: image elements carry only a source string, and the store
//! maps element ids to decoded, premultiplied pixels.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use crate::element::{CanvasElement, ElementId};
use crate::foundation::error::{CollageError, CollageResult};

/// Decoded image pixels, premultiplied RGBA8 in row-major order.
#[derive(Clone)]
pub struct PreparedBitmap {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl std::fmt::Debug for PreparedBitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedBitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba8_premul.len())
            .finish()
    }
}

impl PreparedBitmap {
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height.max(1) as f64
    }
}

pub fn decode_bitmap(bytes: &[u8]) -> CollageResult<PreparedBitmap> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedBitmap {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

/// Normalize a forward-slash relative path: rejects absolute paths, `..`
/// traversal, and empty inputs.
pub fn normalize_rel_path(source: &str) -> CollageResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(CollageError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(CollageError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(CollageError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(CollageError::validation(
            "asset path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

/// Source of raw asset bytes for a normalized relative path.
pub trait AssetResolver {
    fn read_bytes(&self, norm_path: &str) -> CollageResult<Vec<u8>>;
}

/// Filesystem resolver rooted at a directory.
#[derive(Clone, Debug)]
pub struct FsResolver {
    root: PathBuf,
}

impl FsResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetResolver for FsResolver {
    fn read_bytes(&self, norm_path: &str) -> CollageResult<Vec<u8>> {
        let path = self.root.join(Path::new(norm_path));
        std::fs::read(&path)
            .with_context(|| format!("read asset bytes from '{}'", path.display()))
            .map_err(CollageError::from)
    }
}

/// In-memory resolver, useful for tests and embedded assets.
#[derive(Clone, Debug, Default)]
pub struct MemoryResolver {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryResolver {
    pub fn insert(&mut self, norm_path: impl Into<String>, bytes: Vec<u8>) {
        self.files.insert(norm_path.into(), bytes);
    }
}

impl AssetResolver for MemoryResolver {
    fn read_bytes(&self, norm_path: &str) -> CollageResult<Vec<u8>> {
        self.files
            .get(norm_path)
            .cloned()
            .ok_or_else(|| CollageError::asset(format!("no such asset '{norm_path}'")))
    }
}

/// Decoded bitmaps keyed by the image element that references them.
///
/// Kept outside the document model so serialized documents never embed
/// pixels; `hydrate` rebuilds the store from element sources after a load.
#[derive(Clone, Debug, Default)]
pub struct BitmapStore {
    bitmaps: HashMap<ElementId, PreparedBitmap>,
}

impl BitmapStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: ElementId, bitmap: PreparedBitmap) {
        self.bitmaps.insert(id, bitmap);
    }

    pub fn get(&self, id: ElementId) -> Option<&PreparedBitmap> {
        self.bitmaps.get(&id)
    }

    pub fn remove(&mut self, id: ElementId) {
        self.bitmaps.remove(&id);
    }

    /// Drop every bitmap. Used when a whole new element set replaces the
    /// current one, since `hydrate` never re-decodes an id it already holds.
    pub fn clear(&mut self) {
        self.bitmaps.clear();
    }

    /// Decode and register the bitmap for every image element not already
    /// present. A failed decode logs a warning and skips the element; the
    /// renderer leaves such elements blank.
    pub fn hydrate(&mut self, elements: &[CanvasElement], resolver: &dyn AssetResolver) {
        for el in elements {
            let CanvasElement::Image(img) = el else {
                continue;
            };
            if self.bitmaps.contains_key(&img.id) {
                continue;
            }
            match load_bitmap(resolver, &img.src) {
                Ok(bitmap) => {
                    self.bitmaps.insert(img.id, bitmap);
                }
                Err(err) => {
                    tracing::warn!(src = %img.src, %err, "skipping undecodable image element");
                }
            }
        }
    }

}

fn load_bitmap(resolver: &dyn AssetResolver, source: &str) -> CollageResult<PreparedBitmap> {
    let norm = normalize_rel_path(source)?;
    let bytes = resolver.read_bytes(&norm)?;
    decode_bitmap(&bytes)
}
