//! The engine facade: owns the element list, selection, interaction state,
//! and the bitmap/font side-tables, and wires the pointer protocol to the
//! interaction and render modules.

use crate::assets::{AssetResolver, BitmapStore, PreparedBitmap};
use crate::element::{
    BannerElement, BannerShape, CanvasElement, ElementId, IdGenerator, ImageElement, Shadow,
    Stroke, TextElement,
};
use crate::export::{self, ExportOutput};
use crate::foundation::core::{Canvas, Point, Rgba8};
use crate::foundation::error::{CollageError, CollageResult};
use crate::interact::{
    ActionKind, DOUBLE_CLICK_MS, DragAction, InteractionState, apply_drag, classify_pointer_down,
};
use crate::render::{FrameOptions, Renderer};
use crate::style::{ColorRange, FontSizeRange, TextAlign};
use crate::text::hit::{char_index_at_point, selection_range};
use crate::text::shaper::TextShaper;

/// A layered composition editor over one base image.
///
/// Single-threaded and event-driven: pointer callbacks mutate the element
/// list, [`Editor::render`] draws the current frame, and [`Editor::apply`]
/// produces the full-resolution flattened output.
pub struct Editor {
    canvas: Canvas,
    base: Option<PreparedBitmap>,
    elements: Vec<CanvasElement>,
    ids: IdGenerator,
    selected: Option<ElementId>,
    /// Character selection inside the selected text element.
    selection: (usize, usize),
    state: InteractionState,
    last_click: Option<(u64, ElementId)>,
    bitmaps: BitmapStore,
    shaper: TextShaper,
    renderer: Renderer,
}

impl Editor {
    /// `canvas` is the display resolution the session is edited at.
    pub fn new(canvas: Canvas) -> CollageResult<Self> {
        Ok(Self {
            canvas,
            base: None,
            elements: Vec::new(),
            ids: IdGenerator::new(),
            selected: None,
            selection: (0, 0),
            state: InteractionState::Idle,
            last_click: None,
            bitmaps: BitmapStore::new(),
            shaper: TextShaper::new(),
            renderer: Renderer::new(canvas.width, canvas.height)?,
        })
    }

    pub fn set_base(&mut self, base: PreparedBitmap) {
        self.base = Some(base);
    }

    pub fn register_font(&mut self, family: &str, font_bytes: Vec<u8>) -> CollageResult<()> {
        self.shaper.register_font(family, font_bytes)
    }

    pub fn elements(&self) -> &[CanvasElement] {
        &self.elements
    }

    pub fn selected_id(&self) -> Option<ElementId> {
        self.selected
    }

    pub fn selection(&self) -> (usize, usize) {
        self.selection
    }

    pub fn is_selecting_text(&self) -> bool {
        self.state.is_selecting_text()
    }

    /// Replace the element list from persisted data, seeding the id counter
    /// past every incoming id and hydrating image bitmaps.
    #[tracing::instrument(skip_all, fields(count = elements.len()))]
    pub fn load_elements(&mut self, elements: Vec<CanvasElement>, resolver: &dyn AssetResolver) {
        for el in &elements {
            self.ids.observe(el.id());
        }
        // Incoming ids may collide with ids from the previous element set, so
        // stale bitmaps must go before hydration or they would shadow the new
        // sources.
        self.bitmaps.clear();
        self.bitmaps.hydrate(&elements, resolver);
        self.elements = elements;
        self.selected = None;
        self.selection = (0, 0);
        self.state = InteractionState::Idle;
    }

    // --- pointer protocol ---

    /// `now_ms` is any monotonic millisecond clock; it only feeds the
    /// double-click window.
    pub fn pointer_down(&mut self, pos: Point, now_ms: u64) {
        let hit = if self.state.is_selecting_text() {
            None
        } else {
            classify_pointer_down(&self.elements, pos, &mut self.shaper)
        };

        let is_double_click = match (hit, self.last_click) {
            (Some((_, id)), Some((time, last_id))) => {
                id == last_id && now_ms.saturating_sub(time) < DOUBLE_CLICK_MS
            }
            _ => false,
        };
        self.last_click = hit.map(|(_, id)| (now_ms, id));

        if let Some((ActionKind::Move, id)) = hit
            && is_double_click
            && let Some(caret) = self.caret_at(id, pos)
        {
            tracing::debug!(element = id.0, caret, "entering text selection");
            self.selected = Some(id);
            self.selection = (caret, caret);
            self.state = InteractionState::SelectingText {
                element: id,
                anchor: caret,
            };
            return;
        }

        match hit {
            Some((kind, id)) => {
                if self.selected != Some(id) {
                    self.selection = (0, 0);
                }
                self.selected = Some(id);
                if let Some(el) = self.elements.iter().find(|el| el.id() == id) {
                    tracing::debug!(element = id.0, ?kind, "drag started");
                    self.state = InteractionState::Dragging(DragAction {
                        kind,
                        start_pos: pos,
                        snapshot: el.clone(),
                    });
                }
            }
            None => {
                self.selected = None;
                self.selection = (0, 0);
                self.state = InteractionState::Idle;
            }
        }
    }

    pub fn pointer_move(&mut self, pos: Point, shift: bool) {
        match &self.state {
            InteractionState::SelectingText { element, anchor } => {
                let (element, anchor) = (*element, *anchor);
                if let Some(caret) = self.caret_at(element, pos) {
                    self.selection = selection_range(anchor, caret);
                }
            }
            InteractionState::Dragging(action) => {
                let action = action.clone();
                let updated = apply_drag(&action, pos, shift, &mut self.shaper);
                if let Some(el) = self
                    .elements
                    .iter_mut()
                    .find(|el| el.id() == action.snapshot.id())
                {
                    *el = updated;
                }
            }
            InteractionState::Idle => {}
        }
    }

    /// Ends any drag; leaving text-selection mode keeps the selected range.
    pub fn pointer_up(&mut self) {
        self.state = InteractionState::Idle;
    }

    fn caret_at(&mut self, id: ElementId, pos: Point) -> Option<usize> {
        let text = self
            .elements
            .iter()
            .find(|el| el.id() == id)
            .and_then(|el| el.as_text())?
            .clone();
        char_index_at_point(&text, pos, &mut self.shaper)
    }

    // --- element factories ---

    pub fn add_text(&mut self) -> ElementId {
        let font_size = ((f64::from(self.canvas.height) / 20.0).round()).max(30.0);
        let width = f64::from(self.canvas.width) * 0.5;
        let id = self.ids.next_id();
        let el = TextElement {
            id,
            x: (f64::from(self.canvas.width) - width) / 2.0,
            y: f64::from(self.canvas.height) / 2.0 - font_size,
            width,
            rotation: 0.0,
            skew_x: 0.0,
            skew_y: 0.0,
            text: "Your Text Here".to_string(),
            font_size,
            font_family: "Arial".to_string(),
            color: Rgba8::black(),
            color_ranges: vec![],
            font_size_ranges: vec![],
            is_bold: false,
            is_italic: false,
            is_underline: false,
            text_align: TextAlign::Center,
            line_height: 1.2,
            shadow: Shadow::default(),
            stroke: Stroke::default(),
        };
        self.push_selected(CanvasElement::Text(el));
        id
    }

    pub fn add_banner(&mut self, shape: BannerShape) -> ElementId {
        let (wf, hf) = match shape {
            BannerShape::Ellipse => (0.4, 0.2),
            _ => (0.8, 0.15),
        };
        let width = f64::from(self.canvas.width) * wf;
        let height = f64::from(self.canvas.height) * hf;
        let id = self.ids.next_id();
        let el = BannerElement {
            id,
            x: (f64::from(self.canvas.width) - width) / 2.0,
            y: (f64::from(self.canvas.height) - height) * 0.8,
            width,
            height,
            rotation: 0.0,
            skew_x: 0.0,
            skew_y: 0.0,
            shape,
            background_color: Rgba8::white(),
            shadow: Shadow {
                enabled: true,
                color: Rgba8::black(),
                blur: 10.0,
                offset_x: 0.0,
                offset_y: 5.0,
            },
            stroke: Stroke::default(),
        };
        self.push_selected(CanvasElement::Banner(el));
        id
    }

    /// Adds an image element sized to 30% of the canvas width at the
    /// bitmap's intrinsic aspect, and registers the decoded pixels.
    pub fn add_image(&mut self, src: impl Into<String>, bitmap: PreparedBitmap) -> ElementId {
        let aspect_ratio = bitmap.aspect_ratio();
        let width = f64::from(self.canvas.width) * 0.3;
        let height = width / aspect_ratio;
        let id = self.ids.next_id();
        self.bitmaps.insert(id, bitmap);
        let el = ImageElement {
            id,
            x: (f64::from(self.canvas.width) - width) / 2.0,
            y: (f64::from(self.canvas.height) - height) / 2.0,
            width,
            height,
            rotation: 0.0,
            skew_x: 0.0,
            skew_y: 0.0,
            src: src.into(),
            aspect_ratio,
            shadow: Shadow::default(),
            stroke: Stroke::default(),
        };
        self.push_selected(CanvasElement::Image(el));
        id
    }

    fn push_selected(&mut self, el: CanvasElement) {
        self.selected = Some(el.id());
        self.selection = (0, 0);
        self.elements.push(el);
    }

    pub fn delete_selected(&mut self) {
        let Some(id) = self.selected.take() else {
            return;
        };
        self.elements.retain(|el| el.id() != id);
        self.bitmaps.remove(id);
        self.selection = (0, 0);
    }

    /// Mutate the selected element in place.
    pub fn update_selected(&mut self, update: impl FnOnce(&mut CanvasElement)) {
        let Some(id) = self.selected else {
            return;
        };
        if let Some(el) = self.elements.iter_mut().find(|el| el.id() == id) {
            update(el);
        }
    }

    /// With an active character selection this appends a color override
    /// range (later ranges win); otherwise it recolors the base style.
    pub fn set_color(&mut self, color: Rgba8) {
        let (start, end) = self.selection;
        self.update_selected(|el| {
            let Some(text) = el.as_text_mut() else {
                return;
            };
            if start == end {
                text.color = color;
            } else {
                text.color_ranges.push(ColorRange { start, end, color });
            }
        });
    }

    /// Font-size counterpart of [`Editor::set_color`].
    pub fn set_font_size(&mut self, font_size: f64) {
        if !font_size.is_finite() || font_size <= 0.0 {
            return;
        }
        let (start, end) = self.selection;
        self.update_selected(|el| {
            let Some(text) = el.as_text_mut() else {
                return;
            };
            if start == end {
                text.font_size = font_size;
            } else {
                text.font_size_ranges.push(FontSizeRange {
                    start,
                    end,
                    font_size,
                });
            }
        });
    }

    // --- frames and export ---

    /// Render the current frame; returns premultiplied RGBA8 pixels at the
    /// display resolution.
    pub fn render(&mut self) -> CollageResult<&[u8]> {
        let options = FrameOptions {
            selected: self.selected,
            text_selection: (self.selection.0 != self.selection.1).then_some(self.selection),
            show_chrome: !self.state.is_selecting_text(),
        };
        self.renderer.render(
            self.base.as_ref(),
            &self.elements,
            &self.bitmaps,
            &mut self.shaper,
            &options,
        )?;
        Ok(self.renderer.data())
    }

    /// Flatten at the base image's native resolution and hand back the
    /// serializable element list.
    pub fn apply(&mut self, overlay: Option<&[u8]>) -> CollageResult<ExportOutput> {
        let base = self
            .base
            .as_ref()
            .ok_or_else(|| CollageError::validation("apply requires a base image"))?;
        export::flatten(
            base,
            &self.elements,
            &self.bitmaps,
            &mut self.shaper,
            self.canvas,
            overlay,
        )
    }
}
