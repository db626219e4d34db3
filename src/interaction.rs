use crate::{
    core::{CANVAS_HEIGHT, CANVAS_WIDTH, MIN_ELEMENT_SIZE, RESIZE_HANDLE_RADIUS, Rect},
    scene::{ElementId, Scene},
};

/// Where the canvas sits on screen. Display scaling is cosmetic only and is
/// inverted here when mapping pointer coordinates into canvas units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub origin_x: f64,
    pub origin_y: f64,
    pub display_w: f64,
    pub display_h: f64,
}

impl Viewport {
    /// Identity mapping: display coordinates are already canvas units.
    pub fn logical() -> Self {
        Self {
            origin_x: 0.0,
            origin_y: 0.0,
            display_w: f64::from(CANVAS_WIDTH),
            display_h: f64::from(CANVAS_HEIGHT),
        }
    }

    pub fn to_canvas(&self, px: f64, py: f64) -> (f64, f64) {
        let sx = f64::from(CANVAS_WIDTH) / self.display_w;
        let sy = f64::from(CANVAS_HEIGHT) / self.display_h;
        ((px - self.origin_x) * sx, (py - self.origin_y) * sy)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Drag {
    Idle,
    Moving {
        id: ElementId,
        start_pointer: (f64, f64),
        start_rect: Rect,
    },
    Resizing {
        id: ElementId,
        start_pointer: (f64, f64),
        start_rect: Rect,
    },
}

/// Pointer-driven editor for the scene geometry. Every transition is
/// suppressed while capturing; a move event without a recorded start is a
/// no-op by construction.
pub struct InteractionController {
    drag: Drag,
    selected: Option<ElementId>,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionController {
    pub fn new() -> Self {
        Self {
            drag: Drag::Idle,
            selected: None,
        }
    }

    pub fn selected(&self) -> Option<ElementId> {
        self.selected
    }

    pub fn is_dragging(&self) -> bool {
        !matches!(self.drag, Drag::Idle)
    }

    /// Hit-test and arm a drag. Resize hot-zones are tested for every
    /// element first (storage order, first match wins) before any body
    /// containment test; body hits scan topmost-first, which is reverse
    /// storage order and independent of z.
    pub fn pointer_down(
        &mut self,
        scene: &Scene,
        viewport: &Viewport,
        px: f64,
        py: f64,
        capturing: bool,
    ) {
        if capturing {
            return;
        }

        let (cx, cy) = viewport.to_canvas(px, py);

        for el in scene.elements() {
            let (bx, by) = el.rect.bottom_right();
            let d = ((cx - bx).powi(2) + (cy - by).powi(2)).sqrt();
            if d < RESIZE_HANDLE_RADIUS {
                self.selected = Some(el.id);
                self.drag = Drag::Resizing {
                    id: el.id,
                    start_pointer: (cx, cy),
                    start_rect: el.rect,
                };
                return;
            }
        }

        for el in scene.elements().iter().rev() {
            if el.rect.contains(cx, cy) {
                self.selected = Some(el.id);
                self.drag = Drag::Moving {
                    id: el.id,
                    start_pointer: (cx, cy),
                    start_rect: el.rect,
                };
                return;
            }
        }

        self.selected = None;
        self.drag = Drag::Idle;
    }

    /// Apply the drag delta. Moves are unclamped (elements may leave the
    /// canvas); resizes grow from the bottom-right only and floor both
    /// dimensions at the minimum element size.
    pub fn pointer_move(
        &mut self,
        scene: &mut Scene,
        viewport: &Viewport,
        px: f64,
        py: f64,
        capturing: bool,
    ) {
        if capturing {
            return;
        }

        let (cx, cy) = viewport.to_canvas(px, py);

        match self.drag {
            Drag::Idle => {}
            Drag::Moving {
                id,
                start_pointer,
                start_rect,
            } => {
                let dx = cx - start_pointer.0;
                let dy = cy - start_pointer.1;
                let el = scene.element_mut(id);
                el.rect.x = start_rect.x + dx;
                el.rect.y = start_rect.y + dy;
            }
            Drag::Resizing {
                id,
                start_pointer,
                start_rect,
            } => {
                let dx = cx - start_pointer.0;
                let dy = cy - start_pointer.1;
                let el = scene.element_mut(id);
                el.rect.w = (start_rect.w + dx).max(MIN_ELEMENT_SIZE);
                el.rect.h = (start_rect.h + dy).max(MIN_ELEMENT_SIZE);
            }
        }
    }

    /// Unconditional return to idle, whatever the current state.
    pub fn pointer_up(&mut self) {
        self.drag = Drag::Idle;
    }
}
