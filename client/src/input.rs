use crate::viewport::AffineViewport;

/// Pointer input in canvas pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    Down { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    /// `zoom_out` is set when the modifier key is held.
    Up { x: f64, y: f64, zoom_out: bool },
    /// Pointer left the canvas or the gesture was cancelled.
    Cancel,
    Wheel { x: f64, y: f64, delta_y: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    /// `anchor` is the world point grabbed at pointer-down.
    Dragging { anchor: (f64, f64), dragged: bool },
}

/// Viewport change requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    None,
    /// Translate by a world-space delta.
    Pan { dx: f64, dy: f64 },
    /// Zoom about the pointer by `zoom_step ^ clicks`.
    Zoom { clicks: f64 },
}

/// The click/drag/wheel state machine.
///
/// | state                      | input  | next                       | gesture          |
/// |----------------------------|--------|----------------------------|------------------|
/// | any                        | Down   | Dragging(anchor, false)    | none             |
/// | Idle                       | Move   | Idle                       | none             |
/// | Dragging                   | Move   | Dragging(anchor, true)     | pan to anchor    |
/// | Dragging(_, false)         | Up     | Idle                       | zoom in/out by 1 |
/// | Dragging(_, true) or Idle  | Up     | Idle                       | none             |
/// | any                        | Cancel | Idle                       | none             |
/// | any                        | Wheel  | unchanged                  | zoom by -sign(d) |
///
/// A move to the pointer's current position is not a drag.
pub fn transition(
    state: DragState,
    input: PointerInput,
    pointer: (f64, f64),
    viewport: &AffineViewport,
) -> (DragState, Gesture) {
    match (state, input) {
        (_, PointerInput::Down { x, y }) => (
            DragState::Dragging {
                anchor: viewport.to_world(x, y),
                dragged: false,
            },
            Gesture::None,
        ),
        (DragState::Idle, PointerInput::Move { .. }) => (DragState::Idle, Gesture::None),
        (DragState::Dragging { anchor, dragged }, PointerInput::Move { x, y }) => {
            if (x, y) == pointer {
                return (DragState::Dragging { anchor, dragged }, Gesture::None);
            }
            let (wx, wy) = viewport.to_world(x, y);
            (
                DragState::Dragging {
                    anchor,
                    dragged: true,
                },
                Gesture::Pan {
                    dx: wx - anchor.0,
                    dy: wy - anchor.1,
                },
            )
        }
        (DragState::Dragging { dragged: false, .. }, PointerInput::Up { zoom_out, .. }) => (
            DragState::Idle,
            Gesture::Zoom {
                clicks: if zoom_out { -1.0 } else { 1.0 },
            },
        ),
        (_, PointerInput::Up { .. }) | (_, PointerInput::Cancel) => {
            (DragState::Idle, Gesture::None)
        }
        (state, PointerInput::Wheel { delta_y, .. }) => {
            if delta_y == 0.0 || delta_y.is_nan() {
                (state, Gesture::None)
            } else {
                (
                    state,
                    Gesture::Zoom {
                        clicks: -delta_y.signum(),
                    },
                )
            }
        }
    }
}

/// Applies pointer input to a viewport through `transition`.
#[derive(Debug, Clone)]
pub struct InputController {
    state: DragState,
    pointer: (f64, f64),
    zoom_step: f64,
}

impl InputController {
    pub fn new(zoom_step: f64) -> Self {
        Self {
            state: DragState::Idle,
            pointer: (0.0, 0.0),
            zoom_step,
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    /// Returns whether the viewport changed and needs a redraw.
    pub fn handle(&mut self, input: PointerInput, viewport: &mut AffineViewport) -> bool {
        let (next, gesture) = transition(self.state, input, self.pointer, viewport);
        self.state = next;
        match input {
            PointerInput::Down { x, y }
            | PointerInput::Move { x, y }
            | PointerInput::Up { x, y, .. }
            | PointerInput::Wheel { x, y, .. } => self.pointer = (x, y),
            PointerInput::Cancel => {}
        }

        match gesture {
            Gesture::None => false,
            Gesture::Pan { dx, dy } => {
                viewport.translate(dx, dy);
                true
            }
            Gesture::Zoom { clicks } => {
                let (x, y) = self.pointer;
                viewport.zoom_at(x, y, self.zoom_step.powf(clicks));
                true
            }
        }
    }
}
