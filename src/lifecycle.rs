//! Mounting, event delivery and teardown of trail overlays.
//!
//! The host owns an [`EventHub`]: a registry of listeners and pending frame
//! requests, shared by handle with every overlay. A mounted overlay holds
//! exactly one resize listener, one pointer-move listener and at most one
//! pending frame. Teardown releases all three and runs on every exit path,
//! including drop.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

use kurbo::Point;

use crate::color::ColorSource;
use crate::config::TrailConfig;
use crate::engine::{FrameReport, TrailEngine};
use crate::error::Error;
use crate::surface::{Surface, Viewport};
use crate::types::FrameBuffer;

/// What a listener is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    Resize,
    PointerMove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(u64);

/// Raw input from the host, before fan-out to listeners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Signal {
    PointerMove(Point),
    Resize(Viewport),
}

/// One delivery to one listener, or one due frame callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    PointerMove { listener: ListenerId, position: Point },
    Resize { listener: ListenerId, viewport: Viewport },
    Frame(FrameId),
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: BTreeMap<ListenerId, ListenerKind>,
    frames: Vec<FrameId>,
}

impl Registry {
    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Listener and frame-request registry. Clones share state.
#[derive(Clone, Default)]
pub struct EventHub {
    inner: Rc<RefCell<Registry>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&self, kind: ListenerKind) -> ListenerId {
        let mut reg = self.inner.borrow_mut();
        let id = ListenerId(reg.next());
        reg.listeners.insert(id, kind);
        id
    }

    /// Returns false if `id` was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.borrow_mut().listeners.remove(&id).is_some()
    }

    /// Ask for one callback on the next tick.
    pub fn request_frame(&self) -> FrameId {
        let mut reg = self.inner.borrow_mut();
        let id = FrameId(reg.next());
        reg.frames.push(id);
        id
    }

    /// Returns false if `id` was not pending.
    pub fn cancel_frame(&self, id: FrameId) -> bool {
        let mut reg = self.inner.borrow_mut();
        let before = reg.frames.len();
        reg.frames.retain(|f| *f != id);
        reg.frames.len() != before
    }

    /// Address `signal` to every listener of its kind.
    pub fn fan_out(&self, signal: Signal) -> Vec<Event> {
        let reg = self.inner.borrow();
        let kind = match signal {
            Signal::PointerMove(_) => ListenerKind::PointerMove,
            Signal::Resize(_) => ListenerKind::Resize,
        };
        reg.listeners
            .iter()
            .filter(|&(_, k)| *k == kind)
            .map(|(&listener, _)| match signal {
                Signal::PointerMove(position) => Event::PointerMove { listener, position },
                Signal::Resize(viewport) => Event::Resize { listener, viewport },
            })
            .collect()
    }

    /// Drain the frames requested so far. Requests made while handling them
    /// land in the next tick.
    pub fn take_due_frames(&self) -> Vec<Event> {
        let frames = std::mem::take(&mut self.inner.borrow_mut().frames);
        frames.into_iter().map(Event::Frame).collect()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    pub fn listener_count_of(&self, kind: ListenerKind) -> usize {
        self.inner.borrow().listeners.values().filter(|k| **k == kind).count()
    }

    pub fn pending_frames(&self) -> usize {
        self.inner.borrow().frames.len()
    }
}

/// Host capabilities, probed once before anything is mounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// A mouse-like pointer is present (as opposed to touch only).
    pub precise_pointer: bool,
}

/// Why an overlay never started.
#[derive(Debug)]
pub enum DormantReason {
    NoPrecisePointer,
    InvalidConfig(Error),
    Surface(Error),
}

struct Running {
    engine: TrailEngine,
    surface: Surface,
    resize: ListenerId,
    pointer: ListenerId,
    frame: Option<FrameId>,
    last_report: Option<FrameReport>,
}

enum State {
    Dormant(DormantReason),
    Running(Box<Running>),
    TornDown,
}

/// A mounted trail layer.
pub struct Overlay {
    name: String,
    hub: EventHub,
    state: State,
}

impl Overlay {
    /// Mount a layer. Never fails: a host without a precise pointer, an
    /// invalid config or a surface that cannot be allocated all yield a
    /// dormant overlay that registers nothing and draws nothing.
    pub fn mount(
        hub: &EventHub,
        caps: Capabilities,
        config: TrailConfig,
        theme: Arc<dyn ColorSource>,
        viewport: Viewport,
        seed: Option<u64>,
    ) -> Self {
        let name = config.name.clone();
        let dormant = |reason: DormantReason| {
            tracing::debug!(layer = %name, ?reason, "overlay stays dormant");
            Overlay { name: name.clone(), hub: hub.clone(), state: State::Dormant(reason) }
        };

        if !caps.precise_pointer {
            return dormant(DormantReason::NoPrecisePointer);
        }
        if let Err(err) = config.validate() {
            return dormant(DormantReason::InvalidConfig(err));
        }
        let surface = match Surface::new(viewport) {
            Ok(s) => s,
            Err(err) => return dormant(DormantReason::Surface(err)),
        };

        let running = Running {
            engine: TrailEngine::new(config, theme, seed),
            surface,
            resize: hub.add_listener(ListenerKind::Resize),
            pointer: hub.add_listener(ListenerKind::PointerMove),
            frame: Some(hub.request_frame()),
            last_report: None,
        };
        tracing::info!(layer = %name, ?viewport, "overlay mounted");
        Overlay { name, hub: hub.clone(), state: State::Running(Box::new(running)) }
    }

    /// Handle one event. Events addressed to other overlays are ignored.
    pub fn handle(&mut self, event: &Event) -> Option<FrameReport> {
        let State::Running(run) = &mut self.state else {
            return None;
        };
        match *event {
            Event::PointerMove { listener, position } if listener == run.pointer => {
                run.engine.on_pointer(position);
                None
            }
            Event::Resize { listener, viewport } if listener == run.resize => {
                match run.surface.resize(viewport) {
                    Ok(()) => {
                        tracing::debug!(layer = %self.name, ?viewport, "surface resized");
                        None
                    }
                    Err(err) => {
                        tracing::debug!(layer = %self.name, %err, "surface lost on resize");
                        self.teardown();
                        self.state = State::Dormant(DormantReason::Surface(err));
                        None
                    }
                }
            }
            Event::Frame(id) if run.frame == Some(id) => {
                let report = run.engine.frame(&mut run.surface);
                run.last_report = Some(report);
                run.frame = Some(self.hub.request_frame());
                Some(report)
            }
            _ => None,
        }
    }

    /// Release listeners and the pending frame. Safe to call any number of times.
    pub fn teardown(&mut self) {
        let state = std::mem::replace(&mut self.state, State::TornDown);
        match state {
            State::Running(run) => {
                self.hub.remove_listener(run.resize);
                self.hub.remove_listener(run.pointer);
                if let Some(frame) = run.frame {
                    self.hub.cancel_frame(frame);
                }
                tracing::info!(layer = %self.name, frames = run.engine.frames(), "overlay torn down");
            }
            other => self.state = other,
        }
    }

    /// Draw this layer over `fb`. Dormant and torn-down overlays draw nothing.
    pub fn composite_onto(&self, fb: &mut FrameBuffer) {
        if let State::Running(run) = &self.state {
            run.surface.composite_onto(fb);
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running(_))
    }

    pub fn dormant_reason(&self) -> Option<&DormantReason> {
        match &self.state {
            State::Dormant(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn engine(&self) -> Option<&TrailEngine> {
        match &self.state {
            State::Running(run) => Some(&run.engine),
            _ => None,
        }
    }

    pub fn surface(&self) -> Option<&Surface> {
        match &self.state {
            State::Running(run) => Some(&run.surface),
            _ => None,
        }
    }

    pub fn last_report(&self) -> Option<FrameReport> {
        match &self.state {
            State::Running(run) => run.last_report,
            _ => None,
        }
    }
}

impl Drop for Overlay {
    fn drop(&mut self) {
        self.teardown();
    }
}
