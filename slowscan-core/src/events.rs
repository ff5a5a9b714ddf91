//! Observer event surface (spec.md §6). Per Design Note §9, this is a
//! tagged-variant event published to a single registered callback slot
//! rather than a multi-recipient observer object.

use crate::image_buffer::DecodedImage;
use crate::modes::Mode;
use crate::sync_history::DetectionMethod;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    Searching,
    DecodingVis,
    DecodingImage,
    Cancelled,
}

#[derive(Debug, Clone)]
pub enum SstvEvent {
    Searching {
        buffer_seconds: f64,
    },
    ModeDetected {
        mode: Mode,
        vis_code: u8,
        method: DetectionMethod,
    },
    Line {
        line: u32,
        pixels: Vec<u8>,
        width: u32,
        height: u32,
        mode_name: &'static str,
        lines_decoded: u32,
        is_noise: bool,
    },
    ImageComplete {
        image: DecodedImage,
    },
    Reset,
    StateChange {
        state: DecoderState,
    },
    Error {
        message: String,
    },
}

/// A single registered callback slot. Observers set one closure; the closed
/// set of event kinds above is the entire public surface, so no dynamic
/// dispatch over heterogeneous event records is needed.
#[derive(Default)]
pub struct EventSink {
    callback: Option<Box<dyn FnMut(&SstvEvent)>>,
}

impl EventSink {
    pub fn new() -> Self {
        Self { callback: None }
    }

    pub fn set_callback(&mut self, callback: impl FnMut(&SstvEvent) + 'static) {
        self.callback = Some(Box::new(callback));
    }

    pub fn clear_callback(&mut self) {
        self.callback = None;
    }

    pub fn emit(&mut self, event: SstvEvent) {
        if let Some(callback) = &mut self.callback {
            callback(&event);
        }
    }
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink")
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn emits_to_the_registered_callback() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        let mut sink = EventSink::new();
        sink.set_callback(move |event| {
            if let SstvEvent::Reset = event {
                seen_clone.borrow_mut().push("reset");
            }
        });
        sink.emit(SstvEvent::Reset);
        assert_eq!(*seen.borrow(), vec!["reset"]);
    }

    #[test]
    fn does_nothing_without_a_registered_callback() {
        let mut sink = EventSink::new();
        sink.emit(SstvEvent::Reset);
    }
}
