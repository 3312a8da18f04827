//! Frame-slot bookkeeping and recreation policy.
//!
//! This module holds the sequencer's pure state machine: the rotating frame
//! slot index, the acquired image index, and the frame-open flag. Keeping it
//! free of Vulkan types makes the protocol invariants (slot rotation, no
//! nested frames, no queries outside a frame) and the recreation policy
//! unit-testable without a GPU.
//!
//! Protocol misuse is a programming error, not a runtime condition: it is
//! guarded by `debug_assert!` and must never occur in correct use of the
//! begin/end protocol.

use lantern_rhi::swapchain::PresentOutcome;

use crate::MAX_FRAMES_IN_FLIGHT;

/// Pure per-frame state: slot rotation and the open-frame flag.
#[derive(Debug)]
pub struct FrameState {
    /// Slot that the next (or current) frame uses.
    current_slot: usize,
    /// Swapchain image index acquired for the current frame.
    image_index: u32,
    /// Whether a frame is currently open (between begin and end).
    frame_started: bool,
}

impl FrameState {
    /// Creates the initial state: slot 0, no frame open.
    pub fn new() -> Self {
        Self {
            current_slot: 0,
            image_index: 0,
            frame_started: false,
        }
    }

    /// The slot the next `begin_frame` will use (or the current frame's
    /// slot while one is open).
    #[inline]
    pub fn current_slot(&self) -> usize {
        self.current_slot
    }

    /// Whether a frame is currently open.
    #[inline]
    pub fn is_frame_started(&self) -> bool {
        self.frame_started
    }

    /// The active frame's slot index.
    ///
    /// Must only be called while a frame is open.
    #[inline]
    pub fn frame_index(&self) -> usize {
        debug_assert!(
            self.frame_started,
            "Cannot get frame index when no frame is in progress"
        );
        self.current_slot
    }

    /// The active frame's acquired swapchain image index.
    ///
    /// Must only be called while a frame is open.
    #[inline]
    pub fn image_index(&self) -> u32 {
        debug_assert!(
            self.frame_started,
            "Cannot get image index when no frame is in progress"
        );
        self.image_index
    }

    /// Opens a frame on the current slot with the acquired image index.
    pub fn begin_frame(&mut self, image_index: u32) {
        debug_assert!(
            !self.frame_started,
            "Cannot begin a frame while one is already in progress"
        );
        self.image_index = image_index;
        self.frame_started = true;
    }

    /// Closes the current frame and advances to the next slot.
    ///
    /// The slot advances regardless of how the frame ended (presented,
    /// recreation triggered, or skipped after submission).
    pub fn end_frame(&mut self) {
        debug_assert!(
            self.frame_started,
            "Cannot end a frame when none is in progress"
        );
        self.frame_started = false;
        self.current_slot = (self.current_slot + 1) % MAX_FRAMES_IN_FLIGHT;
    }
}

impl Default for FrameState {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether an extent can back a swapchain.
///
/// A zero-area surface cannot; recreation is deferred (no Vulkan calls)
/// until the window reports a usable size.
pub fn extent_is_usable(width: u32, height: u32) -> bool {
    width > 0 && height > 0
}

/// Whether presentation's outcome (or an external resize) requires the
/// swapchain to be rebuilt.
///
/// Suboptimal alone forces recreation, independent of the resize flag:
/// rendering into a swapchain that no longer matches the surface risks
/// stale image parameters, and recreation is cheap at this rarity.
pub fn should_recreate_after_present(outcome: PresentOutcome, resize_requested: bool) -> bool {
    matches!(outcome, PresentOutcome::NeedsRecreation) || resize_requested
}

#[cfg(test)]
mod tests {
    use super::*;
    use lantern_rhi::swapchain::ImageAcquire;

    #[test]
    fn test_slot_rotation() {
        let mut state = FrameState::new();

        // After N frames the slot index is N mod MAX_FRAMES_IN_FLIGHT
        for n in 0..7 {
            assert_eq!(state.current_slot(), n % MAX_FRAMES_IN_FLIGHT);
            state.begin_frame(0);
            assert_eq!(state.frame_index(), n % MAX_FRAMES_IN_FLIGHT);
            state.end_frame();
        }
        assert_eq!(state.current_slot(), 7 % MAX_FRAMES_IN_FLIGHT);
    }

    #[test]
    fn test_image_index_is_per_frame() {
        let mut state = FrameState::new();
        state.begin_frame(2);
        assert_eq!(state.image_index(), 2);
        state.end_frame();
        state.begin_frame(0);
        assert_eq!(state.image_index(), 0);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "already in progress")]
    fn test_double_begin_panics() {
        let mut state = FrameState::new();
        state.begin_frame(0);
        state.begin_frame(1);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "none is in progress")]
    fn test_end_without_begin_panics() {
        let mut state = FrameState::new();
        state.end_frame();
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "no frame is in progress")]
    fn test_frame_index_outside_frame_panics() {
        let state = FrameState::new();
        let _ = state.frame_index();
    }

    #[test]
    fn test_zero_extent_defers_recreation() {
        // Neither dimension may be zero; recreation waits for both
        assert!(!extent_is_usable(0, 0));
        assert!(!extent_is_usable(800, 0));
        assert!(!extent_is_usable(0, 600));
        assert!(extent_is_usable(800, 600));
        assert!(extent_is_usable(1, 1));
    }

    #[test]
    fn test_recreation_policy() {
        // Suboptimal/out-of-date always recreates, with or without resize
        assert!(should_recreate_after_present(
            PresentOutcome::NeedsRecreation,
            false
        ));
        assert!(should_recreate_after_present(
            PresentOutcome::NeedsRecreation,
            true
        ));
        // A clean present recreates only when a resize was signaled
        assert!(should_recreate_after_present(PresentOutcome::Presented, true));
        assert!(!should_recreate_after_present(
            PresentOutcome::Presented,
            false
        ));
    }

    /// Scripted stand-in for the sequencer's control flow, driving the pure
    /// state machine through acquire/present outcomes without a GPU. Fences
    /// are modeled as per-slot booleans: `begin` refuses to proceed while
    /// the slot's previous submission has not "completed."
    struct ScriptedSequencer {
        state: FrameState,
        resize_requested: bool,
        recreations: usize,
        /// Fence per slot; starts signaled like the real fences.
        fence_signaled: [bool; MAX_FRAMES_IN_FLIGHT],
        /// Slots with submitted work whose fence has not been signaled yet.
        pending: Vec<usize>,
    }

    enum BeginResult {
        /// The slot's fence is unsignaled: a real sequencer would block here.
        Blocked,
        /// Out-of-date acquisition: swapchain recreated, frame skipped.
        NoFrame,
        /// Frame open on the given image index.
        Frame(u32),
    }

    impl ScriptedSequencer {
        fn new() -> Self {
            Self {
                state: FrameState::new(),
                resize_requested: false,
                recreations: 0,
                fence_signaled: [true; MAX_FRAMES_IN_FLIGHT],
                pending: Vec::new(),
            }
        }

        fn begin(&mut self, acquire: ImageAcquire) -> BeginResult {
            assert!(!self.state.is_frame_started());
            let slot = self.state.current_slot();

            if !self.fence_signaled[slot] {
                return BeginResult::Blocked;
            }

            match acquire {
                ImageAcquire::OutOfDate => {
                    self.recreations += 1;
                    BeginResult::NoFrame
                }
                ImageAcquire::Acquired { index, .. } => {
                    // Reset only after an image is secured; resetting before
                    // a failed acquire would deadlock the next wait
                    self.fence_signaled[slot] = false;
                    self.state.begin_frame(index);
                    BeginResult::Frame(index)
                }
            }
        }

        fn end(&mut self, outcome: PresentOutcome) {
            assert!(self.state.is_frame_started());
            self.pending.push(self.state.frame_index());

            if should_recreate_after_present(outcome, self.resize_requested) {
                self.resize_requested = false;
                self.recreations += 1;
            }

            self.state.end_frame();
        }

        /// Simulates the GPU retiring the oldest submission.
        fn complete_oldest(&mut self) {
            let slot = self.pending.remove(0);
            self.fence_signaled[slot] = true;
        }
    }

    #[test]
    fn test_scenario_normal_frame() {
        // Scenario A: a clean frame on slot 0 advances to slot 1 with no
        // recreation
        let mut seq = ScriptedSequencer::new();

        match seq.begin(ImageAcquire::Acquired {
            index: 0,
            suboptimal: false,
        }) {
            BeginResult::Frame(index) => assert_eq!(index, 0),
            _ => panic!("begin should open a frame"),
        }
        assert_eq!(seq.state.frame_index(), 0);

        seq.end(PresentOutcome::Presented);
        assert_eq!(seq.state.current_slot(), 1);
        assert_eq!(seq.recreations, 0);
    }

    #[test]
    fn test_scenario_out_of_date_on_acquire() {
        // Scenario B: out-of-date on the first acquire recreates once,
        // skips the tick, and the next tick proceeds normally on the same
        // slot
        let mut seq = ScriptedSequencer::new();

        match seq.begin(ImageAcquire::OutOfDate) {
            BeginResult::NoFrame => {}
            _ => panic!("out-of-date should skip the frame"),
        }
        assert_eq!(seq.recreations, 1);
        assert!(!seq.state.is_frame_started());
        assert_eq!(seq.state.current_slot(), 0);

        // Next tick succeeds; the fence was not reset by the failed tick
        match seq.begin(ImageAcquire::Acquired {
            index: 1,
            suboptimal: false,
        }) {
            BeginResult::Frame(_) => {}
            _ => panic!("next tick should open a frame"),
        }
        seq.end(PresentOutcome::Presented);
        assert_eq!(seq.recreations, 1);
        assert_eq!(seq.state.current_slot(), 1);
    }

    #[test]
    fn test_scenario_suboptimal_on_present() {
        // Scenario C: suboptimal at present recreates after presentation
        // and the slot still advances by exactly one
        let mut seq = ScriptedSequencer::new();

        match seq.begin(ImageAcquire::Acquired {
            index: 0,
            suboptimal: false,
        }) {
            BeginResult::Frame(_) => {}
            _ => panic!("begin should open a frame"),
        }
        seq.end(PresentOutcome::NeedsRecreation);

        assert_eq!(seq.recreations, 1);
        assert_eq!(seq.state.current_slot(), 1);
    }

    #[test]
    fn test_fence_gates_slot_reuse() {
        // With a slow GPU (no fences signaled), only MAX_FRAMES_IN_FLIGHT
        // frames can be opened before begin blocks on the recycled slot
        let mut seq = ScriptedSequencer::new();

        for i in 0..MAX_FRAMES_IN_FLIGHT {
            match seq.begin(ImageAcquire::Acquired {
                index: i as u32,
                suboptimal: false,
            }) {
                BeginResult::Frame(_) => {}
                _ => panic!("frame {} should start", i),
            }
            seq.end(PresentOutcome::Presented);
        }

        // Slot 0 comes around again with its submission still outstanding
        match seq.begin(ImageAcquire::Acquired {
            index: 0,
            suboptimal: false,
        }) {
            BeginResult::Blocked => {}
            _ => panic!("slot reuse must block until the fence signals"),
        }

        // Once the GPU retires slot 0's work, the frame proceeds
        seq.complete_oldest();
        match seq.begin(ImageAcquire::Acquired {
            index: 0,
            suboptimal: false,
        }) {
            BeginResult::Frame(_) => {}
            _ => panic!("frame should start after the fence signals"),
        }
    }
}
