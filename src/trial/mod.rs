pub mod capture;
pub mod sequencer;

pub use capture::ResponseCapture;
pub use sequencer::TrialSequencer;
