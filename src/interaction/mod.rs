pub mod detector;

pub use detector::{InteractionDetector, InteractionSignal};
