mod config;
mod gate;
mod object_tracker;
mod perspective;
mod position;
mod quad;
mod smoother;

pub use config::{DetectionParams, TrackerConfig};
pub use gate::{GatePolicy, GateVerdict, ValidityGate};
pub use object_tracker::{MIN_WARMUP_FRAMES, TickOutcome, TickReport, Tracker};
pub use perspective::PerspectiveRectifier;
pub use position::{NormalizedPosition, PositionReader, PositionStore};
pub use quad::TankQuad;
pub use smoother::Smoother;
