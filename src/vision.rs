mod color;
mod components;
mod frame;
mod morphology;
mod motion;
mod rect;

pub use color::{ChannelRange, ColorSpec, Hsv};
pub use components::{AreaBounds, ContourExtractor, DetectionCandidate, find_components, select_largest};
pub use frame::{Frame, Mask, fuse};
pub use morphology::{MorphologyParams, dilate, erode, gaussian_blur, normalize_kernel_size, refine};
pub use motion::{BackgroundModel, MotionConfig};
pub use rect::Rect;
