mod main;

pub use main::{
    MappingError, TimelineBound, TimelineMapping, canonical_frame, clip_start_canonical_frame,
    frame_count, variant_frame,
};
