//! Per-field normalizers. Each one accepts any shape publishers are known to
//! emit and degrades to an empty/absent value instead of failing.

pub mod duration;
pub mod image;
pub mod instructions;
pub mod servings;
pub mod text;

pub use duration::format_duration;
pub use image::first_image;
pub use instructions::normalize_instructions;
pub use servings::servings;
pub use text::decode_entities;
