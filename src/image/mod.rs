pub mod f32;
pub mod io;
pub mod mask;
pub mod traits;
pub mod u8;

pub use self::f32::ImageF32;
pub use self::mask::Mask;
pub use self::traits::{ImageView, ImageViewMut};
pub use self::u8::ImageU8;
