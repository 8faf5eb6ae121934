//! Low-level building blocks for custom matching pipelines.
//!
//! These expose the SSD kernels and scan windows behind [`Matcher`]. Most
//! users should prefer [`Matcher`] and the session types.
//!
//! [`Matcher`]: crate::Matcher

pub use crate::kernel::scalar::SsdScalar;
#[cfg(feature = "simd")]
pub use crate::kernel::simd::SsdSimd;
#[cfg(feature = "rayon")]
pub use crate::kernel::rayon::ssd_scan_par;
pub use crate::kernel::{Kernel, Peak, ScanWindow};
pub use crate::search::search_window;
