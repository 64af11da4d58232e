//! Structured lens format:
//!
//! ```json
//! {
//!   "wavelengths": [0.000587],
//!   "diaphragm": 12.0,
//!   "surfaces": [
//!     { "radius": 50.0, "offset": 0.0, "diameter": 20.0, "indices": [1.5168] },
//!     { "kind": "stop", "offset": 5.0, "diameter": 14.0 },
//!     { "offset": 5.0, "diameter": 20.0, "indices": [1.0] }
//!   ]
//! }
//! ```
//!
//! A surface without `radius` is flat.
use super::LensDescription;
use crate::core::error::{LensError, Result};

pub fn parse_description(text: &str) -> Result<LensDescription> {
    serde_json::from_str(text).map_err(|e| LensError::Parse {
        line: e.line(),
        message: e.to_string()
    })
}
