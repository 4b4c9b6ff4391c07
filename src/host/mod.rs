//! Host application seam.
//!
//! [`Host`] is what the orchestrators see of the 3D application.
//! [`SceneFile`] implements it over a JSON scene document.

pub mod scene_file;
pub mod traits;

pub use scene_file::{SceneDocument, SceneFile, SceneObject};
pub use traits::Host;
