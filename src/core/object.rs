//! Host object identity.
//!
//! Objects are referenced by a session-scoped token assigned by the host
//! plus the object name at the time the reference was taken. The token
//! survives reordering and renaming within a session; the name lets a
//! reference be re-attached when the token is no longer known.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable reference to a host object.
///
/// # Examples
///
/// ```
/// use rizom_bridge::core::ObjectId;
///
/// let id = ObjectId::new(7, "Helmet");
/// assert_eq!(id.to_string(), "Helmet#7");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId {
    /// Session-scoped token assigned by the host.
    pub token: u64,

    /// Object name when the reference was taken.
    pub name: String,
}

impl ObjectId {
    /// Creates a new object reference.
    #[must_use]
    pub fn new(token: u64, name: impl Into<String>) -> Self {
        Self {
            token,
            name: name.into(),
        }
    }

    /// Returns the object name cleaned for use as a file stem.
    #[must_use]
    pub fn file_stem(&self) -> String {
        clean_name(&self.name)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.token)
    }
}

/// Kind of a host object. Only meshes are eligible for export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// Polygon mesh.
    Mesh,
    /// Curve object.
    Curve,
    /// Camera.
    Camera,
    /// Light.
    Light,
    /// Empty / locator.
    Empty,
}

impl ObjectKind {
    /// Returns true for mesh objects.
    #[must_use]
    pub const fn is_mesh(self) -> bool {
        matches!(self, Self::Mesh)
    }
}

/// Object reference together with its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Object reference.
    pub id: ObjectId,
    /// Object kind.
    pub kind: ObjectKind,
}

/// Makes an object name safe as a file name.
///
/// Every character outside `[A-Za-z0-9_-]` becomes `_`. An empty name
/// becomes `object`.
///
/// # Examples
///
/// ```
/// use rizom_bridge::core::clean_name;
///
/// assert_eq!(clean_name("Body.001"), "Body_001");
/// assert_eq!(clean_name(""), "object");
/// ```
#[must_use]
pub fn clean_name(name: &str) -> String {
    if name.is_empty() {
        return "object".to_string();
    }
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
