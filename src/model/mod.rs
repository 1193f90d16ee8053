//! Domain types for the Content Directory tree (SPEC_FULL.md §3).

pub mod autoscan;
pub mod changed;
pub mod config_value;
pub mod ids;
pub mod location;
pub mod metadata;
pub mod object;
pub mod resource;

pub use autoscan::{AutoscanDirectory, ScanLevel, ScanMode};
pub use changed::ChangedContainers;
pub use config_value::{ConfigStatus, ConfigValue};
pub use ids::{ObjectFlags, ObjectId, ObjectType, ROOT_ID};
pub use location::{add_location_prefix, strip_location_prefix, Location};
pub use metadata::{diff_metadata, Metadata, MetadataDiff};
pub use object::{CdsObject, ObjectHeader};
pub use resource::{compact_ordinals, diff_resources, Resource, ResourceAttributes, ResourceDiff};
