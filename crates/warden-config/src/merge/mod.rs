//! Deep merge of TOML values.
//!
//! The merge operates on raw [`toml::Value`] trees rather than deserialized
//! structs. This correctly handles "absent vs default": a missing key in a
//! TOML table will not override the base layer.

mod deep;
mod types;

use deep::record_leaves;

pub use deep::deep_merge;
pub(crate) use deep::deep_merge_tracking;
pub use types::{ConfigLayer, FieldSources};

/// Mark every leaf of the defaults tree with [`ConfigLayer::Defaults`].
pub(crate) fn record_defaults(defaults: &toml::Value, sources: &mut FieldSources) {
    record_leaves(defaults, "", &ConfigLayer::Defaults, sources);
}
