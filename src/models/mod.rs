pub mod attendance;
pub mod files;
pub mod pagination;
pub mod students;
pub mod users;

use serde::{Deserialize, Deserializer};

/// Wraps any present value, including `null`, in `Some`.
///
/// Paired with `#[serde(default)]` so an absent field stays `None` while an
/// explicit `null` becomes `Some(None)`.
pub(crate) fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}
