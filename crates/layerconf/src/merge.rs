//! Override merge between config layers.
//!
//! A later layer wins for every value it actually sets. What counts as
//! "set" depends on the type:
//!
//! - scalars and strings are set when they differ from their zero value,
//! - `Option` is set when `Some`, and then replaces wholesale,
//! - `Vec` is set when non-empty, and then replaces wholesale,
//! - maps merge key by key,
//! - `serde_yaml::Value` mappings merge key by key and `Null` is unset,
//! - records merge field by field (see [`impl_merge!`](crate::impl_merge)).
//!
//! A consequence for scalars: an overlay cannot reset a field to `false`,
//! `0` or `""`. Schemas that need that wrap the field in `Option`.

use serde_yaml::Value;
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use std::path::PathBuf;

/// Merge a later layer into `self`.
pub trait Merge {
    /// Apply every value set in `overlay` onto `self`.
    fn merge(&mut self, overlay: Self);
}

/// Implement [`Merge`] for records by merging each listed field.
///
/// ```
/// use layerconf::{Merge, impl_merge};
///
/// #[derive(Default)]
/// struct Server {
///     host: String,
///     port: u16,
/// }
///
/// impl_merge!(Server { host, port });
///
/// let mut base = Server { host: "db".into(), port: 8081 };
/// base.merge(Server { host: String::new(), port: 8082 });
/// assert_eq!(base.host, "db");
/// assert_eq!(base.port, 8082);
/// ```
#[macro_export]
macro_rules! impl_merge {
    ($($ty:ty { $($field:ident),* $(,)? }),+ $(,)?) => {
        $(
            impl $crate::Merge for $ty {
                #[allow(unused_variables)]
                fn merge(&mut self, overlay: Self) {
                    $($crate::Merge::merge(&mut self.$field, overlay.$field);)*
                }
            }
        )+
    };
}

macro_rules! merge_if_not_zero {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Merge for $ty {
                fn merge(&mut self, overlay: Self) {
                    if overlay != <$ty>::default() {
                        *self = overlay;
                    }
                }
            }
        )*
    };
}

merge_if_not_zero!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    String, PathBuf,
);

impl<T> Merge for Option<T> {
    fn merge(&mut self, overlay: Self) {
        if overlay.is_some() {
            *self = overlay;
        }
    }
}

impl<T> Merge for Vec<T> {
    fn merge(&mut self, overlay: Self) {
        if !overlay.is_empty() {
            *self = overlay;
        }
    }
}

impl<K: Eq + Hash, V: Merge, S: BuildHasher> Merge for HashMap<K, V, S> {
    fn merge(&mut self, overlay: Self) {
        for (key, value) in overlay {
            match self.get_mut(&key) {
                Some(existing) => existing.merge(value),
                None => {
                    self.insert(key, value);
                }
            }
        }
    }
}

impl<K: Ord, V: Merge> Merge for BTreeMap<K, V> {
    fn merge(&mut self, overlay: Self) {
        for (key, value) in overlay {
            match self.get_mut(&key) {
                Some(existing) => existing.merge(value),
                None => {
                    self.insert(key, value);
                }
            }
        }
    }
}

/// Untyped documents merge recursively through mappings.
impl Merge for Value {
    fn merge(&mut self, overlay: Self) {
        match (self, overlay) {
            (_, Value::Null) => {}
            (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
                for (key, value) in overlay_map {
                    match base_map.get_mut(&key) {
                        Some(existing) => existing.merge(value),
                        None => {
                            base_map.insert(key, value);
                        }
                    }
                }
            }
            (base_slot, overlay_value) => {
                *base_slot = overlay_value;
            }
        }
    }
}
