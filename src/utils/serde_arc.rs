//! Serde adapters for `Arc<T>` fields, so the IR can be (de)serialised without
//! enabling serde's `rc` feature.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::Arc;

pub fn serialize<S, T>(val: &Arc<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    T::serialize(val.as_ref(), serializer)
}

pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Arc<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Arc::new)
}

/// Same adapters for `Vec<Arc<T>>` (call arguments, tuple members).
pub mod vec {
    use super::*;

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S, T>(vals: &Vec<Arc<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        serializer.collect_seq(vals.iter().map(|v| v.as_ref()))
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Vec<Arc<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Vec::<T>::deserialize(deserializer).map(|vals| vals.into_iter().map(Arc::new).collect())
    }
}

/// Adapters for `Option<Arc<T>>` (instance-call receivers).
pub mod option {
    use super::*;

    pub fn serialize<S, T>(val: &Option<Arc<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        match val {
            Some(inner) => serializer.serialize_some(inner.as_ref()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Arc<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(|val| val.map(Arc::new))
    }
}
