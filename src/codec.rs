//! Versioned binary codec for fields stored as opaque blobs.
//!
//! Every blob starts with a two byte header: the [`MAGIC`] byte and the
//! version of the type's codec that wrote it. A type can raise its
//! [`OpaqueCodec::VERSION`] and keep reading older bodies in
//! [`OpaqueCodec::decode_body`]; a body written by a newer version than the
//! reader knows is refused.
//!
//! Serde types can use [`json_codec!`](crate::json_codec) for a JSON body.
//! The std collections (`Vec`, `VecDeque`, `HashSet`, `BTreeSet`, `HashMap`,
//! `BTreeMap`) of serde types already have one.
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, RowforgeError};

#[doc(hidden)]
pub use serde_json;

pub const MAGIC: u8 = 0xB7;

pub trait OpaqueCodec: Sized {
    const VERSION: u8;
    fn encode_body(&self) -> Result<Vec<u8>>;
    /// `version` is at most `Self::VERSION`.
    fn decode_body(version: u8, body: &[u8]) -> Result<Self>;
}

pub fn serialize<T: OpaqueCodec>(value: &T) -> Result<Vec<u8>> {
    let body = value.encode_body()?;
    let mut framed = Vec::with_capacity(body.len() + 2);
    framed.push(MAGIC);
    framed.push(T::VERSION);
    framed.extend_from_slice(&body);
    Ok(framed)
}

pub fn deserialize<T: OpaqueCodec>(bytes: &[u8]) -> Result<T> {
    let type_name = std::any::type_name::<T>();
    match bytes {
        [MAGIC, version, body @ ..] => {
            if *version > T::VERSION {
                return Err(RowforgeError::Codec(format!(
                    "{} blob has version {} but only {} is known",
                    type_name,
                    version,
                    T::VERSION
                )));
            }
            T::decode_body(*version, body)
        }
        [_, _, ..] => Err(RowforgeError::Codec(format!(
            "{} blob does not start with the rowforge header",
            type_name
        ))),
        _ => Err(RowforgeError::Codec(format!(
            "{} blob is too short ({} bytes)",
            type_name,
            bytes.len()
        ))),
    }
}

/// Implements [`OpaqueCodec`] with a JSON body for serde types.
///
/// ```
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize, PartialEq, Debug)]
/// struct Dimensions { width: u32, height: u32 }
/// rowforge::json_codec!(Dimensions);
///
/// let blob = rowforge::codec::serialize(&Dimensions { width: 3, height: 4 }).unwrap();
/// let back: Dimensions = rowforge::codec::deserialize(&blob).unwrap();
/// assert_eq!(back, Dimensions { width: 3, height: 4 });
/// ```
#[macro_export]
macro_rules! json_codec {
    ($($t:ty),+ $(,)?) => {
        $(
            impl $crate::codec::OpaqueCodec for $t {
                const VERSION: u8 = 1;
                fn encode_body(&self) -> $crate::Result<::std::vec::Vec<u8>> {
                    ::std::result::Result::Ok($crate::codec::serde_json::to_vec(self)?)
                }
                fn decode_body(_version: u8, body: &[u8]) -> $crate::Result<Self> {
                    ::std::result::Result::Ok($crate::codec::serde_json::from_slice(body)?)
                }
            }
        )+
    };
}

// ------------- Std collections -------------
// the orphan rule keeps callers from giving these a codec themselves
macro_rules! json_collection_codecs {
    ($(<$($g:ident $(: $first:ident $(+ $extra:ident)*)?),+> $t:ty;)+) => {
        $(
            impl<$($g: Serialize + DeserializeOwned $(+ $first $(+ $extra)*)?),+> OpaqueCodec for $t {
                const VERSION: u8 = 1;
                fn encode_body(&self) -> Result<Vec<u8>> {
                    Ok(serde_json::to_vec(self)?)
                }
                fn decode_body(_version: u8, body: &[u8]) -> Result<Self> {
                    Ok(serde_json::from_slice(body)?)
                }
            }
        )+
    };
}

json_collection_codecs! {
    <T> Vec<T>;
    <T> VecDeque<T>;
    <T: Eq + Hash> HashSet<T>;
    <T: Ord> BTreeSet<T>;
    <K: Eq + Hash, V> HashMap<K, V>;
    <K: Ord, V> BTreeMap<K, V>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Pair(u16, u16);

    impl OpaqueCodec for Pair {
        const VERSION: u8 = 2;
        fn encode_body(&self) -> Result<Vec<u8>> {
            let mut body = self.0.to_be_bytes().to_vec();
            body.extend_from_slice(&self.1.to_be_bytes());
            Ok(body)
        }
        fn decode_body(version: u8, body: &[u8]) -> Result<Self> {
            match (version, body) {
                // version 1 only stored the first half
                (1, [a, b]) => Ok(Pair(u16::from_be_bytes([*a, *b]), 0)),
                (2, [a, b, c, d]) => Ok(Pair(u16::from_be_bytes([*a, *b]), u16::from_be_bytes([*c, *d]))),
                _ => Err(RowforgeError::Codec("bad pair body".into())),
            }
        }
    }

    #[test]
    fn frames_carry_magic_and_version() {
        let blob = serialize(&Pair(1, 2)).unwrap();
        assert_eq!(blob, vec![MAGIC, 2, 0, 1, 0, 2]);
        assert_eq!(deserialize::<Pair>(&blob).unwrap(), Pair(1, 2));
    }

    #[test]
    fn std_collections_have_json_bodies() {
        let tags = vec![String::from("rust"), String::from("sql")];
        let blob = serialize(&tags).unwrap();
        assert_eq!(&blob[..2], &[MAGIC, 1]);
        assert_eq!(&blob[2..], br#"["rust","sql"]"#);
        assert_eq!(deserialize::<Vec<String>>(&blob).unwrap(), tags);

        let mut scores = BTreeMap::new();
        scores.insert(String::from("ann"), 3);
        scores.insert(String::from("bob"), 5);
        let blob = serialize(&scores).unwrap();
        assert_eq!(deserialize::<BTreeMap<String, i32>>(&blob).unwrap(), scores);

        let seen: HashSet<u32> = [1, 2, 3].into_iter().collect();
        assert_eq!(deserialize::<HashSet<u32>>(&serialize(&seen).unwrap()).unwrap(), seen);
    }

    #[test]
    fn collection_bodies_of_the_wrong_shape_are_refused() {
        let blob = serialize(&vec![1, 2]).unwrap();
        assert!(matches!(deserialize::<Vec<String>>(&blob), Err(RowforgeError::Codec(_))));
    }

    #[test]
    fn older_versions_are_still_read() {
        assert_eq!(deserialize::<Pair>(&[MAGIC, 1, 0, 9]).unwrap(), Pair(9, 0));
    }

    #[test]
    fn newer_versions_and_garbage_are_refused() {
        assert!(matches!(deserialize::<Pair>(&[MAGIC, 3, 0, 1, 0, 2]), Err(RowforgeError::Codec(_))));
        assert!(matches!(deserialize::<Pair>(&[0xAC, 0xED, 0, 5]), Err(RowforgeError::Codec(_))));
        assert!(matches!(deserialize::<Pair>(&[MAGIC]), Err(RowforgeError::Codec(_))));
        assert!(matches!(deserialize::<Pair>(&[MAGIC, 2, 0]), Err(RowforgeError::Codec(_))));
    }
}
