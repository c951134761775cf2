//! # colonnade-marshal
//!
//! Conversion between application values and the byte strings the store
//! sorts and validates.
//!
//! Every table declares a key validator, a column-name comparator and value
//! validators as class-name strings. [`TypeRegistry`] resolves those strings
//! to a [`DataType`], and [`TypeCodec`] packs and unpacks [`Value`]s with it.
//!
//! ## Example
//!
//! ```rust
//! use colonnade_marshal::{PackContext, TypeCodec, TypeRegistry, Value};
//!
//! let registry = TypeRegistry::standard();
//! let long = registry.resolve("org.apache.cassandra.db.marshal.LongType");
//!
//! let packed = long.pack(&Value::Long(-1), PackContext::value()).unwrap();
//! assert_eq!(packed.as_ref(), &[0xFF; 8]);
//! assert_eq!(long.unpack(&packed).unwrap(), Value::Long(-1));
//! ```
//!
//! ## Composite names
//!
//! ```rust
//! use colonnade_marshal::{PackContext, SliceEnd, TypeCodec, TypeRegistry, Value};
//!
//! let registry = TypeRegistry::standard();
//! let composite = registry.resolve("CompositeType(LongType, AsciiType)");
//!
//! let start = composite
//!     .pack(
//!         &Value::Composite(vec![Value::Long(5)]),
//!         PackContext::name().slice(SliceEnd::Start { inclusive: true }),
//!     )
//!     .unwrap();
//! // [len=8][8-byte long][end-of-component]
//! assert_eq!(start.len(), 2 + 8 + 1);
//! assert_eq!(start[10], 0xFF);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod registry;
pub mod time_uuid;
pub mod types;
pub mod value;

pub use error::{MarshalError, MarshalResult};
pub use registry::TypeRegistry;
pub use types::{DataType, PackContext, SliceEnd, TypeCodec};
pub use value::Value;
