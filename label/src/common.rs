pub use indexmap::IndexSet;
pub use itertools::Itertools as _;
pub use log::warn;
pub use once_cell::sync::Lazy;
pub use std::{
    cmp::Reverse,
    collections::HashMap,
    fmt, iter,
};
