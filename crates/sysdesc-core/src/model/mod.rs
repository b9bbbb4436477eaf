pub mod element;
pub mod records;

pub use element::{Element, ElementKind, Identity};
pub use records::{
    ChangedFile, ExtraFields, Group, OsInfo, Package, Pattern, Repository, Service, UnmanagedFile, User,
};
